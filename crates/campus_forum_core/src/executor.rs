//! crates/campus_forum_core/src/executor.rs
//!
//! The authenticated request executor. Every authenticated call in the core
//! goes through `AuthExecutor::execute`, which binds the call to the access
//! credential current at call time and performs at most one
//! refresh-and-retry cycle when the backend answers with 401.

use crate::error::{ForumError, ForumResult};
use crate::ports::{AccountApi, PortError, PortResult};
use crate::session::SessionContext;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, warn, Instrument};
use uuid::Uuid;

/// Upper bound for a single attempt when no other timeout is configured.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Runs calls with the current access credential and handles its expiry.
#[derive(Clone)]
pub struct AuthExecutor {
    accounts: Arc<dyn AccountApi>,
    session: SessionContext,
    timeout: Duration,
}

impl AuthExecutor {
    pub fn new(accounts: Arc<dyn AccountApi>, session: SessionContext) -> Self {
        Self {
            accounts,
            session,
            timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Bounds every attempt (and the refresh exchange) by `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    /// Runs `call` with the current access credential.
    ///
    /// On `Unauthorized` the refresh credential is exchanged once and `call`
    /// is invoked once more. A failed exchange or a second `Unauthorized`
    /// ends the session and yields `SessionExpired`. Every other error is
    /// returned as-is without a retry.
    pub async fn execute<T, F, Fut>(&self, operation: &'static str, call: F) -> ForumResult<T>
    where
        F: Fn(String) -> Fut,
        Fut: Future<Output = PortResult<T>>,
    {
        let span = tracing::debug_span!("forum_call", op = operation, id = %Uuid::new_v4());
        self.execute_inner(operation, call).instrument(span).await
    }

    async fn execute_inner<T, F, Fut>(&self, operation: &'static str, call: F) -> ForumResult<T>
    where
        F: Fn(String) -> Fut,
        Fut: Future<Output = PortResult<T>>,
    {
        let access = self.session.current().await?.access;

        match self.attempt(call(access)).await {
            Err(PortError::Unauthorized) => {
                warn!("{} was rejected with 401, refreshing the access credential", operation);
            }
            other => return other.map_err(ForumError::from),
        }

        let access = match self.refresh().await {
            Ok(access) => access,
            Err(e) => {
                error!("Credential refresh failed during {}: {}", operation, e);
                self.terminate().await;
                return Err(ForumError::SessionExpired);
            }
        };

        match self.attempt(call(access)).await {
            Err(PortError::Unauthorized) => {
                error!("{} was rejected again after the refresh", operation);
                self.terminate().await;
                Err(ForumError::SessionExpired)
            }
            other => other.map_err(ForumError::from),
        }
    }

    async fn attempt<T>(&self, fut: impl Future<Output = PortResult<T>>) -> PortResult<T> {
        tokio::time::timeout(self.timeout, fut)
            .await
            .unwrap_or(Err(PortError::Timeout))
    }

    async fn refresh(&self) -> ForumResult<String> {
        let refresh = self.session.current().await?.refresh;
        let access = self.attempt(self.accounts.refresh_access(&refresh)).await?;
        self.session.update_access(access.clone()).await?;
        debug!("Access credential refreshed");
        Ok(access)
    }

    async fn terminate(&self) {
        if let Err(e) = self.session.end().await {
            error!("Failed to clear the session: {}", e);
        }
    }
}
