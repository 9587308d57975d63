//! crates/campus_forum_core/src/session.rs
//!
//! The session context: the single authoritative owner of the signed-in
//! user's credentials and profile. It is created once and injected into the
//! executor and every service; nothing reads credentials from anywhere else.

use crate::domain::{Session, UserId};
use crate::error::{ForumError, ForumResult};
use crate::ports::{PortResult, SessionStore};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Shared handle to the persisted session.
///
/// Every read goes to the store, so concurrent operations observe an access
/// credential refreshed by any of them.
#[derive(Clone)]
pub struct SessionContext {
    store: Arc<dyn SessionStore>,
}

impl SessionContext {
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self { store }
    }

    /// The current session, or `NotAuthenticated` when nobody is signed in.
    pub async fn current(&self) -> ForumResult<Session> {
        self.store.load().await?.ok_or(ForumError::NotAuthenticated)
    }

    pub async fn is_signed_in(&self) -> bool {
        matches!(self.store.load().await, Ok(Some(_)))
    }

    /// The signed-in user's id, if any.
    pub async fn viewer(&self) -> Option<UserId> {
        self.store.load().await.ok().flatten().map(|s| s.user)
    }

    /// Starts a session after a successful sign-in.
    pub async fn begin(&self, session: &Session) -> ForumResult<()> {
        self.store.save(session).await?;
        info!(user = %session.user, validated = session.validated, "Session started");
        Ok(())
    }

    /// Persists a freshly issued access credential.
    pub async fn update_access(&self, access: String) -> ForumResult<()> {
        let mut session = self.current().await?;
        session.access = access;
        self.store.save(&session).await?;
        debug!("Access credential replaced");
        Ok(())
    }

    pub async fn mark_validated(&self) -> ForumResult<()> {
        let mut session = self.current().await?;
        session.validated = true;
        self.store.save(&session).await?;
        Ok(())
    }

    /// Clears every persisted session field.
    pub async fn end(&self) -> ForumResult<()> {
        self.store.clear().await?;
        info!("Session cleared");
        Ok(())
    }
}

//=========================================================================================
// In-Memory Session Store
//=========================================================================================

/// A `SessionStore` that keeps the session in process memory.
#[derive(Default)]
pub struct MemorySessionStore {
    session: RwLock<Option<Session>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_session(session: Session) -> Self {
        Self {
            session: RwLock::new(Some(session)),
        }
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn load(&self) -> PortResult<Option<Session>> {
        Ok(self.session.read().await.clone())
    }

    async fn save(&self, session: &Session) -> PortResult<()> {
        *self.session.write().await = Some(session.clone());
        Ok(())
    }

    async fn clear(&self) -> PortResult<()> {
        *self.session.write().await = None;
        Ok(())
    }
}
