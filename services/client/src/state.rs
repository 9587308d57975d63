//! services/client/src/state.rs
//!
//! Defines the application's shared state: the configured adapters and the
//! core services built on them.

use crate::adapters::{FileSessionStore, ReqwestForumAdapter};
use crate::config::Config;
use crate::error::ClientError;
use campus_forum_core::account::AccountService;
use campus_forum_core::executor::AuthExecutor;
use campus_forum_core::ports::{AccountApi, ForumApi, SessionStore};
use campus_forum_core::session::SessionContext;
use std::sync::Arc;

/// The shared application state, created once at startup and handed to
/// every command.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub api: Arc<dyn ForumApi>,
    pub executor: AuthExecutor,
    pub accounts: AccountService,
}

impl AppState {
    /// Wires the HTTP adapter and the session file named by `config`.
    pub fn new(config: Arc<Config>) -> Result<Self, ClientError> {
        let http = Arc::new(ReqwestForumAdapter::new(
            config.api_url.clone(),
            config.request_timeout,
        )?);
        let store: Arc<dyn SessionStore> =
            Arc::new(FileSessionStore::new(config.session_path.clone()));
        Ok(Self::from_parts(config, http.clone(), http, store))
    }

    /// Builds the state from already constructed ports.
    pub fn from_parts(
        config: Arc<Config>,
        api: Arc<dyn ForumApi>,
        account_api: Arc<dyn AccountApi>,
        store: Arc<dyn SessionStore>,
    ) -> Self {
        let session = SessionContext::new(store);
        let executor =
            AuthExecutor::new(account_api.clone(), session).with_timeout(config.request_timeout);
        let accounts = AccountService::new(account_api, executor.clone());
        Self {
            config,
            api,
            executor,
            accounts,
        }
    }
}
