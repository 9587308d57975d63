//! crates/campus_forum_core/src/account.rs
//!
//! Sign-in, registration, e-mail validation and sign-out.

use crate::domain::Session;
use crate::error::{ForumError, ForumResult};
use crate::executor::AuthExecutor;
use crate::ports::AccountApi;
use crate::session::SessionContext;
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;
use tracing::{info, warn};

/// Only university addresses may register.
static CAMPUS_EMAIL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[\w.-]+@[\w.-]+\.edu[\w.-]+$").expect("campus e-mail pattern is valid")
});

pub const MIN_PASSWORD_LEN: usize = 8;

pub fn is_campus_email(email: &str) -> bool {
    CAMPUS_EMAIL.is_match(email)
}

/// Account flows around the shared session context.
#[derive(Clone)]
pub struct AccountService {
    accounts: Arc<dyn AccountApi>,
    executor: AuthExecutor,
}

impl AccountService {
    pub fn new(accounts: Arc<dyn AccountApi>, executor: AuthExecutor) -> Self {
        Self { accounts, executor }
    }

    fn session(&self) -> &SessionContext {
        self.executor.session()
    }

    /// Signs in and stores the session. The returned session may still need
    /// e-mail validation (`validated == false`).
    pub async fn login(&self, email: &str, password: &str) -> ForumResult<Session> {
        let email = email.trim();
        if email.is_empty() || password.is_empty() {
            return Err(ForumError::Invalid("e-mail and password are required"));
        }
        let session = self.accounts.login(email, password).await?;
        self.session().begin(&session).await?;
        if !session.validated {
            warn!(user = %session.user, "Signed in with an unvalidated account");
        }
        Ok(session)
    }

    /// Creates an account and stores its (unvalidated) session.
    pub async fn register(&self, email: &str, password: &str) -> ForumResult<Session> {
        let email = email.trim();
        if !is_campus_email(email) {
            return Err(ForumError::Invalid("a university e-mail address is required"));
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(ForumError::Invalid("password must be at least 8 characters"));
        }
        let session = self.accounts.register(email, password).await?;
        self.session().begin(&session).await?;
        info!(user = %session.user, "Account registered");
        Ok(session)
    }

    /// Submits the code from the validation e-mail.
    pub async fn confirm_validation(&self, code: &str) -> ForumResult<()> {
        let code = code.trim();
        if code.is_empty() {
            return Err(ForumError::Invalid("validation code is empty"));
        }
        let accounts = self.accounts.as_ref();
        self.executor
            .execute("confirm_validation", move |access| async move {
                accounts.confirm_validation(&access, code).await
            })
            .await?;
        self.session().mark_validated().await?;
        info!("Account validated");
        Ok(())
    }

    pub async fn forgot_password(&self, email: &str) -> ForumResult<()> {
        let email = email.trim();
        if email.is_empty() {
            return Err(ForumError::Invalid("e-mail is required"));
        }
        self.accounts.forgot_password(email).await?;
        info!("Password reset requested");
        Ok(())
    }

    pub async fn logout(&self) -> ForumResult<()> {
        self.session().end().await
    }

    pub async fn current(&self) -> ForumResult<Session> {
        self.session().current().await
    }
}
