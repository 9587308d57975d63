//! crates/campus_forum_core/src/error.rs
//!
//! Defines the error type returned by the stores, controllers and services.

use crate::domain::{ArticleId, CommentTarget};
use crate::ports::PortError;

/// The primary error type of the forum core.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ForumError {
    /// There is no signed-in session to act with.
    #[error("Not signed in")]
    NotAuthenticated,

    /// The credential refresh failed; the session has been cleared and the
    /// user has to sign in again.
    #[error("Session expired, please sign in again")]
    SessionExpired,

    /// Represents an error that propagated up from one of the ports.
    #[error("Service Port Error: {0}")]
    Port(#[from] PortError),

    /// The input was rejected locally before any request was made.
    #[error("Invalid input: {0}")]
    Invalid(&'static str),

    #[error("{0} is not loaded")]
    UnknownComment(CommentTarget),

    #[error("Article {0} is not loaded")]
    UnknownArticle(ArticleId),

    /// The entity is tombstoned and no longer accepts this action.
    #[error("The {0} has been deleted")]
    Deleted(&'static str),

    /// The viewer does not own the entity.
    #[error("Not allowed to {0}")]
    Forbidden(&'static str),

    /// The same logical action is already in flight.
    #[error("{0} is already in progress")]
    Busy(String),

    /// The entity is still awaiting server confirmation.
    #[error("{0} is still being submitted")]
    Pending(CommentTarget),

    /// The list has no further pages.
    #[error("No more pages to load")]
    Exhausted,
}

impl ForumError {
    /// Whether the caller should return to the sign-in entry point.
    pub fn requires_sign_in(&self) -> bool {
        matches!(self, ForumError::NotAuthenticated | ForumError::SessionExpired)
    }
}

/// A convenience type alias for `Result<T, ForumError>`.
pub type ForumResult<T> = Result<T, ForumError>;
