//! crates/campus_forum_core/src/ports.rs
//!
//! Defines the service contracts (traits) the forum core depends on.
//! These traits form the boundary of the hexagonal architecture, keeping the
//! stores and controllers independent of the HTTP client and of how the
//! session is persisted.

use async_trait::async_trait;
use crate::domain::{
    Article, ArticleDetail, ArticleId, Comment, CommentId, Cursor, FeedKind, NewArticle, Page,
    Session,
};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors of the transport (status codes,
/// connection failures, malformed bodies).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Unauthorized")]
    Unauthorized,
    /// The backend refused the request (validation or business rule).
    #[error("Rejected ({status}): {detail}")]
    Rejected { status: u16, detail: String },
    #[error("Transport failure: {0}")]
    Transport(String),
    #[error("Request timed out")]
    Timeout,
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

/// Article-level reactions that are toggled with a bare POST.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArticleAction {
    Like,
    Unlike,
    Save,
    Unsave,
}

impl ArticleAction {
    /// The path segment the backend expects for this action.
    pub fn as_str(&self) -> &'static str {
        match self {
            ArticleAction::Like => "like",
            ArticleAction::Unlike => "unlike",
            ArticleAction::Save => "save",
            ArticleAction::Unsave => "unsave",
        }
    }
}

/// The community endpoints. Every call carries the access credential the
/// caller read from the session at call time.
#[async_trait]
pub trait ForumApi: Send + Sync {
    // --- Feeds ---
    async fn fetch_feed(&self, access: &str, kind: &FeedKind) -> PortResult<Page<Article>>;

    async fn fetch_article_page(&self, access: &str, cursor: &Cursor) -> PortResult<Page<Article>>;

    // --- Articles ---
    async fn fetch_article(&self, access: &str, id: ArticleId) -> PortResult<ArticleDetail>;

    async fn create_article(&self, access: &str, article: &NewArticle) -> PortResult<Article>;

    async fn edit_article(
        &self,
        access: &str,
        id: ArticleId,
        title: &str,
        body: &str,
    ) -> PortResult<()>;

    async fn delete_article(&self, access: &str, id: ArticleId) -> PortResult<()>;

    async fn article_action(
        &self,
        access: &str,
        id: ArticleId,
        action: ArticleAction,
    ) -> PortResult<()>;

    // --- Comments ---
    async fn fetch_comment_page(&self, access: &str, cursor: &Cursor) -> PortResult<Page<Comment>>;

    /// Fetches the first page of a top-level comment's replies.
    async fn fetch_replies(&self, access: &str, parent: CommentId) -> PortResult<Page<Comment>>;

    async fn fetch_reply_page(&self, access: &str, cursor: &Cursor) -> PortResult<Page<Comment>>;

    /// Creates a comment; `parent` makes it a reply.
    async fn create_comment(
        &self,
        access: &str,
        article: ArticleId,
        parent: Option<CommentId>,
        body: &str,
    ) -> PortResult<Comment>;

    async fn edit_comment(&self, access: &str, id: CommentId, body: &str) -> PortResult<()>;

    async fn delete_comment(&self, access: &str, id: CommentId) -> PortResult<()>;

    /// Likes (`liked == true`) or unlikes a comment.
    async fn set_comment_like(&self, access: &str, id: CommentId, liked: bool) -> PortResult<()>;
}

/// The account endpoints. Sign-in style calls need no access credential.
#[async_trait]
pub trait AccountApi: Send + Sync {
    /// Exchanges a refresh credential for a new access credential.
    async fn refresh_access(&self, refresh: &str) -> PortResult<String>;

    /// Checks credentials. An unvalidated account still yields a session with
    /// `validated == false`.
    async fn login(&self, email: &str, password: &str) -> PortResult<Session>;

    async fn register(&self, email: &str, password: &str) -> PortResult<Session>;

    async fn confirm_validation(&self, access: &str, code: &str) -> PortResult<()>;

    async fn forgot_password(&self, email: &str) -> PortResult<()>;
}

/// Persistence for the signed-in session (credentials and profile fields).
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn load(&self) -> PortResult<Option<Session>>;

    async fn save(&self, session: &Session) -> PortResult<()>;

    /// Removes every persisted session field.
    async fn clear(&self) -> PortResult<()>;
}
