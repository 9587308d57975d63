pub mod account;
pub mod article;
pub mod capability;
pub mod comments;
pub mod domain;
pub mod error;
pub mod executor;
pub mod feed;
mod inflight;
pub mod paging;
pub mod ports;
pub mod session;
pub mod thread;

#[cfg(test)]
pub(crate) mod testing;

pub use account::AccountService;
pub use article::publish_article;
pub use capability::{can_interact, can_modify, Authored};
pub use comments::CommentTree;
pub use domain::{
    Article, ArticleDetail, ArticleEdit, ArticleId, AuthorSnapshot, Comment, CommentId,
    CommentTarget, CommentThread, Cursor, FeedKind, NewArticle, Page, Session, UserId,
};
pub use error::{ForumError, ForumResult};
pub use executor::AuthExecutor;
pub use feed::Feed;
pub use paging::{CursorTracker, Scope};
pub use ports::{AccountApi, ArticleAction, ForumApi, PortError, PortResult, SessionStore};
pub use session::{MemorySessionStore, SessionContext};
pub use thread::ArticleThread;
