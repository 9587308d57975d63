//! crates/campus_forum_core/src/domain.rs
//!
//! Defines the pure, core data structures for the forum client.
//! These structs are independent of any HTTP or serialization format; the
//! adapters map their wire records onto them.

use chrono::{DateTime, Utc};
use std::fmt;

/// Placeholder title of a soft-deleted article.
pub const DELETED_TITLE: &str = "[DELETED ARTICLE]";
/// Placeholder body of a soft-deleted article or comment.
pub const DELETED_BODY: &str = "[DELETED CONTENT]";

//=========================================================================================
// Identifiers
//=========================================================================================

macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub i64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_type!(
    /// Server-assigned article id.
    ArticleId
);
id_type!(
    /// Server-assigned comment id. Negative values are provisional ids handed
    /// out locally while a submission awaits the server.
    CommentId
);
id_type!(
    /// Server-assigned user id.
    UserId
);

//=========================================================================================
// Pagination
//=========================================================================================

/// An opaque continuation token issued by the server (usually a full URL).
///
/// The client never parses or builds one; it is forwarded verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Cursor(String);

impl Cursor {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One page of a server list. `next == None` means there are no more pages.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next: Option<Cursor>,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, next: Option<Cursor>) -> Self {
        Self { items, next }
    }

    /// A page with no continuation.
    pub fn last(items: Vec<T>) -> Self {
        Self { items, next: None }
    }
}

//=========================================================================================
// Articles and Comments
//=========================================================================================

/// Author fields denormalized into every article and comment at fetch time.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AuthorSnapshot {
    pub user: UserId,
    pub display_name: String,
    pub points: i64,
    pub school: String,
}

/// Title and body buffers of an article being edited.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticleEdit {
    pub title: String,
    pub body: String,
}

/// A forum article as held by the client.
#[derive(Debug, Clone, PartialEq)]
pub struct Article {
    pub id: ArticleId,
    pub author: AuthorSnapshot,
    pub title: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
    pub views_count: u32,
    pub likes_count: u32,
    pub comments_count: u32,
    /// Visible only to members of the author's own school.
    pub own_school_only: bool,
    pub course_codes: Vec<String>,
    pub deleted: bool,
    pub edited: bool,
    pub like_status: bool,
    pub save_status: bool,
    /// `Some` while the viewer is editing; holds the edit buffers.
    pub edit: Option<ArticleEdit>,
}

/// A comment at either level of a thread.
///
/// Top-level comments have `parent == None`; replies carry their parent's id.
#[derive(Debug, Clone, PartialEq)]
pub struct Comment {
    pub id: CommentId,
    pub article: ArticleId,
    pub parent: Option<CommentId>,
    pub author: AuthorSnapshot,
    pub body: String,
    pub created_at: DateTime<Utc>,
    pub likes_count: u32,
    pub like_status: bool,
    pub replies_count: u32,
    pub deleted: bool,
    pub edited: bool,
    /// Set while an optimistic submission is awaiting the server.
    pub pending: bool,
    /// `Some` while the viewer is editing; holds the edit buffer.
    pub edit: Option<String>,
}

/// A top-level comment together with its one level of replies.
///
/// Replies are plain `Comment`s, so a reply can never own children.
#[derive(Debug, Clone, PartialEq)]
pub struct CommentThread {
    pub comment: Comment,
    /// `Some` while the viewer is composing a reply; holds the reply buffer.
    pub reply: Option<String>,
    pub replies: Vec<Comment>,
    pub replies_visible: bool,
}

impl CommentThread {
    pub fn new(comment: Comment) -> Self {
        Self {
            comment,
            reply: None,
            replies: Vec::new(),
            replies_visible: false,
        }
    }

    pub fn is_replying(&self) -> bool {
        self.reply.is_some()
    }
}

/// Addresses a comment inside an article's thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommentTarget {
    TopLevel(CommentId),
    Nested { parent: CommentId, id: CommentId },
}

impl CommentTarget {
    /// The id of the addressed comment itself.
    pub fn id(&self) -> CommentId {
        match *self {
            CommentTarget::TopLevel(id) => id,
            CommentTarget::Nested { id, .. } => id,
        }
    }
}

impl fmt::Display for CommentTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommentTarget::TopLevel(id) => write!(f, "comment {}", id),
            CommentTarget::Nested { parent, id } => {
                write!(f, "reply {} under comment {}", id, parent)
            }
        }
    }
}

/// The article detail payload: the article and the first page of its comments.
#[derive(Debug, Clone, PartialEq)]
pub struct ArticleDetail {
    pub article: Article,
    pub comments: Page<Comment>,
}

/// Fields of an article about to be published.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NewArticle {
    pub title: String,
    pub body: String,
    pub own_school_only: bool,
    pub course_codes: Vec<String>,
}

//=========================================================================================
// Feeds
//=========================================================================================

/// Which article list a feed shows.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FeedKind {
    Recent,
    Hot,
    Preference,
    Search(String),
    Posted,
    Commented,
    Saved,
    Liked,
}

//=========================================================================================
// Account and Session
//=========================================================================================

/// The credential and profile state of a signed-in user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub access: String,
    pub refresh: String,
    pub user: UserId,
    /// The school's short display initial.
    pub initial: String,
    /// The school's display color.
    pub color: String,
    pub points: i64,
    pub validated: bool,
}

impl Session {
    /// Author fields for content the viewer creates before the server echoes them back.
    ///
    /// The session only knows the school's initial, not the name the server
    /// reports on content, so the name fields stay empty until confirmation.
    pub fn author_snapshot(&self) -> AuthorSnapshot {
        AuthorSnapshot {
            user: self.user,
            display_name: String::new(),
            points: self.points,
            school: String::new(),
        }
    }
}

/// Flips a like flag and moves its counter with it.
///
/// Returns `false` when the flag already had the requested value. The counter
/// never drops below zero.
pub(crate) fn apply_like(status: &mut bool, count: &mut u32, liked: bool) -> bool {
    if *status == liked {
        return false;
    }
    *status = liked;
    *count = if liked {
        count.saturating_add(1)
    } else {
        count.saturating_sub(1)
    };
    true
}
