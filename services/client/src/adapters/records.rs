//! services/client/src/adapters/records.rs
//!
//! "Impure" wire records: the JSON shapes the forum backend sends and
//! accepts, and their mapping onto the core's domain types.

use campus_forum_core::domain::{
    Article, ArticleDetail, ArticleId, AuthorSnapshot, Comment, CommentId, Cursor, Page, Session,
    UserId,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

//=========================================================================================
// Response Records
//=========================================================================================

#[derive(Debug, Deserialize)]
pub(crate) struct ArticleRecord {
    id: i64,
    user: i64,
    created_at: DateTime<Utc>,
    #[serde(default)]
    views_count: u32,
    #[serde(default)]
    comments_count: u32,
    #[serde(default)]
    likes_count: u32,
    #[serde(default)]
    deleted: bool,
    #[serde(default)]
    edited: bool,
    title: String,
    body: String,
    #[serde(default)]
    unicon: bool,
    #[serde(default)]
    like_status: bool,
    #[serde(default)]
    save_status: bool,
    #[serde(default)]
    user_school: Option<String>,
    #[serde(default)]
    user_temp_name: Option<String>,
    #[serde(default)]
    user_static_points: Option<i64>,
    #[serde(default)]
    course_code: Option<Value>,
}

impl ArticleRecord {
    pub(crate) fn to_domain(self) -> Article {
        Article {
            id: ArticleId(self.id),
            author: author(
                self.user,
                self.user_temp_name,
                self.user_static_points,
                self.user_school,
            ),
            title: self.title,
            body: self.body,
            created_at: self.created_at,
            views_count: self.views_count,
            likes_count: self.likes_count,
            comments_count: self.comments_count,
            own_school_only: self.unicon,
            course_codes: course_codes(self.course_code),
            deleted: self.deleted,
            edited: self.edited,
            like_status: self.like_status,
            save_status: self.save_status,
            edit: None,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct CommentRecord {
    id: i64,
    user: i64,
    article: i64,
    #[serde(default)]
    parent_comment: Option<i64>,
    created_at: DateTime<Utc>,
    #[serde(default)]
    comments_count: u32,
    #[serde(default)]
    likes_count: u32,
    #[serde(default)]
    deleted: bool,
    #[serde(default)]
    edited: bool,
    body: String,
    #[serde(default)]
    like_status: bool,
    #[serde(default)]
    user_school: Option<String>,
    #[serde(default)]
    user_temp_name: Option<String>,
    #[serde(default)]
    user_static_points: Option<i64>,
}

impl CommentRecord {
    pub(crate) fn to_domain(self) -> Comment {
        Comment {
            id: CommentId(self.id),
            article: ArticleId(self.article),
            parent: self.parent_comment.map(CommentId),
            author: author(
                self.user,
                self.user_temp_name,
                self.user_static_points,
                self.user_school,
            ),
            body: self.body,
            created_at: self.created_at,
            likes_count: self.likes_count,
            like_status: self.like_status,
            replies_count: self.comments_count,
            deleted: self.deleted,
            edited: self.edited,
            pending: false,
            edit: None,
        }
    }
}

fn author(
    user: i64,
    name: Option<String>,
    points: Option<i64>,
    school: Option<String>,
) -> AuthorSnapshot {
    AuthorSnapshot {
        user: UserId(user),
        display_name: name.unwrap_or_default(),
        points: points.unwrap_or_default(),
        school: school.unwrap_or_default(),
    }
}

/// Course codes arrive as a JSON list, a single string or null.
fn course_codes(value: Option<Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .into_iter()
            .filter_map(|v| match v {
                Value::String(s) if !s.trim().is_empty() => Some(s),
                _ => None,
            })
            .collect(),
        Some(Value::String(s)) if !s.trim().is_empty() => vec![s],
        _ => Vec::new(),
    }
}

fn cursor(next: Option<String>) -> Option<Cursor> {
    next.filter(|n| !n.is_empty()).map(Cursor::new)
}

#[derive(Debug, Deserialize)]
pub(crate) struct ArticleListEnvelope {
    #[serde(default)]
    next: Option<String>,
    results: ArticleListResults,
}

#[derive(Debug, Deserialize)]
struct ArticleListResults {
    #[serde(default)]
    articles: Vec<ArticleRecord>,
}

impl ArticleListEnvelope {
    pub(crate) fn to_domain(self) -> Page<Article> {
        Page::new(
            self.results.articles.into_iter().map(ArticleRecord::to_domain).collect(),
            cursor(self.next),
        )
    }
}

/// A page of comments. Reply pages may label the list `nested_comments`.
#[derive(Debug, Deserialize)]
pub(crate) struct CommentListEnvelope {
    #[serde(default)]
    next: Option<String>,
    results: CommentListResults,
}

#[derive(Debug, Deserialize)]
struct CommentListResults {
    #[serde(default, alias = "nested_comments")]
    comments: Vec<CommentRecord>,
}

impl CommentListEnvelope {
    pub(crate) fn to_domain(self) -> Page<Comment> {
        Page::new(
            self.results.comments.into_iter().map(CommentRecord::to_domain).collect(),
            cursor(self.next),
        )
    }
}

/// The article detail: the first comment page with the article tucked into `results`.
#[derive(Debug, Deserialize)]
pub(crate) struct ArticleDetailEnvelope {
    #[serde(default)]
    next: Option<String>,
    results: ArticleDetailResults,
}

#[derive(Debug, Deserialize)]
struct ArticleDetailResults {
    article: ArticleRecord,
    #[serde(default)]
    comments: Vec<CommentRecord>,
}

impl ArticleDetailEnvelope {
    pub(crate) fn to_domain(self) -> ArticleDetail {
        ArticleDetail {
            article: self.results.article.to_domain(),
            comments: Page::new(
                self.results.comments.into_iter().map(CommentRecord::to_domain).collect(),
                cursor(self.next),
            ),
        }
    }
}

/// The account payload returned by login, registration and validation.
#[derive(Debug, Deserialize)]
pub(crate) struct UserRecord {
    id: i64,
    #[serde(default)]
    initial: String,
    #[serde(default)]
    color: String,
    #[serde(default)]
    points: i64,
    access: String,
    refresh: String,
    #[serde(default)]
    is_validated: bool,
}

impl UserRecord {
    pub(crate) fn to_domain(self) -> Session {
        Session {
            access: self.access,
            refresh: self.refresh,
            user: UserId(self.id),
            initial: self.initial,
            color: self.color,
            points: self.points,
            validated: self.is_validated,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct AccessRecord {
    pub(crate) access: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorRecord {
    pub(crate) detail: String,
}

//=========================================================================================
// Request Bodies
//=========================================================================================

#[derive(Serialize)]
pub(crate) struct CredentialsBody<'a> {
    pub(crate) email: &'a str,
    pub(crate) password: &'a str,
}

#[derive(Serialize)]
pub(crate) struct EmailBody<'a> {
    pub(crate) email: &'a str,
}

#[derive(Serialize)]
pub(crate) struct RefreshBody<'a> {
    pub(crate) refresh: &'a str,
}

#[derive(Serialize)]
pub(crate) struct ValidationBody<'a> {
    pub(crate) validation_code: &'a str,
}

#[derive(Serialize)]
pub(crate) struct NewArticleBody<'a> {
    pub(crate) title: &'a str,
    pub(crate) body: &'a str,
    pub(crate) unicon: bool,
    pub(crate) course_code: &'a [String],
}

#[derive(Serialize)]
pub(crate) struct ArticleEditBody<'a> {
    pub(crate) title: &'a str,
    pub(crate) body: &'a str,
}

#[derive(Serialize)]
pub(crate) struct NewCommentBody<'a> {
    pub(crate) body: &'a str,
    pub(crate) article: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) parent_comment: Option<i64>,
}

#[derive(Serialize)]
pub(crate) struct CommentEditBody<'a> {
    pub(crate) body: &'a str,
}

//=========================================================================================
// Persisted Session
//=========================================================================================

/// The on-disk form of a signed-in session.
#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct SessionRecord {
    access: String,
    refresh: String,
    user_id: i64,
    initial: String,
    color: String,
    points: i64,
    is_validated: bool,
}

impl SessionRecord {
    pub(crate) fn from_domain(session: &Session) -> Self {
        Self {
            access: session.access.clone(),
            refresh: session.refresh.clone(),
            user_id: session.user.0,
            initial: session.initial.clone(),
            color: session.color.clone(),
            points: session.points,
            is_validated: session.validated,
        }
    }

    pub(crate) fn to_domain(self) -> Session {
        Session {
            access: self.access,
            refresh: self.refresh,
            user: UserId(self.user_id),
            initial: self.initial,
            color: self.color,
            points: self.points,
            validated: self.is_validated,
        }
    }
}
