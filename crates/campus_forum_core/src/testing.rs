//! Test doubles shared by the unit tests of this crate.
//!
//! `FakeBackend` implements both service ports over in-memory state and
//! records every call it receives as a `"METHOD path"` string.

use crate::domain::{
    Article, ArticleDetail, ArticleId, AuthorSnapshot, Comment, CommentId, Cursor, FeedKind,
    NewArticle, Page, Session, UserId,
};
use crate::executor::AuthExecutor;
use crate::ports::{AccountApi, ArticleAction, ForumApi, PortError, PortResult};
use crate::session::{MemorySessionStore, SessionContext};
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

//=========================================================================================
// Fixtures
//=========================================================================================

pub fn session(access: &str) -> Session {
    Session {
        access: access.to_string(),
        refresh: "refresh-token".to_string(),
        user: UserId(1),
        initial: "NTU".to_string(),
        color: "#1f6feb".to_string(),
        points: 10,
        validated: true,
    }
}

fn author(user: i64) -> AuthorSnapshot {
    AuthorSnapshot {
        user: UserId(user),
        display_name: format!("user{}", user),
        points: 0,
        school: "NTU".to_string(),
    }
}

/// An article by user 2 with five likes and one comment.
pub fn article(id: i64) -> Article {
    Article {
        id: ArticleId(id),
        author: author(2),
        title: format!("Article {}", id),
        body: format!("Body of article {}", id),
        created_at: Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap(),
        views_count: 10,
        likes_count: 5,
        comments_count: 1,
        own_school_only: false,
        course_codes: Vec::new(),
        deleted: false,
        edited: false,
        like_status: false,
        save_status: false,
        edit: None,
    }
}

/// A top-level comment on article 42 with two likes.
pub fn comment(id: i64, author_id: i64) -> Comment {
    Comment {
        id: CommentId(id),
        article: ArticleId(42),
        parent: None,
        author: author(author_id),
        body: format!("Comment {}", id),
        created_at: Utc.with_ymd_and_hms(2024, 3, 1, 13, 0, 0).unwrap(),
        likes_count: 2,
        like_status: false,
        replies_count: 0,
        deleted: false,
        edited: false,
        pending: false,
        edit: None,
    }
}

/// A reply under `parent` with no likes.
pub fn reply(parent: i64, id: i64, author_id: i64) -> Comment {
    Comment {
        parent: Some(CommentId(parent)),
        likes_count: 0,
        body: format!("Reply {}", id),
        ..comment(id, author_id)
    }
}

/// An executor whose session store starts with `session` and whose account
/// port is `backend`.
pub fn executor_with(backend: &FakeBackend, session: impl Into<Option<Session>>) -> AuthExecutor {
    let store = match session.into() {
        Some(s) => MemorySessionStore::with_session(s),
        None => MemorySessionStore::new(),
    };
    let context = SessionContext::new(Arc::new(store));
    AuthExecutor::new(Arc::new(backend.clone()), context)
}

//=========================================================================================
// Fake Backend
//=========================================================================================

struct State {
    valid_access: String,
    refresh_result: Option<String>,
    refresh_calls: usize,
    calls: Vec<String>,
    failures: VecDeque<PortError>,
    yield_on_calls: bool,
    articles: HashMap<ArticleId, Article>,
    comments: Page<Comment>,
    comment_pages: HashMap<String, Page<Comment>>,
    replies: HashMap<CommentId, Page<Comment>>,
    reply_pages: HashMap<String, Page<Comment>>,
    feed: Page<Article>,
    article_pages: HashMap<String, Page<Article>>,
    login: Option<Session>,
    validation_code: String,
    next_id: i64,
    created: Vec<Comment>,
}

impl Default for State {
    fn default() -> Self {
        Self {
            valid_access: "valid".to_string(),
            refresh_result: Some("valid".to_string()),
            refresh_calls: 0,
            calls: Vec::new(),
            failures: VecDeque::new(),
            yield_on_calls: false,
            articles: HashMap::new(),
            comments: Page::last(Vec::new()),
            comment_pages: HashMap::new(),
            replies: HashMap::new(),
            reply_pages: HashMap::new(),
            feed: Page::last(Vec::new()),
            article_pages: HashMap::new(),
            login: None,
            validation_code: "123456".to_string(),
            next_id: 1000,
            created: Vec::new(),
        }
    }
}

#[derive(Clone, Default)]
pub struct FakeBackend {
    state: Arc<Mutex<State>>,
}

impl FakeBackend {
    pub fn with_article(id: i64) -> Self {
        let backend = Self::default();
        backend.state.lock().articles.insert(ArticleId(id), article(id));
        backend
    }

    pub fn set_valid_access(&self, access: &str) {
        self.state.lock().valid_access = access.to_string();
    }

    /// `None` makes every refresh exchange fail.
    pub fn set_refresh_result(&self, access: Option<&str>) {
        self.state.lock().refresh_result = access.map(str::to_string);
    }

    pub fn refresh_calls(&self) -> usize {
        self.state.lock().refresh_calls
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().calls.clone()
    }

    /// Makes the next forum call fail with `error`.
    pub fn fail_next(&self, error: PortError) {
        self.state.lock().failures.push_back(error);
    }

    pub fn set_article(&self, article: Article) {
        self.state.lock().articles.insert(article.id, article);
    }

    /// The first comment page returned with the article detail.
    pub fn set_comments(&self, page: Page<Comment>) {
        self.state.lock().comments = page;
    }

    pub fn add_comment_page(&self, cursor: &str, page: Page<Comment>) {
        self.state.lock().comment_pages.insert(cursor.to_string(), page);
    }

    pub fn set_replies(&self, parent: i64, page: Page<Comment>) {
        self.state.lock().replies.insert(CommentId(parent), page);
    }

    pub fn add_reply_page(&self, cursor: &str, page: Page<Comment>) {
        self.state.lock().reply_pages.insert(cursor.to_string(), page);
    }

    pub fn set_feed(&self, page: Page<Article>) {
        self.state.lock().feed = page;
    }

    pub fn add_article_page(&self, cursor: &str, page: Page<Article>) {
        self.state.lock().article_pages.insert(cursor.to_string(), page);
    }

    /// The session handed out by `login` and `register`.
    pub fn set_login(&self, session: Session) {
        self.state.lock().login = Some(session);
    }

    /// Makes every call yield once before answering, so concurrent futures interleave.
    pub fn yield_on_calls(&self) {
        self.state.lock().yield_on_calls = true;
    }

    /// Comments created through `create_comment`, in order.
    pub fn created(&self) -> Vec<Comment> {
        self.state.lock().created.clone()
    }

    /// Records the call, yields if asked to, then applies queued failures and
    /// the credential check.
    async fn enter(&self, call: String, access: Option<&str>) -> PortResult<()> {
        let yielding = {
            let mut state = self.state.lock();
            state.calls.push(call);
            state.yield_on_calls
        };
        if yielding {
            tokio::task::yield_now().await;
        }
        let mut state = self.state.lock();
        if let Some(error) = state.failures.pop_front() {
            return Err(error);
        }
        match access {
            Some(access) if access != state.valid_access => Err(PortError::Unauthorized),
            _ => Ok(()),
        }
    }

    fn page_at<T: Clone>(pages: &HashMap<String, Page<T>>, cursor: &Cursor) -> PortResult<Page<T>> {
        pages
            .get(cursor.as_str())
            .cloned()
            .ok_or_else(|| PortError::NotFound(cursor.to_string()))
    }
}

#[async_trait]
impl ForumApi for FakeBackend {
    async fn fetch_feed(&self, access: &str, kind: &FeedKind) -> PortResult<Page<Article>> {
        self.enter(format!("GET feed {:?}", kind), Some(access)).await?;
        Ok(self.state.lock().feed.clone())
    }

    async fn fetch_article_page(&self, access: &str, cursor: &Cursor) -> PortResult<Page<Article>> {
        self.enter(format!("GET {}", cursor), Some(access)).await?;
        Self::page_at(&self.state.lock().article_pages, cursor)
    }

    async fn fetch_article(&self, access: &str, id: ArticleId) -> PortResult<ArticleDetail> {
        self.enter(format!("GET /community/article/{}/", id), Some(access)).await?;
        let state = self.state.lock();
        let article = state
            .articles
            .get(&id)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("article {}", id)))?;
        Ok(ArticleDetail {
            article,
            comments: state.comments.clone(),
        })
    }

    async fn create_article(&self, access: &str, draft: &NewArticle) -> PortResult<Article> {
        self.enter("POST /community/article/".to_string(), Some(access)).await?;
        let mut state = self.state.lock();
        state.next_id += 1;
        Ok(Article {
            title: draft.title.clone(),
            body: draft.body.clone(),
            own_school_only: draft.own_school_only,
            course_codes: draft.course_codes.clone(),
            likes_count: 0,
            comments_count: 0,
            author: author(1),
            ..article(state.next_id)
        })
    }

    async fn edit_article(
        &self,
        access: &str,
        id: ArticleId,
        _title: &str,
        _body: &str,
    ) -> PortResult<()> {
        self.enter(format!("PATCH /community/article/{}/", id), Some(access)).await
    }

    async fn delete_article(&self, access: &str, id: ArticleId) -> PortResult<()> {
        self.enter(format!("DELETE /community/article/{}/", id), Some(access)).await
    }

    async fn article_action(
        &self,
        access: &str,
        id: ArticleId,
        action: ArticleAction,
    ) -> PortResult<()> {
        self.enter(format!("POST /community/article/{}/{}/", id, action.as_str()), Some(access))
            .await
    }

    async fn fetch_comment_page(&self, access: &str, cursor: &Cursor) -> PortResult<Page<Comment>> {
        self.enter(format!("GET {}", cursor), Some(access)).await?;
        Self::page_at(&self.state.lock().comment_pages, cursor)
    }

    async fn fetch_replies(&self, access: &str, parent: CommentId) -> PortResult<Page<Comment>> {
        self.enter(format!("GET /community/comment/{}/", parent), Some(access)).await?;
        Ok(self
            .state
            .lock()
            .replies
            .get(&parent)
            .cloned()
            .unwrap_or_else(|| Page::last(Vec::new())))
    }

    async fn fetch_reply_page(&self, access: &str, cursor: &Cursor) -> PortResult<Page<Comment>> {
        self.enter(format!("GET {}", cursor), Some(access)).await?;
        Self::page_at(&self.state.lock().reply_pages, cursor)
    }

    async fn create_comment(
        &self,
        access: &str,
        article: ArticleId,
        parent: Option<CommentId>,
        body: &str,
    ) -> PortResult<Comment> {
        self.enter("POST /community/comment/".to_string(), Some(access)).await?;
        let mut state = self.state.lock();
        state.next_id += 1;
        let created = Comment {
            article,
            parent,
            body: body.to_string(),
            likes_count: 0,
            ..comment(state.next_id, 1)
        };
        state.created.push(created.clone());
        Ok(created)
    }

    async fn edit_comment(&self, access: &str, id: CommentId, _body: &str) -> PortResult<()> {
        self.enter(format!("PATCH /community/comment/{}/", id), Some(access)).await
    }

    async fn delete_comment(&self, access: &str, id: CommentId) -> PortResult<()> {
        self.enter(format!("DELETE /community/comment/{}/", id), Some(access)).await
    }

    async fn set_comment_like(&self, access: &str, id: CommentId, liked: bool) -> PortResult<()> {
        let action = if liked { "like" } else { "unlike" };
        self.enter(format!("POST /community/comment/{}/{}/", id, action), Some(access))
            .await
    }
}

#[async_trait]
impl AccountApi for FakeBackend {
    async fn refresh_access(&self, _refresh: &str) -> PortResult<String> {
        let mut state = self.state.lock();
        state.refresh_calls += 1;
        state.refresh_result.clone().ok_or(PortError::Unauthorized)
    }

    async fn login(&self, _email: &str, _password: &str) -> PortResult<Session> {
        self.enter("POST /account/user/login/".to_string(), None).await?;
        self.state.lock().login.clone().ok_or(PortError::Rejected {
            status: 401,
            detail: "Invalid credentials".to_string(),
        })
    }

    async fn register(&self, _email: &str, _password: &str) -> PortResult<Session> {
        self.enter("POST /account/user/".to_string(), None).await?;
        self.state.lock().login.clone().ok_or(PortError::Rejected {
            status: 400,
            detail: "Registration closed".to_string(),
        })
    }

    async fn confirm_validation(&self, access: &str, code: &str) -> PortResult<()> {
        self.enter("POST /account/user/validate/".to_string(), Some(access)).await?;
        if code == self.state.lock().validation_code {
            Ok(())
        } else {
            Err(PortError::Rejected {
                status: 400,
                detail: "Wrong validation code".to_string(),
            })
        }
    }

    async fn forgot_password(&self, _email: &str) -> PortResult<()> {
        self.enter("POST /account/user/forgotpassword/".to_string(), None).await
    }
}
