//! crates/campus_forum_core/src/thread.rs
//!
//! The thread controller: one open article with its comment tree.
//!
//! Every network effect goes through the `AuthExecutor`. Local state is only
//! touched once the outcome is known, except for the viewer's own new
//! comments and replies, which are shown provisionally and rolled back when
//! the submission fails.

use crate::capability::{can_interact, can_modify};
use crate::comments::CommentTree;
use crate::domain::{
    Article, ArticleId, Comment, CommentId, CommentTarget, CommentThread, Session, UserId,
};
use crate::error::{ForumError, ForumResult};
use crate::executor::AuthExecutor;
use crate::inflight::InFlight;
use crate::ports::{ArticleAction, ForumApi};
use chrono::Utc;
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Logical operations that may only run once at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum ThreadOp {
    Reload,
    LoadMoreComments,
    LoadReplies(CommentId),
    SubmitComment,
    Reply(CommentId),
    CommentLike(CommentId),
    CommentEdit(CommentId),
    CommentDelete(CommentId),
    ArticleLike,
    ArticleSave,
    ArticleEdit,
    ArticleDelete,
}

impl fmt::Display for ThreadOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ThreadOp::Reload => write!(f, "reloading the article"),
            ThreadOp::LoadMoreComments => write!(f, "loading more comments"),
            ThreadOp::LoadReplies(id) => write!(f, "loading replies of comment {}", id),
            ThreadOp::SubmitComment => write!(f, "posting a comment"),
            ThreadOp::Reply(id) => write!(f, "replying to comment {}", id),
            ThreadOp::CommentLike(id) => write!(f, "liking comment {}", id),
            ThreadOp::CommentEdit(id) => write!(f, "editing comment {}", id),
            ThreadOp::CommentDelete(id) => write!(f, "deleting comment {}", id),
            ThreadOp::ArticleLike => write!(f, "liking the article"),
            ThreadOp::ArticleSave => write!(f, "saving the article"),
            ThreadOp::ArticleEdit => write!(f, "editing the article"),
            ThreadOp::ArticleDelete => write!(f, "deleting the article"),
        }
    }
}

struct ThreadState {
    article: Article,
    comments: CommentTree,
    viewer: Option<UserId>,
}

impl ThreadState {
    fn comment(&self, target: CommentTarget) -> ForumResult<&Comment> {
        let comment = self.comments.get(target).ok_or(ForumError::UnknownComment(target))?;
        if comment.pending {
            return Err(ForumError::Pending(target));
        }
        Ok(comment)
    }

    fn interactive_comment(&self, target: CommentTarget) -> ForumResult<&Comment> {
        let comment = self.comment(target)?;
        if !can_interact(comment) {
            return Err(ForumError::Deleted("comment"));
        }
        Ok(comment)
    }

    fn owned_comment(&self, target: CommentTarget, action: &'static str) -> ForumResult<&Comment> {
        let comment = self.interactive_comment(target)?;
        if !can_modify(comment, self.viewer) {
            return Err(ForumError::Forbidden(action));
        }
        Ok(comment)
    }

    fn interactive_article(&self) -> ForumResult<&Article> {
        if !can_interact(&self.article) {
            return Err(ForumError::Deleted("article"));
        }
        Ok(&self.article)
    }

    fn owned_article(&self, action: &'static str) -> ForumResult<&Article> {
        let article = self.interactive_article()?;
        if !can_modify(article, self.viewer) {
            return Err(ForumError::Forbidden(action));
        }
        Ok(article)
    }
}

/// An open article and its comment thread.
pub struct ArticleThread {
    executor: AuthExecutor,
    api: Arc<dyn ForumApi>,
    article_id: ArticleId,
    state: Mutex<ThreadState>,
    flights: InFlight<ThreadOp>,
}

impl ArticleThread {
    /// Fetches the article with its first page of comments.
    pub async fn open(
        executor: AuthExecutor,
        api: Arc<dyn ForumApi>,
        article_id: ArticleId,
    ) -> ForumResult<Self> {
        let state = Self::fetch(&executor, api.as_ref(), article_id).await?;
        info!(article = %article_id, comments = state.comments.len(), "Article opened");
        Ok(Self {
            executor,
            api,
            article_id,
            state: Mutex::new(state),
            flights: InFlight::default(),
        })
    }

    async fn fetch(
        executor: &AuthExecutor,
        api: &dyn ForumApi,
        article_id: ArticleId,
    ) -> ForumResult<ThreadState> {
        let detail = executor
            .execute("open_article", move |access| async move {
                api.fetch_article(&access, article_id).await
            })
            .await?;
        Ok(ThreadState {
            article: detail.article,
            comments: CommentTree::from_page(detail.comments),
            viewer: executor.session().viewer().await,
        })
    }

    /// Fetches the article again and replaces everything held locally.
    pub async fn reload(&self) -> ForumResult<()> {
        let _guard = self.flights.try_begin(ThreadOp::Reload)?;
        let fresh = Self::fetch(&self.executor, self.api.as_ref(), self.article_id).await?;
        *self.state.lock() = fresh;
        debug!(article = %self.article_id, "Article reloaded");
        Ok(())
    }

    // --- Snapshots ---

    pub fn article_id(&self) -> ArticleId {
        self.article_id
    }

    pub fn article(&self) -> Article {
        self.state.lock().article.clone()
    }

    pub fn comments(&self) -> CommentTree {
        self.state.lock().comments.clone()
    }

    pub fn thread(&self, id: CommentId) -> Option<CommentThread> {
        self.state.lock().comments.thread(id).cloned()
    }

    pub fn comment(&self, target: CommentTarget) -> Option<Comment> {
        self.state.lock().comments.get(target).cloned()
    }

    pub fn has_more_comments(&self) -> bool {
        self.state.lock().comments.next_page().is_some()
    }

    pub fn has_more_replies(&self, parent: CommentId) -> bool {
        self.state.lock().comments.next_replies(parent).is_some()
    }

    pub fn can_modify_article(&self) -> bool {
        let state = self.state.lock();
        can_modify(&state.article, state.viewer)
    }

    pub fn can_modify_comment(&self, target: CommentTarget) -> bool {
        let state = self.state.lock();
        state
            .comments
            .get(target)
            .map_or(false, |c| !c.pending && can_modify(c, state.viewer))
    }

    // --- Pagination ---

    /// Loads the next page of top-level comments. Returns how many were new.
    pub async fn load_more_comments(&self) -> ForumResult<usize> {
        let _guard = self.flights.try_begin(ThreadOp::LoadMoreComments)?;
        let cursor = self.state.lock().comments.next_page().cloned().ok_or(ForumError::Exhausted)?;

        let api = self.api.as_ref();
        let cursor = &cursor;
        let page = self
            .executor
            .execute("load_more_comments", move |access| async move {
                api.fetch_comment_page(&access, cursor).await
            })
            .await?;

        let added = self.state.lock().comments.merge_page(page);
        debug!(added, "Merged a page of comments");
        Ok(added)
    }

    /// Fetches the first page of replies under `parent` and reveals them.
    pub async fn load_replies(&self, parent: CommentId) -> ForumResult<usize> {
        let _guard = self.flights.try_begin(ThreadOp::LoadReplies(parent))?;
        self.state.lock().comment(CommentTarget::TopLevel(parent))?;

        let api = self.api.as_ref();
        let page = self
            .executor
            .execute("load_replies", move |access| async move {
                api.fetch_replies(&access, parent).await
            })
            .await?;

        self.state.lock().comments.merge_replies(parent, page)
    }

    /// Loads the next page of replies under `parent`.
    pub async fn load_more_replies(&self, parent: CommentId) -> ForumResult<usize> {
        let _guard = self.flights.try_begin(ThreadOp::LoadReplies(parent))?;
        let cursor = {
            let state = self.state.lock();
            state.comment(CommentTarget::TopLevel(parent))?;
            state.comments.next_replies(parent).cloned().ok_or(ForumError::Exhausted)?
        };

        let api = self.api.as_ref();
        let cursor = &cursor;
        let page = self
            .executor
            .execute("load_more_replies", move |access| async move {
                api.fetch_reply_page(&access, cursor).await
            })
            .await?;

        self.state.lock().comments.merge_replies(parent, page)
    }

    pub fn show_replies(&self, parent: CommentId) -> ForumResult<()> {
        self.state.lock().comments.show_replies(parent)
    }

    pub fn hide_replies(&self, parent: CommentId) -> ForumResult<()> {
        self.state.lock().comments.hide_replies(parent)
    }

    // --- New comments ---

    /// Posts a top-level comment. A blank body does nothing and returns `None`.
    ///
    /// The comment is shown at the top of the thread while the request runs
    /// and replaced by the server's version once it is confirmed.
    pub async fn submit_comment(&self, body: &str) -> ForumResult<Option<Comment>> {
        if body.trim().is_empty() {
            return Ok(None);
        }
        let _guard = self.flights.try_begin(ThreadOp::SubmitComment)?;
        let session = self.executor.session().current().await?;

        let provisional = {
            let mut state = self.state.lock();
            state.interactive_article()?;
            let draft = self.draft(&session, None, body);
            state.comments.insert_provisional(draft)
        };

        let api = self.api.as_ref();
        let article = self.article_id;
        let result = self
            .executor
            .execute("submit_comment", move |access| async move {
                api.create_comment(&access, article, None, body).await
            })
            .await;

        let mut state = self.state.lock();
        match result {
            Ok(created) => {
                let created = Self::settled(created);
                if state.comments.confirm_provisional(provisional, created.clone()).is_err() {
                    state.comments.prepend(created.clone());
                }
                info!(comment = %created.id, "Comment posted");
                Ok(Some(created))
            }
            Err(e) => {
                warn!("Posting a comment failed: {}", e);
                state.comments.discard_provisional(provisional);
                Err(e)
            }
        }
    }

    /// Posts a reply under `parent`. A blank body does nothing and returns `None`.
    ///
    /// The reply box is closed only when the server confirms the reply.
    pub async fn submit_reply(
        &self,
        parent: CommentId,
        body: &str,
    ) -> ForumResult<Option<Comment>> {
        if body.trim().is_empty() {
            return Ok(None);
        }
        let _guard = self.flights.try_begin(ThreadOp::Reply(parent))?;
        let session = self.executor.session().current().await?;

        let provisional = {
            let mut state = self.state.lock();
            state.interactive_article()?;
            state.interactive_comment(CommentTarget::TopLevel(parent))?;
            let draft = self.draft(&session, Some(parent), body);
            state.comments.insert_provisional_reply(parent, draft)?
        };

        let api = self.api.as_ref();
        let article = self.article_id;
        let result = self
            .executor
            .execute("submit_reply", move |access| async move {
                api.create_comment(&access, article, Some(parent), body).await
            })
            .await;

        let mut state = self.state.lock();
        match result {
            Ok(created) => {
                let created = Self::settled(created);
                let placed = state
                    .comments
                    .confirm_provisional(provisional, created.clone())
                    .or_else(|_| state.comments.prepend_reply(parent, created.clone()));
                if placed.is_err() {
                    // A reload dropped the parent while the request ran. The reply exists.
                    warn!(
                        parent = %parent,
                        reply = %created.id,
                        "Reply posted to a comment no longer loaded"
                    );
                }
                info!(parent = %parent, reply = %created.id, "Reply posted");
                Ok(Some(created))
            }
            Err(e) => {
                warn!("Posting a reply to {} failed: {}", parent, e);
                state.comments.discard_provisional(provisional);
                Err(e)
            }
        }
    }

    fn draft(&self, session: &Session, parent: Option<CommentId>, body: &str) -> Comment {
        Comment {
            id: CommentId::default(),
            article: self.article_id,
            parent,
            author: session.author_snapshot(),
            body: body.to_string(),
            created_at: Utc::now(),
            likes_count: 0,
            like_status: false,
            replies_count: 0,
            deleted: false,
            edited: false,
            pending: true,
            edit: None,
        }
    }

    /// A freshly created comment has never been liked by anyone.
    fn settled(mut created: Comment) -> Comment {
        created.like_status = false;
        created.pending = false;
        created.edit = None;
        created
    }

    // --- Reply box ---

    /// Opens the reply box under `parent` and fetches its first page of replies.
    ///
    /// The box stays open even if the fetch fails.
    pub async fn begin_reply(&self, parent: CommentId) -> ForumResult<usize> {
        {
            let mut state = self.state.lock();
            state.interactive_comment(CommentTarget::TopLevel(parent))?;
            state.comments.begin_reply(parent)?;
        }
        self.load_replies(parent).await
    }

    pub fn update_reply(&self, parent: CommentId, value: &str) -> ForumResult<()> {
        self.state.lock().comments.update_reply(parent, value)
    }

    pub fn cancel_reply(&self, parent: CommentId) -> ForumResult<()> {
        self.state.lock().comments.cancel_reply(parent)
    }

    // --- Comment likes, edits and deletes ---

    /// Likes or unlikes a comment depending on its current status.
    pub async fn toggle_comment_like(&self, target: CommentTarget) -> ForumResult<Comment> {
        let id = target.id();
        let _guard = self.flights.try_begin(ThreadOp::CommentLike(id))?;
        let liked = !self.state.lock().interactive_comment(target)?.like_status;

        let api = self.api.as_ref();
        self.executor
            .execute("toggle_comment_like", move |access| async move {
                api.set_comment_like(&access, id, liked).await
            })
            .await?;

        let mut state = self.state.lock();
        let comment = state.comments.set_liked(target, liked)?;
        debug!(comment = %id, liked, likes = comment.likes_count, "Comment like toggled");
        Ok(comment.clone())
    }

    pub fn begin_comment_edit(&self, target: CommentTarget) -> ForumResult<()> {
        let mut state = self.state.lock();
        state.owned_comment(target, "edit this comment")?;
        state.comments.begin_edit(target)
    }

    pub fn update_comment_edit(&self, target: CommentTarget, value: &str) -> ForumResult<()> {
        self.state.lock().comments.update_edit(target, value)
    }

    pub fn cancel_comment_edit(&self, target: CommentTarget) -> ForumResult<()> {
        self.state.lock().comments.cancel_edit(target)
    }

    /// Saves a new body for one of the viewer's comments.
    pub async fn save_comment_edit(&self, target: CommentTarget, value: &str) -> ForumResult<()> {
        if value.trim().is_empty() {
            return Err(ForumError::Invalid("comment body is empty"));
        }
        let id = target.id();
        let _guard = self.flights.try_begin(ThreadOp::CommentEdit(id))?;
        self.state.lock().owned_comment(target, "edit this comment")?;

        let api = self.api.as_ref();
        self.executor
            .execute("save_comment_edit", move |access| async move {
                api.edit_comment(&access, id, value).await
            })
            .await?;

        self.state.lock().comments.apply_edit(target, value)?;
        info!(comment = %id, "Comment edited");
        Ok(())
    }

    /// Soft-deletes one of the viewer's comments. The article's comment
    /// count is left as the server reported it.
    pub async fn delete_comment(&self, target: CommentTarget) -> ForumResult<()> {
        let id = target.id();
        let _guard = self.flights.try_begin(ThreadOp::CommentDelete(id))?;
        self.state.lock().owned_comment(target, "delete this comment")?;

        let api = self.api.as_ref();
        self.executor
            .execute("delete_comment", move |access| async move {
                api.delete_comment(&access, id).await
            })
            .await?;

        self.state.lock().comments.tombstone(target)?;
        info!(comment = %id, "Comment deleted");
        Ok(())
    }

    // --- Article ---

    pub async fn toggle_article_like(&self) -> ForumResult<Article> {
        let _guard = self.flights.try_begin(ThreadOp::ArticleLike)?;
        let liked = !self.state.lock().interactive_article()?.like_status;
        let action = if liked { ArticleAction::Like } else { ArticleAction::Unlike };
        self.article_action("toggle_article_like", action).await?;

        let mut state = self.state.lock();
        state.article.set_liked(liked);
        Ok(state.article.clone())
    }

    pub async fn toggle_article_save(&self) -> ForumResult<Article> {
        let _guard = self.flights.try_begin(ThreadOp::ArticleSave)?;
        let saved = !self.state.lock().interactive_article()?.save_status;
        let action = if saved { ArticleAction::Save } else { ArticleAction::Unsave };
        self.article_action("toggle_article_save", action).await?;

        let mut state = self.state.lock();
        state.article.set_saved(saved);
        Ok(state.article.clone())
    }

    async fn article_action(
        &self,
        operation: &'static str,
        action: ArticleAction,
    ) -> ForumResult<()> {
        let api = self.api.as_ref();
        let id = self.article_id;
        self.executor
            .execute(operation, move |access| async move {
                api.article_action(&access, id, action).await
            })
            .await
    }

    pub fn begin_article_edit(&self) -> ForumResult<()> {
        let mut state = self.state.lock();
        state.owned_article("edit this article")?;
        state.article.begin_edit();
        Ok(())
    }

    pub fn update_article_edit(&self, title: &str, body: &str) {
        self.state.lock().article.update_edit(title, body);
    }

    pub fn cancel_article_edit(&self) {
        self.state.lock().article.cancel_edit();
    }

    /// Saves a new title and body for the viewer's article.
    pub async fn save_article_edit(&self, title: &str, body: &str) -> ForumResult<Article> {
        let (title, body) = (title.trim(), body.trim());
        if title.is_empty() {
            return Err(ForumError::Invalid("article title is empty"));
        }
        if body.is_empty() {
            return Err(ForumError::Invalid("article body is empty"));
        }
        let _guard = self.flights.try_begin(ThreadOp::ArticleEdit)?;
        self.state.lock().owned_article("edit this article")?;

        let api = self.api.as_ref();
        let id = self.article_id;
        self.executor
            .execute("save_article_edit", move |access| async move {
                api.edit_article(&access, id, title, body).await
            })
            .await?;

        let mut state = self.state.lock();
        state.article.apply_edit(title, body);
        info!(article = %id, "Article edited");
        Ok(state.article.clone())
    }

    /// Soft-deletes the viewer's article.
    pub async fn delete_article(&self) -> ForumResult<()> {
        let _guard = self.flights.try_begin(ThreadOp::ArticleDelete)?;
        self.state.lock().owned_article("delete this article")?;

        let api = self.api.as_ref();
        let id = self.article_id;
        self.executor
            .execute("delete_article", move |access| async move {
                api.delete_article(&access, id).await
            })
            .await?;

        self.state.lock().article.tombstone();
        info!(article = %id, "Article deleted");
        Ok(())
    }
}
