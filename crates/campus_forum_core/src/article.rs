//! crates/campus_forum_core/src/article.rs
//!
//! The article state store: pure transitions over a single `Article`, and
//! publishing of new articles.

use crate::domain::{apply_like, Article, ArticleEdit, NewArticle, DELETED_BODY, DELETED_TITLE};
use crate::error::{ForumError, ForumResult};
use crate::executor::AuthExecutor;
use crate::ports::ForumApi;
use tracing::info;

impl Article {
    pub fn is_editing(&self) -> bool {
        self.edit.is_some()
    }

    /// Moves `like_status` and `likes_count` together. Returns whether anything changed.
    pub fn set_liked(&mut self, liked: bool) -> bool {
        apply_like(&mut self.like_status, &mut self.likes_count, liked)
    }

    pub fn set_saved(&mut self, saved: bool) {
        self.save_status = saved;
    }

    /// Opens the edit buffers, seeded with the current title and body.
    pub fn begin_edit(&mut self) {
        self.edit = Some(ArticleEdit {
            title: self.title.clone(),
            body: self.body.clone(),
        });
    }

    /// Replaces the edit buffers. Ignored when not editing.
    pub fn update_edit(&mut self, title: impl Into<String>, body: impl Into<String>) {
        if let Some(edit) = self.edit.as_mut() {
            edit.title = title.into();
            edit.body = body.into();
        }
    }

    pub fn cancel_edit(&mut self) {
        self.edit = None;
    }

    /// Applies a confirmed edit.
    pub fn apply_edit(&mut self, title: impl Into<String>, body: impl Into<String>) {
        self.title = title.into();
        self.body = body.into();
        self.edited = true;
        self.edit = None;
    }

    /// Soft-deletes the article. The record stays in place.
    pub fn tombstone(&mut self) {
        self.title = DELETED_TITLE.to_string();
        self.body = DELETED_BODY.to_string();
        self.deleted = true;
        self.edit = None;
    }
}

impl NewArticle {
    /// Trims the fields, drops blank course codes and rejects blank titles or bodies.
    pub fn validated(self) -> ForumResult<Self> {
        let title = self.title.trim().to_string();
        let body = self.body.trim().to_string();
        if title.is_empty() {
            return Err(ForumError::Invalid("article title is empty"));
        }
        if body.is_empty() {
            return Err(ForumError::Invalid("article body is empty"));
        }
        let course_codes = self
            .course_codes
            .into_iter()
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .collect();
        Ok(Self {
            title,
            body,
            own_school_only: self.own_school_only,
            course_codes,
        })
    }
}

/// Publishes a new article and returns it as the server stored it.
pub async fn publish_article(
    executor: &AuthExecutor,
    api: &dyn ForumApi,
    draft: NewArticle,
) -> ForumResult<Article> {
    let draft = draft.validated()?;
    let draft = &draft;
    let article = executor
        .execute("publish_article", move |access| async move {
            api.create_article(&access, draft).await
        })
        .await?;
    info!(article = %article.id, "Article published");
    Ok(article)
}
