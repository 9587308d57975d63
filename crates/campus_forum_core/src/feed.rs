//! crates/campus_forum_core/src/feed.rs
//!
//! Article lists: the sorted community feeds, keyword search and the
//! viewer's own collections.

use crate::capability::can_interact;
use crate::domain::{Article, ArticleId, Cursor, FeedKind};
use crate::error::{ForumError, ForumResult};
use crate::executor::AuthExecutor;
use crate::inflight::InFlight;
use crate::paging::merge_unique;
use crate::ports::{ArticleAction, ForumApi};
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum FeedOp {
    Refresh,
    LoadMore,
    Like(ArticleId),
    Save(ArticleId),
}

impl fmt::Display for FeedOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeedOp::Refresh => write!(f, "refreshing the feed"),
            FeedOp::LoadMore => write!(f, "loading more articles"),
            FeedOp::Like(id) => write!(f, "liking article {}", id),
            FeedOp::Save(id) => write!(f, "saving article {}", id),
        }
    }
}

#[derive(Default)]
struct FeedState {
    articles: Vec<Article>,
    next: Option<Cursor>,
}

/// One paginated list of articles.
pub struct Feed {
    executor: AuthExecutor,
    api: Arc<dyn ForumApi>,
    kind: FeedKind,
    state: Mutex<FeedState>,
    flights: InFlight<FeedOp>,
}

impl Feed {
    /// Loads the first page of `kind`. A blank search query is refused
    /// without a request.
    pub async fn open(
        executor: AuthExecutor,
        api: Arc<dyn ForumApi>,
        kind: FeedKind,
    ) -> ForumResult<Self> {
        let kind = match kind {
            FeedKind::Search(query) => {
                let query = query.trim();
                if query.is_empty() {
                    return Err(ForumError::Invalid("search query is empty"));
                }
                FeedKind::Search(query.to_string())
            }
            other => other,
        };

        let feed = Self {
            executor,
            api,
            kind,
            state: Mutex::new(FeedState::default()),
            flights: InFlight::default(),
        };
        feed.refresh().await?;
        info!(kind = ?feed.kind, articles = feed.len(), "Feed opened");
        Ok(feed)
    }

    /// Replaces the list with a fresh first page.
    pub async fn refresh(&self) -> ForumResult<()> {
        let _guard = self.flights.try_begin(FeedOp::Refresh)?;
        let api = self.api.as_ref();
        let kind = &self.kind;
        let page = self
            .executor
            .execute("fetch_feed", move |access| async move { api.fetch_feed(&access, kind).await })
            .await?;

        let mut state = self.state.lock();
        state.articles.clear();
        merge_unique(&mut state.articles, page.items, |a| a.id);
        state.next = page.next;
        Ok(())
    }

    /// Appends the next page, skipping articles already listed. Returns how many were new.
    pub async fn load_more(&self) -> ForumResult<usize> {
        let _guard = self.flights.try_begin(FeedOp::LoadMore)?;
        let cursor = self.state.lock().next.clone().ok_or(ForumError::Exhausted)?;

        let api = self.api.as_ref();
        let cursor = &cursor;
        let page = self
            .executor
            .execute("load_more_articles", move |access| async move {
                api.fetch_article_page(&access, cursor).await
            })
            .await?;

        let mut state = self.state.lock();
        let added = merge_unique(&mut state.articles, page.items, |a| a.id);
        state.next = page.next;
        debug!(added, "Merged a page of articles");
        Ok(added)
    }

    pub fn kind(&self) -> &FeedKind {
        &self.kind
    }

    pub fn articles(&self) -> Vec<Article> {
        self.state.lock().articles.clone()
    }

    pub fn len(&self) -> usize {
        self.state.lock().articles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn has_more(&self) -> bool {
        self.state.lock().next.is_some()
    }

    /// Likes or unlikes a listed article depending on its current status.
    pub async fn toggle_like(&self, id: ArticleId) -> ForumResult<Article> {
        let _guard = self.flights.try_begin(FeedOp::Like(id))?;
        let liked = !self.with_article(id, |a| a.like_status)?;
        let action = if liked { ArticleAction::Like } else { ArticleAction::Unlike };
        self.article_action("toggle_feed_like", id, action).await?;
        self.update(id, |a| {
            a.set_liked(liked);
        })
    }

    /// Saves or unsaves a listed article depending on its current status.
    pub async fn toggle_save(&self, id: ArticleId) -> ForumResult<Article> {
        let _guard = self.flights.try_begin(FeedOp::Save(id))?;
        let saved = !self.with_article(id, |a| a.save_status)?;
        let action = if saved { ArticleAction::Save } else { ArticleAction::Unsave };
        self.article_action("toggle_feed_save", id, action).await?;
        self.update(id, |a| a.set_saved(saved))
    }

    async fn article_action(
        &self,
        operation: &'static str,
        id: ArticleId,
        action: ArticleAction,
    ) -> ForumResult<()> {
        let api = self.api.as_ref();
        self.executor
            .execute(operation, move |access| async move {
                api.article_action(&access, id, action).await
            })
            .await
    }

    fn with_article<T>(&self, id: ArticleId, read: impl FnOnce(&Article) -> T) -> ForumResult<T> {
        let state = self.state.lock();
        let article = state
            .articles
            .iter()
            .find(|a| a.id == id)
            .ok_or(ForumError::UnknownArticle(id))?;
        if !can_interact(article) {
            return Err(ForumError::Deleted("article"));
        }
        Ok(read(article))
    }

    fn update(&self, id: ArticleId, change: impl FnOnce(&mut Article)) -> ForumResult<Article> {
        let mut state = self.state.lock();
        let article = state
            .articles
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or(ForumError::UnknownArticle(id))?;
        change(article);
        Ok(article.clone())
    }
}
