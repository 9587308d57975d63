//! services/client/src/adapters/http.rs
//!
//! This module contains the HTTP adapter, the concrete implementation of the
//! `ForumApi` and `AccountApi` ports from the `core` crate. It talks to the
//! forum backend's REST API using `reqwest`.

use crate::adapters::records::{
    AccessRecord, ArticleDetailEnvelope, ArticleEditBody, ArticleListEnvelope, ArticleRecord,
    CommentEditBody, CommentListEnvelope, CommentRecord, CredentialsBody, EmailBody, ErrorRecord,
    NewArticleBody, NewCommentBody, RefreshBody, UserRecord, ValidationBody,
};
use crate::error::ClientError;
use async_trait::async_trait;
use campus_forum_core::domain::{
    Article, ArticleDetail, ArticleId, Comment, CommentId, Cursor, FeedKind, NewArticle, Page,
    Session,
};
use campus_forum_core::ports::{AccountApi, ArticleAction, ForumApi, PortError, PortResult};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, warn};

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A `reqwest`-backed adapter for the forum backend.
#[derive(Clone)]
pub struct ReqwestForumAdapter {
    client: reqwest::Client,
    base_url: String,
}

impl ReqwestForumAdapter {
    /// Creates a new adapter for the backend at `base_url`. Every request is
    /// bounded by `timeout`.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        debug!(%method, %url, "Forum request");
        self.client.request(method, url)
    }

    fn authed(&self, method: Method, path: &str, access: &str) -> RequestBuilder {
        self.request(method, path).bearer_auth(access)
    }

    /// Follows a server-issued cursor. Absolute cursors are used verbatim;
    /// relative ones are resolved against the base URL.
    fn follow(&self, cursor: &Cursor, access: &str) -> RequestBuilder {
        let raw = cursor.as_str();
        let request = if raw.starts_with("http://") || raw.starts_with("https://") {
            debug!(url = raw, "Forum request (cursor)");
            self.client.get(raw)
        } else {
            self.request(Method::GET, raw)
        };
        request.bearer_auth(access)
    }

    fn feed_path(kind: &FeedKind) -> &'static str {
        match kind {
            FeedKind::Recent => "/community/article/",
            FeedKind::Hot => "/community/article/hot/",
            FeedKind::Preference => "/community/article/preference/",
            FeedKind::Search(_) => "/community/article/search/",
            FeedKind::Posted => "/community/article/posted_articles/",
            FeedKind::Commented => "/community/article/commented_articles/",
            FeedKind::Saved => "/community/article/saved_articles/",
            FeedKind::Liked => "/community/article/liked_articles/",
        }
    }
}

//=========================================================================================
// Response Handling
//=========================================================================================

fn transport_error(e: reqwest::Error) -> PortError {
    if e.is_timeout() {
        PortError::Timeout
    } else {
        PortError::Transport(e.to_string())
    }
}

/// Pulls the backend's `detail` message out of an error body.
async fn detail_of(response: Response) -> String {
    let status = response.status();
    match response.text().await {
        Ok(text) => serde_json::from_str::<ErrorRecord>(&text)
            .map(|e| e.detail)
            .unwrap_or_else(|_| {
                if text.trim().is_empty() {
                    status.canonical_reason().unwrap_or("no details").to_string()
                } else {
                    text
                }
            }),
        Err(_) => status.canonical_reason().unwrap_or("no details").to_string(),
    }
}

/// Sends a request whose 401 means the access credential was refused.
///
/// `304 Not Modified` counts as success: the backend already holds the
/// requested state.
async fn send(request: RequestBuilder) -> PortResult<Response> {
    let response = request.send().await.map_err(transport_error)?;
    let status = response.status();
    if status.is_success() || status == StatusCode::NOT_MODIFIED {
        return Ok(response);
    }
    match status {
        StatusCode::UNAUTHORIZED => Err(PortError::Unauthorized),
        StatusCode::NOT_FOUND => Err(PortError::NotFound(detail_of(response).await)),
        _ => {
            let detail = detail_of(response).await;
            warn!(status = status.as_u16(), %detail, "Forum request rejected");
            Err(PortError::Rejected {
                status: status.as_u16(),
                detail,
            })
        }
    }
}

/// Sends an unauthenticated account request. A 401 here is a refusal of the
/// submitted credentials, not of an access credential.
async fn send_public(request: RequestBuilder) -> PortResult<Response> {
    match send(request).await {
        Err(PortError::Unauthorized) => Err(PortError::Rejected {
            status: StatusCode::UNAUTHORIZED.as_u16(),
            detail: "Incorrect email or password.".to_string(),
        }),
        other => other,
    }
}

async fn json<T: DeserializeOwned>(response: Response) -> PortResult<T> {
    response
        .json::<T>()
        .await
        .map_err(|e| PortError::Unexpected(format!("Malformed response body: {}", e)))
}

async fn done(request: RequestBuilder) -> PortResult<()> {
    send(request).await.map(|_| ())
}

//=========================================================================================
// ForumApi Implementation
//=========================================================================================

#[async_trait]
impl ForumApi for ReqwestForumAdapter {
    async fn fetch_feed(&self, access: &str, kind: &FeedKind) -> PortResult<Page<Article>> {
        let mut request = self.authed(Method::GET, Self::feed_path(kind), access);
        if let FeedKind::Search(query) = kind {
            request = request.query(&[("search_content", query.as_str())]);
        }
        let envelope: ArticleListEnvelope = json(send(request).await?).await?;
        Ok(envelope.to_domain())
    }

    async fn fetch_article_page(&self, access: &str, cursor: &Cursor) -> PortResult<Page<Article>> {
        let envelope: ArticleListEnvelope = json(send(self.follow(cursor, access)).await?).await?;
        Ok(envelope.to_domain())
    }

    async fn fetch_article(&self, access: &str, id: ArticleId) -> PortResult<ArticleDetail> {
        let path = format!("/community/article/{}/", id);
        let response = send(self.authed(Method::GET, &path, access)).await?;
        let envelope: ArticleDetailEnvelope = json(response).await?;
        Ok(envelope.to_domain())
    }

    async fn create_article(&self, access: &str, article: &NewArticle) -> PortResult<Article> {
        let body = NewArticleBody {
            title: &article.title,
            body: &article.body,
            unicon: article.own_school_only,
            course_code: &article.course_codes,
        };
        let request = self.authed(Method::POST, "/community/article/", access).json(&body);
        let record: ArticleRecord = json(send(request).await?).await?;
        Ok(record.to_domain())
    }

    async fn edit_article(
        &self,
        access: &str,
        id: ArticleId,
        title: &str,
        body: &str,
    ) -> PortResult<()> {
        let path = format!("/community/article/{}/", id);
        done(self.authed(Method::PATCH, &path, access).json(&ArticleEditBody { title, body })).await
    }

    async fn delete_article(&self, access: &str, id: ArticleId) -> PortResult<()> {
        let path = format!("/community/article/{}/", id);
        done(self.authed(Method::DELETE, &path, access)).await
    }

    async fn article_action(
        &self,
        access: &str,
        id: ArticleId,
        action: ArticleAction,
    ) -> PortResult<()> {
        let path = format!("/community/article/{}/{}/", id, action.as_str());
        done(self.authed(Method::POST, &path, access)).await
    }

    async fn fetch_comment_page(&self, access: &str, cursor: &Cursor) -> PortResult<Page<Comment>> {
        let envelope: CommentListEnvelope = json(send(self.follow(cursor, access)).await?).await?;
        Ok(envelope.to_domain())
    }

    async fn fetch_replies(&self, access: &str, parent: CommentId) -> PortResult<Page<Comment>> {
        let path = format!("/community/comment/{}/", parent);
        let response = send(self.authed(Method::GET, &path, access)).await?;
        let envelope: CommentListEnvelope = json(response).await?;
        Ok(envelope.to_domain())
    }

    async fn fetch_reply_page(&self, access: &str, cursor: &Cursor) -> PortResult<Page<Comment>> {
        let envelope: CommentListEnvelope = json(send(self.follow(cursor, access)).await?).await?;
        Ok(envelope.to_domain())
    }

    async fn create_comment(
        &self,
        access: &str,
        article: ArticleId,
        parent: Option<CommentId>,
        body: &str,
    ) -> PortResult<Comment> {
        let payload = NewCommentBody {
            body,
            article: article.0,
            parent_comment: parent.map(|p| p.0),
        };
        let request = self.authed(Method::POST, "/community/comment/", access).json(&payload);
        let record: CommentRecord = json(send(request).await?).await?;
        Ok(record.to_domain())
    }

    async fn edit_comment(&self, access: &str, id: CommentId, body: &str) -> PortResult<()> {
        let path = format!("/community/comment/{}/", id);
        done(self.authed(Method::PATCH, &path, access).json(&CommentEditBody { body })).await
    }

    async fn delete_comment(&self, access: &str, id: CommentId) -> PortResult<()> {
        let path = format!("/community/comment/{}/", id);
        done(self.authed(Method::DELETE, &path, access)).await
    }

    async fn set_comment_like(&self, access: &str, id: CommentId, liked: bool) -> PortResult<()> {
        let action = if liked { "like" } else { "unlike" };
        let path = format!("/community/comment/{}/{}/", id, action);
        done(self.authed(Method::POST, &path, access)).await
    }
}

//=========================================================================================
// AccountApi Implementation
//=========================================================================================

#[async_trait]
impl AccountApi for ReqwestForumAdapter {
    async fn refresh_access(&self, refresh: &str) -> PortResult<String> {
        let request = self
            .request(Method::POST, "/account/token/refresh")
            .json(&RefreshBody { refresh });
        let record: AccessRecord = json(send(request).await?).await?;
        Ok(record.access)
    }

    async fn login(&self, email: &str, password: &str) -> PortResult<Session> {
        let request = self
            .request(Method::POST, "/account/user/login/")
            .json(&CredentialsBody { email, password });
        let response = request.send().await.map_err(transport_error)?;

        // An account awaiting e-mail validation is answered with 403 and the
        // usual user payload.
        if response.status() == StatusCode::FORBIDDEN {
            let mut session = json::<UserRecord>(response).await?.to_domain();
            session.validated = false;
            return Ok(session);
        }
        let response = match response.status() {
            StatusCode::UNAUTHORIZED => {
                return Err(PortError::Rejected {
                    status: StatusCode::UNAUTHORIZED.as_u16(),
                    detail: detail_of(response).await,
                })
            }
            s if s.is_success() => response,
            s => {
                return Err(PortError::Rejected {
                    status: s.as_u16(),
                    detail: detail_of(response).await,
                })
            }
        };
        Ok(json::<UserRecord>(response).await?.to_domain())
    }

    async fn register(&self, email: &str, password: &str) -> PortResult<Session> {
        let request = self
            .request(Method::POST, "/account/user/")
            .json(&CredentialsBody { email, password });
        let record: UserRecord = json(send_public(request).await?).await?;
        Ok(record.to_domain())
    }

    async fn confirm_validation(&self, access: &str, code: &str) -> PortResult<()> {
        let request = self
            .authed(Method::POST, "/account/user/validate/", access)
            .json(&ValidationBody { validation_code: code });
        done(request).await
    }

    async fn forgot_password(&self, email: &str) -> PortResult<()> {
        let request = self
            .request(Method::POST, "/account/user/forgotpassword/")
            .json(&EmailBody { email });
        send_public(request).await.map(|_| ())
    }
}
