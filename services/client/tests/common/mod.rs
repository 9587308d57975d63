//! An in-process fake of the forum backend, served with axum on a random port.
#![allow(dead_code)]

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

pub struct Backend {
    pub base: String,
    /// The only access credential the backend accepts.
    pub valid_access: String,
    pub article_liked: bool,
    /// Every request as `"METHOD path?query"`.
    pub hits: Vec<String>,
    pub bodies: Vec<Value>,
}

pub type Shared = Arc<Mutex<Backend>>;

pub struct FakeServer {
    pub base: String,
    pub state: Shared,
}

impl FakeServer {
    pub async fn start() -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        let state = Arc::new(Mutex::new(Backend {
            base: base.clone(),
            valid_access: "fresh".to_string(),
            article_liked: false,
            hits: Vec::new(),
            bodies: Vec::new(),
        }));

        let app = Router::new()
            .route("/account/user/login/", post(login))
            .route("/account/token/refresh", post(refresh))
            .route("/community/article/", get(feed))
            .route("/community/article/hot/", get(feed))
            .route("/community/article/search/", get(feed))
            .route("/community/article/{id}/", get(article))
            .route("/community/article/{id}/{action}/", post(article_action))
            .route("/community/comment/", post(create_comment))
            .with_state(state.clone());

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        Self { base, state }
    }

    pub fn hits(&self) -> Vec<String> {
        self.state.lock().unwrap().hits.clone()
    }

    pub fn bodies(&self) -> Vec<Value> {
        self.state.lock().unwrap().bodies.clone()
    }

    pub fn set_valid_access(&self, access: &str) {
        self.state.lock().unwrap().valid_access = access.to_string();
    }
}

fn record(state: &Shared, hit: String) {
    state.lock().unwrap().hits.push(hit);
}

fn authorized(state: &Shared, headers: &HeaderMap) -> bool {
    let expected = format!("Bearer {}", state.lock().unwrap().valid_access);
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map_or(false, |v| v == expected)
}

fn unauthorized() -> Response {
    detail(StatusCode::UNAUTHORIZED, "Given token not valid for any token type")
}

fn detail(status: StatusCode, detail: &str) -> Response {
    (status, Json(json!({ "detail": detail }))).into_response()
}

fn query_string(query: &HashMap<String, String>) -> String {
    let mut pairs: Vec<String> = query.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
    pairs.sort();
    pairs.join("&")
}

pub fn user_json(validated: bool) -> Value {
    json!({
        "id": 1, "email": "me@ntu.edu.tw", "initial": "NTU", "color": "#1f6feb",
        "points": 10, "access": "stale", "refresh": "r1", "is_validated": validated
    })
}

pub fn article_json(id: i64, liked: bool) -> Value {
    json!({
        "id": id, "user": 2, "created_at": "2024-03-01T12:00:00Z",
        "views_count": 3, "comments_count": 2, "likes_count": if liked { 5 } else { 4 },
        "deleted": false, "edited": false, "title": format!("Article {}", id), "body": "Body",
        "unicon": false, "like_status": liked, "save_status": false,
        "user_school": "NTU", "user_temp_name": "Quiet Otter", "user_static_points": 7,
        "course_code": []
    })
}

pub fn comment_json(id: i64, parent: Option<i64>, body: &str) -> Value {
    json!({
        "id": id, "user": 1, "created_at": "2024-03-01T13:00:00Z", "comments_count": 0,
        "likes_count": 0, "deleted": false, "edited": false, "body": body,
        "article": 42, "parent_comment": parent, "like_status": false,
        "user_school": "NTU", "user_temp_name": "Me", "user_static_points": 10
    })
}

async fn login(State(state): State<Shared>, Json(body): Json<Value>) -> Response {
    record(&state, "POST /account/user/login/".to_string());
    match body["password"].as_str() {
        Some("secret") => Json(user_json(true)).into_response(),
        Some("pending") => (StatusCode::FORBIDDEN, Json(user_json(false))).into_response(),
        _ => detail(StatusCode::UNAUTHORIZED, "Please enter correct email or password.."),
    }
}

async fn refresh(State(state): State<Shared>, Json(body): Json<Value>) -> Response {
    record(&state, "POST /account/token/refresh".to_string());
    if body["refresh"] == "r1" {
        let access = state.lock().unwrap().valid_access.clone();
        Json(json!({ "access": access })).into_response()
    } else {
        unauthorized()
    }
}

async fn feed(
    State(state): State<Shared>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    record(&state, format!("GET feed?{}", query_string(&query)));
    if !authorized(&state, &headers) {
        return unauthorized();
    }
    let articles = [article_json(1, false), article_json(2, false)];
    Json(json!({ "next": null, "results": { "articles": articles } })).into_response()
}

async fn article(
    State(state): State<Shared>,
    Path(id): Path<i64>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    record(&state, format!("GET /community/article/{}/?{}", id, query_string(&query)));
    if !authorized(&state, &headers) {
        return unauthorized();
    }
    if id != 42 {
        return detail(StatusCode::NOT_FOUND, "No Article matches the given query.");
    }
    let (base, liked) = {
        let s = state.lock().unwrap();
        (s.base.clone(), s.article_liked)
    };
    if query.get("page").map(String::as_str) == Some("2") {
        return Json(json!({
            "next": null,
            "results": {
                "article": article_json(42, liked),
                "comments": [comment_json(3, None, "Third")]
            }
        }))
        .into_response();
    }
    Json(json!({
        "count": 3,
        "next": format!("{}/community/article/42/?cursor=abc%3D&page=2", base),
        "results": {
            "article": article_json(42, liked),
            "comments": [comment_json(1, None, "First"), comment_json(2, None, "Second")]
        }
    }))
    .into_response()
}

async fn article_action(
    State(state): State<Shared>,
    Path((id, action)): Path<(i64, String)>,
    headers: HeaderMap,
) -> Response {
    record(&state, format!("POST /community/article/{}/{}/", id, action));
    if !authorized(&state, &headers) {
        return unauthorized();
    }
    let mut s = state.lock().unwrap();
    match action.as_str() {
        "like" if s.article_liked => StatusCode::NOT_MODIFIED.into_response(),
        "like" => {
            s.article_liked = true;
            Json(json!({ "detail": "The article has been liked by user." })).into_response()
        }
        "save" => detail(StatusCode::BAD_REQUEST, "The article cannot be saved."),
        _ => Json(json!({ "detail": "ok" })).into_response(),
    }
}

async fn create_comment(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    record(&state, "POST /community/comment/".to_string());
    if !authorized(&state, &headers) {
        return unauthorized();
    }
    state.lock().unwrap().bodies.push(body.clone());
    let parent = body["parent_comment"].as_i64();
    let text = body["body"].as_str().unwrap_or_default().to_string();
    (StatusCode::CREATED, Json(comment_json(77, parent, &text))).into_response()
}
