mod common;

use campus_forum_core::error::ForumError;
use client_lib::cli::{run, Command, Sort};
use client_lib::config::Config;
use client_lib::error::ClientError;
use client_lib::state::AppState;
use common::FakeServer;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::Level;

fn state(server: &FakeServer, session_path: &Path) -> AppState {
    let config = Config {
        api_url: server.base.clone(),
        log_level: Level::DEBUG,
        session_path: session_path.to_path_buf(),
        request_timeout: Duration::from_secs(5),
    };
    AppState::new(Arc::new(config)).unwrap()
}

async fn login(state: &AppState) {
    run(
        Command::Login {
            email: "me@ntu.edu.tw".into(),
            password: "secret".into(),
        },
        state,
    )
    .await
    .unwrap();
}

#[tokio::test]
async fn stale_access_is_refreshed_and_persisted() {
    let server = FakeServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let session_path = dir.path().join("session.json");
    let state = state(&server, &session_path);

    // The login hands out "stale"; the backend only accepts "fresh".
    login(&state).await;
    let output = run(Command::Show { article: 42, pages: 2, replies: false }, &state)
        .await
        .unwrap();

    assert!(output.contains("Article 42"));
    assert!(output.contains("First"));
    assert!(output.contains("Third"));
    let hits = server.hits();
    assert_eq!(hits.iter().filter(|h| h.as_str() == "POST /account/token/refresh").count(), 1);

    let stored = std::fs::read_to_string(&session_path).unwrap();
    assert!(stored.contains("\"access\": \"fresh\""));
}

#[tokio::test]
async fn rejected_refresh_signs_the_user_out() {
    let server = FakeServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let session_path = dir.path().join("session.json");
    let state = state(&server, &session_path);

    login(&state).await;
    // Expire the access credential and revoke the refresh credential.
    server.set_valid_access("unreachable");
    let stored = std::fs::read_to_string(&session_path).unwrap().replace("\"r1\"", "\"revoked\"");
    std::fs::write(&session_path, stored).unwrap();

    let result = run(Command::Feed { sort: Sort::Hot, pages: 1 }, &state).await;
    assert!(matches!(result, Err(ClientError::Forum(ForumError::SessionExpired))));
    assert!(!session_path.exists());
}

#[tokio::test]
async fn unvalidated_login_is_kept_and_reported() {
    let server = FakeServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let session_path = dir.path().join("session.json");
    let state = state(&server, &session_path);

    let output = run(
        Command::Login {
            email: "me@ntu.edu.tw".into(),
            password: "pending".into(),
        },
        &state,
    )
    .await
    .unwrap();

    assert!(output.contains("forum verify"));
    let whoami = run(Command::Whoami, &state).await.unwrap();
    assert!(whoami.contains("not validated"));
}

#[tokio::test]
async fn commands_need_a_session() {
    let server = FakeServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let state = state(&server, &dir.path().join("session.json"));

    let result = run(Command::Feed { sort: Sort::Recent, pages: 1 }, &state).await;
    assert!(matches!(result, Err(ClientError::Forum(ForumError::NotAuthenticated))));
    assert!(server.hits().is_empty());
}

#[tokio::test]
async fn comment_and_like_go_through_the_thread() {
    let server = FakeServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let state = state(&server, &dir.path().join("session.json"));
    login(&state).await;

    let posted = run(Command::Comment { article: 42, body: "Great notes".into() }, &state)
        .await
        .unwrap();
    assert_eq!(posted, "Posted comment 77.");

    let liked = run(Command::Like { article: 42 }, &state).await.unwrap();
    assert_eq!(liked, "Liked article 42 (5 likes).");
    assert!(server.hits().contains(&"POST /community/article/42/like/".to_string()));
}
