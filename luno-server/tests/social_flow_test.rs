use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use luno_server::{
    api,
    db::Database,
    media::DiskMediaStore,
    messaging::{ClientFrame, RelayEvent},
    session::SessionManager,
    state::AppState,
};

const BOUNDARY: &str = "luno-test-boundary";

struct TestApp {
    router: Router,
    state: AppState,
    uploads: tempfile::TempDir,
}

fn setup() -> TestApp {
    let db = Database::in_memory().expect("Failed to create test database");
    db.initialize().expect("Failed to initialize schema");

    let uploads = tempfile::tempdir().expect("Failed to create upload dir");
    let media = Arc::new(DiskMediaStore::new(uploads.path()));
    let state = AppState::new(db.clone(), SessionManager::new(db), media);

    TestApp {
        router: api::router(state.clone()),
        state,
        uploads,
    }
}

async fn send(app: &TestApp, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into()))
    };
    (status, body)
}

fn request(method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

/// multipart/form-data request with text fields and at most one file part
fn multipart(
    uri: &str,
    token: &str,
    fields: &[(&str, &str)],
    file: Option<(&str, &str, &str, &[u8])>,
) -> Request<Body> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!("--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n")
                .as_bytes(),
        );
    }
    if let Some((name, file_name, content_type, bytes)) = file {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={BOUNDARY}"))
        .body(Body::from(body))
        .unwrap()
}

async fn register(app: &TestApp, username: &str) -> (String, String) {
    let (status, body) = send(
        app,
        request(
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({"username": username, "password": "hunter2"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "register {username}: {body}");

    let token = body["token"].as_str().unwrap().to_string();
    let id = body["user"]["id"].as_str().unwrap().to_string();
    (id, token)
}

#[tokio::test]
async fn test_health() {
    let app = setup();
    let (status, body) = send(&app, request(Method::GET, "/health", None, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Value::String("OK".to_string()));
}

#[tokio::test]
async fn test_registration_and_login_errors() {
    let app = setup();
    register(&app, "alice").await;

    let (status, body) = send(
        &app,
        request(
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({"username": "alice", "password": "other"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"], "Username taken");

    let (status, _) = send(
        &app,
        request(Method::POST, "/api/auth/register", None, Some(json!({"username": "carol"}))),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(
        &app,
        request(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({"username": "alice", "password": "wrong"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"], "Invalid credentials");

    let (status, body) = send(
        &app,
        request(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({"username": "alice", "password": "hunter2"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["username"], "alice");
}

#[tokio::test]
async fn test_authentication_required() {
    let app = setup();

    let (status, body) = send(&app, request(Method::GET, "/api/feed", None, None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["details"], "No token");

    let (status, body) = send(&app, request(Method::GET, "/api/users/me", Some("nope"), None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["details"], "Invalid token");
}

#[tokio::test]
async fn test_logout_revokes_token() {
    let app = setup();
    let (_, token) = register(&app, "alice").await;

    let (status, body) = send(&app, request(Method::POST, "/api/auth/logout", Some(&token), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"ok": true}));

    let (status, _) = send(&app, request(Method::GET, "/api/users/me", Some(&token), None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_follow_post_like_comment_flow() {
    let app = setup();
    let (alice_id, alice) = register(&app, "alice").await;
    let (bob_id, bob) = register(&app, "bob").await;

    // Bob publishes a photo
    let (status, post) = send(
        &app,
        multipart(
            "/api/posts",
            &bob,
            &[("caption", "sunset")],
            Some(("media", "beach.JPG", "image/jpeg", &b"jpeg bytes"[..])),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{post}");
    assert_eq!(post["media_type"], "image");
    assert_eq!(post["caption"], "sunset");
    let media_url = post["media_url"].as_str().unwrap();
    assert!(media_url.starts_with("/uploads/") && media_url.ends_with(".jpg"));
    let stored = app.uploads.path().join(media_url.trim_start_matches("/uploads/"));
    assert_eq!(std::fs::read(stored).unwrap(), b"jpeg bytes");
    let post_id = post["id"].as_str().unwrap().to_string();

    // Not in Alice's feed until Alice follows Bob
    let (_, feed) = send(&app, request(Method::GET, "/api/feed", Some(&alice), None)).await;
    assert_eq!(feed, json!([]));

    let uri = format!("/api/users/{bob_id}/follow");
    let (status, body) = send(&app, request(Method::POST, &uri, Some(&alice), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"ok": true}));
    // Following twice is still ok
    let (status, _) = send(&app, request(Method::POST, &uri, Some(&alice), None)).await;
    assert_eq!(status, StatusCode::OK);

    let like_uri = format!("/api/posts/{post_id}/like");
    send(&app, request(Method::POST, &like_uri, Some(&alice), None)).await;
    send(&app, request(Method::POST, &like_uri, Some(&alice), None)).await;

    let (status, feed) = send(&app, request(Method::GET, "/api/feed", Some(&alice), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(feed.as_array().unwrap().len(), 1);
    assert_eq!(feed[0]["id"], post_id.as_str());
    assert_eq!(feed[0]["author_username"], "bob");
    assert_eq!(feed[0]["likes"], 1);
    assert_eq!(feed[0]["liked"], true);

    let (_, bobs_feed) = send(&app, request(Method::GET, "/api/feed", Some(&bob), None)).await;
    assert_eq!(bobs_feed[0]["likes"], 1);
    assert_eq!(bobs_feed[0]["liked"], false);

    // Comments, including one with no body
    let comment_uri = format!("/api/posts/{post_id}/comment");
    let (status, comment) = send(
        &app,
        request(Method::POST, &comment_uri, Some(&alice), Some(json!({"content": "gorgeous"}))),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(comment["content"], "gorgeous");
    let (status, empty) = send(&app, request(Method::POST, &comment_uri, Some(&bob), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(empty["content"], "");

    let (_, comments) = send(
        &app,
        request(Method::GET, &format!("/api/posts/{post_id}/comments"), Some(&bob), None),
    )
    .await;
    assert_eq!(comments[0]["username"], "alice");
    assert_eq!(comments[0]["content"], "gorgeous");
    assert_eq!(comments[1]["username"], "bob");

    // Counts on both profiles
    let (_, me) = send(&app, request(Method::GET, "/api/users/me", Some(&bob), None)).await;
    assert_eq!(me["followers"], 1);
    assert_eq!(me["following"], 0);
    assert_eq!(me["posts"], 1);

    let (_, profile) = send(
        &app,
        request(Method::GET, &format!("/api/users/{bob_id}"), Some(&alice), None),
    )
    .await;
    assert_eq!(profile["is_following"], true);
    assert_eq!(profile["is_self"], false);

    // Unlike then unfollow
    send(&app, request(Method::POST, &format!("/api/posts/{post_id}/unlike"), Some(&alice), None)).await;
    let (_, feed) = send(&app, request(Method::GET, "/api/feed", Some(&alice), None)).await;
    assert_eq!(feed[0]["likes"], 0);

    send(&app, request(Method::POST, &format!("/api/users/{bob_id}/unfollow"), Some(&alice), None)).await;
    let (_, feed) = send(&app, request(Method::GET, "/api/feed", Some(&alice), None)).await;
    assert_eq!(feed, json!([]));

    let (_, me) = send(&app, request(Method::GET, "/api/users/me", Some(&alice), None)).await;
    assert_eq!(me["id"], alice_id.as_str());
    assert_eq!(me["following"], 0);
}

#[tokio::test]
async fn test_graph_and_content_errors() {
    let app = setup();
    let (alice_id, alice) = register(&app, "alice").await;
    let missing = uuid::Uuid::new_v4();

    let (status, _) = send(
        &app,
        request(Method::POST, &format!("/api/users/{alice_id}/follow"), Some(&alice), None),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        request(Method::POST, &format!("/api/users/{missing}/follow"), Some(&alice), None),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(
        &app,
        request(Method::POST, &format!("/api/posts/{missing}/like"), Some(&alice), None),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["details"], "Post not found");

    let (status, body) = send(
        &app,
        multipart("/api/posts", &alice, &[("caption", "no file")], None),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"], "No file");
}

#[tokio::test]
async fn test_video_upload_and_avatar() {
    let app = setup();
    let (_, alice) = register(&app, "alice").await;

    let (status, post) = send(
        &app,
        multipart("/api/posts", &alice, &[], Some(("media", "clip.mp4", "video/mp4", &b"mp4"[..]))),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(post["media_type"], "video");
    assert_eq!(post["caption"], "");

    let (status, avatar) = send(
        &app,
        multipart("/api/users/avatar", &alice, &[], Some(("avatar", "me.png", "image/png", &b"png"[..]))),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let avatar = avatar["avatar"].as_str().unwrap().to_string();

    let (_, me) = send(&app, request(Method::GET, "/api/users/me", Some(&alice), None)).await;
    assert_eq!(me["avatar"], avatar.as_str());
}

#[tokio::test]
async fn test_relay_messages_appear_in_history() {
    let app = setup();
    let (alice_id, alice) = register(&app, "alice").await;
    let (bob_id, bob) = register(&app, "bob").await;

    let (mut session, mut events) = app.state.relay.connect();
    session.handle_frame(ClientFrame::Auth { token: alice.clone() });
    assert!(matches!(events.recv().await, Some(RelayEvent::Authed { .. })));

    let to = bob_id.parse().unwrap();
    session.handle_frame(ClientFrame::Dm {
        to,
        content: "hi bob".to_string(),
    });
    match events.recv().await {
        Some(RelayEvent::Dm(message)) => assert_eq!(message.content, "hi bob"),
        other => panic!("expected dm, got {other:?}"),
    }

    let (status, history) = send(
        &app,
        request(Method::GET, &format!("/api/messages/{alice_id}"), Some(&bob), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(history.as_array().unwrap().len(), 1);
    assert_eq!(history[0]["from"], alice_id.as_str());
    assert_eq!(history[0]["to"], bob_id.as_str());
    assert_eq!(history[0]["content"], "hi bob");
}
