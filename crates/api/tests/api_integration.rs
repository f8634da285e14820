//! API integration tests.
//!
//! Requests go through the full router, authentication middleware included,
//! against an in-memory database.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;

use agora_api::{AppState, app};
use agora_common::config::AuthConfig;
use agora_core::LogNotifier;
use agora_db::{repositories::UserRepository, test_utils::TestDatabase};
use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use serde_json::{Value, json};
use tower::ServiceExt;

struct TestApp {
    router: Router,
    user_repo: UserRepository,
    db: TestDatabase,
}

impl TestApp {
    async fn new() -> Self {
        let db = TestDatabase::new().await.unwrap();
        let auth = AuthConfig {
            jwt_secret: "api-test-secret".to_string(),
            session_ttl_secs: 3600,
            verification_ttl_secs: 86_400,
        };
        let state = AppState::new(db.shared(), &auth, Arc::new(LogNotifier));

        Self {
            router: app(state),
            user_repo: UserRepository::new(db.shared()),
            db,
        }
    }

    async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.send(Method::GET, uri, token, None).await
    }

    async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.send(Method::POST, uri, token, Some(body)).await
    }

    async fn delete(&self, uri: &str, token: &str) -> (StatusCode, Value) {
        self.send(Method::DELETE, uri, Some(token), None).await
    }

    /// Sign up, verify and log in. Returns `(user id, bearer token)`.
    async fn account(&self, name: &str) -> (String, String) {
        let email = format!("{name}@example.com");
        let (status, body) = self
            .post(
                "/auth/signup",
                None,
                json!({ "name": name, "email": email, "password": "correct horse" }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");

        let token = self
            .user_repo
            .find_by_email(&email)
            .await
            .unwrap()
            .and_then(|u| u.verification_token)
            .expect("signup stores a verification token");
        let (status, _) = self
            .post("/auth/verify", None, json!({ "token": token }))
            .await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = self
            .post(
                "/auth/login",
                None,
                json!({ "email": email, "password": "correct horse" }),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{body}");

        (
            body["data"]["user"]["id"].as_str().unwrap().to_string(),
            body["data"]["token"].as_str().unwrap().to_string(),
        )
    }
}

fn ids(value: &Value) -> Vec<&str> {
    value
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_str().unwrap())
        .collect()
}

#[tokio::test]
async fn test_health() {
    let app = TestApp::new().await;
    let (status, body) = app.get("/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "data": { "status": "ok" } }));
}

#[tokio::test]
async fn test_signup_verify_login_me() {
    let app = TestApp::new().await;
    let (id, token) = app.account("alice").await;

    let (status, body) = app.get("/users/me", Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["id"], json!(id));
    assert_eq!(body["data"]["email"], json!("alice@example.com"));
    assert_eq!(body["data"]["isVerified"], json!(true));
    assert!(body["data"].get("passwordHash").is_none());
}

#[tokio::test]
async fn test_protected_route_requires_token() {
    let app = TestApp::new().await;

    let (status, body) = app.get("/users/me", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], json!("UNAUTHORIZED"));

    let (status, _) = app.get("/users/me", Some("not-a-jwt")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_login_before_verification_is_forbidden() {
    let app = TestApp::new().await;
    app.post(
        "/auth/signup",
        None,
        json!({ "name": "bob", "email": "bob@example.com", "password": "correct horse" }),
    )
    .await;

    let (status, body) = app
        .post(
            "/auth/login",
            None,
            json!({ "email": "bob@example.com", "password": "correct horse" }),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["code"], json!("FORBIDDEN"));
}

#[tokio::test]
async fn test_invalid_signup_is_unprocessable() {
    let app = TestApp::new().await;
    let (status, body) = app
        .post(
            "/auth/signup",
            None,
            json!({ "name": "x", "email": "not-an-email", "password": "short" }),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"]["code"], json!("VALIDATION_ERROR"));
}

#[tokio::test]
async fn test_unknown_user_is_not_found() {
    let app = TestApp::new().await;
    let (status, body) = app.get("/users/nope", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], json!("USER_NOT_FOUND"));
}

#[tokio::test]
async fn test_post_delete_cascades_over_http() {
    let app = TestApp::new().await;
    let (_, alice) = app.account("alice").await;
    let (_, bob) = app.account("bob").await;

    let (status, body) = app
        .post("/posts", Some(&alice), json!({ "text": "hello" }))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let post_id = body["data"]["id"].as_str().unwrap().to_string();

    let (status, body) = app
        .post(
            &format!("/posts/{post_id}/comments"),
            Some(&bob),
            json!({ "text": "nice" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let comment_id = body["data"]["id"].as_str().unwrap().to_string();

    let (_, body) = app.get(&format!("/posts/{post_id}"), None).await;
    assert_eq!(ids(&body["data"]["comments"]), vec![comment_id.as_str()]);
    assert_eq!(body["data"]["creator"]["name"], json!("alice"));

    let (status, _) = app.delete(&format!("/posts/{post_id}"), &bob).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app.delete(&format!("/posts/{post_id}"), &alice).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["deleted"], json!(2));

    let (status, _) = app.get(&format!("/posts/{post_id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (_, body) = app.get("/users/me", Some(&bob)).await;
    assert!(ids(&body["data"]["comments"]).is_empty());
    assert_eq!(app.db.count("comment").await.unwrap(), 0);

    let (status, _) = app.delete(&format!("/posts/{post_id}"), &alice).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_follow_and_unfollow_over_http() {
    let app = TestApp::new().await;
    let (alice_id, alice) = app.account("alice").await;
    let (bob_id, _) = app.account("bob").await;

    let (status, body) = app
        .post(&format!("/users/{bob_id}/follow"), Some(&alice), json!({}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["following"], json!(true));

    let (_, body) = app.get(&format!("/users/{bob_id}/followers"), None).await;
    assert_eq!(body["data"][0]["id"], json!(alice_id));

    let (status, _) = app
        .delete(&format!("/users/{bob_id}/follow"), &alice)
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = app.get(&format!("/users/{bob_id}"), None).await;
    assert!(ids(&body["data"]["followers"]).is_empty());
    let (_, body) = app.get(&format!("/users/{alice_id}"), None).await;
    assert!(ids(&body["data"]["following"]).is_empty());

    let (status, _) = app
        .post(&format!("/users/{alice_id}/follow"), Some(&alice), json!({}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_delete_account_cascades() {
    let app = TestApp::new().await;
    let (alice_id, alice) = app.account("alice").await;
    let (bob_id, bob) = app.account("bob").await;

    app.post(&format!("/users/{alice_id}/follow"), Some(&bob), json!({}))
        .await;
    let (_, body) = app
        .post("/posts", Some(&alice), json!({ "text": "bye soon" }))
        .await;
    let post_id = body["data"]["id"].as_str().unwrap().to_string();

    let (status, _) = app.delete("/users/me", &alice).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app.get(&format!("/posts/{post_id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (_, body) = app.get(&format!("/users/{bob_id}"), None).await;
    assert!(ids(&body["data"]["following"]).is_empty());

    // The session outlives the account but no longer authenticates.
    let (status, _) = app.get("/users/me", Some(&alice)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_accepted_connection_follows_both_ways() {
    let app = TestApp::new().await;
    let (alice_id, alice) = app.account("alice").await;
    let (bob_id, bob) = app.account("bob").await;

    let (status, body) = app
        .post("/connections", Some(&alice), json!({ "userId": bob_id }))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["status"], json!("pending"));
    let connection_id = body["data"]["id"].as_str().unwrap().to_string();

    let (status, _) = app
        .post(
            &format!("/connections/{connection_id}/accept"),
            Some(&alice),
            json!({}),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app
        .post(
            &format!("/connections/{connection_id}/accept"),
            Some(&bob),
            json!({}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], json!("accepted"));

    let (_, body) = app.get(&format!("/users/{alice_id}"), None).await;
    assert_eq!(ids(&body["data"]["followers"]), vec![bob_id.as_str()]);
    assert_eq!(ids(&body["data"]["following"]), vec![bob_id.as_str()]);

    let (_, body) = app.get("/connections?status=accepted", Some(&bob)).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_conversation_messages() {
    let app = TestApp::new().await;
    let (_, alice) = app.account("alice").await;
    let (bob_id, bob) = app.account("bob").await;
    let (_, carol) = app.account("carol").await;

    let (status, body) = app
        .post(
            "/conversations",
            Some(&alice),
            json!({ "participantIds": [bob_id] }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let conversation_id = body["data"]["id"].as_str().unwrap().to_string();

    let (status, body) = app
        .post(
            &format!("/conversations/{conversation_id}/messages"),
            Some(&bob),
            json!({ "text": "hi alice" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let message_id = body["data"]["id"].as_str().unwrap().to_string();

    let (status, _) = app
        .get(&format!("/conversations/{conversation_id}"), Some(&carol))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (_, body) = app
        .get(
            &format!("/conversations/{conversation_id}/messages?limit=10"),
            Some(&alice),
        )
        .await;
    assert_eq!(body["data"][0]["text"], json!("hi alice"));

    let (status, _) = app
        .delete(&format!("/messages/{message_id}"), &alice)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = app.delete(&format!("/messages/{message_id}"), &bob).await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = app
        .get(&format!("/conversations/{conversation_id}"), Some(&alice))
        .await;
    assert_eq!(body["data"]["messagesCount"], json!(0));
}

#[tokio::test]
async fn test_feed_pagination() {
    let app = TestApp::new().await;
    let (_, alice) = app.account("alice").await;
    for text in ["one", "two", "three"] {
        app.post("/posts", Some(&alice), json!({ "text": text }))
            .await;
    }

    let (_, body) = app.get("/posts?limit=2", None).await;
    let page = body["data"].as_array().unwrap();
    assert_eq!(page.len(), 2);

    let last = page[1]["id"].as_str().unwrap();
    let (_, body) = app.get(&format!("/posts?limit=2&untilId={last}"), None).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
}
