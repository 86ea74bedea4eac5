//! End-to-end tests of the HTTP surface against the in-memory store

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic, clippy::indexing_slicing)]

use argon2::{Algorithm, Argon2, Params, Version};
use auth_identity::{
    memory::{ADMIN_ROLE_ID, USER_ROLE_ID},
    Identity, IdentityConfig, InMemoryStore, Registration, Role, TokenCodec,
};
use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use chrono::{Duration, Utc};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;
use user_auth_server::{create_app, AppState};

const SECRET: &str = "api-test-secret-0123456789abcdef0123";

struct TestApp {
    router: Router,
    codec: Arc<TokenCodec>,
}

fn registration(login: &str) -> Registration {
    Registration {
        email: format!("{login}@example.com"),
        login: login.to_string(),
        password: "correct".to_string(),
        phone: String::new(),
    }
}

async fn app() -> TestApp {
    let config = IdentityConfig::new(SECRET);
    let codec = Arc::new(TokenCodec::new(&config).unwrap());
    let argon2 = Argon2::new(
        Algorithm::Argon2id,
        Version::V0x13,
        Params::new(1024, 1, 1, None).unwrap(),
    );
    let store = Arc::new(InMemoryStore::with_argon2(codec.clone(), argon2));
    store.seed_user(7, &registration("alice"), USER_ROLE_ID).await.unwrap();
    store.seed_user(3, &registration("bob"), USER_ROLE_ID).await.unwrap();
    store.seed_user(9, &registration("root"), ADMIN_ROLE_ID).await.unwrap();

    let state = AppState::with_store(codec.clone(), store, &config);
    TestApp {
        router: create_app(state),
        codec,
    }
}

impl TestApp {
    async fn send(
        &self,
        method: Method,
        uri: &str,
        bearer: Option<&str>,
        body: Option<Body>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = bearer {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(body)
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    async fn post_json(&self, uri: &str, bearer: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.send(Method::POST, uri, bearer, Some(Body::from(body.to_string())))
            .await
    }

    async fn get(&self, uri: &str, bearer: Option<&str>) -> (StatusCode, Value) {
        self.send(Method::GET, uri, bearer, None).await
    }

    async fn login(&self, login: &str) -> Value {
        let (status, body) = self
            .post_json(
                "/api/v1/auth/login",
                None,
                json!({"login": login, "password": "correct"}),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        body["data"].clone()
    }
}

#[tokio::test]
async fn health_is_public() {
    let app = app().await;
    let (status, body) = app.get("/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["service"], "user-auth-server");
}

#[tokio::test]
async fn login_returns_identity_and_token_pair() {
    let app = app().await;
    let (status, body) = app
        .post_json(
            "/api/v1/auth/login",
            None,
            json!({"login": "alice", "password": "correct"}),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "Login successful");
    assert_eq!(body["data"]["user_id"], 7);
    assert_eq!(body["data"]["role"], "user");
    assert!(!body["data"]["access_token"].as_str().unwrap().is_empty());
    assert!(!body["data"]["refresh_token"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn bad_password_surfaces_store_message() {
    let app = app().await;
    let (status, body) = app
        .post_json(
            "/api/v1/auth/login",
            None,
            json!({"login": "alice", "password": "wrong"}),
        )
        .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(
        body,
        json!({"success": false, "message": "Invalid login or password", "data": null})
    );
}

#[tokio::test]
async fn user_cannot_read_another_user() {
    let app = app().await;
    let alice = app.login("alice").await;
    let token = alice["access_token"].as_str().unwrap();

    let (status, body) = app.get("/api/v1/users/3", Some(token)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(
        body,
        json!({"success": false, "message": "Access denied", "data": null})
    );

    let (status, body) = app.get("/api/v1/users/7", Some(token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "User info retrieved");
    assert_eq!(body["data"]["login"], "alice");
    assert_eq!(body["data"]["role_name"], "user");
}

#[tokio::test]
async fn admin_can_read_any_user() {
    let app = app().await;
    let root = app.login("root").await;
    assert_eq!(root["role"], "admin");

    let (status, body) = app
        .get("/api/v1/users/3", root["access_token"].as_str())
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["login"], "bob");
}

#[tokio::test]
async fn admin_gets_404_for_unknown_user() {
    let app = app().await;
    let root = app.login("root").await;

    let (status, body) = app
        .get("/api/v1/users/4242", root["access_token"].as_str())
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "User not found");
}

#[tokio::test]
async fn wrong_scheme_counts_as_missing_header() {
    let app = app().await;
    let request = Request::builder()
        .uri("/api/v1/users/7")
        .header(header::AUTHORIZATION, "Basic xyz")
        .body(Body::empty())
        .unwrap();

    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["message"], "Missing Authorization header");
    assert_eq!(body["data"], Value::Null);
}

#[tokio::test]
async fn expired_token_is_rejected_without_detail() {
    let app = app().await;
    let identity = Identity {
        user_id: 7,
        email: "alice@example.com".to_string(),
        login: "alice".to_string(),
        role: Role::User,
    };
    let stale = app
        .codec
        .issue_access_token(&identity, Utc::now() - Duration::hours(2))
        .unwrap();

    let (status, body) = app.get("/api/v1/users/7", Some(&stale)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Invalid or expired token");
}

#[tokio::test]
async fn unauthenticated_request_fails_before_path_parsing() {
    let app = app().await;
    let (status, _) = app.get("/api/v1/users/not-a-number", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn non_numeric_user_id_is_bad_request() {
    let app = app().await;
    let alice = app.login("alice").await;
    let (status, body) = app
        .get("/api/v1/users/abc", alice["access_token"].as_str())
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid user id");
}

#[tokio::test]
async fn refresh_token_is_single_use() {
    let app = app().await;
    let alice = app.login("alice").await;
    let original = alice["refresh_token"].as_str().unwrap().to_string();

    let (status, body) = app
        .post_json("/api/v1/auth/refresh", None, json!({"refresh_token": original}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Tokens refreshed");
    let rotated = body["data"]["refresh_token"].as_str().unwrap().to_string();
    assert_ne!(rotated, original);

    let (status, body) = app
        .post_json("/api/v1/auth/refresh", None, json!({"refresh_token": original}))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Invalid refresh token");

    let (status, _) = app
        .post_json("/api/v1/auth/refresh", None, json!({"refresh_token": rotated}))
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn refresh_requires_a_token() {
    let app = app().await;
    let (status, body) = app.post_json("/api/v1/auth/refresh", None, json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Missing refresh_token");
}

#[tokio::test]
async fn register_then_login() {
    let app = app().await;
    let (status, body) = app
        .post_json(
            "/api/v1/auth/register",
            None,
            json!({"email": "carol@example.com", "login": "carol", "password": "correct"}),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["message"], "User registered successfully");
    let user_id = body["data"]["user_id"].as_i64().unwrap();

    let carol = app.login("carol").await;
    assert_eq!(carol["user_id"].as_i64().unwrap(), user_id);
    assert_eq!(carol["role"], "user");

    let (status, body) = app
        .post_json(
            "/api/v1/auth/register",
            None,
            json!({"email": "carol@example.com", "login": "carol", "password": "x"}),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "User with this email or login already exists");
}

#[tokio::test]
async fn register_lists_missing_fields() {
    let app = app().await;
    let (status, body) = app
        .post_json("/api/v1/auth/register", None, json!({"login": "dave"}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Missing required fields: email, password");
}

#[tokio::test]
async fn malformed_json_is_rejected() {
    let app = app().await;
    let (status, body) = app
        .send(
            Method::POST,
            "/api/v1/auth/login",
            None,
            Some(Body::from("{\"login\": ")),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body,
        json!({"success": false, "message": "Invalid JSON", "data": null})
    );
}

#[tokio::test]
async fn sessions_follow_login_and_logout() {
    let app = app().await;
    let first = app.login("alice").await;
    let second = app.login("alice").await;
    let token = first["access_token"].as_str().unwrap();

    let (status, body) = app.get("/api/v1/users/7/sessions", Some(token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Active sessions retrieved");
    let sessions = body["data"].as_array().unwrap();
    assert_eq!(sessions.len(), 2);
    assert!(sessions.iter().all(|s| s["ip_address"] == "unknown"));

    let (status, body) = app
        .send(Method::POST, "/api/v1/auth/logout", Some(token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Logout successful");

    // Logging out twice is not an error
    let (status, _) = app
        .send(Method::POST, "/api/v1/auth/logout", Some(token), None)
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = app
        .get("/api/v1/users/7/sessions", second["access_token"].as_str())
        .await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn logout_with_access_token_from_before_refresh_ends_the_session() {
    let app = app().await;
    let alice = app.login("alice").await;
    let old_access = alice["access_token"].as_str().unwrap().to_string();

    let (status, body) = app
        .post_json(
            "/api/v1/auth/refresh",
            None,
            json!({"refresh_token": alice["refresh_token"]}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let new_access = body["data"]["access_token"].as_str().unwrap().to_string();
    let new_refresh = body["data"]["refresh_token"].as_str().unwrap().to_string();

    let (status, _) = app
        .send(Method::POST, "/api/v1/auth/logout", Some(&old_access), None)
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = app
        .get("/api/v1/users/7/sessions", Some(&new_access))
        .await;
    assert_eq!(body["data"].as_array().unwrap().len(), 0);

    let (status, body) = app
        .post_json("/api/v1/auth/refresh", None, json!({"refresh_token": new_refresh}))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Invalid refresh token");
}

#[tokio::test]
async fn logout_requires_authentication() {
    let app = app().await;
    let (status, body) = app
        .send(Method::POST, "/api/v1/auth/logout", None, None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Missing Authorization header");
}

#[tokio::test]
async fn change_password_flow() {
    let app = app().await;
    let alice = app.login("alice").await;
    let token = alice["access_token"].as_str().unwrap();

    let (status, body) = app
        .post_json(
            "/api/v1/users/3/password",
            Some(token),
            json!({"old_password": "correct", "new_password": "next"}),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "Access denied");

    let (status, body) = app
        .post_json(
            "/api/v1/users/7/password",
            Some(token),
            json!({"old_password": "wrong", "new_password": "next"}),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid old password");

    let (status, body) = app
        .post_json(
            "/api/v1/users/7/password",
            Some(token),
            json!({"old_password": "correct", "new_password": "next"}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Password changed successfully");
    assert_eq!(body["data"], Value::Null);

    // Existing sessions end with the old password
    let (status, _) = app
        .post_json(
            "/api/v1/auth/refresh",
            None,
            json!({"refresh_token": alice["refresh_token"]}),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app
        .post_json(
            "/api/v1/auth/login",
            None,
            json!({"login": "alice", "password": "next"}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn change_password_lists_missing_fields() {
    let app = app().await;
    let alice = app.login("alice").await;
    let (status, body) = app
        .post_json(
            "/api/v1/users/7/password",
            alice["access_token"].as_str(),
            json!({"old_password": "correct"}),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Missing required fields: new_password");
}
