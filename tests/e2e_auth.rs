//! E2E tests for admin login, sessions and lockout

mod common;

use common::{ADMIN_EMAIL, ADMIN_PASSWORD, TestServer};
use serde_json::Value;
use toolhub::data::AdminRole;

fn cookie_client() -> reqwest::Client {
    reqwest::Client::builder()
        .cookie_store(true)
        .timeout(std::time::Duration::from_secs(10))
        .build()
        .expect("failed to build cookie client")
}

#[tokio::test]
async fn test_login_returns_token_and_profile() {
    let server = TestServer::new().await;

    let response = server.login(ADMIN_EMAIL, ADMIN_PASSWORD).await;
    assert_eq!(response.status(), 200);

    let set_cookie = response
        .headers()
        .get("set-cookie")
        .and_then(|v| v.to_str().ok())
        .expect("set-cookie header")
        .to_string();
    assert!(set_cookie.starts_with("session="));
    assert!(set_cookie.contains("HttpOnly"));

    let body: Value = response.json().await.unwrap();
    assert!(!body["token"].as_str().unwrap().is_empty());
    assert_eq!(body["admin"]["email"], ADMIN_EMAIL);
    assert_eq!(body["admin"]["role"], "super_admin");
    assert!(body["admin"]["last_login_at"].is_string());
}

#[tokio::test]
async fn test_login_email_is_case_insensitive() {
    let server = TestServer::new().await;

    let response = server
        .login(&format!("  {}  ", ADMIN_EMAIL.to_uppercase()), ADMIN_PASSWORD)
        .await;
    assert_eq!(response.status(), 200);
}

#[tokio::test]
async fn test_login_with_wrong_password_is_rejected() {
    let server = TestServer::new().await;

    let response = server.login(ADMIN_EMAIL, "wrong password").await;
    assert_eq!(response.status(), 401);
    let body: Value = response.json().await.unwrap();
    assert!(body["error"].is_string());

    let response = server.login("nobody@toolhub.test", ADMIN_PASSWORD).await;
    assert_eq!(response.status(), 401);
}

#[tokio::test]
async fn test_repeated_failures_lock_the_account() {
    let server = TestServer::new().await;

    // Default policy allows 5 attempts
    for _ in 0..5 {
        let response = server.login(ADMIN_EMAIL, "wrong password").await;
        assert_eq!(response.status(), 401);
    }

    // Even the right password is refused during the lockout window
    let response = server.login(ADMIN_EMAIL, ADMIN_PASSWORD).await;
    assert_eq!(response.status(), 429);

    let event_count = server
        .state
        .db
        .count_security_events_since(
            ADMIN_EMAIL,
            toolhub::data::SecurityEventType::LoginLocked,
            chrono::Utc::now() - chrono::Duration::minutes(1),
        )
        .await
        .unwrap();
    assert_eq!(event_count, 1);
}

#[tokio::test]
async fn test_session_endpoint_with_bearer_token() {
    let server = TestServer::new().await;
    let token = server.admin_token().await;

    let (status, body) = server.admin_get(&token, "/auth/session").await;
    assert_eq!(status, 200);
    assert_eq!(body["email"], ADMIN_EMAIL);
    assert_eq!(body["role"], "super_admin");
}

#[tokio::test]
async fn test_tampered_token_is_rejected() {
    let server = TestServer::new().await;
    let token = server.admin_token().await;

    let (payload, _signature) = token.split_once('.').unwrap();
    let forged = format!("{payload}.AAAA");

    let (status, _) = server.admin_get(&forged, "/api/admin/users").await;
    assert_eq!(status, 401);

    let (status, _) = server.admin_get("not-a-token", "/api/admin/users").await;
    assert_eq!(status, 401);
}

#[tokio::test]
async fn test_admin_routes_require_a_session() {
    let server = TestServer::new().await;

    for path in [
        "/api/admin/users",
        "/api/admin/messages",
        "/api/admin/notifications",
        "/api/admin/settings",
        "/api/admin/analytics",
    ] {
        let response = server.client.get(server.url(path)).send().await.unwrap();
        assert_eq!(response.status(), 401, "{path}");
    }
}

#[tokio::test]
async fn test_cookie_session_and_logout() {
    let server = TestServer::new().await;
    let client = cookie_client();

    let response = client
        .post(server.url("/auth/login"))
        .json(&serde_json::json!({ "email": ADMIN_EMAIL, "password": ADMIN_PASSWORD }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let response = client
        .get(server.url("/api/admin/users"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let response = client
        .post(server.url("/auth/logout"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let response = client
        .get(server.url("/auth/session"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 401);
}

#[tokio::test]
async fn test_regular_admin_can_log_in() {
    let server = TestServer::new().await;
    server
        .create_admin("editor@toolhub.test", "editor password", AdminRole::Admin)
        .await;

    let token = server
        .token_for("editor@toolhub.test", "editor password")
        .await;
    let (status, body) = server.admin_get(&token, "/auth/session").await;
    assert_eq!(status, 200);
    assert_eq!(body["role"], "admin");
}
