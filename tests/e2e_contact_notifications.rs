//! E2E tests for the contact form, admin inbox and notification bell

mod common;

use common::{ADMIN_EMAIL, TestServer};
use reqwest::Method;
use serde_json::{Value, json};
use std::time::Duration;
use toolhub::auth::{Session, create_session_token};
use toolhub::data::AdminRole;

/// Read the next `notifications` event from an SSE body
///
/// Returns `None` once the server closes the stream.
async fn next_event(response: &mut reqwest::Response, buffer: &mut String) -> Option<Value> {
    tokio::time::timeout(Duration::from_secs(5), read_event(response, buffer))
        .await
        .expect("timed out waiting for the notification stream")
}

async fn read_event(response: &mut reqwest::Response, buffer: &mut String) -> Option<Value> {
    loop {
        if let Some(end) = buffer.find("\n\n") {
            let block: String = buffer.drain(..end + 2).collect();
            let data: Vec<&str> = block
                .lines()
                .filter_map(|line| line.strip_prefix("data:"))
                .map(str::trim_start)
                .collect();
            // Keep-alive comments carry no data
            if data.is_empty() {
                continue;
            }
            return Some(serde_json::from_str(&data.join("\n")).unwrap());
        }

        let chunk = response.chunk().await.unwrap()?;
        buffer.push_str(&String::from_utf8_lossy(&chunk));
    }
}

#[tokio::test]
async fn test_contact_form_creates_message_and_notification() {
    let server = TestServer::new().await;
    let token = server.admin_token().await;

    let message = server.submit_contact("Jo", "Hi", "Hello").await;
    assert_eq!(message["status"], "unread");
    assert_eq!(message["priority"], "normal");
    assert_eq!(message["email"], "jo@x.com");

    let (status, body) = server.admin_get(&token, "/api/admin/notifications").await;
    assert_eq!(status, 200);
    let notifications = body["notifications"].as_array().unwrap();
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0]["notification_type"], "contact_form");
    assert_eq!(notifications[0]["is_read"], false);
    assert_eq!(notifications[0]["related_id"], message["id"]);
    assert_eq!(body["badge"]["count"], 1);
    assert_eq!(body["badge"]["label"], "1");
}

#[tokio::test]
async fn test_contact_form_validation() {
    let server = TestServer::new().await;

    let response = server
        .client
        .post(server.url("/api/contact"))
        .json(&json!({
            "name": "Jo",
            "email": "not-an-email",
            "subject": "Hi",
            "message": "Hello",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);

    let response = server
        .client
        .post(server.url("/api/contact"))
        .json(&json!({
            "name": "Jo",
            "email": "jo@x.com",
            "subject": "   ",
            "message": "Hello",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn test_urgent_messages_are_high_priority() {
    let server = TestServer::new().await;

    let message = server
        .submit_contact("Sam", "URGENT: site down", "Please help")
        .await;
    assert_eq!(message["priority"], "high");
}

#[tokio::test]
async fn test_badge_caps_at_nine() {
    let server = TestServer::new().await;
    let token = server.admin_token().await;

    for i in 0..11 {
        server
            .submit_contact(&format!("Visitor {i}"), "Question", "Hello")
            .await;
    }

    let (_, body) = server.admin_get(&token, "/api/admin/notifications").await;
    assert_eq!(body["badge"]["count"], 11);
    assert_eq!(body["badge"]["label"], "9+");
    assert_eq!(body["badge"]["display_count"], 9);
    assert_eq!(body["badge"]["items"].as_array().unwrap().len(), 5);
    assert_eq!(body["badge"]["remainder"], 6);

    // Newest first
    assert_eq!(
        body["notifications"][0]["title"],
        "New message from Visitor 10"
    );
}

#[tokio::test]
async fn test_opening_a_notification_marks_only_that_one() {
    let server = TestServer::new().await;
    let token = server.admin_token().await;

    server.submit_contact("Jo", "First", "Hello").await;
    server.submit_contact("Sam", "Second", "Hello").await;

    let (_, body) = server.admin_get(&token, "/api/admin/notifications").await;
    let target = body["notifications"][1]["id"].as_str().unwrap().to_string();
    let other = body["notifications"][0]["id"].as_str().unwrap().to_string();

    let (status, outcome) = server
        .admin_send(
            &token,
            Method::POST,
            &format!("/api/admin/notifications/{target}/open"),
            json!({}),
        )
        .await;
    assert_eq!(status, 200);
    assert_eq!(outcome["redirect"], "/admin/messages");
    assert_eq!(outcome["closed"], true);

    let (_, body) = server.admin_get(&token, "/api/admin/notifications").await;
    let remaining = body["notifications"].as_array().unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0]["id"], other.as_str());

    let (status, _) = server
        .admin_send(
            &token,
            Method::POST,
            "/api/admin/notifications/missing/open",
            json!({}),
        )
        .await;
    assert_eq!(status, 404);
}

#[tokio::test]
async fn test_mark_all_read_clears_the_bell() {
    let server = TestServer::new().await;
    let token = server.admin_token().await;

    server.submit_contact("Jo", "Hi", "Hello").await;
    server.submit_contact("Sam", "Hi again", "Hello").await;

    let (status, body) = server
        .admin_send(
            &token,
            Method::POST,
            "/api/admin/notifications/read_all",
            json!({}),
        )
        .await;
    assert_eq!(status, 200);
    assert_eq!(body["marked"], 2);

    let (_, body) = server.admin_get(&token, "/api/admin/notifications").await;
    assert!(body["notifications"].as_array().unwrap().is_empty());
    assert!(body["badge"]["label"].is_null());
    assert_eq!(server.state.notifications.current().total, 0);
}

#[tokio::test]
async fn test_hub_publishes_new_submissions() {
    let server = TestServer::new().await;
    let mut rx = server.state.notifications.subscribe();
    assert!(rx.borrow_and_update().is_empty());

    server.submit_contact("Jo", "Hi", "Hello").await;

    tokio::time::timeout(std::time::Duration::from_secs(5), rx.changed())
        .await
        .expect("hub did not publish")
        .unwrap();
    assert_eq!(rx.borrow().total, 1);
}

#[tokio::test]
async fn test_contact_alerts_can_be_disabled() {
    let server = TestServer::new().await;
    let token = server.admin_token().await;

    let (_, mut settings) = server.admin_get(&token, "/api/admin/settings").await;
    settings["notifications"]["contact_form_alerts"] = Value::Bool(false);
    let (status, _) = server
        .admin_send(&token, Method::PUT, "/api/admin/settings", settings)
        .await;
    assert_eq!(status, 200);

    server.submit_contact("Jo", "Hi", "Hello").await;

    let (_, body) = server.admin_get(&token, "/api/admin/notifications").await;
    assert!(body["notifications"].as_array().unwrap().is_empty());

    let (_, messages) = server.admin_get(&token, "/api/admin/messages").await;
    assert_eq!(messages["total"], 1);
}

#[tokio::test]
async fn test_message_lifecycle() {
    let server = TestServer::new().await;
    let token = server.admin_token().await;

    let message = server.submit_contact("Jo", "Hi", "Hello").await;
    let id = message["id"].as_str().unwrap();

    // Opening an unread message marks it read
    let (status, opened) = server
        .admin_get(&token, &format!("/api/admin/messages/{id}"))
        .await;
    assert_eq!(status, 200);
    assert_eq!(opened["status"], "read");

    let (status, updated) = server
        .admin_send(
            &token,
            Method::POST,
            &format!("/api/admin/messages/{id}/priority"),
            json!({ "priority": "low" }),
        )
        .await;
    assert_eq!(status, 200);
    assert_eq!(updated["priority"], "low");

    let (status, _) = server
        .admin_send(
            &token,
            Method::POST,
            &format!("/api/admin/messages/{id}/reply"),
            json!({ "reply": "  " }),
        )
        .await;
    assert_eq!(status, 400);

    let (status, replied) = server
        .admin_send(
            &token,
            Method::POST,
            &format!("/api/admin/messages/{id}/reply"),
            json!({ "reply": "Thanks for writing" }),
        )
        .await;
    assert_eq!(status, 200);
    assert_eq!(replied["status"], "replied");
    assert_eq!(replied["reply"], "Thanks for writing");

    let filter = "/api/admin/messages?status=replied";
    let (_, page) = server.admin_get(&token, filter).await;
    assert_eq!(page["total"], 1);

    let (status, _) = server
        .admin_send(
            &token,
            Method::DELETE,
            &format!("/api/admin/messages/{id}"),
            json!({}),
        )
        .await;
    assert_eq!(status, 200);

    let (status, _) = server
        .admin_get(&token, &format!("/api/admin/messages/{id}"))
        .await;
    assert_eq!(status, 404);
}

#[tokio::test]
async fn test_stream_pushes_snapshots_until_session_expires() {
    let server = TestServer::new().await;

    // A session that expires shortly, to observe the stream closing
    let admin = server
        .state
        .db
        .get_admin_by_email(ADMIN_EMAIL)
        .await
        .unwrap()
        .unwrap();
    let session = Session::start(&admin, AdminRole::SuperAdmin, chrono::Duration::seconds(2));
    let secret = &server.state.config.auth.session_secret;
    let token = create_session_token(&session, secret).unwrap();

    let mut response = server
        .client
        .get(server.url("/api/admin/notifications/stream"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    assert!(
        response.headers()["content-type"]
            .to_str()
            .unwrap()
            .starts_with("text/event-stream")
    );

    let mut buffer = String::new();
    let first = next_event(&mut response, &mut buffer).await.unwrap();
    assert!(first["notifications"].as_array().unwrap().is_empty());
    assert_eq!(first["badge"]["count"], 0);

    let message = server.submit_contact("Jo", "Hi", "Hello").await;

    let update = next_event(&mut response, &mut buffer).await.unwrap();
    let notifications = update["notifications"].as_array().unwrap();
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0]["related_id"], message["id"]);
    assert_eq!(update["badge"]["count"], 1);
    assert_eq!(update["badge"]["label"], "1");

    // The stream closes once the session expires
    assert!(next_event(&mut response, &mut buffer).await.is_none());
}

#[tokio::test]
async fn test_open_still_redirects_when_mark_read_fails() {
    let server = TestServer::new().await;
    let token = server.admin_token().await;

    server.submit_contact("Jo", "Hi", "Hello").await;
    let (_, body) = server.admin_get(&token, "/api/admin/notifications").await;
    let id = body["notifications"][0]["id"].as_str().unwrap().to_string();

    // Reject every write to the notifications table from here on
    let db_path = server._temp_dir.path().join("test.db");
    let pool = sqlx::SqlitePool::connect(&format!("sqlite:{}", db_path.display()))
        .await
        .unwrap();
    sqlx::query(
        "CREATE TRIGGER notifications_read_only BEFORE UPDATE ON admin_notifications \
         BEGIN SELECT RAISE(ABORT, 'notifications are read-only'); END",
    )
    .execute(&pool)
    .await
    .unwrap();
    pool.close().await;

    let (status, outcome) = server
        .admin_send(
            &token,
            Method::POST,
            &format!("/api/admin/notifications/{id}/open"),
            json!({}),
        )
        .await;
    assert_eq!(status, 200);
    assert_eq!(outcome["id"], id.as_str());
    assert_eq!(outcome["redirect"], "/admin/messages");
    assert_eq!(outcome["closed"], true);

    // The failed write leaves the notification unread
    let (_, body) = server.admin_get(&token, "/api/admin/notifications").await;
    assert_eq!(body["badge"]["count"], 1);
    assert_eq!(body["notifications"][0]["is_read"], false);
}
