//! E2E tests for dashboard analytics

mod common;

use common::TestServer;
use reqwest::Method;
use serde_json::{Value, json};

#[tokio::test]
async fn test_report_reflects_stored_data() {
    let server = TestServer::new().await;
    let token = server.admin_token().await;

    for (uid, email) in [("uid-1", "a@example.com"), ("uid-2", "b@example.com")] {
        server
            .client
            .post(server.url("/api/users/sync"))
            .json(&json!({ "uid": uid, "email": email }))
            .send()
            .await
            .unwrap();
    }
    server
        .admin_send(
            &token,
            Method::POST,
            "/api/admin/users/uid-2/premium",
            json!({ "is_premium": true }),
        )
        .await;

    let tools: Value = server
        .client
        .get(server.url("/api/tools"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let tool_id = tools["items"]
        .as_array()
        .unwrap()
        .iter()
        .find(|tool| tool["is_premium"] == false)
        .and_then(|tool| tool["id"].as_str())
        .unwrap()
        .to_string();
    for _ in 0..3 {
        server
            .client
            .post(server.url(&format!("/api/tools/{tool_id}/usage")))
            .send()
            .await
            .unwrap();
    }

    server
        .admin_send(
            &token,
            Method::POST,
            "/api/admin/content",
            json!({ "title": "Hello", "content": "x", "status": "published" }),
        )
        .await;
    server.submit_contact("Jo", "Hi", "Hello").await;

    let (status, report) = server.admin_get(&token, "/api/admin/analytics").await;
    assert_eq!(status, 200);

    assert_eq!(report["users"]["total"], 2);
    assert_eq!(report["users"]["active"], 2);
    assert_eq!(report["users"]["premium"], 1);
    assert_eq!(report["users"]["new_last_30_days"], 2);

    assert_eq!(report["content"]["total"], 1);
    assert_eq!(report["content"]["by_status"]["published"], 1);

    assert_eq!(report["tools"]["total"], 8);
    assert_eq!(report["tools"]["total_usage"], 3);
    assert_eq!(report["tools"]["usage_last_7_days"], 3);
    assert_eq!(report["tools"]["top"][0]["tool_id"], tool_id.as_str());
    assert_eq!(report["tools"]["top"][0]["uses"], 3);

    assert_eq!(report["messages"]["total"], 1);
    assert_eq!(report["messages"]["by_status"]["unread"], 1);
    assert_eq!(report["messages"]["unread_notifications"], 1);
}

#[tokio::test]
async fn test_report_export_is_a_json_download() {
    let server = TestServer::new().await;
    let token = server.admin_token().await;

    let response = server
        .client
        .get(server.url("/api/admin/analytics/export"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    assert!(
        response.headers()["content-type"]
            .to_str()
            .unwrap()
            .starts_with("application/json")
    );
    let disposition = response.headers()["content-disposition"]
        .to_str()
        .unwrap()
        .to_string();
    assert!(disposition.contains("analytics-"));

    let report: Value = response.json().await.unwrap();
    assert_eq!(report["tools"]["total"], 8);
    assert_eq!(report["users"]["total"], 0);
}
