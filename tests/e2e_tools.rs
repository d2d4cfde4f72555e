//! E2E tests for the tool catalog and usage tracking

mod common;

use common::TestServer;
use reqwest::Method;
use serde_json::{Value, json};

async fn public_tools(server: &TestServer, query: &str) -> Value {
    server
        .client
        .get(server.url(&format!("/api/tools{query}")))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap()
}

async fn record_usage(
    server: &TestServer,
    tool_id: &str,
    body: Option<Value>,
) -> reqwest::Response {
    let request = server
        .client
        .post(server.url(&format!("/api/tools/{tool_id}/usage")));
    let request = match body {
        Some(body) => request.json(&body),
        None => request,
    };
    request.send().await.unwrap()
}

async fn create_tool(server: &TestServer, token: &str, body: Value) -> Value {
    let (status, tool) = server
        .admin_send(token, Method::POST, "/api/admin/tools", body)
        .await;
    assert_eq!(status, 201, "{tool}");
    tool
}

#[tokio::test]
async fn test_default_catalog_is_seeded_once() {
    let server = TestServer::new().await;
    let token = server.admin_token().await;

    let page = public_tools(&server, "").await;
    assert_eq!(page["total"], 8);
    for tool in page["items"].as_array().unwrap() {
        assert!(tool["route"].as_str().unwrap().starts_with("/tools/"));
        assert_eq!(tool["usage_count"], 0);
    }

    let (status, body) = server
        .admin_send(&token, Method::POST, "/api/admin/tools/seed", json!({}))
        .await;
    assert_eq!(status, 200);
    assert_eq!(body["inserted"], 0);
}

#[tokio::test]
async fn test_anonymous_usage_of_free_tool() {
    let server = TestServer::new().await;
    let token = server.admin_token().await;

    let tool = create_tool(
        &server,
        &token,
        json!({ "name": "Summarizer", "route": "/tools/summarizer", "category": "Writing" }),
    )
    .await;
    assert_eq!(tool["category"], "writing");
    let id = tool["id"].as_str().unwrap();

    let response = record_usage(&server, id, None).await;
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["tool_id"], id);
    assert_eq!(body["usage_count"], 1);

    let response = record_usage(&server, id, Some(json!({}))).await;
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["usage_count"], 2);
}

#[tokio::test]
async fn test_premium_tool_requires_premium_user() {
    let server = TestServer::new().await;
    let token = server.admin_token().await;

    let tool = create_tool(
        &server,
        &token,
        json!({ "name": "Video Upscaler", "route": "/tools/video-upscaler", "is_premium": true }),
    )
    .await;
    let id = tool["id"].as_str().unwrap();

    let response = record_usage(&server, id, None).await;
    assert_eq!(response.status(), 403);

    server
        .client
        .post(server.url("/api/users/sync"))
        .json(&json!({ "uid": "uid-1", "email": "ann@example.com" }))
        .send()
        .await
        .unwrap();

    let response = record_usage(&server, id, Some(json!({ "user_id": "uid-1" }))).await;
    assert_eq!(response.status(), 403);

    server
        .admin_send(
            &token,
            Method::POST,
            "/api/admin/users/uid-1/premium",
            json!({ "is_premium": true }),
        )
        .await;

    let response = record_usage(&server, id, Some(json!({ "user_id": "uid-1" }))).await;
    assert_eq!(response.status(), 200);
}

#[tokio::test]
async fn test_inactive_tools_are_hidden() {
    let server = TestServer::new().await;
    let token = server.admin_token().await;

    let tool = create_tool(
        &server,
        &token,
        json!({ "name": "Old Tool", "route": "/tools/old", "category": "legacy" }),
    )
    .await;
    let id = tool["id"].as_str().unwrap();

    let (status, updated) = server
        .admin_send(
            &token,
            Method::POST,
            &format!("/api/admin/tools/{id}/active"),
            json!({ "is_active": false }),
        )
        .await;
    assert_eq!(status, 200);
    assert_eq!(updated["is_active"], false);

    let page = public_tools(&server, "?category=legacy").await;
    assert_eq!(page["total"], 0);

    let response = record_usage(&server, id, None).await;
    assert_eq!(response.status(), 404);

    let (_, page) = server
        .admin_get(&token, "/api/admin/tools?status=inactive")
        .await;
    assert_eq!(page["total"], 1);
    assert_eq!(page["items"][0]["id"], id);
}

#[tokio::test]
async fn test_tool_validation_update_and_delete() {
    let server = TestServer::new().await;
    let token = server.admin_token().await;

    let (status, _) = server
        .admin_send(
            &token,
            Method::POST,
            "/api/admin/tools",
            json!({ "name": "Bad", "route": "tools/bad" }),
        )
        .await;
    assert_eq!(status, 400);

    let tool = create_tool(
        &server,
        &token,
        json!({ "name": "Draft Tool", "route": "/tools/draft" }),
    )
    .await;
    let id = tool["id"].as_str().unwrap();

    let (status, updated) = server
        .admin_send(
            &token,
            Method::PUT,
            &format!("/api/admin/tools/{id}"),
            json!({
                "name": "Final Tool",
                "route": "/tools/final",
                "features": ["fast", "  ", "free"],
            }),
        )
        .await;
    assert_eq!(status, 200);
    assert_eq!(updated["name"], "Final Tool");
    assert_eq!(updated["features"], json!(["fast", "free"]));

    let (status, _) = server
        .admin_send(
            &token,
            Method::DELETE,
            &format!("/api/admin/tools/{id}"),
            json!({}),
        )
        .await;
    assert_eq!(status, 200);

    let (status, _) = server
        .admin_get(&token, &format!("/api/admin/tools/{id}"))
        .await;
    assert_eq!(status, 404);
}
