//! Request and response bodies shared by the API handlers

use serde::{Deserialize, Serialize};

/// `{ "is_active": bool }`
#[derive(Debug, Deserialize)]
pub struct ActiveToggle {
    pub is_active: bool,
}

/// `{ "is_premium": bool }`
#[derive(Debug, Deserialize)]
pub struct PremiumToggle {
    pub is_premium: bool,
}

/// `{ "featured": bool }`
#[derive(Debug, Deserialize)]
pub struct FeaturedToggle {
    pub featured: bool,
}

#[derive(Debug, Deserialize)]
pub struct RoleChange {
    pub role: String,
}

#[derive(Debug, Deserialize)]
pub struct StatusChange {
    pub status: String,
}

#[derive(Debug, Deserialize)]
pub struct PriorityChange {
    pub priority: String,
}

#[derive(Debug, Deserialize)]
pub struct ReplyRequest {
    pub reply: String,
}

/// Body of a tool usage report
#[derive(Debug, Default, Deserialize)]
pub struct UsageRequest {
    #[serde(default)]
    pub user_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UsageResponse {
    pub tool_id: String,
    pub usage_count: i64,
}

#[derive(Debug, Serialize)]
pub struct LikeResponse {
    pub id: String,
    pub likes: i64,
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub id: String,
    pub deleted: bool,
}

impl DeleteResponse {
    pub fn new(id: String) -> Self {
        Self { id, deleted: true }
    }
}

#[derive(Debug, Serialize)]
pub struct UserDeleteResponse {
    pub id: String,
    pub deleted: bool,
    /// Tool usage rows removed with the user
    pub removed_usage: u64,
}

#[derive(Debug, Serialize)]
pub struct SeedResponse {
    pub inserted: usize,
}

#[derive(Debug, Serialize)]
pub struct MarkAllReadResponse {
    pub marked: u64,
}
