//! Dashboard analytics
//!
//! Every number is an aggregate over stored rows.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::data::{Database, GroupCount, ToolUsageTotal};
use crate::error::AppError;

const TOP_TOOLS: usize = 10;

#[derive(Debug, Clone, Serialize)]
pub struct UserStats {
    pub total: i64,
    pub active: i64,
    pub premium: i64,
    pub new_last_30_days: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ContentStats {
    pub total: i64,
    pub by_status: BTreeMap<String, i64>,
    pub total_views: i64,
    pub total_likes: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ToolUsageEntry {
    pub tool_id: String,
    pub name: String,
    pub uses: i64,
}

impl From<ToolUsageTotal> for ToolUsageEntry {
    fn from(total: ToolUsageTotal) -> Self {
        Self {
            tool_id: total.tool_id,
            name: total.name,
            uses: total.uses,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ToolStats {
    pub total: i64,
    pub active: i64,
    pub premium: i64,
    pub total_usage: i64,
    pub usage_last_7_days: i64,
    pub top: Vec<ToolUsageEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MessageStats {
    pub total: i64,
    pub by_status: BTreeMap<String, i64>,
    pub unread_notifications: i64,
}

/// Dashboard snapshot
#[derive(Debug, Clone, Serialize)]
pub struct AnalyticsReport {
    pub generated_at: DateTime<Utc>,
    pub users: UserStats,
    pub content: ContentStats,
    pub tools: ToolStats,
    pub messages: MessageStats,
}

fn grouped(groups: Vec<GroupCount>) -> BTreeMap<String, i64> {
    groups
        .into_iter()
        .map(|group| (group.key, group.count))
        .collect()
}

/// Analytics service
pub struct AnalyticsService {
    db: Arc<Database>,
}

impl AnalyticsService {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    pub async fn report(&self) -> Result<AnalyticsReport, AppError> {
        let now = Utc::now();
        let db = &self.db;

        let users = UserStats {
            total: db.count_where("users", None).await?,
            active: db.count_where("users", Some("is_active = 1")).await?,
            premium: db.count_where("users", Some("is_premium = 1")).await?,
            new_last_30_days: db.count_users_created_since(now - Duration::days(30)).await?,
        };

        let (total_views, total_likes) = db.post_engagement_totals().await?;
        let content = ContentStats {
            total: db.count_where("blog_posts", None).await?,
            by_status: grouped(db.count_grouped("blog_posts", "status").await?),
            total_views,
            total_likes,
        };

        let tools = ToolStats {
            total: db.count_where("ai_tools", None).await?,
            active: db.count_where("ai_tools", Some("is_active = 1")).await?,
            premium: db.count_where("ai_tools", Some("is_premium = 1")).await?,
            total_usage: db.count_where("tool_usage", None).await?,
            usage_last_7_days: db.count_tool_usage_since(now - Duration::days(7)).await?,
            top: db
                .top_tool_usage(TOP_TOOLS)
                .await?
                .into_iter()
                .map(ToolUsageEntry::from)
                .collect(),
        };

        let messages = MessageStats {
            total: db.count_where("contact_messages", None).await?,
            by_status: grouped(db.count_grouped("contact_messages", "status").await?),
            unread_notifications: db.count_unread_notifications().await?,
        };

        Ok(AnalyticsReport {
            generated_at: now,
            users,
            content,
            tools,
            messages,
        })
    }
}
