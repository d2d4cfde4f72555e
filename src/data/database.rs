//! SQLite database operations
//!
//! All database access goes through this module.
//! Uses SQLx with runtime-built queries; schema lives in `migrations/`.

use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{Pool, Sqlite, SqlitePool};
use std::path::Path;

use super::models::*;
use super::query::{Filter, ListParams, Page, non_blank};
use crate::error::AppError;

const SITE_SETTINGS_ID: &str = "global";

/// Database connection pool wrapper
pub struct Database {
    pool: Pool<Sqlite>,
}

/// Counts grouped by a text column
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct GroupCount {
    pub key: String,
    pub count: i64,
}

/// Per-tool usage total
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ToolUsageTotal {
    pub tool_id: String,
    pub name: String,
    pub uses: i64,
}

fn parse_filter<T: std::str::FromStr<Err = AppError>>(
    value: Option<&str>,
) -> Result<Option<T>, AppError> {
    non_blank(value).map(str::parse::<T>).transpose()
}

fn apply_user_filters(filter: &mut Filter<'_>, params: &ListParams) -> Result<(), AppError> {
    filter.search(&["id", "email", "display_name"], params.search_term());

    let (active, premium) = match parse_filter::<UserStatusFilter>(params.status.as_deref())? {
        Some(UserStatusFilter::Active) => (Some(true), None),
        Some(UserStatusFilter::Inactive) => (Some(false), None),
        Some(UserStatusFilter::Premium) => (None, Some(true)),
        Some(UserStatusFilter::Free) => (None, Some(false)),
        None => (None, None),
    };

    let role = parse_filter::<UserRole>(params.role.as_deref())?;
    filter
        .eq_bool("is_active", active)
        .eq_bool("is_premium", premium)
        .eq("role", role.map(|role| role.as_str().to_string()));
    Ok(())
}

fn apply_post_filters(
    filter: &mut Filter<'_>,
    params: &ListParams,
    published_only: bool,
) -> Result<(), AppError> {
    filter.search_with_arrays(&["title", "excerpt", "author"], &["tags"], params.search_term());

    let status = if published_only {
        Some(PostStatus::Published)
    } else {
        parse_filter::<PostStatus>(params.status.as_deref())?
    };
    filter.eq("status", status.map(|status| status.as_str().to_string()));
    Ok(())
}

fn apply_tool_filters(
    filter: &mut Filter<'_>,
    params: &ListParams,
    active_only: bool,
) -> Result<(), AppError> {
    filter
        .search(&["name", "description", "category"], params.search_term())
        .eq(
            "category",
            non_blank(params.category.as_deref()).map(str::to_string),
        );

    let active = if active_only {
        Some(true)
    } else {
        match non_blank(params.status.as_deref()) {
            Some("active") => Some(true),
            Some("inactive") => Some(false),
            Some(other) => {
                return Err(AppError::Validation(format!("invalid tool status: {other}")));
            }
            None => None,
        }
    };
    filter.eq_bool("is_active", active);
    Ok(())
}

fn apply_message_filters(filter: &mut Filter<'_>, params: &ListParams) -> Result<(), AppError> {
    filter.search(&["name", "email", "subject", "message"], params.search_term());

    let status = parse_filter::<MessageStatus>(params.status.as_deref())?;
    let priority = parse_filter::<MessagePriority>(params.priority.as_deref())?;
    filter
        .eq("status", status.map(|status| status.as_str().to_string()))
        .eq(
            "priority",
            priority.map(|priority| priority.as_str().to_string()),
        );
    Ok(())
}

fn apply_security_event_filters(
    filter: &mut Filter<'_>,
    params: &ListParams,
) -> Result<(), AppError> {
    filter.search(
        &["event_type", "actor_email", "description"],
        params.search_term(),
    );

    let severity = parse_filter::<Severity>(params.severity.as_deref())?;
    filter.eq(
        "severity",
        severity.map(|severity| severity.as_str().to_string()),
    );
    Ok(())
}

impl Database {
    // =========================================================================
    // Connection
    // =========================================================================

    /// Connect to SQLite database
    ///
    /// Creates the database file if it doesn't exist.
    /// Runs pending migrations automatically.
    ///
    /// # Errors
    /// Returns error if connection or migration fails
    pub async fn connect(path: &Path) -> Result<Self, AppError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| AppError::Database(sqlx::Error::Io(e)))?;
        }

        let connection_string = format!("sqlite:{}?mode=rwc", path.display());
        let pool = SqlitePool::connect(&connection_string).await?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| {
                tracing::error!("Migration failed: {}", e);
                AppError::Internal(anyhow::anyhow!("Migration failed: {}", e))
            })?;

        tracing::info!("Database connected and migrated successfully");

        Ok(Self { pool })
    }

    // =========================================================================
    // Users
    // =========================================================================

    /// Get user by uid
    pub async fn get_user(&self, id: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    /// Insert a new profile or refresh an existing one on sign-in
    ///
    /// Flags and role of an existing profile are never touched here.
    pub async fn upsert_user_profile(
        &self,
        id: &str,
        email: &str,
        display_name: Option<&str>,
        provider: &str,
        now: DateTime<Utc>,
    ) -> Result<User, AppError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (
                id, email, display_name, provider, is_active, is_premium, role,
                created_at, last_login_at
            ) VALUES (?, ?, ?, ?, 1, 0, 'user', ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                email = excluded.email,
                display_name = COALESCE(excluded.display_name, users.display_name),
                last_login_at = excluded.last_login_at
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(email)
        .bind(display_name)
        .bind(provider)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }

    /// List users matching the filter (newest first)
    pub async fn list_users(&self, params: &ListParams) -> Result<Page<User>, AppError> {
        let mut count = Filter::new("SELECT COUNT(*) FROM users");
        apply_user_filters(&mut count, params)?;
        let total = count
            .into_builder()
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await?;

        let mut select = Filter::new("SELECT * FROM users");
        apply_user_filters(&mut select, params)?;
        let items = select
            .page("created_at DESC, id", params.limit(), params.offset())
            .build_query_as::<User>()
            .fetch_all(&self.pool)
            .await?;

        Ok(Page {
            items,
            total,
            limit: params.limit(),
            offset: params.offset(),
        })
    }

    /// Every user, for CSV export
    pub async fn get_all_users(&self) -> Result<Vec<User>, AppError> {
        let users = sqlx::query_as::<_, User>("SELECT * FROM users ORDER BY created_at, id")
            .fetch_all(&self.pool)
            .await?;

        Ok(users)
    }

    pub async fn set_user_active(
        &self,
        id: &str,
        is_active: bool,
    ) -> Result<Option<User>, AppError> {
        let user =
            sqlx::query_as::<_, User>("UPDATE users SET is_active = ? WHERE id = ? RETURNING *")
                .bind(is_active)
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(user)
    }

    pub async fn set_user_premium(
        &self,
        id: &str,
        is_premium: bool,
    ) -> Result<Option<User>, AppError> {
        let user =
            sqlx::query_as::<_, User>("UPDATE users SET is_premium = ? WHERE id = ? RETURNING *")
                .bind(is_premium)
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(user)
    }

    pub async fn set_user_role(&self, id: &str, role: UserRole) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>("UPDATE users SET role = ? WHERE id = ? RETURNING *")
            .bind(role.as_str())
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    /// Delete a user and every tool usage row recorded for them
    ///
    /// Both deletes commit together or not at all.
    ///
    /// # Returns
    /// Number of usage rows removed, or `None` if the user did not exist
    pub async fn delete_user_cascade(&self, id: &str) -> Result<Option<u64>, AppError> {
        let mut tx = self.pool.begin().await?;

        let usage = sqlx::query("DELETE FROM tool_usage WHERE user_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let deleted = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if deleted.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(None);
        }

        tx.commit().await?;
        Ok(Some(usage.rows_affected()))
    }

    pub async fn count_tool_usage_for_user(&self, user_id: &str) -> Result<i64, AppError> {
        let count =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM tool_usage WHERE user_id = ?")
                .bind(user_id)
                .fetch_one(&self.pool)
                .await?;

        Ok(count)
    }

    // =========================================================================
    // Blog posts
    // =========================================================================

    pub async fn insert_post(&self, post: &BlogPost) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO blog_posts (
                id, title, content, excerpt, author, status, tags, featured_image,
                views, likes, featured, created_at, updated_at, published_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&post.id)
        .bind(&post.title)
        .bind(&post.content)
        .bind(&post.excerpt)
        .bind(&post.author)
        .bind(&post.status)
        .bind(&post.tags)
        .bind(&post.featured_image)
        .bind(post.views)
        .bind(post.likes)
        .bind(post.featured)
        .bind(post.created_at)
        .bind(post.updated_at)
        .bind(post.published_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn get_post(&self, id: &str) -> Result<Option<BlogPost>, AppError> {
        let post = sqlx::query_as::<_, BlogPost>("SELECT * FROM blog_posts WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(post)
    }

    /// Overwrite the editable fields of a post
    pub async fn update_post(&self, post: &BlogPost) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE blog_posts
            SET title = ?, content = ?, excerpt = ?, author = ?, status = ?, tags = ?,
                featured_image = ?, featured = ?, updated_at = ?, published_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&post.title)
        .bind(&post.content)
        .bind(&post.excerpt)
        .bind(&post.author)
        .bind(&post.status)
        .bind(&post.tags)
        .bind(&post.featured_image)
        .bind(post.featured)
        .bind(post.updated_at)
        .bind(post.published_at)
        .bind(&post.id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Set the status of a post
    ///
    /// `published_at` is stamped the first time a post is published and kept
    /// afterwards.
    pub async fn set_post_status(
        &self,
        id: &str,
        status: PostStatus,
        now: DateTime<Utc>,
    ) -> Result<Option<BlogPost>, AppError> {
        let first_published = (status == PostStatus::Published).then_some(now);
        let post = sqlx::query_as::<_, BlogPost>(
            r#"
            UPDATE blog_posts
            SET status = ?, updated_at = ?, published_at = COALESCE(published_at, ?)
            WHERE id = ?
            RETURNING *
            "#,
        )
        .bind(status.as_str())
        .bind(now)
        .bind(first_published)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(post)
    }

    pub async fn set_post_featured(
        &self,
        id: &str,
        featured: bool,
        now: DateTime<Utc>,
    ) -> Result<Option<BlogPost>, AppError> {
        let post = sqlx::query_as::<_, BlogPost>(
            "UPDATE blog_posts SET featured = ?, updated_at = ? WHERE id = ? RETURNING *",
        )
        .bind(featured)
        .bind(now)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(post)
    }

    pub async fn delete_post(&self, id: &str) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM blog_posts WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// List posts matching the filter (newest first)
    pub async fn list_posts(
        &self,
        params: &ListParams,
        published_only: bool,
    ) -> Result<Page<BlogPost>, AppError> {
        let mut count = Filter::new("SELECT COUNT(*) FROM blog_posts");
        apply_post_filters(&mut count, params, published_only)?;
        let total = count
            .into_builder()
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await?;

        let order_by = if published_only {
            "featured DESC, COALESCE(published_at, created_at) DESC, id"
        } else {
            "created_at DESC, id"
        };

        let mut select = Filter::new("SELECT * FROM blog_posts");
        apply_post_filters(&mut select, params, published_only)?;
        let items = select
            .page(order_by, params.limit(), params.offset())
            .build_query_as::<BlogPost>()
            .fetch_all(&self.pool)
            .await?;

        Ok(Page {
            items,
            total,
            limit: params.limit(),
            offset: params.offset(),
        })
    }

    /// Bump the view counter of a published post and return it
    pub async fn view_published_post(&self, id: &str) -> Result<Option<BlogPost>, AppError> {
        let post = sqlx::query_as::<_, BlogPost>(
            "UPDATE blog_posts SET views = views + 1 WHERE id = ? AND status = 'published' RETURNING *",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(post)
    }

    /// Bump the like counter of a published post and return the new count
    pub async fn like_published_post(&self, id: &str) -> Result<Option<i64>, AppError> {
        let likes = sqlx::query_scalar::<_, i64>(
            "UPDATE blog_posts SET likes = likes + 1 WHERE id = ? AND status = 'published' RETURNING likes",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(likes)
    }

    // =========================================================================
    // AI tools
    // =========================================================================

    pub async fn count_tools(&self) -> Result<i64, AppError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM ai_tools")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    pub async fn insert_tool(&self, tool: &AiTool) -> Result<(), AppError> {
        self.insert_tools(std::slice::from_ref(tool)).await
    }

    /// Insert several tools in one transaction
    pub async fn insert_tools(&self, tools: &[AiTool]) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        for tool in tools {
            sqlx::query(
                r#"
                INSERT INTO ai_tools (
                    id, name, description, category, icon, is_active, is_premium,
                    usage_count, route, features, created_at, updated_at
                ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&tool.id)
            .bind(&tool.name)
            .bind(&tool.description)
            .bind(&tool.category)
            .bind(&tool.icon)
            .bind(tool.is_active)
            .bind(tool.is_premium)
            .bind(tool.usage_count)
            .bind(&tool.route)
            .bind(&tool.features)
            .bind(tool.created_at)
            .bind(tool.updated_at)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    pub async fn get_tool(&self, id: &str) -> Result<Option<AiTool>, AppError> {
        let tool = sqlx::query_as::<_, AiTool>("SELECT * FROM ai_tools WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(tool)
    }

    /// Overwrite the editable fields of a tool
    pub async fn update_tool(&self, tool: &AiTool) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE ai_tools
            SET name = ?, description = ?, category = ?, icon = ?, is_active = ?,
                is_premium = ?, route = ?, features = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&tool.name)
        .bind(&tool.description)
        .bind(&tool.category)
        .bind(&tool.icon)
        .bind(tool.is_active)
        .bind(tool.is_premium)
        .bind(&tool.route)
        .bind(&tool.features)
        .bind(tool.updated_at)
        .bind(&tool.id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn set_tool_active(
        &self,
        id: &str,
        is_active: bool,
        now: DateTime<Utc>,
    ) -> Result<Option<AiTool>, AppError> {
        let tool = sqlx::query_as::<_, AiTool>(
            "UPDATE ai_tools SET is_active = ?, updated_at = ? WHERE id = ? RETURNING *",
        )
        .bind(is_active)
        .bind(now)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(tool)
    }

    pub async fn set_tool_premium(
        &self,
        id: &str,
        is_premium: bool,
        now: DateTime<Utc>,
    ) -> Result<Option<AiTool>, AppError> {
        let tool = sqlx::query_as::<_, AiTool>(
            "UPDATE ai_tools SET is_premium = ?, updated_at = ? WHERE id = ? RETURNING *",
        )
        .bind(is_premium)
        .bind(now)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(tool)
    }

    pub async fn delete_tool(&self, id: &str) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM ai_tools WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// List tools matching the filter, ordered by category then name
    pub async fn list_tools(
        &self,
        params: &ListParams,
        active_only: bool,
    ) -> Result<Page<AiTool>, AppError> {
        let mut count = Filter::new("SELECT COUNT(*) FROM ai_tools");
        apply_tool_filters(&mut count, params, active_only)?;
        let total = count
            .into_builder()
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await?;

        let mut select = Filter::new("SELECT * FROM ai_tools");
        apply_tool_filters(&mut select, params, active_only)?;
        let items = select
            .page("category, name, id", params.limit(), params.offset())
            .build_query_as::<AiTool>()
            .fetch_all(&self.pool)
            .await?;

        Ok(Page {
            items,
            total,
            limit: params.limit(),
            offset: params.offset(),
        })
    }

    /// Record one invocation and bump the tool's counter atomically
    pub async fn record_tool_usage(&self, usage: &ToolUsage) -> Result<i64, AppError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("INSERT INTO tool_usage (id, tool_id, user_id, created_at) VALUES (?, ?, ?, ?)")
            .bind(&usage.id)
            .bind(&usage.tool_id)
            .bind(&usage.user_id)
            .bind(usage.created_at)
            .execute(&mut *tx)
            .await?;

        let usage_count = sqlx::query_scalar::<_, i64>(
            "UPDATE ai_tools SET usage_count = usage_count + 1 WHERE id = ? RETURNING usage_count",
        )
        .bind(&usage.tool_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(usage_count) = usage_count else {
            tx.rollback().await?;
            return Err(AppError::NotFound);
        };

        tx.commit().await?;
        Ok(usage_count)
    }

    // =========================================================================
    // Contact messages
    // =========================================================================

    /// Store a contact form submission and its admin notification together
    pub async fn insert_contact_submission(
        &self,
        message: &ContactMessage,
        notification: Option<&AdminNotification>,
    ) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO contact_messages (
                id, name, email, subject, message, status, priority, reply,
                replied_at, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&message.id)
        .bind(&message.name)
        .bind(&message.email)
        .bind(&message.subject)
        .bind(&message.message)
        .bind(&message.status)
        .bind(&message.priority)
        .bind(&message.reply)
        .bind(message.replied_at)
        .bind(message.created_at)
        .bind(message.updated_at)
        .execute(&mut *tx)
        .await?;

        if let Some(notification) = notification {
            sqlx::query(
                r#"
                INSERT INTO admin_notifications (
                    id, notification_type, title, message, is_read, related_id, created_at
                ) VALUES (?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&notification.id)
            .bind(&notification.notification_type)
            .bind(&notification.title)
            .bind(&notification.message)
            .bind(notification.is_read)
            .bind(&notification.related_id)
            .bind(notification.created_at)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    pub async fn get_message(&self, id: &str) -> Result<Option<ContactMessage>, AppError> {
        let message =
            sqlx::query_as::<_, ContactMessage>("SELECT * FROM contact_messages WHERE id = ?")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(message)
    }

    pub async fn set_message_status(
        &self,
        id: &str,
        status: MessageStatus,
        now: DateTime<Utc>,
    ) -> Result<Option<ContactMessage>, AppError> {
        let message = sqlx::query_as::<_, ContactMessage>(
            "UPDATE contact_messages SET status = ?, updated_at = ? WHERE id = ? RETURNING *",
        )
        .bind(status.as_str())
        .bind(now)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(message)
    }

    /// Flip an unread message to read; other statuses are left alone
    pub async fn mark_message_read_if_unread(
        &self,
        id: &str,
        now: DateTime<Utc>,
    ) -> Result<(), AppError> {
        sqlx::query(
            "UPDATE contact_messages SET status = 'read', updated_at = ? WHERE id = ? AND status = 'unread'",
        )
        .bind(now)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn set_message_priority(
        &self,
        id: &str,
        priority: MessagePriority,
        now: DateTime<Utc>,
    ) -> Result<Option<ContactMessage>, AppError> {
        let message = sqlx::query_as::<_, ContactMessage>(
            "UPDATE contact_messages SET priority = ?, updated_at = ? WHERE id = ? RETURNING *",
        )
        .bind(priority.as_str())
        .bind(now)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(message)
    }

    /// Store a reply and flip the message to `replied`
    pub async fn reply_to_message(
        &self,
        id: &str,
        reply: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<ContactMessage>, AppError> {
        let message = sqlx::query_as::<_, ContactMessage>(
            r#"
            UPDATE contact_messages
            SET reply = ?, replied_at = ?, status = 'replied', updated_at = ?
            WHERE id = ?
            RETURNING *
            "#,
        )
        .bind(reply)
        .bind(now)
        .bind(now)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(message)
    }

    pub async fn delete_message(&self, id: &str) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM contact_messages WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// List messages matching the filter (newest first)
    pub async fn list_messages(
        &self,
        params: &ListParams,
    ) -> Result<Page<ContactMessage>, AppError> {
        let mut count = Filter::new("SELECT COUNT(*) FROM contact_messages");
        apply_message_filters(&mut count, params)?;
        let total = count
            .into_builder()
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await?;

        let mut select = Filter::new("SELECT * FROM contact_messages");
        apply_message_filters(&mut select, params)?;
        let items = select
            .page("created_at DESC, id", params.limit(), params.offset())
            .build_query_as::<ContactMessage>()
            .fetch_all(&self.pool)
            .await?;

        Ok(Page {
            items,
            total,
            limit: params.limit(),
            offset: params.offset(),
        })
    }

    // =========================================================================
    // Admin notifications
    // =========================================================================

    /// Unread notifications, newest first
    pub async fn get_unread_notifications(
        &self,
        limit: usize,
    ) -> Result<Vec<AdminNotification>, AppError> {
        let notifications = sqlx::query_as::<_, AdminNotification>(
            "SELECT * FROM admin_notifications WHERE is_read = 0 ORDER BY created_at DESC, id DESC LIMIT ?",
        )
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        Ok(notifications)
    }

    pub async fn count_unread_notifications(&self) -> Result<i64, AppError> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM admin_notifications WHERE is_read = 0",
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    pub async fn get_notification(
        &self,
        id: &str,
    ) -> Result<Option<AdminNotification>, AppError> {
        let notification = sqlx::query_as::<_, AdminNotification>(
            "SELECT * FROM admin_notifications WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(notification)
    }

    /// Mark one notification read; returns false if it does not exist
    pub async fn mark_notification_read(&self, id: &str) -> Result<bool, AppError> {
        let result = sqlx::query("UPDATE admin_notifications SET is_read = 1 WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Mark all notifications read; returns how many changed
    pub async fn mark_all_notifications_read(&self) -> Result<u64, AppError> {
        let result = sqlx::query("UPDATE admin_notifications SET is_read = 1 WHERE is_read = 0")
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    // =========================================================================
    // Site settings
    // =========================================================================

    /// Load the settings document, if one has been stored
    pub async fn get_site_settings(&self) -> Result<Option<SiteSettings>, AppError> {
        let raw = sqlx::query_scalar::<_, Json<SiteSettings>>(
            "SELECT settings FROM site_settings WHERE id = ?",
        )
        .bind(SITE_SETTINGS_ID)
        .fetch_optional(&self.pool)
        .await?;

        Ok(raw.map(|Json(settings)| settings))
    }

    /// Replace the settings document wholesale
    pub async fn put_site_settings(
        &self,
        settings: &SiteSettings,
        now: DateTime<Utc>,
    ) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO site_settings (id, settings, updated_at) VALUES (?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET settings = excluded.settings, updated_at = excluded.updated_at
            "#,
        )
        .bind(SITE_SETTINGS_ID)
        .bind(Json(settings))
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    // =========================================================================
    // Admins
    // =========================================================================

    pub async fn get_admin(&self, id: &str) -> Result<Option<Admin>, AppError> {
        let admin = sqlx::query_as::<_, Admin>("SELECT * FROM admins WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(admin)
    }

    pub async fn get_admin_by_email(&self, email: &str) -> Result<Option<Admin>, AppError> {
        let admin = sqlx::query_as::<_, Admin>("SELECT * FROM admins WHERE email = ?")
            .bind(email.trim().to_ascii_lowercase())
            .fetch_optional(&self.pool)
            .await?;

        Ok(admin)
    }

    pub async fn insert_admin(&self, admin: &Admin) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO admins (
                id, email, display_name, password_hash, role, is_active, created_at, last_login_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&admin.id)
        .bind(admin.email.to_ascii_lowercase())
        .bind(&admin.display_name)
        .bind(&admin.password_hash)
        .bind(&admin.role)
        .bind(admin.is_active)
        .bind(admin.created_at)
        .bind(admin.last_login_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn touch_admin_login(&self, id: &str, now: DateTime<Utc>) -> Result<(), AppError> {
        sqlx::query("UPDATE admins SET last_login_at = ? WHERE id = ?")
            .bind(now)
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    // =========================================================================
    // Security events
    // =========================================================================

    pub async fn insert_security_event(&self, event: &SecurityEvent) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO security_events (
                id, event_type, severity, actor_email, ip_address, description, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&event.id)
        .bind(&event.event_type)
        .bind(&event.severity)
        .bind(&event.actor_email)
        .bind(&event.ip_address)
        .bind(&event.description)
        .bind(event.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Count events of one type for an actor since `since`
    pub async fn count_security_events_since(
        &self,
        actor_email: &str,
        event_type: SecurityEventType,
        since: DateTime<Utc>,
    ) -> Result<i64, AppError> {
        let count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM security_events
            WHERE actor_email = ? AND event_type = ? AND created_at >= ?
            "#,
        )
        .bind(actor_email)
        .bind(event_type.as_str())
        .bind(since)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    /// Time of the actor's most recent event of one type, if any
    pub async fn latest_security_event_at(
        &self,
        actor_email: &str,
        event_type: SecurityEventType,
    ) -> Result<Option<DateTime<Utc>>, AppError> {
        let latest = sqlx::query_scalar::<_, DateTime<Utc>>(
            r#"
            SELECT created_at FROM security_events
            WHERE actor_email = ? AND event_type = ?
            ORDER BY created_at DESC LIMIT 1
            "#,
        )
        .bind(actor_email)
        .bind(event_type.as_str())
        .fetch_optional(&self.pool)
        .await?;

        Ok(latest)
    }

    /// List security events matching the filter (newest first)
    pub async fn list_security_events(
        &self,
        params: &ListParams,
    ) -> Result<Page<SecurityEvent>, AppError> {
        let mut count = Filter::new("SELECT COUNT(*) FROM security_events");
        apply_security_event_filters(&mut count, params)?;
        let total = count
            .into_builder()
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await?;

        let mut select = Filter::new("SELECT * FROM security_events");
        apply_security_event_filters(&mut select, params)?;
        let items = select
            .page("created_at DESC, id DESC", params.limit(), params.offset())
            .build_query_as::<SecurityEvent>()
            .fetch_all(&self.pool)
            .await?;

        Ok(Page {
            items,
            total,
            limit: params.limit(),
            offset: params.offset(),
        })
    }

    /// Every security event matching the filter, for CSV export
    pub async fn get_all_security_events(
        &self,
        params: &ListParams,
    ) -> Result<Vec<SecurityEvent>, AppError> {
        let mut select = Filter::new("SELECT * FROM security_events");
        apply_security_event_filters(&mut select, params)?;
        let mut builder = select.into_builder();
        builder.push(" ORDER BY created_at DESC, id DESC");

        let events = builder
            .build_query_as::<SecurityEvent>()
            .fetch_all(&self.pool)
            .await?;

        Ok(events)
    }

    // =========================================================================
    // Analytics
    // =========================================================================

    /// Row count of a table, optionally restricted by a fixed predicate
    ///
    /// `table` and `predicate` are compile-time constants from the analytics
    /// service, never user input.
    pub async fn count_where(&self, table: &str, predicate: Option<&str>) -> Result<i64, AppError> {
        let sql = match predicate {
            Some(predicate) => format!("SELECT COUNT(*) FROM {table} WHERE {predicate}"),
            None => format!("SELECT COUNT(*) FROM {table}"),
        };
        let count = sqlx::query_scalar::<_, i64>(&sql)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    pub async fn count_users_created_since(&self, since: DateTime<Utc>) -> Result<i64, AppError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users WHERE created_at >= ?")
            .bind(since)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    pub async fn count_tool_usage_since(&self, since: DateTime<Utc>) -> Result<i64, AppError> {
        let count =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM tool_usage WHERE created_at >= ?")
                .bind(since)
                .fetch_one(&self.pool)
                .await?;

        Ok(count)
    }

    /// Row counts of `table` grouped by `column`
    ///
    /// Both arguments are compile-time constants from the analytics service.
    pub async fn count_grouped(
        &self,
        table: &str,
        column: &str,
    ) -> Result<Vec<GroupCount>, AppError> {
        let sql = format!(
            "SELECT {column} AS key, COUNT(*) AS count FROM {table} GROUP BY {column} ORDER BY {column}"
        );
        let groups = sqlx::query_as::<_, GroupCount>(&sql)
            .fetch_all(&self.pool)
            .await?;

        Ok(groups)
    }

    /// Total views and likes across all posts
    pub async fn post_engagement_totals(&self) -> Result<(i64, i64), AppError> {
        let totals = sqlx::query_as::<_, (i64, i64)>(
            "SELECT COALESCE(SUM(views), 0), COALESCE(SUM(likes), 0) FROM blog_posts",
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(totals)
    }

    /// Most used tools by recorded usage rows
    pub async fn top_tool_usage(&self, limit: usize) -> Result<Vec<ToolUsageTotal>, AppError> {
        let totals = sqlx::query_as::<_, ToolUsageTotal>(
            r#"
            SELECT t.id AS tool_id, t.name AS name, COUNT(u.id) AS uses
            FROM ai_tools t
            LEFT JOIN tool_usage u ON u.tool_id = t.id
            GROUP BY t.id, t.name
            ORDER BY uses DESC, t.name
            LIMIT ?
            "#,
        )
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        Ok(totals)
    }
}
