//! Blog content service
//!
//! Handles post create/edit, publishing, and the public read path.

use chrono::Utc;
use serde::Deserialize;
use sqlx::types::Json;
use std::sync::Arc;

use crate::data::{BlogPost, Database, EntityId, ListParams, Page, PostStatus};
use crate::error::AppError;
use crate::storage::{BLOG_IMAGE_PREFIX, MediaStorage, StoredObject};

/// Characters of content kept in a derived excerpt
pub const EXCERPT_CHARS: usize = 200;

/// Editable fields of a post
#[derive(Debug, Clone, Deserialize)]
pub struct PostInput {
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub excerpt: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub featured_image: Option<String>,
    #[serde(default)]
    pub featured: bool,
}

/// First [`EXCERPT_CHARS`] characters of `content` followed by "..."
pub fn derive_excerpt(content: &str) -> String {
    let mut excerpt: String = content.chars().take(EXCERPT_CHARS).collect();
    excerpt.push_str("...");
    excerpt
}

/// Strip scripts, handlers and other unsafe markup from post HTML
pub fn sanitize_html(content: &str) -> String {
    ammonia::clean(content)
}

fn normalize_tags(tags: Vec<String>) -> Vec<String> {
    let mut normalized: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let tag = tag.trim().to_string();
        if !tag.is_empty() && !normalized.contains(&tag) {
            normalized.push(tag);
        }
    }
    normalized
}

/// Validated, normalized form of a [`PostInput`]
struct PostFields {
    title: String,
    content: String,
    excerpt: String,
    author: Option<String>,
    status: Option<PostStatus>,
    tags: Vec<String>,
    featured_image: Option<String>,
    featured: bool,
}

impl PostFields {
    fn from_input(input: PostInput) -> Result<Self, AppError> {
        let title = input.title.trim().to_string();
        if title.is_empty() {
            return Err(AppError::Validation("title is required".to_string()));
        }
        let content = sanitize_html(&input.content);
        if content.trim().is_empty() {
            return Err(AppError::Validation("content is required".to_string()));
        }

        let excerpt = match input.excerpt.as_deref().map(str::trim) {
            Some(excerpt) if !excerpt.is_empty() => excerpt.to_string(),
            _ => derive_excerpt(&content),
        };
        let status = input
            .status
            .as_deref()
            .map(str::parse::<PostStatus>)
            .transpose()?;

        Ok(Self {
            title,
            content,
            excerpt,
            author: input
                .author
                .map(|author| author.trim().to_string())
                .filter(|author| !author.is_empty()),
            status,
            tags: normalize_tags(input.tags),
            featured_image: input
                .featured_image
                .map(|key| key.trim().to_string())
                .filter(|key| !key.is_empty()),
            featured: input.featured,
        })
    }
}

/// Content service
pub struct ContentService {
    db: Arc<Database>,
    storage: Arc<MediaStorage>,
}

impl ContentService {
    pub fn new(db: Arc<Database>, storage: Arc<MediaStorage>) -> Self {
        Self { db, storage }
    }

    // =========================================================================
    // Admin
    // =========================================================================

    pub async fn list(&self, params: &ListParams) -> Result<Page<BlogPost>, AppError> {
        self.db.list_posts(params, false).await
    }

    pub async fn get(&self, id: &str) -> Result<BlogPost, AppError> {
        self.db.get_post(id).await?.ok_or(AppError::NotFound)
    }

    /// Create a post
    ///
    /// `default_author` is used when the input names no author.
    pub async fn create(
        &self,
        input: PostInput,
        default_author: &str,
    ) -> Result<BlogPost, AppError> {
        let fields = PostFields::from_input(input)?;
        let now = Utc::now();
        let status = fields.status.unwrap_or(PostStatus::Draft);

        let post = BlogPost {
            id: EntityId::new().0,
            title: fields.title,
            content: fields.content,
            excerpt: fields.excerpt,
            author: fields.author.unwrap_or_else(|| default_author.to_string()),
            status: status.as_str().to_string(),
            tags: Json(fields.tags),
            featured_image: fields.featured_image,
            views: 0,
            likes: 0,
            featured: fields.featured,
            created_at: now,
            updated_at: now,
            published_at: (status == PostStatus::Published).then_some(now),
        };
        self.db.insert_post(&post).await?;

        tracing::info!(post_id = %post.id, status = %post.status, "Blog post created");
        Ok(post)
    }

    /// Replace the editable fields of a post
    pub async fn update(&self, id: &str, input: PostInput) -> Result<BlogPost, AppError> {
        let mut post = self.get(id).await?;
        let fields = PostFields::from_input(input)?;
        let now = Utc::now();

        post.title = fields.title;
        post.content = fields.content;
        post.excerpt = fields.excerpt;
        if let Some(author) = fields.author {
            post.author = author;
        }
        if let Some(status) = fields.status {
            post.status = status.as_str().to_string();
            if status == PostStatus::Published && post.published_at.is_none() {
                post.published_at = Some(now);
            }
        }
        post.tags = Json(fields.tags);
        post.featured_image = fields.featured_image;
        post.featured = fields.featured;
        post.updated_at = now;

        self.db.update_post(&post).await?;
        tracing::info!(post_id = %post.id, "Blog post updated");
        Ok(post)
    }

    pub async fn set_status(&self, id: &str, status: &str) -> Result<BlogPost, AppError> {
        let status = status.parse::<PostStatus>()?;
        let post = self
            .db
            .set_post_status(id, status, Utc::now())
            .await?
            .ok_or(AppError::NotFound)?;

        tracing::info!(post_id = %id, status = %status, "Blog post status changed");
        Ok(post)
    }

    pub async fn set_featured(&self, id: &str, featured: bool) -> Result<BlogPost, AppError> {
        self.db
            .set_post_featured(id, featured, Utc::now())
            .await?
            .ok_or(AppError::NotFound)
    }

    /// Delete a post and, best effort, its uploaded featured image
    pub async fn delete(&self, id: &str) -> Result<(), AppError> {
        let post = self.get(id).await?;
        if !self.db.delete_post(id).await? {
            return Err(AppError::NotFound);
        }
        tracing::info!(post_id = %id, "Blog post deleted");

        if let Some(key) = post
            .featured_image
            .as_deref()
            .filter(|key| key.starts_with(BLOG_IMAGE_PREFIX))
        {
            if let Err(error) = self.storage.delete(key).await {
                tracing::warn!(%error, key, "Failed to delete featured image");
            }
        }
        Ok(())
    }

    pub async fn upload_image(
        &self,
        filename: &str,
        data: Vec<u8>,
        content_type: &str,
    ) -> Result<StoredObject, AppError> {
        self.storage
            .upload_blog_image(filename, data, content_type)
            .await
    }

    // =========================================================================
    // Public
    // =========================================================================

    pub async fn list_published(&self, params: &ListParams) -> Result<Page<BlogPost>, AppError> {
        self.db.list_posts(params, true).await
    }

    /// Fetch a published post and count the view
    pub async fn view_published(&self, id: &str) -> Result<BlogPost, AppError> {
        self.db
            .view_published_post(id)
            .await?
            .ok_or(AppError::NotFound)
    }

    /// Like a published post; returns the new like count
    pub async fn like(&self, id: &str) -> Result<i64, AppError> {
        self.db
            .like_published_post(id)
            .await?
            .ok_or(AppError::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(title: &str, content: &str) -> PostInput {
        PostInput {
            title: title.to_string(),
            content: content.to_string(),
            excerpt: None,
            author: None,
            status: None,
            tags: Vec::new(),
            featured_image: None,
            featured: false,
        }
    }

    #[test]
    fn excerpt_takes_first_200_chars() {
        let content = "é".repeat(250);
        let excerpt = derive_excerpt(&content);
        assert_eq!(excerpt.chars().count(), EXCERPT_CHARS + 3);
        assert!(excerpt.ends_with("..."));
        assert_eq!(derive_excerpt("short"), "short...");
    }

    #[test]
    fn blank_title_or_content_is_rejected() {
        assert!(PostFields::from_input(input("  ", "body")).is_err());
        assert!(PostFields::from_input(input("Title", " \n ")).is_err());
    }

    #[test]
    fn content_that_sanitizes_to_nothing_is_rejected() {
        let result = PostFields::from_input(input("Title", "<script>alert(1)</script>"));
        assert!(matches!(
            result,
            Err(AppError::Validation(message)) if message == "content is required"
        ));
    }

    #[test]
    fn explicit_excerpt_wins_over_derived() {
        let mut post = input("Title", "Body text");
        post.excerpt = Some(" Custom summary ".to_string());
        let fields = PostFields::from_input(post).unwrap();
        assert_eq!(fields.excerpt, "Custom summary");

        let fields = PostFields::from_input(input("Title", "Body text")).unwrap();
        assert_eq!(fields.excerpt, "Body text...");
    }

    #[test]
    fn scripts_are_stripped_from_content() {
        let fields =
            PostFields::from_input(input("Title", "<p>Hi</p><script>alert(1)</script>")).unwrap();
        assert_eq!(fields.content, "<p>Hi</p>");
    }

    #[test]
    fn tags_are_trimmed_and_deduplicated() {
        assert_eq!(
            normalize_tags(vec![" ai ".into(), "ai".into(), "".into(), "pdf".into()]),
            vec!["ai".to_string(), "pdf".to_string()]
        );
    }

    #[test]
    fn unknown_status_is_rejected() {
        let mut post = input("Title", "Body");
        post.status = Some("scheduled".to_string());
        assert!(matches!(
            PostFields::from_input(post),
            Err(AppError::Validation(_))
        ));
    }
}
