//! AI tool catalog service

use chrono::Utc;
use serde::Deserialize;
use sqlx::types::Json;
use std::sync::Arc;

use crate::data::{AiTool, Database, EntityId, ListParams, Page, ToolUsage};
use crate::error::AppError;

/// Editable fields of a tool
#[derive(Debug, Clone, Deserialize)]
pub struct ToolInput {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub icon: String,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub is_premium: bool,
    pub route: String,
    #[serde(default)]
    pub features: Vec<String>,
}

fn default_true() -> bool {
    true
}

impl ToolInput {
    fn validate(mut self) -> Result<Self, AppError> {
        self.name = self.name.trim().to_string();
        self.route = self.route.trim().to_string();
        self.category = self.category.trim().to_ascii_lowercase();

        if self.name.is_empty() {
            return Err(AppError::Validation("name is required".to_string()));
        }
        if self.route.is_empty() {
            return Err(AppError::Validation("route is required".to_string()));
        }
        if !self.route.starts_with('/') {
            return Err(AppError::Validation(
                "route must start with '/'".to_string(),
            ));
        }
        self.features = self
            .features
            .into_iter()
            .map(|feature| feature.trim().to_string())
            .filter(|feature| !feature.is_empty())
            .collect();
        Ok(self)
    }
}

fn catalog_entry(
    name: &str,
    description: &str,
    category: &str,
    icon: &str,
    is_premium: bool,
    route: &str,
    features: &[&str],
) -> ToolInput {
    ToolInput {
        name: name.to_string(),
        description: description.to_string(),
        category: category.to_string(),
        icon: icon.to_string(),
        is_active: true,
        is_premium,
        route: route.to_string(),
        features: features.iter().map(|feature| feature.to_string()).collect(),
    }
}

/// The catalog a fresh installation starts with
pub fn default_catalog() -> Vec<ToolInput> {
    vec![
        catalog_entry(
            "Image Enhancer",
            "Upscale and sharpen photos with AI",
            "image",
            "sparkles",
            false,
            "/tools/image-enhancer",
            &["4x upscaling", "Noise reduction", "Face restoration"],
        ),
        catalog_entry(
            "Background Remover",
            "Remove image backgrounds in one click",
            "image",
            "scissors",
            false,
            "/tools/background-remover",
            &["Transparent PNG export", "Batch processing", "Edge refinement"],
        ),
        catalog_entry(
            "PDF Tools",
            "Merge, split, compress and convert PDF files",
            "document",
            "file-text",
            false,
            "/tools/pdf-tools",
            &["Merge and split", "Compression", "PDF to Word"],
        ),
        catalog_entry(
            "Resume Builder",
            "Create a professional resume from templates",
            "document",
            "briefcase",
            false,
            "/tools/resume-builder",
            &["ATS-friendly templates", "PDF export", "AI bullet suggestions"],
        ),
        catalog_entry(
            "AI Writer",
            "Draft articles, emails and marketing copy",
            "text",
            "pen-tool",
            true,
            "/tools/ai-writer",
            &["Tone control", "Long-form drafts", "Rewrite and expand"],
        ),
        catalog_entry(
            "Image Generator",
            "Turn text prompts into images",
            "image",
            "image",
            true,
            "/tools/image-generator",
            &["Multiple styles", "High resolution", "Prompt presets"],
        ),
        catalog_entry(
            "Text Summarizer",
            "Condense long documents into key points",
            "text",
            "align-left",
            false,
            "/tools/text-summarizer",
            &["Bullet summaries", "Adjustable length", "Keyword extraction"],
        ),
        catalog_entry(
            "QR Code Generator",
            "Generate customizable QR codes",
            "utility",
            "qr-code",
            false,
            "/tools/qr-code-generator",
            &["Custom colors", "Logo embedding", "SVG and PNG export"],
        ),
    ]
}

fn new_tool(input: ToolInput) -> AiTool {
    let now = Utc::now();
    AiTool {
        id: EntityId::new().0,
        name: input.name,
        description: input.description,
        category: input.category,
        icon: input.icon,
        is_active: input.is_active,
        is_premium: input.is_premium,
        usage_count: 0,
        route: input.route,
        features: Json(input.features),
        created_at: now,
        updated_at: now,
    }
}

/// Tool service
pub struct ToolService {
    db: Arc<Database>,
}

impl ToolService {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Insert the default catalog if the table is empty
    ///
    /// # Returns
    /// Number of tools inserted (0 when the catalog already has entries)
    pub async fn seed_defaults(&self) -> Result<usize, AppError> {
        if self.db.count_tools().await? > 0 {
            return Ok(0);
        }

        let tools: Vec<AiTool> = default_catalog()
            .into_iter()
            .map(ToolInput::validate)
            .collect::<Result<Vec<_>, _>>()?
            .into_iter()
            .map(new_tool)
            .collect();
        self.db.insert_tools(&tools).await?;

        tracing::info!(count = tools.len(), "Seeded default tool catalog");
        Ok(tools.len())
    }

    pub async fn list(&self, params: &ListParams) -> Result<Page<AiTool>, AppError> {
        self.db.list_tools(params, false).await
    }

    pub async fn list_active(&self, params: &ListParams) -> Result<Page<AiTool>, AppError> {
        self.db.list_tools(params, true).await
    }

    pub async fn get(&self, id: &str) -> Result<AiTool, AppError> {
        self.db.get_tool(id).await?.ok_or(AppError::NotFound)
    }

    pub async fn create(&self, input: ToolInput) -> Result<AiTool, AppError> {
        let tool = new_tool(input.validate()?);
        self.db.insert_tool(&tool).await?;

        tracing::info!(tool_id = %tool.id, name = %tool.name, "Tool created");
        Ok(tool)
    }

    /// Replace the editable fields; usage counts are kept
    pub async fn update(&self, id: &str, input: ToolInput) -> Result<AiTool, AppError> {
        let input = input.validate()?;
        let mut tool = self.get(id).await?;

        tool.name = input.name;
        tool.description = input.description;
        tool.category = input.category;
        tool.icon = input.icon;
        tool.is_active = input.is_active;
        tool.is_premium = input.is_premium;
        tool.route = input.route;
        tool.features = Json(input.features);
        tool.updated_at = Utc::now();

        self.db.update_tool(&tool).await?;
        tracing::info!(tool_id = %tool.id, "Tool updated");
        Ok(tool)
    }

    pub async fn set_active(&self, id: &str, is_active: bool) -> Result<AiTool, AppError> {
        self.db
            .set_tool_active(id, is_active, Utc::now())
            .await?
            .ok_or(AppError::NotFound)
    }

    pub async fn set_premium(&self, id: &str, is_premium: bool) -> Result<AiTool, AppError> {
        self.db
            .set_tool_premium(id, is_premium, Utc::now())
            .await?
            .ok_or(AppError::NotFound)
    }

    pub async fn delete(&self, id: &str) -> Result<(), AppError> {
        if !self.db.delete_tool(id).await? {
            return Err(AppError::NotFound);
        }
        tracing::info!(tool_id = %id, "Tool deleted");
        Ok(())
    }

    /// Record one invocation of a tool
    ///
    /// Inactive tools are hidden (404). Premium tools need the id of an
    /// active premium user.
    ///
    /// # Returns
    /// The tool's new usage count
    pub async fn record_usage(&self, id: &str, user_id: Option<&str>) -> Result<i64, AppError> {
        let tool = self.get(id).await?;
        if !tool.is_active {
            return Err(AppError::NotFound);
        }

        let user_id = user_id.map(str::trim).filter(|uid| !uid.is_empty());
        if tool.is_premium {
            let user = match user_id {
                Some(uid) => self.db.get_user(uid).await?,
                None => None,
            };
            match user {
                Some(user) if user.is_active && user.is_premium => {}
                _ => return Err(AppError::Forbidden),
            }
        }

        let usage = ToolUsage {
            id: EntityId::new().0,
            tool_id: tool.id.clone(),
            user_id: user_id.map(str::to_string),
            created_at: Utc::now(),
        };
        let usage_count = self.db.record_tool_usage(&usage).await?;

        crate::metrics::TOOL_USAGE_TOTAL
            .with_label_values(&[&tool.id])
            .inc();
        tracing::debug!(tool_id = %tool.id, user_id = ?usage.user_id, usage_count, "Tool used");
        Ok(usage_count)
    }
}
