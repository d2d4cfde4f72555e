//! ToolHub - Backend for the AI Tools Hub marketing site and back-office
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      API Layer (Axum)                        │
//! │  - Public API (tools, blog, contact form)                   │
//! │  - Admin API (users, content, messages, settings)           │
//! │  - Marketing pages, auth, metrics                           │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Service Layer                            │
//! │  - Business logic                                           │
//! │  - Notification hub (live unread list)                      │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Data Layer                              │
//! │  - SQLite (sqlx)                                            │
//! │  - Settings cache (moka)                                    │
//! │  - R2 or local media storage                                │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - `api`: HTTP handlers
//! - `service`: Business logic layer
//! - `data`: Database and cache layer
//! - `storage`: Media storage
//! - `auth`: Admin login and sessions
//! - `config`: Configuration management
//! - `error`: Error types
//! - `metrics`: Prometheus registry

pub mod api;
pub mod auth;
pub mod config;
pub mod data;
pub mod error;
pub mod metrics;
pub mod service;
pub mod storage;

use std::sync::Arc;

use service::NotificationHub;

/// Upper bound for any request body; image uploads set their own limit
const MAX_REQUEST_BYTES: usize = 12 * 1024 * 1024;

/// Application state shared across all handlers
///
/// This struct is cloned for each request and contains
/// shared resources like the database pool, caches and storage.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<config::AppConfig>,

    /// Database connection pool
    pub db: Arc<data::Database>,

    /// Site settings cache (volatile)
    pub settings: Arc<data::SettingsCache>,

    /// Media storage (Cloudflare R2 or local directory)
    pub storage: Arc<storage::MediaStorage>,

    /// Live unread notification list
    pub notifications: NotificationHub,
}

impl AppState {
    /// Initialize application state
    ///
    /// # Steps
    /// 1. Connect to SQLite database
    /// 2. Initialize caches
    /// 3. Connect to media storage
    /// 4. Create the bootstrap admin
    /// 5. Seed the default tool catalog
    /// 6. Load unread notifications
    ///
    /// # Errors
    /// Returns error if any initialization step fails
    pub async fn new(config: config::AppConfig) -> Result<Self, error::AppError> {
        tracing::info!("Initializing application state...");

        // 1. Connect to SQLite database
        let db = Arc::new(data::Database::connect(&config.database.path).await?);
        tracing::info!(path = %config.database.path.display(), "Database initialized");

        // 2. Initialize caches
        let settings = Arc::new(data::SettingsCache::new(config.cache.settings_ttl));

        // 3. Connect to media storage
        let storage =
            storage::MediaStorage::new(&config.storage.media, config.cloudflare.as_ref()).await?;
        tracing::info!(backend = ?config.storage.media.backend, "Media storage initialized");

        // 4. Initialize admin user
        Self::ensure_admin_user(&db, &config).await?;

        // 5. Seed tool catalog
        let seeded = service::ToolService::new(db.clone()).seed_defaults().await?;
        if seeded > 0 {
            tracing::info!(count = seeded, "Seeded default tool catalog");
        }

        // 6. Load unread notifications
        let notifications = NotificationHub::new(config.notifications.max_unread);
        notifications.refresh(&db).await?;

        tracing::info!("Application state initialized successfully");

        Ok(Self {
            config: Arc::new(config),
            db,
            settings,
            storage: Arc::new(storage),
            notifications,
        })
    }

    /// Ensure the bootstrap admin exists
    ///
    /// An existing account is left untouched; the configured password is
    /// only used to create it.
    async fn ensure_admin_user(
        db: &data::Database,
        config: &config::AppConfig,
    ) -> Result<(), error::AppError> {
        if let Some(admin) = db.get_admin_by_email(&config.admin.email).await? {
            tracing::info!(email = %admin.email, role = %admin.role, "Admin account exists");
            return Ok(());
        }

        let Some(password) = config.admin.password.as_deref() else {
            tracing::warn!(
                email = %config.admin.email,
                "Admin account missing and admin.password not set; back-office login is disabled"
            );
            return Ok(());
        };

        let admin = data::Admin {
            id: data::EntityId::new().0,
            email: config.admin.email.trim().to_ascii_lowercase(),
            display_name: config.admin.display_name.clone(),
            password_hash: auth::hash_password(password)?,
            role: data::AdminRole::SuperAdmin.as_str().to_string(),
            is_active: true,
            created_at: chrono::Utc::now(),
            last_login_at: None,
        };
        db.insert_admin(&admin).await?;

        tracing::info!(
            email = %admin.email,
            display_name = %admin.display_name,
            "Admin account created"
        );

        Ok(())
    }
}

/// Build the Axum router with all routes.
///
/// This is shared by the binary and integration tests to keep route
/// composition consistent across environments.
pub fn build_router(state: AppState) -> axum::Router {
    use axum::{Router, middleware::from_fn_with_state};
    use tower_http::{
        compression::CompressionLayer, limit::RequestBodyLimitLayer, trace::TraceLayer,
    };

    let cors_layer = build_cors_layer(&state.config.server);
    let require_auth = from_fn_with_state(state.clone(), auth::require_auth);

    Router::new()
        .route("/health", axum::routing::get(health_check))
        .merge(auth::auth_router())
        .merge(api::pages_router())
        .nest("/api", api::public_router())
        .nest(
            "/api/admin",
            api::admin_router().route_layer(require_auth.clone()),
        )
        .merge(api::metrics_router().route_layer(require_auth))
        .layer(RequestBodyLimitLayer::new(MAX_REQUEST_BYTES))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer)
        .with_state(state)
}

fn build_cors_layer(server: &config::ServerConfig) -> tower_http::cors::CorsLayer {
    use axum::http::{HeaderValue, Method, header};
    use tower_http::cors::{Any, CorsLayer};

    if server.cors_origins.is_empty() && !server.protocol.eq_ignore_ascii_case("https") {
        return CorsLayer::permissive();
    }

    let configured = if server.cors_origins.is_empty() {
        vec![server.base_url()]
    } else {
        server.cors_origins.clone()
    };

    let origins: Vec<HeaderValue> = configured
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin.trim()) {
            Ok(value) => Some(value),
            Err(error) => {
                tracing::error!(%error, %origin, "Ignoring unparsable CORS origin");
                None
            }
        })
        .collect();

    if origins.is_empty() {
        return CorsLayer::new().allow_methods(Any).allow_headers(Any);
    }

    // Credentialed requests cannot use wildcard methods or headers
    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true)
}

async fn health_check() -> &'static str {
    "OK"
}
