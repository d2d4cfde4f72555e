//! Common test utilities for E2E tests

#![allow(dead_code)]

use serde_json::{Value, json};
use tempfile::TempDir;
use tokio::net::TcpListener;
use toolhub::{AppState, config};

pub const ADMIN_EMAIL: &str = "admin@toolhub.test";
pub const ADMIN_PASSWORD: &str = "correct horse battery staple";

/// Test server instance
pub struct TestServer {
    pub addr: String,
    pub state: AppState,
    pub _temp_dir: TempDir,
    pub client: reqwest::Client,
}

impl TestServer {
    /// Create a new test server instance
    pub async fn new() -> Self {
        toolhub::metrics::init_metrics();

        // Create temporary directory for test database and media
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test.db");
        let media_dir = temp_dir.path().join("media");

        // Create test configuration
        let config = config::AppConfig {
            server: config::ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0, // Let OS assign port
                domain: "localhost".to_string(),
                protocol: "http".to_string(),
                cors_origins: Vec::new(),
            },
            database: config::DatabaseConfig { path: db_path },
            storage: config::StorageConfig {
                media: config::MediaStorageConfig {
                    backend: config::MediaBackend::Local,
                    bucket: String::new(),
                    public_url: "http://localhost/media".to_string(),
                    local_dir: Some(media_dir),
                },
            },
            cloudflare: None,
            auth: config::AuthConfig {
                session_secret: "test-secret-key-32-bytes-long!!!".to_string(),
                session_max_age: 604800,
            },
            admin: config::AdminConfig {
                email: ADMIN_EMAIL.to_string(),
                display_name: "Test Admin".to_string(),
                password: Some(ADMIN_PASSWORD.to_string()),
            },
            cache: config::CacheConfig { settings_ttl: 60 },
            notifications: config::NotificationsConfig {
                dropdown_limit: 5,
                max_unread: 500,
            },
            logging: config::LoggingConfig {
                level: "info".to_string(),
                format: "pretty".to_string(),
            },
        };

        // Initialize app state
        let state = AppState::new(config).await.unwrap();

        // Create HTTP client
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .unwrap();

        // Bind to random port
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let addr_str = format!("http://{}", addr);

        let app = toolhub::build_router(state.clone());

        // Spawn server in background
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        // Wait a bit for server to start
        tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;

        Self {
            addr: addr_str,
            state,
            _temp_dir: temp_dir,
            client,
        }
    }

    /// Get base URL for API requests
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.addr, path)
    }

    /// POST /auth/login with the given credentials
    pub async fn login(&self, email: &str, password: &str) -> reqwest::Response {
        self.client
            .post(self.url("/auth/login"))
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .unwrap()
    }

    /// Log in as the bootstrap super admin and return the bearer token
    pub async fn admin_token(&self) -> String {
        self.token_for(ADMIN_EMAIL, ADMIN_PASSWORD).await
    }

    pub async fn token_for(&self, email: &str, password: &str) -> String {
        let response = self.login(email, password).await;
        assert_eq!(response.status(), 200, "login as {email} failed");
        let body: Value = response.json().await.unwrap();
        body["token"].as_str().unwrap().to_string()
    }

    /// Create an extra back-office account directly in the database
    pub async fn create_admin(&self, email: &str, password: &str, role: toolhub::data::AdminRole) {
        use toolhub::data::{Admin, EntityId};

        let admin = Admin {
            id: EntityId::new().0,
            email: email.to_string(),
            display_name: email.to_string(),
            password_hash: toolhub::auth::hash_password(password).unwrap(),
            role: role.as_str().to_string(),
            is_active: true,
            created_at: chrono::Utc::now(),
            last_login_at: None,
        };
        self.state.db.insert_admin(&admin).await.unwrap();
    }

    /// GET an admin endpoint with a bearer token and decode the JSON body
    pub async fn admin_get(&self, token: &str, path: &str) -> (u16, Value) {
        let response = self
            .client
            .get(self.url(path))
            .bearer_auth(token)
            .send()
            .await
            .unwrap();
        let status = response.status().as_u16();
        let body = response.json().await.unwrap_or(Value::Null);
        (status, body)
    }

    /// Send a JSON body to an admin endpoint with a bearer token
    pub async fn admin_send(
        &self,
        token: &str,
        method: reqwest::Method,
        path: &str,
        body: Value,
    ) -> (u16, Value) {
        let response = self
            .client
            .request(method, self.url(path))
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .unwrap();
        let status = response.status().as_u16();
        let body = response.json().await.unwrap_or(Value::Null);
        (status, body)
    }

    /// Submit the public contact form
    pub async fn submit_contact(&self, name: &str, subject: &str, message: &str) -> Value {
        let response = self
            .client
            .post(self.url("/api/contact"))
            .json(&json!({
                "name": name,
                "email": "jo@x.com",
                "subject": subject,
                "message": message,
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 201);
        response.json().await.unwrap()
    }
}
