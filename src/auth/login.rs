//! Admin login flow
//!
//! Email and password sign-in against the `admins` table. A successful
//! login returns a signed session token and sets it as an HttpOnly cookie.

use axum::{
    Json, Router,
    extract::State,
    http::HeaderMap,
    response::IntoResponse,
    routing::{get, post},
};
use axum_extra::extract::CookieJar;
use axum_extra::extract::cookie::{Cookie, SameSite};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::middleware::{CurrentUser, SESSION_COOKIE};
use super::password::verify_password;
use super::session::{Session, create_session_token};
use crate::AppState;
use crate::data::{Admin, AdminRole, SecurityEventType, SecuritySettings};
use crate::error::AppError;
use crate::metrics::ADMIN_LOGINS_TOTAL;
use crate::service::SecurityService;

/// Create authentication router
///
/// Routes:
/// - POST /auth/login - Exchange credentials for a session
/// - POST /auth/logout - Clear the session cookie
/// - GET /auth/session - Current session
pub fn auth_router() -> Router<AppState> {
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
        .route("/auth/session", get(current_session))
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Admin fields safe to return to the client
#[derive(Debug, Clone, Serialize)]
pub struct AdminProfile {
    pub id: String,
    pub email: String,
    pub display_name: String,
    pub role: String,
    pub last_login_at: Option<DateTime<Utc>>,
}

impl From<&Admin> for AdminProfile {
    fn from(admin: &Admin) -> Self {
        Self {
            id: admin.id.clone(),
            email: admin.email.clone(),
            display_name: admin.display_name.clone(),
            role: admin.role.clone(),
            last_login_at: admin.last_login_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub admin: AdminProfile,
}

/// Session lifetime: the site's timeout policy capped by the configured maximum
pub(crate) fn session_lifetime(policy: &SecuritySettings, max_age_seconds: i64) -> Duration {
    let policy_seconds = policy.session_timeout_minutes.saturating_mul(60);
    Duration::seconds(policy_seconds.min(max_age_seconds).max(1))
}

/// Best-effort client address from proxy headers
pub(crate) fn client_ip(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-forwarded-for")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.split(',').next())
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
        .map(str::to_string)
        .or_else(|| {
            headers
                .get("x-real-ip")
                .and_then(|h| h.to_str().ok())
                .map(|ip| ip.trim().to_string())
        })
}

fn session_cookie(token: String, secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .build()
}

fn clear_session_cookie() -> Cookie<'static> {
    let mut cookie = Cookie::build((SESSION_COOKIE, String::new()))
        .path("/")
        .http_only(true)
        .build();
    cookie.make_removal();
    cookie
}

/// POST /auth/login
///
/// # Steps
/// 1. Refuse if the account is locked out by recent failures
/// 2. Verify the password of an active admin
/// 3. Record the outcome in the audit trail
/// 4. Issue a session token and cookie
async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    headers: HeaderMap,
    Json(request): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let email = request.email.trim().to_ascii_lowercase();
    if email.is_empty() || request.password.is_empty() {
        return Err(AppError::Validation(
            "email and password are required".to_string(),
        ));
    }

    let ip = client_ip(&headers);
    let settings = state.settings.get(&state.db).await?;
    let security = SecurityService::new(state.db.clone());
    let now = Utc::now();

    if security.is_locked_out(&email, &settings.security, now).await? {
        ADMIN_LOGINS_TOTAL.with_label_values(&["locked"]).inc();
        security
            .record_quietly(
                SecurityEventType::LoginLocked,
                Some(&email),
                ip.as_deref(),
                format!(
                    "Login refused after {} failed attempts",
                    settings.security.max_login_attempts
                ),
            )
            .await;
        return Err(AppError::RateLimited);
    }

    let admin = state.db.get_admin_by_email(&email).await?;
    let admin = match admin {
        Some(admin)
            if admin.is_active && verify_password(&request.password, &admin.password_hash) =>
        {
            admin
        }
        _ => {
            ADMIN_LOGINS_TOTAL.with_label_values(&["failure"]).inc();
            security
                .record(
                    SecurityEventType::LoginFailure,
                    Some(&email),
                    ip.as_deref(),
                    "Invalid credentials",
                )
                .await?;
            return Err(AppError::Unauthorized);
        }
    };

    let role = admin.role.parse::<AdminRole>().unwrap_or(AdminRole::Admin);
    let lifetime = session_lifetime(&settings.security, state.config.auth.session_max_age);
    let session = Session::start(&admin, role, lifetime);
    let token = create_session_token(&session, &state.config.auth.session_secret)?;

    state.db.touch_admin_login(&admin.id, now).await?;
    security
        .record(
            SecurityEventType::LoginSuccess,
            Some(&email),
            ip.as_deref(),
            "Admin signed in",
        )
        .await?;
    ADMIN_LOGINS_TOTAL.with_label_values(&["success"]).inc();

    tracing::info!(admin_id = %admin.id, email = %email, "Admin logged in");

    let mut profile = AdminProfile::from(&admin);
    profile.last_login_at = Some(now);

    let jar = jar.add(session_cookie(
        token.clone(),
        state.config.should_use_secure_cookies(),
    ));
    Ok((
        jar,
        Json(LoginResponse {
            token,
            expires_at: session.expires_at,
            admin: profile,
        }),
    ))
}

/// POST /auth/logout
///
/// Tokens are stateless; logging out drops the cookie.
async fn logout(jar: CookieJar) -> impl IntoResponse {
    (
        jar.add(clear_session_cookie()),
        Json(serde_json::json!({ "logged_out": true })),
    )
}

/// GET /auth/session
async fn current_session(CurrentUser(session): CurrentUser) -> Json<Session> {
    Json(session)
}
