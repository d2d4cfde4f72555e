//! Session management
//!
//! Uses HMAC-signed tokens stored in cookies or sent as bearer tokens.
//! No server-side session storage needed.

use base64::{Engine as _, engine::general_purpose};
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::data::{Admin, AdminRole};
use crate::error::AppError;

type HmacSha256 = Hmac<Sha256>;

/// Admin session data
///
/// Carried inside the signed token. Contains the minimal admin info the
/// handlers need.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub admin_id: String,
    pub email: String,
    pub role: AdminRole,
    /// When session was created
    pub created_at: DateTime<Utc>,
    /// When session expires
    pub expires_at: DateTime<Utc>,
}

impl Session {
    /// Start a session for `admin` lasting `lifetime`
    pub fn start(admin: &Admin, role: AdminRole, lifetime: Duration) -> Self {
        let now = Utc::now();
        Self {
            admin_id: admin.id.clone(),
            email: admin.email.clone(),
            role,
            created_at: now,
            expires_at: now + lifetime,
        }
    }

    /// Check if session is expired
    pub fn is_expired(&self) -> bool {
        self.expires_at < Utc::now()
    }

    pub fn is_super_admin(&self) -> bool {
        self.role == AdminRole::SuperAdmin
    }

    /// Fail with 403 unless the session belongs to a super admin
    pub fn require_super_admin(&self) -> Result<(), AppError> {
        if self.is_super_admin() {
            Ok(())
        } else {
            Err(AppError::Forbidden)
        }
    }
}

fn sign(payload_b64: &str, secret: &str) -> Result<HmacSha256, AppError> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| AppError::Encryption(e.to_string()))?;
    mac.update(payload_b64.as_bytes());
    Ok(mac)
}

/// Create a signed session token
///
/// Token format: base64(payload).base64(hmac_sha256(payload))
pub fn create_session_token(session: &Session, secret: &str) -> Result<String, AppError> {
    let payload = serde_json::to_string(session).map_err(|e| AppError::Internal(e.into()))?;
    let payload_b64 = general_purpose::URL_SAFE_NO_PAD.encode(payload.as_bytes());

    let signature = sign(&payload_b64, secret)?.finalize().into_bytes();
    let signature_b64 = general_purpose::URL_SAFE_NO_PAD.encode(signature);

    Ok(format!("{}.{}", payload_b64, signature_b64))
}

/// Verify and decode a session token
///
/// # Errors
/// `InvalidSignature` if the signature does not match, `Unauthorized` if the
/// token is malformed or expired
pub fn verify_session_token(token: &str, secret: &str) -> Result<Session, AppError> {
    let (payload_b64, signature_b64) = token.split_once('.').ok_or(AppError::Unauthorized)?;
    if signature_b64.contains('.') {
        return Err(AppError::Unauthorized);
    }

    let signature = general_purpose::URL_SAFE_NO_PAD
        .decode(signature_b64)
        .map_err(|_| AppError::Unauthorized)?;
    sign(payload_b64, secret)?
        .verify_slice(&signature)
        .map_err(|_| AppError::InvalidSignature)?;

    let payload = general_purpose::URL_SAFE_NO_PAD
        .decode(payload_b64)
        .map_err(|_| AppError::Unauthorized)?;
    let session: Session = serde_json::from_slice(&payload).map_err(|_| AppError::Unauthorized)?;

    if session.is_expired() {
        return Err(AppError::Unauthorized);
    }

    Ok(session)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "0123456789abcdef0123456789abcdef";

    fn session(lifetime: Duration) -> Session {
        let now = Utc::now();
        Session {
            admin_id: "01HADMIN".to_string(),
            email: "admin@example.com".to_string(),
            role: AdminRole::SuperAdmin,
            created_at: now,
            expires_at: now + lifetime,
        }
    }

    #[test]
    fn token_roundtrip() {
        let original = session(Duration::minutes(30));
        let token = create_session_token(&original, SECRET).unwrap();

        let decoded = verify_session_token(&token, SECRET).unwrap();
        assert_eq!(decoded, original);
    }

    #[test]
    fn tampered_payload_is_rejected() {
        let token = create_session_token(&session(Duration::minutes(30)), SECRET).unwrap();
        let (_, signature) = token.split_once('.').unwrap();

        let mut forged = session(Duration::minutes(30));
        forged.role = AdminRole::Admin;
        forged.email = "mallory@example.com".to_string();
        let forged_payload = general_purpose::URL_SAFE_NO_PAD
            .encode(serde_json::to_string(&forged).unwrap().as_bytes());

        let result = verify_session_token(&format!("{forged_payload}.{signature}"), SECRET);
        assert!(matches!(result, Err(AppError::InvalidSignature)));
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = create_session_token(&session(Duration::minutes(30)), SECRET).unwrap();
        let result = verify_session_token(&token, "another-secret-another-secret-xx");
        assert!(matches!(result, Err(AppError::InvalidSignature)));
    }

    #[test]
    fn expired_session_is_rejected() {
        let token = create_session_token(&session(Duration::seconds(-1)), SECRET).unwrap();
        let result = verify_session_token(&token, SECRET);
        assert!(matches!(result, Err(AppError::Unauthorized)));
    }

    #[test]
    fn malformed_tokens_are_rejected() {
        for token in ["", "no-dot", "a.b.c", "!!!.???"] {
            assert!(verify_session_token(token, SECRET).is_err(), "{token}");
        }
    }

    #[test]
    fn only_super_admin_passes_role_check() {
        let mut s = session(Duration::minutes(5));
        assert!(s.require_super_admin().is_ok());
        s.role = AdminRole::Admin;
        assert!(matches!(s.require_super_admin(), Err(AppError::Forbidden)));
    }
}
