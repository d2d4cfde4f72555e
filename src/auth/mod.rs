//! Admin authentication
//!
//! Handles:
//! - Email/password login for back-office admins
//! - Session management
//! - Authentication middleware

mod login;
mod middleware;
mod password;
pub mod session;

pub use login::{AdminProfile, LoginRequest, LoginResponse, auth_router};
pub use middleware::{CurrentUser, SESSION_COOKIE, require_auth};
pub use password::{hash_password, verify_password};
pub use session::{Session, create_session_token, verify_session_token};
