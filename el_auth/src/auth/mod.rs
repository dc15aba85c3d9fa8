//! Authentication module providing password hashing, cookie sessions and
//! request authorization.
//!
//! This module implements:
//! - PBKDF2-HMAC-SHA256 password hashing in the `pbkdf2$<iter>$<salt>$<key>` format
//! - Opaque random session tokens with a fixed 14-day lifetime
//! - The `el_session` cookie codec
//! - User/admin gates over the request's `Cookie` header
//!
//! ## Example
//!
//! ```no_run
//! use el_auth::auth::{AuthManager, HashParams, RegisterRequest, DEFAULT_SESSION_TTL};
//! use el_auth::db::{Database, PgSessionRepository, PgUserRepository};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::new(&Default::default()).await?;
//!     let auth = AuthManager::new(
//!         Arc::new(PgUserRepository::new(db.pool().clone())),
//!         Arc::new(PgSessionRepository::new(db.pool().clone())),
//!         HashParams::default(),
//!         DEFAULT_SESSION_TTL,
//!     );
//!
//!     let request = RegisterRequest {
//!         email: "a@b.com".to_string(),
//!         password: "longenough1".to_string(),
//!     };
//!
//!     let (user, session) = auth.register(request).await?;
//!     println!("Registered {} until {}", user.email, session.expires_at);
//!     Ok(())
//! }
//! ```

pub mod cookie;
pub mod errors;
pub mod gate;
pub mod manager;
pub mod models;
pub mod password;
pub mod session;

pub use cookie::{
    CookieOptions, SESSION_COOKIE, SameSite, clear_cookie, decode_cookies, encode_cookie,
};
pub use errors::{AuthError, AuthResult};
pub use gate::AuthGate;
pub use manager::{AuthManager, MIN_PASSWORD_LEN};
pub use models::{
    Identity, IssuedSession, LoginRequest, RegisterRequest, Role, Session, User, UserId,
};
pub use password::{HashParams, PasswordHasher, Verification};
pub use session::{DEFAULT_SESSION_TTL, SessionIssuer};
