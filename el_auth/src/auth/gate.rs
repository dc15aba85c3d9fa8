//! Request authorization gate.
//!
//! Turns a request's `Cookie` header into an authorization verdict. Holds no
//! per-request state; every call resolves the session again.

use super::{
    cookie,
    errors::{AuthError, AuthResult},
    models::Identity,
    session::SessionIssuer,
};

/// Authorization gate for cookie-authenticated requests
#[derive(Clone)]
pub struct AuthGate {
    sessions: SessionIssuer,
}

impl AuthGate {
    pub fn new(sessions: SessionIssuer) -> Self {
        Self { sessions }
    }

    /// Resolve the identity behind a request, if any
    pub async fn authenticate(&self, cookie_header: Option<&str>) -> AuthResult<Option<Identity>> {
        match cookie::session_token(cookie_header) {
            Some(token) => self.sessions.resolve(&token).await,
            None => Ok(None),
        }
    }

    /// Require a signed-in user
    ///
    /// # Errors
    ///
    /// * `AuthError::Unauthorized` - No live session
    /// * `AuthError::Database` - Session lookup failed
    pub async fn require_user(&self, cookie_header: Option<&str>) -> AuthResult<Identity> {
        self.authenticate(cookie_header)
            .await?
            .ok_or(AuthError::Unauthorized)
    }

    /// Require a signed-in admin
    ///
    /// # Errors
    ///
    /// * `AuthError::Unauthorized` - No live session
    /// * `AuthError::Forbidden` - Signed in without the admin role
    /// * `AuthError::Database` - Session lookup failed
    pub async fn require_admin(&self, cookie_header: Option<&str>) -> AuthResult<Identity> {
        let identity = self.require_user(cookie_header).await?;
        if identity.is_admin() {
            Ok(identity)
        } else {
            log::warn!("User {} denied admin access", identity.id);
            Err(AuthError::Forbidden)
        }
    }
}
