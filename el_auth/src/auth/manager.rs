//! Authentication manager implementation.

use chrono::Duration;
use std::sync::Arc;

use super::{
    errors::{AuthError, AuthResult},
    gate::AuthGate,
    models::{IssuedSession, LoginRequest, RegisterRequest, Role, User, normalize_email},
    password::{HashParams, PasswordHasher},
    session::SessionIssuer,
};
use crate::db::{SessionRepository, UserRepository};

/// Minimum accepted password length, in characters
pub const MIN_PASSWORD_LEN: usize = 8;

/// Longest accepted email address
const MAX_EMAIL_LEN: usize = 254;

/// Authentication manager
#[derive(Clone)]
pub struct AuthManager {
    users: Arc<dyn UserRepository>,
    hasher: PasswordHasher,
    sessions: SessionIssuer,
    gate: AuthGate,
}

impl AuthManager {
    /// Create a new authentication manager
    ///
    /// # Arguments
    ///
    /// * `users` - Credential storage
    /// * `sessions` - Session storage
    /// * `params` - PBKDF2 work factor
    /// * `session_ttl` - Lifetime of issued sessions
    pub fn new(
        users: Arc<dyn UserRepository>,
        sessions: Arc<dyn SessionRepository>,
        params: HashParams,
        session_ttl: Duration,
    ) -> Self {
        let sessions = SessionIssuer::new(sessions, session_ttl);
        Self {
            users,
            hasher: PasswordHasher::new(params),
            gate: AuthGate::new(sessions.clone()),
            sessions,
        }
    }

    pub fn gate(&self) -> &AuthGate {
        &self.gate
    }

    pub fn sessions(&self) -> &SessionIssuer {
        &self.sessions
    }

    /// Register a new user and sign them in
    ///
    /// # Errors
    ///
    /// * `AuthError::InvalidEmail` - Email missing or malformed
    /// * `AuthError::WeakPassword` - Password too short
    /// * `AuthError::EmailTaken` - Email already registered
    pub async fn register(&self, request: RegisterRequest) -> AuthResult<(User, IssuedSession)> {
        let email = normalize_email(&request.email);
        validate_email(&email)?;
        validate_password(&request.password)?;

        let password_hash = self.hasher.hash_blocking(request.password).await?;

        let user = match self
            .users
            .create_user(&email, &password_hash, Role::User)
            .await
        {
            Ok(row) => row.into_user(),
            Err(AuthError::EmailTaken) => {
                log::info!("Registration rejected, email already registered");
                return Err(AuthError::EmailTaken);
            }
            Err(e) => return Err(e),
        };

        let session = self.sessions.issue(user.id).await?;
        log::info!("Registered user {}", user.id);

        Ok((user, session))
    }

    /// Check credentials and open a new session
    ///
    /// # Errors
    ///
    /// * `AuthError::InvalidCredentials` - Unknown email or wrong password
    pub async fn login(&self, request: LoginRequest) -> AuthResult<(User, IssuedSession)> {
        let email = normalize_email(&request.email);
        if email.is_empty() || request.password.is_empty() {
            return Err(AuthError::InvalidCredentials);
        }

        let Some(user) = self.users.find_by_email(&email).await? else {
            // Pay for one derivation so response time does not reveal the miss.
            self.hasher
                .verify_blocking(request.password, self.hasher.dummy_hash())
                .await;
            log::warn!("Failed login attempt");
            return Err(AuthError::InvalidCredentials);
        };
        let user = user.into_user();

        if !self
            .hasher
            .verify_blocking(request.password, user.password_hash.clone())
            .await
        {
            log::warn!("Failed login attempt for user {}", user.id);
            return Err(AuthError::InvalidCredentials);
        }

        let session = self.sessions.issue(user.id).await?;
        log::info!("User {} logged in", user.id);

        Ok((user, session))
    }

    /// Revoke a session token
    pub async fn logout(&self, token: &str) -> AuthResult<()> {
        self.sessions.revoke(token).await
    }

    /// Grant the admin role to an existing account
    ///
    /// # Errors
    ///
    /// * `AuthError::UserNotFound` - No account with that email
    pub async fn promote_to_admin(&self, email: &str) -> AuthResult<()> {
        let email = normalize_email(email);
        let user = self
            .users
            .find_by_email(&email)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        self.users.set_role(user.id, Role::Admin).await?;
        log::warn!("User {} promoted to admin", user.id);
        Ok(())
    }
}

fn validate_email(email: &str) -> AuthResult<()> {
    if email.is_empty() {
        return Err(AuthError::InvalidEmail("Email is required".to_string()));
    }
    if email.len() > MAX_EMAIL_LEN {
        return Err(AuthError::InvalidEmail("Email is too long".to_string()));
    }

    let valid = email
        .split_once('@')
        .is_some_and(|(local, domain)| !local.is_empty() && !domain.is_empty())
        && !email.chars().any(char::is_whitespace);
    if !valid {
        return Err(AuthError::InvalidEmail(
            "Email must look like name@domain".to_string(),
        ));
    }

    Ok(())
}

fn validate_password(password: &str) -> AuthResult<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AuthError::WeakPassword(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}
