//! In-process storage implementing both repositories.
//!
//! Enforces the same uniqueness rules as the SQL schema (email, token) and
//! joins sessions to users on lookup. Used by tests and the server's
//! `--memory` development mode.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
#[cfg(test)]
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::repository::{SessionIdentityRow, SessionRepository, SessionRow, UserRepository, UserRow};
use crate::auth::{AuthError, AuthResult, Role, Session, UserId, models::format_timestamp};

/// In-memory user and session store
#[derive(Default)]
pub struct MemoryStore {
    users: RwLock<HashMap<UserId, UserRow>>,
    sessions: RwLock<HashMap<String, SessionRow>>,
    #[cfg(test)]
    session_lookups: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a raw session row as-is, bypassing timestamp formatting
    #[cfg(test)]
    pub(crate) async fn insert_session_row(&self, row: SessionRow) {
        self.sessions.write().await.insert(row.token.clone(), row);
    }

    /// Whether a session row exists, live or expired. Introspection for
    /// tests and diagnostics; not part of the repository contract.
    pub async fn has_session(&self, token: &str) -> bool {
        self.sessions.read().await.contains_key(token)
    }

    /// Number of session rows currently stored, live or expired.
    /// Introspection for tests and diagnostics.
    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Number of session lookups served so far
    #[cfg(test)]
    pub(crate) fn session_lookups(&self) -> usize {
        self.session_lookups.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn create_user(
        &self,
        email: &str,
        password_hash: &str,
        role: Role,
    ) -> AuthResult<UserRow> {
        let mut users = self.users.write().await;
        if users.values().any(|user| user.email == email) {
            return Err(AuthError::EmailTaken);
        }

        let row = UserRow {
            id: Uuid::new_v4(),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            role: Some(role.as_str().to_string()),
            created_at: format_timestamp(Utc::now()),
        };
        users.insert(row.id, row.clone());
        Ok(row)
    }

    async fn find_by_email(&self, email: &str) -> AuthResult<Option<UserRow>> {
        let users = self.users.read().await;
        Ok(users.values().find(|user| user.email == email).cloned())
    }

    async fn set_role(&self, user_id: UserId, role: Role) -> AuthResult<()> {
        let mut users = self.users.write().await;
        let user = users.get_mut(&user_id).ok_or(AuthError::UserNotFound)?;
        user.role = Some(role.as_str().to_string());
        Ok(())
    }
}

#[async_trait]
impl SessionRepository for MemoryStore {
    async fn insert_session(&self, session: &Session) -> AuthResult<()> {
        let mut sessions = self.sessions.write().await;
        if sessions.contains_key(&session.token) {
            return Err(AuthError::Database(sqlx::Error::Protocol(
                "duplicate session token".to_string(),
            )));
        }
        sessions.insert(session.token.clone(), SessionRow::from(session));
        Ok(())
    }

    async fn find_session_identity(&self, token: &str) -> AuthResult<Option<SessionIdentityRow>> {
        #[cfg(test)]
        self.session_lookups.fetch_add(1, Ordering::Relaxed);

        let sessions = self.sessions.read().await;
        let Some(session) = sessions.get(token) else {
            return Ok(None);
        };

        let users = self.users.read().await;
        Ok(users.get(&session.user_id).map(|user| SessionIdentityRow {
            token: session.token.clone(),
            user_id: session.user_id,
            expires_at: session.expires_at.clone(),
            email: user.email.clone(),
            role: user.role.clone(),
        }))
    }

    async fn delete_session(&self, token: &str) -> AuthResult<()> {
        self.sessions.write().await.remove(token);
        Ok(())
    }
}
