//! Session token issuance, resolution and revocation.
//!
//! A session is live while its `expires_at` is strictly in the future. There is no
//! sliding renewal; expired rows are ignored on read and left for cleanup.

use chrono::{Duration, Utc};
use rand::RngCore;
use std::sync::Arc;

use super::{
    errors::AuthResult,
    models::{Identity, IssuedSession, Session, UserId},
};
use crate::db::SessionRepository;

/// Session lifetime
pub const DEFAULT_SESSION_TTL: Duration = Duration::days(14);

/// Random bytes per session token (hex doubles the length)
pub const TOKEN_BYTES: usize = 32;

/// Generate an unguessable session token
pub fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Session token issuer and validator
#[derive(Clone)]
pub struct SessionIssuer {
    sessions: Arc<dyn SessionRepository>,
    ttl: Duration,
}

impl SessionIssuer {
    pub fn new(sessions: Arc<dyn SessionRepository>, ttl: Duration) -> Self {
        Self { sessions, ttl }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Mint and persist a new session for a user
    pub async fn issue(&self, user_id: UserId) -> AuthResult<IssuedSession> {
        let now = Utc::now();
        let session = Session {
            token: generate_token(),
            user_id,
            created_at: now,
            expires_at: now + self.ttl,
        };

        self.sessions.insert_session(&session).await?;
        log::debug!("Issued session for user {user_id}");

        Ok(IssuedSession {
            token: session.token,
            expires_at: session.expires_at,
        })
    }

    /// Resolve a token to the identity that owns it.
    ///
    /// Unknown, expired and unreadable sessions all come back as `None`.
    ///
    /// # Errors
    ///
    /// * `AuthError::Database` - Storage lookup failed
    pub async fn resolve(&self, token: &str) -> AuthResult<Option<Identity>> {
        if token.is_empty() {
            return Ok(None);
        }

        let Some(row) = self.sessions.find_session_identity(token).await? else {
            return Ok(None);
        };

        match row.expires_at() {
            Some(expires_at) if expires_at > Utc::now() => Ok(Some(row.into_identity())),
            Some(_) => {
                log::debug!("Rejected expired session for user {}", row.user_id);
                Ok(None)
            }
            None => {
                log::warn!("Session for user {} has unreadable expiry", row.user_id);
                Ok(None)
            }
        }
    }

    /// Delete a session. Revoking an unknown token is not an error.
    pub async fn revoke(&self, token: &str) -> AuthResult<()> {
        if token.is_empty() {
            return Ok(());
        }
        self.sessions.delete_session(token).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::models::Role;
    use crate::db::{MemoryStore, SessionRow, UserRepository};

    async fn setup() -> (Arc<MemoryStore>, SessionIssuer, UserId) {
        let store = Arc::new(MemoryStore::new());
        let user = store
            .create_user("a@b.com", "pbkdf2$1$00$00", Role::User)
            .await
            .unwrap();
        let issuer = SessionIssuer::new(store.clone(), DEFAULT_SESSION_TTL);
        (store, issuer, user.id)
    }

    #[test]
    fn test_generate_token_shape() {
        let token = generate_token();
        assert_eq!(token.len(), TOKEN_BYTES * 2);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(token, generate_token());
    }

    #[tokio::test]
    async fn test_issue_and_resolve() {
        let (_store, issuer, user_id) = setup().await;

        let issued = issuer.issue(user_id).await.unwrap();
        let expected = Utc::now() + DEFAULT_SESSION_TTL;
        assert!((expected - issued.expires_at).num_seconds().abs() < 5);

        let identity = issuer.resolve(&issued.token).await.unwrap().unwrap();
        assert_eq!(identity.id, user_id);
        assert_eq!(identity.email, "a@b.com");
        assert_eq!(identity.role, Role::User);
    }

    #[tokio::test]
    async fn test_resolve_empty_and_unknown() {
        let (store, issuer, _) = setup().await;

        assert!(issuer.resolve("").await.unwrap().is_none());
        assert_eq!(store.session_lookups(), 0, "empty token must not hit storage");

        assert!(issuer.resolve("deadbeef").await.unwrap().is_none());
        assert_eq!(store.session_lookups(), 1);
    }

    #[tokio::test]
    async fn test_expired_session_resolves_to_none() {
        let (store, issuer, user_id) = setup().await;
        let past = Utc::now() - Duration::seconds(1);
        let session = Session {
            token: "expired-token".to_string(),
            user_id,
            created_at: past - DEFAULT_SESSION_TTL,
            expires_at: past,
        };
        store.insert_session(&session).await.unwrap();

        assert!(issuer.resolve("expired-token").await.unwrap().is_none());
        assert!(store.has_session("expired-token").await, "row stays in storage");
    }

    #[tokio::test]
    async fn test_session_expiring_now_is_rejected() {
        let (store, issuer, user_id) = setup().await;
        let now = Utc::now();
        let session = Session {
            token: "boundary-token".to_string(),
            user_id,
            created_at: now - DEFAULT_SESSION_TTL,
            expires_at: now,
        };
        store.insert_session(&session).await.unwrap();

        assert!(issuer.resolve("boundary-token").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_unparsable_expiry_resolves_to_none() {
        let (store, issuer, user_id) = setup().await;
        store
            .insert_session_row(SessionRow {
                token: "garbled".to_string(),
                user_id,
                created_at: "2024-01-01T00:00:00.000Z".to_string(),
                expires_at: "not a date".to_string(),
            })
            .await;

        assert!(issuer.resolve("garbled").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_revoke_is_idempotent() {
        let (store, issuer, user_id) = setup().await;
        let issued = issuer.issue(user_id).await.unwrap();

        issuer.revoke(&issued.token).await.unwrap();
        issuer.revoke(&issued.token).await.unwrap();
        issuer.revoke("").await.unwrap();

        assert!(!store.has_session(&issued.token).await);
        assert!(issuer.resolve(&issued.token).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_multiple_sessions_per_user() {
        let (_store, issuer, user_id) = setup().await;
        let first = issuer.issue(user_id).await.unwrap();
        let second = issuer.issue(user_id).await.unwrap();

        assert_ne!(first.token, second.token);
        assert!(issuer.resolve(&first.token).await.unwrap().is_some());
        assert!(issuer.resolve(&second.token).await.unwrap().is_some());
    }
}
