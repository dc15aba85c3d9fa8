//! Repository trait definitions for testability and dependency injection.
//!
//! The traits deal in raw rows shaped like the `users` and `sessions` tables.
//! Mapping from rows to domain types happens here, in one place, so the
//! authentication layer never sees a driver's row type.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row, postgres::PgRow};

use crate::auth::{
    AuthError, AuthResult, Identity, Role, Session, User, UserId,
    models::{format_timestamp, parse_timestamp},
};

/// Raw `users` row
#[derive(Debug, Clone)]
pub struct UserRow {
    pub id: UserId,
    pub email: String,
    pub password_hash: String,
    pub role: Option<String>,
    pub created_at: String,
}

impl UserRow {
    pub fn into_user(self) -> User {
        User {
            id: self.id,
            role: Role::from_column(self.role.as_deref()),
            created_at: parse_timestamp(&self.created_at),
            email: self.email,
            password_hash: self.password_hash,
        }
    }
}

/// Raw `sessions` row
#[derive(Debug, Clone)]
pub struct SessionRow {
    pub token: String,
    pub user_id: UserId,
    pub created_at: String,
    pub expires_at: String,
}

impl From<&Session> for SessionRow {
    fn from(session: &Session) -> Self {
        Self {
            token: session.token.clone(),
            user_id: session.user_id,
            created_at: format_timestamp(session.created_at),
            expires_at: format_timestamp(session.expires_at),
        }
    }
}

/// A `sessions` row joined with its owning `users` row
#[derive(Debug, Clone)]
pub struct SessionIdentityRow {
    pub token: String,
    pub user_id: UserId,
    pub expires_at: String,
    pub email: String,
    pub role: Option<String>,
}

impl SessionIdentityRow {
    /// Parsed expiry, `None` when the stored value is unreadable
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        parse_timestamp(&self.expires_at)
    }

    pub fn into_identity(self) -> Identity {
        Identity {
            id: self.user_id,
            role: Role::from_column(self.role.as_deref()),
            email: self.email,
        }
    }
}

/// Trait for credential repository operations
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Create a new user. A duplicate email yields `AuthError::EmailTaken`.
    async fn create_user(&self, email: &str, password_hash: &str, role: Role)
    -> AuthResult<UserRow>;

    /// Find user by normalized email
    async fn find_by_email(&self, email: &str) -> AuthResult<Option<UserRow>>;

    /// Change a user's role
    async fn set_role(&self, user_id: UserId, role: Role) -> AuthResult<()>;
}

/// Trait for session repository operations
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Persist a new session
    async fn insert_session(&self, session: &Session) -> AuthResult<()>;

    /// Look up a session joined with its owner
    async fn find_session_identity(&self, token: &str) -> AuthResult<Option<SessionIdentityRow>>;

    /// Delete a session; deleting an absent token succeeds
    async fn delete_session(&self, token: &str) -> AuthResult<()>;
}

/// PostgreSQL implementation of `UserRepository`
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn user_row(row: &PgRow) -> Result<UserRow, sqlx::Error> {
    Ok(UserRow {
        id: row.try_get("id")?,
        email: row.try_get("email")?,
        password_hash: row.try_get("password_hash")?,
        role: row.try_get("role")?,
        created_at: row.try_get("created_at")?,
    })
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn create_user(
        &self,
        email: &str,
        password_hash: &str,
        role: Role,
    ) -> AuthResult<UserRow> {
        let row = sqlx::query(
            r#"
            INSERT INTO users (id, email, password_hash, role, created_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, email, password_hash, role, created_at
            "#,
        )
        .bind(uuid::Uuid::new_v4())
        .bind(email)
        .bind(password_hash)
        .bind(role.as_str())
        .bind(format_timestamp(Utc::now()))
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_unique_violation() => AuthError::EmailTaken,
            e => AuthError::Database(e),
        })?;

        Ok(user_row(&row)?)
    }

    async fn find_by_email(&self, email: &str) -> AuthResult<Option<UserRow>> {
        let row = sqlx::query(
            "SELECT id, email, password_hash, role, created_at FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(user_row).transpose()?)
    }

    async fn set_role(&self, user_id: UserId, role: Role) -> AuthResult<()> {
        let result = sqlx::query("UPDATE users SET role = $1 WHERE id = $2")
            .bind(role.as_str())
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AuthError::UserNotFound);
        }
        Ok(())
    }
}

/// PostgreSQL implementation of `SessionRepository`
pub struct PgSessionRepository {
    pool: PgPool,
}

impl PgSessionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionRepository for PgSessionRepository {
    async fn insert_session(&self, session: &Session) -> AuthResult<()> {
        let row = SessionRow::from(session);
        sqlx::query(
            r#"
            INSERT INTO sessions (token, user_id, created_at, expires_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(&row.token)
        .bind(row.user_id)
        .bind(&row.created_at)
        .bind(&row.expires_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_session_identity(&self, token: &str) -> AuthResult<Option<SessionIdentityRow>> {
        let row = sqlx::query(
            r#"
            SELECT s.token, s.user_id, s.expires_at, u.email, u.role
            FROM sessions s
            JOIN users u ON u.id = s.user_id
            WHERE s.token = $1
            "#,
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        Ok(Some(SessionIdentityRow {
            token: row.try_get("token")?,
            user_id: row.try_get("user_id")?,
            expires_at: row.try_get("expires_at")?,
            email: row.try_get("email")?,
            role: row.try_get("role")?,
        }))
    }

    async fn delete_session(&self, token: &str) -> AuthResult<()> {
        sqlx::query("DELETE FROM sessions WHERE token = $1")
            .bind(token)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use uuid::Uuid;

    #[test]
    fn test_user_row_mapping() {
        let id = Uuid::new_v4();
        let user = UserRow {
            id,
            email: "a@b.com".to_string(),
            password_hash: "pbkdf2$1$00$00".to_string(),
            role: None,
            created_at: "2024-02-03 04:05:06".to_string(),
        }
        .into_user();

        assert_eq!(user.id, id);
        assert_eq!(user.role, Role::User);
        assert!(user.created_at.is_some());
    }

    #[test]
    fn test_session_row_round_trips_timestamps() {
        let now = Utc::now();
        let session = Session {
            token: "t".to_string(),
            user_id: Uuid::new_v4(),
            created_at: now,
            expires_at: now + Duration::days(14),
        };
        let row = SessionRow::from(&session);
        let parsed = parse_timestamp(&row.expires_at).unwrap();

        assert!((parsed - session.expires_at).num_milliseconds().abs() < 1);
    }

    #[test]
    fn test_session_identity_mapping() {
        let row = SessionIdentityRow {
            token: "t".to_string(),
            user_id: Uuid::new_v4(),
            expires_at: "garbage".to_string(),
            email: "boss@b.com".to_string(),
            role: Some("admin".to_string()),
        };
        assert!(row.expires_at().is_none());

        let identity = row.into_identity();
        assert!(identity.is_admin());
        assert_eq!(identity.email, "boss@b.com");
    }
}
