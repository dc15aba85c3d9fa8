//! Authentication error types.

use thiserror::Error;

/// Authentication errors
#[derive(Debug, Error)]
pub enum AuthError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Password hashing failed
    #[error("Password hashing failed")]
    HashingFailed,

    /// Unknown email or wrong password. Deliberately a single variant.
    #[error("Invalid email or password")]
    InvalidCredentials,

    /// User not found
    #[error("User not found")]
    UserNotFound,

    /// Email already registered
    #[error("Email already registered")]
    EmailTaken,

    /// Invalid email format
    #[error("Invalid email: {0}")]
    InvalidEmail(String),

    /// Password too weak
    #[error("Password too weak: {0}")]
    WeakPassword(String),

    /// No valid session accompanies the request
    #[error("Authentication required")]
    Unauthorized,

    /// Valid session, insufficient role
    #[error("Insufficient permissions")]
    Forbidden,
}

impl AuthError {
    /// Get a client-safe error message that doesn't leak sensitive information
    ///
    /// Database and hashing errors are sanitized to prevent information disclosure
    /// about the internal system structure.
    pub fn client_message(&self) -> String {
        match self {
            AuthError::Database(_) | AuthError::HashingFailed => {
                "Internal server error".to_string()
            }
            _ => self.to_string(),
        }
    }

    /// Whether the error comes from the storage layer rather than the caller
    pub fn is_internal(&self) -> bool {
        matches!(self, AuthError::Database(_) | AuthError::HashingFailed)
    }
}

/// Result type for authentication operations
pub type AuthResult<T> = Result<T, AuthError>;
