//! Server configuration management.
//!
//! Consolidates all environment variable reads and provides validated configuration.

use chrono::Duration;
use el_auth::{
    auth::{CookieOptions, HashParams},
    db::DatabaseConfig,
};
use std::net::SocketAddr;

/// Lowest accepted PBKDF2 work factor
pub const MIN_PBKDF2_ITERATIONS: u32 = 10_000;

/// Highest accepted PBKDF2 work factor
pub const MAX_PBKDF2_ITERATIONS: u32 = 1_000_000;

/// Complete server configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Server bind address
    pub bind: SocketAddr,
    /// Database configuration
    pub database: DatabaseConfig,
    /// Security configuration
    pub security: SecurityConfig,
    /// Origin allowed to make credentialed cross-origin requests
    pub cors_allowed_origin: Option<String>,
}

/// Security-related configuration
#[derive(Debug, Clone)]
pub struct SecurityConfig {
    /// Mark the session cookie `Secure` (disable only for plain-HTTP development)
    pub cookie_secure: bool,
    /// Session lifetime in days
    pub session_ttl_days: i64,
    /// PBKDF2 iterations for new password hashes
    pub pbkdf2_iterations: u32,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            cookie_secure: true,
            session_ttl_days: 14,
            pbkdf2_iterations: el_auth::auth::password::DEFAULT_ITERATIONS,
        }
    }
}

impl SecurityConfig {
    pub fn hash_params(&self) -> HashParams {
        HashParams::new(self.pbkdf2_iterations)
    }

    pub fn session_ttl(&self) -> Duration {
        Duration::days(self.session_ttl_days)
    }

    pub fn cookie_options(&self) -> CookieOptions {
        CookieOptions::default()
            .with_secure(self.cookie_secure)
            .with_max_age(self.session_ttl().num_seconds())
    }
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// # Arguments
    ///
    /// * `bind_override` - Optional bind address override (from CLI args)
    /// * `database_url_override` - Optional database URL override (from CLI args)
    ///
    /// # Errors
    ///
    /// Returns error if a security setting is present but unparsable
    pub fn from_env(
        bind_override: Option<SocketAddr>,
        database_url_override: Option<String>,
    ) -> Result<Self, ConfigError> {
        let bind = bind_override
            .or_else(|| {
                std::env::var("SERVER_BIND")
                    .ok()
                    .and_then(|s| s.parse().ok())
            })
            .unwrap_or_else(|| SocketAddr::from(([127, 0, 0, 1], 8080)));

        let defaults = DatabaseConfig::development();
        let database_url = database_url_override
            .or_else(|| std::env::var("DATABASE_URL").ok())
            .unwrap_or(defaults.database_url);

        let database = DatabaseConfig {
            database_url,
            max_connections: parse_env_or("DB_MAX_CONNECTIONS", defaults.max_connections),
            min_connections: parse_env_or("DB_MIN_CONNECTIONS", defaults.min_connections),
            connection_timeout_secs: parse_env_or(
                "DB_CONNECTION_TIMEOUT_SECS",
                defaults.connection_timeout_secs,
            ),
            idle_timeout_secs: parse_env_or("DB_IDLE_TIMEOUT_SECS", defaults.idle_timeout_secs),
            max_lifetime_secs: parse_env_or("DB_MAX_LIFETIME_SECS", defaults.max_lifetime_secs),
        };

        let fallback = SecurityConfig::default();
        let security = SecurityConfig {
            cookie_secure: parse_env_strict("COOKIE_SECURE", fallback.cookie_secure)?,
            session_ttl_days: parse_env_strict("SESSION_TTL_DAYS", fallback.session_ttl_days)?,
            pbkdf2_iterations: parse_env_strict("PBKDF2_ITERATIONS", fallback.pbkdf2_iterations)?,
        };

        let cors_allowed_origin = std::env::var("CORS_ALLOWED_ORIGIN")
            .ok()
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty());

        Ok(ServerConfig {
            bind,
            database,
            security,
            cors_allowed_origin,
        })
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(MIN_PBKDF2_ITERATIONS..=MAX_PBKDF2_ITERATIONS)
            .contains(&self.security.pbkdf2_iterations)
        {
            return Err(ConfigError::Invalid {
                var: "PBKDF2_ITERATIONS".to_string(),
                reason: format!(
                    "Must be between {MIN_PBKDF2_ITERATIONS} and {MAX_PBKDF2_ITERATIONS}"
                ),
            });
        }

        if !(1..=365).contains(&self.security.session_ttl_days) {
            return Err(ConfigError::Invalid {
                var: "SESSION_TTL_DAYS".to_string(),
                reason: "Must be between 1 and 365".to_string(),
            });
        }

        if self.database.max_connections == 0
            || self.database.min_connections > self.database.max_connections
        {
            return Err(ConfigError::Invalid {
                var: "DB_MAX_CONNECTIONS".to_string(),
                reason: format!(
                    "Must be non-zero and at least DB_MIN_CONNECTIONS ({})",
                    self.database.min_connections
                ),
            });
        }

        if let Some(origin) = &self.cors_allowed_origin {
            if !(origin.starts_with("http://") || origin.starts_with("https://")) {
                return Err(ConfigError::Invalid {
                    var: "CORS_ALLOWED_ORIGIN".to_string(),
                    reason: "Must be an http(s) origin such as https://shop.example".to_string(),
                });
            }
        }

        Ok(())
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration for {var}: {reason}")]
    Invalid { var: String, reason: String },
}

/// Helper to parse environment variable with default fallback
fn parse_env_or<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Like [`parse_env_or`], but a set-yet-unparsable value is an error
fn parse_env_strict<T>(key: &str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
{
    match std::env::var(key) {
        Ok(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid {
            var: key.to_string(),
            reason: format!("Could not parse {raw:?}"),
        }),
        Err(_) => Ok(default),
    }
}
