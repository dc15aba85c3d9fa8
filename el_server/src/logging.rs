//! Structured logging configuration.
//!
//! Library crates log through the `log` facade; the subscriber installed here
//! picks those records up alongside native `tracing` events.

use el_auth::auth::UserId;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Default filter when `RUST_LOG` is unset
pub const DEFAULT_FILTER: &str = "info,sqlx=warn,hyper=warn";

/// Initialize structured logging
///
/// Log levels are configurable via the `RUST_LOG` env var.
///
/// # Example
///
/// ```no_run
/// use el_server::logging;
///
/// #[tokio::main]
/// async fn main() {
///     logging::init();
///     tracing::info!("Server starting");
/// }
/// ```
pub fn init() {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_file(true)
        .with_line_number(true);

    let result = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init();

    match result {
        Ok(()) => tracing::info!("Structured logging initialized"),
        Err(e) => eprintln!("Logging already initialized: {e}"),
    }
}

/// Log security event with structured data
///
/// # Example
///
/// ```
/// use el_server::logging::log_security_event;
///
/// log_security_event("failed_login", None, "Invalid email or password");
/// ```
pub fn log_security_event(event_type: &str, user_id: Option<UserId>, message: &str) {
    tracing::warn!(
        event_type = event_type,
        user_id = ?user_id,
        "SECURITY: {}",
        message
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_security_event() {
        // Just ensure it doesn't panic
        log_security_event("test_event", Some(uuid::Uuid::nil()), "Test message");
        log_security_event("test_event", None, "Test message");
    }

    #[test]
    fn test_default_filter_parses() {
        assert!(EnvFilter::try_new(DEFAULT_FILTER).is_ok());
    }
}
