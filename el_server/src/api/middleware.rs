//! Session-cookie authorization middleware for protected endpoints.
//!
//! Each layer resolves the `el_session` cookie through the [`AuthGate`] and
//! inserts the resulting [`Identity`] into request extensions:
//!
//! ```rust,no_run
//! use axum::extract::Extension;
//! use el_auth::auth::Identity;
//!
//! async fn protected_handler(Extension(identity): Extension<Identity>) -> String {
//!     format!("Authenticated as {}", identity.email)
//! }
//! # let _ = protected_handler;
//! ```
//!
//! [`AuthGate`]: el_auth::auth::AuthGate

use axum::{
    extract::{Request, State},
    http::{HeaderMap, header::COOKIE},
    middleware::Next,
    response::Response,
};
use el_auth::auth::{AuthError, Identity};

use super::{AppState, error::ApiError};
use crate::logging::log_security_event;

/// Collect every `Cookie` header into one `; `-separated value.
///
/// HTTP/2 clients may split cookies across several header fields.
pub fn cookie_header(headers: &HeaderMap) -> Option<String> {
    let values: Vec<&str> = headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .collect();

    if values.is_empty() {
        None
    } else {
        Some(values.join("; "))
    }
}

/// Reject requests without a live session (`401`)
pub async fn require_user(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let cookies = cookie_header(request.headers());
    let identity = state
        .auth_manager
        .gate()
        .require_user(cookies.as_deref())
        .await?;

    request.extensions_mut().insert::<Identity>(identity);
    Ok(next.run(request).await)
}

/// Reject requests without a live session (`401`) or without the admin role (`403`)
pub async fn require_admin(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let cookies = cookie_header(request.headers());
    let identity = match state
        .auth_manager
        .gate()
        .require_admin(cookies.as_deref())
        .await
    {
        Ok(identity) => identity,
        Err(AuthError::Forbidden) => {
            log_security_event(
                "admin_forbidden",
                None,
                &format!("Non-admin session refused at {}", request.uri().path()),
            );
            return Err(AuthError::Forbidden.into());
        }
        Err(e) => return Err(e.into()),
    };

    request.extensions_mut().insert::<Identity>(identity);
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_cookie_header_joins_fields() {
        let mut headers = HeaderMap::new();
        headers.append(COOKIE, HeaderValue::from_static("a=1"));
        headers.append(COOKIE, HeaderValue::from_static("el_session=tok"));

        assert_eq!(cookie_header(&headers).as_deref(), Some("a=1; el_session=tok"));
    }

    #[test]
    fn test_cookie_header_absent() {
        assert_eq!(cookie_header(&HeaderMap::new()), None);
    }
}
