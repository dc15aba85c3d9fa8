//! Authentication API handlers.
//!
//! Sessions travel in the `el_session` cookie; handlers never return the raw
//! token in a JSON body.
//!
//! # Examples
//!
//! Register a new user:
//! ```bash
//! curl -i -X POST http://localhost:8080/api/v1/auth/register \
//!   -H "Content-Type: application/json" \
//!   -d '{"email": "a@b.com", "password": "longenough1"}'
//! ```
//!
//! Login:
//! ```bash
//! curl -i -c jar -X POST http://localhost:8080/api/v1/auth/login \
//!   -H "Content-Type: application/json" \
//!   -d '{"email": "a@b.com", "password": "longenough1"}'
//! ```

use axum::{
    Json,
    extract::{Extension, State},
    http::{HeaderMap, HeaderName, StatusCode, header::SET_COOKIE},
};
use chrono::Utc;
use el_auth::auth::{
    AuthError, Identity, IssuedSession, LoginRequest, RegisterRequest, Role, SESSION_COOKIE,
    UserId, clear_cookie, cookie::session_token, encode_cookie,
};
use serde::{Deserialize, Serialize};

use super::{AppState, error::ApiError, middleware::cookie_header};
use crate::logging::log_security_event;

#[derive(Debug, Deserialize)]
pub struct CredentialsPayload {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: UserId,
    pub email: String,
    pub role: Role,
}

impl From<Identity> for UserResponse {
    fn from(identity: Identity) -> Self {
        Self {
            id: identity.id,
            email: identity.email,
            role: identity.role,
        }
    }
}

type SetCookie = [(HeaderName, String); 1];

fn session_cookie(state: &AppState, session: &IssuedSession) -> SetCookie {
    let remaining = (session.expires_at - Utc::now()).num_seconds();
    let options = state.cookie_options.clone().with_max_age(remaining);
    [(SET_COOKIE, encode_cookie(SESSION_COOKIE, &session.token, &options))]
}

/// Register a new account and sign it in.
///
/// # Response
///
/// `201 Created` with `{"id", "email", "role"}` and the session cookie.
///
/// # Errors
///
/// - `400 Bad Request`: Invalid email or password shorter than 8 characters
/// - `409 Conflict`: Email already registered
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<CredentialsPayload>,
) -> Result<(StatusCode, SetCookie, Json<UserResponse>), ApiError> {
    let request = RegisterRequest {
        email: payload.email,
        password: payload.password,
    };

    let (user, session) = state.auth_manager.register(request).await?;

    Ok((
        StatusCode::CREATED,
        session_cookie(&state, &session),
        Json(user.identity().into()),
    ))
}

/// Authenticate with email and password.
///
/// # Response
///
/// `200 OK` with the user and a fresh session cookie.
///
/// # Errors
///
/// - `401 Unauthorized`: Unknown email or wrong password, indistinguishably
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<CredentialsPayload>,
) -> Result<(SetCookie, Json<UserResponse>), ApiError> {
    let request = LoginRequest {
        email: payload.email,
        password: payload.password,
    };

    match state.auth_manager.login(request).await {
        Ok((user, session)) => Ok((
            session_cookie(&state, &session),
            Json(user.identity().into()),
        )),
        Err(AuthError::InvalidCredentials) => {
            log_security_event("failed_login", None, "Invalid email or password");
            Err(AuthError::InvalidCredentials.into())
        }
        Err(e) => Err(e.into()),
    }
}

/// End the current session.
///
/// Always answers `204 No Content` with a clearing cookie, whether or not a
/// session was present.
pub async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<(StatusCode, SetCookie), ApiError> {
    let cookies = cookie_header(&headers);
    if let Some(token) = session_token(cookies.as_deref()) {
        state.auth_manager.logout(&token).await?;
    }

    Ok((
        StatusCode::NO_CONTENT,
        [(SET_COOKIE, clear_cookie(SESSION_COOKIE, &state.cookie_options))],
    ))
}

/// Current signed-in user.
pub async fn me(Extension(identity): Extension<Identity>) -> Json<UserResponse> {
    Json(identity.into())
}
