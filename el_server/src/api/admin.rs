//! Admin-only endpoints.

use axum::{Json, extract::Extension};
use el_auth::auth::Identity;

use super::auth::UserResponse;

/// Echo the admin identity behind the session.
///
/// The admin UI calls this before rendering editing controls.
pub async fn session(Extension(identity): Extension<Identity>) -> Json<UserResponse> {
    Json(identity.into())
}
