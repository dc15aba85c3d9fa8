//! Mapping from authentication errors to HTTP responses.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use el_auth::auth::AuthError;
use serde::{Deserialize, Serialize};

/// JSON error envelope
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Handler error wrapping an [`AuthError`]
#[derive(Debug)]
pub struct ApiError(pub AuthError);

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        Self(err)
    }
}

/// HTTP status for an authentication error
pub fn status_for(err: &AuthError) -> StatusCode {
    match err {
        AuthError::Unauthorized | AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
        AuthError::Forbidden => StatusCode::FORBIDDEN,
        AuthError::EmailTaken => StatusCode::CONFLICT,
        AuthError::InvalidEmail(_) | AuthError::WeakPassword(_) => StatusCode::BAD_REQUEST,
        AuthError::UserNotFound => StatusCode::NOT_FOUND,
        AuthError::Database(_) | AuthError::HashingFailed => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.0.is_internal() {
            tracing::error!(error = %self.0, "Request failed");
        }

        let body = ErrorResponse {
            error: self.0.client_message(),
        };
        (status_for(&self.0), Json(body)).into_response()
    }
}
