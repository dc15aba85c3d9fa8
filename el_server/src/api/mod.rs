//! HTTP API for the catalog's authentication service.
//!
//! # Modules
//!
//! - [`auth`]: Register, login, logout and current-user endpoints
//! - [`admin`]: Admin-gated endpoints
//! - [`middleware`]: Cookie-session gates for protected routes
//! - [`request_id`]: Request ID propagation for log correlation
//! - [`error`]: `AuthError` to HTTP status mapping
//!
//! # Endpoints Overview
//!
//! ```text
//! GET  /health                  - Health check (public)
//! POST /api/v1/auth/register    - Register and sign in (public)
//! POST /api/v1/auth/login       - Sign in (public)
//! POST /api/v1/auth/logout      - Sign out (public, idempotent)
//! GET  /api/v1/auth/me          - Current user (session required)
//! GET  /api/v1/admin/session    - Current admin (admin session required)
//! ```

pub mod admin;
pub mod auth;
pub mod error;
pub mod middleware;
pub mod request_id;

use axum::{
    Router,
    extract::State,
    http::{HeaderValue, Method, StatusCode, header::CONTENT_TYPE, header::InvalidHeaderValue},
    response::{IntoResponse, Json},
    routing::{get, post},
};
use el_auth::{
    auth::{AuthManager, CookieOptions},
    db::Database,
};
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

/// Application state shared across all HTTP handlers.
///
/// Cloned per request; the manager sits behind an `Arc` and the pool is
/// reference-counted internally.
#[derive(Clone)]
pub struct AppState {
    pub auth_manager: Arc<AuthManager>,
    /// Attributes for the session cookie
    pub cookie_options: CookieOptions,
    /// `None` when running on the in-memory store
    pub database: Option<Database>,
}

impl AppState {
    pub fn new(auth_manager: Arc<AuthManager>, cookie_options: CookieOptions) -> Self {
        Self {
            auth_manager,
            cookie_options,
            database: None,
        }
    }

    pub fn with_database(mut self, database: Database) -> Self {
        self.database = Some(database);
        self
    }
}

/// Create the complete API router with all endpoints and middleware.
pub fn create_router(state: AppState) -> Router {
    let v1_routes = create_v1_router(state.clone());

    Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1", v1_routes)
        .layer(axum::middleware::from_fn(request_id::request_id_middleware))
        .with_state(state)
}

fn create_v1_router(state: AppState) -> Router<AppState> {
    // Public routes (no session required)
    let public_routes = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", post(auth::logout));

    let user_routes = Router::new()
        .route("/auth/me", get(auth::me))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::require_user,
        ));

    let admin_routes = Router::new()
        .route("/admin/session", get(admin::session))
        .layer(axum::middleware::from_fn_with_state(
            state,
            middleware::require_admin,
        ));

    Router::new()
        .merge(public_routes)
        .merge(user_routes)
        .merge(admin_routes)
}

/// CORS for a frontend served from another origin. Credentials are allowed
/// so the session cookie rides along.
pub fn cors_layer(origin: &str) -> Result<CorsLayer, InvalidHeaderValue> {
    Ok(CorsLayer::new()
        .allow_origin(HeaderValue::from_str(origin)?)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([CONTENT_TYPE])
        .allow_credentials(true))
}

/// Health check endpoint for monitoring and load balancers.
///
/// Returns `200 OK` when storage is reachable, `503 Service Unavailable` otherwise.
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let database = match &state.database {
        Some(db) => Some(db.health_check().await.is_ok()),
        None => None,
    };
    let healthy = database.unwrap_or(true);

    let status_code = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let response = json!({
        "status": if healthy { "healthy" } else { "unhealthy" },
        "version": env!("CARGO_PKG_VERSION"),
        "storage": if state.database.is_some() { "postgres" } else { "memory" },
        "database": database,
        "timestamp": chrono::Utc::now().to_rfc3339(),
    });

    (status_code, Json(response))
}
