//! Authentication service for the flavor catalog.
//!
//! Serves register/login/logout/me plus admin-gated routes over
//! cookie sessions backed by PostgreSQL.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Error};
use el_auth::{
    auth::AuthManager,
    db::{Database, MemoryStore, PgSessionRepository, PgUserRepository},
};
use el_server::{api, config::ServerConfig, logging};
use log::info;
use pico_args::Arguments;

const HELP: &str = "\
Run the catalog authentication server

USAGE:
  el_server [OPTIONS]

OPTIONS:
  --bind           IP:PORT  Server socket bind address  [default: env SERVER_BIND or 127.0.0.1:8080]
  --db-url         URL      Database connection string  [default: env DATABASE_URL]
  --promote-admin  EMAIL    Grant the admin role to an existing account and exit

FLAGS:
  --memory                  Keep users and sessions in memory (development only)
  -h, --help                Print help information

ENVIRONMENT:
  SERVER_BIND              Server bind address (e.g., 0.0.0.0:8080)
  DATABASE_URL             PostgreSQL connection string
  COOKIE_SECURE            Mark the session cookie Secure [default: true]
  SESSION_TTL_DAYS         Session lifetime in days [default: 14]
  PBKDF2_ITERATIONS        Password hashing work factor [default: 100000]
  CORS_ALLOWED_ORIGIN      Origin allowed to call the API with credentials
  RUST_LOG                 Log filter [default: info,sqlx=warn,hyper=warn]
";

struct Args {
    bind: Option<SocketAddr>,
    database_url: Option<String>,
    promote_admin: Option<String>,
    memory: bool,
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Load .env file if it exists
    let _ = dotenvy::dotenv();

    let mut pargs = Arguments::from_env();

    // Help has a higher priority and should be handled separately.
    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        return Ok(());
    }

    let args = Args {
        bind: pargs.opt_value_from_str("--bind")?,
        database_url: pargs.opt_value_from_str("--db-url")?,
        promote_admin: pargs.opt_value_from_str("--promote-admin")?,
        memory: pargs.contains("--memory"),
    };

    logging::init();

    let config = ServerConfig::from_env(args.bind, args.database_url)?;
    config.validate()?;

    let (auth_manager, database) = if args.memory {
        log::warn!("Using in-memory storage; accounts vanish on restart");
        let store = Arc::new(MemoryStore::new());
        let auth = AuthManager::new(
            store.clone(),
            store,
            config.security.hash_params(),
            config.security.session_ttl(),
        );
        (auth, None)
    } else {
        info!("Connecting to database");
        let db = Database::new(&config.database)
            .await
            .context("Failed to connect to database")?;
        db.migrate().await.context("Failed to apply migrations")?;
        info!("Database connected successfully");

        let auth = AuthManager::new(
            Arc::new(PgUserRepository::new(db.pool().clone())),
            Arc::new(PgSessionRepository::new(db.pool().clone())),
            config.security.hash_params(),
            config.security.session_ttl(),
        );
        (auth, Some(db))
    };

    if let Some(email) = args.promote_admin {
        auth_manager
            .promote_to_admin(&email)
            .await
            .with_context(|| format!("Failed to promote {email}"))?;
        info!("Granted admin role to {email}");
        return Ok(());
    }

    let mut state = api::AppState::new(Arc::new(auth_manager), config.security.cookie_options());
    if let Some(db) = database {
        state = state.with_database(db);
    }

    let mut app = api::create_router(state);
    if let Some(origin) = &config.cors_allowed_origin {
        app = app.layer(api::cors_layer(origin).context("Invalid CORS_ALLOWED_ORIGIN")?);
        info!("CORS enabled for {origin}");
    }

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind))?;

    info!(
        "Server is running at http://{}. Press Ctrl+C to stop.",
        config.bind
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Shutting down server...");

    Ok(())
}

/// Graceful shutdown signal
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
}
