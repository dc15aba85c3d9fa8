//! # el_auth
//!
//! Credential and session authentication for the flavor catalog service.
//!
//! ## Core Modules
//!
//! - [`auth`]: Password hashing, session tokens, the session cookie and the
//!   user/admin authorization gate
//! - [`db`]: PostgreSQL pool, schema migrations and the repository seams the
//!   auth layer stores through
//!
//! ## Example
//!
//! ```
//! use el_auth::auth::{HashParams, PasswordHasher};
//!
//! let hasher = PasswordHasher::new(HashParams::new(1_000));
//! let stored = hasher.hash("longenough1").unwrap();
//! assert!(hasher.verify("longenough1", &stored));
//! ```

/// Password hashing, sessions, cookies and authorization.
pub mod auth;

/// Storage: connection pool, migrations and repositories.
pub mod db;
