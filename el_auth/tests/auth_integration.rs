//! Integration tests for the authentication flows.
//!
//! Tests registration, login, logout, session resolution and the admin gate
//! against the in-memory store.

use el_auth::auth::{
    AuthError, AuthManager, DEFAULT_SESSION_TTL, HashParams, LoginRequest, RegisterRequest, Role,
};
use el_auth::db::{MemoryStore, UserRepository};
use std::collections::HashSet;
use std::sync::Arc;

/// Helper to create test auth manager over a fresh store
fn setup_auth_manager(params: HashParams) -> (AuthManager, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let auth = AuthManager::new(store.clone(), store.clone(), params, DEFAULT_SESSION_TTL);
    (auth, store)
}

fn fast() -> HashParams {
    HashParams::new(1_000)
}

fn register(email: &str, password: &str) -> RegisterRequest {
    RegisterRequest {
        email: email.to_string(),
        password: password.to_string(),
    }
}

fn login(email: &str, password: &str) -> LoginRequest {
    LoginRequest {
        email: email.to_string(),
        password: password.to_string(),
    }
}

fn cookie(token: &str) -> String {
    format!("el_session={token}")
}

#[tokio::test]
async fn test_register_login_logout_scenario() {
    let (auth, store) = setup_auth_manager(HashParams::default());

    let (user, registered) = auth
        .register(register("a@b.com", "longenough1"))
        .await
        .expect("Registration should succeed");
    assert!(user.password_hash.starts_with("pbkdf2$100000$"));
    assert_eq!(user.role, Role::User);

    let (logged_in_user, session) = auth
        .login(login("a@b.com", "longenough1"))
        .await
        .expect("Login should succeed");
    assert_eq!(logged_in_user.id, user.id);
    assert_ne!(session.token, registered.token, "Login must mint a fresh token");

    let identity = auth.sessions().resolve(&session.token).await.unwrap();
    assert_eq!(identity.map(|i| i.email), Some("a@b.com".to_string()));

    auth.logout(&session.token).await.expect("Logout should succeed");
    assert!(!store.has_session(&session.token).await);
    assert!(auth.sessions().resolve(&session.token).await.unwrap().is_none());

    // The registration session is unaffected.
    assert!(auth.sessions().resolve(&registered.token).await.unwrap().is_some());
}

#[tokio::test]
async fn test_register_normalizes_email() {
    let (auth, _) = setup_auth_manager(fast());

    let (user, _) = auth
        .register(register("  Mixed.Case@Example.COM ", "longenough1"))
        .await
        .unwrap();
    assert_eq!(user.email, "mixed.case@example.com");

    assert!(auth.login(login("MIXED.case@example.com", "longenough1")).await.is_ok());
}

#[tokio::test]
async fn test_register_duplicate_email() {
    let (auth, _) = setup_auth_manager(fast());

    auth.register(register("dup@b.com", "longenough1"))
        .await
        .expect("First registration should succeed");

    let result = auth.register(register("DUP@b.com", "different99")).await;
    assert!(
        matches!(result, Err(AuthError::EmailTaken)),
        "Should return EmailTaken error"
    );
}

#[tokio::test]
async fn test_register_validation() {
    let (auth, _) = setup_auth_manager(fast());

    assert!(matches!(
        auth.register(register("a@b.com", "short")).await,
        Err(AuthError::WeakPassword(_))
    ));
    assert!(matches!(
        auth.register(register("   ", "longenough1")).await,
        Err(AuthError::InvalidEmail(_))
    ));
    assert!(matches!(
        auth.register(register("not-an-email", "longenough1")).await,
        Err(AuthError::InvalidEmail(_))
    ));
}

#[tokio::test]
async fn test_login_failures_are_indistinguishable() {
    let (auth, _) = setup_auth_manager(fast());
    auth.register(register("known@b.com", "longenough1"))
        .await
        .unwrap();

    let wrong_password = auth
        .login(login("known@b.com", "wrongpass1"))
        .await
        .unwrap_err();
    let unknown_user = auth
        .login(login("nobody@b.com", "longenough1"))
        .await
        .unwrap_err();
    let empty = auth.login(login("", "")).await.unwrap_err();

    assert!(matches!(wrong_password, AuthError::InvalidCredentials));
    assert!(matches!(unknown_user, AuthError::InvalidCredentials));
    assert!(matches!(empty, AuthError::InvalidCredentials));
    assert_eq!(wrong_password.client_message(), unknown_user.client_message());
}

#[tokio::test]
async fn test_login_against_corrupt_hash_fails_closed() {
    let (auth, store) = setup_auth_manager(fast());
    store
        .create_user("legacy@b.com", "bcrypt$2b$12$whatever", Role::User)
        .await
        .unwrap();

    assert!(matches!(
        auth.login(login("legacy@b.com", "longenough1")).await,
        Err(AuthError::InvalidCredentials)
    ));
}

#[tokio::test]
async fn test_concurrent_registrations_same_email() {
    let (auth, _) = setup_auth_manager(fast());
    let auth = Arc::new(auth);

    let mut handles = vec![];
    for _ in 0..8 {
        let auth = Arc::clone(&auth);
        handles.push(tokio::spawn(async move {
            auth.register(register("race@b.com", "longenough1")).await
        }));
    }

    let mut winners = 0;
    let mut conflicts = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => winners += 1,
            Err(AuthError::EmailTaken) => conflicts += 1,
            Err(e) => panic!("unexpected error: {e}"),
        }
    }

    assert_eq!(winners, 1);
    assert_eq!(conflicts, 7);
}

#[tokio::test]
async fn test_multiple_sessions_same_user() {
    let (auth, store) = setup_auth_manager(fast());
    auth.register(register("multi@b.com", "longenough1"))
        .await
        .unwrap();

    let mut tokens = HashSet::new();
    for _ in 0..3 {
        let (_, session) = auth.login(login("multi@b.com", "longenough1")).await.unwrap();
        tokens.insert(session.token);
    }

    assert_eq!(tokens.len(), 3);
    assert_eq!(store.session_count().await, 4);
    for token in &tokens {
        assert!(auth.sessions().resolve(token).await.unwrap().is_some());
    }
}

#[tokio::test]
async fn test_admin_gate_end_to_end() {
    let (auth, _) = setup_auth_manager(fast());

    let (_, admin_session) = auth
        .register(register("admin@b.com", "longenough1"))
        .await
        .unwrap();
    auth.promote_to_admin("Admin@B.com").await.unwrap();
    let (_, user_session) = auth
        .register(register("user@b.com", "longenough1"))
        .await
        .unwrap();

    let gate = auth.gate();

    let admin = gate
        .require_admin(Some(&cookie(&admin_session.token)))
        .await
        .expect("Admin should pass");
    assert_eq!(admin.role, Role::Admin);

    assert!(matches!(
        gate.require_admin(Some(&cookie(&user_session.token))).await,
        Err(AuthError::Forbidden)
    ));
    assert!(matches!(
        gate.require_admin(None).await,
        Err(AuthError::Unauthorized)
    ));
}

#[tokio::test]
async fn test_role_change_applies_to_existing_sessions() {
    let (auth, _) = setup_auth_manager(fast());
    let (_, session) = auth
        .register(register("later@b.com", "longenough1"))
        .await
        .unwrap();
    let header = cookie(&session.token);

    assert!(auth.gate().require_admin(Some(&header)).await.is_err());
    auth.promote_to_admin("later@b.com").await.unwrap();
    assert!(auth.gate().require_admin(Some(&header)).await.is_ok());
}

#[tokio::test]
async fn test_promote_unknown_user() {
    let (auth, _) = setup_auth_manager(fast());
    assert!(matches!(
        auth.promote_to_admin("ghost@b.com").await,
        Err(AuthError::UserNotFound)
    ));
}
