//! PBKDF2-HMAC-SHA256 password hashing.
//!
//! Stored hashes are self-describing: `pbkdf2$<iterations>$<saltHex>$<hashHex>`.
//! Verification is fail-closed: every parse or derivation problem reads as a
//! mismatch, and the iteration count found in storage is capped before use.

use rand::RngCore;
use sha2::Sha256;
use subtle::ConstantTimeEq;

use super::errors::{AuthError, AuthResult};

/// Algorithm tag in the first field of a stored hash
pub const ALGORITHM_TAG: &str = "pbkdf2";

/// Default PBKDF2 work factor
pub const DEFAULT_ITERATIONS: u32 = 100_000;

/// Salt length in bytes
pub const SALT_LEN: usize = 16;

/// Derived key length in bytes (256 bits)
pub const KEY_LEN: usize = 32;

const FIELD_DELIMITER: char = '$';

/// Work-factor settings injected into the hasher
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashParams {
    /// Iterations used for new hashes
    pub iterations: u32,
    /// Upper bound applied to iteration counts read back from storage
    pub max_iterations: u32,
}

impl HashParams {
    pub fn new(iterations: u32) -> Self {
        Self {
            iterations,
            max_iterations: iterations,
        }
    }
}

impl Default for HashParams {
    fn default() -> Self {
        Self::new(DEFAULT_ITERATIONS)
    }
}

/// Outcome of checking a candidate password against a stored hash
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verification {
    Match,
    Mismatch,
    Malformed(&'static str),
}

/// Parsed form of a stored hash
#[derive(Debug)]
struct StoredHash {
    iterations: u32,
    salt: Vec<u8>,
    key: Vec<u8>,
}

impl StoredHash {
    fn parse(stored: &str) -> Result<Self, &'static str> {
        let mut fields = stored.split(FIELD_DELIMITER);
        let (Some(tag), Some(iterations), Some(salt), Some(key), None) = (
            fields.next(),
            fields.next(),
            fields.next(),
            fields.next(),
            fields.next(),
        ) else {
            return Err("expected four fields");
        };

        if tag != ALGORITHM_TAG {
            return Err("unknown algorithm");
        }

        let iterations: u32 = iterations.parse().map_err(|_| "bad iteration count")?;
        if iterations == 0 {
            return Err("zero iterations");
        }

        let salt = hex::decode(salt).map_err(|_| "bad salt hex")?;
        let key = hex::decode(key).map_err(|_| "bad key hex")?;
        if key.len() != KEY_LEN {
            return Err("wrong key length");
        }

        Ok(Self {
            iterations,
            salt,
            key,
        })
    }
}

/// Password hasher
#[derive(Debug, Clone, Copy, Default)]
pub struct PasswordHasher {
    params: HashParams,
}

impl PasswordHasher {
    pub fn new(params: HashParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> HashParams {
        self.params
    }

    /// Hash a password with a fresh random salt
    ///
    /// # Errors
    ///
    /// * `AuthError::WeakPassword` - Password is empty
    /// * `AuthError::HashingFailed` - Configured iteration count is zero
    pub fn hash(&self, password: &str) -> AuthResult<String> {
        if password.is_empty() {
            return Err(AuthError::WeakPassword(
                "Password must not be empty".to_string(),
            ));
        }
        if self.params.iterations == 0 {
            return Err(AuthError::HashingFailed);
        }

        let mut salt = [0u8; SALT_LEN];
        rand::rng().fill_bytes(&mut salt);

        let key = derive(password, &salt, self.params.iterations);

        Ok(format!(
            "{ALGORITHM_TAG}${}${}${}",
            self.params.iterations,
            hex::encode(salt),
            hex::encode(key)
        ))
    }

    /// Check a password against a stored hash, reporting why it failed
    pub fn check(&self, password: &str, stored: &str) -> Verification {
        let parsed = match StoredHash::parse(stored) {
            Ok(parsed) => parsed,
            Err(reason) => return Verification::Malformed(reason),
        };

        let iterations = parsed.iterations.min(self.params.max_iterations);
        let candidate = derive(password, &parsed.salt, iterations);

        if constant_time_eq(&candidate, &parsed.key) {
            Verification::Match
        } else {
            Verification::Mismatch
        }
    }

    /// Verify a password against a stored hash. Never errors.
    pub fn verify(&self, password: &str, stored: &str) -> bool {
        self.check(password, stored) == Verification::Match
    }

    /// [`hash`](Self::hash) on the blocking thread pool
    pub async fn hash_blocking(&self, password: String) -> AuthResult<String> {
        let hasher = *self;
        tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|_| AuthError::HashingFailed)?
    }

    /// [`verify`](Self::verify) on the blocking thread pool
    pub async fn verify_blocking(&self, password: String, stored: String) -> bool {
        let hasher = *self;
        tokio::task::spawn_blocking(move || hasher.verify(&password, &stored))
            .await
            .unwrap_or(false)
    }

    /// A well-formed hash no password matches, for equalizing timing on
    /// lookups of unknown accounts
    pub fn dummy_hash(&self) -> String {
        format!(
            "{ALGORITHM_TAG}${}${}${}",
            self.params.iterations,
            "00".repeat(SALT_LEN),
            "00".repeat(KEY_LEN)
        )
    }
}

fn derive(password: &str, salt: &[u8], iterations: u32) -> [u8; KEY_LEN] {
    let mut key = [0u8; KEY_LEN];
    pbkdf2::pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, iterations, &mut key);
    key
}

/// Compare two byte slices without exiting early on the first difference.
///
/// Slices of different length are unequal.
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}
