/// Password Hashing and Verification
///
/// Bcrypt with a fresh random salt per hash. The resulting string carries
/// the algorithm prefix, cost and salt, so verification needs nothing else.
/// Both operations are CPU-bound; async callers should offload them with
/// `tokio::task::spawn_blocking`.
use bcrypt::{hash, verify};

pub use bcrypt::DEFAULT_COST;

use crate::error::PasswordError;

/// Hash a password using bcrypt at the default cost
///
/// # Errors
/// Returns `HashingFailure` only if bcrypt itself fails (e.g. the salt
/// could not be drawn)
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    hash_password_with_cost(password, DEFAULT_COST)
}

/// Hash a password using bcrypt at an explicit cost
pub fn hash_password_with_cost(password: &str, cost: u32) -> Result<String, PasswordError> {
    hash(password, cost).map_err(|e| PasswordError::HashingFailure(e.to_string()))
}

/// Verify a password against its hash
///
/// Bcrypt recomputes the digest with the embedded salt and cost and compares
/// the full digest in constant time.
///
/// # Errors
/// - `Mismatch` if the password does not match
/// - `InvalidHash` if `hash` is not a well-formed bcrypt string
pub fn verify_password(password: &str, hash: &str) -> Result<(), PasswordError> {
    match verify(password, hash) {
        Ok(true) => Ok(()),
        Ok(false) => Err(PasswordError::Mismatch),
        Err(_) => Err(PasswordError::InvalidHash),
    }
}
