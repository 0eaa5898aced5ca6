/// Refresh Token Management
///
/// Handles secure refresh token generation, storage, validation, and revocation.
/// Refresh tokens are:
/// - 32 random bytes from the operating system RNG, hex encoded (64 chars)
/// - Persisted through the `AuthStore` collaborator, keyed by value
/// - Reusable until they expire or are revoked (no rotation on refresh)
///
/// Revocation is eventually consistent with respect to `exchange_refresh_token`:
/// an exchange that read the record just before a concurrent revoke landed
/// may still succeed once.
use std::fmt;

use chrono::{DateTime, Duration, Utc};
use rand::rngs::OsRng;
use rand::RngCore;
use uuid::Uuid;

use crate::error::RefreshTokenError;
use crate::store::AuthStore;

/// Number of random bytes behind every refresh token
pub const REFRESH_TOKEN_BYTES: usize = 32;

/// Default refresh token lifetime
pub fn default_refresh_token_ttl() -> Duration {
    Duration::days(60)
}

/// A persisted refresh token
#[derive(Clone, PartialEq, Eq)]
pub struct RefreshToken {
    pub token: String,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub revoked_at: Option<DateTime<Utc>>,
}

impl RefreshToken {
    pub fn is_revoked(&self) -> bool {
        self.revoked_at.is_some()
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }
}

// The token value is a bearer credential; keep it out of logs.
impl fmt::Debug for RefreshToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RefreshToken")
            .field("token", &"[redacted]")
            .field("user_id", &self.user_id)
            .field("created_at", &self.created_at)
            .field("expires_at", &self.expires_at)
            .field("revoked_at", &self.revoked_at)
            .finish()
    }
}

/// Generate a new cryptographically secure refresh token value
///
/// # Errors
/// Returns `EntropyFailure` if the operating system RNG fails
pub fn generate_refresh_token() -> Result<String, RefreshTokenError> {
    let mut bytes = [0u8; REFRESH_TOKEN_BYTES];
    OsRng.try_fill_bytes(&mut bytes).map_err(|e| {
        tracing::error!(error = %e, "Secure random source failed");
        RefreshTokenError::EntropyFailure
    })?;
    Ok(hex::encode(bytes))
}

/// Mint a refresh token for `user_id` and persist it
pub async fn issue_refresh_token(
    store: &dyn AuthStore,
    user_id: Uuid,
    ttl: Duration,
) -> Result<RefreshToken, RefreshTokenError> {
    issue_refresh_token_at(store, user_id, ttl, Utc::now()).await
}

/// Mint and persist a refresh token as if issued at `now`
///
/// # Errors
/// Returns `LifetimeOutOfRange` if `now + ttl` is not a representable instant
pub async fn issue_refresh_token_at(
    store: &dyn AuthStore,
    user_id: Uuid,
    ttl: Duration,
    now: DateTime<Utc>,
) -> Result<RefreshToken, RefreshTokenError> {
    let expires_at = now.checked_add_signed(ttl).ok_or_else(|| {
        tracing::error!(user_id = %user_id, "Refresh token lifetime overflows the calendar");
        RefreshTokenError::LifetimeOutOfRange
    })?;

    let record = RefreshToken {
        token: generate_refresh_token()?,
        user_id,
        created_at: now,
        expires_at,
        revoked_at: None,
    };

    store.put_refresh_token(&record).await?;

    tracing::debug!(user_id = %user_id, expires_at = %record.expires_at, "Refresh token issued");
    Ok(record)
}

/// Resolve a refresh token to its user
///
/// Revocation is checked before expiry so a revoked token always reports
/// `Revoked`, even once it would also have expired.
///
/// # Errors
/// - `NotFound` if no record matches
/// - `Revoked` if the token was revoked
/// - `Expired` if the current time is past `expires_at`
pub async fn exchange_refresh_token(
    store: &dyn AuthStore,
    token: &str,
) -> Result<Uuid, RefreshTokenError> {
    exchange_refresh_token_at(store, token, Utc::now()).await
}

/// Resolve a refresh token to its user, judging expiry against `now`
pub async fn exchange_refresh_token_at(
    store: &dyn AuthStore,
    token: &str,
    now: DateTime<Utc>,
) -> Result<Uuid, RefreshTokenError> {
    let record = match store.get_refresh_token(token).await? {
        Some(record) => record,
        None => {
            tracing::warn!("Refresh token not found");
            return Err(RefreshTokenError::NotFound);
        }
    };

    if record.is_revoked() {
        tracing::warn!(user_id = %record.user_id, "Attempt to use revoked refresh token");
        return Err(RefreshTokenError::Revoked);
    }

    if record.is_expired_at(now) {
        tracing::info!(user_id = %record.user_id, "Refresh token expired");
        return Err(RefreshTokenError::Expired);
    }

    Ok(record.user_id)
}

/// Revoke a single refresh token
///
/// # Errors
/// Returns `NotFound` if the token does not exist or was already revoked.
/// Callers wanting idempotent revoke should treat that as success.
pub async fn revoke_refresh_token(
    store: &dyn AuthStore,
    token: &str,
) -> Result<(), RefreshTokenError> {
    revoke_refresh_token_at(store, token, Utc::now()).await
}

/// Revoke a single refresh token, stamping `now` as the revocation time
pub async fn revoke_refresh_token_at(
    store: &dyn AuthStore,
    token: &str,
    now: DateTime<Utc>,
) -> Result<(), RefreshTokenError> {
    if store.mark_refresh_token_revoked(token, now).await? {
        Ok(())
    } else {
        Err(RefreshTokenError::NotFound)
    }
}

/// Revoke all live refresh tokens for a user
///
/// Useful for logout-all-devices and administrative resets.
/// Returns the number of tokens that were revoked.
pub async fn revoke_all_user_tokens(
    store: &dyn AuthStore,
    user_id: Uuid,
) -> Result<u64, RefreshTokenError> {
    let revoked = store
        .revoke_refresh_tokens_for_user(user_id, Utc::now())
        .await?;

    tracing::info!(user_id = %user_id, revoked = revoked, "All refresh tokens revoked for user");
    Ok(revoked)
}
