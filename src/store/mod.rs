//! Storage collaborator
//!
//! The authentication core only ever needs a handful of lookups and writes;
//! everything else about the schema belongs to the surrounding service.

mod memory;
mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::auth::RefreshToken;
use crate::error::StoreError;

pub use memory::InMemoryStore;
pub use postgres::PgStore;

/// The credential fields of a user row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserCredentials {
    pub id: Uuid,
    pub email: String,
    pub hashed_password: String,
}

#[async_trait]
pub trait AuthStore: Send + Sync {
    async fn find_user_by_email(&self, email: &str)
        -> Result<Option<UserCredentials>, StoreError>;

    async fn put_refresh_token(&self, record: &RefreshToken) -> Result<(), StoreError>;

    async fn get_refresh_token(&self, token: &str) -> Result<Option<RefreshToken>, StoreError>;

    /// Set `revoked_at` on a live token. Returns `false` when the token does
    /// not exist or was already revoked.
    async fn mark_refresh_token_revoked(
        &self,
        token: &str,
        revoked_at: DateTime<Utc>,
    ) -> Result<bool, StoreError>;

    /// Revoke every live token belonging to `user_id`, returning how many changed.
    async fn revoke_refresh_tokens_for_user(
        &self,
        user_id: Uuid,
        revoked_at: DateTime<Utc>,
    ) -> Result<u64, StoreError>;
}
