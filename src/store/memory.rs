use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::{AuthStore, UserCredentials};
use crate::auth::RefreshToken;
use crate::error::StoreError;

/// Process-local `AuthStore` backed by hash maps
#[derive(Default)]
pub struct InMemoryStore {
    users: RwLock<HashMap<String, UserCredentials>>,
    refresh_tokens: RwLock<HashMap<String, RefreshToken>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a user row, replacing any existing one with the same email
    pub fn insert_user(&self, user: UserCredentials) -> Result<(), StoreError> {
        let mut users = self.users.write().map_err(|_| StoreError::Poisoned)?;
        users.insert(user.email.clone(), user);
        Ok(())
    }
}

#[async_trait]
impl AuthStore for InMemoryStore {
    async fn find_user_by_email(
        &self,
        email: &str,
    ) -> Result<Option<UserCredentials>, StoreError> {
        let users = self.users.read().map_err(|_| StoreError::Poisoned)?;
        Ok(users.get(email).cloned())
    }

    async fn put_refresh_token(&self, record: &RefreshToken) -> Result<(), StoreError> {
        let mut tokens = self.refresh_tokens.write().map_err(|_| StoreError::Poisoned)?;
        tokens.insert(record.token.clone(), record.clone());
        Ok(())
    }

    async fn get_refresh_token(&self, token: &str) -> Result<Option<RefreshToken>, StoreError> {
        let tokens = self.refresh_tokens.read().map_err(|_| StoreError::Poisoned)?;
        Ok(tokens.get(token).cloned())
    }

    async fn mark_refresh_token_revoked(
        &self,
        token: &str,
        revoked_at: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        let mut tokens = self.refresh_tokens.write().map_err(|_| StoreError::Poisoned)?;
        match tokens.get_mut(token) {
            Some(record) if record.revoked_at.is_none() => {
                record.revoked_at = Some(revoked_at);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn revoke_refresh_tokens_for_user(
        &self,
        user_id: Uuid,
        revoked_at: DateTime<Utc>,
    ) -> Result<u64, StoreError> {
        let mut tokens = self.refresh_tokens.write().map_err(|_| StoreError::Poisoned)?;
        let mut revoked = 0;
        for record in tokens
            .values_mut()
            .filter(|r| r.user_id == user_id && r.revoked_at.is_none())
        {
            record.revoked_at = Some(revoked_at);
            revoked += 1;
        }
        Ok(revoked)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn record(user_id: Uuid, token: &str) -> RefreshToken {
        let now = Utc::now();
        RefreshToken {
            token: token.to_string(),
            user_id,
            created_at: now,
            expires_at: now + Duration::days(60),
            revoked_at: None,
        }
    }

    #[tokio::test]
    async fn test_find_user_by_email() {
        let store = InMemoryStore::new();
        let user = UserCredentials {
            id: Uuid::new_v4(),
            email: "walt@breakingbad.com".to_string(),
            hashed_password: "$2b$04$hash".to_string(),
        };
        store.insert_user(user.clone()).unwrap();

        assert_eq!(store.find_user_by_email("walt@breakingbad.com").await.unwrap(), Some(user));
        assert_eq!(store.find_user_by_email("saul@bettercall.com").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_mark_revoked_only_changes_live_tokens() {
        let store = InMemoryStore::new();
        store.put_refresh_token(&record(Uuid::new_v4(), "abc")).await.unwrap();

        let now = Utc::now();
        assert!(store.mark_refresh_token_revoked("abc", now).await.unwrap());
        assert!(!store.mark_refresh_token_revoked("abc", now).await.unwrap());
        assert!(!store.mark_refresh_token_revoked("missing", now).await.unwrap());

        let stored = store.get_refresh_token("abc").await.unwrap().unwrap();
        assert_eq!(stored.revoked_at, Some(now));
    }
}
