/// Session Flows
///
/// Composes the credential extractor, password hasher, access token codec
/// and refresh token manager into the login, refresh, revoke and
/// authenticate flows an HTTP layer calls.
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::auth::{
    api_key_matches, bearer_token, exchange_refresh_token_at, extract_credential,
    hash_password_with_cost, issue_access_token_at, issue_refresh_token_at,
    revoke_all_user_tokens, revoke_refresh_token_at, validate_access_token, verify_password,
    Scheme,
};
use crate::configuration::AuthSettings;
use crate::error::{AuthError, PasswordError, RefreshTokenError};
use crate::store::AuthStore;

type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Tokens handed back after a successful login
#[derive(Serialize)]
pub struct Session {
    pub user_id: Uuid,
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    /// Access token lifetime in seconds
    pub expires_in: i64,
    pub refresh_token_expires_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct AuthService {
    store: Arc<dyn AuthStore>,
    settings: AuthSettings,
    clock: Clock,
    /// Verified against when the email is unknown so both login failures cost the same
    dummy_hash: Arc<str>,
}

impl AuthService {
    /// # Errors
    /// - `Configuration` if `settings` fail validation
    /// - `HashingFailure` if the placeholder hash cannot be computed
    pub fn new(store: Arc<dyn AuthStore>, settings: AuthSettings) -> Result<Self, AuthError> {
        settings.validate()?;
        let dummy_hash = hash_password_with_cost("placeholder-password", settings.password_cost)?;

        Ok(Self {
            store,
            settings,
            clock: Arc::new(Utc::now),
            dummy_hash: dummy_hash.into(),
        })
    }

    /// Override the time source used when minting tokens
    pub fn with_clock(mut self, clock: impl Fn() -> DateTime<Utc> + Send + Sync + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    pub fn settings(&self) -> &AuthSettings {
        &self.settings
    }

    /// Hash a new password at the configured cost on a blocking thread
    pub async fn hash_password(&self, password: &str) -> Result<String, AuthError> {
        let password = password.to_string();
        let cost = self.settings.password_cost;

        let hash = tokio::task::spawn_blocking(move || hash_password_with_cost(&password, cost))
            .await
            .map_err(|e| AuthError::Internal(format!("password hashing task failed: {}", e)))??;
        Ok(hash)
    }

    /// Authenticate with email and password and open a session
    ///
    /// # Errors
    /// - `InvalidCredentials` for an unknown email or a wrong password
    /// - `Store` / `RefreshToken` on storage or entropy failure
    pub async fn login(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let user = self.store.find_user_by_email(email).await?;

        let (user_id, hash) = match &user {
            Some(user) => (Some(user.id), user.hashed_password.clone()),
            None => (None, self.dummy_hash.to_string()),
        };

        let password = password.to_string();
        let verified = tokio::task::spawn_blocking(move || verify_password(&password, &hash))
            .await
            .map_err(|e| AuthError::Internal(format!("password verification task failed: {}", e)))?;

        let user_id = match (user_id, verified) {
            (Some(user_id), Ok(())) => user_id,
            (Some(user_id), Err(PasswordError::InvalidHash)) => {
                tracing::error!(user_id = %user_id, "Stored password hash is not valid bcrypt");
                return Err(AuthError::InvalidCredentials);
            }
            _ => return Err(AuthError::InvalidCredentials),
        };

        let now = (self.clock)();
        let access_token = issue_access_token_at(
            user_id,
            &self.settings.signing_secret,
            self.settings.access_token_ttl(),
            now,
        )?;
        let refresh_token = issue_refresh_token_at(
            self.store.as_ref(),
            user_id,
            self.settings.refresh_token_ttl(),
            now,
        )
        .await?;

        tracing::info!(user_id = %user_id, "User logged in successfully");

        Ok(Session {
            user_id,
            access_token,
            refresh_token: refresh_token.token,
            token_type: Scheme::Bearer.as_str().to_string(),
            expires_in: self.settings.access_token_ttl,
            refresh_token_expires_at: refresh_token.expires_at,
        })
    }

    /// Exchange a `Bearer <refresh token>` header for a new access token
    ///
    /// The refresh token itself is left untouched and stays usable.
    pub async fn refresh(&self, authorization: Option<&str>) -> Result<String, AuthError> {
        let token = bearer_token(authorization)?;
        let now = (self.clock)();

        let user_id = exchange_refresh_token_at(self.store.as_ref(), token, now).await?;
        let access_token = issue_access_token_at(
            user_id,
            &self.settings.signing_secret,
            self.settings.access_token_ttl(),
            now,
        )?;

        tracing::info!(user_id = %user_id, "Access token refreshed");
        Ok(access_token)
    }

    /// Revoke the refresh token in a `Bearer <refresh token>` header
    ///
    /// Revoking an unknown or already revoked token succeeds.
    pub async fn revoke(&self, authorization: Option<&str>) -> Result<(), AuthError> {
        let token = bearer_token(authorization)?;

        match revoke_refresh_token_at(self.store.as_ref(), token, (self.clock)()).await {
            Ok(()) => {
                tracing::info!("Refresh token revoked");
                Ok(())
            }
            Err(RefreshTokenError::NotFound) => {
                tracing::debug!("Refresh token already revoked or unknown");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Revoke every session of a user
    pub async fn revoke_all_for_user(&self, user_id: Uuid) -> Result<u64, AuthError> {
        Ok(revoke_all_user_tokens(self.store.as_ref(), user_id).await?)
    }

    /// Resolve a `Bearer <access token>` header to the calling user
    pub fn authenticate(&self, authorization: Option<&str>) -> Result<Uuid, AuthError> {
        let token = bearer_token(authorization)?;
        Ok(validate_access_token(token, &self.settings.signing_secret)?)
    }

    /// Check an `ApiKey <key>` header against the configured service key
    ///
    /// With no key configured every request is rejected.
    pub fn authorize_api_key(&self, authorization: Option<&str>) -> Result<(), AuthError> {
        let presented = extract_credential(authorization, Scheme::ApiKey)?;

        match &self.settings.api_key {
            Some(expected) if api_key_matches(presented, expected) => Ok(()),
            _ => Err(AuthError::InvalidApiKey),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{AccessTokenError, CredentialError};
    use crate::store::{InMemoryStore, UserCredentials};

    const EMAIL: &str = "walt@breakingbad.com";
    const PASSWORD: &str = "04234";

    async fn service_with_user() -> (AuthService, Uuid) {
        let mut settings = AuthSettings::new("test-secret");
        settings.password_cost = 4;
        settings.api_key = Some("f271c81ff7084ee5b99a5091b42d486e".to_string());

        let store = Arc::new(InMemoryStore::new());
        let service = AuthService::new(store.clone(), settings).unwrap();

        let user_id = Uuid::new_v4();
        store
            .insert_user(UserCredentials {
                id: user_id,
                email: EMAIL.to_string(),
                hashed_password: service.hash_password(PASSWORD).await.unwrap(),
            })
            .unwrap();

        (service, user_id)
    }

    #[tokio::test]
    async fn test_login_issues_tokens() {
        let (service, user_id) = service_with_user().await;

        let session = service.login(EMAIL, PASSWORD).await.expect("Login failed");

        assert_eq!(session.user_id, user_id);
        assert_eq!(session.refresh_token.len(), 64);
        assert_eq!(session.expires_in, 3600);
        assert_eq!(session.token_type, "Bearer");

        let header = format!("Bearer {}", session.access_token);
        assert_eq!(service.authenticate(Some(&header)).unwrap(), user_id);
    }

    #[test]
    fn test_new_rejects_out_of_range_ttls() {
        let mut settings = AuthSettings::new("test-secret");
        settings.password_cost = 4;
        settings.refresh_token_ttl = 9_000_000_000_000;
        let result = AuthService::new(Arc::new(InMemoryStore::new()), settings);
        assert!(matches!(result, Err(AuthError::Configuration(_))));

        let mut settings = AuthSettings::new("test-secret");
        settings.password_cost = 4;
        settings.access_token_ttl = i64::MAX;
        let result = AuthService::new(Arc::new(InMemoryStore::new()), settings);
        assert!(matches!(result, Err(AuthError::Configuration(_))));
    }

    #[tokio::test]
    async fn test_login_failures_are_indistinguishable() {
        let (service, _) = service_with_user().await;

        let wrong_password = service.login(EMAIL, "wrong").await;
        let unknown_email = service.login("jesse@breakingbad.com", PASSWORD).await;

        assert!(matches!(wrong_password, Err(AuthError::InvalidCredentials)));
        assert!(matches!(unknown_email, Err(AuthError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn test_corrupt_stored_hash_rejects_login() {
        let (service, _) = service_with_user().await;
        let store = InMemoryStore::new();
        store
            .insert_user(UserCredentials {
                id: Uuid::new_v4(),
                email: EMAIL.to_string(),
                hashed_password: "not-a-valid-hash".to_string(),
            })
            .unwrap();
        let service = AuthService::new(Arc::new(store), service.settings().clone()).unwrap();

        let result = service.login(EMAIL, PASSWORD).await;
        assert!(matches!(result, Err(AuthError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn test_refresh_requires_bearer_header() {
        let (service, _) = service_with_user().await;

        assert!(matches!(
            service.refresh(None).await,
            Err(AuthError::Credential(CredentialError::MissingHeader))
        ));
        assert!(matches!(
            service.refresh(Some("Token abc")).await,
            Err(AuthError::Credential(CredentialError::MalformedHeader))
        ));
    }

    #[tokio::test]
    async fn test_revoke_is_idempotent() {
        let (service, _) = service_with_user().await;
        let session = service.login(EMAIL, PASSWORD).await.unwrap();
        let header = format!("Bearer {}", session.refresh_token);

        service.revoke(Some(&header)).await.expect("First revoke failed");
        service.revoke(Some(&header)).await.expect("Second revoke failed");
        service
            .revoke(Some(&format!("Bearer {}", "0".repeat(64))))
            .await
            .expect("Unknown token revoke failed");
    }

    #[tokio::test]
    async fn test_revoke_all_for_user() {
        let (service, user_id) = service_with_user().await;
        let first = service.login(EMAIL, PASSWORD).await.unwrap();
        let second = service.login(EMAIL, PASSWORD).await.unwrap();

        assert_eq!(service.revoke_all_for_user(user_id).await.unwrap(), 2);

        for session in [first, second] {
            let header = format!("Bearer {}", session.refresh_token);
            assert!(matches!(
                service.refresh(Some(&header)).await,
                Err(AuthError::RefreshToken(RefreshTokenError::Revoked))
            ));
        }
    }

    #[tokio::test]
    async fn test_refresh_token_is_not_an_access_token() {
        let (service, _) = service_with_user().await;
        let session = service.login(EMAIL, PASSWORD).await.unwrap();

        let header = format!("Bearer {}", session.refresh_token);
        assert!(matches!(
            service.authenticate(Some(&header)),
            Err(AuthError::AccessToken(AccessTokenError::Malformed))
        ));
    }

    #[tokio::test]
    async fn test_authorize_api_key() {
        let (service, _) = service_with_user().await;

        assert!(service
            .authorize_api_key(Some("ApiKey f271c81ff7084ee5b99a5091b42d486e"))
            .is_ok());
        assert!(matches!(
            service.authorize_api_key(Some("ApiKey wrong")),
            Err(AuthError::InvalidApiKey)
        ));
        assert!(matches!(
            service.authorize_api_key(Some("Bearer f271c81ff7084ee5b99a5091b42d486e")),
            Err(AuthError::Credential(CredentialError::MalformedHeader))
        ));

        let mut settings = service.settings().clone();
        settings.api_key = None;
        let unconfigured = AuthService::new(Arc::new(InMemoryStore::new()), settings).unwrap();
        assert!(matches!(
            unconfigured.authorize_api_key(Some("ApiKey anything")),
            Err(AuthError::InvalidApiKey)
        ));
    }
}
