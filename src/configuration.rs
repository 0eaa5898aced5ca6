use std::fmt;

use chrono::Duration;
use config::ConfigError;

#[derive(serde::Deserialize, Clone, Debug)]
pub struct Settings {
    pub auth: AuthSettings,
}

/// Authentication settings
#[derive(serde::Deserialize, Clone)]
pub struct AuthSettings {
    pub signing_secret: String,
    #[serde(default = "default_access_token_ttl")]
    pub access_token_ttl: i64,   // seconds (default one hour)
    #[serde(default = "default_refresh_token_ttl")]
    pub refresh_token_ttl: i64,  // seconds (default 60 days)
    #[serde(default = "default_password_cost")]
    pub password_cost: u32,
    /// Static key accepted in `Authorization: ApiKey <key>`
    #[serde(default)]
    pub api_key: Option<String>,
}

/// Longest accepted access token lifetime: one year
pub const MAX_ACCESS_TOKEN_TTL: i64 = 365 * 24 * 60 * 60;
/// Longest accepted refresh token lifetime: ten years
pub const MAX_REFRESH_TOKEN_TTL: i64 = 10 * MAX_ACCESS_TOKEN_TTL;

fn default_access_token_ttl() -> i64 {
    3600
}

fn default_refresh_token_ttl() -> i64 {
    crate::auth::default_refresh_token_ttl().num_seconds()
}

fn default_password_cost() -> u32 {
    bcrypt::DEFAULT_COST
}

impl AuthSettings {
    /// Settings with default TTLs and cost for the given secret
    pub fn new(signing_secret: impl Into<String>) -> Self {
        Self {
            signing_secret: signing_secret.into(),
            access_token_ttl: default_access_token_ttl(),
            refresh_token_ttl: default_refresh_token_ttl(),
            password_cost: default_password_cost(),
            api_key: None,
        }
    }

    // Out-of-range values saturate; `validate` rejects them before use.
    pub fn access_token_ttl(&self) -> Duration {
        Duration::try_seconds(self.access_token_ttl).unwrap_or(Duration::MAX)
    }

    pub fn refresh_token_ttl(&self) -> Duration {
        Duration::try_seconds(self.refresh_token_ttl).unwrap_or(Duration::MAX)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.signing_secret.is_empty() {
            return Err(ConfigError::Message(
                "auth.signing_secret must not be empty".to_string(),
            ));
        }
        if self.access_token_ttl <= 0 || self.refresh_token_ttl <= 0 {
            return Err(ConfigError::Message(
                "auth token TTLs must be positive".to_string(),
            ));
        }
        if self.access_token_ttl > MAX_ACCESS_TOKEN_TTL {
            return Err(ConfigError::Message(format!(
                "auth.access_token_ttl must be at most {} seconds",
                MAX_ACCESS_TOKEN_TTL
            )));
        }
        if self.refresh_token_ttl > MAX_REFRESH_TOKEN_TTL {
            return Err(ConfigError::Message(format!(
                "auth.refresh_token_ttl must be at most {} seconds",
                MAX_REFRESH_TOKEN_TTL
            )));
        }
        if !(4..=31).contains(&self.password_cost) {
            return Err(ConfigError::Message(
                "auth.password_cost must be between 4 and 31".to_string(),
            ));
        }
        Ok(())
    }
}

// Secrets stay out of Debug output.
impl fmt::Debug for AuthSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthSettings")
            .field("signing_secret", &"[redacted]")
            .field("access_token_ttl", &self.access_token_ttl)
            .field("refresh_token_ttl", &self.refresh_token_ttl)
            .field("password_cost", &self.password_cost)
            .field("api_key", &self.api_key.as_ref().map(|_| "[redacted]"))
            .finish()
    }
}

/// Load settings from `configuration.{yaml,toml,json}` and `APP_*` env vars
///
/// Environment variables use `__` for nesting, e.g. `APP_AUTH__SIGNING_SECRET`.
pub fn get_configuration() -> Result<Settings, ConfigError> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("configuration").required(false))
        .add_source(
            config::Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;
    let settings = settings.try_deserialize::<Settings>()?;
    settings.auth.validate()?;
    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_from_environment() {
        temp_env::with_vars(
            vec![
                ("APP_AUTH__SIGNING_SECRET", Some("env-secret")),
                ("APP_AUTH__ACCESS_TOKEN_TTL", Some("900")),
            ],
            || {
                let settings = get_configuration().expect("Failed to read configuration");

                assert_eq!(settings.auth.signing_secret, "env-secret");
                assert_eq!(settings.auth.access_token_ttl(), Duration::minutes(15));
                assert_eq!(settings.auth.refresh_token_ttl(), Duration::days(60));
                assert_eq!(settings.auth.password_cost, bcrypt::DEFAULT_COST);
                assert!(settings.auth.api_key.is_none());
            },
        );
    }

    #[test]
    fn test_missing_secret_is_error() {
        temp_env::with_vars(
            vec![
                ("APP_AUTH__SIGNING_SECRET", None::<&str>),
                ("APP_AUTH__ACCESS_TOKEN_TTL", Some("900")),
            ],
            || {
                assert!(get_configuration().is_err());
            },
        );
    }

    #[test]
    fn test_validate() {
        assert!(AuthSettings::new("secret").validate().is_ok());
        assert!(AuthSettings::new("").validate().is_err());

        let mut settings = AuthSettings::new("secret");
        settings.access_token_ttl = 0;
        assert!(settings.validate().is_err());

        let mut settings = AuthSettings::new("secret");
        settings.password_cost = 3;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_oversized_ttls() {
        let mut settings = AuthSettings::new("secret");
        settings.access_token_ttl = MAX_ACCESS_TOKEN_TTL;
        settings.refresh_token_ttl = MAX_REFRESH_TOKEN_TTL;
        assert!(settings.validate().is_ok());

        let mut settings = AuthSettings::new("secret");
        settings.access_token_ttl = i64::MAX;
        assert!(settings.validate().is_err());

        let mut settings = AuthSettings::new("secret");
        settings.refresh_token_ttl = 9_000_000_000_000;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_ttl_accessors_do_not_panic_on_huge_values() {
        let mut settings = AuthSettings::new("secret");
        settings.access_token_ttl = i64::MAX;
        settings.refresh_token_ttl = i64::MAX;

        assert_eq!(settings.access_token_ttl(), Duration::MAX);
        assert_eq!(settings.refresh_token_ttl(), Duration::MAX);
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let mut settings = AuthSettings::new("super-secret-value");
        settings.api_key = Some("polka-key-value".to_string());

        let debug = format!("{:?}", settings);
        assert!(!debug.contains("super-secret-value"));
        assert!(!debug.contains("polka-key-value"));
    }
}
