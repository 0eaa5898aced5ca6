//! Authentication Error Handling
//!
//! Every component returns its own discriminated error so callers can react
//! to the exact failure, while `AuthError` collapses them for the HTTP edge:
//! 1. Domain-specific error types (one per component)
//! 2. Unified `AuthError` with `From` conversions for `?`
//! 3. HTTP response mapping that never reveals which credential check failed

use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use thiserror::Error;

// ============================================================================
// 1. DOMAIN-SPECIFIC ERROR TYPES
// ============================================================================

/// Failures while reading an `Authorization` header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CredentialError {
    #[error("no authorization header included in request")]
    MissingHeader,
    #[error("malformed authorization header")]
    MalformedHeader,
}

/// Password hashing and verification failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PasswordError {
    #[error("password hashing failed: {0}")]
    HashingFailure(String),
    #[error("password does not match")]
    Mismatch,
    #[error("stored password hash is not a valid encoding")]
    InvalidHash,
}

/// Access token issuance and validation failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AccessTokenError {
    #[error("access token is malformed")]
    Malformed,
    #[error("access token signature is invalid")]
    BadSignature,
    #[error("access token has expired")]
    Expired,
    #[error("token was not issued as an access token")]
    WrongIssuer,
    #[error("access token could not be signed")]
    Signing,
}

/// Storage collaborator failures
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("in-memory store lock poisoned")]
    Poisoned,
}

/// Refresh token lifecycle failures
#[derive(Debug, Error)]
pub enum RefreshTokenError {
    #[error("secure random source failed")]
    EntropyFailure,
    #[error("refresh token lifetime is out of range")]
    LifetimeOutOfRange,
    #[error("refresh token not found")]
    NotFound,
    #[error("refresh token has expired")]
    Expired,
    #[error("refresh token has been revoked")]
    Revoked,
    #[error(transparent)]
    Store(#[from] StoreError),
}

// ============================================================================
// 2. UNIFIED AUTHENTICATION ERROR TYPE
// ============================================================================

/// Central error type returned by the session flows and the middleware
#[derive(Debug, Error)]
pub enum AuthError {
    #[error(transparent)]
    Credential(#[from] CredentialError),
    /// Unknown email or wrong password. Deliberately one variant.
    #[error("invalid email or password")]
    InvalidCredentials,
    #[error("invalid api key")]
    InvalidApiKey,
    #[error(transparent)]
    Password(#[from] PasswordError),
    #[error(transparent)]
    AccessToken(#[from] AccessTokenError),
    #[error(transparent)]
    RefreshToken(#[from] RefreshTokenError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("invalid auth configuration: {0}")]
    Configuration(#[from] config::ConfigError),
    #[error("internal error: {0}")]
    Internal(String),
}

impl AuthError {
    /// True when the failure is attributable to the caller's credentials.
    ///
    /// These all map to the same `401` response.
    pub fn is_unauthorized(&self) -> bool {
        match self {
            AuthError::Credential(_)
            | AuthError::InvalidCredentials
            | AuthError::InvalidApiKey => true,
            AuthError::Password(e) => matches!(e, PasswordError::Mismatch),
            AuthError::AccessToken(e) => !matches!(e, AccessTokenError::Signing),
            AuthError::RefreshToken(e) => matches!(
                e,
                RefreshTokenError::NotFound
                    | RefreshTokenError::Expired
                    | RefreshTokenError::Revoked
            ),
            AuthError::Store(_) | AuthError::Configuration(_) | AuthError::Internal(_) => false,
        }
    }
}

// ============================================================================
// 3. HTTP RESPONSE MAPPING
// ============================================================================

/// Error response structure for HTTP responses
#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub struct ErrorResponse {
    /// Unique error ID for correlating with logs
    pub error_id: String,
    /// Human-readable error message
    pub message: String,
    /// Error code for client-side handling
    pub code: String,
    /// HTTP status code
    pub status: u16,
    /// Timestamp when error occurred
    pub timestamp: String,
}

impl ErrorResponse {
    pub fn new(error_id: String, message: String, code: String, status: u16) -> Self {
        Self {
            error_id,
            message,
            code,
            status,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

impl ResponseError for AuthError {
    fn status_code(&self) -> StatusCode {
        if self.is_unauthorized() {
            StatusCode::UNAUTHORIZED
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }

    fn error_response(&self) -> HttpResponse {
        let error_id = uuid::Uuid::new_v4().to_string();
        let status = self.status_code();

        // Credential failures share one body so clients cannot tell which check failed.
        let (code, message) = if self.is_unauthorized() {
            tracing::warn!(error_id = %error_id, error = %self, "Authentication rejected");
            ("UNAUTHORIZED", "Invalid or missing credentials")
        } else {
            tracing::error!(error_id = %error_id, error = %self, "Authentication subsystem failure");
            ("INTERNAL_ERROR", "Internal server error")
        };

        HttpResponse::build(status).json(ErrorResponse::new(
            error_id,
            message.to_string(),
            code.to_string(),
            status.as_u16(),
        ))
    }
}
