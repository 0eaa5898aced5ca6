/// Access Token Issuance and Validation
///
/// HS256-signed JWTs carrying `Claims`. Validation is pure computation: it
/// never touches storage, so an issued token stays valid until `exp` even if
/// the session behind it is revoked. Keep the TTL short.
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use uuid::Uuid;

use crate::auth::claims::{Claims, ACCESS_TOKEN_ISSUER};
use crate::error::AccessTokenError;

/// Generate a new access token for a user
///
/// # Arguments
/// * `user_id` - User's UUID
/// * `secret` - HMAC signing secret
/// * `ttl` - Lifetime from now; may be negative to mint an already-expired token
///
/// # Errors
/// Returns `Signing` if the claims could not be encoded
pub fn issue_access_token(
    user_id: Uuid,
    secret: &str,
    ttl: Duration,
) -> Result<String, AccessTokenError> {
    issue_access_token_at(user_id, secret, ttl, Utc::now())
}

/// Generate an access token as if issued at `now`
///
/// Identical inputs produce identical tokens.
pub fn issue_access_token_at(
    user_id: Uuid,
    secret: &str,
    ttl: Duration,
    now: DateTime<Utc>,
) -> Result<String, AccessTokenError> {
    let claims = Claims::new(user_id, now, ttl);

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| {
        tracing::error!(error = %e, "Access token signing failed");
        AccessTokenError::Signing
    })
}

/// Validate an access token and return the user it was issued to
///
/// Checks run in order: encoding and signature, expiry, issuer, subject.
///
/// # Errors
/// - `BadSignature` if the MAC does not verify with `secret`
/// - `Expired` if the current time is past `exp`
/// - `WrongIssuer` if the token was not issued as an access token
/// - `Malformed` if the token cannot be decoded or the subject is not a UUID
pub fn validate_access_token(token: &str, secret: &str) -> Result<Uuid, AccessTokenError> {
    let claims = decode_claims(token, secret)?;
    let user_id = claims.user_id()?;

    tracing::debug!(user_id = %user_id, "Access token validated");
    Ok(user_id)
}

fn decode_claims(token: &str, secret: &str) -> Result<Claims, AccessTokenError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;
    validation.set_required_spec_claims(&["exp", "iss", "sub"]);
    validation.set_issuer(&[ACCESS_TOKEN_ISSUER]);

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|e| match e.kind() {
        ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => {
            AccessTokenError::BadSignature
        }
        ErrorKind::ExpiredSignature => AccessTokenError::Expired,
        ErrorKind::InvalidIssuer => AccessTokenError::WrongIssuer,
        _ => AccessTokenError::Malformed,
    })
}
