//! Authorization Header Parsing
//!
//! Pulls a bearer token or API key out of an `Authorization` header value.
//! The header must be exactly `<Scheme> <value>`: one space, case-sensitive
//! scheme, non-empty value.

use sha2::{Digest, Sha256};

use crate::error::CredentialError;

/// Credential schemes accepted in the `Authorization` header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scheme {
    Bearer,
    ApiKey,
}

impl Scheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Scheme::Bearer => "Bearer",
            Scheme::ApiKey => "ApiKey",
        }
    }
}

/// Extract the credential value for `expected` from a raw header value
///
/// # Errors
/// - `MissingHeader` if the header is absent or empty
/// - `MalformedHeader` if the scheme does not match exactly, the value is
///   empty, or the value itself contains another space
pub fn extract_credential(
    header: Option<&str>,
    expected: Scheme,
) -> Result<&str, CredentialError> {
    let header = match header {
        Some(h) if !h.is_empty() => h,
        _ => return Err(CredentialError::MissingHeader),
    };

    let (scheme, value) = header
        .split_once(' ')
        .ok_or(CredentialError::MalformedHeader)?;

    if scheme != expected.as_str() || value.is_empty() || value.contains(' ') {
        return Err(CredentialError::MalformedHeader);
    }

    Ok(value)
}

/// Shorthand for `extract_credential(header, Scheme::Bearer)`
pub fn bearer_token(header: Option<&str>) -> Result<&str, CredentialError> {
    extract_credential(header, Scheme::Bearer)
}

/// Compare a presented API key against the configured one
///
/// Both sides are reduced to SHA-256 digests first so the comparison always
/// runs over 32 bytes regardless of input length.
pub fn api_key_matches(presented: &str, expected: &str) -> bool {
    let presented = Sha256::digest(presented.as_bytes());
    let expected = Sha256::digest(expected.as_bytes());

    presented
        .iter()
        .zip(expected.iter())
        .fold(0u8, |acc, (a, b)| acc | (a ^ b))
        == 0
}
