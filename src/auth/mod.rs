/// Authentication module
///
/// Handles credential extraction, password hashing, access token
/// issuance/validation, and refresh token management.
mod claims;
mod credentials;
mod jwt;
mod password;
mod refresh_token;

pub use claims::{Claims, ACCESS_TOKEN_ISSUER};
pub use credentials::{api_key_matches, bearer_token, extract_credential, Scheme};
pub use jwt::{issue_access_token, issue_access_token_at, validate_access_token};
pub use password::{hash_password, hash_password_with_cost, verify_password, DEFAULT_COST};
pub use refresh_token::{
    default_refresh_token_ttl, exchange_refresh_token, exchange_refresh_token_at,
    generate_refresh_token, issue_refresh_token, issue_refresh_token_at, revoke_all_user_tokens,
    revoke_refresh_token, revoke_refresh_token_at, RefreshToken, REFRESH_TOKEN_BYTES,
};
