/// Middleware module
///
/// Request authentication for actix-web services.

mod bearer_auth;

pub use bearer_auth::{AuthenticatedUser, BearerAuth};
