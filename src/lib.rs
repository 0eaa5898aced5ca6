pub mod auth;
pub mod configuration;
pub mod error;
pub mod middleware;
pub mod session;
pub mod store;
pub mod telemetry;

pub use error::AuthError;
pub use session::{AuthService, Session};
