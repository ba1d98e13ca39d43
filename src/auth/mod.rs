// Public API - what other modules can use
pub use handlers::{sign_in, sign_up};
pub use middleware::{is_public_route, jwt_auth};
pub use token::{AuthError, TokenService, DEFAULT_TOKEN_TTL_HOURS, MAX_TOKEN_TTL_HOURS};
pub use types::Claims;

mod handlers;
mod middleware;
pub mod password;
pub mod service;
mod token;
pub mod types;
