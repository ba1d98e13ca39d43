// Library crate for the blog API server
// This file exposes the public API for the binary and integration tests

pub mod auth;
pub mod config;
pub mod pagination;
pub mod post;
pub mod router;
pub mod shared;
pub mod user;
pub mod validation;

// Re-export commonly used types for easier access in tests
pub use auth::{password::BcryptHasher, AuthError, Claims, TokenService};
pub use config::{Config, ConfigError, StorageBackend};
pub use post::repository::{InMemoryPostRepository, PostRepository, PostgresPostRepository};
pub use router::build_router;
pub use shared::{AppError, AppState, AppStateBuilder, BindingError};
pub use user::repository::{InMemoryUserRepository, PostgresUserRepository, UserRepository};
