use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info};

use crate::auth::{
    password::{BcryptHasher, PasswordHasher},
    AuthError, TokenService,
};
use crate::post::repository::PostRepository;
use crate::user::repository::UserRepository;

/// Shared application state containing all dependencies.
///
/// Built once by [`AppStateBuilder`] before the listener starts and never
/// mutated afterwards; every request gets a cheap clone.
#[derive(Clone)]
pub struct AppState {
    pub user_repository: Arc<dyn UserRepository + Send + Sync>,
    pub post_repository: Arc<dyn PostRepository + Send + Sync>,
    pub token_service: TokenService,
    pub password_hasher: Arc<dyn PasswordHasher>,
}

impl AppState {
    pub fn builder() -> AppStateBuilder {
        AppStateBuilder::new()
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum BindingError {
    #[error("{0} is already bound")]
    AlreadyBound(&'static str),

    #[error("{0} was never bound")]
    Unbound(&'static str),
}

/// Binds each capability to exactly one implementation
#[derive(Default)]
pub struct AppStateBuilder {
    user_repository: Option<Arc<dyn UserRepository + Send + Sync>>,
    post_repository: Option<Arc<dyn PostRepository + Send + Sync>>,
    token_service: Option<TokenService>,
    password_hasher: Option<Arc<dyn PasswordHasher>>,
}

fn bind_once<T>(slot: &mut Option<T>, value: T, name: &'static str) -> Result<(), BindingError> {
    if slot.is_some() {
        return Err(BindingError::AlreadyBound(name));
    }
    *slot = Some(value);
    Ok(())
}

impl AppStateBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind_user_repository(
        mut self,
        repo: Arc<dyn UserRepository + Send + Sync>,
    ) -> Result<Self, BindingError> {
        bind_once(&mut self.user_repository, repo, "user repository")?;
        Ok(self)
    }

    pub fn bind_post_repository(
        mut self,
        repo: Arc<dyn PostRepository + Send + Sync>,
    ) -> Result<Self, BindingError> {
        bind_once(&mut self.post_repository, repo, "post repository")?;
        Ok(self)
    }

    pub fn bind_token_service(mut self, service: TokenService) -> Result<Self, BindingError> {
        bind_once(&mut self.token_service, service, "token service")?;
        Ok(self)
    }

    pub fn bind_password_hasher(
        mut self,
        hasher: Arc<dyn PasswordHasher>,
    ) -> Result<Self, BindingError> {
        bind_once(&mut self.password_hasher, hasher, "password hasher")?;
        Ok(self)
    }

    /// Fails unless both repositories and the token service are bound.
    /// The password hasher falls back to bcrypt at its default cost.
    pub fn build(self) -> Result<AppState, BindingError> {
        let state = AppState {
            user_repository: self
                .user_repository
                .ok_or(BindingError::Unbound("user repository"))?,
            post_repository: self
                .post_repository
                .ok_or(BindingError::Unbound("post repository"))?,
            token_service: self
                .token_service
                .ok_or(BindingError::Unbound("token service"))?,
            password_hasher: self
                .password_hasher
                .unwrap_or_else(|| Arc::new(BcryptHasher::default())),
        };

        info!("Application state bound");
        Ok(state)
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Internal server error")]
    Internal,
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError::Validation(errors.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(error: serde_json::Error) -> Self {
        AppError::Validation(format!("Invalid request body: {}", error))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Auth(e) => (StatusCode::UNAUTHORIZED, e.to_string()),
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            AppError::DatabaseError(msg) => {
                error!(error = %msg, "Storage failure reached the handler boundary");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Database error".to_string(),
                )
            }
            AppError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        };

        let body = Json(json!({
            "error": error_message
        }));

        (status, body).into_response()
    }
}
