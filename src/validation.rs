//! Decode-and-validate functions, one per request body shape.
//!
//! Handlers take the raw body so that malformed JSON, missing fields and
//! failed field rules all surface as the same 400 `AppError::Validation`.

use async_trait::async_trait;
use axum::{
    extract::{FromRequestParts, Path},
    http::request::Parts,
};
use validator::Validate;

use crate::auth::types::{SignInRequest, SignUpRequest};
use crate::post::types::{CreatePostRequest, UpdatePostRequest};
use crate::shared::AppError;
use crate::user::types::UpdateUserRequest;

pub fn sign_up_request(body: &[u8]) -> Result<SignUpRequest, AppError> {
    let payload: SignUpRequest = serde_json::from_slice(body)?;
    payload.validate()?;
    Ok(payload)
}

pub fn sign_in_request(body: &[u8]) -> Result<SignInRequest, AppError> {
    let payload: SignInRequest = serde_json::from_slice(body)?;
    payload.validate()?;
    Ok(payload)
}

pub fn update_user_request(body: &[u8]) -> Result<UpdateUserRequest, AppError> {
    let payload: UpdateUserRequest = serde_json::from_slice(body)?;
    payload.validate()?;
    Ok(payload)
}

pub fn create_post_request(body: &[u8]) -> Result<CreatePostRequest, AppError> {
    let payload: CreatePostRequest = serde_json::from_slice(body)?;
    payload.validate()?;
    Ok(payload)
}

pub fn update_post_request(body: &[u8]) -> Result<UpdatePostRequest, AppError> {
    let payload: UpdatePostRequest = serde_json::from_slice(body)?;
    payload.validate()?;
    Ok(payload)
}

/// Parses a numeric path id
pub fn parse_id(raw: &str) -> Result<i64, AppError> {
    raw.parse()
        .map_err(|_| AppError::Validation(format!("Invalid id: {}", raw)))
}

/// Numeric `:id` path segment; undecodable or non-numeric ids are a 400 `AppError`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PathId(pub i64);

#[async_trait]
impl<S> FromRequestParts<S> for PathId
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| AppError::Validation(rejection.body_text()))?;
        parse_id(&raw).map(PathId)
    }
}
