use async_trait::async_trait;
use axum::{
    extract::{FromRequestParts, Query},
    http::request::Parts,
};
use serde::Deserialize;
use tracing::debug;

use crate::shared::AppError;

pub const DEFAULT_OFFSET: i64 = 0;
pub const DEFAULT_LIMIT: i64 = 10;

/// Raw `offset`/`limit` query parameters, parsed by [`Pagination::try_from`]
#[derive(Debug, Default, Deserialize)]
pub struct PaginationParams {
    pub offset: Option<String>,
    pub limit: Option<String>,
}

/// Row offset and page size for list endpoints
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub offset: i64,
    pub limit: i64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            offset: DEFAULT_OFFSET,
            limit: DEFAULT_LIMIT,
        }
    }
}

fn parse_param(name: &str, value: Option<&str>, default: i64) -> Result<i64, AppError> {
    let value = match value {
        None | Some("") => return Ok(default),
        Some(value) => value,
    };

    let parsed: i64 = value
        .parse()
        .map_err(|_| AppError::Validation(format!("{} must be an integer", name)))?;
    if parsed < 0 {
        return Err(AppError::Validation(format!("{} must not be negative", name)));
    }
    Ok(parsed)
}

impl TryFrom<PaginationParams> for Pagination {
    type Error = AppError;

    fn try_from(params: PaginationParams) -> Result<Self, Self::Error> {
        Ok(Self {
            offset: parse_param("offset", params.offset.as_deref(), DEFAULT_OFFSET)?,
            limit: parse_param("limit", params.limit.as_deref(), DEFAULT_LIMIT)?,
        })
    }
}

/// Reads `offset`/`limit` from the query string; every rejection is a 400 `AppError`
#[async_trait]
impl<S> FromRequestParts<S> for Pagination
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(params) = Query::<PaginationParams>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| {
                debug!(error = %rejection.body_text(), "Rejected pagination query");
                AppError::Validation(rejection.body_text())
            })?;
        Pagination::try_from(params)
    }
}
