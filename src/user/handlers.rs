use axum::{
    body::Bytes,
    extract::State,
    Json,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{info, instrument};

use super::{service::UserService, types::UserResponse};
use crate::auth::Claims;
use crate::pagination::Pagination;
use crate::shared::{AppError, AppState};
use crate::validation::{self, PathId};

fn user_service(state: &AppState) -> UserService {
    UserService::new(
        Arc::clone(&state.user_repository),
        Arc::clone(&state.post_repository),
    )
}

/// GET /users
#[instrument(name = "find_all_users", skip(state))]
pub async fn find_all_users(
    State(state): State<AppState>,
) -> Result<Json<Vec<UserResponse>>, AppError> {
    let users = user_service(&state).list_all().await?;
    info!(user_count = users.len(), "Users listed");
    Ok(Json(users))
}

/// GET /users/list?offset=&limit=
#[instrument(name = "list_users", skip(state, _claims))]
pub async fn list_users(
    State(state): State<AppState>,
    _claims: Claims,
    page: Pagination,
) -> Result<Json<Vec<UserResponse>>, AppError> {
    let users = user_service(&state).list_page(page).await?;
    Ok(Json(users))
}

/// GET /users/me
///
/// Returns the signed-in user together with their posts
#[instrument(name = "me", skip(state, claims), fields(user_id = claims.user_id))]
pub async fn me(
    State(state): State<AppState>,
    claims: Claims,
) -> Result<Json<UserResponse>, AppError> {
    let user = user_service(&state).get_with_posts(claims.user_id).await?;
    Ok(Json(user))
}

/// GET /users/{id}
#[instrument(name = "find_one_user", skip(state, _claims))]
pub async fn find_one_user(
    State(state): State<AppState>,
    _claims: Claims,
    PathId(id): PathId,
) -> Result<Json<UserResponse>, AppError> {
    let user = user_service(&state).get_with_posts(id).await?;
    Ok(Json(user))
}

/// PUT /users/{id}
///
/// Changes the email of the signed-in user's own account
#[instrument(name = "update_user", skip(state, claims, body), fields(user_id = claims.user_id))]
pub async fn update_user(
    State(state): State<AppState>,
    claims: Claims,
    PathId(id): PathId,
    body: Bytes,
) -> Result<Json<UserResponse>, AppError> {
    let request = validation::update_user_request(&body)?;
    let user = user_service(&state)
        .update_email(&claims, id, request)
        .await?;
    Ok(Json(user))
}

/// DELETE /users/{id}
#[instrument(name = "delete_user", skip(state, claims), fields(user_id = claims.user_id))]
pub async fn delete_user(
    State(state): State<AppState>,
    claims: Claims,
    PathId(id): PathId,
) -> Result<Json<Value>, AppError> {
    user_service(&state).delete(&claims, id).await?;
    Ok(Json(json!({ "message": "User deleted" })))
}
