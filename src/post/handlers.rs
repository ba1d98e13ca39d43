use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{info, instrument};

use super::{models::PostModel, service::PostService};
use crate::auth::Claims;
use crate::shared::{AppError, AppState};
use crate::validation::{self, PathId};

fn post_service(state: &AppState) -> PostService {
    PostService::new(
        Arc::clone(&state.post_repository),
        Arc::clone(&state.user_repository),
    )
}

/// HTTP handler for creating a post owned by the signed-in user
///
/// POST /posts
#[instrument(name = "create_post", skip(state, claims, body), fields(user_id = claims.user_id))]
pub async fn create_post(
    State(state): State<AppState>,
    claims: Claims,
    body: Bytes,
) -> Result<(StatusCode, Json<PostModel>), AppError> {
    let request = validation::create_post_request(&body)?;
    let post = post_service(&state).create(&claims, request).await?;

    info!(post_id = post.id, "Post created");
    Ok((StatusCode::CREATED, Json(post)))
}

/// GET /posts
#[instrument(name = "find_all_posts", skip(state))]
pub async fn find_all_posts(
    State(state): State<AppState>,
) -> Result<Json<Vec<PostModel>>, AppError> {
    let posts = post_service(&state).list_all().await?;
    Ok(Json(posts))
}

/// GET /posts/{id}
#[instrument(name = "find_one_post", skip(state, _claims))]
pub async fn find_one_post(
    State(state): State<AppState>,
    _claims: Claims,
    PathId(id): PathId,
) -> Result<Json<PostModel>, AppError> {
    let post = post_service(&state).get(id).await?;
    Ok(Json(post))
}

/// PUT /posts/{id}
///
/// Only the owner may update; others get 403 and the post is left untouched
#[instrument(name = "update_post", skip(state, claims, body), fields(user_id = claims.user_id))]
pub async fn update_post(
    State(state): State<AppState>,
    claims: Claims,
    PathId(id): PathId,
    body: Bytes,
) -> Result<Json<PostModel>, AppError> {
    let request = validation::update_post_request(&body)?;
    let post = post_service(&state).update(&claims, id, request).await?;
    Ok(Json(post))
}

/// DELETE /posts/{id}
#[instrument(name = "delete_post", skip(state, claims), fields(user_id = claims.user_id))]
pub async fn delete_post(
    State(state): State<AppState>,
    claims: Claims,
    PathId(id): PathId,
) -> Result<Json<Value>, AppError> {
    post_service(&state).delete(&claims, id).await?;
    Ok(Json(json!({ "message": "Post deleted" })))
}
