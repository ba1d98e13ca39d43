use axum::{body::Bytes, extract::State, Json};
use chrono::Utc;
use std::sync::Arc;
use tracing::{info, instrument};

use super::{
    service::AuthService,
    types::{SignInResponse, SignUpResponse},
};
use crate::shared::{AppError, AppState};
use crate::validation;

fn auth_service(state: &AppState) -> AuthService {
    AuthService::new(
        Arc::clone(&state.user_repository),
        Arc::clone(&state.password_hasher),
        state.token_service.clone(),
    )
}

/// HTTP handler for registering an account
///
/// POST /signup
/// Returns the new user's id and email
#[instrument(name = "sign_up", skip(state, body))]
pub async fn sign_up(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<SignUpResponse>, AppError> {
    let request = validation::sign_up_request(&body)?;
    let response = auth_service(&state).sign_up(request).await?;

    info!(user_id = response.id, "Account registered");
    Ok(Json(response))
}

/// HTTP handler for signing in
///
/// POST /signin
/// Returns a JWT valid for the configured lifetime
#[instrument(name = "sign_in", skip(state, body))]
pub async fn sign_in(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<SignInResponse>, AppError> {
    let request = validation::sign_in_request(&body)?;
    let response = auth_service(&state).sign_in(request, Utc::now()).await?;

    Ok(Json(response))
}
