use axum::{
    middleware,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};

use crate::{auth, post as posts, shared::AppState, user};

/// GET /
pub async fn home() -> Json<Value> {
    Json(json!({
        "message": "Welcome to the API",
        "status": true
    }))
}

/// Builds the full route table behind the authentication layer
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/signup", post(auth::sign_up))
        .route("/signin", post(auth::sign_in))
        .route("/users", get(user::find_all_users))
        .route("/users/list", get(user::list_users))
        .route("/users/me", get(user::me))
        .route(
            "/users/:id",
            get(user::find_one_user)
                .put(user::update_user)
                .delete(user::delete_user),
        )
        .route(
            "/posts",
            get(posts::find_all_posts).post(posts::create_post),
        )
        .route(
            "/posts/:id",
            get(posts::find_one_post)
                .put(posts::update_post)
                .delete(posts::delete_post),
        )
        .layer(middleware::from_fn_with_state(state.clone(), auth::jwt_auth))
        .with_state(state)
}
