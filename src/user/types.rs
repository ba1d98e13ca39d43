use serde::{Deserialize, Serialize};
use validator::Validate;

use super::models::UserModel;
use crate::post::models::PostModel;

/// Request payload for PUT /users/{id}
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateUserRequest {
    #[validate(email(message = "email must be a valid address"))]
    pub email: String,
}

/// Public view of a user; `posts` is only present on single-user lookups
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct UserResponse {
    pub id: i64,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub posts: Option<Vec<PostModel>>,
}

impl UserResponse {
    pub fn with_posts(user: UserModel, posts: Vec<PostModel>) -> Self {
        Self {
            id: user.id,
            email: user.email,
            posts: Some(posts),
        }
    }
}

impl From<UserModel> for UserResponse {
    fn from(user: UserModel) -> Self {
        Self {
            id: user.id,
            email: user.email,
            posts: None,
        }
    }
}
