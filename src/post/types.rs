use serde::Deserialize;
use validator::Validate;

/// Request payload for POST /posts
#[derive(Debug, Deserialize, Validate)]
pub struct CreatePostRequest {
    #[validate(length(min = 1, message = "title is required"))]
    pub title: String,
    #[validate(length(min = 1, message = "content is required"))]
    pub content: String,
}

/// Request payload for PUT /posts/{id}
#[derive(Debug, Deserialize, Validate)]
pub struct UpdatePostRequest {
    #[validate(length(min = 1, message = "title is required"))]
    pub title: String,
    #[validate(length(min = 1, message = "content is required"))]
    pub content: String,
}
