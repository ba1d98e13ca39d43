use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use super::{
    models::{NewPost, PostModel},
    repository::PostRepository,
    types::{CreatePostRequest, UpdatePostRequest},
};
use crate::auth::Claims;
use crate::shared::AppError;
use crate::user::repository::UserRepository;

/// Only the owning user may mutate or delete a post
pub fn ensure_owner(claims: &Claims, post: &PostModel) -> Result<(), AppError> {
    if post.is_owned_by(claims.user_id) {
        Ok(())
    } else {
        warn!(
            post_id = post.id,
            owner_id = post.user_id,
            user_id = claims.user_id,
            "Rejected post mutation by non-owner"
        );
        Err(AppError::Forbidden("Forbidden".to_string()))
    }
}

/// Service for handling post business logic
pub struct PostService {
    posts: Arc<dyn PostRepository + Send + Sync>,
    users: Arc<dyn UserRepository + Send + Sync>,
}

impl PostService {
    pub fn new(
        posts: Arc<dyn PostRepository + Send + Sync>,
        users: Arc<dyn UserRepository + Send + Sync>,
    ) -> Self {
        Self { posts, users }
    }

    #[instrument(skip(self, claims, request), fields(user_id = claims.user_id))]
    pub async fn create(
        &self,
        claims: &Claims,
        request: CreatePostRequest,
    ) -> Result<PostModel, AppError> {
        // The token may outlive the account it was issued for
        let user = self
            .users
            .find_user_by_id(claims.user_id)
            .await?
            .ok_or_else(|| {
                warn!(user_id = claims.user_id, "Token refers to a deleted user");
                AppError::Unauthorized("User no longer exists".to_string())
            })?;

        let post = self
            .posts
            .create_post(&NewPost {
                title: request.title,
                content: request.content,
                user_id: user.id,
            })
            .await?;

        info!(post_id = post.id, "Post created successfully");
        Ok(post)
    }

    #[instrument(skip(self))]
    pub async fn list_all(&self) -> Result<Vec<PostModel>, AppError> {
        let posts = self.posts.find_all_posts().await?;
        debug!(post_count = posts.len(), "Posts retrieved");
        Ok(posts)
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: i64) -> Result<PostModel, AppError> {
        self.posts
            .find_post_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Post not found".to_string()))
    }

    #[instrument(skip(self, claims, request), fields(user_id = claims.user_id))]
    pub async fn update(
        &self,
        claims: &Claims,
        id: i64,
        request: UpdatePostRequest,
    ) -> Result<PostModel, AppError> {
        let mut post = self.get(id).await?;
        ensure_owner(claims, &post)?;

        post.title = request.title;
        post.content = request.content;
        let updated = self.posts.update_post(&post).await?;

        info!(post_id = id, "Post updated successfully");
        Ok(updated)
    }

    #[instrument(skip(self, claims), fields(user_id = claims.user_id))]
    pub async fn delete(&self, claims: &Claims, id: i64) -> Result<(), AppError> {
        let post = self.get(id).await?;
        ensure_owner(claims, &post)?;

        self.posts.delete_post(post.id).await?;

        info!(post_id = id, "Post deleted successfully");
        Ok(())
    }
}
