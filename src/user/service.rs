use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use super::{repository::UserRepository, types::UpdateUserRequest, types::UserResponse};
use crate::auth::Claims;
use crate::pagination::Pagination;
use crate::post::repository::PostRepository;
use crate::shared::AppError;

/// Accounts are only modified by their owner
fn ensure_self(claims: &Claims, user_id: i64) -> Result<(), AppError> {
    if claims.user_id == user_id {
        Ok(())
    } else {
        warn!(
            target_user = user_id,
            user_id = claims.user_id,
            "Rejected account change by another user"
        );
        Err(AppError::Forbidden("Forbidden".to_string()))
    }
}

/// Service for handling user business logic
pub struct UserService {
    users: Arc<dyn UserRepository + Send + Sync>,
    posts: Arc<dyn PostRepository + Send + Sync>,
}

impl UserService {
    pub fn new(
        users: Arc<dyn UserRepository + Send + Sync>,
        posts: Arc<dyn PostRepository + Send + Sync>,
    ) -> Self {
        Self { users, posts }
    }

    #[instrument(skip(self))]
    pub async fn list_all(&self) -> Result<Vec<UserResponse>, AppError> {
        let users = self.users.find_all_users().await?;
        debug!(user_count = users.len(), "Users retrieved");
        Ok(users.into_iter().map(UserResponse::from).collect())
    }

    #[instrument(skip(self))]
    pub async fn list_page(&self, page: Pagination) -> Result<Vec<UserResponse>, AppError> {
        let users = self.users.list_users(page.offset, page.limit).await?;
        Ok(users.into_iter().map(UserResponse::from).collect())
    }

    /// Loads a user and joins in the posts they own
    #[instrument(skip(self))]
    pub async fn get_with_posts(&self, id: i64) -> Result<UserResponse, AppError> {
        let user = self
            .users
            .find_user_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
        let posts = self.posts.find_posts_by_user_id(id).await?;

        debug!(user_id = id, post_count = posts.len(), "User loaded with posts");
        Ok(UserResponse::with_posts(user, posts))
    }

    #[instrument(skip(self, claims, request), fields(user_id = claims.user_id))]
    pub async fn update_email(
        &self,
        claims: &Claims,
        id: i64,
        request: UpdateUserRequest,
    ) -> Result<UserResponse, AppError> {
        ensure_self(claims, id)?;

        let mut user = self
            .users
            .find_user_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
        user.email = request.email;
        let updated = self.users.update_user(&user).await?;

        info!(user_id = id, "User email updated");
        Ok(updated.into())
    }

    /// Removes the user, then sweeps their posts
    #[instrument(skip(self, claims), fields(user_id = claims.user_id))]
    pub async fn delete(&self, claims: &Claims, id: i64) -> Result<(), AppError> {
        ensure_self(claims, id)?;

        // User first: post creation rejects owners that no longer resolve
        self.users.delete_user(id).await?;
        let removed = self.posts.delete_posts_by_user_id(id).await?;

        info!(user_id = id, removed_posts = removed, "User deleted");
        Ok(())
    }
}
