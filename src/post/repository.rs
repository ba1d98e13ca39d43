use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, instrument, warn};

use super::models::{NewPost, PostModel};
use crate::shared::AppError;

/// Trait for post repository operations
#[async_trait]
pub trait PostRepository {
    async fn create_post(&self, post: &NewPost) -> Result<PostModel, AppError>;
    async fn find_all_posts(&self) -> Result<Vec<PostModel>, AppError>;
    async fn find_post_by_id(&self, id: i64) -> Result<Option<PostModel>, AppError>;
    async fn find_posts_by_user_id(&self, user_id: i64) -> Result<Vec<PostModel>, AppError>;

    /// Persists title and content; storage refreshes `updated_at`
    async fn update_post(&self, post: &PostModel) -> Result<PostModel, AppError>;
    async fn delete_post(&self, id: i64) -> Result<(), AppError>;

    /// Removes every post owned by `user_id` in one step, returning how many went
    async fn delete_posts_by_user_id(&self, user_id: i64) -> Result<u64, AppError>;
}

#[derive(Default)]
struct PostTable {
    next_id: i64,
    rows: BTreeMap<i64, PostModel>,
}

/// In-memory implementation of PostRepository for development and testing
#[derive(Default)]
pub struct InMemoryPostRepository {
    posts: Mutex<PostTable>,
}

impl InMemoryPostRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn post_count(&self) -> usize {
        self.posts.lock().map(|t| t.rows.len()).unwrap_or(0)
    }

    fn table(&self) -> Result<MutexGuard<'_, PostTable>, AppError> {
        self.posts.lock().map_err(|_| {
            warn!("In-memory post table lock poisoned");
            AppError::Internal
        })
    }
}

#[async_trait]
impl PostRepository for InMemoryPostRepository {
    #[instrument(skip(self, post))]
    async fn create_post(&self, post: &NewPost) -> Result<PostModel, AppError> {
        debug!(user_id = post.user_id, "Creating post in memory");

        let mut table = self.table()?;
        table.next_id += 1;
        let now = Utc::now();
        let stored = PostModel {
            id: table.next_id,
            title: post.title.clone(),
            content: post.content.clone(),
            user_id: post.user_id,
            created_at: now,
            updated_at: now,
        };
        table.rows.insert(stored.id, stored.clone());

        debug!(post_id = stored.id, "Post created successfully in memory");
        Ok(stored)
    }

    #[instrument(skip(self))]
    async fn find_all_posts(&self) -> Result<Vec<PostModel>, AppError> {
        Ok(self.table()?.rows.values().cloned().collect())
    }

    #[instrument(skip(self))]
    async fn find_post_by_id(&self, id: i64) -> Result<Option<PostModel>, AppError> {
        Ok(self.table()?.rows.get(&id).cloned())
    }

    #[instrument(skip(self))]
    async fn find_posts_by_user_id(&self, user_id: i64) -> Result<Vec<PostModel>, AppError> {
        Ok(self
            .table()?
            .rows
            .values()
            .filter(|p| p.user_id == user_id)
            .cloned()
            .collect())
    }

    #[instrument(skip(self, post))]
    async fn update_post(&self, post: &PostModel) -> Result<PostModel, AppError> {
        debug!(post_id = post.id, "Updating post in memory");

        let mut table = self.table()?;
        let stored = table.rows.get_mut(&post.id).ok_or_else(|| {
            warn!(post_id = post.id, "Post not found for update in memory");
            AppError::NotFound("Post not found".to_string())
        })?;

        stored.title = post.title.clone();
        stored.content = post.content.clone();
        stored.updated_at = Utc::now();

        Ok(stored.clone())
    }

    #[instrument(skip(self))]
    async fn delete_post(&self, id: i64) -> Result<(), AppError> {
        debug!(post_id = id, "Deleting post from memory");

        if self.table()?.rows.remove(&id).is_none() {
            warn!(post_id = id, "Post not found for deletion in memory");
            return Err(AppError::NotFound("Post not found".to_string()));
        }
        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete_posts_by_user_id(&self, user_id: i64) -> Result<u64, AppError> {
        let mut table = self.table()?;
        let before = table.rows.len();
        table.rows.retain(|_, post| post.user_id != user_id);

        let removed = (before - table.rows.len()) as u64;
        debug!(user_id, removed, "Deleted user's posts from memory");
        Ok(removed)
    }
}

fn db_error(e: sqlx::Error) -> AppError {
    warn!(error = %e, "Post query failed");
    AppError::DatabaseError(e.to_string())
}

const POST_COLUMNS: &str = "id, title, content, user_id, created_at, updated_at";

/// PostgreSQL implementation of post repository
pub struct PostgresPostRepository {
    pool: PgPool,
}

impl PostgresPostRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PostRepository for PostgresPostRepository {
    #[instrument(skip(self, post))]
    async fn create_post(&self, post: &NewPost) -> Result<PostModel, AppError> {
        debug!(user_id = post.user_id, "Creating post in database");

        sqlx::query_as::<_, PostModel>(&format!(
            "INSERT INTO posts (title, content, user_id) VALUES ($1, $2, $3) RETURNING {}",
            POST_COLUMNS
        ))
        .bind(&post.title)
        .bind(&post.content)
        .bind(post.user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error)
    }

    #[instrument(skip(self))]
    async fn find_all_posts(&self) -> Result<Vec<PostModel>, AppError> {
        sqlx::query_as::<_, PostModel>(&format!(
            "SELECT {} FROM posts ORDER BY id",
            POST_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)
    }

    #[instrument(skip(self))]
    async fn find_post_by_id(&self, id: i64) -> Result<Option<PostModel>, AppError> {
        sqlx::query_as::<_, PostModel>(&format!(
            "SELECT {} FROM posts WHERE id = $1",
            POST_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)
    }

    #[instrument(skip(self))]
    async fn find_posts_by_user_id(&self, user_id: i64) -> Result<Vec<PostModel>, AppError> {
        sqlx::query_as::<_, PostModel>(&format!(
            "SELECT {} FROM posts WHERE user_id = $1 ORDER BY id",
            POST_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)
    }

    #[instrument(skip(self, post))]
    async fn update_post(&self, post: &PostModel) -> Result<PostModel, AppError> {
        debug!(post_id = post.id, "Updating post in database");

        sqlx::query_as::<_, PostModel>(&format!(
            "UPDATE posts SET title = $2, content = $3, updated_at = NOW() WHERE id = $1 RETURNING {}",
            POST_COLUMNS
        ))
        .bind(post.id)
        .bind(&post.title)
        .bind(&post.content)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?
        .ok_or_else(|| {
            warn!(post_id = post.id, "Post not found for update");
            AppError::NotFound("Post not found".to_string())
        })
    }

    #[instrument(skip(self))]
    async fn delete_post(&self, id: i64) -> Result<(), AppError> {
        debug!(post_id = id, "Deleting post from database");

        let result = sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_error)?;

        if result.rows_affected() == 0 {
            warn!(post_id = id, "Post not found for deletion");
            return Err(AppError::NotFound("Post not found".to_string()));
        }
        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete_posts_by_user_id(&self, user_id: i64) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM posts WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(db_error)?;

        debug!(user_id, removed = result.rows_affected(), "Deleted user's posts");
        Ok(result.rows_affected())
    }
}
