use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Database model for posts table
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, PartialEq)]
pub struct PostModel {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub user_id: i64, // Owning user; the users table is the authority
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PostModel {
    pub fn is_owned_by(&self, user_id: i64) -> bool {
        self.user_id == user_id
    }
}

/// A post that has not been stored yet
#[derive(Debug, Clone)]
pub struct NewPost {
    pub title: String,
    pub content: String,
    pub user_id: i64,
}
