use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Database model for users table
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, PartialEq)]
pub struct UserModel {
    pub id: i64, // Assigned by storage on insert
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
}

/// A user that has not been stored yet
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
}

impl NewUser {
    pub fn new(email: impl Into<String>, password_hash: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password_hash: password_hash.into(),
        }
    }
}
