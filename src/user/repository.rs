use async_trait::async_trait;
use sqlx::PgPool;
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, instrument, warn};

use super::models::{NewUser, UserModel};
use crate::shared::AppError;

/// Trait for user repository operations
#[async_trait]
pub trait UserRepository {
    async fn create_user(&self, user: &NewUser) -> Result<UserModel, AppError>;
    async fn find_all_users(&self) -> Result<Vec<UserModel>, AppError>;
    async fn list_users(&self, offset: i64, limit: i64) -> Result<Vec<UserModel>, AppError>;
    async fn find_user_by_id(&self, id: i64) -> Result<Option<UserModel>, AppError>;
    async fn find_user_by_email(&self, email: &str) -> Result<Option<UserModel>, AppError>;
    async fn update_user(&self, user: &UserModel) -> Result<UserModel, AppError>;
    async fn delete_user(&self, id: i64) -> Result<(), AppError>;
}

#[derive(Default)]
struct UserTable {
    next_id: i64,
    rows: BTreeMap<i64, UserModel>,
}

impl UserTable {
    fn email_taken(&self, email: &str, except_id: Option<i64>) -> bool {
        self.rows
            .values()
            .any(|u| u.email == email && Some(u.id) != except_id)
    }
}

/// In-memory implementation of UserRepository for development and testing
///
/// Ids are assigned sequentially from 1 and rows are kept in id order, so
/// listing and paging behave like the SQL implementation.
#[derive(Default)]
pub struct InMemoryUserRepository {
    users: Mutex<UserTable>,
}

impl InMemoryUserRepository {
    /// Creates a new empty in-memory repository
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the current number of stored users
    pub fn user_count(&self) -> usize {
        self.users.lock().map(|t| t.rows.len()).unwrap_or(0)
    }

    fn table(&self) -> Result<MutexGuard<'_, UserTable>, AppError> {
        self.users.lock().map_err(|_| {
            warn!("In-memory user table lock poisoned");
            AppError::Internal
        })
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    #[instrument(skip(self, user))]
    async fn create_user(&self, user: &NewUser) -> Result<UserModel, AppError> {
        debug!(email = %user.email, "Creating user in memory");

        let mut table = self.table()?;
        if table.email_taken(&user.email, None) {
            warn!(email = %user.email, "Email already exists in memory");
            return Err(AppError::Conflict("Email already exists".to_string()));
        }

        table.next_id += 1;
        let stored = UserModel {
            id: table.next_id,
            email: user.email.clone(),
            password_hash: user.password_hash.clone(),
        };
        table.rows.insert(stored.id, stored.clone());

        debug!(user_id = stored.id, "User created successfully in memory");
        Ok(stored)
    }

    #[instrument(skip(self))]
    async fn find_all_users(&self) -> Result<Vec<UserModel>, AppError> {
        Ok(self.table()?.rows.values().cloned().collect())
    }

    #[instrument(skip(self))]
    async fn list_users(&self, offset: i64, limit: i64) -> Result<Vec<UserModel>, AppError> {
        let offset = usize::try_from(offset).unwrap_or(0);
        let limit = usize::try_from(limit).unwrap_or(0);

        Ok(self
            .table()?
            .rows
            .values()
            .skip(offset)
            .take(limit)
            .cloned()
            .collect())
    }

    #[instrument(skip(self))]
    async fn find_user_by_id(&self, id: i64) -> Result<Option<UserModel>, AppError> {
        let user = self.table()?.rows.get(&id).cloned();
        if user.is_none() {
            debug!(user_id = id, "User not found in memory");
        }
        Ok(user)
    }

    #[instrument(skip(self))]
    async fn find_user_by_email(&self, email: &str) -> Result<Option<UserModel>, AppError> {
        Ok(self
            .table()?
            .rows
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    #[instrument(skip(self, user))]
    async fn update_user(&self, user: &UserModel) -> Result<UserModel, AppError> {
        debug!(user_id = user.id, "Updating user in memory");

        let mut table = self.table()?;
        if !table.rows.contains_key(&user.id) {
            warn!(user_id = user.id, "User not found for update in memory");
            return Err(AppError::NotFound("User not found".to_string()));
        }
        if table.email_taken(&user.email, Some(user.id)) {
            return Err(AppError::Conflict("Email already exists".to_string()));
        }
        table.rows.insert(user.id, user.clone());

        Ok(user.clone())
    }

    #[instrument(skip(self))]
    async fn delete_user(&self, id: i64) -> Result<(), AppError> {
        debug!(user_id = id, "Deleting user from memory");

        if self.table()?.rows.remove(&id).is_none() {
            warn!(user_id = id, "User not found for deletion in memory");
            return Err(AppError::NotFound("User not found".to_string()));
        }
        Ok(())
    }
}

/// Maps a failed write, turning a duplicate email into a conflict
fn write_error(e: sqlx::Error) -> AppError {
    let duplicate = e
        .as_database_error()
        .map(|db| db.is_unique_violation())
        .unwrap_or(false);

    if duplicate {
        warn!("Email already exists in database");
        AppError::Conflict("Email already exists".to_string())
    } else {
        warn!(error = %e, "Failed to write user to database");
        AppError::DatabaseError(e.to_string())
    }
}

fn read_error(e: sqlx::Error) -> AppError {
    warn!(error = %e, "Failed to read users from database");
    AppError::DatabaseError(e.to_string())
}

/// PostgreSQL implementation of user repository
pub struct PostgresUserRepository {
    pool: PgPool,
}

impl PostgresUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    #[instrument(skip(self, user))]
    async fn create_user(&self, user: &NewUser) -> Result<UserModel, AppError> {
        debug!(email = %user.email, "Creating user in database");

        sqlx::query_as::<_, UserModel>(
            "INSERT INTO users (email, password_hash) VALUES ($1, $2) RETURNING id, email, password_hash",
        )
        .bind(&user.email)
        .bind(&user.password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(write_error)
    }

    #[instrument(skip(self))]
    async fn find_all_users(&self) -> Result<Vec<UserModel>, AppError> {
        sqlx::query_as::<_, UserModel>("SELECT id, email, password_hash FROM users ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .map_err(read_error)
    }

    #[instrument(skip(self))]
    async fn list_users(&self, offset: i64, limit: i64) -> Result<Vec<UserModel>, AppError> {
        sqlx::query_as::<_, UserModel>(
            "SELECT id, email, password_hash FROM users ORDER BY id OFFSET $1 LIMIT $2",
        )
        .bind(offset)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(read_error)
    }

    #[instrument(skip(self))]
    async fn find_user_by_id(&self, id: i64) -> Result<Option<UserModel>, AppError> {
        sqlx::query_as::<_, UserModel>("SELECT id, email, password_hash FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(read_error)
    }

    #[instrument(skip(self))]
    async fn find_user_by_email(&self, email: &str) -> Result<Option<UserModel>, AppError> {
        sqlx::query_as::<_, UserModel>(
            "SELECT id, email, password_hash FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(read_error)
    }

    #[instrument(skip(self, user))]
    async fn update_user(&self, user: &UserModel) -> Result<UserModel, AppError> {
        debug!(user_id = user.id, "Updating user in database");

        sqlx::query_as::<_, UserModel>(
            "UPDATE users SET email = $2, password_hash = $3 WHERE id = $1 RETURNING id, email, password_hash",
        )
        .bind(user.id)
        .bind(&user.email)
        .bind(&user.password_hash)
        .fetch_optional(&self.pool)
        .await
        .map_err(write_error)?
        .ok_or_else(|| {
            warn!(user_id = user.id, "User not found for update");
            AppError::NotFound("User not found".to_string())
        })
    }

    #[instrument(skip(self))]
    async fn delete_user(&self, id: i64) -> Result<(), AppError> {
        debug!(user_id = id, "Deleting user from database");

        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                warn!(error = %e, user_id = id, "Failed to delete user from database");
                AppError::DatabaseError(e.to_string())
            })?;

        if result.rows_affected() == 0 {
            warn!(user_id = id, "User not found for deletion");
            return Err(AppError::NotFound("User not found".to_string()));
        }
        Ok(())
    }
}
