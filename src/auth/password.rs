use tracing::warn;

use crate::shared::AppError;

/// Hashes and verifies account passwords
pub trait PasswordHasher: Send + Sync {
    fn hash(&self, password: &str) -> Result<String, AppError>;

    /// Returns false for a wrong password and for an unreadable digest
    fn verify(&self, password: &str, digest: &str) -> bool;
}

/// bcrypt-backed password hasher
#[derive(Debug, Clone, Copy)]
pub struct BcryptHasher {
    cost: u32,
}

impl Default for BcryptHasher {
    fn default() -> Self {
        Self {
            cost: bcrypt::DEFAULT_COST,
        }
    }
}

impl BcryptHasher {
    /// Lower costs are only meant for tests
    pub fn with_cost(cost: u32) -> Self {
        Self { cost }
    }
}

impl PasswordHasher for BcryptHasher {
    fn hash(&self, password: &str) -> Result<String, AppError> {
        bcrypt::hash(password, self.cost).map_err(|e| {
            warn!(error = %e, "Failed to hash password");
            AppError::Internal
        })
    }

    fn verify(&self, password: &str, digest: &str) -> bool {
        bcrypt::verify(password, digest).unwrap_or_else(|e| {
            warn!(error = %e, "Stored password digest could not be verified");
            false
        })
    }
}
