use std::fmt;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use thiserror::Error;
use tracing::{debug, instrument, warn};

use super::types::Claims;
use crate::shared::AppError;

/// Default token lifetime in hours
pub const DEFAULT_TOKEN_TTL_HOURS: i64 = 24;

/// Longest configurable token lifetime (one year)
pub const MAX_TOKEN_TTL_HOURS: i64 = 24 * 365;

/// Reasons a bearer token is rejected
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("Malformed token")]
    Malformed,

    #[error("Invalid token signature")]
    InvalidSignature,

    #[error("Token has expired")]
    Expired,
}

/// Issues and validates HS256 session tokens
#[derive(Clone)]
pub struct TokenService {
    secret: String,
    ttl: Duration,
}

impl fmt::Debug for TokenService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenService")
            .field("secret", &"<redacted>")
            .field("ttl_hours", &self.ttl.num_hours())
            .finish()
    }
}

impl TokenService {
    pub fn new(secret: impl Into<String>) -> Self {
        Self::with_ttl(secret, Duration::hours(DEFAULT_TOKEN_TTL_HOURS))
    }

    pub fn with_ttl(secret: impl Into<String>, ttl: Duration) -> Self {
        Self {
            secret: secret.into(),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Creates a signed token for `user_id` expiring `ttl` after `now`
    #[instrument(skip(self, now))]
    pub fn issue(&self, user_id: i64, now: DateTime<Utc>) -> Result<String, AppError> {
        let exp = now
            .checked_add_signed(self.ttl)
            .ok_or_else(|| {
                warn!(ttl_hours = self.ttl.num_hours(), "Token expiry out of range");
                AppError::Internal
            })?
            .timestamp();

        debug!(
            ttl_hours = self.ttl.num_hours(),
            exp_timestamp = exp,
            "Creating JWT token with expiration"
        );

        let claims = Claims {
            user_id,
            exp,
            iat: now.timestamp(),
        };

        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| {
            debug!(error = %e, "Failed to encode JWT token");
            AppError::Internal
        })
    }

    /// Verifies the signature and that `now` is before the encoded expiry
    #[instrument(skip(self, token, now))]
    pub fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, AuthError> {
        debug!("Decoding and validating JWT token");

        // Expiry is checked against the caller's clock below, not the system clock.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.leeway = 0;

        let claims = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &validation,
        )
        .map(|data| data.claims)
        .map_err(|e| {
            debug!(error = %e, "Failed to decode JWT token");
            match e.kind() {
                ErrorKind::InvalidSignature => AuthError::InvalidSignature,
                _ => AuthError::Malformed,
            }
        })?;

        if claims.is_expired_at(now) {
            debug!(user_id = claims.user_id, exp = claims.exp, "JWT token expired");
            return Err(AuthError::Expired);
        }

        debug!(
            user_id = claims.user_id,
            exp = claims.exp,
            "JWT token decoded successfully"
        );
        Ok(claims)
    }
}
