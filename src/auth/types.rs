use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// JWT claims carried by every session token
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Claims {
    pub user_id: i64,
    pub exp: i64, // Expiration timestamp (standard JWT claim)
    pub iat: i64, // Issued at timestamp (standard JWT claim)
}

impl Claims {
    /// Absolute expiry instant encoded in the token
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_opt(self.exp, 0).single()
    }

    /// A token is usable strictly before its expiry second
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now.timestamp() >= self.exp
    }
}

/// Request payload for POST /signup
#[derive(Debug, Deserialize, Validate)]
pub struct SignUpRequest {
    #[validate(email(message = "email must be a valid address"))]
    pub email: String,
    #[validate(length(min = 9, message = "password must be longer than 8 characters"))]
    pub password: String,
}

/// Request payload for POST /signin
#[derive(Debug, Deserialize, Validate)]
pub struct SignInRequest {
    #[validate(email(message = "email must be a valid address"))]
    pub email: String,
    #[validate(length(min = 9, message = "password must be longer than 8 characters"))]
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct SignUpResponse {
    pub id: i64,
    pub email: String,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct SignInResponse {
    pub token: String,
}
