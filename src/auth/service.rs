use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{info, instrument, warn};

use super::{
    password::PasswordHasher,
    token::TokenService,
    types::{SignInRequest, SignInResponse, SignUpRequest, SignUpResponse},
};
use crate::shared::AppError;
use crate::user::{models::NewUser, repository::UserRepository};

/// Service for account registration and sign-in
pub struct AuthService {
    users: Arc<dyn UserRepository + Send + Sync>,
    hasher: Arc<dyn PasswordHasher>,
    tokens: TokenService,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UserRepository + Send + Sync>,
        hasher: Arc<dyn PasswordHasher>,
        tokens: TokenService,
    ) -> Self {
        Self {
            users,
            hasher,
            tokens,
        }
    }

    /// Registers a new account; a taken email is a conflict and writes nothing
    #[instrument(skip(self, request), fields(email = %request.email))]
    pub async fn sign_up(&self, request: SignUpRequest) -> Result<SignUpResponse, AppError> {
        if self
            .users
            .find_user_by_email(&request.email)
            .await?
            .is_some()
        {
            warn!("Sign-up rejected, email already registered");
            return Err(AppError::Conflict("Email already exists".to_string()));
        }

        let digest = self.hasher.hash(&request.password)?;
        let user = self
            .users
            .create_user(&NewUser::new(request.email, digest))
            .await?;

        info!(user_id = user.id, "User signed up");
        Ok(SignUpResponse {
            id: user.id,
            email: user.email,
        })
    }

    /// Checks credentials and issues a token valid from `now`
    #[instrument(skip(self, request, now), fields(email = %request.email))]
    pub async fn sign_in(
        &self,
        request: SignInRequest,
        now: DateTime<Utc>,
    ) -> Result<SignInResponse, AppError> {
        let invalid = || AppError::Unauthorized("Invalid credentials".to_string());

        let user = match self.users.find_user_by_email(&request.email).await? {
            Some(user) => user,
            None => {
                warn!("Sign-in for unknown email");
                return Err(invalid());
            }
        };

        if !self.hasher.verify(&request.password, &user.password_hash) {
            warn!(user_id = user.id, "Sign-in with wrong password");
            return Err(invalid());
        }

        let token = self.tokens.issue(user.id, now)?;
        info!(user_id = user.id, "User signed in");
        Ok(SignInResponse { token })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::password::BcryptHasher;
    use crate::user::repository::InMemoryUserRepository;

    fn setup() -> (AuthService, Arc<InMemoryUserRepository>, TokenService) {
        let users = Arc::new(InMemoryUserRepository::new());
        let tokens = TokenService::new("test-secret");
        let service = AuthService::new(
            users.clone(),
            Arc::new(BcryptHasher::with_cost(4)),
            tokens.clone(),
        );
        (service, users, tokens)
    }

    fn sign_up_request(email: &str) -> SignUpRequest {
        SignUpRequest {
            email: email.to_string(),
            password: "password123".to_string(),
        }
    }

    fn sign_in_request(email: &str, password: &str) -> SignInRequest {
        SignInRequest {
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    #[tokio::test]
    async fn test_sign_up_stores_digest_not_password() {
        let (service, users, _) = setup();

        let response = service
            .sign_up(sign_up_request("ada@example.com"))
            .await
            .unwrap();
        assert_eq!(response.email, "ada@example.com");

        let stored = users.find_user_by_id(response.id).await.unwrap().unwrap();
        assert_ne!(stored.password_hash, "password123");
    }

    #[tokio::test]
    async fn test_sign_up_duplicate_email_writes_nothing() {
        let (service, users, _) = setup();
        service
            .sign_up(sign_up_request("ada@example.com"))
            .await
            .unwrap();

        let result = service.sign_up(sign_up_request("ada@example.com")).await;
        assert!(matches!(result, Err(AppError::Conflict(_))));
        assert_eq!(users.user_count(), 1);
    }

    #[tokio::test]
    async fn test_sign_in_issues_token_for_user() {
        let (service, _, tokens) = setup();
        let user = service
            .sign_up(sign_up_request("ada@example.com"))
            .await
            .unwrap();

        let now = Utc::now();
        let response = service
            .sign_in(sign_in_request("ada@example.com", "password123"), now)
            .await
            .unwrap();

        let claims = tokens.validate(&response.token, now).unwrap();
        assert_eq!(claims.user_id, user.id);
    }

    #[tokio::test]
    async fn test_sign_in_rejects_bad_credentials() {
        let (service, _, _) = setup();
        service
            .sign_up(sign_up_request("ada@example.com"))
            .await
            .unwrap();

        let wrong_password = service
            .sign_in(sign_in_request("ada@example.com", "not-the-password"), Utc::now())
            .await;
        assert!(matches!(wrong_password, Err(AppError::Unauthorized(_))));

        let unknown = service
            .sign_in(sign_in_request("nobody@example.com", "password123"), Utc::now())
            .await;
        assert!(matches!(unknown, Err(AppError::Unauthorized(_))));
    }
}
