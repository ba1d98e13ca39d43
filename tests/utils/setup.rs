use std::sync::Arc;

use axum::Router;
use blog_api::{
    build_router, AppState, BcryptHasher, InMemoryPostRepository, InMemoryUserRepository,
    TokenService,
};

// ============================================================================
// Test Setup Infrastructure
// ============================================================================

pub const TEST_SECRET: &str = "workflow-secret";
pub const DEFAULT_PASSWORD: &str = "password123";

pub struct TestSetup {
    pub app: Router,
    pub users: Arc<InMemoryUserRepository>,
    pub posts: Arc<InMemoryPostRepository>,
    pub tokens: TokenService,
    /// Emails registered by the builder, in id order
    pub accounts: Vec<String>,
}

pub struct TestSetupBuilder {
    accounts: Vec<String>,
}

impl TestSetupBuilder {
    pub fn new() -> Self {
        Self { accounts: vec![] }
    }

    pub fn with_accounts(mut self, emails: Vec<&str>) -> Self {
        self.accounts = emails.into_iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_two_accounts(self) -> Self {
        self.with_accounts(vec!["alice@example.com", "bob@example.com"])
    }

    pub async fn build(self) -> TestSetup {
        let users = Arc::new(InMemoryUserRepository::new());
        let posts = Arc::new(InMemoryPostRepository::new());
        let tokens = TokenService::new(TEST_SECRET);

        let state = AppState::builder()
            .bind_user_repository(users.clone())
            .and_then(|b| b.bind_post_repository(posts.clone()))
            .and_then(|b| b.bind_token_service(tokens.clone()))
            .and_then(|b| b.bind_password_hasher(Arc::new(BcryptHasher::with_cost(4))))
            .and_then(|b| b.build())
            .unwrap();

        let setup = TestSetup {
            app: build_router(state),
            users,
            posts,
            tokens,
            accounts: self.accounts.clone(),
        };

        // Register accounts through the API so ids are assigned in order
        for email in &self.accounts {
            setup.sign_up(email, DEFAULT_PASSWORD).await;
        }

        setup
    }
}
