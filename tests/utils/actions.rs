use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use tower::ServiceExt; // for `oneshot`

use super::setup::{TestSetup, DEFAULT_PASSWORD};

// ============================================================================
// Action Helpers
// ============================================================================

impl TestSetup {
    /// Send a request through the full router and decode the JSON reply
    pub async fn send(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json");
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {}", token));
        }
        let body = body
            .map(|json| Body::from(json.to_string()))
            .unwrap_or_else(Body::empty);

        let response = self
            .app
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();

        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    pub async fn sign_up(&self, email: &str, password: &str) -> (StatusCode, Value) {
        self.send(
            "POST",
            "/signup",
            None,
            Some(json!({ "email": email, "password": password })),
        )
        .await
    }

    /// Sign in and return the issued token
    pub async fn sign_in(&self, email: &str) -> String {
        let (status, body) = self
            .send(
                "POST",
                "/signin",
                None,
                Some(json!({ "email": email, "password": DEFAULT_PASSWORD })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "sign in failed: {}", body);
        body["token"].as_str().unwrap().to_string()
    }

    /// Token for the n-th account registered by the builder
    pub async fn token_for_account(&self, index: usize) -> String {
        let email = self.accounts[index].clone();
        self.sign_in(&email).await
    }

    /// Token signed with the shared secret but issued at `issued_at`
    pub fn token_issued_at(&self, user_id: i64, issued_at: DateTime<Utc>) -> String {
        self.tokens.issue(user_id, issued_at).unwrap()
    }

    // ============================================================================
    // Convenience Action Methods
    // ============================================================================

    pub async fn create_post(&self, token: &str, title: &str, content: &str) -> (StatusCode, Value) {
        self.send(
            "POST",
            "/posts",
            Some(token),
            Some(json!({ "title": title, "content": content })),
        )
        .await
    }

    pub async fn update_post(&self, token: &str, id: i64, title: &str) -> (StatusCode, Value) {
        self.send(
            "PUT",
            &format!("/posts/{}", id),
            Some(token),
            Some(json!({ "title": title, "content": "edited" })),
        )
        .await
    }

    pub async fn delete_post(&self, token: &str, id: i64) -> (StatusCode, Value) {
        self.send("DELETE", &format!("/posts/{}", id), Some(token), None)
            .await
    }
}
