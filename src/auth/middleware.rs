use async_trait::async_trait;
use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap, Method},
    middleware::Next,
    response::Response,
};
use chrono::Utc;
use tracing::{debug, error, info, instrument, warn};

use super::{token::AuthError, types::Claims};
use crate::shared::{AppError, AppState};

/// Routes reachable without a token, matched on exact method and path
const PUBLIC_ROUTES: &[(&str, &str)] = &[
    ("GET", "/"),
    ("POST", "/signup"),
    ("POST", "/signin"),
    ("GET", "/users"),
    ("GET", "/posts"),
];

/// Exact membership only; `/users/42` is not covered by `/users`.
/// HEAD is matched as GET since axum serves it with the GET handler.
pub fn is_public_route(method: &Method, path: &str) -> bool {
    let method = if *method == Method::HEAD {
        Method::GET
    } else {
        method.clone()
    };

    PUBLIC_ROUTES
        .iter()
        .any(|(m, p)| *m == method.as_str() && *p == path)
}

/// Pulls the token out of `Authorization`, stripping a `Bearer ` prefix when present
fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = headers
        .get(AUTHORIZATION)
        .and_then(|header| header.to_str().ok())
        .ok_or_else(|| {
            warn!("Missing or unreadable Authorization header");
            AuthError::Malformed
        })?;

    Ok(value.strip_prefix("Bearer ").unwrap_or(value))
}

/// JWT authentication middleware - validates the bearer token on every
/// non-public route and adds the resulting Claims to the request.
/// Usage: .layer(middleware::from_fn_with_state(app_state.clone(), auth::jwt_auth))
/// Handlers then take a `Claims` argument.
#[instrument(skip(state, req, next), fields(method = %req.method(), path = %req.uri().path()))]
pub async fn jwt_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    if is_public_route(req.method(), req.uri().path()) {
        debug!("Public route, skipping authentication");
        return Ok(next.run(req).await);
    }

    let claims = bearer_token(req.headers())
        .and_then(|token| state.token_service.validate(token, Utc::now()))
        .map_err(|e| {
            warn!("JWT authentication failed: {}", e);
            AppError::Auth(e)
        })?;

    info!(
        user_id = claims.user_id,
        "Authentication successful, adding claims to request"
    );

    req.extensions_mut().insert(claims);

    Ok(next.run(req).await)
}

/// Handlers that declare a `Claims` argument only run behind [`jwt_auth`]
#[async_trait]
impl<S> FromRequestParts<S> for Claims
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts.extensions.get::<Claims>().cloned().ok_or_else(|| {
            error!(path = %parts.uri.path(), "Claims missing, authentication layer not applied");
            AppError::Internal
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::TokenService;
    use crate::shared::test_utils::{test_state, TEST_SECRET};
    use axum::{
        body::Body,
        http::{Request, StatusCode},
        middleware,
        routing::get,
        Router,
    };
    use chrono::Duration;
    use rstest::rstest;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tower::ServiceExt; // for `oneshot`

    #[rstest]
    #[case(Method::GET, "/", true)]
    #[case(Method::POST, "/signup", true)]
    #[case(Method::POST, "/signin", true)]
    #[case(Method::GET, "/users", true)]
    #[case(Method::GET, "/posts", true)]
    #[case(Method::HEAD, "/users", true)] // served by the GET handler
    #[case(Method::HEAD, "/posts/1", false)]
    #[case(Method::GET, "/users/42", false)] // shares a prefix with /users
    #[case(Method::GET, "/users/list", false)]
    #[case(Method::GET, "/users/me", false)]
    #[case(Method::GET, "/user", false)] // substring of /users
    #[case(Method::GET, "/sign", false)]
    #[case(Method::GET, "/posts/1", false)]
    #[case(Method::POST, "/posts", false)]
    #[case(Method::GET, "/users/", false)]
    #[case(Method::GET, "", false)]
    fn test_public_route_matching(
        #[case] method: Method,
        #[case] path: &str,
        #[case] expected: bool,
    ) {
        assert_eq!(is_public_route(&method, path), expected);
    }

    #[test]
    fn test_bearer_token_extraction() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), Err(AuthError::Malformed));

        headers.insert(AUTHORIZATION, "Bearer abc.def.ghi".parse().unwrap());
        assert_eq!(bearer_token(&headers), Ok("abc.def.ghi"));

        headers.insert(AUTHORIZATION, "abc.def.ghi".parse().unwrap());
        assert_eq!(bearer_token(&headers), Ok("abc.def.ghi"));

        // Prefix match is case-sensitive
        headers.insert(AUTHORIZATION, "bearer abc.def.ghi".parse().unwrap());
        assert_eq!(bearer_token(&headers), Ok("bearer abc.def.ghi"));
    }

    /// Router whose handlers count how often they run
    fn counting_app(hits: Arc<AtomicUsize>) -> Router {
        let state = test_state().state;
        let public_hits = hits.clone();

        Router::new()
            .route(
                "/users",
                get(move || {
                    public_hits.fetch_add(1, Ordering::SeqCst);
                    async { "public" }
                }),
            )
            .route(
                "/users/:id",
                get(move |claims: Claims| {
                    hits.fetch_add(1, Ordering::SeqCst);
                    async move { claims.user_id.to_string() }
                }),
            )
            .layer(middleware::from_fn_with_state(state.clone(), jwt_auth))
            .with_state(state)
    }

    fn get_request(uri: &str, auth: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().method("GET").uri(uri);
        if let Some(value) = auth {
            builder = builder.header(AUTHORIZATION, value);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_public_route_forwards_without_token() {
        let hits = Arc::new(AtomicUsize::new(0));
        let app = counting_app(hits.clone());

        // Even a garbage credential is ignored on a public route
        let response = app
            .oneshot(get_request("/users", Some("Bearer garbage")))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[rstest]
    #[case(None)]
    #[case(Some("Bearer "))]
    #[case(Some("Bearer not.a.token"))]
    #[case(Some("Basic dXNlcjpwYXNz"))]
    #[tokio::test]
    async fn test_protected_route_rejects_bad_credentials(#[case] auth: Option<&str>) {
        let hits = Arc::new(AtomicUsize::new(0));
        let app = counting_app(hits.clone());

        let response = app.oneshot(get_request("/users/42", auth)).await.unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_protected_route_rejects_expired_token() {
        let hits = Arc::new(AtomicUsize::new(0));
        let app = counting_app(hits.clone());
        let token = TokenService::new(TEST_SECRET)
            .issue(42, Utc::now() - Duration::hours(48))
            .unwrap();

        let response = app
            .oneshot(get_request("/users/42", Some(&format!("Bearer {}", token))))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], "Token has expired");
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_valid_token_injects_claims() {
        let hits = Arc::new(AtomicUsize::new(0));
        let app = counting_app(hits.clone());
        let token = TokenService::new(TEST_SECRET).issue(42, Utc::now()).unwrap();

        let response = app
            .oneshot(get_request("/users/42", Some(&format!("Bearer {}", token))))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], b"42");
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_missing_claims_is_internal_error() {
        // Handler wired without the authentication layer
        let app = Router::new().route(
            "/me",
            get(|claims: Claims| async move { claims.user_id.to_string() }),
        );

        let response = app.oneshot(get_request("/me", None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
