use axum::{
    extract::Request,
    http::HeaderMap,
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use subtle::ConstantTimeEq;

use crate::api::error::ApiError;

pub const TEST_TOKEN_HEADER: &str = "x-test-token";

/// Shared-secret check for the load-test data routes
pub struct TestTokenGuard {
    expected: String,
}

impl TestTokenGuard {
    pub fn new(expected: impl Into<String>) -> Self {
        Self {
            expected: expected.into(),
        }
    }

    pub fn check(&self, presented: &str) -> bool {
        if self.expected.is_empty() {
            return false;
        }
        self.expected.as_bytes().ct_eq(presented.as_bytes()).into()
    }
}

pub async fn test_token_middleware(
    guard: Arc<TestTokenGuard>,
    headers: HeaderMap,
    request: Request,
    next: Next,
) -> Response {
    let presented = headers
        .get(TEST_TOKEN_HEADER)
        .and_then(|h| h.to_str().ok())
        .unwrap_or("");

    if guard.check(presented) {
        next.run(request).await
    } else {
        tracing::warn!("Rejected load-test request with missing or wrong token");
        ApiError::Unauthorized("Unauthorized".to_string()).into_response()
    }
}
