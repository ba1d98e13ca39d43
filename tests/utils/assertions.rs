use axum::http::StatusCode;
use serde_json::Value;

// ============================================================================
// Response Assertions
// ============================================================================

/// Fluent checks over a decoded `(status, body)` pair
pub struct ResponseAssertion {
    status: StatusCode,
    body: Value,
}

impl ResponseAssertion {
    pub fn new((status, body): (StatusCode, Value)) -> Self {
        Self { status, body }
    }

    pub fn has_status(self, expected: StatusCode) -> Self {
        assert_eq!(
            self.status, expected,
            "unexpected status, body was {}",
            self.body
        );
        self
    }

    /// Every failure is rendered as `{"error": "..."}`
    pub fn has_error(self, expected: &str) -> Self {
        assert_eq!(self.body["error"], expected, "body was {}", self.body);
        self
    }

    pub fn has_field(self, field: &str, expected: impl Into<Value>) -> Self {
        assert_eq!(self.body[field], expected.into(), "body was {}", self.body);
        self
    }

    pub fn has_field_containing(self, field: &str, needle: &str) -> Self {
        let value = self.body[field].as_str().unwrap_or_default();
        assert!(value.contains(needle), "body was {}", self.body);
        self
    }

    pub fn lacks_field(self, field: &str) -> Self {
        assert!(
            self.body.get(field).is_none(),
            "{} should be absent from {}",
            field,
            self.body
        );
        self
    }

    pub fn body(self) -> Value {
        self.body
    }
}
