//! Shared HTTP utilities for the party planner workspace.
//!
//! Provides common response builders and timestamp validation used across
//! api-server, lambda-graphql and the GraphQL schema.

use chrono::{DateTime, Utc};

// ============================================================================
// JSON Response Helpers (framework-agnostic)
// ============================================================================

/// Create a structured error JSON with a default message based on the code.
///
/// Returns: `{"error": {"code": "<code>", "message": "<default message>"}}`
pub fn json_err(code: &str) -> serde_json::Value {
    let message = match code {
        "not_found" => "Resource not found",
        "bad_request" => "Bad request",
        "method_not_allowed" => "Method not allowed",
        "error" | "internal" => "Internal server error",
        _ => code, // Fallback to code as message for unknown codes
    };
    serde_json::json!({"error": {"code": code, "message": message}})
}

/// Create a structured error JSON with a custom message.
///
/// Returns: `{"error": {"code": "<code>", "message": "<message>"}}`
pub fn json_error_with_message(code: &str, message: &str) -> serde_json::Value {
    serde_json::json!({"error": {"code": code, "message": message}})
}

// ============================================================================
// Time Utilities
// ============================================================================

/// Parse an RFC3339 string to a UTC timestamp.
///
/// Accepts both `2015-01-01T00:00:00Z` and `2015-01-01T00:00:00.000Z`.
pub fn parse_rfc3339(s: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    let dt = DateTime::parse_from_rfc3339(s)?;
    Ok(dt.with_timezone(&Utc))
}

/// Whether `s` is a valid RFC3339 timestamp.
pub fn is_rfc3339(s: &str) -> bool {
    parse_rfc3339(s).is_ok()
}

// ============================================================================
// Lambda HTTP Helpers (feature-gated)
// ============================================================================

#[cfg(feature = "lambda")]
pub mod lambda {
    //! Lambda-specific HTTP response builders using `lambda_http` types.

    use lambda_http::{Body, Response};

    /// Build an HTTP response with optional header and JSON body.
    ///
    /// # Panics
    /// Panics if JSON serialization or response construction fails (should not happen
    /// for well-formed JSON values).
    pub fn resp(
        status: u16,
        header: Option<(&str, String)>,
        body_json: Option<serde_json::Value>,
    ) -> Response<Body> {
        let mut rb = Response::builder().status(status);
        if let Some((k, v)) = header {
            rb = rb.header(k, v);
        }
        if let Some(val) = body_json {
            rb.header("content-type", "application/json")
                .body(Body::Text(
                    serde_json::to_string(&val).expect("JSON value serialization"),
                ))
                .expect("response body construction")
        } else {
            rb.body(Body::Empty)
                .expect("empty response body construction")
        }
    }

    /// Build an error response with status code and structured error body.
    pub fn resp_with_error(status: u16, code: &str, message: &str) -> Response<Body> {
        let body = crate::json_error_with_message(code, message);
        resp(status, None, Some(body))
    }

    /// Add CORS headers to a response.
    ///
    /// Uses `CORS_ALLOW_ORIGIN` env var, defaulting to `*`.
    pub fn with_cors(mut resp: Response<Body>) -> Response<Body> {
        use http::header::{HeaderName, HeaderValue};
        let headers = resp.headers_mut();
        let allow_origin =
            std::env::var("CORS_ALLOW_ORIGIN").unwrap_or_else(|_| "*".to_string());
        headers.insert(
            HeaderName::from_static("access-control-allow-origin"),
            HeaderValue::from_str(&allow_origin).unwrap_or(HeaderValue::from_static("*")),
        );
        headers.insert(
            HeaderName::from_static("access-control-allow-headers"),
            HeaderValue::from_static("content-type"),
        );
        headers.insert(
            HeaderName::from_static("access-control-allow-methods"),
            HeaderValue::from_static("OPTIONS, GET, POST"),
        );
        resp
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_err() {
        let err = json_err("not_found");
        assert_eq!(err, serde_json::json!({"error": {"code": "not_found", "message": "Resource not found"}}));

        // Unknown code falls back to code as message
        let err = json_err("custom_error");
        assert_eq!(err, serde_json::json!({"error": {"code": "custom_error", "message": "custom_error"}}));
    }

    #[test]
    fn test_json_error_with_message() {
        let err = json_error_with_message("bad_request", "Invalid input");
        assert_eq!(
            err,
            serde_json::json!({"error": {"code": "bad_request", "message": "Invalid input"}})
        );
    }

    #[test]
    fn test_rfc3339_variants() {
        assert!(is_rfc3339("2015-01-01T00:00:00Z"));
        assert!(is_rfc3339("2015-01-01T00:00:00.000Z"));
        assert!(is_rfc3339("2015-01-01T12:30:00+02:00"));
        assert!(!is_rfc3339("2015-01-01"));
        assert!(!is_rfc3339("yesterday"));
        let dt = parse_rfc3339("2015-01-01T01:00:00+01:00").unwrap();
        assert_eq!(dt.to_rfc3339(), "2015-01-01T00:00:00+00:00");
    }
}
