//! User-facing messages for failed backend requests.
//!
//! Every failure shown to a shopper or admin goes through [`error_message`]:
//! a message supplied by the backend wins, otherwise a generic sentence is
//! chosen by status code.

use serde_json::Value;

/// Shown when the backend could not be reached at all.
pub const NETWORK_ERROR_MESSAGE: &str =
    "Unable to reach the server. Please check your connection.";

/// A failed request, as seen by the client.
#[derive(Debug, Clone, Copy)]
pub enum RequestFailure<'a> {
    /// The request never produced a response (DNS, connect, timeout).
    Network,
    /// The backend answered with a non-success status.
    Status {
        status: u16,
        body: Option<&'a Value>,
    },
}

/// Resolve the message to display for a failed request.
///
/// Backend messages are read from `message`, then `error`, then the first
/// entry of `errors` (a string or an object with `msg`/`message`).
#[must_use]
pub fn error_message(failure: RequestFailure<'_>) -> String {
    match failure {
        RequestFailure::Network => NETWORK_ERROR_MESSAGE.to_string(),
        RequestFailure::Status { status, body } => body
            .and_then(backend_message)
            .unwrap_or_else(|| status_message(status).to_string()),
    }
}

/// Generic text for a status code.
#[must_use]
pub const fn status_message(status: u16) -> &'static str {
    match status {
        400 => "The request was invalid. Please check your input.",
        401 => "Your session has expired. Please log in again.",
        403 => "You do not have permission to perform this action.",
        404 => "The requested resource was not found.",
        429 => "Too many requests. Please slow down and try again.",
        500..=599 => "Something went wrong on our end. Please try again later.",
        _ => "An unexpected error occurred.",
    }
}

/// Extract a backend-provided message from a JSON error body.
#[must_use]
pub fn backend_message(body: &Value) -> Option<String> {
    let non_empty = |v: &Value| {
        v.as_str()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(ToString::to_string)
    };

    if let Some(message) = body.get("message").and_then(non_empty) {
        return Some(message);
    }
    if let Some(message) = body.get("error").and_then(non_empty) {
        return Some(message);
    }

    let first = body.get("errors")?.as_array()?.first()?;
    non_empty(first)
        .or_else(|| first.get("msg").and_then(non_empty))
        .or_else(|| first.get("message").and_then(non_empty))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn with_body(status: u16, body: &Value) -> String {
        error_message(RequestFailure::Status {
            status,
            body: Some(body),
        })
    }

    #[test]
    fn test_backend_message_wins() {
        let body = json!({"message": "Slug already in use"});
        assert_eq!(with_body(409, &body), "Slug already in use");

        let body = json!({"error": "Invalid token"});
        assert_eq!(with_body(401, &body), "Invalid token");
    }

    #[test]
    fn test_errors_array_shapes() {
        let body = json!({"errors": [{"msg": "Title is required", "path": "title"}]});
        assert_eq!(with_body(422, &body), "Title is required");

        let body = json!({"errors": ["Price must be positive"]});
        assert_eq!(with_body(400, &body), "Price must be positive");
    }

    #[test]
    fn test_blank_backend_message_falls_back() {
        let body = json!({"message": "   "});
        assert_eq!(with_body(404, &body), status_message(404));
    }

    #[test]
    fn test_status_fallbacks() {
        let fallback = |status| error_message(RequestFailure::Status { status, body: None });
        assert_eq!(fallback(401), "Your session has expired. Please log in again.");
        assert_eq!(
            fallback(403),
            "You do not have permission to perform this action."
        );
        assert_eq!(fallback(404), "The requested resource was not found.");
        assert_eq!(
            fallback(429),
            "Too many requests. Please slow down and try again."
        );
        assert_eq!(
            fallback(500),
            "Something went wrong on our end. Please try again later."
        );
        assert_eq!(fallback(503), fallback(500));
        assert_eq!(fallback(418), "An unexpected error occurred.");
    }

    #[test]
    fn test_network_failure() {
        assert_eq!(error_message(RequestFailure::Network), NETWORK_ERROR_MESSAGE);
    }
}
