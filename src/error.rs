//! Error types for the studio workflow.

use std::time::Duration;

/// Fallback shown when a service failure carries no usable detail.
pub(crate) const GENERIC_FAILURE: &str =
    "An unexpected error occurred while generating the photo. Please try again.";

/// Shown when the service rejects the configured model or key.
pub(crate) const CONFIGURATION_FAILURE: &str =
    "API key mismatch or invalid model. Please check the studio configuration.";

/// Errors that can occur during the studio workflow.
#[derive(Debug, thiserror::Error)]
pub enum StudioError {
    /// A precondition was not met; no service call was made.
    #[error("{0}")]
    Validation(String),

    /// API key missing or invalid.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// The service returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Rate limit exceeded.
    #[error("rate limited, retry after {retry_after:?}")]
    RateLimited { retry_after: Option<Duration> },

    /// Content was blocked by safety filters.
    #[error("content blocked: {0}")]
    ContentBlocked(String),

    /// Invalid request parameters.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Network or HTTP error.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Failed to decode base64 or structured data.
    #[error("failed to decode: {0}")]
    Decode(String),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error (e.g., saving the composite).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl StudioError {
    /// Maps the error to the message surfaced to the user.
    ///
    /// Service messages pass through verbatim, except that the opaque
    /// entity-not-found condition becomes a configuration hint and an
    /// empty message falls back to a generic one.
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation(message) => message.clone(),
            Self::Api { message, .. } if message.contains("Requested entity was not found") => {
                CONFIGURATION_FAILURE.to_string()
            }
            Self::Api { message, .. } if message.trim().is_empty() => GENERIC_FAILURE.to_string(),
            Self::Api { message, .. } => message.clone(),
            Self::InvalidRequest(message) => message.clone(),
            other => other.to_string(),
        }
    }
}

/// Result type alias for studio operations.
pub type Result<T> = std::result::Result<T, StudioError>;

/// Normalizes a raw HTTP error body into a short single-line message.
///
/// Service errors usually arrive as a JSON envelope with the useful text
/// buried in `error.message`; anything else is collapsed and truncated.
pub(crate) fn sanitize_error_message(body: &str) -> String {
    let text = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|value| {
            value
                .pointer("/error/message")
                .and_then(|message| message.as_str())
                .map(str::to_string)
        })
        .unwrap_or_else(|| body.to_string());

    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.chars().count() > 300 {
        let truncated: String = collapsed.chars().take(300).collect();
        format!("{truncated}...")
    } else {
        collapsed
    }
}

/// Parses a `Retry-After` header value in seconds.
pub(crate) fn parse_retry_after(headers: &reqwest::header::HeaderMap) -> Option<u64> {
    headers
        .get(reqwest::header::RETRY_AFTER)?
        .to_str()
        .ok()?
        .parse()
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = StudioError::Api {
            status: 404,
            message: "Not found".into(),
        };
        assert_eq!(err.to_string(), "API error: 404 - Not found");

        let err = StudioError::ContentBlocked("Safety filter triggered".into());
        assert_eq!(err.to_string(), "content blocked: Safety filter triggered");
    }

    #[test]
    fn test_user_message_passes_service_text_verbatim() {
        let err = StudioError::Api {
            status: 429,
            message: "Quota exceeded for this project".into(),
        };
        assert_eq!(err.user_message(), "Quota exceeded for this project");
    }

    #[test]
    fn test_user_message_remaps_entity_not_found() {
        let err = StudioError::Api {
            status: 404,
            message: "Requested entity was not found.".into(),
        };
        assert_eq!(err.user_message(), CONFIGURATION_FAILURE);
    }

    #[test]
    fn test_user_message_falls_back_when_empty() {
        let err = StudioError::Api {
            status: 500,
            message: "  ".into(),
        };
        assert_eq!(err.user_message(), GENERIC_FAILURE);
    }

    #[test]
    fn test_user_message_validation_is_bare() {
        let err = StudioError::Validation("Please upload a photo.".into());
        assert_eq!(err.user_message(), "Please upload a photo.");
    }

    #[test]
    fn test_sanitize_extracts_json_envelope() {
        let body = r#"{"error": {"code": 400, "message": "Invalid argument", "status": "INVALID_ARGUMENT"}}"#;
        assert_eq!(sanitize_error_message(body), "Invalid argument");
    }

    #[test]
    fn test_sanitize_collapses_whitespace() {
        assert_eq!(
            sanitize_error_message("server\n  exploded\n\tbadly"),
            "server exploded badly"
        );
    }

    #[test]
    fn test_sanitize_truncates_long_bodies() {
        let body = "x".repeat(500);
        let sanitized = sanitize_error_message(&body);
        assert_eq!(sanitized.chars().count(), 303);
        assert!(sanitized.ends_with("..."));
    }

    #[test]
    fn test_parse_retry_after() {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::RETRY_AFTER,
            reqwest::header::HeaderValue::from_static("30"),
        );
        assert_eq!(parse_retry_after(&headers), Some(30));

        let empty = reqwest::header::HeaderMap::new();
        assert_eq!(parse_retry_after(&empty), None);
    }
}
