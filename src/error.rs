//! Error types for the chain-of-reasoning orchestrator

use thiserror::Error;

/// Result type alias for orchestrator operations
pub type Result<T> = std::result::Result<T, OrchestrationError>;

#[derive(Error, Debug)]
pub enum OrchestrationError {

    // =============================
    // Model Backend Errors
    // =============================

    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("LLM error: {0}")]
    LlmError(String),

    // =============================
    // Pipeline Errors
    // =============================

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Invalid plan: {0}")]
    InvalidPlan(String),

    // =============================
    // External Library Conversions
    // =============================

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl OrchestrationError {
    /// Whether a retry of the same model call may succeed.
    ///
    /// Rate limits, timeouts and transport-level failures are transient;
    /// authentication, configuration and malformed responses are not.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            OrchestrationError::RateLimited(_)
                | OrchestrationError::Timeout(_)
                | OrchestrationError::Transport(_)
        )
    }

    /// Map a reqwest failure that happened before a status code was seen.
    /// The request URL is dropped from the message.
    pub fn from_request(backend: &str, err: reqwest::Error) -> Self {
        let err = err.without_url();
        if err.is_timeout() {
            OrchestrationError::Timeout(format!("{} request timed out: {}", backend, err))
        } else if err.is_connect() || err.is_request() {
            OrchestrationError::Transport(format!("{} request failed: {}", backend, err))
        } else {
            OrchestrationError::LlmError(format!("{} request error: {}", backend, err))
        }
    }

    /// Classify a non-success HTTP status returned by a model backend.
    pub fn from_status(backend: &str, status: reqwest::StatusCode, body: &str) -> Self {
        let detail = format!("{} returned {}: {}", backend, status, body);

        match status.as_u16() {
            401 | 403 => OrchestrationError::Authentication(detail),
            429 => OrchestrationError::RateLimited(detail),
            408 | 504 => OrchestrationError::Timeout(detail),
            500..=599 => OrchestrationError::Transport(detail),
            _ => OrchestrationError::LlmError(detail),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn test_status_classification() {
        let auth = OrchestrationError::from_status("openai", StatusCode::UNAUTHORIZED, "bad key");
        assert!(matches!(auth, OrchestrationError::Authentication(_)));
        assert!(!auth.is_retryable());

        let limited = OrchestrationError::from_status("openai", StatusCode::TOO_MANY_REQUESTS, "");
        assert!(matches!(limited, OrchestrationError::RateLimited(_)));
        assert!(limited.is_retryable());

        let gateway = OrchestrationError::from_status("ollama", StatusCode::GATEWAY_TIMEOUT, "");
        assert!(matches!(gateway, OrchestrationError::Timeout(_)));
        assert!(gateway.is_retryable());

        let overloaded = OrchestrationError::from_status("gemini", StatusCode::SERVICE_UNAVAILABLE, "");
        assert!(overloaded.is_retryable());

        let bad_request = OrchestrationError::from_status("gemini", StatusCode::BAD_REQUEST, "oops");
        assert!(matches!(bad_request, OrchestrationError::LlmError(_)));
        assert!(!bad_request.is_retryable());
    }

    #[test]
    fn test_status_detail_includes_body() {
        let err = OrchestrationError::from_status("openai", StatusCode::FORBIDDEN, "key revoked");
        let message = err.to_string();
        assert!(message.contains("openai"));
        assert!(message.contains("key revoked"));
    }

    #[test]
    fn test_pipeline_errors_are_fatal() {
        assert!(!OrchestrationError::InvalidPlan("empty".to_string()).is_retryable());
        assert!(!OrchestrationError::ConfigError("missing key".to_string()).is_retryable());
    }
}
