//! Error types for LLM operations

use thiserror::Error;

/// Result type for LLM operations
pub type Result<T> = std::result::Result<T, LLMError>;

/// Errors that can occur during LLM operations
#[derive(Error, Debug)]
pub enum LLMError {
    /// API request failed
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// Invalid API key or authentication failed
    #[error("Invalid API key or authentication failed")]
    AuthenticationFailed,

    /// Rate limit or quota exceeded; carries the provider's error body
    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    /// Invalid request
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Model not found
    #[error("Model not found: {0}")]
    ModelNotFound(String),

    /// The provider reported a server-side failure (5xx)
    #[error("Server error ({status}): {body}")]
    ServerError { status: u16, body: String },

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// HTTP error, including timeouts
    #[cfg(feature = "gemini")]
    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Unexpected response format
    #[error("Unexpected response format: {0}")]
    UnexpectedResponse(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigurationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_keeps_provider_body() {
        let err = LLMError::RateLimitExceeded("RESOURCE_EXHAUSTED: quota exceeded".to_string());
        assert_eq!(
            err.to_string(),
            "Rate limit exceeded: RESOURCE_EXHAUSTED: quota exceeded"
        );

        let err = LLMError::ServerError {
            status: 503,
            body: "overloaded".to_string(),
        };
        assert_eq!(err.to_string(), "Server error (503): overloaded");
    }
}
