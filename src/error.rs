//! Error types for Concierge

use thiserror::Error;

/// Result type alias using Concierge's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for Concierge
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// LLM provider API error
    #[error("Provider API error: {0}")]
    Provider(String),

    /// Web search API error
    #[error("Search error: {0}")]
    Search(String),

    /// Gmail API error
    #[error("Gmail error: {0}")]
    Gmail(String),

    /// HTTP request error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Environment variable error
    #[error("Environment error: {0}")]
    Env(#[from] std::env::VarError),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Unauthorized access
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Rate limit exceeded
    #[error("Rate limit exceeded: {0}")]
    RateLimit(String),

    /// Timeout error
    #[error("Timeout: {0}")]
    Timeout(String),

    /// Generic internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Check if error is retryable
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Error::Http(_) | Error::RateLimit(_) | Error::Timeout(_)
        )
    }

    /// Check if error is a client error (user's fault)
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Error::InvalidInput(_) | Error::NotFound(_) | Error::Unauthorized(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_classification() {
        assert!(Error::RateLimit("slow down".into()).is_retryable());
        assert!(Error::Timeout("120s".into()).is_retryable());
        assert!(!Error::Config("missing key".into()).is_retryable());
        assert!(!Error::Gmail("bad payload".into()).is_retryable());
    }

    #[test]
    fn client_error_classification() {
        assert!(Error::InvalidInput("bad url".into()).is_client_error());
        assert!(Error::Unauthorized("no token".into()).is_client_error());
        assert!(!Error::Provider("500".into()).is_client_error());
    }
}
