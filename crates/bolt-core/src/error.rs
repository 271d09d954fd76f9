//! Error Types

use thiserror::Error;

/// Result type alias for assistant operations
pub type Result<T> = std::result::Result<T, AssistantError>;

/// Assistant error types
#[derive(Error, Debug)]
pub enum AssistantError {
    /// Knowledge backend returned an error
    #[error("Backend error: {0}")]
    Backend(String),

    /// Missing or malformed configuration (API keys, assistant ids)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Connection test did not finish in time
    #[error("Connection timeout after {0} seconds")]
    Timeout(u64),

    /// Network failure talking to a backend
    #[error("Network error: {0}")]
    Network(String),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_message() {
        let err = AssistantError::Timeout(10);
        assert_eq!(err.to_string(), "Connection timeout after 10 seconds");
    }
}
