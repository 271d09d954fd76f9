//! Video Persona Error Types

use thiserror::Error;

/// Result type alias for video persona operations
pub type VideoResult<T> = std::result::Result<T, VideoError>;

/// Video persona error types
#[derive(Error, Debug)]
pub enum VideoError {
    /// Missing API key, persona or replica
    #[error("Configuration error: {0}")]
    Config(String),

    /// Tavus could not be reached
    #[error("Network error: {0}")]
    Network(String),

    /// Tavus answered with a non-success status
    #[error("Tavus API Error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Unexpected response body
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl VideoError {
    /// Machine-readable code returned to clients
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Config(_) => "CONFIGURATION_ERROR",
            Self::Network(_) => "NETWORK_ERROR",
            Self::Api { .. } | Self::Json(_) => "TAVUS_API_ERROR",
        }
    }

    /// Convert to a user-friendly message
    pub fn user_message(&self) -> String {
        match self {
            Self::Config(msg) => format!("Video service is not configured: {msg}"),
            Self::Network(_) => "Could not reach the video service. Please try again.".into(),
            Self::Api { .. } | Self::Json(_) => "The video service rejected the request.".into(),
        }
    }
}

impl From<reqwest::Error> for VideoError {
    fn from(err: reqwest::Error) -> Self {
        Self::Network(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(VideoError::Config("x".into()).code(), "CONFIGURATION_ERROR");
        assert_eq!(VideoError::Network("x".into()).code(), "NETWORK_ERROR");
        let api = VideoError::Api { status: 404, message: "gone".into() };
        assert_eq!(api.code(), "TAVUS_API_ERROR");
        assert_eq!(api.to_string(), "Tavus API Error (404): gone");
    }
}
