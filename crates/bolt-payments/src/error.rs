//! Payment Error Types

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, PaymentError>;

/// Payment-related errors
#[derive(Error, Debug)]
pub enum PaymentError {
    /// Request or billing data failed validation
    #[error("{0}")]
    Validation(String),

    /// Provider refused the payment (card declined, capture not completed)
    #[error("{0}")]
    Declined(String),

    /// Stripe API error, tagged with Stripe's error type
    #[error("{message}")]
    Stripe { error_type: String, message: String },

    /// Other provider failure
    #[error("{0}")]
    Provider(String),

    /// Provider could not be reached
    #[error("Network error: {0}")]
    Network(String),

    /// Missing provider credentials
    #[error("Configuration error: {0}")]
    Config(String),

    /// Checkout action not allowed in the current state
    #[error("Invalid checkout state: {0}")]
    InvalidState(String),

    /// Webhook signature verification failed
    #[error("Webhook signature invalid: {0}")]
    WebhookSignature(String),

    /// Order log failure
    #[error("Storage error: {0}")]
    Storage(String),

    /// Unexpected provider response body
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Coarse failure class shared by every payment adapter
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FailureKind {
    Validation,
    Provider,
    Network,
    Configuration,
}

impl PaymentError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn provider(message: impl Into<String>) -> Self {
        Self::Provider(message.into())
    }

    /// Classify this error
    pub const fn kind(&self) -> FailureKind {
        match self {
            Self::Validation(_) | Self::InvalidState(_) | Self::WebhookSignature(_) => {
                FailureKind::Validation
            }
            Self::Declined(_) | Self::Stripe { .. } | Self::Provider(_) | Self::Storage(_) | Self::Json(_) => {
                FailureKind::Provider
            }
            Self::Network(_) => FailureKind::Network,
            Self::Config(_) => FailureKind::Configuration,
        }
    }

    /// Stripe card errors carry a message meant for the customer
    pub fn is_card_error(&self) -> bool {
        matches!(self, Self::Stripe { error_type, .. } if error_type == "card_error")
    }

    pub fn is_invalid_request(&self) -> bool {
        matches!(self, Self::Stripe { error_type, .. } if error_type == "invalid_request_error")
    }

    /// Get user-friendly message
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation(msg) | Self::Declined(msg) | Self::Provider(msg) => msg.clone(),
            Self::Stripe { message, .. } => message.clone(),
            Self::Network(_) => "Payment provider is unreachable. Please try again.".into(),
            Self::Config(_) => "Payment service configuration error.".into(),
            Self::InvalidState(msg) => msg.clone(),
            _ => "An error occurred processing your request.".into(),
        }
    }
}

impl From<reqwest::Error> for PaymentError {
    fn from(err: reqwest::Error) -> Self {
        Self::Network(err.to_string())
    }
}
