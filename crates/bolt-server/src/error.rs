//! API Error Responses
//!
//! Every handler failure becomes `{error, code?}` JSON with a status chosen
//! by error class: validation 400, configuration 500, provider 400/500,
//! network 503.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;

use bolt_payments::PaymentError;
use bolt_runtime::VideoError;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<&'static str>,
}

/// Error returned by a handler
#[derive(Debug, Error)]
#[error("{message}")]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
    pub code: Option<&'static str>,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            code: None,
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    #[must_use]
    pub const fn with_code(mut self, code: &'static str) -> Self {
        self.code = Some(code);
        self
    }
}

impl From<PaymentError> for ApiError {
    fn from(err: PaymentError) -> Self {
        let (status, code) = match &err {
            PaymentError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            PaymentError::Declined(_) => (StatusCode::BAD_REQUEST, "PAYMENT_DECLINED"),
            PaymentError::WebhookSignature(_) => (StatusCode::BAD_REQUEST, "INVALID_SIGNATURE"),
            PaymentError::InvalidState(_) => (StatusCode::CONFLICT, "INVALID_STATE"),
            PaymentError::Network(_) => (StatusCode::SERVICE_UNAVAILABLE, "NETWORK_ERROR"),
            PaymentError::Config(_) => (StatusCode::INTERNAL_SERVER_ERROR, "CONFIGURATION_ERROR"),
            PaymentError::Stripe { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "STRIPE_ERROR"),
            PaymentError::Provider(_) => (StatusCode::INTERNAL_SERVER_ERROR, "PROVIDER_ERROR"),
            PaymentError::Storage(_) | PaymentError::Json(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR")
            }
        };

        if status.is_server_error() {
            tracing::error!(error = %err, "Payment request failed");
        } else {
            tracing::warn!(error = %err, "Payment request rejected");
        }

        Self::new(status, err.user_message()).with_code(code)
    }
}

impl From<VideoError> for ApiError {
    fn from(err: VideoError) -> Self {
        let status = match &err {
            VideoError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            VideoError::Network(_) => StatusCode::SERVICE_UNAVAILABLE,
            VideoError::Api { .. } | VideoError::Json(_) => StatusCode::BAD_GATEWAY,
        };

        tracing::error!(error = %err, code = err.code(), "Video persona request failed");
        Self::new(status, err.user_message()).with_code(err.code())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorResponse {
                error: self.message,
                code: self.code,
            }),
        )
            .into_response()
    }
}
