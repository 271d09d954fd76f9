//! Payment Outcome
//!
//! One result shape for every provider, so the orchestrator and the HTTP
//! layer never inspect provider-specific response bodies.

use serde::Serialize;

use crate::error::{FailureKind, PaymentError};

/// Terminal result of a payment submission
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "camelCase")]
pub enum PaymentOutcome {
    /// Payment completed; `reference` is the provider's payment or capture id
    #[serde(rename_all = "camelCase")]
    Ok { reference: String },

    /// Customer must complete an extra authentication step
    #[serde(rename_all = "camelCase")]
    RequiresAction { reference: String, client_secret: String },

    /// Payment failed
    #[serde(rename_all = "camelCase")]
    Err { kind: FailureKind, message: String },
}

impl PaymentOutcome {
    pub fn ok(reference: impl Into<String>) -> Self {
        Self::Ok {
            reference: reference.into(),
        }
    }

    pub fn failed(kind: FailureKind, message: impl Into<String>) -> Self {
        Self::Err {
            kind,
            message: message.into(),
        }
    }

    pub const fn is_ok(&self) -> bool {
        matches!(self, Self::Ok { .. })
    }
}

impl From<PaymentError> for PaymentOutcome {
    fn from(err: PaymentError) -> Self {
        Self::failed(err.kind(), err.user_message())
    }
}

impl From<&PaymentError> for PaymentOutcome {
    fn from(err: &PaymentError) -> Self {
        Self::failed(err.kind(), err.user_message())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_becomes_outcome() {
        let outcome = PaymentOutcome::from(PaymentError::Declined("Your card was declined.".into()));
        assert_eq!(
            outcome,
            PaymentOutcome::failed(FailureKind::Provider, "Your card was declined.")
        );
        assert!(!outcome.is_ok());
    }

    #[test]
    fn test_outcome_serializes_tagged() {
        let json = serde_json::to_value(PaymentOutcome::RequiresAction {
            reference: "pi_1".into(),
            client_secret: "pi_1_secret_x".into(),
        })
        .unwrap();
        assert_eq!(json["outcome"], "requiresAction");
        assert_eq!(json["clientSecret"], "pi_1_secret_x");
    }
}
