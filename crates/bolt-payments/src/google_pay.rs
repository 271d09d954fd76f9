//! Google Pay Processing
//!
//! Google Pay hands back a tokenized card whose `token` field is a JSON
//! string carrying a Stripe card token id. The token is confirmed directly
//! against a Stripe payment intent.

use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value;

use crate::catalog::from_cents;
use crate::error::{PaymentError, Result};
use crate::stripe::PaymentIntent;

/// Pull the Stripe card token id out of a Google Pay `PaymentData` object
pub fn extract_card_token(payment_data: &Value) -> Result<String> {
    let token = payment_data
        .pointer("/paymentMethodData/tokenizationData/token")
        .and_then(Value::as_str)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| PaymentError::validation("Invalid payment token from Google Pay"))?;

    let parsed: Value = serde_json::from_str(token)
        .map_err(|_| PaymentError::validation("Invalid payment token format"))?;

    parsed
        .get("id")
        .and_then(Value::as_str)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .ok_or_else(|| PaymentError::validation("Invalid payment token format"))
}

/// Map a Stripe failure to what the Google Pay endpoint reports
pub fn classify_stripe_error(err: PaymentError) -> PaymentError {
    match err {
        PaymentError::Stripe { error_type, message } if error_type == "card_error" => {
            PaymentError::Declined(message)
        }
        PaymentError::Stripe { error_type, .. } if error_type == "invalid_request_error" => {
            PaymentError::validation("Invalid payment request")
        }
        other => other,
    }
}

/// Customer attached to a Google Pay charge
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CustomerSummary {
    pub id: String,
    pub email: String,
    pub name: String,
}

/// Completed Google Pay charge
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GooglePayReceipt {
    pub payment_intent_id: String,
    pub status: String,

    /// Charged amount in dollars
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,

    pub currency: String,
    pub customer: CustomerSummary,
}

/// Result of confirming a Google Pay token
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GooglePayResult {
    Succeeded(GooglePayReceipt),

    /// 3-D Secure or similar; the browser finishes with the client secret
    RequiresAction {
        payment_intent_id: String,
        client_secret: String,
    },
}

impl GooglePayResult {
    /// Interpret the intent status Stripe reported
    pub fn from_intent(intent: PaymentIntent, customer: CustomerSummary) -> Result<Self> {
        match intent.status.as_str() {
            "succeeded" => Ok(Self::Succeeded(GooglePayReceipt {
                amount: from_cents(intent.amount),
                payment_intent_id: intent.id,
                status: intent.status,
                currency: intent.currency,
                customer,
            })),
            "requires_action" => Ok(Self::RequiresAction {
                client_secret: intent.client_secret.unwrap_or_default(),
                payment_intent_id: intent.id,
            }),
            _ => Err(PaymentError::Declined(
                "Payment failed or requires additional verification".into(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn payment_data(token: &str) -> Value {
        json!({
            "paymentMethodData": {
                "type": "CARD",
                "tokenizationData": {"type": "PAYMENT_GATEWAY", "token": token}
            }
        })
    }

    fn intent(status: &str) -> PaymentIntent {
        PaymentIntent {
            id: "pi_1".into(),
            client_secret: Some("pi_1_secret".into()),
            status: status.into(),
            amount: 79000,
            currency: "usd".into(),
        }
    }

    fn customer() -> CustomerSummary {
        CustomerSummary {
            id: "cus_1".into(),
            email: "maria@local42.org".into(),
            name: "Maria Lopez".into(),
        }
    }

    #[test]
    fn test_extract_token() {
        let data = payment_data(r#"{"id":"tok_visa","object":"token"}"#);
        assert_eq!(extract_card_token(&data).unwrap(), "tok_visa");
    }

    #[test]
    fn test_missing_token() {
        let err = extract_card_token(&json!({"paymentMethodData": {}})).unwrap_err();
        assert_eq!(err.to_string(), "Invalid payment token from Google Pay");

        let err = extract_card_token(&payment_data("")).unwrap_err();
        assert_eq!(err.to_string(), "Invalid payment token from Google Pay");
    }

    #[test]
    fn test_malformed_token() {
        let err = extract_card_token(&payment_data("not json")).unwrap_err();
        assert_eq!(err.to_string(), "Invalid payment token format");

        let err = extract_card_token(&payment_data(r#"{"object":"token"}"#)).unwrap_err();
        assert_eq!(err.to_string(), "Invalid payment token format");
    }

    #[test]
    fn test_classify_stripe_error() {
        let card = classify_stripe_error(PaymentError::Stripe {
            error_type: "card_error".into(),
            message: "Your card has insufficient funds.".into(),
        });
        assert!(matches!(card, PaymentError::Declined(ref m) if m == "Your card has insufficient funds."));

        let invalid = classify_stripe_error(PaymentError::Stripe {
            error_type: "invalid_request_error".into(),
            message: "No such token".into(),
        });
        assert_eq!(invalid.to_string(), "Invalid payment request");

        let api = classify_stripe_error(PaymentError::Stripe {
            error_type: "api_error".into(),
            message: "Something broke".into(),
        });
        assert!(matches!(api, PaymentError::Stripe { .. }));
    }

    #[test]
    fn test_intent_status() {
        match GooglePayResult::from_intent(intent("succeeded"), customer()).unwrap() {
            GooglePayResult::Succeeded(receipt) => assert_eq!(receipt.amount, dec!(790)),
            other => panic!("unexpected {other:?}"),
        }

        assert_eq!(
            GooglePayResult::from_intent(intent("requires_action"), customer()).unwrap(),
            GooglePayResult::RequiresAction {
                payment_intent_id: "pi_1".into(),
                client_secret: "pi_1_secret".into()
            }
        );

        let err = GooglePayResult::from_intent(intent("requires_payment_method"), customer()).unwrap_err();
        assert_eq!(err.to_string(), "Payment failed or requires additional verification");
    }
}
