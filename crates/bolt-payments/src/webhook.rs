//! Stripe Webhook Handling
//!
//! Verifies `Stripe-Signature` headers and records payment intent outcomes
//! in the order log.

use std::collections::HashMap;
use std::sync::Arc;

use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;

use crate::catalog::BillingCadence;
use crate::error::{PaymentError, Result};
use crate::orders::{OrderLog, OrderRecord, PaymentProvider};

/// Maximum age of a signed payload, in seconds
pub const SIGNATURE_TOLERANCE_SECS: i64 = 300;

type HmacSha256 = Hmac<Sha256>;

/// Verify a `Stripe-Signature` header (`t=<unix>,v1=<hex>[,v1=<hex>...]`)
/// against the raw request body.
pub fn verify_signature(
    payload: &str,
    header: &str,
    secret: &str,
    now: i64,
    tolerance: i64,
) -> Result<()> {
    let mut timestamp = None;
    let mut signatures = Vec::new();

    for part in header.split(',') {
        match part.trim().split_once('=') {
            Some(("t", value)) => timestamp = value.parse::<i64>().ok(),
            Some(("v1", value)) => signatures.push(value),
            _ => {}
        }
    }

    let timestamp =
        timestamp.ok_or_else(|| PaymentError::WebhookSignature("missing timestamp".into()))?;
    if signatures.is_empty() {
        return Err(PaymentError::WebhookSignature("missing v1 signature".into()));
    }
    if (now - timestamp).abs() > tolerance {
        return Err(PaymentError::WebhookSignature("timestamp outside tolerance".into()));
    }

    let signed_payload = format!("{timestamp}.{payload}");
    let matched = signatures.iter().any(|signature| {
        let Ok(expected) = hex::decode(signature) else {
            return false;
        };
        let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
            return false;
        };
        mac.update(signed_payload.as_bytes());
        mac.verify_slice(&expected).is_ok()
    });

    if matched {
        Ok(())
    } else {
        Err(PaymentError::WebhookSignature("no matching signature".into()))
    }
}

/// Compute a `Stripe-Signature` header for a payload
pub fn sign_payload(payload: &str, secret: &str, timestamp: i64) -> Result<String> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| PaymentError::WebhookSignature(e.to_string()))?;
    mac.update(format!("{timestamp}.{payload}").as_bytes());
    Ok(format!("t={timestamp},v1={}", hex::encode(mac.finalize().into_bytes())))
}

/// Parsed webhook event
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WebhookEvent {
    /// Payment intent succeeded
    PaymentSucceeded {
        payment_intent_id: String,
        amount: i64,
        currency: String,
        metadata: HashMap<String, String>,
    },

    /// Payment intent failed
    PaymentFailed {
        payment_intent_id: String,
        amount: i64,
        currency: String,
        reason: Option<String>,
        metadata: HashMap<String, String>,
    },

    /// Unhandled event type
    Other { event_type: String },
}

#[derive(Deserialize)]
struct Event {
    #[serde(rename = "type")]
    event_type: String,
    data: EventData,
}

#[derive(Deserialize)]
struct EventData {
    object: IntentObject,
}

#[derive(Deserialize)]
struct IntentObject {
    #[serde(default)]
    id: String,
    #[serde(default)]
    amount: i64,
    #[serde(default)]
    currency: String,
    #[serde(default)]
    metadata: HashMap<String, String>,
    #[serde(default)]
    last_payment_error: Option<LastPaymentError>,
}

#[derive(Deserialize)]
struct LastPaymentError {
    #[serde(default)]
    message: Option<String>,
}

/// Webhook handler
pub struct WebhookHandler {
    orders: Arc<dyn OrderLog>,
    secret: Option<String>,
}

impl WebhookHandler {
    pub fn new(orders: Arc<dyn OrderLog>, secret: Option<String>) -> Self {
        Self { orders, secret }
    }

    pub fn is_configured(&self) -> bool {
        self.secret.is_some()
    }

    /// Verify the signature and parse the event
    pub fn parse_event(&self, payload: &str, signature: &str, now: i64) -> Result<WebhookEvent> {
        let secret = self
            .secret
            .as_deref()
            .ok_or_else(|| PaymentError::Config("STRIPE_WEBHOOK_SECRET not set".into()))?;

        verify_signature(payload, signature, secret, now, SIGNATURE_TOLERANCE_SECS)?;
        parse_webhook_event(payload)
    }

    /// Process a webhook event
    pub fn handle(&self, event: &WebhookEvent) -> Result<()> {
        match event {
            WebhookEvent::PaymentSucceeded {
                payment_intent_id,
                amount,
                currency,
                metadata,
            } => {
                if self.orders.find(payment_intent_id)?.is_some() {
                    tracing::debug!(payment_intent_id = %payment_intent_id, "Order already recorded");
                    return Ok(());
                }

                self.orders.record(order_from_metadata(
                    payment_intent_id,
                    *amount,
                    currency,
                    metadata,
                ))?;
            }

            WebhookEvent::PaymentFailed {
                payment_intent_id,
                amount,
                currency,
                reason,
                metadata,
            } => {
                tracing::warn!(
                    payment_intent_id = %payment_intent_id,
                    reason = ?reason,
                    "Payment failed"
                );
                self.orders.record(
                    order_from_metadata(payment_intent_id, *amount, currency, metadata).failed(),
                )?;
            }

            WebhookEvent::Other { event_type } => {
                tracing::debug!(event_type = %event_type, "Unhandled webhook event");
            }
        }

        Ok(())
    }
}

fn order_from_metadata(
    payment_intent_id: &str,
    amount: i64,
    currency: &str,
    metadata: &HashMap<String, String>,
) -> OrderRecord {
    let provider = match metadata.get("paymentMethod").map(String::as_str) {
        Some("google_pay") => PaymentProvider::GooglePay,
        _ => PaymentProvider::Stripe,
    };

    let mut order = OrderRecord::succeeded(provider, payment_intent_id, amount, currency);
    if let Some(plan_id) = metadata.get("planId") {
        let billing = metadata.get("billing").and_then(|b| BillingCadence::parse(b));
        order = order.with_plan(plan_id.clone(), billing);
    }
    order.customer_email = metadata.get("customerEmail").cloned();
    order.customer_name = metadata.get("customerName").cloned();
    order
}

/// Parse a Stripe event body into our event type
pub fn parse_webhook_event(payload: &str) -> Result<WebhookEvent> {
    let event: Event = serde_json::from_str(payload)?;
    tracing::info!(event_type = %event.event_type, "Processing Stripe webhook");

    let object = event.data.object;
    Ok(match event.event_type.as_str() {
        "payment_intent.succeeded" => WebhookEvent::PaymentSucceeded {
            payment_intent_id: object.id,
            amount: object.amount,
            currency: object.currency,
            metadata: object.metadata,
        },
        "payment_intent.payment_failed" => WebhookEvent::PaymentFailed {
            payment_intent_id: object.id,
            amount: object.amount,
            currency: object.currency,
            reason: object.last_payment_error.and_then(|e| e.message),
            metadata: object.metadata,
        },
        _ => WebhookEvent::Other {
            event_type: event.event_type,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orders::{MemoryOrderLog, OrderStatus};

    const SECRET: &str = "whsec_test";

    fn succeeded_payload() -> String {
        serde_json::json!({
            "id": "evt_1",
            "type": "payment_intent.succeeded",
            "data": {"object": {
                "id": "pi_1",
                "amount": 7900,
                "currency": "usd",
                "metadata": {
                    "planId": "journeyman",
                    "billing": "monthly",
                    "customerEmail": "maria@local42.org",
                    "customerName": "Maria Lopez"
                }
            }}
        })
        .to_string()
    }

    #[test]
    fn test_valid_signature() {
        let payload = succeeded_payload();
        let header = sign_payload(&payload, SECRET, 1_700_000_000).unwrap();
        assert!(verify_signature(&payload, &header, SECRET, 1_700_000_100, 300).is_ok());
    }

    #[test]
    fn test_tampered_payload_rejected() {
        let header = sign_payload(&succeeded_payload(), SECRET, 1_700_000_000).unwrap();
        let err = verify_signature("{}", &header, SECRET, 1_700_000_000, 300).unwrap_err();
        assert!(matches!(err, PaymentError::WebhookSignature(_)));
    }

    #[test]
    fn test_stale_timestamp_rejected() {
        let payload = succeeded_payload();
        let header = sign_payload(&payload, SECRET, 1_700_000_000).unwrap();
        assert!(verify_signature(&payload, &header, SECRET, 1_700_000_301, 300).is_err());
    }

    #[test]
    fn test_malformed_header_rejected() {
        assert!(verify_signature("{}", "garbage", SECRET, 0, 300).is_err());
        assert!(verify_signature("{}", "t=1", SECRET, 1, 300).is_err());
        assert!(verify_signature("{}", "t=1,v1=zz", SECRET, 1, 300).is_err());
    }

    #[test]
    fn test_succeeded_event_recorded_once() {
        let orders = Arc::new(MemoryOrderLog::new());
        let handler = WebhookHandler::new(orders.clone(), Some(SECRET.into()));
        let payload = succeeded_payload();
        let header = sign_payload(&payload, SECRET, 1_700_000_000).unwrap();

        let event = handler.parse_event(&payload, &header, 1_700_000_000).unwrap();
        handler.handle(&event).unwrap();
        handler.handle(&event).unwrap();

        let recorded = orders.list().unwrap();
        assert_eq!(recorded.len(), 1);
        assert_eq!(recorded[0].plan_id.as_deref(), Some("journeyman"));
        assert_eq!(recorded[0].billing, Some(BillingCadence::Monthly));
        assert_eq!(recorded[0].status, OrderStatus::Succeeded);
    }

    #[test]
    fn test_failed_event() {
        let payload = serde_json::json!({
            "type": "payment_intent.payment_failed",
            "data": {"object": {
                "id": "pi_2",
                "amount": 2900,
                "currency": "usd",
                "last_payment_error": {"message": "Your card was declined."},
                "metadata": {"paymentMethod": "google_pay"}
            }}
        })
        .to_string();

        let event = parse_webhook_event(&payload).unwrap();
        assert!(matches!(
            &event,
            WebhookEvent::PaymentFailed { reason: Some(r), .. } if r == "Your card was declined."
        ));

        let orders = Arc::new(MemoryOrderLog::new());
        WebhookHandler::new(orders.clone(), None).handle(&event).unwrap();
        let order = orders.find("pi_2").unwrap().unwrap();
        assert_eq!(order.status, OrderStatus::Failed);
        assert_eq!(order.provider, PaymentProvider::GooglePay);
    }

    #[test]
    fn test_other_event() {
        let payload = r#"{"type":"customer.created","data":{"object":{"id":"cus_1"}}}"#;
        assert_eq!(
            parse_webhook_event(payload).unwrap(),
            WebhookEvent::Other {
                event_type: "customer.created".into()
            }
        );
    }

    #[test]
    fn test_unconfigured_secret() {
        let handler = WebhookHandler::new(Arc::new(MemoryOrderLog::new()), None);
        assert!(!handler.is_configured());
        assert!(matches!(
            handler.parse_event("{}", "t=1,v1=00", 1),
            Err(PaymentError::Config(_))
        ));
    }
}
