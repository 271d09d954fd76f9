//! PayPal Orders Client
//!
//! Two-phase PayPal checkout: an OAuth2 client-credentials token, then
//! create an order and later capture it. Every call authenticates again and
//! carries a fresh `PayPal-Request-Id`.

use reqwest::Client;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::billing::BillingInfo;
use crate::catalog::BillingCadence;
use crate::error::{PaymentError, Result};

pub const SANDBOX_API_BASE: &str = "https://api-m.sandbox.paypal.com";
pub const LIVE_API_BASE: &str = "https://api-m.paypal.com";

/// PayPal client configuration
#[derive(Clone, Debug)]
pub struct PayPalConfig {
    pub client_id: String,
    pub client_secret: String,
    pub api_base: String,

    /// Site root used for approval return/cancel URLs
    pub public_base_url: Option<String>,
}

impl PayPalConfig {
    /// Create from environment variables; `APP_ENV=production` selects the live API
    pub fn from_env() -> Result<Self> {
        let var = |name: &str| std::env::var(name).ok().filter(|v| !v.is_empty());

        let (Some(client_id), Some(client_secret)) = (var("PAYPAL_CLIENT_ID"), var("PAYPAL_CLIENT_SECRET")) else {
            return Err(PaymentError::Config(
                "PAYPAL_CLIENT_ID and PAYPAL_CLIENT_SECRET must be set".into(),
            ));
        };

        let production = var("APP_ENV").is_some_and(|env| env == "production");
        let default_base = if production { LIVE_API_BASE } else { SANDBOX_API_BASE };
        let api_base = var("PAYPAL_API_BASE").unwrap_or_else(|| default_base.into());

        Ok(Self {
            client_id,
            client_secret,
            api_base,
            public_base_url: var("PUBLIC_BASE_URL"),
        })
    }
}

/// Order to create
#[derive(Clone, Debug)]
pub struct NewOrder<'a> {
    /// Amount in dollars
    pub amount: Decimal,
    pub currency: &'a str,
    pub plan_id: &'a str,
    pub billing: BillingCadence,
    pub customer: &'a BillingInfo,
}

/// Created order
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct PayPalOrder {
    pub id: String,
    pub status: String,
}

/// Payer details from a capture
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Payer {
    pub email: Option<String>,
    pub name: Option<String>,
    pub payer_id: Option<String>,
}

/// Completed capture
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptureReceipt {
    pub order_id: String,
    pub status: String,
    pub capture_id: Option<String>,
    pub amount: Option<String>,
    pub currency: Option<String>,
    pub payer: Payer,
}

#[derive(Deserialize)]
struct TokenResponse {
    #[serde(default)]
    access_token: Option<String>,
}

#[derive(Deserialize)]
struct CaptureResponse {
    #[serde(default)]
    id: String,
    #[serde(default)]
    status: String,
    #[serde(default)]
    purchase_units: Vec<PurchaseUnit>,
    #[serde(default)]
    payer: Option<WirePayer>,
}

#[derive(Deserialize)]
struct PurchaseUnit {
    #[serde(default)]
    amount: Option<WireAmount>,
    #[serde(default)]
    payments: Option<Payments>,
}

#[derive(Deserialize)]
struct Payments {
    #[serde(default)]
    captures: Vec<Capture>,
}

#[derive(Deserialize)]
struct Capture {
    #[serde(default)]
    id: String,
    #[serde(default)]
    status: String,
    #[serde(default)]
    amount: Option<WireAmount>,
}

#[derive(Clone, Deserialize)]
struct WireAmount {
    currency_code: String,
    value: String,
}

#[derive(Deserialize)]
struct WirePayer {
    #[serde(default)]
    email_address: Option<String>,
    #[serde(default)]
    payer_id: Option<String>,
    #[serde(default)]
    name: Option<WireName>,
}

#[derive(Deserialize)]
struct WireName {
    #[serde(default)]
    given_name: String,
    #[serde(default)]
    surname: String,
}

impl CaptureResponse {
    fn first_capture(&self) -> Option<&Capture> {
        self.purchase_units
            .first()
            .and_then(|u| u.payments.as_ref())
            .and_then(|p| p.captures.first())
    }

    fn into_receipt(self) -> Result<CaptureReceipt> {
        let capture = self.first_capture();
        if capture.map(|c| c.status.as_str()) != Some("COMPLETED") {
            return Err(PaymentError::Declined("Payment was not completed successfully".into()));
        }

        let capture_id = capture.map(|c| c.id.clone());
        let amount = self
            .purchase_units
            .first()
            .and_then(|u| u.amount.clone())
            .or_else(|| capture.and_then(|c| c.amount.clone()));

        let payer = self.payer.map(|p| Payer {
            email: p.email_address,
            name: p.name.map(|n| format!("{} {}", n.given_name, n.surname)),
            payer_id: p.payer_id,
        });

        Ok(CaptureReceipt {
            order_id: self.id,
            status: self.status,
            capture_id,
            amount: amount.as_ref().map(|a| a.value.clone()),
            currency: amount.map(|a| a.currency_code),
            payer: payer.unwrap_or_default(),
        })
    }
}

/// PayPal order ids are alphanumeric; checked before the id goes into a URL path
fn is_valid_order_id(order_id: &str) -> bool {
    !order_id.is_empty() && order_id.chars().all(|c| c.is_ascii_alphanumeric())
}

/// Format dollars the way PayPal expects (`"790.00"`)
pub fn paypal_value(amount: Decimal) -> String {
    format!("{:.2}", amount.round_dp(2))
}

/// PayPal REST client
#[derive(Clone)]
pub struct PayPalClient {
    client: Client,
    config: PayPalConfig,
}

impl PayPalClient {
    pub fn new(config: PayPalConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    /// Obtain a client-credentials access token
    pub async fn access_token(&self) -> Result<String> {
        let response = self
            .client
            .post(format!("{}/v1/oauth2/token", self.config.api_base))
            .basic_auth(&self.config.client_id, Some(&self.config.client_secret))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(status = %status, "PayPal authentication rejected");
            return Err(PaymentError::provider("Failed to authenticate with PayPal"));
        }

        response
            .json::<TokenResponse>()
            .await
            .ok()
            .and_then(|t| t.access_token)
            .ok_or_else(|| PaymentError::provider("Failed to authenticate with PayPal"))
    }

    /// Create a CAPTURE-intent order for one plan
    pub async fn create_order(&self, order: &NewOrder<'_>) -> Result<PayPalOrder> {
        let token = self.access_token().await?;
        let body = self.order_body(order);
        let request_id = format!("{}_{}", order.plan_id, uuid::Uuid::new_v4());

        let response = self
            .client
            .post(format!("{}/v2/checkout/orders", self.config.api_base))
            .bearer_auth(token)
            .header("PayPal-Request-Id", request_id)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            tracing::warn!(status = %status, body = %detail, "PayPal order creation failed");
            return Err(PaymentError::provider("Failed to create PayPal order"));
        }

        let created: PayPalOrder = serde_json::from_str(&response.text().await?)?;
        tracing::info!(order_id = %created.id, status = %created.status, plan_id = order.plan_id, "PayPal order created");
        Ok(created)
    }

    /// Capture an approved order; only a `COMPLETED` capture succeeds
    pub async fn capture_order(&self, order_id: &str) -> Result<CaptureReceipt> {
        if !is_valid_order_id(order_id) {
            return Err(PaymentError::validation("Invalid PayPal order ID"));
        }
        let token = self.access_token().await?;
        let request_id = format!("capture_{order_id}_{}", uuid::Uuid::new_v4());

        let response = self
            .client
            .post(format!("{}/v2/checkout/orders/{order_id}/capture", self.config.api_base))
            .bearer_auth(token)
            .header("PayPal-Request-Id", request_id)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            tracing::warn!(status = %status, body = %detail, order_id, "PayPal capture failed");
            return Err(PaymentError::provider("Failed to capture PayPal payment"));
        }

        let mut capture: CaptureResponse = serde_json::from_str(&response.text().await?)?;
        if capture.id.is_empty() {
            capture.id = order_id.to_string();
        }

        let receipt = capture.into_receipt()?;
        tracing::info!(order_id = %receipt.order_id, capture_id = ?receipt.capture_id, "PayPal payment captured");
        Ok(receipt)
    }

    fn order_body(&self, order: &NewOrder<'_>) -> serde_json::Value {
        let currency = order.currency.to_uppercase();
        let value = paypal_value(order.amount);
        let base = self.config.public_base_url.as_deref().unwrap_or_default();

        json!({
            "intent": "CAPTURE",
            "purchase_units": [{
                "reference_id": format!("{}_{}", order.plan_id, chrono::Utc::now().timestamp_millis()),
                "description": format!("UnionBolt AI {} plan - {} billing", order.plan_id, order.billing),
                "amount": {
                    "currency_code": currency,
                    "value": value,
                    "breakdown": {
                        "item_total": {"currency_code": currency, "value": value}
                    }
                },
                "items": [{
                    "name": format!("UnionBolt AI {} Plan", order.plan_id),
                    "description": format!("{} subscription to UnionBolt AI {} plan", order.billing, order.plan_id),
                    "unit_amount": {"currency_code": currency, "value": value},
                    "quantity": "1",
                    "category": "DIGITAL_GOODS"
                }]
            }],
            "application_context": {
                "brand_name": "UnionBolt AI",
                "landing_page": "NO_PREFERENCE",
                "user_action": "PAY_NOW",
                "return_url": format!("{base}/checkout/success"),
                "cancel_url": format!("{base}/checkout/cancel")
            },
            "payer": {
                "email_address": order.customer.email.trim(),
                "name": {
                    "given_name": order.customer.first_name,
                    "surname": order.customer.last_name
                }
            }
        })
    }
}
