//! Stripe REST Client
//!
//! Thin form-encoded client for the Stripe customers and payment intents
//! endpoints. Stripe errors keep their `type` so callers can tell card
//! declines from malformed requests.

use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::billing::BillingInfo;
use crate::error::{PaymentError, Result};

/// Stripe API base used when `STRIPE_API_BASE` is unset
pub const DEFAULT_API_BASE: &str = "https://api.stripe.com";

/// Stripe client configuration
#[derive(Clone, Debug)]
pub struct StripeConfig {
    pub secret_key: String,
    pub webhook_secret: Option<String>,
    pub api_base: String,
}

impl StripeConfig {
    pub fn new(secret_key: impl Into<String>) -> Self {
        Self {
            secret_key: secret_key.into(),
            webhook_secret: None,
            api_base: DEFAULT_API_BASE.into(),
        }
    }

    /// Create from environment variables
    pub fn from_env() -> Result<Self> {
        let secret_key = std::env::var("STRIPE_SECRET_KEY")
            .ok()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| PaymentError::Config("STRIPE_SECRET_KEY not set".into()))?;

        Ok(Self {
            secret_key,
            webhook_secret: std::env::var("STRIPE_WEBHOOK_SECRET").ok().filter(|s| !s.is_empty()),
            api_base: std::env::var("STRIPE_API_BASE").unwrap_or_else(|_| DEFAULT_API_BASE.into()),
        })
    }
}

/// Stripe customer
#[derive(Clone, Debug, Deserialize)]
pub struct Customer {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

/// Stripe payment intent
#[derive(Clone, Debug, Deserialize)]
pub struct PaymentIntent {
    pub id: String,
    #[serde(default)]
    pub client_secret: Option<String>,
    pub status: String,
    pub amount: i64,
    pub currency: String,
}

/// How the intent gets confirmed
#[derive(Clone, Debug)]
pub enum Confirmation {
    /// The browser confirms later with the client secret
    Automatic,

    /// Confirm immediately with a tokenized card
    CardToken {
        token: String,
        return_url: Option<String>,
    },
}

/// Parameters for a new payment intent
#[derive(Clone, Debug)]
pub struct NewPaymentIntent {
    /// Amount in cents
    pub amount: i64,
    pub currency: String,
    pub customer_id: String,
    pub description: String,
    pub metadata: Vec<(&'static str, String)>,
    pub confirmation: Confirmation,
}

impl NewPaymentIntent {
    fn form(&self) -> Vec<(String, String)> {
        let mut form = vec![
            ("amount".to_string(), self.amount.to_string()),
            ("currency".to_string(), self.currency.to_lowercase()),
            ("customer".to_string(), self.customer_id.clone()),
            ("description".to_string(), self.description.clone()),
        ];
        form.extend(metadata_fields(&self.metadata));

        match &self.confirmation {
            Confirmation::Automatic => {
                form.push(("automatic_payment_methods[enabled]".into(), "true".into()));
            }
            Confirmation::CardToken { token, return_url } => {
                form.push(("payment_method_data[type]".into(), "card".into()));
                form.push(("payment_method_data[card][token]".into(), token.clone()));
                form.push(("confirmation_method".into(), "manual".into()));
                form.push(("confirm".into(), "true".into()));
                if let Some(url) = return_url {
                    form.push(("return_url".into(), url.clone()));
                }
            }
        }

        form
    }
}

fn metadata_fields<'a>(
    metadata: &'a [(&'static str, String)],
) -> impl Iterator<Item = (String, String)> + 'a {
    metadata
        .iter()
        .map(|(key, value)| (format!("metadata[{key}]"), value.clone()))
}

#[derive(Deserialize)]
struct CustomerList {
    data: Vec<Customer>,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(rename = "type", default)]
    error_type: String,
    #[serde(default)]
    message: Option<String>,
}

/// Stripe client wrapper
#[derive(Clone)]
pub struct StripeClient {
    client: Client,
    config: StripeConfig,
}

impl StripeClient {
    pub fn new(config: StripeConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    /// Get the webhook secret
    pub fn webhook_secret(&self) -> Option<&str> {
        self.config.webhook_secret.as_deref()
    }

    fn url(&self, path: &str) -> String {
        format!("{}/v1/{path}", self.config.api_base)
    }

    /// Find the first customer with this email
    pub async fn find_customer(&self, email: &str) -> Result<Option<Customer>> {
        let request = self
            .client
            .get(self.url("customers"))
            .query(&[("email", email), ("limit", "1")]);

        let list: CustomerList = self.send(request).await?;
        Ok(list.data.into_iter().next())
    }

    /// Create a customer from billing details
    pub async fn create_customer(
        &self,
        info: &BillingInfo,
        metadata: &[(&'static str, String)],
    ) -> Result<Customer> {
        let mut form = vec![
            ("email".to_string(), info.email.trim().to_string()),
            ("name".to_string(), info.full_name()),
        ];
        form.extend(metadata_fields(metadata));

        let customer: Customer = self.send(self.client.post(self.url("customers")).form(&form)).await?;
        tracing::info!(customer_id = %customer.id, "Stripe customer created");
        Ok(customer)
    }

    /// Reuse the customer registered under this email, or create one
    pub async fn find_or_create_customer(
        &self,
        info: &BillingInfo,
        metadata: &[(&'static str, String)],
    ) -> Result<Customer> {
        match self.find_customer(info.email.trim()).await? {
            Some(customer) => Ok(customer),
            None => self.create_customer(info, metadata).await,
        }
    }

    /// Create a payment intent
    pub async fn create_payment_intent(&self, params: &NewPaymentIntent) -> Result<PaymentIntent> {
        let request = self
            .client
            .post(self.url("payment_intents"))
            .form(&params.form());

        let intent: PaymentIntent = self.send(request).await?;

        tracing::info!(
            payment_intent_id = %intent.id,
            status = %intent.status,
            amount = intent.amount,
            "Stripe payment intent created"
        );

        Ok(intent)
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let response = request.bearer_auth(&self.config.secret_key).send().await?;

        let status = response.status();
        let body = response.text().await?;

        if status.is_success() {
            return Ok(serde_json::from_str(&body)?);
        }

        tracing::warn!(status = %status, body = %body, "Stripe request failed");

        match serde_json::from_str::<ErrorEnvelope>(&body) {
            Ok(envelope) => Err(PaymentError::Stripe {
                message: envelope
                    .error
                    .message
                    .unwrap_or_else(|| format!("Stripe returned {status}")),
                error_type: envelope.error.error_type,
            }),
            Err(_) => Err(PaymentError::provider(format!("Stripe returned {status}"))),
        }
    }
}
