//! Checkout Service
//!
//! Server half of every payment adapter. Each operation validates the
//! attempt against the plan catalog before any gateway is contacted:
//!
//! ```text
//! ┌────────────────┐   ┌──────────┐   ┌───────────────┐   ┌───────────┐
//! │ PaymentAttempt │──▶│ validate │──▶│ Stripe/PayPal │──▶│ Order Log │
//! └────────────────┘   └──────────┘   └───────────────┘   └───────────┘
//! ```

use std::sync::Arc;

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal_macros::dec;
use serde::Serialize;
use serde_json::Value;

use crate::billing::BillingInfo;
use crate::catalog::{BillingCadence, PlanSelection, lookup, to_cents};
use crate::error::{PaymentError, Result};
use crate::google_pay::{CustomerSummary, GooglePayResult, classify_stripe_error, extract_card_token};
use crate::orders::{OrderLog, OrderRecord, PaymentProvider};
use crate::paypal::{CaptureReceipt, NewOrder, PayPalClient, PayPalOrder};
use crate::stripe::{Confirmation, NewPaymentIntent, StripeClient};

/// Smallest accepted amount, in the unit the provider is charged in
/// (cents for Stripe and Google Pay, dollars for PayPal)
pub fn minimum_amount(provider: PaymentProvider) -> Decimal {
    match provider {
        PaymentProvider::Stripe | PaymentProvider::GooglePay => dec!(50),
        PaymentProvider::PayPal => dec!(1),
    }
}

/// One payment submission
#[derive(Clone, Debug)]
pub struct PaymentAttempt {
    pub provider: PaymentProvider,

    /// Cents for Stripe and Google Pay, dollars for PayPal
    pub amount: Decimal,

    pub currency: String,
    pub plan_id: String,
    pub billing: BillingCadence,
    pub customer: BillingInfo,
}

impl PaymentAttempt {
    /// Build the attempt a client would send for a plan selection
    pub fn for_selection(
        provider: PaymentProvider,
        selection: &PlanSelection,
        customer: BillingInfo,
    ) -> Self {
        let amount = match provider {
            PaymentProvider::PayPal => selection.price(),
            PaymentProvider::Stripe | PaymentProvider::GooglePay => {
                Decimal::from(selection.amount_cents())
            }
        };

        Self {
            provider,
            amount,
            currency: "usd".into(),
            plan_id: selection.plan_id().into(),
            billing: selection.billing,
            customer,
        }
    }

    /// Reject amounts below the provider minimum
    pub fn check_minimum(&self) -> Result<()> {
        if self.amount < minimum_amount(self.provider) {
            return Err(PaymentError::validation("Amount too small"));
        }
        Ok(())
    }

    /// Check amount, customer and plan; returns the plan being bought
    pub fn validate(&self) -> Result<PlanSelection> {
        self.check_minimum()?;
        self.customer.validate()?;

        let selection = lookup(&self.plan_id)
            .map(|plan| PlanSelection::new(plan, self.billing))
            .ok_or_else(|| PaymentError::validation("Amount does not match the selected plan"))?;

        let expected = match self.provider {
            PaymentProvider::PayPal => selection.price(),
            PaymentProvider::Stripe | PaymentProvider::GooglePay => {
                Decimal::from(selection.amount_cents())
            }
        };

        if self.amount != expected {
            tracing::warn!(
                plan_id = %self.plan_id,
                billing = %self.billing,
                amount = %self.amount,
                expected = %expected,
                "Payment amount does not match plan price"
            );
            return Err(PaymentError::validation("Amount does not match the selected plan"));
        }

        Ok(selection)
    }

    pub fn description(&self) -> String {
        let base = format!("UnionBolt AI {} plan - {} billing", self.plan_id, self.billing);
        match self.provider {
            PaymentProvider::GooglePay => format!("{base} (Google Pay)"),
            _ => base,
        }
    }

    fn customer_metadata(&self) -> Vec<(&'static str, String)> {
        vec![
            ("planId", self.plan_id.clone()),
            ("billing", self.billing.to_string()),
            ("company", self.customer.company_or_empty().to_string()),
        ]
    }

    fn intent_metadata(&self) -> Vec<(&'static str, String)> {
        let mut metadata = vec![
            ("planId", self.plan_id.clone()),
            ("billing", self.billing.to_string()),
            ("customerEmail", self.customer.email.trim().to_string()),
            ("customerName", self.customer.full_name()),
            ("company", self.customer.company_or_empty().to_string()),
        ];
        if self.provider == PaymentProvider::GooglePay {
            metadata.push(("paymentMethod", "google_pay".into()));
        }
        metadata
    }
}

/// Created Stripe intent, handed to the browser for confirmation
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IntentCreated {
    pub client_secret: String,
    pub customer_id: String,
    #[serde(skip)]
    pub payment_intent_id: String,
}

/// Capture request for an approved PayPal order
#[derive(Clone, Debug)]
pub struct PayPalCapture {
    pub order_id: String,
    pub plan_id: String,
    pub billing: Option<BillingCadence>,
    pub customer: BillingInfo,
}

/// Payment gateways plus the order log
pub struct Checkout {
    stripe: Option<StripeClient>,
    paypal: Option<PayPalClient>,
    orders: Arc<dyn OrderLog>,
    public_base_url: Option<String>,
}

impl Checkout {
    pub fn new(orders: Arc<dyn OrderLog>) -> Self {
        Self {
            stripe: None,
            paypal: None,
            orders,
            public_base_url: None,
        }
    }

    #[must_use]
    pub fn with_stripe(mut self, client: StripeClient) -> Self {
        self.stripe = Some(client);
        self
    }

    #[must_use]
    pub fn with_paypal(mut self, client: PayPalClient) -> Self {
        self.paypal = Some(client);
        self
    }

    #[must_use]
    pub fn with_public_base_url(mut self, url: impl Into<String>) -> Self {
        self.public_base_url = Some(url.into());
        self
    }

    pub const fn stripe_configured(&self) -> bool {
        self.stripe.is_some()
    }

    pub const fn paypal_configured(&self) -> bool {
        self.paypal.is_some()
    }

    pub fn orders(&self) -> Arc<dyn OrderLog> {
        Arc::clone(&self.orders)
    }

    fn stripe_client(&self) -> Result<&StripeClient> {
        self.stripe
            .as_ref()
            .ok_or_else(|| PaymentError::Config("Stripe is not configured".into()))
    }

    fn paypal_client(&self) -> Result<&PayPalClient> {
        self.paypal
            .as_ref()
            .ok_or_else(|| PaymentError::Config("PayPal is not configured".into()))
    }

    async fn stripe_customer(&self, attempt: &PaymentAttempt) -> Result<CustomerSummary> {
        let customer = self
            .stripe_client()?
            .find_or_create_customer(&attempt.customer, &attempt.customer_metadata())
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Stripe customer lookup failed");
                PaymentError::provider("Failed to process customer information")
            })?;

        Ok(CustomerSummary {
            id: customer.id,
            email: customer.email.unwrap_or_else(|| attempt.customer.email.trim().to_string()),
            name: customer.name.unwrap_or_else(|| attempt.customer.full_name()),
        })
    }

    /// Stripe card flow: customer plus an intent the browser confirms
    pub async fn create_payment_intent(&self, attempt: &PaymentAttempt) -> Result<IntentCreated> {
        attempt.validate()?;
        let stripe = self.stripe_client()?;
        let customer = self.stripe_customer(attempt).await?;

        let intent = stripe
            .create_payment_intent(&NewPaymentIntent {
                amount: to_i64(attempt.amount),
                currency: attempt.currency.clone(),
                customer_id: customer.id.clone(),
                description: attempt.description(),
                metadata: attempt.intent_metadata(),
                confirmation: Confirmation::Automatic,
            })
            .await?;

        Ok(IntentCreated {
            client_secret: intent.client_secret.unwrap_or_default(),
            customer_id: customer.id,
            payment_intent_id: intent.id,
        })
    }

    /// PayPal flow, step one
    pub async fn create_paypal_order(&self, attempt: &PaymentAttempt) -> Result<PayPalOrder> {
        attempt.validate()?;

        self.paypal_client()?
            .create_order(&NewOrder {
                amount: attempt.amount,
                currency: &attempt.currency,
                plan_id: &attempt.plan_id,
                billing: attempt.billing,
                customer: &attempt.customer,
            })
            .await
    }

    /// PayPal flow, step two; a completed capture is recorded
    pub async fn capture_paypal_order(&self, capture: &PayPalCapture) -> Result<CaptureReceipt> {
        let receipt = self.paypal_client()?.capture_order(&capture.order_id).await?;

        let amount = receipt
            .amount
            .as_deref()
            .and_then(|v| v.parse::<Decimal>().ok())
            .map(to_cents)
            .unwrap_or_default();
        let reference = receipt.capture_id.clone().unwrap_or_else(|| receipt.order_id.clone());

        let order = OrderRecord::succeeded(
            PaymentProvider::PayPal,
            reference,
            amount,
            receipt.currency.clone().unwrap_or_else(|| "USD".into()),
        )
        .with_plan(capture.plan_id.clone(), capture.billing)
        .with_customer(&capture.customer);

        self.orders.record(order)?;
        Ok(receipt)
    }

    /// Google Pay flow: confirm the wallet token against a Stripe intent
    pub async fn process_google_pay(
        &self,
        attempt: &PaymentAttempt,
        payment_data: &Value,
    ) -> Result<GooglePayResult> {
        attempt.check_minimum()?;
        let token = extract_card_token(payment_data)?;
        attempt.validate()?;
        let stripe = self.stripe_client()?;
        let customer = self.stripe_customer(attempt).await?;

        let intent = stripe
            .create_payment_intent(&NewPaymentIntent {
                amount: to_i64(attempt.amount),
                currency: attempt.currency.clone(),
                customer_id: customer.id.clone(),
                description: attempt.description(),
                metadata: attempt.intent_metadata(),
                confirmation: Confirmation::CardToken {
                    token,
                    return_url: self
                        .public_base_url
                        .as_ref()
                        .map(|base| format!("{base}/checkout/success")),
                },
            })
            .await
            .map_err(classify_stripe_error)?;

        let result = GooglePayResult::from_intent(intent, customer)?;

        if let GooglePayResult::Succeeded(receipt) = &result {
            self.orders.record(
                OrderRecord::succeeded(
                    PaymentProvider::GooglePay,
                    receipt.payment_intent_id.clone(),
                    to_cents(receipt.amount),
                    receipt.currency.clone(),
                )
                .with_plan(attempt.plan_id.clone(), Some(attempt.billing))
                .with_customer(&attempt.customer),
            )?;
        }

        Ok(result)
    }
}

fn to_i64(amount: Decimal) -> i64 {
    amount.round().to_i64().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::resolve;
    use crate::orders::MemoryOrderLog;
    use crate::paypal::PayPalConfig;
    use crate::stripe::StripeConfig;
    use serde_json::json;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn customer() -> BillingInfo {
        BillingInfo {
            email: "maria@local42.org".into(),
            first_name: "Maria".into(),
            last_name: "Lopez".into(),
            ..Default::default()
        }
    }

    fn attempt(provider: PaymentProvider, plan: &str, billing: &str) -> PaymentAttempt {
        PaymentAttempt::for_selection(provider, &resolve(Some(plan), Some(billing)), customer())
    }

    fn stripe_checkout(server: &MockServer) -> (Checkout, Arc<MemoryOrderLog>) {
        let orders = Arc::new(MemoryOrderLog::new());
        let mut config = StripeConfig::new("sk_test_123");
        config.api_base = server.uri();
        let checkout = Checkout::new(orders.clone()).with_stripe(StripeClient::new(config));
        (checkout, orders)
    }

    async fn mount_customer(server: &MockServer) {
        Mock::given(method("GET"))
            .and(path("/v1/customers"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [{"id": "cus_1", "email": "maria@local42.org", "name": "Maria Lopez"}]
            })))
            .mount(server)
            .await;
    }

    #[test]
    fn test_attempt_amounts() {
        let stripe = attempt(PaymentProvider::Stripe, "journeyman", "yearly");
        assert_eq!(stripe.amount, dec!(79000));
        assert!(stripe.validate().is_ok());

        let paypal = attempt(PaymentProvider::PayPal, "journeyman", "yearly");
        assert_eq!(paypal.amount, dec!(790));
        assert!(paypal.validate().is_ok());
    }

    #[test]
    fn test_amount_too_small() {
        let mut small = attempt(PaymentProvider::Stripe, "apprentice", "monthly");
        small.amount = dec!(49);
        assert_eq!(small.validate().unwrap_err().to_string(), "Amount too small");

        let mut paypal = attempt(PaymentProvider::PayPal, "apprentice", "monthly");
        paypal.amount = dec!(0.5);
        assert_eq!(paypal.validate().unwrap_err().to_string(), "Amount too small");
    }

    #[test]
    fn test_amount_must_match_plan() {
        let mut tampered = attempt(PaymentProvider::Stripe, "master", "yearly");
        tampered.amount = dec!(100);
        assert_eq!(
            tampered.validate().unwrap_err().to_string(),
            "Amount does not match the selected plan"
        );

        let mut unknown = attempt(PaymentProvider::Stripe, "master", "monthly");
        unknown.plan_id = "platinum".into();
        assert!(unknown.validate().is_err());
    }

    #[test]
    fn test_customer_checked_before_plan() {
        let mut bad = attempt(PaymentProvider::GooglePay, "master", "monthly");
        bad.customer.email = "nope".into();
        assert_eq!(
            bad.validate().unwrap_err().to_string(),
            "Please enter a valid email address"
        );
    }

    #[test]
    fn test_descriptions() {
        assert_eq!(
            attempt(PaymentProvider::Stripe, "master", "yearly").description(),
            "UnionBolt AI master plan - yearly billing"
        );
        assert_eq!(
            attempt(PaymentProvider::GooglePay, "apprentice", "monthly").description(),
            "UnionBolt AI apprentice plan - monthly billing (Google Pay)"
        );
    }

    #[tokio::test]
    async fn test_google_pay_token_checked_before_plan() {
        let checkout = Checkout::new(Arc::new(MemoryOrderLog::new()));
        let mut tampered = attempt(PaymentProvider::GooglePay, "apprentice", "monthly");
        tampered.amount = dec!(5000);
        let data = json!({"paymentMethodData": {"tokenizationData": {"token": "not-json"}}});

        let err = checkout.process_google_pay(&tampered, &data).await.unwrap_err();
        assert_eq!(err.to_string(), "Invalid payment token format");

        tampered.amount = dec!(10);
        let err = checkout.process_google_pay(&tampered, &data).await.unwrap_err();
        assert_eq!(err.to_string(), "Amount too small");
    }

    #[tokio::test]
    async fn test_unconfigured_stripe() {
        let checkout = Checkout::new(Arc::new(MemoryOrderLog::new()));
        let err = checkout
            .create_payment_intent(&attempt(PaymentProvider::Stripe, "master", "monthly"))
            .await
            .unwrap_err();
        assert!(matches!(err, PaymentError::Config(_)));
        assert!(!checkout.stripe_configured());
    }

    #[tokio::test]
    async fn test_create_payment_intent() {
        let server = MockServer::start().await;
        mount_customer(&server).await;
        Mock::given(method("POST"))
            .and(path("/v1/payment_intents"))
            .and(body_string_contains("amount=14900"))
            .and(body_string_contains("automatic_payment_methods%5Benabled%5D=true"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "pi_1", "client_secret": "pi_1_secret_abc",
                "status": "requires_payment_method", "amount": 14900, "currency": "usd"
            })))
            .mount(&server)
            .await;

        let (checkout, _) = stripe_checkout(&server);
        let created = checkout
            .create_payment_intent(&attempt(PaymentProvider::Stripe, "master", "monthly"))
            .await
            .unwrap();
        assert_eq!(created.client_secret, "pi_1_secret_abc");
        assert_eq!(created.customer_id, "cus_1");
    }

    #[tokio::test]
    async fn test_customer_failure_is_reported_generically() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/customers"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let (checkout, _) = stripe_checkout(&server);
        let err = checkout
            .create_payment_intent(&attempt(PaymentProvider::Stripe, "master", "monthly"))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Failed to process customer information");
    }

    #[tokio::test]
    async fn test_google_pay_success_is_recorded() {
        let server = MockServer::start().await;
        mount_customer(&server).await;
        Mock::given(method("POST"))
            .and(path("/v1/payment_intents"))
            .and(body_string_contains("tok_visa"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "pi_gp", "client_secret": "pi_gp_secret",
                "status": "succeeded", "amount": 7900, "currency": "usd"
            })))
            .mount(&server)
            .await;

        let (checkout, orders) = stripe_checkout(&server);
        let data = json!({"paymentMethodData": {"tokenizationData": {"token": "{\"id\":\"tok_visa\"}"}}});
        let result = checkout
            .process_google_pay(&attempt(PaymentProvider::GooglePay, "journeyman", "monthly"), &data)
            .await
            .unwrap();

        assert!(matches!(result, GooglePayResult::Succeeded(ref r) if r.amount == dec!(79)));
        let order = orders.find("pi_gp").unwrap().unwrap();
        assert_eq!(order.provider, PaymentProvider::GooglePay);
        assert_eq!(order.amount, 7900);
    }

    #[tokio::test]
    async fn test_google_pay_card_declined() {
        let server = MockServer::start().await;
        mount_customer(&server).await;
        Mock::given(method("POST"))
            .and(path("/v1/payment_intents"))
            .respond_with(ResponseTemplate::new(402).set_body_json(json!({
                "error": {"type": "card_error", "message": "Your card was declined."}
            })))
            .mount(&server)
            .await;

        let (checkout, orders) = stripe_checkout(&server);
        let data = json!({"paymentMethodData": {"tokenizationData": {"token": "{\"id\":\"tok_declined\"}"}}});
        let err = checkout
            .process_google_pay(&attempt(PaymentProvider::GooglePay, "journeyman", "monthly"), &data)
            .await
            .unwrap_err();

        assert!(matches!(err, PaymentError::Declined(ref m) if m == "Your card was declined."));
        assert!(orders.list().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_paypal_capture_records_order() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/oauth2/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access_token": "A21"})))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v2/checkout/orders/ORDER1/capture"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "id": "ORDER1",
                "status": "COMPLETED",
                "purchase_units": [{
                    "amount": {"currency_code": "USD", "value": "790.00"},
                    "payments": {"captures": [{"id": "CAP1", "status": "COMPLETED"}]}
                }],
                "payer": {"email_address": "buyer@example.com", "payer_id": "P1",
                          "name": {"given_name": "Pat", "surname": "Buyer"}}
            })))
            .mount(&server)
            .await;

        let orders = Arc::new(MemoryOrderLog::new());
        let checkout = Checkout::new(orders.clone()).with_paypal(PayPalClient::new(PayPalConfig {
            client_id: "id".into(),
            client_secret: "secret".into(),
            api_base: server.uri(),
            public_base_url: None,
        }));

        let receipt = checkout
            .capture_paypal_order(&PayPalCapture {
                order_id: "ORDER1".into(),
                plan_id: "journeyman".into(),
                billing: Some(BillingCadence::Yearly),
                customer: customer(),
            })
            .await
            .unwrap();

        assert_eq!(receipt.capture_id.as_deref(), Some("CAP1"));
        let order = orders.find("CAP1").unwrap().unwrap();
        assert_eq!(order.amount, 79000);
        assert_eq!(order.customer_email.as_deref(), Some("maria@local42.org"));
    }
}
