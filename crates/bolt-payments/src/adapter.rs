//! Payment Method Adapters
//!
//! Each adapter pairs a browser-side step (card element, PayPal popup,
//! Google Pay sheet) with the matching [`Checkout`] operations, and reduces
//! the whole exchange to a [`PaymentOutcome`].

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::billing::BillingInfo;
use crate::catalog::PlanSelection;
use crate::checkout::{Checkout, PayPalCapture, PaymentAttempt};
use crate::error::{PaymentError, Result};
use crate::google_pay::GooglePayResult;
use crate::orders::PaymentProvider;
use crate::outcome::PaymentOutcome;

/// Payment method offered on the checkout page
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PaymentMethod {
    #[default]
    Stripe,
    #[serde(rename = "paypal")]
    PayPal,
    GooglePay,
}

impl PaymentMethod {
    pub const ALL: [Self; 3] = [Self::Stripe, Self::PayPal, Self::GooglePay];

    /// Test id of the form rendered for this method
    pub const fn form_test_id(self) -> &'static str {
        match self {
            Self::Stripe => "stripe-payment-form",
            Self::PayPal => "paypal-payment-form",
            Self::GooglePay => "google-pay-button",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Stripe => "Credit Card",
            Self::PayPal => "PayPal",
            Self::GooglePay => "Google Pay",
        }
    }

    pub const fn provider(self) -> PaymentProvider {
        match self {
            Self::Stripe => PaymentProvider::Stripe,
            Self::PayPal => PaymentProvider::PayPal,
            Self::GooglePay => PaymentProvider::GooglePay,
        }
    }
}

/// Common contract of every payment method
#[async_trait]
pub trait PaymentAdapter: Send + Sync {
    fn method(&self) -> PaymentMethod;

    /// Run the full payment for one plan; never returns an error
    async fn submit(&self, selection: &PlanSelection, billing: &BillingInfo) -> PaymentOutcome;
}

/// Browser step confirming a Stripe intent with the entered card
#[async_trait]
pub trait CardConfirmer: Send + Sync {
    /// Returns the intent status Stripe reports after confirmation
    async fn confirm_card_payment(&self, client_secret: &str, billing: &BillingInfo) -> Result<String>;
}

/// Browser step where the buyer approves a PayPal order in the popup
#[async_trait]
pub trait PayPalApprover: Send + Sync {
    /// A dismissed popup is an error
    async fn approve(&self, order_id: &str) -> Result<()>;
}

/// Google Pay JS client
#[async_trait]
pub trait GooglePayWallet: Send + Sync {
    async fn is_ready_to_pay(&self) -> bool;

    /// Show the payment sheet and return the `PaymentData` object
    async fn load_payment_data(&self, selection: &PlanSelection) -> Result<Value>;

    /// Finish 3-D Secure; returns the final intent status
    async fn handle_next_action(&self, client_secret: &str) -> Result<String>;
}

/// Card payments through Stripe Elements
pub struct StripeAdapter {
    checkout: Arc<Checkout>,
    card: Arc<dyn CardConfirmer>,
}

impl StripeAdapter {
    pub fn new(checkout: Arc<Checkout>, card: Arc<dyn CardConfirmer>) -> Self {
        Self { checkout, card }
    }

    async fn pay(&self, selection: &PlanSelection, billing: &BillingInfo) -> Result<String> {
        let attempt = PaymentAttempt::for_selection(PaymentProvider::Stripe, selection, billing.clone());
        let intent = self.checkout.create_payment_intent(&attempt).await?;

        let status = self.card.confirm_card_payment(&intent.client_secret, billing).await?;
        if status == "succeeded" {
            Ok(intent.payment_intent_id)
        } else {
            Err(PaymentError::Declined(
                "Payment failed or requires additional verification".into(),
            ))
        }
    }
}

#[async_trait]
impl PaymentAdapter for StripeAdapter {
    fn method(&self) -> PaymentMethod {
        PaymentMethod::Stripe
    }

    async fn submit(&self, selection: &PlanSelection, billing: &BillingInfo) -> PaymentOutcome {
        match self.pay(selection, billing).await {
            Ok(reference) => PaymentOutcome::ok(reference),
            Err(e) => e.into(),
        }
    }
}

/// PayPal popup checkout
pub struct PayPalAdapter {
    checkout: Arc<Checkout>,
    approver: Arc<dyn PayPalApprover>,
}

impl PayPalAdapter {
    pub fn new(checkout: Arc<Checkout>, approver: Arc<dyn PayPalApprover>) -> Self {
        Self { checkout, approver }
    }

    async fn pay(&self, selection: &PlanSelection, billing: &BillingInfo) -> Result<String> {
        let attempt = PaymentAttempt::for_selection(PaymentProvider::PayPal, selection, billing.clone());
        let order = self.checkout.create_paypal_order(&attempt).await?;

        self.approver.approve(&order.id).await?;

        let receipt = self
            .checkout
            .capture_paypal_order(&PayPalCapture {
                order_id: order.id,
                plan_id: attempt.plan_id,
                billing: Some(attempt.billing),
                customer: attempt.customer,
            })
            .await?;

        Ok(receipt.capture_id.unwrap_or(receipt.order_id))
    }
}

#[async_trait]
impl PaymentAdapter for PayPalAdapter {
    fn method(&self) -> PaymentMethod {
        PaymentMethod::PayPal
    }

    async fn submit(&self, selection: &PlanSelection, billing: &BillingInfo) -> PaymentOutcome {
        match self.pay(selection, billing).await {
            Ok(reference) => PaymentOutcome::ok(reference),
            Err(e) => e.into(),
        }
    }
}

/// Google Pay button
pub struct GooglePayAdapter {
    checkout: Arc<Checkout>,
    wallet: Arc<dyn GooglePayWallet>,
}

impl GooglePayAdapter {
    pub fn new(checkout: Arc<Checkout>, wallet: Arc<dyn GooglePayWallet>) -> Self {
        Self { checkout, wallet }
    }

    async fn pay(&self, selection: &PlanSelection, billing: &BillingInfo) -> Result<String> {
        if !self.wallet.is_ready_to_pay().await {
            return Err(PaymentError::provider("Google Pay is not available on this device"));
        }

        let payment_data = self.wallet.load_payment_data(selection).await?;
        let attempt = PaymentAttempt::for_selection(PaymentProvider::GooglePay, selection, billing.clone());

        match self.checkout.process_google_pay(&attempt, &payment_data).await? {
            GooglePayResult::Succeeded(receipt) => Ok(receipt.payment_intent_id),
            GooglePayResult::RequiresAction {
                payment_intent_id,
                client_secret,
            } => {
                let status = self.wallet.handle_next_action(&client_secret).await?;
                if status == "succeeded" {
                    Ok(payment_intent_id)
                } else {
                    Err(PaymentError::Declined("Payment authentication failed".into()))
                }
            }
        }
    }
}

#[async_trait]
impl PaymentAdapter for GooglePayAdapter {
    fn method(&self) -> PaymentMethod {
        PaymentMethod::GooglePay
    }

    async fn submit(&self, selection: &PlanSelection, billing: &BillingInfo) -> PaymentOutcome {
        match self.pay(selection, billing).await {
            Ok(reference) => PaymentOutcome::ok(reference),
            Err(e) => e.into(),
        }
    }
}
