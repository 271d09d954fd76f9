//! # bolt-payments
//!
//! Plan catalog, billing details and checkout for UnionBolt AI.
//!
//! ## Payment Methods
//!
//! Three providers sit behind one [`PaymentAdapter`] contract. Each adapter
//! has a browser step and a server step:
//!
//! ```text
//! Stripe      create-payment-intent ──▶ confirmCardPayment(clientSecret)
//! PayPal      create-order ──▶ popup approval ──▶ capture-order
//! Google Pay  loadPaymentData ──▶ google-pay/process (token confirmed on Stripe)
//! ```
//!
//! Every server step validates the amount against the plan catalog before a
//! gateway is called, and every adapter reduces its result to a
//! [`PaymentOutcome`].
//!
//! ## Usage
//!
//! ```rust,ignore
//! use bolt_payments::{Checkout, CheckoutOrchestrator, MemoryOrderLog, StripeAdapter, StripeClient};
//!
//! let orders = Arc::new(MemoryOrderLog::new());
//! let checkout = Arc::new(Checkout::new(orders).with_stripe(StripeClient::new(stripe_config)));
//! let stripe = Arc::new(StripeAdapter::new(checkout.clone(), card_element));
//!
//! let mut page = CheckoutOrchestrator::from_query("plan=master&billing=yearly", vec![stripe]);
//! page.update_billing("email", "steward@local42.org")?;
//! page.update_billing("firstName", "Maria")?;
//! page.update_billing("lastName", "Lopez")?;
//!
//! page.submit().await?;
//! ```

mod adapter;
mod billing;
mod catalog;
mod checkout;
mod error;
mod google_pay;
mod orchestrator;
mod orders;
mod outcome;
mod paypal;
mod stripe;
mod webhook;

pub use adapter::{
    CardConfirmer, GooglePayAdapter, GooglePayWallet, PayPalAdapter, PayPalApprover, PaymentAdapter,
    PaymentMethod, StripeAdapter,
};
pub use billing::{BillingField, BillingInfo, is_valid_email};
pub use catalog::{
    BillingCadence, DEFAULT_PLAN_ID, Plan, PlanQuote, PlanSelection, format_dollars, from_cents, lookup,
    plans, resolve, to_cents,
};
pub use checkout::{Checkout, IntentCreated, PayPalCapture, PaymentAttempt, minimum_amount};
pub use error::{FailureKind, PaymentError, Result};
pub use google_pay::{CustomerSummary, GooglePayReceipt, GooglePayResult, extract_card_token};
pub use orchestrator::{CheckoutOrchestrator, CheckoutState, CheckoutView, SUCCESS_HEADLINE};
pub use orders::{MemoryOrderLog, OrderLog, OrderRecord, OrderStatus, PaymentProvider};
pub use outcome::PaymentOutcome;
pub use paypal::{CaptureReceipt, LIVE_API_BASE, Payer, PayPalClient, PayPalConfig, PayPalOrder, SANDBOX_API_BASE};
pub use stripe::{StripeClient, StripeConfig};
pub use webhook::{SIGNATURE_TOLERANCE_SECS, WebhookEvent, WebhookHandler, sign_payload, verify_signature};
