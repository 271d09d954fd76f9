//! Checkout Orchestrator
//!
//! Drives the checkout page:
//!
//! ```text
//! SelectingMethod ──submit──▶ Processing ──ok──▶ Succeeded
//!        ▲                        │
//!        └──── acknowledge ── Failed ◀──err──┘
//! ```
//!
//! One adapter is active at a time. Switching methods while idle drops
//! whatever the previous form had half-entered.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;

use crate::adapter::{PaymentAdapter, PaymentMethod};
use crate::billing::BillingInfo;
use crate::catalog::{PlanQuote, PlanSelection, resolve};
use crate::error::{PaymentError, Result};
use crate::outcome::PaymentOutcome;

pub const SUCCESS_HEADLINE: &str = "Payment Successful!";

/// Checkout page state
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum CheckoutState {
    SelectingMethod,
    Processing,
    Succeeded { reference: String },
    Failed { message: String },
}

/// What the page should render
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutView {
    /// Test id of the visible payment form, hidden once paid
    pub active_form: Option<&'static str>,
    pub processing: bool,
    pub headline: Option<&'static str>,
    pub message: Option<String>,
    pub error: Option<String>,
    pub order_summary: PlanQuote,
}

/// Checkout page controller
pub struct CheckoutOrchestrator {
    selection: PlanSelection,
    billing: BillingInfo,
    adapters: HashMap<PaymentMethod, Arc<dyn PaymentAdapter>>,
    active: PaymentMethod,
    draft: HashMap<String, String>,
    state: CheckoutState,
}

impl CheckoutOrchestrator {
    pub fn new(selection: PlanSelection, adapters: Vec<Arc<dyn PaymentAdapter>>) -> Self {
        Self {
            selection,
            billing: BillingInfo::default(),
            adapters: adapters.into_iter().map(|a| (a.method(), a)).collect(),
            active: PaymentMethod::default(),
            draft: HashMap::new(),
            state: CheckoutState::SelectingMethod,
        }
    }

    /// Build from a checkout URL query such as `plan=master&billing=yearly`
    pub fn from_query(query: &str, adapters: Vec<Arc<dyn PaymentAdapter>>) -> Self {
        let mut plan = None;
        let mut billing = None;

        for pair in query.trim_start_matches('?').split('&') {
            match pair.split_once('=') {
                Some(("plan", value)) => plan = Some(value),
                Some(("billing", value)) => billing = Some(value),
                _ => {}
            }
        }

        Self::new(resolve(plan, billing), adapters)
    }

    pub const fn selection(&self) -> &PlanSelection {
        &self.selection
    }

    pub const fn billing(&self) -> &BillingInfo {
        &self.billing
    }

    pub const fn state(&self) -> &CheckoutState {
        &self.state
    }

    pub const fn active_method(&self) -> PaymentMethod {
        self.active
    }

    /// Half-entered input of the active payment form
    pub const fn draft(&self) -> &HashMap<String, String> {
        &self.draft
    }

    pub fn update_billing(&mut self, field: &str, value: impl Into<String>) -> Result<()> {
        self.billing = self.billing.update(field, value)?;
        Ok(())
    }

    pub fn enter_draft(&mut self, field: impl Into<String>, value: impl Into<String>) {
        self.draft.insert(field.into(), value.into());
    }

    /// Switch payment method; refused while a payment is in flight
    pub fn select_method(&mut self, method: PaymentMethod) -> Result<()> {
        match self.state {
            CheckoutState::Processing => {
                return Err(PaymentError::InvalidState(
                    "Cannot change payment method while processing".into(),
                ));
            }
            CheckoutState::Succeeded { .. } => {
                return Err(PaymentError::InvalidState("Payment already completed".into()));
            }
            CheckoutState::Failed { .. } => self.state = CheckoutState::SelectingMethod,
            CheckoutState::SelectingMethod => {}
        }

        if method != self.active {
            self.draft.clear();
            self.active = method;
        }
        Ok(())
    }

    /// Validate billing and hand the payment to the active adapter
    pub fn begin_submit(&mut self) -> Result<Arc<dyn PaymentAdapter>> {
        if self.state != CheckoutState::SelectingMethod {
            return Err(PaymentError::InvalidState("Payment already submitted".into()));
        }

        self.billing.validate()?;

        let adapter = self
            .adapters
            .get(&self.active)
            .cloned()
            .ok_or_else(|| PaymentError::Config(format!("{} is not available", self.active.label())))?;

        self.state = CheckoutState::Processing;
        Ok(adapter)
    }

    /// Apply the adapter's outcome
    pub fn finish(&mut self, outcome: PaymentOutcome) -> &CheckoutState {
        self.state = match outcome {
            PaymentOutcome::Ok { reference } => {
                tracing::info!(method = ?self.active, reference = %reference, "Checkout completed");
                self.draft.clear();
                CheckoutState::Succeeded { reference }
            }
            PaymentOutcome::RequiresAction { .. } => CheckoutState::Failed {
                message: "Additional authentication is required".into(),
            },
            PaymentOutcome::Err { kind, message } => {
                tracing::warn!(method = ?self.active, kind = ?kind, message = %message, "Checkout failed");
                CheckoutState::Failed { message }
            }
        };
        &self.state
    }

    /// Submit and wait for the active adapter
    pub async fn submit(&mut self) -> Result<&CheckoutState> {
        let adapter = self.begin_submit()?;
        let outcome = adapter.submit(&self.selection, &self.billing).await;
        Ok(self.finish(outcome))
    }

    /// Dismiss an error and return to method selection
    pub fn acknowledge_error(&mut self) {
        if matches!(self.state, CheckoutState::Failed { .. }) {
            self.state = CheckoutState::SelectingMethod;
        }
    }

    pub fn view(&self) -> CheckoutView {
        let mut view = CheckoutView {
            active_form: Some(self.active.form_test_id()),
            processing: false,
            headline: None,
            message: None,
            error: None,
            order_summary: self.selection.quote(),
        };

        match &self.state {
            CheckoutState::SelectingMethod => {}
            CheckoutState::Processing => view.processing = true,
            CheckoutState::Succeeded { .. } => {
                view.active_form = None;
                view.headline = Some(SUCCESS_HEADLINE);
                view.message = Some(format!(
                    "Welcome to UnionBolt AI {} plan. You'll receive a confirmation email shortly.",
                    self.selection.plan.name
                ));
            }
            CheckoutState::Failed { message } => view.error = Some(message.clone()),
        }

        view
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::BillingCadence;
    use crate::error::FailureKind;
    use async_trait::async_trait;

    struct Scripted {
        method: PaymentMethod,
        outcome: PaymentOutcome,
    }

    #[async_trait]
    impl PaymentAdapter for Scripted {
        fn method(&self) -> PaymentMethod {
            self.method
        }

        async fn submit(&self, _: &PlanSelection, _: &BillingInfo) -> PaymentOutcome {
            self.outcome.clone()
        }
    }

    fn adapters(stripe: PaymentOutcome) -> Vec<Arc<dyn PaymentAdapter>> {
        vec![
            Arc::new(Scripted {
                method: PaymentMethod::Stripe,
                outcome: stripe,
            }),
            Arc::new(Scripted {
                method: PaymentMethod::PayPal,
                outcome: PaymentOutcome::ok("CAP1"),
            }),
            Arc::new(Scripted {
                method: PaymentMethod::GooglePay,
                outcome: PaymentOutcome::ok("pi_gp"),
            }),
        ]
    }

    fn filled(orchestrator: &mut CheckoutOrchestrator) {
        orchestrator.update_billing("email", "maria@local42.org").unwrap();
        orchestrator.update_billing("firstName", "Maria").unwrap();
        orchestrator.update_billing("lastName", "Lopez").unwrap();
    }

    #[test]
    fn test_from_query() {
        let orchestrator = CheckoutOrchestrator::from_query("?plan=master&billing=yearly", vec![]);
        assert_eq!(orchestrator.selection().plan_id(), "master");
        assert_eq!(orchestrator.selection().billing, BillingCadence::Yearly);

        let fallback = CheckoutOrchestrator::from_query("plan=bogus", vec![]);
        assert_eq!(fallback.selection().plan_id(), "journeyman");
        assert_eq!(fallback.selection().billing, BillingCadence::Monthly);
    }

    #[tokio::test]
    async fn test_successful_stripe_checkout() {
        let mut orchestrator =
            CheckoutOrchestrator::from_query("plan=journeyman&billing=monthly", adapters(PaymentOutcome::ok("pi_1")));
        filled(&mut orchestrator);

        let state = orchestrator.submit().await.unwrap();
        assert_eq!(
            state,
            &CheckoutState::Succeeded {
                reference: "pi_1".into()
            }
        );

        let view = orchestrator.view();
        assert_eq!(view.headline, Some("Payment Successful!"));
        assert_eq!(
            view.message.as_deref(),
            Some("Welcome to UnionBolt AI Journeyman plan. You'll receive a confirmation email shortly.")
        );
        assert!(view.active_form.is_none());
    }

    #[test]
    fn test_switching_tabs_swaps_forms_and_clears_draft() {
        let mut orchestrator = CheckoutOrchestrator::new(resolve(None, None), adapters(PaymentOutcome::ok("x")));
        assert_eq!(orchestrator.view().active_form, Some("stripe-payment-form"));

        orchestrator.enter_draft("cardholder", "Maria Lopez");
        orchestrator.select_method(PaymentMethod::PayPal).unwrap();
        assert_eq!(orchestrator.view().active_form, Some("paypal-payment-form"));
        assert!(orchestrator.draft().is_empty());

        orchestrator.select_method(PaymentMethod::GooglePay).unwrap();
        assert_eq!(orchestrator.view().active_form, Some("google-pay-button"));
    }

    #[test]
    fn test_switch_refused_while_processing() {
        let mut orchestrator = CheckoutOrchestrator::new(resolve(None, None), adapters(PaymentOutcome::ok("x")));
        filled(&mut orchestrator);

        orchestrator.begin_submit().unwrap();
        assert!(orchestrator.view().processing);
        assert!(matches!(
            orchestrator.select_method(PaymentMethod::PayPal),
            Err(PaymentError::InvalidState(_))
        ));
        assert_eq!(orchestrator.active_method(), PaymentMethod::Stripe);
    }

    #[tokio::test]
    async fn test_invalid_billing_blocks_submit() {
        let mut orchestrator = CheckoutOrchestrator::new(resolve(None, None), adapters(PaymentOutcome::ok("x")));
        orchestrator.update_billing("email", "maria@local42.org").unwrap();

        let err = orchestrator.submit().await.unwrap_err();
        assert_eq!(err.to_string(), "First name is required");
        assert_eq!(orchestrator.state(), &CheckoutState::SelectingMethod);
    }

    #[tokio::test]
    async fn test_failure_then_acknowledge() {
        let mut orchestrator = CheckoutOrchestrator::new(
            resolve(None, None),
            adapters(PaymentOutcome::failed(FailureKind::Provider, "Your card was declined.")),
        );
        filled(&mut orchestrator);

        orchestrator.submit().await.unwrap();
        assert_eq!(orchestrator.view().error.as_deref(), Some("Your card was declined."));

        orchestrator.acknowledge_error();
        assert_eq!(orchestrator.state(), &CheckoutState::SelectingMethod);

        orchestrator.select_method(PaymentMethod::PayPal).unwrap();
        let state = orchestrator.submit().await.unwrap();
        assert_eq!(
            state,
            &CheckoutState::Succeeded {
                reference: "CAP1".into()
            }
        );
    }

    #[test]
    fn test_missing_adapter() {
        let mut orchestrator = CheckoutOrchestrator::new(resolve(None, None), vec![]);
        filled(&mut orchestrator);
        assert!(matches!(orchestrator.begin_submit(), Err(PaymentError::Config(_))));
        assert_eq!(orchestrator.state(), &CheckoutState::SelectingMethod);
    }
}
