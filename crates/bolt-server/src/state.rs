//! Application State

use std::sync::Arc;

use bolt_core::AssistantGateway;
use bolt_payments::{Checkout, MemoryOrderLog, OrderLog, PayPalClient, StripeClient, WebhookHandler};
use bolt_runtime::{TavusClient, build_backend};

use crate::config::AppConfig;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Assistant gateway with cached backend status
    pub gateway: Arc<AssistantGateway>,

    /// Payment gateways and order log
    pub checkout: Arc<Checkout>,

    /// Stripe webhook verification
    pub webhooks: Arc<WebhookHandler>,

    /// Tavus video persona client
    pub tavus: Arc<TavusClient>,

    /// `APP_ENV`, echoed by the connection test
    pub app_env: String,
}

impl AppState {
    /// Build every client from configuration
    pub fn from_config(config: &AppConfig) -> Self {
        let orders: Arc<dyn OrderLog> = Arc::new(MemoryOrderLog::new());

        let mut checkout = Checkout::new(Arc::clone(&orders));
        if let Some(stripe) = &config.stripe {
            checkout = checkout.with_stripe(StripeClient::new(stripe.clone()));
        }
        if let Some(paypal) = &config.paypal {
            checkout = checkout.with_paypal(PayPalClient::new(paypal.clone()));
        }
        if let Some(url) = &config.public_base_url {
            checkout = checkout.with_public_base_url(url.clone());
        }

        let webhook_secret = config
            .webhook_secret
            .clone()
            .or_else(|| config.stripe.as_ref().and_then(|s| s.webhook_secret.clone()));

        Self {
            gateway: Arc::new(AssistantGateway::new(build_backend(config.backend))),
            checkout: Arc::new(checkout),
            webhooks: Arc::new(WebhookHandler::new(orders, webhook_secret)),
            tavus: Arc::new(TavusClient::new(config.tavus.clone())),
            app_env: config.app_env.clone(),
        }
    }
}
