//! Server Configuration
//!
//! Everything the server reads from the environment, gathered once at
//! startup. Provider credentials that are missing leave the provider
//! unconfigured rather than failing startup.

use bolt_payments::{PayPalConfig, StripeConfig};
use bolt_runtime::{BackendKind, TavusConfig};

/// Default listen address
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";

/// Application configuration
#[derive(Clone, Debug, Default)]
pub struct AppConfig {
    pub bind_addr: String,

    /// `APP_ENV`, e.g. `development` or `production`
    pub app_env: String,

    pub public_base_url: Option<String>,
    pub stripe: Option<StripeConfig>,
    pub webhook_secret: Option<String>,
    pub paypal: Option<PayPalConfig>,
    pub backend: BackendKind,
    pub tavus: TavusConfig,
}

impl AppConfig {
    /// Create from environment variables
    pub fn from_env() -> Self {
        let var = |name: &str| std::env::var(name).ok().filter(|v| !v.is_empty());

        let stripe = match StripeConfig::from_env() {
            Ok(config) => Some(config),
            Err(e) => {
                tracing::warn!(error = %e, "Stripe not configured - card and Google Pay payments disabled");
                None
            }
        };

        let paypal = match PayPalConfig::from_env() {
            Ok(config) => Some(config),
            Err(e) => {
                tracing::warn!(error = %e, "PayPal not configured - PayPal payments disabled");
                None
            }
        };

        Self {
            bind_addr: var("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.into()),
            app_env: var("APP_ENV").unwrap_or_else(|| "development".into()),
            public_base_url: var("PUBLIC_BASE_URL"),
            stripe,
            webhook_secret: var("STRIPE_WEBHOOK_SECRET"),
            paypal,
            backend: BackendKind::from_env(),
            tavus: TavusConfig::from_env(),
        }
    }

    pub fn is_production(&self) -> bool {
        self.app_env.eq_ignore_ascii_case("production")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_production_flag() {
        let mut config = AppConfig::default();
        assert!(!config.is_production());

        config.app_env = "Production".into();
        assert!(config.is_production());
    }
}
