//! UnionBolt HTTP Server
//!
//! Serves the checkout, assistant and video persona APIs.

use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use bolt_core::gateway::STATUS_POLL_INTERVAL;
use bolt_server::{AppConfig, AppState, router};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load environment
    dotenvy::dotenv().ok();

    let config = AppConfig::from_env();
    tracing::info!(
        app_env = %config.app_env,
        production = config.is_production(),
        backend = ?config.backend,
        "Configuration loaded"
    );
    let state = AppState::from_config(&config);

    // Initial connection test, then keep the cached status fresh
    match state.gateway.check_connection().await {
        Ok(status) if status.connected => {
            tracing::info!(
                backend = state.gateway.backend().name(),
                assistant_id = %status.assistant_id,
                "✓ Knowledge backend connected"
            );
        }
        Ok(status) => {
            tracing::warn!(error = ?status.error, "⚠ Knowledge backend unreachable - using fallback replies");
        }
        Err(e) => {
            tracing::warn!(error = %e, "⚠ Knowledge backend misconfigured - using fallback replies");
        }
    }
    Arc::clone(&state.gateway).spawn_status_poller(STATUS_POLL_INTERVAL);

    if state.checkout.stripe_configured() {
        tracing::info!("✓ Stripe configured");
    }
    if state.checkout.paypal_configured() {
        tracing::info!("✓ PayPal configured");
    }
    if !state.tavus.config().is_configured() {
        tracing::warn!("⚠ Tavus not configured - video persona disabled");
    }

    let app = router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;

    tracing::info!("══════════════════════════════════════════════════");
    tracing::info!("🚀 UnionBolt server running on http://{}", config.bind_addr);
    tracing::info!("══════════════════════════════════════════════════");
    tracing::info!("");
    tracing::info!("Endpoints:");
    tracing::info!("  GET  /health                               - Health check");
    tracing::info!("  GET  /api/plans                            - Plan catalog");
    tracing::info!("  POST /api/chat                             - Ask the assistant");
    tracing::info!("  GET  /api/test-connection                  - Test knowledge backend");
    tracing::info!("  POST /api/payments/create-payment-intent   - Stripe card payment");
    tracing::info!("  POST /api/payments/paypal/create-order     - PayPal order");
    tracing::info!("  POST /api/payments/paypal/capture-order    - PayPal capture");
    tracing::info!("  POST /api/payments/google-pay/process      - Google Pay payment");
    tracing::info!("  POST /api/payments/webhook                 - Stripe webhook");
    tracing::info!("  POST /api/tavus/conversation               - Start video session");
    tracing::info!("");

    axum::serve(listener, app).await?;

    Ok(())
}
