//! # bolt-server
//!
//! Axum HTTP surface for UnionBolt: checkout endpoints for Stripe, PayPal
//! and Google Pay, the assistant chat API and the Tavus video persona.

pub mod config;
pub mod error;
pub mod handlers;
pub mod state;

use axum::{
    Router,
    routing::{delete, get, post},
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub use config::AppConfig;
pub use error::ApiError;
pub use state::AppState;

use crate::handlers::{
    capture_paypal_order, chat_handler, conversation_health, create_conversation, create_payment_intent,
    create_paypal_order, end_conversation, health_check, list_plans, process_google_pay, stripe_webhook,
    test_connection,
};

/// Build the application router
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health & catalog
        .route("/health", get(health_check))
        .route("/api/plans", get(list_plans))

        // Assistant
        .route("/api/chat", post(chat_handler))
        .route("/api/test-connection", get(test_connection))

        // Payments
        .route("/api/payments/create-payment-intent", post(create_payment_intent))
        .route("/api/payments/paypal/create-order", post(create_paypal_order))
        .route("/api/payments/paypal/capture-order", post(capture_paypal_order))
        .route("/api/payments/google-pay/process", post(process_google_pay))
        .route("/api/payments/webhook", post(stripe_webhook))

        // Video persona
        .route("/api/tavus/conversation", post(create_conversation).get(conversation_health))
        .route("/api/tavus/conversation/{id}", delete(end_conversation))

        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
