//! HTTP Handlers

use axum::{
    Json,
    body::Bytes,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use bolt_core::{ChatMessage, ConversationId, ReplySource, Role, TokenUsage, fallback::TECHNICAL_DIFFICULTIES};
use bolt_payments::{
    BillingCadence, BillingInfo, GooglePayResult, PayPalCapture, PaymentAttempt, PaymentProvider,
    minimum_amount, plans, resolve,
};
use bolt_runtime::SessionOverrides;

use crate::error::ApiError;
use crate::state::AppState;

// ============================================================================
// Response Types
// ============================================================================

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub assistant_connected: bool,
    pub stripe_configured: bool,
    pub paypal_configured: bool,
    pub tavus_configured: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatResponse {
    pub message: String,
    pub token_usage: TokenUsage,
    pub conversation_id: ConversationId,
    pub timestamp: String,
    pub messages_in_context: usize,
    pub assistant: String,
    pub status: &'static str,
    pub source: ReplySource,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatErrorResponse {
    pub status: &'static str,
    pub error: String,
    pub details: String,
    pub fallback_message: &'static str,
    pub timestamp: String,
    pub assistant: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationResponse {
    pub conversation_url: String,
    pub conversation_id: String,
    pub status: &'static str,
}

#[derive(Debug, Deserialize)]
pub struct PlanQuery {
    pub plan: Option<String>,
    pub billing: Option<String>,
}

fn timestamp() -> String {
    Utc::now().to_rfc3339()
}

// ============================================================================
// Request Parsing
// ============================================================================

/// Parse a JSON body, reporting malformed JSON with a fixed message
fn parse_body(body: &Bytes, message: &str) -> Result<Value, ApiError> {
    serde_json::from_slice(body).map_err(|_| ApiError::bad_request(message))
}

/// JSON truthiness: absent, null, false, 0 and "" count as missing
fn is_present(body: &Value, field: &str) -> bool {
    match body.get(field) {
        None | Some(Value::Null) | Some(Value::Bool(false)) => false,
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Number(n)) => n.as_f64().is_some_and(|v| v != 0.0),
        Some(_) => true,
    }
}

fn require_fields(body: &Value, fields: &[&str]) -> Result<(), ApiError> {
    if fields.iter().all(|f| is_present(body, f)) {
        Ok(())
    } else {
        Err(ApiError::bad_request("Missing required fields"))
    }
}

fn str_field<'a>(body: &'a Value, field: &str) -> Option<&'a str> {
    body.get(field).and_then(Value::as_str)
}

fn amount_field(body: &Value) -> Result<Decimal, ApiError> {
    let amount = match body.get("amount") {
        Some(Value::Number(n)) => n.as_f64().and_then(|v| Decimal::try_from(v).ok()),
        Some(Value::String(s)) => s.trim().parse::<Decimal>().ok(),
        _ => None,
    };
    amount.ok_or_else(|| ApiError::bad_request("Invalid amount"))
}

fn customer_field(body: &Value) -> Result<BillingInfo, ApiError> {
    body.get("customerInfo")
        .cloned()
        .map(serde_json::from_value::<BillingInfo>)
        .and_then(Result::ok)
        .ok_or_else(|| ApiError::bad_request("Invalid customer information"))
}

fn billing_field(body: &Value) -> BillingCadence {
    str_field(body, "billing")
        .and_then(BillingCadence::parse)
        .unwrap_or_default()
}

/// Build a payment attempt from a request body
fn payment_attempt(
    body: &Value,
    provider: PaymentProvider,
    required: &[&str],
) -> Result<PaymentAttempt, ApiError> {
    require_fields(body, required)?;

    let amount = amount_field(body)?;
    if amount < minimum_amount(provider) {
        return Err(ApiError::bad_request("Amount too small").with_code("VALIDATION_ERROR"));
    }

    Ok(PaymentAttempt {
        provider,
        amount,
        currency: str_field(body, "currency").unwrap_or("usd").to_string(),
        plan_id: str_field(body, "planId").unwrap_or_default().to_string(),
        billing: billing_field(body),
        customer: customer_field(body)?,
    })
}

/// Validate the chat `messages` array
fn chat_messages(body: &Value) -> Result<Vec<ChatMessage>, ApiError> {
    let messages = body
        .get("messages")
        .and_then(Value::as_array)
        .filter(|m| !m.is_empty())
        .ok_or_else(|| ApiError::bad_request("Messages array is required and cannot be empty"))?;

    messages
        .iter()
        .enumerate()
        .map(|(i, message)| {
            let role = match str_field(message, "role") {
                Some("user") => Some(Role::User),
                Some("assistant") => Some(Role::Assistant),
                _ => None,
            };
            let content = str_field(message, "content").filter(|c| !c.is_empty());

            match (role, content) {
                (Some(role), Some(content)) => Ok(ChatMessage::new(role, content)),
                _ => {
                    tracing::warn!(message_index = i, "Invalid message structure");
                    Err(ApiError::bad_request(format!("Invalid message structure at index {i}")))
                }
            }
        })
        .collect()
}

// ============================================================================
// Health & Catalog
// ============================================================================

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        assistant_connected: state.gateway.status().await.connected,
        stripe_configured: state.checkout.stripe_configured(),
        paypal_configured: state.checkout.paypal_configured(),
        tavus_configured: state.tavus.config().is_configured(),
    })
}

/// Plan catalog, or one resolved selection when `plan`/`billing` is given
pub async fn list_plans(Query(query): Query<PlanQuery>) -> Json<Value> {
    if query.plan.is_none() && query.billing.is_none() {
        return Json(json!({ "plans": plans() }));
    }

    let selection = resolve(query.plan.as_deref(), query.billing.as_deref());
    Json(json!(selection.quote()))
}

// ============================================================================
// Assistant
// ============================================================================

/// Chat endpoint
pub async fn chat_handler(State(state): State<AppState>, body: Bytes) -> Result<Response, ApiError> {
    let body = parse_body(&body, "Invalid JSON in request body")?;
    let messages = chat_messages(&body)?;

    let limited = bolt_core::message::recent(&messages).to_vec();
    let conversation_id = str_field(&body, "conversationId")
        .filter(|id| !id.is_empty())
        .map_or_else(ConversationId::generate, ConversationId::from_string);
    let assistant = state.gateway.backend().assistant_id().to_string();

    tracing::info!(
        original_count = messages.len(),
        limited_count = limited.len(),
        conversation_id = conversation_id.as_str(),
        "Processing chat request"
    );

    let gateway = state.gateway.clone();
    let context = limited.clone();
    let reply = tokio::spawn(async move {
        let (question, history) = context.split_last().map_or(("", &[][..]), |(q, h)| (q.content.as_str(), h));
        gateway.ask(question, history).await
    })
    .await;

    match reply {
        Ok(reply) => Ok(Json(ChatResponse {
            message: reply.text,
            token_usage: reply.usage,
            conversation_id,
            timestamp: timestamp(),
            messages_in_context: limited.len(),
            assistant,
            status: "success",
            source: reply.source,
        })
        .into_response()),
        Err(e) => {
            tracing::error!(error = %e, "Chat task failed");
            Ok(Json(ChatErrorResponse {
                status: "error",
                error: "Internal server error".into(),
                details: e.to_string(),
                fallback_message: TECHNICAL_DIFFICULTIES,
                timestamp: timestamp(),
                assistant,
            })
            .into_response())
        }
    }
}

/// Knowledge backend connection test
pub async fn test_connection(State(state): State<AppState>) -> Response {
    let backend = state.gateway.backend();
    let environment = json!({
        "backend": backend.name(),
        "assistantId": backend.assistant_id(),
        "appEnv": state.app_env,
    });

    match state.gateway.check_connection().await {
        Ok(status) => {
            tracing::info!(
                connected = status.connected,
                error = ?status.error,
                response_time = ?status.response_time,
                "Connection test completed"
            );
            Json(json!({
                "status": "success",
                "data": status,
                "timestamp": timestamp(),
                "environment": environment,
            }))
            .into_response()
        }
        Err(e) => {
            tracing::warn!(error = %e, "Connection test failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "status": "error",
                    "error": e.to_string(),
                    "timestamp": timestamp(),
                    "environment": environment,
                })),
            )
                .into_response()
        }
    }
}

// ============================================================================
// Payments
// ============================================================================

/// Stripe card flow: create a payment intent
pub async fn create_payment_intent(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    let body = parse_body(&body, "Invalid JSON in request body")?;
    let attempt = payment_attempt(
        &body,
        PaymentProvider::Stripe,
        &["amount", "currency", "planId", "customerInfo"],
    )?;

    let created = state.checkout.create_payment_intent(&attempt).await?;
    Ok(Json(json!(created)))
}

/// PayPal flow: create an order
pub async fn create_paypal_order(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    let body = parse_body(&body, "Invalid JSON in request body")?;
    let attempt = payment_attempt(
        &body,
        PaymentProvider::PayPal,
        &["amount", "currency", "planId", "customerInfo"],
    )?;

    let order = state.checkout.create_paypal_order(&attempt).await?;
    Ok(Json(json!({ "orderID": order.id, "status": order.status })))
}

/// PayPal flow: capture an approved order
pub async fn capture_paypal_order(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    let body = parse_body(&body, "Invalid JSON in request body")?;
    require_fields(&body, &["orderID", "planId", "customerInfo"])?;

    let capture = PayPalCapture {
        order_id: str_field(&body, "orderID").unwrap_or_default().to_string(),
        plan_id: str_field(&body, "planId").unwrap_or_default().to_string(),
        billing: str_field(&body, "billing").and_then(BillingCadence::parse),
        customer: customer_field(&body)?,
    };

    let receipt = state.checkout.capture_paypal_order(&capture).await?;
    Ok(Json(json!({
        "success": true,
        "orderID": receipt.order_id,
        "status": receipt.status,
        "captureID": receipt.capture_id,
        "amount": receipt.amount,
        "currency": receipt.currency,
        "payer": receipt.payer,
    })))
}

/// Google Pay flow: confirm the wallet token on Stripe
pub async fn process_google_pay(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    let body = parse_body(&body, "Invalid JSON in request body")?;
    let attempt = payment_attempt(
        &body,
        PaymentProvider::GooglePay,
        &["paymentData", "planId", "customerInfo", "amount"],
    )?;
    let payment_data = body.get("paymentData").cloned().unwrap_or(Value::Null);

    match state.checkout.process_google_pay(&attempt, &payment_data).await? {
        GooglePayResult::Succeeded(receipt) => {
            let mut response = json!(receipt);
            response["success"] = json!(true);
            Ok(Json(response))
        }
        GooglePayResult::RequiresAction {
            payment_intent_id,
            client_secret,
        } => Ok(Json(json!({
            "requiresAction": true,
            "paymentIntentId": payment_intent_id,
            "clientSecret": client_secret,
        }))),
    }
}

/// Stripe webhook handler
pub async fn stripe_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: String,
) -> Result<Json<Value>, ApiError> {
    if !state.webhooks.is_configured() {
        return Err(ApiError::new(StatusCode::SERVICE_UNAVAILABLE, "Webhooks not configured")
            .with_code("PAYMENTS_DISABLED"));
    }

    let signature = headers
        .get("stripe-signature")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::bad_request("Missing Stripe signature").with_code("MISSING_SIGNATURE"))?;

    let event = state
        .webhooks
        .parse_event(&body, signature, Utc::now().timestamp())
        .map_err(|e| {
            tracing::warn!(error = %e, "Webhook rejected");
            ApiError::bad_request("Invalid signature").with_code("INVALID_SIGNATURE")
        })?;

    state.webhooks.handle(&event)?;
    Ok(Json(json!({ "received": true })))
}

// ============================================================================
// Video Persona
// ============================================================================

/// Start a Tavus conversation
pub async fn create_conversation(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<ConversationResponse>, ApiError> {
    let overrides: SessionOverrides = if body.iter().all(u8::is_ascii_whitespace) {
        SessionOverrides::default()
    } else {
        serde_json::from_slice(&body).map_err(|_| ApiError::bad_request("Invalid JSON in request body"))?
    };

    let session = state.tavus.create_session(&overrides).await?;
    Ok(Json(ConversationResponse {
        conversation_url: session.join_url,
        conversation_id: session.id,
        status: "success",
    }))
}

/// Tavus reachability check
pub async fn conversation_health(State(state): State<AppState>) -> Response {
    match state.tavus.replica_count().await {
        Ok(count) => Json(json!({
            "status": "healthy",
            "replicaCount": count,
            "personaId": state.tavus.config().persona_id,
        }))
        .into_response(),
        Err(e) => {
            let error = ApiError::from(e);
            (
                error.status,
                Json(json!({ "status": "unhealthy", "error": error.message, "code": error.code })),
            )
                .into_response()
        }
    }
}

/// End a Tavus conversation
pub async fn end_conversation(
    State(state): State<AppState>,
    Path(conversation_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.tavus.end_session(&conversation_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
