//! Order Log
//!
//! Append-only record of completed and failed payments. There is no durable
//! store behind it: the in-memory log keeps records for the process lifetime
//! and every record is also written to the trace output.

use std::sync::RwLock;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::billing::BillingInfo;
use crate::catalog::BillingCadence;
use crate::error::{PaymentError, Result};

/// Provider that processed an order
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentProvider {
    Stripe,
    #[serde(rename = "paypal")]
    PayPal,
    GooglePay,
}

impl PaymentProvider {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Stripe => "stripe",
            Self::PayPal => "paypal",
            Self::GooglePay => "google_pay",
        }
    }
}

/// Terminal order status
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Succeeded,
    Failed,
}

/// A recorded order
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRecord {
    pub provider: PaymentProvider,

    /// Payment intent, capture or order id
    pub reference: String,

    pub status: OrderStatus,

    /// Amount in cents
    pub amount: i64,

    pub currency: String,
    pub plan_id: Option<String>,
    pub billing: Option<BillingCadence>,
    pub customer_email: Option<String>,
    pub customer_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl OrderRecord {
    /// Successful order for a known customer
    pub fn succeeded(
        provider: PaymentProvider,
        reference: impl Into<String>,
        amount: i64,
        currency: impl Into<String>,
    ) -> Self {
        Self {
            provider,
            reference: reference.into(),
            status: OrderStatus::Succeeded,
            amount,
            currency: currency.into(),
            plan_id: None,
            billing: None,
            customer_email: None,
            customer_name: None,
            created_at: Utc::now(),
        }
    }

    #[must_use]
    pub fn with_plan(mut self, plan_id: impl Into<String>, billing: Option<BillingCadence>) -> Self {
        self.plan_id = Some(plan_id.into());
        self.billing = billing;
        self
    }

    #[must_use]
    pub fn with_customer(mut self, customer: &BillingInfo) -> Self {
        self.customer_email = Some(customer.email.trim().to_string());
        self.customer_name = Some(customer.full_name());
        self
    }

    #[must_use]
    pub fn failed(mut self) -> Self {
        self.status = OrderStatus::Failed;
        self
    }
}

/// Order storage trait
pub trait OrderLog: Send + Sync {
    /// Append an order
    fn record(&self, order: OrderRecord) -> Result<()>;

    /// All orders, oldest first
    fn list(&self) -> Result<Vec<OrderRecord>>;

    /// Most recent order with this reference
    fn find(&self, reference: &str) -> Result<Option<OrderRecord>>;
}

/// In-memory order log (for development)
#[derive(Default)]
pub struct MemoryOrderLog {
    orders: RwLock<Vec<OrderRecord>>,
}

impl MemoryOrderLog {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned<T>(_: T) -> PaymentError {
    PaymentError::Storage("order log lock poisoned".into())
}

impl OrderLog for MemoryOrderLog {
    fn record(&self, order: OrderRecord) -> Result<()> {
        tracing::info!(
            provider = order.provider.as_str(),
            reference = %order.reference,
            status = ?order.status,
            amount = order.amount,
            currency = %order.currency,
            plan_id = ?order.plan_id,
            customer_email = ?order.customer_email,
            "Order recorded"
        );

        self.orders.write().map_err(poisoned)?.push(order);
        Ok(())
    }

    fn list(&self) -> Result<Vec<OrderRecord>> {
        Ok(self.orders.read().map_err(poisoned)?.clone())
    }

    fn find(&self, reference: &str) -> Result<Option<OrderRecord>> {
        let orders = self.orders.read().map_err(poisoned)?;
        Ok(orders.iter().rev().find(|o| o.reference == reference).cloned())
    }
}
