//! Plan Catalog
//!
//! Static subscription tiers and the plan/billing selection carried by the
//! checkout URL (`?plan=journeyman&billing=yearly`).

use std::fmt;
use std::sync::LazyLock;

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Plan used when the requested id is missing or unknown
pub const DEFAULT_PLAN_ID: &str = "journeyman";

/// Billing cadence
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BillingCadence {
    #[default]
    Monthly,
    Yearly,
}

impl BillingCadence {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Monthly => "monthly",
            Self::Yearly => "yearly",
        }
    }

    /// Parse a cadence name; `None` for anything unrecognised
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "monthly" => Some(Self::Monthly),
            "yearly" => Some(Self::Yearly),
            _ => None,
        }
    }
}

impl fmt::Display for BillingCadence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Subscription plan
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Plan {
    pub id: &'static str,
    pub name: &'static str,

    /// Monthly price in dollars
    #[serde(with = "rust_decimal::serde::float")]
    pub monthly_price: Decimal,

    /// Yearly price in dollars
    #[serde(with = "rust_decimal::serde::float")]
    pub yearly_price: Decimal,

    pub features: &'static [&'static str],
}

static PLANS: LazyLock<[Plan; 3]> = LazyLock::new(|| {
    [
        Plan {
            id: "apprentice",
            name: "Apprentice",
            monthly_price: dec!(29),
            yearly_price: dec!(290),
            features: &["Basic AI Chat", "Document Search", "Email Support"],
        },
        Plan {
            id: "journeyman",
            name: "Journeyman",
            monthly_price: dec!(79),
            yearly_price: dec!(790),
            features: &[
                "Advanced AI Chat",
                "Priority Support",
                "Custom Integrations",
                "Analytics Dashboard",
            ],
        },
        Plan {
            id: "master",
            name: "Master",
            monthly_price: dec!(149),
            yearly_price: dec!(1490),
            features: &[
                "Enterprise AI",
                "24/7 Support",
                "White-label Options",
                "Advanced Analytics",
                "Custom Training",
            ],
        },
    ]
});

/// All plans, cheapest first
pub fn plans() -> &'static [Plan] {
    PLANS.as_slice()
}

/// Look up a plan by id
pub fn lookup(plan_id: &str) -> Option<&'static Plan> {
    plans().iter().find(|p| p.id == plan_id)
}

/// Resolve URL-style plan and billing parameters, applying the defaults
pub fn resolve(plan_id: Option<&str>, billing: Option<&str>) -> PlanSelection {
    let plan = plan_id
        .and_then(lookup)
        .or_else(|| lookup(DEFAULT_PLAN_ID))
        .unwrap_or(&plans()[1]);
    let billing = billing.and_then(BillingCadence::parse).unwrap_or_default();

    PlanSelection { plan, billing }
}

impl Plan {
    pub fn is_valid_id(plan_id: &str) -> bool {
        lookup(plan_id).is_some()
    }

    /// Price in dollars for a cadence
    pub const fn price(&self, billing: BillingCadence) -> Decimal {
        match billing {
            BillingCadence::Monthly => self.monthly_price,
            BillingCadence::Yearly => self.yearly_price,
        }
    }
}

/// A plan together with the cadence being purchased
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PlanSelection {
    pub plan: &'static Plan,
    pub billing: BillingCadence,
}

impl PlanSelection {
    pub const fn new(plan: &'static Plan, billing: BillingCadence) -> Self {
        Self { plan, billing }
    }

    pub const fn plan_id(&self) -> &'static str {
        self.plan.id
    }

    /// Price in dollars
    pub const fn price(&self) -> Decimal {
        self.plan.price(self.billing)
    }

    /// Price in cents, as sent to Stripe
    pub fn amount_cents(&self) -> i64 {
        to_cents(self.price())
    }

    /// Price formatted for display, e.g. `$790.00`
    pub fn display_price(&self) -> String {
        format_dollars(self.price())
    }

    pub const fn features(&self) -> &'static [&'static str] {
        self.plan.features
    }

    /// Serializable summary for the pricing page
    pub fn quote(&self) -> PlanQuote {
        PlanQuote {
            plan_id: self.plan.id,
            name: self.plan.name,
            billing: self.billing,
            price: self.price(),
            amount_cents: self.amount_cents(),
            display_price: self.display_price(),
            features: self.plan.features,
        }
    }
}

/// Resolved plan selection as returned by `GET /api/plans`
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanQuote {
    pub plan_id: &'static str,
    pub name: &'static str,
    pub billing: BillingCadence,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub amount_cents: i64,
    pub display_price: String,
    pub features: &'static [&'static str],
}

/// Convert dollars to whole cents
pub fn to_cents(dollars: Decimal) -> i64 {
    (dollars * dec!(100)).round().to_i64().unwrap_or_default()
}

/// Convert cents to dollars
pub fn from_cents(cents: i64) -> Decimal {
    Decimal::new(cents, 2)
}

/// Format dollars with a `$` sign and two decimal places
pub fn format_dollars(dollars: Decimal) -> String {
    format!("${:.2}", dollars.round_dp(2))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup() {
        assert_eq!(lookup("master").unwrap().name, "Master");
        assert!(lookup("grandmaster").is_none());
        assert!(Plan::is_valid_id("apprentice"));
    }

    #[test]
    fn test_journeyman_yearly() {
        let selection = resolve(Some("journeyman"), Some("yearly"));
        assert_eq!(selection.display_price(), "$790.00");
        assert_eq!(selection.amount_cents(), 79000);
        assert_eq!(selection.features().len(), 4);
    }

    #[test]
    fn test_resolve_defaults() {
        let selection = resolve(None, None);
        assert_eq!(selection.plan_id(), "journeyman");
        assert_eq!(selection.billing, BillingCadence::Monthly);

        let unknown = resolve(Some("gold"), Some("weekly"));
        assert_eq!(unknown.plan_id(), "journeyman");
        assert_eq!(unknown.billing, BillingCadence::Monthly);
        assert_eq!(unknown.amount_cents(), 7900);
    }

    #[test]
    fn test_money_helpers() {
        assert_eq!(to_cents(dec!(14.99)), 1499);
        assert_eq!(from_cents(2900), dec!(29.00));
        assert_eq!(format_dollars(dec!(1490)), "$1490.00");
    }

    #[test]
    fn test_quote_serializes_numbers() {
        let quote = resolve(Some("apprentice"), Some("yearly")).quote();
        let json = serde_json::to_value(&quote).unwrap();
        assert_eq!(json["planId"], "apprentice");
        assert_eq!(json["billing"], "yearly");
        assert_eq!(json["price"], 290.0);
        assert_eq!(json["amountCents"], 29000);
        assert_eq!(json["displayPrice"], "$290.00");
    }
}
