//! Billing Information
//!
//! Customer contact and address fields collected at checkout. The same
//! `validate` contract runs before the orchestrator submits a payment and
//! again when a payment endpoint receives `customerInfo`.

use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{PaymentError, Result};

static EMAIL_PATTERN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").ok());

/// Whether `email` looks like an address (`local@domain.tld`)
pub fn is_valid_email(email: &str) -> bool {
    EMAIL_PATTERN.as_ref().is_some_and(|re| re.is_match(email))
}

/// Customer billing details
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BillingInfo {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub country: String,
}

impl Default for BillingInfo {
    fn default() -> Self {
        Self {
            email: String::new(),
            first_name: String::new(),
            last_name: String::new(),
            company: None,
            address: String::new(),
            city: String::new(),
            state: String::new(),
            zip_code: String::new(),
            country: "US".into(),
        }
    }
}

/// Editable billing form field
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BillingField {
    Email,
    FirstName,
    LastName,
    Company,
    Address,
    City,
    State,
    ZipCode,
    Country,
}

impl FromStr for BillingField {
    type Err = PaymentError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "email" => Ok(Self::Email),
            "firstName" => Ok(Self::FirstName),
            "lastName" => Ok(Self::LastName),
            "company" => Ok(Self::Company),
            "address" => Ok(Self::Address),
            "city" => Ok(Self::City),
            "state" => Ok(Self::State),
            "zipCode" => Ok(Self::ZipCode),
            "country" => Ok(Self::Country),
            other => Err(PaymentError::validation(format!("Unknown billing field: {other}"))),
        }
    }
}

impl BillingInfo {
    /// Return a copy with one field replaced
    pub fn update(&self, field: &str, value: impl Into<String>) -> Result<Self> {
        let field = field.parse::<BillingField>()?;
        let mut next = self.clone();
        next.set(field, value.into());
        Ok(next)
    }

    /// Replace one field in place
    pub fn set(&mut self, field: BillingField, value: String) {
        match field {
            BillingField::Email => self.email = value,
            BillingField::FirstName => self.first_name = value,
            BillingField::LastName => self.last_name = value,
            BillingField::Company => self.company = Some(value).filter(|v| !v.is_empty()),
            BillingField::Address => self.address = value,
            BillingField::City => self.city = value,
            BillingField::State => self.state = value,
            BillingField::ZipCode => self.zip_code = value,
            BillingField::Country => self.country = value,
        }
    }

    /// Check the fields every payment needs
    pub fn validate(&self) -> Result<()> {
        if self.email.trim().is_empty() {
            return Err(PaymentError::validation("Email is required"));
        }
        if self.first_name.trim().is_empty() {
            return Err(PaymentError::validation("First name is required"));
        }
        if self.last_name.trim().is_empty() {
            return Err(PaymentError::validation("Last name is required"));
        }
        if !is_valid_email(self.email.trim()) {
            return Err(PaymentError::validation("Please enter a valid email address"));
        }
        Ok(())
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name.trim(), self.last_name.trim())
    }

    pub fn company_or_empty(&self) -> &str {
        self.company.as_deref().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete() -> BillingInfo {
        BillingInfo::default()
            .update("email", "steward@local42.org")
            .and_then(|b| b.update("firstName", "Maria"))
            .and_then(|b| b.update("lastName", "Lopez"))
            .unwrap()
    }

    #[test]
    fn test_defaults() {
        let info = BillingInfo::default();
        assert_eq!(info.country, "US");
        assert!(info.email.is_empty());
    }

    #[test]
    fn test_update_returns_new_value() {
        let empty = BillingInfo::default();
        let updated = empty.update("zipCode", "60601").unwrap();
        assert_eq!(updated.zip_code, "60601");
        assert!(empty.zip_code.is_empty());
    }

    #[test]
    fn test_unknown_field_rejected() {
        let err = BillingInfo::default().update("ssn", "x").unwrap_err();
        assert!(err.to_string().contains("Unknown billing field"));
    }

    #[test]
    fn test_validate() {
        assert!(complete().validate().is_ok());

        let missing_last = complete().update("lastName", "  ").unwrap();
        assert_eq!(missing_last.validate().unwrap_err().to_string(), "Last name is required");

        let bad_email = complete().update("email", "not-an-email").unwrap();
        assert!(bad_email.validate().is_err());
    }

    #[test]
    fn test_email_pattern() {
        assert!(is_valid_email("a@b.co"));
        assert!(!is_valid_email("a@b"));
        assert!(!is_valid_email("a b@c.org"));
        assert!(!is_valid_email("@c.org"));
    }

    #[test]
    fn test_deserialize_partial_customer_info() {
        let info: BillingInfo = serde_json::from_value(serde_json::json!({
            "email": "a@b.co",
            "firstName": "A",
            "lastName": "B"
        }))
        .unwrap();
        assert_eq!(info.country, "US");
        assert_eq!(info.full_name(), "A B");
        assert_eq!(info.company_or_empty(), "");
    }
}
