//! Debt domain model.
//!
//! # Responsibility
//! - Define the canonical debt record shared by list, detail and history views.
//! - Own validation and the derived `expired` state.
//!
//! # Invariants
//! - `uuid` is stable and never reused for another debt.
//! - At most one of `money_amount` / `thing_name` is set; neither means an
//!   open-ended debt.
//! - `expired` is derived, never persisted: due date in the past and not closed.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

static CURRENCY_CODE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z]{3}$").expect("valid currency code regex"));

/// Stable identifier for every debt record.
pub type DebtId = Uuid;

/// Direction of a debt relative to the device owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Ownership {
    /// The owner borrowed from someone else.
    MyDebt,
    /// Someone else owes the owner.
    ToMe,
}

impl Ownership {
    pub fn is_my_debt(self) -> bool {
        matches!(self, Self::MyDebt)
    }

    pub fn from_is_my_debt(is_my_debt: bool) -> Self {
        if is_my_debt {
            Self::MyDebt
        } else {
            Self::ToMe
        }
    }

    /// Stable short label used by logs, analytics and the FFI surface.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::MyDebt => "my_debt",
            Self::ToMe => "to_me",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "my_debt" => Some(Self::MyDebt),
            "to_me" => Some(Self::ToMe),
            _ => None,
        }
    }
}

/// Validation failures for debt invariants.
#[derive(Debug, Clone, PartialEq)]
pub enum DebtValidationError {
    /// Both a monetary amount and a thing description are set.
    MoneyAndThing,
    /// Amount is NaN or infinite.
    NonFiniteAmount(f64),
    /// Thing description is present but blank.
    EmptyThingName,
    /// Currency code is not three uppercase ASCII letters.
    InvalidCurrencyCode(String),
}

impl Display for DebtValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MoneyAndThing => {
                write!(f, "money_amount and thing_name cannot both be set")
            }
            Self::NonFiniteAmount(value) => write!(f, "money_amount must be finite, got {value}"),
            Self::EmptyThingName => write!(f, "thing_name cannot be blank"),
            Self::InvalidCurrencyCode(code) => {
                write!(f, "currency code `{code}` is not a 3-letter ISO code")
            }
        }
    }
}

impl Error for DebtValidationError {}

/// Canonical debt record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Debt {
    /// Stable ID used for list diffing, sync mapping and navigation.
    pub uuid: DebtId,
    /// Counterparty display name.
    pub name: String,
    pub ownership: Ownership,
    /// Unix epoch milliseconds.
    pub due_date: Option<i64>,
    pub money_amount: Option<f64>,
    /// ISO-4217 code of `money_amount`.
    pub currency_code: Option<String>,
    /// Non-monetary debt description, e.g. a borrowed book.
    pub thing_name: Option<String>,
    pub is_closed: bool,
    /// Unix epoch milliseconds.
    pub created_at: i64,
    /// Unix epoch milliseconds, bumped by every store save.
    pub last_update: i64,
}

impl Debt {
    /// Creates an open-ended debt with a generated stable ID.
    pub fn new(ownership: Ownership, name: impl Into<String>, now_ms: i64) -> Self {
        Self::with_id(Uuid::new_v4(), ownership, name, now_ms)
    }

    /// Creates a debt with a caller-provided ID (import/sync paths).
    pub fn with_id(uuid: DebtId, ownership: Ownership, name: impl Into<String>, now_ms: i64) -> Self {
        Self {
            uuid,
            name: name.into(),
            ownership,
            due_date: None,
            money_amount: None,
            currency_code: None,
            thing_name: None,
            is_closed: false,
            created_at: now_ms,
            last_update: now_ms,
        }
    }

    /// Builder-style setter for a monetary amount.
    pub fn with_money(mut self, amount: f64, currency_code: impl Into<String>) -> Self {
        self.money_amount = Some(amount);
        self.currency_code = Some(currency_code.into());
        self
    }

    /// Builder-style setter for a non-monetary description.
    pub fn with_thing(mut self, thing_name: impl Into<String>) -> Self {
        self.thing_name = Some(thing_name.into());
        self
    }

    pub fn with_due_date(mut self, due_date_ms: i64) -> Self {
        self.due_date = Some(due_date_ms);
        self
    }

    pub fn has_due_date(&self) -> bool {
        self.due_date.is_some()
    }

    /// Returns whether the due date has passed for a still-open debt.
    pub fn is_expired(&self, now_ms: i64) -> bool {
        !self.is_closed && self.due_date.is_some_and(|due| due < now_ms)
    }

    pub fn close(&mut self) {
        self.is_closed = true;
    }

    /// Validates field-level invariants before persistence.
    pub fn validate(&self) -> Result<(), DebtValidationError> {
        if self.money_amount.is_some() && self.thing_name.is_some() {
            return Err(DebtValidationError::MoneyAndThing);
        }
        if let Some(amount) = self.money_amount {
            if !amount.is_finite() {
                return Err(DebtValidationError::NonFiniteAmount(amount));
            }
        }
        if let Some(thing) = self.thing_name.as_deref() {
            if thing.trim().is_empty() {
                return Err(DebtValidationError::EmptyThingName);
            }
        }
        if let Some(code) = self.currency_code.as_deref() {
            if !is_valid_currency_code(code) {
                return Err(DebtValidationError::InvalidCurrencyCode(code.to_string()));
            }
        }
        Ok(())
    }
}

/// Returns whether `code` looks like an ISO-4217 alphabetic code.
pub fn is_valid_currency_code(code: &str) -> bool {
    CURRENCY_CODE_RE.is_match(code)
}

#[cfg(test)]
mod tests {
    use super::{Debt, DebtValidationError, Ownership};

    const NOW: i64 = 1_700_000_000_000;

    #[test]
    fn expired_requires_past_due_date_and_open_state() {
        let mut debt = Debt::new(Ownership::MyDebt, "Alex", NOW).with_due_date(NOW - 1);
        assert!(debt.is_expired(NOW));
        assert!(!debt.is_expired(NOW - 1));

        debt.close();
        assert!(!debt.is_expired(NOW));

        let undated = Debt::new(Ownership::MyDebt, "Sam", NOW);
        assert!(!undated.is_expired(i64::MAX));
    }

    #[test]
    fn validate_rejects_money_and_thing_together() {
        let debt = Debt::new(Ownership::ToMe, "Kim", NOW)
            .with_money(10.0, "USD")
            .with_thing("book");
        assert_eq!(debt.validate(), Err(DebtValidationError::MoneyAndThing));
    }

    #[test]
    fn validate_rejects_bad_currency_and_blank_thing() {
        let lowercase = Debt::new(Ownership::ToMe, "Kim", NOW).with_money(1.0, "usd");
        assert!(matches!(
            lowercase.validate(),
            Err(DebtValidationError::InvalidCurrencyCode(_))
        ));

        let blank = Debt::new(Ownership::ToMe, "Kim", NOW).with_thing("  ");
        assert_eq!(blank.validate(), Err(DebtValidationError::EmptyThingName));

        let nan = Debt::new(Ownership::ToMe, "Kim", NOW).with_money(f64::NAN, "USD");
        assert!(matches!(
            nan.validate(),
            Err(DebtValidationError::NonFiniteAmount(_))
        ));
    }

    #[test]
    fn open_ended_debt_is_valid() {
        let debt = Debt::new(Ownership::MyDebt, "Lee", NOW);
        assert!(debt.validate().is_ok());
    }

    #[test]
    fn ownership_labels_roundtrip() {
        for ownership in [Ownership::MyDebt, Ownership::ToMe] {
            assert_eq!(Ownership::parse(ownership.as_str()), Some(ownership));
        }
        assert_eq!(Ownership::parse("mine"), None);
    }
}
