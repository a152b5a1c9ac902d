//! Debt list predicates.
//!
//! # Invariants
//! - Every filter excludes closed debts.
//! - A filter is fully derived from `(ownership, time window, now)`.
//! - A bounded window never matches an undated debt: comparing an absent due
//!   date against the bound is false, in SQL and in memory alike.

use crate::model::debt::{Debt, Ownership};
use chrono::{DateTime, Days, Months, Utc};
use rusqlite::types::Value;

/// Time window selector of the debt list header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TimeWindow {
    #[default]
    AllTime,
    Week,
    Month,
    Year,
}

impl TimeWindow {
    /// Windows in segment-control order.
    pub const ALL: [TimeWindow; 4] = [Self::AllTime, Self::Week, Self::Month, Self::Year];

    /// Segment index of this window.
    pub fn index(self) -> u32 {
        match self {
            Self::AllTime => 0,
            Self::Week => 1,
            Self::Month => 2,
            Self::Year => 3,
        }
    }

    pub fn from_index(index: u32) -> Option<Self> {
        Self::ALL.get(index as usize).copied()
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::AllTime => "All time",
            Self::Week => "Week",
            Self::Month => "Month",
            Self::Year => "Year",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::AllTime => "all_time",
            Self::Week => "week",
            Self::Month => "month",
            Self::Year => "year",
        }
    }

    /// Inclusive due-date bound for this window, or `None` when unbounded.
    ///
    /// Calendar arithmetic runs in UTC; a bound past chrono's range saturates
    /// to `i64::MAX`.
    pub fn upper_bound(self, now_ms: i64) -> Option<i64> {
        let now = DateTime::<Utc>::from_timestamp_millis(now_ms)?;
        let bound = match self {
            Self::AllTime => return None,
            Self::Week => now.checked_add_days(Days::new(7)),
            Self::Month => now.checked_add_months(Months::new(1)),
            Self::Year => now.checked_add_months(Months::new(12)),
        };
        Some(bound.map_or(i64::MAX, |value| value.timestamp_millis()))
    }
}

/// Predicate over debts: open, of one ownership, optionally due by a bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DebtFilter {
    pub ownership: Ownership,
    pub due_on_or_before: Option<i64>,
}

impl DebtFilter {
    /// Base filter ignoring any time window.
    pub fn base(ownership: Ownership) -> Self {
        Self {
            ownership,
            due_on_or_before: None,
        }
    }

    pub fn windowed(ownership: Ownership, window: TimeWindow, now_ms: i64) -> Self {
        Self {
            ownership,
            due_on_or_before: window.upper_bound(now_ms),
        }
    }

    /// In-memory evaluation, kept equivalent to [`DebtFilter::where_clause`].
    pub fn matches(&self, debt: &Debt) -> bool {
        if debt.is_closed || debt.ownership != self.ownership {
            return false;
        }
        match self.due_on_or_before {
            Some(bound) => debt.due_date.is_some_and(|due| due <= bound),
            None => true,
        }
    }

    /// SQL `WHERE` body plus bind values for the `debts` table.
    pub(crate) fn where_clause(&self) -> (String, Vec<Value>) {
        let mut sql = String::from("is_closed = 0 AND is_my_debt = ?");
        let mut binds = vec![Value::Integer(i64::from(self.ownership.is_my_debt()))];
        if let Some(bound) = self.due_on_or_before {
            sql.push_str(" AND due_date IS NOT NULL AND due_date <= ?");
            binds.push(Value::Integer(bound));
        }
        (sql, binds)
    }
}
