//! Domain model for debts, currencies and user preferences.
//!
//! # Responsibility
//! - Define canonical data structures used by store, query and presenters.
//!
//! # Invariants
//! - Every debt is identified by a stable `DebtId`.
//! - Timestamps are Unix epoch milliseconds.

pub mod currency;
pub mod debt;
pub mod settings;
