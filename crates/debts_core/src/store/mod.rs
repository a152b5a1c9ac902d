//! Debt store and change notification.
//!
//! # Responsibility
//! - Commit debt mutations transactionally.
//! - Announce each committed transaction to live queries on any thread.
//!
//! # Invariants
//! - Notifications cross threads; diffs and presenter state never do.

pub mod debt_store;
pub mod hub;
