//! Live queries over the debt store.
//!
//! # Responsibility
//! - Describe debt list predicates, ordering and sectioning.
//! - Maintain a sectioned snapshot and emit change batches as the store
//!   commits transactions.
//!
//! # Invariants
//! - SQL fetches and in-memory patches agree on predicate and order.
//! - Change batches are produced only on the thread that owns the query.

pub mod diff;
pub mod filter;
pub mod live_query;
pub mod result_set;
pub mod sort;
