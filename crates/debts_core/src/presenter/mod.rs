//! Screen presenters.
//!
//! # Responsibility
//! - Turn live-query output and persisted settings into view state the host
//!   renders without further logic.
//!
//! # Invariants
//! - Presenters run on the thread that owns their store handle.
//! - Navigation is returned as intents/actions, never performed here.

pub mod debt_list;
pub mod projection;
pub mod row;
pub mod settings;
pub mod strings;
