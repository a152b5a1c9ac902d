//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts.
//! - Isolate SQLite query details from store and presenter orchestration.
//!
//! # Invariants
//! - Repository writes enforce `Debt::validate()` before persistence.
//! - Repositories refuse connections whose schema is not fully migrated.

pub mod currency_repo;
pub mod debt_repo;
pub mod settings_repo;
