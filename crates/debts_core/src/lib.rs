//! Core domain logic for the debts app.
//! Owns persistence, live debt queries and the screen presenters.

pub mod analytics;
pub mod clock;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod presenter;
pub mod query;
pub mod repo;
pub mod store;

pub use analytics::{AnalyticsEvent, AnalyticsSink, LogAnalyticsSink, RecordingAnalyticsSink};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::CoreConfig;
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::currency::Currency;
pub use model::debt::{Debt, DebtId, DebtValidationError, Ownership};
pub use model::settings::{Palette, SettingsState};
pub use presenter::debt_list::{
    DebtListIntent, DebtListPresenter, DebtsState, ListUpdate, PlaceholderState,
};
pub use presenter::row::{DebtRowViewModel, MoneyLine, RenderContext, RowIcon};
pub use presenter::settings::{
    SettingsAction, SettingsEnvironment, SettingsError, SettingsField, SettingsPresenter,
    SettingsRow,
};
pub use query::diff::{ChangeBatch, ChangeEvent};
pub use query::filter::{DebtFilter, TimeWindow};
pub use query::live_query::{FetchRequest, LiveQuery};
pub use query::result_set::{IndexPath, ResultSet, SectionTitle};
pub use repo::debt_repo::{DebtRepository, RepoError, RepoResult, SqliteDebtRepository};
pub use store::debt_store::{DebtStore, SaveContext, StoreError, StoreResult};
pub use store::hub::{ChangeHub, ChangeOrigin, StoreChange};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
