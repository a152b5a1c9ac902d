//! Debt list presenter.
//!
//! # Responsibility
//! - Bind one ownership's live query to an on-screen projection.
//! - Derive placeholder state, section titles, row view models and intents.
//!
//! # Invariants
//! - Visual counts come from the projection, which only changes through
//!   applied batches or full reloads.
//! - Every `ListUpdate::Reload` is preceded by a fresh fetch, so expiry and
//!   section labels match the clock at that moment.
//! - Store failures never escape: counts fall back to zero and the list to an
//!   empty snapshot, each logged at `warn`.
//! - Placeholder and history icon are recomputed after every batch, filter
//!   change and store notification.

use crate::analytics::{AnalyticsEvent, AnalyticsSink};
use crate::model::debt::{DebtId, Ownership};
use crate::presenter::projection::{AppliedBatch, ListProjection};
use crate::presenter::row::{render_debt_row, DebtRowViewModel, RenderContext};
use crate::presenter::strings;
use crate::query::diff::ChangeBatch;
use crate::query::filter::{DebtFilter, TimeWindow};
use crate::query::live_query::{FetchRequest, LiveQuery};
use crate::query::result_set::{IndexPath, ResultSet};
use crate::repo::debt_repo::{DebtRepository, RepoResult};
use crate::repo::settings_repo::SettingsRepository;
use crate::store::debt_store::DebtStore;
use log::{debug, warn};
use serde::Serialize;
use std::sync::Arc;

/// Whether the ownership has any open debt at all, ignoring the window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DebtsState {
    NoDebts,
    DebtExist,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PlaceholderState {
    pub debts_state: DebtsState,
    pub general_placeholder_visible: bool,
    pub list_visible: bool,
    /// "Nothing in this window" placeholder.
    pub window_placeholder_visible: bool,
}

impl PlaceholderState {
    fn derive(base_count: u64, result_set: &ResultSet) -> Self {
        if base_count == 0 {
            return Self {
                debts_state: DebtsState::NoDebts,
                general_placeholder_visible: true,
                list_visible: false,
                window_placeholder_visible: false,
            };
        }
        Self {
            debts_state: DebtsState::DebtExist,
            general_placeholder_visible: false,
            list_visible: true,
            window_placeholder_visible: result_set.is_empty(),
        }
    }
}

/// Navigation requested by the list; the host performs it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebtListIntent {
    OpenDebt(DebtId),
    CloseDebt(DebtId),
    OpenSettings,
    OpenHistory,
    CreateDebt(Ownership),
}

/// What the host list view must do next.
#[derive(Debug, Clone, PartialEq)]
pub enum ListUpdate {
    /// Animate `batch`; `applied` names the rows and headers to re-render.
    Batch {
        batch: ChangeBatch,
        applied: AppliedBatch,
    },
    /// Discard the view state and reload all data.
    Reload,
}

pub struct DebtListPresenter {
    ownership: Ownership,
    window: TimeWindow,
    query: LiveQuery,
    projection: ListProjection,
    render: RenderContext,
    placeholder: PlaceholderState,
    history_icon_visible: bool,
    analytics: Arc<dyn AnalyticsSink>,
}

impl DebtListPresenter {
    /// Opens the list for `ownership`, restoring the last selected window.
    pub fn load(store: &DebtStore, ownership: Ownership, analytics: Arc<dyn AnalyticsSink>) -> Self {
        let window = swallow(
            "restore_window",
            store.settings().and_then(|repo| repo.debt_list_window()),
        )
        .flatten()
        .unwrap_or_default();
        let filter = DebtFilter::windowed(ownership, window, store.now_ms());
        let query = LiveQuery::open(store, FetchRequest::debt_list(filter));
        let projection = ListProjection::from_result_set(query.result_set());
        let render = swallow("render_context", RenderContext::load(store)).unwrap_or_default();

        let mut presenter = Self {
            ownership,
            window,
            query,
            projection,
            render,
            placeholder: PlaceholderState::derive(0, &ResultSet::empty()),
            history_icon_visible: false,
            analytics,
        };
        presenter.refresh_derived(store);
        debug!(
            "event=debt_list_load module=presenter status=ok ownership={} window={} rows={}",
            ownership.as_str(),
            window.as_str(),
            presenter.query.result_set().total_count()
        );
        presenter
    }

    pub fn ownership(&self) -> Ownership {
        self.ownership
    }

    pub fn title(&self) -> &'static str {
        match self.ownership {
            Ownership::MyDebt => strings::SCREEN_TITLE_MY_DEBTS,
            Ownership::ToMe => strings::SCREEN_TITLE_DEBTS_TO_ME,
        }
    }

    pub fn window(&self) -> TimeWindow {
        self.window
    }

    pub fn result_set(&self) -> &ResultSet {
        self.query.result_set()
    }

    /// Switches the time window: full reload, persisted for the next launch.
    pub fn select_window(&mut self, store: &DebtStore, window: TimeWindow) -> ListUpdate {
        self.analytics.report(AnalyticsEvent::WindowSelected {
            ownership: self.ownership,
            window,
        });
        self.window = window;
        swallow(
            "persist_window",
            store
                .settings()
                .and_then(|repo| repo.set_debt_list_window(window)),
        );

        self.reload(store);
        self.refresh_derived(store);
        ListUpdate::Reload
    }

    /// Drains store notifications into list updates.
    ///
    /// Placeholder and history icon are refreshed on every call, so changes
    /// outside the current window still reach them.
    pub fn handle_store_changes(&mut self, store: &DebtStore) -> Vec<ListUpdate> {
        let mut updates = Vec::new();
        for batch in self.query.poll(store) {
            match self.projection.apply(&batch) {
                Ok(applied) => updates.push(ListUpdate::Batch { batch, applied }),
                Err(err) => {
                    warn!(
                        "event=debt_list_apply module=presenter status=error fallback=reload sequence={} error={}",
                        batch.sequence, err
                    );
                    self.reload(store);
                    updates.clear();
                    updates.push(ListUpdate::Reload);
                    break;
                }
            }
        }
        if !self.projection.mirrors(self.query.result_set()) {
            warn!("event=debt_list_apply module=presenter status=error fallback=reload reason=diverged");
            self.reload(store);
            updates.clear();
            updates.push(ListUpdate::Reload);
        }
        self.refresh_derived(store);
        updates
    }

    /// Reloads currency state and every row after the main currency changed.
    pub fn main_currency_changed(&mut self, store: &DebtStore) -> ListUpdate {
        self.render = swallow("render_context", RenderContext::load(store)).unwrap_or_default();
        self.reload(store);
        self.refresh_derived(store);
        ListUpdate::Reload
    }

    pub fn section_count(&self) -> usize {
        self.projection.section_count()
    }

    pub fn row_count(&self, section: usize) -> usize {
        self.projection.row_count(section)
    }

    pub fn section_title(&self, section: usize) -> Option<&'static str> {
        self.query
            .result_set()
            .section_title(section)
            .map(|title| title.text())
    }

    pub fn row(&self, path: IndexPath) -> Option<DebtRowViewModel> {
        self.query
            .result_set()
            .object_at(path)
            .map(|fetched| render_debt_row(fetched, &self.render))
    }

    /// All rows in display order.
    pub fn rows(&self) -> Vec<Vec<DebtRowViewModel>> {
        self.query
            .result_set()
            .sections()
            .iter()
            .map(|section| {
                section
                    .items
                    .iter()
                    .map(|fetched| render_debt_row(fetched, &self.render))
                    .collect()
            })
            .collect()
    }

    pub fn placeholder(&self) -> PlaceholderState {
        self.placeholder
    }

    pub fn history_icon_visible(&self) -> bool {
        self.history_icon_visible
    }

    pub fn close_action_title(&self) -> &'static str {
        strings::CLOSE_DEBT_ACTION
    }

    pub fn select_row(&self, path: IndexPath) -> Option<DebtListIntent> {
        let id = self.projection.id_at(path)?;
        self.analytics.report(AnalyticsEvent::DebtSelected {
            ownership: self.ownership,
        });
        Some(DebtListIntent::OpenDebt(id))
    }

    pub fn close_row(&self, path: IndexPath) -> Option<DebtListIntent> {
        let id = self.projection.id_at(path)?;
        self.analytics.report(AnalyticsEvent::CloseDebtTapped {
            ownership: self.ownership,
        });
        Some(DebtListIntent::CloseDebt(id))
    }

    pub fn open_settings(&self) -> DebtListIntent {
        self.analytics.report(AnalyticsEvent::SettingsTapped);
        DebtListIntent::OpenSettings
    }

    pub fn open_history(&self) -> DebtListIntent {
        self.analytics.report(AnalyticsEvent::HistoryTapped);
        DebtListIntent::OpenHistory
    }

    pub fn create_debt(&self) -> DebtListIntent {
        self.analytics.report(AnalyticsEvent::CreateDebtTapped {
            ownership: self.ownership,
        });
        DebtListIntent::CreateDebt(self.ownership)
    }

    /// Re-fetches the window against the current clock and resets the
    /// projection to it.
    fn reload(&mut self, store: &DebtStore) {
        let filter = DebtFilter::windowed(self.ownership, self.window, store.now_ms());
        self.query.set_filter(store, filter);
        self.projection = ListProjection::from_result_set(self.query.result_set());
    }

    fn refresh_derived(&mut self, store: &DebtStore) {
        let base = DebtFilter::base(self.ownership);
        let base_count = swallow(
            "count_base",
            store.debts().and_then(|repo| repo.count_debts(&base)),
        )
        .unwrap_or(0);
        self.placeholder = PlaceholderState::derive(base_count, self.query.result_set());

        let closed = swallow(
            "count_closed",
            store.debts().and_then(|repo| repo.count_closed()),
        )
        .unwrap_or(0);
        self.history_icon_visible = closed > 0;
    }
}

/// Logs a failed presentation read and drops the error.
fn swallow<T>(stage: &str, result: RepoResult<T>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(err) => {
            warn!(
                "event=debt_list_{} module=presenter status=error fallback=default error={}",
                stage, err
            );
            None
        }
    }
}
