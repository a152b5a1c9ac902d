//! Settings screen presenter.
//!
//! # Responsibility
//! - Recompute immutable settings rows from `SettingsState` and the host
//!   environment.
//! - Persist user choices and translate row selection into actions.
//!
//! # Invariants
//! - Rows are never edited in place; every change rebuilds all sections.
//! - Hidden rows leave no empty section behind.

use crate::analytics::{AnalyticsEvent, AnalyticsSink};
use crate::model::settings::{Palette, SettingsState};
use crate::presenter::strings;
use crate::query::result_set::IndexPath;
use crate::repo::currency_repo::CurrencyRepository;
use crate::repo::debt_repo::RepoError;
use crate::repo::settings_repo::SettingsRepository;
use crate::store::debt_store::DebtStore;
use log::info;
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

pub type SettingsResult<T> = Result<T, SettingsError>;

#[derive(Debug)]
pub enum SettingsError {
    Repo(RepoError),
    /// Main currency code has no stored rate.
    UnknownCurrency(String),
}

impl Display for SettingsError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Repo(err) => write!(f, "{err}"),
            Self::UnknownCurrency(code) => write!(f, "currency `{code}` is not available"),
        }
    }
}

impl Error for SettingsError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            Self::UnknownCurrency(_) => None,
        }
    }
}

impl From<RepoError> for SettingsError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SettingsField {
    BaseCurrency,
    Palette,
    ICloudSync,
    AboutUs,
    ICloudSyncNow,
    SuggestIdea,
    ShareApplication,
    Donate,
}

impl SettingsField {
    /// Full layout before hiding rules apply.
    const LAYOUT: [&'static [SettingsField]; 5] = [
        &[Self::BaseCurrency],
        &[Self::Palette, Self::ICloudSync, Self::AboutUs],
        &[Self::ICloudSyncNow],
        &[Self::SuggestIdea, Self::ShareApplication],
        &[Self::Donate],
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum Accessory {
    None,
    Disclosure,
    Switch { on: bool },
}

/// Text emphasis of a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TextRole {
    Title,
    Action,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SettingsRow {
    pub field: SettingsField,
    pub title: String,
    pub subtitle: Option<String>,
    pub accessory: Accessory,
    pub text_role: TextRole,
    pub selectable: bool,
    pub has_icon: bool,
}

/// Host capabilities that decide which rows exist.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SettingsEnvironment {
    pub icloud_system_enabled: bool,
    pub can_send_email: bool,
    pub donations_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingsAction {
    OpenCurrencyPicker,
    OpenPalettePicker,
    OpenAbout,
    SyncNow,
    SuggestIdea,
    ShareApplication,
    OpenLink(String),
}

/// Main currency after a change; the debt list reloads on it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrencyChange {
    pub main_currency: Option<String>,
}

pub struct SettingsPresenter {
    state: SettingsState,
    environment: SettingsEnvironment,
    sections: Vec<Vec<SettingsRow>>,
    analytics: Arc<dyn AnalyticsSink>,
}

impl SettingsPresenter {
    pub fn load(
        store: &DebtStore,
        environment: SettingsEnvironment,
        analytics: Arc<dyn AnalyticsSink>,
    ) -> SettingsResult<Self> {
        let state = store.settings()?.load_settings()?;
        let mut presenter = Self {
            state,
            environment,
            sections: Vec::new(),
            analytics,
        };
        presenter.rebuild();
        Ok(presenter)
    }

    pub fn title(&self) -> &'static str {
        strings::SETTINGS_SCREEN_TITLE
    }

    pub fn state(&self) -> &SettingsState {
        &self.state
    }

    pub fn sections(&self) -> &[Vec<SettingsRow>] {
        &self.sections
    }

    pub fn section_count(&self) -> usize {
        self.sections.len()
    }

    pub fn row_count(&self, section: usize) -> usize {
        self.sections.get(section).map_or(0, Vec::len)
    }

    pub fn row(&self, path: IndexPath) -> Option<&SettingsRow> {
        self.sections.get(path.section)?.get(path.row)
    }

    pub fn index_path_of(&self, field: SettingsField) -> Option<IndexPath> {
        self.sections
            .iter()
            .enumerate()
            .find_map(|(section, rows)| {
                rows.iter()
                    .position(|row| row.field == field)
                    .map(|row| IndexPath::new(section, row))
            })
    }

    /// Applies new host capabilities, e.g. after an iCloud account change.
    pub fn set_environment(&mut self, environment: SettingsEnvironment) {
        self.environment = environment;
        self.rebuild();
    }

    /// Action for a tapped row; the iCloud switch row has none.
    pub fn select(&self, path: IndexPath) -> Option<SettingsAction> {
        let field = self.row(path)?.field;
        let (event, action) = match field {
            SettingsField::BaseCurrency => (
                AnalyticsEvent::SelectCurrencyTapped,
                Some(SettingsAction::OpenCurrencyPicker),
            ),
            SettingsField::Palette => (
                AnalyticsEvent::PaletteTapped,
                Some(SettingsAction::OpenPalettePicker),
            ),
            SettingsField::ICloudSync => return None,
            SettingsField::AboutUs => (AnalyticsEvent::AboutTapped, Some(SettingsAction::OpenAbout)),
            SettingsField::ICloudSyncNow => (
                AnalyticsEvent::SyncNowTapped,
                self.environment
                    .icloud_system_enabled
                    .then_some(SettingsAction::SyncNow),
            ),
            SettingsField::SuggestIdea => (
                AnalyticsEvent::SuggestIdeaTapped,
                Some(SettingsAction::SuggestIdea),
            ),
            SettingsField::ShareApplication => (
                AnalyticsEvent::ShareTapped,
                Some(SettingsAction::ShareApplication),
            ),
            SettingsField::Donate => (
                AnalyticsEvent::DonateTapped,
                self.environment
                    .donations_url
                    .clone()
                    .map(SettingsAction::OpenLink),
            ),
        };
        self.analytics.report(event);
        action
    }

    pub fn set_icloud_enabled(&mut self, store: &DebtStore, enabled: bool) -> SettingsResult<()> {
        self.analytics
            .report(AnalyticsEvent::ICloudSwitched { enabled });
        store.settings()?.set_icloud_user_enabled(enabled)?;
        self.state.icloud_user_enabled = enabled;
        self.rebuild();
        Ok(())
    }

    pub fn set_palette(&mut self, store: &DebtStore, palette: Palette) -> SettingsResult<()> {
        store.settings()?.set_palette(palette)?;
        self.analytics
            .report(AnalyticsEvent::PaletteChanged { palette });
        self.state.palette = palette;
        self.rebuild();
        Ok(())
    }

    /// Stores the main currency; `None` clears it.
    pub fn set_main_currency(
        &mut self,
        store: &DebtStore,
        code: Option<&str>,
    ) -> SettingsResult<CurrencyChange> {
        if let Some(code) = code {
            if store.currencies()?.get_currency(code)?.is_none() {
                return Err(SettingsError::UnknownCurrency(code.to_string()));
            }
        }
        store.settings()?.set_main_currency(code)?;
        self.state.main_currency = code.map(str::to_string);
        self.rebuild();
        info!(
            "event=settings_main_currency module=presenter status=ok is_set={}",
            code.is_some()
        );
        Ok(CurrencyChange {
            main_currency: self.state.main_currency.clone(),
        })
    }

    fn rebuild(&mut self) {
        let hidden = |field: SettingsField| match field {
            SettingsField::ICloudSync | SettingsField::ICloudSyncNow => {
                !self.environment.icloud_system_enabled
            }
            SettingsField::SuggestIdea => !self.environment.can_send_email,
            SettingsField::Donate => self.environment.donations_url.is_none(),
            _ => false,
        };

        self.sections = SettingsField::LAYOUT
            .iter()
            .map(|fields| {
                fields
                    .iter()
                    .copied()
                    .filter(|field| !hidden(*field))
                    .map(|field| build_row(field, &self.state))
                    .collect::<Vec<_>>()
            })
            .filter(|rows| !rows.is_empty())
            .collect();

        self.analytics.report(AnalyticsEvent::SettingsReloaded {
            show_icloud: self.environment.icloud_system_enabled,
            show_email: self.environment.can_send_email,
        });
    }
}

fn build_row(field: SettingsField, state: &SettingsState) -> SettingsRow {
    let row = |title: &str, accessory: Accessory, text_role: TextRole| SettingsRow {
        field,
        title: title.to_string(),
        subtitle: None,
        accessory,
        text_role,
        selectable: true,
        has_icon: false,
    };
    match field {
        SettingsField::BaseCurrency => SettingsRow {
            subtitle: Some(
                state
                    .main_currency
                    .clone()
                    .unwrap_or_else(|| strings::SETTINGS_BASE_CURRENCY_UNSET.to_string()),
            ),
            ..row(strings::SETTINGS_BASE_CURRENCY, Accessory::Disclosure, TextRole::Title)
        },
        SettingsField::Palette => SettingsRow {
            subtitle: Some(state.palette.description().to_string()),
            ..row(strings::SETTINGS_PALETTE, Accessory::Disclosure, TextRole::Title)
        },
        SettingsField::ICloudSync => SettingsRow {
            selectable: false,
            ..row(
                strings::SETTINGS_ICLOUD_SYNC,
                Accessory::Switch {
                    on: state.icloud_user_enabled,
                },
                TextRole::Title,
            )
        },
        SettingsField::AboutUs => row(strings::SETTINGS_ABOUT_US, Accessory::Disclosure, TextRole::Title),
        SettingsField::ICloudSyncNow => {
            row(strings::SETTINGS_ICLOUD_SYNC_NOW, Accessory::None, TextRole::Action)
        }
        SettingsField::SuggestIdea => {
            row(strings::SETTINGS_SUGGEST_IDEA, Accessory::None, TextRole::Action)
        }
        SettingsField::ShareApplication => row(
            strings::SETTINGS_SHARE_APPLICATION,
            Accessory::None,
            TextRole::Action,
        ),
        SettingsField::Donate => SettingsRow {
            has_icon: true,
            ..row(strings::SETTINGS_DONATE, Accessory::Disclosure, TextRole::Title)
        },
    }
}
