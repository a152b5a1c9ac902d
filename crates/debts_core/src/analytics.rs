//! Fire-and-forget analytics events.
//!
//! # Invariants
//! - Reporting never fails and never blocks presenter state changes.
//! - Events carry flags and enum labels only, never names or amounts.

use crate::model::debt::Ownership;
use crate::model::settings::Palette;
use crate::query::filter::TimeWindow;
use log::info;
use std::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalyticsEvent {
    DebtSelected { ownership: Ownership },
    CloseDebtTapped { ownership: Ownership },
    WindowSelected { ownership: Ownership, window: TimeWindow },
    SettingsTapped,
    HistoryTapped,
    CreateDebtTapped { ownership: Ownership },
    SettingsReloaded { show_icloud: bool, show_email: bool },
    SelectCurrencyTapped,
    PaletteTapped,
    PaletteChanged { palette: Palette },
    AboutTapped,
    SyncNowTapped,
    SuggestIdeaTapped,
    ShareTapped,
    DonateTapped,
    ICloudSwitched { enabled: bool },
}

impl AnalyticsEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::DebtSelected { .. } => "debt_list_select_debt",
            Self::CloseDebtTapped { .. } => "debt_list_close_debt",
            Self::WindowSelected { .. } => "debt_list_window",
            Self::SettingsTapped => "debt_list_settings",
            Self::HistoryTapped => "debt_list_history",
            Self::CreateDebtTapped { .. } => "debt_list_create",
            Self::SettingsReloaded { .. } => "settings_reload",
            Self::SelectCurrencyTapped => "settings_select_currency",
            Self::PaletteTapped => "settings_palette",
            Self::PaletteChanged { .. } => "settings_palette_changed",
            Self::AboutTapped => "settings_about",
            Self::SyncNowTapped => "settings_sync_now",
            Self::SuggestIdeaTapped => "settings_suggest_idea",
            Self::ShareTapped => "settings_share",
            Self::DonateTapped => "settings_donate",
            Self::ICloudSwitched { .. } => "settings_icloud_switch",
        }
    }

    /// `key=value` attributes appended to the log line.
    fn attributes(&self) -> String {
        match self {
            Self::DebtSelected { ownership }
            | Self::CloseDebtTapped { ownership }
            | Self::CreateDebtTapped { ownership } => format!("ownership={}", ownership.as_str()),
            Self::WindowSelected { ownership, window } => {
                format!("ownership={} window={}", ownership.as_str(), window.as_str())
            }
            Self::SettingsReloaded {
                show_icloud,
                show_email,
            } => format!("show_icloud={show_icloud} show_email={show_email}"),
            Self::PaletteChanged { palette } => format!("palette={}", palette.as_str()),
            Self::ICloudSwitched { enabled } => format!("enabled={enabled}"),
            _ => String::new(),
        }
    }
}

/// Receiver of analytics events. Implementations must not fail.
pub trait AnalyticsSink: Send + Sync {
    fn report(&self, event: AnalyticsEvent);
}

/// Writes every event as one structured log line.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogAnalyticsSink;

impl AnalyticsSink for LogAnalyticsSink {
    fn report(&self, event: AnalyticsEvent) {
        let attributes = event.attributes();
        if attributes.is_empty() {
            info!("event=analytics module=analytics name={}", event.name());
        } else {
            info!(
                "event=analytics module=analytics name={} {}",
                event.name(),
                attributes
            );
        }
    }
}

/// Keeps reported events in memory; used by hosts that batch uploads and by
/// tests.
#[derive(Debug, Default)]
pub struct RecordingAnalyticsSink {
    events: Mutex<Vec<AnalyticsEvent>>,
}

impl RecordingAnalyticsSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns and clears the recorded events.
    pub fn take(&self) -> Vec<AnalyticsEvent> {
        match self.events.lock() {
            Ok(mut events) => std::mem::take(&mut *events),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        }
    }
}

impl AnalyticsSink for RecordingAnalyticsSink {
    fn report(&self, event: AnalyticsEvent) {
        match self.events.lock() {
            Ok(mut events) => events.push(event),
            Err(poisoned) => poisoned.into_inner().push(event),
        }
    }
}
