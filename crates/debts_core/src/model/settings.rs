//! User preference model.
//!
//! # Invariants
//! - `SettingsState` is the single source of truth the settings screen renders
//!   from; view models are recomputed from it, never mutated in place.
//! - iCloud sync defaults to enabled when the user never toggled it.

use serde::{Deserialize, Serialize};

/// Appearance palette selected by the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Palette {
    #[default]
    Automatic,
    Light,
    Dark,
}

impl Palette {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Automatic => "automatic",
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "automatic" => Some(Self::Automatic),
            "light" => Some(Self::Light),
            "dark" => Some(Self::Dark),
            _ => None,
        }
    }

    /// User-facing name shown as the palette row subtitle.
    pub fn description(self) -> &'static str {
        match self {
            Self::Automatic => "Automatic",
            Self::Light => "Light",
            Self::Dark => "Dark",
        }
    }
}

/// Persisted user preferences.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettingsState {
    pub main_currency: Option<String>,
    pub palette: Palette,
    pub icloud_user_enabled: bool,
}

impl Default for SettingsState {
    fn default() -> Self {
        Self {
            main_currency: None,
            palette: Palette::default(),
            icloud_user_enabled: true,
        }
    }
}
