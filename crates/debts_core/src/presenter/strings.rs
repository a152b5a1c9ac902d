//! User-facing copy rendered by the presenters.

pub const SCREEN_TITLE_MY_DEBTS: &str = "I owe";
pub const SCREEN_TITLE_DEBTS_TO_ME: &str = "Owe me";

pub const DUE_PREFIX: &str = "Due:";
pub const CONVERTED_PREFIX: &str = "~";

pub const GENERAL_PLACEHOLDER_TITLE: &str = "No debts yet";
pub const GENERAL_PLACEHOLDER_SUBTITLE: &str = "Tap + to add your first debt";
pub const WINDOW_PLACEHOLDER_TITLE: &str = "Nothing due in this period";

pub const CLOSE_DEBT_ACTION: &str = "Close";

pub const SETTINGS_SCREEN_TITLE: &str = "Settings";

pub const SETTINGS_BASE_CURRENCY: &str = "Base currency";
pub const SETTINGS_BASE_CURRENCY_UNSET: &str = "Not selected";
pub const SETTINGS_PALETTE: &str = "Appearance";
pub const SETTINGS_ICLOUD_SYNC: &str = "iCloud sync";
pub const SETTINGS_ABOUT_US: &str = "About us";
pub const SETTINGS_ICLOUD_SYNC_NOW: &str = "Sync now";
pub const SETTINGS_SUGGEST_IDEA: &str = "Suggest an idea";
pub const SETTINGS_SHARE_APPLICATION: &str = "Share the app";
pub const SETTINGS_DONATE: &str = "Support the developer";
