//! Runtime configuration read from the environment.
//!
//! Blank variables count as unset.

use crate::logging::default_log_level;
use std::path::PathBuf;

pub const ENV_DB_PATH: &str = "DEBTS_DB_PATH";
pub const ENV_LOG_LEVEL: &str = "DEBTS_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "DEBTS_LOG_DIR";
pub const ENV_DONATIONS_URL: &str = "DEBTS_DONATIONS_URL";

const DEFAULT_DB_FILE: &str = "debts.sqlite3";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreConfig {
    pub db_path: PathBuf,
    pub log_level: String,
    /// File logging stays off when unset.
    pub log_dir: Option<PathBuf>,
    /// Donate row is hidden when unset.
    pub donations_url: Option<String>,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            db_path: std::env::temp_dir().join(DEFAULT_DB_FILE),
            log_level: default_log_level().to_string(),
            log_dir: None,
            donations_url: None,
        }
    }
}

impl CoreConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from any key lookup; `from_env` passes the process
    /// environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let value = |key: &str| {
            lookup(key)
                .map(|raw| raw.trim().to_string())
                .filter(|raw| !raw.is_empty())
        };
        let defaults = Self::default();
        Self {
            db_path: value(ENV_DB_PATH).map_or(defaults.db_path, PathBuf::from),
            log_level: value(ENV_LOG_LEVEL).unwrap_or(defaults.log_level),
            log_dir: value(ENV_LOG_DIR).map(PathBuf::from),
            donations_url: value(ENV_DONATIONS_URL),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{CoreConfig, ENV_DB_PATH, ENV_DONATIONS_URL, ENV_LOG_LEVEL};
    use std::collections::HashMap;
    use std::path::PathBuf;

    #[test]
    fn blank_values_fall_back_to_defaults() {
        let vars = HashMap::from([(ENV_DB_PATH, "  "), (ENV_DONATIONS_URL, "")]);
        let config = CoreConfig::from_lookup(|key| vars.get(key).map(|v| v.to_string()));
        assert_eq!(config, CoreConfig::default());
    }

    #[test]
    fn set_values_override_defaults() {
        let vars = HashMap::from([
            (ENV_DB_PATH, "/data/debts.db"),
            (ENV_LOG_LEVEL, "warn"),
            (ENV_DONATIONS_URL, "https://example.org/donate"),
        ]);
        let config = CoreConfig::from_lookup(|key| vars.get(key).map(|v| v.to_string()));
        assert_eq!(config.db_path, PathBuf::from("/data/debts.db"));
        assert_eq!(config.log_level, "warn");
        assert_eq!(config.donations_url.as_deref(), Some("https://example.org/donate"));
        assert!(config.log_dir.is_none());
    }
}
