//! Key-value settings repository.
//!
//! # Invariants
//! - Keys are private to this module; callers use typed accessors.
//! - Missing keys read back as `SettingsState::default()` values.

use crate::model::debt::is_valid_currency_code;
use crate::model::settings::{Palette, SettingsState};
use crate::query::filter::TimeWindow;
use crate::repo::debt_repo::{ensure_schema_ready, RepoError, RepoResult};
use rusqlite::{params, Connection};

const KEY_MAIN_CURRENCY: &str = "main_currency";
const KEY_PALETTE: &str = "palette";
const KEY_ICLOUD_USER_ENABLED: &str = "icloud_user_enabled";
const KEY_DEBT_LIST_WINDOW: &str = "debt_list_selected_segment";

pub trait SettingsRepository {
    fn load_settings(&self) -> RepoResult<SettingsState>;
    /// `None` clears the main currency.
    fn set_main_currency(&self, code: Option<&str>) -> RepoResult<()>;
    fn set_palette(&self, palette: Palette) -> RepoResult<()>;
    fn set_icloud_user_enabled(&self, enabled: bool) -> RepoResult<()>;
    fn debt_list_window(&self) -> RepoResult<Option<TimeWindow>>;
    fn set_debt_list_window(&self, window: TimeWindow) -> RepoResult<()>;
}

pub struct SqliteSettingsRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteSettingsRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_schema_ready(conn)?;
        Ok(Self { conn })
    }

    fn get(&self, key: &str) -> RepoResult<Option<String>> {
        let mut stmt = self
            .conn
            .prepare_cached("SELECT value FROM settings WHERE key = ?1;")?;
        let mut rows = stmt.query([key])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(row.get(0)?));
        }
        Ok(None)
    }

    fn put(&self, key: &str, value: &str) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO settings (key, value, updated_at)
             VALUES (?1, ?2, (strftime('%s', 'now') * 1000))
             ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at;",
            params![key, value],
        )?;
        Ok(())
    }

    fn remove(&self, key: &str) -> RepoResult<()> {
        self.conn
            .execute("DELETE FROM settings WHERE key = ?1;", [key])?;
        Ok(())
    }
}

impl SettingsRepository for SqliteSettingsRepository<'_> {
    fn load_settings(&self) -> RepoResult<SettingsState> {
        let defaults = SettingsState::default();

        let palette = match self.get(KEY_PALETTE)? {
            Some(value) => Palette::parse(&value).ok_or_else(|| {
                RepoError::InvalidData(format!("invalid palette `{value}` in settings"))
            })?,
            None => defaults.palette,
        };
        let icloud_user_enabled = match self.get(KEY_ICLOUD_USER_ENABLED)? {
            Some(value) => parse_bool(&value, KEY_ICLOUD_USER_ENABLED)?,
            None => defaults.icloud_user_enabled,
        };

        Ok(SettingsState {
            main_currency: self.get(KEY_MAIN_CURRENCY)?,
            palette,
            icloud_user_enabled,
        })
    }

    fn set_main_currency(&self, code: Option<&str>) -> RepoResult<()> {
        match code {
            Some(code) if !is_valid_currency_code(code) => Err(RepoError::InvalidData(format!(
                "invalid currency code `{code}`"
            ))),
            Some(code) => self.put(KEY_MAIN_CURRENCY, code),
            None => self.remove(KEY_MAIN_CURRENCY),
        }
    }

    fn set_palette(&self, palette: Palette) -> RepoResult<()> {
        self.put(KEY_PALETTE, palette.as_str())
    }

    fn set_icloud_user_enabled(&self, enabled: bool) -> RepoResult<()> {
        self.put(
            KEY_ICLOUD_USER_ENABLED,
            if enabled { "true" } else { "false" },
        )
    }

    fn debt_list_window(&self) -> RepoResult<Option<TimeWindow>> {
        let Some(value) = self.get(KEY_DEBT_LIST_WINDOW)? else {
            return Ok(None);
        };
        let index = value.parse::<u32>().map_err(|_| {
            RepoError::InvalidData(format!("invalid segment index `{value}` in settings"))
        })?;
        Ok(TimeWindow::from_index(index))
    }

    fn set_debt_list_window(&self, window: TimeWindow) -> RepoResult<()> {
        self.put(KEY_DEBT_LIST_WINDOW, &window.index().to_string())
    }
}

fn parse_bool(value: &str, key: &str) -> RepoResult<bool> {
    match value {
        "true" => Ok(true),
        "false" => Ok(false),
        other => Err(RepoError::InvalidData(format!(
            "invalid boolean `{other}` for settings key {key}"
        ))),
    }
}
