//! Currency rate repository.
//!
//! Rates are written by the exchange-rate collaborator and read by the debt
//! list at view load and after a main-currency change.

use crate::model::currency::Currency;
use crate::model::debt::is_valid_currency_code;
use crate::repo::debt_repo::{ensure_schema_ready, RepoError, RepoResult};
use rusqlite::{params, Connection};
use std::collections::HashMap;

pub trait CurrencyRepository {
    /// Inserts or replaces one rate.
    fn upsert_currency(&self, currency: &Currency) -> RepoResult<()>;
    fn get_currency(&self, code: &str) -> RepoResult<Option<Currency>>;
    /// Returns every known rate keyed by code.
    fn rate_table(&self) -> RepoResult<HashMap<String, f64>>;
}

pub struct SqliteCurrencyRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteCurrencyRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_schema_ready(conn)?;
        Ok(Self { conn })
    }
}

impl CurrencyRepository for SqliteCurrencyRepository<'_> {
    fn upsert_currency(&self, currency: &Currency) -> RepoResult<()> {
        if !is_valid_currency_code(&currency.code) {
            return Err(RepoError::InvalidData(format!(
                "invalid currency code `{}`",
                currency.code
            )));
        }
        if !currency.value.is_finite() {
            return Err(RepoError::InvalidData(format!(
                "invalid rate `{}` for {}",
                currency.value, currency.code
            )));
        }

        self.conn.execute(
            "INSERT INTO currencies (code, value, updated_at)
             VALUES (?1, ?2, (strftime('%s', 'now') * 1000))
             ON CONFLICT(code) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at;",
            params![currency.code.as_str(), currency.value],
        )?;
        Ok(())
    }

    fn get_currency(&self, code: &str) -> RepoResult<Option<Currency>> {
        let mut stmt = self
            .conn
            .prepare_cached("SELECT code, value FROM currencies WHERE code = ?1;")?;
        let mut rows = stmt.query([code])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(Currency {
                code: row.get(0)?,
                value: row.get(1)?,
            }));
        }
        Ok(None)
    }

    fn rate_table(&self) -> RepoResult<HashMap<String, f64>> {
        let mut stmt = self.conn.prepare("SELECT code, value FROM currencies;")?;
        let mut rows = stmt.query([])?;
        let mut rates = HashMap::new();
        while let Some(row) = rows.next()? {
            rates.insert(row.get::<_, String>(0)?, row.get::<_, f64>(1)?);
        }
        Ok(rates)
    }
}
