//! Debt repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD, filtered listing and count APIs over `debts` storage.
//! - Keep SQL details inside the persistence boundary.
//!
//! # Invariants
//! - Write paths call `Debt::validate()` before SQL mutations.
//! - Read paths reject invalid persisted state instead of masking it.
//! - `list_debts` order equals `compare_debts` for the same descriptors.

use crate::db::migrations::latest_version;
use crate::db::DbError;
use crate::model::debt::{Debt, DebtId, DebtValidationError, Ownership};
use crate::query::filter::DebtFilter;
use crate::query::sort::{order_by_sql, SortDescriptor};
use rusqlite::{params, params_from_iter, Connection, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

const DEBT_SELECT_SQL: &str = "SELECT
    uuid,
    name,
    is_my_debt,
    due_date,
    money_amount,
    currency_code,
    thing_name,
    is_closed,
    created_at,
    updated_at
FROM debts";

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for debt, currency and settings persistence.
#[derive(Debug)]
pub enum RepoError {
    Validation(DebtValidationError),
    Db(DbError),
    NotFound(DebtId),
    /// Connection schema is not at the version this binary expects.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "debt not found: {id}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "repository requires schema version {expected_version}, got {actual_version}"
            ),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::NotFound(_) => None,
            Self::UninitializedConnection { .. } => None,
            Self::InvalidData(_) => None,
        }
    }
}

impl From<DebtValidationError> for RepoError {
    fn from(value: DebtValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Filter plus ordering for one list fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DebtListQuery {
    pub filter: DebtFilter,
    pub sort: Vec<SortDescriptor>,
}

/// Repository interface for debt persistence.
pub trait DebtRepository {
    fn create_debt(&self, debt: &Debt) -> RepoResult<DebtId>;
    fn update_debt(&self, debt: &Debt) -> RepoResult<()>;
    fn get_debt(&self, id: DebtId) -> RepoResult<Option<Debt>>;
    fn delete_debt(&self, id: DebtId) -> RepoResult<()>;
    fn list_debts(&self, query: &DebtListQuery) -> RepoResult<Vec<Debt>>;
    fn count_debts(&self, filter: &DebtFilter) -> RepoResult<u64>;
    /// Counts closed debts of any ownership (debt history).
    fn count_closed(&self) -> RepoResult<u64>;
}

/// SQLite-backed debt repository.
pub struct SqliteDebtRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteDebtRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_schema_ready(conn)?;
        Ok(Self { conn })
    }
}

impl DebtRepository for SqliteDebtRepository<'_> {
    fn create_debt(&self, debt: &Debt) -> RepoResult<DebtId> {
        debt.validate()?;

        self.conn.execute(
            "INSERT INTO debts (
                uuid,
                name,
                is_my_debt,
                due_date,
                money_amount,
                currency_code,
                thing_name,
                is_closed,
                created_at,
                updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10);",
            params![
                debt.uuid.to_string(),
                debt.name.as_str(),
                bool_to_int(debt.ownership.is_my_debt()),
                debt.due_date,
                debt.money_amount,
                debt.currency_code.as_deref(),
                debt.thing_name.as_deref(),
                bool_to_int(debt.is_closed),
                debt.created_at,
                debt.last_update,
            ],
        )?;

        Ok(debt.uuid)
    }

    fn update_debt(&self, debt: &Debt) -> RepoResult<()> {
        debt.validate()?;

        let changed = self.conn.execute(
            "UPDATE debts
             SET
                name = ?1,
                is_my_debt = ?2,
                due_date = ?3,
                money_amount = ?4,
                currency_code = ?5,
                thing_name = ?6,
                is_closed = ?7,
                updated_at = ?8
             WHERE uuid = ?9;",
            params![
                debt.name.as_str(),
                bool_to_int(debt.ownership.is_my_debt()),
                debt.due_date,
                debt.money_amount,
                debt.currency_code.as_deref(),
                debt.thing_name.as_deref(),
                bool_to_int(debt.is_closed),
                debt.last_update,
                debt.uuid.to_string(),
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(debt.uuid));
        }

        Ok(())
    }

    fn get_debt(&self, id: DebtId) -> RepoResult<Option<Debt>> {
        let mut stmt = self
            .conn
            .prepare_cached(&format!("{DEBT_SELECT_SQL} WHERE uuid = ?1;"))?;

        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_debt_row(row)?));
        }

        Ok(None)
    }

    fn delete_debt(&self, id: DebtId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM debts WHERE uuid = ?1;", [id.to_string()])?;

        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }

        Ok(())
    }

    fn list_debts(&self, query: &DebtListQuery) -> RepoResult<Vec<Debt>> {
        let (where_sql, bind_values) = query.filter.where_clause();
        let sql = format!(
            "{DEBT_SELECT_SQL} WHERE {where_sql} ORDER BY {};",
            order_by_sql(&query.sort)
        );

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut debts = Vec::new();

        while let Some(row) = rows.next()? {
            debts.push(parse_debt_row(row)?);
        }

        Ok(debts)
    }

    fn count_debts(&self, filter: &DebtFilter) -> RepoResult<u64> {
        let (where_sql, bind_values) = filter.where_clause();
        let count: i64 = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM debts WHERE {where_sql};"),
            params_from_iter(bind_values),
            |row| row.get(0),
        )?;
        Ok(count.max(0) as u64)
    }

    fn count_closed(&self) -> RepoResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM debts WHERE is_closed = 1;",
            [],
            |row| row.get(0),
        )?;
        Ok(count.max(0) as u64)
    }
}

pub(crate) fn ensure_schema_ready(conn: &Connection) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }
    Ok(())
}

fn parse_debt_row(row: &Row<'_>) -> RepoResult<Debt> {
    let uuid_text: String = row.get("uuid")?;
    let uuid = Uuid::parse_str(&uuid_text).map_err(|_| {
        RepoError::InvalidData(format!("invalid uuid value `{uuid_text}` in debts.uuid"))
    })?;

    let is_my_debt = parse_flag(row.get("is_my_debt")?, "debts.is_my_debt")?;
    let is_closed = parse_flag(row.get("is_closed")?, "debts.is_closed")?;

    let debt = Debt {
        uuid,
        name: row.get("name")?,
        ownership: Ownership::from_is_my_debt(is_my_debt),
        due_date: row.get("due_date")?,
        money_amount: row.get("money_amount")?,
        currency_code: row.get("currency_code")?,
        thing_name: row.get("thing_name")?,
        is_closed,
        created_at: row.get("created_at")?,
        last_update: row.get("updated_at")?,
    };
    debt.validate()?;
    Ok(debt)
}

fn parse_flag(value: i64, column: &str) -> RepoResult<bool> {
    match value {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(RepoError::InvalidData(format!(
            "invalid flag value `{other}` in {column}"
        ))),
    }
}

fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}
