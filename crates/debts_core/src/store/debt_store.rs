//! Transactional debt store.
//!
//! # Responsibility
//! - Own one SQLite connection plus a handle to the shared `ChangeHub`.
//! - Commit debt mutations atomically and announce them once per transaction.
//!
//! # Invariants
//! - Every successful `save`/`merge` that touched at least one debt publishes
//!   exactly one `StoreChange`; failed transactions roll back and publish
//!   nothing.
//! - `last_update` of written debts is stamped from the store clock.
//! - A store handle is used from one thread; other threads open their own
//!   handle on the same file and share the hub.

use crate::clock::Clock;
use crate::db::{open_db, open_db_in_memory, DbError};
use crate::model::debt::{Debt, DebtId};
use crate::repo::currency_repo::SqliteCurrencyRepository;
use crate::repo::debt_repo::{DebtRepository, RepoError, RepoResult, SqliteDebtRepository};
use crate::repo::settings_repo::SqliteSettingsRepository;
use crate::store::hub::{ChangeHub, ChangeKind, ChangeOrigin, EntityChange, Subscription};
use log::{debug, warn};
use rusqlite::{Connection, Transaction, TransactionBehavior};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::Path;
use std::sync::Arc;

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug)]
pub enum StoreError {
    Db(DbError),
    Repo(RepoError),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Repo(err) => Some(err),
        }
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<RepoError> for StoreError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// One store handle: connection + hub + clock.
pub struct DebtStore {
    conn: Connection,
    hub: ChangeHub,
    clock: Arc<dyn Clock>,
}

impl DebtStore {
    /// Opens (and migrates) a file-backed store.
    pub fn open(
        path: impl AsRef<Path>,
        hub: ChangeHub,
        clock: Arc<dyn Clock>,
    ) -> StoreResult<Self> {
        Ok(Self::from_connection(open_db(path)?, hub, clock))
    }

    /// Opens a private in-memory store.
    pub fn open_in_memory(hub: ChangeHub, clock: Arc<dyn Clock>) -> StoreResult<Self> {
        Ok(Self::from_connection(open_db_in_memory()?, hub, clock))
    }

    /// Wraps an already migrated connection.
    pub fn from_connection(conn: Connection, hub: ChangeHub, clock: Arc<dyn Clock>) -> Self {
        Self { conn, hub, clock }
    }

    pub fn hub(&self) -> &ChangeHub {
        &self.hub
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    pub fn now_ms(&self) -> i64 {
        self.clock.now_ms()
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn subscribe(&self) -> Subscription {
        self.hub.subscribe()
    }

    /// Read-only debt repository over this handle.
    pub fn debts(&self) -> RepoResult<SqliteDebtRepository<'_>> {
        SqliteDebtRepository::try_new(&self.conn)
    }

    pub fn currencies(&self) -> RepoResult<SqliteCurrencyRepository<'_>> {
        SqliteCurrencyRepository::try_new(&self.conn)
    }

    pub fn settings(&self) -> RepoResult<SqliteSettingsRepository<'_>> {
        SqliteSettingsRepository::try_new(&self.conn)
    }

    /// Runs `body` in one transaction and announces it as a local edit.
    ///
    /// `body` must not subscribe to the hub: the hub is locked while it runs.
    pub fn save<T>(
        &self,
        body: impl FnOnce(&mut SaveContext<'_>) -> StoreResult<T>,
    ) -> StoreResult<T> {
        self.transact(ChangeOrigin::Local, body)
    }

    /// Runs `body` in one transaction and announces it as a remote merge.
    pub fn merge<T>(
        &self,
        body: impl FnOnce(&mut SaveContext<'_>) -> StoreResult<T>,
    ) -> StoreResult<T> {
        self.transact(ChangeOrigin::Remote, body)
    }

    fn transact<T>(
        &self,
        origin: ChangeOrigin,
        body: impl FnOnce(&mut SaveContext<'_>) -> StoreResult<T>,
    ) -> StoreResult<T> {
        let mut hub = self.hub.lock();
        let tx = Transaction::new_unchecked(&self.conn, TransactionBehavior::Immediate)?;

        let outcome = SqliteDebtRepository::try_new(&tx)
            .map_err(StoreError::from)
            .and_then(|repo| {
                let mut context = SaveContext {
                    repo,
                    now_ms: self.clock.now_ms(),
                    changes: Vec::new(),
                };
                let value = body(&mut context)?;
                Ok((value, context.changes))
            });

        let (value, changes) = match outcome {
            Ok(result) => result,
            Err(err) => {
                warn!(
                    "event=store_save module=store status=error origin={} error={}",
                    origin.as_str(),
                    err
                );
                return Err(err);
            }
        };
        tx.commit()?;

        if changes.is_empty() {
            debug!(
                "event=store_save module=store status=ok origin={} changes=0",
                origin.as_str()
            );
            return Ok(value);
        }

        let change_count = changes.len();
        let sequence = hub.broadcast(origin, changes);
        debug!(
            "event=store_save module=store status=ok origin={} changes={} sequence={}",
            origin.as_str(),
            change_count,
            sequence
        );
        Ok(value)
    }
}

/// Mutation surface handed to a transaction body.
pub struct SaveContext<'tx> {
    repo: SqliteDebtRepository<'tx>,
    now_ms: i64,
    changes: Vec<EntityChange>,
}

impl SaveContext<'_> {
    /// Transaction timestamp used for `last_update`.
    pub fn now_ms(&self) -> i64 {
        self.now_ms
    }

    pub fn get(&self, id: DebtId) -> StoreResult<Option<Debt>> {
        Ok(self.repo.get_debt(id)?)
    }

    /// Inserts `debt`, stamping `last_update`.
    pub fn insert(&mut self, mut debt: Debt) -> StoreResult<Debt> {
        debt.last_update = self.now_ms;
        self.repo.create_debt(&debt)?;
        self.record(debt.uuid, ChangeKind::Inserted);
        Ok(debt)
    }

    /// Replaces an existing debt, stamping `last_update`.
    pub fn update(&mut self, mut debt: Debt) -> StoreResult<Debt> {
        debt.last_update = self.now_ms;
        self.repo.update_debt(&debt)?;
        self.record(debt.uuid, ChangeKind::Updated);
        Ok(debt)
    }

    /// Inserts or replaces a debt, as sync merges do.
    pub fn upsert(&mut self, debt: Debt) -> StoreResult<Debt> {
        if self.repo.get_debt(debt.uuid)?.is_some() {
            self.update(debt)
        } else {
            self.insert(debt)
        }
    }

    /// Marks a debt closed.
    pub fn close(&mut self, id: DebtId) -> StoreResult<Debt> {
        let mut debt = self.repo.get_debt(id)?.ok_or(RepoError::NotFound(id))?;
        debt.close();
        self.update(debt)
    }

    pub fn delete(&mut self, id: DebtId) -> StoreResult<()> {
        self.repo.delete_debt(id)?;
        self.record(id, ChangeKind::Deleted);
        Ok(())
    }

    fn record(&mut self, id: DebtId, kind: ChangeKind) {
        let Some(position) = self.changes.iter().position(|change| change.id == id) else {
            self.changes.push(EntityChange { id, kind });
            return;
        };
        match (self.changes[position].kind, kind) {
            // Created and removed inside one transaction: nobody saw it.
            (ChangeKind::Inserted, ChangeKind::Deleted) => {
                self.changes.remove(position);
            }
            (ChangeKind::Inserted, _) => {}
            (_, kind) => self.changes[position].kind = kind,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::DebtStore;
    use crate::clock::ManualClock;
    use crate::model::debt::{Debt, Ownership};
    use crate::repo::debt_repo::DebtRepository;
    use crate::store::hub::{ChangeHub, ChangeKind, ChangeOrigin};
    use std::sync::Arc;

    const NOW: i64 = 1_700_000_000_000;

    fn store() -> DebtStore {
        DebtStore::open_in_memory(ChangeHub::new(), Arc::new(ManualClock::new(NOW)))
            .expect("in-memory store")
    }

    #[test]
    fn save_publishes_one_change_per_transaction() {
        let store = store();
        let subscription = store.subscribe();

        let ids = store
            .save(|ctx| {
                let a = ctx.insert(Debt::new(Ownership::MyDebt, "a", 0))?;
                let b = ctx.insert(Debt::new(Ownership::ToMe, "b", 0))?;
                Ok((a.uuid, b.uuid))
            })
            .expect("save succeeds");

        let changes = subscription.drain();
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].origin, ChangeOrigin::Local);
        let changed: Vec<_> = changes[0].changed_ids().collect();
        assert_eq!(changed, vec![ids.0, ids.1]);
    }

    #[test]
    fn insert_then_delete_in_one_transaction_is_invisible() {
        let store = store();
        let subscription = store.subscribe();

        store
            .save(|ctx| {
                let debt = ctx.insert(Debt::new(Ownership::MyDebt, "gone", 0))?;
                ctx.delete(debt.uuid)
            })
            .expect("save succeeds");

        assert!(subscription.drain().is_empty());
    }

    #[test]
    fn failed_transaction_rolls_back_and_stays_silent() {
        let store = store();
        let subscription = store.subscribe();

        let result = store.save(|ctx| {
            ctx.insert(Debt::new(Ownership::MyDebt, "kept?", 0))?;
            ctx.insert(
                Debt::new(Ownership::MyDebt, "bad", 0)
                    .with_money(1.0, "USD")
                    .with_thing("book"),
            )
        });

        assert!(result.is_err());
        assert!(subscription.drain().is_empty());
        let repo = store.debts().expect("repo");
        assert_eq!(repo.count_closed().expect("count"), 0);
        let all = repo
            .count_debts(&crate::query::filter::DebtFilter::base(Ownership::MyDebt))
            .expect("count");
        assert_eq!(all, 0);
    }

    #[test]
    fn close_stamps_last_update_and_reports_update() {
        let clock = Arc::new(ManualClock::new(NOW));
        let store = DebtStore::open_in_memory(ChangeHub::new(), clock.clone()).expect("store");
        let debt = store
            .save(|ctx| ctx.insert(Debt::new(Ownership::ToMe, "x", NOW)))
            .expect("insert");

        let subscription = store.subscribe();
        clock.advance(1_000);
        let closed = store.merge(|ctx| ctx.close(debt.uuid)).expect("close");

        assert!(closed.is_closed);
        assert_eq!(closed.last_update, NOW + 1_000);
        let changes = subscription.drain();
        assert_eq!(changes[0].origin, ChangeOrigin::Remote);
        assert_eq!(changes[0].changes[0].kind, ChangeKind::Updated);
    }
}
