//! Standing debt query with incremental change batches.
//!
//! # Responsibility
//! - Hold the current `ResultSet` for one filter/sort request.
//! - Turn hub notifications into framed change batches on the caller thread.
//!
//! # Invariants
//! - The subscription is taken before the first fetch, so no committed
//!   transaction is missed.
//! - `set_filter` is a full reload: it emits no events and discards pending
//!   notifications, which the fresh fetch already reflects.
//! - Every applied notification re-checks the expiry of retained rows, so a
//!   row whose due date passed changes section with the next mutation.
//! - Store read failures never surface: the snapshot becomes empty and the
//!   next notification triggers a full refetch.

use crate::model::debt::DebtId;
use crate::query::diff::{diff_result_sets, ChangeBatch};
use crate::query::filter::DebtFilter;
use crate::query::result_set::{FetchedDebt, ResultSet};
use crate::query::sort::{compare_debts, SortDescriptor, DEBT_LIST_SORT};
use crate::repo::debt_repo::{DebtListQuery, DebtRepository, RepoResult};
use crate::store::debt_store::DebtStore;
use crate::store::hub::{StoreChange, Subscription};
use log::{debug, warn};
use std::collections::HashSet;

/// Declarative description of a live query. Rows are always sectioned by
/// expiry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub filter: DebtFilter,
    pub sort: Vec<SortDescriptor>,
}

impl FetchRequest {
    /// Debt list request in list sort order.
    pub fn debt_list(filter: DebtFilter) -> Self {
        Self {
            filter,
            sort: DEBT_LIST_SORT.to_vec(),
        }
    }
}

pub struct LiveQuery {
    request: FetchRequest,
    result_set: ResultSet,
    subscription: Subscription,
    stale: bool,
}

impl LiveQuery {
    /// Subscribes to `store` and fetches the initial snapshot.
    pub fn open(store: &DebtStore, request: FetchRequest) -> Self {
        let subscription = store.subscribe();
        let mut query = Self {
            request,
            result_set: ResultSet::empty(),
            subscription,
            stale: false,
        };
        query.reload(store);
        query
    }

    pub fn request(&self) -> &FetchRequest {
        &self.request
    }

    pub fn result_set(&self) -> &ResultSet {
        &self.result_set
    }

    /// Replaces the predicate and recomputes the snapshot without events.
    pub fn set_filter(&mut self, store: &DebtStore, filter: DebtFilter) -> &ResultSet {
        let skipped = self.subscription.drain().len();
        self.request.filter = filter;
        self.reload(store);
        debug!(
            "event=live_query_refilter module=query status=ok rows={} skipped_notifications={}",
            self.result_set.total_count(),
            skipped
        );
        &self.result_set
    }

    /// Drains delivered notifications, one batch per transaction that touched
    /// this query's rows.
    pub fn poll(&mut self, store: &DebtStore) -> Vec<ChangeBatch> {
        self.subscription
            .drain()
            .iter()
            .filter_map(|change| self.apply_change(store, change))
            .collect()
    }

    /// Applies one notification and returns its batch, if any row changed.
    pub fn apply_change(&mut self, store: &DebtStore, change: &StoreChange) -> Option<ChangeBatch> {
        let (next, changed) = if self.stale {
            let next = self.fetch_all(store);
            let mut changed: HashSet<DebtId> = self.result_set.rows().map(|(_, row)| row.id()).collect();
            changed.extend(next.rows().map(|(_, row)| row.id()));
            (next, changed)
        } else {
            let mut changed: HashSet<DebtId> = change.changed_ids().collect();
            let expired = self.outdated_expiry(store.now_ms());
            if !expired.is_empty() {
                debug!(
                    "event=live_query_expiry module=query status=ok sequence={} rows={}",
                    change.sequence,
                    expired.len()
                );
            }
            changed.extend(expired);
            let next = self.patch(store, &changed);
            (next, changed)
        };

        let body = diff_result_sets(&self.result_set, &next, &changed);
        self.result_set = next;
        if body.is_empty() {
            return None;
        }

        debug!(
            "event=live_query_batch module=query status=ok sequence={} origin={} events={} rows={}",
            change.sequence,
            change.origin.as_str(),
            body.len(),
            self.result_set.total_count()
        );
        Some(ChangeBatch::framed(change.sequence, change.origin, body))
    }

    fn reload(&mut self, store: &DebtStore) {
        self.result_set = self.fetch_all(store);
    }

    fn fetch_all(&mut self, store: &DebtStore) -> ResultSet {
        let now_ms = store.now_ms();
        let query = DebtListQuery {
            filter: self.request.filter,
            sort: self.request.sort.clone(),
        };
        let fetched = store.debts().and_then(|repo| repo.list_debts(&query));
        match fetched {
            Ok(debts) => {
                self.stale = false;
                let rows = debts
                    .into_iter()
                    .map(|debt| FetchedDebt::new(debt, now_ms))
                    .collect();
                ResultSet::from_sorted(rows)
            }
            Err(err) => self.fail("fetch", &err),
        }
    }

    /// Rebuilds the snapshot by re-reading only `changed` rows.
    fn patch(&mut self, store: &DebtStore, changed: &HashSet<DebtId>) -> ResultSet {
        let now_ms = store.now_ms();
        let mut rows: Vec<FetchedDebt> = self
            .result_set
            .rows()
            .filter(|(_, row)| !changed.contains(&row.id()))
            .map(|(_, row)| row.clone())
            .collect();

        let reread: RepoResult<Vec<FetchedDebt>> = store.debts().and_then(|repo| {
            let mut fresh = Vec::new();
            for id in changed {
                if let Some(debt) = repo.get_debt(*id)? {
                    if self.request.filter.matches(&debt) {
                        fresh.push(FetchedDebt::new(debt, now_ms));
                    }
                }
            }
            Ok(fresh)
        });
        match reread {
            Ok(fresh) => rows.extend(fresh),
            Err(err) => return self.fail("patch", &err),
        }

        rows.sort_by(|left, right| compare_debts(&self.request.sort, &left.debt, &right.debt));
        ResultSet::from_sorted(rows)
    }

    /// Retained rows whose due date passed since they were read.
    fn outdated_expiry(&self, now_ms: i64) -> Vec<DebtId> {
        self.result_set
            .rows()
            .filter(|(_, row)| row.expiry_outdated(now_ms))
            .map(|(_, row)| row.id())
            .collect()
    }

    fn fail(&mut self, stage: &str, err: &dyn std::error::Error) -> ResultSet {
        warn!(
            "event=live_query_{} module=query status=error fallback=empty error={}",
            stage, err
        );
        self.stale = true;
        ResultSet::empty()
    }
}
