//! Change events between two result-set snapshots.
//!
//! # Index semantics
//! - `Delete`, `Update` and `Move::from` address the snapshot before the batch.
//! - `Insert`, `Move::to`, `SectionInsert` and `SectionUpdate` address the
//!   snapshot after the batch; `SectionDelete` addresses the one before.
//! - Removing deleted and moved rows (descending), then deleted sections, then
//!   inserting sections and rows (ascending) turns the old snapshot into the
//!   new one. Rows that did not change never move relative to each other.

use crate::model::debt::DebtId;
use crate::query::result_set::{FetchedDebt, IndexPath, ResultSet, SectionKey};
use crate::store::hub::ChangeOrigin;
use std::collections::{HashMap, HashSet};

/// One list mutation delivered by a live query.
#[derive(Debug, Clone, PartialEq)]
pub enum ChangeEvent {
    BeginBatch,
    SectionInsert(usize),
    SectionUpdate(usize),
    SectionDelete(usize),
    Insert {
        debt: FetchedDebt,
        new_path: IndexPath,
    },
    Update {
        debt: FetchedDebt,
        path: IndexPath,
    },
    Move {
        debt: FetchedDebt,
        from: IndexPath,
        to: IndexPath,
    },
    Delete {
        path: IndexPath,
    },
    EndBatch,
}

/// Events for one store transaction, framed by `BeginBatch`/`EndBatch`.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeBatch {
    /// Hub sequence of the transaction that produced this batch.
    pub sequence: u64,
    pub origin: ChangeOrigin,
    pub events: Vec<ChangeEvent>,
}

impl ChangeBatch {
    pub(crate) fn framed(sequence: u64, origin: ChangeOrigin, body: Vec<ChangeEvent>) -> Self {
        let mut events = Vec::with_capacity(body.len() + 2);
        events.push(ChangeEvent::BeginBatch);
        events.extend(body);
        events.push(ChangeEvent::EndBatch);
        Self {
            sequence,
            origin,
            events,
        }
    }

    /// Events between the frame markers.
    pub fn body(&self) -> &[ChangeEvent] {
        let len = self.events.len();
        if len >= 2 {
            &self.events[1..len - 1]
        } else {
            &[]
        }
    }
}

struct Located {
    path: IndexPath,
    key: SectionKey,
}

fn locate(set: &ResultSet) -> HashMap<DebtId, Located> {
    set.rows()
        .map(|(path, item)| {
            let key = set.sections()[path.section].key;
            (item.id(), Located { path, key })
        })
        .collect()
}

/// Computes the event body turning `old` into `new`.
///
/// `changed` names rows whose content may differ; rows outside it are
/// treated as untouched even when they appear at a shifted index.
pub(crate) fn diff_result_sets(
    old: &ResultSet,
    new: &ResultSet,
    changed: &HashSet<DebtId>,
) -> Vec<ChangeEvent> {
    let old_located = locate(old);
    let new_located = locate(new);

    let mut events = section_events(old, new);

    for (path, item) in old.rows() {
        if !new_located.contains_key(&item.id()) {
            events.push(ChangeEvent::Delete { path });
        }
    }
    for (path, item) in new.rows() {
        if !old_located.contains_key(&item.id()) {
            events.push(ChangeEvent::Insert {
                debt: item.clone(),
                new_path: path,
            });
        }
    }

    let mut moves = Vec::new();
    let mut updates = Vec::new();
    for (section_index, section) in old.sections().iter().enumerate() {
        // Survivors that stay under the same key, in old order.
        let mut survivors = Vec::new();
        for (row, item) in section.items.iter().enumerate() {
            let id = item.id();
            let Some(target) = new_located.get(&id) else {
                continue;
            };
            let from = IndexPath::new(section_index, row);
            let moved_item = new.object_at(target.path).cloned();
            let Some(moved_item) = moved_item else {
                continue;
            };
            if target.key != section.key {
                moves.push(ChangeEvent::Move {
                    debt: moved_item,
                    from,
                    to: target.path,
                });
                continue;
            }
            survivors.push((from, target.path, changed.contains(&id), moved_item));
        }

        let order: Vec<(usize, bool)> = survivors
            .iter()
            .map(|(_, to, is_changed, _)| (to.row, *is_changed))
            .collect();
        let kept = stable_rows(&order);

        for ((from, to, is_changed, item), keep) in survivors.into_iter().zip(kept) {
            if !keep {
                moves.push(ChangeEvent::Move {
                    debt: item,
                    from,
                    to,
                });
            } else if is_changed {
                updates.push(ChangeEvent::Update {
                    debt: item,
                    path: from,
                });
            }
        }
    }

    events.extend(moves);
    events.extend(updates);
    events
}

fn section_events(old: &ResultSet, new: &ResultSet) -> Vec<ChangeEvent> {
    let old_keys: Vec<SectionKey> = old.sections().iter().map(|section| section.key).collect();
    let new_keys: Vec<SectionKey> = new.sections().iter().map(|section| section.key).collect();
    let mut events = Vec::new();

    for (index, key) in old_keys.iter().enumerate() {
        if !new_keys.contains(key) {
            events.push(ChangeEvent::SectionDelete(index));
        }
    }

    let mut updates = Vec::new();
    for (index, key) in new_keys.iter().enumerate() {
        let Some(old_index) = old_keys.iter().position(|candidate| candidate == key) else {
            events.push(ChangeEvent::SectionInsert(index));
            continue;
        };
        let old_first = old.sections()[old_index].items.first();
        let new_first = new.sections()[index].items.first();
        let header_changed = match (old_first, new_first) {
            (Some(before), Some(after)) => {
                before.id() != after.id() || before.is_expired != after.is_expired
            }
            _ => true,
        };
        if old_index != index || header_changed {
            updates.push(ChangeEvent::SectionUpdate(index));
        }
    }
    events.extend(updates);
    events
}

/// Picks the rows that can stay in place: the heaviest increasing run of new
/// rows, where unchanged rows outweigh every changed row combined so they are
/// always kept.
fn stable_rows(rows: &[(usize, bool)]) -> Vec<bool> {
    if rows.iter().all(|(_, is_changed)| !is_changed) {
        return vec![true; rows.len()];
    }

    let heavy = rows.len() as u64 + 1;
    let weight = |is_changed: bool| if is_changed { 1 } else { heavy };

    let mut best = vec![0u64; rows.len()];
    let mut previous: Vec<Option<usize>> = vec![None; rows.len()];
    for current in 0..rows.len() {
        best[current] = weight(rows[current].1);
        for earlier in 0..current {
            let candidate = best[earlier] + weight(rows[current].1);
            if rows[earlier].0 < rows[current].0 && candidate > best[current] {
                best[current] = candidate;
                previous[current] = Some(earlier);
            }
        }
    }

    let mut keep = vec![false; rows.len()];
    let mut cursor = (0..rows.len()).max_by_key(|index| best[*index]);
    while let Some(index) = cursor {
        keep[index] = true;
        cursor = previous[index];
    }
    keep
}
