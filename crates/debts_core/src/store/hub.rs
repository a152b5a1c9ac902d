//! Store change notification hub.
//!
//! # Responsibility
//! - Fan out one `StoreChange` per committed transaction to every subscriber.
//! - Carry notifications across threads without touching presenter state.
//!
//! # Invariants
//! - Sequence numbers are strictly increasing in commit order, because stores
//!   commit while holding the hub lock.
//! - Notifications carry ids only; consumers re-read entity state on their
//!   own thread.
//! - A dropped `Subscription` is pruned on the next publish.

use crate::model::debt::DebtId;
use log::debug;
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Kind of entity mutation inside one transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Inserted,
    Updated,
    Deleted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntityChange {
    pub id: DebtId,
    pub kind: ChangeKind,
}

/// Who committed the transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeOrigin {
    /// User edit on this device.
    Local,
    /// Merge of records pulled by cloud sync.
    Remote,
}

impl ChangeOrigin {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Remote => "remote",
        }
    }
}

/// Notification for one committed store transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreChange {
    pub sequence: u64,
    pub origin: ChangeOrigin,
    pub changes: Vec<EntityChange>,
}

impl StoreChange {
    pub fn changed_ids(&self) -> impl Iterator<Item = DebtId> + '_ {
        self.changes.iter().map(|change| change.id)
    }
}

#[derive(Default)]
pub(crate) struct HubState {
    next_sequence: u64,
    subscribers: Vec<Sender<StoreChange>>,
}

impl HubState {
    /// Sends `changes` to all live subscribers and returns the sequence.
    pub(crate) fn broadcast(&mut self, origin: ChangeOrigin, changes: Vec<EntityChange>) -> u64 {
        self.next_sequence += 1;
        let change = StoreChange {
            sequence: self.next_sequence,
            origin,
            changes,
        };
        self.subscribers
            .retain(|subscriber| subscriber.send(change.clone()).is_ok());
        debug!(
            "event=hub_publish module=store status=ok sequence={} origin={} changes={} subscribers={}",
            change.sequence,
            origin.as_str(),
            change.changes.len(),
            self.subscribers.len()
        );
        change.sequence
    }
}

/// Shared notification hub. Cloning yields another handle to the same hub.
#[derive(Clone, Default)]
pub struct ChangeHub {
    state: Arc<Mutex<HubState>>,
}

impl ChangeHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new subscriber that receives every later change.
    pub fn subscribe(&self) -> Subscription {
        let (sender, receiver) = mpsc::channel();
        self.lock().subscribers.push(sender);
        Subscription { receiver }
    }

    /// Number of registered subscribers, including ones dropped since the
    /// last publish.
    pub fn subscriber_count(&self) -> usize {
        self.lock().subscribers.len()
    }

    /// Locks the hub; committing while the guard is held keeps sequence
    /// order equal to commit order.
    pub(crate) fn lock(&self) -> MutexGuard<'_, HubState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for ChangeHub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChangeHub")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

/// Receiving end of a hub subscription. Owned by exactly one consumer thread.
#[derive(Debug)]
pub struct Subscription {
    receiver: Receiver<StoreChange>,
}

impl Subscription {
    /// Returns the next pending change without blocking.
    pub fn try_next(&self) -> Option<StoreChange> {
        match self.receiver.try_recv() {
            Ok(change) => Some(change),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }

    /// Drains all pending changes in sequence order.
    pub fn drain(&self) -> Vec<StoreChange> {
        std::iter::from_fn(|| self.try_next()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::{ChangeHub, ChangeKind, ChangeOrigin, EntityChange};
    use uuid::Uuid;

    fn inserted() -> EntityChange {
        EntityChange {
            id: Uuid::new_v4(),
            kind: ChangeKind::Inserted,
        }
    }

    #[test]
    fn every_subscriber_sees_changes_in_sequence_order() {
        let hub = ChangeHub::new();
        let first = hub.subscribe();
        let second = hub.subscribe();

        hub.lock().broadcast(ChangeOrigin::Local, vec![inserted()]);
        hub.lock().broadcast(ChangeOrigin::Remote, vec![inserted()]);

        for subscription in [&first, &second] {
            let sequences: Vec<u64> = subscription
                .drain()
                .iter()
                .map(|change| change.sequence)
                .collect();
            assert_eq!(sequences, vec![1, 2]);
        }
    }

    #[test]
    fn dropped_subscriptions_are_pruned_on_publish() {
        let hub = ChangeHub::new();
        let kept = hub.subscribe();
        drop(hub.subscribe());
        assert_eq!(hub.subscriber_count(), 2);

        hub.lock().broadcast(ChangeOrigin::Local, vec![inserted()]);
        assert_eq!(hub.subscriber_count(), 1);
        assert_eq!(kept.drain().len(), 1);
    }

    #[test]
    fn late_subscriber_misses_earlier_changes() {
        let hub = ChangeHub::new();
        hub.lock().broadcast(ChangeOrigin::Local, vec![inserted()]);
        let late = hub.subscribe();
        assert!(late.try_next().is_none());
    }
}
