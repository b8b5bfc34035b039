//! Per-transaction status state machine, spec §4.6. `StatusBus` holds the
//! in-memory cache and publishes status changes; `TransactionProcessor`
//! wires the other components' events into it.

use std::{collections::HashMap, sync::Mutex};

use ledger_common::crypto::Hash;

use crate::core::{events::EventBus, presence_cache::Presence};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    NotReceived,
    StatelessValid,
    StatelessFailed,
    MstPending,
    EnoughSignaturesCollected,
    StatefulValid,
    StatefulFailed,
    Committed,
    Rejected,
    MstExpired,
}

impl Status {
    pub fn is_terminal(self) -> bool {
        matches!(self, Status::Committed | Status::Rejected | Status::StatelessFailed | Status::MstExpired)
    }

    /// Spec §4.6's allowed-transition table. `NotReceived -> NotReceived`
    /// etc. (identical re-delivery) is always allowed — idempotence.
    fn can_transition_to(self, next: Status) -> bool {
        if self == next {
            return true;
        }
        matches!(
            (self, next),
            (Status::NotReceived, Status::StatelessValid)
                | (Status::NotReceived, Status::StatelessFailed)
                | (Status::StatelessValid, Status::MstPending)
                | (Status::StatelessValid, Status::EnoughSignaturesCollected)
                | (Status::MstPending, Status::EnoughSignaturesCollected)
                | (Status::MstPending, Status::MstExpired)
                | (Status::EnoughSignaturesCollected, Status::StatefulValid)
                | (Status::EnoughSignaturesCollected, Status::StatefulFailed)
                | (Status::StatefulValid, Status::Committed)
                | (Status::StatefulValid, Status::Rejected)
                // `StatefulFailed` is deliberately absent from spec §4.6's
                // terminal-state list: a transaction rejected during
                // simulation still resolves to `Rejected` once the block
                // that names it in its rejected-hashes is committed.
                | (Status::StatefulFailed, Status::Rejected)
        )
    }
}

/// A published status change, carrying the failure detail for the two
/// error-bearing transitions.
#[derive(Debug, Clone)]
pub struct StatusEvent {
    pub tx_hash: Hash,
    pub status: Status,
    pub detail: Option<String>,
}

pub struct StatusBus {
    cache: Mutex<HashMap<Hash, Status>>,
    events: EventBus<StatusEvent>,
}

impl StatusBus {
    pub fn new(channel_capacity: usize) -> Self {
        Self { cache: Mutex::new(HashMap::new()), events: EventBus::new(channel_capacity) }
    }

    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<StatusEvent> {
        self.events.subscribe()
    }

    fn current(&self, tx_hash: Hash) -> Status {
        *self.cache.lock().expect("lock poisoned").get(&tx_hash).unwrap_or(&Status::NotReceived)
    }

    /// Synchronous cache-only read, for callers that don't need the
    /// durable-presence fallback `get_status` provides.
    pub fn status_of(&self, tx_hash: Hash) -> Status {
        self.current(tx_hash)
    }

    /// Applies a transition, publishing only if it changes the cached
    /// status (identical re-delivery is a no-op, spec §4.6 idempotence). An
    /// illegal transition (not in the allowed-transition table) is silently
    /// dropped rather than panicking — event delivery may race and a
    /// downstream component should not be able to corrupt bus state.
    pub fn publish(&self, tx_hash: Hash, status: Status, detail: Option<String>) {
        let current = self.current(tx_hash);
        if current == status {
            return;
        }
        if !current.can_transition_to(status) {
            return;
        }
        self.cache.lock().expect("lock poisoned").insert(tx_hash, status);
        self.events.publish(StatusEvent { tx_hash, status, detail });
    }

    /// Combines the in-memory cache with the durable presence cache so long
    /// committed/rejected transactions whose cache entry aged out still
    /// answer correctly.
    pub async fn get_status(&self, tx_hash: Hash, presence_cache: &crate::core::presence_cache::PresenceCache) -> Status {
        let cached = self.current(tx_hash);
        if cached != Status::NotReceived {
            return cached;
        }
        match presence_cache.lookup(tx_hash).await {
            Presence::Committed => Status::Committed,
            Presence::Rejected => Status::Rejected,
            Presence::Missing => Status::NotReceived,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_identical_transition_is_a_no_op() {
        let bus = StatusBus::new(8);
        let mut rx = bus.subscribe();
        let hash = ledger_common::crypto::hash(b"tx");
        bus.publish(hash, Status::StatelessValid, None);
        assert!(rx.try_recv().is_ok());
        bus.publish(hash, Status::StatelessValid, None);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn illegal_transition_is_dropped() {
        let bus = StatusBus::new(8);
        let hash = ledger_common::crypto::hash(b"tx");
        bus.publish(hash, Status::Committed, None);
        assert_eq!(bus.current(hash), Status::NotReceived);
    }

    #[test]
    fn legal_chain_updates_cache() {
        let bus = StatusBus::new(8);
        let hash = ledger_common::crypto::hash(b"tx");
        bus.publish(hash, Status::StatelessValid, None);
        bus.publish(hash, Status::MstPending, None);
        bus.publish(hash, Status::EnoughSignaturesCollected, None);
        assert_eq!(bus.current(hash), Status::EnoughSignaturesCollected);
    }
}
