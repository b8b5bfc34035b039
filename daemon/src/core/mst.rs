//! MST Aggregator, spec §4.4: holds batches below quorum, merges incoming
//! signatures, and publishes `prepared`/`expired` events. Scheduling is
//! single-threaded cooperative — callers invoke `propagate`/`expire`
//! sequentially, matching the spec's "single actor" ownership model (§5).

use std::collections::HashMap;

use ledger_common::{crypto::Hash, time::TimestampMillis, transaction::Batch};

use crate::core::events::EventBus;

struct Pending {
    batch: Batch,
    earliest_creation_time: TimestampMillis,
}

pub struct MstAggregator {
    pending: HashMap<Hash, Pending>,
    expiration_window_millis: u64,
    prepared: EventBus<Batch>,
    expired: EventBus<Batch>,
}

impl MstAggregator {
    pub fn new(expiration_window_millis: u64, channel_capacity: usize) -> Self {
        Self {
            pending: HashMap::new(),
            expiration_window_millis,
            prepared: EventBus::new(channel_capacity),
            expired: EventBus::new(channel_capacity),
        }
    }

    pub fn subscribe_prepared(&self) -> tokio::sync::broadcast::Receiver<Batch> {
        self.prepared.subscribe()
    }

    pub fn subscribe_expired(&self) -> tokio::sync::broadcast::Receiver<Batch> {
        self.expired.subscribe()
    }

    /// Unions `batch`'s signatures into any pending copy with the same
    /// identity; a duplicate (already fully merged) batch is a no-op. If
    /// the result is fully signed, removes it from the pending set and
    /// publishes it on the `prepared` channel.
    pub fn propagate(&mut self, batch: Batch, now: TimestampMillis) {
        let identity = batch.identity();
        let entry = self.pending.entry(identity).or_insert_with(|| Pending {
            batch: batch.clone(),
            earliest_creation_time: now,
        });
        entry.batch.merge(&batch);

        if entry.batch.is_fully_signed() {
            let Pending { batch, .. } = self.pending.remove(&identity).expect("just inserted");
            self.prepared.publish(batch);
        }
    }

    /// Removes and publishes every batch whose age exceeds the expiration
    /// window as of `now`.
    pub fn expire(&mut self, now: TimestampMillis) {
        let expired_identities: Vec<Hash> = self
            .pending
            .iter()
            .filter(|(_, pending)| now.saturating_sub(pending.earliest_creation_time) > self.expiration_window_millis)
            .map(|(id, _)| *id)
            .collect();
        for identity in expired_identities {
            if let Some(pending) = self.pending.remove(&identity) {
                self.expired.publish(pending.batch);
            }
        }
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }
}

#[cfg(test)]
mod tests {
    use ledger_common::{
        crypto::KeyPair,
        transaction::{BatchMeta, BatchType, Command, Transaction},
    };

    use super::*;

    fn signed_batch_single_tx(quorum: u32) -> (Batch, KeyPair) {
        let mut tx = Transaction::new(
            "alice@d".parse().unwrap(),
            0,
            quorum,
            vec![Command::SetSettingValue { key: "k".into(), value: "v".into() }],
            None,
        );
        let reduced_hashes = vec![tx.reduced_hash()];
        tx.batch_meta = Some(BatchMeta { batch_type: BatchType::Atomic, reduced_hashes });
        let keypair = KeyPair::generate();
        (Batch::new(vec![tx]).unwrap(), keypair)
    }

    #[test]
    fn partial_signature_stays_pending() {
        let mut aggregator = MstAggregator::new(1_000, 8);
        let (batch, _) = signed_batch_single_tx(2);
        let mut prepared_rx = aggregator.subscribe_prepared();
        aggregator.propagate(batch, 0);
        assert_eq!(aggregator.pending_count(), 1);
        assert!(prepared_rx.try_recv().is_err());
    }

    #[test]
    fn becomes_prepared_once_quorum_met() {
        let mut aggregator = MstAggregator::new(1_000, 8);
        let mut prepared_rx = aggregator.subscribe_prepared();

        let mut tx = Transaction::new(
            "alice@d".parse().unwrap(),
            0,
            1,
            vec![Command::SetSettingValue { key: "k".into(), value: "v".into() }],
            None,
        );
        let reduced_hashes = vec![tx.reduced_hash()];
        tx.batch_meta = Some(BatchMeta { batch_type: BatchType::Atomic, reduced_hashes });
        let keypair = KeyPair::generate();
        let signature = keypair.sign(&tx.payload_bytes());
        tx.add_signature(keypair.public_key(), signature).unwrap();
        let batch = Batch::new(vec![tx]).unwrap();

        aggregator.propagate(batch, 0);
        assert_eq!(aggregator.pending_count(), 0);
        assert!(prepared_rx.try_recv().is_ok());
    }

    #[test]
    fn stale_batch_is_expired() {
        let mut aggregator = MstAggregator::new(100, 8);
        let mut expired_rx = aggregator.subscribe_expired();
        let (batch, _) = signed_batch_single_tx(2);
        aggregator.propagate(batch, 0);
        aggregator.expire(50);
        assert_eq!(aggregator.pending_count(), 1);
        aggregator.expire(201);
        assert_eq!(aggregator.pending_count(), 0);
        assert!(expired_rx.try_recv().is_ok());
    }
}
