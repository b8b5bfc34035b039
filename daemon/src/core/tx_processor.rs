//! Transaction Processor, spec §4.6: wires batch/MST/simulator/block events
//! into `StatusBus` transitions. Each handler is a pure translation from one
//! upstream event to the `Status` publishes it implies; the processor holds
//! no state of its own beyond the `StatusBus` handle.

use std::sync::Arc;

use ledger_common::{
    block::Block,
    time::TimestampMillis,
    transaction::{Batch, VerifiedProposal},
};

use crate::core::{
    mst::MstAggregator,
    status_bus::{Status, StatusBus},
};

pub struct TransactionProcessor {
    status_bus: Arc<StatusBus>,
}

impl TransactionProcessor {
    pub fn new(status_bus: Arc<StatusBus>) -> Self {
        Self { status_bus }
    }

    /// Stateless validation on first receipt of a transaction, the
    /// `NotReceived -> StatelessValid | StatelessFailed` edge.
    pub fn on_transaction_received(&self, tx: &ledger_common::transaction::Transaction) {
        let tx_hash = tx.reduced_hash();
        match tx.validate_structure() {
            Ok(()) => self.status_bus.publish(tx_hash, Status::StatelessValid, None),
            Err(err) => self.status_bus.publish(tx_hash, Status::StatelessFailed, Some(err.to_string())),
        }
    }

    /// A batch arrived (from a client or a peer). Already fully signed and
    /// not previously seen: publish `EnoughSignaturesCollected` directly.
    /// Otherwise: publish `MstPending` and hand it to the MST aggregator.
    pub fn on_batch_received(&self, batch: &Batch, mst: &mut MstAggregator, now: TimestampMillis) {
        if batch.is_fully_signed() {
            for tx in batch.transactions() {
                self.status_bus.publish(tx.reduced_hash(), Status::EnoughSignaturesCollected, None);
            }
        } else {
            for tx in batch.transactions() {
                self.status_bus.publish(tx.reduced_hash(), Status::MstPending, None);
            }
            mst.propagate(batch.clone(), now);
        }
    }

    pub fn on_mst_prepared(&self, batch: &Batch) {
        for tx in batch.transactions() {
            self.status_bus.publish(tx.reduced_hash(), Status::EnoughSignaturesCollected, None);
        }
    }

    pub fn on_mst_expired(&self, batch: &Batch) {
        for tx in batch.transactions() {
            self.status_bus.publish(tx.reduced_hash(), Status::MstExpired, None);
        }
    }

    pub fn on_verified_proposal(&self, verified: &VerifiedProposal) {
        for tx in &verified.valid_transactions {
            self.status_bus.publish(tx.reduced_hash(), Status::StatefulValid, None);
        }
        for (tx_hash, error) in &verified.rejected {
            let detail = format!("{} (code {}): {}", error.command_name, error.code, error.query_args);
            self.status_bus.publish(*tx_hash, Status::StatefulFailed, Some(detail));
        }
    }

    pub fn on_block_committed(&self, block: &Block) {
        for tx in &block.transactions {
            self.status_bus.publish(tx.reduced_hash(), Status::Committed, None);
        }
        for tx_hash in &block.header.rejected_transaction_hashes {
            self.status_bus.publish(*tx_hash, Status::Rejected, None);
        }
    }
}

#[cfg(test)]
mod tests {
    use ledger_common::{
        crypto::Hash,
        transaction::{BatchMeta, BatchType, Command, CommandErrorSummary, Transaction},
    };

    use super::*;

    fn make_tx() -> Transaction {
        Transaction::new(
            "alice@d".parse().unwrap(),
            0,
            1,
            vec![Command::SetSettingValue { key: "k".into(), value: "v".into() }],
            None,
        )
    }

    #[test]
    fn stateless_valid_transaction_publishes_stateless_valid() {
        let status_bus = Arc::new(StatusBus::new(8));
        let mut rx = status_bus.subscribe();
        let processor = TransactionProcessor::new(status_bus);
        let tx = make_tx();
        processor.on_transaction_received(&tx);
        let event = rx.try_recv().unwrap();
        assert_eq!(event.status, Status::StatelessValid);
    }

    #[test]
    fn unsigned_batch_goes_to_mst_pending() {
        let status_bus = Arc::new(StatusBus::new(8));
        let mut rx = status_bus.subscribe();
        let processor = TransactionProcessor::new(status_bus);
        let mut mst = MstAggregator::new(10_000, 8);

        let mut tx = make_tx();
        let reduced_hashes = vec![tx.reduced_hash()];
        tx.batch_meta = Some(BatchMeta { batch_type: BatchType::Atomic, reduced_hashes });
        let batch = Batch::new(vec![tx]).unwrap();

        processor.on_batch_received(&batch, &mut mst, 0);
        let event = rx.try_recv().unwrap();
        assert_eq!(event.status, Status::MstPending);
        assert_eq!(mst.pending_count(), 1);
    }

    #[test]
    fn block_committed_publishes_committed_and_rejected() {
        let status_bus = Arc::new(StatusBus::new(8));
        let processor = TransactionProcessor::new(Arc::clone(&status_bus));

        let tx = make_tx();
        let rejected_hash = Hash::zero();
        // Drive both hashes through the legal chain leading up to the
        // states `on_block_committed` transitions out of.
        status_bus.publish(tx.reduced_hash(), Status::StatelessValid, None);
        status_bus.publish(tx.reduced_hash(), Status::EnoughSignaturesCollected, None);
        status_bus.publish(tx.reduced_hash(), Status::StatefulValid, None);
        status_bus.publish(rejected_hash, Status::StatelessValid, None);
        status_bus.publish(rejected_hash, Status::EnoughSignaturesCollected, None);
        status_bus.publish(rejected_hash, Status::StatefulFailed, None);

        let block = Block::new(1, Hash::zero(), 0, vec![tx.clone()], vec![rejected_hash]);
        processor.on_block_committed(&block);

        assert_eq!(status_bus.status_of(tx.reduced_hash()), Status::Committed);
        assert_eq!(status_bus.status_of(rejected_hash), Status::Rejected);
    }

    #[test]
    fn verified_proposal_publishes_stateful_valid_and_failed() {
        let status_bus = Arc::new(StatusBus::new(8));
        let processor = TransactionProcessor::new(Arc::clone(&status_bus));

        let valid_tx = make_tx();
        let rejected_hash = Hash::zero();
        status_bus.publish(valid_tx.reduced_hash(), Status::StatelessValid, None);
        status_bus.publish(valid_tx.reduced_hash(), Status::EnoughSignaturesCollected, None);
        status_bus.publish(rejected_hash, Status::StatelessValid, None);
        status_bus.publish(rejected_hash, Status::EnoughSignaturesCollected, None);

        let verified = VerifiedProposal {
            round: 1,
            valid_transactions: vec![valid_tx.clone()],
            rejected: vec![(rejected_hash, CommandErrorSummary { command_name: "CreateAsset".into(), code: 3, query_args: "missing".into() })],
        };
        processor.on_verified_proposal(&verified);

        assert_eq!(status_bus.status_of(valid_tx.reduced_hash()), Status::StatefulValid);
        assert_eq!(status_bus.status_of(rejected_hash), Status::StatefulFailed);
    }
}
