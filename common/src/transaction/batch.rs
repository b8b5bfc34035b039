use serde::{Deserialize, Serialize};

use crate::{crypto::Hash, error::BatchError};

use super::Transaction;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BatchType {
    Atomic,
    Ordered,
}

/// Shared metadata carried by every transaction in a batch, spec §3.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchMeta {
    pub batch_type: BatchType,
    pub reduced_hashes: Vec<Hash>,
}

/// An ordered list of transactions sharing a `BatchMeta`. Identity is the
/// hash of the concatenation of reduced hashes, spec §3.
#[derive(Debug, Clone)]
pub struct Batch {
    transactions: Vec<Transaction>,
}

impl Batch {
    /// Validates that every transaction carries the same `batch_meta`, and
    /// that its `reduced_hashes` matches the transactions' reduced hashes in
    /// order, per spec §3's batch invariant.
    pub fn new(transactions: Vec<Transaction>) -> Result<Self, BatchError> {
        let Some(first) = transactions.first() else {
            return Err(BatchError::Empty);
        };
        let Some(meta) = &first.batch_meta else {
            return Err(BatchError::ReducedHashMismatch);
        };
        if meta.reduced_hashes.len() != transactions.len() {
            return Err(BatchError::ReducedHashMismatch);
        }
        for (tx, expected_hash) in transactions.iter().zip(meta.reduced_hashes.iter()) {
            if tx.batch_meta.as_ref() != Some(meta) {
                return Err(BatchError::ReducedHashMismatch);
            }
            if tx.reduced_hash() != *expected_hash {
                return Err(BatchError::ReducedHashMismatch);
            }
        }
        Ok(Self { transactions })
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn batch_type(&self) -> BatchType {
        self.transactions[0]
            .batch_meta
            .as_ref()
            .expect("validated at construction")
            .batch_type
    }

    pub fn identity(&self) -> Hash {
        let hashes: Vec<Hash> = self
            .transactions
            .iter()
            .map(Transaction::reduced_hash)
            .collect();
        crate::crypto::hash_all(hashes.iter())
    }

    pub fn is_fully_signed(&self) -> bool {
        self.transactions.iter().all(Transaction::is_fully_signed)
    }

    /// Unions `other`'s signatures into this batch's transactions,
    /// matching by reduced hash. `other` is assumed to share this batch's
    /// identity (same reduced hashes in the same order); used by the MST
    /// aggregator to merge a newly arrived partially-signed copy into the
    /// pending one, spec §4.4.
    pub fn merge(&mut self, other: &Batch) {
        for tx in &mut self.transactions {
            if let Some(incoming) = other
                .transactions
                .iter()
                .find(|candidate| candidate.reduced_hash() == tx.reduced_hash())
            {
                tx.merge_signatures(incoming);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{crypto::KeyPair, transaction::Command};

    fn make_tx(creator: &str, batch_meta: Option<BatchMeta>) -> Transaction {
        let commands = vec![Command::SetSettingValue {
            key: "k".into(),
            value: "v".into(),
        }];
        Transaction::new(creator.parse().unwrap(), 0, 1, commands, batch_meta)
    }

    #[test]
    fn batch_identity_matches_reduced_hashes() {
        let tx1 = make_tx("alice@d", None);
        let tx2 = make_tx("bob@d", None);
        let reduced_hashes = vec![tx1.reduced_hash(), tx2.reduced_hash()];
        let meta = BatchMeta { batch_type: BatchType::Ordered, reduced_hashes: reduced_hashes.clone() };
        let tx1 = Transaction { batch_meta: Some(meta.clone()), ..tx1 };
        let tx2 = Transaction { batch_meta: Some(meta.clone()), ..tx2 };
        let batch = Batch::new(vec![tx1, tx2]).unwrap();
        assert_eq!(batch.identity(), crate::crypto::hash_all(reduced_hashes.iter()));
    }

    #[test]
    fn empty_batch_is_rejected() {
        assert_eq!(Batch::new(vec![]), Err(BatchError::Empty));
    }

    #[test]
    fn fully_signed_requires_every_transaction_signed() {
        let keypair = KeyPair::generate();
        let mut tx = make_tx("alice@d", None);
        let reduced_hashes = vec![tx.reduced_hash()];
        let meta = BatchMeta { batch_type: BatchType::Atomic, reduced_hashes };
        tx.batch_meta = Some(meta);
        let batch = Batch::new(vec![tx.clone()]).unwrap();
        assert!(!batch.is_fully_signed());
        let signature = keypair.sign(&tx.payload_bytes());
        let mut signed_tx = tx;
        signed_tx.add_signature(keypair.public_key(), signature);
        let batch = Batch::new(vec![signed_tx]).unwrap();
        assert!(batch.is_fully_signed());
    }
}
