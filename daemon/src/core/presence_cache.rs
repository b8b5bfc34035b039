//! Durable presence cache, spec §4.6/§9: answers whether a transaction hash
//! was ultimately committed or rejected by scanning Block Storage, without a
//! separate index. Grounded in the original's `pending_txs_storage.hpp`
//! role — here reduced to a read-only lookup since Block Storage already
//! holds both committed and rejected hashes per block.

use std::sync::Arc;

use ledger_common::{block::Block, crypto::Hash};

use crate::core::storage::BlockStorage;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    Committed,
    Rejected,
    Missing,
}

pub struct PresenceCache {
    storage: Arc<dyn BlockStorage>,
}

impl PresenceCache {
    pub fn new(storage: Arc<dyn BlockStorage>) -> Self {
        Self { storage }
    }

    pub async fn lookup(&self, tx_hash: Hash) -> Presence {
        let mut found = Presence::Missing;
        let _ = self
            .storage
            .for_each(&mut |block: &Block| {
                if found != Presence::Missing {
                    return;
                }
                if block.transactions.iter().any(|tx| tx.reduced_hash() == tx_hash) {
                    found = Presence::Committed;
                } else if block.header.rejected_transaction_hashes.contains(&tx_hash) {
                    found = Presence::Rejected;
                }
            })
            .await;
        found
    }
}

#[cfg(test)]
mod tests {
    use ledger_common::crypto::hash;

    use super::*;
    use crate::core::storage::{memory::MemoryBlockStorage, sample_block};

    #[tokio::test]
    async fn unknown_hash_is_missing() {
        let storage = Arc::new(MemoryBlockStorage::new());
        let cache = PresenceCache::new(storage);
        assert_eq!(cache.lookup(hash(b"nope")).await, Presence::Missing);
    }

    #[tokio::test]
    async fn rejected_hash_is_found_in_block_header() {
        let storage = Arc::new(MemoryBlockStorage::new());
        let mut block = sample_block(1, Hash::zero());
        let rejected_hash = hash(b"rejected-tx");
        block.header.rejected_transaction_hashes.push(rejected_hash);
        storage.insert(block).await.unwrap();

        let cache = PresenceCache::new(storage);
        assert_eq!(cache.lookup(rejected_hash).await, Presence::Rejected);
    }
}
