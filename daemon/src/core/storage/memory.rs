use std::{collections::BTreeMap, sync::Mutex};

use ledger_common::block::Block;

use super::BlockStorage;
use crate::core::error::CoreError;

/// In-memory block storage for tests and the genesis builder.
#[derive(Default)]
pub struct MemoryBlockStorage {
    blocks: Mutex<BTreeMap<u64, Block>>,
}

impl MemoryBlockStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl BlockStorage for MemoryBlockStorage {
    async fn insert(&self, block: Block) -> Result<(), CoreError> {
        block
            .validate_self_consistency()
            .map_err(|e| CoreError::Internal(e.to_string()))?;
        let mut blocks = self.blocks.lock().expect("lock poisoned");
        let expected = blocks.keys().next_back().map(|h| h + 1).unwrap_or(1);
        if block.header.height != expected {
            return Err(CoreError::Internal(format!(
                "non-sequential insert: expected height {expected}, got {}",
                block.header.height
            )));
        }
        let previous = if expected == 1 { None } else { blocks.get(&(expected - 1)) };
        block
            .validate_linkage(previous)
            .map_err(|e| CoreError::Internal(e.to_string()))?;
        blocks.insert(block.header.height, block);
        Ok(())
    }

    async fn fetch(&self, height: u64) -> Result<Option<Block>, CoreError> {
        Ok(self.blocks.lock().expect("lock poisoned").get(&height).cloned())
    }

    async fn top_height(&self) -> Result<Option<u64>, CoreError> {
        Ok(self.blocks.lock().expect("lock poisoned").keys().next_back().copied())
    }

    async fn size(&self) -> Result<u64, CoreError> {
        Ok(self.blocks.lock().expect("lock poisoned").len() as u64)
    }

    async fn for_each(&self, visitor: &mut dyn FnMut(&Block)) -> Result<(), CoreError> {
        for block in self.blocks.lock().expect("lock poisoned").values() {
            visitor(block);
        }
        Ok(())
    }

    async fn clear(&self) -> Result<(), CoreError> {
        self.blocks.lock().expect("lock poisoned").clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::storage::sample_block;

    #[tokio::test]
    async fn rejects_non_sequential_insert() {
        let storage = MemoryBlockStorage::new();
        storage.insert(sample_block(1, ledger_common::crypto::Hash::zero())).await.unwrap();
        let result = storage.insert(sample_block(3, ledger_common::crypto::hash(b"x"))).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn fetch_roundtrips_inserted_block() {
        let storage = MemoryBlockStorage::new();
        let block = sample_block(1, ledger_common::crypto::Hash::zero());
        storage.insert(block.clone()).await.unwrap();
        assert_eq!(storage.fetch(1).await.unwrap(), Some(block));
        assert_eq!(storage.top_height().await.unwrap(), Some(1));
    }
}
