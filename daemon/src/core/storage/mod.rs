//! Block Storage, spec §4.3: an append-only, gap-free, height-keyed store.
//! `MemoryBlockStorage` backs tests and genesis; `FileBlockStorage` is the
//! production backend, one file per height.

pub mod file;
pub mod memory;

use ledger_common::block::Block;

use crate::core::error::CoreError;

#[async_trait::async_trait]
pub trait BlockStorage: Send + Sync {
    /// Inserts `block`. Must be called in strictly increasing height order;
    /// a gap or a re-insertion of an existing height is a programmer error
    /// reported as `CoreError::Internal`, not recovered from.
    async fn insert(&self, block: Block) -> Result<(), CoreError>;

    async fn fetch(&self, height: u64) -> Result<Option<Block>, CoreError>;

    /// Highest height currently stored, or `None` if empty.
    async fn top_height(&self) -> Result<Option<u64>, CoreError>;

    async fn size(&self) -> Result<u64, CoreError>;

    /// Visits every stored block in ascending height order.
    async fn for_each(&self, visitor: &mut dyn FnMut(&Block)) -> Result<(), CoreError>;

    async fn clear(&self) -> Result<(), CoreError>;
}

#[cfg(test)]
pub(crate) fn sample_block(height: u64, previous_block_hash: ledger_common::crypto::Hash) -> Block {
    Block::new(height, previous_block_hash, 0, Vec::new(), Vec::new())
}
