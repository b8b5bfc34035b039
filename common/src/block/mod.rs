//! A simplified, linear block — height strictly +1 from 1, one previous-hash
//! pointer — replacing the teacher's GHOSTDAG/BlockDAG header fields, which
//! have no counterpart in this spec's totally-ordered chain (spec §3).

use serde::{Deserialize, Serialize};

use crate::{
    crypto::{Hash, Hashable, PublicKey, Signature},
    serializer::{Reader, ReaderError, Serializer, Writer},
    time::TimestampMillis,
    transaction::Transaction,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockHeader {
    pub height: u64,
    pub previous_block_hash: Hash,
    pub created_time: TimestampMillis,
    pub rejected_transaction_hashes: Vec<Hash>,
}

impl Hashable for BlockHeader {}

impl Serializer for BlockHeader {
    fn write(&self, writer: &mut Writer) {
        writer.write_u64(self.height);
        writer.write_hash(&self.previous_block_hash);
        writer.write_u64(self.created_time);
        self.rejected_transaction_hashes.write(writer);
    }

    fn read(reader: &mut Reader) -> Result<Self, ReaderError> {
        Ok(Self {
            height: reader.read_u64()?,
            previous_block_hash: reader.read_hash()?,
            created_time: reader.read_u64()?,
            rejected_transaction_hashes: Vec::<Hash>::read(reader)?,
        })
    }

    fn size(&self) -> usize {
        8 + crate::crypto::HASH_SIZE + 8 + self.rejected_transaction_hashes.size()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub header: BlockHeader,
    pub transactions: Vec<Transaction>,
    pub node_signatures: Vec<(PublicKey, Signature)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum BlockError {
    #[error("height {height} is not strictly one more than the previous height {previous}")]
    NonSequentialHeight { height: u64, previous: u64 },
    #[error("previous_block_hash does not match the hash of the block at height-1")]
    PreviousHashMismatch,
    #[error("a transaction hash appears in both the committed and rejected sets")]
    OverlappingHashes,
    #[error("duplicate transaction hash within the block")]
    DuplicateTransactionHash,
}

impl Block {
    pub const GENESIS_PREVIOUS_HASH: Hash = Hash::zero();

    pub fn new(
        height: u64,
        previous_block_hash: Hash,
        created_time: TimestampMillis,
        transactions: Vec<Transaction>,
        rejected_transaction_hashes: Vec<Hash>,
    ) -> Self {
        Self {
            header: BlockHeader {
                height,
                previous_block_hash,
                created_time,
                rejected_transaction_hashes,
            },
            transactions,
            node_signatures: Vec::new(),
        }
    }

    pub fn hash(&self) -> Hash {
        self.header.hash()
    }

    pub fn sign(&mut self, keypair: &crate::crypto::KeyPair) {
        let signature = keypair.sign(&self.header.to_bytes());
        self.node_signatures.push((keypair.public_key(), signature));
    }

    /// Validates the invariants of spec §3 that this block alone can check;
    /// the previous-hash linkage against the chain is checked by the caller
    /// (block storage has the previous block, this type does not).
    pub fn validate_self_consistency(&self) -> Result<(), BlockError> {
        let committed: std::collections::HashSet<Hash> =
            self.transactions.iter().map(Transaction::reduced_hash).collect();
        if committed.len() != self.transactions.len() {
            return Err(BlockError::DuplicateTransactionHash);
        }
        let rejected: std::collections::HashSet<Hash> =
            self.header.rejected_transaction_hashes.iter().copied().collect();
        if rejected.len() != self.header.rejected_transaction_hashes.len() {
            return Err(BlockError::DuplicateTransactionHash);
        }
        if committed.intersection(&rejected).next().is_some() {
            return Err(BlockError::OverlappingHashes);
        }
        Ok(())
    }

    pub fn validate_linkage(&self, previous: Option<&Block>) -> Result<(), BlockError> {
        match previous {
            None => {
                if self.header.height != 1 || self.header.previous_block_hash != Self::GENESIS_PREVIOUS_HASH {
                    return Err(BlockError::NonSequentialHeight { height: self.header.height, previous: 0 });
                }
            }
            Some(prev) => {
                if self.header.height != prev.header.height + 1 {
                    return Err(BlockError::NonSequentialHeight {
                        height: self.header.height,
                        previous: prev.header.height,
                    });
                }
                if self.header.previous_block_hash != prev.hash() {
                    return Err(BlockError::PreviousHashMismatch);
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_block(height: u64, previous_block_hash: Hash) -> Block {
        Block::new(height, previous_block_hash, 0, vec![], vec![])
    }

    #[test]
    fn genesis_must_reference_zero_hash_at_height_one() {
        let genesis = empty_block(1, Block::GENESIS_PREVIOUS_HASH);
        assert!(genesis.validate_linkage(None).is_ok());

        let bad = empty_block(1, crate::crypto::hash(b"not zero"));
        assert!(bad.validate_linkage(None).is_err());
    }

    #[test]
    fn height_must_increase_by_exactly_one() {
        let genesis = empty_block(1, Block::GENESIS_PREVIOUS_HASH);
        let next = empty_block(3, genesis.hash());
        assert!(matches!(
            next.validate_linkage(Some(&genesis)),
            Err(BlockError::NonSequentialHeight { .. })
        ));
    }

    #[test]
    fn previous_hash_must_match() {
        let genesis = empty_block(1, Block::GENESIS_PREVIOUS_HASH);
        let next = empty_block(2, crate::crypto::hash(b"wrong"));
        assert!(matches!(
            next.validate_linkage(Some(&genesis)),
            Err(BlockError::PreviousHashMismatch)
        ));
    }

    #[test]
    fn committed_and_rejected_hashes_must_be_disjoint() {
        let mut block = empty_block(1, Block::GENESIS_PREVIOUS_HASH);
        let tx = Transaction::new(
            "alice@d".parse().unwrap(),
            0,
            1,
            vec![crate::transaction::Command::SetSettingValue { key: "k".into(), value: "v".into() }],
            None,
        );
        block.header.rejected_transaction_hashes.push(tx.reduced_hash());
        block.transactions.push(tx);
        assert!(matches!(
            block.validate_self_consistency(),
            Err(BlockError::OverlappingHashes)
        ));
    }

    #[test]
    fn header_wire_roundtrip() {
        let block = empty_block(5, crate::crypto::hash(b"prev"));
        let decoded = BlockHeader::from_bytes(&block.header.to_bytes()).unwrap();
        assert_eq!(decoded, block.header);
    }
}
