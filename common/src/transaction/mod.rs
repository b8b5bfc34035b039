pub mod batch;
pub mod command;
pub mod proposal;

pub use batch::{Batch, BatchMeta, BatchType};
pub use command::Command;
pub use proposal::{LedgerState, Proposal, VerifiedProposal};

use serde::{Deserialize, Serialize};

use crate::{
    account::AccountId,
    crypto::{Hash, Hashable, PublicKey, Signature},
    error::TransactionError,
    serializer::{Reader, ReaderError, Serializer, Writer},
    time::TimestampMillis,
};

/// A signed client transaction, spec §3. Identity is the BLAKE3 hash of its
/// payload (creator, created-time, quorum, commands, batch metadata) —
/// excluding signatures, which is also the transaction's "reduced hash" used
/// to key it inside a batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub creator: AccountId,
    pub created_time: TimestampMillis,
    pub quorum: u32,
    pub commands: Vec<Command>,
    pub batch_meta: Option<BatchMeta>,
    pub signatures: Vec<(PublicKey, Signature)>,
}

impl Transaction {
    pub fn new(
        creator: AccountId,
        created_time: TimestampMillis,
        quorum: u32,
        commands: Vec<Command>,
        batch_meta: Option<BatchMeta>,
    ) -> Self {
        Self {
            creator,
            created_time,
            quorum,
            commands,
            batch_meta,
            signatures: Vec::new(),
        }
    }

    /// Structural invariants independent of signatures: non-empty command
    /// list, quorum within protocol bounds.
    pub fn validate_structure(&self) -> Result<(), TransactionError> {
        if self.commands.is_empty() {
            return Err(TransactionError::EmptyCommands);
        }
        if self.quorum < crate::config::MIN_QUORUM || self.quorum > crate::config::MAX_QUORUM {
            return Err(TransactionError::QuorumOutOfRange {
                quorum: self.quorum,
                max: crate::config::MAX_QUORUM,
            });
        }
        Ok(())
    }

    /// Bytes signed by each signatory and hashed for transaction identity:
    /// every field except `signatures`.
    pub fn payload_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::new();
        let mut writer = Writer::new(&mut bytes);
        self.creator.write(&mut writer);
        self.created_time.write(&mut writer);
        self.quorum.write(&mut writer);
        self.commands.write(&mut writer);
        match &self.batch_meta {
            Some(meta) => {
                writer.write_bool(true);
                writer.write_u8(match meta.batch_type {
                    BatchType::Atomic => 0,
                    BatchType::Ordered => 1,
                });
                meta.reduced_hashes.write(&mut writer);
            }
            None => writer.write_bool(false),
        }
        bytes
    }

    pub fn reduced_hash(&self) -> Hash {
        crate::crypto::hash(&self.payload_bytes())
    }

    /// Adds a signature, verifying it against the payload. Re-adding an
    /// identical `(public_key, signature)` pair is a no-op (spec §4.4's
    /// "duplicate signature does not double-count" applies equally here); a
    /// different signature from an already-present public key is rejected.
    pub fn add_signature(
        &mut self,
        public_key: PublicKey,
        signature: Signature,
    ) -> Result<(), TransactionError> {
        public_key.verify(&self.payload_bytes(), &signature)?;
        if let Some((_, existing)) = self.signatures.iter().find(|(pk, _)| *pk == public_key) {
            if *existing == signature {
                return Ok(());
            }
            return Err(TransactionError::DuplicateSignature);
        }
        self.signatures.push((public_key, signature));
        Ok(())
    }

    /// Merges in another transaction's signatures (same payload assumed),
    /// used by the MST aggregator to union partial signature sets.
    pub fn merge_signatures(&mut self, other: &Transaction) {
        for (public_key, signature) in &other.signatures {
            let _ = self.add_signature(*public_key, *signature);
        }
    }

    pub fn valid_signatory_count(&self) -> usize {
        let payload = self.payload_bytes();
        self.signatures
            .iter()
            .filter(|(pk, sig)| pk.verify(&payload, sig).is_ok())
            .count()
    }

    pub fn is_fully_signed(&self) -> bool {
        self.valid_signatory_count() >= self.quorum as usize
    }
}

impl Hashable for Transaction {}

impl Serializer for Transaction {
    fn write(&self, writer: &mut Writer) {
        writer.write_bytes(&self.payload_bytes());
        writer.write_u32(self.signatures.len() as u32);
        for (public_key, signature) in &self.signatures {
            public_key.write(writer);
            signature.write(writer);
        }
    }

    fn read(reader: &mut Reader) -> Result<Self, ReaderError> {
        let creator = AccountId::read(reader)?;
        let created_time = TimestampMillis::read(reader)?;
        let quorum = u32::read(reader)?;
        let commands = Vec::<Command>::read(reader)?;
        let has_batch_meta = reader.read_bool()?;
        let batch_meta = if has_batch_meta {
            let batch_type = match reader.read_u8()? {
                0 => BatchType::Atomic,
                1 => BatchType::Ordered,
                _ => return Err(ReaderError::InvalidValue),
            };
            let reduced_hashes = Vec::<Hash>::read(reader)?;
            Some(BatchMeta { batch_type, reduced_hashes })
        } else {
            None
        };
        let signature_count = reader.read_u32()? as usize;
        let mut signatures = Vec::with_capacity(signature_count.min(1 << 16));
        for _ in 0..signature_count {
            let public_key = PublicKey::read(reader)?;
            let signature = Signature::read(reader)?;
            signatures.push((public_key, signature));
        }
        Ok(Self { creator, created_time, quorum, commands, batch_meta, signatures })
    }

    fn size(&self) -> usize {
        self.payload_bytes().len()
            + 4
            + self.signatures.iter().map(|(pk, sig)| pk.size() + sig.size()).sum::<usize>()
    }
}
