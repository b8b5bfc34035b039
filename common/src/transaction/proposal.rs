use serde::{Deserialize, Serialize};

use crate::{crypto::{Hash, PublicKey}, time::TimestampMillis};

use super::Transaction;

/// Ordered candidate transactions for a round; no signatures, ephemeral
/// (spec §3).
#[derive(Debug, Clone)]
pub struct Proposal {
    pub round: u64,
    pub created_time: TimestampMillis,
    pub transactions: Vec<Transaction>,
}

/// A proposal partitioned into stateful-valid transactions and per-rejection
/// command errors, spec §3/§4.5.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifiedProposal {
    pub round: u64,
    pub valid_transactions: Vec<Transaction>,
    pub rejected: Vec<(Hash, CommandErrorSummary)>,
}

/// The pieces of `CommandError` (spec §7) that travel with a rejection in a
/// `VerifiedProposal`, decoupled from `daemon`'s richer in-process error type
/// so `common` stays free of a dependency on the executor crate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandErrorSummary {
    pub command_name: String,
    pub code: u32,
    pub query_args: String,
}

/// Snapshot captured at consensus, spec §3. Immutable value passed along the
/// pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerState {
    pub synced_peers: Vec<PublicKey>,
    pub syncing_peers: Vec<PublicKey>,
    pub top_block_height: u64,
    pub top_block_hash: Hash,
}

impl VerifiedProposal {
    pub fn is_rejected(&self, hash: &Hash) -> bool {
        self.rejected.iter().any(|(h, _)| h == hash)
    }
}
