use thiserror::Error;

use crate::crypto::CryptoError;

/// Stable numeric error taxonomy shared by the command executor and the
/// status bus: 1 = internal, 2 = no permission, 3 = subject absent,
/// 4 = invariant violated, 5 = already exists / relation absent, higher
/// codes are command-specific.
pub type ErrorCode = u32;

pub const CODE_INTERNAL: ErrorCode = 1;
pub const CODE_NO_PERMISSION: ErrorCode = 2;
pub const CODE_SUBJECT_ABSENT: ErrorCode = 3;
pub const CODE_INVARIANT_VIOLATED: ErrorCode = 4;
pub const CODE_ALREADY_EXISTS: ErrorCode = 5;

#[derive(Debug, Error)]
pub enum TransactionError {
    #[error("transaction has no commands")]
    EmptyCommands,

    #[error("quorum {quorum} is out of range [1, {max}]")]
    QuorumOutOfRange { quorum: u32, max: u32 },

    #[error("transaction is not fully signed: have {have} valid signatures, need {need}")]
    NotFullySigned { have: usize, need: usize },

    #[error("duplicate signature from the same public key")]
    DuplicateSignature,

    #[error(transparent)]
    Crypto(#[from] CryptoError),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BatchError {
    #[error("batch has no transactions")]
    Empty,

    #[error("batch_meta reduced_hashes does not match the transactions it carries")]
    ReducedHashMismatch,
}
