//! Protocol-level constants. Anything here is a consensus-relevant limit,
//! not a node runtime tunable (those live in `ledger_node::config`).

/// Quorum bounds, spec §3: `quorum N ∈ [1,128]`.
pub const MIN_QUORUM: u32 = 1;
pub const MAX_QUORUM: u32 = 128;

/// Maximum number of commands carried by a single transaction.
pub const MAX_COMMANDS_PER_TRANSACTION: usize = 64;

/// Maximum number of signatories an account may hold.
pub const MAX_SIGNATORIES: usize = MAX_QUORUM as usize;

/// Precision ceiling for an asset quantity: values must stay below
/// `2^256 * 10^-precision`, spec §4.1(a). We can't represent a literal
/// `2^256` in a primitive type, so overflow is instead checked against
/// `u128::MAX` scaled by precision, which is the largest value the ledger's
/// balance representation (`u128` mantissa + `u8` precision) can hold.
pub const MAX_ASSET_PRECISION: u8 = 18;

/// Default MST batch expiration window, spec §4.4.
pub const DEFAULT_MST_EXPIRATION_MILLIS: u64 = 24 * 60 * 60 * 1000;

/// Default page size for paginated queries, spec §4.7.
pub const DEFAULT_QUERY_PAGE_SIZE: u32 = 100;
pub const MAX_QUERY_PAGE_SIZE: u32 = 1000;

/// Default `SetAccountDetail` / description size limit referenced by
/// `TransferAsset`'s "description ≤ configured limit" invariant.
pub const MAX_DESCRIPTION_SIZE: usize = 4096;

/// Zero-padded filesystem-backed block file name width, spec §4.3.
pub const BLOCK_FILE_NAME_WIDTH: usize = 16;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quorum_bounds_are_sane() {
        assert!(MIN_QUORUM <= MAX_QUORUM);
        assert!(MAX_SIGNATORIES >= MAX_QUORUM as usize);
    }
}
