//! Node runtime tunables — not consensus-relevant protocol limits, which
//! live in `ledger_common::config`. Defaults chosen for a single-node dev
//! deployment; override via the CLI flags in `Options`.

/// In-memory status bus cache capacity before old entries are evicted; the
/// durable `PresenceCache` is consulted for anything evicted early, spec §9.
pub const DEFAULT_STATUS_CACHE_CAPACITY: usize = 4096;

/// Bounded channel capacity for the typed event buses (proposals, verified
/// proposals, block creations, commits, MST events), spec §9 "back-pressure
/// is handled by bounded queues that block producers".
pub const DEFAULT_EVENT_CHANNEL_CAPACITY: usize = 256;

/// PCS-level retry bound, spec §5 "Timeouts": bounded (≤ N attempts) with
/// exponential back-off.
pub const MAX_PCS_RETRIES: u32 = 5;
pub const PCS_RETRY_BASE_DELAY_MILLIS: u64 = 50;

pub const DEFAULT_STORAGE_DIR: &str = "./ledger-data";
pub const BLOCK_STORE_SUBDIR: &str = "blocks";
pub const WSV_STORE_SUBDIR: &str = "wsv";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_capacities_are_positive() {
        assert!(DEFAULT_EVENT_CHANNEL_CAPACITY > 0);
        assert!(DEFAULT_STATUS_CACHE_CAPACITY > 0);
    }
}
