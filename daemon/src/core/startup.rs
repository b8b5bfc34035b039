//! Startup decision table, spec §6: a pure function from the current block
//! store's state and the operator's flags to the action the node takes
//! before entering its normal run loop.

/// What's observed on disk before any decision is made.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockStoreState {
    pub is_empty: bool,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct StartupOptions {
    pub genesis_given: bool,
    pub overwrite_ledger: bool,
    pub drop_state: bool,
    pub reuse_state: bool,
    pub wait_for_new_blocks: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartupAction {
    /// Block store is empty and a genesis block was supplied: insert it as
    /// block 1.
    InsertGenesis,
    /// Block store is empty and no genesis block was supplied: there is no
    /// state to start from.
    Fatal,
    /// Block store is non-empty, a genesis block was supplied, but
    /// `overwrite_ledger` is false: ignore the genesis block and restore
    /// existing state.
    WarnIgnoreGenesisRestore,
    /// Block store is non-empty, a genesis block was supplied, and
    /// `overwrite_ledger` is true: drop existing state and insert genesis.
    DropAndInsertGenesis,
    /// Block store is non-empty, no genesis block was supplied, but
    /// `overwrite_ledger` is true: keep the block store, rebuild the WSV
    /// from scratch by re-applying every block.
    WarnResetWsvOnly,
    /// Block store is non-empty, no genesis block was supplied, and
    /// `overwrite_ledger` is false: restore existing state as-is.
    Restore,
}

/// Spec §6's six-row decision table, `{genesis_given, overwrite_ledger} x
/// {block store empty/non-empty}`. `drop_state`/`reuse_state`/
/// `wait_for_new_blocks` don't change *which* action is taken here — they
/// govern behavior within `Restore`/`WarnResetWsvOnly` once chosen (whether
/// the rebuilt WSV is persisted immediately, and whether the node blocks
/// waiting for the next block before serving queries).
pub fn decide_startup_action(store: BlockStoreState, options: StartupOptions) -> StartupAction {
    match (store.is_empty, options.genesis_given, options.overwrite_ledger) {
        (true, true, _) => StartupAction::InsertGenesis,
        (true, false, _) => StartupAction::Fatal,
        (false, true, false) => StartupAction::WarnIgnoreGenesisRestore,
        (false, true, true) => StartupAction::DropAndInsertGenesis,
        (false, false, true) => StartupAction::WarnResetWsvOnly,
        (false, false, false) => StartupAction::Restore,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(genesis_given: bool, overwrite_ledger: bool) -> StartupOptions {
        StartupOptions { genesis_given, overwrite_ledger, ..Default::default() }
    }

    #[test]
    fn empty_store_with_genesis_inserts_it() {
        let store = BlockStoreState { is_empty: true };
        assert_eq!(decide_startup_action(store, options(true, false)), StartupAction::InsertGenesis);
        assert_eq!(decide_startup_action(store, options(true, true)), StartupAction::InsertGenesis);
    }

    #[test]
    fn empty_store_without_genesis_is_fatal() {
        let store = BlockStoreState { is_empty: true };
        assert_eq!(decide_startup_action(store, options(false, false)), StartupAction::Fatal);
        assert_eq!(decide_startup_action(store, options(false, true)), StartupAction::Fatal);
    }

    #[test]
    fn non_empty_store_with_genesis_and_no_overwrite_restores() {
        let store = BlockStoreState { is_empty: false };
        assert_eq!(decide_startup_action(store, options(true, false)), StartupAction::WarnIgnoreGenesisRestore);
    }

    #[test]
    fn non_empty_store_with_genesis_and_overwrite_drops() {
        let store = BlockStoreState { is_empty: false };
        assert_eq!(decide_startup_action(store, options(true, true)), StartupAction::DropAndInsertGenesis);
    }

    #[test]
    fn non_empty_store_without_genesis_and_overwrite_resets_wsv_only() {
        let store = BlockStoreState { is_empty: false };
        assert_eq!(decide_startup_action(store, options(false, true)), StartupAction::WarnResetWsvOnly);
    }

    #[test]
    fn non_empty_store_without_genesis_and_no_overwrite_restores() {
        let store = BlockStoreState { is_empty: false };
        assert_eq!(decide_startup_action(store, options(false, false)), StartupAction::Restore);
    }
}
