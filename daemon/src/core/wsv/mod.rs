//! World-State View: in-memory mapping of domain entities plus a
//! transactional mutator, spec §4.1. Backed by two pluggable shapes behind
//! the same snapshot type: an in-memory-only backend (tests, genesis
//! builder, the fast startup path) and a `sled`-backed persistent one.

pub mod memory;
pub mod sled_backend;

use std::{collections::BTreeMap, sync::Arc};

use ledger_common::{
    account::{Account, AccountId, Asset, AssetId, Domain, DomainId, Peer, Quantity, Role, RoleId},
    crypto::PublicKey,
};
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::core::error::CoreError;

/// Everything the WSV holds, spec §3 entities. Cloneable so a write
/// transaction can stage a private working copy.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct WsvSnapshot {
    pub accounts: BTreeMap<AccountId, Account>,
    pub domains: BTreeMap<DomainId, Domain>,
    pub assets: BTreeMap<AssetId, Asset>,
    pub roles: BTreeMap<RoleId, Role>,
    /// Small enough (`|peers| >= 1` invariant, spec §4.1(c)) that a linear
    /// scan by public key is the right tool, not a map.
    pub peers: Vec<Peer>,
    /// Keyed by `"account#asset"` rather than a tuple: both the JSON-facing
    /// persistence format and the `sled` snapshot blob need string keys.
    pub balances: BTreeMap<String, Quantity>,
    pub settings: BTreeMap<String, String>,
}

impl WsvSnapshot {
    fn balance_key(account_id: &AccountId, asset_id: &AssetId) -> String {
        format!("{account_id}#{asset_id}")
    }

    pub fn balance(&self, account_id: &AccountId, asset_id: &AssetId) -> Quantity {
        self.balances
            .get(&Self::balance_key(account_id, asset_id))
            .copied()
            .unwrap_or_else(|| {
                let precision = self.assets.get(asset_id).map(|a| a.precision).unwrap_or(0);
                Quantity::zero(precision)
            })
    }

    pub fn set_balance(&mut self, account_id: &AccountId, asset_id: &AssetId, amount: Quantity) {
        self.balances.insert(Self::balance_key(account_id, asset_id), amount);
    }

    pub fn find_peer(&self, public_key: &PublicKey) -> Option<&Peer> {
        self.peers.iter().find(|p| &p.public_key == public_key)
    }

    pub fn remove_peer(&mut self, public_key: &PublicKey) -> bool {
        let before = self.peers.len();
        self.peers.retain(|p| &p.public_key != public_key);
        self.peers.len() != before
    }
}

/// Durability boundary for a `WorldStateView`: load the last persisted
/// snapshot at startup, persist the new one on commit.
pub trait WsvBackend: Send + Sync {
    fn load(&self) -> Result<WsvSnapshot, CoreError>;
    fn persist(&self, snapshot: &WsvSnapshot) -> Result<(), CoreError>;
}

/// A scoped write-transaction handle, spec §3/§4.1: operations are buffered
/// until `commit`; `discard` throws them away. `prepare_block` stages writes
/// so a subsequent `commit` is fast but still atomic — modeled here as an
/// explicit state so a consensus rejection after `prepare_block` can cleanly
/// discard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WsvTransactionState {
    Open,
    Prepared,
    Committed,
    Discarded,
}

pub struct WsvTransaction {
    guard: OwnedMutexGuard<WsvSnapshot>,
    pending: WsvSnapshot,
    state: WsvTransactionState,
    backend: Arc<dyn WsvBackend>,
}

impl WsvTransaction {
    pub fn state(&self) -> WsvTransactionState {
        self.state
    }

    pub fn view(&self) -> &WsvSnapshot {
        &self.pending
    }

    pub fn view_mut(&mut self) -> &mut WsvSnapshot {
        &mut self.pending
    }

    /// Stages the transaction's writes, spec §4.1 `prepareBlock`. The
    /// buffered state isn't yet visible to readers; `commit` publishes it.
    pub fn prepare_block(&mut self) {
        self.state = WsvTransactionState::Prepared;
    }

    pub fn commit(mut self) -> Result<(), CoreError> {
        self.backend.persist(&self.pending)?;
        *self.guard = self.pending.clone();
        self.state = WsvTransactionState::Committed;
        Ok(())
    }

    pub fn discard(mut self) {
        self.state = WsvTransactionState::Discarded;
    }
}

/// The read side of the WSV plus the factory for write transactions. Only
/// one write transaction may be open at a time — enforced by the underlying
/// `tokio::sync::Mutex`, held for the transaction's whole lifetime.
pub struct WorldStateView {
    inner: Arc<Mutex<WsvSnapshot>>,
    backend: Arc<dyn WsvBackend>,
}

impl WorldStateView {
    pub fn new(backend: Arc<dyn WsvBackend>) -> Result<Self, CoreError> {
        let snapshot = backend.load()?;
        Ok(Self { inner: Arc::new(Mutex::new(snapshot)), backend })
    }

    pub async fn snapshot(&self) -> WsvSnapshot {
        self.inner.lock().await.clone()
    }

    pub async fn begin_write(&self) -> WsvTransaction {
        let guard = Arc::clone(&self.inner).lock_owned().await;
        let pending = guard.clone();
        WsvTransaction {
            guard,
            pending,
            state: WsvTransactionState::Open,
            backend: Arc::clone(&self.backend),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::wsv::memory::MemoryBackend;

    #[tokio::test]
    async fn commit_publishes_pending_writes() {
        let wsv = WorldStateView::new(Arc::new(MemoryBackend::new())).unwrap();
        let mut txn = wsv.begin_write().await;
        let domain = Domain { id: "d".into(), default_role: "user".into() };
        txn.view_mut().domains.insert(domain.id.clone(), domain.clone());
        txn.prepare_block();
        txn.commit().unwrap();

        let snapshot = wsv.snapshot().await;
        assert!(snapshot.domains.contains_key(&domain.id));
    }

    #[tokio::test]
    async fn discard_leaves_committed_state_untouched() {
        let wsv = WorldStateView::new(Arc::new(MemoryBackend::new())).unwrap();
        let mut txn = wsv.begin_write().await;
        txn.view_mut()
            .domains
            .insert("d".into(), Domain { id: "d".into(), default_role: "user".into() });
        txn.discard();

        let snapshot = wsv.snapshot().await;
        assert!(snapshot.domains.is_empty());
    }

    #[tokio::test]
    async fn only_one_write_transaction_at_a_time() {
        let wsv = WorldStateView::new(Arc::new(MemoryBackend::new())).unwrap();
        let txn = wsv.begin_write().await;
        let second = tokio::time::timeout(
            std::time::Duration::from_millis(20),
            wsv.begin_write(),
        )
        .await;
        assert!(second.is_err());
        txn.discard();
    }
}
