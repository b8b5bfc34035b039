//! Simulator, spec §4.5: turns an ordered proposal into a verified-proposal
//! event and a signed block-creation event, the only writer of the WSV.

use std::sync::Arc;

use ledger_common::{
    block::Block,
    crypto::{Hash, KeyPair},
    transaction::{BatchType, LedgerState, Proposal, Transaction, VerifiedProposal},
};

use crate::core::{
    error::CommandError,
    events::EventBus,
    executor::CommandExecutor,
    storage::BlockStorage,
    wsv::{WorldStateView, WsvSnapshot},
};

/// Emitted after step 3 of the protocol: the stateful-valid subset of a
/// proposal's transactions plus per-rejection errors, alongside the ledger
/// state the simulation ran against.
#[derive(Debug, Clone)]
pub struct VerifiedProposalEvent {
    pub proposal: VerifiedProposal,
    pub ledger_state: LedgerState,
}

/// Emitted after step 5: a signed block, not yet committed to storage —
/// that happens once consensus accepts it.
#[derive(Debug, Clone)]
pub struct BlockCreatedEvent {
    pub block: Block,
}

pub struct Simulator {
    wsv: Arc<WorldStateView>,
    storage: Arc<dyn BlockStorage>,
    executor: Arc<CommandExecutor>,
    node_key: KeyPair,
    verified_proposals: EventBus<VerifiedProposalEvent>,
    blocks_created: EventBus<BlockCreatedEvent>,
}

impl Simulator {
    pub fn new(
        wsv: Arc<WorldStateView>,
        storage: Arc<dyn BlockStorage>,
        executor: Arc<CommandExecutor>,
        node_key: KeyPair,
        channel_capacity: usize,
    ) -> Self {
        Self {
            wsv,
            storage,
            executor,
            node_key,
            verified_proposals: EventBus::new(channel_capacity),
            blocks_created: EventBus::new(channel_capacity),
        }
    }

    pub fn subscribe_verified_proposals(&self) -> tokio::sync::broadcast::Receiver<VerifiedProposalEvent> {
        self.verified_proposals.subscribe()
    }

    pub fn subscribe_blocks_created(&self) -> tokio::sync::broadcast::Receiver<BlockCreatedEvent> {
        self.blocks_created.subscribe()
    }

    /// Runs the full protocol for one round, publishing both events. Returns
    /// the prepared (not yet committed) WSV transaction and the block, so
    /// the caller can commit or discard once consensus decides.
    pub async fn simulate(
        &self,
        proposal: Proposal,
    ) -> (crate::core::wsv::WsvTransaction, Block) {
        let mut txn = self.wsv.begin_write().await;

        let mut valid_transactions = Vec::new();
        let mut rejected = Vec::new();

        let mut index = 0;
        while index < proposal.transactions.len() {
            let group_len = batch_group_len(&proposal.transactions[index..]);
            let group = &proposal.transactions[index..index + group_len];
            index += group_len;

            if group.first().and_then(|tx| tx.batch_meta.as_ref()).map(|m| m.batch_type) == Some(BatchType::Atomic) {
                self.apply_atomic_group(&mut txn, group, &mut valid_transactions, &mut rejected).await;
            } else {
                for tx in group {
                    let tx_hash = tx.reduced_hash();
                    let checkpoint = txn.view().clone();
                    if let Err(err) = self.apply_transaction(&mut txn, tx, tx_hash).await {
                        *txn.view_mut() = checkpoint;
                        rejected.push((tx_hash, err.to_summary()));
                    } else {
                        valid_transactions.push(tx.clone());
                    }
                }
            }
        }

        let ledger_state = self.ledger_state(txn.view()).await;
        let verified = VerifiedProposal { round: proposal.round, valid_transactions: valid_transactions.clone(), rejected: rejected.clone() };
        self.verified_proposals.publish(VerifiedProposalEvent { proposal: verified, ledger_state });

        txn.prepare_block();

        let top_height = self.storage.top_height().await.unwrap_or(None).unwrap_or(0);
        let previous_block = self.storage.fetch(top_height).await.unwrap_or(None);
        let previous_block_hash = previous_block
            .as_ref()
            .map(Block::hash)
            .unwrap_or(Block::GENESIS_PREVIOUS_HASH);
        let rejected_hashes: Vec<Hash> = rejected.iter().map(|(hash, _)| *hash).collect();
        let mut block = Block::new(
            top_height + 1,
            previous_block_hash,
            proposal.created_time,
            valid_transactions,
            rejected_hashes,
        );
        block.sign(&self.node_key);
        block
            .validate_self_consistency()
            .expect("simulator produced a self-inconsistent block");
        block
            .validate_linkage(previous_block.as_ref())
            .expect("simulator produced a block with broken chain linkage");
        self.blocks_created.publish(BlockCreatedEvent { block: block.clone() });

        (txn, block)
    }

    /// Applies every transaction in an atomic batch group; if any fails,
    /// the whole group's effects roll back and every member — including
    /// siblings that individually succeeded — terminates rejected (spec §8
    /// scenario 3).
    async fn apply_atomic_group(
        &self,
        txn: &mut crate::core::wsv::WsvTransaction,
        group: &[Transaction],
        valid_transactions: &mut Vec<Transaction>,
        rejected: &mut Vec<(Hash, ledger_common::transaction::CommandErrorSummary)>,
    ) {
        let checkpoint = txn.view().clone();
        let mut failures: Vec<(Hash, CommandError)> = Vec::new();

        for tx in group {
            let tx_hash = tx.reduced_hash();
            if let Err(err) = self.apply_transaction(txn, tx, tx_hash).await {
                failures.push((tx_hash, err));
            }
        }

        if failures.is_empty() {
            valid_transactions.extend(group.iter().cloned());
            return;
        }

        *txn.view_mut() = checkpoint;
        for tx in group {
            let tx_hash = tx.reduced_hash();
            let summary = failures
                .iter()
                .find(|(hash, _)| *hash == tx_hash)
                .map(|(_, err)| err.to_summary())
                .unwrap_or_else(|| {
                    CommandError::invariant_violated(
                        "AtomicBatch",
                        "rolled back: another transaction in the same atomic batch failed",
                    )
                    .to_summary()
                });
            rejected.push((tx_hash, summary));
        }
    }

    /// Applies every command of `tx` in order; the first error aborts the
    /// transaction's remaining commands. Rollback of partial effects is the
    /// caller's job (it restores the pre-transaction snapshot).
    async fn apply_transaction(
        &self,
        txn: &mut crate::core::wsv::WsvTransaction,
        tx: &Transaction,
        tx_hash: Hash,
    ) -> Result<(), CommandError> {
        for command in &tx.commands {
            self.executor.execute(txn, &tx.creator, tx_hash, command, true).await?;
        }
        Ok(())
    }

    async fn ledger_state(&self, snapshot: &WsvSnapshot) -> LedgerState {
        let top_height = self.storage.top_height().await.unwrap_or(None).unwrap_or(0);
        let top_hash = match self.storage.fetch(top_height).await.unwrap_or(None) {
            Some(block) => block.hash(),
            None => Block::GENESIS_PREVIOUS_HASH,
        };
        LedgerState {
            synced_peers: snapshot.peers.iter().map(|p| p.public_key).collect(),
            syncing_peers: Vec::new(),
            top_block_height: top_height,
            top_block_hash: top_hash,
        }
    }
}

/// The number of leading transactions in `transactions` that belong to the
/// same batch as the first one: `batch_meta.reduced_hashes.len()` if it
/// carries one, else a singleton group of one un-batched transaction.
fn batch_group_len(transactions: &[Transaction]) -> usize {
    match transactions.first().and_then(|tx| tx.batch_meta.as_ref()) {
        Some(meta) => meta.reduced_hashes.len().max(1).min(transactions.len()),
        None => 1,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use ledger_common::{
        account::{Account, Domain, PermissionSet, Quantity, Role, RoleId, RolePermission},
        crypto::KeyPair,
        transaction::Command,
    };
    use tokio::sync::Mutex;

    use super::*;
    use crate::core::{
        executor::{engine::NoEngine, CommandExecutor},
        storage::memory::MemoryBlockStorage,
        wsv::{memory::MemoryBackend, WorldStateView},
    };

    async fn wsv_with_root() -> WorldStateView {
        let wsv = WorldStateView::new(Arc::new(MemoryBackend::new())).unwrap();
        let mut txn = wsv.begin_write().await;
        let mut permissions = PermissionSet::empty();
        permissions.grant_role_permission(RolePermission::Root);
        txn.view_mut().roles.insert(RoleId::from("root"), Role { id: RoleId::from("root"), permissions });
        txn.view_mut().domains.insert(
            ledger_common::account::DomainId::from("d"),
            Domain { id: ledger_common::account::DomainId::from("d"), default_role: RoleId::from("root") },
        );
        txn.view_mut().accounts.insert(
            "alice@d".parse().unwrap(),
            Account {
                id: "alice@d".parse().unwrap(),
                quorum: 1,
                signatories: Vec::new(),
                roles: vec![RoleId::from("root")],
                details: Default::default(),
                granted_permissions: Default::default(),
            },
        );
        txn.prepare_block();
        txn.commit().unwrap();
        wsv
    }

    #[tokio::test]
    async fn empty_proposal_still_publishes_both_events() {
        let wsv = Arc::new(wsv_with_root().await);
        let storage: Arc<dyn BlockStorage> = Arc::new(MemoryBlockStorage::new());
        let executor = Arc::new(CommandExecutor::new(Arc::new(Mutex::new(NoEngine))));
        let simulator = Simulator::new(wsv, storage, executor, KeyPair::generate(), 8);

        let mut verified_rx = simulator.subscribe_verified_proposals();
        let mut blocks_rx = simulator.subscribe_blocks_created();

        let (txn, block) = simulator.simulate(Proposal { round: 1, created_time: 0, transactions: vec![] }).await;
        txn.discard();

        assert_eq!(block.header.height, 1);
        assert!(block.transactions.is_empty());
        let verified = verified_rx.try_recv().unwrap();
        assert!(verified.proposal.valid_transactions.is_empty());
        assert!(blocks_rx.try_recv().is_ok());
    }

    #[tokio::test]
    async fn failing_command_rejects_transaction_without_partial_effects() {
        let wsv = Arc::new(wsv_with_root().await);
        let storage: Arc<dyn BlockStorage> = Arc::new(MemoryBlockStorage::new());
        let executor = Arc::new(CommandExecutor::new(Arc::new(Mutex::new(NoEngine))));
        let simulator = Simulator::new(wsv, storage, executor, KeyPair::generate(), 8);

        let tx = Transaction::new(
            "alice@d".parse().unwrap(),
            0,
            1,
            vec![
                Command::CreateAsset {
                    asset_name: "coin".into(),
                    domain_id: ledger_common::account::DomainId::from("d"),
                    precision: 2,
                },
                Command::AddAssetQuantity {
                    asset_id: "missing#d".parse().unwrap(),
                    amount: Quantity::from_mantissa(100, 2),
                },
            ],
            None,
        );
        let proposal = Proposal { round: 1, created_time: 0, transactions: vec![tx.clone()] };

        let mut verified_rx = simulator.subscribe_verified_proposals();
        let (txn, block) = simulator.simulate(proposal).await;

        assert!(block.transactions.is_empty());
        assert_eq!(block.header.rejected_transaction_hashes.len(), 1);
        let verified = verified_rx.try_recv().unwrap();
        assert_eq!(verified.proposal.rejected.len(), 1);
        assert!(!txn.view().assets.contains_key(&"coin#d".parse().unwrap()));
        txn.discard();
    }
}
