//! Query Executor, spec §4.7: signature and permission checks, then a
//! read-only lookup against the committed WSV and block storage.

use std::sync::Arc;

use ledger_common::{
    account::AccountId,
    block::Block,
    crypto::Hash,
    query::{Ordering, PaginationMeta, PaginationResponse, Query, QueryError, QueryResponse, SignedQuery},
    transaction::Transaction,
};

use crate::core::{
    executor::permission::PermissionCheck,
    storage::BlockStorage,
    wsv::WsvSnapshot,
};

pub struct QueryExecutor {
    storage: Arc<dyn BlockStorage>,
}

impl QueryExecutor {
    pub fn new(storage: Arc<dyn BlockStorage>) -> Self {
        Self { storage }
    }

    /// `pending`: the MST/status-bus's current view of not-yet-committed
    /// transactions, for `GetPendingTransactions` — the query executor has
    /// no state of its own beyond the storage handle.
    pub async fn execute(
        &self,
        signed: &SignedQuery,
        wsv: &WsvSnapshot,
        pending: &[Transaction],
    ) -> Result<QueryResponse, QueryError> {
        signed.verify_signature().map_err(|_| QueryError::InvalidSignature)?;
        self.check_permission(signed, wsv)?;

        match &signed.query {
            Query::GetAccount { account_id } => {
                let account = wsv.accounts.get(account_id).ok_or(QueryError::SubjectAbsent)?;
                Ok(QueryResponse::Account(account.clone()))
            }
            Query::GetAccountAssets { account_id, pagination } => {
                let assets: Vec<ledger_common::account::AccountAsset> = wsv
                    .assets
                    .keys()
                    .filter(|asset_id| asset_id.domain == account_id.domain)
                    .map(|asset_id| ledger_common::account::AccountAsset {
                        account_id: account_id.clone(),
                        asset_id: asset_id.clone(),
                        balance: wsv.balance(account_id, asset_id),
                    })
                    .collect();
                let page = paginate(&assets, pagination, |_| Hash::zero())?;
                Ok(QueryResponse::AccountAssets(page))
            }
            Query::GetAccountDetail { account_id, key, writer, pagination: _ } => {
                let account = wsv.accounts.get(account_id).ok_or(QueryError::SubjectAbsent)?;
                let mut total = 0u64;
                let mut rendered = String::new();
                for (writer_id, entries) in &account.details {
                    if let Some(expected_writer) = writer {
                        if writer_id != expected_writer {
                            continue;
                        }
                    }
                    for (k, v) in entries {
                        if let Some(expected_key) = key {
                            if k != expected_key {
                                continue;
                            }
                        }
                        total += 1;
                        rendered.push_str(v);
                    }
                }
                Ok(QueryResponse::AccountDetail { detail: rendered, total_count: total })
            }
            Query::GetAccountTransactions { account_id, pagination } => {
                let transactions = self.committed_transactions_for(account_id).await;
                let page = paginate(&transactions, pagination, Transaction::reduced_hash)?;
                Ok(QueryResponse::AccountTransactions(page))
            }
            Query::GetAccountAssetTransactions { account_id, asset_id, pagination } => {
                let transactions: Vec<Transaction> = self
                    .committed_transactions_for(account_id)
                    .await
                    .into_iter()
                    .filter(|tx| tx.commands.iter().any(|cmd| command_touches_asset(cmd, asset_id)))
                    .collect();
                let page = paginate(&transactions, pagination, Transaction::reduced_hash)?;
                Ok(QueryResponse::AccountTransactions(page))
            }
            Query::GetTransactions { hashes } => {
                let mut found = Vec::new();
                self.storage
                    .for_each(&mut |block: &Block| {
                        for tx in &block.transactions {
                            if hashes.contains(&tx.reduced_hash()) {
                                found.push(tx.clone());
                            }
                        }
                    })
                    .await
                    .map_err(|_| QueryError::SubjectAbsent)?;
                Ok(QueryResponse::Transactions(found))
            }
            Query::GetSignatories { account_id } => {
                let account = wsv.accounts.get(account_id).ok_or(QueryError::SubjectAbsent)?;
                Ok(QueryResponse::Signatories(account.signatories.clone()))
            }
            Query::GetRoles => Ok(QueryResponse::Roles(wsv.roles.keys().cloned().collect())),
            Query::GetRolePermissions { role_id } => {
                let role = wsv.roles.get(role_id).ok_or(QueryError::SubjectAbsent)?;
                let granted = ledger_common::account::RolePermission::ALL
                    .iter()
                    .copied()
                    .filter(|perm| role.permissions.contains_bit(perm.bit_index()))
                    .collect();
                Ok(QueryResponse::RolePermissions(granted))
            }
            Query::GetAssetInfo { asset_id } => {
                let asset = wsv.assets.get(asset_id).ok_or(QueryError::SubjectAbsent)?;
                Ok(QueryResponse::AssetInfo(asset.clone()))
            }
            Query::GetPendingTransactions { pagination } => {
                let mine: Vec<Transaction> = pending
                    .iter()
                    .filter(|tx| tx.creator == signed.creator)
                    .cloned()
                    .collect();
                let page = paginate(&mine, pagination, Transaction::reduced_hash)?;
                Ok(QueryResponse::PendingTransactions(page))
            }
            Query::GetBlock { height } => {
                let block = self
                    .storage
                    .fetch(*height)
                    .await
                    .map_err(|_| QueryError::SubjectAbsent)?
                    .ok_or(QueryError::SubjectAbsent)?;
                Ok(QueryResponse::Block(block))
            }
            Query::GetPeers => Ok(QueryResponse::Peers(wsv.peers.clone())),
            Query::GetEngineReceipts { tx_hash } => {
                Ok(QueryResponse::EngineReceipt { tx_hash: *tx_hash, success: false, output: Vec::new() })
            }
        }
    }

    async fn committed_transactions_for(&self, account_id: &AccountId) -> Vec<Transaction> {
        let mut found = Vec::new();
        let _ = self
            .storage
            .for_each(&mut |block: &Block| {
                for tx in &block.transactions {
                    if &tx.creator == account_id {
                        found.push(tx.clone());
                    }
                }
            })
            .await;
        found
    }

    /// self / domain / global checks per spec §4.7: queries naming an
    /// `account_id` are permitted for that account itself or for `Root`;
    /// the rest require `Root` (there is no dedicated role permission for
    /// them in this reduced permission set, see `RolePermission`).
    fn check_permission(&self, signed: &SignedQuery, wsv: &WsvSnapshot) -> Result<(), QueryError> {
        let root_only = || -> Result<(), QueryError> {
            if PermissionCheck::Has(ledger_common::account::RolePermission::Root).evaluate(wsv, &signed.creator) {
                Ok(())
            } else {
                Err(QueryError::NoPermission)
            }
        };
        match &signed.query {
            Query::GetAccount { account_id }
            | Query::GetAccountAssets { account_id, .. }
            | Query::GetAccountTransactions { account_id, .. }
            | Query::GetAccountAssetTransactions { account_id, .. }
            | Query::GetSignatories { account_id } => {
                if &signed.creator == account_id {
                    Ok(())
                } else {
                    root_only()
                }
            }
            Query::GetAccountDetail { account_id, .. } => {
                if &signed.creator == account_id {
                    if PermissionCheck::Has(ledger_common::account::RolePermission::CanGetMyAccountDetail)
                        .evaluate(wsv, &signed.creator)
                    {
                        return Ok(());
                    }
                }
                root_only()
            }
            Query::GetPendingTransactions { .. } => Ok(()),
            _ => root_only(),
        }
    }
}

fn command_touches_asset(command: &ledger_common::transaction::Command, asset_id: &ledger_common::account::AssetId) -> bool {
    use ledger_common::transaction::Command;
    match command {
        Command::AddAssetQuantity { asset_id: a, .. }
        | Command::SubtractAssetQuantity { asset_id: a, .. }
        | Command::TransferAsset { asset_id: a, .. } => a == asset_id,
        _ => false,
    }
}

fn paginate<T: Clone>(
    items: &[T],
    pagination: &PaginationMeta,
    hash_of: impl Fn(&T) -> Hash,
) -> Result<PaginationResponse<T>, QueryError> {
    let total_count = items.len() as u64;
    let mut ordered: Vec<&T> = items.iter().collect();
    if pagination.ordering == Some(Ordering::Descending) {
        ordered.reverse();
    }

    let start = match &pagination.first_hash {
        None => 0,
        Some(hash) => ordered
            .iter()
            .position(|item| hash_of(item) == *hash)
            .ok_or(QueryError::InvalidPagination)?,
    };

    let page_size = pagination.effective_page_size() as usize;
    let end = (start + page_size).min(ordered.len());
    let page: Vec<T> = ordered[start..end].iter().map(|item| (*item).clone()).collect();
    let next_hash = ordered.get(end).map(|item| hash_of(item));

    Ok(PaginationResponse::new(page, total_count, next_hash))
}

#[cfg(test)]
mod tests {
    use ledger_common::{
        account::{Account, PermissionSet, Role, RoleId, RolePermission},
        crypto::KeyPair,
        query::Query,
    };

    use super::*;
    use crate::core::storage::memory::MemoryBlockStorage;

    fn signed(creator: &str, query: Query, keypair: &KeyPair) -> SignedQuery {
        let creator: AccountId = creator.parse().unwrap();
        let payload = serde_json::to_vec(&(creator.to_string(), 1u64, 0u64, &query)).unwrap();
        let signature = keypair.sign(&payload);
        SignedQuery { creator, counter: 1, created_time: 0, query, signature, public_key: keypair.public_key() }
    }

    fn wsv_with_root_account(account_id: &str) -> WsvSnapshot {
        let mut wsv = WsvSnapshot::default();
        let mut permissions = PermissionSet::empty();
        permissions.grant_role_permission(RolePermission::Root);
        wsv.roles.insert(RoleId::from("root"), Role { id: RoleId::from("root"), permissions });
        let id: AccountId = account_id.parse().unwrap();
        wsv.accounts.insert(
            id.clone(),
            Account { id, quorum: 1, signatories: vec![], roles: vec![RoleId::from("root")], details: Default::default(), granted_permissions: Default::default() },
        );
        wsv
    }

    #[tokio::test]
    async fn self_account_query_is_permitted() {
        let wsv = wsv_with_root_account("alice@d");
        let keypair = KeyPair::generate();
        let query = signed("alice@d", Query::GetAccount { account_id: "alice@d".parse().unwrap() }, &keypair);
        let executor = QueryExecutor::new(Arc::new(MemoryBlockStorage::new()));
        let result = executor.execute(&query, &wsv, &[]).await;
        assert!(matches!(result, Ok(QueryResponse::Account(_))));
    }

    #[tokio::test]
    async fn querying_another_account_without_root_is_rejected() {
        let mut wsv = wsv_with_root_account("alice@d");
        wsv.roles.remove(&RoleId::from("root"));
        wsv.accounts.get_mut(&"alice@d".parse::<AccountId>().unwrap()).unwrap().roles.clear();
        let keypair = KeyPair::generate();
        let query = signed("alice@d", Query::GetAccount { account_id: "bob@d".parse().unwrap() }, &keypair);
        let executor = QueryExecutor::new(Arc::new(MemoryBlockStorage::new()));
        let result = executor.execute(&query, &wsv, &[]).await;
        assert!(matches!(result, Err(QueryError::NoPermission)));
    }

    #[tokio::test]
    async fn mismatched_first_hash_is_invalid_pagination() {
        let wsv = wsv_with_root_account("alice@d");
        let keypair = KeyPair::generate();
        let mut pagination = PaginationMeta::with_page_size(10);
        pagination.first_hash = Some(ledger_common::crypto::hash(b"not present"));
        let query = signed(
            "alice@d",
            Query::GetAccountAssets { account_id: "alice@d".parse().unwrap(), pagination },
            &keypair,
        );
        let executor = QueryExecutor::new(Arc::new(MemoryBlockStorage::new()));
        let result = executor.execute(&query, &wsv, &[]).await;
        assert!(matches!(result, Err(QueryError::InvalidPagination)));
    }
}
