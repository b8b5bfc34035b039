//! Command Executor, spec §4.2: validates and applies a single `Command`
//! against an open `WsvTransaction`. All twenty commands are handled by one
//! flat `match`, mirroring the spec's per-command permission/invariant
//! table rather than splitting into per-command structs — there's no
//! shared behavior across commands worth factoring out beyond the
//! `PermissionCheck` predicate and the error constructors.

pub mod engine;
pub mod permission;

use std::sync::Arc;

use ledger_common::{
    account::{Account, Asset, Domain, PermissionSet, Role},
    config::{MAX_ASSET_PRECISION, MAX_DESCRIPTION_SIZE},
};
use tokio::sync::Mutex;

use self::{
    engine::{CallContext, ContractEngine},
    permission::PermissionCheck,
};
use crate::core::{error::CommandError, wsv::WsvTransaction};
use ledger_common::{
    account::{AccountId, GrantablePermission, RolePermission},
    crypto::Hash,
    transaction::Command,
};

pub struct CommandExecutor {
    engine: Arc<Mutex<dyn ContractEngine>>,
}

impl CommandExecutor {
    pub fn new(engine: Arc<Mutex<dyn ContractEngine>>) -> Self {
        Self { engine }
    }

    /// Applies `command` (issued by `creator`, part of transaction `tx_hash`)
    /// against `txn`'s pending view. `validate`: when false (genesis
    /// construction, spec §6), permission checks are skipped but structural
    /// invariants (precision, overflow, subject existence) still apply.
    pub async fn execute(
        &self,
        txn: &mut WsvTransaction,
        creator: &AccountId,
        tx_hash: Hash,
        command: &Command,
        validate: bool,
    ) -> Result<(), CommandError> {
        let name = command.name();
        match command {
            Command::AddAssetQuantity { asset_id, amount } => {
                if validate {
                    let asset_domain_subject = AccountId::new(creator.name.clone(), asset_id.domain.clone());
                    self.require(txn, creator, name, PermissionCheck::Any(vec![
                        PermissionCheck::Has(RolePermission::CanAddAssetQty),
                        PermissionCheck::SameDomain(RolePermission::CanAddDomainAssetQty, asset_domain_subject),
                    ]))?;
                }
                let wsv = txn.view_mut();
                if !wsv.assets.contains_key(asset_id) {
                    return Err(CommandError::subject_absent(name, asset_id.to_string()));
                }
                let current = wsv.balance(creator, asset_id);
                let updated = current
                    .checked_add(amount)
                    .map_err(|e| CommandError::invariant_violated(name, e.to_string()))?;
                wsv.set_balance(creator, asset_id, updated);
                Ok(())
            }

            Command::SubtractAssetQuantity { asset_id, amount } => {
                if validate {
                    let asset_domain_subject = AccountId::new(creator.name.clone(), asset_id.domain.clone());
                    self.require(txn, creator, name, PermissionCheck::Any(vec![
                        PermissionCheck::Has(RolePermission::CanSubtractAssetQty),
                        PermissionCheck::SameDomain(RolePermission::CanSubtractDomainAssetQty, asset_domain_subject),
                    ]))?;
                }
                let wsv = txn.view_mut();
                if !wsv.assets.contains_key(asset_id) {
                    return Err(CommandError::subject_absent(name, asset_id.to_string()));
                }
                let current = wsv.balance(creator, asset_id);
                let updated = current
                    .checked_sub(amount)
                    .map_err(|e| CommandError::invariant_violated(name, e.to_string()))?;
                wsv.set_balance(creator, asset_id, updated);
                Ok(())
            }

            Command::TransferAsset { src_account_id, dest_account_id, asset_id, description, amount } => {
                if description.len() > MAX_DESCRIPTION_SIZE {
                    return Err(CommandError::invariant_violated(name, "description exceeds the configured limit"));
                }
                if validate {
                    self.require(txn, creator, name, PermissionCheck::Any(vec![
                        PermissionCheck::SelfOnly(RolePermission::CanTransferMyAssets, src_account_id.clone()),
                        PermissionCheck::Has(RolePermission::CanTransfer),
                        PermissionCheck::Granted(GrantablePermission::CanTransferMyAssets, src_account_id.clone()),
                    ]))?;
                }
                let wsv = txn.view_mut();
                if !wsv.accounts.contains_key(src_account_id) {
                    return Err(CommandError::subject_absent(name, src_account_id.to_string()));
                }
                if !wsv.accounts.contains_key(dest_account_id) {
                    return Err(CommandError::subject_absent(name, dest_account_id.to_string()));
                }
                if !wsv.assets.contains_key(asset_id) {
                    return Err(CommandError::subject_absent(name, asset_id.to_string()));
                }
                if validate {
                    let dest_perms = account_permission_set(wsv, dest_account_id);
                    if !dest_perms.has_role_permission(RolePermission::CanReceive) {
                        return Err(CommandError::no_permission(name));
                    }
                }
                let src_balance = wsv.balance(src_account_id, asset_id);
                let new_src = src_balance
                    .checked_sub(amount)
                    .map_err(|e| CommandError::invariant_violated(name, e.to_string()))?;
                let dest_balance = wsv.balance(dest_account_id, asset_id);
                let new_dest = dest_balance
                    .checked_add(amount)
                    .map_err(|e| CommandError::invariant_violated(name, e.to_string()))?;
                wsv.set_balance(src_account_id, asset_id, new_src);
                wsv.set_balance(dest_account_id, asset_id, new_dest);
                Ok(())
            }

            Command::AddPeer { peer } => {
                if validate {
                    self.require(txn, creator, name, PermissionCheck::Has(RolePermission::CanAddPeer))?;
                }
                let wsv = txn.view_mut();
                if wsv.find_peer(&peer.public_key).is_some() {
                    return Err(CommandError::already_exists(name, peer.public_key.to_hex()));
                }
                wsv.peers.push(peer.clone());
                Ok(())
            }

            Command::RemovePeer { public_key } => {
                if validate {
                    self.require(txn, creator, name, PermissionCheck::Has(RolePermission::CanRemovePeer))?;
                }
                let wsv = txn.view_mut();
                if wsv.find_peer(public_key).is_none() {
                    return Err(CommandError::subject_absent(name, public_key.to_hex()));
                }
                if wsv.peers.len() <= 1 {
                    return Err(CommandError::invariant_violated(name, "at least one peer must remain"));
                }
                wsv.remove_peer(public_key);
                Ok(())
            }

            Command::AddSignatory { account_id, public_key } => {
                if validate {
                    self.require(txn, creator, name, PermissionCheck::Any(vec![
                        PermissionCheck::SelfOnly(RolePermission::CanAddMySignatory, account_id.clone()),
                        PermissionCheck::Has(RolePermission::CanAddSignatory),
                        PermissionCheck::Granted(GrantablePermission::CanAddMySignatory, account_id.clone()),
                    ]))?;
                }
                let wsv = txn.view_mut();
                let account = wsv
                    .accounts
                    .get_mut(account_id)
                    .ok_or_else(|| CommandError::subject_absent(name, account_id.to_string()))?;
                if account.signatories.contains(public_key) {
                    return Err(CommandError::already_exists(name, public_key.to_hex()));
                }
                if account.signatories.len() >= ledger_common::config::MAX_SIGNATORIES {
                    return Err(CommandError::invariant_violated(name, "signatory limit reached"));
                }
                account.signatories.push(*public_key);
                Ok(())
            }

            Command::RemoveSignatory { account_id, public_key } => {
                if validate {
                    self.require(txn, creator, name, PermissionCheck::Any(vec![
                        PermissionCheck::SelfOnly(RolePermission::CanRemoveMySignatory, account_id.clone()),
                        PermissionCheck::Has(RolePermission::CanRemoveSignatory),
                        PermissionCheck::Granted(GrantablePermission::CanRemoveMySignatory, account_id.clone()),
                    ]))?;
                }
                let wsv = txn.view_mut();
                let account = wsv
                    .accounts
                    .get_mut(account_id)
                    .ok_or_else(|| CommandError::subject_absent(name, account_id.to_string()))?;
                let before = account.signatories.len();
                account.signatories.retain(|k| k != public_key);
                if account.signatories.len() == before {
                    return Err(CommandError::subject_absent(name, public_key.to_hex()));
                }
                if (account.signatories.len() as u32) < account.quorum {
                    account.signatories.push(*public_key);
                    return Err(CommandError::invariant_violated(name, "removing signatory would drop below quorum"));
                }
                Ok(())
            }

            Command::SetQuorum { account_id, quorum } => {
                if validate {
                    self.require(txn, creator, name, PermissionCheck::Any(vec![
                        PermissionCheck::SelfOnly(RolePermission::CanSetMyQuorum, account_id.clone()),
                        PermissionCheck::Has(RolePermission::CanSetQuorum),
                        PermissionCheck::Granted(GrantablePermission::CanSetMyQuorum, account_id.clone()),
                    ]))?;
                }
                if *quorum < ledger_common::config::MIN_QUORUM || *quorum > ledger_common::config::MAX_QUORUM {
                    return Err(CommandError::invariant_violated(name, "quorum out of range"));
                }
                let wsv = txn.view_mut();
                let account = wsv
                    .accounts
                    .get_mut(account_id)
                    .ok_or_else(|| CommandError::subject_absent(name, account_id.to_string()))?;
                if (account.signatories.len() as u32) < *quorum {
                    return Err(CommandError::invariant_violated(name, "quorum exceeds signatory count"));
                }
                account.quorum = *quorum;
                Ok(())
            }

            Command::CreateAccount { account_name, domain_id, public_key } => {
                if validate {
                    self.require(txn, creator, name, PermissionCheck::Has(RolePermission::CanCreateAccount))?;
                }
                let account_id = AccountId::new(account_name.clone(), domain_id.clone());
                let wsv = txn.view_mut();
                if wsv.accounts.contains_key(&account_id) {
                    return Err(CommandError::already_exists(name, account_id.to_string()));
                }
                let domain = wsv
                    .domains
                    .get(domain_id)
                    .ok_or_else(|| CommandError::subject_absent(name, domain_id.to_string()))?
                    .clone();
                if validate {
                    let role = wsv
                        .roles
                        .get(&domain.default_role)
                        .ok_or_else(|| CommandError::subject_absent(name, domain.default_role.to_string()))?;
                    let creator_perms = account_permission_set(wsv, creator);
                    if !permission_superset(&creator_perms, &role.permissions) {
                        return Err(CommandError::no_permission(name));
                    }
                }
                let mut account = Account::new(account_id.clone(), 1, vec![*public_key]);
                account.roles.push(domain.default_role.clone());
                wsv.accounts.insert(account_id, account);
                Ok(())
            }

            Command::CreateAsset { asset_name, domain_id, precision } => {
                if validate {
                    self.require(txn, creator, name, PermissionCheck::Has(RolePermission::CanCreateAsset))?;
                }
                if *precision > MAX_ASSET_PRECISION {
                    return Err(CommandError::invariant_violated(name, "precision exceeds the configured maximum"));
                }
                let asset_id = ledger_common::account::AssetId::new(asset_name.clone(), domain_id.clone());
                let wsv = txn.view_mut();
                if !wsv.domains.contains_key(domain_id) {
                    return Err(CommandError::subject_absent(name, domain_id.to_string()));
                }
                if wsv.assets.contains_key(&asset_id) {
                    return Err(CommandError::already_exists(name, asset_id.to_string()));
                }
                wsv.assets.insert(asset_id.clone(), Asset { id: asset_id, precision: *precision });
                Ok(())
            }

            Command::CreateDomain { domain_id, default_role } => {
                if validate {
                    self.require(txn, creator, name, PermissionCheck::Has(RolePermission::CanCreateDomain))?;
                }
                let wsv = txn.view_mut();
                if wsv.domains.contains_key(domain_id) {
                    return Err(CommandError::already_exists(name, domain_id.to_string()));
                }
                if !wsv.roles.contains_key(default_role) {
                    return Err(CommandError::subject_absent(name, default_role.to_string()));
                }
                wsv.domains.insert(
                    domain_id.clone(),
                    Domain { id: domain_id.clone(), default_role: default_role.clone() },
                );
                Ok(())
            }

            Command::CreateRole { role_id, permissions } => {
                if validate {
                    self.require(txn, creator, name, PermissionCheck::Has(RolePermission::CanCreateRole))?;
                }
                let mut set = PermissionSet::empty();
                for perm in permissions {
                    set.grant_role_permission(*perm);
                }
                let wsv = txn.view_mut();
                if wsv.roles.contains_key(role_id) {
                    return Err(CommandError::already_exists(name, role_id.to_string()));
                }
                if validate {
                    let creator_perms = account_permission_set(wsv, creator);
                    if !permission_superset(&creator_perms, &set) {
                        return Err(CommandError::no_permission(name));
                    }
                }
                wsv.roles.insert(role_id.clone(), Role { id: role_id.clone(), permissions: set });
                Ok(())
            }

            Command::AppendRole { account_id, role_id } => {
                if validate {
                    self.require(txn, creator, name, PermissionCheck::Has(RolePermission::CanAppendRole))?;
                }
                let wsv = txn.view_mut();
                let role = wsv
                    .roles
                    .get(role_id)
                    .ok_or_else(|| CommandError::subject_absent(name, role_id.to_string()))?
                    .clone();
                if validate {
                    let creator_perms = account_permission_set(wsv, creator);
                    if !permission_superset(&creator_perms, &role.permissions) {
                        return Err(CommandError::no_permission(name));
                    }
                }
                let account = wsv
                    .accounts
                    .get_mut(account_id)
                    .ok_or_else(|| CommandError::subject_absent(name, account_id.to_string()))?;
                if account.roles.contains(role_id) {
                    return Err(CommandError::already_exists(name, role_id.to_string()));
                }
                account.roles.push(role_id.clone());
                Ok(())
            }

            Command::DetachRole { account_id, role_id } => {
                if validate {
                    self.require(txn, creator, name, PermissionCheck::Has(RolePermission::CanDetachRole))?;
                }
                let wsv = txn.view_mut();
                let account = wsv
                    .accounts
                    .get_mut(account_id)
                    .ok_or_else(|| CommandError::subject_absent(name, account_id.to_string()))?;
                let before = account.roles.len();
                account.roles.retain(|r| r != role_id);
                if account.roles.len() == before {
                    return Err(CommandError::subject_absent(name, role_id.to_string()));
                }
                Ok(())
            }

            Command::GrantPermission { grantee_account_id, permission } => {
                let required = RolePermission::ALL
                    .iter()
                    .find(|p| p.grants() == Some(*permission))
                    .copied();
                if validate {
                    let Some(required) = required else {
                        return Err(CommandError::invariant_violated(name, "permission is not grantable"));
                    };
                    self.require(txn, creator, name, PermissionCheck::Has(required))?;
                }
                let wsv = txn.view_mut();
                if !wsv.accounts.contains_key(grantee_account_id) {
                    return Err(CommandError::subject_absent(name, grantee_account_id.to_string()));
                }
                let granter = wsv
                    .accounts
                    .get_mut(creator)
                    .ok_or_else(|| CommandError::subject_absent(name, creator.to_string()))?;
                granter.grant(grantee_account_id.clone(), *permission);
                Ok(())
            }

            Command::RevokePermission { grantee_account_id, permission } => {
                let wsv = txn.view_mut();
                let granter = wsv
                    .accounts
                    .get_mut(creator)
                    .ok_or_else(|| CommandError::subject_absent(name, creator.to_string()))?;
                if !granter.has_granted(grantee_account_id, *permission) {
                    return Err(CommandError::subject_absent(name, "no such grant"));
                }
                granter.revoke(grantee_account_id, *permission);
                Ok(())
            }

            Command::SetAccountDetail { account_id, key, value } => {
                if validate {
                    self.require(txn, creator, name, PermissionCheck::Any(vec![
                        PermissionCheck::SelfOnly(RolePermission::CanSetMyAccountDetail, account_id.clone()),
                        PermissionCheck::Has(RolePermission::CanSetDetail),
                        PermissionCheck::Granted(GrantablePermission::CanSetMyAccountDetail, account_id.clone()),
                    ]))?;
                }
                let wsv = txn.view_mut();
                let account = wsv
                    .accounts
                    .get_mut(account_id)
                    .ok_or_else(|| CommandError::subject_absent(name, account_id.to_string()))?;
                account
                    .details
                    .entry(creator.clone())
                    .or_default()
                    .insert(key.clone(), value.clone());
                Ok(())
            }

            Command::CompareAndSetAccountDetail { account_id, key, value, expected, check_empty } => {
                if validate {
                    self.require(txn, creator, name, PermissionCheck::Any(vec![
                        PermissionCheck::SelfOnly(RolePermission::CanSetMyAccountDetail, account_id.clone()),
                        PermissionCheck::Has(RolePermission::CanSetDetail),
                        PermissionCheck::Granted(GrantablePermission::CanSetMyAccountDetail, account_id.clone()),
                    ]))?;
                }
                let wsv = txn.view_mut();
                let account = wsv
                    .accounts
                    .get_mut(account_id)
                    .ok_or_else(|| CommandError::subject_absent(name, account_id.to_string()))?;
                let bucket = account.details.entry(creator.clone()).or_default();
                let current = bucket.get(key).cloned();
                if *check_empty && current.is_some() {
                    return Err(CommandError::invariant_violated(name, "detail key is already set"));
                }
                if let Some(expected) = expected {
                    if current.as_deref() != Some(expected.as_str()) {
                        return Err(CommandError::invariant_violated(name, "expected value does not match"));
                    }
                }
                bucket.insert(key.clone(), value.clone());
                Ok(())
            }

            Command::CallEngine { caller, callee, input } => {
                if validate {
                    self.require(txn, creator, name, PermissionCheck::Any(vec![
                        PermissionCheck::SelfOnly(RolePermission::CanCallEngineOnMyBehalf, caller.clone()),
                        PermissionCheck::Has(RolePermission::CanCallEngine),
                        PermissionCheck::Granted(GrantablePermission::CanCallEngineOnMyBehalf, caller.clone()),
                    ]))?;
                }
                let ctx = CallContext { tx_hash, caller: caller.clone(), callee: callee.clone(), input: input.clone() };
                let mut engine = self.engine.lock().await;
                engine.call(ctx).map(|_| ())
            }

            Command::SetSettingValue { key, value } => {
                // Only valid outside validation (genesis construction, spec
                // §6) — no role permission grants this in a running network.
                if validate {
                    return Err(CommandError::no_permission(name));
                }
                txn.view_mut().settings.insert(key.clone(), value.clone());
                Ok(())
            }
        }
    }

    fn require(
        &self,
        txn: &WsvTransaction,
        creator: &AccountId,
        name: &'static str,
        check: PermissionCheck,
    ) -> Result<(), CommandError> {
        if check.evaluate(txn.view(), creator) {
            Ok(())
        } else {
            Err(CommandError::no_permission(name))
        }
    }
}

fn account_permission_set(wsv: &crate::core::wsv::WsvSnapshot, account_id: &AccountId) -> PermissionSet {
    let mut set = PermissionSet::empty();
    let Some(account) = wsv.accounts.get(account_id) else {
        return set;
    };
    for role_id in &account.roles {
        if let Some(role) = wsv.roles.get(role_id) {
            set = set.union(&role.permissions);
        }
    }
    set
}

/// Every bit set in `needed` is also set in `holder` (or `holder` has Root).
fn permission_superset(holder: &PermissionSet, needed: &PermissionSet) -> bool {
    for perm in RolePermission::ALL {
        if needed.contains_bit(perm.bit_index()) && !holder.has_role_permission(perm) {
            return false;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use ledger_common::{
        account::{Account, AssetId, Domain, DomainId, Quantity, Role, RoleId},
        crypto::{Hash, KeyPair},
    };
    use tokio::sync::Mutex;

    use super::*;
    use crate::core::wsv::{memory::MemoryBackend, WorldStateView};

    async fn wsv_with_root(account_id: &AccountId) -> WorldStateView {
        let wsv = WorldStateView::new(Arc::new(MemoryBackend::new())).unwrap();
        let mut txn = wsv.begin_write().await;
        let role_id = RoleId::from("root");
        let mut perms = PermissionSet::empty();
        perms.grant_role_permission(RolePermission::Root);
        txn.view_mut().roles.insert(role_id.clone(), Role { id: role_id.clone(), permissions: perms });
        let mut account = Account::new(account_id.clone(), 1, vec![KeyPair::generate().public_key()]);
        account.roles.push(role_id);
        txn.view_mut().accounts.insert(account_id.clone(), account);
        txn.commit().unwrap();
        wsv
    }

    fn executor() -> CommandExecutor {
        CommandExecutor::new(Arc::new(Mutex::new(engine::NoEngine)))
    }

    #[tokio::test]
    async fn add_asset_quantity_requires_existing_asset() {
        let alice: AccountId = "alice@d".parse().unwrap();
        let wsv = wsv_with_root(&alice).await;
        let mut txn = wsv.begin_write().await;
        let executor = executor();
        let asset_id: AssetId = "coin#d".parse().unwrap();
        let command = Command::AddAssetQuantity { asset_id, amount: Quantity::from_mantissa(100, 2) };
        let result = executor.execute(&mut txn, &alice, Hash::zero(), &command, true).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn transfer_moves_balance_between_accounts() {
        let alice: AccountId = "alice@d".parse().unwrap();
        let bob: AccountId = "bob@d".parse().unwrap();
        let wsv = wsv_with_root(&alice).await;
        let executor = executor();

        let mut setup = wsv.begin_write().await;
        let asset_id: AssetId = "coin#d".parse().unwrap();
        setup.view_mut().assets.insert(asset_id.clone(), ledger_common::account::Asset { id: asset_id.clone(), precision: 2 });
        let mut bob_account = Account::new(bob.clone(), 1, vec![KeyPair::generate().public_key()]);
        bob_account.roles.push(RoleId::from("root"));
        setup.view_mut().accounts.insert(bob.clone(), bob_account);
        setup.commit().unwrap();

        let mut txn = wsv.begin_write().await;
        executor
            .execute(&mut txn, &alice, Hash::zero(), &Command::AddAssetQuantity { asset_id: asset_id.clone(), amount: Quantity::from_mantissa(1000, 2) }, false)
            .await
            .unwrap();
        executor
            .execute(
                &mut txn,
                &alice,
                Hash::zero(),
                &Command::TransferAsset {
                    src_account_id: alice.clone(),
                    dest_account_id: bob.clone(),
                    asset_id: asset_id.clone(),
                    description: "pay".to_string(),
                    amount: Quantity::from_mantissa(400, 2),
                },
                true,
            )
            .await
            .unwrap();
        txn.commit().unwrap();

        let snapshot = wsv.snapshot().await;
        assert_eq!(snapshot.balance(&alice, &asset_id).mantissa(), 600);
        assert_eq!(snapshot.balance(&bob, &asset_id).mantissa(), 400);
    }

    #[tokio::test]
    async fn transfer_without_can_receive_is_rejected() {
        let alice: AccountId = "alice@d".parse().unwrap();
        let bob: AccountId = "bob@d".parse().unwrap();
        let wsv = wsv_with_root(&alice).await;
        let executor = executor();

        let mut setup = wsv.begin_write().await;
        let asset_id: AssetId = "coin#d".parse().unwrap();
        setup.view_mut().assets.insert(asset_id.clone(), ledger_common::account::Asset { id: asset_id.clone(), precision: 2 });
        let no_receive_role = RoleId::from("no_receive");
        setup.view_mut().roles.insert(no_receive_role.clone(), Role { id: no_receive_role.clone(), permissions: PermissionSet::empty() });
        let mut bob_account = Account::new(bob.clone(), 1, vec![KeyPair::generate().public_key()]);
        bob_account.roles.push(no_receive_role);
        setup.view_mut().accounts.insert(bob.clone(), bob_account);
        setup
            .view_mut()
            .set_balance(&alice, &asset_id, Quantity::from_mantissa(1000, 2));
        setup.commit().unwrap();

        let mut txn = wsv.begin_write().await;
        let result = executor
            .execute(
                &mut txn,
                &alice,
                Hash::zero(),
                &Command::TransferAsset {
                    src_account_id: alice.clone(),
                    dest_account_id: bob.clone(),
                    asset_id,
                    description: "pay".to_string(),
                    amount: Quantity::from_mantissa(100, 2),
                },
                true,
            )
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn create_domain_requires_existing_default_role() {
        let alice: AccountId = "alice@d".parse().unwrap();
        let wsv = wsv_with_root(&alice).await;
        let mut txn = wsv.begin_write().await;
        let executor = executor();
        let command = Command::CreateDomain { domain_id: DomainId::from("new"), default_role: RoleId::from("missing") };
        let result = executor.execute(&mut txn, &alice, Hash::zero(), &command, true).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn set_setting_value_requires_genesis_context() {
        let alice: AccountId = "alice@d".parse().unwrap();
        let wsv = wsv_with_root(&alice).await;
        let mut txn = wsv.begin_write().await;
        let executor = executor();
        let command = Command::SetSettingValue { key: "k".to_string(), value: "v".to_string() };
        let validated = executor.execute(&mut txn, &alice, Hash::zero(), &command, true).await;
        assert!(validated.is_err());
        let genesis = executor.execute(&mut txn, &alice, Hash::zero(), &command, false).await;
        assert!(genesis.is_ok());
    }
}
