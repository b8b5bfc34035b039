use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::{
    id::{AccountId, AssetId, DomainId, RoleId},
    permission::{GrantablePermission, PermissionSet},
    quantity::Quantity,
};
use crate::crypto::PublicKey;

/// Standard domain entity, spec §3.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub quorum: u32,
    pub signatories: Vec<PublicKey>,
    pub roles: Vec<RoleId>,
    /// Per-writer key/value details, `SetAccountDetail`'s target.
    pub details: IndexMap<AccountId, IndexMap<String, String>>,
    /// Grantable permissions this account has granted to each grantee,
    /// keyed by grantee.
    pub granted_permissions: IndexMap<AccountId, Vec<GrantablePermission>>,
}

impl Account {
    pub fn new(id: AccountId, quorum: u32, signatories: Vec<PublicKey>) -> Self {
        Self {
            id,
            quorum,
            signatories,
            roles: Vec::new(),
            details: IndexMap::new(),
            granted_permissions: IndexMap::new(),
        }
    }

    pub fn has_granted(&self, grantee: &AccountId, perm: GrantablePermission) -> bool {
        self.granted_permissions
            .get(grantee)
            .map(|perms| perms.iter().any(|p| *p == perm))
            .unwrap_or(false)
    }

    pub fn grant(&mut self, grantee: AccountId, perm: GrantablePermission) {
        let entry = self.granted_permissions.entry(grantee).or_default();
        if !entry.iter().any(|p| *p == perm) {
            entry.push(perm);
        }
    }

    pub fn revoke(&mut self, grantee: &AccountId, perm: GrantablePermission) {
        if let Some(entry) = self.granted_permissions.get_mut(grantee) {
            entry.retain(|p| *p != perm);
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Domain {
    pub id: DomainId,
    pub default_role: RoleId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Asset {
    pub id: AssetId,
    pub precision: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Role {
    pub id: RoleId,
    pub permissions: PermissionSet,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Peer {
    pub public_key: PublicKey,
    pub address: String,
}

/// Read-model returned by `GetAccountAssets`, distinct from the ledger's
/// internal per-asset balance map (supplemental data, spec §3 note).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountAsset {
    pub account_id: AccountId,
    pub asset_id: AssetId,
    pub balance: Quantity,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr as _;

    fn account_id(s: &str) -> AccountId {
        s.parse().unwrap()
    }

    #[test]
    fn grant_is_idempotent() {
        let mut account = Account::new(account_id("alice@d"), 1, vec![]);
        let grantee = account_id("bob@d");
        account.grant(grantee.clone(), GrantablePermission::CanTransferMyAssets);
        account.grant(grantee.clone(), GrantablePermission::CanTransferMyAssets);
        assert_eq!(
            account.granted_permissions.get(&grantee).unwrap().len(),
            1
        );
        assert!(account.has_granted(&grantee, GrantablePermission::CanTransferMyAssets));
    }

    #[test]
    fn revoke_removes_grant() {
        let mut account = Account::new(account_id("alice@d"), 1, vec![]);
        let grantee = account_id("bob@d");
        account.grant(grantee.clone(), GrantablePermission::CanSetMyQuorum);
        account.revoke(&grantee, GrantablePermission::CanSetMyQuorum);
        assert!(!account.has_granted(&grantee, GrantablePermission::CanSetMyQuorum));
    }

    #[test]
    fn account_asset_balance_formats() {
        let asset = AccountAsset {
            account_id: account_id("alice@d"),
            asset_id: "coin#d".parse().unwrap(),
            balance: Quantity::from_str("9.00").unwrap(),
        };
        assert_eq!(asset.balance.to_string(), "9.00");
    }
}
