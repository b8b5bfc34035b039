//! The permission decision tree, spec §4.2: "(root perm) OR (individual
//! perm AND same-entity) OR (domain perm AND same-domain) OR (all-entities
//! perm)", evaluated as a single composable predicate against the WSV
//! transaction in one pass.

use ledger_common::account::{AccountId, GrantablePermission, RolePermission};

use crate::core::wsv::WsvSnapshot;

fn account_permissions(wsv: &WsvSnapshot, account_id: &AccountId) -> ledger_common::account::PermissionSet {
    let Some(account) = wsv.accounts.get(account_id) else {
        return ledger_common::account::PermissionSet::empty();
    };
    let mut set = ledger_common::account::PermissionSet::empty();
    for role_id in &account.roles {
        if let Some(role) = wsv.roles.get(role_id) {
            set = set.union(&role.permissions);
        }
    }
    set
}

/// A composable predicate over `(creator, subject)`, matching spec §4.2's
/// decision tree in a single evaluation.
pub enum PermissionCheck {
    /// `creator` holds `perm` globally (root perm implies this too).
    Has(RolePermission),
    /// `creator` holds `perm` AND `creator == subject`.
    SelfOnly(RolePermission, AccountId),
    /// `creator` holds `domain_perm` AND `creator`'s domain equals `subject`'s domain.
    SameDomain(RolePermission, AccountId),
    /// `subject` has granted `creator` the grantable permission.
    Granted(GrantablePermission, AccountId),
    Any(Vec<PermissionCheck>),
}

impl PermissionCheck {
    pub fn evaluate(&self, wsv: &WsvSnapshot, creator: &AccountId) -> bool {
        match self {
            PermissionCheck::Has(perm) => account_permissions(wsv, creator).has_role_permission(*perm),
            PermissionCheck::SelfOnly(perm, subject) => {
                creator == subject && account_permissions(wsv, creator).has_role_permission(*perm)
            }
            PermissionCheck::SameDomain(perm, subject) => {
                creator.domain == subject.domain
                    && account_permissions(wsv, creator).has_role_permission(*perm)
            }
            PermissionCheck::Granted(perm, subject) => wsv
                .accounts
                .get(subject)
                .map(|account| account.has_granted(creator, *perm))
                .unwrap_or(false),
            PermissionCheck::Any(checks) => checks.iter().any(|c| c.evaluate(wsv, creator)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledger_common::account::{Account, Role, RoleId};

    fn wsv_with_role(account_id: AccountId, perm: RolePermission) -> WsvSnapshot {
        let mut wsv = WsvSnapshot::default();
        let role_id = RoleId::from("r");
        wsv.roles.insert(role_id.clone(), Role {
            id: role_id.clone(),
            permissions: {
                let mut set = ledger_common::account::PermissionSet::empty();
                set.grant_role_permission(perm);
                set
            },
        });
        let mut account = Account::new(account_id.clone(), 1, vec![]);
        account.roles.push(role_id);
        wsv.accounts.insert(account_id, account);
        wsv
    }

    #[test]
    fn root_role_implies_any_check() {
        let alice: AccountId = "alice@d".parse().unwrap();
        let wsv = wsv_with_role(alice.clone(), RolePermission::Root);
        let check = PermissionCheck::Has(RolePermission::CanCreateAccount);
        assert!(check.evaluate(&wsv, &alice));
    }

    #[test]
    fn self_only_requires_matching_subject() {
        let alice: AccountId = "alice@d".parse().unwrap();
        let bob: AccountId = "bob@d".parse().unwrap();
        let wsv = wsv_with_role(alice.clone(), RolePermission::CanSetMyAccountDetail);
        let check = PermissionCheck::SelfOnly(RolePermission::CanSetMyAccountDetail, alice.clone());
        assert!(check.evaluate(&wsv, &alice));
        let check_other = PermissionCheck::SelfOnly(RolePermission::CanSetMyAccountDetail, bob);
        assert!(!check_other.evaluate(&wsv, &alice));
    }

    #[test]
    fn any_short_circuits_on_first_match() {
        let alice: AccountId = "alice@d".parse().unwrap();
        let wsv = wsv_with_role(alice.clone(), RolePermission::CanTransfer);
        let check = PermissionCheck::Any(vec![
            PermissionCheck::Has(RolePermission::CanCreateAccount),
            PermissionCheck::Has(RolePermission::CanTransfer),
        ]);
        assert!(check.evaluate(&wsv, &alice));
    }
}
