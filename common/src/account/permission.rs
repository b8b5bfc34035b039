//! Explicit permission enumerations with a stable bit index, rather than a
//! bare bit string — supplemental data grounded in the original source's
//! `shared_model` permission tables, which the distilled spec only summarizes
//! as "fixed-width bit strings" (spec §4.1(e)).

use serde::{Deserialize, Serialize};

use crate::serializer::{Reader, ReaderError, Serializer, Writer};

/// A role permission, granted to an account via a `Role`. `Root` is a
/// distinguished permission that implies every other one for its holder
/// (spec §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[non_exhaustive]
pub enum RolePermission {
    Root,
    CanAddAssetQty,
    CanAddDomainAssetQty,
    CanSubtractAssetQty,
    CanSubtractDomainAssetQty,
    CanTransfer,
    CanTransferMyAssets,
    CanReceive,
    CanAddPeer,
    CanRemovePeer,
    CanAddSignatory,
    CanAddMySignatory,
    CanRemoveSignatory,
    CanRemoveMySignatory,
    CanSetQuorum,
    CanSetMyQuorum,
    CanCreateAccount,
    CanCreateAsset,
    CanCreateDomain,
    CanCreateRole,
    CanAppendRole,
    CanDetachRole,
    CanGrantCanAddMySignatory,
    CanGrantCanRemoveMySignatory,
    CanGrantCanSetMyQuorum,
    CanGrantCanTransferMyAssets,
    CanGrantCanSetMyAccountDetail,
    CanGrantCanCallEngineOnMyBehalf,
    CanSetDetail,
    CanSetMyAccountDetail,
    CanGetMyAccountDetail,
    CanCallEngine,
    CanCallEngineOnMyBehalf,
    CanSetSettingValue,
}

impl RolePermission {
    pub const COUNT: usize = 34;

    pub const fn bit_index(self) -> u32 {
        self as u32
    }

    pub const ALL: [RolePermission; Self::COUNT] = [
        RolePermission::Root,
        RolePermission::CanAddAssetQty,
        RolePermission::CanAddDomainAssetQty,
        RolePermission::CanSubtractAssetQty,
        RolePermission::CanSubtractDomainAssetQty,
        RolePermission::CanTransfer,
        RolePermission::CanTransferMyAssets,
        RolePermission::CanReceive,
        RolePermission::CanAddPeer,
        RolePermission::CanRemovePeer,
        RolePermission::CanAddSignatory,
        RolePermission::CanAddMySignatory,
        RolePermission::CanRemoveSignatory,
        RolePermission::CanRemoveMySignatory,
        RolePermission::CanSetQuorum,
        RolePermission::CanSetMyQuorum,
        RolePermission::CanCreateAccount,
        RolePermission::CanCreateAsset,
        RolePermission::CanCreateDomain,
        RolePermission::CanCreateRole,
        RolePermission::CanAppendRole,
        RolePermission::CanDetachRole,
        RolePermission::CanGrantCanAddMySignatory,
        RolePermission::CanGrantCanRemoveMySignatory,
        RolePermission::CanGrantCanSetMyQuorum,
        RolePermission::CanGrantCanTransferMyAssets,
        RolePermission::CanGrantCanSetMyAccountDetail,
        RolePermission::CanGrantCanCallEngineOnMyBehalf,
        RolePermission::CanSetDetail,
        RolePermission::CanSetMyAccountDetail,
        RolePermission::CanGetMyAccountDetail,
        RolePermission::CanCallEngine,
        RolePermission::CanCallEngineOnMyBehalf,
        RolePermission::CanSetSettingValue,
    ];

    /// The role permission that implies the ability to grant `perm` to
    /// another account, spec §4.2 (`GrantPermission` row).
    pub const fn grants(self) -> Option<GrantablePermission> {
        match self {
            RolePermission::CanGrantCanAddMySignatory => Some(GrantablePermission::CanAddMySignatory),
            RolePermission::CanGrantCanRemoveMySignatory => {
                Some(GrantablePermission::CanRemoveMySignatory)
            }
            RolePermission::CanGrantCanSetMyQuorum => Some(GrantablePermission::CanSetMyQuorum),
            RolePermission::CanGrantCanTransferMyAssets => {
                Some(GrantablePermission::CanTransferMyAssets)
            }
            RolePermission::CanGrantCanSetMyAccountDetail => {
                Some(GrantablePermission::CanSetMyAccountDetail)
            }
            RolePermission::CanGrantCanCallEngineOnMyBehalf => {
                Some(GrantablePermission::CanCallEngineOnMyBehalf)
            }
            _ => None,
        }
    }
}

/// A permission granted by one account to another for a specific subject,
/// spec §3 ("grantable permissions").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GrantablePermission {
    CanAddMySignatory,
    CanRemoveMySignatory,
    CanSetMyQuorum,
    CanTransferMyAssets,
    CanSetMyAccountDetail,
    CanCallEngineOnMyBehalf,
}

impl GrantablePermission {
    pub const COUNT: usize = 6;

    pub const fn bit_index(self) -> u32 {
        self as u32
    }
}

/// A fixed-width bit string over a permission enum's bit indices, spec
/// §4.1(e). `u128` comfortably covers both enums' bit counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionSet(u128);

impl PermissionSet {
    pub const fn empty() -> Self {
        Self(0)
    }

    pub fn insert(&mut self, bit_index: u32) {
        self.0 |= 1u128 << bit_index;
    }

    pub fn contains_bit(&self, bit_index: u32) -> bool {
        (self.0 >> bit_index) & 1 == 1
    }

    pub fn union(&self, other: &Self) -> Self {
        Self(self.0 | other.0)
    }
}

impl PermissionSet {
    pub fn has_role_permission(&self, perm: RolePermission) -> bool {
        self.contains_bit(RolePermission::Root.bit_index())
            || self.contains_bit(perm.bit_index())
    }

    pub fn grant_role_permission(&mut self, perm: RolePermission) {
        self.insert(perm.bit_index());
    }
}

impl Serializer for PermissionSet {
    fn write(&self, writer: &mut Writer) {
        writer.write_u64((self.0 >> 64) as u64);
        writer.write_u64(self.0 as u64);
    }

    fn read(reader: &mut Reader) -> Result<Self, ReaderError> {
        let hi = reader.read_u64()? as u128;
        let lo = reader.read_u64()? as u128;
        Ok(Self((hi << 64) | lo))
    }

    fn size(&self) -> usize {
        16
    }
}
