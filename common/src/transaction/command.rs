//! The closed command set, spec §6. Each variant carries its typed
//! arguments; the discriminant byte doubles as the wire tag consumed by
//! `Hashable::hash` and the one the command executor matches on.

use serde::{Deserialize, Serialize};

use crate::{
    account::{AccountId, AssetId, DomainId, GrantablePermission, Peer, Quantity, RoleId, RolePermission},
    crypto::PublicKey,
    serializer::{Reader, ReaderError, Serializer, Writer},
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Command {
    AddAssetQuantity { asset_id: AssetId, amount: Quantity },
    SubtractAssetQuantity { asset_id: AssetId, amount: Quantity },
    TransferAsset {
        src_account_id: AccountId,
        dest_account_id: AccountId,
        asset_id: AssetId,
        description: String,
        amount: Quantity,
    },
    AddPeer { peer: Peer },
    RemovePeer { public_key: PublicKey },
    AddSignatory { account_id: AccountId, public_key: PublicKey },
    RemoveSignatory { account_id: AccountId, public_key: PublicKey },
    SetQuorum { account_id: AccountId, quorum: u32 },
    CreateAccount {
        account_name: String,
        domain_id: DomainId,
        public_key: PublicKey,
    },
    CreateAsset { asset_name: String, domain_id: DomainId, precision: u8 },
    CreateDomain { domain_id: DomainId, default_role: RoleId },
    CreateRole { role_id: RoleId, permissions: Vec<RolePermission> },
    AppendRole { account_id: AccountId, role_id: RoleId },
    DetachRole { account_id: AccountId, role_id: RoleId },
    GrantPermission { grantee_account_id: AccountId, permission: GrantablePermission },
    RevokePermission { grantee_account_id: AccountId, permission: GrantablePermission },
    SetAccountDetail { account_id: AccountId, key: String, value: String },
    CompareAndSetAccountDetail {
        account_id: AccountId,
        key: String,
        value: String,
        expected: Option<String>,
        check_empty: bool,
    },
    CallEngine {
        caller: AccountId,
        callee: Option<AccountId>,
        input: Vec<u8>,
    },
    SetSettingValue { key: String, value: String },
}

impl Command {
    /// Stable name used in `CommandError{command_name, ...}`, spec §7.
    pub fn name(&self) -> &'static str {
        match self {
            Command::AddAssetQuantity { .. } => "AddAssetQuantity",
            Command::SubtractAssetQuantity { .. } => "SubtractAssetQuantity",
            Command::TransferAsset { .. } => "TransferAsset",
            Command::AddPeer { .. } => "AddPeer",
            Command::RemovePeer { .. } => "RemovePeer",
            Command::AddSignatory { .. } => "AddSignatory",
            Command::RemoveSignatory { .. } => "RemoveSignatory",
            Command::SetQuorum { .. } => "SetQuorum",
            Command::CreateAccount { .. } => "CreateAccount",
            Command::CreateAsset { .. } => "CreateAsset",
            Command::CreateDomain { .. } => "CreateDomain",
            Command::CreateRole { .. } => "CreateRole",
            Command::AppendRole { .. } => "AppendRole",
            Command::DetachRole { .. } => "DetachRole",
            Command::GrantPermission { .. } => "GrantPermission",
            Command::RevokePermission { .. } => "RevokePermission",
            Command::SetAccountDetail { .. } => "SetAccountDetail",
            Command::CompareAndSetAccountDetail { .. } => "CompareAndSetAccountDetail",
            Command::CallEngine { .. } => "CallEngine",
            Command::SetSettingValue { .. } => "SetSettingValue",
        }
    }

    fn tag(&self) -> u8 {
        match self {
            Command::AddAssetQuantity { .. } => 0,
            Command::SubtractAssetQuantity { .. } => 1,
            Command::TransferAsset { .. } => 2,
            Command::AddPeer { .. } => 3,
            Command::RemovePeer { .. } => 4,
            Command::AddSignatory { .. } => 5,
            Command::RemoveSignatory { .. } => 6,
            Command::SetQuorum { .. } => 7,
            Command::CreateAccount { .. } => 8,
            Command::CreateAsset { .. } => 9,
            Command::CreateDomain { .. } => 10,
            Command::CreateRole { .. } => 11,
            Command::AppendRole { .. } => 12,
            Command::DetachRole { .. } => 13,
            Command::GrantPermission { .. } => 14,
            Command::RevokePermission { .. } => 15,
            Command::SetAccountDetail { .. } => 16,
            Command::CompareAndSetAccountDetail { .. } => 17,
            Command::CallEngine { .. } => 18,
            Command::SetSettingValue { .. } => 19,
        }
    }
}

/// We encode `Command` with `serde_json` into a length-prefixed blob rather
/// than hand-rolling ~20 field layouts: the wire-identity byte that matters
/// for hashing is the content, not a bit-packed schema, and every field type
/// already round-trips through `serde`.
impl Serializer for Command {
    fn write(&self, writer: &mut Writer) {
        writer.write_u8(self.tag());
        let json = serde_json::to_vec(self).expect("Command always serializes");
        writer.write_bytes_sized(&json);
    }

    fn read(reader: &mut Reader) -> Result<Self, ReaderError> {
        let _tag = reader.read_u8()?;
        let bytes = reader.read_bytes_sized()?;
        serde_json::from_slice(&bytes).map_err(|_| ReaderError::InvalidValue)
    }

    fn size(&self) -> usize {
        let json = serde_json::to_vec(self).expect("Command always serializes");
        1 + 4 + json.len()
    }
}
