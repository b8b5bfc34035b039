//! Read-only queries against the committed WSV, spec §4.7/§6.

pub mod pagination;

pub use pagination::{Ordering, PaginationMeta, PaginationResponse};

use serde::{Deserialize, Serialize};

use crate::{
    account::{Account, AccountAsset, AccountId, Asset, AssetId, Peer, RoleId},
    block::Block,
    crypto::{Hash, PublicKey, Signature},
    error::ErrorCode,
    time::TimestampMillis,
    transaction::Transaction,
};

/// The closed query set, spec §6.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Query {
    GetAccount { account_id: AccountId },
    GetAccountAssets { account_id: AccountId, pagination: PaginationMeta },
    GetAccountDetail { account_id: AccountId, key: Option<String>, writer: Option<AccountId>, pagination: PaginationMeta },
    GetAccountTransactions { account_id: AccountId, pagination: PaginationMeta },
    GetAccountAssetTransactions { account_id: AccountId, asset_id: AssetId, pagination: PaginationMeta },
    GetTransactions { hashes: Vec<Hash> },
    GetSignatories { account_id: AccountId },
    GetRoles,
    GetRolePermissions { role_id: RoleId },
    GetAssetInfo { asset_id: AssetId },
    GetPendingTransactions { pagination: PaginationMeta },
    GetBlock { height: u64 },
    GetPeers,
    GetEngineReceipts { tx_hash: Hash },
}

impl Query {
    pub fn name(&self) -> &'static str {
        match self {
            Query::GetAccount { .. } => "GetAccount",
            Query::GetAccountAssets { .. } => "GetAccountAssets",
            Query::GetAccountDetail { .. } => "GetAccountDetail",
            Query::GetAccountTransactions { .. } => "GetAccountTransactions",
            Query::GetAccountAssetTransactions { .. } => "GetAccountAssetTransactions",
            Query::GetTransactions { .. } => "GetTransactions",
            Query::GetSignatories { .. } => "GetSignatories",
            Query::GetRoles => "GetRoles",
            Query::GetRolePermissions { .. } => "GetRolePermissions",
            Query::GetAssetInfo { .. } => "GetAssetInfo",
            Query::GetPendingTransactions { .. } => "GetPendingTransactions",
            Query::GetBlock { .. } => "GetBlock",
            Query::GetPeers => "GetPeers",
            Query::GetEngineReceipts { .. } => "GetEngineReceipts",
        }
    }
}

/// A query envelope: creator, counter, created-time and signature, spec
/// §4.7 ("each query carries a creator, counter, and created-time").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignedQuery {
    pub creator: AccountId,
    pub counter: u64,
    pub created_time: TimestampMillis,
    pub query: Query,
    pub signature: Signature,
    pub public_key: PublicKey,
}

impl SignedQuery {
    pub fn payload_bytes(&self) -> Vec<u8> {
        serde_json::to_vec(&(self.creator.to_string(), self.counter, self.created_time, &self.query))
            .expect("SignedQuery payload always serializes")
    }

    pub fn verify_signature(&self) -> Result<(), crate::crypto::CryptoError> {
        self.public_key.verify(&self.payload_bytes(), &self.signature)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum QueryResponse {
    Account(Account),
    AccountAssets(PaginationResponse<AccountAsset>),
    AccountDetail { detail: String, total_count: u64 },
    AccountTransactions(PaginationResponse<Transaction>),
    Signatories(Vec<PublicKey>),
    Roles(Vec<RoleId>),
    RolePermissions(Vec<crate::account::RolePermission>),
    AssetInfo(Asset),
    PendingTransactions(PaginationResponse<Transaction>),
    Transactions(Vec<Transaction>),
    Block(Block),
    Peers(Vec<Peer>),
    EngineReceipt { tx_hash: Hash, success: bool, output: Vec<u8> },
    Error { code: ErrorCode, message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum QueryError {
    #[error("query creator does not hold the required permission")]
    NoPermission,
    #[error("pagination first_hash does not match the result set")]
    InvalidPagination,
    #[error("subject absent")]
    SubjectAbsent,
    #[error("query signature is invalid")]
    InvalidSignature,
}

impl QueryError {
    pub fn code(self) -> ErrorCode {
        match self {
            QueryError::NoPermission => crate::error::CODE_NO_PERMISSION,
            QueryError::InvalidPagination => crate::error::CODE_INVARIANT_VIOLATED,
            QueryError::SubjectAbsent => crate::error::CODE_SUBJECT_ABSENT,
            QueryError::InvalidSignature => crate::error::CODE_NO_PERMISSION,
        }
    }
}
