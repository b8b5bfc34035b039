//! `CallEngine`'s narrow extension point, spec §4.2 (`CallEngine`): the node
//! delegates to whatever implements `ContractEngine`. No VM ships here.

use ledger_common::{account::AccountId, crypto::Hash};

pub struct CallContext {
    pub tx_hash: Hash,
    pub caller: AccountId,
    pub callee: Option<AccountId>,
    pub input: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct EngineReceipt {
    pub tx_hash: Hash,
    pub success: bool,
    pub output: Vec<u8>,
}

pub trait ContractEngine: Send + Sync {
    fn call(&mut self, ctx: CallContext) -> Result<EngineReceipt, crate::core::error::CommandError>;
}

/// Used where no engine is configured: every `CallEngine` command fails
/// with "subject absent" rather than panicking.
pub struct NoEngine;

impl ContractEngine for NoEngine {
    fn call(&mut self, ctx: CallContext) -> Result<EngineReceipt, crate::core::error::CommandError> {
        Err(crate::core::error::CommandError::subject_absent(
            "CallEngine",
            format!("no contract engine configured, tx {}", ctx.tx_hash),
        ))
    }
}
