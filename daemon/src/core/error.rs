//! Stable numeric error taxonomy, spec §7: `CommandError{name, code,
//! query_args}`. `Internal` carries the storage backend's own error so a
//! storage I/O failure surfaces as code 1 without losing its source.

use ledger_common::error::{
    CODE_ALREADY_EXISTS, CODE_INTERNAL, CODE_INVARIANT_VIOLATED, CODE_NO_PERMISSION,
    CODE_SUBJECT_ABSENT, ErrorCode,
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("storage I/O error: {0}")]
    Storage(#[from] sled::Error),

    #[error("wire codec error: {0}")]
    Codec(#[from] ledger_common::serializer::ReaderError),

    #[error("{0}")]
    Internal(String),
}

/// `execute(command, ...) -> Ok | Err{command_name, code, query_args_string}`,
/// spec §4.2.
#[derive(Debug, Error)]
#[error("{command_name} failed with code {code}: {query_args}")]
pub struct CommandError {
    pub command_name: &'static str,
    pub code: ErrorCode,
    pub query_args: String,
    #[source]
    pub source: Option<CoreError>,
}

impl CommandError {
    pub fn new(command_name: &'static str, code: ErrorCode, query_args: impl Into<String>) -> Self {
        Self { command_name, code, query_args: query_args.into(), source: None }
    }

    pub fn internal(command_name: &'static str, source: CoreError) -> Self {
        Self {
            command_name,
            code: CODE_INTERNAL,
            query_args: source.to_string(),
            source: Some(source),
        }
    }

    pub fn no_permission(command_name: &'static str) -> Self {
        Self::new(command_name, CODE_NO_PERMISSION, "creator lacks the required permission")
    }

    pub fn subject_absent(command_name: &'static str, subject: impl Into<String>) -> Self {
        Self::new(command_name, CODE_SUBJECT_ABSENT, subject)
    }

    pub fn invariant_violated(command_name: &'static str, detail: impl Into<String>) -> Self {
        Self::new(command_name, CODE_INVARIANT_VIOLATED, detail)
    }

    pub fn already_exists(command_name: &'static str, detail: impl Into<String>) -> Self {
        Self::new(command_name, CODE_ALREADY_EXISTS, detail)
    }

    pub fn code_n(command_name: &'static str, code: ErrorCode, detail: impl Into<String>) -> Self {
        Self::new(command_name, code, detail)
    }

    pub fn to_summary(&self) -> ledger_common::transaction::CommandErrorSummary {
        ledger_common::transaction::CommandErrorSummary {
            command_name: self.command_name.to_string(),
            code: self.code,
            query_args: self.query_args.clone(),
        }
    }
}

impl From<sled::Error> for CommandError {
    fn from(err: sled::Error) -> Self {
        CommandError::internal("unknown", CoreError::Storage(err))
    }
}
