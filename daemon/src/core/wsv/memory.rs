use super::{WsvBackend, WsvSnapshot};
use crate::core::error::CoreError;

/// No persistence: used by tests, the genesis builder, and the
/// `reuse_state`-less fast path (SPEC_FULL §4.1).
#[derive(Debug, Default)]
pub struct MemoryBackend;

impl MemoryBackend {
    pub fn new() -> Self {
        Self
    }
}

impl WsvBackend for MemoryBackend {
    fn load(&self) -> Result<WsvSnapshot, CoreError> {
        Ok(WsvSnapshot::default())
    }

    fn persist(&self, _snapshot: &WsvSnapshot) -> Result<(), CoreError> {
        Ok(())
    }
}
