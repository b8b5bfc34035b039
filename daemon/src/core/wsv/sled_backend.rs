use super::{WsvBackend, WsvSnapshot};
use crate::core::error::CoreError;

const SNAPSHOT_KEY: &[u8] = b"wsv_snapshot";

/// Persistent WSV backend. The derived state is rebuildable from the block
/// store (spec §6), so a single serialized blob under one key is sufficient
/// durability — there is no need for per-entity column families the way
/// block storage needs per-height files.
pub struct SledBackend {
    tree: sled::Tree,
}

impl SledBackend {
    pub fn open(db: &sled::Db) -> Result<Self, CoreError> {
        let tree = db.open_tree("wsv")?;
        Ok(Self { tree })
    }
}

impl WsvBackend for SledBackend {
    fn load(&self) -> Result<WsvSnapshot, CoreError> {
        match self.tree.get(SNAPSHOT_KEY)? {
            Some(bytes) => serde_json::from_slice(&bytes)
                .map_err(|e| CoreError::Internal(format!("corrupt wsv snapshot: {e}"))),
            None => Ok(WsvSnapshot::default()),
        }
    }

    fn persist(&self, snapshot: &WsvSnapshot) -> Result<(), CoreError> {
        let bytes = serde_json::to_vec(snapshot)
            .map_err(|e| CoreError::Internal(format!("failed to encode wsv snapshot: {e}")))?;
        self.tree.insert(SNAPSHOT_KEY, bytes)?;
        self.tree.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn persisted_snapshot_reloads() {
        let dir = tempfile::tempdir().unwrap();
        let db = sled::open(dir.path()).unwrap();
        let backend = SledBackend::open(&db).unwrap();

        let mut snapshot = WsvSnapshot::default();
        snapshot
            .settings
            .insert("k".to_string(), "v".to_string());
        backend.persist(&snapshot).unwrap();

        let reloaded = backend.load().unwrap();
        assert_eq!(reloaded.settings.get("k"), Some(&"v".to_string()));
    }
}
