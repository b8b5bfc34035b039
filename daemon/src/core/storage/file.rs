use std::{
    fs,
    path::{Path, PathBuf},
    sync::Mutex,
};

use ledger_common::{block::Block, config::BLOCK_FILE_NAME_WIDTH, serializer::Serializer};

use super::BlockStorage;
use crate::core::error::CoreError;

/// One file per height, under `dir`, named with a zero-padded decimal
/// height (spec §4.3's "append-only, height-keyed" store). Inserts write to
/// a `.tmp` sibling and rename, so a crash mid-write never leaves a
/// half-written height file behind.
pub struct FileBlockStorage {
    dir: PathBuf,
    top_height: Mutex<Option<u64>>,
}

impl FileBlockStorage {
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, CoreError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| CoreError::Internal(format!("failed to create block dir: {e}")))?;
        let storage = Self { dir, top_height: Mutex::new(None) };
        storage.sweep_and_index()?;
        Ok(storage)
    }

    fn file_name(height: u64) -> String {
        format!("{height:0width$}", width = BLOCK_FILE_NAME_WIDTH)
    }

    fn path_for(&self, height: u64) -> PathBuf {
        self.dir.join(Self::file_name(height))
    }

    /// Startup sweep: drops any filename that isn't a valid zero-padded
    /// height, then records the highest valid one found.
    fn sweep_and_index(&self) -> Result<(), CoreError> {
        let mut top = None;
        for entry in fs::read_dir(&self.dir).map_err(|e| CoreError::Internal(format!("failed to read block dir: {e}")))? {
            let entry = entry.map_err(|e| CoreError::Internal(format!("failed to read block dir entry: {e}")))?;
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if name.ends_with(".tmp") {
                let _ = fs::remove_file(entry.path());
                continue;
            }
            match parse_height(&name) {
                Some(height) => top = Some(top.map_or(height, |t: u64| t.max(height))),
                None => {
                    let _ = fs::remove_file(entry.path());
                }
            }
        }
        *self.top_height.lock().expect("lock poisoned") = top;
        Ok(())
    }

    fn read_path(path: &Path) -> Result<Block, CoreError> {
        let bytes = fs::read(path).map_err(|e| CoreError::Internal(format!("failed to read block file: {e}")))?;
        Block::from_bytes(&bytes).map_err(CoreError::Codec)
    }
}

fn parse_height(name: &str) -> Option<u64> {
    if name.len() != BLOCK_FILE_NAME_WIDTH || !name.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    name.parse().ok()
}

#[async_trait::async_trait]
impl BlockStorage for FileBlockStorage {
    async fn insert(&self, block: Block) -> Result<(), CoreError> {
        block
            .validate_self_consistency()
            .map_err(|e| CoreError::Internal(e.to_string()))?;
        let expected = {
            let top = self.top_height.lock().expect("lock poisoned");
            top.map(|h| h + 1).unwrap_or(1)
        };
        if block.header.height != expected {
            return Err(CoreError::Internal(format!(
                "non-sequential insert: expected height {expected}, got {}",
                block.header.height
            )));
        }
        let previous = if expected == 1 { None } else { self.fetch(expected - 1).await? };
        block
            .validate_linkage(previous.as_ref())
            .map_err(|e| CoreError::Internal(e.to_string()))?;
        let path = self.path_for(block.header.height);
        let tmp_path = path.with_extension("tmp");
        fs::write(&tmp_path, block.to_bytes())
            .map_err(|e| CoreError::Internal(format!("failed to write block file: {e}")))?;
        fs::rename(&tmp_path, &path).map_err(|e| CoreError::Internal(format!("failed to finalize block file: {e}")))?;
        *self.top_height.lock().expect("lock poisoned") = Some(block.header.height);
        Ok(())
    }

    async fn fetch(&self, height: u64) -> Result<Option<Block>, CoreError> {
        let path = self.path_for(height);
        if !path.exists() {
            return Ok(None);
        }
        Self::read_path(&path).map(Some)
    }

    async fn top_height(&self) -> Result<Option<u64>, CoreError> {
        Ok(*self.top_height.lock().expect("lock poisoned"))
    }

    async fn size(&self) -> Result<u64, CoreError> {
        Ok(self.top_height.lock().expect("lock poisoned").unwrap_or(0))
    }

    async fn for_each(&self, visitor: &mut dyn FnMut(&Block)) -> Result<(), CoreError> {
        let top = *self.top_height.lock().expect("lock poisoned");
        let Some(top) = top else { return Ok(()) };
        for height in 1..=top {
            if let Some(block) = self.fetch(height).await? {
                visitor(&block);
            }
        }
        Ok(())
    }

    async fn clear(&self) -> Result<(), CoreError> {
        for entry in fs::read_dir(&self.dir).map_err(|e| CoreError::Internal(format!("failed to read block dir: {e}")))? {
            let entry = entry.map_err(|e| CoreError::Internal(format!("failed to read block dir entry: {e}")))?;
            fs::remove_file(entry.path()).map_err(|e| CoreError::Internal(format!("failed to remove block file: {e}")))?;
        }
        *self.top_height.lock().expect("lock poisoned") = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::storage::sample_block;

    #[tokio::test]
    async fn persists_and_reloads_blocks_after_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileBlockStorage::open(dir.path()).unwrap();
        storage.insert(sample_block(1, ledger_common::crypto::Hash::zero())).await.unwrap();
        storage.insert(sample_block(2, ledger_common::crypto::hash(b"one"))).await.unwrap();

        let reopened = FileBlockStorage::open(dir.path()).unwrap();
        assert_eq!(reopened.top_height().await.unwrap(), Some(2));
        assert!(reopened.fetch(2).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn sweep_removes_non_matching_filenames() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("garbage.txt"), b"noise").unwrap();
        let storage = FileBlockStorage::open(dir.path()).unwrap();
        assert_eq!(storage.top_height().await.unwrap(), None);
        assert!(!dir.path().join("garbage.txt").exists());
    }

    #[tokio::test]
    async fn rejects_non_sequential_insert() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileBlockStorage::open(dir.path()).unwrap();
        let result = storage.insert(sample_block(2, ledger_common::crypto::Hash::zero())).await;
        assert!(result.is_err());
    }
}
