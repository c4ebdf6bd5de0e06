use std::fs;
use std::path::{Path, PathBuf};

use wdm_embedded::SettingsStore;

use crate::errors::Result;

/// One file per key under a root directory.
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    fn path(&self, key: &str) -> PathBuf {
        self.root.join(key.trim_start_matches('/'))
    }
}

impl SettingsStore for FileStore {
    fn load(&self, key: &str) -> Option<Vec<u8>> {
        fs::read(self.path(key)).ok()
    }

    fn save(&mut self, key: &str, data: &[u8]) -> bool {
        let path = self.path(key);
        match fs::write(&path, data) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!("Failed to write {}: {}", path.display(), e);
                false
            }
        }
    }
}
