//! Asset storage seam used by `init_model`.

use std::io;
use std::path::{Component, Path, PathBuf};

use crate::error::{ColorLensError, Result};

/// Read-only named byte blobs (APK assets, a directory, a test fixture).
pub trait AssetStorage: Send + Sync {
    fn read(&self, name: &str) -> Result<Vec<u8>>;
}

/// Assets stored as files below a root directory.
#[derive(Debug, Clone)]
pub struct DirAssetStorage {
    root: PathBuf,
}

impl DirAssetStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl AssetStorage for DirAssetStorage {
    fn read(&self, name: &str) -> Result<Vec<u8>> {
        let rel = Path::new(name);
        if name.is_empty() || !rel.components().all(|c| matches!(c, Component::Normal(_))) {
            return Err(ColorLensError::invalid(format!(
                "asset name {name:?} must be a relative path without `..`"
            )));
        }
        std::fs::read(self.root.join(rel)).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => ColorLensError::AssetNotFound(name.to_string()),
            _ => ColorLensError::Io(e),
        })
    }
}
