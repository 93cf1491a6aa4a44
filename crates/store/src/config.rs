//! On-disk layout of a catalog data directory.

use std::path::{Path, PathBuf};

/// File name of the catalog document, both on disk and inside backups.
pub const DOCUMENT_FILE: &str = "products.json";

/// Directory (below the data dir) holding product images.
pub const ASSET_DIR: &str = "uploads";

/// Default per-entry limit when extracting backups (32 MiB).
pub const DEFAULT_MAX_ENTRY_BYTES: u64 = 32 * 1024 * 1024;

/// Store configuration.
///
/// ```text
/// <data_dir>/products.json
/// <data_dir>/uploads/<asset files>
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub data_dir: PathBuf,
    /// Largest single archive entry accepted by an import.
    pub max_entry_bytes: u64,
}

impl StoreConfig {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            max_entry_bytes: DEFAULT_MAX_ENTRY_BYTES,
        }
    }

    pub fn with_max_entry_bytes(mut self, limit: u64) -> Self {
        self.max_entry_bytes = limit;
        self
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn document_path(&self) -> PathBuf {
        self.data_dir.join(DOCUMENT_FILE)
    }

    pub fn asset_root(&self) -> PathBuf {
        self.data_dir.join(ASSET_DIR)
    }
}
