//! `shelfkeeper-store`: persistence and consistency layer for the catalog.
//!
//! - [`AssetManager`]: image files under the asset root
//! - [`CatalogStore`]: the catalog document behind one process-wide lock
//! - [`BackupBundler`]: document + assets as one zip archive
//!
//! Everything here is synchronous; async callers should run store operations
//! on a blocking pool.

pub mod assets;
pub mod backup;
pub mod catalog;
pub mod config;
pub mod document;
pub mod paths;

pub use assets::{AssetManager, AssetUpload, sanitize_file_name};
pub use backup::{BackupBundler, ImportSummary};
pub use catalog::CatalogStore;
pub use config::StoreConfig;
