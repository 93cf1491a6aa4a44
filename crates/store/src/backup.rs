//! BackupBundler: the document and every asset as one zip archive.
//!
//! Archive layout:
//!
//! ```text
//! products.json
//! uploads/<asset file name>
//! ```
//!
//! Import is all-or-nothing. The archive is fully validated, staged in a
//! temporary directory next to the live data and schema-checked before the
//! live asset directory and document are swapped.

use std::collections::BTreeSet;
use std::fs;
use std::io::{self, Cursor, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use shelfkeeper_core::{ASSET_PREFIX, Catalog, CatalogError, CatalogResult};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::catalog::CatalogStore;
use crate::config::{ASSET_DIR, DOCUMENT_FILE, StoreConfig};
use crate::document::{render, write_atomic};
use crate::paths::asset_file_name;

/// What an accepted import brought in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub document_replaced: bool,
    pub products: usize,
    pub assets: usize,
}

/// Validated entry of an archive that is about to be imported.
enum Entry {
    Document(usize),
    Asset { index: usize, name: String },
}

fn archive_io(context: &str, e: impl std::fmt::Display) -> CatalogError {
    CatalogError::storage(context.to_string(), io::Error::other(e.to_string()))
}

pub struct BackupBundler {
    store: Arc<CatalogStore>,
    data_dir: PathBuf,
    max_entry_bytes: u64,
}

impl BackupBundler {
    pub fn new(store: Arc<CatalogStore>, config: &StoreConfig) -> Self {
        Self {
            store,
            data_dir: config.data_dir.clone(),
            max_entry_bytes: config.max_entry_bytes,
        }
    }

    /// Point-in-time archive of the document and all assets.
    pub fn export(&self) -> CatalogResult<Vec<u8>> {
        let _guard = self.store.lock_exclusive()?;

        let document = match self.store.document().read_raw()? {
            Some(bytes) => bytes,
            None => render(&Catalog::default())?,
        };
        let assets = self.store.assets().list()?;

        let options = FileOptions::default().compression_method(CompressionMethod::Deflated);
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));

        zip.start_file(DOCUMENT_FILE, options)
            .map_err(|e| archive_io("write archive", e))?;
        zip.write_all(&document)
            .map_err(|e| CatalogError::storage("write archive", e))?;

        for (rel, path) in &assets {
            let bytes = fs::read(path)
                .map_err(|e| CatalogError::storage(format!("read {}", path.display()), e))?;
            zip.start_file(format!("{ASSET_PREFIX}{rel}"), options)
                .map_err(|e| archive_io("write archive", e))?;
            zip.write_all(&bytes)
                .map_err(|e| CatalogError::storage("write archive", e))?;
        }

        let bytes = zip
            .finish()
            .map_err(|e| archive_io("finish archive", e))?
            .into_inner();

        tracing::info!(assets = assets.len(), len = bytes.len(), "backup exported");
        Ok(bytes)
    }

    /// Replace the live document and asset set with the archive's content, or
    /// reject the archive and leave everything untouched.
    pub fn import(&self, archive: &[u8]) -> CatalogResult<ImportSummary> {
        let mut guard = self.store.lock_exclusive()?;

        let result = self.import_locked(archive);
        match &result {
            Ok((catalog, summary)) => {
                *guard = Some(catalog.clone());
                tracing::info!(
                    products = summary.products,
                    assets = summary.assets,
                    document_replaced = summary.document_replaced,
                    "backup imported"
                );
            }
            Err(e) => tracing::warn!("backup import rejected: {e}"),
        }
        result.map(|(_, summary)| summary)
    }

    fn import_locked(&self, archive: &[u8]) -> CatalogResult<(Catalog, ImportSummary)> {
        let mut zip = ZipArchive::new(Cursor::new(archive))
            .map_err(|e| CatalogError::archive(format!("not a zip archive: {e}")))?;

        let entries = self.plan(&mut zip)?;

        // Stage everything next to the live data so the final renames stay on
        // one filesystem.
        let staging = tempfile::Builder::new()
            .prefix(".import-")
            .tempdir_in(&self.data_dir)
            .map_err(|e| CatalogError::storage("create staging directory", e))?;
        let staged_assets = staging.path().join(ASSET_DIR);
        fs::create_dir_all(&staged_assets)
            .map_err(|e| CatalogError::storage("create staging directory", e))?;

        let mut document: Option<Catalog> = None;
        let mut asset_count = 0usize;
        for entry in &entries {
            match entry {
                Entry::Document(index) => {
                    let bytes = self.read_entry(&mut zip, *index)?;
                    let catalog: Catalog = serde_json::from_slice(&bytes).map_err(|e| {
                        CatalogError::archive(format!("{DOCUMENT_FILE} does not match the catalog schema: {e}"))
                    })?;
                    catalog.check_structure()?;
                    document = Some(catalog);
                }
                Entry::Asset { index, name } => {
                    let bytes = self.read_entry(&mut zip, *index)?;
                    let target = staged_assets.join(name);
                    write_atomic(&target, &bytes)
                        .map_err(|e| CatalogError::storage(format!("stage {}", target.display()), e))?;
                    asset_count += 1;
                }
            }
        }

        let document_replaced = document.is_some();
        let catalog = match document {
            Some(c) => c,
            None => self.store.document().load()?,
        };
        check_references(&catalog, &staged_assets)?;

        self.swap(&staged_assets, document_replaced.then_some(&catalog))?;

        let summary = ImportSummary {
            document_replaced,
            products: catalog.product_count(),
            assets: asset_count,
        };
        Ok((catalog, summary))
    }

    /// Classify and validate every entry before anything is written.
    fn plan(&self, zip: &mut ZipArchive<Cursor<&[u8]>>) -> CatalogResult<Vec<Entry>> {
        let mut entries = Vec::new();
        let mut seen_document = false;

        for index in 0..zip.len() {
            let file = zip
                .by_index(index)
                .map_err(|e| CatalogError::archive(format!("unreadable entry #{index}: {e}")))?;
            let name = file.name().to_string();

            if file.enclosed_name().is_none() {
                return Err(CatalogError::archive(format!("entry '{name}' escapes the extraction root")));
            }

            if name == DOCUMENT_FILE {
                if seen_document {
                    return Err(CatalogError::archive(format!("more than one {DOCUMENT_FILE} entry")));
                }
                seen_document = true;
                self.check_size(&name, file.size())?;
                entries.push(Entry::Document(index));
                continue;
            }

            let Some(rest) = name.strip_prefix(ASSET_PREFIX) else {
                return Err(CatalogError::archive(format!("unexpected entry '{name}'")));
            };

            if file.is_dir() {
                // Only the asset root itself; assets are never nested.
                if !rest.is_empty() {
                    return Err(CatalogError::archive(format!("unexpected directory '{name}'")));
                }
                continue;
            }

            let file_name = asset_file_name(rest).ok_or_else(|| {
                CatalogError::archive(format!("entry '{name}' is not a plain visible file under the asset root"))
            })?;
            self.check_size(&name, file.size())?;
            entries.push(Entry::Asset {
                index,
                name: file_name.to_string(),
            });
        }

        Ok(entries)
    }

    fn check_size(&self, name: &str, size: u64) -> CatalogResult<()> {
        if size > self.max_entry_bytes {
            return Err(CatalogError::archive(format!(
                "entry '{name}' exceeds {} bytes",
                self.max_entry_bytes
            )));
        }
        Ok(())
    }

    /// Read one entry, enforcing the size limit on the actual inflated bytes.
    fn read_entry(&self, zip: &mut ZipArchive<Cursor<&[u8]>>, index: usize) -> CatalogResult<Vec<u8>> {
        let file = zip
            .by_index(index)
            .map_err(|e| CatalogError::archive(format!("unreadable entry #{index}: {e}")))?;
        let name = file.name().to_string();

        let mut bytes = Vec::new();
        file.take(self.max_entry_bytes + 1)
            .read_to_end(&mut bytes)
            .map_err(|e| CatalogError::archive(format!("corrupt entry '{name}': {e}")))?;
        self.check_size(&name, bytes.len() as u64)?;
        Ok(bytes)
    }

    /// Move the staged asset directory into place, then the document. If the
    /// document cannot be written the previous asset directory is restored.
    fn swap(&self, staged_assets: &Path, document: Option<&Catalog>) -> CatalogResult<()> {
        let live_assets = self.store.assets().root().to_path_buf();
        let retired = self
            .data_dir
            .join(format!(".uploads-retired-{}", shelfkeeper_core::EntityId::generate()));

        let had_live = live_assets.exists();
        if had_live {
            fs::rename(&live_assets, &retired)
                .map_err(|e| CatalogError::storage("move live assets aside", e))?;
        }

        if let Err(e) = fs::rename(staged_assets, &live_assets) {
            if had_live {
                restore(&retired, &live_assets);
            }
            return Err(CatalogError::storage("move staged assets into place", e));
        }

        if let Some(catalog) = document {
            if let Err(e) = self.store.document().persist(catalog) {
                if let Err(err) = fs::remove_dir_all(&live_assets) {
                    tracing::warn!("failed to drop staged assets during rollback: {err}");
                }
                if had_live {
                    restore(&retired, &live_assets);
                }
                return Err(e);
            }
        }

        if had_live {
            if let Err(e) = fs::remove_dir_all(&retired) {
                tracing::warn!(path = %retired.display(), "failed to remove retired assets: {e}");
            }
        }
        Ok(())
    }
}

fn restore(retired: &Path, live: &Path) {
    if let Err(e) = fs::rename(retired, live) {
        tracing::error!(
            retired = %retired.display(),
            "failed to restore asset directory after aborted import: {e}"
        );
    }
}

/// Every image referenced by the catalog must be among the staged assets.
fn check_references(catalog: &Catalog, staged_assets: &Path) -> CatalogResult<()> {
    let mut missing = BTreeSet::new();
    for asset in catalog.image_refs() {
        let present = asset
            .relative_path()
            .and_then(asset_file_name)
            .map(|name| staged_assets.join(name).is_file())
            .unwrap_or(false);
        if !present {
            missing.insert(asset.as_str());
        }
    }

    if missing.is_empty() {
        Ok(())
    } else {
        let names: Vec<&str> = missing.into_iter().collect();
        Err(CatalogError::archive(format!(
            "document references missing assets: {}",
            names.join(", ")
        )))
    }
}
