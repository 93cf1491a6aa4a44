//! Image files referenced by products.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use shelfkeeper_core::{AssetRef, CatalogError, CatalogResult};
use walkdir::WalkDir;

use crate::document::write_atomic;
use crate::paths::{MAX_FILE_NAME_BYTES, asset_file_name};

/// An uploaded image as received from the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetUpload {
    /// Client-supplied file name; sanitized before use.
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl AssetUpload {
    pub fn new(file_name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes: bytes.into(),
        }
    }
}

/// Reduce a client file name to a safe single path segment.
///
/// Keeps the last path component, collapses whitespace to `_`, drops anything
/// outside `[A-Za-z0-9._-]` and strips leading dots/underscores. Falls back to
/// `upload` when nothing survives. Overlong names lose the end of their stem,
/// never their extension.
pub fn sanitize_file_name(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or_default();

    let mut out = String::with_capacity(base.len());
    for word in base.split_whitespace() {
        if !out.is_empty() {
            out.push('_');
        }
        out.extend(
            word.chars()
                .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-')),
        );
    }

    let trimmed = out.trim_start_matches(['.', '_']);
    if trimmed.is_empty() {
        "upload".to_string()
    } else {
        truncate_keeping_extension(trimmed, MAX_FILE_NAME_BYTES)
    }
}

/// `name` is ASCII here, so any byte index is a char boundary.
fn truncate_keeping_extension(name: &str, max: usize) -> String {
    if name.len() <= max {
        return name.to_string();
    }
    let ext = match name.rfind('.') {
        Some(dot) if dot > 0 && name.len() - dot <= max / 2 => &name[dot..],
        _ => "",
    };
    format!("{}{ext}", &name[..max - ext.len()])
}

/// Owns the files under the asset root.
#[derive(Debug, Clone)]
pub struct AssetManager {
    root: PathBuf,
}

impl AssetManager {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn ensure_root(&self) -> CatalogResult<()> {
        fs::create_dir_all(&self.root)
            .map_err(|e| CatalogError::storage(format!("create {}", self.root.display()), e))
    }

    /// Absolute path of a referenced asset. Malformed or escaping references
    /// are a validation error.
    pub fn resolve(&self, asset: &AssetRef) -> CatalogResult<PathBuf> {
        asset
            .relative_path()
            .and_then(asset_file_name)
            .map(|name| self.root.join(name))
            .ok_or_else(|| CatalogError::validation(format!("malformed asset reference '{asset}'")))
    }

    /// Write `bytes` under a sanitized form of `suggested_name`.
    ///
    /// An existing file with the same name is replaced. The bytes are synced
    /// before this returns, so the reference may be persisted right away.
    pub fn store(&self, bytes: &[u8], suggested_name: &str) -> CatalogResult<AssetRef> {
        let file_name = sanitize_file_name(suggested_name);
        let path = self.root.join(&file_name);

        if path.exists() {
            tracing::warn!(file = %file_name, "asset name collision; overwriting");
        }

        write_atomic(&path, bytes)
            .map_err(|e| CatalogError::storage(format!("write asset {file_name}"), e))?;

        tracing::debug!(file = %file_name, len = bytes.len(), "asset stored");
        Ok(AssetRef::for_file(&file_name))
    }

    /// Remove an asset. Absent files and malformed references are not errors.
    pub fn delete(&self, asset: &AssetRef) -> CatalogResult<()> {
        let path = match self.resolve(asset) {
            Ok(p) => p,
            Err(_) => {
                tracing::warn!(asset = %asset, "skipping delete of malformed asset reference");
                return Ok(());
            }
        };

        match fs::remove_file(&path) {
            Ok(()) => {
                tracing::debug!(asset = %asset, "asset deleted");
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(CatalogError::storage(format!("delete asset {asset}"), e)),
        }
    }

    pub fn exists(&self, asset: &AssetRef) -> bool {
        self.resolve(asset).map(|p| p.is_file()).unwrap_or(false)
    }

    /// Bytes of a stored asset, `None` if it does not exist.
    pub fn read(&self, asset: &AssetRef) -> CatalogResult<Option<Vec<u8>>> {
        let path = self.resolve(asset)?;
        match fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(CatalogError::storage(format!("read asset {asset}"), e)),
        }
    }

    /// All asset files as (file name, absolute path), sorted by name. Only
    /// names a reference may point at are listed; hidden files (temp files of
    /// in-flight writes) and subdirectories are skipped.
    pub fn list(&self) -> CatalogResult<Vec<(String, PathBuf)>> {
        if !self.root.exists() {
            return Ok(Vec::new());
        }

        let mut out = Vec::new();
        for entry in WalkDir::new(&self.root).min_depth(1).max_depth(1).sort_by_file_name() {
            let entry = entry.map_err(|e| {
                CatalogError::storage(format!("walk {}", self.root.display()), io::Error::other(e))
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            let Some(name) = entry.file_name().to_str().and_then(asset_file_name).map(str::to_string) else {
                continue;
            };
            out.push((name, entry.into_path()));
        }
        Ok(out)
    }
}
