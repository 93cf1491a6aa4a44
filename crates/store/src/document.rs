//! The persisted catalog document and atomic file writes.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use shelfkeeper_core::{Catalog, CatalogError, CatalogResult};

/// Write `bytes` to `path` via a synced temp file in the same directory,
/// renamed into place. Readers see either the old or the new content.
pub(crate) fn write_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let dir = path
        .parent()
        .ok_or_else(|| io::Error::other("target path has no parent directory"))?;
    fs::create_dir_all(dir)?;

    let mut temp = tempfile::NamedTempFile::new_in(dir)?;
    temp.write_all(bytes)?;
    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|err| err.error)?;

    #[cfg(unix)]
    {
        if let Ok(dir) = fs::File::open(dir) {
            let _ = dir.sync_all();
        }
    }
    Ok(())
}

/// JSON document holding the whole catalog (`{"brands": [...]}`).
#[derive(Debug, Clone)]
pub struct DocumentFile {
    path: PathBuf,
}

impl DocumentFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the catalog; a missing document is an empty catalog.
    pub fn load(&self) -> CatalogResult<Catalog> {
        match self.read_raw()? {
            Some(bytes) => Ok(serde_json::from_slice(&bytes)?),
            None => Ok(Catalog::default()),
        }
    }

    /// Raw document bytes, `None` if nothing was persisted yet.
    pub fn read_raw(&self) -> CatalogResult<Option<Vec<u8>>> {
        match fs::read(&self.path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(CatalogError::storage(
                format!("read {}", self.path.display()),
                e,
            )),
        }
    }

    /// Persist the full catalog.
    pub fn persist(&self, catalog: &Catalog) -> CatalogResult<()> {
        let bytes = render(catalog)?;
        write_atomic(&self.path, &bytes)
            .map_err(|e| CatalogError::storage(format!("write {}", self.path.display()), e))
    }
}

/// Canonical document serialization (pretty, two-space indent, UTF-8 kept).
pub fn render(catalog: &Catalog) -> CatalogResult<Vec<u8>> {
    let mut bytes = serde_json::to_vec_pretty(catalog)?;
    bytes.push(b'\n');
    Ok(bytes)
}
