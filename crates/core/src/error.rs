//! Catalog error model.

use thiserror::Error;

/// Result type used across the catalog layers.
pub type CatalogResult<T> = Result<T, CatalogError>;

/// Level of the brand → category → product hierarchy at which a lookup failed.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Level {
    Brand,
    Category,
    Product,
}

impl Level {
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Brand => "brand",
            Level::Category => "category",
            Level::Product => "product",
        }
    }
}

impl core::fmt::Display for Level {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Catalog-level error.
///
/// `NotFound`, `Validation` and `Archive` are expected outcomes that callers
/// map to client errors. `Storage` and `Document` are infrastructure failures;
/// a mutation that hits one is aborted before the document is persisted.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// A brand, category or product was not found (first missing level).
    #[error("{0} not found")]
    NotFound(Level),

    /// Caller input failed validation (e.g. blank category name).
    #[error("validation failed: {0}")]
    Validation(String),

    /// A backup archive was malformed, failed the schema check or tried to
    /// escape the extraction roots.
    #[error("invalid archive: {0}")]
    Archive(String),

    /// Asset or document I/O failed.
    #[error("storage error: {context}: {source}")]
    Storage {
        context: String,
        #[source]
        source: std::io::Error,
    },

    /// The persisted document could not be parsed or serialized.
    #[error("document error: {0}")]
    Document(#[from] serde_json::Error),
}

impl CatalogError {
    pub fn not_found(level: Level) -> Self {
        Self::NotFound(level)
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn archive(msg: impl Into<String>) -> Self {
        Self::Archive(msg.into())
    }

    pub fn storage(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Storage {
            context: context.into(),
            source,
        }
    }

    /// Lock poisoning means a writer panicked mid-mutation; surface it as a
    /// storage failure rather than panicking again.
    pub fn poisoned() -> Self {
        Self::storage(
            "catalog lock poisoned",
            std::io::Error::other("a previous mutation panicked"),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_names_the_level() {
        assert_eq!(CatalogError::not_found(Level::Brand).to_string(), "brand not found");
        assert_eq!(
            CatalogError::not_found(Level::Category).to_string(),
            "category not found"
        );
        assert_eq!(
            CatalogError::not_found(Level::Product).to_string(),
            "product not found"
        );
    }

    #[test]
    fn storage_error_keeps_context_and_source() {
        let err = CatalogError::storage(
            "write uploads/a.png",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert_eq!(err.to_string(), "storage error: write uploads/a.png: denied");
        assert!(std::error::Error::source(&err).is_some());
    }
}
