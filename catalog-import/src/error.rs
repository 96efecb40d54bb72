//! Error types for catalog-import

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ImportError>;

#[derive(Debug, Error)]
pub enum ImportError {
    /// Primary source file does not exist
    #[error("Source file not found: {0}")]
    SourceNotFound(PathBuf),

    /// Source file could not be read
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// No `title` column after field mapping; nothing is written
    #[error("No title column found after mapping (columns: {columns:?})")]
    MissingTitleColumn { columns: Vec<String> },

    /// Catalog store failure
    #[error(transparent)]
    Store(#[from] catalog_common::Error),
}
