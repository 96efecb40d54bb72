//! catalog-import library - batch CSV import into the catalog store
//!
//! Pipeline: read delimited source → map field names → dedupe → rank by fame
//! → merge secondary ratings → keep top N → replace the `titles` collection.

pub mod dedupe;
pub mod error;
pub mod fame;
pub mod fields;
pub mod pipeline;
pub mod ratings;
pub mod source;

pub use error::{ImportError, Result};
pub use fame::FameStrategy;
pub use pipeline::{prepare, run_import, ImportOptions, ImportReport, PreparedImport};
