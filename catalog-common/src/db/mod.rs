//! Catalog store: SQLite-backed document collection

pub mod init;
pub mod migrations;
mod store;

pub use migrations::run_migrations;
pub use store::{CatalogStore, ReplaceOutcome, TEXT_INDEX_NAME};
