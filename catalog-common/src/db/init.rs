//! Connection pool creation
//!
//! The pool is created lazily so that an unreachable database never blocks
//! startup: the store checks the first connection under a fixed timeout and
//! only logs a warning when it fails, leaving the real error to the first query.

use crate::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use std::path::Path;
use std::time::Duration;

/// Busy timeout applied to every connection
const BUSY_TIMEOUT: Duration = Duration::from_millis(5000);

/// Maximum pooled connections
const MAX_CONNECTIONS: u32 = 5;

/// Build a lazily-connecting pool for the catalog database
pub fn create_pool(db_path: &Path, connect_timeout: Duration) -> Result<SqlitePool> {
    // Create parent directory if it doesn't exist
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    // WAL lets the web browser keep reading while an import rewrites the collection
    let options = SqliteConnectOptions::new()
        .filename(db_path)
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Normal)
        .busy_timeout(BUSY_TIMEOUT);

    let pool = SqlitePoolOptions::new()
        .max_connections(MAX_CONNECTIONS)
        .acquire_timeout(connect_timeout)
        .connect_lazy_with(options);

    Ok(pool)
}
