//! The catalog store handle
//!
//! One `CatalogStore` is opened at process startup and passed to whoever needs
//! the collection (the importer, the web state). Cloning is cheap: clones share
//! the same connection pool. Call [`CatalogStore::close`] on shutdown.

use super::{init, migrations};
use crate::models::{NewWork, StoredWorkRow, Work, DOC_VERSION, WORK_COLUMNS};
use crate::Result;
use serde_json::Value;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Name of the full-text index over title, authors and publisher
pub const TEXT_INDEX_NAME: &str = "titles_fts";

/// Rows per INSERT statement (15 bound values each)
const INSERT_BATCH_SIZE: usize = 500;

/// Result of a full collection replacement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplaceOutcome {
    pub deleted: u64,
    pub inserted: u64,
}

#[derive(Debug, Clone)]
pub struct CatalogStore {
    pool: SqlitePool,
    path: PathBuf,
}

impl CatalogStore {
    /// Open the catalog database.
    ///
    /// The first connection is attempted under `connect_timeout`. When it
    /// fails the store is still returned (with a warning logged) and the error
    /// surfaces on the first query. When it succeeds pending migrations run.
    pub async fn open(db_path: &Path, connect_timeout: Duration) -> Result<Self> {
        let pool = init::create_pool(db_path, connect_timeout)?;
        let store = Self {
            pool,
            path: db_path.to_path_buf(),
        };

        match tokio::time::timeout(connect_timeout, store.pool.acquire()).await {
            Ok(Ok(conn)) => {
                drop(conn);
                migrations::run_migrations(&store.pool).await?;
                info!("✓ Opened catalog store: {}", db_path.display());
            }
            Ok(Err(e)) => {
                warn!("Cannot connect to catalog store {}: {}", db_path.display(), e);
            }
            Err(_) => {
                warn!(
                    "Timed out after {}ms connecting to catalog store {}",
                    connect_timeout.as_millis(),
                    db_path.display()
                );
            }
        }

        Ok(store)
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Close all pooled connections
    pub async fn close(&self) {
        self.pool.close().await;
        debug!("Closed catalog store: {}", self.path.display());
    }

    pub async fn count_works(&self) -> Result<i64> {
        let count = sqlx::query_scalar("SELECT COUNT(*) FROM titles")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Delete every document
    pub async fn clear_works(&self) -> Result<u64> {
        let result = sqlx::query("DELETE FROM titles").execute(&self.pool).await?;
        Ok(result.rows_affected())
    }

    /// Bulk-insert works, each under a fresh identifier.
    ///
    /// Batches commit independently: a failure leaves earlier batches in place.
    pub async fn insert_works(&self, works: &[NewWork]) -> Result<u64> {
        let mut inserted = 0u64;

        for chunk in works.chunks(INSERT_BATCH_SIZE) {
            let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(
                "INSERT INTO titles (id, title, authors, isbn, year, year_num, publisher, \
                 image_small, image_medium, image_large, fame, rating, doc_version, doc, search_text) ",
            );

            builder.push_values(chunk, |mut b, work| {
                b.push_bind(Uuid::new_v4().to_string())
                    .push_bind(work.title.clone())
                    .push_bind(work.authors.clone())
                    .push_bind(work.isbn.clone())
                    .push_bind(work.year.clone())
                    .push_bind(work.year_num())
                    .push_bind(work.publisher.clone())
                    .push_bind(work.image_small.clone())
                    .push_bind(work.image_medium.clone())
                    .push_bind(work.image_large.clone())
                    .push_bind(work.fame)
                    .push_bind(work.rating)
                    .push_bind(DOC_VERSION)
                    .push_bind(work.to_document().to_string())
                    .push_bind(work.search_text());
            });

            let result = builder.build().execute(&self.pool).await?;
            inserted += result.rows_affected();
        }

        Ok(inserted)
    }

    /// Replace the whole collection: delete everything, then insert `works`.
    ///
    /// Not atomic for readers: between the delete and the last insert batch a
    /// reader sees an empty or partial collection. An empty `works` slice
    /// still clears the collection.
    pub async fn replace_works(&self, works: &[NewWork]) -> Result<ReplaceOutcome> {
        let deleted = self.clear_works().await?;
        info!("Cleared {} existing documents", deleted);

        let inserted = self.insert_works(works).await?;

        if self.has_text_index().await? {
            self.rebuild_text_index().await?;
            debug!("Rebuilt text index {}", TEXT_INDEX_NAME);
        }

        Ok(ReplaceOutcome { deleted, inserted })
    }

    /// Fetch one work by identifier
    pub async fn get_work(&self, id: &Uuid) -> Result<Option<Work>> {
        let row: Option<StoredWorkRow> =
            sqlx::query_as(&format!("SELECT {} FROM titles WHERE id = ?", WORK_COLUMNS))
                .bind(id.to_string())
                .fetch_optional(&self.pool)
                .await?;

        row.map(Work::from_stored).transpose()
    }

    /// First stored document in insertion order, with its identifier under `_id`
    pub async fn first_document(&self) -> Result<Option<Value>> {
        let row: Option<(String, String)> =
            sqlx::query_as("SELECT id, doc FROM titles ORDER BY rowid LIMIT 1")
                .fetch_optional(&self.pool)
                .await?;

        let Some((id, doc)) = row else {
            return Ok(None);
        };

        let mut doc: Value = serde_json::from_str(&doc)?;
        if let Value::Object(map) = &mut doc {
            map.insert("_id".to_string(), Value::String(id));
        }
        Ok(Some(doc))
    }

    pub async fn has_text_index(&self) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?)",
        )
        .bind(TEXT_INDEX_NAME)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    /// Create the full-text index if missing and (re)populate it.
    ///
    /// Returns the index name.
    pub async fn create_text_index(&self) -> Result<&'static str> {
        if !self.has_text_index().await? {
            // CREATE VIRTUAL TABLE has no IF NOT EXISTS on every SQLite build
            sqlx::query(
                "CREATE VIRTUAL TABLE titles_fts USING fts5(
                    title, authors, publisher,
                    content='titles', content_rowid='rowid',
                    tokenize='porter unicode61'
                )",
            )
            .execute(&self.pool)
            .await?;
            info!("Created text index {}", TEXT_INDEX_NAME);
        }

        self.rebuild_text_index().await?;
        Ok(TEXT_INDEX_NAME)
    }

    /// Re-read the content table into the index
    pub async fn rebuild_text_index(&self) -> Result<()> {
        sqlx::query("INSERT INTO titles_fts(titles_fts) VALUES('rebuild')")
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
