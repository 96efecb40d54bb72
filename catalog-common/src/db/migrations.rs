//! Database schema migrations
//!
//! Versioned, idempotent migrations tracked in the `schema_version` table.
//!
//! - v1: `titles` collection (first document generation: no normalized rating)
//! - v2: `rating` and `doc_version` columns; legacy documents get their rating
//!   resolved from `_rating_val` / `rating_val` and are stamped generation 2
//! - v3: `search_text` column (Unicode-lowercased title, authors, publisher)
//!
//! Never modify an existing migration; add a new one instead.

use crate::models::{
    numeric_value, search_text, DETECTED_RATING_KEY, DOC_VERSION, MERGED_RATING_KEY,
};
use crate::rating;
use crate::Result;
use serde_json::Value;
use sqlx::SqlitePool;
use tracing::{info, warn};

/// Current schema version
///
/// **IMPORTANT:** Increment this when adding new migrations
const CURRENT_SCHEMA_VERSION: i32 = 3;

async fn create_schema_version_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER NOT NULL,
            applied_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;
    Ok(())
}

/// Get current schema version from database (0 when nothing applied yet)
async fn get_schema_version(pool: &SqlitePool) -> Result<i32> {
    let version: Option<i32> =
        sqlx::query_scalar("SELECT version FROM schema_version ORDER BY version DESC LIMIT 1")
            .fetch_optional(pool)
            .await?;

    Ok(version.unwrap_or(0))
}

async fn set_schema_version(pool: &SqlitePool, version: i32) -> Result<()> {
    sqlx::query("INSERT INTO schema_version (version) VALUES (?)")
        .bind(version)
        .execute(pool)
        .await?;
    Ok(())
}

/// Run all pending migrations
pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    create_schema_version_table(pool).await?;
    let current_version = get_schema_version(pool).await?;

    if current_version == CURRENT_SCHEMA_VERSION {
        info!("Database schema is up to date (v{})", current_version);
        return Ok(());
    }

    if current_version > CURRENT_SCHEMA_VERSION {
        warn!(
            "Database schema version ({}) is newer than code version ({})",
            current_version, CURRENT_SCHEMA_VERSION
        );
        return Ok(());
    }

    info!(
        "Running database migrations: v{} -> v{}",
        current_version, CURRENT_SCHEMA_VERSION
    );

    if current_version < 1 {
        migrate_v1(pool).await?;
        set_schema_version(pool, 1).await?;
        info!("✓ Migration v1 completed");
    }

    if current_version < 2 {
        migrate_v2(pool).await?;
        set_schema_version(pool, 2).await?;
        info!("✓ Migration v2 completed");
    }

    if current_version < 3 {
        migrate_v3(pool).await?;
        set_schema_version(pool, 3).await?;
        info!("✓ Migration v3 completed");
    }

    Ok(())
}

/// v1: the `titles` document collection
async fn migrate_v1(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS titles (
            id TEXT PRIMARY KEY,
            title TEXT NOT NULL,
            authors TEXT,
            isbn TEXT,
            year TEXT,
            year_num INTEGER,
            publisher TEXT,
            image_small TEXT,
            image_medium TEXT,
            image_large TEXT,
            fame REAL NOT NULL DEFAULT 0,
            doc TEXT NOT NULL DEFAULT '{}'
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_titles_year_title ON titles(year_num DESC, title)")
        .execute(pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_titles_title ON titles(title)")
        .execute(pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_titles_fame ON titles(fame DESC)")
        .execute(pool)
        .await?;

    Ok(())
}

/// v3: case-folded search column, backfilled for existing documents
async fn migrate_v3(pool: &SqlitePool) -> Result<()> {
    if !has_column(pool, "titles", "search_text").await? {
        sqlx::query("ALTER TABLE titles ADD COLUMN search_text TEXT")
            .execute(pool)
            .await?;
        info!("Migration v3: Added search_text to titles table");
    }

    let rows: Vec<(String, String, Option<String>, Option<String>)> = sqlx::query_as(
        "SELECT id, title, authors, publisher FROM titles WHERE search_text IS NULL",
    )
    .fetch_all(pool)
    .await?;

    let mut tx = pool.begin().await?;
    for (id, title, authors, publisher) in &rows {
        sqlx::query("UPDATE titles SET search_text = ? WHERE id = ?")
            .bind(search_text(title, authors.as_deref(), publisher.as_deref()))
            .bind(id)
            .execute(&mut *tx)
            .await?;
    }
    tx.commit().await?;

    if !rows.is_empty() {
        info!("Migration v3: Backfilled search text for {} documents", rows.len());
    }
    Ok(())
}

async fn has_column(pool: &SqlitePool, table: &str, column: &str) -> Result<bool> {
    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM pragma_table_info(?) WHERE name = ?")
            .bind(table)
            .bind(column)
            .fetch_one(pool)
            .await?;
    Ok(count > 0)
}

/// v2: normalized rating column and document generation stamp
async fn migrate_v2(pool: &SqlitePool) -> Result<()> {
    if !has_column(pool, "titles", "rating").await? {
        sqlx::query("ALTER TABLE titles ADD COLUMN rating REAL")
            .execute(pool)
            .await?;
        info!("Migration v2: Added rating to titles table");
    }

    if !has_column(pool, "titles", "doc_version").await? {
        sqlx::query("ALTER TABLE titles ADD COLUMN doc_version INTEGER NOT NULL DEFAULT 1")
            .execute(pool)
            .await?;
        info!("Migration v2: Added doc_version to titles table");
    }

    let normalized = normalize_legacy_documents(pool).await?;
    if normalized > 0 {
        info!("Migration v2: Normalized {} legacy documents", normalized);
    }

    Ok(())
}

/// Resolve the rating of every pre-v2 document and stamp it with the current generation
async fn normalize_legacy_documents(pool: &SqlitePool) -> Result<u64> {
    let rows: Vec<(String, Option<f64>, String)> =
        sqlx::query_as("SELECT id, rating, doc FROM titles WHERE doc_version < ?")
            .bind(DOC_VERSION)
            .fetch_all(pool)
            .await?;

    let mut tx = pool.begin().await?;
    let mut updated = 0u64;

    for (id, rating, doc) in rows {
        let doc: Value = serde_json::from_str(&doc).unwrap_or(Value::Null);
        let legacy_detected = doc.get(DETECTED_RATING_KEY).and_then(numeric_value);
        let legacy_merged = doc.get(MERGED_RATING_KEY).and_then(numeric_value);
        let resolved = rating::resolve_stored(rating, legacy_detected, legacy_merged);

        sqlx::query("UPDATE titles SET rating = ?, doc_version = ? WHERE id = ?")
            .bind(resolved.value)
            .bind(DOC_VERSION)
            .bind(&id)
            .execute(&mut *tx)
            .await?;
        updated += 1;
    }

    tx.commit().await?;
    Ok(updated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;
    use tempfile::TempDir;

    async fn pool_in(dir: &TempDir) -> SqlitePool {
        let url = format!("sqlite://{}?mode=rwc", dir.path().join("m.db").display());
        SqlitePoolOptions::new()
            .max_connections(1)
            .connect(&url)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_migrations_are_idempotent() {
        let dir = TempDir::new().unwrap();
        let pool = pool_in(&dir).await;

        run_migrations(&pool).await.unwrap();
        run_migrations(&pool).await.unwrap();

        assert_eq!(get_schema_version(&pool).await.unwrap(), CURRENT_SCHEMA_VERSION);
        assert!(has_column(&pool, "titles", "rating").await.unwrap());
        assert!(has_column(&pool, "titles", "doc_version").await.unwrap());
        assert!(has_column(&pool, "titles", "search_text").await.unwrap());
    }

    #[tokio::test]
    async fn test_v3_backfills_search_text() {
        let dir = TempDir::new().unwrap();
        let pool = pool_in(&dir).await;

        create_schema_version_table(&pool).await.unwrap();
        migrate_v1(&pool).await.unwrap();
        set_schema_version(&pool, 1).await.unwrap();
        migrate_v2(&pool).await.unwrap();
        set_schema_version(&pool, 2).await.unwrap();

        sqlx::query(
            "INSERT INTO titles (id, title, authors, publisher, fame, doc)
             VALUES ('a', 'ÉMILE', 'Jean-Jacques Rousseau', NULL, 1, '{}')",
        )
        .execute(&pool)
        .await
        .unwrap();

        run_migrations(&pool).await.unwrap();

        let text: Option<String> = sqlx::query_scalar("SELECT search_text FROM titles WHERE id = 'a'")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(text.as_deref(), Some("émile\u{1f}jean-jacques rousseau"));
    }

    #[tokio::test]
    async fn test_v2_normalizes_legacy_documents() {
        let dir = TempDir::new().unwrap();
        let pool = pool_in(&dir).await;

        // A database written by a v1-era import
        create_schema_version_table(&pool).await.unwrap();
        migrate_v1(&pool).await.unwrap();
        set_schema_version(&pool, 1).await.unwrap();

        for (id, doc) in [
            ("a", r#"{"title":"A","_rating_val":7.0,"rating_val":3.0}"#),
            ("b", r#"{"title":"B","rating_val":"4.5"}"#),
            ("c", r#"{"title":"C"}"#),
        ] {
            sqlx::query("INSERT INTO titles (id, title, fame, doc) VALUES (?, ?, 1, ?)")
                .bind(id)
                .bind(id.to_uppercase())
                .bind(doc)
                .execute(&pool)
                .await
                .unwrap();
        }

        run_migrations(&pool).await.unwrap();

        let rows: Vec<(String, Option<f64>, i64)> =
            sqlx::query_as("SELECT id, rating, doc_version FROM titles ORDER BY id")
                .fetch_all(&pool)
                .await
                .unwrap();

        assert_eq!(rows[0], ("a".to_string(), Some(7.0), DOC_VERSION));
        assert_eq!(rows[1], ("b".to_string(), Some(4.5), DOC_VERSION));
        assert_eq!(rows[2], ("c".to_string(), None, DOC_VERSION));
    }
}
