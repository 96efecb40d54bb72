//! Catalog store tests: open, replace, text index, lookups

use catalog_common::{CatalogStore, NewWork};
use std::time::Duration;
use tempfile::TempDir;
use uuid::Uuid;

async fn open_store(dir: &TempDir) -> CatalogStore {
    CatalogStore::open(&dir.path().join("catalog.db"), Duration::from_millis(2000))
        .await
        .expect("Should open store")
}

fn work(title: &str, fame: f64) -> NewWork {
    NewWork {
        title: title.to_string(),
        authors: Some("Some Author".to_string()),
        year: Some("2001".to_string()),
        fame,
        ..Default::default()
    }
}

#[tokio::test]
async fn test_open_creates_empty_collection() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir).await;

    assert_eq!(store.count_works().await.unwrap(), 0);
    assert!(store.first_document().await.unwrap().is_none());
    assert!(!store.has_text_index().await.unwrap());

    store.close().await;
}

#[tokio::test]
async fn test_replace_clears_previous_documents() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir).await;

    let first = store
        .replace_works(&[work("A", 3.0), work("B", 2.0)])
        .await
        .unwrap();
    assert_eq!(first.deleted, 0);
    assert_eq!(first.inserted, 2);

    let second = store.replace_works(&[work("C", 1.0)]).await.unwrap();
    assert_eq!(second.deleted, 2);
    assert_eq!(second.inserted, 1);
    assert_eq!(store.count_works().await.unwrap(), 1);

    // An empty replacement still clears the collection
    let third = store.replace_works(&[]).await.unwrap();
    assert_eq!(third.deleted, 1);
    assert_eq!(store.count_works().await.unwrap(), 0);
}

#[tokio::test]
async fn test_insert_spans_multiple_batches() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir).await;

    let works: Vec<NewWork> = (0..1203).map(|i| work(&format!("T{i}"), i as f64)).collect();
    let outcome = store.replace_works(&works).await.unwrap();

    assert_eq!(outcome.inserted, 1203);
    assert_eq!(store.count_works().await.unwrap(), 1203);
}

#[tokio::test]
async fn test_first_document_includes_id_and_fields() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir).await;

    store.replace_works(&[work("Dune", 4.0)]).await.unwrap();

    let doc = store.first_document().await.unwrap().unwrap();
    assert_eq!(doc["title"], "Dune");
    assert_eq!(doc["fame"], 4.0);
    assert!(doc["_id"].is_string());
    assert!(doc["imported_at"].is_string());
}

#[tokio::test]
async fn test_get_work_by_id() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir).await;

    let mut dune = work("Dune", 4.0);
    dune.rating = Some(8.5);
    dune.detected_rating = Some(8.5);
    store.replace_works(&[dune]).await.unwrap();

    let doc = store.first_document().await.unwrap().unwrap();
    let id = Uuid::parse_str(doc["_id"].as_str().unwrap()).unwrap();

    let found = store.get_work(&id).await.unwrap().expect("Work should exist");
    assert_eq!(found.title, "Dune");
    assert_eq!(found.rating.value, Some(8.5));

    assert!(store.get_work(&Uuid::new_v4()).await.unwrap().is_none());
}

#[tokio::test]
async fn test_text_index_create_is_idempotent() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir).await;
    store.replace_works(&[work("Dune", 1.0)]).await.unwrap();

    assert_eq!(store.create_text_index().await.unwrap(), "titles_fts");
    assert_eq!(store.create_text_index().await.unwrap(), "titles_fts");
    assert!(store.has_text_index().await.unwrap());

    let hits: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM titles_fts WHERE titles_fts MATCH 'dune'")
            .fetch_one(store.pool())
            .await
            .unwrap();
    assert_eq!(hits, 1);

    // Replacing the collection keeps the index in step
    store.replace_works(&[work("Emma", 1.0)]).await.unwrap();
    let hits: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM titles_fts WHERE titles_fts MATCH 'emma'")
            .fetch_one(store.pool())
            .await
            .unwrap();
    assert_eq!(hits, 1);
}

#[tokio::test]
async fn test_reopen_existing_database() {
    let dir = TempDir::new().unwrap();
    {
        let store = open_store(&dir).await;
        store.replace_works(&[work("Dune", 1.0)]).await.unwrap();
        store.close().await;
    }

    let store = open_store(&dir).await;
    assert_eq!(store.count_works().await.unwrap(), 1);
}
