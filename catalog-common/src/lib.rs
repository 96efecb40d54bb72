//! # Catalog Common Library
//!
//! Shared code for the catalog importer and the catalog web browser:
//! - Error type used across crates
//! - Configuration loading (TOML + environment + compiled defaults)
//! - The catalog store handle (SQLite document collection, migrations, text index)
//! - Work document model and read-time normalization
//! - Rating resolution

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod rating;

pub use db::CatalogStore;
pub use error::{Error, Result};
pub use models::{NewWork, Work};
pub use rating::{RatingSource, ResolvedRating};
