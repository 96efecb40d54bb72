//! Secondary ratings file
//!
//! An optional file of per-reader ratings (e.g. `User-ID;ISBN;Book-Rating`).
//! Ratings are averaged per ISBN and joined onto representatives by
//! normalized ISBN. Absence of the file is normal; a broken file only skips
//! the merge.

use crate::dedupe::normalize_isbn;
use crate::fame::parse_number;
use crate::source::{read_table, Table};
use crate::ImportError;
use catalog_common::config::SourceEncoding;
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info, warn};

/// Mean rating per normalized ISBN
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RatingMeans {
    pub isbn_column: String,
    pub rating_column: String,
    pub means: HashMap<String, f64>,
}

impl RatingMeans {
    /// Mean rating for a raw ISBN
    pub fn lookup(&self, isbn: &str) -> Option<f64> {
        normalize_isbn(isbn).and_then(|k| self.means.get(&k).copied())
    }
}

/// What happened to the secondary ratings file
#[derive(Debug, Clone, PartialEq)]
pub enum RatingsLoad {
    /// No path configured, or no file at the path
    Absent,
    /// File present but unusable; the merge is skipped
    Skipped(String),
    Loaded(RatingMeans),
}

/// Load and average a ratings file
pub fn load_ratings(path: &Path, encoding: SourceEncoding) -> RatingsLoad {
    if !path.exists() {
        debug!("No ratings file at {}, skipping merge", path.display());
        return RatingsLoad::Absent;
    }

    let table = match read_table(path, encoding) {
        Ok(t) => t,
        Err(ImportError::SourceNotFound(_)) => return RatingsLoad::Absent,
        Err(e) => {
            warn!("Skipping ratings merge: {}", e);
            return RatingsLoad::Skipped(e.to_string());
        }
    };

    match mean_ratings(&table) {
        Some(means) => {
            info!(
                "Loaded ratings file {} ({} ISBNs, columns {} / {})",
                path.display(),
                means.means.len(),
                means.isbn_column,
                means.rating_column
            );
            RatingsLoad::Loaded(means)
        }
        None => {
            let reason = format!(
                "ratings file {} has no ISBN-like and rating-like columns (columns: {:?})",
                path.display(),
                table.columns
            );
            warn!("Skipping ratings merge: {}", reason);
            RatingsLoad::Skipped(reason)
        }
    }
}

/// Average the rating column per ISBN. `None` when either column is missing.
pub fn mean_ratings(table: &Table) -> Option<RatingMeans> {
    let find = |token: &str| {
        table
            .columns
            .iter()
            .position(|c| c.to_lowercase().contains(token))
    };
    let isbn_col = find("isbn")?;
    let rating_col = find("rating")?;

    let mut sums: HashMap<String, (f64, u32)> = HashMap::new();
    for row in 0..table.rows.len() {
        let Some(isbn) = table.cell(row, isbn_col).and_then(normalize_isbn) else {
            continue;
        };
        let Some(rating) = table.cell(row, rating_col).and_then(parse_number) else {
            continue;
        };
        let entry = sums.entry(isbn).or_insert((0.0, 0));
        entry.0 += rating;
        entry.1 += 1;
    }

    let means = sums
        .into_iter()
        .map(|(isbn, (sum, count))| (isbn, sum / count as f64))
        .collect();

    Some(RatingMeans {
        isbn_column: table.columns[isbn_col].clone(),
        rating_column: table.columns[rating_col].clone(),
        means,
    })
}
