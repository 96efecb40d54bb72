//! Import pipeline
//!
//! [`prepare`] does all the work that does not touch the store (read, map,
//! dedupe, rank, merge, truncate). [`run_import`] then replaces the
//! collection with the prepared works.

use crate::dedupe::dedupe_key;
use crate::fame::{self, Candidate, FameStrategy, UNKNOWN_YEAR};
use crate::fields::{apply_mapping, FieldIndex};
use crate::ratings::{load_ratings, RatingsLoad};
use crate::source::read_table;
use crate::{ImportError, Result};
use catalog_common::config::{CatalogConfig, SourceEncoding};
use catalog_common::models::parse_year;
use catalog_common::rating::resolve_import;
use catalog_common::{CatalogStore, NewWork};
use serde::Serialize;
use std::path::PathBuf;
use tracing::info;

/// Inputs of one import run
#[derive(Debug, Clone, PartialEq)]
pub struct ImportOptions {
    pub source_path: PathBuf,
    /// Secondary ratings file; `None` disables the merge
    pub ratings_path: Option<PathBuf>,
    /// Maximum number of works kept
    pub top_n: usize,
    pub encoding: SourceEncoding,
}

impl ImportOptions {
    pub fn from_config(config: &CatalogConfig) -> Self {
        Self {
            source_path: config.source_path.clone(),
            ratings_path: Some(config.ratings_path.clone()),
            top_n: config.top_n,
            encoding: config.encoding,
        }
    }
}

/// Ratings file outcome, as reported
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RatingsFileStatus {
    Absent,
    Skipped,
    Merged,
}

/// Summary of an import run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImportReport {
    pub rows_read: usize,
    pub rows_skipped: usize,
    pub rows_without_title: usize,
    pub unique_works: usize,
    pub works_kept: usize,
    pub fame: FameStrategy,
    pub ratings_file: RatingsFileStatus,
    /// Kept works that received a rating from the ratings file
    pub merged_matches: usize,
    /// Kept works with a final rating
    pub rated_works: usize,
    pub deleted: u64,
    pub inserted: u64,
}

/// Works ready to be written, with the report so far
#[derive(Debug, Clone)]
pub struct PreparedImport {
    pub works: Vec<NewWork>,
    pub report: ImportReport,
}

/// Read, dedupe, rank, merge and truncate. Nothing is written.
pub fn prepare(options: &ImportOptions) -> Result<PreparedImport> {
    info!("Reading source {}", options.source_path.display());
    let mut table = read_table(&options.source_path, options.encoding)?;
    info!(
        "Columns found: {:?} ({} rows, {} skipped)",
        table.columns,
        table.rows.len(),
        table.skipped
    );

    apply_mapping(&mut table);
    info!("Columns after mapping: {:?}", table.columns);

    let index = FieldIndex::resolve(&table).ok_or_else(|| ImportError::MissingTitleColumn {
        columns: table.columns.clone(),
    })?;

    let rating_column = fame::detect_rating_column(&table);
    let strategy = match rating_column {
        Some(col) => FameStrategy::RatingColumn {
            column: table.columns[col].clone(),
        },
        None => FameStrategy::OccurrenceCount,
    };
    info!("Fame strategy: {:?}", strategy);

    // Rows without a title never become works
    let mut works: Vec<NewWork> = Vec::with_capacity(table.rows.len());
    let mut candidates: Vec<Candidate> = Vec::with_capacity(table.rows.len());
    for row in 0..table.rows.len() {
        let Some(work) = index.to_work(&table, row) else {
            continue;
        };

        candidates.push(Candidate {
            key: dedupe_key(work.isbn.as_deref(), Some(work.title.as_str()), work.authors.as_deref()),
            rating: rating_column
                .and_then(|col| table.cell(row, col))
                .and_then(fame::parse_number),
            year: work.year.as_deref().and_then(parse_year).unwrap_or(UNKNOWN_YEAR),
        });
        works.push(work);
    }
    let rows_without_title = table.rows.len() - works.len();

    let mut ranked = match strategy {
        FameStrategy::RatingColumn { .. } => fame::rank_by_rating(&candidates),
        FameStrategy::OccurrenceCount => fame::rank_by_occurrence(&candidates),
    };
    let unique_works = ranked.len();
    info!(
        "{} titled rows deduplicated to {} works",
        candidates.len(),
        unique_works
    );

    fame::sort_by_fame(&mut ranked);
    ranked.truncate(options.top_n);

    let ratings = match &options.ratings_path {
        Some(path) => load_ratings(path, options.encoding),
        None => RatingsLoad::Absent,
    };
    let ratings_file = match &ratings {
        RatingsLoad::Absent => RatingsFileStatus::Absent,
        RatingsLoad::Skipped(_) => RatingsFileStatus::Skipped,
        RatingsLoad::Loaded(_) => RatingsFileStatus::Merged,
    };

    let mut merged_matches = 0;
    let mut rated_works = 0;
    let kept: Vec<NewWork> = ranked
        .into_iter()
        .map(|r| {
            let mut work = std::mem::take(&mut works[r.index]);
            work.fame = r.fame;
            work.detected_rating = r.detected_rating;
            if let RatingsLoad::Loaded(means) = &ratings {
                work.merged_rating = work.isbn.as_deref().and_then(|isbn| means.lookup(isbn));
            }
            if work.merged_rating.is_some() {
                merged_matches += 1;
            }

            work.rating = resolve_import(work.detected_rating, work.merged_rating).value;
            if work.rating.is_some() {
                rated_works += 1;
            }
            work
        })
        .collect();

    let report = ImportReport {
        rows_read: table.rows.len(),
        rows_skipped: table.skipped,
        rows_without_title,
        unique_works,
        works_kept: kept.len(),
        fame: strategy,
        ratings_file,
        merged_matches,
        rated_works,
        deleted: 0,
        inserted: 0,
    };

    Ok(PreparedImport {
        works: kept,
        report,
    })
}

/// Prepare and replace the collection
pub async fn run_import(store: &CatalogStore, options: &ImportOptions) -> Result<ImportReport> {
    let PreparedImport { works, mut report } = prepare(options)?;

    info!("Replacing catalog with {} works", works.len());
    let outcome = store.replace_works(&works).await?;
    report.deleted = outcome.deleted;
    report.inserted = outcome.inserted;

    info!("✓ Imported {} works", outcome.inserted);
    Ok(report)
}
