//! Source column mapping
//!
//! Source headers are renamed to canonical field names; unmapped columns keep
//! their original names and are carried into the stored document.

use crate::source::Table;
use catalog_common::NewWork;
use serde_json::{Map, Value};

/// Source header → canonical field name
pub const FIELD_MAPPING: &[(&str, &str)] = &[
    ("Book-Title", "title"),
    ("Book-Author", "authors"),
    ("ISBN", "isbn"),
    ("Year-Of-Publication", "year"),
    ("Publisher", "publisher"),
    ("Image-URL-S", "image_small"),
    ("Image-URL-M", "image_medium"),
    ("Image-URL-L", "image_large"),
];

/// Canonical name for a source header (unchanged when unmapped)
pub fn canonical_name(header: &str) -> &str {
    FIELD_MAPPING
        .iter()
        .find(|(from, _)| *from == header)
        .map(|(_, to)| *to)
        .unwrap_or(header)
}

/// Rename the table's columns in place
pub fn apply_mapping(table: &mut Table) {
    for column in table.columns.iter_mut() {
        let renamed = canonical_name(column).to_string();
        *column = renamed;
    }
}

/// Column positions of the canonical fields, resolved once per table
#[derive(Debug, Clone, Default)]
pub struct FieldIndex {
    pub title: usize,
    pub authors: Option<usize>,
    pub isbn: Option<usize>,
    pub year: Option<usize>,
    pub publisher: Option<usize>,
    pub image_small: Option<usize>,
    pub image_medium: Option<usize>,
    pub image_large: Option<usize>,
    /// Every column that is not one of the above
    pub extras: Vec<usize>,
}

impl FieldIndex {
    /// Resolve canonical columns. `None` when there is no `title` column.
    pub fn resolve(table: &Table) -> Option<Self> {
        let title = table.column("title")?;
        let mut index = Self {
            title,
            authors: table.column("authors"),
            isbn: table.column("isbn"),
            year: table.column("year"),
            publisher: table.column("publisher"),
            image_small: table.column("image_small"),
            image_medium: table.column("image_medium"),
            image_large: table.column("image_large"),
            extras: Vec::new(),
        };

        let canonical: Vec<usize> = [
            Some(index.title),
            index.authors,
            index.isbn,
            index.year,
            index.publisher,
            index.image_small,
            index.image_medium,
            index.image_large,
        ]
        .into_iter()
        .flatten()
        .collect();

        index.extras = (0..table.columns.len())
            .filter(|i| !canonical.contains(i))
            .collect();

        Some(index)
    }

    /// Build a document for one row. Fame and ratings are filled in later.
    pub fn to_work(&self, table: &Table, row: usize) -> Option<NewWork> {
        let get = |col: Option<usize>| col.and_then(|c| table.cell(row, c)).map(str::to_string);

        let title = get(Some(self.title))?;

        let mut extra = Map::new();
        for &col in &self.extras {
            let value = match table.cell(row, col) {
                Some(v) => Value::String(v.to_string()),
                None => Value::Null,
            };
            // Duplicate header names: first column wins
            extra.entry(table.columns[col].clone()).or_insert(value);
        }

        Some(NewWork {
            title,
            authors: get(self.authors),
            isbn: get(self.isbn),
            year: get(self.year),
            publisher: get(self.publisher),
            image_small: get(self.image_small),
            image_medium: get(self.image_medium),
            image_large: get(self.image_large),
            extra,
            ..Default::default()
        })
    }
}
