//! Work document model
//!
//! Works are stored as rows of the `titles` table: the queryable fields live in
//! columns and the full document (including pass-through source columns and the
//! intermediate rating fields) lives in the `doc` JSON column.
//!
//! Stored rows are decoded into [`Work`] exactly once, by [`Work::from_stored`].

use crate::rating::{self, ResolvedRating};
use crate::{Error, Result};
use chrono::Utc;
use serde::Serialize;
use serde_json::{Map, Value};
use uuid::Uuid;

/// Current document generation written by the importer
pub const DOC_VERSION: i64 = 2;

/// Document key holding the rating detected in the primary source
pub const DETECTED_RATING_KEY: &str = "_rating_val";

/// Document key holding the mean rating from the secondary ratings file
pub const MERGED_RATING_KEY: &str = "rating_val";

/// Canonical document keys (everything else is a pass-through column)
pub const CANONICAL_KEYS: &[&str] = &[
    "title",
    "authors",
    "isbn",
    "year",
    "publisher",
    "image_small",
    "image_medium",
    "image_large",
    "fame",
    "rating",
    DETECTED_RATING_KEY,
    MERGED_RATING_KEY,
    "imported_at",
];

/// A Work produced by the importer, not yet stored
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewWork {
    pub title: String,
    pub authors: Option<String>,
    pub isbn: Option<String>,
    pub year: Option<String>,
    pub publisher: Option<String>,
    pub image_small: Option<String>,
    pub image_medium: Option<String>,
    pub image_large: Option<String>,
    pub fame: f64,
    pub rating: Option<f64>,
    pub detected_rating: Option<f64>,
    pub merged_rating: Option<f64>,
    /// Unmapped source columns, carried unchanged
    pub extra: Map<String, Value>,
}

impl NewWork {
    /// Year as an integer sort key
    pub fn year_num(&self) -> Option<i64> {
        self.year.as_deref().and_then(parse_year)
    }

    /// Lowercased title, authors and publisher for substring search
    pub fn search_text(&self) -> String {
        search_text(&self.title, self.authors.as_deref(), self.publisher.as_deref())
    }

    /// Build the JSON document stored in the `doc` column
    pub fn to_document(&self) -> Value {
        let mut doc = self.extra.clone();
        doc.insert("title".into(), Value::String(self.title.clone()));
        insert_opt_str(&mut doc, "authors", &self.authors);
        insert_opt_str(&mut doc, "isbn", &self.isbn);
        insert_opt_str(&mut doc, "year", &self.year);
        insert_opt_str(&mut doc, "publisher", &self.publisher);
        insert_opt_str(&mut doc, "image_small", &self.image_small);
        insert_opt_str(&mut doc, "image_medium", &self.image_medium);
        insert_opt_str(&mut doc, "image_large", &self.image_large);
        doc.insert("fame".into(), number(Some(self.fame)));
        doc.insert("rating".into(), number(self.rating));
        doc.insert(DETECTED_RATING_KEY.into(), number(self.detected_rating));
        doc.insert(MERGED_RATING_KEY.into(), number(self.merged_rating));
        doc.insert("imported_at".into(), Value::String(Utc::now().to_rfc3339()));
        Value::Object(doc)
    }
}

fn insert_opt_str(doc: &mut Map<String, Value>, key: &str, value: &Option<String>) {
    let v = match value {
        Some(s) => Value::String(s.clone()),
        None => Value::Null,
    };
    doc.insert(key.to_string(), v);
}

fn number(value: Option<f64>) -> Value {
    value
        .and_then(serde_json::Number::from_f64)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}

/// Separates fields in [`search_text`] so a match never spans two fields
pub const SEARCH_FIELD_SEPARATOR: &str = "\u{1f}";

/// Unicode-lowercased searchable fields of a work
pub fn search_text(title: &str, authors: Option<&str>, publisher: Option<&str>) -> String {
    [Some(title), authors, publisher]
        .into_iter()
        .flatten()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(SEARCH_FIELD_SEPARATOR)
}

/// Parse a publication year ("1999", " 2003 ", "1999.0")
pub fn parse_year(raw: &str) -> Option<i64> {
    let trimmed = raw.trim();
    if let Ok(n) = trimmed.parse::<i64>() {
        return Some(n);
    }
    trimmed
        .parse::<f64>()
        .ok()
        .filter(|f| f.is_finite() && f.fract() == 0.0)
        .map(|f| f as i64)
}

/// Read a JSON value as a number. Numeric strings are accepted.
pub fn numeric_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
        _ => None,
    }
}

/// One row of the `titles` table as stored
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct StoredWorkRow {
    pub id: String,
    pub title: String,
    pub authors: Option<String>,
    pub isbn: Option<String>,
    pub year: Option<String>,
    pub publisher: Option<String>,
    pub image_small: Option<String>,
    pub image_medium: Option<String>,
    pub image_large: Option<String>,
    pub fame: f64,
    pub rating: Option<f64>,
    pub doc_version: i64,
    pub doc: String,
}

/// Column list matching [`StoredWorkRow`], for SELECT statements
pub const WORK_COLUMNS: &str = "id, title, authors, isbn, year, publisher, \
     image_small, image_medium, image_large, fame, rating, doc_version, doc";

/// Same as [`WORK_COLUMNS`] but qualified with the table alias `t`
pub const WORK_COLUMNS_T: &str = "t.id, t.title, t.authors, t.isbn, t.year, t.publisher, \
     t.image_small, t.image_medium, t.image_large, t.fame, t.rating, t.doc_version, t.doc";

/// A stored Work, normalized for display
#[derive(Debug, Clone, Serialize)]
pub struct Work {
    pub id: Uuid,
    pub title: String,
    pub authors: Option<String>,
    pub isbn: Option<String>,
    pub year: Option<String>,
    pub publisher: Option<String>,
    pub image_small: Option<String>,
    pub image_medium: Option<String>,
    pub image_large: Option<String>,
    pub fame: f64,
    pub rating: ResolvedRating,
    pub doc_version: i64,
    #[serde(skip_serializing_if = "Map::is_empty")]
    pub extra: Map<String, Value>,
}

impl Work {
    /// Decode a stored row, resolving the display rating from the normalized
    /// field and the legacy intermediate fields.
    pub fn from_stored(row: StoredWorkRow) -> Result<Self> {
        let id = Uuid::parse_str(&row.id)
            .map_err(|e| Error::Internal(format!("Corrupt document id {}: {}", row.id, e)))?;

        let doc: Map<String, Value> = match serde_json::from_str::<Value>(&row.doc)? {
            Value::Object(map) => map,
            _ => Map::new(),
        };

        let legacy_detected = doc.get(DETECTED_RATING_KEY).and_then(numeric_value);
        let legacy_merged = doc.get(MERGED_RATING_KEY).and_then(numeric_value);
        let rating = rating::resolve_stored(row.rating, legacy_detected, legacy_merged);

        let extra = doc
            .into_iter()
            .filter(|(k, _)| !CANONICAL_KEYS.contains(&k.as_str()))
            .collect();

        Ok(Self {
            id,
            title: row.title,
            authors: non_empty(row.authors),
            isbn: non_empty(row.isbn),
            year: non_empty(row.year),
            publisher: non_empty(row.publisher),
            image_small: non_empty(row.image_small),
            image_medium: non_empty(row.image_medium),
            image_large: non_empty(row.image_large),
            fame: row.fame,
            rating,
            doc_version: row.doc_version,
            extra,
        })
    }

    /// At least one non-empty image URL
    pub fn has_image(&self) -> bool {
        self.image_small.is_some() || self.image_medium.is_some() || self.image_large.is_some()
    }

    /// Smallest available image, for list thumbnails
    pub fn thumbnail_url(&self) -> Option<&str> {
        self.image_small
            .as_deref()
            .or(self.image_medium.as_deref())
            .or(self.image_large.as_deref())
    }

    /// Largest available image, for the detail page
    pub fn cover_url(&self) -> Option<&str> {
        self.image_large
            .as_deref()
            .or(self.image_medium.as_deref())
            .or(self.image_small.as_deref())
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rating::RatingSource;

    fn row(rating: Option<f64>, doc: Value) -> StoredWorkRow {
        StoredWorkRow {
            id: Uuid::new_v4().to_string(),
            title: "Dune".into(),
            authors: Some("Frank Herbert".into()),
            isbn: Some("0441013597".into()),
            year: Some("1965".into()),
            publisher: Some("".into()),
            image_small: None,
            image_medium: Some("http://img/m.jpg".into()),
            image_large: None,
            fame: 3.0,
            rating,
            doc_version: DOC_VERSION,
            doc: doc.to_string(),
        }
    }

    #[test]
    fn test_search_text_folds_unicode_case() {
        let work = NewWork {
            title: "ÉMILE".to_string(),
            authors: Some("Jean-Jacques ROUSSEAU".to_string()),
            ..Default::default()
        };
        assert_eq!(work.search_text(), "émile\u{1f}jean-jacques rousseau");
        assert_eq!(search_text("Ørsted", None, Some("Gyldendal")), "ørsted\u{1f}gyldendal");
    }

    #[test]
    fn test_parse_year() {
        assert_eq!(parse_year("1999"), Some(1999));
        assert_eq!(parse_year(" 2003 "), Some(2003));
        assert_eq!(parse_year("1999.0"), Some(1999));
        assert_eq!(parse_year("DK Publishing Inc"), None);
        assert_eq!(parse_year(""), None);
    }

    #[test]
    fn test_numeric_value_accepts_strings() {
        assert_eq!(numeric_value(&serde_json::json!(4.5)), Some(4.5));
        assert_eq!(numeric_value(&serde_json::json!("7")), Some(7.0));
        assert_eq!(numeric_value(&serde_json::json!("seven")), None);
        assert_eq!(numeric_value(&Value::Null), None);
    }

    #[test]
    fn test_from_stored_prefers_normalized_rating() {
        let work = Work::from_stored(row(
            Some(8.0),
            serde_json::json!({"title": "Dune", "_rating_val": 5.0}),
        ))
        .unwrap();
        assert_eq!(work.rating.value, Some(8.0));
        assert_eq!(work.rating.source, RatingSource::Normalized);
    }

    #[test]
    fn test_from_stored_legacy_fallback() {
        let work = Work::from_stored(row(
            None,
            serde_json::json!({"title": "Dune", "rating_val": "6.5", "Shelf": "B2"}),
        ))
        .unwrap();
        assert_eq!(work.rating.value, Some(6.5));
        assert_eq!(work.rating.source, RatingSource::LegacyMerged);
        assert_eq!(work.extra.get("Shelf"), Some(&serde_json::json!("B2")));
        assert!(work.extra.get("title").is_none());
    }

    #[test]
    fn test_empty_strings_become_none() {
        let work = Work::from_stored(row(None, serde_json::json!({}))).unwrap();
        assert!(work.publisher.is_none());
        assert!(work.has_image());
        assert_eq!(work.thumbnail_url(), Some("http://img/m.jpg"));
        assert_eq!(work.cover_url(), Some("http://img/m.jpg"));
    }

    #[test]
    fn test_document_contains_pass_through_columns() {
        let mut extra = Map::new();
        extra.insert("Shelf".into(), Value::String("B2".into()));
        let work = NewWork {
            title: "Dune".into(),
            fame: 2.0,
            detected_rating: Some(9.0),
            rating: Some(9.0),
            extra,
            ..Default::default()
        };

        let doc = work.to_document();
        assert_eq!(doc["title"], "Dune");
        assert_eq!(doc["Shelf"], "B2");
        assert_eq!(doc["fame"], 2.0);
        assert_eq!(doc["_rating_val"], 9.0);
        assert!(doc["rating_val"].is_null());
        assert!(doc["authors"].is_null());
    }
}
