//! Rating resolution
//!
//! A Work can carry a rating from several places: the rating column detected
//! during import, the mean from the secondary ratings file, and (for documents
//! written by older imports) the intermediate `_rating_val` / `rating_val`
//! fields. Resolution walks an ordered candidate list and reports which
//! candidate supplied the value.

use serde::{Deserialize, Serialize};

/// Where a resolved rating came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RatingSource {
    /// Rating column detected in the primary source during import
    Detected,
    /// Mean rating from the secondary ratings file
    Merged,
    /// Normalized `rating` field of a stored document
    Normalized,
    /// `_rating_val` field of a stored document
    LegacyDetected,
    /// `rating_val` field of a stored document
    LegacyMerged,
    /// No candidate had a value
    None,
}

impl RatingSource {
    pub fn label(&self) -> &'static str {
        match self {
            RatingSource::Detected => "source rating column",
            RatingSource::Merged => "ratings file",
            RatingSource::Normalized => "catalog",
            RatingSource::LegacyDetected => "legacy rating",
            RatingSource::LegacyMerged => "legacy merged rating",
            RatingSource::None => "unrated",
        }
    }
}

/// Result of rating resolution
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ResolvedRating {
    pub value: Option<f64>,
    pub source: RatingSource,
}

impl ResolvedRating {
    pub const UNRATED: ResolvedRating = ResolvedRating {
        value: None,
        source: RatingSource::None,
    };
}

/// Return the first candidate holding a finite value
pub fn resolve(candidates: &[(RatingSource, Option<f64>)]) -> ResolvedRating {
    candidates
        .iter()
        .find_map(|(source, value)| {
            value.filter(|v| v.is_finite()).map(|v| ResolvedRating {
                value: Some(v),
                source: *source,
            })
        })
        .unwrap_or(ResolvedRating::UNRATED)
}

/// Import-time preference: detected rating, then merged rating
pub fn resolve_import(detected: Option<f64>, merged: Option<f64>) -> ResolvedRating {
    resolve(&[
        (RatingSource::Detected, detected),
        (RatingSource::Merged, merged),
    ])
}

/// Read-time preference: normalized `rating`, then `_rating_val`, then `rating_val`
pub fn resolve_stored(
    rating: Option<f64>,
    legacy_detected: Option<f64>,
    legacy_merged: Option<f64>,
) -> ResolvedRating {
    resolve(&[
        (RatingSource::Normalized, rating),
        (RatingSource::LegacyDetected, legacy_detected),
        (RatingSource::LegacyMerged, legacy_merged),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detected_preferred_over_merged() {
        let r = resolve_import(Some(4.0), Some(7.5));
        assert_eq!(r.value, Some(4.0));
        assert_eq!(r.source, RatingSource::Detected);
    }

    #[test]
    fn test_merged_used_when_detected_missing() {
        let r = resolve_import(None, Some(7.5));
        assert_eq!(r.value, Some(7.5));
        assert_eq!(r.source, RatingSource::Merged);
    }

    #[test]
    fn test_nothing_resolves_to_unrated() {
        assert_eq!(resolve_import(None, None), ResolvedRating::UNRATED);
    }

    #[test]
    fn test_nan_is_skipped() {
        let r = resolve_stored(Some(f64::NAN), None, Some(3.0));
        assert_eq!(r.value, Some(3.0));
        assert_eq!(r.source, RatingSource::LegacyMerged);
    }

    #[test]
    fn test_stored_order() {
        let r = resolve_stored(None, Some(2.0), Some(3.0));
        assert_eq!(r.source, RatingSource::LegacyDetected);

        let r = resolve_stored(Some(1.0), Some(2.0), Some(3.0));
        assert_eq!(r.source, RatingSource::Normalized);
    }
}
