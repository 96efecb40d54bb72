//! Fame scoring
//!
//! One strategy is chosen per import run:
//! - a numeric rating column exists: each work is represented by its best-rated
//!   row (ties go to the latest year) and fame is that rating
//! - otherwise: fame is the number of rows sharing the dedupe key and the first
//!   row seen represents the work

use crate::source::Table;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::HashMap;

/// Column-name fragments that suggest a rating or popularity signal
pub const RATING_TOKENS: &[&str] = &["rating", "avg", "average", "num_ratings", "ratings_count"];

/// Non-null values sampled when testing a candidate column
pub const SAMPLE_SIZE: usize = 10;

/// Year used for rows whose year is not numeric
pub const UNKNOWN_YEAR: i64 = -9999;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum FameStrategy {
    RatingColumn { column: String },
    OccurrenceCount,
}

/// Parse a numeric cell
pub fn parse_number(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|f| f.is_finite())
}

/// First column whose name contains a rating token and whose first
/// [`SAMPLE_SIZE`] non-null values are all numeric
pub fn detect_rating_column(table: &Table) -> Option<usize> {
    table.columns.iter().enumerate().find_map(|(idx, name)| {
        let lower = name.to_lowercase();
        if !RATING_TOKENS.iter().any(|t| lower.contains(t)) {
            return None;
        }

        let sample: Vec<&str> = table
            .rows
            .iter()
            .filter_map(|row| row.get(idx).and_then(|v| v.as_deref()))
            .take(SAMPLE_SIZE)
            .collect();

        let numeric = !sample.is_empty() && sample.iter().all(|v| parse_number(v).is_some());
        numeric.then_some(idx)
    })
}

/// Ranking input for one row
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub key: String,
    pub rating: Option<f64>,
    pub year: i64,
}

/// Representative of one dedupe group
#[derive(Debug, Clone, PartialEq)]
pub struct Ranked {
    /// Index into the candidate slice
    pub index: usize,
    pub fame: f64,
    /// Rating of the representative row (rating strategy only)
    pub detected_rating: Option<f64>,
}

/// Candidate indices grouped by key, groups in order of first appearance
fn group(candidates: &[Candidate]) -> Vec<Vec<usize>> {
    let mut positions: HashMap<&str, usize> = HashMap::new();
    let mut groups: Vec<Vec<usize>> = Vec::new();

    for (i, c) in candidates.iter().enumerate() {
        match positions.get(c.key.as_str()) {
            Some(&g) => groups[g].push(i),
            None => {
                positions.insert(c.key.as_str(), groups.len());
                groups.push(vec![i]);
            }
        }
    }

    groups
}

fn cmp_rating(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => x.total_cmp(&y),
        (Some(_), None) => Ordering::Greater,
        (None, Some(_)) => Ordering::Less,
        (None, None) => Ordering::Equal,
    }
}

/// Strictly better: higher rating, then higher year. Equal rows keep source order.
fn outranks(a: &Candidate, b: &Candidate) -> bool {
    match cmp_rating(a.rating, b.rating) {
        Ordering::Greater => true,
        Ordering::Less => false,
        Ordering::Equal => a.year > b.year,
    }
}

/// Rating strategy: best-rated row per group, fame = its rating
pub fn rank_by_rating(candidates: &[Candidate]) -> Vec<Ranked> {
    group(candidates)
        .into_iter()
        .map(|members| {
            let best = members
                .iter()
                .copied()
                .reduce(|best, i| {
                    if outranks(&candidates[i], &candidates[best]) {
                        i
                    } else {
                        best
                    }
                })
                .unwrap_or(members[0]);

            let rating = candidates[best].rating;
            Ranked {
                index: best,
                fame: rating.unwrap_or(0.0),
                detected_rating: rating,
            }
        })
        .collect()
}

/// Occurrence strategy: first row per group, fame = group size
pub fn rank_by_occurrence(candidates: &[Candidate]) -> Vec<Ranked> {
    group(candidates)
        .into_iter()
        .map(|members| Ranked {
            index: members[0],
            fame: members.len() as f64,
            detected_rating: None,
        })
        .collect()
}

/// Fame descending; equal fame keeps its current order
pub fn sort_by_fame(ranked: &mut [Ranked]) {
    ranked.sort_by(|a, b| b.fame.total_cmp(&a.fame));
}
