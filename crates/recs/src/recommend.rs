//! Query-time recommendation aggregation.
//!
//! For each of a user's known items that resolves to an index row, the
//! aggregator fetches that row's nearest neighbors, converts distances to
//! similarities, and sums similarity per candidate item across all known
//! items. Summing (not averaging) is deliberate: a candidate that resonates
//! with several of the user's books outranks a single strong match.

use crate::store::RecommenderModel;
use bookshelf_core::models::book::UNKNOWN_METADATA;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// One ranked recommendation. Scores are rounded to 3 decimals at this
/// boundary; the presentation layer shows them as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub isbn: String,
    pub title: String,
    pub author: String,
    pub score: f32,
}

/// Outcome of a recommendation query.
///
/// `NoSignal` means none of the user's known items exist in the trained
/// mapping — the presentation layer can prompt "add books to get
/// recommendations". An empty `Ranked` list means the user's items resolved
/// but produced no positively-similar unseen candidates; the two states are
/// deliberately distinct.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RecommendationResponse {
    NoSignal,
    Ranked(Vec<Recommendation>),
}

impl RecommendationResponse {
    pub fn is_no_signal(&self) -> bool {
        matches!(self, RecommendationResponse::NoSignal)
    }

    /// Ranked items, empty for `NoSignal`.
    pub fn items(&self) -> &[Recommendation] {
        match self {
            RecommendationResponse::NoSignal => &[],
            RecommendationResponse::Ranked(items) => items,
        }
    }
}

/// Rank up to `top_n` items for a user given the ISBNs they already hold in
/// any reading state.
///
/// `known_isbns` is deduplicated preserving first occurrence. Known items
/// absent from the trained mapping are skipped (partial signal is still
/// useful); items the user already holds are never recommended back,
/// whatever their reading state. Ties on exactly equal scores are broken by
/// ascending matrix row, i.e. ascending ISBN, so output is deterministic.
pub fn recommend_for_user(
    model: &RecommenderModel,
    known_isbns: &[String],
    top_n: usize,
    neighbor_breadth: usize,
) -> RecommendationResponse {
    let mut known: Vec<&str> = Vec::with_capacity(known_isbns.len());
    let mut known_set: HashSet<&str> = HashSet::with_capacity(known_isbns.len());
    for isbn in known_isbns {
        if known_set.insert(isbn.as_str()) {
            known.push(isbn.as_str());
        }
    }

    let base_rows: Vec<usize> = known
        .iter()
        .filter_map(|isbn| model.mapping.row_of(isbn))
        .collect();
    if base_rows.is_empty() {
        return RecommendationResponse::NoSignal;
    }
    debug!(
        known = known.len(),
        resolved = base_rows.len(),
        "aggregating neighbor scores"
    );

    let mut scores: HashMap<usize, f32> = HashMap::new();
    for &row in &base_rows {
        let vector = model.matrix.row(row);
        // One extra neighbor to tolerate the self-match in the results.
        for neighbor in model.index.query(&vector, neighbor_breadth + 1) {
            if neighbor.row == row {
                continue;
            }
            let Some(neighbor_isbn) = model.mapping.isbn_of(neighbor.row) else {
                continue;
            };
            if known_set.contains(neighbor_isbn) {
                continue;
            }
            let similarity = 1.0 - neighbor.distance;
            if similarity <= 0.0 {
                continue;
            }
            *scores.entry(neighbor.row).or_insert(0.0) += similarity;
        }
    }

    let mut ranked: Vec<(usize, f32)> = scores.into_iter().collect();
    ranked.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.0.cmp(&b.0))
    });
    ranked.truncate(top_n);

    let items = ranked
        .into_iter()
        .map(|(row, score)| {
            let isbn = model
                .mapping
                .isbn_of(row)
                .unwrap_or(UNKNOWN_METADATA)
                .to_string();
            let (title, author) = match model.books.get(row) {
                Some(book) => (book.title.clone(), book.author.clone()),
                None => (UNKNOWN_METADATA.to_string(), UNKNOWN_METADATA.to_string()),
            };
            Recommendation {
                isbn,
                title,
                author,
                score: (score * 1000.0).round() / 1000.0,
            }
        })
        .collect();

    RecommendationResponse::Ranked(items)
}
