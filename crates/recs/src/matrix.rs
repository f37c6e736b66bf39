//! Rating matrix construction.
//!
//! Joins the interaction table against the catalog, applies popularity
//! filtering, centers ratings per user, and pivots into an item-row ×
//! user-column sparse matrix.
//!
//! Filtering order is load-bearing: user and item counts are both taken
//! from the joined table once, then the user filter and the item filter are
//! applied in that order, in a single pass. The two filters do not commute
//! and are deliberately not iterated to a fixed point; re-counting after
//! each filter would change which users and items survive.

use crate::error::{RecsError, Result};
use crate::extract::BookCatalog;
use crate::sparse::CsrMatrix;
use bookshelf_core::models::{Book, Interaction};
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::info;

/// Bidirectional ISBN ↔ matrix-row mapping.
///
/// Row order is fixed at build time (ISBNs sorted ascending) and shared by
/// construction with the similarity index and the metadata table; the three
/// are only ever created together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemMapping {
    isbn_to_row: HashMap<String, usize>,
    row_to_isbn: Vec<String>,
}

impl ItemMapping {
    pub(crate) fn from_rows(row_to_isbn: Vec<String>) -> Self {
        let isbn_to_row = row_to_isbn
            .iter()
            .enumerate()
            .map(|(row, isbn)| (isbn.clone(), row))
            .collect();
        Self {
            isbn_to_row,
            row_to_isbn,
        }
    }

    pub fn row_of(&self, isbn: &str) -> Option<usize> {
        self.isbn_to_row.get(isbn).copied()
    }

    pub fn isbn_of(&self, row: usize) -> Option<&str> {
        self.row_to_isbn.get(row).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.row_to_isbn.len()
    }

    pub fn is_empty(&self) -> bool {
        self.row_to_isbn.is_empty()
    }
}

/// Output of the matrix build: the centered sparse matrix plus the
/// row-aligned item mapping and metadata table.
#[derive(Debug, Clone)]
pub struct RatingMatrix {
    /// User-mean-centered ratings, item rows × user columns. Cells with no
    /// observed rating hold zero, which after centering reads as "exactly
    /// average" rather than "unrated".
    pub matrix: CsrMatrix,
    pub mapping: ItemMapping,
    /// Catalog metadata for each row, placeholder-resolved, aligned with
    /// `matrix` and `mapping`.
    pub books: Vec<Book>,
    /// Distinct users surviving the filters (matrix columns).
    pub n_users: usize,
}

/// Builds the centered rating matrix from a deduplicated interaction table.
#[derive(Debug, Clone)]
pub struct MatrixBuilder {
    min_user_ratings: usize,
    min_item_ratings: usize,
}

impl MatrixBuilder {
    pub fn new(min_user_ratings: usize, min_item_ratings: usize) -> Self {
        Self {
            min_user_ratings,
            min_item_ratings,
        }
    }

    /// Build the matrix. Expects at most one interaction per (user, item)
    /// pair, which the extractor guarantees.
    ///
    /// # Errors
    ///
    /// Returns [`RecsError::DataInsufficient`] when the filtered table is
    /// empty; the training operator sees a hard stop instead of a silently
    /// broken model.
    pub fn build(
        &self,
        interactions: &[Interaction],
        catalog: &BookCatalog,
    ) -> Result<RatingMatrix> {
        // Inner join against the catalog: signals for unknown items cannot
        // be recommended and are dropped before anything is counted.
        let joined: Vec<&Interaction> = interactions
            .iter()
            .filter(|i| catalog.contains(&i.isbn))
            .collect();

        // Both counts come from the joined table, before either filter runs.
        let mut user_counts: HashMap<&str, usize> = HashMap::new();
        let mut item_counts: HashMap<&str, usize> = HashMap::new();
        for interaction in &joined {
            *user_counts.entry(interaction.user_id.as_str()).or_insert(0) += 1;
            *item_counts.entry(interaction.isbn.as_str()).or_insert(0) += 1;
        }

        // Users first, then items, single pass.
        let filtered: Vec<&Interaction> = joined
            .into_iter()
            .filter(|i| user_counts[i.user_id.as_str()] >= self.min_user_ratings)
            .filter(|i| item_counts[i.isbn.as_str()] >= self.min_item_ratings)
            .collect();

        if filtered.is_empty() {
            return Err(RecsError::DataInsufficient(format!(
                "no interactions survive popularity filtering \
                 (min {} per user, min {} per item)",
                self.min_user_ratings, self.min_item_ratings
            )));
        }

        // Per-user mean over the surviving interactions.
        let mut user_sums: HashMap<&str, (f32, usize)> = HashMap::new();
        for interaction in &filtered {
            let entry = user_sums.entry(interaction.user_id.as_str()).or_insert((0.0, 0));
            entry.0 += interaction.rating;
            entry.1 += 1;
        }
        let user_means: HashMap<&str, f32> = user_sums
            .into_iter()
            .map(|(user, (sum, count))| (user, sum / count as f32))
            .collect();

        // Pivot axes sorted ascending for a deterministic layout.
        let mut isbns: Vec<&str> = filtered.iter().map(|i| i.isbn.as_str()).collect();
        isbns.sort_unstable();
        isbns.dedup();
        let mut users: Vec<&str> = filtered.iter().map(|i| i.user_id.as_str()).collect();
        users.sort_unstable();
        users.dedup();

        let row_of: HashMap<&str, usize> =
            isbns.iter().enumerate().map(|(i, s)| (*s, i)).collect();
        let col_of: HashMap<&str, usize> =
            users.iter().enumerate().map(|(i, s)| (*s, i)).collect();

        let mut pivot = Array2::<f32>::zeros((isbns.len(), users.len()));
        for interaction in &filtered {
            let row = row_of[interaction.isbn.as_str()];
            let col = col_of[interaction.user_id.as_str()];
            pivot[[row, col]] = interaction.rating - user_means[interaction.user_id.as_str()];
        }

        let matrix = CsrMatrix::from_dense(&pivot);
        let books = isbns
            .iter()
            .map(|isbn| {
                catalog
                    .get(isbn)
                    .cloned()
                    .unwrap_or_else(|| Book::unresolved(*isbn))
            })
            .collect();
        let mapping = ItemMapping::from_rows(isbns.iter().map(|s| s.to_string()).collect());

        info!(
            items = mapping.len(),
            users = users.len(),
            interactions = filtered.len(),
            nnz = matrix.nnz(),
            "built centered rating matrix"
        );

        Ok(RatingMatrix {
            matrix,
            mapping,
            books,
            n_users: users.len(),
        })
    }
}
