//! Brute-force cosine similarity index over item rows.
//!
//! `build` is a pure function of the rating matrix: it stores the item
//! vectors and precomputes their norms, nothing else. `query` scans every
//! row and returns the k nearest under cosine distance, so results are exact
//! rather than approximate; index construction is O(nnz) and each query is
//! O(rows × overlap). Retraining always rebuilds from a full matrix, there
//! is no incremental update path.

use crate::sparse::{cosine_distance, CsrMatrix, SparseRow};
use serde::{Deserialize, Serialize};

/// One query result: a row of the index and its cosine distance from the
/// query vector.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    pub row: usize,
    pub distance: f32,
}

/// Immutable nearest-neighbor index over the item rows of a centered rating
/// matrix. Row order is inherited from the matrix and shared with the
/// item↔row mapping and the metadata table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CosineIndex {
    rows: CsrMatrix,
    norms: Vec<f32>,
}

impl CosineIndex {
    /// Fit the index over the item rows of `matrix`. Deterministic: the same
    /// matrix always produces the same index.
    pub fn build(matrix: CsrMatrix) -> Self {
        let norms = (0..matrix.n_rows())
            .map(|i| matrix.row(i).norm())
            .collect();
        Self { rows: matrix, norms }
    }

    /// Number of indexed item rows.
    pub fn len(&self) -> usize {
        self.rows.n_rows()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.n_rows() == 0
    }

    /// The k nearest item rows to `query`, nearest first.
    ///
    /// The queried vector itself is included when present in the index; the
    /// caller filters self-matches. `k` is clamped to the number of indexed
    /// rows. Exact ties on distance are ordered by ascending row.
    pub fn query(&self, query: &SparseRow<'_>, k: usize) -> Vec<Neighbor> {
        let k = k.min(self.len());
        if k == 0 {
            return Vec::new();
        }

        let query_norm = query.norm();
        let mut neighbors: Vec<Neighbor> = (0..self.len())
            .map(|row| Neighbor {
                row,
                distance: cosine_distance(query, &self.rows.row(row), query_norm, self.norms[row]),
            })
            .collect();

        neighbors.sort_by(|a, b| {
            a.distance
                .partial_cmp(&b.distance)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.row.cmp(&b.row))
        });
        neighbors.truncate(k);
        neighbors
    }
}
