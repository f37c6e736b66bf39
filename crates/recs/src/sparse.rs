//! Sparse matrix primitives for the rating matrix.
//!
//! The centered pivot is built dense (items × users) and converted to
//! compressed sparse row form before indexing; most cells are zero once
//! ratings are centered, and the similarity search only ever walks non-zero
//! entries.

use ndarray::Array2;
use serde::{Deserialize, Serialize};

/// Item-row × user-column matrix in compressed sparse row form.
///
/// Row order is fixed at construction and shared with the similarity index,
/// the item↔row mapping, and the metadata table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CsrMatrix {
    n_rows: usize,
    n_cols: usize,
    /// Row i spans `indices[indptr[i]..indptr[i + 1]]`
    indptr: Vec<usize>,
    indices: Vec<u32>,
    data: Vec<f32>,
}

/// Borrowed view of one matrix row: parallel slices of column indices
/// (strictly ascending) and values.
#[derive(Debug, Clone, Copy)]
pub struct SparseRow<'a> {
    pub indices: &'a [u32],
    pub values: &'a [f32],
}

impl CsrMatrix {
    /// Convert a dense pivot into sparse form, dropping exact zeros.
    pub fn from_dense(dense: &Array2<f32>) -> Self {
        let (n_rows, n_cols) = dense.dim();
        let mut indptr = Vec::with_capacity(n_rows + 1);
        let mut indices = Vec::new();
        let mut data = Vec::new();

        indptr.push(0);
        for row in dense.rows() {
            for (col, &value) in row.iter().enumerate() {
                if value != 0.0 {
                    indices.push(col as u32);
                    data.push(value);
                }
            }
            indptr.push(indices.len());
        }

        Self {
            n_rows,
            n_cols,
            indptr,
            indices,
            data,
        }
    }

    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    pub fn n_cols(&self) -> usize {
        self.n_cols
    }

    /// Number of stored (non-zero) entries.
    pub fn nnz(&self) -> usize {
        self.data.len()
    }

    /// Borrow row `i`.
    ///
    /// # Panics
    ///
    /// Panics if `i >= n_rows`.
    pub fn row(&self, i: usize) -> SparseRow<'_> {
        let start = self.indptr[i];
        let end = self.indptr[i + 1];
        SparseRow {
            indices: &self.indices[start..end],
            values: &self.data[start..end],
        }
    }
}

impl SparseRow<'_> {
    /// Dot product of two sparse rows via a merge walk over the sorted
    /// column indices.
    pub fn dot(&self, other: &SparseRow<'_>) -> f32 {
        let mut sum = 0.0;
        let (mut a, mut b) = (0, 0);
        while a < self.indices.len() && b < other.indices.len() {
            match self.indices[a].cmp(&other.indices[b]) {
                std::cmp::Ordering::Less => a += 1,
                std::cmp::Ordering::Greater => b += 1,
                std::cmp::Ordering::Equal => {
                    sum += self.values[a] * other.values[b];
                    a += 1;
                    b += 1;
                }
            }
        }
        sum
    }

    /// Euclidean norm of the row.
    pub fn norm(&self) -> f32 {
        self.values.iter().map(|v| v * v).sum::<f32>().sqrt()
    }
}

/// Cosine distance between two rows given their precomputed norms.
///
/// A zero-norm row has no orientation; its similarity to anything is taken
/// as 0, i.e. distance 1.
pub fn cosine_distance(a: &SparseRow<'_>, b: &SparseRow<'_>, norm_a: f32, norm_b: f32) -> f32 {
    if norm_a == 0.0 || norm_b == 0.0 {
        return 1.0;
    }
    1.0 - a.dot(b) / (norm_a * norm_b)
}
