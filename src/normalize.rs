//! Column normalization of sparse matrices.

use log::trace;
use sprs::{CsMat, TriMat};

/// L1-normalizes each column of `matrix`: every entry is divided by its
/// column's sum. Columns summing to zero are left unchanged, so a zero
/// column never turns into NaN.
///
/// Pure and idempotent: normalizing an already-normalized matrix returns the
/// same matrix (entries are non-negative edge counts, so column sums after a
/// first pass are exactly 1 or 0).
pub fn column_normalize(matrix: &CsMat<f64>) -> CsMat<f64> {
    let (rows, cols) = (matrix.rows(), matrix.cols());

    let mut col_sums = vec![0.0f64; cols];
    for (&value, (_, col)) in matrix.iter() {
        col_sums[col] += value;
    }

    let mut triplets = TriMat::new((rows, cols));
    for (&value, (row, col)) in matrix.iter() {
        let scaled = if col_sums[col] > 0.0 { value / col_sums[col] } else { value };
        triplets.add_triplet(row, col, scaled);
    }

    trace!("Column-normalized {}x{} matrix, {} non-zeros", rows, cols, matrix.nnz());
    triplets.to_csr()
}
