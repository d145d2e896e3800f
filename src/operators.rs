//! Dense similarity-matrix storage and the propagation kernels.
//!
//! - [`SimMatrix`]: flat row-major `Vec<f64>` storage for the N×N similarity
//!   matrix; effectively dense after the first iteration, so no sparse
//!   representation is attempted
//! - [`propagate`]: the double product `Qᵀ·S·Q` pushing similarity through a
//!   column-normalized adjacency matrix
//! - [`propagate_star`]: the symmetrized single product `(T + Tᵀ)/2` with
//!   `T = S·Q`, the SimRank* propagation shape

use log::trace;
use rayon::prelude::*;
use sprs::CsMat;

/// Dense N×N similarity matrix, row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct SimMatrix {
    data: Vec<f64>,
    n: usize,
}

impl SimMatrix {
    /// All-zero N×N matrix.
    pub fn zeros(n: usize) -> Self {
        Self { data: vec![0.0; n * n], n }
    }

    /// `scale`·I, the decay-scaled identity used as S₀ and as the baseline
    /// added every iteration.
    pub fn scaled_identity(n: usize, scale: f64) -> Self {
        let mut m = Self::zeros(n);
        for i in 0..n {
            m.data[i * n + i] = scale;
        }
        m
    }

    pub fn n(&self) -> usize {
        self.n
    }

    #[inline]
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.data[i * self.n + j]
    }

    #[inline]
    pub fn set(&mut self, i: usize, j: usize, value: f64) {
        self.data[i * self.n + j] = value;
    }

    #[inline]
    pub fn add(&mut self, i: usize, j: usize, value: f64) {
        self.data[i * self.n + j] += value;
    }

    /// Row `i` as a dense slice.
    #[inline]
    pub fn row(&self, i: usize) -> &[f64] {
        &self.data[i * self.n..(i + 1) * self.n]
    }

    /// Accumulates `coeff`·other into self, element-wise.
    pub fn add_scaled(&mut self, other: &SimMatrix, coeff: f64) {
        assert_eq!(self.n, other.n, "matrix sizes must agree");
        self.data
            .par_chunks_mut(self.n)
            .zip(other.data.par_chunks(self.n))
            .for_each(|(dst, src)| {
                for (d, &s) in dst.iter_mut().zip(src) {
                    *d += coeff * s;
                }
            });
    }
}

/// Materializes a CSR matrix's entries as `(row, col, value)` triplets.
fn entries(q: &CsMat<f64>) -> Vec<(usize, usize, f64)> {
    q.iter().map(|(&v, (r, c))| (r, c, v)).collect()
}

/// `S·Q` for dense S and sparse Q, as a flat row-major buffer.
fn dense_times_sparse(s: &SimMatrix, q: &[(usize, usize, f64)]) -> Vec<f64> {
    let n = s.n;
    let mut a = vec![0.0f64; n * n];
    a.par_chunks_mut(n).enumerate().for_each(|(i, out)| {
        let s_row = s.row(i);
        for &(r, c, v) in q {
            out[c] += s_row[r] * v;
        }
    });
    a
}

/// Computes the propagation term `Qᵀ·S·Q`.
///
/// Q is a column-normalized adjacency matrix; the product averages S over
/// the (in- or out-) neighbor pairs of each node pair. Both factors are
/// applied by iterating Q's non-zeros, so cost is O(nnz(Q)·N) per factor.
pub fn propagate(q: &CsMat<f64>, s: &SimMatrix) -> SimMatrix {
    let n = s.n;
    assert_eq!(q.rows(), n, "propagation matrix must match similarity size");
    assert_eq!(q.cols(), n, "propagation matrix must be square");

    let q_entries = entries(q);

    // A = S·Q
    let a = dense_times_sparse(s, &q_entries);

    // B = Qᵀ·A: entry (r, c, v) of Q contributes v·A[r, ·] to row c of B.
    let mut b = vec![0.0f64; n * n];
    for &(r, c, v) in &q_entries {
        let a_row = &a[r * n..(r + 1) * n];
        let b_row = &mut b[c * n..(c + 1) * n];
        for (dst, &src) in b_row.iter_mut().zip(a_row) {
            *dst += v * src;
        }
    }

    trace!("Propagation product computed for {} nodes", n);
    SimMatrix { data: b, n }
}

/// Computes the SimRank* propagation term `(T + Tᵀ)/2` with `T = S·Q`.
pub fn propagate_star(q: &CsMat<f64>, s: &SimMatrix) -> SimMatrix {
    let n = s.n;
    assert_eq!(q.rows(), n, "propagation matrix must match similarity size");
    assert_eq!(q.cols(), n, "propagation matrix must be square");

    let t = dense_times_sparse(s, &entries(q));

    let mut out = vec![0.0f64; n * n];
    out.par_chunks_mut(n).enumerate().for_each(|(i, row)| {
        for (j, dst) in row.iter_mut().enumerate() {
            *dst = 0.5 * (t[i * n + j] + t[j * n + i]);
        }
    });

    trace!("Symmetrized propagation product computed for {} nodes", n);
    SimMatrix { data: out, n }
}
