//! Non-iterative cosine similarity over per-node embedding vectors.
//!
//! Given a dense N×D matrix of node representations, scores every node pair
//! as `dot(u,v) / (‖u‖·‖v‖)` and feeds the shared top-K extraction. A row
//! with zero norm yields NaN against every other row; the top-K filter
//! drops those entries in both directions, so such a node neither emits
//! results nor appears as anyone's neighbor. No adjacency structures, no
//! iteration.

use std::path::Path;

use log::info;
use rayon::prelude::*;
use smartcore::linalg::basic::arrays::{Array, Array2};
use smartcore::linalg::basic::matrix::DenseMatrix;

use crate::error::{Result, SimError};
use crate::topk::{select_top_k, write_ranked};

/// Computes each node's top-K cosine neighbors.
///
/// Returns one ranked `(neighbor, score)` list per node, in node order;
/// self, zero, and NaN scores are already filtered out.
pub fn cosine_top_k(reps: &DenseMatrix<f64>, topk: usize) -> Result<Vec<Vec<(usize, f64)>>> {
    if topk == 0 {
        return Err(SimError::Parameter("topK must be positive".into()));
    }

    let (nrows, _) = reps.shape();
    let rows: Vec<Vec<f64>> = (0..nrows)
        .map(|i| reps.get_row(i).iterator(0).copied().collect())
        .collect();
    let norms: Vec<f64> = rows
        .iter()
        .map(|row| row.iter().map(|&x| x * x).sum::<f64>().sqrt())
        .collect();

    let ranked: Vec<Vec<(usize, f64)>> = (0..nrows)
        .into_par_iter()
        .map(|target| {
            let target_row = &rows[target];
            // 0/0 for zero-norm rows is a defined NaN case, not an error;
            // select_top_k filters it.
            let scores: Vec<f64> = rows
                .iter()
                .zip(&norms)
                .map(|(row, &norm)| {
                    let dot: f64 =
                        target_row.iter().zip(row).map(|(&a, &b)| a * b).sum();
                    dot / (norms[target] * norm)
                })
                .collect();
            select_top_k(&scores, target, topk)
        })
        .collect();

    info!("Cosine similarity ranked for {} nodes", nrows);
    Ok(ranked)
}

/// Computes cosine top-K and writes the single result file.
pub fn write_cosine(path: &Path, reps: &DenseMatrix<f64>, topk: usize) -> Result<()> {
    let ranked = cosine_top_k(reps, topk)?;
    write_ranked(path, &ranked)
}
