//! Top-K extraction and result persistence.
//!
//! For each target node: drop the self entry, drop zeros and NaNs, rank the
//! rest by descending score with ties broken by ascending neighbor id, keep
//! at most K, and emit `target,neighbor,score` lines with the score rounded
//! to five decimal digits. The tie-break makes re-runs byte-identical.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use log::info;

use crate::engine::SimilarityEngine;
use crate::error::{Result, SimError};
use crate::operators::SimMatrix;

/// Ranks one node's score row.
///
/// Entries for `target` itself, exact zeros, and NaNs are discarded; the
/// survivors are sorted by (score descending, neighbor id ascending) and
/// truncated to `k`.
pub fn select_top_k(scores: &[f64], target: usize, k: usize) -> Vec<(usize, f64)> {
    let mut ranked: Vec<(usize, f64)> = scores
        .iter()
        .enumerate()
        .filter(|&(node, &value)| node != target && value != 0.0 && !value.is_nan())
        .map(|(node, &value)| (node, value))
        .collect();

    ranked.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.0.cmp(&b.0))
    });
    ranked.truncate(k);
    ranked
}

/// Rounds to five decimal digits, the precision of the emitted scores.
pub fn round_score(value: f64) -> f64 {
    (value * 1e5).round() / 1e5
}

/// Writes the per-node top-K of a similarity matrix to `path`, targets in
/// ascending order, overwriting any previous file.
pub fn write_top_k(path: &Path, matrix: &SimMatrix, topk: usize) -> Result<()> {
    if topk == 0 {
        return Err(SimError::Parameter("topK must be positive".into()));
    }

    let mut writer = BufWriter::new(File::create(path)?);
    let mut lines = 0usize;
    for target in 0..matrix.n() {
        for (node, score) in select_top_k(matrix.row(target), target, topk) {
            writeln!(writer, "{},{},{}", target, node, round_score(score))?;
            lines += 1;
        }
    }
    writer.flush()?;

    info!("Wrote {} result lines to {}", lines, path.display());
    Ok(())
}

/// Writes pre-ranked per-node results (the cosine flow) to `path`.
pub fn write_ranked(path: &Path, ranked: &[Vec<(usize, f64)>]) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    let mut lines = 0usize;
    for (target, neighbors) in ranked.iter().enumerate() {
        for &(node, score) in neighbors {
            writeln!(writer, "{},{},{}", target, node, round_score(score))?;
            lines += 1;
        }
    }
    writer.flush()?;

    info!("Wrote {} result lines to {}", lines, path.display());
    Ok(())
}

/// Drives an engine for `iterations` steps, writing one result file per
/// iteration into `dir`. File names encode the measure and its parameters
/// via [`Measure::file_stem`](crate::Measure::file_stem); the paths written
/// are returned in iteration order.
pub fn run_to_files(
    engine: &mut SimilarityEngine,
    iterations: usize,
    topk: usize,
    dir: &Path,
) -> Result<Vec<PathBuf>> {
    if topk == 0 {
        return Err(SimError::Parameter("topK must be positive".into()));
    }

    let measure = engine.measure();
    let mut paths = Vec::with_capacity(iterations);
    engine.run(iterations, |iteration, matrix| {
        let path = dir.join(measure.file_stem(topk, iteration));
        write_top_k(&path, matrix, topk)?;
        paths.push(path);
        Ok(())
    })?;
    Ok(paths)
}
