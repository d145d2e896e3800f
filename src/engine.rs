//! The iterative similarity-refinement engine.
//!
//! One recurrence serves all four matrix-form measures; a [`Measure`] lowers
//! to a set of term coefficients and enabled-term flags rather than to its
//! own code path:
//!
//! ```text
//! S' = β·δ·( α_in·J_in  + (1−α_in)·(Qinᵀ·S·Qin  − Extra_in) )
//!    + (1−β)·δ·( α_out·J_out + (1−α_out)·(Qoutᵀ·S·Qout − Extra_out) )
//!    + identity_scale·I
//! ```
//!
//! - SimRank keeps only the in-link propagation term and the identity
//! - SimRank* swaps the double product for the symmetrized `(T + Tᵀ)/2`
//! - JacSim is the in-link-only case with the Jaccard/Extra correction
//! - JPRank blends both link directions with the correction on each
//!
//! The Extra matrices are rebuilt every iteration from the cached
//! neighbor-set intersections, summed against the CURRENT similarity matrix,
//! and discarded once applied. Iteration count is a fixed external
//! parameter; there is deliberately no convergence check.

use log::{debug, info};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use sprs::CsMat;

use crate::error::{Result, SimError};
use crate::graph::DirectedGraph;
use crate::jaccard::{PairEntry, PairIndex};
use crate::normalize::column_normalize;
use crate::operators::{propagate, propagate_star, SimMatrix};

/// Damping constant applied to the propagated and Jaccard terms each
/// iteration. Fixed across all measures.
pub const DECAY_FACTOR: f64 = 0.8;

/// A similarity measure and its fixed parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Measure {
    /// Plain SimRank: `S' = δ·(Qᵀ·S·Q) + (1−δ)·I`.
    SimRank,
    /// SimRank*: `S' = (δ/2)·(T + Tᵀ) + (1−δ)·I` with `T = S·Q`.
    SimRankStar,
    /// JacSim, in-links only: `S' = δ·(α·J + (1−α)·(Qᵀ·S·Q − Extra)) + (1−δ·α)·I`.
    JacSim { alpha: f64 },
    /// JPRank: both link directions, blended by `beta`.
    JpRank { alpha_in: f64, alpha_out: f64, beta: f64 },
}

/// Coefficients and enabled-term flags one [`Measure`] lowers to.
#[derive(Debug, Clone, Copy)]
struct Terms {
    /// Weight of the in-link side; 1.0 for single-direction measures.
    beta: f64,
    alpha_in: f64,
    alpha_out: f64,
    /// Jaccard and Extra correction terms enabled (the Jac-family).
    correction: bool,
    /// Out-link side enabled (JPRank).
    out_side: bool,
    /// Symmetrized single-product propagation (SimRank*).
    star: bool,
    /// Diagonal baseline, computed once and added every iteration.
    identity_scale: f64,
}

impl Measure {
    /// Checks every parameter against its domain.
    pub fn validate(&self) -> Result<()> {
        match *self {
            Measure::SimRank | Measure::SimRankStar => Ok(()),
            Measure::JacSim { alpha } => unit_interval("alpha", alpha),
            Measure::JpRank { alpha_in, alpha_out, beta } => {
                unit_interval("alpha_in", alpha_in)?;
                unit_interval("alpha_out", alpha_out)?;
                unit_interval("beta", beta)
            }
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Measure::SimRank => "SimRank",
            Measure::SimRankStar => "SimRank*",
            Measure::JacSim { .. } => "JacSim",
            Measure::JpRank { .. } => "JPRank",
        }
    }

    /// Output-file stem encoding the measure and its parameters, so sweep
    /// runs stay distinguishable: alpha/beta are encoded as the integer part
    /// of their value times ten.
    pub fn file_stem(&self, topk: usize, iteration: usize) -> String {
        match *self {
            Measure::SimRank => format!("SimRank_Top{}_IT_{}", topk, iteration),
            Measure::SimRankStar => format!("SRS_Top{}_IT_{}", topk, iteration),
            Measure::JacSim { alpha } => {
                format!("JacSim_A_{}_Top{}_IT_{}", tenths(alpha), topk, iteration)
            }
            Measure::JpRank { alpha_in, alpha_out, beta } => format!(
                "JPRank_AIN_{}_AOUT_{}_B_{}_Top{}_IT_{}",
                tenths(alpha_in),
                tenths(alpha_out),
                tenths(beta),
                topk,
                iteration
            ),
        }
    }

    fn terms(&self) -> Terms {
        let delta = DECAY_FACTOR;
        match *self {
            Measure::SimRank => Terms {
                beta: 1.0,
                alpha_in: 0.0,
                alpha_out: 0.0,
                correction: false,
                out_side: false,
                star: false,
                identity_scale: 1.0 - delta,
            },
            Measure::SimRankStar => Terms {
                beta: 1.0,
                alpha_in: 0.0,
                alpha_out: 0.0,
                correction: false,
                out_side: false,
                star: true,
                identity_scale: 1.0 - delta,
            },
            Measure::JacSim { alpha } => Terms {
                beta: 1.0,
                alpha_in: alpha,
                alpha_out: 0.0,
                correction: true,
                out_side: false,
                star: false,
                identity_scale: 1.0 - delta * alpha,
            },
            Measure::JpRank { alpha_in, alpha_out, beta } => Terms {
                beta,
                alpha_in,
                alpha_out,
                correction: true,
                out_side: true,
                star: false,
                identity_scale: 1.0 - delta * beta * (alpha_in - alpha_out) - delta * alpha_out,
            },
        }
    }
}

fn unit_interval(name: &str, value: f64) -> Result<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(SimError::Parameter(format!("{} must lie in [0, 1], got {}", name, value)))
    }
}

fn tenths(value: f64) -> i64 {
    (value * 10.0).trunc() as i64
}

/// Holds the evolving similarity matrix and advances it one recurrence
/// application at a time.
///
/// Construction consumes the [`DirectedGraph`]: the raw adjacency matrices
/// are released once their normalized forms exist, and neighbor sets once
/// the pair indexes are built. Only the structures the measure actually
/// reads are kept for the iteration loop.
pub struct SimilarityEngine {
    measure: Measure,
    terms: Terms,
    nnodes: usize,
    q_in: Option<CsMat<f64>>,
    q_out: Option<CsMat<f64>>,
    pairs_in: Option<PairIndex>,
    pairs_out: Option<PairIndex>,
    s: SimMatrix,
    iteration: usize,
}

impl SimilarityEngine {
    pub fn new(measure: Measure, graph: DirectedGraph) -> Result<Self> {
        measure.validate()?;
        let n = graph.nnodes;

        for (label, m) in [("in", &graph.adj_in), ("out", &graph.adj_out)] {
            if m.rows() != n || m.cols() != n {
                return Err(SimError::Dimension(format!(
                    "{}-adjacency is {}x{}, expected {}x{}",
                    label,
                    m.rows(),
                    m.cols(),
                    n,
                    n
                )));
            }
        }

        let terms = measure.terms();
        debug!("Measure {} lowered to {:?}", measure.name(), terms);

        // A side whose blend weight is zero contributes nothing; skip its
        // normalization and pair cache entirely.
        let in_active = terms.star || terms.beta > 0.0;
        let out_active = terms.out_side && terms.beta < 1.0;

        let q_in = in_active.then(|| column_normalize(&graph.adj_in));
        let q_out = out_active.then(|| column_normalize(&graph.adj_out));

        let pairs_in = (terms.correction && in_active)
            .then(|| PairIndex::build(&graph.in_neighbors, n));
        let pairs_out = (terms.correction && out_active)
            .then(|| PairIndex::build(&graph.out_neighbors, n));

        info!(
            "{} engine ready: {} nodes, {} cached in-pairs, {} cached out-pairs",
            measure.name(),
            n,
            pairs_in.as_ref().map_or(0, |p| p.entries.len()),
            pairs_out.as_ref().map_or(0, |p| p.entries.len())
        );

        Ok(Self {
            measure,
            terms,
            nnodes: n,
            q_in,
            q_out,
            pairs_in,
            pairs_out,
            s: SimMatrix::scaled_identity(n, terms.identity_scale),
            iteration: 0,
        })
    }

    pub fn measure(&self) -> Measure {
        self.measure
    }

    pub fn nnodes(&self) -> usize {
        self.nnodes
    }

    /// Iterations applied so far.
    pub fn iteration(&self) -> usize {
        self.iteration
    }

    /// The current similarity matrix (S₀ before the first [`step`](Self::step)).
    pub fn matrix(&self) -> &SimMatrix {
        &self.s
    }

    /// Applies the recurrence once, replacing S wholesale.
    pub fn step(&mut self) -> &SimMatrix {
        self.iteration += 1;
        info!("{} iteration {} ...", self.measure.name(), self.iteration);

        let delta = DECAY_FACTOR;
        let mut next = SimMatrix::scaled_identity(self.nnodes, self.terms.identity_scale);

        if self.terms.star {
            let q = self.q_in.as_ref().expect("star measure keeps its propagation matrix");
            next.add_scaled(&propagate_star(q, &self.s), delta);
        } else {
            if let Some(q) = &self.q_in {
                apply_side(
                    &mut next,
                    q,
                    &self.s,
                    self.pairs_in.as_ref(),
                    self.terms.alpha_in,
                    self.terms.beta * delta,
                );
            }
            if let Some(q) = &self.q_out {
                apply_side(
                    &mut next,
                    q,
                    &self.s,
                    self.pairs_out.as_ref(),
                    self.terms.alpha_out,
                    (1.0 - self.terms.beta) * delta,
                );
            }
        }

        self.s = next;
        &self.s
    }

    /// Runs `iterations` recurrence applications, handing each iteration's
    /// matrix to `sink` (typically a top-K file writer).
    pub fn run<F>(&mut self, iterations: usize, mut sink: F) -> Result<()>
    where
        F: FnMut(usize, &SimMatrix) -> Result<()>,
    {
        if iterations == 0 {
            return Err(SimError::Parameter("iterations must be positive".into()));
        }
        for _ in 0..iterations {
            self.step();
            sink(self.iteration, &self.s)?;
        }
        Ok(())
    }
}

/// Adds one link direction's contribution to `next`:
/// `weight·α·J + weight·(1−α)·(Qᵀ·S·Q − Extra)`.
fn apply_side(
    next: &mut SimMatrix,
    q: &CsMat<f64>,
    s: &SimMatrix,
    pairs: Option<&PairIndex>,
    alpha: f64,
    weight: f64,
) {
    let propagated = propagate(q, s);
    next.add_scaled(&propagated, weight * (1.0 - alpha));
    drop(propagated);

    if let Some(index) = pairs {
        if alpha > 0.0 {
            for (&coefficient, (i, j)) in index.jaccard.iter() {
                next.add(i, j, weight * alpha * coefficient);
            }
        }

        // The correction is evaluated against the current S, not the static
        // Jaccard matrix, then dropped once applied.
        let coeff = weight * (1.0 - alpha);
        for &(a, b, value) in &extra_values(&index.entries, s) {
            next.add(a, b, -coeff * value);
            next.add(b, a, -coeff * value);
        }
    }
}

/// Evaluates the Extra correction for every cached pair against the current
/// similarity matrix: `Σ_{x,y ∈ I(a,b)} S[x,y] / (|N(a)|·|N(b)|)`.
fn extra_values(entries: &[PairEntry], s: &SimMatrix) -> Vec<(usize, usize, f64)> {
    entries
        .par_iter()
        .map(|entry| {
            let mut sum = 0.0;
            for &x in &entry.intersection {
                let row = s.row(x);
                for &y in &entry.intersection {
                    sum += row[y];
                }
            }
            (entry.a, entry.b, sum / entry.size_product)
        })
        .collect()
}
