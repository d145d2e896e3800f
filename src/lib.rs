//! # linksim
//!
//! Link-based pairwise node similarity on directed graphs: the iterative
//! matrix-form measures SimRank, SimRank*, JacSim and JPRank, plus a
//! non-iterative cosine baseline over node embeddings.
//!
//! All iterative measures share one skeleton:
//!
//! 1. [`graph`]: parse a tab-separated edge list into neighbor sets and
//!    sparse adjacency matrices
//! 2. [`jaccard`]: cache the Jaccard coefficient and neighbor-set
//!    intersection for every intersecting node pair
//! 3. [`normalize`]: column-normalize the adjacency into a propagation
//!    matrix
//! 4. [`engine`]: refine the similarity matrix over a fixed number of
//!    decay-weighted recurrence applications
//! 5. [`topk`]: rank, round and persist each node's top-K neighbors
//!
//! The [`cosine`] variant bypasses steps 1-4 and feeds step 5 directly.
//!
//! ## Example
//!
//! ```no_run
//! use linksim::{DirectedGraph, Measure, SimilarityEngine};
//!
//! # fn main() -> linksim::Result<()> {
//! let graph = DirectedGraph::load("graph.txt")?;
//! let mut engine = SimilarityEngine::new(Measure::JacSim { alpha: 0.3 }, graph)?;
//! linksim::topk::run_to_files(&mut engine, 4, 30, std::path::Path::new("."))?;
//! # Ok(())
//! # }
//! ```

pub mod cosine;
pub mod engine;
pub mod error;
pub mod graph;
pub mod jaccard;
pub mod normalize;
pub mod operators;
pub mod topk;

pub use engine::{Measure, SimilarityEngine, DECAY_FACTOR};
pub use error::{Result, SimError};
pub use graph::DirectedGraph;
pub use operators::SimMatrix;

#[cfg(test)]
mod tests;
