//! Neighbor-set Jaccard index over node pairs.
//!
//! For every unordered pair of nodes whose neighbor sets intersect, this
//! module computes the Jaccard coefficient |A∩B| / |A∪B| into a symmetric
//! sparse matrix and caches the intersection itself together with
//! |A|·|B|. The cache is re-read every iteration by the similarity engine:
//! the intersection is re-summed against the evolving similarity matrix to
//! form the per-iteration correction term.
//!
//! Pair enumeration is bounded by an inverted index (neighbor → nodes that
//! have it): only pairs sharing at least one neighbor are visited, instead
//! of the full O(M²) scan over nodes with neighbors. Pairs with an empty
//! intersection never exist under this enumeration, so the stored output is
//! identical to the exhaustive scan.

use std::collections::BTreeSet;

use log::{debug, info};
use sprs::{CsMat, TriMat};

use crate::graph::NeighborSets;

/// Cached record for one unordered node pair with `a < b` and a non-empty
/// neighbor-set intersection.
#[derive(Debug, Clone)]
pub struct PairEntry {
    pub a: usize,
    pub b: usize,
    /// Shared neighbors, ascending.
    pub intersection: Vec<usize>,
    /// |N(a)| · |N(b)|, the denominator of the correction term.
    pub size_product: f64,
}

/// Jaccard matrix plus the per-pair intersection cache for one link
/// direction.
#[derive(Debug, Clone)]
pub struct PairIndex {
    /// Entries in ascending (a, b) order.
    pub entries: Vec<PairEntry>,
    /// Symmetric N×N matrix; cell (a, b) = |N(a)∩N(b)| / |N(a)∪N(b)| for
    /// intersecting pairs, absent elsewhere. The diagonal is never stored.
    pub jaccard: CsMat<f64>,
}

impl PairIndex {
    /// Builds the index from one direction's neighbor sets.
    pub fn build(neighbors: &NeighborSets, nnodes: usize) -> Self {
        info!(
            "Computing Jaccard coefficients over {} nodes with neighbors",
            neighbors.len()
        );

        // Inverted index: neighbor id -> nodes having it. Source iteration is
        // ascending, so every posting list comes out ascending too.
        let mut postings: Vec<Vec<usize>> = vec![Vec::new(); nnodes];
        for (&node, set) in neighbors {
            for &w in set {
                postings[w].push(node);
            }
        }

        let mut entries: Vec<PairEntry> = Vec::new();
        let mut triplets = TriMat::new((nnodes, nnodes));

        for (&a, set_a) in neighbors {
            // Candidates co-occurring with `a` under some shared neighbor,
            // deduplicated across shared neighbors, ascending.
            let mut candidates: BTreeSet<usize> = BTreeSet::new();
            for &w in set_a {
                for &b in &postings[w] {
                    if b > a {
                        candidates.insert(b);
                    }
                }
            }

            for &b in &candidates {
                let set_b = &neighbors[&b];
                let intersection: Vec<usize> =
                    set_a.intersection(set_b).copied().collect();
                // Candidates share a neighbor by construction.
                debug_assert!(!intersection.is_empty());

                let union_size = set_a.len() + set_b.len() - intersection.len();
                let coefficient = intersection.len() as f64 / union_size as f64;
                triplets.add_triplet(a, b, coefficient);
                triplets.add_triplet(b, a, coefficient);

                entries.push(PairEntry {
                    a,
                    b,
                    intersection,
                    size_product: (set_a.len() * set_b.len()) as f64,
                });
            }
        }

        let jaccard: CsMat<f64> = triplets.to_csr();
        debug!(
            "Jaccard index built: {} intersecting pairs, {} matrix non-zeros",
            entries.len(),
            jaccard.nnz()
        );

        Self { entries, jaccard }
    }
}
