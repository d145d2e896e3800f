//! Directed-graph ingestion from an edge list.
//!
//! - One edge per line, tab-separated `source<TAB>target[...]`; the first two
//!   fields are parsed as integers, the rest are ignored
//! - Node ids are taken literally: the input must already use a dense
//!   `[0, N)` id space, with N the number of distinct ids observed
//! - Duplicate edges are kept and accumulate additively in the adjacency
//!   matrices; the neighbor sets use set semantics (membership only)

use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use log::{debug, info};
use sprs::{CsMat, TriMat};

use crate::error::{Result, SimError};

/// Per-node neighbor sets, keyed by node id. Only nodes with at least one
/// neighbor in the given direction appear as keys. `BTreeMap`/`BTreeSet`
/// keep enumeration deterministic (ascending ids).
pub type NeighborSets = BTreeMap<usize, BTreeSet<usize>>;

/// A directed graph loaded from an edge list.
///
/// `adj_in[(i, j)]` counts edges i→j, so column j of `adj_in` ranges over the
/// in-neighbors of j and column-normalizing it yields the in-link propagation
/// matrix. `adj_out` is built with the roles swapped: `adj_out[(i, j)]`
/// counts edges j→i, so column j ranges over the out-neighbors of j.
#[derive(Debug, Clone)]
pub struct DirectedGraph {
    /// Number of distinct node ids observed across both edge columns.
    pub nnodes: usize,
    /// Number of edge lines read (duplicates included).
    pub nedges: usize,
    pub in_neighbors: NeighborSets,
    pub out_neighbors: NeighborSets,
    pub adj_in: CsMat<f64>,
    pub adj_out: CsMat<f64>,
}

impl DirectedGraph {
    /// Loads an edge list from `path`.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading edge list from {}", path.display());
        let file = File::open(path)?;
        Self::parse(BufReader::new(file))
    }

    /// Parses an edge list from any reader.
    ///
    /// Fails with [`SimError::Format`] on a line with fewer than two
    /// tab-separated fields, a non-integer field, or (after counting
    /// distinct ids) an id outside `[0, nnodes)`.
    pub fn parse<R: Read>(reader: R) -> Result<Self> {
        let mut edges: Vec<(usize, usize)> = Vec::new();
        let mut node_set: BTreeSet<usize> = BTreeSet::new();

        for (lineno, line) in BufReader::new(reader).lines().enumerate() {
            let line = line?;
            let line = line.strip_suffix('\r').unwrap_or(&line);
            let mut fields = line.split('\t');
            let source = parse_field(fields.next(), lineno + 1)?;
            let target = parse_field(fields.next(), lineno + 1)?;
            node_set.insert(source);
            node_set.insert(target);
            edges.push((source, target));
        }

        let nnodes = node_set.len();
        debug!("Edge list parsed: {} edges, {} distinct nodes", edges.len(), nnodes);

        // Ids are used as matrix indices directly; the id space must be dense.
        if let Some(&max_id) = node_set.iter().next_back() {
            if max_id >= nnodes {
                return Err(SimError::Format {
                    line: 0,
                    reason: format!(
                        "node id {} out of range for {} distinct nodes; ids must form a dense [0, N) space",
                        max_id, nnodes
                    ),
                });
            }
        }

        let mut in_neighbors: NeighborSets = BTreeMap::new();
        let mut out_neighbors: NeighborSets = BTreeMap::new();
        let mut tri_in = TriMat::new((nnodes, nnodes));
        let mut tri_out = TriMat::new((nnodes, nnodes));

        for &(source, target) in &edges {
            // Cell (source, target) of the in-matrix gets 1 per occurrence;
            // to_csr() sums duplicate triplets, preserving multiplicity.
            tri_in.add_triplet(source, target, 1.0);
            tri_out.add_triplet(target, source, 1.0);
            in_neighbors.entry(target).or_default().insert(source);
            out_neighbors.entry(source).or_default().insert(target);
        }

        let adj_in: CsMat<f64> = tri_in.to_csr();
        let adj_out: CsMat<f64> = tri_out.to_csr();

        info!(
            "Adjacency matrices built: {}x{}, {} non-zeros (in), {} non-zeros (out)",
            nnodes,
            nnodes,
            adj_in.nnz(),
            adj_out.nnz()
        );

        Ok(Self {
            nnodes,
            nedges: edges.len(),
            in_neighbors,
            out_neighbors,
            adj_in,
            adj_out,
        })
    }
}

fn parse_field(field: Option<&str>, line: usize) -> Result<usize> {
    let field = field.ok_or_else(|| SimError::Format {
        line,
        reason: "expected two tab-separated node ids".into(),
    })?;
    field.trim().parse::<usize>().map_err(|_| SimError::Format {
        line,
        reason: format!("non-integer node id {:?}", field),
    })
}
