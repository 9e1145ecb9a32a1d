//! The immutable input hypergraph.
//!
//! A plain CSR-backed representation: node and hyperedge weights plus
//! incidence lists, immutable once built. Not meant to be a production
//! storage layer (no compression, no memory-mapped I/O) — just a correct
//! base the rest of the crate can build on.

use crate::Weight;
use std::ops::Range;

/// A dense node identifier in `[0, n)`.
pub type NodeId = usize;

/// A dense hyperedge identifier in `[0, m)`.
pub type HyperedgeId = usize;

/// A hyperedge: its weight and the (sorted, deduplicated) set of nodes it
/// connects.
#[derive(Debug, Clone)]
pub struct Hyperedge {
    pub weight: Weight,
    pub pins: Vec<NodeId>,
}

/// An immutable, undirected hypergraph `H = (V, E)` with node and hyperedge
/// weights.
///
/// Construction takes ownership of the full incidence data; there is no
/// incremental builder API. A `Hypergraph` is created once and then shared
/// by read-only reference for the rest of its lifetime.
#[derive(Debug, Clone)]
pub struct Hypergraph {
    node_weights: Vec<Weight>,
    edges: Vec<Hyperedge>,
    /// `incident_nodes[v]` lists the hyperedges incident to `v`, CSR-encoded
    /// via `incident_ranges`.
    incident_edges: Vec<HyperedgeId>,
    incident_ranges: Vec<Range<usize>>,
    total_weight: Weight,
}

impl Hypergraph {
    /// Builds a hypergraph from per-node weights and a list of hyperedges.
    ///
    /// Each hyperedge's `pins` are taken as given (no deduplication); callers
    /// wanting the usual undirected, `>= 2`-pin shape are expected to uphold
    /// it themselves, the way `coupe`'s geometric algorithms trust their
    /// callers to hand in a non-degenerate point set.
    pub fn new(node_weights: Vec<Weight>, edges: Vec<Hyperedge>) -> Self {
        let n = node_weights.len();
        let total_weight = node_weights.iter().sum();

        let mut degree = vec![0usize; n];
        for edge in &edges {
            for &v in &edge.pins {
                degree[v] += 1;
            }
        }
        let mut incident_ranges = Vec::with_capacity(n);
        let mut offset = 0usize;
        for d in &degree {
            incident_ranges.push(offset..offset);
            offset += d;
        }
        let mut incident_edges = vec![0 as HyperedgeId; offset];
        let mut cursor: Vec<usize> = incident_ranges.iter().map(|r| r.start).collect();
        for (e, edge) in edges.iter().enumerate() {
            for &v in &edge.pins {
                incident_edges[cursor[v]] = e;
                cursor[v] += 1;
            }
        }
        for (v, range) in incident_ranges.iter_mut().enumerate() {
            range.end = cursor[v];
        }

        Self {
            node_weights,
            edges,
            incident_edges,
            incident_ranges,
            total_weight,
        }
    }

    pub fn num_nodes(&self) -> usize {
        self.node_weights.len()
    }

    pub fn num_hyperedges(&self) -> usize {
        self.edges.len()
    }

    pub fn total_weight(&self) -> Weight {
        self.total_weight
    }

    pub fn node_weight(&self, v: NodeId) -> Weight {
        self.node_weights[v]
    }

    pub fn edge_weight(&self, e: HyperedgeId) -> Weight {
        self.edges[e].weight
    }

    pub fn pins(&self, e: HyperedgeId) -> &[NodeId] {
        &self.edges[e].pins
    }

    /// The hyperedges incident to `v`.
    pub fn incident(&self, v: NodeId) -> &[HyperedgeId] {
        &self.incident_edges[self.incident_ranges[v].clone()]
    }

    /// Builds the sub-hypergraph containing only the nodes assigned to
    /// `block` in `part`, plus a mapping from parent [`NodeId`] to the
    /// sub-hypergraph's [`NodeId`] (`None` for nodes outside `block`).
    ///
    /// `cut_net_splitting = true` restricts every hyperedge to its pins
    /// inside `block`, dropping nets that shrink to 0 or 1 pins (used for the
    /// `km1` objective). `cut_net_splitting = false` drops any hyperedge that
    /// has a pin outside `block` entirely (used for `cut`).
    ///
    /// `stable = true` preserves, for each retained node, the relative order
    /// of its incident edges as they appeared in the parent.
    pub fn extract(
        &self,
        part: &[crate::partitioned_hypergraph::BlockId],
        block: crate::partitioned_hypergraph::BlockId,
        cut_net_splitting: bool,
        stable: bool,
    ) -> (Hypergraph, Vec<Option<NodeId>>) {
        let mut mapping = vec![None; self.num_nodes()];
        let mut sub_node_weights = Vec::new();
        for v in 0..self.num_nodes() {
            if part[v] == block {
                mapping[v] = Some(sub_node_weights.len());
                sub_node_weights.push(self.node_weights[v]);
            }
        }

        let mut sub_edges = Vec::new();
        for edge in &self.edges {
            let all_inside = edge.pins.iter().all(|&v| part[v] == block);
            if !cut_net_splitting && !all_inside {
                continue;
            }
            let mut pins: Vec<NodeId> = edge
                .pins
                .iter()
                .filter_map(|&v| {
                    if part[v] == block {
                        mapping[v]
                    } else {
                        None
                    }
                })
                .collect();
            if stable {
                pins.sort_unstable();
            }
            if pins.len() < 2 {
                continue;
            }
            sub_edges.push(Hyperedge {
                weight: edge.weight,
                pins,
            });
        }

        (Hypergraph::new(sub_node_weights, sub_edges), mapping)
    }
}
