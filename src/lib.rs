//! A parallel multilevel hypergraph partitioning core.
//!
//! `hyperpart` implements the recursive-bipartitioning driver and the shared
//! mutable partitioned-hypergraph state that supports it, together with the
//! small auxiliary structures those two pieces depend on.
//!
//! # Crate layout
//!
//! - [`Hypergraph`] is the immutable input graph: nodes, hyperedges, weights
//!   and incidence lists.
//! - [`PartitionedHypergraph`] wraps a [`Hypergraph`] and maintains the
//!   mutable node-to-block assignment plus its derived per-block and
//!   per-edge statistics, under a lock-free concurrent API.
//! - [`recursive_bipartitioning::partition`] is the top-level entry point:
//!   given a [`Hypergraph`] and a [`Context`], it recursively bisects blocks
//!   until `context.k` blocks have been produced.
//! - [`ProcessGraph`] scores the `process_mapping` objective by approximating
//!   Steiner-tree weights on a target communication topology.
//! - [`Clustering`] and [`StreamingVector`] are small helpers used by the
//!   coarsening and initial-partitioning collaborators, which this crate does
//!   not itself implement.
//!
//! Coarsening, initial partitioning, refinement (label propagation, FM, flow,
//! rebalancing) and hypergraph file I/O are out of scope: they are named only
//! by the [`multilevel::Bisector`] trait and the plain data this crate
//! exposes to them.

pub mod clustering;
pub mod context;
pub mod error;
pub mod hypergraph;
pub mod multilevel;
pub mod partitioned_hypergraph;
pub mod process_graph;
pub mod recursive_bipartitioning;
pub mod streaming_vector;

pub use clustering::Clustering;
pub use context::{Context, Mode, Objective, PartitionType};
pub use error::Error;
pub use hypergraph::{Hyperedge, HyperedgeId, Hypergraph, NodeId};
pub use partitioned_hypergraph::{BlockId, PartitionedHypergraph};
pub use process_graph::ProcessGraph;
pub use streaming_vector::StreamingVector;

pub type Weight = i64;
pub type Gain = i64;

/// The result type returned by every fallible operation in this crate.
pub type Result<T> = std::result::Result<T, Error>;
