//! The crate's single error type.
//!
//! Two kinds of failure are distinguished, matching the contract each
//! operation documents: a contract violation reported through `validate()`
//! or the driver's own checks (illegal `Context`, an unknown enum string, an
//! external collaborator returning the wrong number of blocks) is reported
//! through this type immediately, with no partial progress attempted.
//! Violations that are precondition bugs in the caller's own code rather
//! than data the caller could have validated up front — calling
//! [`crate::PartitionedHypergraph::set_only_node_part`] twice on the same
//! node, reading derived state before [`crate::PartitionedHypergraph::initialize_partition`]
//! has run — are unconditional `assert!`s instead, since by the time they
//! would fire the derived state is already silently corrupted; there is no
//! well-defined value this type could carry back. A lost race on a
//! concurrent [`crate::PartitionedHypergraph::change_node_part`] is not an
//! error either: it is the documented `false` return of that method.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("unknown partitioning mode {0:?}")]
    UnknownMode(String),

    #[error("unknown objective {0:?}")]
    UnknownObjective(String),

    #[error("invalid context: {0}")]
    InvalidContext(&'static str),

    #[error("bisector returned a partition with {actual} blocks, expected {expected}")]
    BisectorContractViolation { expected: u32, actual: u32 },
}
