//! Graph construction and evaluation errors.

use cg_core::{Epoch, NodeId};
use cg_nodes::NodeError;
use thiserror::Error;

/// Result type for graph operations.
pub type GraphResult<T> = Result<T, GraphError>;

/// Errors raised while building or evaluating a control graph.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum GraphError {
    /// A node transitively depends on itself.
    #[error("Cycle detected through node {node}")]
    CycleDetected { node: NodeId },

    /// An input slot was never bound.
    #[error("Node {node} input slot {slot} is not connected")]
    UninitializedInput { node: NodeId, slot: usize },

    /// The scheduler supplied an epoch that is not after the previous one.
    #[error("Epoch not monotonic: expected > {last}, got {got}")]
    EpochNotMonotonic { last: Epoch, got: Epoch },

    /// Zero, negative or non-finite period.
    #[error("Invalid period: {period} s (must be positive and finite)")]
    InvalidPeriod { period: f64 },

    /// Node ID does not belong to this graph.
    #[error("Unknown node {node}")]
    UnknownNode { node: NodeId },

    /// No node carries this name.
    #[error("Unknown node name '{name}'")]
    UnknownName { name: String },

    /// Input slot index beyond the operator's arity.
    #[error("Node {node} has {count} input slots, slot {slot} does not exist")]
    SlotOutOfRange {
        node: NodeId,
        slot: usize,
        count: usize,
    },

    /// Two nodes share a name.
    #[error("Duplicate node name '{name}'")]
    DuplicateName { name: String },

    /// `build` was called without any root.
    #[error("Graph has no root nodes")]
    NoRoots,

    /// Output requested before the first tick.
    #[error("No active epoch: tick the graph first")]
    NoActiveEpoch,

    /// `set_input` on a node that is not an input leaf.
    #[error("Node {node} is not an input node")]
    NotAnInput { node: NodeId },

    /// Tolerance query on a node that is not a summer.
    #[error("Node {node} is not a summer")]
    NotASummer { node: NodeId },

    /// Goal set on a node that is not a motion profile.
    #[error("Node {node} is not a motion profile")]
    NotAProfile { node: NodeId },

    /// Operator configuration error.
    #[error(transparent)]
    Node(NodeError),
}

impl From<NodeError> for GraphError {
    fn from(err: NodeError) -> Self {
        match err {
            NodeError::InvalidPeriod { period } => GraphError::InvalidPeriod { period },
            other => GraphError::Node(other),
        }
    }
}

impl From<cg_core::CoreError> for GraphError {
    fn from(err: cg_core::CoreError) -> Self {
        NodeError::from(err).into()
    }
}
