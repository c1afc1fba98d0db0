//! cg-graph: control-loop graph assembly and evaluation.
//!
//! Provides:
//! - Incremental builder with DAG validation (`GraphBuilder`)
//! - Frozen, index-based `Graph` with epoch-gated pull evaluation
//! - `Publisher` hook for republishing named outputs after each tick
//! - `GraphSet` for ticking independent graphs in parallel
//!
//! # Example
//!
//! ```
//! use cg_graph::GraphBuilder;
//! use cg_nodes::OperatorKind;
//!
//! let mut builder = GraphBuilder::new();
//! let v = builder.add(OperatorKind::constant(2.0)).unwrap();
//! let integ = builder.add_wired(OperatorKind::integrator(), &[v]).unwrap();
//! let mut graph = builder.build(&[integ]).unwrap();
//!
//! graph.tick(1).unwrap();
//! let sinks = graph.tick(2).unwrap();
//! assert!((sinks[0].value - 0.2).abs() < 1e-12);
//! ```

pub mod builder;
pub mod error;
pub mod graph;
pub mod publish;
pub mod set;
pub(crate) mod validate;

// Re-exports for ergonomics
pub use builder::GraphBuilder;
pub use error::{GraphError, GraphResult};
pub use graph::{Graph, NodeRecord, SinkOutput};
pub use publish::Publisher;
pub use set::GraphSet;
