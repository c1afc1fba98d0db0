//! Independent graphs ticked side by side.
//!
//! Each graph is an isolation unit with no state shared with the others, so
//! a set can tick all of its graphs on the rayon pool.

use cg_core::Epoch;
use rayon::prelude::*;

use crate::error::GraphResult;
use crate::graph::{Graph, SinkOutput};

/// A collection of independent control graphs (e.g. one per subsystem).
#[derive(Debug, Default)]
pub struct GraphSet {
    graphs: Vec<Graph>,
}

impl GraphSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a graph and return its index.
    pub fn push(&mut self, graph: Graph) -> usize {
        self.graphs.push(graph);
        self.graphs.len() - 1
    }

    pub fn get(&self, index: usize) -> Option<&Graph> {
        self.graphs.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Graph> {
        self.graphs.get_mut(index)
    }

    pub fn len(&self) -> usize {
        self.graphs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.graphs.is_empty()
    }

    /// Tick every graph for `epoch` in parallel.
    ///
    /// Results are in insertion order. A failing graph does not affect the others.
    pub fn tick_all(&mut self, epoch: impl Into<Epoch>) -> Vec<GraphResult<Vec<SinkOutput>>> {
        let epoch = epoch.into();
        self.graphs
            .par_iter_mut()
            .map(|graph| graph.tick(epoch).map(<[SinkOutput]>::to_vec))
            .collect()
    }
}

impl FromIterator<Graph> for GraphSet {
    fn from_iter<I: IntoIterator<Item = Graph>>(iter: I) -> Self {
        Self {
            graphs: iter.into_iter().collect(),
        }
    }
}
