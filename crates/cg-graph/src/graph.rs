//! Frozen control graph and its evaluation.
//!
//! Nodes live in one contiguous store indexed by `NodeId`; input links are
//! indices, never references. Evaluation is pull-based: reading a node pulls
//! its inputs first, then runs the node's operator once for the active epoch
//! and caches the value. Later reads within the same epoch hit the cache, so
//! a node shared by several consumers advances its state exactly once.
//!
//! Neither `tick` nor `output` recurses: `tick` walks the dependency order
//! computed at build time, and `output` pulls with an explicit stack, so
//! graph depth is bounded by memory rather than the call stack.

use std::collections::HashMap;

use cg_core::{Epoch, NodeId, Period};
use cg_nodes::{NodeState, Operator, OperatorKind};
use tracing::{trace, warn};

use crate::error::{GraphError, GraphResult};
use crate::publish::Publisher;

/// One node in a built graph.
#[derive(Debug)]
pub struct NodeRecord {
    pub(crate) id: NodeId,
    pub(crate) name: Option<String>,
    pub(crate) inputs: Vec<NodeId>,
    pub(crate) operator: Operator,
    pub(crate) last_epoch: Option<Epoch>,
    pub(crate) value: f64,
}

impl NodeRecord {
    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Input nodes, in slot order.
    pub fn inputs(&self) -> &[NodeId] {
        &self.inputs
    }

    pub fn kind(&self) -> &OperatorKind {
        self.operator.kind()
    }

    pub fn period(&self) -> Period {
        self.operator.period()
    }

    pub fn state(&self) -> &NodeState {
        self.operator.state()
    }

    /// Epoch this node last advanced in, if any.
    pub fn last_epoch(&self) -> Option<Epoch> {
        self.last_epoch
    }

    /// Value computed in `last_epoch`.
    pub fn value(&self) -> f64 {
        self.value
    }
}

/// Output of one root node for the latest tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SinkOutput {
    pub node: NodeId,
    pub value: f64,
}

/// A validated control graph with frozen topology.
///
/// Operator state stays mutable; topology never changes after `build`.
/// To rewire, build a new graph.
#[derive(Debug)]
pub struct Graph {
    pub(crate) nodes: Vec<NodeRecord>,
    pub(crate) roots: Vec<NodeId>,
    pub(crate) names: HashMap<String, NodeId>,

    /// Offsets for node->consumer adjacency: node i's consumers are in
    /// consumers[consumer_offsets[i]..consumer_offsets[i+1]].
    pub(crate) consumer_offsets: Vec<usize>,
    pub(crate) consumers: Vec<NodeId>,

    /// Nodes reachable from the roots, inputs first.
    pub(crate) schedule: Vec<NodeId>,

    /// Latest ticked epoch; the next tick must be later.
    pub(crate) last_tick: Option<Epoch>,
    /// Epoch that `output` evaluates in. Cleared by `reset`.
    pub(crate) active: Option<Epoch>,
    pub(crate) sinks: Vec<SinkOutput>,
    /// Reused input buffer; sized to the widest operator at build time.
    pub(crate) scratch: Vec<f64>,
    /// Reused `(node, next input slot)` stack for lazy pulls.
    pub(crate) pending: Vec<(usize, usize)>,
}

impl Graph {
    /// Evaluate every root for a new epoch.
    ///
    /// Stateful nodes reachable from the roots advance exactly once. Returns
    /// one `SinkOutput` per root, in declaration order.
    ///
    /// # Errors
    ///
    /// `EpochNotMonotonic` if `epoch` is not after the previous tick's epoch.
    /// No node state is touched in that case.
    pub fn tick(&mut self, epoch: impl Into<Epoch>) -> GraphResult<&[SinkOutput]> {
        let epoch = epoch.into();
        if let Some(last) = self.last_tick {
            if epoch <= last {
                warn!(%last, got = %epoch, "scheduler supplied a non-increasing epoch");
                return Err(GraphError::EpochNotMonotonic { last, got: epoch });
            }
        }
        self.last_tick = Some(epoch);
        self.active = Some(epoch);

        for i in 0..self.schedule.len() {
            let idx = self.schedule[i].slot();
            self.evaluate(idx, epoch);
        }
        for sink in &mut self.sinks {
            sink.value = self.nodes[sink.node.slot()].value;
        }

        trace!(%epoch, sinks = self.sinks.len(), "tick");
        Ok(&self.sinks)
    }

    /// Current value of `id` for the active epoch.
    ///
    /// Advances the node (and its inputs) lazily if it has not been evaluated
    /// in this epoch yet; repeated calls return the identical value.
    ///
    /// # Errors
    ///
    /// `NoActiveEpoch` before the first tick and after `reset` until the next
    /// tick, so a reset graph never advances twice in one epoch.
    pub fn output(&mut self, id: NodeId) -> GraphResult<f64> {
        self.check(id)?;
        let epoch = self.active.ok_or(GraphError::NoActiveEpoch)?;
        Ok(self.pull(id, epoch))
    }

    /// Current value of the node named `name`.
    pub fn output_by_name(&mut self, name: &str) -> GraphResult<f64> {
        let id = self.find_or_err(name)?;
        self.output(id)
    }

    /// Last computed value of `id` without evaluating anything.
    pub fn value(&self, id: NodeId) -> Option<f64> {
        self.nodes
            .get(id.slot())
            .filter(|n| n.last_epoch.is_some())
            .map(|n| n.value)
    }

    /// Set an `Input` leaf. Takes effect the next time the leaf is evaluated.
    pub fn set_input(&mut self, id: NodeId, value: f64) -> GraphResult<()> {
        self.check(id)?;
        if self.nodes[id.slot()].operator.set_input(value) {
            Ok(())
        } else {
            Err(GraphError::NotAnInput { node: id })
        }
    }

    pub fn set_input_by_name(&mut self, name: &str, value: f64) -> GraphResult<()> {
        let id = self.find_or_err(name)?;
        self.set_input(id, value)
    }

    /// Replan a `Profile` node toward `goal`, starting from its current reference.
    pub fn set_goal(&mut self, id: NodeId, goal: f64) -> GraphResult<()> {
        self.check(id)?;
        if !goal.is_finite() {
            return Err(cg_core::CoreError::NonFinite {
                what: "profile goal",
                value: goal,
            }
            .into());
        }
        if self.nodes[id.slot()].operator.set_goal(goal) {
            Ok(())
        } else {
            Err(GraphError::NotAProfile { node: id })
        }
    }

    pub fn set_goal_by_name(&mut self, name: &str, goal: f64) -> GraphResult<()> {
        let id = self.find_or_err(name)?;
        self.set_goal(id, goal)
    }

    /// Whether a summer's output is within its configured tolerance.
    pub fn in_tolerance(&self, id: NodeId) -> GraphResult<bool> {
        self.check(id)?;
        self.nodes[id.slot()]
            .operator
            .in_tolerance()
            .ok_or(GraphError::NotASummer { node: id })
    }

    /// Return every operator to its initial state and drop cached values.
    ///
    /// The last epoch is kept: the next tick must still be later than it.
    /// Until that tick there is no active epoch.
    pub fn reset(&mut self) {
        self.active = None;
        for node in &mut self.nodes {
            node.operator.reset();
            node.last_epoch = None;
            node.value = 0.0;
        }
        for sink in &mut self.sinks {
            sink.value = 0.0;
        }
    }

    /// Republish every named node evaluated in the active epoch.
    pub fn publish<P: Publisher + ?Sized>(&self, publisher: &mut P) {
        let Some(epoch) = self.active else {
            return;
        };
        for (name, value) in self.named_outputs() {
            publisher.publish(name, epoch, value);
        }
    }

    /// `(name, value)` of named nodes evaluated in the active epoch, by node ID.
    pub fn named_outputs(&self) -> impl Iterator<Item = (&str, f64)> + '_ {
        let epoch = self.active;
        self.nodes.iter().filter_map(move |n| match (&n.name, n.last_epoch) {
            (Some(name), Some(last)) if Some(last) == epoch => Some((name.as_str(), n.value)),
            _ => None,
        })
    }

    /// Outputs from the latest tick.
    pub fn sink_outputs(&self) -> &[SinkOutput] {
        &self.sinks
    }

    /// Epoch of the latest successful tick.
    pub fn last_epoch(&self) -> Option<Epoch> {
        self.last_tick
    }

    pub fn nodes(&self) -> &[NodeRecord] {
        &self.nodes
    }

    pub fn node(&self, id: NodeId) -> Option<&NodeRecord> {
        self.nodes.get(id.slot())
    }

    pub fn state(&self, id: NodeId) -> Option<&NodeState> {
        self.node(id).map(NodeRecord::state)
    }

    pub fn find(&self, name: &str) -> Option<NodeId> {
        self.names.get(name).copied()
    }

    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    /// Nodes reading `id` as an input. For introspection only.
    pub fn consumers(&self, id: NodeId) -> &[NodeId] {
        let idx = id.slot();
        if idx >= self.nodes.len() {
            return &[];
        }
        &self.consumers[self.consumer_offsets[idx]..self.consumer_offsets[idx + 1]]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn check(&self, id: NodeId) -> GraphResult<()> {
        if id.slot() < self.nodes.len() {
            Ok(())
        } else {
            Err(GraphError::UnknownNode { node: id })
        }
    }

    fn find_or_err(&self, name: &str) -> GraphResult<NodeId> {
        self.find(name).ok_or_else(|| GraphError::UnknownName {
            name: name.to_string(),
        })
    }

    /// Evaluate `id` and whatever it depends on for `epoch`.
    ///
    /// Depth-first over input edges with an explicit stack; a node is stepped
    /// once all of its inputs carry `epoch`.
    fn pull(&mut self, id: NodeId, epoch: Epoch) -> f64 {
        if self.nodes[id.slot()].last_epoch == Some(epoch) {
            return self.nodes[id.slot()].value;
        }

        let mut stack = std::mem::take(&mut self.pending);
        stack.clear();
        stack.push((id.slot(), 0));

        while let Some(top) = stack.last_mut() {
            let (idx, next) = *top;
            match self.nodes[idx].inputs.get(next).copied() {
                Some(input) => {
                    top.1 += 1;
                    let child = input.slot();
                    if self.nodes[child].last_epoch != Some(epoch) {
                        stack.push((child, 0));
                    }
                }
                None => {
                    stack.pop();
                    self.evaluate(idx, epoch);
                }
            }
        }

        self.pending = stack;
        self.nodes[id.slot()].value
    }

    /// Step one node whose inputs are already evaluated for `epoch`.
    fn evaluate(&mut self, idx: usize, epoch: Epoch) {
        let Self { nodes, scratch, .. } = self;
        if nodes[idx].last_epoch == Some(epoch) {
            return;
        }
        scratch.clear();
        scratch.extend(nodes[idx].inputs.iter().map(|input| nodes[input.slot()].value));

        let node = &mut nodes[idx];
        node.value = node.operator.step(&scratch[..]);
        node.last_epoch = Some(epoch);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::GraphBuilder;

    #[test]
    fn output_before_tick_fails() {
        let mut builder = GraphBuilder::new();
        let c = builder.add(OperatorKind::constant(1.0)).unwrap();
        let mut graph = builder.build(&[c]).unwrap();

        assert_eq!(graph.output(c), Err(GraphError::NoActiveEpoch));
        assert_eq!(graph.value(c), None);
    }

    #[test]
    fn unknown_node_rejected() {
        let mut builder = GraphBuilder::new();
        let c = builder.add(OperatorKind::constant(1.0)).unwrap();
        let mut graph = builder.build(&[c]).unwrap();
        graph.tick(1).unwrap();

        let ghost = NodeId::from_index(5);
        assert_eq!(
            graph.output(ghost),
            Err(GraphError::UnknownNode { node: ghost })
        );
        assert!(graph.node(ghost).is_none());
        assert!(graph.consumers(ghost).is_empty());
    }

    #[test]
    fn lazy_output_of_node_outside_roots() {
        let mut builder = GraphBuilder::new();
        let c = builder.add(OperatorKind::constant(3.0)).unwrap();
        let root = builder.add_wired(OperatorKind::gain(1.0), &[c]).unwrap();
        let side = builder.add_wired(OperatorKind::integrator(), &[c]).unwrap();
        let mut graph = builder.build(&[root]).unwrap();

        graph.tick(1).unwrap();
        assert_eq!(graph.node(side).unwrap().last_epoch(), None);

        let v = graph.output(side).unwrap();
        assert!((v - 0.15).abs() < 1e-12);
        assert_eq!(graph.output(side).unwrap(), v);
    }

    #[test]
    fn set_input_on_non_input_fails() {
        let mut builder = GraphBuilder::new();
        let c = builder.add_named("c", OperatorKind::constant(1.0)).unwrap();
        let mut graph = builder.build(&[c]).unwrap();

        assert_eq!(
            graph.set_input(c, 2.0),
            Err(GraphError::NotAnInput { node: c })
        );
        assert_eq!(
            graph.set_input_by_name("missing", 2.0),
            Err(GraphError::UnknownName {
                name: "missing".into()
            })
        );
        assert_eq!(graph.in_tolerance(c), Err(GraphError::NotASummer { node: c }));
    }

    #[test]
    fn reset_keeps_epoch_contract() {
        let mut builder = GraphBuilder::new();
        let c = builder.add(OperatorKind::constant(1.0)).unwrap();
        let i = builder.add_wired(OperatorKind::integrator(), &[c]).unwrap();
        let mut graph = builder.build(&[i]).unwrap();

        graph.tick(1).unwrap();
        graph.tick(2).unwrap();
        graph.reset();

        assert_eq!(graph.state(i), Some(&NodeState::Integrator { sum: 0.0 }));
        assert!(matches!(
            graph.tick(2),
            Err(GraphError::EpochNotMonotonic { .. })
        ));
        let sinks = graph.tick(3).unwrap();
        assert!((sinks[0].value - 0.05).abs() < 1e-12);
    }

    #[test]
    fn reset_deactivates_epoch_until_next_tick() {
        let mut calls = 0_u32;
        let mut builder = GraphBuilder::new();
        let src = builder
            .add(OperatorKind::source(move || {
                calls += 1;
                f64::from(calls)
            }))
            .unwrap();
        let i = builder.add_wired(OperatorKind::integrator(), &[src]).unwrap();
        let mut graph = builder.build(&[i]).unwrap();

        graph.tick(1).unwrap();
        assert_eq!(graph.output(src).unwrap(), 1.0);
        graph.reset();

        // Same epoch after reset: nothing advances, the source is not resampled.
        assert_eq!(graph.output(i), Err(GraphError::NoActiveEpoch));
        assert_eq!(graph.output(src), Err(GraphError::NoActiveEpoch));
        assert_eq!(graph.state(i), Some(&NodeState::Integrator { sum: 0.0 }));
        assert_eq!(graph.last_epoch(), Some(Epoch(1)));

        graph.tick(2).unwrap();
        assert_eq!(graph.output(src).unwrap(), 2.0);
    }

    #[test]
    fn set_goal_only_on_profiles() {
        let mut builder = GraphBuilder::new();
        let p = builder
            .add_named("lift", OperatorKind::profile(1.0, 0.5))
            .unwrap();
        let g = builder.add_wired(OperatorKind::gain(1.0), &[p]).unwrap();
        let mut graph = builder.build(&[g]).unwrap();

        assert!(graph.set_goal_by_name("lift", 2.0).is_ok());
        assert_eq!(graph.set_goal(g, 1.0), Err(GraphError::NotAProfile { node: g }));
        assert!(matches!(
            graph.set_goal(p, f64::NAN),
            Err(GraphError::Node(_))
        ));
    }
}
