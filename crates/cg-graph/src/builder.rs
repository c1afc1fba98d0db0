//! Incremental graph builder.

use std::collections::HashMap;

use cg_core::{NodeId, Period};
use cg_nodes::{Operator, OperatorKind};
use tracing::{debug, warn};

use crate::error::{GraphError, GraphResult};
use crate::graph::{Graph, NodeRecord, SinkOutput};
use crate::validate;

/// A node whose wiring is still being assembled.
#[derive(Debug)]
pub(crate) struct PendingNode {
    pub(crate) name: Option<String>,
    pub(crate) operator: Operator,
    pub(crate) inputs: Vec<Option<NodeId>>,
}

/// Builder for constructing a control graph incrementally.
///
/// Add nodes with `add*`, bind their input slots with `connect`/`wire`,
/// then call `build()` to validate and freeze the topology into a `Graph`.
#[derive(Debug, Default)]
pub struct GraphBuilder {
    default_period: Period,
    nodes: Vec<PendingNode>,
    names: HashMap<String, NodeId>,
}

impl GraphBuilder {
    /// Create a new empty builder using `DEFAULT_PERIOD`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a builder whose nodes default to `seconds` as their period.
    pub fn with_period(seconds: f64) -> GraphResult<Self> {
        Ok(Self {
            default_period: Period::new(seconds)?,
            ..Self::default()
        })
    }

    /// Period applied to nodes added without an explicit one.
    pub fn default_period(&self) -> Period {
        self.default_period
    }

    /// Number of nodes added so far.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Add an unnamed node with the default period. Input slots start unbound.
    pub fn add(&mut self, kind: OperatorKind) -> GraphResult<NodeId> {
        let operator = Operator::new(kind, self.default_period)?;
        Ok(self.push(None, operator))
    }

    /// Add a node with a per-node period override.
    pub fn add_with_period(&mut self, kind: OperatorKind, seconds: f64) -> GraphResult<NodeId> {
        let operator = Operator::with_period_seconds(kind, seconds)?;
        Ok(self.push(None, operator))
    }

    /// Add a named node. Names key the node for publishing and lookup.
    pub fn add_named(&mut self, name: impl Into<String>, kind: OperatorKind) -> GraphResult<NodeId> {
        let name = name.into();
        if self.names.contains_key(&name) {
            return Err(GraphError::DuplicateName { name });
        }
        let id = self.add(kind)?;
        self.set_name(id, name)?;
        Ok(id)
    }

    /// Add a node and bind its input slots in order.
    pub fn add_wired(&mut self, kind: OperatorKind, inputs: &[NodeId]) -> GraphResult<NodeId> {
        let id = self.add(kind)?;
        self.wire(id, inputs)?;
        Ok(id)
    }

    /// Name (or rename) a node.
    pub fn set_name(&mut self, id: NodeId, name: impl Into<String>) -> GraphResult<()> {
        let name = name.into();
        if let Some(&owner) = self.names.get(&name) {
            if owner != id {
                return Err(GraphError::DuplicateName { name });
            }
        }
        let node = self
            .nodes
            .get_mut(id.slot())
            .ok_or(GraphError::UnknownNode { node: id })?;
        if let Some(old) = node.name.replace(name.clone()) {
            self.names.remove(&old);
        }
        self.names.insert(name, id);
        Ok(())
    }

    /// Bind input `slot` of `to` to the output of `from`.
    pub fn connect(&mut self, from: NodeId, to: NodeId, slot: usize) -> GraphResult<()> {
        if from.slot() >= self.nodes.len() {
            return Err(GraphError::UnknownNode { node: from });
        }
        let node = self
            .nodes
            .get_mut(to.slot())
            .ok_or(GraphError::UnknownNode { node: to })?;
        let count = node.inputs.len();
        let input = node.inputs.get_mut(slot).ok_or(GraphError::SlotOutOfRange {
            node: to,
            slot,
            count,
        })?;
        *input = Some(from);
        Ok(())
    }

    /// Bind slots `0..inputs.len()` of `to`.
    pub fn wire(&mut self, to: NodeId, inputs: &[NodeId]) -> GraphResult<()> {
        for (slot, &from) in inputs.iter().enumerate() {
            self.connect(from, to, slot)?;
        }
        Ok(())
    }

    /// Validate and freeze the graph, declaring `roots` as its sink nodes.
    ///
    /// Fails with `UninitializedInput` for unbound slots and with
    /// `CycleDetected` if any node transitively depends on itself. The nodes
    /// reachable from the roots are scheduled in dependency order for `tick`.
    pub fn build(self, roots: &[NodeId]) -> GraphResult<Graph> {
        let checked = validate::resolve_inputs(&self.nodes, roots).and_then(|inputs| {
            validate::check_acyclic(&inputs, roots).map(|eval| (inputs, eval))
        });
        let (inputs, mut eval) = match checked {
            Ok(checked) => checked,
            Err(err) => {
                warn!(error = %err, nodes = self.nodes.len(), "rejected control graph");
                return Err(err);
            }
        };

        let (consumer_offsets, consumers) = Self::build_consumers(&inputs);
        let max_arity = inputs.iter().map(Vec::len).max().unwrap_or(0);
        let node_count = inputs.len();
        eval.order.truncate(eval.from_roots);

        let nodes: Vec<NodeRecord> = self
            .nodes
            .into_iter()
            .zip(inputs)
            .enumerate()
            .map(|(i, (pending, inputs))| NodeRecord {
                id: NodeId::from_index(i as u32),
                name: pending.name,
                inputs,
                operator: pending.operator,
                last_epoch: None,
                value: 0.0,
            })
            .collect();

        let sinks = roots
            .iter()
            .map(|&node| SinkOutput { node, value: 0.0 })
            .collect();

        debug!(
            nodes = nodes.len(),
            roots = roots.len(),
            stateful = nodes.iter().filter(|n| n.kind().is_stateful()).count(),
            "built control graph"
        );

        Ok(Graph {
            nodes,
            roots: roots.to_vec(),
            names: self.names,
            consumer_offsets,
            consumers,
            schedule: eval.order,
            last_tick: None,
            active: None,
            sinks,
            scratch: Vec::with_capacity(max_arity),
            pending: Vec::with_capacity(node_count),
        })
    }

    fn push(&mut self, name: Option<String>, operator: Operator) -> NodeId {
        let id = NodeId::from_index(self.nodes.len() as u32);
        let arity = operator.kind().input_count();
        self.nodes.push(PendingNode {
            name,
            operator,
            inputs: vec![None; arity],
        });
        id
    }

    /// Compact consumer lists: node i's consumers are
    /// `consumers[offsets[i]..offsets[i + 1]]`, sorted by ID.
    fn build_consumers(inputs: &[Vec<NodeId>]) -> (Vec<usize>, Vec<NodeId>) {
        let mut per_node: Vec<Vec<NodeId>> = vec![Vec::new(); inputs.len()];
        for (i, node_inputs) in inputs.iter().enumerate() {
            let consumer = NodeId::from_index(i as u32);
            for input in node_inputs {
                let list = &mut per_node[input.slot()];
                if list.last() != Some(&consumer) {
                    list.push(consumer);
                }
            }
        }

        let mut offsets = Vec::with_capacity(inputs.len() + 1);
        let mut flat = Vec::new();
        offsets.push(0);
        for list in per_node {
            flat.extend(list);
            offsets.push(flat.len());
        }
        (offsets, flat)
    }
}
