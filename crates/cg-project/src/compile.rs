//! Compile a validated loop definition into a runnable graph.

use std::collections::HashMap;

use cg_core::{NodeId, Period, hz};
use cg_graph::{Graph, GraphBuilder};
use cg_nodes::{OperatorKind, PidGains, SummerConfig};
use tracing::debug;

use crate::ProjectResult;
use crate::schema::{LoopDef, NodeKindDef};
use crate::validate::{ValidationError, validate_loop};

/// A built graph plus the node names to republish each tick.
#[derive(Debug)]
pub struct CompiledLoop {
    pub name: String,
    pub graph: Graph,
    /// Sinks first, then nodes flagged `publish`, without duplicates. These
    /// are the graph's roots, in the same order.
    pub published: Vec<String>,
}

/// Validate `def` and build its graph. Every node is named by its ID.
pub fn compile(def: &LoopDef) -> ProjectResult<CompiledLoop> {
    validate_loop(def)?;

    let period = match (def.period_s, def.rate_hz) {
        (Some(period), _) => period,
        (None, Some(rate)) => {
            Period::from_frequency(hz(rate)).map_err(cg_graph::GraphError::from)?
        }
        (None, None) => Period::default(),
    };
    let mut builder = GraphBuilder::with_period(period.seconds())?;

    let mut ids: HashMap<&str, NodeId> = HashMap::with_capacity(def.nodes.len());
    for node in &def.nodes {
        let kind = operator_kind(&node.kind)?;
        let id = match node.period_s {
            Some(period) => builder.add_with_period(kind, period.seconds())?,
            None => builder.add(kind)?,
        };
        builder.set_name(id, node.id.as_str())?;
        ids.insert(node.id.as_str(), id);
    }

    let lookup = |id: &str, context: &str| {
        ids.get(id)
            .copied()
            .ok_or_else(|| ValidationError::MissingReference {
                id: id.to_string(),
                context: context.to_string(),
            })
    };

    for node in &def.nodes {
        let to = lookup(&node.id, "nodes")?;
        for (slot, input) in node.inputs.iter().enumerate() {
            builder.connect(lookup(input, "inputs")?, to, slot)?;
        }
    }

    let mut published = def.sinks.clone();
    for node in def.nodes.iter().filter(|n| n.publish) {
        if !published.contains(&node.id) {
            published.push(node.id.clone());
        }
    }

    // Published nodes are roots as well, so every tick evaluates them.
    let roots = published
        .iter()
        .map(|s| lookup(s, "sinks"))
        .collect::<Result<Vec<NodeId>, _>>()?;
    let graph = builder.build(&roots)?;

    debug!(name = %def.name, nodes = graph.len(), "compiled loop definition");

    Ok(CompiledLoop {
        name: def.name.clone(),
        graph,
        published,
    })
}

fn operator_kind(def: &NodeKindDef) -> ProjectResult<OperatorKind> {
    let kind = match def {
        NodeKindDef::Constant { value } => OperatorKind::constant(*value),
        NodeKindDef::Input { initial } => OperatorKind::input(*initial),
        NodeKindDef::Gain { k } => OperatorKind::gain(*k),
        NodeKindDef::Summer {
            signs,
            continuous,
            tolerance,
        } => OperatorKind::Summer(SummerConfig {
            signs: signs.clone(),
            continuous: *continuous,
            tolerance: tolerance.unwrap_or_default(),
        }),
        NodeKindDef::Limiter { lo, hi } => OperatorKind::limiter(*lo, *hi),
        NodeKindDef::Integrator { initial } => OperatorKind::Integrator { initial: *initial },
        NodeKindDef::Differentiator { initial_previous } => OperatorKind::Differentiator {
            initial_previous: *initial_previous,
        },
        NodeKindDef::Delay { depth, initial } => OperatorKind::Delay {
            depth: *depth,
            initial: *initial,
        },
        NodeKindDef::Profile(profile) => OperatorKind::Profile(*profile),
        NodeKindDef::Pid {
            kp,
            ki,
            kd,
            out_min,
            out_max,
        } => {
            let gains = PidGains::new(
                *kp,
                *ki,
                *kd,
                out_min.unwrap_or(f64::NEG_INFINITY),
                out_max.unwrap_or(f64::INFINITY),
            )
            .map_err(cg_graph::GraphError::from)?;
            OperatorKind::Pid(gains)
        }
    };
    Ok(kind)
}
