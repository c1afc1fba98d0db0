//! Loop definition schema.

use cg_core::Period;
use cg_nodes::{InputRange, Sign, SummerTolerance, TrapezoidProfile};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoopDef {
    pub version: u32,
    pub name: String,
    /// Default period for every node, seconds. `DEFAULT_PERIOD` when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub period_s: Option<Period>,
    /// Loop rate in Hz; an alternative to `period_s`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rate_hz: Option<f64>,
    #[serde(default)]
    pub nodes: Vec<NodeDef>,
    /// Node IDs evaluated (and reported) every tick.
    #[serde(default)]
    pub sinks: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NodeDef {
    pub id: String,
    pub kind: NodeKindDef,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub inputs: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub period_s: Option<Period>,
    /// Republish this node's value after each tick, in addition to the sinks.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub publish: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum NodeKindDef {
    Constant {
        value: f64,
    },
    Input {
        #[serde(default)]
        initial: f64,
    },
    Gain {
        k: f64,
    },
    Summer {
        signs: Vec<Sign>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        continuous: Option<InputRange>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        tolerance: Option<SummerTolerance>,
    },
    Limiter {
        lo: f64,
        hi: f64,
    },
    Integrator {
        #[serde(default)]
        initial: f64,
    },
    Differentiator {
        #[serde(default)]
        initial_previous: f64,
    },
    Delay {
        depth: usize,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        initial: Option<f64>,
    },
    Pid {
        kp: f64,
        #[serde(default)]
        ki: f64,
        #[serde(default)]
        kd: f64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        out_min: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        out_max: Option<f64>,
    },
    Profile(TrapezoidProfile),
}

impl NodeKindDef {
    /// Number of inputs the node must list.
    pub fn input_count(&self) -> usize {
        match self {
            NodeKindDef::Constant { .. }
            | NodeKindDef::Input { .. }
            | NodeKindDef::Profile(_) => 0,
            NodeKindDef::Summer { signs, .. } => signs.len(),
            _ => 1,
        }
    }
}
