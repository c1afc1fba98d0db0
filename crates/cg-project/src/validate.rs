//! Loop definition validation.
//!
//! Checks references and arities by ID. Operator parameters and acyclicity
//! are checked when the graph is compiled.

use std::collections::HashSet;

use crate::LATEST_VERSION;
use crate::schema::LoopDef;

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Duplicate ID: {id} in {context}")]
    DuplicateId { id: String, context: String },

    #[error("Missing reference: {id} in {context}")]
    MissingReference { id: String, context: String },

    #[error("Invalid value: {field} = {value} ({reason})")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Unsupported version: {version}")]
    UnsupportedVersion { version: u32 },
}

pub fn validate_loop(def: &LoopDef) -> Result<(), ValidationError> {
    if def.version == 0 || def.version > LATEST_VERSION {
        return Err(ValidationError::UnsupportedVersion {
            version: def.version,
        });
    }

    // `period_s` is a `Period`, validated as it is deserialized.
    if let Some(rate) = def.rate_hz {
        if def.period_s.is_some() {
            return Err(ValidationError::InvalidValue {
                field: "rate_hz".to_string(),
                value: rate.to_string(),
                reason: "give either period_s or rate_hz, not both".to_string(),
            });
        }
        if !(rate > 0.0 && rate.is_finite()) {
            return Err(ValidationError::InvalidValue {
                field: "rate_hz".to_string(),
                value: rate.to_string(),
                reason: "must be positive and finite".to_string(),
            });
        }
    }

    let mut node_ids = HashSet::new();
    for node in &def.nodes {
        if !node_ids.insert(node.id.as_str()) {
            return Err(ValidationError::DuplicateId {
                id: node.id.clone(),
                context: "nodes".to_string(),
            });
        }
    }

    for node in &def.nodes {
        let expected = node.kind.input_count();
        if node.inputs.len() != expected {
            return Err(ValidationError::InvalidValue {
                field: format!("nodes.{}.inputs", node.id),
                value: node.inputs.len().to_string(),
                reason: format!("expected {expected} inputs"),
            });
        }
        for input in &node.inputs {
            if !node_ids.contains(input.as_str()) {
                return Err(ValidationError::MissingReference {
                    id: input.clone(),
                    context: format!("inputs of node {}", node.id),
                });
            }
        }
    }

    if def.sinks.is_empty() {
        return Err(ValidationError::InvalidValue {
            field: "sinks".to_string(),
            value: "[]".to_string(),
            reason: "at least one sink is required".to_string(),
        });
    }
    let mut sink_ids = HashSet::new();
    for sink in &def.sinks {
        if !node_ids.contains(sink.as_str()) {
            return Err(ValidationError::MissingReference {
                id: sink.clone(),
                context: "sinks".to_string(),
            });
        }
        if !sink_ids.insert(sink.as_str()) {
            return Err(ValidationError::DuplicateId {
                id: sink.clone(),
                context: "sinks".to_string(),
            });
        }
    }

    Ok(())
}
