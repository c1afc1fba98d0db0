//! cg-project: loop definition file format, validation and compilation.
//!
//! A loop definition lists nodes by string ID, wires them by referencing
//! other IDs as inputs, and names the sinks the scheduler reads each tick.

pub mod compile;
pub mod schema;
pub mod validate;

pub use compile::{CompiledLoop, compile};
pub use schema::*;
pub use validate::{ValidationError, validate_loop};

pub const LATEST_VERSION: u32 = 1;

pub type ProjectResult<T> = Result<T, ProjectError>;

#[derive(thiserror::Error, Debug)]
pub enum ProjectError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Graph error: {0}")]
    Graph(#[from] cg_graph::GraphError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub fn from_yaml_str(content: &str) -> ProjectResult<LoopDef> {
    let def: LoopDef = serde_yaml::from_str(content)?;
    validate_loop(&def)?;
    Ok(def)
}

pub fn load_yaml(path: &std::path::Path) -> ProjectResult<LoopDef> {
    let content = std::fs::read_to_string(path)?;
    from_yaml_str(&content)
}

pub fn save_yaml(path: &std::path::Path, def: &LoopDef) -> ProjectResult<()> {
    validate_loop(def)?;
    let content = serde_yaml::to_string(def)?;
    std::fs::write(path, content)?;
    Ok(())
}

pub fn load_json(path: &std::path::Path) -> ProjectResult<LoopDef> {
    let content = std::fs::read_to_string(path)?;
    let def: LoopDef = serde_json::from_str(&content)?;
    validate_loop(&def)?;
    Ok(def)
}

pub fn save_json(path: &std::path::Path, def: &LoopDef) -> ProjectResult<()> {
    validate_loop(def)?;
    let content = serde_json::to_string_pretty(def)?;
    std::fs::write(path, content)?;
    Ok(())
}

/// Load a definition, choosing the format from the file extension.
pub fn load(path: &std::path::Path) -> ProjectResult<LoopDef> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("json") => load_json(path),
        _ => load_yaml(path),
    }
}
