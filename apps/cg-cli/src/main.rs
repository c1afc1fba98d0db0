use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use cg_core::Epoch;
use cg_graph::Publisher;
use cg_project::ProjectResult;
use tracing::info;

#[derive(Parser)]
#[command(name = "cg-cli")]
#[command(about = "Control graph CLI - validate and run control-loop definitions", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a loop definition and check that its graph builds
    Validate {
        /// Path to the loop YAML or JSON file
        loop_path: PathBuf,
    },
    /// Tick a loop and print its published values
    Run {
        /// Path to the loop YAML or JSON file
        loop_path: PathBuf,
        /// Number of epochs to tick, starting at 1
        #[arg(long, default_value_t = 10)]
        ticks: u64,
        /// Set an Input node before the first tick (repeatable)
        #[arg(long = "set", value_name = "NAME=VALUE", value_parser = parse_assignment)]
        sets: Vec<(String, f64)>,
    },
}

fn main() -> ProjectResult<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Validate { loop_path } => cmd_validate(&loop_path),
        Commands::Run {
            loop_path,
            ticks,
            sets,
        } => cmd_run(&loop_path, ticks, &sets),
    }
}

fn cmd_validate(loop_path: &Path) -> ProjectResult<()> {
    println!("Validating loop: {}", loop_path.display());
    let def = cg_project::load(loop_path)?;
    let compiled = cg_project::compile(&def)?;
    println!(
        "✓ Loop '{}' is valid ({} nodes, {} sinks)",
        compiled.name,
        compiled.graph.len(),
        compiled.graph.roots().len()
    );
    Ok(())
}

fn cmd_run(loop_path: &Path, ticks: u64, sets: &[(String, f64)]) -> ProjectResult<()> {
    let def = cg_project::load(loop_path)?;
    let mut compiled = cg_project::compile(&def)?;
    let graph = &mut compiled.graph;

    for (name, value) in sets {
        graph.set_input_by_name(name, *value)?;
    }

    info!(name = %compiled.name, ticks, "running loop");
    let mut out = TablePublisher::new(&compiled.published);
    let mut epoch = Epoch::new(1);
    for _ in 0..ticks {
        graph.tick(epoch)?;
        graph.publish(&mut out);
        epoch = epoch.next();
    }
    Ok(())
}

/// Prints one `epoch name value` row per published value.
///
/// Every compiled node is named, so values outside `published` are skipped.
struct TablePublisher<'a> {
    published: &'a [String],
    header_printed: bool,
}

impl<'a> TablePublisher<'a> {
    fn new(published: &'a [String]) -> Self {
        Self {
            published,
            header_printed: false,
        }
    }
}

impl Publisher for TablePublisher<'_> {
    fn publish(&mut self, name: &str, epoch: Epoch, value: f64) {
        if !self.published.iter().any(|p| p == name) {
            return;
        }
        if !self.header_printed {
            println!("{:>8}  {:<20} {:>14}", "epoch", "name", "value");
            self.header_printed = true;
        }
        println!("{:>8}  {:<20} {:>14.6}", epoch.value(), name, value);
    }
}

fn parse_assignment(s: &str) -> Result<(String, f64), String> {
    let (name, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got '{s}'"))?;
    let value: f64 = value
        .trim()
        .parse()
        .map_err(|e| format!("invalid value for {name}: {e}"))?;
    Ok((name.trim().to_string(), value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_assignments() {
        assert_eq!(
            parse_assignment("setpoint=1.5"),
            Ok(("setpoint".to_string(), 1.5))
        );
        assert_eq!(
            parse_assignment(" gyro = -3 "),
            Ok(("gyro".to_string(), -3.0))
        );
        assert!(parse_assignment("setpoint").is_err());
        assert!(parse_assignment("setpoint=fast").is_err());
    }

    #[test]
    fn table_publisher_filters_names() {
        let published = vec!["turn".to_string()];
        let mut out = TablePublisher::new(&published);
        out.publish("error", Epoch::new(1), 3.0);
        assert!(!out.header_printed);
        out.publish("turn", Epoch::new(1), 0.5);
        assert!(out.header_printed);
    }

    #[test]
    fn cli_parses_run() {
        let cli = Cli::try_parse_from([
            "cg-cli", "run", "loop.yaml", "--ticks", "3", "--set", "a=1", "--set", "b=2",
        ])
        .unwrap();
        match cli.command {
            Commands::Run { ticks, sets, .. } => {
                assert_eq!(ticks, 3);
                assert_eq!(sets.len(), 2);
            }
            Commands::Validate { .. } => panic!("expected run"),
        }
    }
}
