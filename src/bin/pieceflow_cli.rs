//! Pieceflow CLI - JSON front end for the workflow core
//!
//! Commands: catalog, resolve, validate, replay
//! Outputs JSON to stdout, logs to stderr
//! Returns non-zero on an invalid workflow

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pieceflow_core::{
    ensure_finite, resolve_drop_detailed, CommandOutcome, PieceCatalog, Point, ValidationReport,
    Workflow, WorkflowCommand, CORE_VERSION,
};

/// Used when `RUST_LOG` is unset; covers the library and this binary.
const DEFAULT_LOG_FILTER: &str = "pieceflow_core=info,pieceflow_cli=info";

#[derive(Parser)]
#[command(name = "pieceflow-cli")]
#[command(about = "Pieceflow CLI - interlocking workflow pieces")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to a JSON piece catalog (built-in catalog when omitted)
    #[arg(short, long)]
    catalog: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// List available piece types
    Catalog,

    /// Resolve where a piece lands when dropped
    Resolve {
        /// Piece type ID
        #[arg(short, long)]
        piece: String,

        #[arg(short, long, allow_negative_numbers = true)]
        x: f64,

        #[arg(short, long, allow_negative_numbers = true)]
        y: f64,

        /// JSON layout of pieces already on the canvas
        #[arg(short, long, default_value = "[]")]
        layout: String,
    },

    /// Drop a layout in order and validate the result
    Validate {
        /// JSON layout: [{"pieceType": "...", "x": 0, "y": 0}, ...]
        #[arg(short, long)]
        layout: String,
    },

    /// Apply a script of workflow commands
    Replay {
        /// JSON array of commands
        #[arg(short, long)]
        script: String,
    },
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LayoutEntry {
    piece_type: String,
    x: f64,
    y: f64,
}

#[derive(Serialize)]
struct ReplayOutput {
    outcomes: Vec<CommandOutcome>,
    workflow: pieceflow_core::WorkflowSnapshot,
}

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let catalog = match &cli.catalog {
        Some(path) => match PieceCatalog::load_from_file(path) {
            Ok(c) => c,
            Err(e) => {
                print_error(&format!("Failed to load catalog: {}", e));
                return ExitCode::FAILURE;
            }
        },
        None => PieceCatalog::builtin(),
    };

    tracing::info!(version = CORE_VERSION, pieces = catalog.len(), "catalog ready");

    match cli.command {
        Commands::Catalog => {
            let types: Vec<_> = catalog.list().iter().map(|t| t.as_ref()).collect();
            print_json(&types);
            ExitCode::SUCCESS
        }

        Commands::Resolve { piece, x, y, layout } => {
            let Some(moving) = catalog.get(&piece).cloned() else {
                print_error(&format!("Unknown piece type: {}", piece));
                return ExitCode::FAILURE;
            };
            let workflow = match build_layout(&catalog, &layout) {
                Ok(w) => w,
                Err(code) => return code,
            };

            let raw = match ensure_finite(Point::new(x, y)) {
                Ok(p) => p,
                Err(e) => {
                    print_error(&e.to_string());
                    return ExitCode::FAILURE;
                }
            };

            let resolution = resolve_drop_detailed(&moving, raw, workflow.pieces());
            print_json(&resolution);
            ExitCode::SUCCESS
        }

        Commands::Validate { layout } => {
            let workflow = match build_layout(&catalog, &layout) {
                Ok(w) => w,
                Err(code) => return code,
            };

            let report = ValidationReport::build(workflow.pieces(), &catalog);
            print_json(&report);
            if report.valid {
                ExitCode::SUCCESS
            } else {
                ExitCode::from(2) // Invalid workflow
            }
        }

        Commands::Replay { script } => {
            let commands: Vec<WorkflowCommand> = match serde_json::from_str(&script) {
                Ok(c) => c,
                Err(e) => {
                    print_error(&format!("Invalid script: {}", e));
                    return ExitCode::FAILURE;
                }
            };

            let mut workflow = Workflow::new();
            let mut outcomes = Vec::with_capacity(commands.len());
            for command in commands {
                match workflow.apply(&catalog, command) {
                    Ok(outcome) => outcomes.push(outcome),
                    Err(e) => {
                        print_error(&e.to_string());
                        return ExitCode::FAILURE;
                    }
                }
            }

            print_json(&ReplayOutput {
                outcomes,
                workflow: workflow.snapshot(),
            });
            ExitCode::SUCCESS
        }
    }
}

/// Drop every layout entry, in order, into a fresh workflow.
fn build_layout(catalog: &PieceCatalog, layout: &str) -> Result<Workflow, ExitCode> {
    let entries: Vec<LayoutEntry> = serde_json::from_str(layout).map_err(|e| {
        print_error(&format!("Invalid layout: {}", e));
        ExitCode::FAILURE
    })?;

    let mut workflow = Workflow::new();
    for entry in entries {
        workflow
            .drop_piece(catalog, &entry.piece_type, Point::new(entry.x, entry.y))
            .map_err(|e| {
                print_error(&e.to_string());
                ExitCode::FAILURE
            })?;
    }
    Ok(workflow)
}

fn print_json<T: Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => print_error(&format!("Serialization error: {}", e)),
    }
}

fn print_error(message: &str) {
    println!("{}", serde_json::json!({ "success": false, "error": message }));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter_covers_both_targets() {
        assert!(DEFAULT_LOG_FILTER.parse::<tracing_subscriber::EnvFilter>().is_ok());
        for target in ["pieceflow_core", "pieceflow_cli"] {
            assert!(DEFAULT_LOG_FILTER.split(',').any(|d| d.starts_with(target)), "{}", target);
        }
    }

    #[test]
    fn test_layout_rejects_unknown_piece() {
        let catalog = PieceCatalog::builtin();
        let layout = r#"[{"pieceType": "user-input", "x": 0, "y": 0}]"#;
        assert_eq!(build_layout(&catalog, layout).unwrap().len(), 1);
        assert!(build_layout(&catalog, r#"[{"pieceType": "laser", "x": 0, "y": 0}]"#).is_err());
    }
}
