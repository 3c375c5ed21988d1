use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use dotenv::dotenv;
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;

use bpm_core::{
    EngineConfig, GraphLoader, InMemoryRuleRegistry, SimulationEngine, StepOutcome,
    ValidationEngine, ValidationResult,
};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Engine configuration file (YAML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Validate a workflow graph
    Validate {
        /// Path to the graph file
        #[arg(short, long)]
        file: PathBuf,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Simulate a workflow graph from its start node
    Simulate {
        /// Path to the graph file
        #[arg(short, long)]
        file: PathBuf,

        /// Start node id (defaults to the first start node)
        #[arg(short, long)]
        start: Option<String>,

        /// Initial variable as name=json, may be repeated
        #[arg(long = "var", value_parser = parse_var)]
        vars: Vec<(String, Value)>,

        /// Override the step budget
        #[arg(long)]
        max_steps: Option<usize>,
    },
}

/// Parse `name=json`; values that are not valid JSON are taken as strings
fn parse_var(raw: &str) -> Result<(String, Value), String> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected name=value, got '{}'", raw))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("missing variable name in '{}'", raw));
    }
    let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
    Ok((name.to_string(), value))
}

fn load_config(path: Option<&PathBuf>) -> Result<EngineConfig> {
    let config = match path {
        Some(path) => EngineConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => EngineConfig::default(),
    };
    Ok(config.apply_env()?)
}

fn print_result(result: &ValidationResult) {
    for issue in result.errors.iter().chain(result.warnings.iter()) {
        println!("[{}] {}: {}", issue.severity, issue.id, issue.message);
    }
    println!(
        "{} ({} errors, {} warnings)",
        if result.valid { "Valid" } else { "Invalid" },
        result.errors.len(),
        result.warnings.len()
    );
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    env_logger::init();

    let args = Args::parse();
    let config = load_config(args.config.as_ref())?;
    let loader = GraphLoader::new();

    match args.command {
        Commands::Validate { file, json } => {
            let graph = loader
                .load_graph(&file)
                .with_context(|| format!("Failed to load graph {}", file.display()))?;

            let engine = ValidationEngine::new(Arc::new(InMemoryRuleRegistry::new()))
                .with_config(config.validation);
            let result = engine.validate_workflow(&graph.nodes, &graph.edges).await;

            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                print_result(&result);
            }
            if !result.valid {
                std::process::exit(1);
            }
        }
        Commands::Simulate {
            file,
            start,
            vars,
            max_steps,
        } => {
            let graph = loader
                .load_graph(&file)
                .with_context(|| format!("Failed to load graph {}", file.display()))?;

            let mut simulation = config.simulation;
            if let Some(max_steps) = max_steps {
                anyhow::ensure!(max_steps > 0, "--max-steps must be greater than zero");
                simulation.max_steps = max_steps;
            }

            let mut engine = SimulationEngine::new(simulation);
            for (name, value) in vars {
                engine.set_variable(name, value);
            }
            engine.start(&graph, start.as_deref())?;

            loop {
                let outcome = engine.step(&graph);
                println!("{}", serde_json::to_string(&outcome)?);
                if !matches!(outcome, StepOutcome::Advanced { .. }) {
                    break;
                }
            }
            println!("{}", serde_json::to_string_pretty(engine.state())?);
        }
    }

    Ok(())
}
