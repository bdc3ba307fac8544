use anyhow::Context;
use clap::{Parser, Subcommand};
use dotenv::dotenv;
use std::fs;
use std::path::{Path, PathBuf};

use workflow_canvas::workflow::graph::ConnectionCandidate;
use workflow_canvas::{EditSession, EditorConfig, GestureEvent, WorkflowLoader};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Editor config file (YAML or JSON). CANVAS_* env vars override it.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Load a workflow document and summarise the graph
    Inspect {
        /// Path to the workflow document
        #[arg(short, long)]
        file: PathBuf,
    },
    /// Check whether a connection would be admitted
    Check {
        #[arg(short, long)]
        file: PathBuf,

        #[arg(short, long)]
        source: String,

        #[arg(short, long)]
        target: String,
    },
    /// Replay a gesture script against a workflow and print the result
    Replay {
        #[arg(short, long)]
        file: PathBuf,

        /// JSON or YAML list of gesture events
        #[arg(short, long)]
        gestures: PathBuf,
    },
}

fn load_config(path: Option<&Path>) -> anyhow::Result<EditorConfig> {
    match path {
        Some(p) => {
            let base = EditorConfig::from_file(p)
                .with_context(|| format!("Failed to read config {}", p.display()))?;
            Ok(base.with_overrides(|key| std::env::var(key).ok())?)
        }
        None => Ok(EditorConfig::from_env()?),
    }
}

fn main() -> anyhow::Result<()> {
    dotenv().ok();
    env_logger::init();

    let args = Args::parse();
    let config = load_config(args.config.as_deref())?;
    let loader = WorkflowLoader::new();

    match args.command {
        Commands::Inspect { file } => {
            let graph = loader
                .load_file(&file)
                .with_context(|| format!("Cannot start session from {}", file.display()))?;

            let doc = graph.to_document();
            println!("{} nodes, {} edges", graph.node_count(), graph.edge_count());
            for node in &doc.nodes {
                println!(
                    "  node {} [{}] '{}' at ({}, {})",
                    node.id, node.node_type, node.data.label, node.position.x, node.position.y
                );
            }
            for edge in &doc.edges {
                println!(
                    "  edge {}: {} -> {} [{}]",
                    edge.id, edge.source, edge.target, edge.edge_type
                );
            }
        }
        Commands::Check {
            file,
            source,
            target,
        } => {
            let graph = loader
                .load_file(&file)
                .with_context(|| format!("Cannot start session from {}", file.display()))?;
            let session = EditSession::from_config(graph, &config);
            let candidate = ConnectionCandidate::new(source, target);

            match session
                .store()
                .validator()
                .check(&candidate, session.graph())
            {
                Ok(()) => println!("valid: {} -> {}", candidate.source, candidate.target),
                Err(reason) => println!(
                    "invalid: {} -> {} ({})",
                    candidate.source, candidate.target, reason
                ),
            }
        }
        Commands::Replay { file, gestures } => {
            let graph = loader
                .load_file(&file)
                .with_context(|| format!("Cannot start session from {}", file.display()))?;
            let script = fs::read_to_string(&gestures)
                .with_context(|| format!("Failed to read {}", gestures.display()))?;
            let events: Vec<GestureEvent> = serde_yaml::from_str(&script)
                .with_context(|| format!("Invalid gesture script {}", gestures.display()))?;

            let mut session = EditSession::from_config(graph, &config);
            for (i, event) in events.into_iter().enumerate() {
                match session.handle(event) {
                    Ok(feedback) => log::info!("event {}: {:?}", i, feedback),
                    Err(e) => log::warn!("event {}: {}", i, e),
                }
            }

            let document = session.finish().to_document();
            println!("{}", serde_json::to_string_pretty(&document)?);
        }
    }

    Ok(())
}
