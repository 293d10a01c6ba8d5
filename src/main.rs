//! Notegraph - command-line entry point
//!
//! Adds notes interactively or one at a time, rebuilds the concept graph from
//! the note store, and prints insight queries over the saved graph.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use notegraph::concepts::{ConceptExtractor, HttpConceptExtractor};
use notegraph::graph::{self, KnowledgeGraph};
use notegraph::orchestrator::Orchestrator;
use notegraph::store::{NoteStore, SqliteNoteStore};
use notegraph::Config;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "notegraph")]
#[command(about = "Concept graph over your notes")]
struct Cli {
    /// YAML config file (default: ./notegraph.yaml)
    #[arg(short, long, env = "NOTEGRAPH_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Add notes. Without --text, reads notes from stdin until "exit"
    Add {
        /// Single note to add
        #[arg(short, long)]
        text: Option<String>,
    },

    /// Re-extract all concepts and rebuild the graph from the note store
    Rebuild,

    /// Re-extract the concepts of every stored note
    UpdateConcepts,

    /// Print graph statistics
    Stats,

    /// Print the notes most related to a node
    Related {
        /// Node id
        id: i64,

        #[arg(short, long, default_value = "5")]
        limit: usize,
    },

    /// Print groups of connected notes
    Clusters,

    /// Print the most common concepts
    Concepts {
        #[arg(short, long, default_value = "10")]
        limit: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,notegraph=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = Config::from_yaml_and_env(cli.config.as_deref())?;

    match cli.command {
        Commands::Add { text } => {
            let mut orch = open_orchestrator(config).await?;
            match text {
                Some(text) => add_one(&mut orch, &text).await,
                None => run_interactive(&mut orch).await,
            }
        }
        Commands::Rebuild => {
            let mut orch = open_orchestrator(config).await?;
            let report = orch.rebuild().await?;
            println!(
                "Graph rebuilt: {} nodes, {} edges, {} vertices ({} concept updates failed)",
                report.nodes, report.edges, report.vertices, report.concepts.failed
            );
            Ok(())
        }
        Commands::UpdateConcepts => {
            let orch = open_orchestrator(config).await?;
            let report = orch.update_all_concepts().await?;
            println!(
                "Concepts updated for {} notes ({} failed)",
                report.updated, report.failed
            );
            Ok(())
        }
        Commands::Stats => {
            let kg = load_saved_graph(&config)?;
            print_json(&graph::graph_stats(&kg))
        }
        Commands::Related { id, limit } => {
            let kg = load_saved_graph(&config)?;
            if !kg.contains_node(id) {
                anyhow::bail!("Node {} not found in {}", id, config.graph_path.display());
            }
            print_json(&graph::related_notes(&kg, id, limit))
        }
        Commands::Clusters => {
            let kg = load_saved_graph(&config)?;
            print_json(&graph::concept_clusters(&kg))
        }
        Commands::Concepts { limit } => {
            let kg = load_saved_graph(&config)?;
            print_json(&graph::top_concepts(&kg, limit))
        }
    }
}

async fn open_orchestrator(config: Config) -> Result<Orchestrator> {
    if config.extractor.api_key.is_none() {
        tracing::warn!("No API key set (OPENAI_API_KEY / MY_SECRET); requests are unauthenticated");
    }
    let extractor: Arc<dyn ConceptExtractor> =
        Arc::new(HttpConceptExtractor::from_config(&config.extractor)?);
    let store: Arc<dyn NoteStore> = Arc::new(SqliteNoteStore::open(&config.store_path)?);
    tracing::info!(
        "Using model {} with {} scoring",
        extractor.model_name(),
        config.scoring
    );

    Ok(Orchestrator::open(config, extractor, store).await?)
}

fn load_saved_graph(config: &Config) -> Result<KnowledgeGraph> {
    graph::load_graph(&config.graph_path)
        .with_context(|| format!("Failed to load graph from {}", config.graph_path.display()))
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn add_one(orch: &mut Orchestrator, text: &str) -> Result<()> {
    let added = orch.add_note(text).await?;
    println!("Note Added!");
    println!(
        "Graph Updated! (node {}, {} new edges, {} new vertices)",
        added.node_id, added.edges_added, added.vertices_added
    );
    Ok(())
}

/// Read notes line by line until "exit" or end of input.
///
/// A failed note is reported and the loop keeps going.
async fn run_interactive(orch: &mut Orchestrator) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    loop {
        stdout.write_all(b"Enter a note (or 'exit' to quit): ").await?;
        stdout.flush().await?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let text = line.trim();
        if text == "exit" {
            break;
        }
        if text.is_empty() {
            continue;
        }

        if let Err(e) = add_one(orch, text).await {
            eprintln!("Error: {:#}", e);
        }
    }
    Ok(())
}
