//! Veritant CLI — run the triangulation engine over a collected evidence
//! file and emit the gate verdict, metrics, and clusters as JSON.
//!
//! The CLI performs no collection: it is the seam where an external
//! pipeline hands evidence in and takes gate decisions out.

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use veritant_core::{EngineConfig, EvidenceItem, Intent, TriangulationEngine, create_embedder};

/// Veritant: evidence triangulation and quality gating
#[derive(Parser, Debug)]
#[command(name = "veritant", version, about, long_about = None)]
struct Cli {
    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Run the engine over an evidence JSON file
    Run {
        /// Path to a JSON array of evidence items
        #[arg(short, long)]
        evidence: PathBuf,

        /// The research topic/query text
        #[arg(short, long)]
        topic: String,

        /// Externally classified intent (stats, travel, medical, default);
        /// classified from the topic when omitted
        #[arg(short, long)]
        intent: Option<String>,

        /// Apply strict thresholds
        #[arg(long)]
        strict: bool,

        /// Configuration file path
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Pretty-print the JSON output
        #[arg(long)]
        pretty: bool,
    },
    /// Print the resolved threshold bundle for an intent
    Thresholds {
        /// Intent name (stats, travel, medical, default)
        #[arg(short, long, default_value = "default")]
        intent: String,

        /// Show the strict variant
        #[arg(long)]
        strict: bool,

        /// Configuration file path
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Run {
            evidence,
            topic,
            intent,
            strict,
            config,
            pretty,
        } => {
            let config = EngineConfig::load(config.as_deref())?;
            let intent = match intent {
                Some(name) => Some(name.parse::<Intent>()?),
                None => None,
            };

            let raw = std::fs::read_to_string(&evidence)
                .with_context(|| format!("reading evidence file {}", evidence.display()))?;
            let items: Vec<EvidenceItem> =
                serde_json::from_str(&raw).context("parsing evidence JSON")?;
            tracing::info!(count = items.len(), "loaded evidence");

            let embedder = Arc::from(create_embedder(&config.embedding));
            let engine = TriangulationEngine::new(config, embedder);
            let outcome = engine.run(items, &topic, intent, strict)?;

            let json = if pretty {
                serde_json::to_string_pretty(&outcome)?
            } else {
                serde_json::to_string(&outcome)?
            };
            println!("{json}");

            // A failed gate is a first-class outcome; signal it through the
            // exit code so pipelines can branch without parsing JSON.
            if !outcome.verdict.passed {
                std::process::exit(2);
            }
        }
        Commands::Thresholds {
            intent,
            strict,
            config,
        } => {
            let config = EngineConfig::load(config.as_deref())?;
            let intent = intent.parse::<Intent>()?;
            let thresholds = config.thresholds.resolve(intent, strict)?;
            println!("{}", serde_json::to_string_pretty(&thresholds)?);
        }
    }

    Ok(())
}

fn init_tracing(verbosity: u8) {
    let default = match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("veritant={default}")));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}
