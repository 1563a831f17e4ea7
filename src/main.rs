//! # Opdex CLI
//!
//! Command-line driver for the semantic operation matcher.
//!
//! ```bash
//! opdex init                          # build or load the persisted index
//! opdex match "what's my cpu load"    # print ranked matching operations
//! opdex ops                           # list the operation catalog
//! opdex rebuild                       # discard the persisted index and repopulate
//! ```
//!
//! All commands accept a `--config` flag pointing to a TOML file; when
//! the file is absent, built-in defaults are used (local embeddings,
//! index under `./vector_db`).

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use opdex::config::{self, Config};
use opdex::embedding::create_provider;
use opdex::index::{CONFIG_FILE, INDEX_FILE, METADATA_FILE};
use opdex::{CatalogProvider, Matcher, StaticCatalog};

/// Opdex — match free-text requests to registered automation operations
/// via embedding search.
#[derive(Parser)]
#[command(
    name = "opdex",
    about = "Semantic operation matcher — maps free-text requests to registered automation operations",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/opdex.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the vector index from the catalog, or load it if already
    /// persisted. Idempotent.
    Init,

    /// Match a request against the catalog and print the ranked
    /// candidate operations.
    Match {
        /// The free-text request to match.
        query: String,

        /// How many candidates to return (defaults to matcher.default_k).
        #[arg(long)]
        k: Option<i64>,
    },

    /// List the operation catalog.
    Ops,

    /// Discard the persisted index and repopulate it from the catalog.
    Rebuild,
}

fn load_catalog(config: &Config) -> Result<StaticCatalog> {
    match &config.catalog {
        Some(path) => StaticCatalog::builtin_with_extra(path)
            .with_context(|| format!("Failed to load catalog file: {}", path.display())),
        None => Ok(StaticCatalog::builtin()),
    }
}

fn build_matcher(config: &Config) -> Result<Matcher> {
    let provider =
        create_provider(&config.embedding).context("Failed to initialize embedding provider")?;
    let catalog = load_catalog(config)?;
    Ok(Matcher::new(
        provider,
        Box::new(catalog),
        config.index.dir.clone(),
    ))
}

async fn run_init(config: &Config) -> Result<()> {
    let matcher = build_matcher(config)?;
    let index = matcher.initialize().await?;
    println!(
        "Index ready: {} operations, dimension {}, persisted at {}",
        index.len(),
        index.dimension(),
        config.index.dir.display()
    );
    Ok(())
}

async fn run_match(config: &Config, query: &str, k: Option<i64>) -> Result<()> {
    let k = k.unwrap_or(config.matcher.default_k);
    let matcher = build_matcher(config)?;
    let matches = matcher.find_matching_function(query, k).await?;

    if matches.is_empty() {
        println!("No matching operations.");
        return Ok(());
    }
    for (rank, op) in matches.iter().enumerate() {
        println!(
            "{}. {} [{}] — {}",
            rank + 1,
            op.name,
            op.category,
            op.description
        );
        if !op.parameters.is_empty() {
            println!("   parameters: {}", op.parameters.join(", "));
        }
    }
    Ok(())
}

fn run_ops(config: &Config) -> Result<()> {
    let catalog = load_catalog(config)?;
    for op in catalog.list_operations() {
        println!("{} [{}] — {}", op.name, op.category, op.description);
    }
    Ok(())
}

async fn run_rebuild(config: &Config) -> Result<()> {
    // Remove only the three index artifacts; the directory may be shared.
    for name in [INDEX_FILE, METADATA_FILE, CONFIG_FILE] {
        let path = config.index.dir.join(name);
        if path.exists() {
            std::fs::remove_file(&path)
                .with_context(|| format!("Failed to remove {}", path.display()))?;
        }
    }
    run_init(config).await
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = config::load_config_or_default(&cli.config)?;

    match cli.command {
        Commands::Init => run_init(&config).await,
        Commands::Match { query, k } => run_match(&config, &query, k).await,
        Commands::Ops => run_ops(&config),
        Commands::Rebuild => run_rebuild(&config).await,
    }
}
