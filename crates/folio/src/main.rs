//! Folio CLI - tag-driven image filing and near-duplicate detection.
//!
//! Folio decides where a tagged image belongs, searches tagged catalogs, and
//! finds visually identical images stored under different names.
//!
//! # Usage
//!
//! ```bash
//! # Where does this image go?
//! folio classify archier yandoit final kitchen
//!
//! # Images tagged with every given tag
//! folio search --catalog catalog.json --tag kitchens --tag timber
//!
//! # Report tag spellings that collapse to the same tag
//! folio normalize --catalog catalog.json
//!
//! # Find near-duplicates under a directory
//! folio dedup ./library --output duplicates.json
//! ```

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod cli;
mod logging;

/// Folio - tag-driven image filing and near-duplicate detection.
#[derive(Parser, Debug)]
#[command(name = "folio")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long, global = true)]
    json_logs: bool,

    /// Config file to use instead of the default location
    #[arg(long, global = true, env = "FOLIO_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Compute the folder and filename for a set of tags
    Classify(cli::classify::ClassifyArgs),

    /// Search a catalog for images carrying every given tag
    Search(cli::search::SearchArgs),

    /// Report (and optionally apply) tag normalization across a catalog
    Normalize(cli::normalize::NormalizeArgs),

    /// Find near-duplicate images by perceptual hash
    Dedup(cli::dedup::DedupArgs),

    /// View and manage configuration
    Config(cli::config::ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let lenient = matches!(cli.command, Commands::Config(_));
    let config = cli::load_config(cli.config.as_deref(), lenient)?;
    logging::init_from_config(&config, cli.verbose, cli.json_logs);

    tracing::debug!("Folio v{}", folio_core::VERSION);

    match cli.command {
        Commands::Classify(args) => cli::classify::execute(args, config).await,
        Commands::Search(args) => cli::search::execute(args).await,
        Commands::Normalize(args) => cli::normalize::execute(args).await,
        Commands::Dedup(args) => cli::dedup::execute(args, config).await,
        Commands::Config(args) => cli::config::execute(args, cli.config).await,
    }
}
