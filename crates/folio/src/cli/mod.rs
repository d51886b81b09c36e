//! Command implementations.

pub mod classify;
pub mod config;
pub mod dedup;
pub mod normalize;
pub mod search;

use std::path::Path;

use anyhow::Context;
use clap::ValueEnum;
use folio_core::Config;

/// Output format for command results.
#[derive(Clone, Copy, Debug, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text
    #[default]
    Text,
    /// Pretty-printed JSON
    Json,
}

/// Read a catalog file: a JSON array of image records.
pub fn read_catalog(path: &std::path::Path) -> anyhow::Result<Vec<folio_core::ImageRecord>> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Failed to read catalog {}: {e}", path.display()))?;
    let records = serde_json::from_str(&content)
        .map_err(|e| anyhow::anyhow!("Failed to parse catalog {}: {e}", path.display()))?;
    Ok(records)
}

/// Load the configuration from `explicit`, or the default location.
///
/// A broken config file is fatal unless `lenient` is set: classification
/// with the default vocabulary and counter would file images in the wrong
/// place and could reissue sequence numbers. Only `folio config` is lenient,
/// so a broken file can still be located and inspected.
pub fn load_config(explicit: Option<&Path>, lenient: bool) -> anyhow::Result<Config> {
    let loaded = match explicit {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    };
    match loaded {
        Ok(config) => Ok(config),
        // Logging isn't initialized yet, so the warning goes through eprintln
        Err(e) if lenient => {
            eprintln!("Warning: Failed to load config: {e}\n  Using default configuration.");
            Ok(Config::default())
        }
        Err(e) => Err(e).context("Failed to load config (run `folio config check` for details)"),
    }
}
