//! The `folio config` command for configuration management.

use std::path::PathBuf;

use clap::{Args, Subcommand};
use folio_core::Config;

/// Arguments for the `config` command.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

/// Subcommands for configuration management.
#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Display the effective configuration
    Show,

    /// Show config file path
    Path,

    /// Check the config file and report the first problem found
    Check,

    /// Write a config file with the default vocabularies
    Init {
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },
}

/// Execute the config command. `explicit` is the `--config` path, if given.
pub async fn execute(args: ConfigArgs, explicit: Option<PathBuf>) -> anyhow::Result<()> {
    let path = explicit.unwrap_or_else(Config::default_path);

    match args.command {
        ConfigCommand::Show => {
            let config = load(&path)?;
            println!("{}", config.to_toml()?);
        }

        ConfigCommand::Path => {
            println!("{}", path.display());
        }

        ConfigCommand::Check => {
            if !path.exists() {
                println!("No config file at {}; defaults apply.", path.display());
                return Ok(());
            }
            let config = Config::load_from(&path)?;
            println!(
                "{} is valid: {} projects, {} materials, {} reference categories, threshold {}",
                path.display(),
                config.classification.projects.len(),
                config.classification.materials.len(),
                config.classification.reference_categories.len(),
                config.dedup.threshold
            );
        }

        ConfigCommand::Init { force } => {
            if path.exists() && !force {
                anyhow::bail!(
                    "Config file already exists at: {}\nUse --force to overwrite.",
                    path.display()
                );
            }

            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }

            let toml = Config::default().to_toml()?;
            std::fs::write(&path, toml)?;

            tracing::info!("Config file created at: {}", path.display());
            println!("Configuration initialized at: {}", path.display());
        }
    }

    Ok(())
}

fn load(path: &std::path::Path) -> anyhow::Result<Config> {
    if path.exists() {
        Ok(Config::load_from(path)?)
    } else {
        Ok(Config::default())
    }
}
