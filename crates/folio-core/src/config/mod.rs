//! Configuration management for Folio.
//!
//! Configuration is loaded from a TOML file with sensible defaults. The
//! classification vocabularies and similarity threshold live here so they can
//! be extended without touching the algorithms.

mod types;
mod validate;

pub use types::*;

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Root configuration structure for Folio.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Folder and filename classification rules
    pub classification: ClassificationConfig,

    /// Duplicate detection settings
    pub dedup: DedupConfig,

    /// Batch scan settings
    pub scan: ScanConfig,

    /// Durable sequence counter settings
    pub sequence: SequenceConfig,

    /// Logging settings
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from the default location.
    ///
    /// Returns default configuration if the file doesn't exist.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse and validate configuration from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default config file path.
    ///
    /// Uses platform-appropriate directories:
    /// - macOS: ~/Library/Application Support/com.folio.folio/config.toml
    /// - Linux: ~/.config/folio/config.toml
    /// - Windows: C:\Users\<User>\AppData\Roaming\folio\config\config.toml
    ///
    /// Falls back to ~/.folio/config.toml if directory detection fails.
    pub fn default_path() -> PathBuf {
        directories::ProjectDirs::from("com", "folio", "folio")
            .map(|dirs| dirs.config_dir().to_path_buf().join("config.toml"))
            .unwrap_or_else(|| {
                let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
                PathBuf::from(home).join(".folio").join("config.toml")
            })
    }

    /// Get the resolved sequence counter path (with ~ expansion).
    pub fn sequence_path(&self) -> PathBuf {
        let expanded = shellexpand::tilde(&self.sequence.counter_path);
        PathBuf::from(expanded.into_owned())
    }

    /// Serialize the config to a pretty TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::ValidationError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dedup::Linkage;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.scan.parallel_workers, 4);
        assert_eq!(config.dedup.threshold, 5);
        assert_eq!(config.dedup.hash_size, 8);
        assert_eq!(config.classification.team_tag, "archier");
    }

    #[test]
    fn test_config_to_toml() {
        let config = Config::default();
        let toml = config.to_toml().unwrap();
        assert!(toml.contains("[classification]"));
        assert!(toml.contains("[dedup]"));
        assert!(toml.contains("team_tag = \"archier\""));
    }

    #[test]
    fn test_default_config_survives_toml() {
        let toml = Config::default().to_toml().unwrap();
        let parsed = Config::from_toml(&toml).unwrap();
        assert_eq!(
            parsed.classification.materials,
            Config::default().classification.materials
        );
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = Config::from_toml(
            r#"
            [dedup]
            threshold = 3
            linkage = "representative"

            [classification]
            materials = ["tile", { tag = "raw timber", folder = "Timber" }]
            "#,
        )
        .unwrap();
        assert_eq!(config.dedup.threshold, 3);
        assert_eq!(config.dedup.linkage, Linkage::Representative);
        assert_eq!(config.dedup.hash_size, 8);
        assert_eq!(config.classification.materials.len(), 2);
        assert_eq!(config.classification.team_tag, "archier");
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[scan]\nparallel_workers = 2\n").unwrap();
        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.scan.parallel_workers, 2);
    }

    #[test]
    fn test_load_from_rejects_invalid_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[scan]\nparallel_workers = 0\n").unwrap();
        assert!(matches!(
            Config::load_from(&path),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn test_sequence_path_without_tilde_is_unchanged() {
        let mut config = Config::default();
        config.sequence.counter_path = "/var/lib/folio/sequence".to_string();
        assert_eq!(
            config.sequence_path(),
            PathBuf::from("/var/lib/folio/sequence")
        );
    }
}
