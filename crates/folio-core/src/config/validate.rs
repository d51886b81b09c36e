//! Configuration validation with range and vocabulary checks.

use std::collections::HashSet;

use crate::error::ConfigError;
use crate::tags::normalize;

use super::{Config, VocabEntry};

impl Config {
    /// Validate configuration values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.scan.parallel_workers == 0 {
            return Err(ConfigError::ValidationError(
                "scan.parallel_workers must be > 0".into(),
            ));
        }
        // hash_size² must fill whole bytes
        if !(4..=16).contains(&self.dedup.hash_size) || self.dedup.hash_size % 4 != 0 {
            return Err(ConfigError::ValidationError(
                "dedup.hash_size must be one of 4, 8, 12, 16".into(),
            ));
        }
        let bits = self.dedup.hash_size * self.dedup.hash_size;
        if self.dedup.threshold >= bits {
            return Err(ConfigError::ValidationError(format!(
                "dedup.threshold must be < {bits} (fingerprint length)"
            )));
        }
        if !matches!(
            self.logging.level.as_str(),
            "error" | "warn" | "info" | "debug" | "trace"
        ) {
            return Err(ConfigError::ValidationError(format!(
                "logging.level {:?} is not one of error, warn, info, debug, trace",
                self.logging.level
            )));
        }

        let classification = &self.classification;
        check_tag("classification.team_tag", &classification.team_tag)?;
        check_tag("classification.wip_tag", &classification.wip_tag)?;
        for tag in &classification.final_tags {
            check_tag("classification.final_tags", tag)?;
        }
        for tag in &classification.material_markers {
            check_tag("classification.material_markers", tag)?;
        }
        check_vocabulary("classification.projects", &classification.projects)?;
        check_vocabulary("classification.materials", &classification.materials)?;
        check_vocabulary(
            "classification.reference_categories",
            &classification.reference_categories,
        )?;

        if classification
            .projects
            .iter()
            .any(|p| p.tag == classification.team_tag)
        {
            return Err(ConfigError::ValidationError(
                "classification.projects must not contain the team tag".into(),
            ));
        }
        let materials: HashSet<&str> = classification
            .materials
            .iter()
            .map(|m| m.tag.as_str())
            .collect();
        if let Some(shared) = classification
            .reference_categories
            .iter()
            .find(|r| materials.contains(r.tag.as_str()))
        {
            return Err(ConfigError::ValidationError(format!(
                "tag {:?} appears in both classification.materials and \
                 classification.reference_categories",
                shared.tag
            )));
        }
        Ok(())
    }
}

/// Vocabulary tags are compared against normalized image tags, so they must
/// already be in normalized form.
fn check_tag(field: &str, tag: &str) -> Result<(), ConfigError> {
    match normalize(tag) {
        Ok(normalized) if normalized == tag => Ok(()),
        Ok(normalized) => Err(ConfigError::ValidationError(format!(
            "{field}: tag {tag:?} is not normalized (expected {normalized:?})"
        ))),
        Err(_) => Err(ConfigError::ValidationError(format!(
            "{field}: tags must not be blank"
        ))),
    }
}

fn check_vocabulary(field: &str, entries: &[VocabEntry]) -> Result<(), ConfigError> {
    let mut seen = HashSet::new();
    for entry in entries {
        check_tag(field, &entry.tag)?;
        if !seen.insert(entry.tag.as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "{field}: duplicate tag {:?}",
                entry.tag
            )));
        }
        if entry.folder.as_deref().is_some_and(|f| f.trim().is_empty()) {
            return Err(ConfigError::ValidationError(format!(
                "{field}: folder for {:?} must not be blank",
                entry.tag
            )));
        }
    }
    Ok(())
}
