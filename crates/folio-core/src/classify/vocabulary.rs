//! The single lookup table behind folder and filename generation.
//!
//! Every vocabulary decision goes through this table so the folder a file is
//! placed in and the label in its filename can never disagree.

use std::collections::HashMap;

use crate::config::{ClassificationConfig, VocabEntry};
use crate::tags::TagList;

/// A resolved vocabulary hit: the matching tag and its folder name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VocabMatch<'a> {
    pub tag: &'a str,
    pub folder: &'a str,
}

/// Configuration-derived vocabularies, indexed for classification.
#[derive(Debug, Clone)]
pub struct VocabularyTable {
    base_path: String,
    team_tag: String,
    wip_tag: String,
    final_tags: Vec<String>,
    material_markers: Vec<String>,
    /// Ordered: the first configured project present wins.
    projects: Vec<(String, String)>,
    materials: HashMap<String, String>,
    references: HashMap<String, String>,
}

impl VocabularyTable {
    /// Build the table from classification settings.
    pub fn new(config: &ClassificationConfig) -> Self {
        let index = |entries: &[VocabEntry]| -> HashMap<String, String> {
            entries
                .iter()
                .map(|e| (e.tag.clone(), e.folder_name()))
                .collect()
        };

        Self {
            base_path: config.base_path.trim_end_matches('/').to_string(),
            team_tag: config.team_tag.clone(),
            wip_tag: config.wip_tag.clone(),
            final_tags: config.final_tags.clone(),
            material_markers: config.material_markers.clone(),
            projects: config
                .projects
                .iter()
                .map(|e| (e.tag.clone(), e.folder_name()))
                .collect(),
            materials: index(&config.materials),
            references: index(&config.reference_categories),
        }
    }

    /// Folder path prefix without a trailing slash.
    pub fn base_path(&self) -> &str {
        &self.base_path
    }

    /// Whether the tags mark the team's own project work.
    pub fn is_project(&self, tags: &TagList) -> bool {
        tags.contains(&self.team_tag)
    }

    /// First configured project identifier present in the tags.
    ///
    /// Scans in vocabulary order, not tag order.
    pub fn project(&self, tags: &TagList) -> Option<VocabMatch<'_>> {
        self.projects
            .iter()
            .find(|(tag, _)| tags.contains(tag))
            .map(|(tag, folder)| VocabMatch { tag, folder })
    }

    /// Whether the tags mark finished work. A finished tag wins over the
    /// WIP tag when both are present.
    pub fn is_final(&self, tags: &TagList) -> bool {
        self.final_tags.iter().any(|t| tags.contains(t))
    }

    /// Whether the tags explicitly mark work in progress.
    pub fn is_wip(&self, tags: &TagList) -> bool {
        tags.contains(&self.wip_tag)
    }

    /// Whether the tags carry a material marker.
    pub fn has_material_marker(&self, tags: &TagList) -> bool {
        self.material_markers.iter().any(|m| tags.contains(m))
    }

    /// First tag, in tag order, found in the material vocabulary.
    pub fn material<'a>(&'a self, tags: &'a TagList) -> Option<VocabMatch<'a>> {
        first_in_tag_order(tags, &self.materials)
    }

    /// First tag, in tag order, found in the reference vocabulary.
    pub fn reference<'a>(&'a self, tags: &'a TagList) -> Option<VocabMatch<'a>> {
        first_in_tag_order(tags, &self.references)
    }
}

fn first_in_tag_order<'a>(
    tags: &'a TagList,
    vocabulary: &'a HashMap<String, String>,
) -> Option<VocabMatch<'a>> {
    tags.iter().find_map(|tag| {
        vocabulary
            .get(tag)
            .map(|folder| VocabMatch { tag, folder })
    })
}
