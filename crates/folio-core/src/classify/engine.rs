//! Deterministic tag-set to folder/filename classification.

use serde::{Deserialize, Serialize};

use crate::config::ClassificationConfig;
use crate::tags::TagList;

use super::vocabulary::VocabularyTable;

/// Label used when a category has no matching sub-category.
const GENERAL: &str = "general";
const GENERAL_FOLDER: &str = "General";

/// Top-level category. Exactly one applies to any tag set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Project,
    Material,
    Reference,
}

impl Category {
    /// Kind label embedded in filenames.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Project => "project",
            Self::Material => "material",
            Self::Reference => "reference",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Project work stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Stage {
    Final,
    #[serde(rename = "WIP")]
    Wip,
}

impl Stage {
    fn folder(&self) -> &'static str {
        match self {
            Self::Final => "Final",
            Self::Wip => "WIP",
        }
    }
}

/// Where an image belongs, independent of its sequence number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placement {
    pub category: Category,
    /// Folder segments below the base path
    pub folders: Vec<String>,
    /// Matched vocabulary tag, or "general"
    pub label: String,
}

/// Storage location and filename for one image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub folder_path: String,
    pub filename: String,
    pub category: Category,
}

/// Maps normalized tags to exactly one storage location and filename.
///
/// Categories are tested in a fixed priority order: project, then material,
/// then reference. A tag set matching several categories always lands in the
/// highest-priority one. Reordering these tests moves existing files.
#[derive(Debug, Clone)]
pub struct ClassificationEngine {
    table: VocabularyTable,
}

impl ClassificationEngine {
    /// Create an engine from classification settings.
    pub fn new(config: &ClassificationConfig) -> Self {
        Self {
            table: VocabularyTable::new(config),
        }
    }

    /// Access the underlying vocabulary table.
    pub fn vocabulary(&self) -> &VocabularyTable {
        &self.table
    }

    /// Classify a tag list with the given sequence number.
    ///
    /// Pure: the same tags and sequence always produce the same result.
    pub fn classify(&self, tags: &TagList, sequence: u64) -> ClassificationResult {
        let placement = self.place(tags);
        let result = ClassificationResult {
            folder_path: self.folder_path(&placement),
            filename: format!(
                "{sequence:04}-{}-{}",
                placement.category,
                filename_component(&placement.label)
            ),
            category: placement.category,
        };
        tracing::debug!(
            "Classified {:?} as {} -> {}/{}",
            tags.as_slice(),
            result.category,
            result.folder_path,
            result.filename
        );
        result
    }

    /// Resolve category, folder segments and label for a tag list.
    pub fn place(&self, tags: &TagList) -> Placement {
        if self.table.is_project(tags) {
            return self.place_project(tags);
        }

        let material = self.table.material(tags);
        if material.is_some() || self.table.has_material_marker(tags) {
            let (label, folder) = match material {
                Some(hit) => (hit.tag.to_string(), hit.folder.to_string()),
                None => (GENERAL.to_string(), GENERAL_FOLDER.to_string()),
            };
            return Placement {
                category: Category::Material,
                folders: vec!["Materials".to_string(), folder],
                label,
            };
        }

        let (label, folder) = match self.table.reference(tags) {
            Some(hit) => (hit.tag.to_string(), hit.folder.to_string()),
            None => (GENERAL.to_string(), GENERAL_FOLDER.to_string()),
        };
        Placement {
            category: Category::Reference,
            folders: vec!["Reference".to_string(), folder],
            label,
        }
    }

    fn place_project(&self, tags: &TagList) -> Placement {
        let Some(project) = self.table.project(tags) else {
            // Unknown project: team root, no project or stage subfolder
            return Placement {
                category: Category::Project,
                folders: vec!["Team".to_string()],
                label: GENERAL.to_string(),
            };
        };

        let stage = if self.table.is_final(tags) {
            Stage::Final
        } else {
            if !self.table.is_wip(tags) {
                tracing::debug!(
                    "Project {} has no stage tag, filing as WIP",
                    project.tag
                );
            }
            Stage::Wip
        };

        Placement {
            category: Category::Project,
            folders: vec![
                "Team".to_string(),
                project.folder.to_string(),
                stage.folder().to_string(),
            ],
            label: project.tag.to_string(),
        }
    }

    fn folder_path(&self, placement: &Placement) -> String {
        format!("{}/{}", self.table.base_path(), placement.folders.join("/"))
    }
}

/// Tags may contain spaces; filenames get dashes instead.
fn filename_component(label: &str) -> String {
    label
        .chars()
        .map(|c| {
            if c.is_whitespace() || c == '/' || c == '\\' {
                '-'
            } else {
                c
            }
        })
        .collect()
}
