//! Sub-configuration structs with the organization's default vocabularies.

use crate::dedup::Linkage;
use crate::hash::ResizeFilter;
use serde::{Deserialize, Serialize};

/// One entry of a classification vocabulary.
///
/// In TOML an entry is either a bare tag (`"tile"`) or a table with an
/// explicit folder name (`{ tag = "raw timber", folder = "Timber" }`).
/// Without an explicit folder the tag is title-cased.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "VocabEntrySpec")]
pub struct VocabEntry {
    /// Normalized tag that selects this entry
    pub tag: String,

    /// Folder display name override
    #[serde(skip_serializing_if = "Option::is_none")]
    pub folder: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum VocabEntrySpec {
    Tag(String),
    Full {
        tag: String,
        #[serde(default)]
        folder: Option<String>,
    },
}

impl From<VocabEntrySpec> for VocabEntry {
    fn from(spec: VocabEntrySpec) -> Self {
        match spec {
            VocabEntrySpec::Tag(tag) => Self { tag, folder: None },
            VocabEntrySpec::Full { tag, folder } => Self { tag, folder },
        }
    }
}

impl VocabEntry {
    /// Entry whose folder name is derived from the tag.
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            folder: None,
        }
    }

    /// Entry with an explicit folder name.
    pub fn with_folder(tag: impl Into<String>, folder: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            folder: Some(folder.into()),
        }
    }

    /// Folder display name: the override, or the tag title-cased word by word.
    pub fn folder_name(&self) -> String {
        match &self.folder {
            Some(folder) => folder.clone(),
            None => title_case(&self.tag),
        }
    }
}

fn title_case(tag: &str) -> String {
    tag.split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn entries(tags: &[&str]) -> Vec<VocabEntry> {
    tags.iter().map(|t| VocabEntry::new(*t)).collect()
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

/// Folder and filename classification rules.
///
/// Category priority is fixed (project, then material, then reference);
/// only the vocabularies are configurable.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassificationConfig {
    /// Prefix for every folder path. Empty means paths start at "/".
    pub base_path: String,

    /// Tag marking an image as the team's own project work
    pub team_tag: String,

    /// Tag marking work in progress
    pub wip_tag: String,

    /// Tags marking finished work. Later entries are legacy synonyms.
    pub final_tags: Vec<String>,

    /// Tags that force the material category even without a vocabulary match
    pub material_markers: Vec<String>,

    /// Known projects, scanned in this order
    pub projects: Vec<VocabEntry>,

    /// Material vocabulary
    pub materials: Vec<VocabEntry>,

    /// Reference category vocabulary
    pub reference_categories: Vec<VocabEntry>,
}

impl Default for ClassificationConfig {
    fn default() -> Self {
        Self {
            base_path: String::new(),
            team_tag: "archier".to_string(),
            wip_tag: "wip".to_string(),
            final_tags: strings(&["final", "complete"]),
            material_markers: strings(&["material"]),
            projects: entries(&[
                "yandoit",
                "daylesford",
                "kyneton",
                "fitzroy",
                "brunswick",
                "hawthorn",
                "castlemaine",
            ]),
            materials: entries(&[
                "tile",
                "stone",
                "timber",
                "brick",
                "concrete",
                "steel",
                "glass",
                "terrazzo",
                "marble",
                "plaster",
                "fabric",
                "laminate",
            ]),
            reference_categories: entries(&[
                "kitchens",
                "bathrooms",
                "living",
                "bedrooms",
                "exteriors",
                "interiors",
                "landscape",
                "facades",
                "stairs",
                "joinery",
                "lighting",
                "furniture",
                "details",
            ]),
        }
    }
}

/// Duplicate detection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DedupConfig {
    /// Maximum Hamming distance for two fingerprints to count as duplicates
    pub threshold: u32,

    /// Side length of the luminance grid; fingerprints have hash_size² bits
    pub hash_size: u32,

    /// Resampling filter used to shrink images to the grid
    pub resize_filter: ResizeFilter,

    /// How a new image links to an existing group
    pub linkage: Linkage,
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self {
            threshold: 5,
            hash_size: 8,
            resize_filter: ResizeFilter::default(),
            linkage: Linkage::default(),
        }
    }
}

/// Batch scan settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Number of images downloaded and fingerprinted concurrently
    pub parallel_workers: usize,

    /// File extensions picked up when listing a folder
    pub supported_formats: Vec<String>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            parallel_workers: 4,
            supported_formats: strings(&["jpg", "jpeg", "png", "webp", "tif", "tiff", "bmp"]),
        }
    }
}

/// Durable sequence counter settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SequenceConfig {
    /// File holding the last issued sequence number (supports ~)
    pub counter_path: String,
}

impl Default for SequenceConfig {
    fn default() -> Self {
        Self {
            counter_path: "~/.folio/sequence".to_string(),
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: error, warn, info, debug, trace
    pub level: String,

    /// Log format: "pretty" or "json"
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}
