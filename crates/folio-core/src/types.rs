//! Core data types shared across Folio components.

use serde::{Deserialize, Serialize};

use crate::hash::Fingerprint;
use crate::tags::RegionTag;

/// Numeric image identifier assigned by the catalog.
pub type ImageId = u64;

/// One catalogued image.
///
/// This is the record the CLI reads from and writes to catalog JSON files.
/// Tags are stored as entered; consumers normalize before comparing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImageRecord {
    /// Catalog identifier
    pub id: ImageId,

    /// Object-storage path or local filename
    pub file_name: String,

    /// Optional human title (searchable as free text)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// General tags
    #[serde(default)]
    pub tags: Vec<String>,

    /// Tags anchored to regions of the image
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub regions: Vec<RegionTag>,

    /// BLAKE3 hash of the file contents
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_hash: Option<String>,

    /// Perceptual fingerprint for near-duplicate detection
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<Fingerprint>,
}

/// An image submitted to a duplicate scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanItem {
    pub id: ImageId,
    /// Path understood by the object store
    pub path: String,
}

impl ScanItem {
    pub fn new(id: ImageId, path: impl Into<String>) -> Self {
        Self {
            id,
            path: path.into(),
        }
    }
}
