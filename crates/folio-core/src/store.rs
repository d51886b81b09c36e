//! Tag store and object store collaborators.
//!
//! Folio does not own image storage. Searches read tags through [`TagStore`]
//! and duplicate scans read bytes through [`ObjectStore`]. The in-memory and
//! local-filesystem implementations here back the CLI and the tests.

use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use walkdir::WalkDir;

use crate::error::{Result, StorageError};
use crate::tags::RegionTag;
use crate::types::{ImageId, ImageRecord};

/// Read access to stored image tags.
#[async_trait]
pub trait TagStore: Send + Sync {
    /// General tags for an image, as stored.
    async fn get_tags(&self, id: ImageId) -> std::result::Result<Vec<String>, StorageError>;

    /// Region-anchored tags for an image.
    async fn get_region_tags(
        &self,
        id: ImageId,
    ) -> std::result::Result<Vec<RegionTag>, StorageError>;
}

/// Read access to image bytes.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store name for logging.
    fn name(&self) -> &str;

    /// Fetch the raw bytes stored under `path`.
    async fn download(&self, path: &str) -> std::result::Result<Vec<u8>, StorageError>;

    /// Image paths under `folder`, sorted. An empty folder lists everything.
    async fn list(&self, folder: &str) -> std::result::Result<Vec<String>, StorageError>;
}

/// Tag store over catalog records held in memory.
#[derive(Debug, Default)]
pub struct MemoryTagStore {
    records: Vec<ImageRecord>,
    index: HashMap<ImageId, usize>,
}

impl MemoryTagStore {
    pub fn from_records(records: Vec<ImageRecord>) -> Self {
        let index = records
            .iter()
            .enumerate()
            .map(|(i, record)| (record.id, i))
            .collect();
        Self { records, index }
    }

    /// Load a catalog JSON file (an array of image records).
    pub fn load_catalog(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let records: Vec<ImageRecord> = serde_json::from_str(&content)?;
        tracing::debug!("Loaded {} catalog records from {:?}", records.len(), path);
        Ok(Self::from_records(records))
    }

    /// Record ids in catalog order.
    pub fn ids(&self) -> Vec<ImageId> {
        self.records.iter().map(|r| r.id).collect()
    }

    pub fn records(&self) -> &[ImageRecord] {
        &self.records
    }

    fn record(&self, id: ImageId) -> std::result::Result<&ImageRecord, StorageError> {
        self.index
            .get(&id)
            .map(|&i| &self.records[i])
            .ok_or_else(|| StorageError::NotFound(format!("image {id}")))
    }
}

#[async_trait]
impl TagStore for MemoryTagStore {
    async fn get_tags(&self, id: ImageId) -> std::result::Result<Vec<String>, StorageError> {
        Ok(self.record(id)?.tags.clone())
    }

    async fn get_region_tags(
        &self,
        id: ImageId,
    ) -> std::result::Result<Vec<RegionTag>, StorageError> {
        Ok(self.record(id)?.regions.clone())
    }
}

/// Object store over a local directory tree.
///
/// Paths are relative to the root and use `/` separators.
#[derive(Debug, Clone)]
pub struct LocalObjectStore {
    root: PathBuf,
    supported_formats: Vec<String>,
}

impl LocalObjectStore {
    pub fn new(root: impl Into<PathBuf>, supported_formats: Vec<String>) -> Self {
        Self {
            root: root.into(),
            supported_formats,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> std::result::Result<PathBuf, StorageError> {
        let relative = Path::new(path);
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if escapes {
            return Err(StorageError::NotFound(path.to_string()));
        }
        Ok(self.root.join(relative))
    }
}

fn is_supported(path: &Path, formats: &[String]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| formats.iter().any(|fmt| fmt.eq_ignore_ascii_case(ext)))
        .unwrap_or(false)
}

#[async_trait]
impl ObjectStore for LocalObjectStore {
    fn name(&self) -> &str {
        "local"
    }

    async fn download(&self, path: &str) -> std::result::Result<Vec<u8>, StorageError> {
        let full = self.resolve(path)?;
        tokio::fs::read(&full).await.map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                StorageError::NotFound(path.to_string())
            } else {
                StorageError::Io {
                    key: path.to_string(),
                    source,
                }
            }
        })
    }

    async fn list(&self, folder: &str) -> std::result::Result<Vec<String>, StorageError> {
        let base = self.resolve(folder.trim_matches('/'))?;
        let root = self.root.clone();
        let formats = self.supported_formats.clone();

        let listed = tokio::task::spawn_blocking(move || {
            let mut paths: Vec<String> = WalkDir::new(&base)
                .follow_links(true)
                .into_iter()
                .filter_map(|e| e.ok())
                .filter(|e| e.file_type().is_file() && is_supported(e.path(), &formats))
                .filter_map(|e| {
                    let relative = e.path().strip_prefix(&root).ok()?;
                    let parts: Vec<&str> = relative
                        .components()
                        .filter_map(|c| c.as_os_str().to_str())
                        .collect();
                    Some(parts.join("/"))
                })
                .collect();
            paths.sort();
            paths
        })
        .await
        .map_err(|e| StorageError::Io {
            key: folder.to_string(),
            source: std::io::Error::other(e),
        })?;

        tracing::debug!("Listed {} images under {:?} in {}", listed.len(), folder, self.name());
        Ok(listed)
    }
}
