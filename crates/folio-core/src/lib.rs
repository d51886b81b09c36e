//! Folio Core - tag-driven classification and deduplication for image
//! catalogs.
//!
//! Folio decides where a tagged image is filed, answers tag searches, and
//! finds near-duplicate images by perceptual fingerprint:
//!
//! ```text
//! raw tags → normalize → classify (+ sequence number) → folder + filename
//! image bytes → aHash fingerprint → greedy clustering → duplicate groups
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use folio_core::{Config, Folio};
//!
//! #[tokio::main]
//! async fn main() -> folio_core::Result<()> {
//!     let folio = Folio::with_file_counter(Config::load()?);
//!     let result = folio.classify_next(["archier", "yandoit", "final"]).await?;
//!     println!("{}/{}", result.folder_path, result.filename);
//!     Ok(())
//! }
//! ```

pub mod classify;
pub mod config;
pub mod dedup;
pub mod error;
pub mod hash;
pub mod query;
pub mod sequence;
pub mod service;
pub mod store;
pub mod tags;
pub mod types;

pub use classify::{Category, ClassificationEngine, ClassificationResult};
pub use config::Config;
pub use dedup::{
    CancelHandle, DuplicateClusterer, DuplicateGroup, DuplicateScanner, FingerprintCache,
    Linkage, ScanEvent, ScanReport,
};
pub use error::{ConfigError, FolioError, HashError, Result, SequenceError, StorageError, TagError};
pub use hash::{Fingerprint, PerceptualHasher};
pub use query::{matches, search, ImageTags, RequiredTags, SearchFilter};
pub use sequence::{FileSequenceCounter, MemorySequenceCounter, SequenceCounter};
pub use service::Folio;
pub use store::{LocalObjectStore, MemoryTagStore, ObjectStore, TagStore};
pub use tags::{normalize, RegionTag, TagList};
pub use types::{ImageId, ImageRecord, ScanItem};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
