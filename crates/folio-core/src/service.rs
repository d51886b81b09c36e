//! High-level entry point tying configuration, classification, sequencing
//! and duplicate scans together.

use std::sync::Arc;

use crate::classify::{ClassificationEngine, ClassificationResult};
use crate::config::Config;
use crate::dedup::{DuplicateScanner, FingerprintCache, ScanOptions};
use crate::error::Result;
use crate::hash::PerceptualHasher;
use crate::sequence::{FileSequenceCounter, SequenceCounter};
use crate::store::ObjectStore;
use crate::tags::TagList;

/// Configured Folio instance.
pub struct Folio {
    config: Config,
    engine: ClassificationEngine,
    hasher: PerceptualHasher,
    counter: Arc<dyn SequenceCounter>,
}

impl Folio {
    /// Create an instance drawing sequence numbers from `counter`.
    pub fn new(config: Config, counter: Arc<dyn SequenceCounter>) -> Self {
        let engine = ClassificationEngine::new(&config.classification);
        let hasher = PerceptualHasher::new(&config.dedup);
        Self {
            config,
            engine,
            hasher,
            counter,
        }
    }

    /// Create an instance backed by the configured counter file.
    pub fn with_file_counter(config: Config) -> Self {
        let counter = Arc::new(FileSequenceCounter::new(config.sequence_path()));
        Self::new(config, counter)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn engine(&self) -> &ClassificationEngine {
        &self.engine
    }

    /// Hasher configured with this instance's dedup settings.
    pub fn hasher(&self) -> &PerceptualHasher {
        &self.hasher
    }

    /// Classify already-normalized tags with an explicit sequence number.
    pub fn classify(&self, tags: &TagList, sequence: u64) -> ClassificationResult {
        self.engine.classify(tags, sequence)
    }

    /// Normalize raw tags, take the next sequence number and classify.
    ///
    /// Blank tags are discarded. Exactly one sequence number is consumed per
    /// call; if the counter fails nothing is classified.
    pub async fn classify_next<I, S>(&self, raw_tags: I) -> Result<ClassificationResult>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let tags = TagList::from_raw(raw_tags);
        let sequence = self.counter.next_sequence().await?;
        Ok(self.engine.classify(&tags, sequence))
    }

    /// Build a duplicate scanner over `store` using the configured settings.
    pub fn scanner(
        &self,
        store: Arc<dyn ObjectStore>,
        cache: Arc<FingerprintCache>,
    ) -> DuplicateScanner {
        DuplicateScanner::new(store, cache, ScanOptions::from_config(&self.config))
    }
}
