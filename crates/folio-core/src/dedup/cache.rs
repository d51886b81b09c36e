//! Reusable fingerprints keyed by hasher settings, image id and content hash.
//!
//! Fingerprinting is idempotent, so a fingerprint stays valid as long as the
//! image bytes and the hash settings do. A fingerprint computed under other
//! settings is a miss, never a hit. A cancelled or failed scan keeps
//! everything it computed.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Mutex, PoisonError};

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::hash::{Fingerprint, HashSettings};
use crate::types::ImageId;

#[derive(Debug, Serialize, Deserialize)]
struct CacheEntry {
    id: ImageId,
    content_hash: String,
    settings: HashSettings,
    fingerprint: Fingerprint,
}

#[derive(Debug, Default)]
struct CacheState {
    by_image: HashMap<(HashSettings, ImageId, String), Fingerprint>,
    by_content: HashMap<(HashSettings, String), Fingerprint>,
}

/// Thread-safe fingerprint cache.
#[derive(Debug, Default)]
pub struct FingerprintCache {
    state: Mutex<CacheState>,
}

impl FingerprintCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, CacheState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Fingerprint previously computed for this image with these exact bytes
    /// and settings.
    pub fn get(
        &self,
        settings: HashSettings,
        id: ImageId,
        content_hash: &str,
    ) -> Option<Fingerprint> {
        self.lock()
            .by_image
            .get(&(settings, id, content_hash.to_string()))
            .cloned()
    }

    /// Fingerprint of any image with byte-identical content, computed under
    /// the same settings.
    pub fn get_by_content(&self, settings: HashSettings, content_hash: &str) -> Option<Fingerprint> {
        self.lock()
            .by_content
            .get(&(settings, content_hash.to_string()))
            .cloned()
    }

    pub fn insert(
        &self,
        settings: HashSettings,
        id: ImageId,
        content_hash: &str,
        fingerprint: Fingerprint,
    ) {
        let mut state = self.lock();
        state
            .by_content
            .entry((settings, content_hash.to_string()))
            .or_insert_with(|| fingerprint.clone());
        state
            .by_image
            .insert((settings, id, content_hash.to_string()), fingerprint);
    }

    pub fn len(&self) -> usize {
        self.lock().by_image.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Load a cache saved with [`FingerprintCache::save`].
    ///
    /// Entries whose fingerprint length disagrees with their recorded
    /// settings are dropped.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let entries: Vec<CacheEntry> = serde_json::from_str(&content)?;
        let cache = Self::new();
        let mut dropped = 0usize;
        for entry in entries {
            if entry.fingerprint.bit_len() != entry.settings.bit_len() {
                dropped += 1;
                continue;
            }
            cache.insert(entry.settings, entry.id, &entry.content_hash, entry.fingerprint);
        }
        if dropped > 0 {
            tracing::warn!("Dropped {dropped} inconsistent cache entries from {:?}", path);
        }
        tracing::debug!("Loaded {} cached fingerprints from {:?}", cache.len(), path);
        Ok(cache)
    }

    /// Persist the cache as JSON, sorted by image id.
    pub fn save(&self, path: &Path) -> Result<()> {
        let mut entries: Vec<CacheEntry> = self
            .lock()
            .by_image
            .iter()
            .map(|((settings, id, content_hash), fingerprint)| CacheEntry {
                id: *id,
                content_hash: content_hash.clone(),
                settings: *settings,
                fingerprint: fingerprint.clone(),
            })
            .collect();
        entries.sort_by(|a, b| {
            a.id.cmp(&b.id)
                .then(a.content_hash.cmp(&b.content_hash))
                .then(a.settings.hash_size.cmp(&b.settings.hash_size))
        });
        std::fs::write(path, serde_json::to_string_pretty(&entries)?)?;
        Ok(())
    }
}
