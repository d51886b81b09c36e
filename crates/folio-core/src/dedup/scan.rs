//! Duplicate scans over an object store.
//!
//! Each image goes through download, content hash, decode and fingerprint
//! independently, so those run concurrently under a semaphore. Clustering
//! needs every earlier fingerprint and runs once, single-threaded, after the
//! workers finish. A failing image is recorded and skipped; it never aborts
//! the scan.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::Semaphore;

use crate::config::{Config, DedupConfig};
use crate::error::HashResult;
use crate::hash::{content_hash_bytes, Fingerprint, PerceptualHasher};
use crate::store::ObjectStore;
use crate::types::{ImageId, ScanItem};

use super::cache::FingerprintCache;
use super::cluster::{DuplicateClusterer, DuplicateGroup};

/// Cooperative cancellation flag, checked between images.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle(Arc<AtomicBool>);

impl CancelHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Per-image progress notifications.
#[derive(Debug, Clone)]
pub enum ScanEvent {
    /// Fingerprint computed from decoded pixels
    Fingerprinted(ImageId),
    /// Fingerprint reused from the cache
    Cached(ImageId),
    /// Image skipped after an error
    Failed(ImageId),
}

/// An image the scan could not fingerprint.
#[derive(Debug, Clone, Serialize)]
pub struct ScanFailure {
    pub id: ImageId,
    pub path: String,
    pub message: String,
}

/// Outcome of a scan: groups plus everything that went wrong.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ScanReport {
    pub groups: Vec<DuplicateGroup>,
    pub failures: Vec<ScanFailure>,
    /// Images fingerprinted from pixels in this scan
    pub fingerprinted: usize,
    /// Images whose fingerprint came from the cache
    pub cached: usize,
    /// Cache hits on byte-identical content under a different image id
    pub exact_matches: usize,
    /// Images never started because the scan was cancelled
    pub not_started: usize,
    pub cancelled: bool,
}

enum Outcome {
    Computed(Fingerprint),
    Cached(Fingerprint),
    ExactMatch(Fingerprint),
    Failed(String),
}

/// Settings for a duplicate scan.
#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// Maximum images in flight
    pub parallel: usize,
    pub dedup: DedupConfig,
}

impl ScanOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            parallel: config.scan.parallel_workers,
            dedup: config.dedup.clone(),
        }
    }
}

/// Runs fingerprinting concurrently, then clusters in input order.
pub struct DuplicateScanner {
    store: Arc<dyn ObjectStore>,
    hasher: Arc<PerceptualHasher>,
    clusterer: DuplicateClusterer,
    cache: Arc<FingerprintCache>,
    parallel: usize,
}

impl DuplicateScanner {
    pub fn new(
        store: Arc<dyn ObjectStore>,
        cache: Arc<FingerprintCache>,
        options: ScanOptions,
    ) -> Self {
        Self {
            store,
            hasher: Arc::new(PerceptualHasher::new(&options.dedup)),
            clusterer: DuplicateClusterer::new(&options.dedup),
            cache,
            parallel: options.parallel.max(1),
        }
    }

    /// The cache this scanner reads and fills.
    pub fn cache(&self) -> &Arc<FingerprintCache> {
        &self.cache
    }

    /// Scan the items and group duplicates.
    ///
    /// `on_event` is called once per finished image. Cached fingerprints are
    /// only reused under this scanner's hash settings, so every fingerprint
    /// in one scan has the same length.
    pub async fn scan<F>(
        &self,
        items: &[ScanItem],
        cancel: &CancelHandle,
        on_event: F,
    ) -> HashResult<ScanReport>
    where
        F: Fn(ScanEvent) + Send + Sync + 'static,
    {
        let start = std::time::Instant::now();
        let semaphore = Arc::new(Semaphore::new(self.parallel));
        let on_event = Arc::new(on_event);
        let mut handles = Vec::with_capacity(items.len());
        let mut report = ScanReport::default();

        for (index, item) in items.iter().enumerate() {
            if cancel.is_cancelled() {
                break;
            }
            let Ok(permit) = semaphore.clone().acquire_owned().await else {
                tracing::warn!("Scan semaphore closed unexpectedly, stopping scan");
                break;
            };
            // The flag may have flipped while waiting for a slot
            if cancel.is_cancelled() {
                break;
            }

            let store = self.store.clone();
            let hasher = self.hasher.clone();
            let cache = self.cache.clone();
            let on_event = on_event.clone();
            let item = item.clone();

            handles.push(tokio::spawn(async move {
                let outcome = process_item(&*store, hasher, &cache, &item).await;
                on_event(match &outcome {
                    Outcome::Computed(_) => ScanEvent::Fingerprinted(item.id),
                    Outcome::Cached(_) | Outcome::ExactMatch(_) => ScanEvent::Cached(item.id),
                    Outcome::Failed(_) => ScanEvent::Failed(item.id),
                });
                // Release after the callback so a cancel it raises is seen
                // before the next item starts
                drop(permit);
                (index, outcome)
            }));
        }

        report.not_started = items.len() - handles.len();
        report.cancelled = cancel.is_cancelled() && report.not_started > 0;

        let mut slots: Vec<Option<Fingerprint>> = vec![None; items.len()];
        for handle in handles {
            let (index, outcome) = match handle.await {
                Ok(result) => result,
                Err(e) => {
                    tracing::error!("Scan task panicked: {e}");
                    continue;
                }
            };
            let item = &items[index];
            match outcome {
                Outcome::Computed(fp) => {
                    report.fingerprinted += 1;
                    slots[index] = Some(fp);
                }
                Outcome::Cached(fp) => {
                    report.cached += 1;
                    slots[index] = Some(fp);
                }
                Outcome::ExactMatch(fp) => {
                    report.cached += 1;
                    report.exact_matches += 1;
                    slots[index] = Some(fp);
                }
                Outcome::Failed(message) => {
                    tracing::warn!("Skipping {} ({}): {}", item.path, item.id, message);
                    report.failures.push(ScanFailure {
                        id: item.id,
                        path: item.path.clone(),
                        message,
                    });
                }
            }
        }

        let fingerprints: Vec<(ImageId, Fingerprint)> = items
            .iter()
            .zip(slots)
            .filter_map(|(item, slot)| slot.map(|fp| (item.id, fp)))
            .collect();
        report.groups = self.clusterer.cluster(&fingerprints)?;

        tracing::info!(
            "Scanned {} images in {:?}: {} fingerprinted, {} cached, {} failed, {} duplicate groups{}",
            items.len(),
            start.elapsed(),
            report.fingerprinted,
            report.cached,
            report.failures.len(),
            report.groups.len(),
            if report.cancelled { " (cancelled)" } else { "" }
        );
        Ok(report)
    }
}

async fn process_item(
    store: &dyn ObjectStore,
    hasher: Arc<PerceptualHasher>,
    cache: &FingerprintCache,
    item: &ScanItem,
) -> Outcome {
    let bytes = match store.download(&item.path).await {
        Ok(bytes) => bytes,
        Err(e) => return Outcome::Failed(e.to_string()),
    };

    let settings = hasher.settings();
    let content_hash = content_hash_bytes(&bytes);
    if let Some(fp) = cache.get(settings, item.id, &content_hash) {
        tracing::trace!("Cache hit for {}", item.path);
        return Outcome::Cached(fp);
    }
    if let Some(fp) = cache.get_by_content(settings, &content_hash) {
        tracing::debug!("{} is byte-identical to a cached image", item.path);
        cache.insert(settings, item.id, &content_hash, fp.clone());
        return Outcome::ExactMatch(fp);
    }

    let path = item.path.clone();
    let result =
        tokio::task::spawn_blocking(move || hasher.fingerprint_bytes(&bytes, &path)).await;
    match result {
        Ok(Ok(fp)) => {
            cache.insert(settings, item.id, &content_hash, fp.clone());
            Outcome::Computed(fp)
        }
        Ok(Err(e)) => Outcome::Failed(e.to_string()),
        Err(e) => Outcome::Failed(format!("Fingerprint task failed: {e}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dedup::Linkage;
    use crate::error::StorageError;
    use crate::hash::perceptual::tests::{checkerboard, encode_jpeg, encode_png};
    use crate::hash::HashSettings;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::AtomicUsize;

    /// In-memory object store that counts downloads.
    struct MockStore {
        objects: HashMap<String, Vec<u8>>,
        downloads: Arc<AtomicUsize>,
    }

    impl MockStore {
        fn new(objects: Vec<(&str, Vec<u8>)>) -> Self {
            Self {
                objects: objects
                    .into_iter()
                    .map(|(k, v)| (k.to_string(), v))
                    .collect(),
                downloads: Arc::new(AtomicUsize::new(0)),
            }
        }
    }

    #[async_trait]
    impl ObjectStore for MockStore {
        fn name(&self) -> &str {
            "mock"
        }

        async fn download(&self, path: &str) -> Result<Vec<u8>, StorageError> {
            self.downloads.fetch_add(1, Ordering::SeqCst);
            self.objects
                .get(path)
                .cloned()
                .ok_or_else(|| StorageError::NotFound(path.to_string()))
        }

        async fn list(&self, _folder: &str) -> Result<Vec<String>, StorageError> {
            let mut paths: Vec<String> = self.objects.keys().cloned().collect();
            paths.sort();
            Ok(paths)
        }
    }

    fn options(parallel: usize) -> ScanOptions {
        ScanOptions {
            parallel,
            dedup: DedupConfig {
                linkage: Linkage::AnyMember,
                ..Default::default()
            },
        }
    }

    fn sample_store() -> MockStore {
        let board = checkerboard(false);
        MockStore::new(vec![
            ("a.png", encode_png(&board)),
            ("b.jpg", encode_jpeg(&board, 60)),
            ("c.png", encode_png(&checkerboard(true))),
            ("broken.jpg", b"not an image".to_vec()),
            ("copy.png", encode_png(&board)),
        ])
    }

    fn items() -> Vec<ScanItem> {
        vec![
            ScanItem::new(1, "a.png"),
            ScanItem::new(2, "b.jpg"),
            ScanItem::new(3, "c.png"),
            ScanItem::new(4, "broken.jpg"),
            ScanItem::new(5, "missing.jpg"),
            ScanItem::new(6, "copy.png"),
        ]
    }

    #[tokio::test]
    async fn test_scan_groups_duplicates_and_isolates_failures() {
        let scanner = DuplicateScanner::new(
            Arc::new(sample_store()),
            Arc::new(FingerprintCache::new()),
            options(1),
        );
        let report = scanner
            .scan(&items(), &CancelHandle::new(), |_| {})
            .await
            .unwrap();

        assert_eq!(report.groups.len(), 1);
        assert_eq!(report.groups[0].ids(), vec![1, 2, 6]);
        assert_eq!(report.groups[0].canonical(), 1);

        let failed: Vec<_> = report.failures.iter().map(|f| f.id).collect();
        assert_eq!(failed, vec![4, 5]);
        assert_eq!(report.fingerprinted, 3);
        // copy.png matches a.png byte for byte (sequential scan)
        assert_eq!(report.exact_matches, 1);
        assert!(!report.cancelled);
    }

    #[tokio::test]
    async fn test_parallel_scan_keeps_input_order() {
        let scanner = DuplicateScanner::new(
            Arc::new(sample_store()),
            Arc::new(FingerprintCache::new()),
            options(4),
        );
        let report = scanner
            .scan(&items(), &CancelHandle::new(), |_| {})
            .await
            .unwrap();
        assert_eq!(report.groups.len(), 1);
        assert_eq!(report.groups[0].canonical(), 1);
        assert_eq!(report.failures.len(), 2);
    }

    #[tokio::test]
    async fn test_second_scan_uses_cache() {
        let cache = Arc::new(FingerprintCache::new());
        let scanner =
            DuplicateScanner::new(Arc::new(sample_store()), cache.clone(), options(2));
        scanner
            .scan(&items(), &CancelHandle::new(), |_| {})
            .await
            .unwrap();
        let cached_before = cache.len();

        let events = Arc::new(AtomicUsize::new(0));
        let counter = events.clone();
        let report = scanner
            .scan(&items(), &CancelHandle::new(), move |event| {
                if matches!(event, ScanEvent::Cached(_)) {
                    counter.fetch_add(1, Ordering::SeqCst);
                }
            })
            .await
            .unwrap();

        assert_eq!(report.fingerprinted, 0);
        assert_eq!(report.cached, 4);
        assert_eq!(events.load(Ordering::SeqCst), 4);
        assert_eq!(cache.len(), cached_before);
        assert_eq!(report.groups[0].ids(), vec![1, 2, 6]);
    }

    #[tokio::test]
    async fn test_cancelled_scan_starts_nothing() {
        let store = Arc::new(sample_store());
        let downloads = store.downloads.clone();
        let scanner = DuplicateScanner::new(store, Arc::new(FingerprintCache::new()), options(2));
        let cancel = CancelHandle::new();
        cancel.cancel();

        let report = scanner.scan(&items(), &cancel, |_| {}).await.unwrap();
        assert!(report.cancelled);
        assert_eq!(report.not_started, 6);
        assert!(report.groups.is_empty());
        assert_eq!(downloads.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_cancel_midway_keeps_computed_fingerprints() {
        let cache = Arc::new(FingerprintCache::new());
        let scanner =
            DuplicateScanner::new(Arc::new(sample_store()), cache.clone(), options(1));
        let cancel = CancelHandle::new();
        let trigger = cancel.clone();

        let report = scanner
            .scan(&items(), &cancel, move |event| {
                if matches!(event, ScanEvent::Fingerprinted(2)) {
                    trigger.cancel();
                }
            })
            .await
            .unwrap();

        assert!(report.cancelled);
        assert!(report.not_started > 0);
        let settings = HashSettings::from(&options(1).dedup);
        assert!(cache
            .get(settings, 1, &content_hash_bytes(&encode_png(&checkerboard(false))))
            .is_some());
        assert_eq!(report.groups.len(), 1);
        assert_eq!(report.groups[0].ids(), vec![1, 2]);
    }

    #[tokio::test]
    async fn test_changed_hash_size_ignores_cached_fingerprints() {
        let cache = Arc::new(FingerprintCache::new());
        let first = DuplicateScanner::new(Arc::new(sample_store()), cache.clone(), options(1));
        first
            .scan(&[ScanItem::new(1, "a.png")], &CancelHandle::new(), |_| {})
            .await
            .unwrap();
        assert_eq!(cache.len(), 1);

        let mut wide = options(1);
        wide.dedup.hash_size = 16;
        wide.dedup.threshold = 20;
        let second = DuplicateScanner::new(Arc::new(sample_store()), cache.clone(), wide.clone());
        let items = vec![
            ScanItem::new(1, "a.png"),
            ScanItem::new(3, "c.png"),
            ScanItem::new(6, "copy.png"),
        ];
        let report = second
            .scan(&items, &CancelHandle::new(), |_| {})
            .await
            .unwrap();

        // a.png is recomputed; copy.png reuses the new 256-bit fingerprint
        assert_eq!(report.fingerprinted, 2);
        assert_eq!(report.exact_matches, 1);
        assert_eq!(report.groups.len(), 1);
        assert_eq!(report.groups[0].ids(), vec![1, 6]);

        let a_hash = content_hash_bytes(&encode_png(&checkerboard(false)));
        let settings = HashSettings::from(&wide.dedup);
        assert_eq!(cache.get(settings, 1, &a_hash).unwrap().bit_len(), 256);
    }
}
