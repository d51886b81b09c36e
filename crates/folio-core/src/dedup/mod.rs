//! Near-duplicate detection.
//!
//! - **cluster**: greedy grouping of fingerprints by Hamming distance
//! - **cache**: fingerprints reused across scans, keyed by content hash
//! - **scan**: concurrent download and fingerprinting over an object store

pub mod cache;
pub mod cluster;
pub mod scan;

pub use cache::FingerprintCache;
pub use cluster::{DuplicateClusterer, DuplicateGroup, GroupMember, Linkage};
pub use scan::{CancelHandle, DuplicateScanner, ScanEvent, ScanFailure, ScanOptions, ScanReport};
