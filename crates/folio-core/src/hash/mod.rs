//! Content and perceptual hashing.
//!
//! - **content**: BLAKE3 hashes of raw bytes (exact duplicates, cache keys)
//! - **fingerprint**: packed bit strings with Hamming distance (`image_hasher`)
//! - **perceptual**: average-hash fingerprints of decoded images

pub mod content;
pub mod fingerprint;
pub mod perceptual;

pub use content::content_hash_bytes;
pub use fingerprint::Fingerprint;
pub use perceptual::{decode, HashSettings, PerceptualHasher, ResizeFilter};
