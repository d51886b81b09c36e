//! BLAKE3 content hashes for exact-duplicate detection and cache keys.

/// Hex BLAKE3 hash of bytes already downloaded for decoding.
pub fn content_hash_bytes(data: &[u8]) -> String {
    blake3::hash(data).to_hex().to_string()
}
