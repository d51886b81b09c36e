//! Error types for Folio.
//!
//! Errors are grouped by the component that raises them so callers can decide
//! per kind whether to recover (discard a blank tag, skip an unreadable image)
//! or stop (sequence counter failure, mismatched fingerprints).

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for Folio operations.
#[derive(Error, Debug)]
pub enum FolioError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Tag normalization errors
    #[error("Tag error: {0}")]
    Tag(#[from] TagError),

    /// Hashing and fingerprint comparison errors
    #[error("Hash error: {0}")]
    Hash(#[from] HashError),

    /// Sequence counter errors
    #[error("Sequence error: {0}")]
    Sequence(#[from] SequenceError),

    /// Tag store or object store errors
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// General I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the config file from disk
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse TOML configuration
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Configuration values are invalid
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Tag normalization errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TagError {
    /// The tag was blank or whitespace-only
    #[error("Tag {raw:?} is empty after normalization")]
    Empty { raw: String },

    /// A region box that does not lie inside the image
    #[error("Region (x={x}, y={y}, width={width}, height={height}) is outside the image")]
    InvalidRegion {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
    },
}

/// Errors raised while fingerprinting or comparing fingerprints.
#[derive(Error, Debug)]
pub enum HashError {
    /// Input bytes could not be decoded into a bitmap
    #[error("Decode error for {source_name}: {message}")]
    Decode {
        source_name: String,
        message: String,
    },

    /// Fingerprint text form is malformed
    #[error("Invalid fingerprint {value:?}: {message}")]
    InvalidFingerprint { value: String, message: String },

    /// Two fingerprints of different bit lengths were compared.
    /// Only happens when fingerprints from different hasher settings are mixed.
    #[error("Incompatible fingerprints: {left} bits vs {right} bits")]
    IncompatibleFingerprint { left: usize, right: usize },
}

/// Sequence counter errors. Classification must not proceed on either.
#[derive(Error, Debug)]
pub enum SequenceError {
    /// The counter cannot be incremented any further
    #[error("Sequence counter exhausted at {last}")]
    Exhausted { last: u64 },

    /// The durable backing store could not be read or written
    #[error("Sequence counter unavailable at {path}: {message}")]
    Unavailable { path: PathBuf, message: String },
}

/// Errors from the tag store and object store collaborators.
#[derive(Error, Debug)]
pub enum StorageError {
    /// No object or image exists under the given key
    #[error("Not found: {0}")]
    NotFound(String),

    /// The backing store failed
    #[error("Storage I/O error for {key}: {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },
}

/// Convenience type alias for Folio results.
pub type Result<T> = std::result::Result<T, FolioError>;

/// Convenience type alias for hashing results.
pub type HashResult<T> = std::result::Result<T, HashError>;
