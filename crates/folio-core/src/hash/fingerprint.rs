//! Fixed-length perceptual fingerprints and Hamming distance.

use image_hasher::ImageHash;
use serde::{Deserialize, Serialize};

use crate::error::{HashError, HashResult};

/// A packed bit string, most significant bit first.
///
/// Stored as an [`ImageHash`], so distance and the base64 text form are
/// `image_hasher`'s. The text form is also how fingerprints are stored in
/// catalogs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Fingerprint {
    hash: ImageHash<Vec<u8>>,
}

impl Fingerprint {
    /// Pack a sequence of bits. Trailing bits of a partial byte are zero.
    pub fn from_bits<I: IntoIterator<Item = bool>>(bits: I) -> HashResult<Self> {
        let mut bytes = Vec::new();
        for (i, bit) in bits.into_iter().enumerate() {
            if i % 8 == 0 {
                bytes.push(0u8);
            }
            if bit {
                if let Some(last) = bytes.last_mut() {
                    *last |= 0x80 >> (i % 8);
                }
            }
        }
        Self::from_bytes(&bytes)
    }

    /// Wrap already-packed bytes.
    pub fn from_bytes(bytes: &[u8]) -> HashResult<Self> {
        if bytes.is_empty() {
            return Err(HashError::InvalidFingerprint {
                value: String::new(),
                message: "fingerprint is empty".to_string(),
            });
        }
        let hash = ImageHash::from_bytes(bytes).map_err(|e| HashError::InvalidFingerprint {
            value: format!("{} bytes", bytes.len()),
            message: format!("{e:?}"),
        })?;
        Ok(Self { hash })
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.hash.as_bytes()
    }

    /// Number of bits.
    pub fn bit_len(&self) -> usize {
        self.as_bytes().len() * 8
    }

    /// Value of bit `i`, or `None` past the end.
    pub fn bit(&self, i: usize) -> Option<bool> {
        self.as_bytes()
            .get(i / 8)
            .map(|byte| byte & (0x80 >> (i % 8)) != 0)
    }

    /// Number of differing bits.
    ///
    /// Fingerprints from different hash sizes cannot be compared; that is a
    /// programming error reported as [`HashError::IncompatibleFingerprint`].
    pub fn distance(&self, other: &Fingerprint) -> HashResult<u32> {
        if self.as_bytes().len() != other.as_bytes().len() {
            return Err(HashError::IncompatibleFingerprint {
                left: self.bit_len(),
                right: other.bit_len(),
            });
        }
        Ok(self.hash.dist(&other.hash))
    }

    /// Encode as base64.
    pub fn to_base64(&self) -> String {
        self.hash.to_base64()
    }

    /// Decode from base64.
    pub fn from_base64(value: &str) -> HashResult<Self> {
        let hash = ImageHash::<Vec<u8>>::from_base64(value.trim()).map_err(|e| {
            HashError::InvalidFingerprint {
                value: value.to_string(),
                message: format!("{e:?}"),
            }
        })?;
        if hash.as_bytes().is_empty() {
            return Err(HashError::InvalidFingerprint {
                value: value.to_string(),
                message: "fingerprint is empty".to_string(),
            });
        }
        Ok(Self { hash })
    }
}

impl std::fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_base64())
    }
}

impl TryFrom<String> for Fingerprint {
    type Error = HashError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_base64(&value)
    }
}

impl From<Fingerprint> for String {
    fn from(fingerprint: Fingerprint) -> Self {
        fingerprint.to_base64()
    }
}
