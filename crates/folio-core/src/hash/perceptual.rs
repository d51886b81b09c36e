//! Average-hash perceptual fingerprints.
//!
//! The image is shrunk to a small square grid, converted to luminance, and
//! each cell becomes one bit: set when the cell is at least as bright as the
//! grid mean. This survives recompression and mild resizing but not rotation,
//! cropping, or heavy color shifts.

use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView};
use serde::{Deserialize, Serialize};

use crate::config::DedupConfig;
use crate::error::{HashError, HashResult};

use super::Fingerprint;

/// Resampling filter used to shrink images to the hash grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResizeFilter {
    Nearest,
    #[default]
    Triangle,
    CatmullRom,
    Gaussian,
    Lanczos3,
}

impl From<ResizeFilter> for FilterType {
    fn from(filter: ResizeFilter) -> Self {
        match filter {
            ResizeFilter::Nearest => FilterType::Nearest,
            ResizeFilter::Triangle => FilterType::Triangle,
            ResizeFilter::CatmullRom => FilterType::CatmullRom,
            ResizeFilter::Gaussian => FilterType::Gaussian,
            ResizeFilter::Lanczos3 => FilterType::Lanczos3,
        }
    }
}

/// The settings that decide a fingerprint's bits.
///
/// Fingerprints are only comparable, and only reusable from a cache, under
/// identical settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HashSettings {
    pub hash_size: u32,
    pub resize_filter: ResizeFilter,
}

impl HashSettings {
    /// Number of bits in each fingerprint.
    pub fn bit_len(&self) -> usize {
        (self.hash_size * self.hash_size) as usize
    }
}

impl From<&DedupConfig> for HashSettings {
    fn from(config: &DedupConfig) -> Self {
        Self {
            hash_size: config.hash_size,
            resize_filter: config.resize_filter,
        }
    }
}

/// Computes average-hash fingerprints.
///
/// Every fingerprint from one hasher has `hash_size²` bits; only compare
/// fingerprints produced with the same settings.
#[derive(Debug, Clone)]
pub struct PerceptualHasher {
    settings: HashSettings,
}

impl Default for PerceptualHasher {
    fn default() -> Self {
        Self::new(&DedupConfig::default())
    }
}

impl PerceptualHasher {
    /// Create a hasher from dedup settings.
    pub fn new(config: &DedupConfig) -> Self {
        Self {
            settings: config.into(),
        }
    }

    pub fn settings(&self) -> HashSettings {
        self.settings
    }

    /// Number of bits in each fingerprint.
    pub fn bit_len(&self) -> usize {
        self.settings.bit_len()
    }

    /// Fingerprint an already decoded image.
    pub fn fingerprint(&self, image: &DynamicImage) -> HashResult<Fingerprint> {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Err(HashError::Decode {
                source_name: "<bitmap>".to_string(),
                message: format!("cannot resize a {width}x{height} image"),
            });
        }

        let size = self.settings.hash_size;
        let grid = image
            .resize_exact(size, size, self.settings.resize_filter.into())
            .to_luma8();
        let cells: Vec<u32> = grid.pixels().map(|p| u32::from(p.0[0])).collect();
        let sum: u32 = cells.iter().sum();
        let count = cells.len() as u32;

        // image_hasher's HashAlg::Mean compares against the mean truncated to
        // an integer, which sets bits for cells just below a fractional mean.
        // This compares against the exact mean: cell >= sum / count.
        Fingerprint::from_bits(cells.iter().map(|&cell| cell * count >= sum))
    }

    /// Decode encoded image bytes and fingerprint them.
    ///
    /// `source_name` only labels errors.
    pub fn fingerprint_bytes(&self, bytes: &[u8], source_name: &str) -> HashResult<Fingerprint> {
        let image = decode(bytes, source_name)?;
        self.fingerprint(&image).map_err(|e| match e {
            HashError::Decode { message, .. } => HashError::Decode {
                source_name: source_name.to_string(),
                message,
            },
            other => other,
        })
    }
}

/// Decode an image, detecting the format from its content.
pub fn decode(bytes: &[u8], source_name: &str) -> HashResult<DynamicImage> {
    let reader = image::ImageReader::new(std::io::Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| HashError::Decode {
            source_name: source_name.to_string(),
            message: format!("Cannot detect image format: {e}"),
        })?;
    if reader.format().is_none() {
        return Err(HashError::Decode {
            source_name: source_name.to_string(),
            message: "Unrecognized image format".to_string(),
        });
    }
    reader.decode().map_err(|e| HashError::Decode {
        source_name: source_name.to_string(),
        message: e.to_string(),
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use image::codecs::jpeg::JpegEncoder;
    use image::{ImageFormat, Rgb, RgbImage};

    /// 128x128 checkerboard of 16px cells, one cell per grid square.
    pub(crate) fn checkerboard(inverted: bool) -> DynamicImage {
        let img = RgbImage::from_fn(128, 128, |x, y| {
            let dark = ((x / 16) + (y / 16)) % 2 == 0;
            if dark != inverted {
                Rgb([40, 45, 50])
            } else {
                Rgb([210, 205, 200])
            }
        });
        DynamicImage::ImageRgb8(img)
    }

    pub(crate) fn encode_jpeg(image: &DynamicImage, quality: u8) -> Vec<u8> {
        let mut bytes = Vec::new();
        let encoder = JpegEncoder::new_with_quality(&mut bytes, quality);
        image.to_rgb8().write_with_encoder(encoder).unwrap();
        bytes
    }

    pub(crate) fn encode_png(image: &DynamicImage) -> Vec<u8> {
        let mut bytes = Vec::new();
        image
            .write_to(&mut std::io::Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        bytes
    }

    #[test]
    fn test_fingerprint_is_64_bits() {
        let hasher = PerceptualHasher::default();
        let fp = hasher.fingerprint(&checkerboard(false)).unwrap();
        assert_eq!(fp.bit_len(), 64);
        assert_eq!(hasher.bit_len(), 64);
    }

    #[test]
    fn test_fingerprint_is_stable() {
        let hasher = PerceptualHasher::default();
        let img = checkerboard(false);
        assert_eq!(
            hasher.fingerprint(&img).unwrap(),
            hasher.fingerprint(&img).unwrap()
        );
    }

    #[test]
    fn test_fingerprint_follows_luminance_pattern() {
        let hasher = PerceptualHasher::default();
        let fp = hasher.fingerprint(&checkerboard(false)).unwrap();
        // Cell (0,0) is dark, cell (1,0) is bright
        assert_eq!(fp.bit(0), Some(false));
        assert_eq!(fp.bit(1), Some(true));
        assert_eq!(fp.bit(8), Some(true));
    }

    #[test]
    fn test_uniform_image_sets_every_bit() {
        let hasher = PerceptualHasher::default();
        let fp = hasher.fingerprint(&DynamicImage::new_rgb8(50, 30)).unwrap();
        assert_eq!(fp.as_bytes(), &[0xFF; 8]);
    }

    #[test]
    fn test_reencoded_image_stays_within_threshold() {
        let hasher = PerceptualHasher::default();
        let threshold = DedupConfig::default().threshold;
        let original = checkerboard(false);

        let high = hasher
            .fingerprint_bytes(&encode_jpeg(&original, 95), "high.jpg")
            .unwrap();
        let low = hasher
            .fingerprint_bytes(&encode_jpeg(&original, 40), "low.jpg")
            .unwrap();
        let lossless = hasher
            .fingerprint_bytes(&encode_png(&original), "orig.png")
            .unwrap();

        assert!(high.distance(&low).unwrap() <= threshold);
        assert!(lossless.distance(&low).unwrap() <= threshold);
    }

    #[test]
    fn test_different_images_are_far_apart() {
        let hasher = PerceptualHasher::default();
        let a = hasher.fingerprint(&checkerboard(false)).unwrap();
        let b = hasher.fingerprint(&checkerboard(true)).unwrap();
        assert_eq!(a.distance(&b).unwrap(), 64);
    }

    #[test]
    fn test_resized_copy_stays_close() {
        let hasher = PerceptualHasher::default();
        let original = checkerboard(false);
        let smaller = original.resize_exact(96, 96, FilterType::Lanczos3);
        let distance = hasher
            .fingerprint(&original)
            .unwrap()
            .distance(&hasher.fingerprint(&smaller).unwrap())
            .unwrap();
        assert!(distance <= DedupConfig::default().threshold);
    }

    #[test]
    fn test_garbage_bytes_fail_to_decode() {
        let hasher = PerceptualHasher::default();
        let err = hasher
            .fingerprint_bytes(b"definitely not an image", "notes.txt")
            .unwrap_err();
        match err {
            HashError::Decode { source_name, .. } => assert_eq!(source_name, "notes.txt"),
            other => panic!("expected decode error, got {other:?}"),
        }
    }

    #[test]
    fn test_truncated_png_fails_to_decode() {
        let mut bytes = encode_png(&checkerboard(false));
        bytes.truncate(40);
        assert!(PerceptualHasher::default()
            .fingerprint_bytes(&bytes, "cut.png")
            .is_err());
    }

    #[test]
    fn test_larger_hash_size() {
        let config = DedupConfig {
            hash_size: 16,
            ..Default::default()
        };
        let fp = PerceptualHasher::new(&config)
            .fingerprint(&checkerboard(false))
            .unwrap();
        assert_eq!(fp.bit_len(), 256);
    }
}
