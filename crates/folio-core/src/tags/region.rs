//! Tags anchored to a rectangular sub-area of an image.
//!
//! Both types validate on deserialization, so a catalog can never load a box
//! outside the image or a blank region tag.

use serde::{Deserialize, Serialize};

use crate::error::TagError;

use super::normalize;

/// A rectangle in image-relative coordinates.
///
/// All values are fractions of the image dimensions. A valid box satisfies
/// `0 <= x`, `x + width <= 1`, `0 <= y`, `y + height <= 1`, with a positive
/// width and height.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "BoundingBoxSpec")]
pub struct BoundingBox {
    x: f32,
    y: f32,
    width: f32,
    height: f32,
}

#[derive(Deserialize)]
struct BoundingBoxSpec {
    x: f32,
    y: f32,
    width: f32,
    height: f32,
}

impl TryFrom<BoundingBoxSpec> for BoundingBox {
    type Error = TagError;

    fn try_from(spec: BoundingBoxSpec) -> Result<Self, Self::Error> {
        Self::new(spec.x, spec.y, spec.width, spec.height).ok_or(TagError::InvalidRegion {
            x: spec.x,
            y: spec.y,
            width: spec.width,
            height: spec.height,
        })
    }
}

impl BoundingBox {
    /// Build a box, returning `None` when it falls outside the image.
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Option<Self> {
        let axis_ok = |origin: f32, extent: f32| {
            origin.is_finite()
                && extent.is_finite()
                && origin >= 0.0
                && extent > 0.0
                && origin + extent <= 1.0 + f32::EPSILON
        };
        (axis_ok(x, width) && axis_ok(y, height)).then_some(Self {
            x,
            y,
            width,
            height,
        })
    }

    pub fn x(&self) -> f32 {
        self.x
    }

    pub fn y(&self) -> f32 {
        self.y
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn height(&self) -> f32 {
        self.height
    }
}

/// A normalized tag attached to a region of an image.
///
/// Region tags count as ordinary tags when searching but never influence
/// folder classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RegionTagSpec")]
pub struct RegionTag {
    tag: String,
    region: BoundingBox,
}

#[derive(Deserialize)]
struct RegionTagSpec {
    tag: String,
    region: BoundingBox,
}

impl TryFrom<RegionTagSpec> for RegionTag {
    type Error = TagError;

    fn try_from(spec: RegionTagSpec) -> Result<Self, Self::Error> {
        Self::new(&spec.tag, spec.region)
    }
}

impl RegionTag {
    /// Normalize the tag name and attach it to the region.
    pub fn new(raw_tag: &str, region: BoundingBox) -> Result<Self, TagError> {
        Ok(Self {
            tag: normalize(raw_tag)?,
            region,
        })
    }

    /// The normalized tag name.
    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn region(&self) -> BoundingBox {
        self.region
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounding_box_bounds() {
        assert!(BoundingBox::new(0.0, 0.0, 1.0, 1.0).is_some());
        assert!(BoundingBox::new(0.25, 0.5, 0.5, 0.5).is_some());
        assert!(BoundingBox::new(0.6, 0.0, 0.5, 0.2).is_none());
        assert!(BoundingBox::new(-0.1, 0.0, 0.5, 0.2).is_none());
        assert!(BoundingBox::new(0.1, 0.1, 0.0, 0.2).is_none());
        assert!(BoundingBox::new(0.1, f32::NAN, 0.1, 0.2).is_none());
    }

    #[test]
    fn test_region_tag_normalizes_name() {
        let bbox = BoundingBox::new(0.0, 0.0, 0.5, 0.5).unwrap();
        let region = RegionTag::new("  Pendant Light ", bbox).unwrap();
        assert_eq!(region.tag(), "pendant light");
        assert_eq!(region.region(), bbox);
        assert!(RegionTag::new(" ", bbox).is_err());
    }

    #[test]
    fn test_deserialize_normalizes_region_tag() {
        let region: RegionTag = serde_json::from_str(
            r#"{"tag": " Bar  Stool", "region": {"x": 0.5, "y": 0.25, "width": 0.5, "height": 0.75}}"#,
        )
        .unwrap();
        assert_eq!(region.tag(), "bar stool");
        assert_eq!(region.region().x(), 0.5);
        assert_eq!(region.region().height(), 0.75);
    }

    #[test]
    fn test_deserialize_rejects_box_outside_image() {
        for json in [
            r#"{"x": 5.0, "y": 0.0, "width": 0.5, "height": 0.5}"#,
            r#"{"x": 0.1, "y": -2.0, "width": 0.5, "height": 0.5}"#,
            r#"{"x": 0.1, "y": 0.1, "width": 0.5, "height": 0.0}"#,
            r#"{"x": 0.6, "y": 0.1, "width": 0.5, "height": 0.2}"#,
        ] {
            assert!(
                serde_json::from_str::<BoundingBox>(json).is_err(),
                "accepted {json}"
            );
        }
    }

    #[test]
    fn test_deserialize_rejects_blank_region_tag() {
        let json = r#"{"tag": "  ", "region": {"x": 0.1, "y": 0.1, "width": 0.2, "height": 0.2}}"#;
        assert!(serde_json::from_str::<RegionTag>(json).is_err());
    }
}
