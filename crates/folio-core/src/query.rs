//! Multi-tag AND search over tagged images.
//!
//! Matching is plain set containment over normalized tags. Storage-specific
//! query construction (SQL, remote search APIs) belongs in adapters that feed
//! candidate tag sets into [`matches`].

use std::collections::HashSet;

use crate::error::{Result, TagError};
use crate::store::TagStore;
use crate::tags::{normalize, RegionTag, TagList};
use crate::types::{ImageId, ImageRecord};

/// A validated list of tags an image must all carry.
///
/// Built with [`RequiredTags::parse`], which rejects blank entries instead of
/// dropping them, so a malformed query can never widen its own result set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequiredTags(TagList);

impl RequiredTags {
    /// Normalize the required tags, failing on any blank entry.
    pub fn parse<I, S>(raw: I) -> std::result::Result<Self, TagError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        TagList::parse_strict(raw).map(Self)
    }

    /// No requirements: matches every image.
    pub fn any() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn tags(&self) -> &TagList {
        &self.0
    }
}

/// An image's searchable tags: general tags plus region tag names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageTags {
    tags: HashSet<String>,
}

impl ImageTags {
    /// Combine general and region tags, normalizing both and skipping blanks.
    pub fn new<S: AsRef<str>>(general: &[S], regions: &[RegionTag]) -> Self {
        let tags = general
            .iter()
            .map(|t| t.as_ref())
            .chain(regions.iter().map(|r| r.tag()))
            .filter_map(|t| normalize(t).ok())
            .collect();
        Self { tags }
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }
}

impl From<&ImageRecord> for ImageTags {
    fn from(record: &ImageRecord) -> Self {
        Self::new(record.tags.as_slice(), &record.regions)
    }
}

/// True iff every required tag is present. An empty requirement matches all.
pub fn matches(required: &RequiredTags, image: &ImageTags) -> bool {
    required.0.iter().all(|tag| image.contains(tag))
}

/// Tag requirements combined with an optional free-text filter.
///
/// The text filter is a case-insensitive substring match over filename and
/// title only; it never applies to tags.
#[derive(Debug, Clone, Default)]
pub struct SearchFilter {
    pub tags: RequiredTags,
    text: Option<String>,
}

impl SearchFilter {
    pub fn new(tags: RequiredTags) -> Self {
        Self { tags, text: None }
    }

    /// Add a free-text filter. Blank text is ignored.
    pub fn with_text(mut self, text: &str) -> Self {
        let text = text.trim().to_lowercase();
        self.text = (!text.is_empty()).then_some(text);
        self
    }

    fn matches_text(&self, record: &ImageRecord) -> bool {
        let Some(needle) = &self.text else {
            return true;
        };
        record.file_name.to_lowercase().contains(needle.as_str())
            || record
                .title
                .as_deref()
                .is_some_and(|t| t.to_lowercase().contains(needle.as_str()))
    }

    /// Whether a single record passes the filter.
    pub fn matches(&self, record: &ImageRecord) -> bool {
        self.matches_text(record) && matches(&self.tags, &ImageTags::from(record))
    }

    /// Records passing the filter, in input order.
    pub fn filter<'a>(&self, records: &'a [ImageRecord]) -> Vec<&'a ImageRecord> {
        records.iter().filter(|r| self.matches(r)).collect()
    }
}

/// Ids of the candidate images whose stored tags satisfy the requirements.
pub async fn search(
    store: &dyn TagStore,
    candidates: &[ImageId],
    required: &RequiredTags,
) -> Result<Vec<ImageId>> {
    let mut hits = Vec::new();
    for &id in candidates {
        let general = store.get_tags(id).await?;
        let regions = store.get_region_tags(id).await?;
        if matches(required, &ImageTags::new(general.as_slice(), &regions)) {
            hits.push(id);
        }
    }
    tracing::debug!(
        "Tag search {:?}: {} of {} candidates matched",
        required.tags().as_slice(),
        hits.len(),
        candidates.len()
    );
    Ok(hits)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryTagStore;
    use crate::tags::BoundingBox;

    fn image(tags: &[&str]) -> ImageTags {
        ImageTags::new(tags, &[])
    }

    fn required(tags: &[&str]) -> RequiredTags {
        RequiredTags::parse(tags).unwrap()
    }

    #[test]
    fn test_and_semantics() {
        assert!(!matches(&required(&["a", "b"]), &image(&["a"])));
        assert!(matches(&required(&["a", "b"]), &image(&["a", "b", "c"])));
    }

    #[test]
    fn test_empty_requirement_matches_everything() {
        assert!(matches(&RequiredTags::any(), &image(&[])));
        assert!(matches(&required(&[]), &image(&["x", "y"])));
    }

    #[test]
    fn test_matching_is_case_insensitive_and_exact() {
        assert!(matches(&required(&["Yandoit "]), &image(&["YANDOIT"])));
        assert!(!matches(&required(&["kitchen"]), &image(&["kitchens"])));
    }

    #[test]
    fn test_blank_requirement_is_rejected() {
        assert!(RequiredTags::parse(["kitchen", "  "]).is_err());
        assert!(RequiredTags::parse([""]).is_err());
    }

    #[test]
    fn test_region_tags_count_as_tags() {
        let bbox = BoundingBox::new(0.1, 0.1, 0.2, 0.2).unwrap();
        let regions = vec![RegionTag::new("Pendant", bbox).unwrap()];
        let tags = ImageTags::new(&["kitchens"], &regions);
        assert!(matches(&required(&["kitchens", "pendant"]), &tags));
        assert_eq!(tags.len(), 2);
    }

    fn record(id: ImageId, file_name: &str, title: Option<&str>, tags: &[&str]) -> ImageRecord {
        ImageRecord {
            id,
            file_name: file_name.to_string(),
            title: title.map(str::to_string),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            ..Default::default()
        }
    }

    #[test]
    fn test_search_filter_text_and_tags() {
        let records = vec![
            record(1, "0001-reference-kitchens.jpg", Some("Oak galley"), &["kitchens"]),
            record(2, "IMG_2231.jpg", Some("Kitchen island"), &["kitchens", "stone"]),
            record(3, "island.png", None, &["landscape"]),
        ];

        let by_text = SearchFilter::default().with_text("ISLAND");
        let ids: Vec<_> = by_text.filter(&records).iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![2, 3]);

        let both = SearchFilter::new(required(&["kitchens"])).with_text("island");
        let ids: Vec<_> = both.filter(&records).iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![2]);

        let blank_text = SearchFilter::new(required(&["kitchens"])).with_text("   ");
        assert_eq!(blank_text.filter(&records).len(), 2);
    }

    #[tokio::test]
    async fn test_search_over_tag_store() {
        let bbox = BoundingBox::new(0.0, 0.0, 0.5, 0.5).unwrap();
        let mut with_region = record(2, "b.jpg", None, &["kitchens"]);
        with_region.regions = vec![RegionTag::new("stone", bbox).unwrap()];
        let store = MemoryTagStore::from_records(vec![
            record(1, "a.jpg", None, &["kitchens"]),
            with_region,
            record(3, "c.jpg", None, &["stone", "kitchens", "final"]),
        ]);

        let hits = search(&store, &[1, 2, 3], &required(&["kitchens", "stone"]))
            .await
            .unwrap();
        assert_eq!(hits, vec![2, 3]);
    }
}
