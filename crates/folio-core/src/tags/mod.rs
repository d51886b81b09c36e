//! Tag normalization and ordered tag lists.
//!
//! A normalized tag is the unit of identity for every tag comparison:
//! "Yandoit", " yandoit " and "YANDOIT" are the same tag.

pub mod region;

pub use region::{BoundingBox, RegionTag};

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::error::TagError;

/// Normalize a raw tag: trim, lowercase, collapse interior whitespace runs to
/// a single space.
///
/// Fails with [`TagError::Empty`] when nothing but whitespace remains.
pub fn normalize(raw: &str) -> Result<String, TagError> {
    let normalized = raw
        .split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ");
    if normalized.is_empty() {
        return Err(TagError::Empty {
            raw: raw.to_string(),
        });
    }
    Ok(normalized)
}

/// Normalized, de-duplicated tags in the order the caller supplied them.
///
/// Classification resolves sub-categories by scanning tags in this order, so
/// `TagList` never sorts. A tag repeated after normalization keeps its first
/// position.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct TagList {
    tags: Vec<String>,
}

impl TagList {
    /// An empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Normalize raw tags, discarding blank entries.
    pub fn from_raw<I, S>(raw: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut list = Self::new();
        for tag in raw {
            match normalize(tag.as_ref()) {
                Ok(normalized) => {
                    list.push_normalized(normalized);
                }
                Err(e) => tracing::debug!("Discarding tag: {e}"),
            }
        }
        list
    }

    /// Normalize raw tags, failing on the first blank entry.
    pub fn parse_strict<I, S>(raw: I) -> Result<Self, TagError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut list = Self::new();
        for tag in raw {
            list.push_normalized(normalize(tag.as_ref())?);
        }
        Ok(list)
    }

    /// Normalize and append a tag. Returns false if it was already present.
    pub fn push(&mut self, raw: &str) -> Result<bool, TagError> {
        let normalized = normalize(raw)?;
        Ok(self.push_normalized(normalized))
    }

    fn push_normalized(&mut self, tag: String) -> bool {
        if self.tags.contains(&tag) {
            return false;
        }
        self.tags.push(tag);
        true
    }

    /// Whether the (already normalized) tag is present.
    pub fn contains(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    /// Tags in supplied order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.tags.iter().map(String::as_str)
    }

    /// Tags in supplied order.
    pub fn as_slice(&self) -> &[String] {
        &self.tags
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }
}

impl From<Vec<String>> for TagList {
    fn from(raw: Vec<String>) -> Self {
        Self::from_raw(raw)
    }
}

impl From<TagList> for Vec<String> {
    fn from(list: TagList) -> Self {
        list.tags
    }
}

impl<'a> IntoIterator for &'a TagList {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.tags.iter()
    }
}

/// Raw spellings that collapse onto one normalized tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagMerge {
    /// The surviving normalized tag
    pub tag: String,
    /// Distinct raw spellings, in first-seen order
    pub variants: Vec<String>,
}

/// Administrative normalization pass over raw tag names.
///
/// Reports every normalized tag that more than one distinct raw spelling maps
/// to, sorted by tag. Blank spellings are reported separately so the caller
/// can delete them.
pub fn merge_report<I, S>(raw: I) -> (Vec<TagMerge>, Vec<String>)
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut by_tag: BTreeMap<String, Vec<String>> = BTreeMap::new();
    let mut seen = HashSet::new();
    let mut blank = Vec::new();

    for spelling in raw {
        let spelling = spelling.as_ref();
        if !seen.insert(spelling.to_string()) {
            continue;
        }
        match normalize(spelling) {
            Ok(tag) => by_tag.entry(tag).or_default().push(spelling.to_string()),
            Err(_) => blank.push(spelling.to_string()),
        }
    }

    let merges = by_tag
        .into_iter()
        .filter(|(_, variants)| variants.len() > 1)
        .map(|(tag, variants)| TagMerge { tag, variants })
        .collect();
    (merges, blank)
}
