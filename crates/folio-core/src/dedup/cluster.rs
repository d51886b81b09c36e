//! Greedy single-pass clustering of fingerprints into duplicate groups.

use serde::{Deserialize, Serialize};

use crate::config::DedupConfig;
use crate::error::HashResult;
use crate::hash::Fingerprint;
use crate::types::ImageId;

/// How a new image links to an existing group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Linkage {
    /// Within threshold of any member already in the group
    #[default]
    AnyMember,
    /// Within threshold of the group's first member only
    Representative,
}

/// One image in a duplicate group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupMember {
    pub id: ImageId,
    /// Hamming distance to the group's canonical member
    pub distance: u32,
}

/// Images considered copies of one photograph.
///
/// Always has at least two members. The first member is canonical: the one
/// to keep when acting on the group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicateGroup {
    members: Vec<GroupMember>,
}

impl DuplicateGroup {
    /// Build a group, or `None` with fewer than two members.
    pub fn new(members: Vec<GroupMember>) -> Option<Self> {
        (members.len() > 1).then_some(Self { members })
    }

    /// The member to keep.
    pub fn canonical(&self) -> ImageId {
        self.members[0].id
    }

    pub fn members(&self) -> &[GroupMember] {
        &self.members
    }

    /// Every member except the canonical one.
    pub fn duplicates(&self) -> impl Iterator<Item = &GroupMember> {
        self.members.iter().skip(1)
    }

    /// All member ids in processing order.
    pub fn ids(&self) -> Vec<ImageId> {
        self.members.iter().map(|m| m.id).collect()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

struct OpenGroup<'a> {
    members: Vec<(ImageId, &'a Fingerprint, u32)>,
}

impl<'a> OpenGroup<'a> {
    fn representative(&self) -> &'a Fingerprint {
        self.members[0].1
    }
}

/// Partitions fingerprints into duplicate groups.
///
/// Images are processed in input order. Each image joins the earliest-opened
/// group it links to under the configured [`Linkage`], otherwise it opens a
/// new group. Groups left with a single member are dropped. Cost is
/// O(n·g) distance computations for representative linkage and O(n²) in the
/// worst case for any-member linkage; fine for catalogs in the low thousands.
#[derive(Debug, Clone)]
pub struct DuplicateClusterer {
    threshold: u32,
    linkage: Linkage,
}

impl DuplicateClusterer {
    /// Create a clusterer from dedup settings.
    pub fn new(config: &DedupConfig) -> Self {
        Self::with_threshold(config.threshold, config.linkage)
    }

    pub fn with_threshold(threshold: u32, linkage: Linkage) -> Self {
        Self { threshold, linkage }
    }

    pub fn threshold(&self) -> u32 {
        self.threshold
    }

    /// Group fingerprints. Fails only when fingerprint lengths differ.
    pub fn cluster(
        &self,
        fingerprints: &[(ImageId, Fingerprint)],
    ) -> HashResult<Vec<DuplicateGroup>> {
        let mut groups: Vec<OpenGroup<'_>> = Vec::new();

        for (id, fingerprint) in fingerprints {
            let mut joined = false;
            for group in groups.iter_mut() {
                let to_representative = fingerprint.distance(group.representative())?;
                if self.links(fingerprint, group, to_representative)? {
                    group.members.push((*id, fingerprint, to_representative));
                    joined = true;
                    break;
                }
            }
            if !joined {
                groups.push(OpenGroup {
                    members: vec![(*id, fingerprint, 0)],
                });
            }
        }

        let opened = groups.len();
        let result: Vec<DuplicateGroup> = groups
            .into_iter()
            .filter_map(|g| {
                DuplicateGroup::new(
                    g.members
                        .into_iter()
                        .map(|(id, _, distance)| GroupMember { id, distance })
                        .collect(),
                )
            })
            .collect();

        tracing::debug!(
            "Clustered {} fingerprints into {} groups ({} with duplicates)",
            fingerprints.len(),
            opened,
            result.len()
        );
        Ok(result)
    }

    fn links(
        &self,
        fingerprint: &Fingerprint,
        group: &OpenGroup<'_>,
        to_representative: u32,
    ) -> HashResult<bool> {
        if to_representative <= self.threshold {
            return Ok(true);
        }
        match self.linkage {
            Linkage::Representative => Ok(false),
            Linkage::AnyMember => {
                for (_, member, _) in group.members.iter().skip(1) {
                    if fingerprint.distance(member)? <= self.threshold {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
        }
    }
}
