use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

// Type aliases for clarity
pub type LeafKey = String;
pub type RegionName = String;
pub type SlotKey = String;
pub type ParticipantId = String;

/// A named cluster of leaf entities, parsed from one configuration line.
///
/// The name doubles as the slot key used by the assignment engine.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Region {
    pub name: RegionName,
    pub base_elements: BTreeSet<String>,
    pub plus_elements: BTreeSet<String>,
    /// Ancestors past which this region is no longer considered.
    pub minus_elements: BTreeSet<String>,
}

impl Region {
    pub fn new(name: impl Into<RegionName>) -> Self {
        Self {
            name: name.into(),
            base_elements: BTreeSet::new(),
            plus_elements: BTreeSet::new(),
            minus_elements: BTreeSet::new(),
        }
    }

    /// True if `key` adds a leaf to this region when found on its ancestry path.
    pub fn includes(&self, key: &str) -> bool {
        self.base_elements.contains(key) || self.plus_elements.contains(key)
    }

    pub fn truncates_at(&self, key: &str) -> bool {
        self.minus_elements.contains(key)
    }
}

/// A fully parsed region configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegionConfig {
    pub regions: Vec<Region>,
    pub top_level_excluded_keys: Vec<String>,
}

impl RegionConfig {
    /// A configuration holding neither regions nor exclusions.
    pub fn is_empty(&self) -> bool {
        self.regions.is_empty() && self.top_level_excluded_keys.is_empty()
    }

    pub fn region_names(&self) -> impl Iterator<Item = &str> {
        self.regions.iter().map(|r| r.name.as_str())
    }
}

/// Leaf to region mapping and its inverse.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterMap {
    leaf_to_region: BTreeMap<LeafKey, RegionName>,
    region_to_leaves: BTreeMap<RegionName, BTreeSet<LeafKey>>,
    /// Region names in configuration order.
    #[serde(rename = "regionNames")]
    region_order: Vec<RegionName>,
}

impl ClusterMap {
    /// Builds the map from settled leaf assignments. Every configured region
    /// gets an entry in the inverse map, even when no leaf landed in it.
    pub(crate) fn from_assignments(
        region_order: Vec<RegionName>,
        leaf_to_region: BTreeMap<LeafKey, RegionName>,
    ) -> Self {
        let mut region_to_leaves: BTreeMap<RegionName, BTreeSet<LeafKey>> = region_order
            .iter()
            .map(|name| (name.clone(), BTreeSet::new()))
            .collect();
        for (leaf, region) in &leaf_to_region {
            region_to_leaves
                .entry(region.clone())
                .or_default()
                .insert(leaf.clone());
        }
        Self {
            leaf_to_region,
            region_to_leaves,
            region_order,
        }
    }

    pub fn region_of(&self, leaf: &str) -> Option<&str> {
        self.leaf_to_region.get(leaf).map(String::as_str)
    }

    pub fn leaves_of(&self, region: &str) -> Option<&BTreeSet<LeafKey>> {
        self.region_to_leaves.get(region)
    }

    pub fn leaf_to_region(&self) -> &BTreeMap<LeafKey, RegionName> {
        &self.leaf_to_region
    }

    pub fn region_to_leaves(&self) -> &BTreeMap<RegionName, BTreeSet<LeafKey>> {
        &self.region_to_leaves
    }

    /// The slot vocabulary for the assignment engine.
    pub fn region_names(&self) -> &[RegionName] {
        &self.region_order
    }

    pub fn len(&self) -> usize {
        self.leaf_to_region.len()
    }

    pub fn is_empty(&self) -> bool {
        self.leaf_to_region.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ConflictKind {
    /// No region claimed the leaf.
    Unmatched,
    /// More than one region claimed the leaf.
    Ambiguous,
}

/// A leaf that could not be placed in exactly one region.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterConflict {
    pub leaf: LeafKey,
    pub kind: ConflictKind,
    pub ancestry: Vec<String>,
    pub matched_regions: Vec<RegionName>,
}

impl fmt::Display for ClusterConflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            ConflictKind::Unmatched => write!(
                f,
                "leaf {} matches no region (ancestry: {})",
                self.leaf,
                self.ancestry.join(" > ")
            ),
            ConflictKind::Ambiguous => write!(
                f,
                "leaf {} matches regions [{}] (ancestry: {})",
                self.leaf,
                self.matched_regions.join(", "),
                self.ancestry.join(" > ")
            ),
        }
    }
}

/// The output of a cluster build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterReport {
    pub map: ClusterMap,
    pub conflicts: Vec<ClusterConflict>,
    pub excluded: BTreeSet<LeafKey>,
}

/// Someone to be matched to exactly one slot.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    pub id: ParticipantId,
    /// Ranked slot keys, most preferred first.
    #[serde(default)]
    pub picks: Vec<SlotKey>,
}

impl Participant {
    pub fn new<I, S>(id: impl Into<ParticipantId>, picks: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<SlotKey>,
    {
        Self {
            id: id.into(),
            picks: picks.into_iter().map(Into::into).collect(),
        }
    }

    /// Rank of `slot` in this participant's picks; the first occurrence wins.
    pub fn rank_of(&self, slot: &str) -> Option<usize> {
        self.picks.iter().position(|p| p == slot)
    }
}

/// Describes a participant who did not get their first pick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnmetPreference {
    pub participant_id: ParticipantId,
    pub assigned_slot: SlotKey,
    /// `None` when the assigned slot was not among the participant's picks.
    pub assigned_rank: Option<usize>,
    pub description: String,
}

impl fmt::Display for UnmetPreference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.participant_id, self.description)
    }
}

/// The final output of the assignment engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentResult {
    pub assignments: BTreeMap<SlotKey, ParticipantId>,
    pub total_utility: i64,
    pub unassigned_slots: Vec<SlotKey>,
    pub unmet_preferences: Vec<UnmetPreference>,
}

impl AssignmentResult {
    pub fn participant_for(&self, slot: &str) -> Option<&str> {
        self.assignments.get(slot).map(String::as_str)
    }

    pub fn slot_of(&self, participant: &str) -> Option<&str> {
        self.assignments
            .iter()
            .find(|(_, p)| p.as_str() == participant)
            .map(|(slot, _)| slot.as_str())
    }
}
