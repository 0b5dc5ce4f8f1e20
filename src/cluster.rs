//! Classifies hierarchy leaves into configured regions.

use crate::data::{
    ClusterConflict, ClusterMap, ClusterReport, ConflictKind, LeafKey, Region, RegionConfig,
    RegionName,
};
use crate::error::HierarchyError;
use crate::hierarchy::HierarchyProvider;
use itertools::Itertools;
use log::{debug, info, warn};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::time::Instant;

/// Expands the excluded top-level keys into the set of leaves lying beneath
/// any of them.
pub fn resolve_excluded_leaves<H: HierarchyProvider + ?Sized>(
    excluded_keys: &[String],
    hierarchy: &H,
) -> Result<BTreeSet<LeafKey>, HierarchyError> {
    if excluded_keys.is_empty() {
        return Ok(BTreeSet::new());
    }
    let excluded_keys: HashSet<&str> = excluded_keys.iter().map(String::as_str).collect();
    let mut excluded = BTreeSet::new();
    for leaf in hierarchy.leaf_keys() {
        let ancestry = hierarchy.ancestry_of(&leaf)?;
        if ancestry.iter().any(|key| excluded_keys.contains(key.as_str())) {
            excluded.insert(leaf);
        }
    }
    Ok(excluded)
}

/// Returns true if walking `ancestry` leaf-first reaches an element of
/// `region` before reaching one of its truncation markers.
fn region_claims(region: &Region, ancestry: &[String]) -> bool {
    for key in ancestry {
        if region.truncates_at(key) {
            return false;
        }
        if region.includes(key) {
            return true;
        }
    }
    false
}

/// Places every non-excluded leaf into exactly one region.
///
/// Leaves claimed by zero or several regions are left out of the map and
/// reported as conflicts, together with their ancestry. Hierarchy errors
/// abort the build.
pub fn build_cluster_map<H: HierarchyProvider + ?Sized>(
    config: &RegionConfig,
    hierarchy: &H,
) -> Result<ClusterReport, HierarchyError> {
    let start_time = Instant::now();
    let excluded = resolve_excluded_leaves(&config.top_level_excluded_keys, hierarchy)?;

    let leaves: Vec<LeafKey> = hierarchy
        .leaf_keys()
        .into_iter()
        .filter(|leaf| !excluded.contains(leaf))
        .sorted()
        .dedup()
        .collect();
    info!(
        "Clustering {} leaves into {} regions ({} excluded)...",
        leaves.len(),
        config.regions.len(),
        excluded.len()
    );

    let mut leaf_to_region: BTreeMap<LeafKey, RegionName> = BTreeMap::new();
    let mut conflicts = Vec::new();

    for leaf in leaves {
        let ancestry = hierarchy.ancestry_of(&leaf)?;
        let matched: Vec<RegionName> = config
            .regions
            .iter()
            .filter(|region| region_claims(region, &ancestry))
            .map(|region| region.name.clone())
            .collect();

        if let [region] = matched.as_slice() {
            leaf_to_region.insert(leaf, region.clone());
            continue;
        }
        let kind = if matched.is_empty() {
            ConflictKind::Unmatched
        } else {
            ConflictKind::Ambiguous
        };
        let conflict = ClusterConflict {
            leaf,
            kind,
            ancestry,
            matched_regions: matched,
        };
        warn!("{}", conflict);
        conflicts.push(conflict);
    }

    let map = ClusterMap::from_assignments(
        config.region_names().map(str::to_string).collect(),
        leaf_to_region,
    );
    debug!(
        "Clustered {} leaves with {} conflicts in {:.2?}",
        map.len(),
        conflicts.len(),
        start_time.elapsed()
    );

    Ok(ClusterReport {
        map,
        conflicts,
        excluded,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formula::parse_region_config;
    use crate::hierarchy::Hierarchy;

    fn realm() -> Hierarchy {
        Hierarchy::from_parents([
            ("c_paris", "d_ile"),
            ("c_chartres", "d_ile"),
            ("c_orleans", "d_orleans"),
            ("c_dijon", "d_burgundy"),
            ("d_ile", "k_france"),
            ("d_orleans", "k_france"),
            ("d_burgundy", "k_burgundy"),
            ("k_france", "e_francia"),
            ("k_burgundy", "e_francia"),
            ("c_rome", "d_latium"),
            ("d_latium", "k_italy"),
            ("k_italy", "e_italia"),
        ])
    }

    #[test]
    fn minus_truncates_before_farther_plus() {
        let config = parse_region_config("R = c_other + k_france ~ d_ile").unwrap();
        let region = &config.regions[0];
        let ancestry: Vec<String> = ["c_paris", "d_ile", "k_france", "e_francia"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert!(!region_claims(region, &ancestry));

        let report = build_cluster_map(&config, &realm()).unwrap();
        assert_eq!(report.map.region_of("c_orleans"), Some("R"));
        assert_eq!(report.map.region_of("c_paris"), None);
    }

    #[test]
    fn nearest_inclusion_wins_over_farther_minus() {
        let config = parse_region_config("R = d_ile ~ e_francia").unwrap();
        let report = build_cluster_map(&config, &realm()).unwrap();
        assert_eq!(report.map.region_of("c_paris"), Some("R"));
        assert_eq!(report.map.region_of("c_chartres"), Some("R"));
    }

    #[test]
    fn excluded_leaves_are_neither_mapped_nor_reported() {
        let config = parse_region_config("!e_italia\nFrance = e_francia").unwrap();
        let report = build_cluster_map(&config, &realm()).unwrap();
        assert_eq!(report.excluded, BTreeSet::from(["c_rome".to_string()]));
        assert_eq!(report.map.region_of("c_rome"), None);
        assert!(report.conflicts.is_empty());
        assert_eq!(report.map.len(), 4);
    }

    #[test]
    fn overlapping_regions_are_ambiguous() {
        let config = parse_region_config("West = k_france\nFrancia = e_francia").unwrap();
        let report = build_cluster_map(&config, &realm()).unwrap();
        let conflict = report
            .conflicts
            .iter()
            .find(|c| c.leaf == "c_paris")
            .unwrap();
        assert_eq!(conflict.kind, ConflictKind::Ambiguous);
        assert_eq!(conflict.matched_regions, vec!["West", "Francia"]);
        assert_eq!(
            conflict.ancestry,
            vec!["c_paris", "d_ile", "k_france", "e_francia"]
        );
        assert_eq!(report.map.region_of("c_dijon"), Some("Francia"));
    }

    #[test]
    fn every_leaf_is_mapped_or_reported_never_both() {
        let config =
            parse_region_config("!k_italy\nA = d_ile\nB = e_francia ~ d_ile d_orleans").unwrap();
        let hierarchy = realm();
        let report = build_cluster_map(&config, &hierarchy).unwrap();
        for leaf in hierarchy.leaf_keys() {
            if report.excluded.contains(&leaf) {
                continue;
            }
            let mapped = report.map.region_of(&leaf).is_some();
            let reported = report.conflicts.iter().any(|c| c.leaf == leaf);
            assert!(
                mapped ^ reported,
                "leaf {} mapped={} reported={}",
                leaf,
                mapped,
                reported
            );
        }
        assert_eq!(report.conflicts.len(), 1);
        assert_eq!(report.conflicts[0].leaf, "c_orleans");
        assert_eq!(report.conflicts[0].kind, ConflictKind::Unmatched);
    }

    #[test]
    fn inverse_map_lists_every_region() {
        let config = parse_region_config("A = d_ile\nEmpty = k_nowhere").unwrap();
        let report = build_cluster_map(&config, &realm()).unwrap();
        assert_eq!(report.map.region_names(), ["A", "Empty"]);
        assert_eq!(report.map.leaves_of("Empty").map(|s| s.len()), Some(0));
        assert_eq!(
            report.map.leaves_of("A").unwrap().iter().collect::<Vec<_>>(),
            vec!["c_chartres", "c_paris"]
        );

        // the two directions agree leaf by leaf
        for (leaf, region) in report.map.leaf_to_region() {
            assert!(report.map.region_to_leaves()[region].contains(leaf));
        }
        let inverse_total: usize = report
            .map
            .region_to_leaves()
            .values()
            .map(|leaves| leaves.len())
            .sum();
        assert_eq!(inverse_total, report.map.leaf_to_region().len());
    }

    #[test]
    fn empty_config_reports_every_leaf() {
        let config = parse_region_config("# nothing configured").unwrap();
        let hierarchy = realm();
        let report = build_cluster_map(&config, &hierarchy).unwrap();
        assert!(report.map.is_empty());
        assert_eq!(report.conflicts.len(), hierarchy.leaf_keys().len());
        assert!(
            report
                .conflicts
                .iter()
                .all(|c| c.kind == ConflictKind::Unmatched)
        );
    }

    #[test]
    fn hierarchy_errors_propagate() {
        let config = parse_region_config("A = d_a").unwrap();
        let broken = Hierarchy::new()
            .with_leaf("c_a")
            .with_parent("c_a", "d_a")
            .with_parent("d_a", "c_a");
        assert!(matches!(
            build_cluster_map(&config, &broken),
            Err(HierarchyError::Cycle { .. })
        ));
    }

    #[test]
    fn repeated_builds_are_identical() {
        let config = parse_region_config("A = k_france\nB = e_francia ~ k_france").unwrap();
        let first = build_cluster_map(&config, &realm()).unwrap();
        let second = build_cluster_map(&config, &realm()).unwrap();
        assert_eq!(first, second);
    }
}
