//! The hierarchy boundary: the one capability the core needs from the
//! entity tree is "given a key, return its ancestry path".

use crate::data::LeafKey;
use crate::error::HierarchyError;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};

pub trait HierarchyProvider {
    /// Ancestry of `leaf`, starting with the leaf itself and ending at the root.
    fn ancestry_of(&self, leaf: &str) -> Result<Vec<String>, HierarchyError>;

    /// Every leaf key this provider knows about.
    fn leaf_keys(&self) -> Vec<LeafKey>;
}

/// An in-memory hierarchy described by child to parent links.
///
/// Without an explicit `leaves` set, leaves are derived from `parents` keys,
/// so a leaf that has no parent (a hierarchy of one node) is only enumerated
/// when it is listed in `leaves`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Hierarchy {
    /// Child key to parent key. Roots have no entry.
    pub parents: BTreeMap<String, String>,
    /// Explicit leaf set. When empty, leaves are the keys no other key names
    /// as its parent.
    #[serde(default)]
    pub leaves: BTreeSet<LeafKey>,
}

impl Hierarchy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_parents<I, K, P>(links: I) -> Self
    where
        I: IntoIterator<Item = (K, P)>,
        K: Into<String>,
        P: Into<String>,
    {
        Self {
            parents: links
                .into_iter()
                .map(|(k, p)| (k.into(), p.into()))
                .collect(),
            leaves: BTreeSet::new(),
        }
    }

    pub fn with_parent(mut self, child: impl Into<String>, parent: impl Into<String>) -> Self {
        self.parents.insert(child.into(), parent.into());
        self
    }

    pub fn with_leaf(mut self, leaf: impl Into<LeafKey>) -> Self {
        self.leaves.insert(leaf.into());
        self
    }

    fn is_known(&self, key: &str) -> bool {
        self.parents.contains_key(key)
            || self.leaves.contains(key)
            || self.parents.values().any(|p| p == key)
    }
}

impl HierarchyProvider for Hierarchy {
    fn ancestry_of(&self, leaf: &str) -> Result<Vec<String>, HierarchyError> {
        if !self.is_known(leaf) {
            return Err(HierarchyError::UnknownKey(leaf.to_string()));
        }
        let mut path = vec![leaf.to_string()];
        let mut seen: HashSet<&str> = HashSet::from([leaf]);
        let mut current = leaf;
        while let Some(parent) = self.parents.get(current) {
            if !seen.insert(parent.as_str()) {
                return Err(HierarchyError::Cycle {
                    leaf: leaf.to_string(),
                    repeated: parent.clone(),
                });
            }
            path.push(parent.clone());
            current = parent.as_str();
        }
        Ok(path)
    }

    fn leaf_keys(&self) -> Vec<LeafKey> {
        if !self.leaves.is_empty() {
            return self.leaves.iter().cloned().collect();
        }
        let parents: HashSet<&str> = self.parents.values().map(String::as_str).collect();
        self.parents
            .keys()
            .filter(|k| !parents.contains(k.as_str()))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Hierarchy {
        Hierarchy::from_parents([
            ("c_paris", "d_ile"),
            ("c_orleans", "d_orleans"),
            ("d_ile", "k_france"),
            ("d_orleans", "k_france"),
            ("k_france", "e_francia"),
        ])
    }

    #[test]
    fn ancestry_runs_leaf_first_to_root() {
        let h = sample();
        assert_eq!(
            h.ancestry_of("c_paris").unwrap(),
            vec!["c_paris", "d_ile", "k_france", "e_francia"]
        );
        assert_eq!(h.ancestry_of("e_francia").unwrap(), vec!["e_francia"]);
    }

    #[test]
    fn leaves_are_derived_from_links() {
        assert_eq!(sample().leaf_keys(), vec!["c_orleans", "c_paris"]);
    }

    #[test]
    fn explicit_leaves_take_precedence() {
        let h = sample().with_leaf("d_ile");
        assert_eq!(h.leaf_keys(), vec!["d_ile"]);
    }

    #[test]
    fn parentless_leaf_needs_explicit_listing() {
        let links_only = Hierarchy::new().with_parent("c_a", "k_a");
        assert_eq!(links_only.leaf_keys(), vec!["c_a"]);

        let h = links_only.with_leaf("c_a").with_leaf("c_island");
        assert_eq!(h.leaf_keys(), vec!["c_a", "c_island"]);
        assert_eq!(h.ancestry_of("c_island").unwrap(), vec!["c_island"]);
    }

    #[test]
    fn unknown_key_is_an_error() {
        assert_eq!(
            sample().ancestry_of("c_nowhere"),
            Err(HierarchyError::UnknownKey("c_nowhere".to_string()))
        );
    }

    #[test]
    fn cycles_are_detected() {
        let h = Hierarchy::new()
            .with_parent("c_a", "d_a")
            .with_parent("d_a", "k_a")
            .with_parent("k_a", "d_a");
        assert_eq!(
            h.ancestry_of("c_a"),
            Err(HierarchyError::Cycle {
                leaf: "c_a".to_string(),
                repeated: "d_a".to_string()
            })
        );
    }
}
