//! Region clustering and preference-based slot assignment.
//!
//! Leaves of an external entity hierarchy are grouped into named regions
//! described by a small inclusion/exclusion formula language; the region
//! names then serve as slots that participants are matched to one-to-one,
//! maximising the utility of their ranked picks.

pub mod cluster;
pub mod config;
pub mod data;
pub mod error;
pub mod formula;
pub mod hierarchy;
pub mod server;
pub mod solver;

pub use cluster::{build_cluster_map, resolve_excluded_leaves};
pub use data::{
    AssignmentResult, ClusterConflict, ClusterMap, ClusterReport, ConflictKind, Participant,
    Region, RegionConfig,
};
pub use error::{AssignmentError, ConfigParseError, HierarchyError};
pub use formula::parse_region_config;
pub use hierarchy::{Hierarchy, HierarchyProvider};
pub use solver::compute_assignment;
