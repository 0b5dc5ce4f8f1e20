//! Error types for the clustering and assignment core.

use thiserror::Error;

/// A region configuration that could not be parsed. Parsing stops at the
/// first failing line; no partial configuration is returned.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigParseError {
    #[error("line {line}: expected exactly one '=' in {text:?}")]
    MissingSeparator { line: usize, text: String },

    #[error("line {line}: region name is empty or invalid in {text:?}")]
    InvalidRegionName { line: usize, text: String },

    #[error("line {line}: unexpected character {found:?} in formula {text:?}")]
    InvalidCharacter {
        line: usize,
        found: char,
        text: String,
    },

    #[error("line {line}: formula has no elements in {text:?}")]
    EmptyFormula { line: usize, text: String },

    #[error("line {line}: exclusion has no key")]
    EmptyExclusion { line: usize },

    #[error("line {line}: region {name} is already defined")]
    DuplicateRegion { line: usize, name: String },
}

impl ConfigParseError {
    /// 1-based line number of the offending line.
    pub fn line(&self) -> usize {
        match self {
            Self::MissingSeparator { line, .. }
            | Self::InvalidRegionName { line, .. }
            | Self::InvalidCharacter { line, .. }
            | Self::EmptyFormula { line, .. }
            | Self::EmptyExclusion { line }
            | Self::DuplicateRegion { line, .. } => *line,
        }
    }
}

/// Failures reported by a [`HierarchyProvider`](crate::hierarchy::HierarchyProvider).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum HierarchyError {
    #[error("unknown hierarchy key: {0}")]
    UnknownKey(String),

    #[error("cycle in ancestry of {leaf} at {repeated}")]
    Cycle { leaf: String, repeated: String },
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AssignmentError {
    #[error("{participants} participants cannot be matched to only {slots} slots")]
    NotEnoughSlots { slots: usize, participants: usize },

    #[error("slot {0} is listed more than once")]
    DuplicateSlot(String),

    #[error("participant {0} is listed more than once")]
    DuplicateParticipant(String),
}

/// Failures surfaced by the HTTP service around the core.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("region configuration rejected: {0}")]
    Parse(#[from] ConfigParseError),

    #[error("hierarchy error: {0}")]
    Hierarchy(#[from] HierarchyError),

    #[error("assignment rejected: {0}")]
    Assignment(#[from] AssignmentError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
