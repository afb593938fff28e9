//! Error types for femcore.
//!
//! Geometry that does not apply to an element (the area of a line, the default
//! rule of an element without rules) is reported through sentinel values
//! (`0.0`, `None`) and never through this type.

use thiserror::Error;

use crate::adaptive::MappingFailureRecord;
use crate::dofman::DofManagerKind;
use crate::integration::IntegrationDomain;
use crate::material::InternalStateType;
use crate::parallel::ParallelMode;

pub type Result<T> = std::result::Result<T, ElementError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ElementError {
    #[error("element {element}: invalid topology: {reason}")]
    InvalidTopology { element: usize, reason: String },

    #[error("element {element}: dof manager {index} is {found:?}, expected {expected:?}")]
    TypeMismatch {
        element: usize,
        index: usize,
        expected: DofManagerKind,
        found: DofManagerKind,
    },

    #[error("{what} index {index} out of range (1..={len})")]
    IndexOutOfRange {
        what: &'static str,
        index: usize,
        len: usize,
    },

    #[error("element {element}: {component} {number} is not defined")]
    MissingComponent {
        element: usize,
        component: &'static str,
        number: usize,
    },

    #[error("no {nip}-point integration rule on {domain:?}")]
    UnsupportedIntegration { domain: IntegrationDomain, nip: usize },

    #[error("consistency check failed for elements {elements:?}")]
    ConsistencyCheckFailed { elements: Vec<usize> },

    #[error("element {element}: operation requires {expected:?} mode, element is {found:?}")]
    ParallelMode {
        element: usize,
        expected: ParallelMode,
        found: ParallelMode,
    },

    #[error("element {element}: desynchronized exchange: {reason}")]
    Desync { element: usize, reason: String },

    #[error("channel error: {0}")]
    Channel(String),

    #[error("state mapping failed for {} integration point(s)", .failures.len())]
    MappingFailure { failures: Vec<MappingFailureRecord> },

    #[error("element {element}: singular geometry mapping")]
    SingularMapping { element: usize },

    #[error("invalid renumbering: {0}")]
    InvalidRenumbering(String),

    #[error("history mismatch for {kind:?}: status holds {expected} value(s), got {found}")]
    HistoryMismatch {
        kind: InternalStateType,
        expected: usize,
        found: usize,
    },
}
