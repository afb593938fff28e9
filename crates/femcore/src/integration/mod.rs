//! Integration rules and integration points.
//!
//! An element owns its rules; a rule owns its points; a point owns the
//! material status allocated for it. Traversal order (rule, then point) is
//! fixed once the rules are built.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

pub mod gauss;
pub mod point;
pub mod rule;

pub use point::IntegrationPoint;
pub use rule::IntegrationRule;

/// Local (reference-domain) coordinates, one entry per reference dimension
pub type LocalCoords = SmallVec<[f64; 3]>;

/// Reference domain a rule integrates over
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IntegrationDomain {
    Line,
    Triangle,
    Square,
    Tetrahedron,
    Cube,
}

impl IntegrationDomain {
    /// Dimension of the reference domain
    pub fn dimension(&self) -> usize {
        match self {
            IntegrationDomain::Line => 1,
            IntegrationDomain::Triangle | IntegrationDomain::Square => 2,
            IntegrationDomain::Tetrahedron | IntegrationDomain::Cube => 3,
        }
    }
}
