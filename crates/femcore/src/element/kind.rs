//! Element types and their per-type defaults.

use serde::{Deserialize, Serialize};

use crate::integration::IntegrationDomain;
use crate::interpolation::{GeometryType, Interpolation, interpolation_for};
use crate::material::MaterialMode;

/// Supported element types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ElementKind {
    /// 2-node truss (T3D2)
    T3D2,
    /// 3-node plane stress triangle (CPS3)
    CPS3,
    /// 4-node plane stress quadrilateral (CPS4)
    CPS4,
    /// 4-node plane strain quadrilateral (CPE4)
    CPE4,
    /// 4-node tetrahedron (C3D4)
    C3D4,
    /// 8-node brick (C3D8)
    C3D8,
}

impl ElementKind {
    /// Parse element type from its type string
    pub fn from_type_name(type_str: &str) -> Option<Self> {
        let type_upper = type_str.to_uppercase();
        match type_upper.as_str() {
            "T3D2" => Some(ElementKind::T3D2),
            "CPS3" => Some(ElementKind::CPS3),
            "CPS4" | "CPS4R" => Some(ElementKind::CPS4),
            "CPE4" | "CPE4R" => Some(ElementKind::CPE4),
            "C3D4" => Some(ElementKind::C3D4),
            "C3D8" | "C3D8R" => Some(ElementKind::C3D8),
            _ => None,
        }
    }

    pub fn geometry_type(&self) -> GeometryType {
        match self {
            ElementKind::T3D2 => GeometryType::Line2,
            ElementKind::CPS3 => GeometryType::Triangle3,
            ElementKind::CPS4 | ElementKind::CPE4 => GeometryType::Quad4,
            ElementKind::C3D4 => GeometryType::Tetra4,
            ElementKind::C3D8 => GeometryType::Hexa8,
        }
    }

    pub fn interpolation(&self) -> &'static dyn Interpolation {
        interpolation_for(self.geometry_type())
    }

    pub fn integration_domain(&self) -> IntegrationDomain {
        self.interpolation().integration_domain()
    }

    /// Get the number of nodes for this element type
    pub fn num_nodes(&self) -> usize {
        self.interpolation().number_of_nodes()
    }

    /// Stress state the element works in
    pub fn material_mode(&self) -> MaterialMode {
        match self {
            ElementKind::T3D2 => MaterialMode::Uniaxial,
            ElementKind::CPS3 | ElementKind::CPS4 => MaterialMode::PlaneStress,
            ElementKind::CPE4 => MaterialMode::PlaneStrain,
            ElementKind::C3D4 | ElementKind::C3D8 => MaterialMode::ThreeDimensional,
        }
    }

    /// Integration points of the default rule
    pub fn default_nip(&self) -> usize {
        match self {
            ElementKind::T3D2 | ElementKind::CPS3 | ElementKind::C3D4 => 1,
            ElementKind::CPS4 | ElementKind::CPE4 => 4,
            ElementKind::C3D8 => 8,
        }
    }

    /// Point counts of the rules built for a requested `nip`: the full rule
    /// first, then a one-point reduced rule for quadrilaterals and bricks
    pub fn rule_sizes(&self, nip: usize) -> Vec<usize> {
        match self {
            ElementKind::CPS4 | ElementKind::CPE4 | ElementKind::C3D8 if nip > 1 => vec![nip, 1],
            _ => vec![nip],
        }
    }

    /// Cost of the element itself relative to a one-point linear triangle
    pub fn relative_self_cost(&self) -> f64 {
        match self {
            ElementKind::T3D2 => 0.5,
            ElementKind::CPS3 => 1.0,
            ElementKind::CPS4 | ElementKind::CPE4 | ElementKind::C3D4 => 1.5,
            ElementKind::C3D8 => 3.0,
        }
    }
}
