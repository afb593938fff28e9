//! Cross sections.
//!
//! A cross section sits between an element and its material. It supplies the
//! out-of-plane thickness or the area the element's size queries need and
//! forwards status, pack and cost requests to the material.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::integration::IntegrationPoint;
use crate::material::{InternalStateType, Material, MaterialMode, MaterialStatus, StateHistory};
use crate::parallel::{PackBuffer, UnpackBuffer};

/// Geometric description of the section
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SectionKind {
    /// Continuum section for 3-D and plane strain elements
    Solid,
    /// Plane stress section of given thickness
    Plate { thickness: f64 },
    /// Bar section of given area
    Truss { area: f64 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrossSection {
    pub kind: SectionKind,
}

impl CrossSection {
    pub fn solid() -> Self {
        Self {
            kind: SectionKind::Solid,
        }
    }

    pub fn plate(thickness: f64) -> Self {
        Self {
            kind: SectionKind::Plate { thickness },
        }
    }

    pub fn truss(area: f64) -> Self {
        Self {
            kind: SectionKind::Truss { area },
        }
    }

    /// Whether elements working in `mode` can use this section
    pub fn supports_mode(&self, mode: MaterialMode) -> bool {
        match self.kind {
            SectionKind::Solid => {
                matches!(mode, MaterialMode::ThreeDimensional | MaterialMode::PlaneStrain)
            }
            SectionKind::Plate { .. } => mode == MaterialMode::PlaneStress,
            SectionKind::Truss { .. } => mode == MaterialMode::Uniaxial,
        }
    }

    /// Thickness of a plate section
    pub fn thickness(&self) -> Option<f64> {
        match self.kind {
            SectionKind::Plate { thickness } => Some(thickness),
            _ => None,
        }
    }

    /// Area of a truss section
    pub fn area(&self) -> Option<f64> {
        match self.kind {
            SectionKind::Truss { area } => Some(area),
            _ => None,
        }
    }

    pub fn create_status(&self, material: &dyn Material, mode: MaterialMode) -> Box<dyn MaterialStatus> {
        material.create_status(mode)
    }

    pub fn estimate_pack_size(&self, material: &dyn Material, point: &IntegrationPoint) -> usize {
        material.estimate_pack_size(point)
    }

    pub fn pack_unknowns(
        &self,
        material: &dyn Material,
        buffer: &mut PackBuffer,
        point: &IntegrationPoint,
    ) -> Result<()> {
        material.pack_unknowns(buffer, point)
    }

    pub fn unpack_unknowns(&self, material: &dyn Material, buffer: &mut UnpackBuffer) -> Result<StateHistory> {
        material.unpack_unknowns(buffer)
    }

    pub fn check_unknowns(
        &self,
        material: &dyn Material,
        point: &IntegrationPoint,
        values: &[(InternalStateType, Vec<f64>)],
    ) -> Result<()> {
        material.check_unknowns(point, values)
    }

    pub fn update_unknowns(
        &self,
        material: &dyn Material,
        point: &mut IntegrationPoint,
        values: &[(InternalStateType, Vec<f64>)],
    ) -> Result<()> {
        material.update_unknowns(point, values)
    }

    pub fn finish_mapping(&self, material: &dyn Material, status: &mut dyn MaterialStatus) -> Result<()> {
        material.finish_mapping(status)
    }

    pub fn predict_relative_computational_cost(
        &self,
        material: &dyn Material,
        point: &IntegrationPoint,
    ) -> f64 {
        material.predict_relative_computational_cost(point)
    }
}
