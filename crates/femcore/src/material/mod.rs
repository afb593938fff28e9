//! Material models and the per-point status records they allocate.
//!
//! A material never stores point state itself. It hands out a
//! [`MaterialStatus`] for every integration point and, for nonlocal models,
//! decides which of that state crosses partition boundaries.

use serde::{Deserialize, Serialize};

use crate::error::{ElementError, Result};
use crate::integration::IntegrationPoint;
use crate::parallel::{PackBuffer, UnpackBuffer};

pub mod damage;
pub mod elastic;
pub mod status;

pub use damage::{DamageParameters, NonlocalScalarDamage, ScalarDamage};
pub use elastic::IsotropicElastic;
pub use status::{HistoryStatus, MaterialStatus, StateHistory, layout_mismatch};

/// Internal state quantities a status can report
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum InternalStateType {
    StressTensor,
    StrainTensor,
    DamageScalar,
    MaxEquivalentStrain,
    LocalEquivalentStrain,
    NonlocalEquivalentStrain,
}

/// Stress/strain state an element's physical model works in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MaterialMode {
    Uniaxial,
    PlaneStress,
    PlaneStrain,
    ThreeDimensional,
}

impl MaterialMode {
    /// Number of independent stress components (Voigt notation)
    pub fn stress_components(&self) -> usize {
        match self {
            MaterialMode::Uniaxial => 1,
            MaterialMode::PlaneStress => 3,
            MaterialMode::PlaneStrain => 4,
            MaterialMode::ThreeDimensional => 6,
        }
    }
}

/// Constitutive model contract used by elements and cross sections
pub trait Material: std::fmt::Debug + Send + Sync {
    fn name(&self) -> &str;

    /// Whether the model is formulated for `mode`
    fn supports_mode(&self, mode: MaterialMode) -> bool;

    /// Allocate the status record for one integration point
    fn create_status(&self, mode: MaterialMode) -> Box<dyn MaterialStatus>;

    /// Nonlocal models average state over neighbouring points and need remote
    /// mirrors kept up to date
    fn is_nonlocal(&self) -> bool {
        false
    }

    /// State quantities exchanged across partition boundaries
    fn exchanged_states(&self) -> &[InternalStateType] {
        &[]
    }

    /// Upper bound of bytes written by [`Material::pack_unknowns`] for `point`
    fn estimate_pack_size(&self, point: &IntegrationPoint) -> usize {
        self.exchanged_states()
            .iter()
            .map(|kind| {
                let len = point.ip_value(*kind).map_or(0, |v| v.len());
                PackBuffer::slice_size(len)
            })
            .sum()
    }

    /// Serialize the exchanged state of `point`
    fn pack_unknowns(&self, buffer: &mut PackBuffer, point: &IntegrationPoint) -> Result<()> {
        for kind in self.exchanged_states() {
            buffer.put_slice(point.ip_value(*kind).unwrap_or(&[]));
        }
        Ok(())
    }

    /// Read back what the counterpart's [`Material::pack_unknowns`] wrote
    /// for one point. Empty slices are dropped. Nothing is applied.
    fn unpack_unknowns(&self, buffer: &mut UnpackBuffer) -> Result<StateHistory> {
        let mut values = Vec::with_capacity(self.exchanged_states().len());
        for kind in self.exchanged_states() {
            let slice = buffer.get_slice()?;
            if !slice.is_empty() {
                values.push((*kind, slice));
            }
        }
        Ok(values)
    }

    /// Check that `point` can take every unpacked value
    fn check_unknowns(&self, point: &IntegrationPoint, values: &[(InternalStateType, Vec<f64>)]) -> Result<()> {
        for (kind, v) in values {
            if point.ip_value(*kind).map(<[f64]>::len) != Some(v.len()) {
                return Err(ElementError::Channel(format!(
                    "point {} cannot take {} value(s) for {:?}",
                    point.number(),
                    v.len(),
                    kind
                )));
            }
        }
        Ok(())
    }

    /// Store unpacked values as the temporary state of `point`
    fn update_unknowns(
        &self,
        point: &mut IntegrationPoint,
        values: &[(InternalStateType, Vec<f64>)],
    ) -> Result<()> {
        self.check_unknowns(point, values)?;
        let number = point.number();
        let Some(status) = point.status_mut() else {
            return Err(ElementError::Channel(format!("point {number} has no status")));
        };
        for (kind, v) in values {
            status.set_temp_value(*kind, v);
        }
        Ok(())
    }

    /// Restore internal consistency of a status whose equilibrium state was
    /// mapped from another mesh. The temporary state equals the mapped state
    /// on entry; whatever is written there is committed afterwards.
    fn finish_mapping(&self, _status: &mut dyn MaterialStatus) -> Result<()> {
        Ok(())
    }

    /// Cost relative to a linear elastic evaluation
    fn predict_relative_computational_cost(&self, _point: &IntegrationPoint) -> f64 {
        1.0
    }
}
