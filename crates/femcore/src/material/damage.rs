//! Isotropic scalar damage with exponential softening.
//!
//! ω(κ) = 1 - (ε₀/κ)·exp(-(κ - ε₀)/(ε_f - ε₀)) for κ > ε₀, zero otherwise,
//! where κ is the largest equivalent strain reached so far.

use serde::{Deserialize, Serialize};

use super::{
    HistoryStatus, InternalStateType, IsotropicElastic, Material, MaterialMode, MaterialStatus,
};
use crate::error::Result;
use crate::integration::IntegrationPoint;

/// Softening law parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DamageParameters {
    /// Equivalent strain at damage onset (ε₀)
    pub onset_strain: f64,
    /// Strain controlling the softening slope (ε_f)
    pub failure_strain: f64,
}

impl DamageParameters {
    /// Damage for a history variable κ
    pub fn damage(&self, kappa: f64) -> f64 {
        let e0 = self.onset_strain;
        if kappa <= e0 {
            return 0.0;
        }
        let ef = self.failure_strain.max(e0 * (1.0 + f64::EPSILON));
        (1.0 - (e0 / kappa) * (-(kappa - e0) / (ef - e0)).exp()).clamp(0.0, 1.0)
    }

    /// Advance κ and ω in the temporary state of `status` for a new
    /// equivalent strain. Returns the temporary damage.
    fn advance(&self, status: &mut dyn MaterialStatus, equivalent_strain: f64) -> f64 {
        let kappa_eq = status
            .equilibrium_value(InternalStateType::MaxEquivalentStrain)
            .and_then(|v| v.first().copied())
            .unwrap_or(0.0);
        let kappa = kappa_eq.max(equivalent_strain);
        let omega = self.damage(kappa);
        status.set_temp_value(InternalStateType::MaxEquivalentStrain, &[kappa]);
        status.set_temp_value(InternalStateType::DamageScalar, &[omega]);
        omega
    }

    /// Recompute ω from the temporary κ of `status`
    fn rederive(&self, status: &mut dyn MaterialStatus) {
        let kappa = status
            .ip_value(InternalStateType::MaxEquivalentStrain)
            .and_then(|v| v.first().copied())
            .unwrap_or(0.0);
        status.set_temp_value(InternalStateType::DamageScalar, &[self.damage(kappa)]);
    }
}

fn damage_status(mode: MaterialMode, nonlocal: bool) -> HistoryStatus {
    let n = mode.stress_components();
    let mut layout = vec![
        (InternalStateType::StrainTensor, n),
        (InternalStateType::StressTensor, n),
        (InternalStateType::MaxEquivalentStrain, 1),
        (InternalStateType::DamageScalar, 1),
        (InternalStateType::LocalEquivalentStrain, 1),
    ];
    if nonlocal {
        layout.push((InternalStateType::NonlocalEquivalentStrain, 1));
    }
    HistoryStatus::new(&layout)
}

/// Local scalar damage model on top of an elastic law
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalarDamage {
    pub elastic: IsotropicElastic,
    pub parameters: DamageParameters,
}

impl ScalarDamage {
    pub fn new(elastic: IsotropicElastic, parameters: DamageParameters) -> Self {
        Self {
            elastic,
            parameters,
        }
    }

    /// Update the point's temporary state for a local equivalent strain
    pub fn update_state(&self, status: &mut dyn MaterialStatus, equivalent_strain: f64) -> f64 {
        status.set_temp_value(InternalStateType::LocalEquivalentStrain, &[equivalent_strain]);
        self.parameters.advance(status, equivalent_strain)
    }
}

impl Material for ScalarDamage {
    fn name(&self) -> &str {
        &self.elastic.name
    }

    fn supports_mode(&self, mode: MaterialMode) -> bool {
        mode != MaterialMode::Uniaxial
    }

    fn create_status(&self, mode: MaterialMode) -> Box<dyn MaterialStatus> {
        Box::new(damage_status(mode, false))
    }

    /// κ and ω are mapped independently, so ω is re-derived from κ
    fn finish_mapping(&self, status: &mut dyn MaterialStatus) -> Result<()> {
        self.parameters.rederive(status);
        Ok(())
    }

    fn predict_relative_computational_cost(&self, _point: &IntegrationPoint) -> f64 {
        1.2
    }
}

/// Scalar damage driven by a spatially averaged equivalent strain.
///
/// Averaging needs the local equivalent strain of neighbouring points, so
/// that value is exchanged with remote mirrors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NonlocalScalarDamage {
    pub elastic: IsotropicElastic,
    pub parameters: DamageParameters,
    /// Interaction radius of the averaging kernel
    pub interaction_radius: f64,
}

impl NonlocalScalarDamage {
    pub fn new(elastic: IsotropicElastic, parameters: DamageParameters, interaction_radius: f64) -> Self {
        Self {
            elastic,
            parameters,
            interaction_radius,
        }
    }

    /// Store the local equivalent strain (first pass of a nonlocal step)
    pub fn set_local_equivalent_strain(&self, status: &mut dyn MaterialStatus, value: f64) {
        status.set_temp_value(InternalStateType::LocalEquivalentStrain, &[value]);
    }

    /// Update damage from the averaged equivalent strain (second pass)
    pub fn update_state(&self, status: &mut dyn MaterialStatus, nonlocal_strain: f64) -> f64 {
        status.set_temp_value(InternalStateType::NonlocalEquivalentStrain, &[nonlocal_strain]);
        self.parameters.advance(status, nonlocal_strain)
    }

    /// Bell-shaped averaging weight for two points `distance` apart
    pub fn weight(&self, distance: f64) -> f64 {
        let r = self.interaction_radius;
        if distance >= r || r <= 0.0 {
            return 0.0;
        }
        let s = 1.0 - (distance / r).powi(2);
        s * s
    }
}

const EXCHANGED: [InternalStateType; 1] = [InternalStateType::LocalEquivalentStrain];

impl Material for NonlocalScalarDamage {
    fn name(&self) -> &str {
        &self.elastic.name
    }

    fn supports_mode(&self, mode: MaterialMode) -> bool {
        mode != MaterialMode::Uniaxial
    }

    fn create_status(&self, mode: MaterialMode) -> Box<dyn MaterialStatus> {
        Box::new(damage_status(mode, true))
    }

    fn is_nonlocal(&self) -> bool {
        true
    }

    fn exchanged_states(&self) -> &[InternalStateType] {
        &EXCHANGED
    }

    fn finish_mapping(&self, status: &mut dyn MaterialStatus) -> Result<()> {
        self.parameters.rederive(status);
        Ok(())
    }

    fn predict_relative_computational_cost(&self, _point: &IntegrationPoint) -> f64 {
        2.0
    }
}
