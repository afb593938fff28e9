//! Linear elastic isotropic material.

use serde::{Deserialize, Serialize};

use super::{HistoryStatus, InternalStateType, Material, MaterialMode, MaterialStatus};

/// Linear elastic isotropic material
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IsotropicElastic {
    /// Material name
    pub name: String,
    /// Young's modulus (E) [Pa]
    pub elastic_modulus: f64,
    /// Poisson's ratio (ν) [-]
    pub poissons_ratio: f64,
    /// Density (ρ) [kg/m³]
    #[serde(default)]
    pub density: Option<f64>,
}

impl IsotropicElastic {
    pub fn new(name: impl Into<String>, elastic_modulus: f64, poissons_ratio: f64) -> Self {
        Self {
            name: name.into(),
            elastic_modulus,
            poissons_ratio,
            density: None,
        }
    }

    /// Get the shear modulus (G) from E and ν
    pub fn shear_modulus(&self) -> f64 {
        self.elastic_modulus / (2.0 * (1.0 + self.poissons_ratio))
    }

    /// Get the bulk modulus (K) from E and ν
    pub fn bulk_modulus(&self) -> f64 {
        self.elastic_modulus / (3.0 * (1.0 - 2.0 * self.poissons_ratio))
    }

    /// Stress for a strain vector in Voigt notation (engineering shear strains)
    pub fn stress(&self, mode: MaterialMode, strain: &[f64]) -> Vec<f64> {
        let e = self.elastic_modulus;
        let nu = self.poissons_ratio;
        let g = self.shear_modulus();
        match mode {
            MaterialMode::Uniaxial => vec![e * strain.first().copied().unwrap_or(0.0)],
            MaterialMode::PlaneStress => {
                let c = e / (1.0 - nu * nu);
                let [exx, eyy, gxy] = voigt::<3>(strain);
                vec![c * (exx + nu * eyy), c * (nu * exx + eyy), g * gxy]
            }
            MaterialMode::PlaneStrain => {
                // components: xx, yy, zz, xy
                let lambda = e * nu / ((1.0 + nu) * (1.0 - 2.0 * nu));
                let [exx, eyy, ezz, gxy] = voigt::<4>(strain);
                let tr = exx + eyy + ezz;
                vec![
                    lambda * tr + 2.0 * g * exx,
                    lambda * tr + 2.0 * g * eyy,
                    lambda * tr + 2.0 * g * ezz,
                    g * gxy,
                ]
            }
            MaterialMode::ThreeDimensional => {
                let lambda = e * nu / ((1.0 + nu) * (1.0 - 2.0 * nu));
                let eps = voigt::<6>(strain);
                let tr = eps[0] + eps[1] + eps[2];
                let mut sigma = vec![0.0; 6];
                for i in 0..3 {
                    sigma[i] = lambda * tr + 2.0 * g * eps[i];
                    sigma[i + 3] = g * eps[i + 3];
                }
                sigma
            }
        }
    }
}

fn voigt<const N: usize>(values: &[f64]) -> [f64; N] {
    let mut out = [0.0; N];
    for (o, v) in out.iter_mut().zip(values) {
        *o = *v;
    }
    out
}

impl Material for IsotropicElastic {
    fn name(&self) -> &str {
        &self.name
    }

    fn supports_mode(&self, _mode: MaterialMode) -> bool {
        true
    }

    fn create_status(&self, mode: MaterialMode) -> Box<dyn MaterialStatus> {
        let n = mode.stress_components();
        Box::new(HistoryStatus::new(&[
            (InternalStateType::StrainTensor, n),
            (InternalStateType::StressTensor, n),
        ]))
    }
}
