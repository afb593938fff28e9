use smallvec::SmallVec;

use super::{GeometryType, Interpolation, ShapeDerivatives, ShapeValues, center, padded};
use crate::integration::{IntegrationDomain, LocalCoords};

// Node ordering:
//
//        8----------7
//       /|         /|
//      5----------6 |
//      | 4--------|-3
//      |/         |/
//      1----------2
const XI: [f64; 8] = [-1.0, 1.0, 1.0, -1.0, -1.0, 1.0, 1.0, -1.0];
const ETA: [f64; 8] = [-1.0, -1.0, 1.0, 1.0, -1.0, -1.0, 1.0, 1.0];
const ZETA: [f64; 8] = [-1.0, -1.0, -1.0, -1.0, 1.0, 1.0, 1.0, 1.0];

/// 8-node hexahedron, (ξ, η, ζ) ∈ [-1, 1]³
#[derive(Debug, Clone, Copy, Default)]
pub struct TrilinearBrick;

impl Interpolation for TrilinearBrick {
    fn geometry_type(&self) -> GeometryType {
        GeometryType::Hexa8
    }

    fn integration_domain(&self) -> IntegrationDomain {
        IntegrationDomain::Cube
    }

    fn spatial_dimension(&self) -> usize {
        3
    }

    fn number_of_nodes(&self) -> usize {
        8
    }

    fn number_of_boundary_sides(&self) -> usize {
        6
    }

    fn parent_element_size(&self) -> f64 {
        8.0
    }

    fn reference_center(&self) -> LocalCoords {
        center(&[0.0, 0.0, 0.0])
    }

    fn shape_functions(&self, local: &[f64]) -> ShapeValues {
        let [xi, eta, zeta] = padded(local);
        (0..8)
            .map(|i| 0.125 * (1.0 + xi * XI[i]) * (1.0 + eta * ETA[i]) * (1.0 + zeta * ZETA[i]))
            .collect::<SmallVec<_>>()
    }

    fn shape_derivatives(&self, local: &[f64]) -> ShapeDerivatives {
        let [xi, eta, zeta] = padded(local);
        (0..8)
            .map(|i| {
                [
                    0.125 * XI[i] * (1.0 + eta * ETA[i]) * (1.0 + zeta * ZETA[i]),
                    0.125 * ETA[i] * (1.0 + xi * XI[i]) * (1.0 + zeta * ZETA[i]),
                    0.125 * ZETA[i] * (1.0 + xi * XI[i]) * (1.0 + eta * ETA[i]),
                ]
            })
            .collect()
    }

    fn reference_excess(&self, local: &[f64]) -> f64 {
        let [xi, eta, zeta] = padded(local);
        (xi.abs() - 1.0)
            .max(eta.abs() - 1.0)
            .max(zeta.abs() - 1.0)
            .max(0.0)
    }
}
