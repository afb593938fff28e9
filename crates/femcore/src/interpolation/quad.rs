use smallvec::SmallVec;

use super::{GeometryType, Interpolation, ShapeDerivatives, ShapeValues, center, padded};
use crate::integration::{IntegrationDomain, LocalCoords};

/// Reference corners, counter-clockwise
const CORNERS: [(f64, f64); 4] = [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)];

/// 4-node quadrilateral, (ξ, η) ∈ [-1, 1]²
#[derive(Debug, Clone, Copy, Default)]
pub struct BilinearQuad;

impl Interpolation for BilinearQuad {
    fn geometry_type(&self) -> GeometryType {
        GeometryType::Quad4
    }

    fn integration_domain(&self) -> IntegrationDomain {
        IntegrationDomain::Square
    }

    fn spatial_dimension(&self) -> usize {
        2
    }

    fn number_of_nodes(&self) -> usize {
        4
    }

    fn number_of_boundary_sides(&self) -> usize {
        4
    }

    fn parent_element_size(&self) -> f64 {
        4.0
    }

    fn reference_center(&self) -> LocalCoords {
        center(&[0.0, 0.0])
    }

    fn shape_functions(&self, local: &[f64]) -> ShapeValues {
        let [xi, eta, _] = padded(local);
        CORNERS
            .iter()
            .map(|(xn, en)| 0.25 * (1.0 + xi * xn) * (1.0 + eta * en))
            .collect::<SmallVec<_>>()
    }

    fn shape_derivatives(&self, local: &[f64]) -> ShapeDerivatives {
        let [xi, eta, _] = padded(local);
        CORNERS
            .iter()
            .map(|(xn, en)| {
                [
                    0.25 * xn * (1.0 + eta * en),
                    0.25 * en * (1.0 + xi * xn),
                    0.0,
                ]
            })
            .collect()
    }

    fn reference_excess(&self, local: &[f64]) -> f64 {
        let [xi, eta, _] = padded(local);
        (xi.abs() - 1.0).max(eta.abs() - 1.0).max(0.0)
    }
}
