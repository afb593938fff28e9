use smallvec::smallvec;

use super::{GeometryType, Interpolation, ShapeDerivatives, ShapeValues, center, padded};
use crate::integration::{IntegrationDomain, LocalCoords};

/// 4-node tetrahedron on the unit reference tetrahedron
#[derive(Debug, Clone, Copy, Default)]
pub struct LinearTetra;

impl Interpolation for LinearTetra {
    fn geometry_type(&self) -> GeometryType {
        GeometryType::Tetra4
    }

    fn integration_domain(&self) -> IntegrationDomain {
        IntegrationDomain::Tetrahedron
    }

    fn spatial_dimension(&self) -> usize {
        3
    }

    fn number_of_nodes(&self) -> usize {
        4
    }

    fn number_of_boundary_sides(&self) -> usize {
        4
    }

    fn parent_element_size(&self) -> f64 {
        1.0 / 6.0
    }

    fn reference_center(&self) -> LocalCoords {
        center(&[0.25, 0.25, 0.25])
    }

    fn shape_functions(&self, local: &[f64]) -> ShapeValues {
        let [xi, eta, zeta] = padded(local);
        smallvec![1.0 - xi - eta - zeta, xi, eta, zeta]
    }

    fn shape_derivatives(&self, _local: &[f64]) -> ShapeDerivatives {
        smallvec![
            [-1.0, -1.0, -1.0],
            [1.0, 0.0, 0.0],
            [0.0, 1.0, 0.0],
            [0.0, 0.0, 1.0]
        ]
    }

    fn reference_excess(&self, local: &[f64]) -> f64 {
        let [xi, eta, zeta] = padded(local);
        [-xi, -eta, -zeta, xi + eta + zeta - 1.0, 0.0]
            .into_iter()
            .fold(f64::MIN, f64::max)
    }
}
