use smallvec::smallvec;

use super::{GeometryType, Interpolation, ShapeDerivatives, ShapeValues, center, padded};
use crate::integration::{IntegrationDomain, LocalCoords};

/// 3-node triangle on the unit reference triangle (0,0), (1,0), (0,1)
#[derive(Debug, Clone, Copy, Default)]
pub struct LinearTriangle;

impl Interpolation for LinearTriangle {
    fn geometry_type(&self) -> GeometryType {
        GeometryType::Triangle3
    }

    fn integration_domain(&self) -> IntegrationDomain {
        IntegrationDomain::Triangle
    }

    fn spatial_dimension(&self) -> usize {
        2
    }

    fn number_of_nodes(&self) -> usize {
        3
    }

    fn number_of_boundary_sides(&self) -> usize {
        3
    }

    fn parent_element_size(&self) -> f64 {
        0.5
    }

    fn reference_center(&self) -> LocalCoords {
        center(&[1.0 / 3.0, 1.0 / 3.0])
    }

    fn shape_functions(&self, local: &[f64]) -> ShapeValues {
        let [xi, eta, _] = padded(local);
        smallvec![1.0 - xi - eta, xi, eta]
    }

    fn shape_derivatives(&self, _local: &[f64]) -> ShapeDerivatives {
        smallvec![[-1.0, -1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]]
    }

    fn reference_excess(&self, local: &[f64]) -> f64 {
        let [xi, eta, _] = padded(local);
        [-xi, -eta, xi + eta - 1.0, 0.0]
            .into_iter()
            .fold(f64::MIN, f64::max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::Vector3;

    #[test]
    fn unit_right_triangle_has_unit_jacobian() {
        let nodes = [
            Vector3::new(0.0, 0.0, 0.0),
            Vector3::new(1.0, 0.0, 0.0),
            Vector3::new(0.0, 1.0, 0.0),
        ];
        assert_relative_eq!(LinearTriangle.jacobian_determinant(&[0.2, 0.2], &nodes), 1.0);
    }

    #[test]
    fn excess_measures_distance_outside() {
        assert_eq!(LinearTriangle.reference_excess(&[0.2, 0.2]), 0.0);
        assert_relative_eq!(LinearTriangle.reference_excess(&[0.8, 0.4]), 0.2, epsilon = 1e-12);
        assert_relative_eq!(LinearTriangle.reference_excess(&[-0.5, 0.1]), 0.5);
    }
}
