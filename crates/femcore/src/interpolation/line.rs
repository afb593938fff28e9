use smallvec::smallvec;

use super::{GeometryType, Interpolation, ShapeDerivatives, ShapeValues, center};
use crate::integration::{IntegrationDomain, LocalCoords};

/// 2-node line, ξ ∈ [-1, 1]
#[derive(Debug, Clone, Copy, Default)]
pub struct LinearLine;

impl Interpolation for LinearLine {
    fn geometry_type(&self) -> GeometryType {
        GeometryType::Line2
    }

    fn integration_domain(&self) -> IntegrationDomain {
        IntegrationDomain::Line
    }

    fn spatial_dimension(&self) -> usize {
        1
    }

    fn number_of_nodes(&self) -> usize {
        2
    }

    fn number_of_boundary_sides(&self) -> usize {
        2
    }

    fn parent_element_size(&self) -> f64 {
        2.0
    }

    fn reference_center(&self) -> LocalCoords {
        center(&[0.0])
    }

    fn shape_functions(&self, local: &[f64]) -> ShapeValues {
        let xi = local.first().copied().unwrap_or(0.0);
        smallvec![0.5 * (1.0 - xi), 0.5 * (1.0 + xi)]
    }

    fn shape_derivatives(&self, _local: &[f64]) -> ShapeDerivatives {
        smallvec![[-0.5, 0.0, 0.0], [0.5, 0.0, 0.0]]
    }

    fn reference_excess(&self, local: &[f64]) -> f64 {
        let xi = local.first().copied().unwrap_or(0.0);
        (xi.abs() - 1.0).max(0.0)
    }
}
