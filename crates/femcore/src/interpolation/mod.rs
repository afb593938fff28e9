//! Geometry interpolation for the supported element shapes.
//!
//! Each shape maps its reference domain onto the physical element through
//! nodal shape functions. Elements only see the [`Interpolation`] trait, so
//! the mapping math stays out of the element contract.

use nalgebra::{Matrix3, Vector3};
use serde::{Deserialize, Serialize};
use smallvec::{SmallVec, smallvec};

use crate::integration::{IntegrationDomain, LocalCoords};

pub mod brick;
pub mod line;
pub mod quad;
pub mod tetra;
pub mod triangle;

pub use brick::TrilinearBrick;
pub use line::LinearLine;
pub use quad::BilinearQuad;
pub use tetra::LinearTetra;
pub use triangle::LinearTriangle;

/// Shape function values, one per node
pub type ShapeValues = SmallVec<[f64; 8]>;
/// Shape function derivatives `dN_i/dξ_j`; unused reference directions are zero
pub type ShapeDerivatives = SmallVec<[[f64; 3]; 8]>;

/// Reference tolerance for the inside test
pub const INSIDE_TOLERANCE: f64 = 1.0e-8;

const MAX_NEWTON_ITERATIONS: usize = 20;
const NEWTON_TOLERANCE: f64 = 1.0e-12;

/// Geometric shape of an element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GeometryType {
    Line2,
    Triangle3,
    Quad4,
    Tetra4,
    Hexa8,
}

/// Mapping between an element's reference domain and physical space
pub trait Interpolation: std::fmt::Debug + Sync {
    fn geometry_type(&self) -> GeometryType;

    fn integration_domain(&self) -> IntegrationDomain;

    /// Dimension of the reference domain
    fn spatial_dimension(&self) -> usize;

    fn number_of_nodes(&self) -> usize;

    fn number_of_boundary_sides(&self) -> usize;

    /// Measure of the reference element
    fn parent_element_size(&self) -> f64;

    /// Centroid of the reference element
    fn reference_center(&self) -> LocalCoords;

    fn shape_functions(&self, local: &[f64]) -> ShapeValues;

    fn shape_derivatives(&self, local: &[f64]) -> ShapeDerivatives;

    /// How far `local` lies outside the reference element, zero inside
    fn reference_excess(&self, local: &[f64]) -> f64;

    /// Physical coordinates of a reference point
    fn global_coordinates(&self, local: &[f64], nodes: &[Vector3<f64>]) -> Vector3<f64> {
        self.shape_functions(local)
            .iter()
            .zip(nodes)
            .fold(Vector3::zeros(), |acc, (n, x)| acc + x * *n)
    }

    /// Physical tangent vectors `dx/dξ_j`, one per reference direction
    fn tangents(&self, local: &[f64], nodes: &[Vector3<f64>]) -> SmallVec<[Vector3<f64>; 3]> {
        let dn = self.shape_derivatives(local);
        (0..self.spatial_dimension())
            .map(|j| {
                dn.iter()
                    .zip(nodes)
                    .fold(Vector3::zeros(), |acc, (d, x)| acc + x * d[j])
            })
            .collect()
    }

    /// Ratio between physical and reference measure at `local`.
    ///
    /// For 3-D shapes the value is signed; inverted elements give a negative
    /// determinant.
    fn jacobian_determinant(&self, local: &[f64], nodes: &[Vector3<f64>]) -> f64 {
        let t = self.tangents(local, nodes);
        match t.len() {
            1 => t[0].norm(),
            2 => t[0].cross(&t[1]).norm(),
            3 => Matrix3::from_columns(&[t[0], t[1], t[2]]).determinant(),
            _ => 0.0,
        }
    }

    fn contains(&self, local: &[f64]) -> bool {
        self.reference_excess(local) <= INSIDE_TOLERANCE
    }

    /// Reference coordinates of a physical point and whether it lies inside
    /// the element.
    ///
    /// Points outside still get a best-effort (least-squares) answer. Returns
    /// `None` when the mapping is singular.
    fn local_coordinates(
        &self,
        global: &Vector3<f64>,
        nodes: &[Vector3<f64>],
    ) -> Option<(LocalCoords, bool)> {
        let dim = self.spatial_dimension();
        let mut local = self.reference_center();

        for _ in 0..MAX_NEWTON_ITERATIONS {
            let residual = global - self.global_coordinates(&local, nodes);
            let t = self.tangents(&local, nodes);

            // normal equations, padded to 3x3 for 1-D and 2-D shapes
            let mut a = Matrix3::identity();
            let mut b = Vector3::zeros();
            for i in 0..dim {
                b[i] = t[i].dot(&residual);
                for j in 0..dim {
                    a[(i, j)] = t[i].dot(&t[j]);
                }
            }
            let scale = a.diagonal().iter().take(dim).fold(0.0_f64, |m, v| m.max(*v));
            if scale <= 0.0 || a.determinant().abs() <= 1.0e-14 * scale.powi(dim as i32) {
                return None;
            }
            let delta = a.lu().solve(&b)?;
            for i in 0..dim {
                local[i] += delta[i];
            }
            if delta.norm() < NEWTON_TOLERANCE {
                break;
            }
        }

        let inside = self.contains(&local);
        Some((local, inside))
    }
}

/// Interpolation for a geometry type
pub fn interpolation_for(geometry: GeometryType) -> &'static dyn Interpolation {
    match geometry {
        GeometryType::Line2 => &LinearLine,
        GeometryType::Triangle3 => &LinearTriangle,
        GeometryType::Quad4 => &BilinearQuad,
        GeometryType::Tetra4 => &LinearTetra,
        GeometryType::Hexa8 => &TrilinearBrick,
    }
}

/// Zero-padded 3-component copy of local coordinates
pub(crate) fn padded(local: &[f64]) -> [f64; 3] {
    let mut out = [0.0; 3];
    for (o, v) in out.iter_mut().zip(local) {
        *o = *v;
    }
    out
}

pub(crate) fn center(values: &[f64]) -> LocalCoords {
    let mut c: LocalCoords = smallvec![];
    c.extend_from_slice(values);
    c
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn skewed_quad() -> Vec<Vector3<f64>> {
        vec![
            Vector3::new(0.0, 0.0, 0.0),
            Vector3::new(2.0, 0.2, 0.0),
            Vector3::new(2.3, 1.9, 0.0),
            Vector3::new(-0.1, 1.5, 0.0),
        ]
    }

    #[test]
    fn local_global_round_trip_inside() {
        let nodes = skewed_quad();
        let interp = interpolation_for(GeometryType::Quad4);
        let target = Vector3::new(1.1, 0.9, 0.0);
        let (local, inside) = interp.local_coordinates(&target, &nodes).unwrap();
        assert!(inside);
        let back = interp.global_coordinates(&local, &nodes);
        assert_relative_eq!(back, target, epsilon = 1e-9);
    }

    #[test]
    fn outside_point_reports_best_effort() {
        let nodes = skewed_quad();
        let interp = interpolation_for(GeometryType::Quad4);
        let target = Vector3::new(5.0, 0.5, 0.0);
        let (local, inside) = interp.local_coordinates(&target, &nodes).unwrap();
        assert!(!inside);
        assert!(local[0] > 1.0);
    }

    #[test]
    fn degenerate_element_is_singular() {
        let nodes = vec![
            Vector3::new(0.0, 0.0, 0.0),
            Vector3::new(1.0, 0.0, 0.0),
            Vector3::new(2.0, 0.0, 0.0),
        ];
        let interp = interpolation_for(GeometryType::Triangle3);
        assert!(interp
            .local_coordinates(&Vector3::new(0.5, 0.0, 0.0), &nodes)
            .is_none());
    }

    #[test]
    fn partition_of_unity_for_every_shape() {
        for geometry in [
            GeometryType::Line2,
            GeometryType::Triangle3,
            GeometryType::Quad4,
            GeometryType::Tetra4,
            GeometryType::Hexa8,
        ] {
            let interp = interpolation_for(geometry);
            let c = interp.reference_center();
            let sum: f64 = interp.shape_functions(&c).iter().sum();
            assert_relative_eq!(sum, 1.0, epsilon = 1e-14);
            assert_eq!(interp.shape_functions(&c).len(), interp.number_of_nodes());
            let dsum: f64 = interp.shape_derivatives(&c).iter().map(|d| d[0]).sum();
            assert_relative_eq!(dsum, 0.0, epsilon = 1e-14);
        }
    }
}
