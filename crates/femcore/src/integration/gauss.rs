//! Quadrature tables.
//!
//! Reference domains:
//! - line: ξ ∈ [-1, 1]
//! - triangle: (ξ, η) with ξ, η ≥ 0, ξ + η ≤ 1
//! - square: (ξ, η) ∈ [-1, 1]²
//! - tetrahedron: (ξ, η, ζ) ≥ 0, ξ + η + ζ ≤ 1
//! - cube: (ξ, η, ζ) ∈ [-1, 1]³
//!
//! Weights sum to the measure of the reference domain.

use super::{IntegrationDomain, LocalCoords};
use smallvec::smallvec;

/// A quadrature sample: local coordinates and weight
pub type QuadraturePoint = (LocalCoords, f64);

/// Gauss–Legendre abscissae and weights on [-1, 1]
fn gauss_legendre(n: usize) -> Option<Vec<(f64, f64)>> {
    let table = match n {
        1 => vec![(0.0, 2.0)],
        2 => {
            let a = 1.0 / f64::sqrt(3.0);
            vec![(-a, 1.0), (a, 1.0)]
        }
        3 => {
            let a = f64::sqrt(3.0 / 5.0);
            vec![(-a, 5.0 / 9.0), (0.0, 8.0 / 9.0), (a, 5.0 / 9.0)]
        }
        4 => vec![
            (-0.861_136_311_594_052_6, 0.347_854_845_137_453_8),
            (-0.339_981_043_584_856_3, 0.652_145_154_862_546_1),
            (0.339_981_043_584_856_3, 0.652_145_154_862_546_1),
            (0.861_136_311_594_052_6, 0.347_854_845_137_453_8),
        ],
        _ => return None,
    };
    Some(table)
}

/// Integer root `r` with `r^dim == nip`
fn points_per_direction(nip: usize, dim: u32) -> Option<usize> {
    (1..=4).find(|r: &usize| r.pow(dim) == nip)
}

fn line(nip: usize) -> Option<Vec<QuadraturePoint>> {
    let gl = gauss_legendre(nip)?;
    Some(gl.into_iter().map(|(x, w)| (smallvec![x], w)).collect())
}

fn square(nip: usize) -> Option<Vec<QuadraturePoint>> {
    let gl = gauss_legendre(points_per_direction(nip, 2)?)?;
    let mut points = Vec::with_capacity(nip);
    for &(xi, wi) in &gl {
        for &(eta, wj) in &gl {
            points.push((smallvec![xi, eta], wi * wj));
        }
    }
    Some(points)
}

fn cube(nip: usize) -> Option<Vec<QuadraturePoint>> {
    let gl = gauss_legendre(points_per_direction(nip, 3)?)?;
    let mut points = Vec::with_capacity(nip);
    for &(xi, wi) in &gl {
        for &(eta, wj) in &gl {
            for &(zeta, wk) in &gl {
                points.push((smallvec![xi, eta, zeta], wi * wj * wk));
            }
        }
    }
    Some(points)
}

fn triangle(nip: usize) -> Option<Vec<QuadraturePoint>> {
    let points = match nip {
        1 => vec![(smallvec![1.0 / 3.0, 1.0 / 3.0], 0.5)],
        3 => {
            let w = 1.0 / 6.0;
            vec![
                (smallvec![1.0 / 6.0, 1.0 / 6.0], w),
                (smallvec![2.0 / 3.0, 1.0 / 6.0], w),
                (smallvec![1.0 / 6.0, 2.0 / 3.0], w),
            ]
        }
        7 => {
            // degree 5
            let a1 = 0.059_715_871_789_769_8;
            let b1 = 0.470_142_064_105_115_1;
            let w1 = 0.132_394_152_788_506_2 / 2.0;
            let a2 = 0.797_426_985_353_087_3;
            let b2 = 0.101_286_507_323_456_3;
            let w2 = 0.125_939_180_544_827_1 / 2.0;
            vec![
                (smallvec![1.0 / 3.0, 1.0 / 3.0], 0.225 / 2.0),
                (smallvec![a1, b1], w1),
                (smallvec![b1, a1], w1),
                (smallvec![b1, b1], w1),
                (smallvec![a2, b2], w2),
                (smallvec![b2, a2], w2),
                (smallvec![b2, b2], w2),
            ]
        }
        _ => return None,
    };
    Some(points)
}

fn tetrahedron(nip: usize) -> Option<Vec<QuadraturePoint>> {
    let points = match nip {
        1 => vec![(smallvec![0.25, 0.25, 0.25], 1.0 / 6.0)],
        4 => {
            let a = 0.585_410_196_624_968_5; // (5 + √5) / 20
            let b = 0.138_196_601_125_010_5; // (5 - √5) / 20
            let w = 1.0 / 24.0;
            vec![
                (smallvec![b, b, b], w),
                (smallvec![a, b, b], w),
                (smallvec![b, a, b], w),
                (smallvec![b, b, a], w),
            ]
        }
        5 => {
            let b = 1.0 / 6.0;
            let c = 0.5;
            let w = 3.0 / 40.0;
            vec![
                (smallvec![0.25, 0.25, 0.25], -2.0 / 15.0),
                (smallvec![b, b, c], w),
                (smallvec![b, c, b], w),
                (smallvec![c, b, b], w),
                (smallvec![b, b, b], w),
            ]
        }
        _ => return None,
    };
    Some(points)
}

/// Quadrature points for `nip` samples on `domain`, or `None` when no such
/// rule is tabulated.
pub fn quadrature_points(domain: IntegrationDomain, nip: usize) -> Option<Vec<QuadraturePoint>> {
    match domain {
        IntegrationDomain::Line => line(nip),
        IntegrationDomain::Triangle => triangle(nip),
        IntegrationDomain::Square => square(nip),
        IntegrationDomain::Tetrahedron => tetrahedron(nip),
        IntegrationDomain::Cube => cube(nip),
    }
}
