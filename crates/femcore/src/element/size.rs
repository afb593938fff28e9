//! Size and orientation queries.
//!
//! Queries that do not apply to the element's dimension return `0.0` (or
//! `None`) instead of failing. Measures integrate `|det J|` over the default
//! rule; elements without rules use a temporary Gauss rule.

use nalgebra::Vector3;

use super::ElementGeometry;
use crate::cross_section::SectionKind;
use crate::domain::DomainView;
use crate::error::Result;
use crate::integration::IntegrationRule;
use crate::integration::gauss::{QuadraturePoint, quadrature_points};

impl ElementGeometry {
    fn measure_samples(&self) -> Vec<QuadraturePoint> {
        if let Some(rule) = self.default_integration_rule_ref() {
            return sample_points(rule);
        }
        quadrature_points(self.kind.integration_domain(), self.kind.default_nip()).unwrap_or_default()
    }

    /// Length, area or volume in the element's own dimension
    pub fn compute_volume_area_or_length(&self, domain: &DomainView<'_>) -> Result<f64> {
        let nodes = self.node_coordinates(domain)?;
        let interp = self.interpolation();
        Ok(self
            .measure_samples()
            .iter()
            .map(|(local, w)| w * interp.jacobian_determinant(local, &nodes).abs())
            .sum())
    }

    /// Volume; 2-D elements use the cross section thickness (unit depth for
    /// solid sections), trusses the section area
    pub fn compute_volume(&self, domain: &DomainView<'_>) -> Result<f64> {
        let factor = match self.spatial_dimension() {
            3 => Some(1.0),
            2 => self
                .cross_section_ref(domain)
                .ok()
                .and_then(|cs| match cs.kind {
                    SectionKind::Plate { thickness } => Some(thickness),
                    SectionKind::Solid => Some(1.0),
                    SectionKind::Truss { .. } => None,
                }),
            _ => self.cross_section_ref(domain).ok().and_then(|cs| cs.area()),
        };
        match factor {
            Some(f) => Ok(f * self.compute_volume_area_or_length(domain)?),
            None => Ok(0.0),
        }
    }

    /// Area; zero for all but 2-D elements
    pub fn compute_area(&self, domain: &DomainView<'_>) -> Result<f64> {
        if self.spatial_dimension() != 2 {
            return Ok(0.0);
        }
        self.compute_volume_area_or_length(domain)
    }

    /// Length; zero for all but 1-D elements
    pub fn compute_length(&self, domain: &DomainView<'_>) -> Result<f64> {
        if self.spatial_dimension() != 1 {
            return Ok(0.0);
        }
        self.compute_volume_area_or_length(domain)
    }

    /// Length, square root of area or cube root of volume
    pub fn compute_mean_size(&self, domain: &DomainView<'_>) -> Result<f64> {
        let measure = self.compute_volume_area_or_length(domain)?;
        Ok(match self.spatial_dimension() {
            1 => measure,
            2 => measure.sqrt(),
            3 => measure.cbrt(),
            _ => 0.0,
        })
    }

    /// Extent of the element's nodes projected on `direction`
    pub fn length_in_direction(&self, domain: &DomainView<'_>, direction: &Vector3<f64>) -> Result<f64> {
        let norm = direction.norm();
        if norm == 0.0 {
            return Ok(0.0);
        }
        let unit = direction / norm;
        let nodes = self.node_coordinates(domain)?;
        let (lo, hi) = nodes
            .iter()
            .map(|x| x.dot(&unit))
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| (lo.min(p), hi.max(p)));
        Ok(if hi >= lo { hi - lo } else { 0.0 })
    }

    /// Characteristic length for crack-band regularization at a point with
    /// crack normal `normal`
    pub fn characteristic_length(
        &self,
        domain: &DomainView<'_>,
        _point: usize,
        normal: &Vector3<f64>,
    ) -> Result<f64> {
        self.length_in_direction(domain, normal)
    }

    /// Unit normal of a 2-D element at its reference center, `None` for
    /// other dimensions or degenerate geometry
    pub fn mid_plane_normal(&self, domain: &DomainView<'_>) -> Result<Option<Vector3<f64>>> {
        if self.spatial_dimension() != 2 {
            return Ok(None);
        }
        let nodes = self.node_coordinates(domain)?;
        let interp = self.interpolation();
        let t = interp.tangents(&interp.reference_center(), &nodes);
        Ok(t[0].cross(&t[1]).try_normalize(1.0e-14))
    }
}

fn sample_points(rule: &IntegrationRule) -> Vec<QuadraturePoint> {
    rule.points()
        .iter()
        .map(|p| (p.local_coordinates().iter().copied().collect(), p.weight()))
        .collect()
}
