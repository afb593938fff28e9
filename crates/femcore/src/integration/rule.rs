use tracing::debug;

use super::gauss::{QuadraturePoint, quadrature_points};
use super::{IntegrationDomain, IntegrationPoint};
use crate::error::{ElementError, Result};
use crate::time_step::TimeStep;

/// Ordered, fixed-size set of integration points for one quadrature scheme
#[derive(Debug)]
pub struct IntegrationRule {
    /// Index of the rule within its element (0-based)
    number: usize,
    domain: IntegrationDomain,
    points: Vec<IntegrationPoint>,
}

impl IntegrationRule {
    /// Build a Gauss rule with `nip` points on `domain`
    ///
    /// # Errors
    /// `UnsupportedIntegration` when no `nip`-point rule is tabulated for the
    /// domain.
    pub fn gauss(number: usize, domain: IntegrationDomain, nip: usize) -> Result<Self> {
        let samples = quadrature_points(domain, nip)
            .ok_or(ElementError::UnsupportedIntegration { domain, nip })?;
        debug!(rule = number, ?domain, nip, "built gauss rule");
        Ok(Self::from_points(number, domain, samples))
    }

    /// Build a rule from explicit samples
    pub fn from_points(number: usize, domain: IntegrationDomain, samples: Vec<QuadraturePoint>) -> Self {
        let points = samples
            .into_iter()
            .enumerate()
            .map(|(i, (coords, weight))| IntegrationPoint::new(i + 1, number, coords, weight))
            .collect();
        Self {
            number,
            domain,
            points,
        }
    }

    pub fn number(&self) -> usize {
        self.number
    }

    pub fn domain(&self) -> IntegrationDomain {
        self.domain
    }

    pub fn number_of_integration_points(&self) -> usize {
        self.points.len()
    }

    /// Point by 1-based number
    pub fn integration_point(&self, number: usize) -> Option<&IntegrationPoint> {
        number.checked_sub(1).and_then(|i| self.points.get(i))
    }

    pub fn integration_point_mut(&mut self, number: usize) -> Option<&mut IntegrationPoint> {
        number.checked_sub(1).and_then(|i| self.points.get_mut(i))
    }

    pub fn points(&self) -> &[IntegrationPoint] {
        &self.points
    }

    /// Mutable access to the points. The slice cannot grow or shrink.
    pub fn points_mut(&mut self) -> &mut [IntegrationPoint] {
        &mut self.points
    }

    /// Reset every point's temporary state to its equilibrium state
    pub fn init_for_new_step(&mut self) {
        for status in self.points.iter_mut().filter_map(|p| p.status_mut()) {
            status.init_temp_status();
        }
    }

    /// Commit every point's temporary state
    pub fn update_yourself(&mut self, tstep: &TimeStep) {
        for status in self.points.iter_mut().filter_map(|p| p.status_mut()) {
            status.update_yourself(tstep);
        }
    }

    /// Sum of weights (measure of the reference domain)
    pub fn total_weight(&self) -> f64 {
        self.points.iter().map(|p| p.weight()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn gauss_rule_numbers_points_from_one() {
        let rule = IntegrationRule::gauss(1, IntegrationDomain::Square, 4).unwrap();
        assert_eq!(rule.number_of_integration_points(), 4);
        assert_eq!(rule.integration_point(1).unwrap().number(), 1);
        assert_eq!(rule.integration_point(4).unwrap().rule_index(), 1);
        assert!(rule.integration_point(0).is_none());
        assert!(rule.integration_point(5).is_none());
        assert_relative_eq!(rule.total_weight(), 4.0, epsilon = 1e-12);
    }

    #[test]
    fn unsupported_rule_is_an_error() {
        let err = IntegrationRule::gauss(0, IntegrationDomain::Triangle, 2).unwrap_err();
        assert_eq!(
            err,
            ElementError::UnsupportedIntegration {
                domain: IntegrationDomain::Triangle,
                nip: 2
            }
        );
    }
}
