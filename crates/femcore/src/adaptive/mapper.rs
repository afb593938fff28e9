//! Per-element state mapping from an old mesh.
//!
//! Mapping is split in three phases so that no element reads state another
//! element has already overwritten: [`ElementGeometry::adaptive_map`] stages
//! mapped history on every point, [`ElementGeometry::adaptive_update`]
//! commits it, and [`ElementGeometry::adaptive_finish`] resynchronizes the
//! temporary state once every element is updated.

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use super::locator::{ElementLocator, Location};
use crate::domain::{Domain, DomainView};
use crate::element::ElementGeometry;
use crate::error::{ElementError, Result};
use crate::material::{InternalStateType, StateHistory, layout_mismatch};
use crate::time_step::TimeStep;

/// How history is taken from the enclosing old element
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MappingMethod {
    /// Copy the history of the nearest old integration point
    #[default]
    ClosestPoint,
    /// Inverse-distance weighted average over the old element's points
    InverseDistance,
}

/// Configuration of a state transfer
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransferOptions {
    pub method: MappingMethod,
    /// Map points outside the old mesh from the nearest element instead of
    /// reporting a failure
    pub allow_extrapolation: bool,
    /// Cells per direction of the search grid
    pub grid_resolution: usize,
}

impl Default for TransferOptions {
    fn default() -> Self {
        Self {
            method: MappingMethod::ClosestPoint,
            allow_extrapolation: false,
            grid_resolution: 16,
        }
    }
}

/// Why a point could not be mapped
#[derive(Debug, Clone, PartialEq)]
pub enum MappingFailureReason {
    /// The point lies outside the old mesh and extrapolation is disabled
    NoSourceElement,
    /// The old element has no integration points with state
    EmptySource { element: usize },
    /// Old and new statuses disagree on the history of `kind`; a length of
    /// zero means the side does not hold it
    IncompatibleHistory {
        kind: InternalStateType,
        expected: usize,
        found: usize,
    },
    /// Coordinates could not be evaluated
    Geometry(String),
}

/// One point that could not be mapped
#[derive(Debug, Clone, PartialEq)]
pub struct MappingFailureRecord {
    /// New element number
    pub element: usize,
    /// Rule index within the element
    pub rule: usize,
    /// Point number within the rule (1-based)
    pub point: usize,
    pub coordinates: [f64; 3],
    pub reason: MappingFailureReason,
}

/// Counts of one element's mapping
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MapOutcome {
    pub mapped: usize,
    /// Mapped from outside the nearest old element
    pub extrapolated: usize,
}

/// The old mesh prepared for point queries
#[derive(Debug)]
pub struct SourceMesh<'a> {
    domain: &'a Domain,
    locator: ElementLocator,
    options: TransferOptions,
}

impl<'a> SourceMesh<'a> {
    pub fn new(domain: &'a Domain, options: TransferOptions) -> Self {
        Self {
            domain,
            locator: ElementLocator::build(domain, options.grid_resolution),
            options,
        }
    }

    pub fn domain(&self) -> &'a Domain {
        self.domain
    }

    pub fn options(&self) -> &TransferOptions {
        &self.options
    }

    /// History at a located position
    fn sample(&self, location: &Location, target: &Vector3<f64>) -> std::result::Result<StateHistory, MappingFailureReason> {
        let empty = MappingFailureReason::EmptySource {
            element: location.element,
        };
        let Some(element) = self.domain.element(location.element) else {
            return Err(empty);
        };
        let Some(rule) = element.default_integration_rule_ref() else {
            return Err(empty);
        };
        let points: Vec<_> = rule.points().iter().filter(|p| p.has_status()).collect();
        if points.is_empty() {
            return Err(empty);
        }

        match self.options.method {
            MappingMethod::ClosestPoint => {
                let nearest = points
                    .iter()
                    .map(|p| {
                        let d: f64 = p
                            .local_coordinates()
                            .iter()
                            .zip(&location.local)
                            .map(|(a, b)| (a - b).powi(2))
                            .sum();
                        (d, p)
                    })
                    .min_by(|a, b| a.0.total_cmp(&b.0))
                    .map(|(_, p)| p.history());
                nearest.ok_or(empty)
            }
            MappingMethod::InverseDistance => {
                let view = self.domain.view();
                let nodes = element
                    .node_coordinates(&view)
                    .map_err(|err| MappingFailureReason::Geometry(err.to_string()))?;
                let interp = element.interpolation();
                let mut sum = points[0].history();
                for (_, values) in &mut sum {
                    values.fill(0.0);
                }
                let mut total = 0.0;
                for p in &points {
                    let history = p.history();
                    if let Some((kind, expected, found)) = layout_mismatch(&sum, &history) {
                        return Err(MappingFailureReason::IncompatibleHistory { kind, expected, found });
                    }
                    let x = interp.global_coordinates(p.local_coordinates(), &nodes);
                    let d2 = (x - target).norm_squared();
                    if d2 <= f64::EPSILON * f64::EPSILON {
                        return Ok(history);
                    }
                    let w = 1.0 / d2;
                    // equal key sets, both in kind order
                    for ((_, s), (_, h)) in sum.iter_mut().zip(&history) {
                        for (a, b) in s.iter_mut().zip(h) {
                            *a += w * b;
                        }
                    }
                    total += w;
                }
                for (_, values) in &mut sum {
                    for v in values.iter_mut() {
                        *v /= total;
                    }
                }
                Ok(sum)
            }
        }
    }
}

impl ElementGeometry {
    /// Stage history mapped from `source` on every integration point.
    ///
    /// # Errors
    /// `MappingFailure` listing the points that could not be mapped. Points
    /// that were mapped stay staged.
    pub fn adaptive_map(
        &mut self,
        domain: &DomainView<'_>,
        source: &SourceMesh<'_>,
        tstep: &TimeStep,
    ) -> Result<MapOutcome> {
        let nodes = self.node_coordinates(domain);
        let interp = self.interpolation();
        let number = self.number();
        let allow_extrapolation = source.options().allow_extrapolation;

        let mut outcome = MapOutcome::default();
        let mut failures = Vec::new();
        self.ip_evaluator_mut(|point| {
            let fail = |coordinates: [f64; 3], reason: MappingFailureReason| MappingFailureRecord {
                element: number,
                rule: point.rule_index(),
                point: point.number(),
                coordinates,
                reason,
            };
            let nodes = match &nodes {
                Ok(nodes) => nodes,
                Err(err) => {
                    failures.push(fail([0.0; 3], MappingFailureReason::Geometry(err.to_string())));
                    return;
                }
            };
            let x = interp.global_coordinates(point.local_coordinates(), nodes);
            let coordinates = [x.x, x.y, x.z];

            let location = match source.locator.locate(&x) {
                Some(loc) if loc.inside || allow_extrapolation => loc,
                _ => {
                    failures.push(fail(coordinates, MappingFailureReason::NoSourceElement));
                    return;
                }
            };
            let history = match source.sample(&location, &x) {
                Ok(h) => h,
                Err(reason) => {
                    failures.push(fail(coordinates, reason));
                    return;
                }
            };
            if let Some((kind, expected, found)) = layout_mismatch(&point.history(), &history) {
                failures.push(fail(
                    coordinates,
                    MappingFailureReason::IncompatibleHistory { kind, expected, found },
                ));
                return;
            }

            trace!(element = number, point = point.number(), source = location.element, "mapped point");
            point.stage_history(history);
            outcome.mapped += 1;
            if !location.inside {
                outcome.extrapolated += 1;
            }
        });

        debug!(
            element = number,
            step = tstep.number,
            mapped = outcome.mapped,
            failed = failures.len(),
            "adaptive map"
        );
        if failures.is_empty() {
            Ok(outcome)
        } else {
            Err(ElementError::MappingFailure { failures })
        }
    }

    /// Same mapping as [`ElementGeometry::adaptive_map`], starting from the
    /// old domain itself
    pub fn map_state_variables(
        &mut self,
        domain: &DomainView<'_>,
        old: &Domain,
        tstep: TimeStep,
        options: &TransferOptions,
    ) -> Result<MapOutcome> {
        let source = SourceMesh::new(old, *options);
        self.adaptive_map(domain, &source, &tstep)
    }

    /// Commit staged history into the point statuses. Returns the number of
    /// points updated.
    pub fn adaptive_update(&mut self, tstep: &TimeStep) -> Result<usize> {
        let mut updated = 0;
        let mut result = Ok(());
        self.ip_evaluator_mut(|point| {
            if result.is_err() {
                return;
            }
            let Some(history) = point.take_staged_history() else {
                return;
            };
            result = match (point.status_mut(), history.first()) {
                (Some(status), _) => status.restore_history(&history),
                (None, None) => return,
                (None, Some((kind, values))) => Err(ElementError::HistoryMismatch {
                    kind: *kind,
                    expected: 0,
                    found: values.len(),
                }),
            };
            if result.is_ok() {
                updated += 1;
            }
        });
        result?;
        debug!(element = self.number(), step = tstep.number, updated, "adaptive update");
        Ok(updated)
    }

    /// Drop leftover staging, let the material re-derive dependent state
    /// from the mapped history and commit the result
    pub fn adaptive_finish(&mut self, domain: &DomainView<'_>, tstep: &TimeStep) -> Result<()> {
        let components = self
            .material_ref(domain)
            .and_then(|material| Ok((material, self.cross_section_ref(domain)?)));
        let mut result = Ok(());
        self.ip_evaluator_mut(|point| {
            point.clear_staged_history();
            if result.is_err() {
                return;
            }
            let Some(status) = point.status_mut() else {
                return;
            };
            status.init_temp_status();
            result = match &components {
                Ok((material, cross_section)) => cross_section.finish_mapping(*material, status),
                Err(err) => Err(err.clone()),
            };
            if result.is_ok() {
                status.update_yourself(tstep);
            }
        });
        result?;
        trace!(element = self.number(), step = tstep.number, "adaptive finish");
        Ok(())
    }
}
