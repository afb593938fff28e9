use tracing::{info, warn};

use super::mapper::{MappingFailureRecord, SourceMesh, TransferOptions};
use crate::domain::Domain;
use crate::error::{ElementError, Result};
use crate::time_step::TimeStep;

/// Summary of one mapping pass
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransferReport {
    /// Points that received history
    pub mapped: usize,
    /// Of those, points mapped from outside their source element
    pub extrapolated: usize,
    /// Elements visited
    pub elements: usize,
    pub failures: Vec<MappingFailureRecord>,
}

/// Moves integration-point history from an old mesh onto a new one
#[derive(Debug, Clone, Default)]
pub struct StateTransferEngine {
    options: TransferOptions,
}

impl StateTransferEngine {
    pub fn new(options: TransferOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &TransferOptions {
        &self.options
    }

    /// Stage mapped history on every point of `new`. Failures are collected
    /// in the report; nothing is committed.
    pub fn map(&self, old: &Domain, new: &mut Domain, tstep: &TimeStep) -> Result<TransferReport> {
        let source = SourceMesh::new(old, self.options);
        let (view, elements) = new.split_mut();
        let mut report = TransferReport::default();
        for element in elements.iter_mut() {
            report.elements += 1;
            match element.adaptive_map(&view, &source, tstep) {
                Ok(outcome) => {
                    report.mapped += outcome.mapped;
                    report.extrapolated += outcome.extrapolated;
                }
                Err(ElementError::MappingFailure { failures }) => report.failures.extend(failures),
                Err(err) => return Err(err),
            }
        }
        if report.extrapolated > 0 {
            warn!(points = report.extrapolated, "history extrapolated from outside the old mesh");
        }
        Ok(report)
    }

    /// Map, update and finish in one pass.
    ///
    /// # Errors
    /// `MappingFailure` with every failed point when any point could not be
    /// mapped; the new mesh keeps its initial state in that case.
    pub fn transfer(&self, old: &Domain, new: &mut Domain, tstep: &TimeStep) -> Result<TransferReport> {
        new.post_initialize()?;
        let report = self.map(old, new, tstep)?;
        if !report.failures.is_empty() {
            for element in &mut new.elements {
                element.ip_evaluator_mut(|p| p.clear_staged_history());
            }
            warn!(failed = report.failures.len(), "state transfer aborted");
            return Err(ElementError::MappingFailure {
                failures: report.failures,
            });
        }

        for element in &mut new.elements {
            element.adaptive_update(tstep)?;
        }
        let (view, elements) = new.split_mut();
        for element in elements.iter_mut() {
            element.adaptive_finish(&view, tstep)?;
        }
        info!(
            elements = report.elements,
            mapped = report.mapped,
            extrapolated = report.extrapolated,
            step = tstep.number,
            "state transfer finished"
        );
        Ok(report)
    }
}
