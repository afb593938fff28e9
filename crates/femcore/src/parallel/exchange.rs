//! Packing and unpacking of integration-point state for shared elements.
//!
//! Each element contributes exactly one frame per exchange. The payload is
//! the concatenation of what the material packs for every point, in
//! (rule, point) order; the element itself never interprets those bytes.

use tracing::{debug, error, info};

use super::{PackBuffer, ParallelMode, SyncChannel, UnpackBuffer};
use crate::domain::{Domain, DomainView};
use crate::element::ElementGeometry;
use crate::error::{ElementError, Result};
use crate::time_step::TimeStep;

impl ElementGeometry {
    fn require_mode(&self, expected: ParallelMode) -> Result<()> {
        if self.parallel_mode() != expected {
            return Err(ElementError::ParallelMode {
                element: self.number(),
                expected,
                found: self.parallel_mode(),
            });
        }
        Ok(())
    }

    fn desync(&self, reason: impl Into<String>) -> ElementError {
        let err = ElementError::Desync {
            element: self.number(),
            reason: reason.into(),
        };
        error!(element = self.number(), %err, "exchange desynchronized");
        err
    }

    /// Upper bound of the bytes [`ElementGeometry::pack_unknowns`] puts on
    /// `channel`, frame overhead included
    pub fn estimate_pack_size(&self, domain: &DomainView<'_>, channel: &dyn SyncChannel) -> Result<usize> {
        let material = self.material_ref(domain)?;
        let cross_section = self.cross_section_ref(domain)?;
        let payload: usize = self
            .integration_points()
            .map(|p| cross_section.estimate_pack_size(material, p))
            .sum();
        Ok(channel.frame_overhead() + payload)
    }

    /// Pack the exchanged state of a local element into one frame
    pub fn pack_unknowns(
        &self,
        domain: &DomainView<'_>,
        channel: &mut dyn SyncChannel,
        tstep: &TimeStep,
    ) -> Result<()> {
        self.require_mode(ParallelMode::Local)?;
        let material = self.material_ref(domain)?;
        let cross_section = self.cross_section_ref(domain)?;

        let capacity = self.estimate_pack_size(domain, channel)? - channel.frame_overhead();
        let mut buffer = PackBuffer::with_capacity(capacity);
        for point in self.integration_points() {
            cross_section.pack_unknowns(material, &mut buffer, point)?;
        }
        debug!(element = self.number(), bytes = buffer.len(), step = tstep.number, "packed element state");
        channel.write_frame(tstep.number, buffer.freeze())
    }

    /// Unpack the frame produced by the local counterpart into this remote
    /// mirror.
    ///
    /// The whole frame is decoded and checked before any point is updated.
    ///
    /// # Errors
    /// `Desync` when the frame is missing, belongs to another step, is too
    /// short, has bytes left over, or holds values the points cannot take.
    /// The mirror's state is unchanged in every case.
    pub fn unpack_and_update_unknowns(
        &mut self,
        domain: &DomainView<'_>,
        channel: &mut dyn SyncChannel,
        tstep: &TimeStep,
    ) -> Result<()> {
        self.require_mode(ParallelMode::Remote)?;
        let material = self.material_ref(domain)?;
        let cross_section = self.cross_section_ref(domain)?;

        let frame = channel
            .read_frame(tstep.number)
            .map_err(|err| self.desync(err.to_string()))?;
        let mut buffer = UnpackBuffer::new(frame);

        let mut decoded = Vec::new();
        for _ in self.integration_points() {
            let values = cross_section
                .unpack_unknowns(material, &mut buffer)
                .map_err(|err| self.desync(err.to_string()))?;
            decoded.push(values);
        }
        if buffer.remaining() != 0 {
            return Err(self.desync(format!("{} unread byte(s) in frame", buffer.remaining())));
        }
        for (point, values) in self.integration_points().zip(&decoded) {
            cross_section
                .check_unknowns(material, point, values)
                .map_err(|err| self.desync(err.to_string()))?;
        }

        let mut decoded = decoded.into_iter();
        let mut result = Ok(());
        self.ip_evaluator_mut(|point| {
            if let Some(values) = decoded.next()
                && result.is_ok()
            {
                result = cross_section.update_unknowns(material, point, &values);
            }
        });
        result.map_err(|err| self.desync(err.to_string()))?;
        debug!(element = self.number(), step = tstep.number, "unpacked element state");
        Ok(())
    }

    /// Predicted cost of evaluating the element relative to a one-point
    /// linear elastic triangle
    pub fn predict_relative_computational_cost(&self, domain: &DomainView<'_>) -> f64 {
        let self_cost = self.relative_self_computational_cost();
        let (Ok(material), Ok(cross_section)) = (self.material_ref(domain), self.cross_section_ref(domain)) else {
            return self_cost;
        };
        let Some(rule) = self.default_integration_rule_ref() else {
            return self_cost;
        };
        let points = rule.points();
        if points.is_empty() {
            return self_cost;
        }
        let material_cost: f64 = points
            .iter()
            .map(|p| cross_section.predict_relative_computational_cost(material, p))
            .sum::<f64>()
            / points.len() as f64;
        self_cost * material_cost
    }

    /// Cost of the element's own work, without material evaluation
    pub fn relative_self_computational_cost(&self) -> f64 {
        self.kind().relative_self_cost()
    }

    /// Cost of moving the element to another partition
    pub fn predict_relative_redistribution_cost(&self) -> f64 {
        1.0
    }
}

/// Outcome of a domain-wide pack or unpack pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExchangeSummary {
    pub elements: usize,
    pub bytes: usize,
}

impl Domain {
    /// Upper bound of the bytes packing every shared local element needs
    pub fn estimate_exchange_size(&self, channel: &dyn SyncChannel) -> Result<usize> {
        let view = self.view();
        self.shared_elements(ParallelMode::Local)
            .into_iter()
            .filter_map(|n| self.element(n))
            .map(|e| e.estimate_pack_size(&view, channel))
            .sum()
    }

    /// Pack every shared local element, in global-number order
    pub fn pack_shared_elements(
        &self,
        channel: &mut dyn SyncChannel,
        tstep: &TimeStep,
    ) -> Result<ExchangeSummary> {
        let view = self.view();
        let mut summary = ExchangeSummary::default();
        for number in self.shared_elements(ParallelMode::Local) {
            let Some(element) = self.element(number) else {
                continue;
            };
            summary.bytes += element.estimate_pack_size(&view, channel)?;
            element.pack_unknowns(&view, channel, tstep)?;
            summary.elements += 1;
        }
        info!(
            domain = self.number,
            elements = summary.elements,
            step = tstep.number,
            "packed shared elements"
        );
        Ok(summary)
    }

    /// Unpack into every remote mirror, in global-number order
    pub fn unpack_remote_elements(
        &mut self,
        channel: &mut dyn SyncChannel,
        tstep: &TimeStep,
    ) -> Result<ExchangeSummary> {
        let order = self.shared_elements(ParallelMode::Remote);
        let (view, elements) = self.split_mut();
        let mut summary = ExchangeSummary::default();
        for number in order {
            let Some(element) = number.checked_sub(1).and_then(|i| elements.get_mut(i)) else {
                continue;
            };
            summary.bytes += element.estimate_pack_size(&view, channel)?;
            element.unpack_and_update_unknowns(&view, channel, tstep)?;
            summary.elements += 1;
        }
        info!(
            domain = self.number,
            elements = summary.elements,
            step = tstep.number,
            "unpacked remote elements"
        );
        Ok(summary)
    }
}
