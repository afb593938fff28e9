use super::LocalCoords;
use crate::material::{InternalStateType, MaterialStatus, StateHistory};

/// A quadrature sample carrying material history.
///
/// `number` is 1-based within the owning rule and `rule` is the 0-based index
/// of that rule in the element. Both are context only.
#[derive(Debug)]
pub struct IntegrationPoint {
    number: usize,
    rule: usize,
    local_coordinates: LocalCoords,
    weight: f64,
    status: Option<Box<dyn MaterialStatus>>,
    staged: Option<StateHistory>,
}

impl IntegrationPoint {
    pub fn new(number: usize, rule: usize, local_coordinates: LocalCoords, weight: f64) -> Self {
        Self {
            number,
            rule,
            local_coordinates,
            weight,
            status: None,
            staged: None,
        }
    }

    pub fn number(&self) -> usize {
        self.number
    }

    /// Index of the owning rule within its element
    pub fn rule_index(&self) -> usize {
        self.rule
    }

    pub fn local_coordinates(&self) -> &[f64] {
        &self.local_coordinates
    }

    pub fn weight(&self) -> f64 {
        self.weight
    }

    pub fn status(&self) -> Option<&dyn MaterialStatus> {
        self.status.as_deref()
    }

    pub fn status_mut(&mut self) -> Option<&mut (dyn MaterialStatus + 'static)> {
        self.status.as_deref_mut()
    }

    pub fn has_status(&self) -> bool {
        self.status.is_some()
    }

    /// Attach the material status for this point, replacing any previous one
    pub fn set_status(&mut self, status: Box<dyn MaterialStatus>) {
        self.status = Some(status);
    }

    /// Current (temporary) value of an internal state
    pub fn ip_value(&self, kind: InternalStateType) -> Option<&[f64]> {
        self.status.as_deref().and_then(|s| s.ip_value(kind))
    }

    /// Converged history keyed by kind; empty without a status
    pub fn history(&self) -> StateHistory {
        self.status.as_deref().map(|s| s.history()).unwrap_or_default()
    }

    /// Put mapped history aside until it is committed
    pub fn stage_history(&mut self, history: StateHistory) {
        self.staged = Some(history);
    }

    pub fn staged_history(&self) -> Option<&[(InternalStateType, Vec<f64>)]> {
        self.staged.as_deref()
    }

    pub fn take_staged_history(&mut self) -> Option<StateHistory> {
        self.staged.take()
    }

    pub fn clear_staged_history(&mut self) {
        self.staged = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::material::{HistoryStatus, InternalStateType};
    use smallvec::smallvec;

    #[test]
    fn point_without_status_reports_nothing() {
        let ip = IntegrationPoint::new(1, 0, smallvec![0.0, 0.0], 4.0);
        assert!(!ip.has_status());
        assert!(ip.ip_value(InternalStateType::DamageScalar).is_none());
        assert!(ip.history().is_empty());
    }

    #[test]
    fn staging_is_consumed_once() {
        let mut ip = IntegrationPoint::new(2, 1, smallvec![0.5], 1.0);
        ip.set_status(Box::new(HistoryStatus::new(&[(
            InternalStateType::DamageScalar,
            1,
        )])));
        let mapped = vec![(InternalStateType::DamageScalar, vec![0.3])];
        ip.stage_history(mapped.clone());
        assert_eq!(ip.staged_history(), Some(&mapped[..]));
        assert_eq!(ip.take_staged_history(), Some(mapped));
        assert!(ip.take_staged_history().is_none());
        assert_eq!(ip.rule_index(), 1);
        assert_eq!(ip.number(), 2);
    }
}
