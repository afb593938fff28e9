use std::collections::BTreeMap;
use std::io::Write;

use super::InternalStateType;
use crate::error::{ElementError, Result};
use crate::time_step::TimeStep;

/// Equilibrium state of a point as `(kind, values)` pairs in ascending
/// [`InternalStateType`] order
pub type StateHistory = Vec<(InternalStateType, Vec<f64>)>;

/// First entry where two history layouts disagree, as
/// `(kind, expected length, found length)`. A kind missing on one side
/// counts as length zero there.
pub fn layout_mismatch(
    expected: &[(InternalStateType, Vec<f64>)],
    found: &[(InternalStateType, Vec<f64>)],
) -> Option<(InternalStateType, usize, usize)> {
    let len_of = |history: &[(InternalStateType, Vec<f64>)], kind: InternalStateType| {
        history.iter().find(|(k, _)| *k == kind).map(|(_, v)| v.len())
    };
    for (kind, values) in expected {
        match len_of(found, *kind) {
            Some(len) if len == values.len() => {}
            other => return Some((*kind, values.len(), other.unwrap_or(0))),
        }
    }
    found
        .iter()
        .find(|(kind, _)| len_of(expected, *kind).is_none())
        .map(|(kind, values)| (*kind, 0, values.len()))
}

/// History record of one integration point.
///
/// Holds an equilibrium (last converged) state and a temporary (current
/// iteration) state.
pub trait MaterialStatus: std::fmt::Debug + Send + Sync {
    /// Start a new step: temporary state := equilibrium state
    fn init_temp_status(&mut self);

    /// Commit: equilibrium state := temporary state
    fn update_yourself(&mut self, tstep: &TimeStep);

    /// Temporary value of `kind`
    fn ip_value(&self, kind: InternalStateType) -> Option<&[f64]>;

    /// Equilibrium value of `kind`
    fn equilibrium_value(&self, kind: InternalStateType) -> Option<&[f64]>;

    /// Overwrite the temporary value of `kind`. Returns `false` when the
    /// status does not hold `kind` or the length differs.
    fn set_temp_value(&mut self, kind: InternalStateType, values: &[f64]) -> bool;

    /// Equilibrium state keyed by kind, in ascending [`InternalStateType`]
    /// order. Persistence and mesh mapping exchange state in this form.
    fn history(&self) -> StateHistory;

    /// Replace the equilibrium state (and the temporary state) with `values`.
    ///
    /// # Errors
    /// `HistoryMismatch` when `values` does not hold exactly the kinds and
    /// lengths of [`MaterialStatus::history`]; the status is left unchanged.
    fn restore_history(&mut self, values: &[(InternalStateType, Vec<f64>)]) -> Result<()>;

    /// Write the temporary state as `name: values` lines
    fn print_output(&self, out: &mut dyn Write) -> std::io::Result<()>;
}

/// Status storing a fixed set of state vectors keyed by [`InternalStateType`]
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryStatus {
    equilibrium: BTreeMap<InternalStateType, Vec<f64>>,
    temporary: BTreeMap<InternalStateType, Vec<f64>>,
}

impl HistoryStatus {
    /// Zero-initialized status with `(kind, length)` entries
    pub fn new(layout: &[(InternalStateType, usize)]) -> Self {
        let equilibrium: BTreeMap<_, _> = layout
            .iter()
            .map(|(kind, len)| (*kind, vec![0.0; *len]))
            .collect();
        Self {
            temporary: equilibrium.clone(),
            equilibrium,
        }
    }

    /// Scalar temporary value, zero when absent
    pub fn temp_scalar(&self, kind: InternalStateType) -> f64 {
        self.temporary
            .get(&kind)
            .and_then(|v| v.first())
            .copied()
            .unwrap_or(0.0)
    }

    /// Scalar equilibrium value, zero when absent
    pub fn scalar(&self, kind: InternalStateType) -> f64 {
        self.equilibrium
            .get(&kind)
            .and_then(|v| v.first())
            .copied()
            .unwrap_or(0.0)
    }

    /// Total number of stored equilibrium values
    pub fn history_len(&self) -> usize {
        self.equilibrium.values().map(Vec::len).sum()
    }
}

impl MaterialStatus for HistoryStatus {
    fn init_temp_status(&mut self) {
        self.temporary.clone_from(&self.equilibrium);
    }

    fn update_yourself(&mut self, _tstep: &TimeStep) {
        self.equilibrium.clone_from(&self.temporary);
    }

    fn ip_value(&self, kind: InternalStateType) -> Option<&[f64]> {
        self.temporary.get(&kind).map(Vec::as_slice)
    }

    fn equilibrium_value(&self, kind: InternalStateType) -> Option<&[f64]> {
        self.equilibrium.get(&kind).map(Vec::as_slice)
    }

    fn set_temp_value(&mut self, kind: InternalStateType, values: &[f64]) -> bool {
        match self.temporary.get_mut(&kind) {
            Some(slot) if slot.len() == values.len() => {
                slot.copy_from_slice(values);
                true
            }
            _ => false,
        }
    }

    fn history(&self) -> StateHistory {
        self.equilibrium
            .iter()
            .map(|(kind, values)| (*kind, values.clone()))
            .collect()
    }

    fn restore_history(&mut self, values: &[(InternalStateType, Vec<f64>)]) -> Result<()> {
        if let Some((kind, expected, found)) = layout_mismatch(&self.history(), values) {
            return Err(ElementError::HistoryMismatch {
                kind,
                expected,
                found,
            });
        }
        for (kind, v) in values {
            if let Some(slot) = self.equilibrium.get_mut(kind) {
                slot.copy_from_slice(v);
            }
        }
        self.init_temp_status();
        Ok(())
    }

    fn print_output(&self, out: &mut dyn Write) -> std::io::Result<()> {
        for (kind, values) in &self.temporary {
            write!(out, "    {kind:?}:")?;
            for v in values {
                write!(out, " {v:.6e}")?;
            }
            writeln!(out)?;
        }
        Ok(())
    }
}
