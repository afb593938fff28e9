//! Element context save and restore.
//!
//! A context holds the configuration of every element together with the
//! equilibrium history of its integration points, so a run can continue from
//! a saved step.

use std::fs;
use std::path::Path;

use femcore::{Domain, ElementGeometry, ElementRecord, StateHistory, TimeStep};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{IoError, Result};

pub const CONTEXT_SCHEMA_VERSION: u32 = 1;

/// Saved state of one element
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementContext {
    pub element: ElementRecord,
    /// Equilibrium history per integration point, in (rule, point) order,
    /// keyed by state kind
    #[serde(default)]
    pub history: Vec<StateHistory>,
}

impl ElementContext {
    pub fn capture(element: &ElementGeometry) -> Self {
        Self {
            element: element.input_record(),
            history: element.integration_points().map(|p| p.history()).collect(),
        }
    }

    /// Apply topology, component numbers and partition tags. History is left
    /// untouched.
    pub fn apply(&self, element: &mut ElementGeometry) -> Result<()> {
        element.initialize_from(&self.element)?;
        Ok(())
    }

    /// Restore the saved history into the element's point statuses
    pub fn restore_history(&self, element: &mut ElementGeometry) -> Result<()> {
        let points = element.integration_points().count();
        if points != self.history.len() {
            return Err(IoError::InvalidData(format!(
                "element {}: context holds {} point(s), element has {points}",
                element.number(),
                self.history.len()
            )));
        }

        let mut saved = self.history.iter();
        let mut result = Ok(());
        element.ip_evaluator_mut(|point| {
            let Some(values) = saved.next() else {
                return;
            };
            if result.is_err() || values.is_empty() {
                return;
            }
            if let Some(status) = point.status_mut() {
                result = status.restore_history(values);
            }
        });
        Ok(result?)
    }
}

/// Saved state of a domain at a step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainContext {
    pub schema_version: u32,
    pub domain: usize,
    pub step: TimeStep,
    pub elements: Vec<ElementContext>,
}

impl DomainContext {
    pub fn capture(domain: &Domain, step: &TimeStep) -> Self {
        Self {
            schema_version: CONTEXT_SCHEMA_VERSION,
            domain: domain.number,
            step: *step,
            elements: domain.elements.iter().map(ElementContext::capture).collect(),
        }
    }

    /// Apply element configuration and history to `domain`.
    ///
    /// The domain must hold the same elements as the captured one. Integration
    /// points are created where missing before history is restored.
    pub fn apply(&self, domain: &mut Domain) -> Result<()> {
        if self.elements.len() != domain.elements.len() {
            return Err(IoError::InvalidData(format!(
                "context holds {} element(s), domain has {}",
                self.elements.len(),
                domain.elements.len()
            )));
        }
        for (context, element) in self.elements.iter().zip(domain.elements.iter_mut()) {
            if context.element.number != element.number() {
                return Err(IoError::InvalidData(format!(
                    "context element {} does not match domain element {}",
                    context.element.number,
                    element.number()
                )));
            }
            context.apply(element)?;
        }
        domain.post_initialize()?;
        for (context, element) in self.elements.iter().zip(domain.elements.iter_mut()) {
            context.restore_history(element)?;
        }
        debug!(domain = domain.number, step = self.step.number, "context applied");
        Ok(())
    }
}

/// Write a domain context as JSON
pub fn save_context(path: impl AsRef<Path>, context: &DomainContext) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }
    let bytes = serde_json::to_vec_pretty(context)?;
    fs::write(path, bytes)?;
    info!(path = %path.display(), elements = context.elements.len(), "saved context");
    Ok(())
}

/// Read a domain context written by [`save_context`]
pub fn restore_context(path: impl AsRef<Path>) -> Result<DomainContext> {
    let bytes = fs::read(path)?;
    let context: DomainContext = serde_json::from_slice(&bytes)?;
    if context.schema_version != CONTEXT_SCHEMA_VERSION {
        return Err(IoError::UnsupportedSchema {
            found: context.schema_version,
            expected: CONTEXT_SCHEMA_VERSION,
        });
    }
    Ok(context)
}

#[cfg(test)]
mod tests {
    use super::*;
    use femcore::{
        CrossSection, DamageParameters, ElementError, ElementKind, InternalStateType,
        IsotropicElastic, ScalarDamage,
    };

    fn triangle() -> Domain {
        triangle_of(Box::new(IsotropicElastic::new("A", 100.0, 0.25)))
    }

    fn triangle_of(material: Box<dyn femcore::Material>) -> Domain {
        let mut domain = Domain::new(1);
        domain.dof_managers.add_node([0.0, 0.0, 0.0]);
        domain.dof_managers.add_node([1.0, 0.0, 0.0]);
        domain.dof_managers.add_node([0.0, 1.0, 0.0]);
        domain.add_material(material);
        domain.add_cross_section(CrossSection::plate(1.0));
        let mut e = ElementGeometry::new(0, ElementKind::CPS3);
        e.set_dof_managers(&[1, 2, 3]).unwrap();
        e.set_material(Some(1));
        e.set_cross_section(Some(1));
        domain.add_element(e);
        domain.post_initialize().unwrap();
        domain
    }

    #[test]
    fn capture_and_apply_restores_history() {
        let mut source = triangle();
        let tstep = TimeStep::new(4, 4.0, 1.0);
        source.ip_evaluator_mut(&tstep, |_, p| {
            if let Some(s) = p.status_mut() {
                s.set_temp_value(InternalStateType::StressTensor, &[1.0, 2.0, 3.0]);
            }
        });
        source.update_yourself(&tstep);
        let context = DomainContext::capture(&source, &tstep);
        assert_eq!(context.elements[0].history.len(), 1);

        let mut target = triangle();
        context.apply(&mut target).unwrap();
        let e = &target.elements[0];
        let status = e.integration_points().next().unwrap().status().unwrap();
        assert_eq!(
            status.equilibrium_value(InternalStateType::StressTensor),
            Some(&[1.0, 2.0, 3.0][..])
        );
    }

    #[test]
    fn history_of_another_material_is_rejected() {
        let context = DomainContext::capture(&triangle(), &TimeStep::new(1, 1.0, 1.0));
        let mut target = triangle_of(Box::new(ScalarDamage::new(
            IsotropicElastic::new("A", 100.0, 0.25),
            DamageParameters {
                onset_strain: 1.0e-4,
                failure_strain: 1.0e-3,
            },
        )));
        let err = context.apply(&mut target).unwrap_err();
        assert!(matches!(
            err,
            IoError::Element(ElementError::HistoryMismatch {
                kind: InternalStateType::DamageScalar,
                expected: 1,
                found: 0,
            })
        ));
    }

    #[test]
    fn element_count_mismatch_is_rejected() {
        let context = DomainContext::capture(&triangle(), &TimeStep::new(1, 1.0, 1.0));
        let mut empty = Domain::new(1);
        assert!(matches!(context.apply(&mut empty), Err(IoError::InvalidData(_))));
    }
}
