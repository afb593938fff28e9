//! Domain: the arena owning dof managers, components and elements of one
//! mesh partition.

use std::collections::HashMap;

use tracing::{debug, info};

use crate::cross_section::CrossSection;
use crate::dofman::{DofManager, DofManagerArena};
use crate::element::{ElementGeometry, ElementKind};
use crate::error::{ElementError, Result};
use crate::integration::IntegrationPoint;
use crate::material::Material;
use crate::parallel::{ParallelMode, PartitionContext};
use crate::renumbering::{EntityKind, EntityRenumbering};
use crate::time_step::{TimeFunction, TimeStep};

/// One mesh partition and everything its elements refer to
#[derive(Debug, Default)]
pub struct Domain {
    /// Domain number
    pub number: usize,
    /// Partition table this domain belongs to
    pub partition: PartitionContext,
    pub dof_managers: DofManagerArena,
    pub materials: Vec<Box<dyn Material>>,
    pub cross_sections: Vec<CrossSection>,
    pub time_functions: Vec<TimeFunction>,
    /// Elements; element `n` is stored at index `n - 1`
    pub elements: Vec<ElementGeometry>,
}

/// Read-only view of a domain's components, excluding its elements.
///
/// Elements receive a view while the domain lends them out mutably, see
/// [`Domain::split_mut`].
#[derive(Debug, Clone, Copy)]
pub struct DomainView<'a> {
    pub number: usize,
    pub partition: PartitionContext,
    pub dof_managers: &'a DofManagerArena,
    pub materials: &'a [Box<dyn Material>],
    pub cross_sections: &'a [CrossSection],
    pub time_functions: &'a [TimeFunction],
}

impl<'a> DomainView<'a> {
    /// Dof manager by 1-based number
    pub fn dof_manager(&self, number: usize) -> Option<&'a DofManager> {
        self.dof_managers.get(number)
    }

    /// Material by 1-based number
    pub fn material(&self, number: usize) -> Option<&'a dyn Material> {
        number
            .checked_sub(1)
            .and_then(|i| self.materials.get(i))
            .map(|m| m.as_ref())
    }

    /// Cross section by 1-based number
    pub fn cross_section(&self, number: usize) -> Option<&'a CrossSection> {
        number.checked_sub(1).and_then(|i| self.cross_sections.get(i))
    }

    /// Time function by 1-based number
    pub fn time_function(&self, number: usize) -> Option<&'a TimeFunction> {
        number.checked_sub(1).and_then(|i| self.time_functions.get(i))
    }
}

impl Domain {
    /// Create an empty serial domain
    pub fn new(number: usize) -> Self {
        Self {
            number,
            ..Self::default()
        }
    }

    /// Create an empty domain on a partition
    pub fn with_partition(number: usize, partition: PartitionContext) -> Self {
        Self {
            number,
            partition,
            ..Self::default()
        }
    }

    /// Add a material and return its number
    pub fn add_material(&mut self, material: Box<dyn Material>) -> usize {
        self.materials.push(material);
        self.materials.len()
    }

    /// Add a cross section and return its number
    pub fn add_cross_section(&mut self, cross_section: CrossSection) -> usize {
        self.cross_sections.push(cross_section);
        self.cross_sections.len()
    }

    /// Add a time function and return its number
    pub fn add_time_function(&mut self, function: TimeFunction) -> usize {
        self.time_functions.push(function);
        self.time_functions.len()
    }

    /// Add an element and return its number. The element is renumbered to
    /// its slot.
    pub fn add_element(&mut self, mut element: ElementGeometry) -> usize {
        let number = self.elements.len() + 1;
        element.set_number(number);
        element.set_domain_number(self.number);
        self.elements.push(element);
        number
    }

    /// Get an element by 1-based number
    pub fn element(&self, number: usize) -> Option<&ElementGeometry> {
        number.checked_sub(1).and_then(|i| self.elements.get(i))
    }

    pub fn element_mut(&mut self, number: usize) -> Option<&mut ElementGeometry> {
        number.checked_sub(1).and_then(|i| self.elements.get_mut(i))
    }

    pub fn view(&self) -> DomainView<'_> {
        DomainView {
            number: self.number,
            partition: self.partition,
            dof_managers: &self.dof_managers,
            materials: &self.materials,
            cross_sections: &self.cross_sections,
            time_functions: &self.time_functions,
        }
    }

    /// Borrow the components read-only and the elements mutably at once
    pub fn split_mut(&mut self) -> (DomainView<'_>, &mut [ElementGeometry]) {
        let view = DomainView {
            number: self.number,
            partition: self.partition,
            dof_managers: &self.dof_managers,
            materials: &self.materials,
            cross_sections: &self.cross_sections,
            time_functions: &self.time_functions,
        };
        (view, &mut self.elements)
    }

    /// Check every element.
    ///
    /// # Errors
    /// `ConsistencyCheckFailed` listing the failing elements, or
    /// `IndexOutOfRange` when an element names a partition outside the
    /// partition table.
    pub fn check_consistency(&self) -> Result<()> {
        let view = self.view();
        for element in &self.elements {
            self.partition.validate(element.partition_list())?;
        }
        let failed: Vec<usize> = self
            .elements
            .iter()
            .filter(|e| !e.check_consistency(&view))
            .map(ElementGeometry::number)
            .collect();
        if failed.is_empty() {
            Ok(())
        } else {
            Err(ElementError::ConsistencyCheckFailed { elements: failed })
        }
    }

    /// Build integration rules of every element
    pub fn post_initialize(&mut self) -> Result<()> {
        let (view, elements) = self.split_mut();
        for element in elements.iter_mut() {
            element.post_initialize(&view)?;
        }
        debug!(domain = self.number, elements = self.elements.len(), "domain initialized");
        Ok(())
    }

    /// Start a new step on every element, active or not
    pub fn init_for_new_step(&mut self) {
        for element in &mut self.elements {
            element.init_for_new_step();
        }
    }

    /// Commit the converged step on every element
    pub fn update_yourself(&mut self, tstep: &TimeStep) {
        for element in &mut self.elements {
            element.update_yourself(tstep);
        }
    }

    /// Elements taking part in `tstep`
    pub fn active_elements<'s>(&'s self, tstep: &'s TimeStep) -> impl Iterator<Item = &'s ElementGeometry> + 's {
        let view = self.view();
        self.elements
            .iter()
            .filter(move |e| e.is_activated(&view, tstep))
    }

    /// Visit every point of every active element in (element, rule, point)
    /// order
    pub fn ip_evaluator<F>(&self, tstep: &TimeStep, mut visit: F)
    where
        F: FnMut(&ElementGeometry, &IntegrationPoint),
    {
        for element in self.active_elements(tstep) {
            element.ip_evaluator(|point| visit(element, point));
        }
    }

    /// Mutable variant of [`Domain::ip_evaluator`]; the visitor gets the
    /// element number
    pub fn ip_evaluator_mut<F>(&mut self, tstep: &TimeStep, mut visit: F)
    where
        F: FnMut(usize, &mut IntegrationPoint),
    {
        let (view, elements) = self.split_mut();
        for element in elements.iter_mut() {
            if !element.is_activated(&view, tstep) {
                continue;
            }
            let number = element.number();
            element.ip_evaluator_mut(|point| visit(number, point));
        }
    }

    /// Apply a renumbering to dof managers and elements.
    ///
    /// Both mappings must be permutations; nothing changes on error.
    pub fn renumber(&mut self, renumbering: &dyn EntityRenumbering) -> Result<()> {
        let n = self.elements.len();
        let mut order = vec![usize::MAX; n];
        for (slot, element) in self.elements.iter().enumerate() {
            let new = renumbering.renumber(element.number(), EntityKind::Element);
            if new == 0 || new > n || order[new - 1] != usize::MAX {
                return Err(ElementError::InvalidRenumbering(format!(
                    "element {} mapped to {new}",
                    element.number()
                )));
            }
            order[new - 1] = slot;
        }

        self.dof_managers.renumber(renumbering)?;

        let mut old: Vec<Option<ElementGeometry>> = self.elements.drain(..).map(Some).collect();
        self.elements = order
            .into_iter()
            .zip(1..)
            .filter_map(|(slot, number)| {
                old[slot].take().map(|mut element| {
                    element.set_number(number);
                    element.update_local_numbering(renumbering);
                    element
                })
            })
            .collect();
        info!(domain = self.number, elements = n, "domain renumbered");
        Ok(())
    }

    /// Shared elements in global-number order (local number when unset)
    pub fn shared_elements(&self, mode: ParallelMode) -> Vec<usize> {
        let mut shared: Vec<&ElementGeometry> = self
            .elements
            .iter()
            .filter(|e| e.parallel_mode() == mode && !e.partition_list().is_empty())
            .collect();
        shared.sort_by_key(|e| e.label());
        shared.into_iter().map(ElementGeometry::number).collect()
    }

    /// Get domain statistics
    pub fn statistics(&self) -> DomainStatistics {
        let mut element_kind_counts = HashMap::new();
        for element in &self.elements {
            *element_kind_counts.entry(element.kind()).or_insert(0) += 1;
        }
        DomainStatistics {
            num_dof_managers: self.dof_managers.len(),
            num_elements: self.elements.len(),
            num_integration_points: self
                .elements
                .iter()
                .map(|e| e.integration_points().count())
                .sum(),
            num_remote_elements: self
                .elements
                .iter()
                .filter(|e| e.parallel_mode() == ParallelMode::Remote)
                .count(),
            element_kind_counts,
        }
    }
}

/// Domain statistics for reporting
#[derive(Debug, Clone)]
pub struct DomainStatistics {
    pub num_dof_managers: usize,
    pub num_elements: usize,
    pub num_integration_points: usize,
    pub num_remote_elements: usize,
    pub element_kind_counts: HashMap<ElementKind, usize>,
}

impl DomainStatistics {
    /// Format as a human-readable string
    pub fn format(&self) -> String {
        let mut lines = vec![
            format!("Dof managers: {}", self.num_dof_managers),
            format!("Elements: {}", self.num_elements),
            format!("Remote elements: {}", self.num_remote_elements),
            format!("Integration points: {}", self.num_integration_points),
        ];

        if !self.element_kind_counts.is_empty() {
            lines.push("Element types:".to_string());
            let mut kinds: Vec<_> = self.element_kind_counts.iter().collect();
            kinds.sort_by_key(|(k, _)| format!("{:?}", k));
            for (kind, count) in kinds {
                lines.push(format!("  {:?}: {}", kind, count));
            }
        }

        lines.join("\n")
    }
}
