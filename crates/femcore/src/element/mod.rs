//! Element geometry: topology, integration rules and point state.
//!
//! An [`ElementGeometry`] owns its integration rules (and through them every
//! point's material status) but only refers to dof managers, materials, cross
//! sections and time functions by 1-based number. Those live in the
//! [`Domain`](crate::domain::Domain) and are reached through a
//! [`DomainView`].

use nalgebra::{Matrix3, Vector3};
use smallvec::SmallVec;
use tracing::{debug, warn};

use crate::cross_section::CrossSection;
use crate::dofman::{DofManager, DofManagerKind};
use crate::domain::DomainView;
use crate::error::{ElementError, Result};
use crate::integration::{IntegrationPoint, IntegrationRule, LocalCoords};
use crate::interpolation::{GeometryType, Interpolation};
use crate::material::{InternalStateType, Material, MaterialMode};
use crate::parallel::{ParallelMode, PartitionInfo};
use crate::renumbering::{EntityKind, EntityRenumbering};
use crate::time_step::TimeStep;

pub mod kind;
pub mod output;
pub mod record;
pub mod size;

pub use kind::ElementKind;
pub use record::ElementRecord;

/// Nodal coordinates of one element
pub type NodeCoordinates = SmallVec<[Vector3<f64>; 8]>;

/// Geometry, topology and integration state of one mesh element
#[derive(Debug)]
pub struct ElementGeometry {
    number: usize,
    domain: usize,
    global_number: Option<usize>,
    kind: ElementKind,
    dof_managers: SmallVec<[usize; 8]>,
    material: Option<usize>,
    cross_section: Option<usize>,
    activity_time_function: Option<usize>,
    local_cs: Option<Matrix3<f64>>,
    nip: usize,
    default_rule: usize,
    integration_rules: Vec<IntegrationRule>,
    partition: PartitionInfo,
}

impl ElementGeometry {
    /// Create an element without topology or integration rules
    pub fn new(number: usize, kind: ElementKind) -> Self {
        Self {
            number,
            domain: 0,
            global_number: None,
            kind,
            dof_managers: SmallVec::new(),
            material: None,
            cross_section: None,
            activity_time_function: None,
            local_cs: None,
            nip: kind.default_nip(),
            default_rule: 0,
            integration_rules: Vec::new(),
            partition: PartitionInfo::default(),
        }
    }

    pub fn number(&self) -> usize {
        self.number
    }

    pub(crate) fn set_number(&mut self, number: usize) {
        self.number = number;
    }

    /// Number of the owning domain
    pub fn domain_number(&self) -> usize {
        self.domain
    }

    pub(crate) fn set_domain_number(&mut self, domain: usize) {
        self.domain = domain;
    }

    pub fn global_number(&self) -> Option<usize> {
        self.global_number
    }

    pub fn set_global_number(&mut self, number: Option<usize>) {
        self.global_number = number;
    }

    /// Global number when assigned, local number otherwise
    pub fn label(&self) -> usize {
        self.global_number.unwrap_or(self.number)
    }

    pub fn kind(&self) -> ElementKind {
        self.kind
    }

    pub fn interpolation(&self) -> &'static dyn Interpolation {
        self.kind.interpolation()
    }

    pub fn geometry_type(&self) -> GeometryType {
        self.interpolation().geometry_type()
    }

    pub fn spatial_dimension(&self) -> usize {
        self.interpolation().spatial_dimension()
    }

    pub fn number_of_boundary_sides(&self) -> usize {
        self.interpolation().number_of_boundary_sides()
    }

    /// Measure of the reference element
    pub fn parent_element_size(&self) -> f64 {
        self.interpolation().parent_element_size()
    }

    pub fn material_mode(&self) -> MaterialMode {
        self.kind.material_mode()
    }

    // ---- topology ----

    /// Replace the dof manager list.
    ///
    /// # Errors
    /// `InvalidTopology` when the list is empty, has the wrong length for the
    /// element type, contains number 0, or names a manager twice.
    pub fn set_dof_managers(&mut self, numbers: &[usize]) -> Result<()> {
        let element = self.number;
        let invalid = |reason: String| ElementError::InvalidTopology { element, reason };
        let expected = self.kind.num_nodes();
        if numbers.is_empty() {
            return Err(invalid("empty dof manager list".into()));
        }
        if numbers.len() != expected {
            return Err(invalid(format!(
                "{:?} needs {expected} dof managers, got {}",
                self.kind,
                numbers.len()
            )));
        }
        if numbers.contains(&0) {
            return Err(invalid("dof manager numbers are 1-based".into()));
        }
        for (i, n) in numbers.iter().enumerate() {
            if numbers[..i].contains(n) {
                return Err(invalid(format!("dof manager {n} appears twice")));
            }
        }
        self.dof_managers = numbers.iter().copied().collect();
        Ok(())
    }

    /// Dof manager numbers in local order
    pub fn dof_managers(&self) -> &[usize] {
        &self.dof_managers
    }

    pub fn number_of_dof_managers(&self) -> usize {
        self.dof_managers.len()
    }

    /// Number of geometric nodes of the element type
    pub fn number_of_nodes(&self) -> usize {
        self.kind.num_nodes()
    }

    /// Element-internal dof managers; none for the supported types
    pub fn number_of_internal_dof_managers(&self) -> usize {
        0
    }

    pub fn internal_dof_manager(&self, index: usize) -> Result<&DofManager> {
        Err(ElementError::IndexOutOfRange {
            what: "internal dof manager",
            index,
            len: self.number_of_internal_dof_managers(),
        })
    }

    /// Number of the `index`-th dof manager (1-based)
    pub fn dof_manager_number(&self, index: usize) -> Result<usize> {
        index
            .checked_sub(1)
            .and_then(|i| self.dof_managers.get(i))
            .copied()
            .ok_or(ElementError::IndexOutOfRange {
                what: "dof manager",
                index,
                len: self.dof_managers.len(),
            })
    }

    /// The `index`-th dof manager (1-based)
    pub fn dof_manager<'a>(&self, index: usize, domain: &DomainView<'a>) -> Result<&'a DofManager> {
        let number = self.dof_manager_number(index)?;
        domain
            .dof_manager(number)
            .ok_or(ElementError::MissingComponent {
                element: self.number,
                component: "dof manager",
                number,
            })
    }

    /// The `index`-th dof manager, which must be a node
    pub fn node<'a>(&self, index: usize, domain: &DomainView<'a>) -> Result<&'a DofManager> {
        self.dof_manager_of_kind(index, domain, DofManagerKind::Node)
    }

    /// The `index`-th dof manager, which must be an element side
    pub fn side<'a>(&self, index: usize, domain: &DomainView<'a>) -> Result<&'a DofManager> {
        self.dof_manager_of_kind(index, domain, DofManagerKind::ElementSide)
    }

    fn dof_manager_of_kind<'a>(
        &self,
        index: usize,
        domain: &DomainView<'a>,
        expected: DofManagerKind,
    ) -> Result<&'a DofManager> {
        let manager = self.dof_manager(index, domain)?;
        if manager.kind != expected {
            return Err(ElementError::TypeMismatch {
                element: self.number,
                index,
                expected,
                found: manager.kind,
            });
        }
        Ok(manager)
    }

    /// Coordinates of all nodes in local order
    pub fn node_coordinates(&self, domain: &DomainView<'_>) -> Result<NodeCoordinates> {
        (1..=self.dof_managers.len())
            .map(|i| self.node(i, domain).map(DofManager::coords))
            .collect()
    }

    /// Remap stored dof manager numbers, keeping order and length
    pub fn update_local_numbering(&mut self, renumbering: &dyn EntityRenumbering) {
        for number in self.dof_managers.iter_mut() {
            *number = renumbering.renumber(*number, EntityKind::DofManager);
        }
    }

    // ---- components ----

    pub fn material(&self) -> Option<usize> {
        self.material
    }

    pub fn set_material(&mut self, material: Option<usize>) {
        self.material = material;
    }

    pub fn cross_section(&self) -> Option<usize> {
        self.cross_section
    }

    pub fn set_cross_section(&mut self, cross_section: Option<usize>) {
        self.cross_section = cross_section;
    }

    /// Region the element belongs to (its cross section number, 0 when unset)
    pub fn region_number(&self) -> usize {
        self.cross_section.unwrap_or(0)
    }

    pub fn activity_time_function(&self) -> Option<usize> {
        self.activity_time_function
    }

    pub fn set_activity_time_function(&mut self, function: Option<usize>) {
        self.activity_time_function = function;
    }

    /// Local coordinate system; rows are the local base vectors
    pub fn local_coordinate_system(&self) -> Option<&Matrix3<f64>> {
        self.local_cs.as_ref()
    }

    pub fn set_local_coordinate_system(&mut self, lcs: Option<Matrix3<f64>>) {
        self.local_cs = lcs;
    }

    /// Requested number of integration points
    pub fn nip(&self) -> usize {
        self.nip
    }

    pub fn set_nip(&mut self, nip: usize) {
        self.nip = nip;
    }

    pub(crate) fn material_ref<'a>(&self, domain: &DomainView<'a>) -> Result<&'a dyn Material> {
        let number = self.material.unwrap_or(0);
        domain.material(number).ok_or(ElementError::MissingComponent {
            element: self.number,
            component: "material",
            number,
        })
    }

    pub(crate) fn cross_section_ref<'a>(&self, domain: &DomainView<'a>) -> Result<&'a CrossSection> {
        let number = self.cross_section.unwrap_or(0);
        domain
            .cross_section(number)
            .ok_or(ElementError::MissingComponent {
                element: self.number,
                component: "cross section",
                number,
            })
    }

    // ---- integration rules ----

    pub fn number_of_integration_rules(&self) -> usize {
        self.integration_rules.len()
    }

    pub fn integration_rules(&self) -> &[IntegrationRule] {
        &self.integration_rules
    }

    pub fn integration_rule(&self, index: usize) -> Option<&IntegrationRule> {
        self.integration_rules.get(index)
    }

    /// Replace all rules; the default rule resets to the first one
    pub fn set_integration_rules(&mut self, rules: Vec<IntegrationRule>) {
        self.integration_rules = rules;
        self.default_rule = 0;
    }

    /// Index of the default rule
    pub fn default_integration_rule(&self) -> usize {
        self.default_rule
    }

    pub fn set_default_integration_rule(&mut self, index: usize) -> Result<()> {
        if index >= self.integration_rules.len() {
            return Err(ElementError::IndexOutOfRange {
                what: "integration rule",
                index,
                len: self.integration_rules.len(),
            });
        }
        self.default_rule = index;
        Ok(())
    }

    /// The default rule, `None` for an element without rules
    pub fn default_integration_rule_ref(&self) -> Option<&IntegrationRule> {
        self.integration_rules.get(self.default_rule)
    }

    /// Build the integration rules and allocate point statuses.
    ///
    /// Does nothing when the element already owns rules, so history survives
    /// repeated calls.
    pub fn compute_gauss_points(&mut self, domain: &DomainView<'_>) -> Result<()> {
        if !self.integration_rules.is_empty() {
            return Ok(());
        }
        let material = self.material_ref(domain)?;
        let cross_section = self.cross_section_ref(domain)?;
        let mode = self.material_mode();
        let integration_domain = self.kind.integration_domain();

        let mut rules = Vec::new();
        for (index, nip) in self.kind.rule_sizes(self.nip).into_iter().enumerate() {
            let mut rule = IntegrationRule::gauss(index, integration_domain, nip)?;
            for point in rule.points_mut() {
                point.set_status(cross_section.create_status(material, mode));
            }
            rules.push(rule);
        }
        debug!(
            element = self.number,
            rules = rules.len(),
            nip = self.nip,
            "computed integration points"
        );
        self.set_integration_rules(rules);
        Ok(())
    }

    /// Second-stage initialization, run once every domain component exists
    pub fn post_initialize(&mut self, domain: &DomainView<'_>) -> Result<()> {
        self.compute_gauss_points(domain)
    }

    // ---- lifecycle ----

    /// Check that the referenced components exist and suit the element.
    /// Problems are logged; the return value tells whether there were any.
    pub fn check_consistency(&self, domain: &DomainView<'_>) -> bool {
        let mode = self.material_mode();
        let mut ok = true;

        match self.material_ref(domain) {
            Ok(material) if !material.supports_mode(mode) => {
                warn!(element = self.number, material = material.name(), ?mode, "material does not support element mode");
                ok = false;
            }
            Ok(_) => {}
            Err(err) => {
                warn!(element = self.number, %err, "consistency check failed");
                ok = false;
            }
        }

        match self.cross_section_ref(domain) {
            Ok(cs) if !cs.supports_mode(mode) => {
                warn!(element = self.number, section = ?cs.kind, ?mode, "cross section does not support element mode");
                ok = false;
            }
            Ok(_) => {}
            Err(err) => {
                warn!(element = self.number, %err, "consistency check failed");
                ok = false;
            }
        }

        if self.dof_managers.len() != self.kind.num_nodes() {
            warn!(
                element = self.number,
                expected = self.kind.num_nodes(),
                found = self.dof_managers.len(),
                "wrong number of dof managers"
            );
            ok = false;
        }
        for index in 1..=self.dof_managers.len() {
            if let Err(err) = self.node(index, domain) {
                warn!(element = self.number, %err, "consistency check failed");
                ok = false;
            }
        }

        if let Some(f) = self.activity_time_function
            && domain.time_function(f).is_none()
        {
            warn!(element = self.number, function = f, "activity time function is not defined");
            ok = false;
        }

        ok
    }

    /// Whether the element takes part in `tstep`
    pub fn is_activated(&self, domain: &DomainView<'_>, tstep: &TimeStep) -> bool {
        let Some(number) = self.activity_time_function else {
            return true;
        };
        match domain.time_function(number) {
            Some(f) => f.evaluate(tstep.intrinsic_time) != 0.0,
            None => {
                warn!(element = self.number, function = number, "activity time function is not defined, element kept active");
                true
            }
        }
    }

    /// Prepare every point's status for a new step
    pub fn init_for_new_step(&mut self) {
        for rule in &mut self.integration_rules {
            rule.init_for_new_step();
        }
    }

    /// Commit the converged state of `tstep`
    pub fn update_yourself(&mut self, tstep: &TimeStep) {
        for rule in &mut self.integration_rules {
            rule.update_yourself(tstep);
        }
    }

    // ---- traversal ----

    /// All points, rule by rule
    pub fn integration_points(&self) -> impl Iterator<Item = &IntegrationPoint> {
        self.integration_rules.iter().flat_map(|r| r.points())
    }

    /// Visit every point in (rule, point) order
    pub fn ip_evaluator<F>(&self, mut visit: F)
    where
        F: FnMut(&IntegrationPoint),
    {
        for point in self.integration_points() {
            visit(point);
        }
    }

    /// Mutable variant of [`ElementGeometry::ip_evaluator`] with the same order
    pub fn ip_evaluator_mut<F>(&mut self, mut visit: F)
    where
        F: FnMut(&mut IntegrationPoint),
    {
        for rule in &mut self.integration_rules {
            for point in rule.points_mut() {
                visit(point);
            }
        }
    }

    /// Internal state at point `point` (1-based) of rule `rule`
    pub fn ip_value(&self, rule: usize, point: usize, kind: InternalStateType) -> Option<&[f64]> {
        self.integration_rules
            .get(rule)?
            .integration_point(point)?
            .ip_value(kind)
    }

    // ---- coordinates ----

    /// Physical coordinates of a reference point
    pub fn compute_global_coordinates(&self, domain: &DomainView<'_>, local: &[f64]) -> Result<Vector3<f64>> {
        let nodes = self.node_coordinates(domain)?;
        Ok(self.interpolation().global_coordinates(local, &nodes))
    }

    /// Reference coordinates of a physical point and whether it lies inside
    pub fn compute_local_coordinates(
        &self,
        domain: &DomainView<'_>,
        global: &Vector3<f64>,
    ) -> Result<(LocalCoords, bool)> {
        let nodes = self.node_coordinates(domain)?;
        self.interpolation()
            .local_coordinates(global, &nodes)
            .ok_or(ElementError::SingularMapping {
                element: self.number,
            })
    }

    // ---- partitioning ----

    pub fn parallel_mode(&self) -> ParallelMode {
        self.partition.mode
    }

    pub fn set_parallel_mode(&mut self, mode: ParallelMode) {
        self.partition.mode = mode;
    }

    pub fn partition_list(&self) -> &[usize] {
        &self.partition.partitions
    }

    pub fn set_partition_list(&mut self, partitions: Vec<usize>) {
        self.partition.partitions = partitions;
    }

    pub fn partition_info(&self) -> &PartitionInfo {
        &self.partition
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Domain;
    use crate::dofman::DofManager;
    use crate::material::IsotropicElastic;
    use crate::renumbering::MapRenumbering;
    use crate::time_step::TimeFunction;

    fn triangle_domain() -> Domain {
        let mut domain = Domain::new(1);
        domain.dof_managers.add_node([0.0, 0.0, 0.0]);
        domain.dof_managers.add_node([1.0, 0.0, 0.0]);
        domain.dof_managers.add_node([0.0, 1.0, 0.0]);
        domain.dof_managers.push(DofManager::side(0));
        domain.add_material(Box::new(IsotropicElastic::new("A", 100.0, 0.2)));
        domain.add_cross_section(CrossSection::plate(1.0));
        let mut element = ElementGeometry::new(1, ElementKind::CPS3);
        element.set_dof_managers(&[1, 2, 3]).unwrap();
        element.set_material(Some(1));
        element.set_cross_section(Some(1));
        domain.add_element(element);
        domain
    }

    #[test]
    fn set_dof_managers_validates_the_list() {
        let mut e = ElementGeometry::new(7, ElementKind::CPS3);
        assert!(matches!(
            e.set_dof_managers(&[]),
            Err(ElementError::InvalidTopology { element: 7, .. })
        ));
        assert!(e.set_dof_managers(&[1, 2]).is_err());
        assert!(e.set_dof_managers(&[1, 2, 1]).is_err());
        assert!(e.set_dof_managers(&[0, 1, 2]).is_err());
        e.set_dof_managers(&[3, 1, 2]).unwrap();
        assert_eq!(e.dof_managers(), &[3, 1, 2]);
    }

    #[test]
    fn lookups_are_one_based_and_typed() {
        let mut domain = triangle_domain();
        let view = domain.view();
        let e = &domain.elements[0];
        assert_eq!(e.node(2, &view).unwrap().coordinates, [1.0, 0.0, 0.0]);
        assert!(matches!(
            e.dof_manager_number(0),
            Err(ElementError::IndexOutOfRange { index: 0, len: 3, .. })
        ));
        assert!(matches!(e.node(4, &view), Err(ElementError::IndexOutOfRange { .. })));
        assert!(matches!(e.side(1, &view), Err(ElementError::TypeMismatch { index: 1, .. })));
        assert!(e.internal_dof_manager(1).is_err());

        domain.elements[0].dof_managers[2] = 4;
        let view = domain.view();
        let e = &domain.elements[0];
        assert!(e.side(3, &view).is_ok());
        assert!(matches!(
            e.node(3, &view),
            Err(ElementError::TypeMismatch {
                expected: DofManagerKind::Node,
                found: DofManagerKind::ElementSide,
                ..
            })
        ));
    }

    #[test]
    fn compute_gauss_points_is_idempotent() {
        let mut domain = triangle_domain();
        let (view, elements) = domain.split_mut();
        let e = &mut elements[0];
        assert!(e.default_integration_rule_ref().is_none());
        e.compute_gauss_points(&view).unwrap();
        assert_eq!(e.number_of_integration_rules(), e.integration_rules().len());

        e.ip_evaluator_mut(|p| {
            if let Some(s) = p.status_mut() {
                s.set_temp_value(InternalStateType::StressTensor, &[1.0, 2.0, 3.0]);
            }
        });
        e.set_nip(3);
        e.compute_gauss_points(&view).unwrap();
        assert_eq!(e.integration_points().count(), 1);
        assert_eq!(
            e.ip_value(0, 1, InternalStateType::StressTensor),
            Some(&[1.0, 2.0, 3.0][..])
        );
    }

    #[test]
    fn missing_material_blocks_rule_construction() {
        let mut domain = triangle_domain();
        domain.elements[0].set_material(Some(9));
        let (view, elements) = domain.split_mut();
        let err = elements[0].compute_gauss_points(&view).unwrap_err();
        assert_eq!(
            err,
            ElementError::MissingComponent {
                element: 1,
                component: "material",
                number: 9
            }
        );
        assert_eq!(elements[0].number_of_integration_rules(), 0);
    }

    #[test]
    fn consistency_requires_matching_section() {
        let mut domain = triangle_domain();
        assert!(domain.elements[0].check_consistency(&domain.view()));
        domain.cross_sections[0] = CrossSection::solid();
        assert!(!domain.elements[0].check_consistency(&domain.view()));
    }

    #[test]
    fn activity_follows_time_function() {
        let mut domain = triangle_domain();
        let f = domain.add_time_function(TimeFunction::Window {
            start: 1.0,
            end: 2.0,
        });
        domain.elements[0].set_activity_time_function(Some(f));
        let view = domain.view();
        let e = &domain.elements[0];
        assert!(!e.is_activated(&view, &TimeStep::new(1, 0.5, 0.5)));
        assert!(e.is_activated(&view, &TimeStep::new(2, 1.5, 1.0)));
    }

    #[test]
    fn local_numbering_keeps_order() {
        let mut e = ElementGeometry::new(1, ElementKind::CPS3);
        e.set_dof_managers(&[1, 2, 3]).unwrap();
        e.update_local_numbering(&MapRenumbering::new());
        assert_eq!(e.dof_managers(), &[1, 2, 3]);
        e.update_local_numbering(&MapRenumbering::new().dof_manager(1, 3).dof_manager(3, 1));
        assert_eq!(e.dof_managers(), &[3, 2, 1]);
    }

    #[test]
    fn label_prefers_global_number() {
        let mut e = ElementGeometry::new(4, ElementKind::T3D2);
        assert_eq!(e.label(), 4);
        e.set_global_number(Some(40));
        assert_eq!(e.label(), 40);
    }
}
