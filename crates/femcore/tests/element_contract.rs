//! Element behaviour across a domain: traversal order, step lifecycle,
//! coordinate mapping, renumbering and size queries

use approx::assert_relative_eq;
use femcore::{
    CrossSection, DamageParameters, Domain, ElementGeometry, ElementKind, EntityKind,
    InternalStateType, IsotropicElastic, MapRenumbering, ScalarDamage, StateHistory, TimeFunction, TimeStep,
};
use nalgebra::Vector3;

fn damage() -> Box<ScalarDamage> {
    Box::new(ScalarDamage::new(
        IsotropicElastic::new("concrete", 30.0e3, 0.2),
        DamageParameters {
            onset_strain: 1.0e-4,
            failure_strain: 1.0e-3,
        },
    ))
}

/// Two quads side by side and a triangle on top, all plane stress
fn mixed_domain() -> Domain {
    let mut domain = Domain::new(1);
    for c in [
        [0.0, 0.0, 0.0],
        [1.0, 0.0, 0.0],
        [2.0, 0.0, 0.0],
        [0.0, 1.0, 0.0],
        [1.0, 1.0, 0.0],
        [2.0, 1.0, 0.0],
        [1.0, 2.0, 0.0],
    ] {
        domain.dof_managers.add_node(c);
    }
    domain.add_material(damage());
    domain.add_cross_section(CrossSection::plate(0.2));

    for (kind, nodes) in [
        (ElementKind::CPS4, vec![1, 2, 5, 4]),
        (ElementKind::CPS4, vec![2, 3, 6, 5]),
        (ElementKind::CPS3, vec![4, 5, 7]),
    ] {
        let mut e = ElementGeometry::new(0, kind);
        e.set_dof_managers(&nodes).unwrap();
        e.set_material(Some(1));
        e.set_cross_section(Some(1));
        domain.add_element(e);
    }
    domain.check_consistency().unwrap();
    domain.post_initialize().unwrap();
    domain
}

#[test]
fn rule_count_matches_owned_rules() {
    let domain = mixed_domain();
    for e in &domain.elements {
        assert_eq!(e.number_of_integration_rules(), e.integration_rules().len());
    }
    let mut bare = ElementGeometry::new(9, ElementKind::C3D8);
    assert_eq!(bare.number_of_integration_rules(), 0);
    bare.set_integration_rules(Vec::new());
    assert_eq!(bare.number_of_integration_rules(), bare.integration_rules().len());
}

#[test]
fn traversal_order_is_stable() {
    let domain = mixed_domain();
    let tstep = TimeStep::new(1, 1.0, 1.0);
    let collect = || {
        let mut visited = Vec::new();
        domain.ip_evaluator(&tstep, |e, p| visited.push((e.number(), p.rule_index(), p.number())));
        visited
    };
    let first = collect();
    assert_eq!(first, collect());
    // 4 + 1 points per quad, 1 for the triangle
    assert_eq!(first.len(), 11);
    assert_eq!(first[0], (1, 0, 1));
    assert_eq!(first[4], (1, 1, 1));
    assert_eq!(first[10], (3, 0, 1));
    let mut sorted = first.clone();
    sorted.sort();
    assert_eq!(sorted, first);
}

#[test]
fn empty_step_keeps_equilibrium_state() {
    let mut domain = mixed_domain();
    let tstep = TimeStep::new(1, 1.0, 1.0);
    domain.ip_evaluator_mut(&tstep, |n, p| {
        if let Some(s) = p.status_mut() {
            s.set_temp_value(InternalStateType::DamageScalar, &[0.1 * n as f64]);
        }
    });
    domain.update_yourself(&tstep);
    let before: Vec<StateHistory> = domain.elements.iter().flat_map(|e| e.integration_points()).map(|p| p.history()).collect();

    domain.init_for_new_step();
    domain.update_yourself(&tstep.next());
    let after: Vec<StateHistory> = domain.elements.iter().flat_map(|e| e.integration_points()).map(|p| p.history()).collect();
    assert_eq!(before, after);
}

#[test]
fn local_global_round_trip() {
    let domain = mixed_domain();
    let view = domain.view();
    let quad = &domain.elements[1];

    let x = Vector3::new(1.3, 0.8, 0.0);
    let (local, inside) = quad.compute_local_coordinates(&view, &x).unwrap();
    assert!(inside);
    let back = quad.compute_global_coordinates(&view, &local).unwrap();
    assert_relative_eq!(back, x, epsilon = 1e-10);

    let outside = Vector3::new(2.5, 0.5, 0.0);
    let (local, inside) = quad.compute_local_coordinates(&view, &outside).unwrap();
    assert!(!inside);
    assert_relative_eq!(local[0], 2.0, epsilon = 1e-10);
    let back = quad.compute_global_coordinates(&view, &local).unwrap();
    assert_relative_eq!(back, outside, epsilon = 1e-10);
}

#[test]
fn local_numbering_follows_renumbering() {
    let mut e = ElementGeometry::new(1, ElementKind::CPS4);
    e.set_dof_managers(&[4, 7, 9, 2]).unwrap();

    e.update_local_numbering(&|n: usize, _: EntityKind| n);
    assert_eq!(e.dof_managers(), &[4, 7, 9, 2]);

    let swap = MapRenumbering::new().dof_manager(4, 2).dof_manager(2, 4).dof_manager(9, 1);
    e.update_local_numbering(&swap);
    assert_eq!(e.dof_managers(), &[2, 7, 1, 4]);
}

#[test]
fn domain_renumbering_reorders_elements() {
    let mut domain = mixed_domain();
    let reverse = |n: usize, kind: EntityKind| match kind {
        EntityKind::DofManager => 8 - n,
        EntityKind::Element => 4 - n,
    };
    domain.renumber(&reverse).unwrap();
    assert_eq!(domain.elements[0].kind(), ElementKind::CPS3);
    assert_eq!(domain.elements[0].number(), 1);
    assert_eq!(domain.elements[0].dof_managers(), &[4, 3, 1]);
    let x = domain.elements[0].node(3, &domain.view()).unwrap().coords();
    assert_relative_eq!(x, Vector3::new(1.0, 2.0, 0.0));
}

#[test]
fn unit_right_triangle_area() {
    let mut domain = Domain::new(1);
    domain.dof_managers.add_node([0.0, 0.0, 0.0]);
    domain.dof_managers.add_node([1.0, 0.0, 0.0]);
    domain.dof_managers.add_node([0.0, 1.0, 0.0]);
    domain.add_material(Box::new(IsotropicElastic::new("A", 1.0, 0.0)));
    domain.add_cross_section(CrossSection::plate(1.0));
    let mut e = ElementGeometry::new(0, ElementKind::CPS3);
    e.set_dof_managers(&[1, 2, 3]).unwrap();
    e.set_material(Some(1));
    e.set_cross_section(Some(1));
    e.set_nip(3);
    domain.add_element(e);
    domain.post_initialize().unwrap();

    let e = &domain.elements[0];
    assert_eq!(e.number_of_integration_rules(), 1);
    assert_eq!(e.integration_rule(0).unwrap().number_of_integration_points(), 3);
    assert_relative_eq!(e.compute_area(&domain.view()).unwrap(), 0.5, epsilon = 1e-14);
}

#[test]
fn inactive_element_is_skipped_by_traversal() {
    let mut domain = mixed_domain();
    let f = domain.add_time_function(TimeFunction::Heaviside {
        origin: 2.0,
        value: 1.0,
    });
    domain.elements[2].set_activity_time_function(Some(f));

    let early = TimeStep::new(1, 1.0, 1.0);
    assert!(!domain.elements[2].is_activated(&domain.view(), &early));
    let mut visited = Vec::new();
    domain.ip_evaluator(&early, |e, _| visited.push(e.number()));
    assert!(!visited.contains(&3));
    assert_eq!(visited.len(), 10);

    let late = TimeStep::new(2, 2.0, 1.0);
    assert!(domain.elements[2].is_activated(&domain.view(), &late));
    assert_eq!(domain.active_elements(&late).count(), 3);
}

/// Starting a step resets the temporary state of inactive elements too.
#[test]
fn init_for_new_step_is_not_gated_by_activity() {
    let mut domain = mixed_domain();
    let f = domain.add_time_function(TimeFunction::Constant { value: 0.0 });
    domain.elements[2].set_activity_time_function(Some(f));
    let tstep = TimeStep::new(1, 1.0, 1.0);
    assert!(!domain.elements[2].is_activated(&domain.view(), &tstep));

    domain.elements[2].ip_evaluator_mut(|p| {
        if let Some(s) = p.status_mut() {
            s.set_temp_value(InternalStateType::DamageScalar, &[0.7]);
        }
    });
    domain.init_for_new_step();
    assert_eq!(
        domain.elements[2].ip_value(0, 1, InternalStateType::DamageScalar),
        Some(&[0.0][..])
    );
}

#[test]
fn statistics_summarize_domain() {
    let domain = mixed_domain();
    let stats = domain.statistics();
    assert_eq!(stats.num_elements, 3);
    assert_eq!(stats.num_dof_managers, 7);
    assert_eq!(stats.num_integration_points, 11);
    assert!(stats.format().contains("CPS4"));
}
