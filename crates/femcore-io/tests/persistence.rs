//! Domain records and contexts written to and read from disk

use std::fs;

use femcore::{
    CrossSection, ElementKind, ElementRecord, InternalStateType, IsotropicElastic, ParallelMode,
    PartitionContext, TimeStep,
};
use femcore_io::{
    DofManagerRecord, DomainContext, DomainRecord, IoError, MaterialRecord, load_domain,
    restore_context, save_context,
};
use tempfile::tempdir;

fn quad_record() -> DomainRecord {
    let mut element = ElementRecord::new(1, ElementKind::CPS4, vec![1, 2, 3, 4]);
    element.material = Some(1);
    element.cross_section = Some(1);
    element.global_number = Some(40);
    element.partitions = vec![1];
    element.parallel_mode = ParallelMode::Local;
    DomainRecord {
        number: 3,
        partition: Some(PartitionContext { rank: 0, size: 2 }),
        dof_managers: vec![
            DofManagerRecord::node(1, [0.0, 0.0, 0.0]),
            DofManagerRecord::node(2, [2.0, 0.0, 0.0]),
            DofManagerRecord::node(3, [2.0, 1.0, 0.0]),
            DofManagerRecord::node(4, [0.0, 1.0, 0.0]),
        ],
        materials: vec![MaterialRecord::Elastic(IsotropicElastic::new("steel", 210.0e3, 0.3))],
        cross_sections: vec![CrossSection::plate(0.01)],
        time_functions: Vec::new(),
        elements: vec![element],
    }
}

#[test]
fn domain_record_loads_from_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("domain.json");
    fs::write(&path, serde_json::to_vec_pretty(&quad_record()).unwrap()).unwrap();

    let domain = load_domain(&path).unwrap();
    assert_eq!(domain.number, 3);
    let e = &domain.elements[0];
    assert_eq!(e.label(), 40);
    assert_eq!(e.partition_list(), &[1]);
    // CPS4 default: 2x2 rule plus a one-point reduced rule
    assert_eq!(e.number_of_integration_rules(), 2);
    assert_eq!(e.integration_points().count(), 5);
    approx::assert_relative_eq!(e.compute_area(&domain.view()).unwrap(), 2.0, epsilon = 1e-12);
}

#[test]
fn missing_file_is_an_io_error() {
    let dir = tempdir().unwrap();
    let err = load_domain(dir.path().join("missing.json")).unwrap_err();
    assert!(matches!(err, IoError::Io(_)));
}

#[test]
fn malformed_json_is_a_json_error() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("bad.json");
    fs::write(&path, "{\"elements\": [").unwrap();
    assert!(matches!(load_domain(&path).unwrap_err(), IoError::Json(_)));
}

#[test]
fn context_round_trips_through_disk() {
    let mut domain = quad_record().build().unwrap();
    let tstep = TimeStep::new(7, 3.5, 0.5);
    let mut value = 0.0;
    domain.ip_evaluator_mut(&tstep, |_, p| {
        value += 1.0;
        if let Some(s) = p.status_mut() {
            s.set_temp_value(InternalStateType::StressTensor, &[value, -value, 0.5 * value]);
        }
    });
    domain.update_yourself(&tstep);

    let dir = tempdir().unwrap();
    let path = dir.path().join("ctx").join("step7.json");
    let context = DomainContext::capture(&domain, &tstep);
    save_context(&path, &context).unwrap();
    let loaded = restore_context(&path).unwrap();
    assert_eq!(loaded, context);
    assert_eq!(loaded.step.number, 7);

    let mut fresh = quad_record().build().unwrap();
    loaded.apply(&mut fresh).unwrap();
    for (a, b) in domain.elements[0]
        .integration_points()
        .zip(fresh.elements[0].integration_points())
    {
        assert_eq!(a.history(), b.history());
        assert_eq!(
            a.ip_value(InternalStateType::StressTensor),
            b.ip_value(InternalStateType::StressTensor)
        );
    }
}

#[test]
fn unknown_schema_version_is_rejected() {
    let domain = quad_record().build().unwrap();
    let mut context = DomainContext::capture(&domain, &TimeStep::new(1, 1.0, 1.0));
    context.schema_version = 99;
    let dir = tempdir().unwrap();
    let path = dir.path().join("ctx.json");
    save_context(&path, &context).unwrap();
    assert!(matches!(
        restore_context(&path).unwrap_err(),
        IoError::UnsupportedSchema { found: 99, expected: 1 }
    ));
}
