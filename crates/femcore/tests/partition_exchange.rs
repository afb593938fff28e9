//! Synchronization of shared elements between two partitions

use approx::assert_relative_eq;
use femcore::{
    CrossSection, DamageParameters, Domain, ElementError, ElementGeometry, ElementKind,
    InternalStateType, IsotropicElastic, MemoryChannel, NonlocalScalarDamage, PackBuffer,
    ParallelMode, PartitionContext, SyncChannel, TimeStep,
};

/// Partition `rank` of a two-partition strip of three quads. Element 2 is
/// owned by partition 0 and mirrored on partition 1.
fn partition(rank: usize) -> Domain {
    let mut domain = Domain::with_partition(1, PartitionContext::new(rank, 2).unwrap());
    for i in 0..4 {
        domain.dof_managers.add_node([i as f64, 0.0, 0.0]);
        domain.dof_managers.add_node([i as f64, 1.0, 0.0]);
    }
    domain.add_material(Box::new(NonlocalScalarDamage::new(
        IsotropicElastic::new("concrete", 30.0e3, 0.2),
        DamageParameters {
            onset_strain: 1.0e-4,
            failure_strain: 1.0e-3,
        },
        1.5,
    )));
    domain.add_cross_section(CrossSection::plate(0.1));
    for i in 0..3 {
        let a = 2 * i + 1;
        let mut e = ElementGeometry::new(0, ElementKind::CPS4);
        e.set_dof_managers(&[a, a + 2, a + 3, a + 1]).unwrap();
        e.set_material(Some(1));
        e.set_cross_section(Some(1));
        e.set_global_number(Some(100 + i));
        if i == 1 {
            let mode = if rank == 0 { ParallelMode::Local } else { ParallelMode::Remote };
            e.set_parallel_mode(mode);
            e.set_partition_list(vec![1 - rank]);
        }
        domain.add_element(e);
    }
    domain.check_consistency().unwrap();
    domain.post_initialize().unwrap();
    domain
}

fn local_strains(domain: &Domain, element: usize) -> Vec<f64> {
    domain.elements[element - 1]
        .integration_points()
        .map(|p| p.ip_value(InternalStateType::LocalEquivalentStrain).unwrap()[0])
        .collect()
}

#[test]
fn pack_then_unpack_reproduces_exchanged_state() {
    let mut owner = partition(0);
    let mut mirror = partition(1);
    let tstep = TimeStep::new(3, 3.0, 1.0);

    let mut k = 0.0;
    owner.ip_evaluator_mut(&tstep, |_, p| {
        k += 1.0;
        if let Some(s) = p.status_mut() {
            s.set_temp_value(InternalStateType::LocalEquivalentStrain, &[k * 1.0e-5]);
        }
    });

    let mut channel = MemoryChannel::new();
    let packed = owner.pack_shared_elements(&mut channel, &tstep).unwrap();
    assert_eq!(packed.elements, 1);
    let unpacked = mirror.unpack_remote_elements(&mut channel, &tstep).unwrap();
    assert_eq!(unpacked.elements, 1);
    assert_eq!(channel.pending_frames(), 0);

    assert_eq!(local_strains(&owner, 2), local_strains(&mirror, 2));
    for (a, b) in owner.elements[1]
        .integration_points()
        .zip(mirror.elements[1].integration_points())
    {
        for kind in [InternalStateType::LocalEquivalentStrain] {
            assert_eq!(a.ip_value(kind), b.ip_value(kind));
        }
    }
    // unshared elements are not touched
    assert!(local_strains(&mirror, 1).iter().all(|v| *v == 0.0));
}

#[test]
fn exchange_survives_serialized_channel() {
    let mut owner = partition(0);
    let mut mirror = partition(1);
    let tstep = TimeStep::new(1, 1.0, 1.0);
    owner.elements[1].ip_evaluator_mut(|p| {
        if let Some(s) = p.status_mut() {
            s.set_temp_value(InternalStateType::LocalEquivalentStrain, &[4.2e-4]);
        }
    });

    let mut outgoing = MemoryChannel::new();
    owner.pack_shared_elements(&mut outgoing, &tstep).unwrap();
    let bytes = outgoing.into_bytes();
    let mut incoming = MemoryChannel::from_bytes(bytes).unwrap();
    mirror.unpack_remote_elements(&mut incoming, &tstep).unwrap();
    for v in local_strains(&mirror, 2) {
        assert_relative_eq!(v, 4.2e-4);
    }
}

#[test]
fn estimate_bounds_packed_size() {
    let owner = partition(0);
    let mut channel = MemoryChannel::new();
    let view = owner.view();
    let estimate = owner.elements[1].estimate_pack_size(&view, &channel).unwrap();
    owner.elements[1]
        .pack_unknowns(&view, &mut channel, &TimeStep::new(1, 1.0, 1.0))
        .unwrap();
    assert!(channel.into_bytes().len() <= estimate);
}

#[test]
fn frame_length_mismatch_is_a_desync() {
    let mut mirror = partition(1);
    let mut channel = MemoryChannel::new();
    // one slice short of the five points of a CPS4
    let mut buffer = PackBuffer::new();
    for _ in 0..4 {
        buffer.put_slice(&[1.0e-4]);
    }
    channel.write_frame(1, buffer.freeze()).unwrap();
    let err = mirror
        .unpack_remote_elements(&mut channel, &TimeStep::new(1, 1.0, 1.0))
        .unwrap_err();
    assert!(matches!(err, ElementError::Desync { element: 2, .. }));
    assert_eq!(local_strains(&mirror, 2), vec![0.0; 5]);
}

#[test]
fn oversized_value_leaves_mirror_untouched() {
    let mut mirror = partition(1);
    let mut channel = MemoryChannel::new();
    let mut buffer = PackBuffer::new();
    for _ in 0..4 {
        buffer.put_slice(&[1.0e-4]);
    }
    buffer.put_slice(&[1.0e-4, 2.0e-4]);
    channel.write_frame(1, buffer.freeze()).unwrap();
    let err = mirror
        .unpack_remote_elements(&mut channel, &TimeStep::new(1, 1.0, 1.0))
        .unwrap_err();
    assert!(matches!(err, ElementError::Desync { element: 2, .. }));
    assert_eq!(local_strains(&mirror, 2), vec![0.0; 5]);
}

#[test]
fn unpack_into_local_element_is_rejected() {
    let mut owner = partition(0);
    let mut channel = MemoryChannel::new();
    let tstep = TimeStep::new(1, 1.0, 1.0);
    owner.pack_shared_elements(&mut channel, &tstep).unwrap();
    let (view, elements) = owner.split_mut();
    let err = elements[1]
        .unpack_and_update_unknowns(&view, &mut channel, &tstep)
        .unwrap_err();
    assert!(matches!(
        err,
        ElementError::ParallelMode {
            expected: ParallelMode::Remote,
            found: ParallelMode::Local,
            ..
        }
    ));
}

#[test]
fn partition_tags_are_checked() {
    let mut domain = partition(0);
    domain.elements[1].set_partition_list(vec![5]);
    assert!(domain.check_consistency().is_err());
}
