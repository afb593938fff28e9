//! Element geometry core of a finite element solver.
//!
//! This crate holds the geometric and bookkeeping part of finite elements:
//! node connectivity, interpolation, integration rules with per-point
//! material history, partition synchronization of shared elements, and
//! history transfer between meshes during adaptive remeshing.

pub mod adaptive;
pub mod cross_section;
pub mod domain;
pub mod dofman;
pub mod element;
pub mod error;
pub mod integration;
pub mod interpolation;
pub mod material;
pub mod parallel;
pub mod renumbering;
pub mod time_step;

pub use adaptive::{
    ElementLocator, MapOutcome, MappingFailureReason, MappingFailureRecord, MappingMethod,
    SourceMesh, StateTransferEngine, TransferOptions, TransferReport,
};
pub use cross_section::{CrossSection, SectionKind};
pub use dofman::{DofManager, DofManagerArena, DofManagerKind};
pub use domain::{Domain, DomainStatistics, DomainView};
pub use element::{ElementGeometry, ElementKind, ElementRecord, NodeCoordinates};
pub use error::{ElementError, Result};
pub use integration::{IntegrationDomain, IntegrationPoint, IntegrationRule, LocalCoords};
pub use interpolation::{GeometryType, Interpolation};
pub use material::{
    DamageParameters, HistoryStatus, InternalStateType, IsotropicElastic, Material, MaterialMode,
    MaterialStatus, NonlocalScalarDamage, ScalarDamage, StateHistory,
};
pub use parallel::{
    ExchangeSummary, MemoryChannel, PackBuffer, ParallelMode, PartitionContext, PartitionInfo,
    SyncChannel, UnpackBuffer,
};
pub use renumbering::{EntityKind, EntityRenumbering, MapRenumbering};
pub use time_step::{TimeFunction, TimeStep};
