//! State transfer between meshes during adaptive remeshing.

pub mod engine;
pub mod locator;
pub mod mapper;

pub use engine::{StateTransferEngine, TransferReport};
pub use locator::{ElementLocator, Location};
pub use mapper::{
    MapOutcome, MappingFailureReason, MappingFailureRecord, MappingMethod, SourceMesh,
    TransferOptions,
};
