//! Partitioned-mesh support.
//!
//! Elements on partition boundaries exist on several partitions. Exactly one
//! copy is [`ParallelMode::Local`]; the others are read-only
//! [`ParallelMode::Remote`] mirrors that receive state through a
//! [`SyncChannel`].

pub mod channel;
pub mod exchange;
pub mod partition;

pub use channel::{MemoryChannel, PackBuffer, SyncChannel, UnpackBuffer};
pub use exchange::ExchangeSummary;
pub use partition::{ParallelMode, PartitionContext, PartitionInfo};
