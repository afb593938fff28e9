use serde::{Deserialize, Serialize};

use crate::error::{ElementError, Result};

/// Whether an element is authoritative on this partition
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParallelMode {
    /// Owned here; state is computed locally
    #[default]
    Local,
    /// Mirror of an element owned elsewhere; state is received
    Remote,
}

/// Per-element partition tag
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartitionInfo {
    pub mode: ParallelMode,
    /// Partitions sharing the element (indices into the partition table)
    pub partitions: Vec<usize>,
}

impl PartitionInfo {
    pub fn local() -> Self {
        Self::default()
    }

    pub fn remote(partitions: Vec<usize>) -> Self {
        Self {
            mode: ParallelMode::Remote,
            partitions,
        }
    }

    /// Shared with at least one other partition
    pub fn is_shared(&self) -> bool {
        !self.partitions.is_empty()
    }
}

/// The partition table a domain lives in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartitionContext {
    /// This partition's rank
    pub rank: usize,
    /// Number of partitions
    pub size: usize,
}

impl Default for PartitionContext {
    fn default() -> Self {
        Self::serial()
    }
}

impl PartitionContext {
    pub fn new(rank: usize, size: usize) -> Result<Self> {
        if rank >= size {
            return Err(ElementError::IndexOutOfRange {
                what: "partition rank",
                index: rank,
                len: size,
            });
        }
        Ok(Self { rank, size })
    }

    /// Single-partition run
    pub fn serial() -> Self {
        Self { rank: 0, size: 1 }
    }

    pub fn is_parallel(&self) -> bool {
        self.size > 1
    }

    /// Check that every entry of `partitions` names a partition of this table
    pub fn validate(&self, partitions: &[usize]) -> Result<()> {
        match partitions.iter().find(|p| **p >= self.size) {
            Some(p) => Err(ElementError::IndexOutOfRange {
                what: "partition",
                index: *p,
                len: self.size,
            }),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_validates_partition_ids() {
        let ctx = PartitionContext::new(1, 3).unwrap();
        assert!(ctx.is_parallel());
        assert!(ctx.validate(&[0, 2]).is_ok());
        assert!(ctx.validate(&[3]).is_err());
        assert!(PartitionContext::new(3, 3).is_err());
        assert!(!PartitionContext::serial().is_parallel());
    }

    #[test]
    fn default_tag_is_local_and_unshared() {
        let info = PartitionInfo::default();
        assert_eq!(info.mode, ParallelMode::Local);
        assert!(!info.is_shared());
        assert!(PartitionInfo::remote(vec![0]).is_shared());
    }
}
