//! Dof managers and the domain-owned arena that stores them.
//!
//! Elements never own their nodes. They keep 1-based dof manager numbers
//! that index into a [`DofManagerArena`].

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::error::{ElementError, Result};
use crate::renumbering::{EntityKind, EntityRenumbering};

/// Kind of entity owning degrees of freedom
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DofManagerKind {
    /// Mesh node with coordinates
    Node,
    /// Element side carrying side-based unknowns
    ElementSide,
    /// Element-internal manager (bubble unknowns, Lagrange multipliers)
    Internal,
}

/// A node, side or internal dof manager
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DofManager {
    /// Local number (1-based, equal to the arena slot + 1)
    pub number: usize,
    /// Globally unique number in partitioned runs
    pub global_number: Option<usize>,
    pub kind: DofManagerKind,
    /// Coordinates; zero for managers without a position
    pub coordinates: [f64; 3],
}

impl DofManager {
    /// Create a node
    pub fn node(number: usize, coordinates: [f64; 3]) -> Self {
        Self {
            number,
            global_number: None,
            kind: DofManagerKind::Node,
            coordinates,
        }
    }

    /// Create an element side
    pub fn side(number: usize) -> Self {
        Self {
            number,
            global_number: None,
            kind: DofManagerKind::ElementSide,
            coordinates: [0.0; 3],
        }
    }

    /// Create an internal dof manager
    pub fn internal(number: usize) -> Self {
        Self {
            number,
            global_number: None,
            kind: DofManagerKind::Internal,
            coordinates: [0.0; 3],
        }
    }

    /// Coordinates as a vector
    pub fn coords(&self) -> Vector3<f64> {
        Vector3::from(self.coordinates)
    }
}

/// Arena of dof managers indexed by local number
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DofManagerArena {
    managers: Vec<DofManager>,
}

impl DofManagerArena {
    /// Create an empty arena
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a manager and return its local number. The stored number is
    /// overwritten to match the slot.
    pub fn push(&mut self, mut manager: DofManager) -> usize {
        manager.number = self.managers.len() + 1;
        let number = manager.number;
        self.managers.push(manager);
        number
    }

    /// Append a node at the given coordinates
    pub fn add_node(&mut self, coordinates: [f64; 3]) -> usize {
        self.push(DofManager::node(0, coordinates))
    }

    /// Get a manager by 1-based number
    pub fn get(&self, number: usize) -> Option<&DofManager> {
        number.checked_sub(1).and_then(|i| self.managers.get(i))
    }

    pub fn len(&self) -> usize {
        self.managers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.managers.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DofManager> {
        self.managers.iter()
    }

    /// Apply a renumbering. The mapping must be a permutation of `1..=len`.
    pub fn renumber(&mut self, f: &dyn EntityRenumbering) -> Result<()> {
        let n = self.managers.len();
        // order[new - 1] = old slot
        let mut order = vec![usize::MAX; n];
        for (slot, manager) in self.managers.iter().enumerate() {
            let new = f.renumber(manager.number, EntityKind::DofManager);
            if new == 0 || new > n {
                return Err(ElementError::InvalidRenumbering(format!(
                    "dof manager {} mapped to {} outside 1..={}",
                    manager.number, new, n
                )));
            }
            if order[new - 1] != usize::MAX {
                return Err(ElementError::InvalidRenumbering(format!(
                    "dof manager number {new} assigned twice"
                )));
            }
            order[new - 1] = slot;
        }

        let mut old: Vec<Option<DofManager>> = self.managers.drain(..).map(Some).collect();
        self.managers = order
            .into_iter()
            .zip(1..)
            .filter_map(|(slot, number)| old[slot].take().map(|m| DofManager { number, ..m }))
            .collect();
        Ok(())
    }
}

impl FromIterator<DofManager> for DofManagerArena {
    fn from_iter<I: IntoIterator<Item = DofManager>>(iter: I) -> Self {
        let mut arena = Self::new();
        for manager in iter {
            arena.push(manager);
        }
        arena
    }
}
