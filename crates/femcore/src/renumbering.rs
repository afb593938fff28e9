//! Entity renumbering support.
//!
//! Load balancing and mesh adaptation renumber nodes and elements. Components
//! that store numbers of other entities are updated through an
//! [`EntityRenumbering`] that maps an old number to the new one.

use std::collections::HashMap;

/// Kind of entity being renumbered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    DofManager,
    Element,
}

/// Old number → new number mapping
pub trait EntityRenumbering {
    fn renumber(&self, number: usize, kind: EntityKind) -> usize;
}

impl<F> EntityRenumbering for F
where
    F: Fn(usize, EntityKind) -> usize,
{
    fn renumber(&self, number: usize, kind: EntityKind) -> usize {
        self(number, kind)
    }
}

/// Table-driven renumbering; numbers without an entry keep their value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MapRenumbering {
    dof_managers: HashMap<usize, usize>,
    elements: HashMap<usize, usize>,
}

impl MapRenumbering {
    pub fn new() -> Self {
        Self::default()
    }

    /// Map dof manager `old` to `new`
    pub fn dof_manager(mut self, old: usize, new: usize) -> Self {
        self.dof_managers.insert(old, new);
        self
    }

    /// Map element `old` to `new`
    pub fn element(mut self, old: usize, new: usize) -> Self {
        self.elements.insert(old, new);
        self
    }
}

impl EntityRenumbering for MapRenumbering {
    fn renumber(&self, number: usize, kind: EntityKind) -> usize {
        let table = match kind {
            EntityKind::DofManager => &self.dof_managers,
            EntityKind::Element => &self.elements,
        };
        table.get(&number).copied().unwrap_or(number)
    }
}
