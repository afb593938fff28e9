//! JSON domain records.

use std::fs;
use std::path::Path;

use femcore::{
    CrossSection, DofManager, DofManagerKind, Domain, ElementGeometry, ElementRecord,
    IsotropicElastic, Material, NonlocalScalarDamage, PartitionContext, ScalarDamage,
    TimeFunction,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{IoError, Result};

fn default_domain_number() -> usize {
    1
}

fn default_kind() -> DofManagerKind {
    DofManagerKind::Node
}

/// One node, side or internal dof manager
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DofManagerRecord {
    pub number: usize,
    #[serde(default = "default_kind")]
    pub kind: DofManagerKind,
    #[serde(default)]
    pub coordinates: [f64; 3],
    #[serde(default)]
    pub global_number: Option<usize>,
}

impl DofManagerRecord {
    pub fn node(number: usize, coordinates: [f64; 3]) -> Self {
        Self {
            number,
            kind: DofManagerKind::Node,
            coordinates,
            global_number: None,
        }
    }

    fn to_dof_manager(&self) -> DofManager {
        let mut manager = match self.kind {
            DofManagerKind::Node => DofManager::node(self.number, self.coordinates),
            DofManagerKind::ElementSide => DofManager::side(self.number),
            DofManagerKind::Internal => DofManager::internal(self.number),
        };
        manager.global_number = self.global_number;
        manager
    }
}

/// Material models known to the loader
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MaterialRecord {
    Elastic(IsotropicElastic),
    ScalarDamage(ScalarDamage),
    NonlocalScalarDamage(NonlocalScalarDamage),
}

impl MaterialRecord {
    pub fn into_material(self) -> Box<dyn Material> {
        match self {
            MaterialRecord::Elastic(m) => Box::new(m),
            MaterialRecord::ScalarDamage(m) => Box::new(m),
            MaterialRecord::NonlocalScalarDamage(m) => Box::new(m),
        }
    }
}

/// Complete input description of a domain.
///
/// Components are numbered from 1 in list order; the `number` fields of
/// dof managers and elements must follow that order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DomainRecord {
    #[serde(default = "default_domain_number")]
    pub number: usize,
    #[serde(default)]
    pub partition: Option<PartitionContext>,
    #[serde(default)]
    pub dof_managers: Vec<DofManagerRecord>,
    #[serde(default)]
    pub materials: Vec<MaterialRecord>,
    #[serde(default)]
    pub cross_sections: Vec<CrossSection>,
    #[serde(default)]
    pub time_functions: Vec<TimeFunction>,
    #[serde(default)]
    pub elements: Vec<ElementRecord>,
}

impl DomainRecord {
    /// Build the domain, check it and compute integration points
    pub fn build(self) -> Result<Domain> {
        let partition = match self.partition {
            Some(p) => PartitionContext::new(p.rank, p.size)?,
            None => PartitionContext::serial(),
        };
        let mut domain = Domain::with_partition(self.number, partition);

        for (slot, record) in self.dof_managers.iter().enumerate() {
            expect_number("dof manager", record.number, slot + 1)?;
            domain.dof_managers.push(record.to_dof_manager());
        }
        for material in self.materials {
            domain.add_material(material.into_material());
        }
        for section in self.cross_sections {
            domain.add_cross_section(section);
        }
        for function in self.time_functions {
            domain.add_time_function(function);
        }
        for (slot, record) in self.elements.iter().enumerate() {
            expect_number("element", record.number, slot + 1)?;
            let element = ElementGeometry::from_record(record)?;
            domain.add_element(element);
        }
        debug!(
            domain = domain.number,
            dof_managers = domain.dof_managers.len(),
            elements = domain.elements.len(),
            "domain assembled from record"
        );

        domain.check_consistency()?;
        domain.post_initialize()?;
        Ok(domain)
    }
}

fn expect_number(what: &str, found: usize, expected: usize) -> Result<()> {
    if found != expected {
        return Err(IoError::InvalidData(format!(
            "{what} number {found} at position {expected}"
        )));
    }
    Ok(())
}

/// Read a domain record from a JSON file
pub fn load_domain_record(path: impl AsRef<Path>) -> Result<DomainRecord> {
    let bytes = fs::read(path)?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// Read a domain record and build the domain
pub fn load_domain(path: impl AsRef<Path>) -> Result<Domain> {
    let path = path.as_ref();
    let domain = load_domain_record(path)?.build()?;
    info!(path = %path.display(), elements = domain.elements.len(), "loaded domain");
    Ok(domain)
}
