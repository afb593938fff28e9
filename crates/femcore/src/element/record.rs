//! Input record of an element.

use nalgebra::{Matrix3, Vector3};
use serde::{Deserialize, Serialize};

use super::{ElementGeometry, ElementKind};
use crate::error::{ElementError, Result};
use crate::parallel::ParallelMode;

/// Serializable element description
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementRecord {
    pub number: usize,
    #[serde(rename = "type")]
    pub kind: ElementKind,
    /// Dof manager numbers in local order
    pub nodes: Vec<usize>,
    #[serde(default)]
    pub material: Option<usize>,
    #[serde(default)]
    pub cross_section: Option<usize>,
    /// Activity time function, 0 for always active
    #[serde(default)]
    pub activity_time_function: usize,
    /// First two local base vectors `[e1x, e1y, e1z, e2x, e2y, e2z]`
    #[serde(default)]
    pub lcs: Option<[f64; 6]>,
    #[serde(default)]
    pub nip: Option<usize>,
    #[serde(default)]
    pub global_number: Option<usize>,
    #[serde(default)]
    pub partitions: Vec<usize>,
    #[serde(default)]
    pub parallel_mode: ParallelMode,
}

impl ElementRecord {
    pub fn new(number: usize, kind: ElementKind, nodes: Vec<usize>) -> Self {
        Self {
            number,
            kind,
            nodes,
            material: None,
            cross_section: None,
            activity_time_function: 0,
            lcs: None,
            nip: None,
            global_number: None,
            partitions: Vec::new(),
            parallel_mode: ParallelMode::Local,
        }
    }
}

/// Orthonormal frame from two (not necessarily orthogonal) base vectors
fn local_frame(element: usize, values: &[f64; 6]) -> Result<Matrix3<f64>> {
    let degenerate = || ElementError::InvalidTopology {
        element,
        reason: "degenerate local coordinate system".into(),
    };
    let e1 = Vector3::new(values[0], values[1], values[2])
        .try_normalize(1.0e-12)
        .ok_or_else(degenerate)?;
    let e2 = Vector3::new(values[3], values[4], values[5]);
    let e3 = e1.cross(&e2).try_normalize(1.0e-12).ok_or_else(degenerate)?;
    let e2 = e3.cross(&e1);
    Ok(Matrix3::from_rows(&[e1.transpose(), e2.transpose(), e3.transpose()]))
}

impl ElementGeometry {
    /// Create an element from its record
    pub fn from_record(record: &ElementRecord) -> Result<Self> {
        let mut element = ElementGeometry::new(record.number, record.kind);
        element.initialize_from(record)?;
        Ok(element)
    }

    /// Apply the fields of `record`. The element type and number are not
    /// changed.
    pub fn initialize_from(&mut self, record: &ElementRecord) -> Result<()> {
        if record.kind != self.kind {
            return Err(ElementError::InvalidTopology {
                element: self.number,
                reason: format!("record describes a {:?}, element is a {:?}", record.kind, self.kind),
            });
        }
        let lcs = record
            .lcs
            .as_ref()
            .map(|values| local_frame(self.number, values))
            .transpose()?;
        self.set_dof_managers(&record.nodes)?;
        self.material = record.material;
        self.cross_section = record.cross_section;
        self.activity_time_function = match record.activity_time_function {
            0 => None,
            n => Some(n),
        };
        self.local_cs = lcs;
        if let Some(nip) = record.nip {
            self.nip = nip;
        }
        self.global_number = record.global_number;
        self.partition.partitions.clone_from(&record.partitions);
        self.partition.mode = record.parallel_mode;
        Ok(())
    }

    /// Record describing the element's current configuration
    pub fn input_record(&self) -> ElementRecord {
        ElementRecord {
            number: self.number,
            kind: self.kind,
            nodes: self.dof_managers.to_vec(),
            material: self.material,
            cross_section: self.cross_section,
            activity_time_function: self.activity_time_function.unwrap_or(0),
            lcs: self.local_cs.as_ref().map(|m| {
                [m[(0, 0)], m[(0, 1)], m[(0, 2)], m[(1, 0)], m[(1, 1)], m[(1, 2)]]
            }),
            nip: Some(self.nip),
            global_number: self.global_number,
            partitions: self.partition.partitions.clone(),
            parallel_mode: self.partition.mode,
        }
    }
}
