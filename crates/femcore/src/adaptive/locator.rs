//! Point location in an old mesh.

use nalgebra::Vector3;
use tracing::{debug, warn};

use crate::domain::Domain;
use crate::element::NodeCoordinates;
use crate::integration::LocalCoords;
use crate::interpolation::Interpolation;

/// Where a physical point falls in the old mesh
#[derive(Debug, Clone, PartialEq)]
pub struct Location {
    /// Element number in the old domain
    pub element: usize,
    pub local: LocalCoords,
    /// Whether the point lies inside `element`
    pub inside: bool,
    /// Reference-space distance outside `element`, zero when inside
    pub excess: f64,
}

#[derive(Debug, Clone)]
struct Candidate {
    element: usize,
    interpolation: &'static dyn Interpolation,
    nodes: NodeCoordinates,
}

/// Uniform bucket grid over the element bounding boxes of a domain
#[derive(Debug, Clone)]
pub struct ElementLocator {
    min: Vector3<f64>,
    cell_size: Vector3<f64>,
    resolution: [usize; 3],
    /// Maps grid cell to candidates whose bounding box overlaps it
    cells: Vec<Vec<usize>>,
    candidates: Vec<Candidate>,
}

impl ElementLocator {
    /// Build a locator with up to `resolution` cells per direction
    pub fn build(domain: &Domain, resolution: usize) -> Self {
        let view = domain.view();
        let candidates: Vec<Candidate> = domain
            .elements
            .iter()
            .filter_map(|e| match e.node_coordinates(&view) {
                Ok(nodes) if !nodes.is_empty() => Some(Candidate {
                    element: e.number(),
                    interpolation: e.interpolation(),
                    nodes,
                }),
                Ok(_) => None,
                Err(err) => {
                    warn!(element = e.number(), %err, "element skipped by locator");
                    None
                }
            })
            .collect();

        // Compute bounding box
        let mut min = Vector3::repeat(f64::INFINITY);
        let mut max = Vector3::repeat(f64::NEG_INFINITY);
        for x in candidates.iter().flat_map(|c| c.nodes.iter()) {
            min = min.inf(x);
            max = max.sup(x);
        }
        if candidates.is_empty() {
            min = Vector3::zeros();
            max = Vector3::zeros();
        }

        // Add small padding to avoid boundary issues
        let extent = (max - min).max();
        let padding = if extent > 0.0 { 1e-4 * extent } else { 1.0 };
        min -= Vector3::repeat(padding);
        max += Vector3::repeat(padding);

        // flat directions of 2-D meshes get a single layer of cells
        let span = max - min;
        let resolution = resolution.max(1);
        let mut dims = [1usize; 3];
        for (i, dim) in dims.iter_mut().enumerate() {
            if span[i] > 4.0 * padding {
                *dim = resolution;
            }
        }
        let cell_size = Vector3::new(
            span.x / dims[0] as f64,
            span.y / dims[1] as f64,
            span.z / dims[2] as f64,
        );

        let mut locator = Self {
            min,
            cell_size,
            resolution: dims,
            cells: vec![Vec::new(); dims[0] * dims[1] * dims[2]],
            candidates: Vec::new(),
        };

        for (index, candidate) in candidates.iter().enumerate() {
            let mut e_min = Vector3::repeat(f64::INFINITY);
            let mut e_max = Vector3::repeat(f64::NEG_INFINITY);
            for x in &candidate.nodes {
                e_min = e_min.inf(x);
                e_max = e_max.sup(x);
            }
            let lo = locator.cell_coords(&e_min);
            let hi = locator.cell_coords(&e_max);
            for iz in lo[2]..=hi[2] {
                for iy in lo[1]..=hi[1] {
                    for ix in lo[0]..=hi[0] {
                        let cell = locator.flat_index([ix, iy, iz]);
                        locator.cells[cell].push(index);
                    }
                }
            }
        }
        locator.candidates = candidates;

        debug!(
            elements = locator.candidates.len(),
            cells = locator.cells.len(),
            "built element locator"
        );
        locator
    }

    fn cell_coords(&self, p: &Vector3<f64>) -> [usize; 3] {
        let mut out = [0; 3];
        for (i, o) in out.iter_mut().enumerate() {
            let t = ((p[i] - self.min[i]) / self.cell_size[i]).floor();
            *o = if t <= 0.0 {
                0
            } else {
                (t as usize).min(self.resolution[i] - 1)
            };
        }
        out
    }

    fn flat_index(&self, [ix, iy, iz]: [usize; 3]) -> usize {
        ix + iy * self.resolution[0] + iz * self.resolution[0] * self.resolution[1]
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    /// Find the element containing `p`, or the one `p` is closest to in
    /// reference space.
    ///
    /// Returns `None` only for an empty mesh or when every mapping is
    /// singular.
    pub fn locate(&self, p: &Vector3<f64>) -> Option<Location> {
        let cell = self.flat_index(self.cell_coords(p));
        let mut best = self.best_of(self.cells[cell].iter().copied(), p);
        if best.as_ref().is_some_and(|b| b.inside) {
            return best;
        }
        // not inside any bucket candidate: check the whole mesh
        let all = self.best_of(0..self.candidates.len(), p);
        if let Some(candidate) = all
            && best.as_ref().is_none_or(|b| candidate.excess < b.excess)
        {
            best = Some(candidate);
        }
        best
    }

    fn best_of(&self, indices: impl Iterator<Item = usize>, p: &Vector3<f64>) -> Option<Location> {
        let mut best: Option<Location> = None;
        for index in indices {
            let c = &self.candidates[index];
            let Some((local, inside)) = c.interpolation.local_coordinates(p, &c.nodes) else {
                continue;
            };
            let excess = if inside {
                0.0
            } else {
                c.interpolation.reference_excess(&local)
            };
            let location = Location {
                element: c.element,
                local,
                inside,
                excess,
            };
            if inside {
                return Some(location);
            }
            if best.as_ref().is_none_or(|b| excess < b.excess) {
                best = Some(location);
            }
        }
        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::{ElementGeometry, ElementKind};

    fn strip_of_quads(n: usize) -> Domain {
        let mut domain = Domain::new(1);
        for i in 0..=n {
            domain.dof_managers.add_node([i as f64, 0.0, 0.0]);
            domain.dof_managers.add_node([i as f64, 1.0, 0.0]);
        }
        for i in 0..n {
            let a = 2 * i + 1;
            let mut e = ElementGeometry::new(0, ElementKind::CPS4);
            e.set_dof_managers(&[a, a + 2, a + 3, a + 1]).unwrap();
            domain.add_element(e);
        }
        domain
    }

    #[test]
    fn locates_containing_element() {
        let domain = strip_of_quads(5);
        let locator = ElementLocator::build(&domain, 4);
        let loc = locator.locate(&Vector3::new(3.5, 0.25, 0.0)).unwrap();
        assert_eq!(loc.element, 4);
        assert!(loc.inside);
        assert_eq!(loc.excess, 0.0);
    }

    #[test]
    fn outside_point_gets_nearest_element() {
        let domain = strip_of_quads(3);
        let locator = ElementLocator::build(&domain, 8);
        let loc = locator.locate(&Vector3::new(3.2, 0.5, 0.0)).unwrap();
        assert_eq!(loc.element, 3);
        assert!(!loc.inside);
        assert!(loc.excess > 0.0);
    }

    #[test]
    fn empty_mesh_locates_nothing() {
        let locator = ElementLocator::build(&Domain::new(1), 4);
        assert!(locator.is_empty());
        assert!(locator.locate(&Vector3::zeros()).is_none());
    }
}
