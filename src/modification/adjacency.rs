//! Grain adjacency via Delaunay triangulation of grain centers
//!
//! Two grains are neighbours when their centers share a Delaunay edge. Positions
//! are held in a dense array indexed by grain id over `0..region_count`; ids with
//! no grain (filtered regions, cracked grains) are explicitly absent and never
//! take part in the triangulation.

use glam::DVec2;
use spade::{DelaunayTriangulation, Point2, Triangulation};
use tracing::{debug, warn};

use crate::error::{MicrostructureError, Result};
use crate::grain::GrainMap;

/// Dense id-aligned center array; `None` marks an id without a grain
pub fn dense_positions(grains: &GrainMap, region_count: usize) -> Vec<Option<DVec2>> {
    let len = grains
        .keys()
        .next_back()
        .map_or(region_count, |&max_id| region_count.max(max_id + 1));
    let mut positions = vec![None; len];
    for (&id, grain) in grains {
        positions[id] = Some(grain.center);
    }
    positions
}

/// Neighbour lists of every grain id
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GrainAdjacency {
    /// Indexed by grain id; `None` for absent grains
    neighbors: Vec<Option<Vec<usize>>>,
}

impl GrainAdjacency {
    /// Triangulate the present entries of a dense position array
    ///
    /// # Errors
    ///
    /// Returns `Tessellation` if a center is not a finite point.
    pub fn from_positions(positions: &[Option<DVec2>]) -> Result<Self> {
        let mut triangulation: DelaunayTriangulation<Point2<f64>> = DelaunayTriangulation::new();
        let mut neighbors: Vec<Option<Vec<usize>>> = vec![None; positions.len()];

        // Delaunay vertex index -> grain id
        let mut grain_of_vertex: Vec<usize> = Vec::new();
        for (id, position) in positions.iter().enumerate() {
            let Some(p) = position else { continue };
            let handle = triangulation.insert(Point2::new(p.x, p.y)).map_err(|e| {
                MicrostructureError::Tessellation(format!(
                    "grain {} center ({}, {}) rejected: {:?}",
                    id, p.x, p.y, e
                ))
            })?;
            if handle.index() == grain_of_vertex.len() {
                grain_of_vertex.push(id);
            } else {
                warn!(grain = id, "grain center coincides with another grain, no neighbours");
            }
            neighbors[id] = Some(Vec::new());
        }

        for vertex in triangulation.vertices() {
            let id = grain_of_vertex[vertex.fix().index()];
            let mut list: Vec<usize> = vertex
                .out_edges()
                .map(|edge| grain_of_vertex[edge.to().fix().index()])
                .collect();
            list.sort_unstable();
            list.dedup();
            neighbors[id] = Some(list);
        }

        debug!(
            grains = grain_of_vertex.len(),
            edges = triangulation.num_undirected_edges(),
            "grain adjacency built"
        );

        Ok(Self { neighbors })
    }

    /// Triangulate the centers of a grain map
    pub fn from_grains(grains: &GrainMap, region_count: usize) -> Result<Self> {
        Self::from_positions(&dense_positions(grains, region_count))
    }

    /// Neighbour ids of a grain, ascending; `None` if the id has no grain
    pub fn neighbors(&self, id: usize) -> Option<&[usize]> {
        self.neighbors.get(id).and_then(|n| n.as_deref())
    }

    /// Length of the dense id range
    #[inline]
    pub fn len(&self) -> usize {
        self.neighbors.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.neighbors.is_empty()
    }

    /// Every adjacent pair once, as `(smaller id, larger id)`, ascending
    pub fn pairs(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.neighbors
            .iter()
            .enumerate()
            .filter_map(|(id, n)| n.as_ref().map(|list| (id, list)))
            .flat_map(|(id, list)| {
                list.iter()
                    .copied()
                    .filter(move |&other| other > id)
                    .map(move |other| (id, other))
            })
    }
}
