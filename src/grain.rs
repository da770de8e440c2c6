//! Grain Structure
//!
//! A grain is one shrunk Voronoi cell of the microstructure.

use std::collections::BTreeMap;

use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::geometry;

/// Grain id -> grain, ordered by id
pub type GrainMap = BTreeMap<usize, Grain>;

/// A single grain of the polycrystal
///
/// # Design Notes
///
/// The polygon and the center come from different geometry:
/// `polygon` is the shrunk cell (what gets meshed), while `center` is the mean
/// of the *unshrunk* Voronoi vertices. Grains are never edited in place; crack
/// insertion and modification produce new maps and keep the ids of survivors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Grain {
    /// Index of the tessellation region this grain was cut from
    ///
    /// Stable within one generation run and across snapshot round-trips.
    pub id: usize,

    /// Shrunk boundary, closed implicitly (last vertex connects to the first)
    ///
    /// Follows the winding of the source region (counter-clockwise).
    pub polygon: Vec<DVec2>,

    /// Mean of the original (pre-shrink) region vertices
    pub center: DVec2,
}

impl Grain {
    /// Create a new grain
    ///
    /// This is typically called by the shrink pass or snapshot loading, not by user code.
    pub fn new(id: usize, polygon: Vec<DVec2>, center: DVec2) -> Self {
        Self {
            id,
            polygon,
            center,
        }
    }

    /// Get the vertex count (polygon complexity)
    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.polygon.len()
    }

    /// Area of the shrunk polygon
    pub fn area(&self) -> f64 {
        geometry::polygon_area(&self.polygon)
    }

    /// Midpoints of the shrunk edges, used as interface-surface anchors
    pub fn edge_midpoints(&self) -> Vec<DVec2> {
        geometry::edge_midpoints(&self.polygon)
    }

    /// Euclidean distance between grain centers
    #[inline]
    pub fn distance_to(&self, other: &Grain) -> f64 {
        self.center.distance(other.center)
    }
}
