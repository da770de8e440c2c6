//! Grain-shrink pass
//!
//! Turns valid Voronoi regions into grains by pulling every vertex inward with
//! the bisector offset, which opens a cohesive gap between neighbouring grains.

use std::collections::BTreeMap;

use glam::DVec2;

use crate::generation::tessellation::Tessellation;
use crate::geometry::{shrink_polygon, vertex_mean};
use crate::grain::{Grain, GrainMap};

/// Shrink every valid region by `distance`
///
/// # Arguments
///
/// * `tessellation` - Source of the shared vertex coordinates
/// * `regions` - Region index -> vertex indices, as returned by [`Tessellation::valid_regions`]
/// * `distance` - Perpendicular offset applied to every edge
///
/// # Returns
///
/// One grain per region, keyed and identified by the region index
pub fn shrink_regions(
    tessellation: &Tessellation,
    regions: &BTreeMap<usize, Vec<usize>>,
    distance: f64,
) -> GrainMap {
    regions
        .iter()
        .map(|(&id, region)| {
            let raw: Vec<DVec2> = region.iter().map(|&i| tessellation.vertices[i]).collect();
            let polygon = shrink_polygon(&raw, distance);
            let center = vertex_mean(&raw);
            (id, Grain::new(id, polygon, center))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::tessellation::RegionVertex;
    use crate::geometry::polygon_area;

    /// An irregular quadrilateral as a one-region tessellation
    fn kite() -> (Tessellation, BTreeMap<usize, Vec<usize>>) {
        let tess = Tessellation {
            vertices: vec![
                DVec2::new(1.0, 1.0),
                DVec2::new(3.0, 1.0),
                DVec2::new(3.5, 3.0),
                DVec2::new(1.2, 2.0),
            ],
            regions: vec![vec![], (0..4).map(RegionVertex::Finite).collect()],
        };
        let mut regions = BTreeMap::new();
        regions.insert(1, vec![0, 1, 2, 3]);
        (tess, regions)
    }

    #[test]
    fn test_grain_id_is_region_index() {
        let (tess, regions) = kite();
        let grains = shrink_regions(&tess, &regions, 0.05);
        assert_eq!(grains.len(), 1);
        assert_eq!(grains[&1].id, 1);
        assert_eq!(grains[&1].vertex_count(), 4);
    }

    #[test]
    fn test_center_uses_unshrunk_vertices() {
        let (tess, regions) = kite();
        let grains = shrink_regions(&tess, &regions, 0.05);
        let grain = &grains[&1];

        let raw_mean = vertex_mean(&tess.vertices);
        let shrunk_mean = vertex_mean(&grain.polygon);
        assert_eq!(grain.center, raw_mean);
        assert!((raw_mean - shrunk_mean).length() > 1e-6);
    }

    #[test]
    fn test_shrunk_polygon_is_smaller() {
        let (tess, regions) = kite();
        let grains = shrink_regions(&tess, &regions, 0.05);
        assert!(grains[&1].area() < polygon_area(&tess.vertices));
    }

    #[test]
    fn test_zero_distance_keeps_geometry() {
        let (tess, regions) = kite();
        let grains = shrink_regions(&tess, &regions, 0.0);
        for (a, b) in grains[&1].polygon.iter().zip(tess.vertices.iter()) {
            assert!((*a - *b).length() < 1e-12);
        }
    }
}
