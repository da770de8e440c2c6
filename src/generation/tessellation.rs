//! Voronoi tessellation of the lattice sites
//!
//! Builds the Delaunay triangulation of the sites with spade and reads the
//! Voronoi diagram off it: every inner Delaunay face contributes its circumcenter
//! to a shared vertex array, and the region of a site is the ring of
//! circumcenters of the faces around it. A site on the convex hull touches the
//! outer face, which is recorded as an explicit [`RegionVertex::Unbounded`]
//! marker instead of a vertex.

use std::collections::BTreeMap;

use glam::DVec2;
use serde::{Deserialize, Serialize};
use spade::{DelaunayTriangulation, Point2, Triangulation};
use tracing::{debug, warn};

use crate::error::{MicrostructureError, Result};

/// One entry of a raw Voronoi region
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegionVertex {
    /// Index into [`Tessellation::vertices`]
    Finite(usize),
    /// The region escapes the convex hull here
    Unbounded,
}

/// Which bounded regions are accepted as grains
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RegionFilter {
    /// Any bounded region inside the domain
    #[default]
    AnyBounded,
    /// Only six-sided regions (idealized hexagonal grains)
    HexagonalOnly,
}

/// A planar Voronoi tessellation
#[derive(Debug, Clone, Default)]
pub struct Tessellation {
    /// Shared Voronoi vertex coordinates
    pub vertices: Vec<DVec2>,
    /// One region per site, indexed by site; vertices are ordered counter-clockwise
    pub regions: Vec<Vec<RegionVertex>>,
}

impl Tessellation {
    /// Number of raw regions (one per site, filtered or not)
    #[inline]
    pub fn region_count(&self) -> usize {
        self.regions.len()
    }

    /// Regions that are non-empty, bounded and fully inside `[0, x_limit) x [0, y_limit)`
    ///
    /// Returns region index -> vertex indices. Region indices are kept, so the
    /// result has gaps wherever a region was rejected.
    pub fn valid_regions(
        &self,
        x_limit: f64,
        y_limit: f64,
        filter: RegionFilter,
    ) -> BTreeMap<usize, Vec<usize>> {
        self.regions
            .iter()
            .enumerate()
            .filter(|(_, region)| !region.is_empty())
            .filter(|(_, region)| match filter {
                RegionFilter::AnyBounded => true,
                RegionFilter::HexagonalOnly => region.len() == 6,
            })
            .filter(|(_, region)| region_sanity(region, x_limit, y_limit, &self.vertices))
            .map(|(idx, region)| {
                let indices = region
                    .iter()
                    .filter_map(|v| match v {
                        RegionVertex::Finite(i) => Some(*i),
                        RegionVertex::Unbounded => None,
                    })
                    .collect();
                (idx, indices)
            })
            .collect()
    }
}

/// True iff the region is bounded and every vertex lies in `[0, x_limit) x [0, y_limit)`
///
/// # Example
///
/// ```rust
/// use glam::DVec2;
/// use voronoi_polycrystal::generation::{region_sanity, RegionVertex};
///
/// let vertices = vec![DVec2::new(0.5, 0.5), DVec2::new(4.0, 0.5)];
/// assert!(region_sanity(&[RegionVertex::Finite(0)], 4.0, 4.0, &vertices));
/// assert!(!region_sanity(&[RegionVertex::Finite(1)], 4.0, 4.0, &vertices));
/// assert!(!region_sanity(&[RegionVertex::Unbounded], 4.0, 4.0, &vertices));
/// ```
pub fn region_sanity(
    region: &[RegionVertex],
    x_limit: f64,
    y_limit: f64,
    vertices: &[DVec2],
) -> bool {
    region.iter().all(|v| match v {
        RegionVertex::Finite(i) => vertices.get(*i).is_some_and(|p| {
            p.x >= 0.0 && p.x < x_limit && p.y >= 0.0 && p.y < y_limit
        }),
        RegionVertex::Unbounded => false,
    })
}

/// Tessellate a point set
///
/// Sites are inserted in order, so region `k` belongs to `points[k]`. A site that
/// lands exactly on an earlier one is merged into it and keeps an empty region.
///
/// # Errors
///
/// Returns `Tessellation` if spade rejects a point (e.g. a non-finite coordinate).
pub fn tessellate(points: &[DVec2]) -> Result<Tessellation> {
    let mut triangulation: DelaunayTriangulation<Point2<f64>> = DelaunayTriangulation::new();

    // Delaunay vertex index -> site index
    let mut site_of_vertex: Vec<usize> = Vec::with_capacity(points.len());
    for (site, p) in points.iter().enumerate() {
        let handle = triangulation
            .insert(Point2::new(p.x, p.y))
            .map_err(|e| {
                MicrostructureError::Tessellation(format!(
                    "site {} at ({}, {}) rejected: {:?}",
                    site, p.x, p.y, e
                ))
            })?;
        if handle.index() == site_of_vertex.len() {
            site_of_vertex.push(site);
        } else {
            warn!(site, "duplicate lattice site merged into an existing one");
        }
    }

    let mut face_slot: Vec<Option<usize>> = vec![None; triangulation.num_all_faces()];
    let mut vertices = Vec::with_capacity(triangulation.num_inner_faces());
    for face in triangulation.inner_faces() {
        let c = face.circumcenter();
        face_slot[face.fix().index()] = Some(vertices.len());
        vertices.push(DVec2::new(c.x, c.y));
    }

    let mut regions = vec![Vec::new(); points.len()];
    for vertex in triangulation.vertices() {
        let site = site_of_vertex[vertex.fix().index()];
        let generator = points[site];

        let mut finite: Vec<(f64, usize)> = Vec::new();
        let mut unbounded = false;
        for edge in vertex.out_edges() {
            match edge.face().as_inner() {
                Some(inner) => {
                    if let Some(slot) = face_slot[inner.fix().index()] {
                        let d = vertices[slot] - generator;
                        finite.push((d.y.atan2(d.x), slot));
                    }
                }
                None => unbounded = true,
            }
        }

        // counter-clockwise around the generator
        finite.sort_by(|a, b| a.0.total_cmp(&b.0));
        let mut region: Vec<RegionVertex> = finite
            .into_iter()
            .map(|(_, slot)| RegionVertex::Finite(slot))
            .collect();
        if unbounded {
            region.push(RegionVertex::Unbounded);
        }
        regions[site] = region;
    }

    debug!(
        sites = points.len(),
        voronoi_vertices = vertices.len(),
        "tessellation built"
    );

    Ok(Tessellation { vertices, regions })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::points::{generate_lattice_points, DEFAULT_JITTER};
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_one_region_per_site() {
        let points = generate_lattice_points(6, 6, DEFAULT_JITTER, 42).unwrap();
        let tess = tessellate(&points).unwrap();
        assert_eq!(tess.region_count(), 36);
        assert!(!tess.vertices.is_empty());
    }

    #[test]
    fn test_hull_sites_are_unbounded() {
        let points = generate_lattice_points(5, 5, DEFAULT_JITTER, 7).unwrap();
        let tess = tessellate(&points).unwrap();
        // the corner site (0, 0) is always on the hull
        assert!(tess.regions[0].contains(&RegionVertex::Unbounded));
        // an interior site is bounded
        let interior = 2 * 5 + 2;
        assert!(!tess.regions[interior].contains(&RegionVertex::Unbounded));
        assert!(tess.regions[interior].len() >= 3);
    }

    #[test]
    fn test_region_vertices_equidistant_from_neighbouring_sites() {
        // a Voronoi vertex is at least as close to its own site as to any other site
        let points = generate_lattice_points(6, 6, DEFAULT_JITTER, 3).unwrap();
        let tess = tessellate(&points).unwrap();
        for (site, region) in tess.regions.iter().enumerate() {
            for v in region {
                if let RegionVertex::Finite(i) = v {
                    let own = (tess.vertices[*i] - points[site]).length();
                    for other in &points {
                        assert!(own <= (tess.vertices[*i] - *other).length() + 1e-9);
                    }
                }
            }
        }
    }

    #[test]
    fn test_bounded_regions_are_counter_clockwise() {
        let points = generate_lattice_points(6, 6, DEFAULT_JITTER, 11).unwrap();
        let tess = tessellate(&points).unwrap();
        for region in tess.valid_regions(6.0, 6.0, RegionFilter::AnyBounded).values() {
            let polygon: Vec<DVec2> = region.iter().map(|&i| tess.vertices[i]).collect();
            assert!(crate::geometry::signed_area(&polygon) > 0.0);
        }
    }

    #[test]
    fn test_valid_regions_inside_bounds() {
        let points = generate_lattice_points(8, 8, DEFAULT_JITTER, 1234).unwrap();
        let tess = tessellate(&points).unwrap();
        let valid = tess.valid_regions(8.0, 8.0, RegionFilter::AnyBounded);
        assert!(!valid.is_empty());
        for region in valid.values() {
            for &i in region {
                let p = tess.vertices[i];
                assert!(p.x >= 0.0 && p.x < 8.0 && p.y >= 0.0 && p.y < 8.0);
            }
        }
    }

    #[test]
    fn test_hexagonal_filter_is_stricter() {
        let points = generate_lattice_points(10, 10, DEFAULT_JITTER, 5).unwrap();
        let tess = tessellate(&points).unwrap();
        let any = tess.valid_regions(10.0, 10.0, RegionFilter::AnyBounded);
        let hex = tess.valid_regions(10.0, 10.0, RegionFilter::HexagonalOnly);
        assert!(hex.len() <= any.len());
        assert!(hex.values().all(|r| r.len() == 6));
        assert!(hex.keys().all(|k| any.contains_key(k)));
    }

    #[test]
    fn test_region_sanity_random_points() {
        let mut rng = ChaCha8Rng::seed_from_u64(2024);
        for _ in 0..500 {
            let count = rng.gen_range(1..8);
            let vertices: Vec<DVec2> = (0..count)
                .map(|_| DVec2::new(rng.gen_range(-2.0..6.0), rng.gen_range(-2.0..6.0)))
                .collect();
            let region: Vec<RegionVertex> = (0..count).map(RegionVertex::Finite).collect();

            let expected = vertices
                .iter()
                .all(|p| p.x >= 0.0 && p.x < 4.0 && p.y >= 0.0 && p.y < 4.0);
            assert_eq!(region_sanity(&region, 4.0, 4.0, &vertices), expected);
        }
    }

    #[test]
    fn test_region_sanity_limits_are_half_open() {
        let vertices = vec![
            DVec2::new(0.0, 0.0),
            DVec2::new(4.0, 1.0),
            DVec2::new(1.0, 4.0),
            DVec2::new(-1e-12, 1.0),
        ];
        assert!(region_sanity(&[RegionVertex::Finite(0)], 4.0, 4.0, &vertices));
        assert!(!region_sanity(&[RegionVertex::Finite(1)], 4.0, 4.0, &vertices));
        assert!(!region_sanity(&[RegionVertex::Finite(2)], 4.0, 4.0, &vertices));
        assert!(!region_sanity(&[RegionVertex::Finite(3)], 4.0, 4.0, &vertices));
    }

    #[test]
    fn test_degenerate_inputs() {
        assert_eq!(tessellate(&[]).unwrap().region_count(), 0);

        let single = tessellate(&[DVec2::new(1.0, 1.0)]).unwrap();
        assert_eq!(single.region_count(), 1);
        assert!(single.valid_regions(4.0, 4.0, RegionFilter::AnyBounded).is_empty());

        let collinear: Vec<DVec2> = (0..4).map(|i| DVec2::new(i as f64, 1.0)).collect();
        let tess = tessellate(&collinear).unwrap();
        assert!(tess.valid_regions(4.0, 4.0, RegionFilter::AnyBounded).is_empty());
    }

    #[test]
    fn test_non_finite_site_rejected() {
        let err = tessellate(&[DVec2::new(f64::NAN, 0.0)]).unwrap_err();
        assert!(matches!(err, MicrostructureError::Tessellation(_)));
    }
}
