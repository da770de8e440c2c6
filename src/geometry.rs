//! Planar polygon primitives
//!
//! The bisector offset is the core of the grain-shrink pass: every vertex of a
//! Voronoi cell is moved inward along the bisector of its corner, by a distance
//! corrected with the half-angle so each shrunk edge ends up exactly `distance`
//! away from (and parallel to) the edge it came from. Two neighbouring grains
//! shrunk this way are separated by a uniform cohesive gap of `2 * distance`.

use glam::DVec2;

/// Below this length the two edge directions are treated as opposite (straight corner)
const COLLINEAR_EPSILON: f64 = 1e-12;

/// Offset a single polygon corner inward along its angle bisector
///
/// `prev` and `next` are the corner's neighbours on the boundary. The polygon is
/// assumed to run counter-clockwise (`prev -> vertex -> next`). A corner that turns
/// clockwise is reflex, and the vertex moves along the reversed bisector so it
/// still ends up inside. When `prev`, `vertex` and `next` are collinear the
/// bisector is undefined and the vertex is pushed along the left normal of
/// `prev -> next` instead.
///
/// # Example
///
/// ```
/// use glam::DVec2;
/// use voronoi_polycrystal::geometry::bisector_offset;
///
/// // corner of the unit square
/// let p = bisector_offset(
///     DVec2::new(0.0, 1.0),
///     DVec2::new(0.0, 0.0),
///     DVec2::new(1.0, 0.0),
///     0.1,
/// );
/// assert!((p - DVec2::new(0.1, 0.1)).length() < 1e-12);
/// ```
pub fn bisector_offset(prev: DVec2, vertex: DVec2, next: DVec2, distance: f64) -> DVec2 {
    let to_prev = (prev - vertex).normalize_or_zero();
    let to_next = (next - vertex).normalize_or_zero();
    let sum = to_prev + to_next;
    let sum_len = sum.length();

    if to_prev == DVec2::ZERO || to_next == DVec2::ZERO || sum_len < COLLINEAR_EPSILON {
        let normal = (next - prev).normalize_or_zero().perp();
        return vertex + normal * distance;
    }

    // sin(θ/2) from cos θ = u1·u2
    let half_angle_sin = ((1.0 - to_prev.dot(to_next)) * 0.5).max(0.0).sqrt();

    // u1 + u2 points out of a reflex corner; a clockwise turn marks one
    let mut direction = sum / sum_len;
    if (vertex - prev).perp_dot(next - vertex) < 0.0 {
        direction = -direction;
    }
    vertex + direction * (distance / half_angle_sin)
}

/// Shrink a closed polygon by offsetting every corner inward
///
/// The result keeps the vertex count and cyclic order of the input. Both windings
/// and non-convex (simple) polygons are accepted; polygons with fewer than three
/// vertices are returned unchanged.
pub fn shrink_polygon(polygon: &[DVec2], distance: f64) -> Vec<DVec2> {
    let n = polygon.len();
    if n < 3 {
        return polygon.to_vec();
    }

    let counter_clockwise = signed_area(polygon) >= 0.0;

    (0..n)
        .map(|i| {
            let prev = polygon[(i + n - 1) % n];
            let vertex = polygon[i];
            let next = polygon[(i + 1) % n];
            if counter_clockwise {
                bisector_offset(prev, vertex, next, distance)
            } else {
                bisector_offset(next, vertex, prev, distance)
            }
        })
        .collect()
}

/// Midpoints of every edge of a closed polygon, starting with edge `0 -> 1`
///
/// These are the anchors a solver-input translator uses to pick a grain's
/// boundary edges when it builds interface surfaces.
pub fn edge_midpoints(polygon: &[DVec2]) -> Vec<DVec2> {
    let n = polygon.len();
    (0..n)
        .map(|i| (polygon[i] + polygon[(i + 1) % n]) * 0.5)
        .collect()
}

/// Arithmetic mean of a point set (`DVec2::ZERO` for an empty set)
pub fn vertex_mean(points: &[DVec2]) -> DVec2 {
    if points.is_empty() {
        return DVec2::ZERO;
    }
    points.iter().copied().sum::<DVec2>() / points.len() as f64
}

/// Shoelace signed area, positive for counter-clockwise winding
pub fn signed_area(polygon: &[DVec2]) -> f64 {
    let n = polygon.len();
    if n < 3 {
        return 0.0;
    }
    let twice: f64 = (0..n)
        .map(|i| polygon[i].perp_dot(polygon[(i + 1) % n]))
        .sum();
    twice * 0.5
}

/// Unsigned polygon area
#[inline]
pub fn polygon_area(polygon: &[DVec2]) -> f64 {
    signed_area(polygon).abs()
}
