//! Precrack insertion
//!
//! A precrack is a void made by deleting every grain whose center falls inside
//! an axis-aligned rectangle anchored on the left edge of the domain.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{MicrostructureError, Result};
use crate::grain::GrainMap;

/// Rectangle `(0, x_max) x (y_min, y_max)` whose grains are removed
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CrackRegion {
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
}

impl CrackRegion {
    /// Create a crack region, rejecting empty or inverted rectangles
    pub fn new(x_max: f64, y_min: f64, y_max: f64) -> Result<Self> {
        if !(x_max > 0.0 && x_max.is_finite()) {
            return Err(MicrostructureError::invalid(
                "crack_x_max",
                format!("must be positive and finite (got {})", x_max),
            ));
        }
        if !(y_min < y_max && y_min.is_finite() && y_max.is_finite()) {
            return Err(MicrostructureError::invalid(
                "crack_y_range",
                format!("y_min must be below y_max (got {}..{})", y_min, y_max),
            ));
        }
        Ok(Self {
            x_max,
            y_min,
            y_max,
        })
    }

    /// The standard precrack for a square domain of side `size`
    ///
    /// Reaches a sixth of the way in from the left edge and is one grain tall,
    /// centered on the vertical midpoint.
    pub fn centered(size: f64, grain_size: f64) -> Self {
        let halfway = size / 2.0;
        Self {
            x_max: size / 6.0,
            y_min: halfway - grain_size / 2.0,
            y_max: halfway + grain_size / 2.0,
        }
    }

    /// Strict interior test
    #[inline]
    pub fn contains(&self, x: f64, y: f64) -> bool {
        x > 0.0 && x < self.x_max && y > self.y_min && y < self.y_max
    }
}

/// Result of a crack insertion
#[derive(Debug, Clone, Default)]
pub struct CrackOutcome {
    /// Grains that survived, with their original ids
    pub remaining: GrainMap,
    /// Ids of the deleted grains, ascending
    pub removed: Vec<usize>,
}

/// Remove every grain whose center lies strictly inside `region`
///
/// The input map is left untouched so the uncracked state stays available.
///
/// # Example
///
/// ```rust
/// use glam::DVec2;
/// use voronoi_polycrystal::{insert_crack, CrackRegion, Grain, GrainMap};
///
/// let mut grains = GrainMap::new();
/// grains.insert(0, Grain::new(0, vec![], DVec2::new(0.5, 2.0)));
/// grains.insert(1, Grain::new(1, vec![], DVec2::new(3.0, 2.0)));
///
/// let outcome = insert_crack(&grains, &CrackRegion::new(1.0, 1.5, 2.5).unwrap());
/// assert_eq!(outcome.removed, vec![0]);
/// assert!(outcome.remaining.contains_key(&1));
/// assert_eq!(grains.len(), 2);
/// ```
pub fn insert_crack(grains: &GrainMap, region: &CrackRegion) -> CrackOutcome {
    let mut outcome = CrackOutcome::default();
    for (&id, grain) in grains {
        if region.contains(grain.center.x, grain.center.y) {
            outcome.removed.push(id);
        } else {
            outcome.remaining.insert(id, grain.clone());
        }
    }
    debug!(
        removed = outcome.removed.len(),
        remaining = outcome.remaining.len(),
        ?region,
        "precrack inserted"
    );
    outcome
}
