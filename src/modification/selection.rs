//! Seeded selection of the grains to modify

use std::collections::BTreeSet;

use rand::Rng;

use crate::grain::GrainMap;

/// Fraction of the domain height treated as the loaded top/bottom bands
const BOUNDARY_BAND: f64 = 0.1;

/// Whether a grain center lies in the top or bottom band of the domain
///
/// Bands are strict: a center exactly `size / 10` from an edge is outside.
#[inline]
pub fn near_loaded_boundary(center_y: f64, size: f64) -> bool {
    let band = size * BOUNDARY_BAND;
    size - center_y < band || center_y < band
}

/// Draw the set of modified grains
///
/// Visits grains in ascending id order and draws exactly one uniform value in
/// `[0, 1)` per grain, so the outcome for a given stream depends only on the
/// grain ids. A grain is selected when its draw is below `fraction`, unless the
/// secondary interfaces are weaker and the grain sits near a loaded boundary.
pub fn select_grains<R: Rng>(
    grains: &GrainMap,
    fraction: f64,
    size: f64,
    secondary_weaker: bool,
    rng: &mut R,
) -> BTreeSet<usize> {
    let mut selected = BTreeSet::new();
    for (&id, grain) in grains {
        let draw: f64 = rng.gen();
        if draw >= fraction {
            continue;
        }
        if secondary_weaker && near_loaded_boundary(grain.center.y, size) {
            continue;
        }
        selected.insert(id);
    }
    selected
}
