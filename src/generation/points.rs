//! Jittered Brick Lattice Point Distribution
//!
//! Generates the seed sites of the tessellation: a `nx * ny` lattice with unit
//! spacing in which every odd column is shifted up by half a cell, giving a
//! hexagonal-ish packing. Each site is then perturbed by independent Gaussian
//! noise on both axes so the Voronoi cells become irregular grains.
//!
//! # Algorithm
//!
//! Site `(i, j)` is placed at:
//! - x: `i + N(0, σ)`
//! - y: `j + 0.5 * (i mod 2) + N(0, σ)`
//!
//! Noise is drawn from a ChaCha stream seeded with the run seed, column by column
//! (`i` outer, `j` inner, x before y), so the same seed always yields the same
//! bit pattern.

use glam::DVec2;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};

use crate::error::{MicrostructureError, Result};

/// Historical jitter: a unit Gaussian scaled by 0.25, then halved
pub const DEFAULT_JITTER: f64 = 0.25 * 0.5;

/// Generate the jittered lattice sites
///
/// # Arguments
///
/// * `nx`, `ny` - Lattice dimensions (columns, rows)
/// * `jitter` - Standard deviation of the per-axis Gaussian noise
/// * `seed` - Random seed for the noise stream
///
/// # Errors
///
/// Returns `InvalidParameter` if `jitter` is negative or not finite.
///
/// # Example
///
/// ```rust
/// use voronoi_polycrystal::generation::generate_lattice_points;
///
/// let points = generate_lattice_points(4, 4, 0.125, 1234).unwrap();
/// assert_eq!(points.len(), 16);
/// ```
pub fn generate_lattice_points(nx: usize, ny: usize, jitter: f64, seed: u64) -> Result<Vec<DVec2>> {
    let noise = Normal::new(0.0, jitter).map_err(|e| {
        MicrostructureError::invalid("jitter", format!("{} (got {})", e, jitter))
    })?;
    let mut rng = ChaCha8Rng::seed_from_u64(seed);

    let mut points = Vec::with_capacity(nx * ny);
    for i in 0..nx {
        let column_offset = if i % 2 == 1 { 0.5 } else { 0.0 };
        for j in 0..ny {
            let dx: f64 = noise.sample(&mut rng);
            let dy: f64 = noise.sample(&mut rng);
            points.push(DVec2::new(
                i as f64 + dx,
                j as f64 + column_offset + dy,
            ));
        }
    }
    Ok(points)
}
