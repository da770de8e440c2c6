//! Core grain generation pipeline
//!
//! Point field -> Voronoi tessellation -> region filter -> grain shrink.
//! Crack insertion and bookkeeping happen one level up in
//! [`Microstructure`](crate::Microstructure).

mod points;
mod shrink;
mod tessellation;

pub use points::{generate_lattice_points, DEFAULT_JITTER};
pub use shrink::shrink_regions;
pub use tessellation::{region_sanity, tessellate, RegionFilter, RegionVertex, Tessellation};

use tracing::debug;

use crate::config::MicrostructureConfig;
use crate::error::Result;
use crate::grain::GrainMap;

/// Grains straight out of the shrink pass, before any crack is inserted
#[derive(Debug, Clone, Default)]
pub struct RawGrains {
    /// Valid, shrunk grains keyed by region index
    pub grains: GrainMap,
    /// Total number of tessellation regions, valid or not
    pub region_count: usize,
}

/// Generate grains from configuration (without precrack)
///
/// A pure function of the configuration: the same size, seed, jitter, gap and
/// filter always give bit-identical grains.
pub fn generate_grains(config: &MicrostructureConfig) -> Result<RawGrains> {
    let limit = config.limit();

    // Step 1: jittered lattice sites
    let points = generate_lattice_points(config.size, config.size, config.jitter, config.seed)?;

    // Step 2: Voronoi regions
    let tess = tessellate(&points)?;

    // Step 3: bounded, in-domain regions only
    let valid = tess.valid_regions(limit, limit, config.region_filter);
    debug!(
        regions = tess.region_count(),
        valid = valid.len(),
        "regions filtered"
    );

    // Step 4: shrink into grains
    let grains = shrink_regions(&tess, &valid, config.gap_distance);

    Ok(RawGrains {
        grains,
        region_count: tess.region_count(),
    })
}
