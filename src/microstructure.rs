//! Microstructure main structure

use tracing::{info, warn};

use crate::config::{MicrostructureConfig, PrecrackMode};
use crate::crack::{insert_crack, CrackRegion};
use crate::error::Result;
use crate::generation::generate_grains;
use crate::grain::{Grain, GrainMap};
use crate::modification::GrainAdjacency;
use crate::snapshot::Snapshot;

#[cfg(feature = "spatial-index")]
use crate::spatial::SpatialIndex;
#[cfg(feature = "spatial-index")]
use glam::DVec2;

/// Diameter of the circle whose area equals the mean area per grain
///
/// The mean area is the whole domain divided by the grain count, so the gaps
/// between grains are attributed to the grains. Returns `None` for no grains.
pub fn equivalent_grain_size(domain_size: f64, grain_count: usize) -> Option<f64> {
    if grain_count == 0 {
        return None;
    }
    let area = domain_size * domain_size / grain_count as f64;
    Some(2.0 * (area / std::f64::consts::PI).sqrt())
}

/// A generated polycrystal microstructure
///
/// Holds the grains that survived crack insertion, keyed by their original
/// region ids, plus everything needed to write a snapshot.
///
/// # Examples
///
/// ```
/// use voronoi_polycrystal::*;
///
/// let config = MicrostructureConfigBuilder::new()
///     .size(12).unwrap()
///     .seed(42)
///     .build();
///
/// let microstructure = Microstructure::generate(config).unwrap();
/// println!("Generated {} grains", microstructure.grain_count());
///
/// if let Some(grain) = microstructure.grains().values().next() {
///     println!("Grain {} has {} vertices", grain.id, grain.vertex_count());
/// }
/// ```
#[derive(Clone)]
pub struct Microstructure {
    /// Configuration used to generate this microstructure
    config: MicrostructureConfig,

    /// Grains after crack insertion
    grains: GrainMap,

    /// Number of raw tessellation regions, grain ids are below it
    region_count: usize,

    /// Grains before crack insertion
    uncracked_count: usize,

    /// Precrack rectangle, if one was applied
    crack: Option<CrackRegion>,

    /// Ids removed by the precrack, ascending
    removed: Vec<usize>,

    /// Spatial index for fast position-to-grain lookups (optional, requires spatial-index feature)
    #[cfg(feature = "spatial-index")]
    spatial_index: SpatialIndex,
}

impl Microstructure {
    /// Run the full generation pipeline
    ///
    /// Lattice, tessellation, region filter and shrink, then the precrack
    /// selected by `config.precrack`. With `PrecrackMode::Centered` the crack is
    /// one equivalent grain size tall; a run that produced no grains skips it.
    ///
    /// # Example
    ///
    /// ```
    /// use voronoi_polycrystal::*;
    ///
    /// let config = MicrostructureConfigBuilder::new()
    ///     .size(4).unwrap()
    ///     .seed(1234)
    ///     .gap_distance(0.1).unwrap()
    ///     .build();
    ///
    /// let a = Microstructure::generate(config).unwrap();
    /// let b = Microstructure::generate(config).unwrap();
    /// assert_eq!(a.grains(), b.grains());
    /// ```
    pub fn generate(config: MicrostructureConfig) -> Result<Self> {
        let raw = generate_grains(&config)?;
        let limit = config.limit();
        let uncracked_count = raw.grains.len();

        if raw.grains.is_empty() {
            warn!(size = config.size, seed = config.seed, "tessellation produced no grains");
        }

        let crack = match config.precrack {
            PrecrackMode::Disabled => None,
            PrecrackMode::Centered => equivalent_grain_size(limit, uncracked_count)
                .map(|grain_size| CrackRegion::centered(limit, grain_size)),
            PrecrackMode::Explicit(region) => Some(region),
        };

        let (grains, removed) = match &crack {
            Some(region) => {
                let outcome = insert_crack(&raw.grains, region);
                (outcome.remaining, outcome.removed)
            }
            None => (raw.grains, Vec::new()),
        };

        let microstructure = Self::assemble(
            config,
            grains,
            raw.region_count,
            uncracked_count,
            crack,
            removed,
        );

        info!(
            seed = config.seed,
            size = config.size,
            grains = uncracked_count,
            removed = microstructure.removed.len(),
            average_grain_area = microstructure.average_grain_area(),
            grain_size = microstructure.grain_size(),
            length_scale_1 = config.length_scale_1(),
            length_scale_2 = config.length_scale_2(),
            "microstructure generated"
        );

        Ok(microstructure)
    }

    /// Rebuild a microstructure from a snapshot without re-tessellating
    ///
    /// Grain geometry, ids and the crack come straight from the snapshot. Fields
    /// a snapshot does not record (precrack mode) take their defaults.
    pub fn from_snapshot(snapshot: &Snapshot) -> Result<Self> {
        let grains = snapshot.grains()?;
        let primary = snapshot.primary();
        let secondary = snapshot.secondary();
        let config = MicrostructureConfig {
            size: snapshot.size,
            seed: snapshot.seed,
            jitter: snapshot.jitter,
            gap_distance: snapshot.gap_distance,
            region_filter: snapshot.region_filter,
            primary,
            secondary,
            mesh_size: snapshot.mesh_size,
            coh_stiffness: snapshot.coh_stiffness,
            modulus: snapshot.modulus,
            precrack: match snapshot.crack {
                Some(region) => PrecrackMode::Explicit(region),
                None => PrecrackMode::Disabled,
            },
        };

        // the removed ids are not persisted; only the survivors are known
        let count = grains.len();
        Ok(Self::assemble(
            config,
            grains,
            snapshot.region_count,
            count,
            snapshot.crack,
            Vec::new(),
        ))
    }

    fn assemble(
        config: MicrostructureConfig,
        grains: GrainMap,
        region_count: usize,
        uncracked_count: usize,
        crack: Option<CrackRegion>,
        removed: Vec<usize>,
    ) -> Self {
        // Build spatial index (requires spatial-index feature)
        #[cfg(feature = "spatial-index")]
        let spatial_index = SpatialIndex::new(&grains);

        Self {
            config,
            grains,
            region_count,
            uncracked_count,
            crack,
            removed,
            #[cfg(feature = "spatial-index")]
            spatial_index,
        }
    }

    /// Serializable record of this microstructure
    pub fn snapshot(&self) -> Snapshot {
        Snapshot::new(&self.config, &self.grains, self.region_count, self.crack)
    }

    /// Get the configuration used to generate this microstructure
    #[inline]
    pub fn config(&self) -> &MicrostructureConfig {
        &self.config
    }

    /// Number of grains after crack insertion
    #[inline]
    pub fn grain_count(&self) -> usize {
        self.grains.len()
    }

    /// Number of raw tessellation regions
    #[inline]
    pub fn region_count(&self) -> usize {
        self.region_count
    }

    /// Get a grain by id
    ///
    /// Returns `None` for filtered regions, cracked grains and out-of-range ids.
    ///
    /// # Example
    ///
    /// ```
    /// # use voronoi_polycrystal::*;
    /// # let config = MicrostructureConfigBuilder::new().size(8).unwrap().seed(3).build();
    /// # let microstructure = Microstructure::generate(config).unwrap();
    /// // hull regions are unbounded and never become grains
    /// assert!(microstructure.get_grain(0).is_none());
    /// ```
    #[inline]
    pub fn get_grain(&self, id: usize) -> Option<&Grain> {
        self.grains.get(&id)
    }

    /// All grains, ordered by id
    #[inline]
    pub fn grains(&self) -> &GrainMap {
        &self.grains
    }

    /// The applied precrack rectangle
    #[inline]
    pub fn crack(&self) -> Option<&CrackRegion> {
        self.crack.as_ref()
    }

    /// Ids deleted by the precrack during generation
    ///
    /// Empty for a microstructure rebuilt from a snapshot.
    #[inline]
    pub fn removed_grains(&self) -> &[usize] {
        &self.removed
    }

    /// Domain area per grain, counted before crack insertion
    pub fn average_grain_area(&self) -> Option<f64> {
        if self.uncracked_count == 0 {
            return None;
        }
        let limit = self.config.limit();
        Some(limit * limit / self.uncracked_count as f64)
    }

    /// Equivalent-circle grain diameter, counted before crack insertion
    pub fn grain_size(&self) -> Option<f64> {
        equivalent_grain_size(self.config.limit(), self.uncracked_count)
    }

    /// Delaunay adjacency of the grain centers
    pub fn adjacency(&self) -> Result<GrainAdjacency> {
        GrainAdjacency::from_grains(&self.grains, self.region_count)
    }

    /// Find the grain nearest to a position (requires spatial-index feature)
    ///
    /// # Example
    ///
    /// ```
    /// # use voronoi_polycrystal::*;
    /// # #[cfg(feature = "spatial-index")]
    /// # {
    /// # let config = MicrostructureConfigBuilder::new().size(8).unwrap().seed(3).build();
    /// # let microstructure = Microstructure::generate(config).unwrap();
    /// let grain = microstructure.grains().values().next().unwrap();
    /// assert_eq!(microstructure.find_grain_at(grain.center), Some(grain.id));
    /// # }
    /// ```
    #[cfg(feature = "spatial-index")]
    pub fn find_grain_at(&self, position: DVec2) -> Option<usize> {
        self.spatial_index.find_nearest(position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MicrostructureConfigBuilder;
    use approx::assert_relative_eq;

    fn config(size: usize, seed: u64, precrack: PrecrackMode) -> MicrostructureConfig {
        MicrostructureConfigBuilder::new()
            .size(size)
            .unwrap()
            .seed(seed)
            .gap_distance(0.1)
            .unwrap()
            .precrack(precrack)
            .build()
    }

    #[test]
    fn test_small_lattice_is_deterministic_and_non_empty() {
        let a = Microstructure::generate(config(4, 1234, PrecrackMode::Disabled)).unwrap();
        let b = Microstructure::generate(config(4, 1234, PrecrackMode::Disabled)).unwrap();
        assert!(a.grain_count() > 0);
        assert_eq!(a.grains(), b.grains());
        assert_eq!(a.snapshot().to_json().unwrap(), b.snapshot().to_json().unwrap());
    }

    #[test]
    fn test_centered_precrack_reduces_grain_count() {
        let uncracked = Microstructure::generate(config(12, 1234, PrecrackMode::Disabled)).unwrap();
        let cracked = Microstructure::generate(config(12, 1234, PrecrackMode::Centered)).unwrap();

        assert!(cracked.grain_count() < uncracked.grain_count());
        assert_eq!(
            cracked.grain_count() + cracked.removed_grains().len(),
            uncracked.grain_count()
        );

        let region = cracked.crack().unwrap();
        assert_relative_eq!(region.x_max, 2.0);
        for grain in cracked.grains().values() {
            assert!(!region.contains(grain.center.x, grain.center.y));
        }
        for id in cracked.removed_grains() {
            assert!(uncracked.get_grain(*id).is_some());
        }
    }

    #[test]
    fn test_explicit_precrack() {
        let region = CrackRegion::new(5.0, 3.0, 7.0).unwrap();
        let m = Microstructure::generate(config(10, 2, PrecrackMode::Explicit(region))).unwrap();
        assert_eq!(m.crack(), Some(&region));
        assert!(!m.removed_grains().is_empty());
    }

    #[test]
    fn test_zero_grain_run_is_valid() {
        let m = Microstructure::generate(config(2, 9, PrecrackMode::Centered)).unwrap();
        assert_eq!(m.grain_count(), 0);
        assert!(m.crack().is_none());
        assert!(m.grain_size().is_none());
        assert!(m.adjacency().unwrap().pairs().next().is_none());
    }

    #[test]
    fn test_statistics() {
        let m = Microstructure::generate(config(10, 5, PrecrackMode::Disabled)).unwrap();
        let n = m.grain_count() as f64;
        assert_relative_eq!(m.average_grain_area().unwrap(), 100.0 / n);
        assert_relative_eq!(
            m.grain_size().unwrap(),
            2.0 * (100.0 / n / std::f64::consts::PI).sqrt()
        );
        assert_eq!(equivalent_grain_size(10.0, 0), None);
    }

    #[test]
    fn test_snapshot_reconstruction() {
        let original = Microstructure::generate(config(10, 77, PrecrackMode::Centered)).unwrap();
        let snapshot = original.snapshot();
        let rebuilt = Microstructure::from_snapshot(&snapshot).unwrap();

        assert_eq!(rebuilt.grains(), original.grains());
        assert_eq!(rebuilt.region_count(), original.region_count());
        assert_eq!(rebuilt.crack(), original.crack());
        assert_eq!(rebuilt.config().seed, 77);
        assert_eq!(rebuilt.snapshot(), snapshot);
    }

    #[test]
    fn test_adjacency_only_between_grains() {
        let m = Microstructure::generate(config(10, 6, PrecrackMode::Centered)).unwrap();
        let adjacency = m.adjacency().unwrap();
        for (a, b) in adjacency.pairs() {
            assert!(m.get_grain(a).is_some() && m.get_grain(b).is_some());
        }
        for id in m.removed_grains() {
            assert!(adjacency.neighbors(*id).is_none());
        }
    }

    #[cfg(feature = "spatial-index")]
    #[test]
    fn test_find_grain_at() {
        let m = Microstructure::generate(config(10, 42, PrecrackMode::Disabled)).unwrap();
        for grain in m.grains().values() {
            assert_eq!(m.find_grain_at(grain.center), Some(grain.id));
        }
    }
}
