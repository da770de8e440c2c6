//! Heterogeneous modification pass
//!
//! Reloads a snapshot, picks a seeded random subset of grains and switches
//! every interface around those grains to the secondary property bucket.
//! The result is a new snapshot that can feed the next round.
//!
//! # Example
//!
//! ```rust
//! use voronoi_polycrystal::*;
//!
//! let config = MicrostructureConfigBuilder::new()
//!     .size(10).unwrap()
//!     .seed(7)
//!     .build();
//! let snapshot = Microstructure::generate(config).unwrap().snapshot();
//!
//! let round = ModificationConfigBuilder::new()
//!     .fraction(0.3).unwrap()
//!     .seed(11)
//!     .ratios(0.5, 1.0).unwrap()
//!     .build();
//! let modification = modify(&snapshot, &round).unwrap();
//!
//! assert_eq!(modification.seed, 11);
//! assert_eq!(modification.snapshot.prop_2, snapshot.prop_1 * 0.5);
//! for (a, b) in modification.modified_pairs() {
//!     assert!(modification.modified.contains(&a) || modification.modified.contains(&b));
//! }
//! ```

pub mod adjacency;
mod selection;

pub use adjacency::{dense_positions, GrainAdjacency};
pub use selection::{near_loaded_boundary, select_grains};

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::{InterfaceProperties, ModificationConfig};
use crate::error::Result;
use crate::snapshot::{ModificationRecord, Snapshot};

/// Property bucket of one grain-pair interface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum InterfaceProperty {
    /// Primary bucket (`Prop-1`)
    #[default]
    Default,
    /// Secondary bucket (`Prop-2`)
    Modified,
}

/// Interface bucket per adjacent pair, keyed `(smaller id, larger id)`
pub type InterfaceMap = BTreeMap<(usize, usize), InterfaceProperty>;

/// Assign a bucket to every adjacent pair
///
/// A pair is `Modified` when either grain is modified, so the whole boundary
/// of a modified grain changes, not just the faces it shares with other
/// modified grains.
pub fn assign_interfaces(adjacency: &GrainAdjacency, modified: &BTreeSet<usize>) -> InterfaceMap {
    adjacency
        .pairs()
        .map(|(a, b)| {
            let property = if modified.contains(&a) || modified.contains(&b) {
                InterfaceProperty::Modified
            } else {
                InterfaceProperty::Default
            };
            ((a, b), property)
        })
        .collect()
}

/// Outcome of one modification round
#[derive(Debug, Clone)]
pub struct Modification {
    /// Seed the selection stream was created from
    pub seed: u64,
    pub fraction: f64,
    /// Effective primary bucket
    pub primary: InterfaceProperties,
    /// Effective secondary bucket
    pub secondary: InterfaceProperties,
    /// Selected grain ids
    pub modified: BTreeSet<usize>,
    pub adjacency: GrainAdjacency,
    pub interfaces: InterfaceMap,
    /// Chained snapshot carrying the effective properties and this round's record
    pub snapshot: Snapshot,
}

impl Modification {
    /// Pairs assigned to the secondary bucket, ascending
    pub fn modified_pairs(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.interfaces
            .iter()
            .filter(|(_, &p)| p == InterfaceProperty::Modified)
            .map(|(&pair, _)| pair)
    }
}

/// Run a modification round on a loaded snapshot
///
/// # Errors
///
/// Returns `InvalidParameter` for a fraction outside `[0, 1]` (or any other
/// invalid override) before anything is computed, and `InconsistentSnapshot`
/// if the snapshot's grain maps disagree.
pub fn modify(snapshot: &Snapshot, config: &ModificationConfig) -> Result<Modification> {
    config.validate()?;
    let grains = snapshot.grains()?;

    let seed = config.seed.unwrap_or_else(rand::random);
    let mut rng = ChaCha8Rng::seed_from_u64(seed);

    let (primary, secondary) = config.resolve(snapshot.primary(), snapshot.secondary());
    let secondary_weaker = secondary.strength < primary.strength;

    let modified = select_grains(
        &grains,
        config.fraction,
        snapshot.size as f64,
        secondary_weaker,
        &mut rng,
    );
    debug!(
        selected = modified.len(),
        grains = grains.len(),
        secondary_weaker,
        "grains selected"
    );

    let adjacency = GrainAdjacency::from_grains(&grains, snapshot.region_count)?;
    let interfaces = assign_interfaces(&adjacency, &modified);

    let mut next = snapshot.clone();
    next.set_properties(primary, secondary);
    next.modification = Some(ModificationRecord {
        seed,
        fraction: config.fraction,
        modified_grains: modified.iter().copied().collect(),
    });

    let modification = Modification {
        seed,
        fraction: config.fraction,
        primary,
        secondary,
        modified,
        adjacency,
        interfaces,
        snapshot: next,
    };
    info!(
        seed,
        fraction = config.fraction,
        modified = modification.modified.len(),
        modified_interfaces = modification.modified_pairs().count(),
        interfaces = modification.interfaces.len(),
        "modification complete"
    );
    Ok(modification)
}

/// Load a snapshot file and run a modification round on it
///
/// The fraction is checked before the file is touched.
pub fn modify_file(path: &Path, config: &ModificationConfig) -> Result<Modification> {
    config.validate()?;
    let snapshot = Snapshot::read(path)?;
    modify(&snapshot, config)
}
