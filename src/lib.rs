//! Voronoi-based polycrystal microstructure generation
//!
//! A standalone library for building 2D polycrystalline microstructures for
//! cohesive-zone fracture models: grains are shrunk Voronoi cells separated by a
//! uniform gap, with an optional precrack and seeded heterogeneous interface
//! properties.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use std::path::Path;
//! use voronoi_polycrystal::*;
//!
//! // Generate a microstructure
//! let config = MicrostructureConfigBuilder::new()
//!     .size(40).unwrap()
//!     .seed(1234)
//!     .prop_1(50_000.0).unwrap()
//!     .build();
//!
//! let microstructure = Microstructure::generate(config).unwrap();
//! microstructure.snapshot().write(Path::new("size_40_seed_1234.json")).unwrap();
//!
//! // Later: weaken the interfaces around 20% of the grains
//! let round = ModificationConfigBuilder::new()
//!     .fraction(0.2).unwrap()
//!     .ratios(0.75, 1.0).unwrap()
//!     .build();
//! let modification = modify_file(Path::new("size_40_seed_1234.json"), &round).unwrap();
//!
//! let descriptor = describe_modification(&modification, &BasicPropertyNaming).unwrap();
//! println!("{} interfaces modified", descriptor.overrides().count());
//! ```
//!
//! # Features
//!
//! - `spatial-index` (default): Enables O(log n) position-to-grain lookups using KD-tree

// Modules
pub mod error;
pub mod config;
pub mod geometry;
pub mod grain;
pub mod generation;
pub mod crack;
pub mod microstructure;
pub mod snapshot;
pub mod modification;
pub mod descriptor;

#[cfg(feature = "spatial-index")]
pub mod spatial;

// Re-export core types for convenience
pub use error::{MicrostructureError, Result};
pub use config::{
    InterfaceProperties, MicrostructureConfig, MicrostructureConfigBuilder, ModificationConfig,
    ModificationConfigBuilder, PrecrackMode,
};
pub use grain::{Grain, GrainMap};
pub use generation::{RawGrains, RegionFilter};
pub use crack::{insert_crack, CrackOutcome, CrackRegion};
pub use microstructure::{equivalent_grain_size, Microstructure};
pub use snapshot::{snapshot_path_for_model, ModificationRecord, Snapshot, SNAPSHOT_VERSION};
pub use modification::{
    assign_interfaces, modify, modify_file, GrainAdjacency, InterfaceMap, InterfaceProperty,
    Modification,
};
pub use descriptor::{
    describe, describe_modification, BasicPropertyNaming, CustomPropertyNaming,
    GeometryDescriptor, GrainSurface, InterfaceAssignment, PropertyNaming,
};

#[cfg(feature = "spatial-index")]
pub use spatial::SpatialIndex;

// Re-export glam::DVec2 for convenience
pub use glam::DVec2;
