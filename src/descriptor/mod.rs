//! Geometry/property descriptor for solver-input translators
//!
//! Flattens grains and interface assignments into named surfaces and
//! per-pair property names. A translator builds parts, sections and contact
//! interactions from this without touching the generation code.

mod naming;

pub use naming::{BasicPropertyNaming, CustomPropertyNaming, PropertyNaming};

use std::collections::BTreeSet;

use glam::DVec2;
use serde::Serialize;

use crate::error::Result;
use crate::grain::GrainMap;
use crate::modification::{InterfaceMap, InterfaceProperty, Modification};

/// One grain as a named closed surface
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GrainSurface {
    pub id: usize,
    pub surface: String,
    /// Shrunk polygon, counter-clockwise
    pub polygon: Vec<DVec2>,
    /// Edge midpoints, one per polygon edge, used to pick the surface edges
    pub anchors: Vec<DVec2>,
}

/// Property of the interface between two grain surfaces
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InterfaceAssignment {
    pub grains: (usize, usize),
    pub first: String,
    pub second: String,
    pub property: String,
}

/// Everything a translator needs, in stable id order
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GeometryDescriptor {
    pub grains: Vec<GrainSurface>,
    /// Property of every interface without an explicit assignment
    pub default_property: String,
    pub interfaces: Vec<InterfaceAssignment>,
}

impl GeometryDescriptor {
    /// Interfaces whose property is not the default
    pub fn overrides(&self) -> impl Iterator<Item = &InterfaceAssignment> {
        self.interfaces
            .iter()
            .filter(move |a| a.property != self.default_property)
    }
}

/// Build a descriptor
///
/// Grains with fewer than three vertices get no surface, and interface pairs
/// naming a grain without a surface are skipped. Pass
/// `None` for `interfaces` when every interface uses the default property.
///
/// # Example
///
/// ```rust
/// use voronoi_polycrystal::*;
///
/// let config = MicrostructureConfigBuilder::new().size(8).unwrap().seed(1).build();
/// let microstructure = Microstructure::generate(config).unwrap();
///
/// let descriptor = describe(microstructure.grains(), None, &BasicPropertyNaming);
/// assert_eq!(descriptor.grains.len(), microstructure.grain_count());
/// assert_eq!(descriptor.default_property, "Prop-1");
/// assert!(descriptor.interfaces.is_empty());
/// ```
pub fn describe<N: PropertyNaming>(
    grains: &GrainMap,
    interfaces: Option<&InterfaceMap>,
    naming: &N,
) -> GeometryDescriptor {
    let surfaces: Vec<GrainSurface> = grains
        .values()
        .filter(|g| g.vertex_count() >= 3)
        .map(|g| GrainSurface {
            id: g.id,
            surface: naming.surface_name(g.id),
            polygon: g.polygon.clone(),
            anchors: g.edge_midpoints(),
        })
        .collect();
    let emitted: BTreeSet<usize> = surfaces.iter().map(|s| s.id).collect();

    let assignments = interfaces
        .into_iter()
        .flatten()
        .filter(|((a, b), _)| emitted.contains(a) && emitted.contains(b))
        .map(|(&(a, b), &property)| InterfaceAssignment {
            grains: (a, b),
            first: naming.surface_name(a),
            second: naming.surface_name(b),
            property: naming.property_name(property),
        })
        .collect();

    GeometryDescriptor {
        grains: surfaces,
        default_property: naming.property_name(InterfaceProperty::Default),
        interfaces: assignments,
    }
}

/// Descriptor of a modification round's chained snapshot
pub fn describe_modification<N: PropertyNaming>(
    modification: &Modification,
    naming: &N,
) -> Result<GeometryDescriptor> {
    let grains = modification.snapshot.grains()?;
    Ok(describe(&grains, Some(&modification.interfaces), naming))
}
