//! Persistent microstructure snapshots
//!
//! A snapshot is the only channel between a generation run and later
//! modification rounds: it carries the finished grain geometry, so nothing
//! downstream has to re-run the seed-sensitive tessellation.
//!
//! # Format
//!
//! A JSON object with an explicit schema `version`. Grain maps are JSON objects
//! keyed by grain id; JSON keys are always text, and loading converts them back
//! to integer ids (a key that is not an integer fails the load). Points are
//! `[x, y]` arrays.

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use glam::DVec2;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::{InterfaceProperties, MicrostructureConfig};
use crate::crack::CrackRegion;
use crate::error::{MicrostructureError, Result};
use crate::generation::RegionFilter;
use crate::grain::{Grain, GrainMap};

/// Schema version written by this crate
pub const SNAPSHOT_VERSION: u32 = 1;

/// What a modification round did to the snapshot it was derived from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModificationRecord {
    /// Seed of the selection stream
    pub seed: u64,
    /// Requested modification fraction
    pub fraction: f64,
    /// Ids of the grains whose interfaces were switched to `Prop-2`, ascending
    pub modified_grains: Vec<usize>,
}

/// Serializable record of a generated microstructure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub version: u32,
    pub size: usize,
    /// Seed the geometry was generated with
    pub seed: u64,
    pub jitter: f64,
    pub gap_distance: f64,
    pub region_filter: RegionFilter,
    /// Primary interface strength
    pub prop_1: f64,
    /// Secondary interface strength
    pub prop_2: f64,
    pub mesh_size: f64,
    pub coh_stiffness: f64,
    /// Primary critical displacement
    pub plastic_displacement: f64,
    /// Secondary critical displacement
    pub plastic_displacement_2: f64,
    pub modulus: f64,
    pub length_scale_1: f64,
    pub length_scale_2: f64,
    pub grain_polygons: BTreeMap<usize, Vec<DVec2>>,
    pub grain_centers: BTreeMap<usize, DVec2>,
    /// Number of raw tessellation regions; every grain id is below it
    pub region_count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crack: Option<CrackRegion>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modification: Option<ModificationRecord>,
}

impl Snapshot {
    /// Capture a configuration and its grains
    pub fn new(
        config: &MicrostructureConfig,
        grains: &GrainMap,
        region_count: usize,
        crack: Option<CrackRegion>,
    ) -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            size: config.size,
            seed: config.seed,
            jitter: config.jitter,
            gap_distance: config.gap_distance,
            region_filter: config.region_filter,
            prop_1: config.primary.strength,
            prop_2: config.secondary.strength,
            mesh_size: config.mesh_size,
            coh_stiffness: config.coh_stiffness,
            plastic_displacement: config.primary.critical_displacement,
            plastic_displacement_2: config.secondary.critical_displacement,
            modulus: config.modulus,
            length_scale_1: config.length_scale_1(),
            length_scale_2: config.length_scale_2(),
            grain_polygons: grains
                .iter()
                .map(|(&id, g)| (id, g.polygon.clone()))
                .collect(),
            grain_centers: grains.iter().map(|(&id, g)| (id, g.center)).collect(),
            region_count,
            crack,
            modification: None,
        }
    }

    /// Primary interface bucket
    pub fn primary(&self) -> InterfaceProperties {
        InterfaceProperties {
            strength: self.prop_1,
            critical_displacement: self.plastic_displacement,
        }
    }

    /// Secondary interface bucket
    pub fn secondary(&self) -> InterfaceProperties {
        InterfaceProperties {
            strength: self.prop_2,
            critical_displacement: self.plastic_displacement_2,
        }
    }

    /// Replace both interface buckets, refreshing the derived length scales
    pub fn set_properties(&mut self, primary: InterfaceProperties, secondary: InterfaceProperties) {
        self.prop_1 = primary.strength;
        self.plastic_displacement = primary.critical_displacement;
        self.prop_2 = secondary.strength;
        self.plastic_displacement_2 = secondary.critical_displacement;
        self.length_scale_1 = primary.length_scale(self.modulus);
        self.length_scale_2 = secondary.length_scale(self.modulus);
    }

    /// Rebuild the grain map
    ///
    /// # Errors
    ///
    /// Returns `InconsistentSnapshot` if a grain has a polygon but no center
    /// (or the reverse), or an id is not below `region_count`.
    pub fn grains(&self) -> Result<GrainMap> {
        self.check_consistency()?;
        Ok(self
            .grain_polygons
            .iter()
            .map(|(&id, polygon)| {
                let center = self.grain_centers[&id];
                (id, Grain::new(id, polygon.clone(), center))
            })
            .collect())
    }

    /// Check the invariants the load step relies on
    pub fn check_consistency(&self) -> Result<()> {
        if self.version != SNAPSHOT_VERSION {
            return Err(MicrostructureError::UnsupportedSnapshotVersion {
                found: self.version,
                expected: SNAPSHOT_VERSION,
            });
        }
        if let Some(id) = self
            .grain_polygons
            .keys()
            .find(|id| !self.grain_centers.contains_key(id))
        {
            return Err(MicrostructureError::InconsistentSnapshot(format!(
                "grain {} has a polygon but no center",
                id
            )));
        }
        if let Some(id) = self
            .grain_centers
            .keys()
            .find(|id| !self.grain_polygons.contains_key(id))
        {
            return Err(MicrostructureError::InconsistentSnapshot(format!(
                "grain {} has a center but no polygon",
                id
            )));
        }
        if let Some(&id) = self.grain_polygons.keys().next_back() {
            if id >= self.region_count {
                return Err(MicrostructureError::InconsistentSnapshot(format!(
                    "grain id {} is not below region_count {}",
                    id, self.region_count
                )));
            }
        }
        Ok(())
    }

    /// Serialize to JSON text
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(MicrostructureError::SnapshotEncode)
    }

    /// Parse JSON text and validate it; `origin` only labels errors
    pub fn from_json(json: &str, origin: &Path) -> Result<Self> {
        let snapshot: Snapshot =
            serde_json::from_str(json).map_err(|source| MicrostructureError::SnapshotParse {
                path: origin.to_path_buf(),
                source,
            })?;
        snapshot.check_consistency()?;
        Ok(snapshot)
    }

    /// Write the snapshot to `path`
    ///
    /// The whole document is rendered in memory first, written to a sibling
    /// temporary file and renamed over `path`, so a failed run never leaves a
    /// half-written snapshot behind.
    pub fn write(&self, path: &Path) -> Result<()> {
        let json = self.to_json()?;

        let mut tmp_name = path.file_name().unwrap_or_default().to_os_string();
        tmp_name.push(".tmp");
        let tmp = path.with_file_name(tmp_name);

        let io_err = |source| MicrostructureError::SnapshotIo {
            path: path.to_path_buf(),
            source,
        };
        fs::write(&tmp, json).map_err(io_err)?;
        if let Err(source) = fs::rename(&tmp, path) {
            if let Err(e) = fs::remove_file(&tmp) {
                warn!(path = %tmp.display(), error = %e, "temporary snapshot not removed");
            }
            return Err(io_err(source));
        }

        info!(
            path = %path.display(),
            grains = self.grain_polygons.len(),
            "snapshot written"
        );
        Ok(())
    }

    /// Read and validate a snapshot from `path`
    pub fn read(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path).map_err(|source| match source.kind() {
            ErrorKind::NotFound => MicrostructureError::SnapshotNotFound {
                path: path.to_path_buf(),
            },
            _ => MicrostructureError::SnapshotIo {
                path: path.to_path_buf(),
                source,
            },
        })?;
        let snapshot = Self::from_json(&json, path)?;
        debug!(
            path = %path.display(),
            grains = snapshot.grain_polygons.len(),
            seed = snapshot.seed,
            "snapshot loaded"
        );
        Ok(snapshot)
    }
}

/// Snapshot path stored next to a solver model file: `name.cae` -> `name.json`
///
/// # Errors
///
/// Returns `InvalidParameter` if the model path does not end in `.cae`.
///
/// # Example
///
/// ```rust
/// use std::path::Path;
/// use voronoi_polycrystal::snapshot_path_for_model;
///
/// let json = snapshot_path_for_model(Path::new("runs/size_80_seed_1234.cae")).unwrap();
/// assert_eq!(json, Path::new("runs/size_80_seed_1234.json"));
/// assert!(snapshot_path_for_model(Path::new("model.inp")).is_err());
/// ```
pub fn snapshot_path_for_model(model: &Path) -> Result<PathBuf> {
    match model.extension().and_then(|e| e.to_str()) {
        Some("cae") => Ok(model.with_extension("json")),
        _ => Err(MicrostructureError::invalid(
            "cae_filename",
            format!("must end with .cae (got {})", model.display()),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MicrostructureConfigBuilder;
    use approx::assert_relative_eq;

    fn sample_grains() -> GrainMap {
        let mut grains = GrainMap::new();
        grains.insert(
            3,
            Grain::new(
                3,
                vec![
                    DVec2::new(1.1, 1.0),
                    DVec2::new(1.9, 1.05),
                    DVec2::new(1.5, 1.8),
                ],
                DVec2::new(1.5, 1.3),
            ),
        );
        grains.insert(
            17,
            Grain::new(
                17,
                vec![
                    DVec2::new(2.1, 0.3333333333333333),
                    DVec2::new(2.9, 0.4),
                    DVec2::new(2.5, 1.0 / 7.0 + 1.0),
                ],
                DVec2::new(2.5, 0.6),
            ),
        );
        grains
    }

    fn sample_snapshot() -> Snapshot {
        let config = MicrostructureConfigBuilder::new()
            .size(4)
            .unwrap()
            .seed(1234)
            .build();
        Snapshot::new(&config, &sample_grains(), 20, None)
    }

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("voronoi_polycrystal_{}_{}", std::process::id(), name))
    }

    #[test]
    fn test_json_keys_are_text_and_load_as_integers() {
        let snapshot = sample_snapshot();
        let json = snapshot.to_json().unwrap();

        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        let polygons = value["grain_polygons"].as_object().unwrap();
        assert!(polygons.contains_key("3"));
        assert!(polygons.contains_key("17"));
        assert_eq!(value["grain_centers"]["17"], serde_json::json!([2.5, 0.6]));

        let restored = Snapshot::from_json(&json, Path::new("mem")).unwrap();
        let grains = restored.grains().unwrap();
        assert_eq!(grains.keys().copied().collect::<Vec<_>>(), vec![3, 17]);
        assert_eq!(grains, sample_grains());
    }

    #[test]
    fn test_file_round_trip() {
        let path = temp_path("round_trip.json");
        let snapshot = sample_snapshot();
        snapshot.write(&path).unwrap();

        let restored = Snapshot::read(&path).unwrap();
        assert_eq!(restored, snapshot);
        assert_relative_eq!(restored.length_scale_1, snapshot.length_scale_1);
        let mut tmp = path.file_name().unwrap().to_os_string();
        tmp.push(".tmp");
        assert!(!path.with_file_name(tmp).exists());

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_failed_rename_removes_temporary_file() {
        // a directory in the way makes the final rename fail
        let path = temp_path("blocked.json");
        fs::create_dir_all(path.join("occupied")).unwrap();

        let err = sample_snapshot().write(&path).unwrap_err();
        assert!(matches!(err, MicrostructureError::SnapshotIo { .. }));

        let mut tmp = path.file_name().unwrap().to_os_string();
        tmp.push(".tmp");
        assert!(!path.with_file_name(tmp).exists());

        fs::remove_dir_all(&path).unwrap();
    }

    #[test]
    fn test_missing_file() {
        let err = Snapshot::read(&temp_path("does_not_exist.json")).unwrap_err();
        assert!(matches!(err, MicrostructureError::SnapshotNotFound { .. }));
    }

    #[test]
    fn test_non_integer_key_rejected() {
        let mut value: serde_json::Value =
            serde_json::from_str(&sample_snapshot().to_json().unwrap()).unwrap();
        value["grain_centers"]["abc"] = serde_json::json!([0.0, 0.0]);
        let err = Snapshot::from_json(&value.to_string(), Path::new("mem")).unwrap_err();
        assert!(matches!(err, MicrostructureError::SnapshotParse { .. }));
    }

    #[test]
    fn test_missing_field_rejected() {
        let mut value: serde_json::Value =
            serde_json::from_str(&sample_snapshot().to_json().unwrap()).unwrap();
        value.as_object_mut().unwrap().remove("region_count");
        let err = Snapshot::from_json(&value.to_string(), Path::new("mem")).unwrap_err();
        assert!(matches!(err, MicrostructureError::SnapshotParse { .. }));
    }

    #[test]
    fn test_version_mismatch_rejected() {
        let mut snapshot = sample_snapshot();
        snapshot.version = 99;
        let json = serde_json::to_string(&snapshot).unwrap();
        let err = Snapshot::from_json(&json, Path::new("mem")).unwrap_err();
        assert!(matches!(
            err,
            MicrostructureError::UnsupportedSnapshotVersion { found: 99, .. }
        ));
    }

    #[test]
    fn test_inconsistent_maps_rejected() {
        let mut snapshot = sample_snapshot();
        snapshot.grain_centers.remove(&17);
        assert!(matches!(
            snapshot.grains(),
            Err(MicrostructureError::InconsistentSnapshot(_))
        ));

        let mut snapshot = sample_snapshot();
        snapshot.region_count = 17;
        assert!(matches!(
            snapshot.check_consistency(),
            Err(MicrostructureError::InconsistentSnapshot(_))
        ));
    }

    #[test]
    fn test_set_properties_refreshes_length_scales() {
        let mut snapshot = sample_snapshot();
        let primary = snapshot.primary();
        let secondary = primary.scaled(0.5, 1.0);
        snapshot.set_properties(primary, secondary);
        assert_eq!(snapshot.prop_2, primary.strength * 0.5);
        assert_relative_eq!(snapshot.length_scale_2, secondary.length_scale(snapshot.modulus));
        assert!(snapshot.length_scale_2 > snapshot.length_scale_1);
    }

    #[test]
    fn test_model_path_extension() {
        assert_eq!(
            snapshot_path_for_model(Path::new("a.cae")).unwrap(),
            PathBuf::from("a.json")
        );
        let err = snapshot_path_for_model(Path::new("a.json")).unwrap_err();
        assert!(matches!(
            err,
            MicrostructureError::InvalidParameter { name: "cae_filename", .. }
        ));
    }
}
