//! Microstructure Configuration and Builders
//!
//! This module provides the parameter sets for deterministic microstructure
//! generation and for the heterogeneous modification pass. Every parameter the
//! pipeline reads travels through these structs; nothing is process-global.

use serde::{Deserialize, Serialize};

use crate::crack::CrackRegion;
use crate::error::{MicrostructureError, Result};
use crate::generation::{RegionFilter, DEFAULT_JITTER};

/// Cohesive interface behaviour of one property bucket
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InterfaceProperties {
    /// Damage-initiation traction
    pub strength: f64,
    /// Effective separation at complete failure (damage evolution)
    pub critical_displacement: f64,
}

impl InterfaceProperties {
    /// Fracture energy of a linear softening law: `½ · strength · critical_displacement`
    #[inline]
    pub fn toughness(&self) -> f64 {
        0.5 * self.strength * self.critical_displacement
    }

    /// Cohesive length scale `E · Γ / σ²` for a bulk modulus `E`
    #[inline]
    pub fn length_scale(&self, modulus: f64) -> f64 {
        modulus * self.toughness() / (self.strength * self.strength)
    }

    /// Derive a second bucket from strength and toughness ratios
    ///
    /// Strength scales by `strength_ratio`; the critical displacement scales by
    /// `toughness_ratio / strength_ratio` so that toughness scales by `toughness_ratio`.
    pub fn scaled(&self, strength_ratio: f64, toughness_ratio: f64) -> Self {
        Self {
            strength: self.strength * strength_ratio,
            critical_displacement: self.critical_displacement * toughness_ratio / strength_ratio,
        }
    }
}

impl Default for InterfaceProperties {
    fn default() -> Self {
        Self {
            strength: 50_000.0,
            critical_displacement: 1e-5,
        }
    }
}

/// How the precrack is placed after grain shrinking
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum PrecrackMode {
    /// Keep every grain
    Disabled,
    /// One grain tall, a sixth of the domain deep, centered vertically
    #[default]
    Centered,
    /// A caller-supplied rectangle
    Explicit(CrackRegion),
}

/// Configuration for deterministic microstructure generation
///
/// The same configuration always produces the same grains. The seed is
/// recorded in every snapshot written from the result.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MicrostructureConfig {
    /// Lattice dimension; the domain is `[0, size) x [0, size)`
    pub size: usize,

    /// Random seed of the lattice jitter
    pub seed: u64,

    /// Standard deviation of the per-axis Gaussian jitter
    pub jitter: f64,

    /// Inward offset of every grain edge (gap between two grains is twice this)
    pub gap_distance: f64,

    /// Which bounded regions become grains
    pub region_filter: RegionFilter,

    /// Interface behaviour everywhere by default (`Prop-1`)
    pub primary: InterfaceProperties,

    /// Interface behaviour around modified grains (`Prop-2`)
    pub secondary: InterfaceProperties,

    /// Mesh seed size handed to the solver preprocessor
    pub mesh_size: f64,

    /// Cohesive penalty stiffness
    pub coh_stiffness: f64,

    /// Bulk elastic modulus, used for cohesive length scales
    pub modulus: f64,

    /// Precrack placement
    pub precrack: PrecrackMode,
}

impl MicrostructureConfig {
    /// Domain limit on both axes
    #[inline]
    pub fn limit(&self) -> f64 {
        self.size as f64
    }

    /// Cohesive length scale of the primary interfaces
    #[inline]
    pub fn length_scale_1(&self) -> f64 {
        self.primary.length_scale(self.modulus)
    }

    /// Cohesive length scale of the secondary interfaces
    #[inline]
    pub fn length_scale_2(&self) -> f64 {
        self.secondary.length_scale(self.modulus)
    }
}

impl Default for MicrostructureConfig {
    fn default() -> Self {
        MicrostructureConfigBuilder::new().build()
    }
}

fn positive(name: &'static str, value: f64) -> Result<f64> {
    if value > 0.0 && value.is_finite() {
        Ok(value)
    } else {
        Err(MicrostructureError::invalid(
            name,
            format!("must be positive and finite (got {})", value),
        ))
    }
}

fn non_negative(name: &'static str, value: f64) -> Result<f64> {
    if value >= 0.0 && value.is_finite() {
        Ok(value)
    } else {
        Err(MicrostructureError::invalid(
            name,
            format!("must be non-negative and finite (got {})", value),
        ))
    }
}

/// Builder for creating MicrostructureConfig with validation
///
/// # Example
///
/// ```rust
/// use voronoi_polycrystal::*;
///
/// let config = MicrostructureConfigBuilder::new()
///     .size(20).unwrap()
///     .seed(1234)
///     .prop_1(50_000.0).unwrap()
///     .prop_2(37_500.0).unwrap()
///     .build();
///
/// assert_eq!(config.size, 20);
/// assert_eq!(config.seed, 1234);
/// ```
#[derive(Debug, Clone)]
pub struct MicrostructureConfigBuilder {
    size: usize,
    seed: Option<u64>,
    jitter: f64,
    gap_distance: f64,
    region_filter: RegionFilter,
    primary: InterfaceProperties,
    secondary: InterfaceProperties,
    mesh_size: f64,
    coh_stiffness: f64,
    modulus: f64,
    precrack: PrecrackMode,
}

impl MicrostructureConfigBuilder {
    /// Create a new builder with default values
    ///
    /// Defaults:
    /// - size: 80
    /// - seed: random
    /// - jitter: 0.125
    /// - gap_distance: 0.005
    /// - region_filter: any bounded region
    /// - primary/secondary: strength 50000, critical displacement 1e-5
    /// - mesh_size: 0.11
    /// - coh_stiffness: 1e9
    /// - modulus: 370e9 (alumina)
    /// - precrack: centered
    pub fn new() -> Self {
        Self {
            size: 80,
            seed: None,
            jitter: DEFAULT_JITTER,
            gap_distance: 0.005,
            region_filter: RegionFilter::default(),
            primary: InterfaceProperties::default(),
            secondary: InterfaceProperties::default(),
            mesh_size: 0.11,
            coh_stiffness: 1e9,
            modulus: 370e9,
            precrack: PrecrackMode::default(),
        }
    }

    /// Set the lattice dimension
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameter` if size is 0
    pub fn size(mut self, size: usize) -> Result<Self> {
        if size == 0 {
            return Err(MicrostructureError::invalid("size", "must be at least 1 (got 0)"));
        }
        self.size = size;
        Ok(self)
    }

    /// Set the random seed
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Set the jitter standard deviation
    pub fn jitter(mut self, jitter: f64) -> Result<Self> {
        self.jitter = non_negative("jitter", jitter)?;
        Ok(self)
    }

    /// Set the per-edge shrink distance
    pub fn gap_distance(mut self, distance: f64) -> Result<Self> {
        self.gap_distance = non_negative("gap_distance", distance)?;
        Ok(self)
    }

    /// Choose which bounded regions are kept
    pub fn region_filter(mut self, filter: RegionFilter) -> Self {
        self.region_filter = filter;
        self
    }

    /// Set the primary interface strength
    pub fn prop_1(mut self, strength: f64) -> Result<Self> {
        self.primary.strength = positive("prop_1", strength)?;
        Ok(self)
    }

    /// Set the secondary interface strength
    pub fn prop_2(mut self, strength: f64) -> Result<Self> {
        self.secondary.strength = positive("prop_2", strength)?;
        Ok(self)
    }

    /// Set the critical displacement of both interface buckets
    pub fn plastic_displacement(mut self, displacement: f64) -> Result<Self> {
        let displacement = positive("plastic_displacement", displacement)?;
        self.primary.critical_displacement = displacement;
        self.secondary.critical_displacement = displacement;
        Ok(self)
    }

    /// Set the mesh seed size
    pub fn mesh_size(mut self, mesh_size: f64) -> Result<Self> {
        self.mesh_size = positive("mesh_size", mesh_size)?;
        Ok(self)
    }

    /// Set the cohesive penalty stiffness
    pub fn coh_stiffness(mut self, stiffness: f64) -> Result<Self> {
        self.coh_stiffness = positive("coh_stiffness", stiffness)?;
        Ok(self)
    }

    /// Set the bulk elastic modulus
    pub fn modulus(mut self, modulus: f64) -> Result<Self> {
        self.modulus = positive("modulus", modulus)?;
        Ok(self)
    }

    /// Choose the precrack placement
    pub fn precrack(mut self, precrack: PrecrackMode) -> Self {
        self.precrack = precrack;
        self
    }

    /// Build the configuration
    ///
    /// If no seed was provided, a random one is drawn and recorded.
    pub fn build(self) -> MicrostructureConfig {
        MicrostructureConfig {
            size: self.size,
            seed: self.seed.unwrap_or_else(rand::random),
            jitter: self.jitter,
            gap_distance: self.gap_distance,
            region_filter: self.region_filter,
            primary: self.primary,
            secondary: self.secondary,
            mesh_size: self.mesh_size,
            coh_stiffness: self.coh_stiffness,
            modulus: self.modulus,
            precrack: self.precrack,
        }
    }
}

impl Default for MicrostructureConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Parameters of one heterogeneous modification round
///
/// Unset overrides fall back to the values recorded in the snapshot being
/// modified. For the secondary bucket an explicit override wins over `ratios`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ModificationConfig {
    /// Probability that a grain is selected, in `[0, 1]`
    pub fraction: f64,
    /// Seed of the selection stream; drawn at random when `None`
    pub seed: Option<u64>,
    pub prop_1: Option<f64>,
    pub prop_2: Option<f64>,
    pub crit_disp_1: Option<f64>,
    pub crit_disp_2: Option<f64>,
    /// `(strength_ratio, toughness_ratio)` of the secondary bucket relative to the primary
    pub ratios: Option<(f64, f64)>,
}

impl ModificationConfig {
    /// Check every parameter; called again by the modifier before it starts
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.fraction) {
            return Err(MicrostructureError::invalid(
                "mod_fraction",
                format!("must be within [0, 1] (got {})", self.fraction),
            ));
        }
        for (name, value) in [
            ("prop_1", self.prop_1),
            ("prop_2", self.prop_2),
            ("crit_disp_1", self.crit_disp_1),
            ("crit_disp_2", self.crit_disp_2),
        ] {
            if let Some(v) = value {
                positive(name, v)?;
            }
        }
        if let Some((strength_ratio, toughness_ratio)) = self.ratios {
            positive("strength_ratio", strength_ratio)?;
            positive("toughness_ratio", toughness_ratio)?;
        }
        Ok(())
    }

    /// Resolve the effective interface buckets against a base pair
    pub fn resolve(
        &self,
        base_primary: InterfaceProperties,
        base_secondary: InterfaceProperties,
    ) -> (InterfaceProperties, InterfaceProperties) {
        let primary = InterfaceProperties {
            strength: self.prop_1.unwrap_or(base_primary.strength),
            critical_displacement: self
                .crit_disp_1
                .unwrap_or(base_primary.critical_displacement),
        };
        let derived = match self.ratios {
            Some((strength_ratio, toughness_ratio)) => {
                primary.scaled(strength_ratio, toughness_ratio)
            }
            None => base_secondary,
        };
        let secondary = InterfaceProperties {
            strength: self.prop_2.unwrap_or(derived.strength),
            critical_displacement: self.crit_disp_2.unwrap_or(derived.critical_displacement),
        };
        (primary, secondary)
    }
}

/// Builder for ModificationConfig with validation
///
/// # Example
///
/// ```rust
/// use voronoi_polycrystal::*;
///
/// let config = ModificationConfigBuilder::new()
///     .fraction(0.2).unwrap()
///     .seed(42)
///     .ratios(0.75, 0.5).unwrap()
///     .build();
/// assert_eq!(config.fraction, 0.2);
///
/// assert!(ModificationConfigBuilder::new().fraction(1.5).is_err());
/// ```
#[derive(Debug, Clone, Default)]
pub struct ModificationConfigBuilder {
    config: ModificationConfig,
}

impl ModificationConfigBuilder {
    /// Create a builder selecting no grains, with a random seed and no overrides
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the fraction of grains to modify
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameter` if the fraction is outside `[0, 1]`
    pub fn fraction(mut self, fraction: f64) -> Result<Self> {
        self.config.fraction = fraction;
        self.config.validate()?;
        Ok(self)
    }

    /// Fix the seed of the selection stream
    pub fn seed(mut self, seed: u64) -> Self {
        self.config.seed = Some(seed);
        self
    }

    /// Override the primary strength
    pub fn prop_1(mut self, strength: f64) -> Result<Self> {
        self.config.prop_1 = Some(positive("prop_1", strength)?);
        Ok(self)
    }

    /// Override the secondary strength
    pub fn prop_2(mut self, strength: f64) -> Result<Self> {
        self.config.prop_2 = Some(positive("prop_2", strength)?);
        Ok(self)
    }

    /// Override the primary critical displacement
    pub fn crit_disp_1(mut self, displacement: f64) -> Result<Self> {
        self.config.crit_disp_1 = Some(positive("crit_disp_1", displacement)?);
        Ok(self)
    }

    /// Override the secondary critical displacement
    pub fn crit_disp_2(mut self, displacement: f64) -> Result<Self> {
        self.config.crit_disp_2 = Some(positive("crit_disp_2", displacement)?);
        Ok(self)
    }

    /// Derive the secondary bucket from the primary one
    pub fn ratios(mut self, strength_ratio: f64, toughness_ratio: f64) -> Result<Self> {
        positive("strength_ratio", strength_ratio)?;
        positive("toughness_ratio", toughness_ratio)?;
        self.config.ratios = Some((strength_ratio, toughness_ratio));
        Ok(self)
    }

    /// Build the configuration
    pub fn build(self) -> ModificationConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_builder_defaults() {
        let config = MicrostructureConfigBuilder::new().build();
        assert_eq!(config.size, 80);
        assert_eq!(config.gap_distance, 0.005);
        assert_eq!(config.jitter, 0.125);
        assert_eq!(config.region_filter, RegionFilter::AnyBounded);
        assert_eq!(config.precrack, PrecrackMode::Centered);
        assert_eq!(config.mesh_size, 0.11);
    }

    #[test]
    fn test_builder_custom() {
        let config = MicrostructureConfigBuilder::new()
            .size(12)
            .unwrap()
            .seed(99)
            .prop_1(100.0)
            .unwrap()
            .prop_2(50.0)
            .unwrap()
            .plastic_displacement(2e-5)
            .unwrap()
            .region_filter(RegionFilter::HexagonalOnly)
            .precrack(PrecrackMode::Disabled)
            .build();

        assert_eq!(config.size, 12);
        assert_eq!(config.seed, 99);
        assert_eq!(config.primary.strength, 100.0);
        assert_eq!(config.secondary.strength, 50.0);
        assert_eq!(config.secondary.critical_displacement, 2e-5);
        assert_eq!(config.limit(), 12.0);
    }

    #[test]
    fn test_builder_rejects_bad_values() {
        assert!(MicrostructureConfigBuilder::new().size(0).is_err());
        assert!(MicrostructureConfigBuilder::new().jitter(-1.0).is_err());
        assert!(MicrostructureConfigBuilder::new().gap_distance(f64::NAN).is_err());
        assert!(MicrostructureConfigBuilder::new().prop_1(0.0).is_err());
        assert!(MicrostructureConfigBuilder::new().mesh_size(-0.1).is_err());
        assert!(MicrostructureConfigBuilder::new().coh_stiffness(f64::INFINITY).is_err());
    }

    #[test]
    fn test_length_scale() {
        let props = InterfaceProperties {
            strength: 50_000.0,
            critical_displacement: 1e-5,
        };
        assert_relative_eq!(props.toughness(), 0.25);
        assert_relative_eq!(props.length_scale(370e9), 370e9 * 0.25 / 2.5e9);
    }

    #[test]
    fn test_scaled_keeps_toughness_ratio() {
        let base = InterfaceProperties::default();
        let scaled = base.scaled(0.75, 0.5);
        assert_relative_eq!(scaled.strength, base.strength * 0.75);
        assert_relative_eq!(scaled.toughness() / base.toughness(), 0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_config_serialization() {
        let config = MicrostructureConfigBuilder::new().seed(12345).build();
        let json = serde_json::to_string(&config).unwrap();
        let restored: MicrostructureConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, restored);
    }

    #[test]
    fn test_modification_fraction_range() {
        assert!(ModificationConfigBuilder::new().fraction(0.0).is_ok());
        assert!(ModificationConfigBuilder::new().fraction(1.0).is_ok());
        assert!(ModificationConfigBuilder::new().fraction(-0.01).is_err());
        assert!(ModificationConfigBuilder::new().fraction(f64::NAN).is_err());

        let direct = ModificationConfig {
            fraction: 2.0,
            ..Default::default()
        };
        match direct.validate() {
            Err(MicrostructureError::InvalidParameter { name, reason }) => {
                assert_eq!(name, "mod_fraction");
                assert!(reason.contains('2'));
            }
            other => panic!("expected mod_fraction rejection, got {:?}", other),
        }
    }

    #[test]
    fn test_resolve_precedence() {
        let base = InterfaceProperties::default();
        let config = ModificationConfigBuilder::new()
            .ratios(0.5, 0.25)
            .unwrap()
            .crit_disp_2(3e-5)
            .unwrap()
            .build();
        let (primary, secondary) = config.resolve(base, base);

        assert_eq!(primary, base);
        assert_relative_eq!(secondary.strength, 25_000.0);
        // explicit override beats the ratio-derived value
        assert_eq!(secondary.critical_displacement, 3e-5);
    }

    #[test]
    fn test_resolve_without_overrides_keeps_base() {
        let primary = InterfaceProperties::default();
        let secondary = primary.scaled(1.25, 1.0);
        let (p, s) = ModificationConfig::default().resolve(primary, secondary);
        assert_eq!(p, primary);
        assert_eq!(s, secondary);
    }
}
