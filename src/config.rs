// Lab Configuration - Tunable constants for every simulation lab
// All sections deserialize with defaults so a partial JSON document is enough

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{ensure_finite, ensure_positive, ConfigError};
use crate::kepler::{COMET_ITERATIONS, PLANET_ITERATIONS};

// =============================================================================
// CLOCK
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClockConfig {
    /// Simulated days advanced per tick at speed 1.0
    pub fixed_step: f64,
    /// Upper clamp for the speed multiplier
    pub max_speed: f64,
    /// Calendar date of simulated time zero
    pub epoch: NaiveDate,
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            fixed_step: 0.5,
            max_speed: 1000.0,
            epoch: NaiveDate::from_ymd_opt(2000, 1, 1).unwrap_or_default(),
        }
    }
}

// =============================================================================
// ORBITS
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OrbitConfig {
    /// Mean motion constant k in n = k / a^1.5 (deg/day, AU)
    pub mean_motion_constant: f64,
    /// Render units per AU in physical mode
    pub physical_scale: f64,
    /// Render units per AU^p in perceptual mode
    pub perceptual_scale: f64,
    /// Power-law exponent p of the perceptual mapping
    pub perceptual_exponent: f64,
    pub planet_iterations: usize,
    pub comet_iterations: usize,
}

impl Default for OrbitConfig {
    fn default() -> Self {
        Self {
            // One Earth orbit per Julian year of simulated days
            mean_motion_constant: 360.0 / 365.25,
            physical_scale: 20.0,
            perceptual_scale: 120.0,
            perceptual_exponent: 0.5,
            planet_iterations: PLANET_ITERATIONS,
            comet_iterations: COMET_ITERATIONS,
        }
    }
}

// =============================================================================
// ASTEROID BELT
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BeltConfig {
    pub count: usize,
    /// Inner edge of the belt (AU)
    pub inner_distance: f64,
    /// Outer edge of the belt (AU)
    pub outer_distance: f64,
    /// Maximum absolute height offset (render units)
    pub height_jitter: f64,
    /// Angular rate at 1 AU (rad/day); scaled by 1/sqrt(distance)
    pub rate_coefficient: f64,
    pub seed: u64,
}

impl Default for BeltConfig {
    fn default() -> Self {
        Self {
            count: 300,
            inner_distance: 2.2,
            outer_distance: 3.3,
            height_jitter: 3.0,
            // ~4.4 year period at 2.7 AU
            rate_coefficient: 0.00637,
            seed: 42,
        }
    }
}

// =============================================================================
// ELECTROSTATICS
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ElectrostaticConfig {
    /// Coulomb constant (N·m²/C²)
    pub coulomb_constant: f64,
    /// Physical length of one canvas unit (m)
    pub meters_per_unit: f64,
    /// Contributions closer than this (canvas units) are skipped
    pub min_distance: f64,
    /// Acceleration per unit field for the test particle (units/tick² per N/C)
    pub charge_to_mass: f64,
    /// A test particle closer than this to any charge is captured
    pub capture_radius: f64,
    pub bounds_width: f64,
    pub bounds_height: f64,
    pub trail_length: usize,
}

impl Default for ElectrostaticConfig {
    fn default() -> Self {
        Self {
            coulomb_constant: 8.987_551_792_3e9,
            meters_per_unit: 0.01,
            min_distance: 1.0,
            charge_to_mass: 2.5e-3,
            capture_radius: 8.0,
            bounds_width: 800.0,
            bounds_height: 600.0,
            trail_length: 200,
        }
    }
}

// =============================================================================
// INDUCTION
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InductionConfig {
    /// Source strength B0
    pub field_strength: f64,
    /// Multiplier turning canvas separation into model distance
    pub distance_scale: f64,
    /// Softening ε added to |d|^2.5
    pub softening: f64,
    pub reference_area: f64,
    pub emf_scale: f64,
    /// Largest wall-clock delta (s) accepted for the flux derivative
    pub max_dt: f64,
    pub drift_coefficient: f64,
    pub carrier_count: usize,
    /// Coil resistance used for the induced current readout (Ω)
    pub resistance: f64,
}

impl Default for InductionConfig {
    fn default() -> Self {
        Self {
            field_strength: 1.0,
            distance_scale: 0.01,
            softening: 0.1,
            reference_area: 1.0,
            emf_scale: 1.0,
            max_dt: 0.1,
            drift_coefficient: 0.5,
            carrier_count: 24,
            resistance: 10.0,
        }
    }
}

// =============================================================================
// LAB CONFIG
// =============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LabConfig {
    pub clock: ClockConfig,
    pub orbits: OrbitConfig,
    pub belt: BeltConfig,
    pub electrostatics: ElectrostaticConfig,
    pub induction: InductionConfig,
}

impl LabConfig {
    /// Parse and validate a JSON configuration document.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: LabConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let clock = &self.clock;
        ensure_positive("clock.fixed_step", clock.fixed_step)?;
        ensure_positive("clock.max_speed", clock.max_speed)?;

        let orbits = &self.orbits;
        ensure_positive("orbits.mean_motion_constant", orbits.mean_motion_constant)?;
        ensure_positive("orbits.physical_scale", orbits.physical_scale)?;
        ensure_positive("orbits.perceptual_scale", orbits.perceptual_scale)?;
        let p = ensure_finite("orbits.perceptual_exponent", orbits.perceptual_exponent)?;
        if p <= 0.0 || p >= 1.0 {
            return Err(ConfigError::OutOfRange {
                field: "orbits.perceptual_exponent",
                value: p,
                expected: "0 < p < 1",
            });
        }
        if orbits.planet_iterations == 0 || orbits.comet_iterations == 0 {
            return Err(ConfigError::OutOfRange {
                field: "orbits.iterations",
                value: orbits.planet_iterations.min(orbits.comet_iterations) as f64,
                expected: ">= 1",
            });
        }

        let belt = &self.belt;
        let inner = ensure_positive("belt.inner_distance", belt.inner_distance)?;
        let outer = ensure_positive("belt.outer_distance", belt.outer_distance)?;
        if outer < inner {
            return Err(ConfigError::OutOfRange {
                field: "belt.outer_distance",
                value: outer,
                expected: ">= belt.inner_distance",
            });
        }
        let jitter = ensure_finite("belt.height_jitter", belt.height_jitter)?;
        if jitter < 0.0 {
            return Err(ConfigError::OutOfRange {
                field: "belt.height_jitter",
                value: jitter,
                expected: ">= 0",
            });
        }
        ensure_finite("belt.rate_coefficient", belt.rate_coefficient)?;

        let es = &self.electrostatics;
        ensure_positive("electrostatics.coulomb_constant", es.coulomb_constant)?;
        ensure_positive("electrostatics.meters_per_unit", es.meters_per_unit)?;
        ensure_positive("electrostatics.min_distance", es.min_distance)?;
        ensure_finite("electrostatics.charge_to_mass", es.charge_to_mass)?;
        ensure_finite("electrostatics.capture_radius", es.capture_radius)?;
        ensure_positive("electrostatics.bounds_width", es.bounds_width)?;
        ensure_positive("electrostatics.bounds_height", es.bounds_height)?;

        let ind = &self.induction;
        ensure_finite("induction.field_strength", ind.field_strength)?;
        ensure_positive("induction.distance_scale", ind.distance_scale)?;
        ensure_positive("induction.softening", ind.softening)?;
        ensure_positive("induction.reference_area", ind.reference_area)?;
        ensure_finite("induction.emf_scale", ind.emf_scale)?;
        ensure_positive("induction.max_dt", ind.max_dt)?;
        ensure_finite("induction.drift_coefficient", ind.drift_coefficient)?;
        ensure_positive("induction.resistance", ind.resistance)?;

        Ok(())
    }
}
