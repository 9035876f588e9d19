// Orbital Propagator - Closed-form Kepler positions for the body catalog
// Orbits are independent; no body perturbs another

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

use crate::asteroid_belt::AsteroidParticle;
use crate::config::OrbitConfig;
use crate::error::ConfigError;
use crate::kepler::{iteration_budget, orbital_radius, solve_kepler_equation, true_anomaly};
use crate::vector::Vector2;

// =============================================================================
// SCALE MODE
// =============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum ScaleMode {
    /// Render distance proportional to orbital radius
    Physical,
    /// Power-law compression so inner and outer planets fit together
    #[default]
    Perceptual,
}

impl ScaleMode {
    /// Map an orbital radius (AU) to a render-space distance.
    pub fn map(self, radius: f64, config: &OrbitConfig) -> f64 {
        if radius <= 0.0 {
            return 0.0;
        }
        match self {
            ScaleMode::Physical => radius * config.physical_scale,
            ScaleMode::Perceptual => config.perceptual_scale * radius.powf(config.perceptual_exponent),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct SimulatedPosition {
    /// Render-space coordinates
    pub x: f64,
    pub y: f64,
    /// Orbital radius (AU), independent of scale mode
    pub radius: f64,
}

impl SimulatedPosition {
    pub fn origin() -> Self {
        Self::default()
    }

    pub fn point(&self) -> Vector2 {
        Vector2::new(self.x, self.y)
    }
}

// =============================================================================
// KEPLERIAN ORBITAL ELEMENTS
// =============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct OrbitalElements {
    /// Semi-major axis (AU); 0 pins the body to the origin
    pub semi_major_axis: f64,
    /// Eccentricity, 0 <= e < 1
    pub eccentricity: f64,
    /// Mean longitude at epoch (degrees)
    pub mean_longitude: f64,
    /// Longitude of perihelion (degrees)
    pub longitude_perihelion: f64,
}

impl OrbitalElements {
    pub fn new(
        body: &str,
        semi_major_axis: f64,
        eccentricity: f64,
        mean_longitude: f64,
        longitude_perihelion: f64,
    ) -> Result<Self, ConfigError> {
        let elements = Self {
            semi_major_axis,
            eccentricity,
            mean_longitude,
            longitude_perihelion,
        };
        elements.validate(body)?;
        Ok(elements)
    }

    pub fn validate(&self, body: &str) -> Result<(), ConfigError> {
        if !self.semi_major_axis.is_finite()
            || !self.mean_longitude.is_finite()
            || !self.longitude_perihelion.is_finite()
        {
            return Err(ConfigError::NonFinite {
                field: "orbital_elements",
            });
        }
        if self.semi_major_axis < 0.0 {
            return Err(ConfigError::NegativeSemiMajorAxis {
                body: body.to_string(),
                value: self.semi_major_axis,
            });
        }
        if !(0.0..1.0).contains(&self.eccentricity) {
            return Err(ConfigError::InvalidEccentricity {
                body: body.to_string(),
                value: self.eccentricity,
            });
        }
        Ok(())
    }
}

/// Mean motion n = k / a^1.5 in degrees per simulated day.
pub fn mean_motion(semi_major_axis: f64, config: &OrbitConfig) -> f64 {
    if semi_major_axis <= 0.0 {
        return 0.0;
    }
    config.mean_motion_constant / semi_major_axis.powf(1.5)
}

/// Orbital period in simulated days, or `None` for the fixed central body.
pub fn orbital_period(semi_major_axis: f64, config: &OrbitConfig) -> Option<f64> {
    let n = mean_motion(semi_major_axis, config);
    (n > 0.0).then(|| 360.0 / n)
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct KeplerOrbit {
    pub elements: OrbitalElements,
    /// Extra rotation applied to the heading angle (radians)
    pub phase_offset: f64,
    /// Newton iterations spent per solve
    pub iterations: usize,
}

impl KeplerOrbit {
    /// Planet convention. An eccentric orbit never gets fewer iterations than
    /// [`iteration_budget`] asks for, whatever the configured budget.
    pub fn planet(elements: OrbitalElements, config: &OrbitConfig) -> Self {
        Self {
            elements,
            phase_offset: 0.0,
            iterations: config
                .planet_iterations
                .max(iteration_budget(elements.eccentricity)),
        }
    }

    /// Comet convention: perihelion orientation is flipped by π and the
    /// solve gets the larger iteration budget.
    pub fn comet(elements: OrbitalElements, config: &OrbitConfig) -> Self {
        Self {
            elements,
            phase_offset: PI,
            iterations: config
                .comet_iterations
                .max(iteration_budget(elements.eccentricity)),
        }
    }

    /// Mean anomaly at `time` (radians, [0, 2π)).
    pub fn mean_anomaly(&self, time: f64, config: &OrbitConfig) -> f64 {
        let el = &self.elements;
        let n = mean_motion(el.semi_major_axis, config);
        (el.mean_longitude + n * time).rem_euclid(360.0).to_radians()
    }

    pub fn eccentric_anomaly(&self, time: f64, config: &OrbitConfig) -> f64 {
        solve_kepler_equation(
            self.mean_anomaly(time, config),
            self.elements.eccentricity,
            self.iterations,
        )
    }

    pub fn position(&self, time: f64, mode: ScaleMode, config: &OrbitConfig) -> SimulatedPosition {
        let el = &self.elements;
        let a = el.semi_major_axis;
        if a <= 0.0 {
            return SimulatedPosition::origin();
        }
        let e = el.eccentricity;

        let eccentric_anomaly = self.eccentric_anomaly(time, config);
        let nu = true_anomaly(eccentric_anomaly, e);
        let r = orbital_radius(a, e, eccentric_anomaly);

        let theta = nu + el.longitude_perihelion.to_radians() + self.phase_offset;
        let s = mode.map(r, config);

        SimulatedPosition {
            x: s * theta.cos(),
            y: s * theta.sin(),
            radius: r,
        }
    }
}

// =============================================================================
// BODIES
// =============================================================================

/// How a body's position is produced each tick.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Propagation {
    /// Pinned at the origin (the central star)
    Fixed,
    Kepler(KeplerOrbit),
    Belt(AsteroidParticle),
}

impl Propagation {
    pub fn position(&self, time: f64, mode: ScaleMode, config: &OrbitConfig) -> SimulatedPosition {
        match self {
            Propagation::Fixed => SimulatedPosition::origin(),
            Propagation::Kepler(orbit) => orbit.position(time, mode, config),
            Propagation::Belt(particle) => particle.position(mode, config),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Body {
    pub id: String,
    pub name: String,
    pub propagation: Propagation,
    /// Display radius (km)
    pub radius_km: f64,
    /// Display mass (Earth masses)
    pub mass_earths: f64,
    /// Display color (hex)
    pub color: String,
}

impl Body {
    pub fn position(&self, time: f64, mode: ScaleMode, config: &OrbitConfig) -> SimulatedPosition {
        self.propagation.position(time, mode, config)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BodyPosition {
    pub id: String,
    pub position: SimulatedPosition,
}

// =============================================================================
// CATALOG
// =============================================================================

/// (id, name, a AU, e, L deg, longPeri deg, radius km, mass Earths, color)
type CatalogRow = (
    &'static str,
    &'static str,
    f64,
    f64,
    f64,
    f64,
    f64,
    f64,
    &'static str,
);

/// J2000 mean elements (Standish 1992)
const PLANETS: [CatalogRow; 8] = [
    ("mercury", "Mercury", 0.387_099_27, 0.205_635_93, 252.250_323_5, 77.457_796_28, 2439.7, 0.0553, "#9e9e9e"),
    ("venus", "Venus", 0.723_335_66, 0.006_776_72, 181.979_099_5, 131.602_467_18, 6051.8, 0.815, "#e8c16f"),
    ("earth", "Earth", 1.000_002_61, 0.016_711_23, 100.464_571_66, 102.937_681_93, 6371.0, 1.0, "#4f8fe0"),
    ("mars", "Mars", 1.523_710_34, 0.093_394_10, -4.553_432_05, -23.943_629_59, 3389.5, 0.107, "#d0603a"),
    ("jupiter", "Jupiter", 5.202_887_00, 0.048_386_24, 34.396_440_51, 14.728_479_83, 69911.0, 317.8, "#d9a066"),
    ("saturn", "Saturn", 9.536_675_94, 0.053_861_79, 49.954_244_23, 92.598_878_31, 58232.0, 95.2, "#e3cf8f"),
    ("uranus", "Uranus", 19.189_164_64, 0.047_257_44, 313.238_104_51, 170.954_276_30, 25362.0, 14.5, "#8fd8e0"),
    ("neptune", "Neptune", 30.069_922_76, 0.008_590_48, -55.120_029_69, 44.964_762_27, 24622.0, 17.1, "#4062d8"),
];

/// Halley-type comet
const COMET: CatalogRow = (
    "halley", "Halley", 17.834, 0.967_14, 208.13, 169.75, 5.5, 3.7e-11, "#cfe8ff",
);

fn body_from_row(row: &CatalogRow, orbit: impl Fn(OrbitalElements) -> KeplerOrbit) -> Result<Body, ConfigError> {
    let (id, name, a, e, l, w, radius_km, mass_earths, color) = *row;
    let elements = OrbitalElements::new(id, a, e, l, w)?;
    Ok(Body {
        id: id.to_string(),
        name: name.to_string(),
        propagation: Propagation::Kepler(orbit(elements)),
        radius_km,
        mass_earths,
        color: color.to_string(),
    })
}

pub fn sun() -> Body {
    Body {
        id: "sun".to_string(),
        name: "Sun".to_string(),
        propagation: Propagation::Fixed,
        radius_km: 695_700.0,
        mass_earths: 332_946.0,
        color: "#ffd54a".to_string(),
    }
}

/// Sun plus the eight planets.
pub fn solar_system(config: &OrbitConfig) -> Result<Vec<Body>, ConfigError> {
    let mut bodies = vec![sun()];
    for row in &PLANETS {
        bodies.push(body_from_row(row, |el| KeplerOrbit::planet(el, config))?);
    }
    Ok(bodies)
}

pub fn comet(config: &OrbitConfig) -> Result<Body, ConfigError> {
    body_from_row(&COMET, |el| KeplerOrbit::comet(el, config))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn config() -> OrbitConfig {
        OrbitConfig::default()
    }

    fn earth() -> KeplerOrbit {
        let el = OrbitalElements::new("earth", 1.0, 0.0167, 100.46, 102.94).unwrap();
        KeplerOrbit::planet(el, &config())
    }

    #[test]
    fn test_zero_semi_major_axis_is_origin() {
        let el = OrbitalElements::new("star", 0.0, 0.5, 10.0, 20.0).unwrap();
        let orbit = KeplerOrbit::planet(el, &config());
        for &t in &[0.0, 1.0, 1234.5, -50.0] {
            for mode in [ScaleMode::Physical, ScaleMode::Perceptual] {
                let p = orbit.position(t, mode, &config());
                assert_eq!(p, SimulatedPosition::origin());
            }
        }
        assert_eq!(
            Propagation::Fixed.position(42.0, ScaleMode::Physical, &config()),
            SimulatedPosition::origin()
        );
    }

    #[test]
    fn test_radius_is_periodic() {
        let cfg = config();
        let bodies = solar_system(&cfg).unwrap();
        for body in bodies.iter().skip(1) {
            let Propagation::Kepler(orbit) = &body.propagation else {
                panic!("planet without Kepler orbit");
            };
            let period = orbital_period(orbit.elements.semi_major_axis, &cfg).unwrap();
            for &t in &[0.0, 17.0, 400.0] {
                let r0 = orbit.position(t, ScaleMode::Physical, &cfg).radius;
                let r1 = orbit.position(t + period, ScaleMode::Physical, &cfg).radius;
                assert_abs_diff_eq!(r0, r1, epsilon = 1e-6);
            }
        }
    }

    #[test]
    fn test_earth_period_is_a_julian_year() {
        let period = orbital_period(1.0, &config()).unwrap();
        assert_abs_diff_eq!(period, 365.25, epsilon = 1e-9);
        assert!(orbital_period(0.0, &config()).is_none());
    }

    #[test]
    fn test_radius_stays_between_apsides() {
        let cfg = config();
        let orbit = earth();
        let e = orbit.elements.eccentricity;
        for i in 0..100 {
            let r = orbit.position(i as f64 * 3.7, ScaleMode::Physical, &cfg).radius;
            assert!(r >= 1.0 - e - 1e-9 && r <= 1.0 + e + 1e-9);
        }
    }

    #[test]
    fn test_scale_modes() {
        let cfg = config();
        assert_abs_diff_eq!(ScaleMode::Physical.map(2.0, &cfg), 40.0, epsilon = 1e-12);
        assert_abs_diff_eq!(ScaleMode::Perceptual.map(4.0, &cfg), 240.0, epsilon = 1e-12);
        // Perceptual keeps Neptune and Mercury within one order of magnitude
        let ratio = ScaleMode::Perceptual.map(30.0, &cfg) / ScaleMode::Perceptual.map(0.39, &cfg);
        assert!(ratio < 10.0);
        let p = earth().position(0.0, ScaleMode::Physical, &cfg);
        assert_abs_diff_eq!(p.point().magnitude(), p.radius * cfg.physical_scale, epsilon = 1e-9);
    }

    #[test]
    fn test_comet_phase_offset_flips_position() {
        let cfg = config();
        let el = OrbitalElements::new("c", 3.0, 0.9, 40.0, 10.0).unwrap();
        let planet_like = KeplerOrbit {
            iterations: cfg.comet_iterations,
            ..KeplerOrbit::planet(el, &cfg)
        };
        let comet_like = KeplerOrbit::comet(el, &cfg);
        let a = planet_like.position(12.0, ScaleMode::Physical, &cfg);
        let b = comet_like.position(12.0, ScaleMode::Physical, &cfg);
        assert_abs_diff_eq!(a.x, -b.x, epsilon = 1e-9);
        assert_abs_diff_eq!(a.y, -b.y, epsilon = 1e-9);
        assert_abs_diff_eq!(a.radius, b.radius, epsilon = 1e-12);
    }

    #[test]
    fn test_catalog_comet_is_highly_eccentric() {
        let c = comet(&config()).unwrap();
        let Propagation::Kepler(orbit) = c.propagation else {
            panic!("comet without Kepler orbit");
        };
        assert!(orbit.elements.eccentricity > 0.9);
        assert_eq!(orbit.iterations, 10);
        let p = orbit.position(1000.0, ScaleMode::Perceptual, &config());
        assert!(p.x.is_finite() && p.y.is_finite());
        let q = orbit.elements.semi_major_axis * (1.0 - orbit.elements.eccentricity);
        let big_q = orbit.elements.semi_major_axis * (1.0 + orbit.elements.eccentricity);
        assert!(p.radius >= q - 1e-6 && p.radius <= big_q + 1e-6);
    }

    #[test]
    fn test_eccentric_planet_meets_residual_bound() {
        let cfg = config();
        for ei in 0..=99 {
            let e = ei as f64 / 100.0;
            let el = OrbitalElements::new("eccentric", 2.0, e, 0.0, 30.0).unwrap();
            let orbit = KeplerOrbit::planet(el, &cfg);
            if e >= crate::kepler::HIGH_ECCENTRICITY {
                assert_eq!(orbit.iterations, crate::kepler::COMET_ITERATIONS);
            }
            let period = orbital_period(2.0, &cfg).unwrap();
            for k in 0..144 {
                let t = period * k as f64 / 144.0;
                let m = orbit.mean_anomaly(t, &cfg);
                let big_e = orbit.eccentric_anomaly(t, &cfg);
                let r = crate::kepler::wrap_pi(big_e - e * big_e.sin() - m).abs();
                assert!(r < 1e-3, "e={e} t={t} residual={r}");
                let p = orbit.position(t, ScaleMode::Physical, &cfg);
                assert_abs_diff_eq!(p.radius, orbital_radius(2.0, e, big_e), epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn test_catalog_planets_keep_configured_budget() {
        let cfg = config();
        for body in solar_system(&cfg).unwrap().iter().skip(1) {
            let Propagation::Kepler(orbit) = &body.propagation else {
                panic!("planet without Kepler orbit");
            };
            assert_eq!(orbit.iterations, cfg.planet_iterations);
        }
    }

    #[test]
    fn test_rejects_invalid_elements() {
        assert!(matches!(
            OrbitalElements::new("x", 1.0, 1.0, 0.0, 0.0),
            Err(ConfigError::InvalidEccentricity { .. })
        ));
        assert!(matches!(
            OrbitalElements::new("x", -1.0, 0.1, 0.0, 0.0),
            Err(ConfigError::NegativeSemiMajorAxis { .. })
        ));
        assert!(OrbitalElements::new("x", f64::NAN, 0.1, 0.0, 0.0).is_err());
    }

    #[test]
    fn test_belt_variant_uses_particle_angle() {
        let particle = AsteroidParticle::new(0.0, 2.5, 0.0, 0.00637);
        let p = Propagation::Belt(particle).position(99.0, ScaleMode::Physical, &config());
        assert_abs_diff_eq!(p.x, 50.0, epsilon = 1e-9);
        assert_abs_diff_eq!(p.y, 0.0, epsilon = 1e-9);
    }
}
