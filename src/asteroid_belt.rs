// Asteroid Belt - Seeded population of massless near-circular particles
// Particles never interact; each angle advances at a rate ~ 1/sqrt(distance)

use log::debug;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;

use crate::config::{BeltConfig, OrbitConfig};
use crate::orbits::{Propagation, ScaleMode, SimulatedPosition};
use crate::vector::Vector2;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct AsteroidParticle {
    /// Angular position (radians, [0, 2π))
    pub angle: f64,
    /// Orbital distance (AU)
    pub distance: f64,
    /// Vertical render offset (render units)
    pub height_offset: f64,
    /// Angular rate (rad/day)
    pub angular_rate_coefficient: f64,
}

impl AsteroidParticle {
    pub fn new(angle: f64, distance: f64, height_offset: f64, rate_at_1au: f64) -> Self {
        let angular_rate_coefficient = if distance > 0.0 {
            rate_at_1au / distance.sqrt()
        } else {
            0.0
        };
        Self {
            angle: wrap_angle(angle),
            distance,
            height_offset,
            angular_rate_coefficient,
        }
    }

    pub fn advance(&mut self, dt: f64) {
        self.angle = wrap_angle(self.angle + self.angular_rate_coefficient * dt);
    }

    pub fn position(&self, mode: ScaleMode, config: &OrbitConfig) -> SimulatedPosition {
        let p = Vector2::from_angle(self.angle).scale(mode.map(self.distance, config));
        SimulatedPosition {
            x: p.x,
            y: p.y + self.height_offset,
            radius: self.distance,
        }
    }
}

fn wrap_angle(angle: f64) -> f64 {
    let wrapped = angle.rem_euclid(TAU);
    // rem_euclid can round up to 2π for tiny negative inputs
    if wrapped >= TAU {
        0.0
    } else {
        wrapped
    }
}

// =============================================================================
// POPULATION
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AsteroidField {
    pub particles: Vec<AsteroidParticle>,
    pub seed: u64,
    config: BeltConfig,
}

impl AsteroidField {
    pub fn new(config: &BeltConfig) -> Self {
        let particles = generate_population(config, config.seed);
        Self {
            particles,
            seed: config.seed,
            config: config.clone(),
        }
    }

    /// Advance every particle by `dt` simulated days.
    pub fn advance(&mut self, dt: f64) {
        if dt == 0.0 || !dt.is_finite() {
            return;
        }
        for particle in &mut self.particles {
            particle.advance(dt);
        }
    }

    /// Replace the population with a fresh one drawn from `seed`.
    pub fn reseed(&mut self, seed: u64) {
        self.seed = seed;
        self.particles = generate_population(&self.config, seed);
    }

    pub fn angles(&self) -> Vec<f64> {
        self.particles.iter().map(|p| p.angle).collect()
    }

    /// Each particle as a body propagation, so the belt renders through the
    /// same path as the planets.
    pub fn propagations(&self) -> impl Iterator<Item = Propagation> + '_ {
        self.particles.iter().copied().map(Propagation::Belt)
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }
}

/// Draw `config.count` particles with uniform angle, distance within the band
/// and symmetric height jitter.
pub fn generate_population(config: &BeltConfig, seed: u64) -> Vec<AsteroidParticle> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let band = config.outer_distance - config.inner_distance;

    let particles: Vec<AsteroidParticle> = (0..config.count)
        .map(|_| {
            let angle = rng.gen::<f64>() * TAU;
            let distance = config.inner_distance + rng.gen::<f64>() * band;
            let height = (rng.gen::<f64>() * 2.0 - 1.0) * config.height_jitter;
            AsteroidParticle::new(angle, distance, height, config.rate_coefficient)
        })
        .collect();

    debug!(
        "seeded asteroid belt: {} particles, seed {}",
        particles.len(),
        seed
    );
    particles
}
