// Charged Particle Integrator - Test particle moving through the charge field
// Forward Euler: good enough for a trajectory preview, not energy conserving

use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::electrostatics::FieldSnapshot;
use crate::vector::Vector2;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ParticleSign {
    Positive,
    Negative,
}

impl ParticleSign {
    pub fn factor(self) -> f64 {
        match self {
            ParticleSign::Positive => 1.0,
            ParticleSign::Negative => -1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ParticleStatus {
    Moving,
    /// Came within the capture radius of a charge
    Captured,
    /// Left the simulation bounds
    Escaped,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ParticleLaunch {
    pub position: Vector2,
    pub velocity: Vector2,
    pub sign: ParticleSign,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestParticle {
    pub position: Vector2,
    pub velocity: Vector2,
    pub sign: ParticleSign,
    pub status: ParticleStatus,
    /// Most recent positions, oldest first
    pub trail: VecDeque<Vector2>,
}

impl TestParticle {
    pub fn launch(launch: &ParticleLaunch) -> Self {
        debug!(
            "launching {:?} test particle at ({:.1}, {:.1})",
            launch.sign, launch.position.x, launch.position.y
        );
        Self {
            position: launch.position,
            velocity: launch.velocity,
            sign: launch.sign,
            status: ParticleStatus::Moving,
            trail: VecDeque::new(),
        }
    }

    /// One explicit Euler step of `dt` ticks through `field`.
    ///
    /// a = E * charge_to_mass * sign; v += a*dt; p += v*dt. There is no
    /// adaptive step, so close passes by a charge are only approximate.
    pub fn step(&mut self, field: &FieldSnapshot, dt: f64) {
        if self.status != ParticleStatus::Moving || !(dt > 0.0) {
            return;
        }
        let config = &field.config;

        let e = field.field_at(self.position);
        let accel = e.scale(config.charge_to_mass * self.sign.factor());

        let velocity = self.velocity.add(&accel.scale(dt));
        let position = self.position.add(&velocity.scale(dt));
        if !velocity.is_finite() || !position.is_finite() {
            self.status = ParticleStatus::Escaped;
            return;
        }
        let previous = self.position;
        self.velocity = velocity;
        self.position = position;

        self.trail.push_back(position);
        while self.trail.len() > config.trail_length {
            self.trail.pop_front();
        }

        let captured = field
            .charges
            .iter()
            .any(|c| segment_distance(c.position, previous, position) < config.capture_radius);
        if captured {
            self.status = ParticleStatus::Captured;
        } else if position.x < 0.0
            || position.y < 0.0
            || position.x > config.bounds_width
            || position.y > config.bounds_height
        {
            self.status = ParticleStatus::Escaped;
        }
    }
}

/// Closest distance from `point` to the segment [a, b]; a fast particle can
/// cross a capture zone within a single step.
fn segment_distance(point: Vector2, a: Vector2, b: Vector2) -> f64 {
    let ab = b.sub(&a);
    let len2 = ab.magnitude_squared();
    if len2 <= 0.0 {
        return point.distance(&a);
    }
    let t = (point.sub(&a).dot(&ab) / len2).clamp(0.0, 1.0);
    a.add(&ab.scale(t)).distance(&point)
}
