// Simulation - Per-tick orchestration of every lab
// tick(dt_wall, controls) is the only entry point the host needs

use chrono::NaiveDate;
use log::warn;
use serde::{Deserialize, Serialize};

use crate::asteroid_belt::AsteroidField;
use crate::clock::SimulationClock;
use crate::config::LabConfig;
use crate::electrostatics::{all_forces, ChargeForce, ChargeId, ChargeSet, FieldSnapshot};
use crate::error::{ConfigError, ControlError, LabError};
use crate::induction::{self, CarrierPhases, InductionReading, InductionState, Polarity};
use crate::orbits::{self, Body, BodyPosition, ScaleMode, SimulatedPosition};
use crate::particle::{ParticleLaunch, TestParticle};
use crate::vector::Vector2;

// =============================================================================
// CONTROLS (immutable snapshot supplied by the host each tick)
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum ChargeRequest {
    Add { position: Vector2, q: f64 },
    Remove { id: ChargeId },
    Move { id: ChargeId, position: Vector2 },
    Clear,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct InductionControls {
    pub source_position: f64,
    pub loop_count: i32,
    pub loop_area: f64,
    pub polarity: Polarity,
}

impl Default for InductionControls {
    fn default() -> Self {
        let state = InductionState::default();
        Self {
            source_position: state.source_position,
            loop_count: state.loop_count as i32,
            loop_area: state.loop_area,
            polarity: state.polarity,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Controls {
    pub paused: bool,
    pub speed: f64,
    pub scale_mode: ScaleMode,
    /// Body id to center the view on; `None` centers on the Sun
    pub view_center: Option<String>,
    pub charge_requests: Vec<ChargeRequest>,
    pub induction: InductionControls,
    pub launch_particle: Option<ParticleLaunch>,
}

impl Default for Controls {
    fn default() -> Self {
        Self {
            paused: false,
            speed: 1.0,
            scale_mode: ScaleMode::default(),
            view_center: None,
            charge_requests: Vec::new(),
            induction: InductionControls::default(),
            launch_particle: None,
        }
    }
}

impl Controls {
    /// Reject values the solvers must never see.
    pub fn validate(&self) -> Result<(), ControlError> {
        if !self.speed.is_finite() || self.speed < 0.0 {
            return Err(ControlError::InvalidSpeed(self.speed));
        }

        let ind = &self.induction;
        if ind.loop_count < 0 {
            return Err(ControlError::NegativeLoopCount(ind.loop_count));
        }
        if !ind.loop_area.is_finite() {
            return Err(ControlError::NonFinite("induction.loop_area"));
        }
        if ind.loop_area < 0.0 {
            return Err(ControlError::NegativeLoopArea(ind.loop_area));
        }
        if !ind.source_position.is_finite() {
            return Err(ControlError::NonFinite("induction.source_position"));
        }

        for request in &self.charge_requests {
            match request {
                ChargeRequest::Add { position, q } => {
                    if !position.is_finite() {
                        return Err(ControlError::NonFinite("charge.position"));
                    }
                    if !q.is_finite() {
                        return Err(ControlError::NonFinite("charge.q"));
                    }
                }
                ChargeRequest::Move { position, .. } => {
                    if !position.is_finite() {
                        return Err(ControlError::NonFinite("charge.position"));
                    }
                }
                ChargeRequest::Remove { .. } | ChargeRequest::Clear => {}
            }
        }

        if let Some(launch) = &self.launch_particle {
            if !launch.position.is_finite() || !launch.velocity.is_finite() {
                return Err(ControlError::NonFinite("launch_particle"));
            }
        }
        Ok(())
    }
}

// =============================================================================
// FRAME RESULT (handed to the renderer by value)
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InductionFrame {
    pub reading: InductionReading,
    pub source_position: f64,
    pub loop_count: u32,
    pub polarity: Polarity,
    pub carrier_phases: Vec<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameResult {
    pub tick: u64,
    /// Simulated days since epoch
    pub time: f64,
    pub calendar_date: NaiveDate,
    pub is_paused: bool,
    pub speed: f64,
    pub scale_mode: ScaleMode,
    pub view_center: Vector2,
    pub body_positions: Vec<BodyPosition>,
    pub comet_position: SimulatedPosition,
    pub asteroid_angles: Vec<f64>,
    pub asteroid_positions: Vec<SimulatedPosition>,
    pub charge_field: FieldSnapshot,
    pub forces: Vec<ChargeForce>,
    pub particle: Option<TestParticle>,
    pub induction: InductionFrame,
}

impl FrameResult {
    pub fn body(&self, id: &str) -> Option<&SimulatedPosition> {
        self.body_positions
            .iter()
            .find(|b| b.id == id)
            .map(|b| &b.position)
    }

    pub fn force(&self, id: ChargeId) -> Option<Vector2> {
        self.forces.iter().find(|f| f.id == id).map(|f| f.force)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

// =============================================================================
// LAB
// =============================================================================

pub struct Lab {
    config: LabConfig,
    clock: SimulationClock,
    bodies: Vec<Body>,
    comet: Body,
    belt: AsteroidField,
    charges: ChargeSet,
    particle: Option<TestParticle>,
    induction: InductionState,
    carriers: CarrierPhases,
}

impl Lab {
    pub fn new(config: LabConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let bodies = orbits::solar_system(&config.orbits)?;
        let comet = orbits::comet(&config.orbits)?;
        Ok(Self {
            clock: SimulationClock::new(&config.clock),
            bodies,
            comet,
            belt: AsteroidField::new(&config.belt),
            charges: ChargeSet::new(),
            particle: None,
            induction: InductionState::default(),
            carriers: CarrierPhases::evenly_spaced(config.induction.carrier_count),
            config,
        })
    }

    pub fn config(&self) -> &LabConfig {
        &self.config
    }

    pub fn clock(&self) -> &SimulationClock {
        &self.clock
    }

    pub fn bodies(&self) -> &[Body] {
        &self.bodies
    }

    pub fn charges(&self) -> &ChargeSet {
        &self.charges
    }

    pub fn induction_state(&self) -> &InductionState {
        &self.induction
    }

    pub fn belt(&self) -> &AsteroidField {
        &self.belt
    }

    /// Restore the initial state: time zero, fresh belt, no charges.
    pub fn reset(&mut self) {
        self.clock = SimulationClock::new(&self.config.clock);
        self.belt = AsteroidField::new(&self.config.belt);
        self.charges.clear();
        self.particle = None;
        self.induction = InductionState::default();
        self.carriers = CarrierPhases::evenly_spaced(self.config.induction.carrier_count);
    }

    pub fn reseed_belt(&mut self, seed: u64) {
        self.belt.reseed(seed);
    }

    /// Run one tick: apply controls, advance the clock, recompute every output.
    ///
    /// `dt_wall` is the wall-clock time since the previous tick (seconds); it
    /// only drives the flux derivative. Invalid controls leave the lab
    /// untouched.
    pub fn tick(&mut self, dt_wall: f64, controls: &Controls) -> Result<FrameResult, LabError> {
        if !dt_wall.is_finite() || dt_wall < 0.0 {
            let err = ControlError::InvalidWallDelta(dt_wall);
            warn!("rejecting tick: {err}");
            return Err(err.into());
        }
        if let Err(err) = controls.validate() {
            warn!("rejecting controls: {err}");
            return Err(err.into());
        }

        self.apply_charge_requests(&controls.charge_requests);

        // Time
        self.clock.set_paused(controls.paused);
        self.clock.set_speed(controls.speed);
        let sim_dt = self.clock.tick();
        let time = self.clock.time;

        // Orbits
        let orbit_cfg = &self.config.orbits;
        let mode = controls.scale_mode;
        self.belt.advance(sim_dt);
        let body_positions: Vec<BodyPosition> = self
            .bodies
            .iter()
            .map(|b| BodyPosition {
                id: b.id.clone(),
                position: b.position(time, mode, orbit_cfg),
            })
            .collect();
        let comet_position = self.comet.position(time, mode, orbit_cfg);
        let view_center = match controls.view_center.as_deref() {
            Some(id) if id == self.comet.id => comet_position.point(),
            Some(id) => body_positions
                .iter()
                .find(|b| b.id == id)
                .map(|b| b.position.point())
                .unwrap_or_default(),
            None => Vector2::zero(),
        };

        // Electrostatics
        let snapshot = FieldSnapshot::new(self.charges.as_slice(), &self.config.electrostatics);
        let forces = all_forces(self.charges.as_slice(), &self.config.electrostatics);
        if let Some(launch) = &controls.launch_particle {
            self.particle = Some(TestParticle::launch(launch));
        }
        if let Some(particle) = &mut self.particle {
            // Integrate in tick units so the preview speed ignores the day step
            particle.step(&snapshot, sim_dt / self.config.clock.fixed_step);
        }

        // Induction
        let ind = &controls.induction;
        let geometry = InductionState {
            source_position: ind.source_position,
            loop_count: ind.loop_count.max(0) as u32,
            loop_area: ind.loop_area,
            polarity: ind.polarity,
            ..self.induction
        };
        let (next, reading) = induction::update(&geometry, dt_wall, &self.config.induction);
        self.induction = next;
        self.carriers
            .drift(reading.emf, self.config.induction.drift_coefficient);

        Ok(FrameResult {
            tick: self.clock.ticks,
            time,
            calendar_date: self.clock.calendar_date(),
            is_paused: self.clock.is_paused,
            speed: self.clock.speed,
            scale_mode: mode,
            view_center,
            body_positions,
            comet_position,
            asteroid_angles: self.belt.angles(),
            asteroid_positions: self
                .belt
                .propagations()
                .map(|p| p.position(time, mode, orbit_cfg))
                .collect(),
            charge_field: snapshot,
            forces,
            particle: self.particle.clone(),
            induction: InductionFrame {
                reading,
                source_position: self.induction.source_position,
                loop_count: self.induction.loop_count,
                polarity: self.induction.polarity,
                carrier_phases: self.carriers.phases.clone(),
            },
        })
    }

    fn apply_charge_requests(&mut self, requests: &[ChargeRequest]) {
        for request in requests {
            match request {
                ChargeRequest::Add { position, q } => {
                    self.charges.add(*position, *q);
                }
                ChargeRequest::Remove { id } => {
                    if self.charges.remove(*id).is_none() {
                        warn!("remove request for unknown charge {:?}", id);
                    }
                }
                ChargeRequest::Move { id, position } => {
                    if !self.charges.move_to(*id, *position) {
                        warn!("move request for unknown charge {:?}", id);
                    }
                }
                ChargeRequest::Clear => self.charges.clear(),
            }
        }
    }
}
