// State Manager - Thread-safe host around the lab
// One writer (the loop thread) and many readers (renderer, UI bindings)

use log::warn;
use parking_lot::RwLock;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crate::config::LabConfig;
use crate::error::{ConfigError, ControlError, LabError};
use crate::orbits::ScaleMode;
use crate::particle::ParticleLaunch;
use crate::simulation::{ChargeRequest, Controls, FrameResult, InductionControls, Lab};

// =============================================================================
// SHARED STATE
// =============================================================================

#[derive(Clone)]
pub struct LabHost {
    pub lab: Arc<RwLock<Lab>>,
    /// Controls the next tick will read; requests are drained once consumed
    pub controls: Arc<RwLock<Controls>>,
    pub latest: Arc<RwLock<Option<FrameResult>>>,
    pub is_running: Arc<RwLock<bool>>,
}

impl LabHost {
    pub fn new(config: LabConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            lab: Arc::new(RwLock::new(Lab::new(config)?)),
            controls: Arc::new(RwLock::new(Controls::default())),
            latest: Arc::new(RwLock::new(None)),
            is_running: Arc::new(RwLock::new(false)),
        })
    }

    /// Drop the one-shot requests a successful tick consumed. Requests queued
    /// while the tick ran stay pending.
    fn consume_requests(&self, applied: &Controls) {
        let mut pending = self.controls.write();
        let n = applied.charge_requests.len().min(pending.charge_requests.len());
        pending.charge_requests.drain(..n);
        if pending.launch_particle == applied.launch_particle {
            pending.launch_particle = None;
        }
    }

    /// Run a single tick and publish the frame. A rejected tick leaves the
    /// pending requests in place.
    pub fn step(&self, dt_wall: f64) -> Result<FrameResult, LabError> {
        let controls = self.controls.read().clone();
        let frame = self.lab.write().tick(dt_wall, &controls)?;
        self.consume_requests(&controls);
        *self.latest.write() = Some(frame.clone());
        Ok(frame)
    }

    pub fn latest_frame(&self) -> Option<FrameResult> {
        self.latest.read().clone()
    }

    pub fn latest_frame_json(&self) -> Result<Option<String>, serde_json::Error> {
        self.latest.read().as_ref().map(FrameResult::to_json).transpose()
    }

    pub fn set_paused(&self, paused: bool) {
        self.controls.write().paused = paused;
    }

    pub fn set_speed(&self, speed: f64) -> Result<(), ControlError> {
        if !speed.is_finite() || speed < 0.0 {
            return Err(ControlError::InvalidSpeed(speed));
        }
        self.controls.write().speed = speed;
        Ok(())
    }

    pub fn set_scale_mode(&self, mode: ScaleMode) {
        self.controls.write().scale_mode = mode;
    }

    pub fn set_view_center(&self, body_id: Option<String>) {
        self.controls.write().view_center = body_id;
    }

    pub fn queue_charge_request(&self, request: ChargeRequest) -> Result<(), ControlError> {
        let candidate = Controls {
            charge_requests: vec![request.clone()],
            ..Controls::default()
        };
        candidate.validate()?;
        self.controls.write().charge_requests.push(request);
        Ok(())
    }

    pub fn set_induction(&self, induction: InductionControls) -> Result<(), ControlError> {
        let candidate = Controls {
            induction,
            ..Controls::default()
        };
        candidate.validate()?;
        self.controls.write().induction = induction;
        Ok(())
    }

    pub fn launch_particle(&self, launch: ParticleLaunch) -> Result<(), ControlError> {
        if !launch.position.is_finite() || !launch.velocity.is_finite() {
            return Err(ControlError::NonFinite("launch_particle"));
        }
        self.controls.write().launch_particle = Some(launch);
        Ok(())
    }

    pub fn reseed_belt(&self, seed: u64) {
        self.lab.write().reseed_belt(seed);
    }

    pub fn reset(&self) {
        self.lab.write().reset();
        *self.latest.write() = None;
    }

    pub fn stop(&self) {
        *self.is_running.write() = false;
    }
}

// =============================================================================
// SIMULATION LOOP (runs in background thread)
// =============================================================================

pub fn start_simulation_loop(host: LabHost) -> thread::JoinHandle<()> {
    *host.is_running.write() = true;
    thread::spawn(move || {
        let target_frame_time = Duration::from_millis(16); // ~60 FPS
        let mut last = Instant::now();

        loop {
            let start = Instant::now();
            let dt_wall = start.duration_since(last).as_secs_f64();
            last = start;

            if let Err(err) = host.step(dt_wall) {
                warn!("tick failed: {err}");
            }

            // Check if we should stop
            if !*host.is_running.read() {
                break;
            }

            // Sleep to maintain frame rate
            let elapsed = start.elapsed();
            if elapsed < target_frame_time {
                thread::sleep(target_frame_time - elapsed);
            }
        }
    })
}
