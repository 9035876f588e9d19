// Simulation Clock - Simulated time decoupled from frame rate
// Advances by speed * fixed_step per tick; wall-clock time never enters here

use chrono::{NaiveDate, TimeDelta};
use serde::{Deserialize, Serialize};

use crate::config::ClockConfig;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationClock {
    /// Simulated time in days since the epoch
    pub time: f64,
    /// Simulated days per tick at speed 1.0
    pub fixed_step: f64,
    /// Speed multiplier (1.0 = one fixed step per tick)
    pub speed: f64,
    pub max_speed: f64,
    pub is_paused: bool,
    pub epoch: NaiveDate,
    /// Ticks observed, paused or not
    pub ticks: u64,
}

impl SimulationClock {
    pub fn new(config: &ClockConfig) -> Self {
        Self {
            time: 0.0,
            fixed_step: config.fixed_step,
            speed: 1.0,
            max_speed: config.max_speed,
            is_paused: false,
            epoch: config.epoch,
            ticks: 0,
        }
    }

    /// Set the speed multiplier, clamped to [0, max_speed].
    pub fn set_speed(&mut self, speed: f64) {
        self.speed = speed.max(0.0).min(self.max_speed);
    }

    pub fn set_paused(&mut self, paused: bool) {
        self.is_paused = paused;
    }

    /// Advance one tick. Returns the simulated time that elapsed (zero while paused).
    pub fn tick(&mut self) -> f64 {
        self.ticks += 1;
        if self.is_paused {
            return 0.0;
        }
        let dt = self.speed * self.fixed_step;
        self.time += dt;
        dt
    }

    /// Calendar date of the current simulated time.
    ///
    /// Saturates at the representable date range instead of wrapping.
    pub fn calendar_date(&self) -> NaiveDate {
        // `as` saturates at the i64 bounds
        let days = self.time.floor() as i64;
        TimeDelta::try_days(days)
            .and_then(|delta| self.epoch.checked_add_signed(delta))
            .unwrap_or(if days < 0 {
                NaiveDate::MIN
            } else {
                NaiveDate::MAX
            })
    }

    pub fn reset(&mut self) {
        self.time = 0.0;
        self.ticks = 0;
    }
}
