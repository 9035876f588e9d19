// Induction Model - Moving dipole source near a coil
// Flux from a softened power-law field, EMF from a backward difference of flux

use log::trace;
use serde::{Deserialize, Serialize};

use crate::config::InductionConfig;

/// Carrier phases live on a closed path of this length
pub const PHASE_PERIOD: f64 = 100.0;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum Polarity {
    /// North pole faces the coil
    #[default]
    North,
    South,
}

impl Polarity {
    pub fn sign(self) -> f64 {
        match self {
            Polarity::North => 1.0,
            Polarity::South => -1.0,
        }
    }

    pub fn flipped(self) -> Self {
        match self {
            Polarity::North => Polarity::South,
            Polarity::South => Polarity::North,
        }
    }
}

/// Coil geometry, source placement and the flux carried from the previous tick.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct InductionState {
    /// Signed source-to-coil separation (canvas units)
    pub source_position: f64,
    pub loop_count: u32,
    pub loop_area: f64,
    pub polarity: Polarity,
    /// Flux computed on the previous tick; `None` until the first update
    pub previous_flux: Option<f64>,
}

impl Default for InductionState {
    fn default() -> Self {
        Self {
            source_position: -250.0,
            loop_count: 5,
            loop_area: 1.0,
            polarity: Polarity::North,
            previous_flux: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct InductionReading {
    pub magnetic_field: f64,
    pub flux: f64,
    pub emf: f64,
    /// Induced current through the coil resistance (A)
    pub current: f64,
}

/// Field magnitude at the coil: B0 * sign / (|d*s|^2.5 + ε).
pub fn magnetic_field(separation: f64, polarity: Polarity, config: &InductionConfig) -> f64 {
    let d = (separation * config.distance_scale).abs();
    config.field_strength * polarity.sign() / (d.powf(2.5) + config.softening)
}

/// Flux linkage: B * (area / reference area) * loop count.
pub fn flux(state: &InductionState, config: &InductionConfig) -> f64 {
    let b = magnetic_field(state.source_position, state.polarity, config);
    b * (state.loop_area / config.reference_area) * state.loop_count as f64
}

/// Advance the induction state by one tick of `dt` wall-clock seconds.
///
/// EMF is -(Φ - Φ_prev)/dt * emf_scale. It is reported as zero when there is
/// no previous flux yet or `dt` falls outside (0, max_dt]; the previous flux
/// is replaced either way so the next tick differences against this one.
pub fn update(
    state: &InductionState,
    dt: f64,
    config: &InductionConfig,
) -> (InductionState, InductionReading) {
    let magnetic_field = magnetic_field(state.source_position, state.polarity, config);
    let flux = flux(state, config);

    let emf = match state.previous_flux {
        Some(previous) if dt > 0.0 && dt <= config.max_dt => {
            -(flux - previous) / dt * config.emf_scale
        }
        Some(_) => {
            trace!("discarding EMF sample for dt = {dt}");
            0.0
        }
        None => 0.0,
    };

    let next = InductionState {
        previous_flux: Some(flux),
        ..*state
    };
    let reading = InductionReading {
        magnetic_field,
        flux,
        emf,
        current: emf / config.resistance,
    };
    (next, reading)
}

// =============================================================================
// CARRIER DRIFT
// =============================================================================

/// Normalised positions of charge carriers along the circuit path.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CarrierPhases {
    pub phases: Vec<f64>,
}

impl CarrierPhases {
    /// `count` carriers spaced evenly around the path.
    pub fn evenly_spaced(count: usize) -> Self {
        let spacing = if count > 0 {
            PHASE_PERIOD / count as f64
        } else {
            0.0
        };
        Self {
            phases: (0..count).map(|i| i as f64 * spacing).collect(),
        }
    }

    /// Shift every carrier by emf * coefficient. Positive EMF drifts forward
    /// along the path, negative EMF backward, opposing the flux change.
    pub fn drift(&mut self, emf: f64, coefficient: f64) {
        let shift = emf * coefficient;
        if shift == 0.0 || !shift.is_finite() {
            return;
        }
        for phase in &mut self.phases {
            *phase = wrap_phase(*phase + shift);
        }
    }
}

fn wrap_phase(phase: f64) -> f64 {
    let wrapped = phase.rem_euclid(PHASE_PERIOD);
    // rem_euclid can round up to the period for tiny negative inputs
    if wrapped >= PHASE_PERIOD {
        0.0
    } else {
        wrapped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn config() -> InductionConfig {
        InductionConfig::default()
    }

    const DT: f64 = 1.0 / 60.0;

    fn step_to(state: &InductionState, position: f64) -> (InductionState, InductionReading) {
        let moved = InductionState {
            source_position: position,
            ..*state
        };
        update(&moved, DT, &config())
    }

    #[test]
    fn test_zero_loops_or_area_gives_zero_flux_and_emf() {
        for (loops, area) in [(0, 1.0), (5, 0.0), (0, 0.0)] {
            let mut state = InductionState {
                loop_count: loops,
                loop_area: area,
                ..InductionState::default()
            };
            for i in 0..50 {
                let (next, reading) = step_to(&state, -200.0 + i as f64 * 8.0);
                assert_eq!(reading.flux, 0.0);
                assert_eq!(reading.emf, 0.0);
                state = next;
            }
        }
    }

    #[test]
    fn test_emf_sign_flips_with_polarity() {
        let north = InductionState::default();
        let south = InductionState {
            polarity: north.polarity.flipped(),
            ..north
        };
        let (north, _) = step_to(&north, -120.0);
        let (south, _) = step_to(&south, -120.0);
        let (_, n) = step_to(&north, -100.0);
        let (_, s) = step_to(&south, -100.0);
        assert!(n.emf != 0.0);
        assert_relative_eq!(n.emf, -s.emf, max_relative = 1e-12);
    }

    #[test]
    fn test_first_update_reports_zero_emf() {
        let (next, reading) = update(&InductionState::default(), DT, &config());
        assert_eq!(reading.emf, 0.0);
        assert_eq!(next.previous_flux, Some(reading.flux));
    }

    #[test]
    fn test_out_of_range_dt_rejected_but_history_kept() {
        let (state, _) = step_to(&InductionState::default(), -150.0);
        for dt in [0.0, -0.01, 0.5, f64::NAN] {
            let moved = InductionState {
                source_position: -50.0,
                ..state
            };
            let (next, reading) = update(&moved, dt, &config());
            assert_eq!(reading.emf, 0.0);
            assert_eq!(next.previous_flux, Some(reading.flux));
        }
    }

    #[test]
    fn test_zero_separation_is_finite() {
        let b = magnetic_field(0.0, Polarity::North, &config());
        assert_relative_eq!(b, 1.0 / 0.1, max_relative = 1e-12);
    }

    #[test]
    fn test_sweep_past_coil() {
        let speed = 2.0;
        let mut state = InductionState {
            source_position: -300.0,
            ..InductionState::default()
        };
        let mut samples = Vec::new();
        let mut position = -300.0;
        while position <= 300.0 {
            let (next, reading) = step_to(&state, position);
            samples.push((position, reading));
            state = next;
            position += speed;
        }

        // Flux magnitude grows monotonically on approach
        let approach: Vec<_> = samples.iter().filter(|(d, _)| *d <= 0.0).collect();
        for pair in approach.windows(2) {
            assert!(pair[1].1.flux.abs() > pair[0].1.flux.abs());
        }

        // EMF peaks close to the coil
        let (peak_d, _) = samples
            .iter()
            .skip(1)
            .max_by(|a, b| a.1.emf.abs().total_cmp(&b.1.emf.abs()))
            .map(|(d, r)| (*d, *r))
            .unwrap();
        assert!(peak_d.abs() < 60.0, "peak at {peak_d}");

        // Opposite EMF signs while approaching and receding
        let approaching = samples.iter().find(|(d, _)| (*d + 40.0).abs() < 1e-9).unwrap().1;
        let receding = samples.iter().find(|(d, _)| (*d - 40.0).abs() < 1e-9).unwrap().1;
        assert!(approaching.emf < 0.0);
        assert!(receding.emf > 0.0);
    }

    #[test]
    fn test_current_follows_emf() {
        let (state, _) = step_to(&InductionState::default(), -90.0);
        let (_, r) = step_to(&state, -80.0);
        assert_relative_eq!(r.current, r.emf / config().resistance, max_relative = 1e-12);
    }

    #[test]
    fn test_carrier_drift_wraps() {
        let mut carriers = CarrierPhases::evenly_spaced(4);
        assert_eq!(carriers.phases, vec![0.0, 25.0, 50.0, 75.0]);
        carriers.drift(60.0, 0.5);
        assert_eq!(carriers.phases, vec![30.0, 55.0, 80.0, 5.0]);
        carriers.drift(-80.0, 0.5);
        assert_eq!(carriers.phases, vec![90.0, 15.0, 40.0, 65.0]);
        assert!(carriers.phases.iter().all(|p| (0.0..100.0).contains(p)));
    }
}
