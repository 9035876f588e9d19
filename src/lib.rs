// CosmoLab - Real-time physics lab kernel
// Orbits, electrostatics and induction computed per tick for an external renderer

pub mod asteroid_belt;
pub mod clock;
pub mod config;
pub mod electrostatics;
pub mod error;
pub mod induction;
pub mod kepler;
pub mod orbits;
pub mod particle;
pub mod simulation;
pub mod state_manager;
pub mod vector;

pub use config::LabConfig;
pub use error::{ConfigError, ControlError, LabError};
pub use simulation::{ChargeRequest, Controls, FrameResult, InductionControls, Lab};
pub use state_manager::{start_simulation_loop, LabHost};
pub use vector::Vector2;
