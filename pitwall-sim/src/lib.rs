//! Pitwall Race Strategy Simulator
//!
//! Single-car race-strategy core: a discrete-time stochastic model of lap
//! time, tire degradation, energy-recovery management, and randomly injected
//! caution periods, exposed as a step-based decision environment.
//! This crate performs no I/O; callers drive it through [`Environment`] or the
//! inherent [`RaceStrategySimulator`] API.

pub mod action;
pub mod caution;
pub mod config;
pub mod env;
pub mod error;
pub mod numbers;
pub mod observation;
pub mod rng;
pub mod simulator;
pub mod tire;

// Re-export commonly used types
pub use action::{Action, Pace};
pub use caution::CautionState;
pub use config::RaceConfig;
pub use env::{
    EpisodeObserver, EpisodeSummary, Environment, FnPolicy, LapRecord, Policy, StepOutcome,
    run_episode, run_episode_observed,
};
pub use error::{ConfigError, SimError};
pub use observation::{FEATURE_COUNT, Observation, ResetInfo, StepInfo, StepResult};
pub use rng::RaceRng;
pub use simulator::{
    DEFAULT_START_ERS, RaceState, RaceStrategySimulator, RenderMode, ResetOptions, WEAR_CEILING,
};
pub use tire::{TireCompound, TireModel};
