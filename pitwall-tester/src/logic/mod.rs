pub mod analysis;
pub mod policy;
pub mod reports;
pub mod seeds;
pub mod simulation;
pub mod tester;

pub use analysis::{StrategyAggregate, aggregate_results};
pub use policy::{PitStrategy, StrategyError, expand_strategies};
pub use seeds::resolve_seed_inputs;
pub use simulation::{RaceRun, SimulationPlan, run_race};
pub use tester::*;
