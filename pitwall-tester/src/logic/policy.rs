use std::fmt;
use std::str::FromStr;

use pitwall_sim::{Action, Observation, Policy, TireCompound};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StrategyError {
    #[error("unknown strategy '{0}' (see --list-strategies)")]
    Unknown(String),
}

/// Built-in pit strategies for automated runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PitStrategy {
    Random,
    StayOut,
    OneStop,
    TwoStop,
    WearThreshold,
    ErsManager,
    CautionOpportunist,
}

impl PitStrategy {
    pub const ALL: [Self; 7] = [
        Self::Random,
        Self::StayOut,
        Self::OneStop,
        Self::TwoStop,
        Self::WearThreshold,
        Self::ErsManager,
        Self::CautionOpportunist,
    ];

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            PitStrategy::Random => "Random",
            PitStrategy::StayOut => "Stay Out",
            PitStrategy::OneStop => "One Stop",
            PitStrategy::TwoStop => "Two Stop",
            PitStrategy::WearThreshold => "Wear Threshold",
            PitStrategy::ErsManager => "ERS Manager",
            PitStrategy::CautionOpportunist => "Caution Opportunist",
        }
    }

    /// CLI key accepted by `--strategies`.
    #[must_use]
    pub fn key(self) -> &'static str {
        match self {
            PitStrategy::Random => "random",
            PitStrategy::StayOut => "stay-out",
            PitStrategy::OneStop => "one-stop",
            PitStrategy::TwoStop => "two-stop",
            PitStrategy::WearThreshold => "wear-threshold",
            PitStrategy::ErsManager => "ers-manager",
            PitStrategy::CautionOpportunist => "caution-opportunist",
        }
    }

    #[must_use]
    pub fn description(self) -> &'static str {
        match self {
            PitStrategy::Random => "Uniformly sampled actions from a seeded stream",
            PitStrategy::StayOut => "Never pits, runs every lap at normal pace",
            PitStrategy::OneStop => "Single stop for hards just before half distance",
            PitStrategy::TwoStop => "Stops for mediums at one and two thirds distance",
            PitStrategy::WearThreshold => "Pits once wear crosses a threshold",
            PitStrategy::ErsManager => "Pushes with spare energy, saves when depleted",
            PitStrategy::CautionOpportunist => "Prefers to pit under caution when loss is reduced",
        }
    }

    #[must_use]
    pub fn from_key(key: &str) -> Option<Self> {
        let normalized = key.trim().to_ascii_lowercase().replace('_', "-");
        Self::ALL.into_iter().find(|s| s.key() == normalized)
    }

    #[must_use]
    pub fn create_policy(self, seed: u64, total_laps: u32) -> Box<dyn Policy + Send> {
        match self {
            PitStrategy::Random => Box::new(RandomPolicy::new(seed)),
            PitStrategy::StayOut => Box::new(StayOutPolicy),
            PitStrategy::OneStop => Box::new(ScheduledStopPolicy::one_stop(total_laps)),
            PitStrategy::TwoStop => Box::new(ScheduledStopPolicy::two_stop(total_laps)),
            PitStrategy::WearThreshold => Box::new(WearThresholdPolicy::new(total_laps, 0.75)),
            PitStrategy::ErsManager => Box::new(ErsManagerPolicy::new(total_laps)),
            PitStrategy::CautionOpportunist => Box::new(CautionOpportunistPolicy::new(total_laps)),
        }
    }
}

impl FromStr for PitStrategy {
    type Err = StrategyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_key(s).ok_or_else(|| StrategyError::Unknown(s.trim().to_string()))
    }
}

/// Expand CLI strategy keys, honoring `all`, without duplicates.
///
/// # Errors
///
/// Returns `StrategyError::Unknown` for the first unrecognized key.
pub fn expand_strategies(keys: &[String]) -> Result<Vec<PitStrategy>, StrategyError> {
    let mut strategies: Vec<PitStrategy> = Vec::new();
    for key in keys {
        let batch = if key.eq_ignore_ascii_case("all") {
            PitStrategy::ALL.to_vec()
        } else {
            vec![key.parse()?]
        };
        for strategy in batch {
            if !strategies.contains(&strategy) {
                strategies.push(strategy);
            }
        }
    }
    Ok(strategies)
}

impl fmt::Display for PitStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Fastest compound expected to last the remaining laps at normal pace.
#[must_use]
pub fn compound_for_remaining(remaining_laps: u32) -> TireCompound {
    let remaining = f64::from(remaining_laps);
    [TireCompound::Soft, TireCompound::Medium]
        .into_iter()
        .find(|compound| remaining * compound.model().wear_per_lap <= 1.0)
        .unwrap_or(TireCompound::Hard)
}

fn remaining_laps(total_laps: u32, observation: &Observation) -> u32 {
    total_laps.saturating_sub(observation.lap)
}

/// `total_laps * num / den` without overflowing on very long races.
fn lap_fraction(total_laps: u32, num: u64, den: u64) -> u32 {
    u32::try_from(u64::from(total_laps) * num / den).unwrap_or(total_laps)
}

struct RandomPolicy {
    rng: ChaCha20Rng,
}

impl RandomPolicy {
    fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha20Rng::seed_from_u64(seed),
        }
    }
}

impl Policy for RandomPolicy {
    fn name(&self) -> &str {
        "Random"
    }

    fn choose_action(&mut self, _observation: &Observation) -> Action {
        let idx = self.rng.gen_range(0..Action::COUNT);
        Action::ALL[idx]
    }
}

struct StayOutPolicy;

impl Policy for StayOutPolicy {
    fn name(&self) -> &str {
        "Stay Out"
    }

    fn choose_action(&mut self, _observation: &Observation) -> Action {
        Action::StayNormal
    }
}

/// Pits on fixed laps, fitting a fixed compound at each stop.
struct ScheduledStopPolicy {
    name: &'static str,
    stops: Vec<(u32, TireCompound)>,
}

impl ScheduledStopPolicy {
    fn one_stop(total_laps: u32) -> Self {
        Self {
            name: "One Stop",
            stops: vec![(lap_fraction(total_laps, 9, 20), TireCompound::Hard)],
        }
    }

    fn two_stop(total_laps: u32) -> Self {
        Self {
            name: "Two Stop",
            stops: vec![
                (lap_fraction(total_laps, 1, 3), TireCompound::Medium),
                (lap_fraction(total_laps, 2, 3), TireCompound::Medium),
            ],
        }
    }
}

impl Policy for ScheduledStopPolicy {
    fn name(&self) -> &str {
        self.name
    }

    fn choose_action(&mut self, observation: &Observation) -> Action {
        self.stops
            .iter()
            .find(|(lap, _)| *lap > 0 && *lap == observation.lap)
            .map_or(Action::StayNormal, |(_, compound)| Action::pit_for(*compound))
    }
}

struct WearThresholdPolicy {
    total_laps: u32,
    threshold: f32,
}

impl WearThresholdPolicy {
    fn new(total_laps: u32, threshold: f32) -> Self {
        Self {
            total_laps,
            threshold,
        }
    }
}

impl Policy for WearThresholdPolicy {
    fn name(&self) -> &str {
        "Wear Threshold"
    }

    fn choose_action(&mut self, observation: &Observation) -> Action {
        let remaining = remaining_laps(self.total_laps, observation);
        // Not worth a stop when the race is nearly over.
        if observation.tire_wear >= self.threshold && remaining > 5 {
            return Action::pit_for(compound_for_remaining(remaining));
        }
        Action::StayNormal
    }
}

struct ErsManagerPolicy {
    total_laps: u32,
    pushing: bool,
}

impl ErsManagerPolicy {
    fn new(total_laps: u32) -> Self {
        Self {
            total_laps,
            pushing: true,
        }
    }
}

impl Policy for ErsManagerPolicy {
    fn name(&self) -> &str {
        "ERS Manager"
    }

    fn choose_action(&mut self, observation: &Observation) -> Action {
        let remaining = remaining_laps(self.total_laps, observation);
        if observation.tire_wear >= 0.8 && remaining > 5 {
            return Action::pit_for(compound_for_remaining(remaining));
        }
        // Hysteresis between draining and rebuilding the reserve.
        if observation.ers <= 0.2 {
            self.pushing = false;
        } else if observation.ers >= 0.6 {
            self.pushing = true;
        }
        if remaining <= 3 && observation.ers > 0.0 {
            return Action::StayPush;
        }
        if self.pushing {
            Action::StayPush
        } else {
            Action::StayConserve
        }
    }

    fn reset(&mut self) {
        self.pushing = true;
    }
}

struct CautionOpportunistPolicy {
    total_laps: u32,
}

impl CautionOpportunistPolicy {
    fn new(total_laps: u32) -> Self {
        Self { total_laps }
    }
}

impl Policy for CautionOpportunistPolicy {
    fn name(&self) -> &str {
        "Caution Opportunist"
    }

    fn choose_action(&mut self, observation: &Observation) -> Action {
        let remaining = remaining_laps(self.total_laps, observation);
        if remaining <= 2 {
            return Action::StayNormal;
        }
        // The caution seen is last lap's; it is only a hint for this lap's draw.
        let cheap_stop = observation.caution.is_active() && observation.tire_wear >= 0.35;
        if cheap_stop || (observation.tire_wear >= 0.9 && remaining > 5) {
            return Action::pit_for(compound_for_remaining(remaining));
        }
        Action::StayNormal
    }
}
