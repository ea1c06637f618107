use std::hash::Hasher;

use log::{debug, warn};
use pitwall_sim::numbers::clamp_f64_to_f32;
use pitwall_sim::{
    Action, EpisodeObserver, EpisodeSummary, LapRecord, Observation, RaceConfig,
    RaceStrategySimulator, RenderMode, ResetInfo, SimError, StepResult, run_episode_observed,
};
use serde::{Deserialize, Serialize};
use twox_hash::XxHash64;

use crate::logic::policy::PitStrategy;

/// Slack allowed when comparing accumulated times.
const TIME_TOLERANCE_S: f64 = 1e-6;

/// Configuration for a batch of races driven by one strategy.
#[derive(Debug, Clone)]
pub struct SimulationPlan {
    pub strategy: PitStrategy,
    pub config: RaceConfig,
    pub capture_render: bool,
}

impl SimulationPlan {
    #[must_use]
    pub const fn new(strategy: PitStrategy, config: RaceConfig) -> Self {
        Self {
            strategy,
            config,
            capture_render: false,
        }
    }

    #[must_use]
    pub const fn with_render(mut self, capture_render: bool) -> Self {
        self.capture_render = capture_render;
        self
    }
}

/// One checked race.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RaceRun {
    pub strategy: PitStrategy,
    pub seed: u64,
    pub summary: EpisodeSummary,
    pub violations: Vec<String>,
    pub fingerprint: u64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub render_lines: Vec<String>,
}

impl RaceRun {
    #[must_use]
    pub fn passed(&self) -> bool {
        self.violations.is_empty()
    }
}

/// Drive one race to the flag, checking every step as it happens.
///
/// # Errors
///
/// Returns the simulator's error when the plan's configuration is rejected.
pub fn run_race(plan: &SimulationPlan, seed: u64) -> Result<RaceRun, SimError> {
    let render_mode = if plan.capture_render {
        RenderMode::Ansi
    } else {
        RenderMode::None
    };
    let mut sim = RaceStrategySimulator::with_render_mode(plan.config.clone(), render_mode)?;
    let total_laps = plan.config.total_laps;
    let mut policy = plan.strategy.create_policy(seed, total_laps);
    let mut checker = InvariantChecker::new(total_laps);

    let summary = run_episode_observed(&mut sim, &mut *policy, Some(seed), &mut checker);
    sim.close();

    let mut violations = checker.violations;
    if !summary.terminated {
        violations.push(format!(
            "race stopped at lap {} of {total_laps} without the flag",
            summary.laps
        ));
    }
    let drift = (summary.cumulative_reward + summary.total_time_s).abs();
    if drift > TIME_TOLERANCE_S * summary.total_time_s.abs().max(1.0) {
        violations.push(format!(
            "cumulative reward {:.6} does not mirror elapsed {:.6}",
            summary.cumulative_reward, summary.total_time_s
        ));
    }

    let fingerprint = fingerprint_laps(&summary.lap_log);
    if violations.is_empty() {
        debug!(
            "{} seed {seed}: {:.3}s, {} stops, fingerprint {fingerprint:016x}",
            plan.strategy, summary.total_time_s, summary.pit_stops
        );
    } else {
        warn!(
            "{} seed {seed}: {} invariant violations",
            plan.strategy,
            violations.len()
        );
    }

    Ok(RaceRun {
        strategy: plan.strategy,
        seed,
        summary,
        violations,
        fingerprint,
        render_lines: checker.render_lines,
    })
}

/// Collects invariant violations and render lines while a race runs.
struct InvariantChecker {
    total_laps: u32,
    previous_total_s: f64,
    violations: Vec<String>,
    render_lines: Vec<String>,
}

impl InvariantChecker {
    const fn new(total_laps: u32) -> Self {
        Self {
            total_laps,
            previous_total_s: 0.0,
            violations: Vec::new(),
            render_lines: Vec::new(),
        }
    }
}

impl EpisodeObserver for InvariantChecker {
    fn on_reset(
        &mut self,
        sim: &RaceStrategySimulator,
        observation: &Observation,
        info: &ResetInfo,
    ) {
        check_reset(observation, info.total_time_s, &mut self.violations);
        self.previous_total_s = info.total_time_s;
        self.render_lines.extend(sim.render());
    }

    fn on_step(
        &mut self,
        sim: &RaceStrategySimulator,
        previous: &Observation,
        action: Action,
        result: &StepResult,
    ) {
        let check = StepCheck {
            total_laps: self.total_laps,
            previous,
            previous_total_s: self.previous_total_s,
            action,
            result,
        };
        check.run(&mut self.violations);
        self.previous_total_s = result.info.total_time_s;
        self.render_lines.extend(sim.render());
    }
}

/// Stable digest of a race's decisions and outcomes.
#[must_use]
pub fn fingerprint_laps(laps: &[LapRecord]) -> u64 {
    let mut hasher = XxHash64::with_seed(0);
    for lap in laps {
        hasher.write_u32(lap.lap);
        hasher.write_u8(lap.action.index());
        hasher.write_u64(lap.lap_time_s.to_bits());
        hasher.write_u8(lap.caution.id());
        hasher.write_u8(lap.compound.id());
    }
    hasher.finish()
}

fn check_reset(observation: &Observation, total_time_s: f64, violations: &mut Vec<String>) {
    if observation.lap != 0 || observation.stint_laps != 0 {
        violations.push(format!(
            "reset left lap {} stint {}",
            observation.lap, observation.stint_laps
        ));
    }
    if observation.tire_wear != 0.0 {
        violations.push(format!("reset left wear {}", observation.tire_wear));
    }
    if total_time_s != 0.0 {
        violations.push(format!("reset left elapsed time {total_time_s}"));
    }
}

struct StepCheck<'a> {
    total_laps: u32,
    previous: &'a Observation,
    previous_total_s: f64,
    action: Action,
    result: &'a StepResult,
}

impl StepCheck<'_> {
    fn run(&self, violations: &mut Vec<String>) {
        let obs = &self.result.observation;
        let info = &self.result.info;
        let mut fail = |message: String| violations.push(format!("lap {}: {message}", obs.lap));

        if !(0.0..=1.0).contains(&obs.tire_wear) {
            fail(format!("wear {} outside [0, 1]", obs.tire_wear));
        }
        if !(0.0..=1.0).contains(&obs.ers) {
            fail(format!("ERS {} outside [0, 1]", obs.ers));
        }

        let expected_lap = self.previous.lap.saturating_add(1).min(self.total_laps);
        if obs.lap != expected_lap {
            fail(format!("lap counter {} expected {expected_lap}", obs.lap));
        }

        if info.pitted != self.action.is_pit() {
            fail(format!("pitted flag {} for {:?}", info.pitted, self.action));
        }
        if let Some(compound) = self.action.pit_compound() {
            if obs.compound != compound || info.tire != compound {
                fail(format!("pit for {compound} mounted {}", obs.compound));
            }
            if obs.stint_laps != 0 {
                fail(format!("stint {} after pit", obs.stint_laps));
            }
            let fresh_wear = clamp_f64_to_f32(compound.model().wear_per_lap);
            if (obs.tire_wear - fresh_wear).abs() > 1e-6 {
                fail(format!(
                    "wear {} after pit, fresh set should read {fresh_wear}",
                    obs.tire_wear
                ));
            }
        } else {
            if obs.compound != self.previous.compound {
                fail(format!(
                    "compound changed from {} to {} without a stop",
                    self.previous.compound, obs.compound
                ));
            }
            if obs.stint_laps != self.previous.stint_laps + 1 {
                fail(format!(
                    "stint {} expected {}",
                    obs.stint_laps,
                    self.previous.stint_laps + 1
                ));
            }
        }

        let should_terminate = obs.lap >= self.total_laps;
        if self.result.terminated != should_terminate {
            fail(format!(
                "terminated {} at lap {}/{}",
                self.result.terminated, obs.lap, self.total_laps
            ));
        }
        if self.result.truncated {
            fail("truncated is never expected".to_string());
        }

        if !info.lap_time_s.is_finite() {
            fail(format!("non-finite lap time {}", info.lap_time_s));
        }
        if (self.result.reward + info.lap_time_s).abs() > TIME_TOLERANCE_S {
            fail(format!(
                "reward {} is not the negated lap time {}",
                self.result.reward, info.lap_time_s
            ));
        }
        let expected_total = self.previous_total_s + info.lap_time_s;
        if (info.total_time_s - expected_total).abs() > TIME_TOLERANCE_S {
            fail(format!(
                "elapsed {} expected {expected_total}",
                info.total_time_s
            ));
        }
    }
}
