//! Environment-style contract and the decision-maker interface it drives.
use log::debug;
use serde::{Deserialize, Serialize};

use crate::action::Action;
use crate::caution::CautionState;
use crate::numbers::u32_to_f64;
use crate::observation::{Observation, ResetInfo, StepInfo, StepResult};
use crate::simulator::{RaceStrategySimulator, ResetOptions};
use crate::tire::TireCompound;

/// Minimal step-based decision environment.
pub trait Environment {
    type Observation;
    type Action;
    type Info;
    type ResetInfo;
    /// Starting overrides accepted by [`Environment::reset_with`].
    type Options;

    /// Reinitialize the episode, optionally reseeding.
    fn reset(&mut self, seed: Option<u64>) -> (Self::Observation, Self::ResetInfo) {
        self.reset_with(seed, None)
    }

    /// Reinitialize with optional starting overrides; `None` keeps the defaults.
    fn reset_with(
        &mut self,
        seed: Option<u64>,
        options: Option<Self::Options>,
    ) -> (Self::Observation, Self::ResetInfo);

    /// Advance one decision step.
    fn step(&mut self, action: Self::Action) -> StepOutcome<Self::Observation, Self::Info>;

    /// Optional presentational summary.
    fn render(&self) -> Option<String>;

    fn close(&mut self);

    /// Size of the discrete action set.
    fn action_count(&self) -> usize;
}

/// Generic `(observation, reward, terminated, truncated, info)` tuple.
#[derive(Debug, Clone, PartialEq)]
pub struct StepOutcome<O, I> {
    pub observation: O,
    pub reward: f64,
    pub terminated: bool,
    pub truncated: bool,
    pub info: I,
}

impl From<StepResult> for StepOutcome<Observation, StepInfo> {
    fn from(result: StepResult) -> Self {
        Self {
            observation: result.observation,
            reward: result.reward,
            terminated: result.terminated,
            truncated: result.truncated,
            info: result.info,
        }
    }
}

impl Environment for RaceStrategySimulator {
    type Observation = Observation;
    type Action = Action;
    type Info = StepInfo;
    type ResetInfo = ResetInfo;
    type Options = ResetOptions;

    fn reset(&mut self, seed: Option<u64>) -> (Observation, ResetInfo) {
        Self::reset(self, seed)
    }

    fn reset_with(
        &mut self,
        seed: Option<u64>,
        options: Option<ResetOptions>,
    ) -> (Observation, ResetInfo) {
        Self::reset_with(self, seed, options.unwrap_or_default())
    }

    fn step(&mut self, action: Action) -> StepOutcome<Observation, StepInfo> {
        Self::step(self, action).into()
    }

    fn render(&self) -> Option<String> {
        Self::render(self)
    }

    fn close(&mut self) {
        Self::close(self);
    }

    fn action_count(&self) -> usize {
        Action::COUNT
    }
}

/// Anything that maps an observation to an action.
pub trait Policy {
    /// Name used for logging/debug output.
    fn name(&self) -> &str;

    fn choose_action(&mut self, observation: &Observation) -> Action;

    /// Called before each episode so stateful policies can clear their memory.
    fn reset(&mut self) {}
}

/// Adapter turning a closure into a [`Policy`].
pub struct FnPolicy<F> {
    name: String,
    f: F,
}

impl<F> FnPolicy<F>
where
    F: FnMut(&Observation) -> Action,
{
    pub fn new(name: impl Into<String>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
        }
    }
}

impl<F> Policy for FnPolicy<F>
where
    F: FnMut(&Observation) -> Action,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn choose_action(&mut self, observation: &Observation) -> Action {
        (self.f)(observation)
    }
}

/// Ledger entry for one simulated lap.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LapRecord {
    pub lap: u32,
    pub action: Action,
    pub lap_time_s: f64,
    pub pitted: bool,
    pub compound: TireCompound,
    pub tire_wear: f32,
    pub ers: f32,
    pub caution: CautionState,
}

/// Result of driving a full race with one policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpisodeSummary {
    pub policy: String,
    pub seed: u64,
    pub laps: u32,
    pub total_time_s: f64,
    pub cumulative_reward: f64,
    pub pit_stops: u32,
    pub caution_laps: u32,
    pub terminated: bool,
    pub lap_log: Vec<LapRecord>,
}

impl EpisodeSummary {
    #[must_use]
    pub fn lap_times(&self) -> Vec<f64> {
        self.lap_log.iter().map(|lap| lap.lap_time_s).collect()
    }

    /// Average lap time, if any lap was run.
    #[must_use]
    pub fn mean_lap_time_s(&self) -> Option<f64> {
        (self.laps > 0).then(|| self.total_time_s / u32_to_f64(self.laps))
    }

    /// Fastest single lap of the race, if any lap was run.
    #[must_use]
    pub fn fastest_lap_s(&self) -> Option<f64> {
        self.lap_log
            .iter()
            .map(|lap| lap.lap_time_s)
            .min_by(f64::total_cmp)
    }
}

/// Hooks called by [`run_episode_observed`] around every reset and lap.
pub trait EpisodeObserver {
    fn on_reset(
        &mut self,
        _sim: &RaceStrategySimulator,
        _observation: &Observation,
        _info: &ResetInfo,
    ) {
    }

    /// `previous` is the observation the action was chosen from.
    fn on_step(
        &mut self,
        _sim: &RaceStrategySimulator,
        _previous: &Observation,
        _action: Action,
        _result: &StepResult,
    ) {
    }
}

impl EpisodeObserver for () {}

/// Run one full race from `reset(seed)` until termination.
pub fn run_episode(
    sim: &mut RaceStrategySimulator,
    policy: &mut dyn Policy,
    seed: Option<u64>,
) -> EpisodeSummary {
    run_episode_observed(sim, policy, seed, &mut ())
}

/// [`run_episode`] with an observer notified after the reset and each step.
pub fn run_episode_observed(
    sim: &mut RaceStrategySimulator,
    policy: &mut dyn Policy,
    seed: Option<u64>,
    observer: &mut dyn EpisodeObserver,
) -> EpisodeSummary {
    policy.reset();
    let (mut observation, reset_info) = sim.reset(seed);
    observer.on_reset(sim, &observation, &reset_info);
    let mut lap_log = Vec::with_capacity(usize::try_from(sim.config().total_laps).unwrap_or(0));
    let mut cumulative_reward = 0.0;
    let mut pit_stops = 0;
    let mut caution_laps = 0;
    let mut terminated = sim.is_terminated();

    while !terminated {
        let action = policy.choose_action(&observation);
        let result = sim.step(action);
        observer.on_step(sim, &observation, action, &result);
        cumulative_reward += result.reward;
        if result.info.pitted {
            pit_stops += 1;
        }
        if result.info.caution.is_active() {
            caution_laps += 1;
        }
        lap_log.push(LapRecord {
            lap: result.observation.lap,
            action,
            lap_time_s: result.info.lap_time_s,
            pitted: result.info.pitted,
            compound: result.observation.compound,
            tire_wear: result.observation.tire_wear,
            ers: result.observation.ers,
            caution: result.info.caution,
        });
        observation = result.observation;
        terminated = result.is_done();
    }

    let summary = EpisodeSummary {
        policy: policy.name().to_string(),
        seed: sim.seed(),
        laps: sim.state().lap,
        total_time_s: sim.state().total_time_s,
        cumulative_reward,
        pit_stops,
        caution_laps,
        terminated,
        lap_log,
    };
    debug!(
        "{} finished seed {} in {:.3}s with {} stops",
        summary.policy, summary.seed, summary.total_time_s, summary.pit_stops
    );
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RaceConfig;

    #[test]
    fn closure_policies_drive_a_full_race() {
        let mut sim = RaceStrategySimulator::new(RaceConfig::default().with_total_laps(10)).unwrap();
        let mut policy = FnPolicy::new("pit-on-five", |obs: &Observation| {
            if obs.lap == 5 {
                Action::PitHard
            } else {
                Action::StayNormal
            }
        });
        let summary = run_episode(&mut sim, &mut policy, Some(42));
        assert_eq!(summary.policy, "pit-on-five");
        assert_eq!(summary.laps, 10);
        assert_eq!(summary.lap_log.len(), 10);
        assert_eq!(summary.pit_stops, 1);
        assert!(summary.terminated);
        assert!((summary.cumulative_reward + summary.total_time_s).abs() < 1e-6);
        assert_eq!(summary.lap_log[5].compound, TireCompound::Hard);
        assert!(summary.fastest_lap_s().is_some());
        let mean = summary.mean_lap_time_s().unwrap();
        assert!((mean * 10.0 - summary.total_time_s).abs() < 1e-6);
    }

    #[test]
    fn mean_lap_time_is_none_before_any_lap() {
        let summary = EpisodeSummary {
            policy: "idle".to_string(),
            seed: 0,
            laps: 0,
            total_time_s: 0.0,
            cumulative_reward: 0.0,
            pit_stops: 0,
            caution_laps: 0,
            terminated: false,
            lap_log: Vec::new(),
        };
        assert!(summary.mean_lap_time_s().is_none());
        assert!(summary.fastest_lap_s().is_none());
    }

    #[derive(Default)]
    struct Tally {
        resets: u32,
        steps: u32,
        laps_seen: Vec<u32>,
        previous_laps: Vec<u32>,
    }

    impl EpisodeObserver for Tally {
        fn on_reset(
            &mut self,
            sim: &RaceStrategySimulator,
            observation: &Observation,
            info: &ResetInfo,
        ) {
            self.resets += 1;
            assert_eq!(observation.lap, sim.state().lap);
            assert!(info.total_time_s.abs() < f64::EPSILON);
        }

        fn on_step(
            &mut self,
            sim: &RaceStrategySimulator,
            previous: &Observation,
            _action: Action,
            result: &StepResult,
        ) {
            self.steps += 1;
            assert_eq!(result.observation.lap, sim.state().lap);
            self.previous_laps.push(previous.lap);
            self.laps_seen.push(result.observation.lap);
        }
    }

    #[test]
    fn observer_sees_the_reset_and_every_lap() {
        let mut sim =
            RaceStrategySimulator::new(RaceConfig::default().with_total_laps(6)).unwrap();
        let mut policy = FnPolicy::new("steady", |_: &Observation| Action::StayNormal);
        let mut tally = Tally::default();
        let observed = run_episode_observed(&mut sim, &mut policy, Some(9), &mut tally);
        assert_eq!(tally.resets, 1);
        assert_eq!(tally.steps, 6);
        assert_eq!(tally.previous_laps, vec![0, 1, 2, 3, 4, 5]);
        assert_eq!(tally.laps_seen, vec![1, 2, 3, 4, 5, 6]);

        let plain = run_episode(&mut sim, &mut policy, Some(9));
        assert_eq!(plain, observed);
    }

    #[test]
    fn environment_trait_matches_inherent_api() {
        let cfg = RaceConfig::default().with_total_laps(1).with_seed(42);
        let mut sim = RaceStrategySimulator::new(cfg).unwrap();
        let env: &mut dyn Environment<
            Observation = Observation,
            Action = Action,
            Info = StepInfo,
            ResetInfo = ResetInfo,
            Options = ResetOptions,
        > = &mut sim;
        let (obs, _) = env.reset(None);
        assert_eq!(obs.lap, 0);
        assert_eq!(env.action_count(), 6);
        let outcome = env.step(Action::StayNormal);
        assert!(outcome.terminated);
        assert!((outcome.reward + outcome.info.lap_time_s).abs() < f64::EPSILON);
        assert!(env.render().is_none());
        env.close();
    }

    #[test]
    fn environment_reset_accepts_starting_overrides() {
        let cfg = RaceConfig::default().with_total_laps(5).with_seed(42);
        let mut sim = RaceStrategySimulator::new(cfg).unwrap();
        let options = ResetOptions {
            start_compound: TireCompound::Soft,
            start_ers: 1.0,
        };
        let (obs, _) = Environment::reset_with(&mut sim, Some(3), Some(options));
        assert_eq!(obs.compound, TireCompound::Soft);
        assert!((obs.ers - 1.0).abs() < f32::EPSILON);

        let (obs, _) = Environment::reset_with(&mut sim, None, None);
        assert_eq!(obs.compound, TireCompound::Medium);
        assert!((f64::from(obs.ers) - crate::simulator::DEFAULT_START_ERS).abs() < 1e-6);
    }
}
