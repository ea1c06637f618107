use colored::Colorize;
use pitwall_sim::RaceConfig;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

use crate::logic::policy::PitStrategy;
use crate::logic::simulation::{RaceRun, SimulationPlan, run_race};

/// Outcome of running one strategy from one base seed for several iterations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub scenario_name: String,
    pub strategy: PitStrategy,
    pub seed: u64,
    pub passed: bool,
    pub iterations_run: usize,
    pub successful_iterations: usize,
    pub failures: Vec<String>,
    pub race_times_s: Vec<f64>,
    pub pit_stops: Vec<u32>,
    pub caution_laps: Vec<u32>,
    pub fastest_laps_s: Vec<f64>,
    pub fingerprints: Vec<String>,
    #[serde(with = "duration_serde")]
    pub average_duration: Duration,
    #[serde(with = "duration_vec_serde")]
    pub performance_data: Vec<Duration>,
    #[serde(skip)]
    pub runs: Vec<RaceRun>,
}

pub struct StrategyTester {
    config: RaceConfig,
    verbose: bool,
    capture_render: bool,
}

impl StrategyTester {
    pub const fn new(config: RaceConfig, verbose: bool) -> Self {
        Self {
            config,
            verbose,
            capture_render: false,
        }
    }

    #[must_use]
    pub const fn with_render(mut self, capture_render: bool) -> Self {
        self.capture_render = capture_render;
        self
    }

    pub fn run_strategy(
        &self,
        strategy: PitStrategy,
        seeds: &[u64],
        iterations: usize,
    ) -> Vec<ScenarioResult> {
        let plan =
            SimulationPlan::new(strategy, self.config.clone()).with_render(self.capture_render);
        let mut results = Vec::new();

        for &seed in seeds {
            if self.verbose {
                println!(
                    "🧪 Testing strategy: {} (laps: {} seed: {})",
                    strategy.label().bright_white(),
                    self.config.total_laps,
                    seed
                );
            }
            results.push(self.run_single_scenario(&plan, seed, iterations));
        }

        results
    }

    fn run_single_scenario(
        &self,
        plan: &SimulationPlan,
        seed: u64,
        iterations: usize,
    ) -> ScenarioResult {
        let mut result = ScenarioResult {
            scenario_name: plan.strategy.label().to_string(),
            strategy: plan.strategy,
            seed,
            passed: false,
            iterations_run: iterations,
            successful_iterations: 0,
            failures: Vec::new(),
            race_times_s: Vec::new(),
            pit_stops: Vec::new(),
            caution_laps: Vec::new(),
            fastest_laps_s: Vec::new(),
            fingerprints: Vec::new(),
            average_duration: Duration::ZERO,
            performance_data: Vec::new(),
            runs: Vec::new(),
        };

        for i in 0..iterations {
            let start_time = Instant::now();
            let iteration_seed = seed.wrapping_add(u64::try_from(i).unwrap_or(u64::MAX));

            let run = match run_race(plan, iteration_seed) {
                Ok(run) => run,
                Err(err) => {
                    result.failures.push(format!(
                        "Iteration {} (seed {iteration_seed}): simulator rejected the race: {err}",
                        i + 1
                    ));
                    continue;
                }
            };
            let mut problems = run.violations.clone();
            problems.extend(determinism_problem(plan, &run));

            if problems.is_empty() {
                result.successful_iterations += 1;
                let duration = start_time.elapsed();
                result.performance_data.push(duration);
                if self.verbose {
                    println!(
                        "  ✅ Iteration {}/{} passed ({duration:?}) time:{:.3}s stops:{} caution laps:{}",
                        i + 1,
                        iterations,
                        run.summary.total_time_s,
                        run.summary.pit_stops,
                        run.summary.caution_laps
                    );
                }
            } else {
                if self.verbose {
                    println!(
                        "  ❌ Iteration {}/{} failed: {}",
                        i + 1,
                        iterations,
                        problems[0].clone().red()
                    );
                }
                for problem in problems {
                    result.failures.push(format!(
                        "Iteration {} (strategy {}, seed {iteration_seed}): {problem}",
                        i + 1,
                        plan.strategy.label()
                    ));
                }
            }

            result.race_times_s.push(run.summary.total_time_s);
            result.pit_stops.push(run.summary.pit_stops);
            result.caution_laps.push(run.summary.caution_laps);
            if let Some(fastest) = run.summary.fastest_lap_s() {
                result.fastest_laps_s.push(fastest);
            }
            result.fingerprints.push(format!("{:016x}", run.fingerprint));
            result.runs.push(run);
        }

        result.average_duration = if result.performance_data.is_empty() {
            Duration::ZERO
        } else {
            result.performance_data.iter().sum::<Duration>()
                / u32::try_from(result.performance_data.len()).unwrap_or(1)
        };
        result.passed = result.failures.is_empty();
        result
    }
}

/// Replays the race and reports a mismatch against the first run.
fn determinism_problem(plan: &SimulationPlan, run: &RaceRun) -> Option<String> {
    match run_race(plan, run.seed) {
        Ok(replay)
            if replay.fingerprint == run.fingerprint
                && replay.summary.total_time_s.to_bits() == run.summary.total_time_s.to_bits() =>
        {
            None
        }
        Ok(replay) => Some(format!(
            "replay diverged: fingerprint {:016x} vs {:016x}",
            replay.fingerprint, run.fingerprint
        )),
        Err(err) => Some(format!("replay failed: {err}")),
    }
}

mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_millis().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u128::deserialize(deserializer)?;
        Ok(Duration::from_millis(u64::try_from(millis).unwrap_or(0)))
    }
}

mod duration_vec_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(durations: &[Duration], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let millis: Vec<u128> = durations.iter().map(Duration::as_millis).collect();
        millis.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis_vec = Vec::<u128>::deserialize(deserializer)?;
        Ok(millis_vec
            .into_iter()
            .map(|m| Duration::from_millis(u64::try_from(m).unwrap_or(0)))
            .collect())
    }
}
