use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::common::usize_to_f64;
use crate::logic::policy::PitStrategy;
use crate::logic::tester::ScenarioResult;

/// Race statistics for one strategy across every seed and iteration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyAggregate {
    pub strategy: PitStrategy,
    pub races: usize,
    pub failed_races: usize,
    pub mean_race_time_s: f64,
    pub std_race_time_s: f64,
    pub min_race_time_s: f64,
    pub max_race_time_s: f64,
    pub mean_pit_stops: f64,
    pub mean_caution_laps: f64,
    pub best_lap_s: Option<f64>,
}

pub fn aggregate_results(results: &[ScenarioResult]) -> Vec<StrategyAggregate> {
    let mut builders: BTreeMap<String, AggregateBuilder> = BTreeMap::new();
    for result in results {
        builders
            .entry(result.strategy.key().to_string())
            .or_insert_with(|| AggregateBuilder::new(result.strategy))
            .ingest(result);
    }

    let mut aggregates: Vec<StrategyAggregate> = builders
        .into_values()
        .map(AggregateBuilder::finish)
        .collect();
    aggregates.sort_by(|a, b| a.mean_race_time_s.total_cmp(&b.mean_race_time_s));
    aggregates
}

struct AggregateBuilder {
    strategy: PitStrategy,
    failed_races: usize,
    race_time: RunningStats,
    min_race_time_s: f64,
    max_race_time_s: f64,
    pit_stops: RunningStats,
    caution_laps: RunningStats,
    best_lap_s: Option<f64>,
}

impl AggregateBuilder {
    const fn new(strategy: PitStrategy) -> Self {
        Self {
            strategy,
            failed_races: 0,
            race_time: RunningStats::new(),
            min_race_time_s: f64::INFINITY,
            max_race_time_s: f64::NEG_INFINITY,
            pit_stops: RunningStats::new(),
            caution_laps: RunningStats::new(),
            best_lap_s: None,
        }
    }

    fn ingest(&mut self, result: &ScenarioResult) {
        self.failed_races += result
            .iterations_run
            .saturating_sub(result.successful_iterations);
        for &time in &result.race_times_s {
            self.race_time.add(time);
            self.min_race_time_s = self.min_race_time_s.min(time);
            self.max_race_time_s = self.max_race_time_s.max(time);
        }
        for &stops in &result.pit_stops {
            self.pit_stops.add(f64::from(stops));
        }
        for &laps in &result.caution_laps {
            self.caution_laps.add(f64::from(laps));
        }
        for &lap in &result.fastest_laps_s {
            self.best_lap_s = Some(self.best_lap_s.map_or(lap, |best| best.min(lap)));
        }
    }

    fn finish(self) -> StrategyAggregate {
        let races = self.race_time.count;
        let (min_race_time_s, max_race_time_s) = if races == 0 {
            (0.0, 0.0)
        } else {
            (self.min_race_time_s, self.max_race_time_s)
        };
        StrategyAggregate {
            strategy: self.strategy,
            races,
            failed_races: self.failed_races,
            mean_race_time_s: self.race_time.mean(),
            std_race_time_s: self.race_time.std_dev(),
            min_race_time_s,
            max_race_time_s,
            mean_pit_stops: self.pit_stops.mean(),
            mean_caution_laps: self.caution_laps.mean(),
            best_lap_s: self.best_lap_s,
        }
    }
}

/// Welford accumulator.
#[derive(Debug, Default, Clone)]
struct RunningStats {
    count: usize,
    mean: f64,
    m2: f64,
}

impl RunningStats {
    const fn new() -> Self {
        Self {
            count: 0,
            mean: 0.0,
            m2: 0.0,
        }
    }

    fn add(&mut self, value: f64) {
        self.count += 1;
        let count = usize_to_f64(self.count);
        let delta = value - self.mean;
        self.mean += delta / count;
        let delta2 = value - self.mean;
        self.m2 += delta * delta2;
    }

    const fn mean(&self) -> f64 {
        if self.count == 0 { 0.0 } else { self.mean }
    }

    fn variance(&self) -> f64 {
        if self.count > 1 {
            self.m2 / usize_to_f64(self.count - 1)
        } else {
            0.0
        }
    }

    fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }
}
