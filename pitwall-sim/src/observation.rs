//! Fixed-shape records returned by `reset` and `step`.
use serde::{Deserialize, Serialize};

use crate::caution::CautionState;
use crate::numbers::u32_to_f32;
use crate::tire::TireCompound;

/// Length of the numeric feature vector exposed to learning agents.
pub const FEATURE_COUNT: usize = 6;

/// What the decision maker sees before choosing the next action.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub lap: u32,
    pub stint_laps: u32,
    pub compound: TireCompound,
    /// Tire wear clamped to `[0, 1]`.
    pub tire_wear: f32,
    pub ers: f32,
    pub caution: CautionState,
}

impl Observation {
    /// Flatten into `[lap, stint_laps, compound, wear, ers, caution]`.
    #[must_use]
    pub fn features(&self) -> [f32; FEATURE_COUNT] {
        [
            u32_to_f32(self.lap),
            u32_to_f32(self.stint_laps),
            f32::from(self.compound.id()),
            self.tire_wear,
            self.ers,
            f32::from(self.caution.id()),
        ]
    }
}

/// Info record returned alongside the initial observation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResetInfo {
    pub total_time_s: f64,
}

/// Per-lap diagnostics returned by `step`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StepInfo {
    pub lap_time_s: f64,
    pub total_time_s: f64,
    pub pitted: bool,
    /// Mounted compound; serializes as its name.
    pub tire: TireCompound,
    pub caution: CautionState,
}

impl StepInfo {
    #[must_use]
    pub const fn tire_name(&self) -> &'static str {
        self.tire.name()
    }
}

/// Full outcome of one `step` call.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StepResult {
    pub observation: Observation,
    pub reward: f64,
    pub terminated: bool,
    /// Always false; the race has no truncation condition.
    pub truncated: bool,
    pub info: StepInfo,
}

impl StepResult {
    #[must_use]
    pub const fn is_done(&self) -> bool {
        self.terminated || self.truncated
    }
}
