//! Lap-by-lap race strategy simulator.
//!
//! Each [`RaceStrategySimulator::step`] advances exactly one lap: the action is
//! applied (pit or pace), the lap's caution state is sampled, the lap time is
//! computed from the tire model plus field noise, and tire wear and energy
//! reserve are updated. The episode terminates once the configured race
//! distance is reached.
use log::{debug, trace};
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};

use crate::action::Action;
use crate::caution::CautionState;
use crate::config::RaceConfig;
use crate::error::{ConfigError, SimError};
use crate::numbers::{clamp_f64_to_f32, unit_interval};
use crate::observation::{Observation, ResetInfo, StepInfo, StepResult};
use crate::rng::RaceRng;
use crate::tire::TireCompound;

/// Upper bound for accumulated wear; observations clamp separately to 1.0.
pub const WEAR_CEILING: f64 = 1.2;
pub const DEFAULT_START_ERS: f64 = 0.7;

/// Mutable race state, reinitialized by `reset` and mutated only by `step`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RaceState {
    pub lap: u32,
    pub stint_laps: u32,
    pub compound: TireCompound,
    /// Accumulated wear in `[0, WEAR_CEILING]`.
    pub tire_wear: f64,
    pub ers: f64,
    pub caution: CautionState,
    pub total_time_s: f64,
    #[serde(default)]
    pub last_lap_time_s: Option<f64>,
}

impl RaceState {
    fn starting(options: ResetOptions) -> Self {
        Self {
            lap: 0,
            stint_laps: 0,
            compound: options.start_compound,
            tire_wear: 0.0,
            ers: unit_interval(options.start_ers),
            caution: CautionState::None,
            total_time_s: 0.0,
            last_lap_time_s: None,
        }
    }
}

impl Default for RaceState {
    fn default() -> Self {
        Self::starting(ResetOptions::default())
    }
}

/// Optional overrides applied by [`RaceStrategySimulator::reset_with`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResetOptions {
    #[serde(default)]
    pub start_compound: TireCompound,
    #[serde(default = "ResetOptions::default_start_ers")]
    pub start_ers: f64,
}

impl ResetOptions {
    const fn default_start_ers() -> f64 {
        DEFAULT_START_ERS
    }
}

impl Default for ResetOptions {
    fn default() -> Self {
        Self {
            start_compound: TireCompound::Medium,
            start_ers: Self::default_start_ers(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderMode {
    #[default]
    None,
    /// Single-line text summary.
    Ansi,
}

#[derive(Debug, Clone)]
pub struct RaceStrategySimulator {
    config: RaceConfig,
    noise: Normal<f64>,
    rng: RaceRng,
    state: RaceState,
    render_mode: RenderMode,
    last_render: Option<String>,
}

impl RaceStrategySimulator {
    /// Build a simulator without rendering.
    ///
    /// # Errors
    ///
    /// Returns `SimError::InvalidConfiguration` when the config fails validation.
    pub fn new(config: RaceConfig) -> Result<Self, SimError> {
        Self::with_render_mode(config, RenderMode::None)
    }

    /// Build a simulator with the given render mode.
    ///
    /// # Errors
    ///
    /// Returns `SimError::InvalidConfiguration` when the config fails validation.
    pub fn with_render_mode(config: RaceConfig, render_mode: RenderMode) -> Result<Self, SimError> {
        config.validate()?;
        let noise = Normal::new(0.0, config.field_variability_s).map_err(|_| {
            ConfigError::InvalidVariability {
                value: config.field_variability_s,
            }
        })?;
        let rng = config
            .seed
            .map_or_else(RaceRng::from_entropy, RaceRng::from_user_seed);
        Ok(Self {
            config,
            noise,
            rng,
            state: RaceState::default(),
            render_mode,
            last_render: None,
        })
    }

    #[must_use]
    pub const fn config(&self) -> &RaceConfig {
        &self.config
    }

    #[must_use]
    pub const fn state(&self) -> &RaceState {
        &self.state
    }

    /// Seed the random stream was last derived from.
    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.rng.seed()
    }

    /// Raw draws taken from the random stream since it was last seeded.
    #[must_use]
    pub const fn rng_draws(&self) -> u64 {
        self.rng.draws()
    }

    #[must_use]
    pub const fn render_mode(&self) -> RenderMode {
        self.render_mode
    }

    #[must_use]
    pub const fn is_terminated(&self) -> bool {
        self.state.lap >= self.config.total_laps
    }

    /// Reinitialize the race, optionally reseeding the random stream.
    pub fn reset(&mut self, seed: Option<u64>) -> (Observation, ResetInfo) {
        self.reset_with(seed, ResetOptions::default())
    }

    /// Reinitialize the race with explicit starting overrides.
    pub fn reset_with(
        &mut self,
        seed: Option<u64>,
        options: ResetOptions,
    ) -> (Observation, ResetInfo) {
        if let Some(seed) = seed {
            self.rng = RaceRng::from_user_seed(seed);
        }
        self.state = RaceState::starting(options);
        debug!(
            "race reset: seed {} laps {} compound {}",
            self.rng.seed(),
            self.config.total_laps,
            self.state.compound
        );
        self.refresh_render();
        (
            self.observation(),
            ResetInfo {
                total_time_s: self.state.total_time_s,
            },
        )
    }

    /// Validate a raw action index and advance one lap.
    ///
    /// # Errors
    ///
    /// Returns `SimError::InvalidAction` without touching race state when the
    /// index is outside `0..=5`.
    pub fn step_index(&mut self, action: i64) -> Result<StepResult, SimError> {
        let action = Action::from_index(action)?;
        Ok(self.step(action))
    }

    /// Advance the race by exactly one lap.
    pub fn step(&mut self, action: Action) -> StepResult {
        let pitted = if let Some(compound) = action.pit_compound() {
            self.state.compound = compound;
            self.state.stint_laps = 0;
            self.state.tire_wear = 0.0;
            true
        } else {
            false
        };

        self.state.caution = CautionState::sample(
            &mut self.rng,
            self.config.full_caution_prob,
            self.config.partial_caution_prob,
        );

        let pace = action.pace();
        let lap_time_s = self.compute_lap_time(pace.lap_time_delta_s(), pitted);

        let model = self.state.compound.model();
        let wear_increase = (model.wear_per_lap + pace.wear_delta()).max(0.0);
        self.state.tire_wear = (self.state.tire_wear + wear_increase).clamp(0.0, WEAR_CEILING);

        let ers_delta = pace.ers_delta() + self.state.caution.ers_regen();
        self.state.ers = (self.state.ers + ers_delta).clamp(0.0, 1.0);

        self.state.lap = self
            .state
            .lap
            .saturating_add(1)
            .min(self.config.total_laps);
        if !pitted {
            self.state.stint_laps = self.state.stint_laps.saturating_add(1);
        }
        self.state.total_time_s += lap_time_s;
        self.state.last_lap_time_s = Some(lap_time_s);

        let terminated = self.is_terminated();
        trace!(
            "lap {}/{} {:?} caution {} lap_time {:.3}s wear {:.3} ers {:.2}",
            self.state.lap,
            self.config.total_laps,
            action,
            self.state.caution,
            lap_time_s,
            self.state.tire_wear,
            self.state.ers
        );
        if pitted {
            debug!(
                "pit stop on lap {}: fitted {} under caution {}",
                self.state.lap, self.state.compound, self.state.caution
            );
        }
        if terminated {
            debug!(
                "race complete after {} laps: {:.3}s",
                self.state.lap, self.state.total_time_s
            );
        }

        self.refresh_render();
        StepResult {
            observation: self.observation(),
            reward: -lap_time_s,
            terminated,
            truncated: false,
            info: StepInfo {
                lap_time_s,
                total_time_s: self.state.total_time_s,
                pitted,
                tire: self.state.compound,
                caution: self.state.caution,
            },
        }
    }

    fn compute_lap_time(&mut self, pace_delta_s: f64, pitted: bool) -> f64 {
        let compound = self.state.compound;
        let caution = self.state.caution;
        let mut lap_time = self.config.base_lap_time_s + compound.model().performance_offset_s;
        lap_time += compound.wear_penalty(self.state.tire_wear);
        lap_time += pace_delta_s;
        lap_time += self.noise.sample(&mut self.rng);
        lap_time += caution.lap_time_penalty_s();
        if pitted {
            lap_time += self.config.pit_loss_s(caution.is_active());
        }
        lap_time
    }

    /// Current observation with wear clamped for reporting.
    #[must_use]
    pub fn observation(&self) -> Observation {
        Observation {
            lap: self.state.lap,
            stint_laps: self.state.stint_laps,
            compound: self.state.compound,
            tire_wear: clamp_f64_to_f32(unit_interval(self.state.tire_wear)),
            ers: clamp_f64_to_f32(unit_interval(self.state.ers)),
            caution: self.state.caution,
        }
    }

    /// Human-readable summary of the latest lap, when rendering is enabled.
    #[must_use]
    pub fn render(&self) -> Option<String> {
        match self.render_mode {
            RenderMode::Ansi => Some(self.last_render.clone().unwrap_or_default()),
            RenderMode::None => None,
        }
    }

    /// Nothing to release; kept for environment parity.
    pub const fn close(&mut self) {}

    fn refresh_render(&mut self) {
        if matches!(self.render_mode, RenderMode::None) {
            return;
        }
        self.last_render = Some(self.format_render());
    }

    fn format_render(&self) -> String {
        let state = &self.state;
        format!(
            "Lap {}/{} | Stint {} | Tire {} wear {:.2} | ERS {:.2} | SC {} | total {:.2}s | lap {:.2}s",
            state.lap,
            self.config.total_laps,
            state.stint_laps,
            state.compound,
            state.tire_wear,
            state.ers,
            state.caution.id(),
            state.total_time_s,
            state.last_lap_time_s.unwrap_or(0.0)
        )
    }
}
