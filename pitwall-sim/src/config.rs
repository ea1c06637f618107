//! Race configuration, fixed for the lifetime of a simulator
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Construction-time race parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RaceConfig {
    #[serde(default = "RaceConfig::default_total_laps")]
    pub total_laps: u32,
    #[serde(default = "RaceConfig::default_base_lap_time_s")]
    pub base_lap_time_s: f64,
    /// Standard deviation of the per-lap field noise.
    #[serde(default = "RaceConfig::default_field_variability_s")]
    pub field_variability_s: f64,
    #[serde(default = "RaceConfig::default_full_caution_prob")]
    pub full_caution_prob: f64,
    #[serde(default = "RaceConfig::default_partial_caution_prob")]
    pub partial_caution_prob: f64,
    #[serde(default = "RaceConfig::default_pit_loss_green_s")]
    pub pit_loss_green_s: f64,
    #[serde(default = "RaceConfig::default_pit_loss_caution_s")]
    pub pit_loss_caution_s: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl RaceConfig {
    #[must_use]
    pub const fn default_total_laps() -> u32 {
        50
    }

    #[must_use]
    pub const fn default_base_lap_time_s() -> f64 {
        90.0
    }

    #[must_use]
    pub const fn default_field_variability_s() -> f64 {
        0.6
    }

    #[must_use]
    pub const fn default_full_caution_prob() -> f64 {
        0.03
    }

    #[must_use]
    pub const fn default_partial_caution_prob() -> f64 {
        0.02
    }

    #[must_use]
    pub const fn default_pit_loss_green_s() -> f64 {
        20.0
    }

    #[must_use]
    pub const fn default_pit_loss_caution_s() -> f64 {
        12.0
    }

    /// Parse a configuration document, filling omitted fields with defaults.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Parse` for malformed JSON,
    /// `ConfigError::NonPositiveLaps` for a lap count below one, or the
    /// validation error for other out-of-bounds values.
    pub fn from_json(json_str: &str) -> Result<Self, ConfigError> {
        let value: serde_json::Value =
            serde_json::from_str(json_str).map_err(|e| ConfigError::Parse(e.to_string()))?;
        // Negative lap counts cannot reach the u32 field; report them as non-positive.
        if let Some(laps) = value.get("total_laps").and_then(serde_json::Value::as_i64)
            && laps < 1
        {
            return Err(ConfigError::NonPositiveLaps { value: laps });
        }
        let config: Self =
            serde_json::from_value(value).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration invariants.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` when the lap count is zero or the field
    /// variability cannot parameterize a normal distribution.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.total_laps == 0 {
            return Err(ConfigError::NonPositiveLaps {
                value: i64::from(self.total_laps),
            });
        }
        if !self.field_variability_s.is_finite() || self.field_variability_s < 0.0 {
            return Err(ConfigError::InvalidVariability {
                value: self.field_variability_s,
            });
        }
        Ok(())
    }

    /// Pit-lane loss for a stop made under the given caution state.
    #[must_use]
    pub fn pit_loss_s(&self, caution_active: bool) -> f64 {
        if caution_active {
            self.pit_loss_caution_s
        } else {
            self.pit_loss_green_s
        }
    }

    #[must_use]
    pub const fn with_total_laps(mut self, total_laps: u32) -> Self {
        self.total_laps = total_laps;
        self
    }

    #[must_use]
    pub const fn with_base_lap_time(mut self, seconds: f64) -> Self {
        self.base_lap_time_s = seconds;
        self
    }

    #[must_use]
    pub const fn with_field_variability(mut self, std_dev_s: f64) -> Self {
        self.field_variability_s = std_dev_s;
        self
    }

    #[must_use]
    pub const fn with_caution_probs(mut self, full: f64, partial: f64) -> Self {
        self.full_caution_prob = full;
        self.partial_caution_prob = partial;
        self
    }

    #[must_use]
    pub const fn with_pit_losses(mut self, green_s: f64, caution_s: f64) -> Self {
        self.pit_loss_green_s = green_s;
        self.pit_loss_caution_s = caution_s;
        self
    }

    #[must_use]
    pub const fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

impl Default for RaceConfig {
    fn default() -> Self {
        Self {
            total_laps: Self::default_total_laps(),
            base_lap_time_s: Self::default_base_lap_time_s(),
            field_variability_s: Self::default_field_variability_s(),
            full_caution_prob: Self::default_full_caution_prob(),
            partial_caution_prob: Self::default_partial_caution_prob(),
            pit_loss_green_s: Self::default_pit_loss_green_s(),
            pit_loss_caution_s: Self::default_pit_loss_caution_s(),
            seed: None,
        }
    }
}
