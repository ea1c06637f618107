//! Tire compounds and their fixed performance tables
use serde::{Deserialize, Serialize};

/// Fixed per-compound constants.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TireModel {
    /// Baseline lap-time offset in seconds (negative is faster).
    pub performance_offset_s: f64,
    /// Wear accumulated per lap at normal pace.
    pub wear_per_lap: f64,
    /// Seconds added when wear is saturated.
    pub wear_penalty_s: f64,
}

const SOFT: TireModel = TireModel {
    performance_offset_s: -1.0,
    wear_per_lap: 0.025,
    wear_penalty_s: 3.0,
};

const MEDIUM: TireModel = TireModel {
    performance_offset_s: -0.4,
    wear_per_lap: 0.018,
    wear_penalty_s: 2.2,
};

const HARD: TireModel = TireModel {
    performance_offset_s: 0.0,
    wear_per_lap: 0.012,
    wear_penalty_s: 1.6,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TireCompound {
    Soft,
    #[default]
    Medium,
    Hard,
}

impl TireCompound {
    pub const ALL: [Self; 3] = [Self::Soft, Self::Medium, Self::Hard];

    /// Stable numeric identifier used in observations.
    #[must_use]
    pub const fn id(self) -> u8 {
        match self {
            Self::Soft => 0,
            Self::Medium => 1,
            Self::Hard => 2,
        }
    }

    #[must_use]
    pub const fn from_id(id: u8) -> Option<Self> {
        match id {
            0 => Some(Self::Soft),
            1 => Some(Self::Medium),
            2 => Some(Self::Hard),
            _ => None,
        }
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Soft => "soft",
            Self::Medium => "medium",
            Self::Hard => "hard",
        }
    }

    #[must_use]
    pub const fn model(self) -> TireModel {
        match self {
            Self::Soft => SOFT,
            Self::Medium => MEDIUM,
            Self::Hard => HARD,
        }
    }

    /// Wear-induced lap-time penalty, linear in wear clamped to `[0, 1]`.
    #[must_use]
    pub fn wear_penalty(self, wear: f64) -> f64 {
        self.model().wear_penalty_s * wear.clamp(0.0, 1.0)
    }
}

impl std::fmt::Display for TireCompound {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
