//! Race-wide caution periods, resampled every lap
use rand::Rng;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CautionState {
    #[default]
    None,
    /// Moderate slowdown (virtual safety car).
    Partial,
    /// Severe slowdown (full safety car).
    Full,
}

impl CautionState {
    /// Stable numeric identifier used in observations.
    #[must_use]
    pub const fn id(self) -> u8 {
        match self {
            Self::None => 0,
            Self::Partial => 1,
            Self::Full => 2,
        }
    }

    #[must_use]
    pub const fn from_id(id: u8) -> Option<Self> {
        match id {
            0 => Some(Self::None),
            1 => Some(Self::Partial),
            2 => Some(Self::Full),
            _ => None,
        }
    }

    #[must_use]
    pub const fn is_active(self) -> bool {
        !matches!(self, Self::None)
    }

    /// Seconds added to the lap under this caution.
    #[must_use]
    pub const fn lap_time_penalty_s(self) -> f64 {
        match self {
            Self::None => 0.0,
            Self::Partial => 6.0,
            Self::Full => 13.0,
        }
    }

    /// Extra energy harvested on a lap run under this caution.
    #[must_use]
    pub const fn ers_regen(self) -> f64 {
        match self {
            Self::None => 0.0,
            Self::Partial => 0.04,
            Self::Full => 0.08,
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Partial => "partial",
            Self::Full => "full",
        }
    }

    /// Sample the caution state for one lap.
    ///
    /// The full-caution check runs first; the partial check only draws when
    /// it misses. The two probabilities are not normalized against each other.
    pub fn sample<R: Rng + ?Sized>(rng: &mut R, full_prob: f64, partial_prob: f64) -> Self {
        if rng.r#gen::<f64>() < full_prob {
            return Self::Full;
        }
        if rng.r#gen::<f64>() < partial_prob {
            return Self::Partial;
        }
        Self::None
    }
}

impl std::fmt::Display for CautionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}
