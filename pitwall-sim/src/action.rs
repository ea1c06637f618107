//! Discrete decision set accepted by the simulator each lap
use serde::{Deserialize, Serialize};

use crate::error::SimError;
use crate::tire::TireCompound;

/// Driving pace selected for a lap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Pace {
    #[default]
    Normal,
    Push,
    Conserve,
}

impl Pace {
    /// Seconds added to the lap time.
    #[must_use]
    pub const fn lap_time_delta_s(self) -> f64 {
        match self {
            Self::Normal => 0.0,
            Self::Push => -0.40,
            Self::Conserve => 0.30,
        }
    }

    /// Wear added on top of the compound's normal per-lap rate.
    #[must_use]
    pub const fn wear_delta(self) -> f64 {
        match self {
            Self::Normal => 0.0,
            Self::Push => 0.010,
            Self::Conserve => -0.008,
        }
    }

    /// Energy-reserve change before any caution regeneration.
    #[must_use]
    pub const fn ers_delta(self) -> f64 {
        match self {
            Self::Normal => -0.02,
            Self::Push => -0.12,
            Self::Conserve => 0.08,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    StayNormal,
    StayPush,
    StayConserve,
    PitSoft,
    PitMedium,
    PitHard,
}

impl Action {
    pub const COUNT: usize = 6;

    pub const ALL: [Self; Self::COUNT] = [
        Self::StayNormal,
        Self::StayPush,
        Self::StayConserve,
        Self::PitSoft,
        Self::PitMedium,
        Self::PitHard,
    ];

    /// Decode a raw action index.
    ///
    /// # Errors
    ///
    /// Returns `SimError::InvalidAction` for anything outside `0..=5`.
    pub fn from_index(value: i64) -> Result<Self, SimError> {
        usize::try_from(value)
            .ok()
            .and_then(|idx| Self::ALL.get(idx).copied())
            .ok_or(SimError::InvalidAction(value))
    }

    #[must_use]
    pub const fn index(self) -> u8 {
        match self {
            Self::StayNormal => 0,
            Self::StayPush => 1,
            Self::StayConserve => 2,
            Self::PitSoft => 3,
            Self::PitMedium => 4,
            Self::PitHard => 5,
        }
    }

    /// Pace used for the lap; pit laps always run at normal pace.
    #[must_use]
    pub const fn pace(self) -> Pace {
        match self {
            Self::StayPush => Pace::Push,
            Self::StayConserve => Pace::Conserve,
            Self::StayNormal | Self::PitSoft | Self::PitMedium | Self::PitHard => Pace::Normal,
        }
    }

    /// Compound fitted when this action pits.
    #[must_use]
    pub const fn pit_compound(self) -> Option<TireCompound> {
        match self {
            Self::PitSoft => Some(TireCompound::Soft),
            Self::PitMedium => Some(TireCompound::Medium),
            Self::PitHard => Some(TireCompound::Hard),
            Self::StayNormal | Self::StayPush | Self::StayConserve => None,
        }
    }

    #[must_use]
    pub const fn is_pit(self) -> bool {
        self.pit_compound().is_some()
    }

    /// Pit action fitting the given compound.
    #[must_use]
    pub const fn pit_for(compound: TireCompound) -> Self {
        match compound {
            TireCompound::Soft => Self::PitSoft,
            TireCompound::Medium => Self::PitMedium,
            TireCompound::Hard => Self::PitHard,
        }
    }
}

impl TryFrom<i64> for Action {
    type Error = SimError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::from_index(value)
    }
}

impl From<Action> for i64 {
    fn from(action: Action) -> Self {
        Self::from(action.index())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indices_roundtrip() {
        for action in Action::ALL {
            assert_eq!(Action::from_index(i64::from(action)).unwrap(), action);
        }
    }

    #[test]
    fn out_of_range_indices_are_rejected() {
        assert_eq!(Action::from_index(6), Err(SimError::InvalidAction(6)));
        assert_eq!(Action::from_index(-1), Err(SimError::InvalidAction(-1)));
        assert!(Action::try_from(i64::MAX).is_err());
    }

    #[test]
    fn pit_actions_run_at_normal_pace() {
        for compound in TireCompound::ALL {
            let action = Action::pit_for(compound);
            assert!(action.is_pit());
            assert_eq!(action.pit_compound(), Some(compound));
            assert_eq!(action.pace(), Pace::Normal);
        }
        assert_eq!(Action::StayPush.pace(), Pace::Push);
        assert_eq!(Action::StayConserve.pace(), Pace::Conserve);
        assert!(!Action::StayNormal.is_pit());
    }

    #[test]
    fn pace_deltas_match_model() {
        assert!((Pace::Push.lap_time_delta_s() + 0.40).abs() < 1e-12);
        assert!((Pace::Conserve.wear_delta() + 0.008).abs() < 1e-12);
        assert!((Pace::Normal.ers_delta() + 0.02).abs() < 1e-12);
    }
}
