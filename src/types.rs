//! Shared primitive IDs and award enums.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// Unique winner identifier, derived from the creation time.
pub type WinnerId = u64;

/// Award category a draw is run under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AwardTier {
    /// Top tier; the only tier honoring a special override.
    #[serde(rename = "特等奖")]
    Special,
    /// First prize.
    #[serde(rename = "一等奖")]
    First,
    /// Second prize.
    #[serde(rename = "二等奖")]
    Second,
    /// Third prize.
    #[serde(rename = "三等奖")]
    Third,
}

impl AwardTier {
    /// All tiers, highest first.
    pub const ALL: [AwardTier; 4] = [Self::Special, Self::First, Self::Second, Self::Third];

    /// Display label, also used as the serialized form.
    pub fn label(self) -> &'static str {
        match self {
            Self::Special => "特等奖",
            Self::First => "一等奖",
            Self::Second => "二等奖",
            Self::Third => "三等奖",
        }
    }

    /// Display color as a hex string.
    pub fn color(self) -> &'static str {
        match self {
            Self::Special => "#F59E0B",
            Self::First => "#EF4444",
            Self::Second => "#3B82F6",
            Self::Third => "#10B981",
        }
    }
}

impl fmt::Display for AwardTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Returned when a string names no known [`AwardTier`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown award tier: {0}")]
pub struct UnknownAwardTier(pub String);

impl FromStr for AwardTier {
    type Err = UnknownAwardTier;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|tier| tier.label() == s || format!("{tier:?}").eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownAwardTier(s.to_string()))
    }
}

/// Whether draws are tagged with award tiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DrawMode {
    /// No award tiers; any non-empty roster may be drawn from.
    #[default]
    Plain,
    /// An award must be selected before a draw may start.
    Tiered,
}

/// Observable draw session phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Nothing selected, not spinning.
    Idle,
    /// An award is selected (tiered mode), not spinning.
    AwardSelected,
    /// The display timer is running.
    Spinning,
}
