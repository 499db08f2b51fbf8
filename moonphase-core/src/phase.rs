//! Lunar phase arithmetic and the phase → multiplier table.
//!
//! The phase index is an approximate lunar age in days: 0 and 29 sit on the
//! new moon, 15 is the full moon peak. The approximation is accurate to about
//! a day for 1900-2099 and stays total (no panics) for any other year chrono
//! can represent.
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::numbers::{i32_to_f64, trunc_f64_to_i32};

/// Number of steps in the approximate lunar cycle.
pub const CYCLE_LENGTH: u8 = 30;

const CORRECTION_BEFORE_2000: f64 = 4.0;
const CORRECTION_FROM_2000: f64 = 8.3;

/// Compute the lunar age (0..=29) for a calendar date.
#[must_use]
pub fn compute_phase_index(date: NaiveDate) -> u8 {
    let year = date.year();
    let month = i32::try_from(date.month()).unwrap_or(1);
    let day = i32::try_from(date.day()).unwrap_or(1);

    let mut r = year % 100;
    r %= 19;
    if r > 9 {
        r -= 19;
    }
    r = ((r * 11) % 30) + month + day;
    if month < 3 {
        r += 2;
    }

    // The post-2000 correction is fractional, so the subtraction happens in f64.
    let correction = if year < 2000 {
        CORRECTION_BEFORE_2000
    } else {
        CORRECTION_FROM_2000
    };
    let adjusted = i32_to_f64(r) - correction;
    let cycled = trunc_f64_to_i32((adjusted + 0.5).floor() % f64::from(CYCLE_LENGTH));
    let index = if cycled < 0 {
        cycled + i32::from(CYCLE_LENGTH)
    } else {
        cycled
    };
    u8::try_from(index).unwrap_or(0)
}

/// Gameplay multipliers attached to one phase bucket.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PhaseMultipliers {
    pub harvest: f64,
    pub npc_damage: f64,
    pub npc_damage_taken: f64,
}

const NEW_MULTIPLIERS: PhaseMultipliers = PhaseMultipliers {
    harvest: 1.0,
    npc_damage: 1.0,
    npc_damage_taken: 1.0,
};
const CRESCENT_MULTIPLIERS: PhaseMultipliers = PhaseMultipliers {
    harvest: 1.5,
    npc_damage: 1.2,
    npc_damage_taken: 0.9,
};
const QUARTER_MULTIPLIERS: PhaseMultipliers = PhaseMultipliers {
    harvest: 3.0,
    npc_damage: 1.4,
    npc_damage_taken: 0.8,
};
const GIBBOUS_MULTIPLIERS: PhaseMultipliers = PhaseMultipliers {
    harvest: 4.5,
    npc_damage: 1.5,
    npc_damage_taken: 0.7,
};
const FULL_MULTIPLIERS: PhaseMultipliers = PhaseMultipliers {
    harvest: 6.0,
    npc_damage: 2.0,
    npc_damage_taken: 0.5,
};

/// Named lunar phase, one per bucket of the 30-step cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MoonPhase {
    New,
    WaxingCrescent,
    FirstQuarter,
    WaxingGibbous,
    Full,
    WaningGibbous,
    LastQuarter,
    WaningCrescent,
}

impl MoonPhase {
    /// Every phase in cycle order, starting at the new moon.
    pub const ALL: [Self; 8] = [
        Self::New,
        Self::WaxingCrescent,
        Self::FirstQuarter,
        Self::WaxingGibbous,
        Self::Full,
        Self::WaningGibbous,
        Self::LastQuarter,
        Self::WaningCrescent,
    ];

    /// Classify a phase index. Both ends of the cycle (0 and 29) are the new
    /// moon and the full moon spans 15 and 16. Indices past the cycle wrap.
    #[must_use]
    pub const fn from_index(index: u8) -> Self {
        match index % CYCLE_LENGTH {
            1..=5 => Self::WaxingCrescent,
            6..=9 => Self::FirstQuarter,
            10..=14 => Self::WaxingGibbous,
            15..=16 => Self::Full,
            17..=20 => Self::WaningGibbous,
            21..=23 => Self::LastQuarter,
            24..=28 => Self::WaningCrescent,
            _ => Self::New,
        }
    }

    /// Display label used in messages and settings files.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::New => "New Moon",
            Self::WaxingCrescent => "Waxing Crescent Moon",
            Self::FirstQuarter => "First Quarter Moon",
            Self::WaxingGibbous => "Waxing Gibbous Moon",
            Self::Full => "Full Moon",
            Self::WaningGibbous => "Waning Gibbous Moon",
            Self::LastQuarter => "Last Quarter Moon",
            Self::WaningCrescent => "Waning Crescent Moon",
        }
    }

    #[must_use]
    pub const fn multipliers(self) -> PhaseMultipliers {
        match self {
            Self::New => NEW_MULTIPLIERS,
            Self::WaxingCrescent | Self::WaningCrescent => CRESCENT_MULTIPLIERS,
            Self::FirstQuarter | Self::LastQuarter => QUARTER_MULTIPLIERS,
            Self::WaxingGibbous | Self::WaningGibbous => GIBBOUS_MULTIPLIERS,
            Self::Full => FULL_MULTIPLIERS,
        }
    }

    /// Flavour text describing NPC strength during this phase.
    #[must_use]
    pub const fn npc_description(self) -> &'static str {
        match self {
            Self::New => "NPC's are weakest during the New Moon.",
            Self::WaxingCrescent | Self::WaningCrescent => {
                "NPC's are weaker during the Crescent Moon."
            }
            Self::FirstQuarter | Self::LastQuarter => {
                "NPC's are gaining strength during this moon phase."
            }
            Self::WaxingGibbous | Self::WaningGibbous => {
                "Beware, NPC's grow even stronger during the Gibbous Moon."
            }
            Self::Full => "NPC's are at their peak power during the Full Moon!",
        }
    }

    /// True between the new moon and the full moon.
    #[must_use]
    pub const fn is_waxing(self) -> bool {
        matches!(
            self,
            Self::WaxingCrescent | Self::FirstQuarter | Self::WaxingGibbous
        )
    }
}

impl std::fmt::Display for MoonPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
