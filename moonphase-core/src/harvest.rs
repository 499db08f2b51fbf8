//! Per-date harvest record built from the lunar phase.
use chrono::{Days, NaiveDate};
use serde::Serialize;

use crate::phase::{MoonPhase, compute_phase_index};
use crate::settings::{SettingAssignment, SettingsError};

pub const MESSAGE_OF_THE_DAY_KEY: &str = "ServerMessageOfTheDay";
pub const HARVEST_AMOUNT_KEY: &str = "HarvestAmountMultiplier";
pub const NPC_DAMAGE_KEY: &str = "NPCDamageMultiplier";
pub const NPC_DAMAGE_TAKEN_KEY: &str = "NPCDamageTakenMultiplier";

/// Settings keys driven by a harvest, in the order they are merged.
pub const HARVEST_KEYS: [&str; 4] = [
    MESSAGE_OF_THE_DAY_KEY,
    HARVEST_AMOUNT_KEY,
    NPC_DAMAGE_KEY,
    NPC_DAMAGE_TAKEN_KEY,
];

/// Gameplay multipliers and message for one calendar date.
///
/// Everything except `date` is derived from the phase index, so a `Harvest`
/// is only ever built through [`Harvest::for_date`] or
/// [`Harvest::from_phase_index`] and never changes afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Harvest {
    date: NaiveDate,
    phase_index: u8,
    phase: MoonPhase,
    phase_name: &'static str,
    harvest_multiplier: f64,
    npc_damage_multiplier: f64,
    npc_damage_taken_multiplier: f64,
    message_of_the_day: String,
}

impl Harvest {
    #[must_use]
    pub fn for_date(date: NaiveDate) -> Self {
        Self::from_phase_index(date, compute_phase_index(date))
    }

    /// Build the record for an already computed phase index.
    #[must_use]
    pub fn from_phase_index(date: NaiveDate, phase_index: u8) -> Self {
        let phase = MoonPhase::from_index(phase_index);
        let multipliers = phase.multipliers();
        let message_of_the_day = format!(
            "{}: {}x harvest multiplier.  {}",
            phase.name(),
            multipliers.harvest,
            phase.npc_description()
        );
        Self {
            date,
            phase_index,
            phase,
            phase_name: phase.name(),
            harvest_multiplier: multipliers.harvest,
            npc_damage_multiplier: multipliers.npc_damage,
            npc_damage_taken_multiplier: multipliers.npc_damage_taken,
            message_of_the_day,
        }
    }

    /// Records for `start` and each of the following `days` days, built one
    /// at a time as the iterator is consumed.
    ///
    /// Stops early if the calendar runs out before `days` is reached.
    pub fn preview(start: NaiveDate, days: u32) -> impl Iterator<Item = Self> {
        (0..=u64::from(days))
            .map_while(move |offset| start.checked_add_days(Days::new(offset)))
            .map(Self::for_date)
    }

    #[must_use]
    pub const fn date(&self) -> NaiveDate {
        self.date
    }

    #[must_use]
    pub const fn phase_index(&self) -> u8 {
        self.phase_index
    }

    #[must_use]
    pub const fn phase(&self) -> MoonPhase {
        self.phase
    }

    #[must_use]
    pub const fn phase_name(&self) -> &'static str {
        self.phase_name
    }

    #[must_use]
    pub const fn harvest_multiplier(&self) -> f64 {
        self.harvest_multiplier
    }

    #[must_use]
    pub const fn npc_damage_multiplier(&self) -> f64 {
        self.npc_damage_multiplier
    }

    #[must_use]
    pub const fn npc_damage_taken_multiplier(&self) -> f64 {
        self.npc_damage_taken_multiplier
    }

    #[must_use]
    pub fn message_of_the_day(&self) -> &str {
        &self.message_of_the_day
    }

    /// Rendered `(key, value)` pairs in merge order.
    #[must_use]
    pub fn key_values(&self) -> [(&'static str, String); 4] {
        [
            (MESSAGE_OF_THE_DAY_KEY, self.message_of_the_day.clone()),
            (HARVEST_AMOUNT_KEY, self.harvest_multiplier.to_string()),
            (NPC_DAMAGE_KEY, self.npc_damage_multiplier.to_string()),
            (
                NPC_DAMAGE_TAKEN_KEY,
                self.npc_damage_taken_multiplier.to_string(),
            ),
        ]
    }

    /// Settings assignments for [`crate::settings::apply_all`], in merge order.
    ///
    /// # Errors
    ///
    /// Returns an error only if a key pattern fails to compile.
    pub fn assignments(&self) -> Result<Vec<SettingAssignment>, SettingsError> {
        self.key_values()
            .into_iter()
            .map(|(key, value)| SettingAssignment::new(key, value))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn message_uses_plain_number_formatting() {
        let new_moon = Harvest::from_phase_index(date(2020, 1, 23), 0);
        assert_eq!(
            new_moon.message_of_the_day(),
            "New Moon: 1x harvest multiplier.  NPC's are weakest during the New Moon."
        );

        let crescent = Harvest::from_phase_index(date(2020, 1, 26), 3);
        assert_eq!(
            crescent.message_of_the_day(),
            "Waxing Crescent Moon: 1.5x harvest multiplier.  NPC's are weaker during the Crescent Moon."
        );
    }

    #[test]
    fn fields_follow_phase_index() {
        let full = Harvest::from_phase_index(date(2020, 2, 8), 16);
        assert_eq!(full.phase(), MoonPhase::Full);
        assert_eq!(full.phase_name(), "Full Moon");
        assert_eq!(full.phase_index(), 16);
        assert!((full.harvest_multiplier() - 6.0).abs() < f64::EPSILON);
        assert!((full.npc_damage_multiplier() - 2.0).abs() < f64::EPSILON);
        assert!((full.npc_damage_taken_multiplier() - 0.5).abs() < f64::EPSILON);
        assert!(full.message_of_the_day().ends_with("peak power during the Full Moon!"));
    }

    #[test]
    fn key_values_are_in_merge_order() {
        let harvest = Harvest::from_phase_index(date(2020, 2, 14), 22);
        let pairs = harvest.key_values();
        let keys: Vec<&str> = pairs.iter().map(|(k, _)| *k).collect();
        assert_eq!(keys, HARVEST_KEYS);
        assert_eq!(pairs[1].1, "3");
        assert_eq!(pairs[2].1, "1.4");
        assert_eq!(pairs[3].1, "0.8");
    }

    #[test]
    fn assignments_mirror_key_values() {
        let harvest = Harvest::for_date(date(2020, 2, 3));
        let assignments = harvest.assignments().unwrap();
        assert_eq!(assignments.len(), 4);
        assert_eq!(assignments[0].key().as_str(), MESSAGE_OF_THE_DAY_KEY);
        assert_eq!(assignments[1].value(), "4.5");
    }

    #[test]
    fn preview_includes_start_and_last_day() {
        let start = date(2020, 2, 27);
        let days = Harvest::preview(start, 3);
        let dates: Vec<NaiveDate> = days.map(|h| h.date()).collect();
        assert_eq!(
            dates,
            vec![
                date(2020, 2, 27),
                date(2020, 2, 28),
                date(2020, 2, 29),
                date(2020, 3, 1)
            ]
        );
        assert_eq!(Harvest::preview(start, 0).count(), 1);
    }

    #[test]
    fn preview_stops_at_calendar_end() {
        let last = NaiveDate::MAX;
        assert_eq!(Harvest::preview(last, 5).count(), 1);
    }

    #[test]
    fn preview_is_lazy_for_huge_day_counts() {
        let mut days = Harvest::preview(date(2020, 1, 23), u32::MAX);
        let first = days.next().unwrap();
        assert_eq!(first.date(), date(2020, 1, 23));
        assert_eq!(days.take(2).count(), 2);
    }

    #[test]
    fn serializes_phase_name_and_date() {
        let harvest = Harvest::from_phase_index(date(2020, 2, 8), 15);
        let json = serde_json::to_value(&harvest).unwrap();
        assert_eq!(json["date"], "2020-02-08");
        assert_eq!(json["phase_name"], "Full Moon");
        assert_eq!(json["phase"], "Full");
        assert_eq!(json["phase_index"], 15);
    }
}
