//! Moon Phase Settings Engine
//!
//! Platform-agnostic core for deriving gameplay multipliers from the real
//! world lunar phase and merging them into `key=value` settings text.
//! This crate performs no I/O; reading and writing settings files belongs to
//! the caller.

pub mod harvest;
pub mod numbers;
pub mod phase;
pub mod settings;

// Re-export commonly used types
pub use harvest::{
    HARVEST_AMOUNT_KEY, HARVEST_KEYS, Harvest, MESSAGE_OF_THE_DAY_KEY, NPC_DAMAGE_KEY,
    NPC_DAMAGE_TAKEN_KEY,
};
pub use phase::{CYCLE_LENGTH, MoonPhase, PhaseMultipliers, compute_phase_index};
pub use settings::{
    LINE_ENDING, SettingAssignment, SettingKey, SettingsError, Upsert, UpsertAction, apply,
    apply_all, lookup, upsert,
};

/// Merge the four settings of `harvest` into `content`, in key order.
///
/// Returns the merged text and the action taken for each key.
///
/// # Errors
///
/// Returns an error if a settings key pattern cannot be built.
pub fn merge_harvest(
    content: &str,
    harvest: &Harvest,
) -> Result<(String, Vec<UpsertAction>), SettingsError> {
    let assignments = harvest.assignments()?;
    Ok(apply_all(content, &assignments))
}
