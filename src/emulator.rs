//! Side-by-side pet emulator: a primary attribute set, a compared set, and
//! the per-field differences between them.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    input::parse_float,
    pet::{compute_stats, PetAttributes, PetField, PetResult, PetStat},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Primary,
    Compared,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown emulator side '{0}', expected 'primary' or 'compared'")]
pub struct SideParseError(pub String);

impl FromStr for Side {
    type Err = SideParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "primary" => Ok(Side::Primary),
            "compared" => Ok(Side::Compared),
            other => Err(SideParseError(other.to_string())),
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Primary => f.write_str("primary"),
            Side::Compared => f.write_str("compared"),
        }
    }
}

/// An attribute set and the stats derived from it. The result is rebuilt on
/// every write so it can never go stale.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PetSlot {
    attributes: PetAttributes,
    result: PetResult,
    unallocated_points: f64,
}

impl Default for PetSlot {
    fn default() -> Self {
        Self::new(PetAttributes::default())
    }
}

impl PetSlot {
    pub fn new(attributes: PetAttributes) -> Self {
        Self {
            attributes,
            result: compute_stats(&attributes),
            unallocated_points: attributes.unallocated_points(),
        }
    }

    pub fn set(&mut self, field: PetField, value: f64) {
        self.attributes.set(field, value);
        self.recompute();
    }

    pub fn attributes(&self) -> &PetAttributes {
        &self.attributes
    }

    pub fn result(&self) -> &PetResult {
        &self.result
    }

    pub fn unallocated_points(&self) -> f64 {
        self.unallocated_points
    }

    fn recompute(&mut self) {
        self.result = compute_stats(&self.attributes);
        self.unallocated_points = self.attributes.unallocated_points();
    }
}

/// Fields whose values differ between the two sides, compared with plain
/// `!=`. A not-a-number field therefore always shows as different.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ComparisonDiff {
    pub attributes: Vec<PetField>,
    pub stats: Vec<PetStat>,
}

impl ComparisonDiff {
    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty() && self.stats.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmulatorSnapshot {
    pub primary: PetSlot,
    pub compared: PetSlot,
    pub diff: ComparisonDiff,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Emulator {
    primary: PetSlot,
    compared: PetSlot,
}

impl Emulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn slot(&self, side: Side) -> &PetSlot {
        match side {
            Side::Primary => &self.primary,
            Side::Compared => &self.compared,
        }
    }

    fn slot_mut(&mut self, side: Side) -> &mut PetSlot {
        match side {
            Side::Primary => &mut self.primary,
            Side::Compared => &mut self.compared,
        }
    }

    pub fn edit(&mut self, side: Side, field: PetField, value: f64) -> &PetSlot {
        tracing::debug!(%side, %field, value, "pet attribute edited");
        let slot = self.slot_mut(side);
        slot.set(field, value);
        slot
    }

    /// Edits from raw field text; unparseable text stores not-a-number.
    pub fn edit_text(&mut self, side: Side, field: PetField, text: &str) -> &PetSlot {
        self.edit(side, field, parse_float(text))
    }

    /// Overwrites the compared set with the primary set. One way only.
    pub fn copy_to_compared(&mut self) {
        self.compared = self.primary.clone();
    }

    pub fn diff(&self) -> ComparisonDiff {
        let (left, right) = (&self.primary, &self.compared);
        ComparisonDiff {
            attributes: PetField::ALL
                .into_iter()
                .filter(|&field| left.attributes.get(field) != right.attributes.get(field))
                .collect(),
            stats: PetStat::ALL
                .into_iter()
                .filter(|&stat| left.result.get(stat) != right.result.get(stat))
                .collect(),
        }
    }

    pub fn snapshot(&self) -> EmulatorSnapshot {
        EmulatorSnapshot {
            primary: self.primary.clone(),
            compared: self.compared.clone(),
            diff: self.diff(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(emulator: &mut Emulator, side: Side) {
        emulator.edit(side, PetField::Level, 100.0);
        emulator.edit(side, PetField::AttackAptitude, 1400.0);
        emulator.edit(side, PetField::GrowthRate, 1.25);
        emulator.edit(side, PetField::Strength, 300.0);
    }

    #[test]
    fn fresh_emulator_has_no_diff() {
        assert!(Emulator::new().diff().is_empty());
    }

    #[test]
    fn edits_recompute_result_and_points() {
        let mut emulator = Emulator::new();
        sample(&mut emulator, Side::Primary);
        let slot = emulator.slot(Side::Primary);
        assert_eq!(slot.result().attack, 868.0);
        assert_eq!(slot.unallocated_points(), 1100.0 - 300.0);
        assert_eq!(emulator.slot(Side::Compared).result().attack, 0.0);
    }

    #[test]
    fn diff_lists_changed_fields_and_stats() {
        let mut emulator = Emulator::new();
        emulator.edit(Side::Primary, PetField::Agility, 100.0);
        emulator.edit(Side::Primary, PetField::SpeedAptitude, 1200.0);
        let diff = emulator.diff();
        assert_eq!(diff.attributes, vec![PetField::SpeedAptitude, PetField::Agility]);
        assert_eq!(diff.stats, vec![PetStat::Speed]);
    }

    #[test]
    fn copy_clears_diff_until_next_edit() {
        let mut emulator = Emulator::new();
        sample(&mut emulator, Side::Primary);
        emulator.edit(Side::Compared, PetField::Mana, 40.0);
        assert!(!emulator.diff().is_empty());

        emulator.copy_to_compared();
        assert!(emulator.diff().is_empty());
        assert_eq!(emulator.slot(Side::Compared), emulator.slot(Side::Primary));

        emulator.edit(Side::Compared, PetField::Strength, 301.0);
        let diff = emulator.diff();
        assert_eq!(diff.attributes, vec![PetField::Strength]);
        assert_eq!(diff.stats, vec![PetStat::Attack]);
    }

    #[test]
    fn copy_is_one_way() {
        let mut emulator = Emulator::new();
        emulator.edit(Side::Compared, PetField::Level, 80.0);
        emulator.copy_to_compared();
        assert_eq!(emulator.slot(Side::Compared).attributes().level, 0.0);
        assert_eq!(emulator.slot(Side::Primary).attributes().level, 0.0);
    }

    #[test]
    fn unparseable_text_is_stored_as_nan() {
        let mut emulator = Emulator::new();
        let slot = emulator.edit_text(Side::Primary, PetField::Constitution, "abc");
        assert!(slot.attributes().constitution.is_nan());
        assert!(slot.unallocated_points().is_nan());
        assert!(emulator.diff().attributes.contains(&PetField::Constitution));
    }

    #[test]
    fn side_parses_from_path_segment() {
        assert_eq!("compared".parse::<Side>(), Ok(Side::Compared));
        assert!("left".parse::<Side>().is_err());
    }
}
