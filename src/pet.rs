//! Pet attribute model and derived combat stats.
//!
//! All values are `f64`. Each formula term is floored on its own before the
//! terms are summed, so `floor(a) + floor(b)` can be one less than
//! `floor(a + b)`. Not-a-number inputs produce not-a-number stats.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Points granted before any level or spirituality bonus.
pub const BASE_POINTS: f64 = 100.0;
pub const POINTS_PER_LEVEL: f64 = 10.0;
pub const POINTS_PER_SPIRITUALITY: f64 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PetAttributes {
    pub level: f64,

    pub constitution: f64,
    pub mana: f64,
    pub strength: f64,
    pub stamina: f64,
    pub agility: f64,

    pub health_aptitude: f64,
    pub magic_aptitude: f64,
    pub attack_aptitude: f64,
    pub defense_aptitude: f64,
    pub speed_aptitude: f64,

    pub growth_rate: f64,
    pub spirituality: f64,
}

impl PetAttributes {
    pub fn get(&self, field: PetField) -> f64 {
        match field {
            PetField::Level => self.level,
            PetField::Constitution => self.constitution,
            PetField::Mana => self.mana,
            PetField::Strength => self.strength,
            PetField::Stamina => self.stamina,
            PetField::Agility => self.agility,
            PetField::HealthAptitude => self.health_aptitude,
            PetField::MagicAptitude => self.magic_aptitude,
            PetField::AttackAptitude => self.attack_aptitude,
            PetField::DefenseAptitude => self.defense_aptitude,
            PetField::SpeedAptitude => self.speed_aptitude,
            PetField::GrowthRate => self.growth_rate,
            PetField::Spirituality => self.spirituality,
        }
    }

    pub fn set(&mut self, field: PetField, value: f64) {
        let slot = match field {
            PetField::Level => &mut self.level,
            PetField::Constitution => &mut self.constitution,
            PetField::Mana => &mut self.mana,
            PetField::Strength => &mut self.strength,
            PetField::Stamina => &mut self.stamina,
            PetField::Agility => &mut self.agility,
            PetField::HealthAptitude => &mut self.health_aptitude,
            PetField::MagicAptitude => &mut self.magic_aptitude,
            PetField::AttackAptitude => &mut self.attack_aptitude,
            PetField::DefenseAptitude => &mut self.defense_aptitude,
            PetField::SpeedAptitude => &mut self.speed_aptitude,
            PetField::GrowthRate => &mut self.growth_rate,
            PetField::Spirituality => &mut self.spirituality,
        };
        *slot = value;
    }

    pub fn total_points(&self) -> f64 {
        self.level * POINTS_PER_LEVEL + BASE_POINTS + self.spirituality * POINTS_PER_SPIRITUALITY
    }

    pub fn allocated_points(&self) -> f64 {
        self.constitution + self.mana + self.strength + self.stamina + self.agility
    }

    pub fn unallocated_points(&self) -> f64 {
        compute_unallocated(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PetResult {
    pub health: f64,
    pub magic: f64,
    pub attack: f64,
    pub defense: f64,
    pub speed: f64,
    pub spiritual_power: f64,
}

impl PetResult {
    pub fn get(&self, stat: PetStat) -> f64 {
        match stat {
            PetStat::Health => self.health,
            PetStat::Magic => self.magic,
            PetStat::Attack => self.attack,
            PetStat::Defense => self.defense,
            PetStat::Speed => self.speed,
            PetStat::SpiritualPower => self.spiritual_power,
        }
    }
}

pub fn compute_stats(attrs: &PetAttributes) -> PetResult {
    let level = attrs.level;
    let growth = attrs.growth_rate;

    let attack = (level * attrs.attack_aptitude * (14.0 + 10.0 * growth) / 7500.0).floor()
        + (attrs.strength * growth * 0.75).floor()
        + (attrs.strength * growth * 0.25).floor();
    let defense = (level * attrs.defense_aptitude * (9.4 + 19.0 / 3.0 * growth) / 7500.0).floor()
        + (attrs.stamina * growth * 4.0 / 3.0).floor();
    let speed = (attrs.agility * attrs.speed_aptitude / 1000.0).floor();
    let health = (level * attrs.health_aptitude / 1000.0).floor()
        + (attrs.constitution * growth * 6.0).floor();

    // No known formula for magic or spiritual power; both stay at zero.
    PetResult {
        health,
        magic: 0.0,
        attack,
        defense,
        speed,
        spiritual_power: 0.0,
    }
}

pub fn compute_unallocated(attrs: &PetAttributes) -> f64 {
    attrs.total_points() - attrs.allocated_points()
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown pet field '{0}'")]
pub struct FieldParseError(pub String);

/// Editable attribute, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PetField {
    Level,
    GrowthRate,
    AttackAptitude,
    DefenseAptitude,
    HealthAptitude,
    MagicAptitude,
    SpeedAptitude,
    Spirituality,
    Constitution,
    Mana,
    Strength,
    Stamina,
    Agility,
}

impl PetField {
    pub const ALL: [PetField; 13] = [
        PetField::Level,
        PetField::GrowthRate,
        PetField::AttackAptitude,
        PetField::DefenseAptitude,
        PetField::HealthAptitude,
        PetField::MagicAptitude,
        PetField::SpeedAptitude,
        PetField::Spirituality,
        PetField::Constitution,
        PetField::Mana,
        PetField::Strength,
        PetField::Stamina,
        PetField::Agility,
    ];

    pub fn key(self) -> &'static str {
        match self {
            PetField::Level => "level",
            PetField::GrowthRate => "growth_rate",
            PetField::AttackAptitude => "attack_aptitude",
            PetField::DefenseAptitude => "defense_aptitude",
            PetField::HealthAptitude => "health_aptitude",
            PetField::MagicAptitude => "magic_aptitude",
            PetField::SpeedAptitude => "speed_aptitude",
            PetField::Spirituality => "spirituality",
            PetField::Constitution => "constitution",
            PetField::Mana => "mana",
            PetField::Strength => "strength",
            PetField::Stamina => "stamina",
            PetField::Agility => "agility",
        }
    }

    /// In-game label.
    pub fn label(self) -> &'static str {
        match self {
            PetField::Level => "等级",
            PetField::GrowthRate => "成长",
            PetField::AttackAptitude => "攻击资质",
            PetField::DefenseAptitude => "防御资质",
            PetField::HealthAptitude => "体力资质",
            PetField::MagicAptitude => "法力资质",
            PetField::SpeedAptitude => "速度资质",
            PetField::Spirituality => "灵性",
            PetField::Constitution => "体质",
            PetField::Mana => "法力",
            PetField::Strength => "力量",
            PetField::Stamina => "耐力",
            PetField::Agility => "敏捷",
        }
    }
}

impl fmt::Display for PetField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for PetField {
    type Err = FieldParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PetField::ALL
            .into_iter()
            .find(|field| field.key() == s)
            .ok_or_else(|| FieldParseError(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PetStat {
    Health,
    Magic,
    Attack,
    Defense,
    Speed,
    SpiritualPower,
}

impl PetStat {
    pub const ALL: [PetStat; 6] = [
        PetStat::Health,
        PetStat::Magic,
        PetStat::Attack,
        PetStat::Defense,
        PetStat::Speed,
        PetStat::SpiritualPower,
    ];

    pub fn key(self) -> &'static str {
        match self {
            PetStat::Health => "health",
            PetStat::Magic => "magic",
            PetStat::Attack => "attack",
            PetStat::Defense => "defense",
            PetStat::Speed => "speed",
            PetStat::SpiritualPower => "spiritual_power",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PetStat::Health => "气血",
            PetStat::Magic => "魔法",
            PetStat::Attack => "攻击",
            PetStat::Defense => "防御",
            PetStat::Speed => "速度",
            PetStat::SpiritualPower => "灵力",
        }
    }
}
