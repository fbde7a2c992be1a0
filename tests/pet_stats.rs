use proptest::prelude::*;
use westward_companion::{
    emulator::{Emulator, Side},
    pet::{compute_stats, compute_unallocated, PetAttributes, PetField},
};

fn floor_sum_attack(attrs: &PetAttributes) -> f64 {
    let level_term = (attrs.level * attrs.attack_aptitude * (14.0 + 10.0 * attrs.growth_rate) / 7500.0).floor();
    let strength = attrs.strength * attrs.growth_rate;
    level_term + (strength * 0.75).floor() + (strength * 0.25).floor()
}

#[test]
fn level_hundred_attack_matches_floor_sum() {
    let attrs = PetAttributes {
        level: 100.0,
        attack_aptitude: 1000.0,
        growth_rate: 1.0,
        strength: 100.0,
        ..Default::default()
    };
    let result = compute_stats(&attrs);
    assert_eq!(result.attack, floor_sum_attack(&attrs));
    assert_eq!(result.attack, 420.0);
    assert_eq!(result.defense, 0.0);
    assert_eq!(result.health, 0.0);
}

#[test]
fn stats_are_whole_numbers_for_realistic_pet() {
    let attrs = PetAttributes {
        level: 109.0,
        constitution: 145.0,
        mana: 109.0,
        strength: 545.0,
        stamina: 109.0,
        agility: 109.0,
        health_aptitude: 5500.0,
        magic_aptitude: 2500.0,
        attack_aptitude: 1550.0,
        defense_aptitude: 1400.0,
        speed_aptitude: 1300.0,
        growth_rate: 1.3,
        spirituality: 0.0,
    };
    let result = compute_stats(&attrs);
    for value in [result.health, result.attack, result.defense, result.speed] {
        assert_eq!(value, value.floor());
        assert!(value > 0.0);
    }
    assert_eq!(result.speed, 141.0);
    assert_eq!(compute_unallocated(&attrs), 1190.0 - 1017.0);
}

proptest! {
    #[test]
    fn unallocated_budget_identity(
        level in 0u32..200,
        spirituality in 0u32..100,
        points in prop::array::uniform5(0u32..600),
    ) {
        let mut emulator = Emulator::new();
        emulator.edit(Side::Primary, PetField::Level, level as f64);
        emulator.edit(Side::Primary, PetField::Spirituality, spirituality as f64);
        let allocatable = [
            PetField::Constitution,
            PetField::Mana,
            PetField::Strength,
            PetField::Stamina,
            PetField::Agility,
        ];
        for (field, value) in allocatable.into_iter().zip(points) {
            emulator.edit(Side::Primary, field, value as f64);
        }
        let slot = emulator.slot(Side::Primary);
        let attrs = slot.attributes();
        prop_assert_eq!(
            slot.unallocated_points() + attrs.constitution + attrs.mana + attrs.strength + attrs.stamina + attrs.agility,
            attrs.level * 10.0 + 100.0 + attrs.spirituality * 2.0
        );
    }

    #[test]
    fn attack_is_sum_of_floored_terms(
        level in 0u32..200,
        aptitude in 0u32..2000,
        growth in 80u32..140,
        strength in 0u32..800,
    ) {
        let attrs = PetAttributes {
            level: level as f64,
            attack_aptitude: aptitude as f64,
            growth_rate: growth as f64 / 100.0,
            strength: strength as f64,
            ..Default::default()
        };
        let attack = compute_stats(&attrs).attack;
        prop_assert_eq!(attack, floor_sum_attack(&attrs));
        prop_assert_eq!(attack, attack.floor());
    }

    #[test]
    fn copy_leaves_nothing_highlighted(
        values in prop::collection::vec(0u32..3000, 13),
    ) {
        let mut emulator = Emulator::new();
        for (field, value) in PetField::ALL.into_iter().zip(values) {
            emulator.edit(Side::Primary, field, value as f64);
        }
        emulator.copy_to_compared();
        prop_assert!(emulator.diff().is_empty());
    }
}
