//! QA tests for combat driven through the intent API.
//!
//! Dice are scripted with `ScriptedRoller`; once a script runs out every
//! roll is a 1, so AI attacks critically miss unless a test says otherwise.
//! Run with: `cargo test -p skirmish-core --test qa_combat`

use skirmish_core::class_data::EnemyKind;
use skirmish_core::grid::GridPosition;
use skirmish_core::testing::{assert_hp, assert_logged, assert_phase, TestHarness};
use skirmish_core::waves::{EnemySpawn, WaveDefinition};
use skirmish_core::{Ability, ActionError, ArchetypeKind, Intent, IntentError, Phase, TurnSlot};

fn duel(kind: EnemyKind, x: i32, y: i32) -> Vec<WaveDefinition> {
    vec![WaveDefinition::new(
        "Duel",
        vec![EnemySpawn::new(kind, GridPosition::new(x, y))],
    )]
}

fn two_waves() -> Vec<WaveDefinition> {
    vec![
        WaveDefinition::new(
            "Scouts",
            vec![EnemySpawn::new(EnemyKind::Goblin, GridPosition::new(1, 4))],
        ),
        WaveDefinition::new(
            "Main Force",
            vec![EnemySpawn::new(EnemyKind::Ogre, GridPosition::new(12, 3))],
        ),
    ]
}

// =============================================================================
// TEST 1: Strikes
// =============================================================================

#[test]
fn test_fighter_critical_ends_last_wave() {
    let mut harness = TestHarness::with_waves(duel(EnemyKind::Goblin, 1, 4)).start(ArchetypeKind::Fighter);
    harness.target("Goblin 1").unwrap();
    // Natural 20 doubles the d10: 10 + 10.
    harness.rolls([20, 10, 10]);
    harness.intent(Intent::Invoke(Ability::Strike)).unwrap();

    assert_logged(&harness, "Critical Hit!");
    assert_logged(&harness, "Goblin 1 has fallen!");
    assert_hp(&harness, "Goblin 1", 0);
    assert_phase(&harness, Phase::VictoryPause);
    assert!(!harness.logged("Wave complete!"), "no rest after the final wave");
    assert!(harness.encounter.selected_target().is_none());

    harness.settle(10);
    assert_phase(&harness, Phase::Victory);
    assert_eq!(
        harness.encounter.log().last(),
        Some("Victory! All waves have been defeated!")
    );
    assert!(harness.encounter.pending().is_none());
}

#[test]
fn test_kill_completes_wave_in_the_same_step() {
    let mut harness = TestHarness::with_waves(duel(EnemyKind::Goblin, 1, 4)).start(ArchetypeKind::Fighter);
    harness.set_hp("Goblin 1", 5);
    harness.target("Goblin 1").unwrap();
    // 15 + 9 = 24 beats AC 15 but falls one short of a critical.
    harness.rolls([15, 6]);
    harness.intent(Intent::Invoke(Ability::Strike)).unwrap();

    assert_logged(&harness, "Valeros rolls to hit: d20(15) + 9 = 24 vs AC 15");
    assert_logged(&harness, "Hit!");
    assert!(!harness.logged("Critical Hit!"));
    assert_logged(&harness, "Damage: 1d10 = [6] = 6");
    assert_hp(&harness, "Goblin 1", 0);
    assert_phase(&harness, Phase::VictoryPause);
}

#[test]
fn test_miss_spends_an_action_and_keeps_the_turn() {
    let mut harness = TestHarness::with_waves(duel(EnemyKind::Goblin, 1, 4)).start(ArchetypeKind::Fighter);
    harness.target("Goblin 1").unwrap();
    harness.rolls([5]);
    harness.intent(Intent::Invoke(Ability::Strike)).unwrap();

    assert_logged(&harness, "Valeros rolls to hit: d20(5) + 9 = 14 vs AC 15");
    assert_logged(&harness, "Miss!");
    assert_hp(&harness, "Goblin 1", 20);
    assert_eq!(harness.find("Valeros").actions_left, 2);

    // Input is locked until the post-action delay fires.
    assert_eq!(
        harness.intent(Intent::Invoke(Ability::Strike)),
        Err(IntentError::Busy)
    );
    harness.settle(10);
    assert_phase(&harness, Phase::Combat(TurnSlot::Party(0)));
    assert!(harness.encounter.is_human_turn());
}

#[test]
fn test_out_of_range_strike_is_logged() {
    let mut harness = TestHarness::with_waves(duel(EnemyKind::Goblin, 10, 3)).start(ArchetypeKind::Fighter);
    harness.target("Goblin 1").unwrap();

    let err = harness.intent(Intent::Invoke(Ability::Strike)).unwrap_err();
    assert!(matches!(err, IntentError::Action(ActionError::OutOfRange { .. })));
    assert_logged(&harness, "Goblin 1 is out of range for Strike");
    assert_eq!(harness.find("Valeros").actions_left, 3);
    assert!(!harness.encounter.is_busy());
}

#[test]
fn test_three_strides_end_the_turn() {
    let mut harness = TestHarness::with_waves(duel(EnemyKind::Goblin, 14, 6)).start(ArchetypeKind::Rogue);
    for x in [6, 11, 13] {
        harness.intent(Intent::MoveTo(GridPosition::new(x, 3))).unwrap();
        harness.settle(1);
    }
    assert_logged(&harness, "Merisiel strides to (13, 3)");
    assert_ne!(harness.phase(), Phase::Combat(TurnSlot::Party(0)));
    assert!(harness.logged("Valeros's turn!"));
}

// =============================================================================
// TEST 2: Class Abilities
// =============================================================================

#[test]
fn test_magic_missile_clears_wave_and_target() {
    let mut harness = TestHarness::with_waves(two_waves()).start(ArchetypeKind::Wizard);
    harness.set_hp("Goblin 1", 3);
    harness.target("Goblin 1").unwrap();
    harness.rolls([2]);
    harness
        .intent(Intent::Invoke(Ability::MagicMissile { actions: 1 }))
        .unwrap();

    assert_logged(&harness, "Magic Missile #1: d4 + 1 = [2] + 1 = 3 force damage");
    assert_phase(&harness, Phase::VictoryPause);
    assert_logged(&harness, "Wave complete! Time to rest and upgrade!");
    assert!(harness.encounter.selected_target().is_none());
    assert!(harness.encounter.party().all(|c| c.actions_left == 0));

    let err = harness.intent(Intent::Invoke(Ability::ArcaneBlast)).unwrap_err();
    assert!(matches!(err, IntentError::WrongPhase { .. }));
}

#[test]
fn test_spirit_link_through_intents() {
    let mut harness = TestHarness::with_waves(duel(EnemyKind::Goblin, 14, 6)).start(ArchetypeKind::Cleric);
    harness.set_hp("Kyra", 10);
    harness.target("Valeros").unwrap();
    harness.intent(Intent::Invoke(Ability::SpiritLink)).unwrap();

    // (10 + 50) / 2 = 30, within both maximums.
    assert_hp(&harness, "Kyra", 30);
    assert_hp(&harness, "Valeros", 30);
    assert_logged(&harness, "Kyra casts Spirit Link on Valeros to equalize their HP.");
    assert_eq!(harness.find("Kyra").actions_left, 2);
}

#[test]
fn test_group_heal_ignores_selected_target() {
    let mut harness = TestHarness::with_waves(duel(EnemyKind::Goblin, 14, 6)).start(ArchetypeKind::Cleric);
    harness.set_hp("Valeros", 20).set_hp("Ezren", 20);
    harness.target("Goblin 1").unwrap();
    harness.rolls([6]);
    harness
        .intent(Intent::Invoke(Ability::LesserHeal { actions: 3 }))
        .unwrap();

    assert_hp(&harness, "Valeros", 26);
    assert_hp(&harness, "Ezren", 26);
    assert_hp(&harness, "Goblin 1", 20);
    assert_logged(&harness, "Kyra is already at full HP.");
}

#[test]
fn test_potion_supply_runs_out() {
    let mut harness = TestHarness::with_waves(duel(EnemyKind::Goblin, 14, 6)).start(ArchetypeKind::Fighter);
    harness.set_hp("Valeros", 5);
    for _ in 0..3 {
        harness.intent(Intent::Invoke(Ability::DrinkPotion)).unwrap();
        harness.settle(1);
        if harness.phase() != Phase::Combat(TurnSlot::Party(0)) {
            break;
        }
    }
    assert_hp(&harness, "Valeros", 50);
    assert_eq!(harness.find("Valeros").potions, 0);
}

// =============================================================================
// TEST 3: Sanctuary
// =============================================================================

#[test]
fn test_sanctuary_expires_after_three_rounds() {
    let mut harness = TestHarness::with_waves(duel(EnemyKind::Ogre, 15, 7)).start(ArchetypeKind::Cleric);
    // The ogre never closes in, so Ezren is never attacked.
    harness.character_mut("Ogre 1").speed = 0;
    harness.place("Kyra", 3, 4);
    harness.target("Ezren").unwrap();
    harness.intent(Intent::Invoke(Ability::Sanctuary)).unwrap();
    harness.settle(1);
    assert_logged(&harness, "Kyra casts Sanctuary on Ezren.");

    for round in 2..=4 {
        harness.intent(Intent::EndTurn).unwrap();
        assert!(harness.run_until(10_000, |e| e.is_human_turn()));
        assert_eq!(harness.encounter.round(), round);
    }
    assert_logged(&harness, "Ezren's Sanctuary condition expires.");
    assert!(!harness.find("Ezren").has_sanctuary());
    assert!(harness.find("Ogre 1").is_alive());
}

#[test]
fn test_sanctuary_repels_one_attack() {
    let mut harness = TestHarness::with_waves(duel(EnemyKind::Goblin, 2, 4)).start(ArchetypeKind::Cleric);
    harness.target("Valeros").unwrap();
    harness.intent(Intent::Invoke(Ability::Sanctuary)).unwrap();
    harness.settle(1);
    // Keep the allies out of the goblin's reach; only Valeros is adjacent.
    harness.place("Kyra", 0, 0).place("Merisiel", 8, 0).place("Ezren", 15, 0);
    harness.intent(Intent::EndTurn).unwrap();

    assert!(harness.run_until(10_000, |e| e.is_human_turn()));
    assert_logged(&harness, "Goblin 1 must make a Will save to target Valeros (Sanctuary)");
    assert_logged(&harness, "Goblin 1 cannot bring themselves to attack Valeros!");
    assert!(!harness.find("Valeros").has_sanctuary());
}
