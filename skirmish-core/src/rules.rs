//! Ability resolution.
//!
//! [`resolve`] interprets an [`Ability`] tag for an acting character:
//! 1. Validate the archetype, action budget and target
//! 2. Resolve through the shared attack pipeline or the ability's own rules
//! 3. Spend the reported actions
//!
//! Validation failures return an [`ActionError`] with nothing mutated.

use crate::actions::{target_allowed, Ability, TargetKind, LESSER_HEAL_RANGE};
use crate::character::{Archetype, CharacterId, Roster, POTION_HEALING};
use crate::combat::{self, check_reach, AttackProfile, AttackResult, CombatContext};
use crate::conditions::Condition;
use crate::dice::{DiceExpression, DieType};
use crate::effects::{EffectKind, EffectTrigger};
use crate::error::ActionError;
use crate::grid::{GridBounds, GridPosition};
use serde::{Deserialize, Serialize};

/// Rounds of protection granted by Sanctuary.
pub const SANCTUARY_ROUNDS: u32 = 3;
/// Percent chance a Rogue's Strike leaves its target off-guard.
pub const ROGUE_OFF_GUARD_CHANCE: u32 = 50;

/// What an ability cost and whether it achieved anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionOutcome {
    pub actions_used: u8,
    pub succeeded: bool,
}

impl ActionOutcome {
    pub fn new(actions_used: u8, succeeded: bool) -> Self {
        Self {
            actions_used,
            succeeded,
        }
    }

    /// The outcome reported for a rejected attempt.
    pub fn rejected() -> Self {
        Self::new(0, false)
    }
}

/// Resolve `ability` for `actor`, spending its actions on success.
pub fn resolve(
    roster: &mut Roster,
    actor: CharacterId,
    ability: Ability,
    target: Option<CharacterId>,
    ctx: &mut CombatContext<'_>,
) -> Result<ActionOutcome, ActionError> {
    let character = roster
        .get(actor)
        .ok_or_else(|| ActionError::NotAvailable(ability.name().to_string()))?;
    if !character.is_alive() || !ability.usable_by(&character.archetype) {
        return Err(ActionError::NotAvailable(ability.name().to_string()));
    }
    if character.actions_left < ability.cost() {
        return Err(ActionError::NotEnoughActions {
            needed: ability.cost(),
            left: character.actions_left,
        });
    }

    let target = match ability.target_kind() {
        TargetKind::Opponent | TargetKind::Ally => Some(validate_target(roster, actor, ability, target)?),
        _ => None,
    };

    let outcome = match (ability, target) {
        (Ability::Strike, Some(t)) => resolve_strike(roster, actor, t, ctx)?,
        (Ability::PowerAttack, Some(t)) => resolve_power_attack(roster, actor, t, ctx)?,
        (Ability::TwinFeint, Some(t)) => resolve_twin_feint(roster, actor, t, ctx)?,
        (Ability::ArcaneBlast, Some(t)) => resolve_arcane_blast(roster, actor, t, ctx)?,
        (Ability::MagicMissile { actions }, Some(t)) => {
            resolve_magic_missile(roster, actor, t, actions, ctx)
        }
        (Ability::SpiritLink, Some(t)) => resolve_spirit_link(roster, actor, t, ctx),
        (Ability::Sanctuary, Some(t)) => resolve_sanctuary(roster, actor, t, ctx)?,
        (Ability::LesserHeal { actions }, t) => resolve_lesser_heal(roster, actor, t, actions, ctx),
        (Ability::RaiseShield, _) | (Ability::ShieldSpell, _) => resolve_shield(roster, actor, ctx)?,
        (Ability::DrinkPotion, _) => resolve_potion(roster, actor, ctx)?,
        (Ability::EndTurn, _) => ActionOutcome::new(0, true),
        _ => return Err(ActionError::NotAvailable(ability.name().to_string())),
    };

    spend(roster, actor, outcome.actions_used);
    Ok(outcome)
}

/// Stride `actor` to `dest`, spending one action.
pub fn stride(
    roster: &mut Roster,
    actor: CharacterId,
    dest: GridPosition,
    bounds: GridBounds,
    ctx: &mut CombatContext<'_>,
) -> Result<ActionOutcome, ActionError> {
    let character = roster.get(actor).ok_or(ActionError::InvalidMove(dest))?;
    if character.actions_left < 1 {
        return Err(ActionError::NotEnoughActions {
            needed: 1,
            left: character.actions_left,
        });
    }
    roster.move_character(actor, dest, bounds)?;
    if let Some(character) = roster.get(actor) {
        ctx.log(format!("{} strides to {dest}", character.name));
    }
    spend(roster, actor, 1);
    Ok(ActionOutcome::new(1, true))
}

fn spend(roster: &mut Roster, actor: CharacterId, actions: u8) {
    if let Some(character) = roster.get_mut(actor) {
        character.actions_left = character.actions_left.saturating_sub(actions);
    }
}

fn validate_target(
    roster: &Roster,
    actor: CharacterId,
    ability: Ability,
    target: Option<CharacterId>,
) -> Result<CharacterId, ActionError> {
    let target_id = target.ok_or(ActionError::NoTarget {
        ability: ability.name(),
    })?;
    let (Some(a), Some(t)) = (roster.get(actor), roster.get(target_id)) else {
        return Err(ActionError::NoTarget {
            ability: ability.name(),
        });
    };
    if target_allowed(ability, a, t) {
        return Ok(target_id);
    }
    // Report the most specific reason.
    let range = ability.range().unwrap_or(1);
    check_reach(roster, actor, target_id, ability.name(), range)?;
    Err(ActionError::InvalidTarget {
        target: t.name.clone(),
        ability: ability.name(),
    })
}

fn strike_dice(archetype: &Archetype) -> DiceExpression {
    match archetype {
        Archetype::Fighter { .. } => DiceExpression::new(1, DieType::D10),
        Archetype::Enemy { damage, .. } => *damage,
        _ => DiceExpression::new(1, DieType::D6),
    }
}

fn attack_outcome(result: AttackResult) -> ActionOutcome {
    ActionOutcome::new(1, result.is_hit())
}

fn resolve_strike(
    roster: &mut Roster,
    actor: CharacterId,
    target: CharacterId,
    ctx: &mut CombatContext<'_>,
) -> Result<ActionOutcome, ActionError> {
    let (archetype, sneak) = match (roster.get(actor), roster.get(target)) {
        (Some(a), Some(t)) => (a.archetype.clone(), t.off_guard),
        _ => return Err(ActionError::NoTarget { ability: "Strike" }),
    };
    let is_rogue = matches!(archetype, Archetype::Rogue);
    let profile = AttackProfile::melee("Strike", strike_dice(&archetype))
        .with_sneak_attack(is_rogue && sneak);
    let result = combat::attack(roster, actor, target, &profile, ctx)?;

    if is_rogue && result.is_hit() && ctx.chance(ROGUE_OFF_GUARD_CHANCE) {
        if let Some(t) = roster.get_mut(target).filter(|t| t.is_alive()) {
            t.off_guard = true;
            ctx.log(format!("{} is now Off-Guard until their next turn!", t.name));
        }
    }
    Ok(attack_outcome(result))
}

fn resolve_power_attack(
    roster: &mut Roster,
    actor: CharacterId,
    target: CharacterId,
    ctx: &mut CombatContext<'_>,
) -> Result<ActionOutcome, ActionError> {
    let (name, start, end) = endpoints(roster, actor, target)?;
    ctx.log(format!("{name} uses Power Attack!"));
    ctx.emit(EffectTrigger::new(EffectKind::PowerAttack, start, end));
    let profile = AttackProfile::melee(
        "Power Attack",
        DiceExpression::new(2, DieType::D10).with_modifier(2),
    );
    combat::attack(roster, actor, target, &profile, ctx)?;
    Ok(ActionOutcome::new(2, true))
}

fn resolve_twin_feint(
    roster: &mut Roster,
    actor: CharacterId,
    target: CharacterId,
    ctx: &mut CombatContext<'_>,
) -> Result<ActionOutcome, ActionError> {
    let (name, _, _) = endpoints(roster, actor, target)?;
    ctx.log(format!("{name} uses Twin Feint!"));
    let d6 = DiceExpression::new(1, DieType::D6);

    let first = combat::attack(
        roster,
        actor,
        target,
        &AttackProfile::melee("Twin Feint", d6),
        ctx,
    )?;

    let mut second_hit = false;
    if let Some(t) = roster.get_mut(target).filter(|t| t.is_alive()) {
        t.off_guard = true;
        let second = combat::attack(
            roster,
            actor,
            target,
            &AttackProfile::melee("Twin Feint", d6).with_sneak_attack(true),
            ctx,
        )?;
        second_hit = second.is_hit();
        if let Some(t) = roster.get_mut(target) {
            t.off_guard = false;
        }
    }
    Ok(ActionOutcome::new(2, first.is_hit() || second_hit))
}

fn resolve_arcane_blast(
    roster: &mut Roster,
    actor: CharacterId,
    target: CharacterId,
    ctx: &mut CombatContext<'_>,
) -> Result<ActionOutcome, ActionError> {
    let profile = AttackProfile::melee("Arcane Blast", DiceExpression::new(2, DieType::D4))
        .with_range(Ability::ArcaneBlast.range().unwrap_or(1))
        .with_hit_effect(EffectKind::MagicMissile);
    combat::attack(roster, actor, target, &profile, ctx)?;
    fade_shield_spell(roster, actor, ctx);
    Ok(ActionOutcome::new(1, true))
}

fn resolve_magic_missile(
    roster: &mut Roster,
    actor: CharacterId,
    target: CharacterId,
    missiles: u8,
    ctx: &mut CombatContext<'_>,
) -> ActionOutcome {
    let Ok((name, start, end)) = endpoints(roster, actor, target) else {
        return ActionOutcome::rejected();
    };
    ctx.log(format!(
        "{name} uses {missiles} action(s) to cast Magic Missile!"
    ));
    let missile = DiceExpression::new(1, DieType::D4).with_modifier(1);
    for i in 1..=missiles {
        if !roster.get(target).is_some_and(|t| t.is_alive()) {
            break;
        }
        let roll = ctx.roll(&missile);
        ctx.log(format!(
            "Magic Missile #{i}: d4 + 1 = [{}] + 1 = {} force damage",
            roll.rolls_display(),
            roll.total
        ));
        ctx.emit(EffectTrigger::new(EffectKind::MagicMissile, start, end).with_damage(roll.total));
        combat::apply_damage(roster, target, roll.total, ctx);
    }
    fade_shield_spell(roster, actor, ctx);
    ActionOutcome::new(missiles, true)
}

fn fade_shield_spell(roster: &mut Roster, actor: CharacterId, ctx: &mut CombatContext<'_>) {
    if let Some(c) = roster.get_mut(actor) {
        if let Archetype::Wizard { shield_up } = &mut c.archetype {
            if *shield_up {
                *shield_up = false;
                ctx.log("Shield fades.");
            }
        }
    }
}

fn resolve_shield(
    roster: &mut Roster,
    actor: CharacterId,
    ctx: &mut CombatContext<'_>,
) -> Result<ActionOutcome, ActionError> {
    let Some(c) = roster.get_mut(actor) else {
        return Err(ActionError::NotAvailable("Shield".to_string()));
    };
    let message = match &mut c.archetype {
        Archetype::Fighter { shield_raised } => {
            if *shield_raised {
                return Err(ActionError::AlreadyActive(format!("{}'s shield", c.name)));
            }
            *shield_raised = true;
            format!("{} raises their shield! (+2 AC until the round ends)", c.name)
        }
        Archetype::Wizard { shield_up } => {
            if *shield_up {
                return Err(ActionError::AlreadyActive(format!("{}'s Shield spell", c.name)));
            }
            *shield_up = true;
            format!("{} casts Shield! +2 AC until the round ends.", c.name)
        }
        _ => return Err(ActionError::NotAvailable("Shield".to_string())),
    };
    let pos = c.position();
    ctx.log(message);
    if let Some(pos) = pos {
        ctx.emit(EffectTrigger::at(EffectKind::Shield, pos));
    }
    Ok(ActionOutcome::new(1, true))
}

fn resolve_spirit_link(
    roster: &mut Roster,
    actor: CharacterId,
    target: CharacterId,
    ctx: &mut CombatContext<'_>,
) -> ActionOutcome {
    let Ok((_, start, end)) = endpoints(roster, actor, target) else {
        return ActionOutcome::rejected();
    };
    let Some((caster, ally)) = roster.pair_mut(actor, target) else {
        return ActionOutcome::rejected();
    };
    let shared = (caster.hp.current() + ally.hp.current()) / 2;
    ctx.emit(EffectTrigger::new(EffectKind::Link, start, end));
    ctx.log(format!(
        "{} casts Spirit Link on {} to equalize their HP.",
        caster.name, ally.name
    ));
    ctx.log(format!(
        "HP Before: {} = {} HP | {} = {} HP",
        caster.name,
        caster.hp.current(),
        ally.name,
        ally.hp.current()
    ));
    caster.hp.set(shared);
    ally.hp.set(shared);
    ctx.log(format!(
        "HP After: {} = {} | {} = {}",
        caster.name, caster.hp, ally.name, ally.hp
    ));
    ActionOutcome::new(1, true)
}

fn resolve_sanctuary(
    roster: &mut Roster,
    actor: CharacterId,
    target: CharacterId,
    ctx: &mut CombatContext<'_>,
) -> Result<ActionOutcome, ActionError> {
    let caster = roster
        .get(actor)
        .map(|c| c.name.clone())
        .unwrap_or_default();
    let Some(t) = roster.get_mut(target) else {
        return Err(ActionError::NoTarget {
            ability: "Sanctuary",
        });
    };
    if t.has_sanctuary() {
        return Err(ActionError::AlreadyActive(format!("{}'s Sanctuary", t.name)));
    }
    t.conditions.add(Condition::Sanctuary, SANCTUARY_ROUNDS);
    let pos = t.position();
    let name = t.name.clone();
    ctx.log(format!("{caster} casts Sanctuary on {name}."));
    ctx.log(format!(
        "{name} is protected by divine sanctuary - enemies must overcome their reluctance to attack!"
    ));
    if let Some(pos) = pos {
        ctx.emit(EffectTrigger::at(EffectKind::Buff, pos));
    }
    Ok(ActionOutcome::new(1, true))
}

fn resolve_lesser_heal(
    roster: &mut Roster,
    actor: CharacterId,
    target: Option<CharacterId>,
    actions: u8,
    ctx: &mut CombatContext<'_>,
) -> ActionOutcome {
    let Some((caster_name, caster_pos)) = roster
        .get(actor)
        .and_then(|c| Some((c.name.clone(), c.position()?)))
    else {
        return ActionOutcome::rejected();
    };
    ctx.log(format!(
        "{caster_name} casts Lesser Heal with {actions} action(s)!"
    ));

    let d8 = DiceExpression::new(1, DieType::D8);
    let recipients: Vec<CharacterId> = match (actions, target) {
        (1 | 2, Some(t)) => vec![t],
        _ => roster
            .living_party()
            .filter(|c| {
                c.position()
                    .is_some_and(|p| p.distance_to(caster_pos) <= LESSER_HEAL_RANGE)
            })
            .map(|c| c.id)
            .collect(),
    };

    let amount = if actions == 2 {
        let roll = ctx.roll(&d8.with_modifier(8));
        ctx.log(format!(
            "Healing: d8 + 8 = [{}] + 8 = {}",
            roll.rolls_display(),
            roll.total
        ));
        roll.total
    } else {
        let roll = ctx.roll(&d8);
        ctx.log(format!("Healing: d8 = [{}] = {}", roll.rolls_display(), roll.total));
        roll.total
    };
    if actions == 3 {
        ctx.log(format!(
            "A wave of healing energy pulses outward from {caster_name}, restoring {amount} HP to all allies in range!"
        ));
    }

    for id in recipients {
        let Some(ally) = roster.get_mut(id) else {
            continue;
        };
        let healed = ally.heal(amount);
        if healed > 0 {
            ctx.log(format!(
                "{} heals for {healed} HP. Now at {} HP.",
                ally.name, ally.hp
            ));
        } else {
            ctx.log(format!("{} is already at full HP.", ally.name));
        }
        if let Some(pos) = ally.position() {
            ctx.emit(EffectTrigger::new(EffectKind::Heal, caster_pos, pos).with_damage(healed));
        }
    }
    ActionOutcome::new(actions, true)
}

fn resolve_potion(
    roster: &mut Roster,
    actor: CharacterId,
    ctx: &mut CombatContext<'_>,
) -> Result<ActionOutcome, ActionError> {
    let Some(c) = roster.get_mut(actor) else {
        return Err(ActionError::NoPotions);
    };
    if c.potions == 0 {
        return Err(ActionError::NoPotions);
    }
    c.potions -= 1;
    c.heal(POTION_HEALING);
    ctx.log(format!("{} uses a potion to heal {POTION_HEALING} HP.", c.name));
    ctx.log(format!(
        "HP after healing: {} | Potions left: {}",
        c.hp, c.potions
    ));
    if let Some(pos) = c.position() {
        ctx.emit(EffectTrigger::at(EffectKind::Heal, pos));
    }
    Ok(ActionOutcome::new(1, true))
}

/// Name of the actor plus both squares, for abilities that draw a line.
fn endpoints(
    roster: &Roster,
    actor: CharacterId,
    target: CharacterId,
) -> Result<(String, GridPosition, GridPosition), ActionError> {
    let (Some(a), Some(t)) = (roster.get(actor), roster.get(target)) else {
        return Err(ActionError::NotAvailable("target".to_string()));
    };
    match (a.position(), t.position()) {
        (Some(s), Some(e)) => Ok((a.name.clone(), s, e)),
        _ => Err(ActionError::NotAvailable(format!("{} is not on the field", t.name))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::character::Character;
    use crate::class_data::{ArchetypeKind, EnemyKind};
    use crate::effects::EffectRegistry;
    use crate::log::CombatLog;
    use crate::testing::ScriptedRoller;

    struct Table {
        roster: Roster,
        log: CombatLog,
        effects: EffectRegistry,
    }

    impl Table {
        fn new() -> Self {
            Self {
                roster: Roster::new(),
                log: CombatLog::new(),
                effects: EffectRegistry::default(),
            }
        }

        fn add(&mut self, mut c: Character, x: i32, y: i32) -> CharacterId {
            c.begin_turn();
            self.roster.push(c.at(GridPosition::new(x, y)))
        }

        fn run(
            &mut self,
            rolls: &[u32],
            actor: CharacterId,
            ability: Ability,
            target: Option<CharacterId>,
        ) -> Result<ActionOutcome, ActionError> {
            let mut roller = ScriptedRoller::new(rolls.iter().copied());
            let mut ctx = CombatContext::new(&mut roller, &mut self.log, &mut self.effects);
            resolve(&mut self.roster, actor, ability, target, &mut ctx)
        }

        fn get(&self, id: CharacterId) -> &Character {
            self.roster.get(id).unwrap()
        }
    }

    #[test]
    fn test_power_attack_always_consumes_two() {
        let mut t = Table::new();
        let fighter = t.add(Character::hero(ArchetypeKind::Fighter), 2, 2);
        let ogre = t.add(Character::enemy(EnemyKind::Ogre, "Ogre"), 3, 2);

        let outcome = t.run(&[2], fighter, Ability::PowerAttack, Some(ogre));
        assert_eq!(outcome, Ok(ActionOutcome::new(2, true)));
        assert_eq!(t.get(fighter).actions_left, 1);
        assert_eq!(t.get(ogre).hp.current(), 40);

        let outcome = t.run(&[], fighter, Ability::PowerAttack, Some(ogre));
        assert!(matches!(outcome, Err(ActionError::NotEnoughActions { needed: 2, left: 1 })));
    }

    #[test]
    fn test_power_attack_adds_two() {
        let mut t = Table::new();
        let fighter = t.add(Character::hero(ArchetypeKind::Fighter), 2, 2);
        let ogre = t.add(Character::enemy(EnemyKind::Ogre, "Ogre"), 3, 2);

        t.run(&[10, 4, 5], fighter, Ability::PowerAttack, Some(ogre)).unwrap();
        assert_eq!(t.get(ogre).hp.current(), 40 - 11);
        assert!(t.log.contains("Damage: 2d10 = [4 + 5] = 9"));
        assert_eq!(t.effects.drain_new()[0].kind, EffectKind::PowerAttack);
    }

    #[test]
    fn test_raise_shield_once() {
        let mut t = Table::new();
        let fighter = t.add(Character::hero(ArchetypeKind::Fighter), 2, 2);

        assert_eq!(t.run(&[], fighter, Ability::RaiseShield, None), Ok(ActionOutcome::new(1, true)));
        assert_eq!(t.get(fighter).ac(), 20);
        assert!(matches!(
            t.run(&[], fighter, Ability::RaiseShield, None),
            Err(ActionError::AlreadyActive(_))
        ));
        assert_eq!(t.get(fighter).actions_left, 2);
    }

    #[test]
    fn test_rogue_strike_sneaks_off_guard_target() {
        let mut t = Table::new();
        let rogue = t.add(Character::hero(ArchetypeKind::Rogue), 2, 2);
        let ogre = t.add(Character::enemy(EnemyKind::Ogre, "Ogre"), 3, 2);
        t.roster.get_mut(ogre).unwrap().off_guard = true;

        // d20, d6 damage, d6 sneak, d100 off-guard check
        t.run(&[12, 3, 4, 80], rogue, Ability::Strike, Some(ogre)).unwrap();
        assert_eq!(t.get(ogre).hp.current(), 33);
        assert!(!t.get(ogre).off_guard);

        t.run(&[12, 3, 10], rogue, Ability::Strike, Some(ogre)).unwrap();
        assert_eq!(t.get(ogre).hp.current(), 30);
        assert!(t.get(ogre).off_guard);
        assert!(t.log.contains("Ogre is now Off-Guard until their next turn!"));
    }

    #[test]
    fn test_twin_feint() {
        let mut t = Table::new();
        let rogue = t.add(Character::hero(ArchetypeKind::Rogue), 2, 2);
        let ogre = t.add(Character::enemy(EnemyKind::Ogre, "Ogre"), 3, 2);

        // First strike misses; second against AC 15 with sneak attack.
        let outcome = t.run(&[5, 8, 2, 6], rogue, Ability::TwinFeint, Some(ogre));
        assert_eq!(outcome, Ok(ActionOutcome::new(2, true)));
        assert_eq!(t.get(ogre).hp.current(), 32);
        assert!(!t.get(ogre).off_guard);
        assert_eq!(t.get(rogue).actions_left, 1);
    }

    #[test]
    fn test_twin_feint_stops_when_target_falls() {
        let mut t = Table::new();
        let rogue = t.add(Character::hero(ArchetypeKind::Rogue), 2, 2);
        let goblin = t.add(Character::enemy(EnemyKind::Goblin, "Goblin").with_hp(2), 3, 2);

        let outcome = t.run(&[15, 6], rogue, Ability::TwinFeint, Some(goblin));
        assert_eq!(outcome, Ok(ActionOutcome::new(2, true)));
        assert!(!t.get(goblin).is_alive());
        assert_eq!(t.log.lines().iter().filter(|l| l.contains("rolls to hit")).count(), 1);
    }

    #[test]
    fn test_magic_missile_auto_hits() {
        let mut t = Table::new();
        let wizard = t.add(Character::hero(ArchetypeKind::Wizard), 0, 0);
        let wyvern = t.add(Character::enemy(EnemyKind::Wyvern, "Wyvern"), 15, 7);

        let outcome = t.run(&[4, 1, 2], wizard, Ability::MagicMissile { actions: 3 }, Some(wyvern));
        assert_eq!(outcome, Ok(ActionOutcome::new(3, true)));
        assert_eq!(t.get(wyvern).hp.current(), 55 - 5 - 2 - 3);
        assert_eq!(t.get(wizard).actions_left, 0);
        assert_eq!(t.effects.drain_new().len(), 3);
    }

    #[test]
    fn test_magic_missile_stops_on_kill() {
        let mut t = Table::new();
        let wizard = t.add(Character::hero(ArchetypeKind::Wizard), 0, 0);
        let goblin = t.add(Character::enemy(EnemyKind::Goblin, "Goblin").with_hp(3), 5, 0);

        let outcome = t.run(&[4], wizard, Ability::MagicMissile { actions: 2 }, Some(goblin));
        assert_eq!(outcome, Ok(ActionOutcome::new(2, true)));
        assert!(!t.get(goblin).is_alive());
        assert!(!t.log.contains("Magic Missile #2"));
    }

    #[test]
    fn test_offensive_spell_ends_shield() {
        let mut t = Table::new();
        let wizard = t.add(Character::hero(ArchetypeKind::Wizard), 2, 2);
        let goblin = t.add(Character::enemy(EnemyKind::Goblin, "Goblin"), 4, 2);

        t.run(&[], wizard, Ability::ShieldSpell, None).unwrap();
        assert_eq!(t.get(wizard).ac(), 18);
        t.run(&[2], wizard, Ability::ArcaneBlast, Some(goblin)).unwrap();
        assert_eq!(t.get(wizard).ac(), 16);
        assert!(t.log.contains("Shield fades."));
    }

    #[test]
    fn test_arcane_blast_range() {
        let mut t = Table::new();
        let wizard = t.add(Character::hero(ArchetypeKind::Wizard), 0, 0);
        let goblin = t.add(Character::enemy(EnemyKind::Goblin, "Goblin"), 5, 0);

        let outcome = t.run(&[20], wizard, Ability::ArcaneBlast, Some(goblin));
        assert!(matches!(outcome, Err(ActionError::OutOfRange { range_feet: 20, .. })));
        assert_eq!(t.get(wizard).actions_left, 3);
    }

    #[test]
    fn test_spirit_link_averages() {
        let mut t = Table::new();
        let cleric = t.add(Character::hero(ArchetypeKind::Cleric).with_hp(10), 2, 2);
        let rogue = t.add(Character::hero(ArchetypeKind::Rogue).with_hp(30), 5, 2);

        let outcome = t.run(&[], cleric, Ability::SpiritLink, Some(rogue));
        assert_eq!(outcome, Ok(ActionOutcome::new(1, true)));
        assert_eq!(t.get(cleric).hp.current(), 20);
        assert_eq!(t.get(rogue).hp.current(), 20);
    }

    #[test]
    fn test_spirit_link_clamps_to_own_max() {
        let mut t = Table::new();
        let cleric = t.add(Character::hero(ArchetypeKind::Cleric).with_hp(30), 2, 2);
        let fighter = t.add(Character::hero(ArchetypeKind::Fighter).with_hp(50), 3, 2);

        t.run(&[], cleric, Ability::SpiritLink, Some(fighter)).unwrap();
        assert_eq!(t.get(cleric).hp.current(), 32);
        assert_eq!(t.get(fighter).hp.current(), 40);
    }

    #[test]
    fn test_spirit_link_rejects_enemies() {
        let mut t = Table::new();
        let cleric = t.add(Character::hero(ArchetypeKind::Cleric), 2, 2);
        let goblin = t.add(Character::enemy(EnemyKind::Goblin, "Goblin"), 3, 2);

        let outcome = t.run(&[], cleric, Ability::SpiritLink, Some(goblin));
        assert!(matches!(outcome, Err(ActionError::InvalidTarget { .. })));
    }

    #[test]
    fn test_sanctuary() {
        let mut t = Table::new();
        let cleric = t.add(Character::hero(ArchetypeKind::Cleric), 2, 2);
        let wizard = t.add(Character::hero(ArchetypeKind::Wizard), 3, 3);

        t.run(&[], cleric, Ability::Sanctuary, Some(wizard)).unwrap();
        assert_eq!(t.get(wizard).conditions.remaining(Condition::Sanctuary), Some(3));
        assert!(matches!(
            t.run(&[], cleric, Ability::Sanctuary, Some(wizard)),
            Err(ActionError::AlreadyActive(_))
        ));
    }

    #[test]
    fn test_lesser_heal_variants() {
        let mut t = Table::new();
        let cleric = t.add(Character::hero(ArchetypeKind::Cleric).with_hp(20), 2, 2);
        let fighter = t.add(Character::hero(ArchetypeKind::Fighter).with_hp(10), 3, 2);
        let rogue = t.add(Character::hero(ArchetypeKind::Rogue).with_hp(10), 7, 2);
        let far = t.add(Character::hero(ArchetypeKind::Wizard).with_hp(10), 15, 7);

        assert!(matches!(
            t.run(&[5], cleric, Ability::LesserHeal { actions: 1 }, Some(rogue)),
            Err(ActionError::OutOfRange { .. })
        ));

        t.run(&[5], cleric, Ability::LesserHeal { actions: 2 }, Some(rogue)).unwrap();
        assert_eq!(t.get(rogue).hp.current(), 23);
        assert_eq!(t.get(cleric).actions_left, 1);

        t.roster.get_mut(cleric).unwrap().begin_turn();
        t.run(&[4], cleric, Ability::LesserHeal { actions: 3 }, None).unwrap();
        assert_eq!(t.get(cleric).hp.current(), 24);
        assert_eq!(t.get(fighter).hp.current(), 14);
        assert_eq!(t.get(rogue).hp.current(), 27);
        assert_eq!(t.get(far).hp.current(), 10);
    }

    #[test]
    fn test_potion() {
        let mut t = Table::new();
        let fighter = t.add(Character::hero(ArchetypeKind::Fighter).with_hp(40), 2, 2);
        t.run(&[], fighter, Ability::DrinkPotion, None).unwrap();
        assert_eq!(t.get(fighter).hp.current(), 50);
        assert_eq!(t.get(fighter).potions, 2);

        t.roster.get_mut(fighter).unwrap().potions = 0;
        assert_eq!(
            t.run(&[], fighter, Ability::DrinkPotion, None),
            Err(ActionError::NoPotions)
        );
    }

    #[test]
    fn test_archetype_gates_abilities() {
        let mut t = Table::new();
        let wizard = t.add(Character::hero(ArchetypeKind::Wizard), 2, 2);
        let goblin = t.add(Character::enemy(EnemyKind::Goblin, "Goblin"), 3, 2);
        assert!(matches!(
            t.run(&[], wizard, Ability::Strike, Some(goblin)),
            Err(ActionError::NotAvailable(_))
        ));
        assert!(matches!(
            t.run(&[], wizard, Ability::ArcaneBlast, None),
            Err(ActionError::NoTarget { .. })
        ));
    }

    #[test]
    fn test_stride() {
        let mut t = Table::new();
        let rogue = t.add(Character::hero(ArchetypeKind::Rogue), 0, 0);
        let mut roller = ScriptedRoller::default();
        let mut ctx = CombatContext::new(&mut roller, &mut t.log, &mut t.effects);
        let bounds = GridBounds::default();

        assert_eq!(
            stride(&mut t.roster, rogue, GridPosition::new(6, 6), bounds, &mut ctx),
            Ok(ActionOutcome::new(1, true))
        );
        assert_eq!(
            stride(&mut t.roster, rogue, GridPosition::new(6, 13), bounds, &mut ctx),
            Err(ActionError::InvalidMove(GridPosition::new(6, 13)))
        );
        assert_eq!(t.roster.get(rogue).unwrap().actions_left, 2);
    }
}
