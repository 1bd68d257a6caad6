//! Attack resolution.
//!
//! Every weapon attack and attack spell funnels through [`attack`]:
//! precondition checks, the Sanctuary save, flanking, the d20 roll against
//! AC, and damage. Resolution only touches the pieces it is handed through
//! [`CombatContext`] plus the roster.

use crate::character::{Archetype, CharacterId, DamageResult, Roster};
use crate::dice::{self, DiceExpression, DiceRoller, DieType, RollResult};
use crate::effects::{EffectKind, EffectRegistry, EffectTrigger, HitType};
use crate::error::ActionError;
use crate::grid::FEET_PER_SQUARE;
use crate::log::CombatLog;
use crate::conditions::Condition;

/// DC of the Will save an enemy makes to attack a Sanctuary target.
pub const SANCTUARY_DC: i32 = 15;
/// Will save modifier used by every enemy.
pub const ENEMY_WILL_BONUS: i32 = 2;
/// Margin over AC that turns a hit into a critical.
pub const CRITICAL_MARGIN: i32 = 10;

/// Capabilities that combat resolution is allowed to use.
pub struct CombatContext<'a> {
    roller: &'a mut dyn DiceRoller,
    log: &'a mut CombatLog,
    effects: &'a mut EffectRegistry,
    kills: Vec<CharacterId>,
}

impl<'a> CombatContext<'a> {
    pub fn new(
        roller: &'a mut dyn DiceRoller,
        log: &'a mut CombatLog,
        effects: &'a mut EffectRegistry,
    ) -> Self {
        Self {
            roller,
            log,
            effects,
            kills: Vec::new(),
        }
    }

    pub fn log(&mut self, line: impl Into<String>) {
        self.log.push(line);
    }

    pub fn emit(&mut self, trigger: EffectTrigger) {
        self.effects.emit(trigger);
    }

    pub fn roll(&mut self, dice: &DiceExpression) -> RollResult {
        dice.roll(&mut *self.roller)
    }

    pub fn d20(&mut self) -> u32 {
        dice::roll_d20(&mut *self.roller)
    }

    pub fn chance(&mut self, percent: u32) -> bool {
        dice::chance(&mut *self.roller, percent)
    }

    /// Characters that dropped to 0 HP during this resolution.
    pub fn kills(&self) -> &[CharacterId] {
        &self.kills
    }
}

/// Parameters that distinguish one attack from another.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttackProfile {
    pub name: &'static str,
    pub dice: DiceExpression,
    /// Reach in squares.
    pub range: i32,
    /// Adds 1d6 when the attacker is a Rogue.
    pub sneak_attack: bool,
    /// Effect shown on a normal hit.
    pub hit_effect: EffectKind,
}

impl AttackProfile {
    pub fn melee(name: &'static str, dice: DiceExpression) -> Self {
        Self {
            name,
            dice,
            range: 1,
            sneak_attack: false,
            hit_effect: EffectKind::Strike,
        }
    }

    pub fn with_range(mut self, range: i32) -> Self {
        self.range = range;
        self
    }

    pub fn with_sneak_attack(mut self, sneak_attack: bool) -> Self {
        self.sneak_attack = sneak_attack;
        self
    }

    pub fn with_hit_effect(mut self, kind: EffectKind) -> Self {
        self.hit_effect = kind;
        self
    }
}

/// How an attack that passed its preconditions turned out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttackResult {
    Hit { damage: i32, critical: bool },
    Miss { critical_miss: bool },
    /// The attacker failed its Will save against Sanctuary.
    Repelled,
}

impl AttackResult {
    pub fn is_hit(&self) -> bool {
        matches!(self, AttackResult::Hit { .. })
    }
}

/// Check that `target` is alive and within `range` squares of `attacker`.
pub fn check_reach(
    roster: &Roster,
    attacker: CharacterId,
    target: CharacterId,
    name: &'static str,
    range: i32,
) -> Result<(), ActionError> {
    let (Some(a), Some(t)) = (roster.get(attacker), roster.get(target)) else {
        return Err(ActionError::NotAvailable(name.to_string()));
    };
    if !t.is_alive() {
        return Err(ActionError::TargetDead {
            target: t.name.clone(),
        });
    }
    match a.distance_to(t) {
        Some(distance) if distance <= range => Ok(()),
        _ => Err(ActionError::OutOfRange {
            target: t.name.clone(),
            ability: name,
            range_feet: range * FEET_PER_SQUARE,
        }),
    }
}

/// Resolve one attack roll and its damage.
///
/// Precondition failures return an error and change nothing. Any result
/// other than an error costs the attacker one action; spending it is the
/// caller's job.
pub fn attack(
    roster: &mut Roster,
    attacker_id: CharacterId,
    target_id: CharacterId,
    profile: &AttackProfile,
    ctx: &mut CombatContext<'_>,
) -> Result<AttackResult, ActionError> {
    let attacker = roster
        .get(attacker_id)
        .ok_or_else(|| ActionError::NotAvailable(profile.name.to_string()))?;
    if attacker.actions_left < 1 {
        return Err(ActionError::NotEnoughActions {
            needed: 1,
            left: attacker.actions_left,
        });
    }
    check_reach(roster, attacker_id, target_id, profile.name, profile.range)?;

    let flanking = {
        let (Some(attacker), Some(target)) = (roster.get(attacker_id), roster.get(target_id)) else {
            return Err(ActionError::NotAvailable(profile.name.to_string()));
        };
        attacker.is_flanking(target, roster)
    };

    let Some((attacker, target)) = roster.pair_mut(attacker_id, target_id) else {
        return Err(ActionError::InvalidTarget {
            target: "themselves".to_string(),
            ability: profile.name,
        });
    };
    let (start, end) = match (attacker.position(), target.position()) {
        (Some(s), Some(e)) => (s, e),
        _ => {
            return Err(ActionError::OutOfRange {
                target: target.name.clone(),
                ability: profile.name,
                range_feet: profile.range * FEET_PER_SQUARE,
            })
        }
    };

    if attacker.is_enemy() && target.has_sanctuary() {
        let roll = ctx.d20() as i32;
        let save = roll + ENEMY_WILL_BONUS;
        ctx.log(format!(
            "{} must make a Will save to target {} (Sanctuary)",
            attacker.name, target.name
        ));
        ctx.log(format!(
            "Will save: d20({roll}) + {ENEMY_WILL_BONUS} = {save} vs DC {SANCTUARY_DC}"
        ));
        target.conditions.remove(Condition::Sanctuary);
        if save < SANCTUARY_DC {
            ctx.log(format!(
                "{} cannot bring themselves to attack {}!",
                attacker.name, target.name
            ));
            ctx.log(format!(
                "{}'s Sanctuary fades after protecting them.",
                target.name
            ));
            ctx.emit(EffectTrigger::new(EffectKind::Miss, start, end).with_hit_type(HitType::Miss));
            return Ok(AttackResult::Repelled);
        }
        ctx.log(format!("{} overcomes the Sanctuary and attacks!", attacker.name));
        ctx.log(format!("{}'s Sanctuary is broken!", target.name));
    }

    if flanking {
        target.off_guard = true;
        ctx.log(format!("{} is flanked and off-guard!", target.name));
    }

    let roll = ctx.d20();
    let total = roll as i32 + attacker.attack_bonus;
    let ac = target.ac();
    ctx.log(format!(
        "{} rolls to hit: d20({roll}) + {} = {total} vs AC {ac}",
        attacker.name, attacker.attack_bonus
    ));

    if roll == 1 {
        ctx.log("Critical Miss!");
        ctx.emit(EffectTrigger::new(EffectKind::Miss, start, end).with_hit_type(HitType::Miss));
        target.off_guard = false;
        return Ok(AttackResult::Miss {
            critical_miss: true,
        });
    }

    let critical = roll == 20 || total >= ac + CRITICAL_MARGIN;
    if !critical && total < ac {
        ctx.log("Miss!");
        ctx.emit(EffectTrigger::new(EffectKind::Miss, start, end).with_hit_type(HitType::Miss));
        target.off_guard = false;
        return Ok(AttackResult::Miss {
            critical_miss: false,
        });
    }

    let dice = if critical {
        ctx.log("Critical Hit!");
        profile.dice.doubled()
    } else {
        ctx.log("Hit!");
        profile.dice
    };
    let rolled = ctx.roll(&dice);
    let dice_sum = rolled.total - dice.modifier;
    ctx.log(format!(
        "Damage: {}{} = [{}] = {dice_sum}",
        dice.count,
        dice.die,
        rolled.rolls_display()
    ));
    let (kind, hit_type) = if critical {
        (EffectKind::Critical, HitType::Critical)
    } else {
        (profile.hit_effect, HitType::Hit)
    };
    ctx.emit(
        EffectTrigger::new(kind, start, end)
            .with_damage(dice_sum)
            .with_hit_type(hit_type),
    );

    let mut damage = rolled.total;
    if profile.sneak_attack && matches!(attacker.archetype, Archetype::Rogue) {
        let sneak = ctx.roll(&DiceExpression::new(1, DieType::D6)).total;
        ctx.log(format!("Sneak Attack! Extra d6: [{sneak}]"));
        ctx.emit(EffectTrigger::new(EffectKind::SneakAttack, start, end).with_damage(sneak));
        damage += sneak;
    }
    damage += attacker.bonus_damage;
    ctx.log(format!("Damage Total: {damage}"));

    target.off_guard = false;
    apply_damage(roster, target_id, damage, ctx);

    Ok(AttackResult::Hit { damage, critical })
}

/// Deal damage to a character, logging it and recording a kill.
pub fn apply_damage(
    roster: &mut Roster,
    target_id: CharacterId,
    amount: i32,
    ctx: &mut CombatContext<'_>,
) -> Option<DamageResult> {
    let target = roster.get_mut(target_id)?;
    let result = target.take_damage(amount);
    ctx.log(format!(
        "{} takes {} damage! (HP: {})",
        target.name, result.damage_taken, target.hp
    ));
    if result.dropped_to_zero {
        ctx.log(format!("{} has fallen!", target.name));
        ctx.kills.push(target_id);
    }
    Some(result)
}
