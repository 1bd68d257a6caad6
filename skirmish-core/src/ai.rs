//! Decision heuristics for AI-controlled characters.
//!
//! [`decide`] picks one action at a time; the scheduler resolves it, waits,
//! and asks again until the budget runs out or the answer is
//! [`Decision::EndTurn`].

use crate::actions::{Ability, LESSER_HEAL_RANGE, MAGIC_MISSILE_RANGE};
use crate::character::{Archetype, Character, CharacterId, Roster, Upgrade};
use crate::grid::{GridBounds, GridPosition};
use serde::{Deserialize, Serialize};

/// What an AI character wants to do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Decision {
    Act {
        ability: Ability,
        target: Option<CharacterId>,
    },
    Stride(GridPosition),
    EndTurn,
}

impl Decision {
    fn act(ability: Ability, target: &Character) -> Self {
        Decision::Act {
            ability,
            target: Some(target.id),
        }
    }
}

/// Choose the next action for `actor`.
pub fn decide(roster: &Roster, actor: CharacterId, bounds: GridBounds) -> Decision {
    let Some(me) = roster.get(actor) else {
        return Decision::EndTurn;
    };
    if !me.is_active() || me.actions_left == 0 {
        return Decision::EndTurn;
    }

    let decision = match me.archetype {
        Archetype::Fighter { .. } => decide_fighter(roster, me, bounds),
        Archetype::Rogue => decide_rogue(roster, me, bounds),
        Archetype::Wizard { .. } => decide_wizard(roster, me, bounds),
        Archetype::Cleric => decide_cleric(roster, me, bounds),
        Archetype::Enemy { .. } => decide_brute(roster, me, bounds),
    };
    tracing::debug!(actor = %me.name, ?decision, "ai decision");
    decision
}

/// Closest living opponent on the board, first in roster order on ties.
fn nearest_opponent<'a>(roster: &'a Roster, me: &Character) -> Option<(&'a Character, i32)> {
    roster
        .iter()
        .filter(|c| c.side != me.side && c.is_active())
        .filter_map(|c| Some((c, me.distance_to(c)?)))
        .min_by_key(|(_, d)| *d)
}

/// Legal destinations ordered by how close they get to `goal`.
fn moves_toward(me: &Character, goal: GridPosition, roster: &Roster, bounds: GridBounds) -> Vec<GridPosition> {
    let mut moves = me.valid_moves(roster, bounds);
    moves.sort_by_key(|pos| pos.distance_to(goal));
    moves
}

/// Stride to `pick` only if it strictly closes the distance to `goal`.
fn approach(me: &Character, goal: GridPosition, pick: Option<GridPosition>) -> Decision {
    match (me.position(), pick) {
        (Some(from), Some(to)) if to.distance_to(goal) < from.distance_to(goal) => Decision::Stride(to),
        _ => Decision::EndTurn,
    }
}

fn step_toward(me: &Character, goal: &Character, roster: &Roster, bounds: GridBounds) -> Decision {
    let Some(goal) = goal.position() else {
        return Decision::EndTurn;
    };
    let pick = moves_toward(me, goal, roster, bounds).into_iter().next();
    approach(me, goal, pick)
}

fn decide_fighter(roster: &Roster, me: &Character, bounds: GridBounds) -> Decision {
    let Some((target, distance)) = nearest_opponent(roster, me) else {
        return Decision::EndTurn;
    };
    if distance > 1 {
        return step_toward(me, target, roster, bounds);
    }
    if me.actions_left >= 2 {
        Decision::act(Ability::PowerAttack, target)
    } else {
        Decision::act(Ability::Strike, target)
    }
}

fn decide_rogue(roster: &Roster, me: &Character, bounds: GridBounds) -> Decision {
    let Some((target, distance)) = nearest_opponent(roster, me) else {
        return Decision::EndTurn;
    };
    if distance <= 1 {
        return if me.is_flanking(target, roster) || me.actions_left < 2 {
            Decision::act(Ability::Strike, target)
        } else {
            Decision::act(Ability::TwinFeint, target)
        };
    }

    let Some(goal) = target.position() else {
        return Decision::EndTurn;
    };
    let moves = moves_toward(me, goal, roster, bounds);
    let flanking = moves.iter().copied().find(|pos| {
        let ghost = me.clone().at(*pos);
        ghost.is_flanking(target, roster)
    });
    approach(me, goal, flanking.or_else(|| moves.first().copied()))
}

fn decide_wizard(roster: &Roster, me: &Character, bounds: GridBounds) -> Decision {
    let Some((target, distance)) = nearest_opponent(roster, me) else {
        return Decision::EndTurn;
    };
    if distance <= MAGIC_MISSILE_RANGE {
        Decision::act(
            Ability::MagicMissile {
                actions: me.actions_left.min(3),
            },
            target,
        )
    } else {
        step_toward(me, target, roster, bounds)
    }
}

fn decide_cleric(roster: &Roster, me: &Character, bounds: GridBounds) -> Decision {
    let Some(origin) = me.position() else {
        return Decision::EndTurn;
    };
    let hurt: Vec<&Character> = roster
        .living_party()
        .filter(|c| c.is_active() && c.hp.missing() > 0)
        .collect();

    let Some(patient) = hurt
        .iter()
        .copied()
        .min_by(|a, b| a.hp.ratio().total_cmp(&b.hp.ratio()))
    else {
        // Nobody to heal: fight.
        let Some((target, distance)) = nearest_opponent(roster, me) else {
            return Decision::EndTurn;
        };
        return if distance <= 1 {
            Decision::act(Ability::Strike, target)
        } else {
            step_toward(me, target, roster, bounds)
        };
    };

    let distance = me.distance_to(patient).unwrap_or(i32::MAX);
    if distance <= 1 {
        return Decision::act(Ability::LesserHeal { actions: 1 }, patient);
    }
    if distance <= LESSER_HEAL_RANGE {
        let in_range = hurt
            .iter()
            .filter(|c| c.position().is_some_and(|p| p.distance_to(origin) <= LESSER_HEAL_RANGE))
            .count();
        if in_range >= 2 && me.actions_left >= 3 {
            return Decision::Act {
                ability: Ability::LesserHeal { actions: 3 },
                target: None,
            };
        }
        if me.actions_left >= 2 {
            return Decision::act(Ability::LesserHeal { actions: 2 }, patient);
        }
    }
    step_toward(me, patient, roster, bounds)
}

fn decide_brute(roster: &Roster, me: &Character, bounds: GridBounds) -> Decision {
    let Some((target, distance)) = nearest_opponent(roster, me) else {
        return Decision::EndTurn;
    };
    if distance <= 1 {
        Decision::act(Ability::Strike, target)
    } else {
        step_toward(me, target, roster, bounds)
    }
}

/// Upgrade picked for a party member when nobody is choosing.
///
/// Badly hurt characters take Vitality; otherwise martial classes take
/// Damage and casters take Accuracy.
pub fn choose_upgrade(character: &Character) -> Upgrade {
    if character.hp.ratio() < 0.5 {
        return Upgrade::Vitality;
    }
    match character.archetype {
        Archetype::Fighter { .. } | Archetype::Rogue => Upgrade::Damage,
        _ => Upgrade::Accuracy,
    }
}
