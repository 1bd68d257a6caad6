//! Animation trigger records.
//!
//! Combat resolution emits an [`EffectTrigger`] for every visible event. The
//! registry timestamps it with a start delay and a per-kind duration, ages
//! it each tick, and drops it once it has played out. Drawing belongs to
//! whatever presentation layer reads [`EffectRegistry::active`].

use crate::grid::GridPosition;
use serde::{Deserialize, Serialize};

/// Visual category of an effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectKind {
    Strike,
    PowerAttack,
    SneakAttack,
    MagicMissile,
    Heal,
    Shield,
    Critical,
    Miss,
    Link,
    Buff,
}

impl EffectKind {
    pub fn name(&self) -> &'static str {
        match self {
            EffectKind::Strike => "strike",
            EffectKind::PowerAttack => "power_attack",
            EffectKind::SneakAttack => "sneak_attack",
            EffectKind::MagicMissile => "magic_missile",
            EffectKind::Heal => "heal",
            EffectKind::Shield => "shield",
            EffectKind::Critical => "critical",
            EffectKind::Miss => "miss",
            EffectKind::Link => "link",
            EffectKind::Buff => "buff",
        }
    }

    /// Playback length for this kind given the base duration.
    pub fn duration(&self, base: u32) -> u32 {
        match self {
            EffectKind::PowerAttack => base * 3 / 2,
            EffectKind::Miss => base / 2,
            _ => base,
        }
    }
}

/// Outcome overlay drawn with an effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HitType {
    Hit,
    Miss,
    Critical,
}

/// What happened and where, as emitted by combat resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectTrigger {
    pub kind: EffectKind,
    pub start: GridPosition,
    pub end: GridPosition,
    pub damage: Option<i32>,
    pub hit_type: Option<HitType>,
}

impl EffectTrigger {
    pub fn new(kind: EffectKind, start: GridPosition, end: GridPosition) -> Self {
        Self {
            kind,
            start,
            end,
            damage: None,
            hit_type: None,
        }
    }

    /// An effect centered on a single square.
    pub fn at(kind: EffectKind, pos: GridPosition) -> Self {
        Self::new(kind, pos, pos)
    }

    pub fn with_damage(mut self, damage: i32) -> Self {
        self.damage = Some(damage);
        self
    }

    pub fn with_hit_type(mut self, hit_type: HitType) -> Self {
        self.hit_type = Some(hit_type);
        self
    }
}

/// Delay and base duration applied to new effects, in ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectTiming {
    pub delay: u32,
    pub duration: u32,
}

impl Default for EffectTiming {
    fn default() -> Self {
        Self {
            delay: 30,
            duration: 60,
        }
    }
}

/// An effect that is waiting to start or currently playing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveEffect {
    pub trigger: EffectTrigger,
    pub delay: u32,
    pub duration: u32,
    pub age: u32,
}

impl ActiveEffect {
    pub fn lifetime(&self) -> u32 {
        self.delay + self.duration
    }

    pub fn is_playing(&self) -> bool {
        self.age >= self.delay && !self.is_expired()
    }

    pub fn is_expired(&self) -> bool {
        self.age >= self.lifetime()
    }

    /// Playback progress in `[0, 1)`, or `None` while still delayed.
    pub fn progress(&self) -> Option<f32> {
        if !self.is_playing() || self.duration == 0 {
            return None;
        }
        Some((self.age - self.delay) as f32 / self.duration as f32)
    }
}

/// The encounter's collection of transient effects.
#[derive(Debug, Clone, Default)]
pub struct EffectRegistry {
    timing: EffectTiming,
    active: Vec<ActiveEffect>,
    emitted: Vec<EffectTrigger>,
}

impl EffectRegistry {
    pub fn new(timing: EffectTiming) -> Self {
        Self {
            timing,
            active: Vec::new(),
            emitted: Vec::new(),
        }
    }

    pub fn emit(&mut self, trigger: EffectTrigger) {
        tracing::debug!(kind = trigger.kind.name(), from = %trigger.start, to = %trigger.end, "effect");
        self.active.push(ActiveEffect {
            delay: self.timing.delay,
            duration: trigger.kind.duration(self.timing.duration),
            age: 0,
            trigger: trigger.clone(),
        });
        self.emitted.push(trigger);
    }

    /// Age every effect by one tick and drop the ones that finished.
    pub fn tick(&mut self) {
        for effect in &mut self.active {
            effect.age += 1;
        }
        self.active.retain(|e| !e.is_expired());
    }

    pub fn active(&self) -> &[ActiveEffect] {
        &self.active
    }

    /// Triggers emitted since the last drain, in emission order.
    pub fn drain_new(&mut self) -> Vec<EffectTrigger> {
        std::mem::take(&mut self.emitted)
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    pub fn clear(&mut self) {
        self.active.clear();
        self.emitted.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strike() -> EffectTrigger {
        EffectTrigger::new(EffectKind::Strike, GridPosition::new(1, 1), GridPosition::new(2, 1))
    }

    #[test]
    fn test_kind_durations() {
        assert_eq!(EffectKind::Strike.duration(60), 60);
        assert_eq!(EffectKind::PowerAttack.duration(60), 90);
        assert_eq!(EffectKind::Miss.duration(60), 30);
    }

    #[test]
    fn test_effect_lives_delay_plus_duration() {
        let mut registry = EffectRegistry::new(EffectTiming {
            delay: 2,
            duration: 4,
        });
        registry.emit(strike());

        for _ in 0..5 {
            registry.tick();
            assert_eq!(registry.active().len(), 1);
        }
        registry.tick();
        assert!(registry.is_empty());
    }

    #[test]
    fn test_progress_waits_for_delay() {
        let mut registry = EffectRegistry::new(EffectTiming {
            delay: 2,
            duration: 4,
        });
        registry.emit(strike());
        assert_eq!(registry.active()[0].progress(), None);

        registry.tick();
        registry.tick();
        assert_eq!(registry.active()[0].progress(), Some(0.0));

        registry.tick();
        assert_eq!(registry.active()[0].progress(), Some(0.25));
    }

    #[test]
    fn test_drain_new_is_independent_of_playback() {
        let mut registry = EffectRegistry::default();
        registry.emit(strike().with_damage(6).with_hit_type(HitType::Hit));
        registry.emit(EffectTrigger::at(EffectKind::Heal, GridPosition::new(0, 0)));

        let drained = registry.drain_new();
        assert_eq!(drained.len(), 2);
        assert_eq!(drained[0].damage, Some(6));
        assert!(registry.drain_new().is_empty());
        assert_eq!(registry.active().len(), 2);
    }

    #[test]
    fn test_clear() {
        let mut registry = EffectRegistry::default();
        registry.emit(strike());
        registry.clear();
        assert!(registry.is_empty());
        assert!(registry.drain_new().is_empty());
    }
}
