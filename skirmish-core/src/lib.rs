//! Turn-based tactical grid combat engine.
//!
//! This crate provides:
//! - A party of four archetypes with action-point turns and per-class abilities
//! - An attack pipeline with flanking, off-guard, criticals and Sanctuary saves
//! - Scripted enemy waves with AI-driven allies and enemies
//! - A tick-driven scheduler with a single pending deadline
//! - Timed effect triggers for a presentation layer to play
//!
//! # Quick Start
//!
//! ```
//! use skirmish_core::{ArchetypeKind, Encounter, EncounterConfig, Intent};
//!
//! let config = EncounterConfig::new().with_seed(42).with_autopilot(true);
//! let mut encounter = Encounter::new(config);
//! encounter.handle(Intent::SelectClass(ArchetypeKind::Fighter)).unwrap();
//!
//! while !encounter.is_finished() && encounter.now() < 200_000 {
//!     encounter.tick();
//! }
//! for line in encounter.log().lines() {
//!     println!("{line}");
//! }
//! ```

pub mod actions;
pub mod ai;
pub mod character;
pub mod class_data;
pub mod combat;
pub mod conditions;
pub mod config;
pub mod dice;
pub mod effects;
pub mod encounter;
pub mod error;
pub mod grid;
pub mod headless;
pub mod log;
pub mod rules;
pub mod scheduler;
pub mod testing;
pub mod waves;

// Primary public API
pub use actions::{Ability, AvailableAction};
pub use character::{Character, CharacterId, Roster, Side, Upgrade};
pub use class_data::{ArchetypeKind, EnemyKind};
pub use config::{EncounterConfig, SchedulerDelays};
pub use effects::{EffectKind, EffectTrigger};
pub use encounter::{Encounter, Intent};
pub use error::{ActionError, ConfigError, IntentError};
pub use grid::GridPosition;
pub use headless::{EncounterSummary, HeadlessGame};
pub use scheduler::{Phase, Tick, TurnSlot};
pub use testing::TestHarness;
