//! Generate example battle transcripts for the README.
//!
//! Run with: `cargo run -p skirmish-core --example generate_transcripts [output_dir]`

use skirmish_core::headless::HeadlessGame;
use skirmish_core::{ArchetypeKind, EncounterConfig, SchedulerDelays};
use std::fs;
use std::path::Path;

/// A seeded autoplay run to record.
struct Scenario {
    title: &'static str,
    filename: &'static str,
    description: &'static str,
    class: ArchetypeKind,
    seed: u64,
}

fn scenarios() -> Vec<Scenario> {
    vec![
        Scenario {
            title: "Shield Wall",
            filename: "shield_wall.md",
            description: "Valeros leads the line against three waves.",
            class: ArchetypeKind::Fighter,
            seed: 11,
        },
        Scenario {
            title: "Knives in the Dark",
            filename: "knives_in_the_dark.md",
            description: "Merisiel hunts for flanks while the party holds.",
            class: ArchetypeKind::Rogue,
            seed: 23,
        },
        Scenario {
            title: "Force and Focus",
            filename: "force_and_focus.md",
            description: "Ezren's missiles never miss, but can the wizard survive the wyverns?",
            class: ArchetypeKind::Wizard,
            seed: 37,
        },
        Scenario {
            title: "The Long Vigil",
            filename: "the_long_vigil.md",
            description: "Kyra keeps everyone standing, one prayer at a time.",
            class: ArchetypeKind::Cleric,
            seed: 41,
        },
    ]
}

/// Hard stop for a run that somehow never ends.
const MAX_TICKS: u64 = 200_000;

fn run_scenario(scenario: &Scenario, output_dir: &Path) -> Result<(), Box<dyn std::error::Error>> {
    println!("\n{}", "=".repeat(60));
    println!("Running: {}", scenario.title);
    println!("{}\n", "=".repeat(60));

    let config = EncounterConfig::new()
        .with_seed(scenario.seed)
        .with_autopilot(true)
        .with_delays(SchedulerDelays::instant());
    let mut game = HeadlessGame::new(config);
    game.send(&format!("class {}", scenario.class))?;

    let mut transcript = String::new();
    transcript.push_str(&format!("# {}\n\n", scenario.title));
    transcript.push_str(&format!("*{}*\n\n", scenario.description));
    transcript.push_str(&format!("**Lead:** {} | **Seed:** {}\n\n", scenario.class, scenario.seed));
    transcript.push_str("---\n\n```text\n");

    while !game.is_finished() && game.encounter().now() < MAX_TICKS {
        game.tick();
        for line in game.drain_log() {
            transcript.push_str(&line);
            transcript.push('\n');
        }
    }
    transcript.push_str("```\n\n---\n\n");

    let summary = game.summary();
    transcript.push_str(&format!(
        "**Outcome:** {} after {} ticks (wave {}/{}, round {})\n\n",
        summary.outcome, summary.ticks, summary.wave, summary.waves, summary.round
    ));
    transcript.push_str("| Member | Class | HP | Potions |\n|---|---|---|---|\n");
    for member in &summary.party {
        transcript.push_str(&format!(
            "| {} | {} | {}/{} | {} |\n",
            member.name, member.class, member.hp, member.max_hp, member.potions
        ));
    }

    let path = output_dir.join(scenario.filename);
    fs::write(&path, transcript)?;
    println!("{}: {} -> {}", scenario.title, summary.outcome, path.display());
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let output_dir = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "transcripts".to_string());
    let output_dir = Path::new(&output_dir);
    fs::create_dir_all(output_dir)?;

    for scenario in scenarios() {
        if let Err(e) = run_scenario(&scenario, output_dir) {
            eprintln!("Failed to run {}: {e}", scenario.title);
        }
    }
    Ok(())
}
