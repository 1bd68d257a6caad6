//! Terminal runner for skirmish encounters.
//!
//! Plays the encounter one text command per line on stdin, with the combat
//! log on stdout and diagnostics on stderr:
//!
//! ```bash
//! cargo run -p skirmish -- --class wizard --seed 7
//! cargo run -p skirmish -- --autoplay --fast --json
//! ```

mod headless;

use anyhow::{Context, Result};
use clap::Parser;
use skirmish_core::{ArchetypeKind, EncounterConfig, SchedulerDelays};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "skirmish", version, about = "Turn-based grid combat in the terminal")]
struct Args {
    /// Class to play; you are asked for one if omitted
    #[arg(long)]
    class: Option<ArchetypeKind>,

    /// Seed for the dice
    #[arg(long)]
    seed: Option<u64>,

    /// JSON encounter configuration
    #[arg(long)]
    config: Option<PathBuf>,

    /// Let the AI control the whole party
    #[arg(long)]
    autoplay: bool,

    /// Tick as fast as possible instead of in real time
    #[arg(long)]
    fast: bool,

    /// Skip all scheduler delays
    #[arg(long)]
    instant: bool,

    /// Scheduler ticks per second; 0 is the same as --fast
    #[arg(long, default_value_t = skirmish_core::scheduler::TICKS_PER_SECOND)]
    tick_rate: u64,

    /// Stop after this many ticks
    #[arg(long)]
    max_ticks: Option<u64>,

    /// Print effect triggers as they are emitted
    #[arg(long)]
    effects: bool,

    /// Print a JSON summary when the run ends
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists (silently ignore if not found)
    let _ = dotenvy::dotenv();
    setup_logging();

    let args = Args::parse();
    let config = build_config(&args)?;
    tracing::info!(seed = ?config.seed, autopilot = config.autopilot, waves = config.waves.len(), "starting");

    let options = headless::RunOptions {
        class: args.class,
        tick_rate: if args.fast { 0 } else { args.tick_rate },
        max_ticks: args.max_ticks,
        show_effects: args.effects,
        json: args.json,
    };
    headless::run(config, options).await
}

/// Diagnostics go to stderr so stdout stays a clean transcript.
fn setup_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("skirmish=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn build_config(args: &Args) -> Result<EncounterConfig> {
    let mut config = match &args.config {
        Some(path) => EncounterConfig::from_json_file(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => EncounterConfig::new(),
    };
    if let Some(seed) = args.seed {
        config = config.with_seed(seed);
    }
    if args.autoplay {
        config = config.with_autopilot(true);
    }
    if args.instant {
        config = config.with_delays(SchedulerDelays::instant());
    }
    Ok(config)
}
