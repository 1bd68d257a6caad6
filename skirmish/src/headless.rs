//! Line-oriented terminal loop.
//!
//! The encounter is ticked on a tokio interval while stdin is read on a
//! separate task. Protocol:
//! - Lines starting with `#` are runner commands (quit, status, help, summary)
//! - Every other line is a game command, queued until the encounter accepts input
//! - Combat log lines are printed as they appear, prompts start with `>`

use anyhow::Result;
use skirmish_core::headless::{CommandError, HeadlessGame, COMMAND_HELP};
use skirmish_core::scheduler::Tick;
use skirmish_core::{ArchetypeKind, EncounterConfig, IntentError};
use std::collections::VecDeque;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio::time::{Interval, MissedTickBehavior};

/// How a run is driven.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub class: Option<ArchetypeKind>,
    /// Ticks per second; 0 ticks as fast as possible.
    pub tick_rate: u64,
    pub max_ticks: Option<Tick>,
    pub show_effects: bool,
    pub json: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

/// Run an encounter until it ends, the player quits, or input runs dry.
pub async fn run(config: EncounterConfig, options: RunOptions) -> Result<()> {
    let autoplay = config.autopilot;
    let mut game = HeadlessGame::new(config);

    println!("=== Skirmish ===");
    if autoplay {
        println!("Autoplay: the AI controls the whole party.");
    } else {
        print_help();
    }
    println!();

    let class = options
        .class
        .or_else(|| autoplay.then_some(ArchetypeKind::Fighter));
    if let Some(class) = class {
        game.send(&format!("class {class}"))?;
    }

    let mut input = (!autoplay).then(spawn_stdin_reader);
    let mut queued: VecDeque<String> = VecDeque::new();
    let mut interval = pacing(options.tick_rate);
    let mut last_prompt = None;

    loop {
        flush_output(&mut game, &options, &mut last_prompt);
        if game.is_finished() {
            break;
        }
        if options.max_ticks.is_some_and(|max| game.encounter().now() >= max) {
            println!("[STOPPED] Tick limit reached.");
            break;
        }

        // Apply queued commands as soon as the encounter is listening.
        if !game.encounter().is_busy() {
            if let Some(line) = queued.pop_front() {
                if send_command(&mut game, &line) == Flow::Quit {
                    break;
                }
                continue;
            }
            if input.is_none() && !autoplay {
                println!("[EOF] Input closed.");
                break;
            }
        }

        tokio::select! {
            biased;
            line = next_line(&mut input) => match line {
                Some(line) => {
                    let line = line.trim().to_string();
                    if line.is_empty() {
                        continue;
                    }
                    if let Some(command) = line.strip_prefix('#') {
                        if runner_command(&game, command) == Flow::Quit {
                            break;
                        }
                    } else {
                        queued.push_back(line);
                    }
                }
                None => input = None,
            },
            _ = next_tick(&mut interval) => game.tick(),
        }
    }

    let summary = game.summary();
    tracing::info!(outcome = summary.outcome, ticks = summary.ticks, "run finished");
    println!();
    println!("=== {} ===", summary.outcome.to_uppercase());
    if options.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    }
    Ok(())
}

fn pacing(tick_rate: u64) -> Option<Interval> {
    if tick_rate == 0 {
        return None;
    }
    let mut interval = tokio::time::interval(Duration::from_micros(1_000_000 / tick_rate));
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    Some(interval)
}

async fn next_tick(interval: &mut Option<Interval>) {
    match interval {
        Some(interval) => {
            interval.tick().await;
        }
        None => tokio::task::yield_now().await,
    }
}

async fn next_line(input: &mut Option<mpsc::Receiver<String>>) -> Option<String> {
    match input {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}

fn spawn_stdin_reader() -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel(64);
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    if tx.send(line).await.is_err() {
                        break;
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    tracing::warn!(error = %e, "failed to read stdin");
                    break;
                }
            }
        }
    });
    rx
}

fn send_command(game: &mut HeadlessGame, line: &str) -> Flow {
    tracing::debug!(command = line, tick = game.encounter().now(), "command");
    match game.send(line) {
        Ok(()) => {}
        // Failed actions already explain themselves in the combat log.
        Err(CommandError::Intent(IntentError::Action(_))) => {}
        Err(e) => println!("[ERROR] {e}"),
    }
    Flow::Continue
}

fn runner_command(game: &HeadlessGame, command: &str) -> Flow {
    match command.split_whitespace().next() {
        Some("quit") | Some("exit") => {
            println!("Goodbye!");
            return Flow::Quit;
        }
        Some("status") => {
            println!("[STATUS]");
            for line in game.status() {
                println!("{line}");
            }
        }
        Some("summary") => match serde_json::to_string_pretty(&game.summary()) {
            Ok(json) => println!("{json}"),
            Err(e) => println!("[ERROR] {e}"),
        },
        Some("help") => print_help(),
        _ => println!("[ERROR] Unknown command. Type #help for help."),
    }
    Flow::Continue
}

fn print_help() {
    println!("Commands:");
    for (usage, description) in COMMAND_HELP {
        println!("  {usage:<42} - {description}");
    }
    println!("  {:<42} - Show the battlefield", "#status");
    println!("  {:<42} - Print a JSON summary", "#summary");
    println!("  {:<42} - Show this help", "#help");
    println!("  {:<42} - Exit", "#quit");
}

/// Print new log lines, effect triggers and a changed prompt.
fn flush_output(game: &mut HeadlessGame, options: &RunOptions, last_prompt: &mut Option<String>) {
    for line in game.drain_log() {
        println!("{line}");
    }
    if options.show_effects {
        for fx in game.encounter_mut().effects_mut().drain_new() {
            let damage = fx.damage.map(|d| format!(" {d}")).unwrap_or_default();
            println!("[FX] {} {} -> {}{damage}", fx.kind.name(), fx.start, fx.end);
        }
    }
    let prompt = game.prompt();
    if prompt.is_some() && prompt != *last_prompt {
        if let Some(text) = &prompt {
            println!("> {text}");
        }
    }
    *last_prompt = prompt;
}
