//! Headless replay runner
//!
//! Feeds a recorded script of world snapshots through the agent and prints
//! the chosen action and the commands it issued for every frame.

use std::fs;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use clap::Parser;
use serde::{Deserialize, Serialize};

use wave_agent::actuator::{Command, RecordingActuator};
use wave_agent::perception::{TerrainLayer, WorldSnapshot};
use wave_agent::{Agent, AgentConfig, Result, TickOutcome};

/// Replay recorded snapshots through the decision core
#[derive(Parser, Debug)]
#[command(name = "wave-agent")]
#[command(about = "Drive the agent core from a recorded snapshot script")]
struct Args {
    /// Agent configuration (TOML)
    #[arg(long, default_value = "data/agent.toml")]
    config: PathBuf,

    /// Snapshot script (JSON)
    #[arg(long)]
    script: PathBuf,

    /// Random seed for deterministic runs
    #[arg(long)]
    seed: Option<u64>,

    /// Output format: json or text
    #[arg(long, default_value = "json")]
    format: String,
}

#[derive(Deserialize)]
struct Script {
    terrain: TerrainLayer,
    frames: Vec<Frame>,
}

#[derive(Deserialize)]
struct Frame {
    at_ms: u64,
    /// Terrain for an area entered on this frame, if different from the default
    #[serde(default)]
    terrain: Option<TerrainLayer>,
    snapshot: WorldSnapshot,
}

#[derive(Serialize)]
struct FrameReport<'a> {
    at_ms: u64,
    area: &'a str,
    outcome: &'a TickOutcome,
    commands: &'a [Command],
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("wave_agent=debug")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = AgentConfig::load(&args.config)?;
    let script: Script = serde_json::from_str(&fs::read_to_string(&args.script)?)?;

    let seed = args.seed.unwrap_or_else(rand::random);
    tracing::info!(seed, frames = script.frames.len(), "replaying script");

    let mut agent = Agent::new(config, seed);
    let mut actuator = RecordingActuator::new();
    let start = Instant::now();
    let mut current_area: Option<String> = None;
    let mut acted = 0usize;

    for frame in &script.frames {
        let now = start + Duration::from_millis(frame.at_ms);
        let area = &frame.snapshot.area.name;
        if current_area.as_deref() != Some(area.as_str()) {
            let terrain = frame.terrain.as_ref().unwrap_or(&script.terrain);
            agent.enter_area(terrain, &frame.snapshot, now)?;
            current_area = Some(area.clone());
        }

        let outcome = agent.tick(&frame.snapshot, &mut actuator, now);
        let commands = actuator.drain();
        if matches!(outcome, TickOutcome::Acted { .. }) {
            acted += 1;
        }

        if args.format == "text" {
            println!("[{:>7} ms] {:?}", frame.at_ms, outcome);
            for command in &commands {
                println!("            {:?}", command);
            }
        } else {
            let report = FrameReport {
                at_ms: frame.at_ms,
                area,
                outcome: &outcome,
                commands: &commands,
            };
            println!("{}", serde_json::to_string(&report)?);
        }

        if let TickOutcome::Stopped { reason } = &outcome {
            eprintln!("Run stopped: {}", reason.as_deref().unwrap_or("unknown"));
            break;
        }
    }

    eprintln!("Replayed {} frames ({} acted)", script.frames.len(), acted);
    Ok(())
}
