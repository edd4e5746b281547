//! Headless fixed-step driver for the locomotion controller.
//!
//! Runs one scripted scenario against a Rapier query world and prints a summary:
//!
//! ```text
//! RUST_LOG=locomotion=trace sandbox --scenario steps --hz 50 --ticks 400
//! ```

mod logging;
mod platform;
mod scenario;
mod walker;

use std::{fs, path::PathBuf};

use anyhow::Context;
use clap::Parser;
use locomotion::{ControllerConfig, types::CapsuleShape};
use log::info;

use crate::scenario::Scenario;

/// Drive a capsule controller through a scripted scene.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Scene to run.
    #[arg(long, value_enum, default_value_t = Scenario::Steps)]
    scenario: Scenario,

    /// Fixed tick rate (Hz).
    #[arg(long, default_value_t = 50.0)]
    hz: f32,

    /// Number of ticks to simulate.
    #[arg(long, default_value_t = 300)]
    ticks: u32,

    /// Controller configuration as JSON. Defaults to a 1.6 m capsule.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<ControllerConfig> {
    let Some(path) = path else {
        return Ok(ControllerConfig::new(CapsuleShape::new(0.5, 0.3)));
    };
    let text = fs::read_to_string(path)
        .with_context(|| format!("reading controller config {}", path.display()))?;
    serde_json::from_str(&text)
        .with_context(|| format!("parsing controller config {}", path.display()))
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    logging::init(args.verbose);

    let config = load_config(args.config.as_ref())?;
    let report = scenario::run(args.scenario, config, args.hz, args.ticks)?;
    info!("{:?} finished", args.scenario);
    println!("{report}");
    Ok(())
}
