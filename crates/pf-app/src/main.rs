//! `portfolio-sim`: replay a visitor session against the headless page
//!
//! Usage: `portfolio-sim [scenario.json]`. Without an argument the bundled
//! portfolio scenario runs. Recorded snapshots are printed as JSON on
//! stdout; logging goes to stderr and follows `RUST_LOG`.

use std::path::PathBuf;

use anyhow::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod scenario;
mod simulation;

use scenario::{Scenario, DEFAULT_SCENARIO};
use simulation::Simulation;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let scenario = match std::env::args_os().nth(1).map(PathBuf::from) {
        Some(path) => {
            info!(path = %path.display(), "loading scenario");
            Scenario::load(&path)?
        }
        None => {
            info!("no scenario given, replaying the bundled portfolio session");
            Scenario::from_json(DEFAULT_SCENARIO)?
        }
    };

    let simulation = Simulation::new(&scenario)?;
    let snapshots = simulation.run(&scenario.steps)?;
    info!(steps = scenario.steps.len(), snapshots = snapshots.len(), "session replayed");

    println!("{}", serde_json::to_string_pretty(&snapshots)?);
    Ok(())
}
