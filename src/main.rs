//! Runner for the apiary simulation.
//!
//! Initializes logging, loads and validates the configuration, applies
//! command line overrides and runs the simulation loop.

use std::path::PathBuf;

use apiary::config::ConfigLoader;
use apiary::simulation::SimulationApp;
use clap::Parser;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the simulation configuration file
    #[arg(short, long, default_value = "config.json")]
    config: PathBuf,

    /// Stop after this many ticks (overrides `simulation.max_ticks`)
    #[arg(short, long)]
    ticks: Option<u64>,

    /// RNG seed (overrides `simulation.seed`)
    #[arg(short, long)]
    seed: Option<u64>,
}

/// # Errors
///
/// Returns an error if logging setup fails, or if the configuration file
/// cannot be read, parsed or validated.
fn main() -> Result<(), Box<dyn std::error::Error>> {
    // RUST_LOG wins; otherwise `info` for this crate.
    fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("apiary=info".parse()?))
        .init();

    let args = Args::parse();
    info!("Starting apiary simulation...");

    info!("Loading configuration from {}...", args.config.display());
    let mut config = ConfigLoader::from_file(&args.config)?;
    if let Some(ticks) = args.ticks {
        config.simulation.max_ticks = Some(ticks);
    }
    if let Some(seed) = args.seed {
        config.simulation.seed = Some(seed);
    }

    ConfigLoader::validate(&config)?;
    info!("Configuration validated successfully.");

    let mut app = SimulationApp::new(config);
    info!("Starting simulation run loop...");
    app.run();

    info!(ticks = app.frame(), "Simulation run loop finished.");
    Ok(())
}
