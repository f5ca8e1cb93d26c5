//! Enrolment station operator tool
//!
//! Drives the capture peripherals of an enrolment station from the command
//! line: device panel, connect/disconnect, status, and a full simulated
//! enrolment run.

mod logging;
mod workflow;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use enroll_devices::random::{RandomSource, SeededRandom, SystemRandom};
use enroll_devices::{SessionConfig, SessionManager};
use logging::setup_logging;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "enroll")]
#[command(
    author,
    version,
    about = "Enrolment station - capture peripheral control"
)]
#[command(long_about = "
Controls the simulated capture peripherals of a biometric enrolment station:
document scanner, fingerprint reader, iris scanner and face camera.

EXAMPLES:
    # Show the device panel
    enroll devices

    # Connect the fingerprint reader
    enroll connect PER-002

    # Reproducible enrolment run without simulated latency
    enroll --seed 7 --no-latency enroll --attempts 3
")]
struct Args {
    /// Path to a TOML session configuration
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Seed for the simulation, for reproducible runs
    #[arg(long, value_name = "SEED")]
    seed: Option<u64>,

    /// Skip simulated latency
    #[arg(long)]
    no_latency: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, value_name = "LEVEL", default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List registered devices
    Devices,

    /// Connect a device
    Connect { id: String },

    /// Disconnect a device
    Disconnect { id: String },

    /// Show the status of a device
    Status { id: String },

    /// Connect the station and run a complete enrolment
    Enroll {
        /// Attempts per connection and per capture unit
        #[arg(long, default_value_t = 3)]
        attempts: u32,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    setup_logging(&args.log_level).context("Failed to setup logging")?;

    let mut config = match &args.config {
        Some(path) => SessionConfig::load(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => SessionConfig::default(),
    };
    if args.no_latency {
        config = config.without_latency();
    }

    let random: Arc<dyn RandomSource> = match args.seed {
        Some(seed) => Arc::new(SeededRandom::new(seed)),
        None => Arc::new(SystemRandom::new()),
    };

    let manager = SessionManager::builder()
        .config(config)
        .shared_random_source(random)
        .build()
        .context("Failed to start session manager")?;

    info!("Enrolment station v{}", enroll_core::VERSION);

    match args.command {
        Command::Devices => print_json(&manager.list_devices()),
        Command::Connect { id } => {
            let connected = manager.connect(&id).await;
            print_json(&manager.get_status(&id))?;
            if !connected {
                anyhow::bail!("Could not connect {id}");
            }
            Ok(())
        }
        Command::Disconnect { id } => {
            manager.disconnect(&id).await;
            print_json(&manager.get_status(&id))
        }
        Command::Status { id } => print_json(&manager.get_status(&id)),
        Command::Enroll { attempts } => {
            let report = workflow::run_enrollment(&manager, attempts).await;
            print_json(&report)
        }
    }
}

fn print_json(value: &impl Serialize) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{json}");
    Ok(())
}
