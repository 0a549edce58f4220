//! Main Entrypoint for the Classroom Simulator
//!
//! This binary is responsible for:
//! 1. Loading configuration from the environment and the command line.
//! 2. Loading the classroom seed data.
//! 3. Building the text oracle.
//! 4. Running one simulation, printing the transcript to stdout.
//! 5. Optionally writing a JSON summary of the run.

use anyhow::Context;
use clap::Parser;
use classroom_core::{TurnEngine, WriterTranscript};
use classroom_simulator::{classroom, config::Config, oracle::build_oracle};
use std::{fs::File, io, path::PathBuf};
use tracing::{error, info};

/// Simulates a classroom dialogue between language-model students and a teacher.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Number of rounds to simulate (overrides SIMULATION_ROUNDS).
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    rounds: Option<u32>,

    /// JSON classroom file (overrides CLASSROOM_PATH).
    #[arg(long)]
    classroom: Option<PathBuf>,

    /// Seed for the moderator's random fallback (overrides SIMULATION_SEED).
    #[arg(long)]
    seed: Option<u64>,

    /// Write a JSON summary of the finished run to this path.
    #[arg(long)]
    summary: Option<PathBuf>,

    /// Use canned replies instead of calling a model provider.
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // --- 1. Load Configuration ---
    let mut config = Config::from_env().context("Failed to load configuration")?;
    if let Some(rounds) = args.rounds {
        config.rounds = rounds;
    }
    if let Some(path) = args.classroom {
        config.classroom_path = Some(path);
    }
    if let Some(seed) = args.seed {
        config.seed = Some(seed);
    }

    // --- 2. Initialize Logging ---
    tracing_subscriber::fmt()
        .with_max_level(config.log_level)
        .with_timer(tracing_subscriber::fmt::time::ChronoLocal::rfc_3339())
        .with_writer(io::stderr)
        .init();
    info!("Configuration loaded. Preparing the classroom...");

    // --- 3. Load the Classroom ---
    let classroom = classroom::load(config.classroom_path.as_deref())
        .context("Failed to load classroom")?;
    info!(
        students = classroom.students.len(),
        rounds = config.rounds,
        "Classroom ready."
    );

    // --- 4. Build the Oracle ---
    let oracle = build_oracle(&config, args.dry_run).context("Failed to build the text oracle")?;

    // --- 5. Run the Simulation ---
    let mut engine = TurnEngine::new(oracle, WriterTranscript::new(io::stdout()));
    if let Some(seed) = config.seed {
        engine = engine.with_seed(seed);
    }
    let state = match engine.run(classroom, config.rounds).await {
        Ok(state) => state,
        Err(e) => {
            error!(error = ?e, "Simulation aborted.");
            return Err(e).context("Simulation aborted");
        }
    };

    // --- 6. Write the Summary ---
    if let Some(path) = args.summary {
        let file = File::create(&path)
            .with_context(|| format!("Failed to create summary file {}", path.display()))?;
        serde_json::to_writer_pretty(file, &state.summary()).context("Failed to write summary")?;
        info!(path = %path.display(), "Summary written.");
    }

    println!("Simulation completed.");
    info!("Simulation completed.");
    Ok(())
}
