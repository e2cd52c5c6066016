use std::path::PathBuf;

use clap::Parser;

use gunzi_bench::config::BenchConfig;
use gunzi_bench::logging::init_logging;
use gunzi_bench::runner::MatchRunner;

/// Headless match driver for Da Gunzi computer players.
#[derive(Debug, Parser)]
#[command(
    name = "gunzi-bench",
    author,
    version,
    about = "Deterministic Da Gunzi match harness"
)]
struct Cli {
    /// Path to the YAML configuration file.
    #[arg(short, long, value_name = "FILE", default_value = "bench/bench.yaml")]
    config: PathBuf,

    /// Override the number of rounds to play.
    #[arg(long, value_name = "ROUNDS")]
    rounds: Option<usize>,

    /// Override the RNG seed for dealing and search.
    #[arg(long, value_name = "SEED")]
    seed: Option<u64>,

    /// Exit after validating the configuration (no rounds are played).
    #[arg(long)]
    validate_only: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut config = BenchConfig::from_path(&cli.config)?;

    if let Some(rounds) = cli.rounds {
        config.matches.rounds = rounds;
    }
    if let Some(seed) = cli.seed {
        config.matches.seed = seed;
    }
    config.validate()?;

    let outputs = config.resolved_outputs();
    let run_id = config.run_id.clone();
    let seats = config
        .seats
        .iter()
        .map(|seat| format!("{}={}", seat.name, seat.difficulty))
        .collect::<Vec<_>>()
        .join(", ");
    println!(
        "Loaded configuration '{run_id}': {} rounds on {:?}, seats [{seats}]",
        config.matches.rounds, config.table
    );

    let logging_guard = init_logging(&config.logging, &outputs, &run_id)?;
    let runner = MatchRunner::new(config, outputs)?;

    if cli.validate_only {
        println!("Validation-only mode: no rounds played.");
        return Ok(());
    }

    let summary = runner.run()?;
    println!(
        "Run '{run_id}' complete: {} rounds, {} rows at {}",
        summary.rounds_played,
        summary.rows_written,
        summary.jsonl_path.display()
    );
    println!(
        "Declarer wins: {}/{}; matches won NS={} EW={}; levels NS={} EW={}",
        summary.declarer_wins,
        summary.rounds_played,
        summary.matches_won[0],
        summary.matches_won[1],
        summary.final_levels[0],
        summary.final_levels[1]
    );
    if let Some(guard) = logging_guard.as_ref() {
        println!("Trace log: {}", guard.log_path.display());
    }

    Ok(())
}
