use std::path::PathBuf;

use clap::Parser;

use dice_bench::config::{BenchConfig, ResolvedOutputs};
use dice_bench::logging::init_logging;
use dice_bench::tournament::TournamentRunner;

/// Round-robin benchmarking harness for dice duel strategies.
#[derive(Debug, Parser)]
#[command(
    name = "dice-bench",
    author,
    version,
    about = "Seeded dice duel tournament harness"
)]
struct Cli {
    /// Path to the YAML configuration file.
    #[arg(short, long, value_name = "FILE", default_value = "bench/bench.yaml")]
    config: PathBuf,

    /// Override the run identifier (substitutes {run_id} templates).
    #[arg(long, value_name = "RUN_ID")]
    run_id: Option<String>,

    /// Override the number of games per pairing.
    #[arg(long, value_name = "GAMES")]
    games: Option<usize>,

    /// Override the tournament RNG seed.
    #[arg(long, value_name = "SEED")]
    seed: Option<u64>,

    /// Override the number of worker threads per pairing.
    #[arg(long, value_name = "THREADS")]
    concurrency: Option<usize>,

    /// Print a progress line every this many finished games.
    #[arg(long, value_name = "GAMES")]
    heartbeat: Option<usize>,

    /// Exit after validating the configuration (no tournament is run).
    #[arg(long)]
    validate_only: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut config = BenchConfig::from_path(&cli.config)?;

    if let Some(run_id) = cli.run_id {
        config.run_id = run_id;
    }

    if let Some(games) = cli.games {
        config.simulation.games = games;
    }

    if let Some(seed) = cli.seed {
        config.simulation.seed = Some(seed);
    }

    if let Some(concurrency) = cli.concurrency {
        config.simulation.concurrency = concurrency;
    }

    if let Some(heartbeat) = cli.heartbeat {
        config.simulation.heartbeat_every = heartbeat;
    }

    config.validate()?;

    let outputs: ResolvedOutputs = config.resolved_outputs();
    let agent_count = config.agents.len();
    let run_id = config.run_id.clone();
    let games = config.simulation.games;

    println!(
        "Loaded configuration '{run_id}' with {agent_count} agents ({games} games per pairing)"
    );

    let _logging_guard = init_logging(&config.logging, &outputs)?;
    let runner = TournamentRunner::new(config, outputs)?;

    if cli.validate_only {
        println!("Validation-only mode: tournament execution skipped.");
        return Ok(());
    }

    let summary = runner.run_with_progress(|progress| {
        println!(
            "[leg {}/{}] {} vs {}: {}/{} games ({:.0}%), p1 {} / p2 {} / draws {}",
            progress.leg + 1,
            progress.legs_total,
            progress.player1,
            progress.player2,
            progress.stats.finished_games(),
            progress.stats.games_requested,
            progress.stats.progress() * 100.0,
            progress.stats.player1_wins,
            progress.stats.player2_wins,
            progress.stats.draws,
        );
    })?;

    println!(
        "Tournament complete for '{run_id}': {} pairings, {} games, {} rows at {}",
        summary.pairings,
        summary.games_played,
        summary.rows_written,
        summary.jsonl_path.display()
    );
    if summary.failures > 0 {
        println!("{} games failed; see the log for details", summary.failures);
    }
    for agent in &summary.analytics.agents {
        println!(
            "  {:<12} elo {:>6.0}  score {:>5.1}%  {:.2} ms/decision",
            agent.name,
            agent.elo,
            agent.score_rate * 100.0,
            agent.average_ms_per_decision
        );
    }
    println!("Summary table: {}", summary.summary_path.display());
    if let Some(plot_path) = summary.plot_path.as_ref() {
        println!("Score plot: {}", plot_path.display());
    }
    if let Some(telemetry_path) = summary.telemetry_path.as_ref() {
        println!("Telemetry log: {}", telemetry_path.display());
    }

    Ok(())
}
