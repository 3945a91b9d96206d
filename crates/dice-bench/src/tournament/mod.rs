//! Round-robin tournaments between configured agents.
//!
//! Every unordered pairing plays two legs so both agents get the first seat:
//! the earlier-listed agent opens the first `ceil(games / 2)` games and the
//! later one opens the rest. Each leg is a batch run through
//! [`run_simulation`], with its seed drawn from the tournament seed.

pub mod elo;

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use dice_bot::{Strategy, StrategyParseError};
use dice_core::Winner;
use rand::{RngCore, SeedableRng, rngs::StdRng};
use serde::Serialize;
use thiserror::Error;
use tracing::{Level, event};

use crate::analytics::{AnalyticsCollector, AnalyticsError, AnalyticsSummary};
use crate::config::{BenchConfig, ResolvedOutputs};
use crate::logging::telemetry_dir;
use crate::simulation::{
    GameStatus, MoveRecord, SimulationConfig, SimulationController, SimulationEvent,
    SimulationResult, run_simulation,
};
use crate::stats::SimulationStats;

pub use elo::{ANCHOR_RATING, MAX_RATING_GAP, anchored_ratings, rating_gap};

/// Primary entry point for orchestrating tournaments.
pub struct TournamentRunner {
    config: BenchConfig,
    outputs: ResolvedOutputs,
    agents: Vec<Agent>,
    controller: SimulationController,
}

struct Agent {
    name: String,
    strategy: Strategy,
}

/// One pairing leg, reported while it is being played.
#[derive(Debug)]
pub struct TournamentProgress<'a> {
    pub player1: &'a str,
    pub player2: &'a str,
    /// Zero-based leg number across the whole tournament.
    pub leg: usize,
    pub legs_total: usize,
    pub stats: &'a SimulationStats,
}

/// Summary details returned after a run.
#[derive(Debug)]
pub struct RunSummary {
    pub pairings: usize,
    pub games_played: usize,
    pub rows_written: usize,
    pub failures: usize,
    pub cancelled: bool,
    pub jsonl_path: PathBuf,
    pub summary_path: PathBuf,
    pub plot_path: Option<PathBuf>,
    pub telemetry_path: Option<PathBuf>,
    pub analytics: AnalyticsSummary,
}

struct Leg {
    player1: usize,
    player2: usize,
    games: usize,
}

impl TournamentRunner {
    /// Build a runner from a validated configuration.
    pub fn new(config: BenchConfig, outputs: ResolvedOutputs) -> Result<Self, RunnerError> {
        let agents = config
            .agents
            .iter()
            .map(|agent| {
                agent
                    .parse_strategy()
                    .map(|strategy| Agent {
                        name: agent.name.clone(),
                        strategy,
                    })
                    .map_err(|source| RunnerError::Strategy {
                        agent: agent.name.clone(),
                        source,
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        if agents.len() < 2 {
            return Err(RunnerError::AgentCount {
                found: agents.len(),
            });
        }

        Ok(Self {
            config,
            outputs,
            agents,
            controller: SimulationController::new(),
        })
    }

    /// Handle for stopping the run from another thread. Legs not yet started
    /// are skipped and the artifacts cover whatever finished.
    pub fn controller(&self) -> SimulationController {
        self.controller.clone()
    }

    pub fn run(&self) -> Result<RunSummary, RunnerError> {
        self.run_with_progress(|_| {})
    }

    /// Execute the tournament, streaming one JSONL row per finished game and
    /// calling `on_progress` on every heartbeat and after each leg.
    pub fn run_with_progress<F>(&self, mut on_progress: F) -> Result<RunSummary, RunnerError>
    where
        F: FnMut(&TournamentProgress<'_>),
    {
        ensure_parent(self.outputs.jsonl.parent())?;
        ensure_parent(self.outputs.summary_md.parent())?;

        let mut writer = BufWriter::new(File::create(&self.outputs.jsonl)?);
        let mut rng = StdRng::seed_from_u64(self.config.simulation.seed.unwrap_or(0));
        let mut analytics = AnalyticsCollector::new(
            &self
                .agents
                .iter()
                .map(|agent| (agent.name.clone(), agent.strategy.to_string()))
                .collect::<Vec<_>>(),
        );

        let legs = self.legs();
        let mut rows_written = 0usize;
        let mut games_played = 0usize;
        let mut failures = 0usize;

        for (leg_index, leg) in legs.iter().enumerate() {
            let leg_seed = rng.next_u64();
            if self.controller.is_cancelled() {
                break;
            }

            let home = &self.agents[leg.player1];
            let away = &self.agents[leg.player2];
            let sim_config = SimulationConfig {
                concurrency: self.config.simulation.concurrency,
                seed: leg_seed,
                record_snapshots: self.config.simulation.record_snapshots,
                heartbeat_every: self.config.simulation.heartbeat_every,
                ..SimulationConfig::new(home.strategy.clone(), away.strategy.clone(), leg.games)
            };

            event!(
                target: "dice_bench::tournament",
                Level::INFO,
                run_id = %self.config.run_id,
                leg = leg_index,
                player1 = %home.name,
                player2 = %away.name,
                games = leg.games,
                seed = leg_seed,
                "starting leg"
            );

            let mut sink_error: Option<RunnerError> = None;
            let report = run_simulation(&sim_config, &self.controller, |sim_event| {
                if sink_error.is_some() {
                    return;
                }
                let outcome = match sim_event {
                    SimulationEvent::GameCompleted { result, .. } => {
                        let row = GameLogRow::new(&self.config.run_id, leg_index, home, away, result);
                        write_row(&mut writer, &row).and_then(|()| {
                            analytics
                                .record_game(leg.player1, leg.player2, result)
                                .map_err(RunnerError::from)
                        })
                    }
                    SimulationEvent::GameFailed { .. } => analytics
                        .record_failure(leg.player1, leg.player2)
                        .map_err(RunnerError::from),
                    SimulationEvent::Heartbeat { stats } => {
                        on_progress(&TournamentProgress {
                            player1: &home.name,
                            player2: &away.name,
                            leg: leg_index,
                            legs_total: legs.len(),
                            stats,
                        });
                        Ok(())
                    }
                };
                if let Err(err) = outcome {
                    sink_error = Some(err);
                    self.controller.cancel();
                }
            });
            if let Some(err) = sink_error {
                return Err(err);
            }

            rows_written += report.results.len();
            games_played += report.stats.finished_games();
            failures += report.failures.len();
            on_progress(&TournamentProgress {
                player1: &home.name,
                player2: &away.name,
                leg: leg_index,
                legs_total: legs.len(),
                stats: &report.stats,
            });
        }

        writer.flush()?;

        let cancelled = self.controller.is_cancelled();
        if cancelled {
            event!(
                target: "dice_bench::tournament",
                Level::WARN,
                run_id = %self.config.run_id,
                games_played,
                "tournament cancelled; writing partial results"
            );
        }

        let analytics = analytics.finalize();
        analytics.write_markdown(&self.config.run_id, &self.outputs.summary_md)?;
        let plot_path = match analytics.render_plot(&self.outputs.plots_dir) {
            Ok(path) => Some(path),
            Err(err) => {
                eprintln!("WARN: {}", err);
                None
            }
        };

        let telemetry_path = self
            .config
            .logging
            .enable_structured
            .then(|| telemetry_dir(&self.outputs).join("telemetry.jsonl"));

        Ok(RunSummary {
            pairings: self.agents.len() * (self.agents.len() - 1) / 2,
            games_played,
            rows_written,
            failures,
            cancelled,
            jsonl_path: self.outputs.jsonl.clone(),
            summary_path: self.outputs.summary_md.clone(),
            plot_path,
            telemetry_path,
            analytics,
        })
    }

    fn legs(&self) -> Vec<Leg> {
        let games = self.config.simulation.games;
        let first_leg = games.div_ceil(2);
        let second_leg = games / 2;
        let mut legs = Vec::new();
        for first in 0..self.agents.len() {
            for second in first + 1..self.agents.len() {
                legs.push(Leg {
                    player1: first,
                    player2: second,
                    games: first_leg,
                });
                if second_leg > 0 {
                    legs.push(Leg {
                        player1: second,
                        player2: first,
                        games: second_leg,
                    });
                }
            }
        }
        legs
    }
}

fn ensure_parent(path: Option<&Path>) -> Result<(), RunnerError> {
    if let Some(dir) = path.filter(|dir| !dir.as_os_str().is_empty()) {
        fs::create_dir_all(dir)?;
    }
    Ok(())
}

fn write_row(writer: &mut BufWriter<File>, row: &GameLogRow<'_>) -> Result<(), RunnerError> {
    serde_json::to_writer(&mut *writer, row)?;
    writer.write_all(b"\n")?;
    Ok(())
}

/// One line of the per-game JSONL log.
#[derive(Serialize)]
struct GameLogRow<'a> {
    run_id: &'a str,
    game_key: String,
    leg: usize,
    game_id: usize,
    game_seed: u64,
    player1: &'a str,
    player1_strategy: String,
    player2: &'a str,
    player2_strategy: String,
    status: GameStatus,
    /// Agent name of the winner, `"draw"`, or absent for aborted games.
    #[serde(skip_serializing_if = "Option::is_none")]
    winner: Option<&'a str>,
    score_player1: u32,
    score_player2: u32,
    turns: u32,
    duration_ms: f64,
    ms_per_decision_player1: f64,
    ms_per_decision_player2: f64,
    moves: &'a [MoveRecord],
}

impl<'a> GameLogRow<'a> {
    fn new(
        run_id: &'a str,
        leg: usize,
        home: &'a Agent,
        away: &'a Agent,
        result: &'a SimulationResult,
    ) -> Self {
        let winner = result.winner.map(|winner| match winner {
            Winner::Player1 => home.name.as_str(),
            Winner::Player2 => away.name.as_str(),
            Winner::Draw => "draw",
        });
        Self {
            run_id,
            game_key: format!("L{leg:03}_G{:05}", result.game_id),
            leg,
            game_id: result.game_id,
            game_seed: result.seed,
            player1: &home.name,
            player1_strategy: home.strategy.to_string(),
            player2: &away.name,
            player2_strategy: away.strategy.to_string(),
            status: result.status,
            winner,
            score_player1: result.final_score.player1,
            score_player2: result.final_score.player2,
            turns: result.turns,
            duration_ms: result.duration_ms,
            ms_per_decision_player1: result.decisions[0].avg_ms_per_decision,
            ms_per_decision_player2: result.decisions[1].avg_ms_per_decision,
            moves: &result.moves,
        }
    }
}

#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("invalid strategy for agent '{agent}': {source}")]
    Strategy {
        agent: String,
        #[source]
        source: StrategyParseError,
    },
    #[error("a tournament needs at least 2 agents but found {found}")]
    AgentCount { found: usize },
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
    #[error("failed to serialize log row: {source}")]
    Serialize {
        #[from]
        source: serde_json::Error,
    },
    #[error("analytics error: {0}")]
    Analytics(#[from] AnalyticsError),
}
