//! Batch self-play: a bounded pool of worker threads plays independent games
//! and a single coordinator folds their results into [`SimulationStats`].

mod game;
mod result;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::mpsc;
use std::thread;

use dice_bot::{OpponentProfile, SharedProfile, Strategy};
use dice_core::GameState;
use tracing::{Level, event};

use crate::stats::SimulationStats;
use game::{GameRun, play_game};

pub use game::{MAX_TURNS, game_seed};
pub use result::{
    DecisionSummary, FinalScore, GameFailure, GameStatus, MoveRecord, SimulationResult,
};

/// Cooperative cancellation flag shared by everyone driving one batch.
/// Workers check it before each game and before each move; a search already
/// in progress is not interrupted.
#[derive(Debug, Clone, Default)]
pub struct SimulationController {
    cancelled: Arc<AtomicBool>,
}

impl SimulationController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone)]
pub struct SimulationConfig {
    pub player1: Strategy,
    pub player2: Strategy,
    pub num_games: usize,
    /// Worker threads; clamped to `1..=num_games`.
    pub concurrency: usize,
    pub seed: u64,
    pub record_snapshots: bool,
    /// Heartbeat after every this many finished games; `0` disables.
    pub heartbeat_every: usize,
    /// Starting position for every game instead of a fresh board.
    pub initial_state: Option<GameState>,
}

impl SimulationConfig {
    pub fn new(player1: Strategy, player2: Strategy, num_games: usize) -> Self {
        Self {
            player1,
            player2,
            num_games,
            concurrency: 1,
            seed: 0,
            record_snapshots: false,
            heartbeat_every: 0,
            initial_state: None,
        }
    }
}

/// Progress notifications, delivered in completion order on the calling thread.
#[derive(Debug)]
pub enum SimulationEvent<'a> {
    GameCompleted {
        stats: &'a SimulationStats,
        result: &'a SimulationResult,
    },
    GameFailed {
        stats: &'a SimulationStats,
        failure: &'a GameFailure,
    },
    Heartbeat {
        stats: &'a SimulationStats,
    },
}

#[derive(Debug, Clone)]
pub struct SimulationReport {
    /// Finished games (completed and aborted), ordered by game id.
    pub results: Vec<SimulationResult>,
    pub failures: Vec<GameFailure>,
    pub stats: SimulationStats,
    pub cancelled: bool,
}

enum WorkerMessage {
    Finished(Box<SimulationResult>),
    Failed(GameFailure),
}

/// Plays `config.num_games` games and blocks until they are done or the
/// controller is cancelled.
///
/// Each game draws from its own RNG seeded by [`game_seed`], so for
/// deterministic strategies the per-game results do not depend on
/// `concurrency`. Once the controller is cancelled no further game is
/// recorded or reported, including games that finished but were still
/// queued for the coordinator.
pub fn run_simulation<F>(
    config: &SimulationConfig,
    controller: &SimulationController,
    mut on_progress: F,
) -> SimulationReport
where
    F: FnMut(SimulationEvent<'_>),
{
    let workers = config.concurrency.clamp(1, config.num_games.max(1));
    let next_game = AtomicUsize::new(0);
    let profiles: [SharedProfile; 2] = [OpponentProfile::shared(), OpponentProfile::shared()];
    let mut stats = SimulationStats::new(config.num_games);
    let mut results = Vec::new();
    let mut failures = Vec::new();

    thread::scope(|scope| {
        // At most one finished game per worker waits for the coordinator.
        let (tx, rx) = mpsc::sync_channel(workers);
        for _ in 0..workers {
            let tx = tx.clone();
            let next_game = &next_game;
            let profiles = &profiles;
            scope.spawn(move || {
                while !controller.is_cancelled() {
                    let game_id = next_game.fetch_add(1, Ordering::Relaxed);
                    if game_id >= config.num_games {
                        break;
                    }
                    let message = match play_game(config, game_id, controller, profiles) {
                        Ok(GameRun::Finished(result)) => WorkerMessage::Finished(Box::new(result)),
                        Ok(GameRun::Cancelled) => break,
                        Err(failure) => WorkerMessage::Failed(failure),
                    };
                    if tx.send(message).is_err() {
                        break;
                    }
                }
            });
        }
        drop(tx);

        // Leaving the loop drops `rx`, which unblocks any worker stuck in `send`.
        for message in rx {
            if controller.is_cancelled() {
                break;
            }
            match message {
                WorkerMessage::Finished(result) => {
                    stats.record_result(&result);
                    log_game(&result, &stats);
                    on_progress(SimulationEvent::GameCompleted {
                        stats: &stats,
                        result: &result,
                    });
                    results.push(*result);
                }
                WorkerMessage::Failed(failure) => {
                    stats.record_failure();
                    tracing::warn!(
                        target: "dice_bench::simulation",
                        game_id = failure.game_id,
                        player = failure.player.as_str(),
                        strategy = %failure.strategy,
                        invariant_violation = failure.invariant_violation,
                        "game failed: {}",
                        failure.message
                    );
                    on_progress(SimulationEvent::GameFailed {
                        stats: &stats,
                        failure: &failure,
                    });
                    failures.push(failure);
                }
            }
            if controller.is_cancelled() {
                break;
            }
            if config.heartbeat_every > 0 && stats.finished_games() % config.heartbeat_every == 0 {
                on_progress(SimulationEvent::Heartbeat { stats: &stats });
            }
        }
    });

    results.sort_by_key(|result| result.game_id);
    failures.sort_by_key(|failure| failure.game_id);

    SimulationReport {
        results,
        failures,
        stats,
        cancelled: controller.is_cancelled(),
    }
}

fn log_game(result: &SimulationResult, stats: &SimulationStats) {
    if !tracing::enabled!(Level::INFO) {
        return;
    }
    let winner = result.winner.map(|w| format!("{w:?}")).unwrap_or_default();
    event!(
        target: "dice_bench::simulation",
        Level::INFO,
        game_id = result.game_id,
        seed = result.seed,
        player1 = %result.player1,
        player2 = %result.player2,
        status = ?result.status,
        winner = %winner,
        score_player1 = result.final_score.player1,
        score_player2 = result.final_score.player2,
        turns = result.turns,
        duration_ms = result.duration_ms,
        finished = stats.finished_games(),
        requested = stats.games_requested,
    );
}
