use std::time::Instant;

use dice_bot::SharedProfile;
use dice_core::{GamePhase, GameSnapshot, Player};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{Level, event};

use super::result::{DecisionMetrics, FinalScore, GameFailure, GameStatus, MoveRecord, SimulationResult};
use super::{SimulationConfig, SimulationController};

/// Placements allowed in one game before it is written off as aborted.
pub const MAX_TURNS: usize = 100;

const GAME_SEED_STRIDE: u64 = 0x9E37_79B9_7F4A_7C15;

pub(crate) enum GameRun {
    Finished(SimulationResult),
    Cancelled,
}

/// Seed for one game. Depends only on the batch seed and the game id, so the
/// same game plays out identically on any worker.
pub fn game_seed(batch_seed: u64, game_id: usize) -> u64 {
    batch_seed.wrapping_add((game_id as u64).wrapping_add(1).wrapping_mul(GAME_SEED_STRIDE))
}

/// Plays one game to the end, the turn cap, or cancellation.
///
/// `profiles[i]` is what seat `i` has learned about its opponent; it is only
/// read or written when that seat plays the adaptive strategy.
pub(crate) fn play_game(
    config: &SimulationConfig,
    game_id: usize,
    controller: &SimulationController,
    profiles: &[SharedProfile; 2],
) -> Result<GameRun, GameFailure> {
    let seed = game_seed(config.seed, game_id);
    let mut rng = StdRng::seed_from_u64(seed);
    let strategies = [&config.player1, &config.player2];
    let mut state = config.initial_state.clone().unwrap_or_default();
    let mut moves = Vec::new();
    let mut metrics = [DecisionMetrics::default(); 2];
    let start = Instant::now();

    let status = loop {
        if state.is_ended() {
            break GameStatus::Completed;
        }
        if moves.len() >= MAX_TURNS {
            break GameStatus::Aborted;
        }
        if controller.is_cancelled() {
            return Ok(GameRun::Cancelled);
        }

        if state.phase() == GamePhase::Rolling {
            state = state.roll_with(&mut rng);
        }
        let mover = state.current_player();
        let strategy = strategies[mover.index()];
        let profile = strategy.is_adaptive().then(|| &profiles[mover.index()]);

        let decision_start = Instant::now();
        let column = strategy
            .choose(&state, &mut rng, profile)
            .map_err(|err| GameFailure {
                game_id,
                seed,
                turn: state.turn(),
                player: mover,
                strategy: strategy.to_string(),
                message: err.to_string(),
                invariant_violation: err.is_invariant_violation(),
            })?;
        let elapsed_ms = metrics[mover.index()].record(decision_start.elapsed());

        let outcome = state.apply_move(column).map_err(|err| GameFailure {
            game_id,
            seed,
            turn: state.turn(),
            player: mover,
            strategy: strategy.to_string(),
            message: format!("illegal column {column}: {err}"),
            invariant_violation: false,
        })?;

        let watcher = mover.opponent();
        if strategies[watcher.index()].is_adaptive() {
            profiles[watcher.index()].lock().observe(&state, &outcome);
        }

        if tracing::enabled!(Level::TRACE) {
            event!(
                target: "dice_bench::move",
                Level::TRACE,
                game_id,
                turn = state.turn(),
                player = mover.as_str(),
                strategy = %strategy,
                die = outcome.die.get(),
                column,
                removed = outcome.removed.len(),
                elapsed_ms,
            );
        }

        moves.push(MoveRecord {
            turn: state.turn(),
            player: mover,
            die: outcome.die,
            column,
            removed: outcome.removed.len(),
            snapshot: config
                .record_snapshots
                .then(|| GameSnapshot::capture(&outcome.state)),
        });
        state = outcome.state;
    };

    for player in Player::BOTH {
        if strategies[player.index()].is_adaptive() && status == GameStatus::Completed {
            profiles[player.index()].lock().end_game();
        }
    }

    let [player1, player2] = state.scores();
    Ok(GameRun::Finished(SimulationResult {
        game_id,
        seed,
        player1: config.player1.to_string(),
        player2: config.player2.to_string(),
        status,
        moves,
        winner: state.winner(),
        turns: state.turn(),
        final_score: FinalScore { player1, player2 },
        final_state: state,
        duration_ms: start.elapsed().as_secs_f64() * 1000.0,
        decisions: metrics.map(DecisionMetrics::finalize),
    }))
}
