mod analysis;
mod budget;
mod difficulty;
mod eval;
mod mcts;
mod profile;
mod search;

pub use analysis::{MoveAnalysis, deep_analysis, quick_analysis};
pub use difficulty::{DIFFICULTIES, DifficultyConfig, MAX_SEARCH_DEPTH};
pub use eval::{
    WIN_SCORE, evaluate, evaluate_advanced, evaluate_basic, evaluate_move_quick, win_probability,
};
pub use profile::{OpponentProfile, SharedProfile, get_adaptive_move};
pub use search::{choose_with_config, expectimax, get_ai_move, get_greedy_move, get_random_move};

use dice_core::{DieValue, GamePhase, GameState, StateError};
use thiserror::Error;

/// Reasons the decision engine refuses to produce a move.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecisionError {
    #[error("malformed game state: {0}")]
    InvalidState(#[from] StateError),
    #[error("a move was requested during the {0} phase")]
    WrongPhase(GamePhase),
    #[error("no die has been rolled")]
    MissingDie,
    #[error("unknown difficulty '{0}'")]
    UnknownDifficulty(String),
    /// Placing phase with a full grid; the rule engine should have ended the
    /// game, so this points at an engine defect rather than bad input.
    #[error("no legal moves while the game is still in progress")]
    NoLegalMoves,
}

impl DecisionError {
    pub fn is_invariant_violation(&self) -> bool {
        matches!(self, DecisionError::NoLegalMoves)
    }
}

/// Shared precondition check: validated state, placing phase, die present and
/// at least one open column.
pub(crate) fn ready_to_place(state: &GameState) -> Result<(DieValue, Vec<usize>), DecisionError> {
    state.validate()?;
    if state.phase() != GamePhase::Placing {
        return Err(DecisionError::WrongPhase(state.phase()));
    }
    let die = state.current_die().ok_or(DecisionError::MissingDie)?;
    let legal = state.legal_moves();
    if legal.is_empty() {
        return Err(DecisionError::NoLegalMoves);
    }
    Ok((die, legal))
}
