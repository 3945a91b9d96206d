//! Free-function facade over [`GameState`] for collaborators that prefer the
//! flat call style (request handlers, the relay layer).

pub mod serialization;
pub mod state;

use crate::model::grid::{Grid, GridScore};
use state::{GameState, MoveError, MoveOutcome};

pub fn create_initial_state() -> GameState {
    GameState::new()
}

pub fn roll_die(state: &GameState) -> GameState {
    state.roll()
}

pub fn get_legal_moves(state: &GameState) -> Vec<usize> {
    state.legal_moves()
}

pub fn apply_move(state: &GameState, column: usize) -> Result<MoveOutcome, MoveError> {
    state.apply_move(column)
}

pub fn calculate_grid_score(grid: &Grid) -> GridScore {
    grid.score()
}
