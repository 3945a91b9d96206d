use super::state::{GameState, StateError};
use crate::model::die::DieValue;
use crate::model::grid::Grid;
use crate::model::player::{GamePhase, Player, Winner};
use serde::{Deserialize, Serialize};

/// Plain record form of a [`GameState`]: numbers, strings and nulls only, so
/// it can be stored verbatim in a key-value store or sent over the wire.
///
/// Grids encode as three bottom-first columns, e.g. `[[4, 4, null], [], ...]`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GameSnapshot {
    pub player1: Grid,
    pub player2: Grid,
    pub current_player: Player,
    pub phase: GamePhase,
    pub current_die: Option<DieValue>,
    pub turn: u32,
    pub winner: Option<Winner>,
}

impl GameSnapshot {
    pub fn capture(state: &GameState) -> Self {
        GameSnapshot {
            player1: *state.player1_grid(),
            player2: *state.player2_grid(),
            current_player: state.current_player(),
            phase: state.phase(),
            current_die: state.current_die(),
            turn: state.turn(),
            winner: state.winner(),
        }
    }

    pub fn restore(self) -> Result<GameState, StateError> {
        GameState::from_parts(
            self.player1,
            self.player2,
            self.current_player,
            self.phase,
            self.current_die,
            self.turn,
            self.winner,
        )
    }

    pub fn to_json(state: &GameState) -> serde_json::Result<String> {
        let snapshot = Self::capture(state);
        serde_json::to_string_pretty(&snapshot)
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

impl From<GameState> for GameSnapshot {
    fn from(state: GameState) -> Self {
        GameSnapshot::capture(&state)
    }
}
