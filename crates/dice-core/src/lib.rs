#![deny(warnings)]
pub mod game;
pub mod model;

pub use game::serialization::GameSnapshot;
pub use game::state::{GameState, MoveError, MoveOutcome, StateError};
pub use game::{apply_move, calculate_grid_score, create_initial_state, get_legal_moves, roll_die};
pub use model::column::Column;
pub use model::die::DieValue;
pub use model::grid::{Grid, GridScore};
pub use model::player::{GamePhase, Player, Winner};
