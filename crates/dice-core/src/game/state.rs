use core::fmt;

use crate::game::serialization::GameSnapshot;
use crate::model::die::DieValue;
use crate::model::grid::{COLUMN_COUNT, Grid};
use crate::model::player::{GamePhase, Player, Winner};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Snapshot of a game. Transitions never mutate in place; each returns a new
/// value so earlier states stay usable for replay and analysis.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "GameSnapshot", into = "GameSnapshot")]
pub struct GameState {
    grids: [Grid; 2],
    current_player: Player,
    phase: GamePhase,
    current_die: Option<DieValue>,
    turn: u32,
    winner: Option<Winner>,
}

pub const STARTING_PLAYER: Player = Player::Player1;

impl GameState {
    pub fn new() -> Self {
        Self {
            grids: [Grid::EMPTY; 2],
            current_player: STARTING_PLAYER,
            phase: GamePhase::Rolling,
            current_die: None,
            turn: 1,
            winner: None,
        }
    }

    /// Assembles a state from raw parts, checking every invariant.
    pub fn from_parts(
        player1: Grid,
        player2: Grid,
        current_player: Player,
        phase: GamePhase,
        current_die: Option<DieValue>,
        turn: u32,
        winner: Option<Winner>,
    ) -> Result<Self, StateError> {
        let state = Self {
            grids: [player1, player2],
            current_player,
            phase,
            current_die,
            turn,
            winner,
        };
        state.validate()?;
        Ok(state)
    }

    pub fn grid(&self, player: Player) -> &Grid {
        &self.grids[player.index()]
    }

    pub fn player1_grid(&self) -> &Grid {
        &self.grids[0]
    }

    pub fn player2_grid(&self) -> &Grid {
        &self.grids[1]
    }

    pub fn current_player(&self) -> Player {
        self.current_player
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn current_die(&self) -> Option<DieValue> {
        self.current_die
    }

    pub fn turn(&self) -> u32 {
        self.turn
    }

    pub fn winner(&self) -> Option<Winner> {
        self.winner
    }

    pub fn is_ended(&self) -> bool {
        matches!(self.phase, GamePhase::Ended)
    }

    pub fn score(&self, player: Player) -> u32 {
        self.grid(player).total()
    }

    /// `[player1, player2]` grid totals.
    pub fn scores(&self) -> [u32; 2] {
        [self.grids[0].total(), self.grids[1].total()]
    }

    /// Rolls with the thread-local generator.
    pub fn roll(&self) -> GameState {
        self.roll_with(&mut rand::thread_rng())
    }

    /// Draws a die uniformly from `1..=6`. Outside the rolling phase the state
    /// is returned unchanged; callers are expected to check the phase first.
    pub fn roll_with<R: Rng + ?Sized>(&self, rng: &mut R) -> GameState {
        if self.phase != GamePhase::Rolling {
            return self.clone();
        }
        self.with_die(DieValue::roll(rng))
    }

    /// Same as a roll that came up `die`. Used by search chance nodes.
    pub fn with_die(&self, die: DieValue) -> GameState {
        if self.phase != GamePhase::Rolling {
            return self.clone();
        }
        let mut next = self.clone();
        next.current_die = Some(die);
        next.phase = GamePhase::Placing;
        next
    }

    /// Columns the active player can still place into, ascending.
    pub fn legal_moves(&self) -> Vec<usize> {
        if self.is_ended() {
            return Vec::new();
        }
        self.grid(self.current_player).open_columns()
    }

    pub fn is_legal(&self, column: usize) -> bool {
        self.phase == GamePhase::Placing
            && self
                .grid(self.current_player)
                .column(column)
                .is_some_and(|c| !c.is_full())
    }

    /// Places the current die for the active player and knocks out every die
    /// of the same face from the opponent's column with the same index.
    pub fn apply_move(&self, column: usize) -> Result<MoveOutcome, MoveError> {
        if self.phase != GamePhase::Placing {
            return Err(MoveError::NotPlacing(self.phase));
        }
        let die = self.current_die.ok_or(MoveError::MissingDie)?;
        if column >= COLUMN_COUNT {
            return Err(MoveError::ColumnOutOfRange(column));
        }

        let mover = self.current_player;
        let opponent = mover.opponent();
        let mut next = self.clone();

        next.grids[mover.index()]
            .column_mut(column)
            .and_then(|c| c.place(die))
            .ok_or(MoveError::ColumnFull(column))?;

        let removed_count = next.grids[opponent.index()]
            .column_mut(column)
            .map(|c| c.remove_value(die))
            .unwrap_or(0);

        next.current_die = None;
        if next.grids.iter().any(Grid::is_full) {
            let [p1, p2] = next.scores();
            next.phase = GamePhase::Ended;
            next.winner = Some(Winner::from_scores(p1, p2));
        } else {
            next.phase = GamePhase::Rolling;
            next.current_player = opponent;
            next.turn += 1;
        }

        Ok(MoveOutcome {
            state: next,
            column,
            die,
            removed: vec![die; removed_count as usize],
        })
    }

    /// Checks the data-model invariants. Transitions preserve them; this is for
    /// states that arrive from outside (decoded snapshots, hand-built positions).
    pub fn validate(&self) -> Result<(), StateError> {
        for player in Player::BOTH {
            for (idx, column) in self.grid(player).columns().iter().enumerate() {
                if !column.is_compact() {
                    return Err(StateError::ColumnGap { player, column: idx });
                }
            }
        }

        if self.turn == 0 {
            return Err(StateError::ZeroTurn);
        }

        match (self.phase, self.current_die) {
            (GamePhase::Placing, None) => return Err(StateError::PlacingWithoutDie),
            (GamePhase::Rolling | GamePhase::Ended, Some(_)) => {
                return Err(StateError::DieOutsidePlacing(self.phase));
            }
            _ => {}
        }

        let any_full = self.grids.iter().any(Grid::is_full);
        match (self.phase, self.winner) {
            (GamePhase::Ended, None) => return Err(StateError::EndedWithoutWinner),
            (GamePhase::Rolling | GamePhase::Placing, Some(_)) => {
                return Err(StateError::WinnerBeforeEnd);
            }
            (GamePhase::Ended, Some(winner)) => {
                if !any_full {
                    return Err(StateError::EndedWithOpenGrids);
                }
                let [p1, p2] = self.scores();
                if winner != Winner::from_scores(p1, p2) {
                    return Err(StateError::WinnerMismatch(winner));
                }
            }
            _ => {
                if any_full {
                    return Err(StateError::FullGridInPlay);
                }
            }
        }

        Ok(())
    }
}

impl Default for GameState {
    fn default() -> Self {
        Self::new()
    }
}

impl TryFrom<GameSnapshot> for GameState {
    type Error = StateError;

    fn try_from(snapshot: GameSnapshot) -> Result<Self, Self::Error> {
        snapshot.restore()
    }
}

/// Result of a successful placement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveOutcome {
    pub state: GameState,
    pub column: usize,
    pub die: DieValue,
    /// Opponent dice knocked out by this placement; all share `die`'s face.
    pub removed: Vec<DieValue>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveError {
    NotPlacing(GamePhase),
    MissingDie,
    ColumnOutOfRange(usize),
    ColumnFull(usize),
}

impl fmt::Display for MoveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MoveError::NotPlacing(phase) => write!(f, "cannot place a die during the {phase} phase"),
            MoveError::MissingDie => f.write_str("no die has been rolled"),
            MoveError::ColumnOutOfRange(column) => write!(f, "column {column} does not exist"),
            MoveError::ColumnFull(column) => write!(f, "column {column} is full"),
        }
    }
}

impl std::error::Error for MoveError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateError {
    ColumnGap { player: Player, column: usize },
    ZeroTurn,
    PlacingWithoutDie,
    DieOutsidePlacing(GamePhase),
    EndedWithoutWinner,
    WinnerBeforeEnd,
    EndedWithOpenGrids,
    FullGridInPlay,
    WinnerMismatch(Winner),
}

impl fmt::Display for StateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StateError::ColumnGap { player, column } => {
                write!(f, "{player} column {column} has an empty slot below a die")
            }
            StateError::ZeroTurn => f.write_str("turn number must be at least 1"),
            StateError::PlacingWithoutDie => f.write_str("placing phase requires a current die"),
            StateError::DieOutsidePlacing(phase) => {
                write!(f, "current die set during the {phase} phase")
            }
            StateError::EndedWithoutWinner => f.write_str("ended game has no winner"),
            StateError::WinnerBeforeEnd => f.write_str("winner set before the game ended"),
            StateError::EndedWithOpenGrids => f.write_str("game ended with no full grid"),
            StateError::FullGridInPlay => f.write_str("a grid is full but the game has not ended"),
            StateError::WinnerMismatch(winner) => {
                write!(f, "recorded winner {winner:?} disagrees with the grid scores")
            }
        }
    }
}

impl std::error::Error for StateError {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::column::Column;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn d(value: u8) -> DieValue {
        DieValue::new(value).unwrap()
    }

    fn place(state: &GameState, die: u8, column: usize) -> MoveOutcome {
        state
            .with_die(d(die))
            .apply_move(column)
            .expect("legal placement")
    }

    #[test]
    fn initial_state_is_empty_and_rolling() {
        let state = GameState::new();
        assert_eq!(state.phase(), GamePhase::Rolling);
        assert_eq!(state.turn(), 1);
        assert_eq!(state.current_player(), Player::Player1);
        assert_eq!(state.current_die(), None);
        assert_eq!(state.winner(), None);
        assert_eq!(state.scores(), [0, 0]);
        state.validate().unwrap();
    }

    #[test]
    fn roll_moves_to_placing_and_leaves_original_untouched() {
        let state = GameState::new();
        let mut rng = StdRng::seed_from_u64(3);
        let rolled = state.roll_with(&mut rng);
        assert_eq!(rolled.phase(), GamePhase::Placing);
        assert!(rolled.current_die().is_some());
        assert_eq!(state.phase(), GamePhase::Rolling);
    }

    #[test]
    fn roll_outside_rolling_phase_is_noop() {
        let placing = GameState::new().with_die(d(2));
        let mut rng = StdRng::seed_from_u64(9);
        assert_eq!(placing.roll_with(&mut rng), placing);
    }

    #[test]
    fn apply_move_requires_placing_phase() {
        let state = GameState::new();
        assert_eq!(
            state.apply_move(0),
            Err(MoveError::NotPlacing(GamePhase::Rolling))
        );
    }

    #[test]
    fn apply_move_rejects_bad_columns() {
        let state = GameState::new().with_die(d(3));
        assert_eq!(state.apply_move(3), Err(MoveError::ColumnOutOfRange(3)));

        let full = Grid::from_columns([
            Column::from_dice(&[d(1), d(2), d(3)]).unwrap(),
            Column::EMPTY,
            Column::EMPTY,
        ]);
        let state = GameState::from_parts(
            full,
            Grid::EMPTY,
            Player::Player1,
            GamePhase::Placing,
            Some(d(4)),
            4,
            None,
        )
        .unwrap();
        assert_eq!(state.apply_move(0), Err(MoveError::ColumnFull(0)));
        assert_eq!(state.legal_moves(), vec![1, 2]);
    }

    #[test]
    fn placement_flips_player_and_advances_turn() {
        let outcome = place(&GameState::new(), 4, 1);
        let next = outcome.state;
        assert_eq!(next.phase(), GamePhase::Rolling);
        assert_eq!(next.current_player(), Player::Player2);
        assert_eq!(next.turn(), 2);
        assert_eq!(next.current_die(), None);
        assert_eq!(next.player1_grid().columns()[1].len(), 1);
        assert!(outcome.removed.is_empty());
    }

    #[test]
    fn triple_in_one_column_scores_thirty_six() {
        let mut state = GameState::new();
        for round in 0..3 {
            state = place(&state, 4, 0).state;
            // Opponent keeps away from column 0 and never rolls a four there.
            state = place(&state, 1 + round as u8, 2).state;
        }
        assert_eq!(state.player1_grid().score().columns[0], 36);
    }

    #[test]
    fn matching_die_knocks_out_opponent_column() {
        let state = place(&GameState::new(), 5, 1).state;
        assert_eq!(state.player1_grid().score().columns[1], 5);

        let outcome = place(&state, 5, 1);
        assert_eq!(outcome.removed, vec![d(5)]);
        assert_eq!(outcome.state.player1_grid().score().columns[1], 0);
        assert_eq!(outcome.state.player2_grid().score().columns[1], 5);
    }

    #[test]
    fn removal_only_touches_the_same_column_index() {
        let state = place(&GameState::new(), 6, 0).state;
        let outcome = place(&state, 6, 2);
        assert!(outcome.removed.is_empty());
        assert_eq!(outcome.state.player1_grid().total(), 6);
    }

    #[test]
    fn filling_a_grid_ends_the_game() {
        let p1 = Grid::from_columns([
            Column::from_dice(&[d(6), d(6), d(6)]).unwrap(),
            Column::from_dice(&[d(2), d(2), d(2)]).unwrap(),
            Column::from_dice(&[d(3), d(3)]).unwrap(),
        ]);
        let p2 = Grid::from_columns([
            Column::from_dice(&[d(1)]).unwrap(),
            Column::EMPTY,
            Column::EMPTY,
        ]);
        let state = GameState::from_parts(
            p1,
            p2,
            Player::Player1,
            GamePhase::Placing,
            Some(d(3)),
            15,
            None,
        )
        .unwrap();
        let outcome = state.apply_move(2).unwrap();
        let ended = outcome.state;
        assert_eq!(ended.phase(), GamePhase::Ended);
        assert_eq!(ended.winner(), Some(Winner::Player1));
        assert_eq!(ended.turn(), 15);
        assert!(ended.legal_moves().is_empty());
        ended.validate().unwrap();
    }

    #[test]
    fn validate_catches_broken_invariants() {
        let mut state = GameState::new();
        state.current_die = Some(d(2));
        assert_eq!(
            state.validate(),
            Err(StateError::DieOutsidePlacing(GamePhase::Rolling))
        );

        let mut state = GameState::new();
        state.phase = GamePhase::Placing;
        assert_eq!(state.validate(), Err(StateError::PlacingWithoutDie));

        let mut state = GameState::new();
        state.winner = Some(Winner::Draw);
        assert_eq!(state.validate(), Err(StateError::WinnerBeforeEnd));

        let mut state = GameState::new();
        state.grids[1] = Grid::from_columns([
            Column::from_slots([None, Some(d(4)), None]),
            Column::EMPTY,
            Column::EMPTY,
        ]);
        assert_eq!(
            state.validate(),
            Err(StateError::ColumnGap {
                player: Player::Player2,
                column: 0
            })
        );
    }
}
