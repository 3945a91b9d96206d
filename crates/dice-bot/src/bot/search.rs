use super::budget::{SearchLimit, Unlimited};
use super::difficulty::DifficultyConfig;
use super::eval::{evaluate, evaluate_move_quick};
use super::{DecisionError, ready_to_place};
use dice_core::{DieValue, GameState, Player};
use rand::Rng;
use rand::seq::SliceRandom;
use tracing::{Level, event};

/// Picks a column for the current player at the named difficulty.
///
/// The randomness roll happens once per call, before any search, and always
/// draws from `rng` (even at randomness `0.0`) so seeded replays stay aligned.
pub fn get_ai_move<R: Rng + ?Sized>(
    state: &GameState,
    difficulty: &str,
    rng: &mut R,
) -> Result<usize, DecisionError> {
    let config = DifficultyConfig::lookup(difficulty)
        .ok_or_else(|| DecisionError::UnknownDifficulty(difficulty.to_string()))?;
    choose_with_config(state, config, rng)
}

pub fn choose_with_config<R: Rng + ?Sized>(
    state: &GameState,
    config: &DifficultyConfig,
    rng: &mut R,
) -> Result<usize, DecisionError> {
    let (_, legal) = ready_to_place(state)?;

    if rng.r#gen::<f64>() < config.randomness {
        let column = *legal.choose(rng).ok_or(DecisionError::NoLegalMoves)?;
        log_decision(state, config, &legal, column, None, "random");
        return Ok(column);
    }

    let (column, value) = expectimax(state, config.depth, config).ok_or(DecisionError::NoLegalMoves)?;
    log_decision(state, config, &legal, column, Some(value), "search");
    Ok(column)
}

/// Column maximizing the immediate quick evaluation; ties go to the lowest index.
pub fn get_greedy_move(state: &GameState) -> Result<usize, DecisionError> {
    ready_to_place(state)?;
    greedy_column(state).ok_or(DecisionError::NoLegalMoves)
}

/// Uniformly random legal column.
pub fn get_random_move<R: Rng + ?Sized>(state: &GameState, rng: &mut R) -> Result<usize, DecisionError> {
    let (_, legal) = ready_to_place(state)?;
    legal.choose(rng).copied().ok_or(DecisionError::NoLegalMoves)
}

/// Fixed-depth expectimax from the current player's point of view.
///
/// Returns the best column and its expected value, or `None` when the state
/// has nothing to place. Each placement (by either player) consumes one unit
/// of depth; chance nodes average over all six faces. Pure: no RNG, no clock.
pub fn expectimax(state: &GameState, depth: u8, config: &DifficultyConfig) -> Option<(usize, f64)> {
    let player = state.current_player();
    select_move(state, depth.max(1), player, config, &mut Unlimited)
}

pub(crate) fn greedy_column(state: &GameState) -> Option<usize> {
    let die = state.current_die()?;
    let player = state.current_player();
    best_by(state.legal_moves(), |column| {
        evaluate_move_quick(state, column, die, player)
    })
}

/// First maximum in iteration order; later candidates must be strictly better.
pub(crate) fn best_by<F>(columns: Vec<usize>, mut score: F) -> Option<usize>
where
    F: FnMut(usize) -> f64,
{
    let mut best: Option<(usize, f64)> = None;
    for column in columns {
        let value = score(column);
        if best.is_none_or(|(_, top)| value > top) {
            best = Some((column, value));
        }
    }
    best.map(|(column, _)| column)
}

/// Max node for `player`, who must be the one placing in `state`.
pub(crate) fn select_move<L: SearchLimit>(
    state: &GameState,
    depth: u8,
    player: Player,
    config: &DifficultyConfig,
    limit: &mut L,
) -> Option<(usize, f64)> {
    let mut best: Option<(usize, f64)> = None;
    for column in state.legal_moves() {
        let Ok(outcome) = state.apply_move(column) else {
            continue;
        };
        let value = value_after_placement(&outcome.state, depth - 1, player, config, limit)?;
        if best.is_none_or(|(_, top)| value > top) {
            best = Some((column, value));
        }
    }
    best
}

/// Value of the position right after a placement. `None` only when `limit`
/// asked to stop part way.
pub(crate) fn value_after_placement<L: SearchLimit>(
    state: &GameState,
    depth: u8,
    player: Player,
    config: &DifficultyConfig,
    limit: &mut L,
) -> Option<f64> {
    limit.tick();
    if state.is_ended() || depth == 0 {
        return Some(evaluate(state, player, config));
    }
    if limit.should_stop() {
        return None;
    }

    let mut total = 0.0;
    for die in DieValue::ALL {
        total += decision_value(&state.with_die(die), depth, player, config, limit)?;
    }
    Some(total / DieValue::ALL.len() as f64)
}

fn decision_value<L: SearchLimit>(
    state: &GameState,
    depth: u8,
    player: Player,
    config: &DifficultyConfig,
    limit: &mut L,
) -> Option<f64> {
    if state.current_player() == player {
        return match select_move(state, depth, player, config, limit) {
            Some((_, value)) => Some(value),
            None if limit.should_stop() => None,
            None => Some(evaluate(state, player, config)),
        };
    }

    let reply = opponent_reply(state, config, limit)?;
    match reply.and_then(|column| state.apply_move(column).ok()) {
        Some(outcome) => value_after_placement(&outcome.state, depth - 1, player, config, limit),
        None => Some(evaluate(state, player, config)),
    }
}

/// The opponent's assumed reply: a one-ply search from their side when
/// modeling is on, the greedy column otherwise.
fn opponent_reply<L: SearchLimit>(
    state: &GameState,
    config: &DifficultyConfig,
    limit: &mut L,
) -> Option<Option<usize>> {
    if !config.model_opponent {
        return Some(greedy_column(state));
    }
    let opponent = state.current_player();
    match select_move(state, 1, opponent, config, limit) {
        Some((column, _)) => Some(Some(column)),
        None if limit.should_stop() => None,
        None => Some(None),
    }
}

fn log_decision(
    state: &GameState,
    config: &DifficultyConfig,
    legal: &[usize],
    chosen: usize,
    value: Option<f64>,
    reason: &str,
) {
    if !tracing::enabled!(Level::DEBUG) {
        return;
    }
    event!(
        target: "dice_bot::decision",
        Level::DEBUG,
        player = %state.current_player(),
        difficulty = config.name,
        turn = state.turn(),
        die = state.current_die().map(DieValue::get).unwrap_or(0),
        legal = ?legal,
        chosen,
        value = value.unwrap_or(f64::NAN),
        reason,
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bot::difficulty::DIFFICULTIES;
    use crate::bot::eval::WIN_SCORE;
    use dice_core::{Column, GamePhase, Grid};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn d(value: u8) -> DieValue {
        DieValue::new(value).unwrap()
    }

    fn col(values: &[u8]) -> Column {
        let dice: Vec<_> = values.iter().map(|&v| d(v)).collect();
        Column::from_dice(&dice).unwrap()
    }

    fn placing(p1: [Column; 3], p2: [Column; 3], die: u8) -> GameState {
        GameState::from_parts(
            Grid::from_columns(p1),
            Grid::from_columns(p2),
            Player::Player1,
            GamePhase::Placing,
            Some(d(die)),
            5,
            None,
        )
        .unwrap()
    }

    struct CountingLimit(u64);

    impl SearchLimit for CountingLimit {
        fn tick(&mut self) {
            self.0 += 1;
        }

        fn should_stop(&self) -> bool {
            false
        }
    }

    #[test]
    fn depth_one_scores_each_move_once() {
        let config = DifficultyConfig {
            model_opponent: false,
            ..DIFFICULTIES[1]
        };
        let state = GameState::new().with_die(d(4));
        let mut counter = CountingLimit(0);
        let best = select_move(&state, 1, Player::Player1, &config, &mut counter);
        assert!(best.is_some());
        assert_eq!(counter.0, 3);
    }

    #[test]
    fn depth_one_basic_search_matches_greedy_on_empty_board() {
        let easy = DIFFICULTIES[0];
        let state = GameState::new().with_die(d(5));
        let (column, value) = expectimax(&state, 1, &easy).unwrap();
        assert_eq!(column, 0);
        assert_eq!(value, 5.0);
        assert_eq!(get_greedy_move(&state), Ok(0));
    }

    #[test]
    fn greedy_prefers_removal_and_breaks_ties_low() {
        let state = placing(
            [Column::EMPTY; 3],
            [Column::EMPTY, Column::EMPTY, col(&[3, 3])],
            3,
        );
        assert_eq!(get_greedy_move(&state), Ok(2));

        let flat = placing([Column::EMPTY; 3], [Column::EMPTY; 3], 2);
        assert_eq!(get_greedy_move(&flat), Ok(0));
    }

    #[test]
    fn finishing_placement_scores_as_a_win() {
        // Column 1 is the last open slot and completing it wins on points.
        let state = placing(
            [col(&[6, 6, 6]), col(&[5, 5]), col(&[4, 4, 4])],
            [col(&[1]), col(&[2]), Column::EMPTY],
            5,
        );
        let hard = DifficultyConfig::lookup("hard").unwrap();
        let (column, value) = expectimax(&state, 3, hard).unwrap();
        assert_eq!(column, 1);
        assert_eq!(value, WIN_SCORE);
    }

    #[test]
    fn ai_move_is_always_legal() {
        let mut rng = StdRng::seed_from_u64(7);
        for name in DifficultyConfig::names().take(3) {
            let mut state = GameState::new();
            while !state.is_ended() {
                state = state.roll_with(&mut rng);
                let column = get_ai_move(&state, name, &mut rng).unwrap();
                assert!(state.is_legal(column), "{name} picked {column}");
                state = state.apply_move(column).unwrap().state;
            }
        }
    }

    #[test]
    fn same_seed_same_choice() {
        let state = GameState::new().with_die(d(3));
        let pick = |seed| {
            let mut rng = StdRng::seed_from_u64(seed);
            get_ai_move(&state, "easy", &mut rng).unwrap()
        };
        assert_eq!(pick(11), pick(11));
    }

    #[test]
    fn rejects_bad_requests() {
        let mut rng = StdRng::seed_from_u64(1);
        let rolling = GameState::new();
        assert_eq!(
            get_ai_move(&rolling, "hard", &mut rng),
            Err(DecisionError::WrongPhase(GamePhase::Rolling))
        );
        let placing = rolling.with_die(d(2));
        assert_eq!(
            get_ai_move(&placing, "nightmare", &mut rng),
            Err(DecisionError::UnknownDifficulty("nightmare".to_string()))
        );
        assert_eq!(
            get_random_move(&rolling, &mut rng),
            Err(DecisionError::WrongPhase(GamePhase::Rolling))
        );
    }

    #[test]
    fn single_open_column_is_forced() {
        let state = placing(
            [col(&[1, 2, 3]), col(&[4, 5, 6]), col(&[1])],
            [Column::EMPTY; 3],
            6,
        );
        let mut rng = StdRng::seed_from_u64(3);
        for name in DifficultyConfig::names() {
            assert_eq!(get_ai_move(&state, name, &mut rng), Ok(2));
        }
    }
}
