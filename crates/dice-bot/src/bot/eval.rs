use super::difficulty::DifficultyConfig;
use dice_core::model::grid::{COLUMN_COUNT, GRID_SLOTS, placement_gain, removal_loss};
use dice_core::{Column, DieValue, GameState, Player, Winner};

/// Value of a decided game. Heuristic scores stay far below this.
pub const WIN_SCORE: f64 = 10_000.0;

const COMBO_WEIGHT: f64 = 0.5;
const COMBO_DECAY: f64 = 0.5;
const VULNERABILITY_WEIGHT: f64 = 0.5;
const CONTROL_WEIGHT: f64 = 0.25;
const LOCKED_BONUS: f64 = 2.0;
const ATTACK_DECAY: f64 = 0.3;
const WIN_PROBABILITY_SCALE: f64 = 20.0;

/// Score difference from `player`'s point of view.
pub fn evaluate_basic(state: &GameState, player: Player) -> f64 {
    let own = f64::from(state.score(player));
    let opp = f64::from(state.score(player.opponent()));
    own - opp
}

/// Weighted score difference plus positional terms. Ended games collapse to
/// `±WIN_SCORE` (or `0.0` for a draw).
pub fn evaluate_advanced(state: &GameState, player: Player, config: &DifficultyConfig) -> f64 {
    if let Some(winner) = state.winner() {
        return terminal_value(winner, player);
    }

    let own = state.grid(player);
    let opp = state.grid(player.opponent());
    let progress = own.filled_slots() as f64 / GRID_SLOTS as f64;

    let mut positional = 0.0;
    for column in 0..COLUMN_COUNT {
        let mine = &own.columns()[column];
        let theirs = &opp.columns()[column];

        positional += combo_potential(mine, progress);
        positional += control_bonus(mine, theirs);

        if !theirs.is_full() {
            let exposed: f64 = mine.dice().map(|d| f64::from(d.points())).sum();
            positional -= exposed * VULNERABILITY_WEIGHT * progress * config.defense_weight;
        }

        if !mine.is_full() && !theirs.is_full() {
            let expected_loss: f64 = DieValue::ALL
                .iter()
                .map(|&die| f64::from(removal_loss(opp, column, die)))
                .sum::<f64>()
                / DieValue::ALL.len() as f64;
            positional += expected_loss * config.offense_weight * (1.0 - progress * ATTACK_DECAY);
        }
    }

    evaluate_basic(state, player) * config.offense_weight + positional
}

/// Dispatches on `config.advanced_eval`. Terminal states always score
/// `±WIN_SCORE` so search prefers certain wins over any heuristic lead.
pub fn evaluate(state: &GameState, player: Player, config: &DifficultyConfig) -> f64 {
    if config.advanced_eval {
        return evaluate_advanced(state, player, config);
    }
    match state.winner() {
        Some(winner) => terminal_value(winner, player),
        None => evaluate_basic(state, player),
    }
}

/// Immediate effect of placing `die` in `column` for `player`: points gained on
/// their grid plus points knocked off the opponent's.
pub fn evaluate_move_quick(state: &GameState, column: usize, die: DieValue, player: Player) -> f64 {
    let gain = placement_gain(state.grid(player), column, die);
    let loss = removal_loss(state.grid(player.opponent()), column, die);
    f64::from(gain) + f64::from(loss)
}

/// Squashes an evaluation into `[0, 1]` for display.
pub fn win_probability(value: f64) -> f64 {
    if value >= WIN_SCORE {
        1.0
    } else if value <= -WIN_SCORE {
        0.0
    } else {
        1.0 / (1.0 + (-value / WIN_PROBABILITY_SCALE).exp())
    }
}

fn terminal_value(winner: Winner, player: Player) -> f64 {
    match winner.player() {
        Some(p) if p == player => WIN_SCORE,
        Some(_) => -WIN_SCORE,
        None => 0.0,
    }
}

fn combo_potential(column: &Column, progress: f64) -> f64 {
    if column.is_full() || column.is_empty() {
        return 0.0;
    }
    let empty = column.empty_slots() as f64;
    distinct_faces(column)
        .filter_map(|die| {
            let count = column.count_of(die);
            (count >= 2).then(|| f64::from(die.points()) * f64::from(count) * empty)
        })
        .sum::<f64>()
        * COMBO_WEIGHT
        * (1.0 - progress * COMBO_DECAY)
}

fn control_bonus(mine: &Column, theirs: &Column) -> f64 {
    let locked = theirs.is_full();
    distinct_faces(mine)
        .filter(|&die| locked || !theirs.contains(die))
        .map(|die| {
            let held = f64::from(die.points()) * f64::from(mine.count_of(die)) * CONTROL_WEIGHT;
            if locked { held * LOCKED_BONUS } else { held }
        })
        .sum()
}

fn distinct_faces(column: &Column) -> impl Iterator<Item = DieValue> + '_ {
    DieValue::ALL.into_iter().filter(|&die| column.contains(die))
}
