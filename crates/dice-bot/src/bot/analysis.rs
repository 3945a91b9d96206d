use super::budget::Budget;
use super::difficulty::{DifficultyConfig, MAX_SEARCH_DEPTH};
use super::eval::{evaluate, evaluate_move_quick, win_probability};
use super::mcts::{Tree, VALUE_SCALE};
use super::search::value_after_placement;
use super::{DecisionError, ready_to_place};
use dice_core::GameState;
use rand::Rng;
use tracing::{Level, event};

/// Settings shared by both analysis modes: full-strength evaluation, modeled
/// opponent, no randomness.
const ANALYSIS_CONFIG: DifficultyConfig = DifficultyConfig {
    name: "analysis",
    depth: MAX_SEARCH_DEPTH,
    randomness: 0.0,
    model_opponent: true,
    offense_weight: 1.0,
    defense_weight: 0.5,
    advanced_eval: true,
};

/// Advisory estimate for one candidate column.
#[derive(Debug, Clone, PartialEq)]
pub struct MoveAnalysis {
    pub column: usize,
    /// Evaluation of the column from the mover's point of view.
    pub expected_value: f64,
    pub win_probability: f64,
    /// Points gained plus points removed by the placement itself.
    pub immediate_gain: f64,
    /// Deepest completed search depth behind `expected_value`.
    pub depth: u8,
    /// Tree-search passes through this column; zero for expectimax analysis.
    pub visits: u32,
}

impl MoveAnalysis {
    /// Column an advisor would suggest: most visited when a tree search ran,
    /// otherwise highest expected value. Ties go to the lower column.
    pub fn recommended(entries: &[MoveAnalysis]) -> Option<usize> {
        let searched = entries.iter().any(|entry| entry.visits > 0);
        let mut best: Option<&MoveAnalysis> = None;
        for entry in entries {
            let better = match best {
                None => true,
                Some(top) if searched => entry.visits > top.visits,
                Some(top) => entry.expected_value > top.expected_value,
            };
            if better {
                best = Some(entry);
            }
        }
        best.map(|entry| entry.column)
    }
}

/// Iterative-deepening expectimax under a wall-clock budget.
///
/// Every legal column gets a single-ply estimate before the clock is
/// consulted, so an exhausted budget still yields a complete list. Deeper
/// results replace the estimates only once a depth has finished for every
/// column.
pub fn quick_analysis(state: &GameState, budget_ms: u64) -> Result<Vec<MoveAnalysis>, DecisionError> {
    let mut budget = Budget::new(budget_ms);
    deepen(state, &mut budget)
}

/// Monte-Carlo tree search under a wall-clock budget. Results are seeded the
/// same way as [`quick_analysis`]; columns the search reached are overwritten
/// with their mean outcome.
pub fn deep_analysis<R: Rng + ?Sized>(
    state: &GameState,
    budget_ms: u64,
    rng: &mut R,
) -> Result<Vec<MoveAnalysis>, DecisionError> {
    let mut budget = Budget::new(budget_ms);
    sample(state, &mut budget, rng)
}

fn seed_entries(state: &GameState) -> Result<(Vec<MoveAnalysis>, Vec<GameState>), DecisionError> {
    let (die, legal) = ready_to_place(state)?;
    let player = state.current_player();
    let mut entries = Vec::with_capacity(legal.len());
    let mut children = Vec::with_capacity(legal.len());
    for column in legal {
        let Ok(outcome) = state.apply_move(column) else {
            continue;
        };
        let value = evaluate(&outcome.state, player, &ANALYSIS_CONFIG);
        entries.push(MoveAnalysis {
            column,
            expected_value: value,
            win_probability: win_probability(value),
            immediate_gain: evaluate_move_quick(state, column, die, player),
            depth: 1,
            visits: 0,
        });
        children.push(outcome.state);
    }
    if entries.is_empty() {
        return Err(DecisionError::NoLegalMoves);
    }
    Ok((entries, children))
}

pub(crate) fn deepen(state: &GameState, budget: &mut Budget) -> Result<Vec<MoveAnalysis>, DecisionError> {
    let (mut entries, children) = seed_entries(state)?;
    let player = state.current_player();

    'deepen: for depth in 2..=MAX_SEARCH_DEPTH {
        if budget.timed_out() {
            break;
        }
        let mut values = Vec::with_capacity(children.len());
        for child in &children {
            match value_after_placement(child, depth - 1, player, &ANALYSIS_CONFIG, budget) {
                Some(value) => values.push(value),
                None => break 'deepen,
            }
        }
        for (entry, value) in entries.iter_mut().zip(values) {
            entry.expected_value = value;
            entry.win_probability = win_probability(value);
            entry.depth = depth;
        }
    }

    log_analysis("quick", &entries, budget);
    Ok(entries)
}

pub(crate) fn sample<R: Rng + ?Sized>(
    state: &GameState,
    budget: &mut Budget,
    rng: &mut R,
) -> Result<Vec<MoveAnalysis>, DecisionError> {
    let (mut entries, _) = seed_entries(state)?;
    let mut tree = Tree::new(state, &ANALYSIS_CONFIG);
    tree.run(state, budget, rng);

    for (entry, edge) in entries.iter_mut().zip(&tree.root.children) {
        let Some(mean) = edge.node.mean() else {
            continue;
        };
        entry.expected_value = mean * VALUE_SCALE;
        entry.win_probability = ((mean + 1.0) / 2.0).clamp(0.0, 1.0);
        entry.depth = entry.depth.max(edge.node.depth().saturating_add(1));
        entry.visits = edge.node.visits;
    }

    log_analysis("deep", &entries, budget);
    Ok(entries)
}

fn log_analysis(mode: &str, entries: &[MoveAnalysis], budget: &Budget) {
    if !tracing::enabled!(Level::DEBUG) {
        return;
    }
    let depth = entries.iter().map(|entry| entry.depth).max().unwrap_or(0);
    event!(
        target: "dice_bot::decision",
        Level::DEBUG,
        mode,
        columns = entries.len(),
        depth,
        recommended = ?MoveAnalysis::recommended(entries),
        nodes = budget.steps(),
        elapsed_ms = budget.elapsed().as_millis() as u64,
        budget_used_pct = budget.utilization_percent(),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use dice_core::{Column, DieValue, GamePhase, Grid, Player};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn d(value: u8) -> DieValue {
        DieValue::new(value).unwrap()
    }

    fn opening(die: u8) -> GameState {
        GameState::new().with_die(d(die))
    }

    #[test]
    fn zero_budget_still_covers_every_column() {
        let state = opening(3);
        let quick = quick_analysis(&state, 0).unwrap();
        assert_eq!(quick.iter().map(|e| e.column).collect::<Vec<_>>(), vec![0, 1, 2]);
        assert!(quick.iter().all(|e| e.depth == 1));

        let mut rng = StdRng::seed_from_u64(2);
        let deep = deep_analysis(&state, 0, &mut rng).unwrap();
        assert_eq!(deep.len(), 3);
        assert!(deep.iter().all(|e| e.visits == 0));
    }

    #[test]
    fn node_cap_stops_deepening_part_way() {
        let state = opening(6);
        let mut shallow = Budget::with_step_cap(10);
        let partial = deepen(&state, &mut shallow).unwrap();
        assert_eq!(partial.len(), 3);
        assert!(partial.iter().all(|e| e.depth == 1));

        let mut roomy = Budget::with_step_cap(5_000);
        let deeper = deepen(&state, &mut roomy).unwrap();
        assert!(deeper.iter().all(|e| e.depth >= 2));
        let depth = deeper[0].depth;
        assert!(deeper.iter().all(|e| e.depth == depth));
    }

    #[test]
    fn capped_tree_search_reports_visits() {
        let state = opening(5);
        let mut budget = Budget::with_step_cap(90);
        let mut rng = StdRng::seed_from_u64(17);
        let entries = sample(&state, &mut budget, &mut rng).unwrap();
        assert_eq!(entries.iter().map(|e| e.visits).sum::<u32>(), 90);
        assert!(entries.iter().all(|e| (0.0..=1.0).contains(&e.win_probability)));
        assert!(MoveAnalysis::recommended(&entries).is_some());
    }

    #[test]
    fn immediate_gain_counts_removals() {
        let p2 = Grid::from_columns([
            Column::EMPTY,
            Column::from_dice(&[d(2), d(2)]).unwrap(),
            Column::EMPTY,
        ]);
        let state = GameState::from_parts(
            Grid::EMPTY,
            p2,
            Player::Player1,
            GamePhase::Placing,
            Some(d(2)),
            3,
            None,
        )
        .unwrap();
        let entries = quick_analysis(&state, 0).unwrap();
        assert_eq!(entries[0].immediate_gain, 2.0);
        assert_eq!(entries[1].immediate_gain, 10.0);
    }

    #[test]
    fn rolling_state_is_rejected() {
        let rolling = GameState::new();
        assert_eq!(
            quick_analysis(&rolling, 10),
            Err(DecisionError::WrongPhase(GamePhase::Rolling))
        );
    }

    #[test]
    fn recommended_prefers_value_without_visits() {
        let entry = |column, expected_value| MoveAnalysis {
            column,
            expected_value,
            win_probability: 0.5,
            immediate_gain: 0.0,
            depth: 1,
            visits: 0,
        };
        let entries = [entry(0, 1.0), entry(1, 3.0), entry(2, 3.0)];
        assert_eq!(MoveAnalysis::recommended(&entries), Some(1));
    }
}
