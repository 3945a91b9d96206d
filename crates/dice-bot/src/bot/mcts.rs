use super::budget::{Budget, SearchLimit};
use super::difficulty::DifficultyConfig;
use super::eval::evaluate_advanced;
use dice_core::{GamePhase, GameState, Player};
use rand::Rng;

const C_PUCT: f64 = 1.5;
/// Evaluations are divided by this before clamping into `[-1, 1]`.
pub(crate) const VALUE_SCALE: f64 = 200.0;
pub(crate) const MAX_ITERATIONS: u32 = 50_000;

#[derive(Debug, Default)]
pub(crate) struct Node {
    pub(crate) visits: u32,
    pub(crate) value_sum: f64,
    pub(crate) children: Vec<Edge>,
}

#[derive(Debug)]
pub(crate) struct Edge {
    pub(crate) column: usize,
    pub(crate) node: Node,
}

impl Node {
    pub(crate) fn mean(&self) -> Option<f64> {
        (self.visits > 0).then(|| self.value_sum / f64::from(self.visits))
    }

    pub(crate) fn depth(&self) -> u8 {
        self.children
            .iter()
            .filter(|edge| edge.node.visits > 0)
            .map(|edge| edge.node.depth().saturating_add(1))
            .max()
            .unwrap_or(0)
    }

    fn record(&mut self, value: f64) {
        self.visits += 1;
        self.value_sum += value;
    }
}

/// Open-loop tree: edges are columns, dice are re-sampled on every pass, so a
/// node's statistics average over the rolls that led to it.
pub(crate) struct Tree<'a> {
    pub(crate) root: Node,
    player: Player,
    config: &'a DifficultyConfig,
}

impl<'a> Tree<'a> {
    pub(crate) fn new(state: &GameState, config: &'a DifficultyConfig) -> Self {
        Self {
            root: Node {
                children: expand(state),
                ..Node::default()
            },
            player: state.current_player(),
            config,
        }
    }

    /// Runs passes until the budget or the iteration cap is spent. Returns the
    /// number of completed passes.
    pub(crate) fn run<R: Rng + ?Sized>(&mut self, state: &GameState, budget: &mut Budget, rng: &mut R) -> u32 {
        let mut iterations = 0;
        while iterations < MAX_ITERATIONS && !budget.should_stop() {
            let (player, config) = (self.player, self.config);
            descend(&mut self.root, state, player, config, rng);
            budget.tick();
            iterations += 1;
        }
        iterations
    }
}

fn descend<R: Rng + ?Sized>(
    node: &mut Node,
    state: &GameState,
    player: Player,
    config: &DifficultyConfig,
    rng: &mut R,
) -> f64 {
    let state = match state.phase() {
        GamePhase::Rolling => state.roll_with(rng),
        _ => state.clone(),
    };
    if state.is_ended() {
        let value = leaf_value(&state, player, config);
        node.record(value);
        return value;
    }
    if node.children.is_empty() {
        node.children = expand(&state);
    }
    let Some(index) = select_edge(node, state.current_player() == player) else {
        let value = leaf_value(&state, player, config);
        node.record(value);
        return value;
    };

    let edge = &mut node.children[index];
    let value = match state.apply_move(edge.column) {
        Ok(outcome) if edge.node.visits == 0 => {
            let value = leaf_value(&outcome.state, player, config);
            edge.node.record(value);
            value
        }
        Ok(outcome) => descend(&mut edge.node, &outcome.state, player, config, rng),
        Err(_) => leaf_value(&state, player, config),
    };
    node.record(value);
    value
}

fn expand(state: &GameState) -> Vec<Edge> {
    state
        .legal_moves()
        .into_iter()
        .map(|column| Edge {
            column,
            node: Node::default(),
        })
        .collect()
}

/// Unvisited edges first in column order, then PUCT with uniform priors. The
/// mover maximizes their own value, so scores flip sign on the opponent's turn.
fn select_edge(node: &Node, maximizing: bool) -> Option<usize> {
    if let Some(index) = node.children.iter().position(|edge| edge.node.visits == 0) {
        return Some(index);
    }
    let prior = 1.0 / node.children.len() as f64;
    let parent = f64::from(node.visits.max(1)).sqrt();
    let sign = if maximizing { 1.0 } else { -1.0 };

    let mut best: Option<(usize, f64)> = None;
    for (index, edge) in node.children.iter().enumerate() {
        let exploit = sign * edge.node.mean().unwrap_or(0.0);
        let explore = C_PUCT * prior * parent / (1.0 + f64::from(edge.node.visits));
        let score = exploit + explore;
        if best.is_none_or(|(_, top)| score > top) {
            best = Some((index, score));
        }
    }
    best.map(|(index, _)| index)
}

/// Evaluation for `player` normalized to `[-1, 1]`; decided games are exactly ±1.
pub(crate) fn leaf_value(state: &GameState, player: Player, config: &DifficultyConfig) -> f64 {
    match state.winner().map(|winner| winner.player()) {
        Some(Some(p)) if p == player => 1.0,
        Some(Some(_)) => -1.0,
        Some(None) => 0.0,
        None => (evaluate_advanced(state, player, config) / VALUE_SCALE).clamp(-1.0, 1.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bot::difficulty::DIFFICULTIES;
    use dice_core::DieValue;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn visits_add_up_to_iterations() {
        let state = GameState::new().with_die(DieValue::new(4).unwrap());
        let mut tree = Tree::new(&state, &DIFFICULTIES[3]);
        let mut budget = Budget::with_step_cap(60);
        let mut rng = StdRng::seed_from_u64(5);
        let iterations = tree.run(&state, &mut budget, &mut rng);
        assert_eq!(iterations, 60);
        let child_visits: u32 = tree.root.children.iter().map(|edge| edge.node.visits).sum();
        assert_eq!(child_visits, 60);
        assert!(tree.root.depth() >= 2);
    }

    #[test]
    fn leaf_values_stay_normalized() {
        let mut rng = StdRng::seed_from_u64(9);
        let mut state = GameState::new();
        while !state.is_ended() {
            state = state.roll_with(&mut rng);
            let value = leaf_value(&state, Player::Player1, &DIFFICULTIES[2]);
            assert!((-1.0..=1.0).contains(&value));
            let column = state.legal_moves()[0];
            state = state.apply_move(column).unwrap().state;
        }
        assert!(leaf_value(&state, Player::Player1, &DIFFICULTIES[2]).abs() <= 1.0);
    }
}
