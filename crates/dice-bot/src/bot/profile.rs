use super::budget::Unlimited;
use super::difficulty::DifficultyConfig;
use super::eval::{evaluate, evaluate_move_quick};
use super::search::value_after_placement;
use super::{DecisionError, ready_to_place};
use dice_core::model::grid::COLUMN_COUNT;
use dice_core::{DieValue, GameState, MoveOutcome};
use parking_lot::Mutex;
use rand::Rng;
use rand::seq::SliceRandom;
use std::sync::Arc;
use tracing::{Level, event};

/// Profile shared between the games an adaptive agent plays.
pub type SharedProfile = Arc<Mutex<OpponentProfile>>;

const UNIFORM_COLUMN_FREQUENCY: f64 = 1.0 / COLUMN_COUNT as f64;
const COLUMN_PREFERENCE_SCALE: f64 = 3.0;
const HIGH_DICE_BONUS_SCALE: f64 = 5.0;
const ORDERING_BONUS_SCALE: f64 = 2.0;
const AGGRESSIVE_ATTACK_RATE: f64 = 0.4;
const PASSIVE_ATTACK_RATE: f64 = 0.2;
const MIN_GAMES: u32 = 3;
const MIN_MOVES: u32 = 10;

const ADAPTIVE_BASE: DifficultyConfig = DifficultyConfig {
    name: "adaptive",
    depth: 4,
    randomness: 0.0,
    model_opponent: true,
    offense_weight: 0.5,
    defense_weight: 0.5,
    advanced_eval: true,
};

/// What one opponent tends to do, accumulated across games.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OpponentProfile {
    column_usage: [u32; COLUMN_COUNT],
    total_moves: u32,
    attack_moves: u32,
    high_dice_placements: [u32; COLUMN_COUNT],
    low_dice_placements: [u32; COLUMN_COUNT],
    points_lost_to_attacks: u32,
    games_completed: u32,
}

impl OpponentProfile {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> SharedProfile {
        Arc::new(Mutex::new(Self::new()))
    }

    /// Records one opponent placement. Out-of-range columns are ignored.
    pub fn record_move(&mut self, column: usize, die: DieValue, removed: u8, points_lost: u32) {
        if column >= COLUMN_COUNT {
            return;
        }
        self.column_usage[column] = self.column_usage[column].saturating_add(1);
        self.total_moves = self.total_moves.saturating_add(1);

        if removed > 0 {
            self.attack_moves = self.attack_moves.saturating_add(1);
            self.points_lost_to_attacks = self.points_lost_to_attacks.saturating_add(points_lost);
        }

        match die.get() {
            5..=6 => {
                self.high_dice_placements[column] = self.high_dice_placements[column].saturating_add(1);
            }
            1..=2 => {
                self.low_dice_placements[column] = self.low_dice_placements[column].saturating_add(1);
            }
            _ => {}
        }
    }

    /// Records the opponent's move from the transition it produced.
    pub fn observe(&mut self, before: &GameState, outcome: &MoveOutcome) {
        let victim = before.current_player().opponent();
        let points_lost = before
            .score(victim)
            .saturating_sub(outcome.state.score(victim));
        let removed = u8::try_from(outcome.removed.len()).unwrap_or(u8::MAX);
        self.record_move(outcome.column, outcome.die, removed, points_lost);
    }

    pub fn end_game(&mut self) {
        self.games_completed = self.games_completed.saturating_add(1);
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn games_completed(&self) -> u32 {
        self.games_completed
    }

    pub fn total_moves(&self) -> u32 {
        self.total_moves
    }

    pub fn points_lost_to_attacks(&self) -> u32 {
        self.points_lost_to_attacks
    }

    pub fn low_dice_placements(&self) -> &[u32; COLUMN_COUNT] {
        &self.low_dice_placements
    }

    /// Share of recorded moves that removed at least one die.
    pub fn attack_rate(&self) -> f64 {
        if self.total_moves == 0 {
            return 0.0;
        }
        f64::from(self.attack_moves) / f64::from(self.total_moves)
    }

    /// Share of moves into `column`; uniform before any data exists.
    pub fn column_frequency(&self, column: usize) -> f64 {
        if column >= COLUMN_COUNT {
            return 0.0;
        }
        if self.total_moves == 0 {
            return UNIFORM_COLUMN_FREQUENCY;
        }
        f64::from(self.column_usage[column]) / f64::from(self.total_moves)
    }

    /// Weights tuned to the observed attack rate. Falls back to the balanced
    /// base until at least three games and ten moves have been seen.
    pub fn adaptive_config(&self) -> DifficultyConfig {
        let mut config = ADAPTIVE_BASE;
        if self.games_completed < MIN_GAMES || self.total_moves < MIN_MOVES {
            return config;
        }

        let rate = self.attack_rate();
        if rate > AGGRESSIVE_ATTACK_RATE {
            config.defense_weight = (0.6 + (rate - AGGRESSIVE_ATTACK_RATE) * 0.5).clamp(0.0, 1.0);
            config.offense_weight = 1.0 - config.defense_weight;
        } else if rate < PASSIVE_ATTACK_RATE {
            config.offense_weight = 0.7;
            config.defense_weight = 0.3;
        }
        config
    }

    /// Bias toward columns the opponent favors and stacks high dice in.
    pub fn column_attack_bonus(&self, column: usize) -> f64 {
        if self.total_moves < MIN_MOVES || column >= COLUMN_COUNT {
            return 0.0;
        }
        let preference = self.column_frequency(column) - UNIFORM_COLUMN_FREQUENCY;

        let high_total: u32 = self.high_dice_placements.iter().sum();
        let high_ratio = if high_total > 0 {
            f64::from(self.high_dice_placements[column]) / f64::from(high_total)
        } else {
            UNIFORM_COLUMN_FREQUENCY
        };

        preference * COLUMN_PREFERENCE_SCALE
            + (high_ratio - UNIFORM_COLUMN_FREQUENCY) * HIGH_DICE_BONUS_SCALE
    }
}

/// Adaptive search: the profile picks the weights and nudges each column by
/// its attack bonus. Candidates are tried in profile-weighted order and the
/// first strict maximum wins.
pub fn get_adaptive_move<R: Rng + ?Sized>(
    state: &GameState,
    profile: &OpponentProfile,
    rng: &mut R,
) -> Result<usize, DecisionError> {
    let (die, legal) = ready_to_place(state)?;
    let config = profile.adaptive_config();

    if rng.r#gen::<f64>() < config.randomness {
        return legal.choose(rng).copied().ok_or(DecisionError::NoLegalMoves);
    }
    if let &[only] = legal.as_slice() {
        return Ok(only);
    }

    let player = state.current_player();
    let mut ordered: Vec<(usize, f64)> = legal
        .iter()
        .map(|&column| {
            let quick = evaluate_move_quick(state, column, die, player);
            (column, quick + profile.column_attack_bonus(column) * ORDERING_BONUS_SCALE)
        })
        .collect();
    ordered.sort_by(|a, b| b.1.total_cmp(&a.1));

    let mut best: Option<(usize, f64)> = None;
    for (column, _) in ordered {
        let Ok(outcome) = state.apply_move(column) else {
            continue;
        };
        let base = value_after_placement(&outcome.state, config.depth - 1, player, &config, &mut Unlimited)
            .unwrap_or_else(|| evaluate(&outcome.state, player, &config));
        let value = base + profile.column_attack_bonus(column);
        if best.is_none_or(|(_, top)| value > top) {
            best = Some((column, value));
        }
    }

    let (column, value) = best.ok_or(DecisionError::NoLegalMoves)?;
    if tracing::enabled!(Level::DEBUG) {
        event!(
            target: "dice_bot::decision",
            Level::DEBUG,
            player = %player,
            strategy = "adaptive",
            chosen = column,
            value,
            attack_rate = profile.attack_rate(),
            offense_weight = config.offense_weight,
            defense_weight = config.defense_weight,
        );
    }
    Ok(column)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn d(value: u8) -> DieValue {
        DieValue::new(value).unwrap()
    }

    fn trained(attacks: u32, quiet: u32, games: u32) -> OpponentProfile {
        let mut profile = OpponentProfile::new();
        for _ in 0..attacks {
            profile.record_move(0, d(6), 1, 6);
        }
        for _ in 0..quiet {
            profile.record_move(1, d(3), 0, 0);
        }
        for _ in 0..games {
            profile.end_game();
        }
        profile
    }

    #[test]
    fn fresh_profile_uses_balanced_defaults() {
        let profile = OpponentProfile::new();
        assert_eq!(profile.attack_rate(), 0.0);
        assert!((profile.column_frequency(2) - UNIFORM_COLUMN_FREQUENCY).abs() < 1e-12);
        assert_eq!(profile.adaptive_config(), ADAPTIVE_BASE);
        assert_eq!(profile.column_attack_bonus(0), 0.0);
    }

    #[test]
    fn aggressive_opponents_raise_defense() {
        let profile = trained(8, 4, 3);
        let config = profile.adaptive_config();
        assert!(config.defense_weight > 0.6);
        assert!((config.offense_weight + config.defense_weight - 1.0).abs() < 1e-12);
    }

    #[test]
    fn passive_opponents_raise_offense() {
        let config = trained(1, 11, 3).adaptive_config();
        assert_eq!(config.offense_weight, 0.7);
        assert_eq!(config.defense_weight, 0.3);
    }

    #[test]
    fn too_little_data_keeps_defaults() {
        assert_eq!(trained(8, 4, 2).adaptive_config(), ADAPTIVE_BASE);
        assert_eq!(trained(3, 3, 5).adaptive_config(), ADAPTIVE_BASE);
    }

    #[test]
    fn favored_high_die_column_gets_bonus() {
        let profile = trained(8, 4, 3);
        assert!(profile.column_attack_bonus(0) > 0.0);
        assert!(profile.column_attack_bonus(2) < 0.0);
        assert_eq!(profile.column_attack_bonus(7), 0.0);
    }

    #[test]
    fn observe_counts_points_knocked_off() {
        let before = GameState::new().with_die(d(4));
        let first = before.apply_move(1).unwrap();
        let reply_state = first.state.with_die(d(4));
        let reply = reply_state.apply_move(1).unwrap();

        let mut profile = OpponentProfile::new();
        profile.observe(&reply_state, &reply);
        assert_eq!(profile.total_moves(), 1);
        assert_eq!(profile.attack_rate(), 1.0);
        assert_eq!(profile.points_lost_to_attacks(), 4);
    }

    #[test]
    fn reset_forgets_everything() {
        let mut profile = trained(5, 5, 4);
        profile.reset();
        assert_eq!(profile, OpponentProfile::new());
    }

    #[test]
    fn adaptive_move_is_legal() {
        let mut rng = StdRng::seed_from_u64(21);
        let profile = trained(8, 4, 3);
        let state = GameState::new().with_die(d(2));
        let column = get_adaptive_move(&state, &profile, &mut rng).unwrap();
        assert!(state.is_legal(column));
    }
}
