//! Named move-selection strategies, as referenced from configuration files
//! and the simulation harness.

use crate::bot::{
    DecisionError, DifficultyConfig, MoveAnalysis, SharedProfile, deep_analysis, get_adaptive_move,
    get_ai_move, get_greedy_move, get_random_move,
};
use dice_core::GameState;
use rand::Rng;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub const DEFAULT_MCTS_BUDGET_MS: u64 = 50;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Strategy {
    Random,
    Greedy,
    /// One of the tiers in [`crate::DIFFICULTIES`], stored by canonical name.
    Difficulty(&'static str),
    /// Learns from the opponent through a [`SharedProfile`].
    Adaptive,
    MonteCarlo { budget_ms: u64 },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StrategyParseError {
    #[error("unknown strategy '{0}'")]
    Unknown(String),
    #[error("invalid search budget in '{0}'")]
    InvalidBudget(String),
}

impl Strategy {
    /// Picks a column for the player to move.
    ///
    /// `profile` only matters for [`Strategy::Adaptive`]; without one the
    /// adaptive search runs on an empty profile.
    pub fn choose<R: Rng + ?Sized>(
        &self,
        state: &GameState,
        rng: &mut R,
        profile: Option<&SharedProfile>,
    ) -> Result<usize, DecisionError> {
        match self {
            Strategy::Random => get_random_move(state, rng),
            Strategy::Greedy => get_greedy_move(state),
            Strategy::Difficulty(name) => get_ai_move(state, name, rng),
            Strategy::Adaptive => match profile {
                Some(shared) => {
                    let snapshot = shared.lock().clone();
                    get_adaptive_move(state, &snapshot, rng)
                }
                None => get_adaptive_move(state, &Default::default(), rng),
            },
            Strategy::MonteCarlo { budget_ms } => {
                let entries = deep_analysis(state, *budget_ms, rng)?;
                MoveAnalysis::recommended(&entries).ok_or(DecisionError::NoLegalMoves)
            }
        }
    }

    pub fn is_adaptive(&self) -> bool {
        matches!(self, Strategy::Adaptive)
    }

    /// Whether two runs with the same seed make the same choices. Tree search
    /// depends on how many passes fit into the wall-clock budget.
    pub fn is_deterministic(&self) -> bool {
        !matches!(self, Strategy::MonteCarlo { .. })
    }
}

impl FromStr for Strategy {
    type Err = StrategyParseError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let name = raw.trim().to_ascii_lowercase();
        match name.as_str() {
            "random" => return Ok(Strategy::Random),
            "greedy" => return Ok(Strategy::Greedy),
            "adaptive" => return Ok(Strategy::Adaptive),
            "mcts" => {
                return Ok(Strategy::MonteCarlo {
                    budget_ms: DEFAULT_MCTS_BUDGET_MS,
                });
            }
            _ => {}
        }
        if let Some(budget) = name.strip_prefix("mcts:") {
            let budget_ms = budget
                .trim()
                .parse::<u64>()
                .map_err(|_| StrategyParseError::InvalidBudget(raw.to_string()))?;
            return Ok(Strategy::MonteCarlo { budget_ms });
        }
        DifficultyConfig::lookup(&name)
            .map(|config| Strategy::Difficulty(config.name))
            .ok_or_else(|| StrategyParseError::Unknown(raw.to_string()))
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::Random => f.write_str("random"),
            Strategy::Greedy => f.write_str("greedy"),
            Strategy::Difficulty(name) => f.write_str(name),
            Strategy::Adaptive => f.write_str("adaptive"),
            Strategy::MonteCarlo { budget_ms } => write!(f, "mcts:{budget_ms}"),
        }
    }
}
