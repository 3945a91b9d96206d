use std::time::Duration;

use dice_core::{DieValue, GameSnapshot, GameState, Player, Winner};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GameStatus {
    Completed,
    /// Stopped by the turn safety cap before either grid filled.
    Aborted,
}

/// One placement in a game's move log.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MoveRecord {
    pub turn: u32,
    pub player: Player,
    pub die: DieValue,
    pub column: usize,
    pub removed: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snapshot: Option<GameSnapshot>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FinalScore {
    pub player1: u32,
    pub player2: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct DecisionSummary {
    pub decisions: u32,
    pub avg_ms_per_decision: f64,
    pub total_ms: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SimulationResult {
    pub game_id: usize,
    pub seed: u64,
    pub player1: String,
    pub player2: String,
    pub status: GameStatus,
    pub moves: Vec<MoveRecord>,
    pub final_state: GameState,
    pub final_score: FinalScore,
    pub winner: Option<Winner>,
    pub turns: u32,
    pub duration_ms: f64,
    /// Decision timing per seat, player 1 first.
    pub decisions: [DecisionSummary; 2],
}

/// A game abandoned because a strategy refused to move or picked an illegal
/// column. The rest of the batch keeps running.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GameFailure {
    pub game_id: usize,
    pub seed: u64,
    pub turn: u32,
    pub player: Player,
    pub strategy: String,
    pub message: String,
    /// Set when the engine reported an internal invariant failure rather than
    /// rejecting its input.
    pub invariant_violation: bool,
}

#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct DecisionMetrics {
    total: Duration,
    decisions: u32,
}

impl DecisionMetrics {
    pub(crate) fn record(&mut self, duration: Duration) -> f64 {
        self.total += duration;
        self.decisions += 1;
        duration.as_secs_f64() * 1000.0
    }

    pub(crate) fn finalize(self) -> DecisionSummary {
        let avg_ms = if self.decisions == 0 {
            0.0
        } else {
            self.total.as_secs_f64() * 1000.0 / f64::from(self.decisions)
        };

        DecisionSummary {
            decisions: self.decisions,
            avg_ms_per_decision: avg_ms,
            total_ms: self.total.as_secs_f64() * 1000.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metrics_average_over_decisions() {
        let mut metrics = DecisionMetrics::default();
        metrics.record(Duration::from_millis(4));
        metrics.record(Duration::from_millis(6));
        let summary = metrics.finalize();
        assert_eq!(summary.decisions, 2);
        assert!((summary.avg_ms_per_decision - 5.0).abs() < 1e-9);
        assert!((summary.total_ms - 10.0).abs() < 1e-9);
    }

    #[test]
    fn empty_metrics_report_zero() {
        assert_eq!(DecisionMetrics::default().finalize(), DecisionSummary::default());
    }
}
