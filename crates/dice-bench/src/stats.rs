use crate::simulation::{GameStatus, SimulationResult};
use dice_core::Winner;
use serde::Serialize;

/// Running aggregate over a batch. Owned by the coordinating thread only, so
/// updates are applied one finished game at a time.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SimulationStats {
    pub games_requested: usize,
    /// Games that reached the ended phase.
    pub completed_games: usize,
    pub player1_wins: usize,
    pub player2_wins: usize,
    pub draws: usize,
    /// Games stopped by the turn safety cap.
    pub aborted_games: usize,
    /// Games dropped after a decision error.
    pub failed_games: usize,
    pub player1_win_rate: f64,
    pub player2_win_rate: f64,
    pub draw_rate: f64,
    pub average_turns: f64,
    /// Mean of player 1 score minus player 2 score.
    pub average_score_diff: f64,
    pub average_game_ms: f64,
    #[serde(skip)]
    total_turns: u64,
    #[serde(skip)]
    total_score_diff: i64,
    #[serde(skip)]
    total_game_ms: f64,
}

impl SimulationStats {
    pub fn new(games_requested: usize) -> Self {
        Self {
            games_requested,
            ..Self::default()
        }
    }

    pub fn record_result(&mut self, result: &SimulationResult) {
        if result.status == GameStatus::Aborted {
            self.aborted_games += 1;
            return;
        }

        self.completed_games += 1;
        match result.winner {
            Some(Winner::Player1) => self.player1_wins += 1,
            Some(Winner::Player2) => self.player2_wins += 1,
            Some(Winner::Draw) | None => self.draws += 1,
        }
        self.total_turns += u64::from(result.turns);
        self.total_score_diff += i64::from(result.final_score.player1) - i64::from(result.final_score.player2);
        self.total_game_ms += result.duration_ms;
        self.refresh();
    }

    pub fn record_failure(&mut self) {
        self.failed_games += 1;
    }

    /// Games that will not be played again: completed, aborted or failed.
    pub fn finished_games(&self) -> usize {
        self.completed_games + self.aborted_games + self.failed_games
    }

    pub fn progress(&self) -> f64 {
        if self.games_requested == 0 {
            return 1.0;
        }
        self.finished_games() as f64 / self.games_requested as f64
    }

    fn refresh(&mut self) {
        let n = self.completed_games as f64;
        self.player1_win_rate = self.player1_wins as f64 / n;
        self.player2_win_rate = self.player2_wins as f64 / n;
        self.draw_rate = self.draws as f64 / n;
        self.average_turns = self.total_turns as f64 / n;
        self.average_score_diff = self.total_score_diff as f64 / n;
        self.average_game_ms = self.total_game_ms / n;
    }
}
