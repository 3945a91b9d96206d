use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use dice_core::Winner;
use plotters::prelude::*;
use serde::Serialize;
use statrs::distribution::{ContinuousCDF, Normal};
use thiserror::Error;

use crate::simulation::{GameStatus, SimulationResult};
use crate::tournament::elo::anchored_ratings;

const CONFIDENCE_Z: f64 = 1.96; // 95% CI

#[derive(Debug, Error)]
pub enum AnalyticsError {
    #[error("agent index {0} is not part of this tournament")]
    UnknownAgent(usize),
    #[error("{context}: {source}")]
    Io {
        context: &'static str,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to render plot: {0}")]
    Plot(String),
}

/// Folds finished games into per-agent and per-pairing tallies.
pub struct AnalyticsCollector {
    agents: Vec<AgentAccumulator>,
    matchups: BTreeMap<(usize, usize), MatchupAccumulator>,
}

impl AnalyticsCollector {
    /// `agents` holds `(name, strategy)` in configuration order; the first one
    /// anchors the Elo scale.
    pub fn new(agents: &[(String, String)]) -> Self {
        Self {
            agents: agents
                .iter()
                .map(|(name, strategy)| AgentAccumulator::new(name.clone(), strategy.clone()))
                .collect(),
            matchups: BTreeMap::new(),
        }
    }

    /// Records a game in which agent `player1` held the first seat.
    pub fn record_game(
        &mut self,
        player1: usize,
        player2: usize,
        result: &SimulationResult,
    ) -> Result<(), AnalyticsError> {
        self.check(player1)?;
        self.check(player2)?;

        let key = (player1.min(player2), player1.max(player2));
        let matchup = self.matchups.entry(key).or_default();

        if result.status == GameStatus::Aborted {
            matchup.aborted += 1;
            self.agents[player1].aborted += 1;
            self.agents[player2].aborted += 1;
            return Ok(());
        }

        let (p1_score, p2_score) = match result.winner {
            Some(Winner::Player1) => (1.0, 0.0),
            Some(Winner::Player2) => (0.0, 1.0),
            Some(Winner::Draw) | None => (0.5, 0.5),
        };
        self.agents[player1].record(p1_score, result.decisions[0].total_ms, result.decisions[0].decisions);
        self.agents[player2].record(p2_score, result.decisions[1].total_ms, result.decisions[1].decisions);

        let (low_score, low_points, high_points) = if key.0 == player1 {
            (p1_score, result.final_score.player1, result.final_score.player2)
        } else {
            (p2_score, result.final_score.player2, result.final_score.player1)
        };
        matchup.record(low_score, f64::from(low_points) - f64::from(high_points), result.turns);
        Ok(())
    }

    pub fn record_failure(&mut self, player1: usize, player2: usize) -> Result<(), AnalyticsError> {
        self.check(player1)?;
        self.check(player2)?;
        let key = (player1.min(player2), player1.max(player2));
        self.matchups.entry(key).or_default().failed += 1;
        self.agents[player1].failed += 1;
        self.agents[player2].failed += 1;
        Ok(())
    }

    pub fn finalize(self) -> AnalyticsSummary {
        let names: Vec<String> = self.agents.iter().map(|a| a.name.clone()).collect();

        let mut score_vs_anchor = vec![None; names.len()];
        let matchups: Vec<MatchupReport> = self
            .matchups
            .into_iter()
            .map(|((low, high), acc)| {
                let report = acc.into_report(&names[low], &names[high]);
                if low == 0 && report.games > 0 {
                    score_vs_anchor[high] = Some(1.0 - report.score_rate);
                }
                report
            })
            .collect();
        let ratings = anchored_ratings(&score_vs_anchor);

        let agents = self
            .agents
            .into_iter()
            .zip(ratings)
            .map(|(acc, elo)| acc.into_report(elo))
            .collect();

        AnalyticsSummary { agents, matchups }
    }

    fn check(&self, idx: usize) -> Result<(), AnalyticsError> {
        if idx < self.agents.len() {
            Ok(())
        } else {
            Err(AnalyticsError::UnknownAgent(idx))
        }
    }
}

struct AgentAccumulator {
    name: String,
    strategy: String,
    scores: Vec<f64>,
    wins: usize,
    losses: usize,
    draws: usize,
    aborted: usize,
    failed: usize,
    total_latency_ms: f64,
    total_decisions: u64,
}

impl AgentAccumulator {
    fn new(name: String, strategy: String) -> Self {
        Self {
            name,
            strategy,
            scores: Vec::new(),
            wins: 0,
            losses: 0,
            draws: 0,
            aborted: 0,
            failed: 0,
            total_latency_ms: 0.0,
            total_decisions: 0,
        }
    }

    fn record(&mut self, score: f64, latency_ms: f64, decisions: u32) {
        self.scores.push(score);
        match score {
            s if s >= 1.0 => self.wins += 1,
            s if s <= 0.0 => self.losses += 1,
            _ => self.draws += 1,
        }
        self.total_latency_ms += latency_ms;
        self.total_decisions += u64::from(decisions);
    }

    fn into_report(self, elo: f64) -> AgentReport {
        let games = self.scores.len();
        let score_rate = mean(&self.scores);
        let average_ms_per_decision = if self.total_decisions == 0 {
            0.0
        } else {
            self.total_latency_ms / self.total_decisions as f64
        };
        AgentReport {
            ci95: confidence_interval(&self.scores),
            name: self.name,
            strategy: self.strategy,
            games,
            wins: self.wins,
            losses: self.losses,
            draws: self.draws,
            aborted: self.aborted,
            failed: self.failed,
            score_rate,
            elo,
            average_ms_per_decision,
        }
    }
}

/// Tallies for one unordered pairing, scored from the lower-index agent's side.
#[derive(Default)]
struct MatchupAccumulator {
    scores: Vec<f64>,
    score_diffs: Vec<f64>,
    total_turns: u64,
    aborted: usize,
    failed: usize,
}

impl MatchupAccumulator {
    fn record(&mut self, score: f64, score_diff: f64, turns: u32) {
        self.scores.push(score);
        self.score_diffs.push(score_diff);
        self.total_turns += u64::from(turns);
    }

    fn into_report(self, agent: &str, opponent: &str) -> MatchupReport {
        let games = self.scores.len();
        let count = |target: f64| self.scores.iter().filter(|s| (**s - target).abs() < 1e-9).count();
        MatchupReport {
            agent: agent.to_string(),
            opponent: opponent.to_string(),
            games,
            wins: count(1.0),
            losses: count(0.0),
            draws: count(0.5),
            aborted: self.aborted,
            failed: self.failed,
            score_rate: mean(&self.scores),
            ci95: confidence_interval(&self.scores),
            p_value: p_value_against_even(&self.scores),
            average_turns: if games == 0 {
                0.0
            } else {
                self.total_turns as f64 / games as f64
            },
            average_score_diff: mean(&self.score_diffs),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AgentReport {
    pub name: String,
    pub strategy: String,
    pub games: usize,
    pub wins: usize,
    pub losses: usize,
    pub draws: usize,
    pub aborted: usize,
    pub failed: usize,
    /// Wins plus half the draws, over decided games.
    pub score_rate: f64,
    pub ci95: (f64, f64),
    pub elo: f64,
    pub average_ms_per_decision: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct MatchupReport {
    pub agent: String,
    pub opponent: String,
    pub games: usize,
    pub wins: usize,
    pub losses: usize,
    pub draws: usize,
    pub aborted: usize,
    pub failed: usize,
    pub score_rate: f64,
    pub ci95: (f64, f64),
    /// Two-sided p-value of `score_rate` against an even match.
    pub p_value: f64,
    pub average_turns: f64,
    pub average_score_diff: f64,
}

#[derive(Debug, Serialize)]
pub struct AnalyticsSummary {
    pub agents: Vec<AgentReport>,
    pub matchups: Vec<MatchupReport>,
}

impl AnalyticsSummary {
    pub fn agent(&self, name: &str) -> Option<&AgentReport> {
        self.agents.iter().find(|agent| agent.name == name)
    }

    pub fn write_markdown(&self, run_id: &str, path: impl AsRef<Path>) -> Result<(), AnalyticsError> {
        let mut rows = String::new();
        rows.push_str("# Tournament Summary\n\n");
        if let Some(anchor) = self.agents.first() {
            rows.push_str(&format!(
                "Run `{run_id}`. Elo anchored on `{}` = 1000.\n\n",
                anchor.name
            ));
        }
        rows.push_str("| Agent | Strategy | Games | W | L | D | Score % | 95% CI | Elo | Avg ms/decision |\n");
        rows.push_str("|-------|----------|-------|---|---|---|---------|--------|-----|-----------------|\n");
        for agent in &self.agents {
            rows.push_str(&format!(
                "| {name} | {strategy} | {games} | {wins} | {losses} | {draws} | {score:.1}% | [{ci_low:.3}, {ci_high:.3}] | {elo:.0} | {latency:.2} |\n",
                name = agent.name,
                strategy = agent.strategy,
                games = agent.games,
                wins = agent.wins,
                losses = agent.losses,
                draws = agent.draws,
                score = agent.score_rate * 100.0,
                ci_low = agent.ci95.0,
                ci_high = agent.ci95.1,
                elo = agent.elo,
                latency = agent.average_ms_per_decision,
            ));
        }

        rows.push_str("\n## Matchups\n\n");
        rows.push_str("| Agent | Opponent | Games | W | L | D | Aborted | Failed | Score % | 95% CI | p-value | Avg turns | Avg score diff |\n");
        rows.push_str("|-------|----------|-------|---|---|---|---------|--------|---------|--------|---------|-----------|----------------|\n");
        for m in &self.matchups {
            rows.push_str(&format!(
                "| {agent} | {opponent} | {games} | {wins} | {losses} | {draws} | {aborted} | {failed} | {score:.1}% | [{ci_low:.3}, {ci_high:.3}] | {pval:.3} | {turns:.1} | {diff:+.2} |\n",
                agent = m.agent,
                opponent = m.opponent,
                games = m.games,
                wins = m.wins,
                losses = m.losses,
                draws = m.draws,
                aborted = m.aborted,
                failed = m.failed,
                score = m.score_rate * 100.0,
                ci_low = m.ci95.0,
                ci_high = m.ci95.1,
                pval = m.p_value,
                turns = m.average_turns,
                diff = m.average_score_diff,
            ));
        }

        fs::write(path.as_ref(), rows).map_err(|e| AnalyticsError::Io {
            context: "writing summary markdown",
            source: e,
        })?;
        Ok(())
    }

    /// Bar chart of each agent's score rate. Rendering failures (for example a
    /// missing font) come back as [`AnalyticsError::Plot`].
    pub fn render_plot(&self, dir: impl AsRef<Path>) -> Result<PathBuf, AnalyticsError> {
        let dir = dir.as_ref();
        if !dir.as_os_str().is_empty() {
            fs::create_dir_all(dir).map_err(|e| AnalyticsError::Io {
                context: "creating plots directory",
                source: e,
            })?;
        }

        let output_path = dir.join("score_rates.png");
        let agents_snapshot = self.agents.clone();

        let prev_hook = std::panic::take_hook();
        std::panic::set_hook(Box::new(|_| {}));

        let plot_attempt = std::panic::catch_unwind(move || {
            let root = BitMapBackend::new(&output_path, (800, 480)).into_drawing_area();
            root.fill(&WHITE)
                .map_err(|e| AnalyticsError::Plot(e.to_string()))?;

            let anchor = agents_snapshot.first().map(|a| a.name.clone()).unwrap_or_default();
            let mut agents = agents_snapshot;
            agents.sort_by(|a, b| a.score_rate.total_cmp(&b.score_rate));

            let mut chart = ChartBuilder::on(&root)
                .margin(20)
                .caption("Score rate across all pairings", ("sans-serif", 22))
                .set_label_area_size(LabelAreaPosition::Left, 50)
                .set_label_area_size(LabelAreaPosition::Bottom, 60)
                .build_cartesian_2d(0..agents.len(), 0.0f64..1.0f64)
                .map_err(|e| AnalyticsError::Plot(e.to_string()))?;

            chart
                .configure_mesh()
                .disable_mesh()
                .y_desc("Score rate")
                .x_desc("Agent")
                .x_label_formatter(&|idx| {
                    agents
                        .get(*idx)
                        .map(|agent| agent.name.clone())
                        .unwrap_or_default()
                })
                .draw()
                .map_err(|e| AnalyticsError::Plot(e.to_string()))?;

            chart
                .draw_series(agents.iter().enumerate().map(|(idx, agent)| {
                    let color = if agent.name == anchor {
                        &BLUE
                    } else if agent.score_rate >= 0.5 {
                        &GREEN
                    } else {
                        &RED
                    };
                    Rectangle::new([(idx, 0.0), (idx + 1, agent.score_rate)], color.filled())
                }))
                .map_err(|e| AnalyticsError::Plot(e.to_string()))?;

            drop(chart);

            root.present()
                .map_err(|e| AnalyticsError::Plot(e.to_string()))?;

            drop(root);

            Ok(output_path)
        });

        std::panic::set_hook(prev_hook);

        match plot_attempt {
            Ok(result) => result,
            Err(_) => Err(AnalyticsError::Plot(
                "plotters panicked while rendering (missing font support?)".into(),
            )),
        }
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

fn confidence_interval(points: &[f64]) -> (f64, f64) {
    if points.is_empty() {
        return (0.0, 0.0);
    }
    let mean = mean(points);
    if points.len() == 1 {
        return (mean, mean);
    }
    let variance = points
        .iter()
        .map(|value| (value - mean).powi(2))
        .sum::<f64>()
        / (points.len() as f64 - 1.0);
    let std_error = (variance / points.len() as f64).sqrt();
    let margin = CONFIDENCE_Z * std_error;
    (mean - margin, mean + margin)
}

/// Normal approximation to the binomial test of a score rate against 0.5.
fn p_value_against_even(scores: &[f64]) -> f64 {
    let n = scores.len();
    if n == 0 {
        return 1.0;
    }
    let rate = mean(scores);
    let std_error = (0.25 / n as f64).sqrt();
    let z = ((rate - 0.5) / std_error).abs();
    let Ok(normal) = Normal::new(0.0, 1.0) else {
        return 1.0;
    };
    (2.0 * (1.0 - normal.cdf(z))).clamp(0.0, 1.0)
}
