/// Rating given to the first configured agent; everyone else is placed
/// relative to it.
pub const ANCHOR_RATING: f64 = 1000.0;
/// Gap reported for a clean sweep in either direction.
pub const MAX_RATING_GAP: f64 = 400.0;

/// Elo difference implied by a score rate (wins plus half the draws, over
/// decided games). Sweeps saturate at `±MAX_RATING_GAP`.
pub fn rating_gap(score_rate: f64) -> f64 {
    if score_rate <= 0.0 {
        return -MAX_RATING_GAP;
    }
    if score_rate >= 1.0 {
        return MAX_RATING_GAP;
    }
    (-400.0 * ((1.0 - score_rate) / score_rate).log10()).clamp(-MAX_RATING_GAP, MAX_RATING_GAP)
}

/// Ratings from each agent's score rate against the anchor (index 0). Agents
/// that never finished a game against the anchor keep the anchor rating.
pub fn anchored_ratings(score_vs_anchor: &[Option<f64>]) -> Vec<f64> {
    score_vs_anchor
        .iter()
        .enumerate()
        .map(|(idx, rate)| match (idx, rate) {
            (0, _) | (_, None) => ANCHOR_RATING,
            (_, Some(rate)) => ANCHOR_RATING + rating_gap(*rate),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn even_score_means_equal_rating() {
        assert!(rating_gap(0.5).abs() < 1e-9);
    }

    #[test]
    fn sweeps_saturate() {
        assert_eq!(rating_gap(1.0), MAX_RATING_GAP);
        assert_eq!(rating_gap(0.0), -MAX_RATING_GAP);
    }

    #[test]
    fn stronger_scores_rate_higher() {
        let gap = rating_gap(0.75);
        assert!((gap - 400.0 * 3f64.log10()).abs() < 1e-9);
        assert!(rating_gap(0.9) > gap);
    }

    #[test]
    fn anchor_is_fixed() {
        let ratings = anchored_ratings(&[Some(0.2), Some(1.0), None]);
        assert_eq!(ratings, vec![ANCHOR_RATING, ANCHOR_RATING + MAX_RATING_GAP, ANCHOR_RATING]);
    }
}
