/// Hard ceiling on search depth; keeps worst-case per-move latency bounded.
pub const MAX_SEARCH_DEPTH: u8 = 5;

/// Named bundle of search and heuristic parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DifficultyConfig {
    pub name: &'static str,
    /// Placements searched ahead, counting both players' turns.
    pub depth: u8,
    /// Chance in `[0, 1]` of playing a uniformly random legal column instead of searching.
    pub randomness: f64,
    /// Pick the opponent's reply with the same search instead of a greedy guess.
    pub model_opponent: bool,
    pub offense_weight: f64,
    pub defense_weight: f64,
    pub advanced_eval: bool,
}

pub static DIFFICULTIES: [DifficultyConfig; 5] = [
    DifficultyConfig {
        name: "easy",
        depth: 1,
        randomness: 0.35,
        model_opponent: false,
        offense_weight: 1.0,
        defense_weight: 0.0,
        advanced_eval: false,
    },
    DifficultyConfig {
        name: "medium",
        depth: 2,
        randomness: 0.15,
        model_opponent: false,
        offense_weight: 1.0,
        defense_weight: 0.3,
        advanced_eval: true,
    },
    DifficultyConfig {
        name: "hard",
        depth: 3,
        randomness: 0.05,
        model_opponent: true,
        offense_weight: 1.0,
        defense_weight: 0.5,
        advanced_eval: true,
    },
    DifficultyConfig {
        name: "expert",
        depth: 4,
        randomness: 0.0,
        model_opponent: true,
        offense_weight: 0.9,
        defense_weight: 0.6,
        advanced_eval: true,
    },
    DifficultyConfig {
        name: "master",
        depth: MAX_SEARCH_DEPTH,
        randomness: 0.0,
        model_opponent: true,
        offense_weight: 0.8,
        defense_weight: 0.7,
        advanced_eval: true,
    },
];

impl DifficultyConfig {
    /// Case-insensitive lookup in [`DIFFICULTIES`].
    pub fn lookup(name: &str) -> Option<&'static DifficultyConfig> {
        let wanted = name.trim();
        DIFFICULTIES
            .iter()
            .find(|config| config.name.eq_ignore_ascii_case(wanted))
    }

    pub fn names() -> impl Iterator<Item = &'static str> {
        DIFFICULTIES.iter().map(|config| config.name)
    }

    pub fn with_depth(self, depth: u8) -> Self {
        Self {
            depth: depth.clamp(1, MAX_SEARCH_DEPTH),
            ..self
        }
    }
}
