pub mod bot;
pub mod policy;

pub use bot::{
    DIFFICULTIES, DecisionError, DifficultyConfig, MAX_SEARCH_DEPTH, MoveAnalysis, OpponentProfile,
    SharedProfile, WIN_SCORE, deep_analysis, evaluate, evaluate_advanced, evaluate_basic,
    evaluate_move_quick, expectimax, get_adaptive_move, get_ai_move, get_greedy_move,
    get_random_move, quick_analysis, win_probability,
};
pub use policy::{Strategy, StrategyParseError};
