use dice_bot::{
    DIFFICULTIES, DecisionError, DifficultyConfig, Strategy, evaluate, expectimax, get_ai_move,
    get_greedy_move, quick_analysis,
};
use dice_core::{GamePhase, GameState};
use rand::SeedableRng;
use rand::rngs::StdRng;

/// Positions sampled from seeded random playouts, each with a die in hand.
fn sampled_positions(seed: u64, count: usize) -> Vec<GameState> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut positions = Vec::new();
    let mut state = GameState::new();
    while positions.len() < count {
        if state.is_ended() {
            state = GameState::new();
        }
        state = state.roll_with(&mut rng);
        positions.push(state.clone());
        let legal = state.legal_moves();
        let column = legal[(state.turn() as usize * 7) % legal.len()];
        state = state.apply_move(column).unwrap().state;
    }
    positions
}

#[test]
fn shallow_search_matches_one_ply_argmax() {
    let config = DifficultyConfig {
        depth: 1,
        model_opponent: false,
        ..DIFFICULTIES[2]
    };
    for state in sampled_positions(3, 40) {
        let player = state.current_player();
        let mut expected: Option<(usize, f64)> = None;
        for column in state.legal_moves() {
            let after = state.apply_move(column).unwrap().state;
            let value = evaluate(&after, player, &config);
            if expected.is_none_or(|(_, top)| value > top) {
                expected = Some((column, value));
            }
        }
        assert_eq!(expectimax(&state, 1, &config), expected);
    }
}

#[test]
fn deterministic_tiers_agree_with_themselves() {
    for state in sampled_positions(5, 12) {
        let a = get_ai_move(&state, "hard", &mut StdRng::seed_from_u64(1)).unwrap();
        let b = get_ai_move(&state, "hard", &mut StdRng::seed_from_u64(1)).unwrap();
        assert_eq!(a, b);
        assert!(state.is_legal(a));
    }
}

#[test]
fn greedy_is_legal_everywhere() {
    for state in sampled_positions(9, 60) {
        let column = get_greedy_move(&state).unwrap();
        assert!(state.is_legal(column));
    }
}

#[test]
fn ended_games_have_no_move() {
    let mut rng = StdRng::seed_from_u64(4);
    let mut state = GameState::new();
    while !state.is_ended() {
        state = state.roll_with(&mut rng);
        let column = state.legal_moves()[0];
        state = state.apply_move(column).unwrap().state;
    }
    assert_eq!(
        get_ai_move(&state, "easy", &mut rng),
        Err(DecisionError::WrongPhase(GamePhase::Ended))
    );
    assert_eq!(
        Strategy::Greedy.choose(&state, &mut rng, None),
        Err(DecisionError::WrongPhase(GamePhase::Ended))
    );
}

#[test]
fn analysis_lists_only_legal_columns() {
    for state in sampled_positions(13, 10) {
        let entries = quick_analysis(&state, 1).unwrap();
        let columns: Vec<_> = entries.iter().map(|entry| entry.column).collect();
        assert_eq!(columns, state.legal_moves());
        for entry in &entries {
            assert!((0.0..=1.0).contains(&entry.win_probability));
        }
    }
}
