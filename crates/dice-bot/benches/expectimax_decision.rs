use criterion::{Criterion, black_box, criterion_group, criterion_main};
use dice_bot::{DifficultyConfig, expectimax, quick_analysis};
use dice_core::{DieValue, GameState};
use rand::SeedableRng;
use rand::rngs::StdRng;

/// Mid-game position reached by a fixed random playout.
fn midgame() -> GameState {
    let mut rng = StdRng::seed_from_u64(2024);
    let mut state = GameState::new();
    for _ in 0..6 {
        state = state.roll_with(&mut rng);
        let legal = state.legal_moves();
        let column = legal[state.turn() as usize % legal.len()];
        state = state.apply_move(column).expect("legal column").state;
    }
    state.with_die(DieValue::new(5).expect("valid face"))
}

fn bench_expectimax(c: &mut Criterion) {
    let mut group = c.benchmark_group("expectimax_decision");
    let state = midgame();
    for name in ["medium", "hard", "expert"] {
        let config = DifficultyConfig::lookup(name).expect("known tier");
        group.bench_function(format!("expectimax_{name}"), |b| {
            b.iter(|| black_box(expectimax(black_box(&state), config.depth, config)))
        });
    }
    group.finish();
}

fn bench_quick_analysis(c: &mut Criterion) {
    let state = midgame();
    c.bench_function("quick_analysis_10ms", |b| {
        b.iter(|| black_box(quick_analysis(black_box(&state), 10)))
    });
}

criterion_group!(benches, bench_expectimax, bench_quick_analysis);
criterion_main!(benches);
