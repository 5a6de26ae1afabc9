use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use rand::rngs::SmallRng;
use rand::SeedableRng;
use std::time::Duration;

use statecraft::config::RulesConfig;
use statecraft::cost::price_action;
use statecraft::planner::{ActionPlanner, HeuristicPlanner};
use statecraft::resolve::economy::run_economy;
use statecraft::resolve::{
    compute_delta, process_turn, resolve_combat, HeuristicDefense, TurnProcessor,
};
use statecraft::scenario::standard_scenario;
use statecraft::simulate::{play_game, SimulationConfig};
use statecraft::state::{ActionKind, CountryId, GameState};

fn bench_compute_delta(c: &mut Criterion) {
    let snapshot = standard_scenario(1, 3);
    let rules = RulesConfig::default();
    let stats = &snapshot.stats[0];
    c.bench_function("compute_delta_single_country", |b| {
        b.iter(|| compute_delta(black_box(stats), black_box(&rules.economy)))
    });
}

fn bench_run_economy(c: &mut Criterion) {
    let state = GameState::from_snapshot(standard_scenario(8, 4)).unwrap();
    let rules = RulesConfig::default();
    c.bench_function("run_economy_8_countries", |b| {
        b.iter_batched(
            || state.clone(),
            |mut s| run_economy(&mut s, black_box(&rules.economy)),
            BatchSize::SmallInput,
        )
    });
}

fn bench_price_research(c: &mut Criterion) {
    let snapshot = standard_scenario(1, 1);
    let rules = RulesConfig::default();
    c.bench_function("price_research", |b| {
        b.iter(|| {
            price_action(
                black_box(&ActionKind::Research),
                &snapshot.stats[0],
                &rules.pricing,
            )
        })
    });
}

fn bench_resolve_combat(c: &mut Criterion) {
    let snapshot = standard_scenario(2, 1);
    let rules = RulesConfig::default();
    let mut rng = SmallRng::seed_from_u64(1);
    c.bench_function("resolve_combat", |b| {
        b.iter(|| {
            resolve_combat(
                black_box(30.0),
                black_box(20.0),
                &snapshot.stats[0],
                &snapshot.stats[1],
                &rules.combat,
                &mut rng,
            )
        })
    });
}

fn bench_plan(c: &mut Criterion) {
    let state = GameState::from_snapshot(standard_scenario(8, 4)).unwrap();
    let rules = RulesConfig::default();
    let planner = HeuristicPlanner::default();
    c.bench_function("plan_one_country", |b| {
        b.iter(|| planner.plan(black_box(CountryId(1)), &state, &rules))
    });
}

fn bench_process_turn_idle(c: &mut Criterion) {
    let snapshot = standard_scenario(8, 4);
    let rules = RulesConfig::default();
    let mut rng = SmallRng::seed_from_u64(2);
    c.bench_function("process_turn_8_countries_no_actions", |b| {
        b.iter_batched(
            || snapshot.clone(),
            |s| process_turn(s, &rules, &mut rng),
            BatchSize::SmallInput,
        )
    });
}

fn bench_process_turn_planned(c: &mut Criterion) {
    let snapshot = standard_scenario(8, 4);
    let rules = RulesConfig::default();
    let defense = HeuristicDefense::default();
    let planner = HeuristicPlanner::default();
    let processor = TurnProcessor::new(&rules, &defense).with_planner(&planner);
    let mut rng = SmallRng::seed_from_u64(3);
    c.bench_function("process_turn_8_countries_planned", |b| {
        b.iter_batched(
            || snapshot.clone(),
            |s| processor.process(s, &mut rng),
            BatchSize::SmallInput,
        )
    });
}

fn bench_full_game(c: &mut Criterion) {
    let config = SimulationConfig {
        turns: 30,
        countries: 4,
        cities_per_country: 3,
        threads: 1,
        quiet: true,
        ..Default::default()
    };
    let rules = RulesConfig::default();
    let mut group = c.benchmark_group("simulate");
    group.sample_size(10);
    group.measurement_time(Duration::from_secs(10));
    group.bench_function("game_4x3_30_turns", |b| {
        b.iter(|| play_game(&config, &rules, 0, &mut SmallRng::seed_from_u64(4)))
    });
    group.finish();
}

criterion_group!(
    benches,
    bench_compute_delta,
    bench_run_economy,
    bench_price_research,
    bench_resolve_combat,
    bench_plan,
    bench_process_turn_idle,
    bench_process_turn_planned,
    bench_full_game,
);
criterion_main!(benches);
