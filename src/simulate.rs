//! Batch simulation of AI-only games.
//!
//! Plays many independent games from the standard scenario, each with its
//! own seeded random source, and checks engine invariants after every turn.
//! Used for balance tuning and as a long-running soak test.

use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::Serialize;
use thiserror::Error;
use tracing::info;

use crate::config::RulesConfig;
use crate::error::{StateError, TurnError};
use crate::planner::HeuristicPlanner;
use crate::resolve::{HeuristicDefense, TurnProcessor};
use crate::scenario::standard_scenario;
use crate::state::{ActionStatus, CountryId, GameState, TurnSnapshot};

/// Configuration for batch simulation.
#[derive(Debug, Clone)]
pub struct SimulationConfig {
    /// Number of games to play.
    pub num_games: usize,
    /// Maximum turns per game.
    pub turns: u32,
    /// Countries in the starting world.
    pub countries: usize,
    /// Cities per country in the starting world.
    pub cities_per_country: usize,
    /// Number of parallel threads for concurrent games.
    pub threads: usize,
    /// Random seed (0 = use entropy).
    pub seed: u64,
    /// Suppress per-game progress output.
    pub quiet: bool,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        SimulationConfig {
            num_games: 10,
            turns: 30,
            countries: 4,
            cities_per_country: 3,
            threads: 4,
            seed: 0,
            quiet: false,
        }
    }
}

#[derive(Debug, Error)]
pub enum SimulationError {
    #[error("failed to build thread pool: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),

    #[error("game {game}, turn {turn}: {source}")]
    Turn {
        game: usize,
        turn: u32,
        #[source]
        source: TurnError,
    },

    #[error("game {game}, turn {turn}: {detail}")]
    Invariant { game: usize, turn: u32, detail: String },
}

/// One finished game.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GameSummary {
    pub game_id: usize,
    /// Turn counter after the last resolved turn.
    pub final_turn: u32,
    pub survivors: Vec<CountryId>,
    /// The last country standing, if the game ended by conquest.
    pub winner: Option<CountryId>,
    pub captures: usize,
    pub executed_actions: usize,
    pub failed_actions: usize,
    pub total_population: u64,
}

/// Checks the invariants every resolved snapshot must satisfy.
pub fn check_snapshot(snapshot: &TurnSnapshot) -> Result<(), String> {
    let state = GameState::from_snapshot(snapshot.clone())
        .map_err(|e: StateError| e.to_string())?;
    let mismatched = state.city_share_mismatches();
    if !mismatched.is_empty() {
        return Err(format!("city shares out of sync for {:?}", mismatched));
    }
    for stats in state.all_stats() {
        if stats.budget < 0 {
            return Err(format!("{} has negative budget {}", stats.country, stats.budget));
        }
        if !(stats.military_strength.is_finite() && stats.military_strength >= 0.0) {
            return Err(format!(
                "{} has invalid strength {}",
                stats.country, stats.military_strength
            ));
        }
    }
    Ok(())
}

/// Plays one game to completion or to the turn limit.
pub fn play_game<R: Rng + ?Sized>(
    config: &SimulationConfig,
    rules: &RulesConfig,
    game_id: usize,
    rng: &mut R,
) -> Result<GameSummary, SimulationError> {
    let defense = HeuristicDefense::default();
    let planner = HeuristicPlanner::default();
    let processor = TurnProcessor::new(rules, &defense).with_planner(&planner);

    let mut snapshot = standard_scenario(config.countries, config.cities_per_country);
    let mut captures = 0;
    let mut executed_actions = 0;
    let mut failed_actions = 0;

    for _ in 0..config.turns {
        let turn = snapshot.turn;
        let outcome = processor
            .process(snapshot, rng)
            .map_err(|source| SimulationError::Turn { game: game_id, turn, source })?;
        check_snapshot(&outcome.snapshot)
            .map_err(|detail| SimulationError::Invariant { game: game_id, turn, detail })?;

        captures += outcome.log.captures();
        for action in &outcome.resolved {
            match action.status {
                ActionStatus::Executed => executed_actions += 1,
                ActionStatus::Failed => failed_actions += 1,
                ActionStatus::Pending => {}
            }
        }
        snapshot = outcome.snapshot;
        let alive = snapshot.countries.len() - snapshot.eliminated.len();
        if alive <= 1 {
            break;
        }
    }

    let survivors: Vec<CountryId> = snapshot
        .countries
        .iter()
        .map(|c| c.id)
        .filter(|id| !snapshot.eliminated.contains(id))
        .collect();
    let winner = match survivors.as_slice() {
        [only] if snapshot.countries.len() > 1 => Some(*only),
        _ => None,
    };

    Ok(GameSummary {
        game_id,
        final_turn: snapshot.turn,
        winner,
        survivors,
        captures,
        executed_actions,
        failed_actions,
        total_population: snapshot.stats.iter().map(|s| s.population).sum(),
    })
}

fn game_rng(config: &SimulationConfig, game_id: usize) -> SmallRng {
    if config.seed != 0 {
        SmallRng::seed_from_u64(config.seed.wrapping_add(game_id as u64))
    } else {
        SmallRng::from_entropy()
    }
}

/// Plays `config.num_games` games, in parallel when `config.threads > 1`.
/// Results are returned in game order.
pub fn run_simulation(
    config: &SimulationConfig,
    rules: &RulesConfig,
) -> Result<Vec<GameSummary>, SimulationError> {
    let completed = AtomicUsize::new(0);
    let play = |game_id: usize| -> Result<GameSummary, SimulationError> {
        let start = Instant::now();
        let mut rng = game_rng(config, game_id);
        let summary = play_game(config, rules, game_id, &mut rng)?;
        if !config.quiet {
            let n = completed.fetch_add(1, Ordering::Relaxed) + 1;
            info!(
                game = n,
                of = config.num_games,
                turns = summary.final_turn,
                winner = ?summary.winner,
                elapsed_s = start.elapsed().as_secs_f64(),
                "game finished"
            );
        }
        Ok(summary)
    };

    if config.threads <= 1 {
        return (0..config.num_games).map(play).collect();
    }
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.threads)
        .build()?;
    pool.install(|| (0..config.num_games).into_par_iter().map(play).collect())
}

/// Writes summaries as JSONL (one JSON object per game, one per line).
pub fn write_jsonl<W: Write>(games: &[GameSummary], out: &mut W) -> std::io::Result<()> {
    for game in games {
        serde_json::to_writer(&mut *out, game)?;
        writeln!(out)?;
    }
    out.flush()
}
