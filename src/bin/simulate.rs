//! Batch simulation CLI.
//!
//! Plays AI-only games from the standard scenario and writes one JSON
//! summary per game as JSONL.
//!
//! Usage:
//!   cargo run --release --bin simulate -- [OPTIONS]
//!
//! Options:
//!   --games N       Number of games to play (default: 10)
//!   --turns N       Maximum turns per game (default: 30)
//!   --countries N   Countries per game (default: 4)
//!   --cities N      Cities per country (default: 3)
//!   --threads N     Number of parallel threads (default: 4)
//!   --seed N        Random seed, 0 for entropy (default: 0)
//!   --rules FILE    Rule overrides as JSON
//!   --output FILE   Output file path (default: stdout)
//!   --quiet         Suppress summary output

use std::collections::BTreeMap;
use std::env;
use std::fs::File;
use std::io::{self, BufWriter};
use std::process;
use std::time::Instant;

use tracing_subscriber::EnvFilter;

use statecraft::config::RulesConfig;
use statecraft::simulate::{self, GameSummary, SimulationConfig};

fn main() {
    let args: Vec<String> = env::args().collect();
    let mut config = SimulationConfig::default();
    let mut rules_path: Option<String> = None;
    let mut output_path: Option<String> = None;
    let mut quiet = false;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--games" => {
                i += 1;
                config.num_games = parse(&args, i, "--games");
            }
            "--turns" => {
                i += 1;
                config.turns = parse(&args, i, "--turns");
            }
            "--countries" => {
                i += 1;
                config.countries = parse(&args, i, "--countries");
            }
            "--cities" => {
                i += 1;
                config.cities_per_country = parse(&args, i, "--cities");
            }
            "--threads" => {
                i += 1;
                config.threads = parse(&args, i, "--threads");
            }
            "--seed" => {
                i += 1;
                config.seed = parse(&args, i, "--seed");
            }
            "--rules" => {
                i += 1;
                rules_path = args.get(i).cloned();
            }
            "--output" => {
                i += 1;
                output_path = args.get(i).cloned();
            }
            "--quiet" => {
                quiet = true;
            }
            "--help" | "-h" => {
                print_usage();
                return;
            }
            other => {
                eprintln!("Unknown argument: {}", other);
                print_usage();
                process::exit(1);
            }
        }
        i += 1;
    }

    config.quiet = quiet;
    let default_level = if quiet { "warn" } else { "info" };
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    let rules = match rules_path {
        Some(path) => RulesConfig::load(&path).unwrap_or_else(|e| {
            eprintln!("failed to load rules from {}: {}", path, e);
            process::exit(1);
        }),
        None => RulesConfig::default(),
    };

    if !quiet {
        eprintln!(
            "Simulation: {} games, {} turns, {} countries x {} cities, {} threads",
            config.num_games,
            config.turns,
            config.countries,
            config.cities_per_country,
            config.threads
        );
    }

    let start = Instant::now();
    let games = simulate::run_simulation(&config, &rules).unwrap_or_else(|e| {
        eprintln!("simulation failed: {}", e);
        process::exit(1);
    });
    let elapsed = start.elapsed();

    if !quiet {
        eprintln!(
            "Completed {} games in {:.1}s ({:.1} games/hour)",
            games.len(),
            elapsed.as_secs_f64(),
            games.len() as f64 / elapsed.as_secs_f64() * 3600.0
        );
        print_summary(&games);
    }

    let written = match &output_path {
        Some(path) => File::create(path)
            .and_then(|file| simulate::write_jsonl(&games, &mut BufWriter::new(file))),
        None => simulate::write_jsonl(&games, &mut BufWriter::new(io::stdout().lock())),
    };
    if let Err(e) = written {
        eprintln!("failed to write output: {}", e);
        process::exit(1);
    }
    if let (Some(path), false) = (&output_path, quiet) {
        eprintln!("Wrote {} games to {}", games.len(), path);
    }
}

fn parse<T: std::str::FromStr>(args: &[String], i: usize, flag: &str) -> T {
    match args.get(i).map(|v| v.parse()) {
        Some(Ok(v)) => v,
        _ => {
            eprintln!("invalid {} value", flag);
            process::exit(1);
        }
    }
}

/// Prints aggregate statistics to stderr.
fn print_summary(games: &[GameSummary]) {
    if games.is_empty() {
        return;
    }
    let n = games.len() as f64;
    let avg_turns = games.iter().map(|g| g.final_turn as f64).sum::<f64>() / n;
    let avg_captures = games.iter().map(|g| g.captures as f64).sum::<f64>() / n;
    let avg_survivors = games.iter().map(|g| g.survivors.len() as f64).sum::<f64>() / n;
    let executed: usize = games.iter().map(|g| g.executed_actions).sum();
    let failed: usize = games.iter().map(|g| g.failed_actions).sum();

    let mut wins: BTreeMap<String, usize> = BTreeMap::new();
    for game in games {
        if let Some(winner) = game.winner {
            *wins.entry(winner.to_string()).or_default() += 1;
        }
    }

    eprintln!("--- Summary ---");
    eprintln!("Average length: {:.1} turns", avg_turns);
    eprintln!("Average captures: {:.1}", avg_captures);
    eprintln!("Average survivors: {:.2}", avg_survivors);
    eprintln!("Actions: {} executed, {} failed", executed, failed);
    let decided: usize = wins.values().sum();
    eprintln!("Decided games: {}/{}", decided, games.len());
    for (country, count) in &wins {
        eprintln!("  {}: {} wins", country, count);
    }
}

fn print_usage() {
    eprintln!("Usage: simulate [OPTIONS]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --games N        Number of games to play (default: 10)");
    eprintln!("  --turns N        Maximum turns per game (default: 30)");
    eprintln!("  --countries N    Countries per game (default: 4)");
    eprintln!("  --cities N       Cities per country (default: 3)");
    eprintln!("  --threads N      Number of parallel threads (default: 4)");
    eprintln!("  --seed N         Random seed, 0 for entropy (default: 0)");
    eprintln!("  --rules FILE     Rule overrides as JSON");
    eprintln!("  --output FILE    Output file path (default: stdout)");
    eprintln!("  --quiet          Suppress summary output");
    eprintln!("  --help           Show this help");
}
