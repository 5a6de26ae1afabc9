//! Statecraft -- resolves one turn of a strategy game.
//!
//! Reads a turn snapshot as JSON, runs the turn processor, and writes the
//! next snapshot together with the turn's event log to stdout.
//!
//! Usage:
//!   statecraft [OPTIONS] < snapshot.json
//!
//! Options:
//!   --input FILE    Snapshot file (default: stdin)
//!   --actions FILE  Submitted actions, one JSON object per line
//!   --rules FILE    Rule overrides as JSON (default: built-in rules)
//!   --seed N        Random seed, 0 for entropy (default: 0)
//!   --no-planner    Do not propose actions for idle AI countries
//!   --output FILE   Output file path (default: stdout)

use std::env;
use std::fs::File;
use std::io::{self, BufReader, Write};
use std::process;

use rand::rngs::SmallRng;
use rand::SeedableRng;
use tracing_subscriber::EnvFilter;

use statecraft::config::RulesConfig;
use statecraft::planner::HeuristicPlanner;
use statecraft::protocol::{encode_outcome, read_actions, read_snapshot, submit_actions};
use statecraft::resolve::{HeuristicDefense, TurnProcessor};

struct Options {
    input: Option<String>,
    actions: Option<String>,
    rules: Option<String>,
    seed: u64,
    planner: bool,
    output: Option<String>,
}

fn parse_args() -> Options {
    let args: Vec<String> = env::args().collect();
    let mut options = Options {
        input: None,
        actions: None,
        rules: None,
        seed: 0,
        planner: true,
        output: None,
    };

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--input" => {
                i += 1;
                options.input = Some(value(&args, i, "--input").to_string());
            }
            "--actions" => {
                i += 1;
                options.actions = Some(value(&args, i, "--actions").to_string());
            }
            "--rules" => {
                i += 1;
                options.rules = Some(value(&args, i, "--rules").to_string());
            }
            "--seed" => {
                i += 1;
                options.seed = value(&args, i, "--seed")
                    .parse()
                    .unwrap_or_else(|_| fail("invalid --seed value"));
            }
            "--output" => {
                i += 1;
                options.output = Some(value(&args, i, "--output").to_string());
            }
            "--no-planner" => {
                options.planner = false;
            }
            "--help" | "-h" => {
                print_usage();
                process::exit(0);
            }
            other => {
                eprintln!("Unknown argument: {}", other);
                print_usage();
                process::exit(1);
            }
        }
        i += 1;
    }
    options
}

fn value<'a>(args: &'a [String], i: usize, flag: &str) -> &'a str {
    match args.get(i) {
        Some(v) => v,
        None => fail(&format!("missing value for {}", flag)),
    }
}

fn fail(message: &str) -> ! {
    eprintln!("statecraft: {}", message);
    process::exit(1);
}

fn main() {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let options = parse_args();

    let rules = match &options.rules {
        Some(path) => RulesConfig::load(path).unwrap_or_else(|e| fail(&e.to_string())),
        None => RulesConfig::default(),
    };

    let mut snapshot = match &options.input {
        Some(path) => {
            let file = File::open(path).unwrap_or_else(|e| fail(&format!("{}: {}", path, e)));
            read_snapshot(BufReader::new(file))
        }
        None => read_snapshot(io::stdin().lock()),
    }
    .unwrap_or_else(|e| fail(&e.to_string()));

    if let Some(path) = &options.actions {
        let file = File::open(path).unwrap_or_else(|e| fail(&format!("{}: {}", path, e)));
        read_actions(BufReader::new(file))
            .and_then(|actions| submit_actions(&mut snapshot, actions))
            .unwrap_or_else(|e| fail(&format!("{}: {}", path, e)));
    }

    let mut rng = if options.seed != 0 {
        SmallRng::seed_from_u64(options.seed)
    } else {
        SmallRng::from_entropy()
    };

    let defense = HeuristicDefense::default();
    let planner = HeuristicPlanner::default();
    let mut processor = TurnProcessor::new(&rules, &defense);
    if options.planner {
        processor = processor.with_planner(&planner);
    }

    let outcome = processor
        .process(snapshot, &mut rng)
        .unwrap_or_else(|e| fail(&format!("turn aborted: {}", e)));
    let document = encode_outcome(outcome).unwrap_or_else(|e| fail(&e.to_string()));

    let written = match &options.output {
        Some(path) => File::create(path).and_then(|mut file| writeln!(file, "{}", document)),
        None => writeln!(io::stdout().lock(), "{}", document),
    };
    if let Err(e) = written {
        fail(&format!("failed to write output: {}", e));
    }
}

fn print_usage() {
    eprintln!("Usage: statecraft [OPTIONS] < snapshot.json");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --input FILE     Snapshot file (default: stdin)");
    eprintln!("  --actions FILE   Submitted actions, one JSON object per line");
    eprintln!("  --rules FILE     Rule overrides as JSON (default: built-in rules)");
    eprintln!("  --seed N         Random seed, 0 for entropy (default: 0)");
    eprintln!("  --no-planner     Do not propose actions for idle AI countries");
    eprintln!("  --output FILE    Output file path (default: stdout)");
    eprintln!("  --help           Show this help");
}
