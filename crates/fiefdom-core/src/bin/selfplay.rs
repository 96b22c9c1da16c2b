//! Headless self-play runner.
//!
//! Plays bot-vs-bot games and prints the collected metrics as JSON, for
//! balance tuning and regression sweeps:
//!
//! ```text
//! fiefdom-selfplay --games 100 --seed 7 --players 3 --max-turns 800
//! ```

use std::process::ExitCode;

use fiefdom_core::selfplay::{run_batch_selfplay, SelfPlayConfig};
use fiefdom_protocol::Difficulty;
use tracing::info;

struct CliArgs {
    games: u32,
    config: SelfPlayConfig,
}

fn parse_args() -> Result<CliArgs, String> {
    let mut games = 1u32;
    let mut config = SelfPlayConfig::default();

    let mut args = std::env::args().skip(1);
    while let Some(flag) = args.next() {
        match flag.as_str() {
            "--games" => games = parse_value(&flag, args.next())?,
            "--seed" => config.seed = parse_value(&flag, args.next())?,
            "--players" => config.num_players = parse_value(&flag, args.next())?,
            "--max-turns" => config.max_turns = parse_value(&flag, args.next())?,
            "--unfair" => config.difficulty = Difficulty::Unfair,
            "--help" | "-h" => {
                print_usage();
                std::process::exit(0);
            }
            other => return Err(format!("unknown flag: {other}")),
        }
    }

    if games == 0 {
        return Err("--games must be at least 1".to_string());
    }
    Ok(CliArgs { games, config })
}

fn parse_value<T: std::str::FromStr>(flag: &str, value: Option<String>) -> Result<T, String> {
    let raw = value.ok_or_else(|| format!("{flag} requires a value"))?;
    raw.parse()
        .map_err(|_| format!("invalid value for {flag}: {raw}"))
}

fn print_usage() {
    eprintln!("Usage: fiefdom-selfplay [OPTIONS]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --games <N>      number of games to play (default 1, consecutive seeds)");
    eprintln!("  --seed <N>       seed for the first game (default 42)");
    eprintln!("  --players <N>    number of bot seats, 2-4 (default 2)");
    eprintln!("  --max-turns <N>  turn cap before a game is scored by territory (default 600)");
    eprintln!("  --unfair         run every bot at the unfair difficulty");
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fiefdom_core=warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = match parse_args() {
        Ok(args) => args,
        Err(msg) => {
            eprintln!("error: {msg}");
            print_usage();
            return ExitCode::FAILURE;
        }
    };

    info!(
        games = args.games,
        seed = args.config.seed,
        players = args.config.num_players,
        "starting self-play batch"
    );

    let batch = match run_batch_selfplay(&args.config, args.games) {
        Ok(batch) => batch,
        Err(err) => {
            eprintln!("error: {err}");
            return ExitCode::FAILURE;
        }
    };

    info!(
        avg_game_length = batch.aggregate.avg_game_length,
        conquest_rate = batch.aggregate.conquest_rate,
        "batch finished"
    );

    match serde_json::to_string_pretty(&batch) {
        Ok(json) => {
            println!("{json}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("error: failed to serialize results: {err}");
            ExitCode::FAILURE
        }
    }
}
