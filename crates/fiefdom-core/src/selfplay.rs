//! Headless self-play harness for game balance work.
//!
//! Runs bot-vs-bot games and collects metrics for tuning the economy and the
//! combat constants.

use fiefdom_protocol::{Command, Difficulty, Event};
use serde::{Deserialize, Serialize};

use crate::{
    bot::run_bot_turn,
    engine::{GameConfig, GameEngine, SeatConfig, SetupError},
};

/// Configuration for self-play simulation.
#[derive(Clone, Debug)]
pub struct SelfPlayConfig {
    /// Number of players (all bots).
    pub num_players: usize,
    /// Random seed for determinism.
    pub seed: u64,
    /// Maximum player turns before declaring a draw.
    pub max_turns: u32,
    /// Bot difficulty for every seat.
    pub difficulty: Difficulty,
}

impl Default for SelfPlayConfig {
    fn default() -> Self {
        Self {
            num_players: 2,
            seed: 42,
            max_turns: 600,
            difficulty: Difficulty::Normal,
        }
    }
}

/// How the game ended.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum Outcome {
    /// One player outlived everyone else.
    Conquest { winner: u8 },
    /// Turn limit reached; the largest territory wins.
    TerritoryVictory { winner: u8, territories: Vec<u32> },
    /// Turn limit reached with a tie.
    Draw,
}

/// Metrics collected during a self-play game.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct GameMetrics {
    /// Total player turns played.
    pub turns_played: u32,
    /// Per-player statistics.
    pub player_stats: Vec<PlayerStats>,
    /// Soldiers killed across all players.
    pub total_soldiers_killed: u32,
    /// Structures torn down across all players.
    pub total_structures_destroyed: u32,
    /// Trees chopped across all players.
    pub total_trees_chopped: u32,
    /// Whether the game ended by conquest.
    pub ended_by_conquest: bool,
}

/// Per-player statistics.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct PlayerStats {
    pub player_id: u8,
    /// Cells conquered during the game.
    pub cells_conquered: u32,
    /// Soldiers lost.
    pub soldiers_lost: u32,
    /// Elements bought.
    pub elements_bought: u32,
    /// Trees chopped.
    pub trees_chopped: u32,
    /// Final gold.
    pub final_gold: i32,
    /// Final income per turn.
    pub final_income: i32,
    /// Final territory size in cells.
    pub final_territory: u32,
    /// Final element count.
    pub final_elements: u32,
    /// Is this player eliminated?
    pub eliminated: bool,
}

/// Result of a self-play game.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SelfPlayResult {
    /// Seed used for this game.
    pub seed: u64,
    /// How the game ended.
    pub outcome: Outcome,
    /// Collected metrics.
    pub metrics: GameMetrics,
    /// Duration in milliseconds (wall clock).
    pub duration_ms: u64,
}

/// Batch self-play results.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BatchSelfPlayResult {
    /// Number of games played.
    pub games_played: u32,
    /// Individual game results.
    pub results: Vec<SelfPlayResult>,
    /// Aggregated metrics.
    pub aggregate: AggregateMetrics,
}

/// Aggregated metrics across multiple games.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AggregateMetrics {
    /// Average game length in player turns.
    pub avg_game_length: f64,
    /// Standard deviation of game length.
    pub game_length_std: f64,
    /// Win rate per seat (should be roughly equal for a balanced game).
    pub win_rates: Vec<f64>,
    /// 1.0 = perfectly balanced, 0.0 = one seat always wins.
    pub win_rate_balance: f64,
    /// Fraction of games ending by conquest.
    pub conquest_rate: f64,
    /// Average soldiers killed per game.
    pub avg_soldiers_killed: f64,
    /// Average trees chopped per game.
    pub avg_trees_chopped: f64,
}

/// Run a single self-play game.
pub fn run_selfplay(config: &SelfPlayConfig) -> Result<SelfPlayResult, SetupError> {
    let start = std::time::Instant::now();

    let mut engine = GameEngine::new_game(&GameConfig {
        shape: None,
        seed: config.seed,
        seats: vec![
            SeatConfig {
                is_bot: true,
                difficulty: config.difficulty,
            };
            config.num_players
        ],
    })?;

    let seats = engine.state().players.len();
    let mut metrics = GameMetrics {
        player_stats: (0..seats)
            .map(|i| PlayerStats {
                player_id: i as u8,
                ..Default::default()
            })
            .collect(),
        ..Default::default()
    };

    while !engine.is_game_over() && engine.state().turn < config.max_turns {
        run_bot_turn(&mut engine);
        let events = engine.apply_command(Command::EndTurn);
        for event in &events {
            process_event_for_metrics(event, &mut metrics);
        }
    }

    metrics.turns_played = engine.state().turn;
    metrics.ended_by_conquest = engine.winner().is_some();
    finalize_player_stats(&engine, &mut metrics);

    let outcome = match engine.winner() {
        Some(winner) => Outcome::Conquest { winner: winner.0 },
        None => outcome_by_territory(&metrics),
    };

    Ok(SelfPlayResult {
        seed: config.seed,
        outcome,
        metrics,
        duration_ms: start.elapsed().as_millis() as u64,
    })
}

/// Run multiple self-play games with consecutive seeds.
pub fn run_batch_selfplay(
    config: &SelfPlayConfig,
    num_games: u32,
) -> Result<BatchSelfPlayResult, SetupError> {
    let mut results = Vec::with_capacity(num_games as usize);
    for i in 0..num_games {
        let mut game_config = config.clone();
        game_config.seed = config.seed.wrapping_add(i as u64);
        results.push(run_selfplay(&game_config)?);
    }

    let aggregate = compute_aggregate_metrics(&results, config.num_players);
    Ok(BatchSelfPlayResult {
        games_played: num_games,
        results,
        aggregate,
    })
}

fn process_event_for_metrics(event: &Event, metrics: &mut GameMetrics) {
    match event {
        Event::CellConquered { player, .. } => {
            if let Some(stats) = metrics.player_stats.get_mut(player.0 as usize) {
                stats.cells_conquered += 1;
            }
        }
        Event::SoldierDied { player, .. } => {
            metrics.total_soldiers_killed += 1;
            if let Some(stats) = metrics.player_stats.get_mut(player.0 as usize) {
                stats.soldiers_lost += 1;
            }
        }
        Event::ElementBought { player, .. } => {
            if let Some(stats) = metrics.player_stats.get_mut(player.0 as usize) {
                stats.elements_bought += 1;
            }
        }
        Event::TreeChopped { by, .. } => {
            metrics.total_trees_chopped += 1;
            if let Some(stats) = metrics.player_stats.get_mut(by.0 as usize) {
                stats.trees_chopped += 1;
            }
        }
        Event::StructureDestroyed { .. } => {
            metrics.total_structures_destroyed += 1;
        }
        _ => {}
    }
}

fn finalize_player_stats(engine: &GameEngine, metrics: &mut GameMetrics) {
    let state = engine.state();
    for stats in metrics.player_stats.iter_mut() {
        let Some(player) = state
            .players
            .iter()
            .find(|p| p.id.0 == stats.player_id)
        else {
            continue;
        };
        stats.final_gold = player.gold;
        stats.final_income = player.gold_per_turn;
        stats.final_territory = player.owned_cells.len() as u32;
        stats.final_elements = player.elements.len() as u32;
        stats.eliminated = player.eliminated;
    }
}

fn outcome_by_territory(metrics: &GameMetrics) -> Outcome {
    let territories: Vec<u32> = metrics
        .player_stats
        .iter()
        .map(|s| if s.eliminated { 0 } else { s.final_territory })
        .collect();
    let best = territories.iter().copied().max().unwrap_or(0);
    let winners: Vec<usize> = territories
        .iter()
        .enumerate()
        .filter(|(_, &t)| t == best && best > 0)
        .map(|(i, _)| i)
        .collect();
    if winners.len() == 1 {
        Outcome::TerritoryVictory {
            winner: winners[0] as u8,
            territories,
        }
    } else {
        Outcome::Draw
    }
}

fn compute_aggregate_metrics(results: &[SelfPlayResult], num_players: usize) -> AggregateMetrics {
    if results.is_empty() {
        return AggregateMetrics::default();
    }
    let n = results.len() as f64;

    let lengths: Vec<f64> = results
        .iter()
        .map(|r| r.metrics.turns_played as f64)
        .collect();
    let avg_length = lengths.iter().sum::<f64>() / n;
    let variance = lengths
        .iter()
        .map(|&l| (l - avg_length).powi(2))
        .sum::<f64>()
        / n;

    let mut wins = vec![0_u32; num_players];
    let mut conquests = 0_u32;
    for result in results {
        match &result.outcome {
            Outcome::Conquest { winner } => {
                if let Some(w) = wins.get_mut(*winner as usize) {
                    *w += 1;
                }
                conquests += 1;
            }
            Outcome::TerritoryVictory { winner, .. } => {
                if let Some(w) = wins.get_mut(*winner as usize) {
                    *w += 1;
                }
            }
            Outcome::Draw => {}
        }
    }
    let win_rates: Vec<f64> = wins.iter().map(|&w| w as f64 / n).collect();

    let expected = 1.0 / num_players as f64;
    let max_deviation = win_rates
        .iter()
        .map(|&r| (r - expected).abs())
        .fold(0.0_f64, f64::max);
    let win_rate_balance = 1.0 - (max_deviation / expected).min(1.0);

    let avg_soldiers_killed = results
        .iter()
        .map(|r| r.metrics.total_soldiers_killed as f64)
        .sum::<f64>()
        / n;
    let avg_trees_chopped = results
        .iter()
        .map(|r| r.metrics.total_trees_chopped as f64)
        .sum::<f64>()
        / n;

    AggregateMetrics {
        avg_game_length: avg_length,
        game_length_std: variance.sqrt(),
        win_rates,
        win_rate_balance,
        conquest_rate: conquests as f64 / n,
        avg_soldiers_killed,
        avg_trees_chopped,
    }
}
