//! Balance constants. Everything that tunes the game lives here.

pub const MAX_PLAYERS: usize = 4;

pub const DEFAULT_MAP_WIDTH: i32 = 38;
pub const DEFAULT_MAP_HEIGHT: i32 = 21;

// Initial health
pub const BASE_HEALTH: i32 = 20;
pub const ATTACK_TOWER_HEALTH: i32 = 4;
pub const DEFENSE_TOWER_HEALTH: i32 = 6;
pub const HOUSE_HEALTH: i32 = 2;
pub const SOLDIER_HEALTH: i32 = 2;
pub const TREE_HEALTH: i32 = 1;

// Soldier growth caps
pub const SOLDIER_HEALTH_CAP: i32 = 12;
pub const SOLDIER_ATTACK: i32 = 1;
pub const SOLDIER_ATTACK_CAP: i32 = 6;
pub const SOLDIER_MOVE_RANGE: i32 = 4;

// Tower effects
pub const ATTACK_TOWER_DAMAGE: i32 = 1;
pub const DEFENSE_TOWER_HEAL: i32 = 1;
pub const ATTACK_TOWER_RADIUS: i32 = 1;
pub const DEFENSE_TOWER_RADIUS: i32 = 2;

// Gold
pub const STARTING_GOLD: i32 = 250;
pub const BASE_INCOME: i32 = 10;
pub const GOLD_CAP: i32 = 1000;
pub const INCOME_CAP: i32 = 100;

pub const SOLDIER_PRICE: i32 = 100;
pub const HOUSE_PRICE: i32 = 200;
pub const ATTACK_TOWER_PRICE: i32 = 250;
pub const DEFENSE_TOWER_PRICE: i32 = 250;

pub const HOUSE_INCOME: i32 = 10;
pub const TREE_REWARD: i32 = 10;
/// Per-stat soldier upkeep is attack + health plus this flat part.
pub const SOLDIER_BASE_UPKEEP: i32 = 2;
pub const ATTACK_TOWER_UPKEEP: i32 = 4;
pub const DEFENSE_TOWER_UPKEEP: i32 = 6;

pub const BONUS_MULTIPLIER: i32 = 2;

// Forest spawning: one 1..=100 roll per turn advance, highest tier first.
pub const TREE_CAP: usize = 30;
pub const TREE_ROLL_THREE: i32 = 2;
pub const TREE_ROLL_TWO: i32 = 10;
pub const TREE_ROLL_ONE: i32 = 26;
