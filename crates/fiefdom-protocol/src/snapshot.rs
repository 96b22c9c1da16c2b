use serde::{Deserialize, Serialize};

use crate::{Difficulty, ElementKind, PlayerColor, PlayerId, Pos};

/// Full game state for save/load.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Snapshot {
    pub turn: u32,
    pub current_player: PlayerId,
    pub map: MapSnapshot,
    pub players: Vec<PlayerSnapshot>,
    /// Turn order, referencing `players` ids.
    pub rotation: Vec<PlayerId>,
    pub elements: Vec<ElementSnapshot>,
    #[serde(default)]
    pub stats: Vec<PlayerStatsSnapshot>,
    pub rng_state: [u8; 32],
    pub game_over: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MapSnapshot {
    pub width: i32,
    pub height: i32,
    pub cells: Vec<CellSnapshot>, // row-major
}

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize)]
pub struct CellSnapshot {
    pub removed: bool,
    pub spawn: bool,
    pub bonus: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PlayerSnapshot {
    pub id: PlayerId,
    pub color: PlayerColor,
    pub is_bot: bool,
    pub difficulty: Difficulty,
    pub gold: i32,
    pub gold_per_turn: i32,
    pub home: Pos,
    /// Owned cells in insertion order.
    pub owned_cells: Vec<Pos>,
    pub eliminated: bool,
    pub can_play: bool,
}

/// Elements are stored without handles; restore re-inserts them in order.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ElementSnapshot {
    pub owner: Option<PlayerId>,
    pub kind: ElementKind,
    pub pos: Pos,
    pub hp: i32,
    pub max_hp: i32,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PlayerStatsSnapshot {
    pub player: PlayerId,
    pub turns_played: u32,
    pub territory_history: Vec<u32>,
}
