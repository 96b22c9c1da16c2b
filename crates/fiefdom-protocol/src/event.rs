use serde::{Deserialize, Serialize};

use crate::{PlayerId, Pos, PurchaseKind};

/// All possible sim→client events. Fully serializable.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    // Game flow
    TurnStarted {
        turn: u32,
        player: PlayerId,
    },
    GameEnded {
        winner: Option<PlayerId>,
    },
    IncomeGranted {
        player: PlayerId,
        amount: i32,
    },

    // Purchases
    ElementBought {
        player: PlayerId,
        kind: PurchaseKind,
        at: Pos,
    },

    // Soldiers
    SoldierMoved {
        player: PlayerId,
        from: Pos,
        to: Pos,
    },
    SoldierDamaged {
        player: PlayerId,
        at: Pos,
        hp: i32,
    },
    SoldierDied {
        player: PlayerId,
        at: Pos,
    },
    SoldiersMerged {
        player: PlayerId,
        at: Pos,
        attack: i32,
        hp: i32,
    },

    // Structures and trees
    StructureDamaged {
        player: PlayerId,
        at: Pos,
        hp: i32,
    },
    StructureDestroyed {
        player: PlayerId,
        at: Pos,
    },
    TreeChopped {
        by: PlayerId,
        at: Pos,
        reward: i32,
    },
    TreesSpawned {
        at: Vec<Pos>,
    },

    // Territory
    CellConquered {
        player: PlayerId,
        at: Pos,
    },
    PlayerEliminated {
        player: PlayerId,
        by: Option<PlayerId>,
    },
}
