use serde::{Deserialize, Serialize};

use crate::{Pos, PurchaseKind};

/// All possible client→sim commands, acting on the current player. Fully serializable.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Command {
    /// Place a bought element on an owned empty cell, paying its price.
    Buy { kind: PurchaseKind, at: Pos },

    /// Move a soldier. The destination decides what happens: an empty cell is
    /// entered and conquered, a friendly soldier is merged into, an enemy
    /// element is attacked. Attacks land at range anywhere inside the
    /// soldier's reach; a surviving attacker then closes one step.
    MoveSoldier { from: Pos, to: Pos },

    /// Take the best legal step with a soldier toward a target cell.
    MoveSoldierToward { from: Pos, toward: Pos },

    /// Each movable soldier steps onto an adjacent tree if any, otherwise
    /// onto a random adjacent unowned empty cell.
    AutoMoveSoldiers,

    /// Every movable soldier takes one step toward the same target.
    MoveAllSoldiersToward { toward: Pos },

    EndTurn,
}
