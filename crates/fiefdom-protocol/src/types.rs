use serde::{Deserialize, Serialize};

/// Integer grid coordinates. `(0, 0)` is the top-left cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Pos {
    pub x: i32,
    pub y: i32,
}

impl Pos {
    pub const ORTHOGONAL: [Pos; 4] = [
        Pos { x: 1, y: 0 },
        Pos { x: -1, y: 0 },
        Pos { x: 0, y: 1 },
        Pos { x: 0, y: -1 },
    ];

    pub const DIAGONAL: [Pos; 4] = [
        Pos { x: 1, y: 1 },
        Pos { x: 1, y: -1 },
        Pos { x: -1, y: 1 },
        Pos { x: -1, y: -1 },
    ];

    #[inline]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn orthogonal_neighbors(self) -> impl Iterator<Item = Pos> {
        Self::ORTHOGONAL.into_iter().map(move |d| self + d)
    }

    pub fn all_neighbors(self) -> impl Iterator<Item = Pos> {
        Self::ORTHOGONAL
            .into_iter()
            .chain(Self::DIAGONAL)
            .map(move |d| self + d)
    }

    #[inline]
    pub fn manhattan(self, other: Pos) -> i32 {
        (self.x - other.x).abs() + (self.y - other.y).abs()
    }

    /// Truncated euclidean distance, used for nearest/farthest comparisons.
    #[inline]
    pub fn distance(self, other: Pos) -> i32 {
        let dx = (self.x - other.x) as f64;
        let dy = (self.y - other.y) as f64;
        (dx * dx + dy * dy).sqrt() as i32
    }

    #[inline]
    pub fn is_adjacent(self, other: Pos) -> bool {
        self.manhattan(other) == 1
    }
}

impl std::ops::Add for Pos {
    type Output = Pos;

    fn add(self, other: Pos) -> Pos {
        Pos {
            x: self.x + other.x,
            y: self.y + other.y,
        }
    }
}

/// Everything that can stand on a cell.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ElementKind {
    /// A player's headquarters. Losing it eliminates the player.
    Base,
    Soldier {
        attack: i32,
        can_move: bool,
        facing_right: bool,
    },
    House,
    AttackTower,
    DefenseTower,
    /// Neutral. Chopping it pays out `reward` gold.
    ForestTree { reward: i32 },
}

impl ElementKind {
    #[inline]
    pub fn is_soldier(&self) -> bool {
        matches!(self, ElementKind::Soldier { .. })
    }

    #[inline]
    pub fn is_tree(&self) -> bool {
        matches!(self, ElementKind::ForestTree { .. })
    }
}

/// What a player can buy and place on an owned empty cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PurchaseKind {
    Soldier,
    House,
    AttackTower,
    DefenseTower,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Difficulty {
    Normal,
    /// Doubles income; conquered territory goes neutral instead of to the attacker.
    Unfair,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlayerColor {
    Blue,
    Red,
    White,
    Purple,
}

impl PlayerColor {
    pub const ALL: [PlayerColor; 4] = [
        PlayerColor::Blue,
        PlayerColor::Red,
        PlayerColor::White,
        PlayerColor::Purple,
    ];

    pub const fn rgb(self) -> (u8, u8, u8) {
        match self {
            PlayerColor::Blue => (50, 100, 150),
            PlayerColor::Red => (170, 60, 70),
            PlayerColor::White => (175, 175, 175),
            PlayerColor::Purple => (110, 60, 200),
        }
    }
}
