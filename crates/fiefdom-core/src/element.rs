use serde::{Deserialize, Serialize};

use fiefdom_protocol::{ElementKind, PlayerId, Pos, PurchaseKind};

use crate::config;

/// A thing standing on the board. Trees are neutral (`owner: None`).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Element {
    pub kind: ElementKind,
    pub owner: Option<PlayerId>,
    pub pos: Pos,
    pub hp: i32,
    pub max_hp: i32,
}

impl Element {
    pub fn base(pos: Pos) -> Self {
        Self {
            kind: ElementKind::Base,
            owner: None,
            pos,
            hp: config::BASE_HEALTH,
            max_hp: config::BASE_HEALTH,
        }
    }

    pub fn soldier(pos: Pos) -> Self {
        Self {
            kind: ElementKind::Soldier {
                attack: config::SOLDIER_ATTACK,
                can_move: true,
                facing_right: true,
            },
            owner: None,
            pos,
            hp: config::SOLDIER_HEALTH,
            max_hp: config::SOLDIER_HEALTH_CAP,
        }
    }

    pub fn house(pos: Pos) -> Self {
        Self {
            kind: ElementKind::House,
            owner: None,
            pos,
            hp: config::HOUSE_HEALTH,
            max_hp: config::HOUSE_HEALTH,
        }
    }

    pub fn attack_tower(pos: Pos) -> Self {
        Self {
            kind: ElementKind::AttackTower,
            owner: None,
            pos,
            hp: config::ATTACK_TOWER_HEALTH,
            max_hp: config::ATTACK_TOWER_HEALTH,
        }
    }

    pub fn defense_tower(pos: Pos) -> Self {
        Self {
            kind: ElementKind::DefenseTower,
            owner: None,
            pos,
            hp: config::DEFENSE_TOWER_HEALTH,
            max_hp: config::DEFENSE_TOWER_HEALTH,
        }
    }

    pub fn forest_tree(pos: Pos) -> Self {
        Self {
            kind: ElementKind::ForestTree {
                reward: config::TREE_REWARD,
            },
            owner: None,
            pos,
            hp: config::TREE_HEALTH,
            max_hp: config::TREE_HEALTH,
        }
    }

    pub fn purchased(kind: PurchaseKind, pos: Pos, owner: PlayerId) -> Self {
        let mut el = match kind {
            PurchaseKind::Soldier => Self::soldier(pos),
            PurchaseKind::House => Self::house(pos),
            PurchaseKind::AttackTower => Self::attack_tower(pos),
            PurchaseKind::DefenseTower => Self::defense_tower(pos),
        };
        el.owner = Some(owner);
        el
    }

    pub fn is_soldier(&self) -> bool {
        self.kind.is_soldier()
    }

    pub fn is_tree(&self) -> bool {
        self.kind.is_tree()
    }

    pub fn is_base(&self) -> bool {
        matches!(self.kind, ElementKind::Base)
    }

    pub fn attack(&self) -> i32 {
        match self.kind {
            ElementKind::Soldier { attack, .. } => attack,
            _ => 0,
        }
    }

    /// Soldier stat sum, used by advantage comparisons.
    pub fn strength(&self) -> i32 {
        self.attack() + self.hp
    }

    pub fn can_move(&self) -> bool {
        matches!(self.kind, ElementKind::Soldier { can_move: true, .. })
    }

    pub fn set_can_move(&mut self, value: bool) {
        if let ElementKind::Soldier { can_move, .. } = &mut self.kind {
            *can_move = value;
        }
    }

    pub fn face_toward(&mut self, target: Pos) {
        if let ElementKind::Soldier { facing_right, .. } = &mut self.kind {
            if target.x != self.pos.x {
                *facing_right = target.x > self.pos.x;
            }
        }
    }

    /// Apply damage; returns true when the element is destroyed.
    pub fn take_damage(&mut self, amount: i32) -> bool {
        self.hp -= amount;
        self.hp <= 0
    }
}

pub fn price_of(kind: PurchaseKind) -> i32 {
    match kind {
        PurchaseKind::Soldier => config::SOLDIER_PRICE,
        PurchaseKind::House => config::HOUSE_PRICE,
        PurchaseKind::AttackTower => config::ATTACK_TOWER_PRICE,
        PurchaseKind::DefenseTower => config::DEFENSE_TOWER_PRICE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn purchase_sets_owner_and_stats() {
        let el = Element::purchased(PurchaseKind::Soldier, Pos::new(2, 3), PlayerId(1));
        assert_eq!(el.owner, Some(PlayerId(1)));
        assert_eq!(el.hp, config::SOLDIER_HEALTH);
        assert_eq!(el.attack(), config::SOLDIER_ATTACK);
        assert!(el.can_move());
    }

    #[test]
    fn facing_follows_horizontal_movement() {
        let mut el = Element::soldier(Pos::new(5, 5));
        el.face_toward(Pos::new(3, 5));
        assert!(matches!(
            el.kind,
            ElementKind::Soldier {
                facing_right: false,
                ..
            }
        ));
        // vertical moves keep the last facing
        el.face_toward(Pos::new(5, 7));
        assert!(matches!(
            el.kind,
            ElementKind::Soldier {
                facing_right: false,
                ..
            }
        ));
    }

    #[test]
    fn damage_kills_at_zero() {
        let mut el = Element::house(Pos::new(0, 0));
        assert!(!el.take_damage(1));
        assert!(el.take_damage(1));
    }
}
