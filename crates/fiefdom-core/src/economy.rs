use fiefdom_protocol::{Difficulty, ElementKind};

use crate::{
    config, map::GameMap, players::Player, players::PlayerRegistry, store::ElementArena,
};

/// Recompute a player's gold-per-turn from scratch.
///
/// Income: base amount, each house, and each owned empty cell. Upkeep: each
/// soldier costs attack + health + a flat part, towers cost flat amounts.
/// Unfair bots earn double. The result is clamped to the per-turn cap and can
/// go negative; total gold is clamped separately when income is granted.
pub fn recompute_player(player: &mut Player, map: &GameMap, arena: &ElementArena) {
    let mut income = config::BASE_INCOME;

    for id in &player.elements {
        let Some(element) = arena.get(*id) else {
            continue;
        };
        match element.kind {
            ElementKind::House => income += config::HOUSE_INCOME,
            ElementKind::Soldier { attack, .. } => {
                income -= attack + element.hp + config::SOLDIER_BASE_UPKEEP;
            }
            ElementKind::AttackTower => income -= config::ATTACK_TOWER_UPKEEP,
            ElementKind::DefenseTower => income -= config::DEFENSE_TOWER_UPKEEP,
            ElementKind::Base | ElementKind::ForestTree { .. } => {}
        }
    }

    for pos in &player.owned_cells {
        if map.is_free(*pos) {
            income += 1;
        }
    }

    if player.is_bot && player.difficulty == Difficulty::Unfair {
        income *= 2;
    }

    player.gold_per_turn = income.min(config::INCOME_CAP);
    player.gold = player.gold.min(config::GOLD_CAP);
}

/// Recompute everyone. Eliminated players keep their zeroed currencies.
pub fn recompute_all(registry: &mut PlayerRegistry, map: &GameMap, arena: &ElementArena) {
    // split borrow: ownership scans only need &Player data already inside
    let ids: Vec<_> = registry.iter().map(|p| p.id).collect();
    for id in ids {
        let Some(player) = registry.get_mut(id) else {
            continue;
        };
        if player.eliminated {
            continue;
        }
        recompute_player(player, map, arena);
    }
}

/// Add the per-turn income to the total, clamped to `[0, GOLD_CAP]`.
pub fn grant_income(player: &mut Player) -> i32 {
    let before = player.gold;
    player.gold = (player.gold + player.gold_per_turn).clamp(0, config::GOLD_CAP);
    player.gold - before
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::Element;
    use crate::occupancy::OccupancyIndex;
    use crate::rng::GameRng;
    use fiefdom_protocol::{PlayerId, Pos};

    fn seated() -> (GameMap, ElementArena, OccupancyIndex, PlayerRegistry, PlayerId) {
        let mut map = GameMap::build_default();
        let mut arena = ElementArena::default();
        let mut occ = OccupancyIndex::default();
        let mut rng = GameRng::seed_from_u64(7);
        let mut reg = PlayerRegistry::default();
        let id = reg
            .add_player(
                &mut map,
                &mut arena,
                &mut occ,
                &mut rng,
                false,
                Difficulty::Normal,
                config::STARTING_GOLD,
                config::BASE_INCOME,
            )
            .unwrap();
        (map, arena, occ, reg, id)
    }

    #[test]
    fn income_counts_houses_soldiers_and_empty_cells() {
        let (mut map, mut arena, mut occ, mut reg, id) = seated();

        let free_cells: Vec<Pos> = {
            let player = reg.get(id).unwrap();
            player
                .owned_cells
                .iter()
                .copied()
                .filter(|p| map.is_free(*p))
                .collect()
        };
        let empty_count = free_cells.len() as i32;

        recompute_player(reg.get_mut(id).unwrap(), &map, &arena);
        assert_eq!(
            reg.get(id).unwrap().gold_per_turn,
            config::BASE_INCOME + empty_count
        );

        // a house adds its bonus and takes one empty cell away
        let mut house = Element::house(free_cells[0]);
        house.owner = Some(id);
        let house_id = occ.place(&mut map, &mut arena, house).unwrap();
        reg.get_mut(id).unwrap().elements.push(house_id);

        recompute_player(reg.get_mut(id).unwrap(), &map, &arena);
        assert_eq!(
            reg.get(id).unwrap().gold_per_turn,
            config::BASE_INCOME + config::HOUSE_INCOME + empty_count - 1
        );

        // a fresh soldier costs attack + health + flat, and another empty cell
        let mut soldier = Element::soldier(free_cells[1]);
        soldier.owner = Some(id);
        let soldier_id = occ.place(&mut map, &mut arena, soldier).unwrap();
        reg.get_mut(id).unwrap().elements.push(soldier_id);

        recompute_player(reg.get_mut(id).unwrap(), &map, &arena);
        let upkeep = config::SOLDIER_ATTACK + config::SOLDIER_HEALTH + config::SOLDIER_BASE_UPKEEP;
        assert_eq!(
            reg.get(id).unwrap().gold_per_turn,
            config::BASE_INCOME + config::HOUSE_INCOME + empty_count - 2 - upkeep
        );
    }

    #[test]
    fn recompute_is_idempotent() {
        let (map, arena, _occ, mut reg, id) = seated();
        recompute_player(reg.get_mut(id).unwrap(), &map, &arena);
        let once = reg.get(id).unwrap().gold_per_turn;
        recompute_player(reg.get_mut(id).unwrap(), &map, &arena);
        assert_eq!(reg.get(id).unwrap().gold_per_turn, once);
    }

    #[test]
    fn caps_apply() {
        let (map, arena, _occ, mut reg, id) = seated();
        {
            let player = reg.get_mut(id).unwrap();
            player.gold = 5000;
        }
        recompute_player(reg.get_mut(id).unwrap(), &map, &arena);
        assert_eq!(reg.get(id).unwrap().gold, config::GOLD_CAP);
        assert!(reg.get(id).unwrap().gold_per_turn <= config::INCOME_CAP);
    }

    #[test]
    fn unfair_bots_earn_double() {
        let (map, arena, _occ, mut reg, id) = seated();
        recompute_player(reg.get_mut(id).unwrap(), &map, &arena);
        let normal = reg.get(id).unwrap().gold_per_turn;
        {
            let player = reg.get_mut(id).unwrap();
            player.is_bot = true;
            player.difficulty = Difficulty::Unfair;
        }
        recompute_player(reg.get_mut(id).unwrap(), &map, &arena);
        assert_eq!(reg.get(id).unwrap().gold_per_turn, (normal * 2).min(config::INCOME_CAP));
    }

    #[test]
    fn grant_income_clamps_total() {
        let (map, arena, _occ, mut reg, id) = seated();
        recompute_player(reg.get_mut(id).unwrap(), &map, &arena);
        let player = reg.get_mut(id).unwrap();
        player.gold = config::GOLD_CAP - 1;
        let granted = grant_income(player);
        assert_eq!(granted, 1);
        assert_eq!(player.gold, config::GOLD_CAP);
    }
}
