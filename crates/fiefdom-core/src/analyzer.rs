//! Board-reading predicates backing the bot's decisions.

use fiefdom_protocol::{PlayerId, Pos};

use crate::{
    config::SOLDIER_ATTACK_CAP,
    element::Element,
    map::GameMap,
    occupancy::OccupancyIndex,
    players::PlayerRegistry,
    search::{allied_soldiers_in_zone, enemy_soldiers_in_zone, soldiers_in_zone},
    store::ElementArena,
};

/// A soldier holds the advantage in a zone when the enemy soldiers there can
/// muster some attack, but less than the allied soldiers' combined health.
pub fn soldier_has_advantage(
    arena: &ElementArena,
    occupancy: &OccupancyIndex,
    zone: &[Pos],
    player: PlayerId,
) -> bool {
    let allies_health: i32 = allied_soldiers_in_zone(arena, occupancy, zone, player)
        .iter()
        .map(|(_, el)| el.hp)
        .sum();
    let enemies_attack: i32 = enemy_soldiers_in_zone(arena, occupancy, zone, player)
        .iter()
        .map(|(_, el)| el.attack())
        .sum();
    enemies_attack != 0 && enemies_attack < allies_health
}

/// Combined allied soldier strength at least matches the enemies' in the zone.
pub fn has_army_advantage_in_zone(
    arena: &ElementArena,
    occupancy: &OccupancyIndex,
    zone: &[Pos],
    player: PlayerId,
) -> bool {
    let mut allied = 0;
    let mut enemy = 0;
    for (_, el) in soldiers_in_zone(arena, occupancy, zone) {
        if el.owner == Some(player) {
            allied += el.strength();
        } else if el.owner.is_some() {
            enemy += el.strength();
        }
    }
    allied >= enemy
}

/// One blow from the attacker finishes the defender.
pub fn is_favorable_to_attack(attacker: &Element, defender: &Element) -> bool {
    defender.hp <= attacker.attack()
}

pub fn is_stronger(a: &Element, b: &Element) -> bool {
    a.strength() > b.strength()
}

/// Merging is worth it while the combined attack stays clear of the cap.
pub fn is_favorable_to_merge(a: &Element, b: &Element) -> bool {
    a.attack() + b.attack() < SOLDIER_ATTACK_CAP * 3 / 2
}

/// The player currently holds the smallest territory among living players.
pub fn player_has_territory_disadvantage(registry: &PlayerRegistry, player: PlayerId) -> bool {
    let Some(own) = registry.get(player) else {
        return false;
    };
    registry
        .iter()
        .filter(|p| !p.eliminated && p.id != player)
        .all(|p| p.owned_cells.len() >= own.owned_cells.len())
}

/// Convenience wrapper used by the bot when sizing up a spot on the map.
pub fn zone_is_contested(
    map: &GameMap,
    arena: &ElementArena,
    occupancy: &OccupancyIndex,
    center: Pos,
    radius: i32,
    player: PlayerId,
) -> bool {
    let zone = crate::search::cells_around(map, center, radius, true);
    !enemy_soldiers_in_zone(arena, occupancy, &zone, player).is_empty()
}
