//! Spatial queries over the board: zones, reachability, nearest/farthest.
//!
//! Zone searches expand outward ring by ring so the result order is stable;
//! ties in nearest/farthest go to the first candidate encountered.

use fiefdom_protocol::{ElementId, PlayerId, Pos};

use crate::{
    config::SOLDIER_MOVE_RANGE, element::Element, map::GameMap, occupancy::OccupancyIndex,
    players::PlayerRegistry, store::ElementArena,
};

/// All usable cells within `radius` steps of `center`, center included.
/// With `diagonals` the zone is a square, without it a diamond.
pub fn cells_around(map: &GameMap, center: Pos, radius: i32, diagonals: bool) -> Vec<Pos> {
    let mut out = Vec::new();
    if map.is_usable(center) {
        out.push(center);
    }
    let mut ring = vec![center];
    for _ in 0..radius {
        let mut next = Vec::new();
        for &p in &ring {
            let neighbors: Vec<Pos> = if diagonals {
                map.neighbors8(p).collect()
            } else {
                map.neighbors4(p).collect()
            };
            for n in neighbors {
                if map.is_usable(n) && !out.contains(&n) {
                    out.push(n);
                    next.push(n);
                }
            }
        }
        ring = next;
    }
    out
}

/// Cells a soldier at `from` may be sent to.
///
/// Movement expands through cells the soldier's owner holds that are empty,
/// up to the move range. At each step the raw orthogonal fringe of the
/// expansion is also collected, which is what makes an enemy or a tree
/// standing next to reachable territory a legal target without being a
/// legal stand.
pub fn soldier_reach(
    map: &GameMap,
    registry: &PlayerRegistry,
    player: PlayerId,
    from: Pos,
) -> Vec<Pos> {
    let mut reach = Vec::new();
    let mut expanded = vec![from];
    let mut ring = vec![from];
    for _ in 0..SOLDIER_MOVE_RANGE {
        let mut next = Vec::new();
        for &p in &ring {
            for n in map.neighbors4(p).collect::<Vec<_>>() {
                if !map.is_usable(n) || n == from {
                    continue;
                }
                if !reach.contains(&n) {
                    reach.push(n);
                }
                if registry.owner_of(n) == Some(player)
                    && map.is_free(n)
                    && !expanded.contains(&n)
                {
                    expanded.push(n);
                    next.push(n);
                }
            }
        }
        ring = next;
    }
    reach
}

/// First-encountered nearest candidate by truncated euclidean distance.
pub fn nearest_pos(from: Pos, candidates: &[Pos]) -> Option<Pos> {
    candidates
        .iter()
        .copied()
        .fold(None, |best: Option<(Pos, i32)>, p| {
            let d = from.distance(p);
            match best {
                Some((_, bd)) if bd <= d => best,
                _ => Some((p, d)),
            }
        })
        .map(|(p, _)| p)
}

pub fn farthest_pos(from: Pos, candidates: &[Pos]) -> Option<Pos> {
    candidates
        .iter()
        .copied()
        .fold(None, |best: Option<(Pos, i32)>, p| {
            let d = from.distance(p);
            match best {
                Some((_, bd)) if bd >= d => best,
                _ => Some((p, d)),
            }
        })
        .map(|(p, _)| p)
}

/// Elements standing inside a zone, in zone order.
pub fn elements_in_zone<'a>(
    arena: &'a ElementArena,
    occupancy: &OccupancyIndex,
    zone: &[Pos],
) -> Vec<(ElementId, &'a Element)> {
    zone.iter()
        .filter_map(|pos| {
            let id = occupancy.get(*pos)?;
            arena.get(id).map(|el| (id, el))
        })
        .collect()
}

pub fn soldiers_in_zone<'a>(
    arena: &'a ElementArena,
    occupancy: &OccupancyIndex,
    zone: &[Pos],
) -> Vec<(ElementId, &'a Element)> {
    elements_in_zone(arena, occupancy, zone)
        .into_iter()
        .filter(|(_, el)| el.is_soldier())
        .collect()
}

pub fn enemy_soldiers_in_zone<'a>(
    arena: &'a ElementArena,
    occupancy: &OccupancyIndex,
    zone: &[Pos],
    player: PlayerId,
) -> Vec<(ElementId, &'a Element)> {
    soldiers_in_zone(arena, occupancy, zone)
        .into_iter()
        .filter(|(_, el)| el.owner.is_some() && el.owner != Some(player))
        .collect()
}

pub fn allied_soldiers_in_zone<'a>(
    arena: &'a ElementArena,
    occupancy: &OccupancyIndex,
    zone: &[Pos],
    player: PlayerId,
) -> Vec<(ElementId, &'a Element)> {
    soldiers_in_zone(arena, occupancy, zone)
        .into_iter()
        .filter(|(_, el)| el.owner == Some(player))
        .collect()
}

/// Historically this picked by maximum strength rather than minimum, and the
/// bot heuristics are tuned against that ordering, so it stays.
pub fn weakest_enemy_soldier_in_zone(
    arena: &ElementArena,
    occupancy: &OccupancyIndex,
    zone: &[Pos],
    player: PlayerId,
) -> Option<ElementId> {
    let mut best: Option<(ElementId, i32)> = None;
    for (id, el) in enemy_soldiers_in_zone(arena, occupancy, zone, player) {
        let s = el.strength();
        match best {
            Some((_, bs)) if bs >= s => {}
            _ => best = Some((id, s)),
        }
    }
    best.map(|(id, _)| id)
}

/// Nearest element satisfying a predicate, scanning the arena in slot order.
pub fn nearest_element<F>(arena: &ElementArena, from: Pos, pred: F) -> Option<(ElementId, Pos)>
where
    F: Fn(&Element) -> bool,
{
    let mut best: Option<(ElementId, Pos, i32)> = None;
    for (id, el) in arena.iter_ordered() {
        if !pred(el) {
            continue;
        }
        let d = from.distance(el.pos);
        match best {
            Some((_, _, bd)) if bd <= d => {}
            _ => best = Some((id, el.pos, d)),
        }
    }
    best.map(|(id, pos, _)| (id, pos))
}

/// Owned cells touching at least one usable cell the player does not hold.
pub fn frontier_cells(map: &GameMap, registry: &PlayerRegistry, player: PlayerId) -> Vec<Pos> {
    let Some(p) = registry.get(player) else {
        return Vec::new();
    };
    p.owned_cells
        .iter()
        .copied()
        .filter(|&cell| {
            map.neighbors4(cell)
                .any(|n| map.is_usable(n) && registry.owner_of(n) != Some(player))
        })
        .collect()
}

/// The usable rim just outside the player's territory.
pub fn outer_frontier_cells(
    map: &GameMap,
    registry: &PlayerRegistry,
    player: PlayerId,
) -> Vec<Pos> {
    let Some(p) = registry.get(player) else {
        return Vec::new();
    };
    let mut out = Vec::new();
    for &cell in &p.owned_cells {
        for n in map.neighbors4(cell).collect::<Vec<_>>() {
            if map.is_usable(n) && registry.owner_of(n) != Some(player) && !out.contains(&n) {
                out.push(n);
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config;
    use crate::rng::GameRng;
    use fiefdom_protocol::Difficulty;

    #[test]
    fn cells_around_diamond_and_square() {
        let map = GameMap::parse_shape(".....\n.....\n.....\n.....\n.....").unwrap();
        let center = Pos::new(2, 2);

        let diamond = cells_around(&map, center, 1, false);
        assert_eq!(diamond.len(), 5); // center + 4

        let square = cells_around(&map, center, 1, true);
        assert_eq!(square.len(), 9); // center + 8

        let big = cells_around(&map, center, 2, true);
        assert_eq!(big.len(), 25);
    }

    #[test]
    fn cells_around_skips_removed() {
        let map = GameMap::parse_shape("..X\n...\n...").unwrap();
        let zone = cells_around(&map, Pos::new(1, 1), 1, true);
        assert_eq!(zone.len(), 8);
        assert!(!zone.contains(&Pos::new(2, 0)));
    }

    #[test]
    fn nearest_ties_go_to_first_candidate() {
        let from = Pos::new(0, 0);
        let candidates = [Pos::new(3, 0), Pos::new(0, 3), Pos::new(5, 5)];
        assert_eq!(nearest_pos(from, &candidates), Some(Pos::new(3, 0)));
        assert_eq!(farthest_pos(from, &candidates), Some(Pos::new(5, 5)));
    }

    #[test]
    fn soldier_reach_includes_adjacent_targets_but_not_far_enemies() {
        let mut map = GameMap::build_default();
        let mut arena = ElementArena::default();
        let mut occ = OccupancyIndex::default();
        let mut rng = GameRng::seed_from_u64(1);
        let mut reg = PlayerRegistry::default();
        let id = reg
            .add_player(
                &mut map,
                &mut arena,
                &mut occ,
                &mut rng,
                true,
                Difficulty::Normal,
                config::STARTING_GOLD,
                config::BASE_INCOME,
            )
            .unwrap();

        let player = reg.get(id).unwrap();
        let home = player.home;
        // pick an owned free cell orthogonally adjacent to home
        let start = map
            .neighbors4(home)
            .find(|n| reg.owner_of(*n) == Some(id) && map.is_free(*n))
            .unwrap();

        let reach = soldier_reach(&map, &reg, id, start);
        // the occupied home cell is a legal target via the raw fringe
        assert!(reach.contains(&home));
        assert!(!reach.contains(&start));
        // everything in reach is within the move range in manhattan terms
        for p in &reach {
            assert!(start.manhattan(*p) <= config::SOLDIER_MOVE_RANGE + 1);
        }
    }

    #[test]
    fn frontier_is_rim_of_territory() {
        let mut map = GameMap::build_default();
        let mut arena = ElementArena::default();
        let mut occ = OccupancyIndex::default();
        let mut rng = GameRng::seed_from_u64(5);
        let mut reg = PlayerRegistry::default();
        let id = reg
            .add_player(
                &mut map,
                &mut arena,
                &mut occ,
                &mut rng,
                true,
                Difficulty::Normal,
                config::STARTING_GOLD,
                config::BASE_INCOME,
            )
            .unwrap();

        let frontier = frontier_cells(&map, &reg, id);
        let outer = outer_frontier_cells(&map, &reg, id);
        assert!(!frontier.is_empty());
        assert!(!outer.is_empty());
        for cell in &frontier {
            assert_eq!(reg.owner_of(*cell), Some(id));
        }
        for cell in &outer {
            assert_ne!(reg.owner_of(*cell), Some(id));
        }
    }
}
