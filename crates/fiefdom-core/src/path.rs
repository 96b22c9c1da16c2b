use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};

use fiefdom_protocol::{PlayerId, Pos};

use crate::{map::GameMap, occupancy::OccupancyIndex, store::ElementArena};

/// A cell blocks the path when it is removed or holds an element the querying
/// player does not own. The two endpoints are always passable.
fn passable(
    map: &GameMap,
    arena: &ElementArena,
    occupancy: &OccupancyIndex,
    player: PlayerId,
    pos: Pos,
) -> bool {
    if !map.is_usable(pos) {
        return false;
    }
    match occupancy.get(pos).and_then(|id| arena.get(id)) {
        Some(el) => el.owner == Some(player),
        None => true,
    }
}

/// Orthogonal A* from `from` to `to`, g = steps taken, h = manhattan.
///
/// Returns the full path including both endpoints, or `None` when the
/// destination cannot be reached. Cells on the x = 0 or y = 0 edge do not
/// expand neighbors; shipped maps keep their border removed, so this only
/// shows up on synthetic boards.
pub fn a_star(
    map: &GameMap,
    arena: &ElementArena,
    occupancy: &OccupancyIndex,
    player: PlayerId,
    from: Pos,
    to: Pos,
) -> Option<Vec<Pos>> {
    if !map.is_usable(from) || !map.is_usable(to) {
        return None;
    }
    if from == to {
        return Some(vec![from]);
    }

    let mut open: BinaryHeap<Reverse<(i32, i32, i32)>> = BinaryHeap::new();
    let mut came_from: HashMap<Pos, Pos> = HashMap::new();
    let mut g_score: HashMap<Pos, i32> = HashMap::new();

    g_score.insert(from, 0);
    open.push(Reverse((from.manhattan(to), from.y, from.x)));

    while let Some(Reverse((_, y, x))) = open.pop() {
        let current = Pos::new(x, y);
        if current == to {
            let mut path = vec![to];
            let mut cursor = to;
            while let Some(&prev) = came_from.get(&cursor) {
                path.push(prev);
                cursor = prev;
            }
            path.reverse();
            return Some(path);
        }

        if current.x <= 0 || current.y <= 0 {
            continue;
        }

        let g = g_score[&current];
        for n in map.neighbors4(current).collect::<Vec<_>>() {
            if n != from && n != to && !passable(map, arena, occupancy, player, n) {
                continue;
            }
            if !map.is_usable(n) {
                continue;
            }
            let tentative = g + 1;
            if g_score.get(&n).map(|&old| tentative < old).unwrap_or(true) {
                g_score.insert(n, tentative);
                came_from.insert(n, current);
                open.push(Reverse((tentative + n.manhattan(to), n.y, n.x)));
            }
        }
    }

    None
}

/// The best next cell on the way from `anchor` to `destination`, restricted
/// to `candidates` (typically a soldier's reach). Runs the search backward
/// from the destination and takes the candidate closest to it.
pub fn step_toward(
    map: &GameMap,
    arena: &ElementArena,
    occupancy: &OccupancyIndex,
    player: PlayerId,
    anchor: Pos,
    destination: Pos,
    candidates: &[Pos],
) -> Option<Pos> {
    let path = a_star(map, arena, occupancy, player, destination, anchor)?;
    // path runs destination -> anchor; scan from the destination end
    path.iter()
        .copied()
        .take_while(|&p| p != anchor)
        .find(|p| candidates.contains(p))
}
