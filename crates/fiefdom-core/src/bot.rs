//! Scripted opponent. Plays one full turn for the current player through the
//! same command surface a client uses; every action goes through the lenient
//! `apply_command` path so an illegal idea is just skipped.

use tracing::debug;

use fiefdom_protocol::{Command, ElementId, ElementKind, PlayerId, Pos, PurchaseKind};

use crate::{
    analyzer::{
        has_army_advantage_in_zone, is_favorable_to_merge, player_has_territory_disadvantage,
        soldier_has_advantage, zone_is_contested,
    },
    config,
    element::price_of,
    engine::GameEngine,
    search::{
        cells_around, farthest_pos, frontier_cells, nearest_element, nearest_pos,
        outer_frontier_cells, soldier_reach, weakest_enemy_soldier_in_zone,
    },
};

/// Turns a bot spends buying soldiers before it starts building.
const OPENING_TURNS: u32 = 15;
const MAX_SOLDIERS_PER_TURN: usize = 4;
const MAX_STRUCTURES_PER_TURN: usize = 8;
const DEFEND_ROUNDS: usize = 8;
/// Below this income and territory the bot keeps pushing its border.
const FRONTIER_PUSH_MAX_INCOME: i32 = 30;
const FRONTIER_PUSH_MAX_CELLS: usize = 60;
const RESCUE_GOLD_FLOOR: i32 = 200;
const GARRISON_GOLD_FLOOR: i32 = 300;

/// Play one turn for the current player. Does not end the turn; the caller
/// decides when to advance the rotation.
pub fn run_bot_turn(engine: &mut GameEngine) {
    if engine.is_game_over() {
        return;
    }
    let player = engine.current_player();
    debug!(player = player.0, "bot turn");

    defend_base(engine, player);
    attack_enemy_bases(engine, player);
    retreat_to_allies(engine, player);
    merge_when_advantaged(engine, player);
    attack_enemy_towers(engine, player);
    buy_soldier_when_frontier_is_bare(engine, player);
    conquer_around_base(engine, player);
    contest_bonus_cells(engine, player);
    buy_soldier_near_trees(engine, player);
    buy_soldier_near_weak_enemies(engine, player);
    go_shopping(engine, player);
    move_remaining_soldiers(engine, player);
    rescue_weak_soldiers(engine, player);
    garrison_exposed_houses(engine, player);
}

fn gold(engine: &GameEngine, player: PlayerId) -> i32 {
    engine
        .state()
        .players
        .get(player)
        .map(|p| p.gold)
        .unwrap_or(0)
}

fn home_of(engine: &GameEngine, player: PlayerId) -> Option<Pos> {
    engine.state().players.get(player).map(|p| p.home)
}

fn movable_soldiers(engine: &GameEngine, player: PlayerId) -> Vec<(ElementId, Pos)> {
    engine
        .state()
        .elements
        .iter_ordered()
        .filter(|(_, el)| el.owner == Some(player) && el.can_move())
        .map(|(id, el)| (id, el.pos))
        .collect()
}

fn free_owned_cells(engine: &GameEngine, player: PlayerId) -> Vec<Pos> {
    let state = engine.state();
    state
        .players
        .get(player)
        .map(|p| {
            p.owned_cells
                .iter()
                .copied()
                .filter(|&c| state.map.is_free(c))
                .collect()
        })
        .unwrap_or_default()
}

fn buy(engine: &mut GameEngine, kind: PurchaseKind, at: Pos) -> bool {
    !engine.apply_command(Command::Buy { kind, at }).is_empty()
}

fn try_move(engine: &mut GameEngine, from: Pos, to: Pos) -> bool {
    !engine
        .apply_command(Command::MoveSoldier { from, to })
        .is_empty()
}

fn try_move_toward(engine: &mut GameEngine, from: Pos, toward: Pos) -> bool {
    !engine
        .apply_command(Command::MoveSoldierToward { from, toward })
        .is_empty()
}

/// Push intruders away from the base: nearby soldiers engage the biggest
/// threat and fresh soldiers are bought next to the base while gold lasts.
fn defend_base(engine: &mut GameEngine, player: PlayerId) {
    let Some(home) = home_of(engine, player) else {
        return;
    };
    for _ in 0..DEFEND_ROUNDS {
        let threat_pos = {
            let state = engine.state();
            let zone = cells_around(&state.map, home, 3, true);
            weakest_enemy_soldier_in_zone(&state.elements, &state.occupancy, &zone, player)
                .and_then(|id| state.elements.get(id))
                .map(|el| el.pos)
        };
        let Some(threat) = threat_pos else {
            break;
        };

        let mut acted = false;
        for (_, pos) in movable_soldiers(engine, player) {
            if pos.distance(threat) <= config::SOLDIER_MOVE_RANGE {
                acted |= try_move(engine, pos, threat);
            }
        }
        if gold(engine, player) >= price_of(PurchaseKind::Soldier) {
            let spot = nearest_pos(home, &free_owned_cells(engine, player));
            if let Some(spot) = spot {
                acted |= buy(engine, PurchaseKind::Soldier, spot);
            }
        }
        if !acted {
            break;
        }
    }
}

/// Soldiers converge on the nearest enemy base once the zone around it is
/// winnable.
fn attack_enemy_bases(engine: &mut GameEngine, player: PlayerId) {
    for (_, pos) in movable_soldiers(engine, player) {
        let target = {
            let state = engine.state();
            let base = nearest_element(&state.elements, pos, |el| {
                el.is_base() && el.owner.is_some() && el.owner != Some(player)
            });
            base.filter(|(_, base_pos)| {
                let zone = cells_around(&state.map, *base_pos, 2, true);
                has_army_advantage_in_zone(&state.elements, &state.occupancy, &zone, player)
            })
            .map(|(_, base_pos)| base_pos)
        };
        let Some(base_pos) = target else {
            continue;
        };
        if pos.is_adjacent(base_pos) {
            try_move(engine, pos, base_pos);
        } else if pos.distance(base_pos) <= config::SOLDIER_MOVE_RANGE * 2 {
            try_move_toward(engine, pos, base_pos);
        }
    }
}

/// Soldiers on their last hit point fall back toward friends instead of
/// trading themselves away.
fn retreat_to_allies(engine: &mut GameEngine, player: PlayerId) {
    for (id, pos) in movable_soldiers(engine, player) {
        let rally = {
            let state = engine.state();
            let Some(el) = state.elements.get(id) else {
                continue;
            };
            if el.hp > 1
                || !zone_is_contested(&state.map, &state.elements, &state.occupancy, pos, 2, player)
            {
                continue;
            }
            nearest_element(&state.elements, pos, |other| {
                other.is_soldier() && other.owner == Some(player) && other.pos != pos
            })
            .map(|(_, ally_pos)| ally_pos)
        };
        if let Some(ally) = rally {
            try_move_toward(engine, pos, ally);
        }
    }
}

/// Stack adjacent soldiers under pressure, while the merge stays below the
/// attack cap.
fn merge_when_advantaged(engine: &mut GameEngine, player: PlayerId) {
    for (id, pos) in movable_soldiers(engine, player) {
        let partner = {
            let state = engine.state();
            let Some(el) = state.elements.get(id) else {
                continue;
            };
            if !zone_is_contested(&state.map, &state.elements, &state.occupancy, pos, 3, player) {
                continue;
            }
            state
                .map
                .neighbors4(pos)
                .find_map(|n| {
                    let other = state.elements.get(state.occupancy.get(n)?)?;
                    if other.is_soldier()
                        && other.owner == Some(player)
                        && is_favorable_to_merge(el, other)
                    {
                        Some(n)
                    } else {
                        None
                    }
                })
        };
        if let Some(partner) = partner {
            try_move(engine, pos, partner);
        }
    }
}

/// Attack towers bleed soldiers every turn, so they are torn down on sight.
fn attack_enemy_towers(engine: &mut GameEngine, player: PlayerId) {
    for (_, pos) in movable_soldiers(engine, player) {
        let tower = {
            let state = engine.state();
            nearest_element(&state.elements, pos, |el| {
                matches!(el.kind, ElementKind::AttackTower)
                    && el.owner.is_some()
                    && el.owner != Some(player)
            })
            .map(|(_, tower_pos)| tower_pos)
        };
        let Some(tower_pos) = tower else {
            return;
        };
        if pos.is_adjacent(tower_pos) {
            try_move(engine, pos, tower_pos);
        } else if pos.distance(tower_pos) <= config::SOLDIER_MOVE_RANGE {
            try_move_toward(engine, pos, tower_pos);
        }
    }
}

/// An unguarded border invites raids; put one soldier on it.
fn buy_soldier_when_frontier_is_bare(engine: &mut GameEngine, player: PlayerId) {
    if gold(engine, player) < price_of(PurchaseKind::Soldier) {
        return;
    }
    let spot = {
        let state = engine.state();
        let frontier = frontier_cells(&state.map, &state.players, player);
        if frontier.is_empty() {
            return;
        }
        let guarded = state.elements.iter_ordered().any(|(_, el)| {
            el.owner == Some(player)
                && el.is_soldier()
                && frontier.iter().any(|&f| f.distance(el.pos) <= 2)
        });
        if guarded {
            return;
        }
        frontier.iter().copied().find(|&f| state.map.is_free(f))
    };
    if let Some(spot) = spot {
        buy(engine, PurchaseKind::Soldier, spot);
    }
}

/// Soldiers loitering near the base grab the neutral cells around them.
fn conquer_around_base(engine: &mut GameEngine, player: PlayerId) {
    let Some(home) = home_of(engine, player) else {
        return;
    };
    for (_, pos) in movable_soldiers(engine, player) {
        if pos.distance(home) > 3 {
            continue;
        }
        let cell = {
            let state = engine.state();
            let open: Vec<Pos> = state
                .map
                .neighbors4(pos)
                .filter(|&n| state.map.is_free(n) && state.players.owner_of(n).is_none())
                .collect();
            nearest_pos(home, &open)
        };
        if let Some(cell) = cell {
            try_move(engine, pos, cell);
        }
    }
}

/// Bonus cells pay double; walk soldiers onto unclaimed ones when the
/// surroundings are safe enough.
fn contest_bonus_cells(engine: &mut GameEngine, player: PlayerId) {
    let targets: Vec<Pos> = {
        let state = engine.state();
        state
            .map
            .iter_usable()
            .filter(|&p| {
                state.map.cell(p).map(|c| c.bonus).unwrap_or(false)
                    && state.players.owner_of(p) != Some(player)
            })
            .collect()
    };
    for target in targets {
        let mover = {
            let state = engine.state();
            if zone_is_contested(&state.map, &state.elements, &state.occupancy, target, 2, player)
                && !has_army_advantage_in_zone(
                    &state.elements,
                    &state.occupancy,
                    &cells_around(&state.map, target, 2, true),
                    player,
                )
            {
                continue;
            }
            movable_soldiers(engine, player)
                .into_iter()
                .filter(|(_, pos)| pos.distance(target) <= config::SOLDIER_MOVE_RANGE * 2)
                .min_by_key(|(_, pos)| pos.distance(target))
        };
        if let Some((_, pos)) = mover {
            try_move_toward(engine, pos, target);
        }
    }
}

/// Trees are free gold; station a soldier next to a cluster.
fn buy_soldier_near_trees(engine: &mut GameEngine, player: PlayerId) {
    if gold(engine, player) < price_of(PurchaseKind::Soldier) * 2 {
        return;
    }
    let spot = {
        let state = engine.state();
        let trees: Vec<Pos> = state
            .elements
            .iter_ordered()
            .filter(|(_, el)| el.is_tree())
            .map(|(_, el)| el.pos)
            .collect();
        free_owned_cells(engine, player)
            .into_iter()
            .find(|&c| trees.iter().any(|&t| c.distance(t) <= 2))
    };
    if let Some(spot) = spot {
        buy(engine, PurchaseKind::Soldier, spot);
    }
}

/// Reinforce a border cell that already has enemy soldiers looming over it.
fn buy_soldier_near_weak_enemies(engine: &mut GameEngine, player: PlayerId) {
    if gold(engine, player) < price_of(PurchaseKind::Soldier) {
        return;
    }
    let spot = {
        let state = engine.state();
        free_owned_cells(engine, player).into_iter().find(|&c| {
            let zone = cells_around(&state.map, c, 2, true);
            weakest_enemy_soldier_in_zone(&state.elements, &state.occupancy, &zone, player)
                .is_some()
                && !soldier_has_advantage(&state.elements, &state.occupancy, &zone, player)
        })
    };
    if let Some(spot) = spot {
        buy(engine, PurchaseKind::Soldier, spot);
    }
}

fn go_shopping(engine: &mut GameEngine, player: PlayerId) {
    let turns = engine.state().stats.turns_played(player);
    if turns < OPENING_TURNS {
        buy_aggressively(engine, player);
    } else {
        buy_balanced(engine, player);
    }
}

/// Opening: soldiers over everything, pushed toward the border.
fn buy_aggressively(engine: &mut GameEngine, player: PlayerId) {
    let mut bought = 0;
    while bought < MAX_SOLDIERS_PER_TURN
        && gold(engine, player) >= price_of(PurchaseKind::Soldier)
    {
        let Some(spot) = soldier_spot(engine, player) else {
            break;
        };
        if !buy(engine, PurchaseKind::Soldier, spot) {
            break;
        }
        bought += 1;
    }
}

/// Midgame: houses for income, towers on contested borders, soldiers with
/// the leftovers.
fn buy_balanced(engine: &mut GameEngine, player: PlayerId) {
    let mut houses = 0;
    while houses < MAX_STRUCTURES_PER_TURN
        && gold(engine, player) >= price_of(PurchaseKind::House)
        && engine
            .state()
            .players
            .get(player)
            .map(|p| p.gold_per_turn < config::INCOME_CAP)
            .unwrap_or(false)
    {
        let Some(spot) = quiet_spot(engine, player) else {
            break;
        };
        if !buy(engine, PurchaseKind::House, spot) {
            break;
        }
        houses += 1;
    }

    let mut towers = 0;
    while towers < MAX_STRUCTURES_PER_TURN
        && gold(engine, player) >= price_of(PurchaseKind::AttackTower)
    {
        let Some(spot) = contested_border_spot(engine, player) else {
            break;
        };
        let kind = if towers % 2 == 0 {
            PurchaseKind::AttackTower
        } else {
            PurchaseKind::DefenseTower
        };
        if !buy(engine, kind, spot) {
            break;
        }
        towers += 1;
    }

    let mut soldiers = 0;
    let wants_soldiers = player_has_territory_disadvantage(&engine.state().players, player);
    while wants_soldiers
        && soldiers < MAX_SOLDIERS_PER_TURN
        && gold(engine, player) >= price_of(PurchaseKind::Soldier)
    {
        let Some(spot) = soldier_spot(engine, player) else {
            break;
        };
        if !buy(engine, PurchaseKind::Soldier, spot) {
            break;
        }
        soldiers += 1;
    }
}

/// Free owned cell closest to the border; falls back to any free cell.
fn soldier_spot(engine: &GameEngine, player: PlayerId) -> Option<Pos> {
    let state = engine.state();
    let free = free_owned_cells(engine, player);
    let frontier = frontier_cells(&state.map, &state.players, player);
    frontier
        .iter()
        .copied()
        .find(|f| state.map.is_free(*f))
        .or_else(|| free.first().copied())
}

/// Free owned cell with no enemies around, nearest the base.
fn quiet_spot(engine: &GameEngine, player: PlayerId) -> Option<Pos> {
    let state = engine.state();
    let home = state.players.get(player)?.home;
    let calm: Vec<Pos> = free_owned_cells(engine, player)
        .into_iter()
        .filter(|&c| {
            !zone_is_contested(&state.map, &state.elements, &state.occupancy, c, 2, player)
        })
        .collect();
    nearest_pos(home, &calm)
}

/// Free border cell with enemy soldiers in sight.
fn contested_border_spot(engine: &GameEngine, player: PlayerId) -> Option<Pos> {
    let state = engine.state();
    frontier_cells(&state.map, &state.players, player)
        .into_iter()
        .find(|&c| {
            state.map.is_free(c)
                && zone_is_contested(&state.map, &state.elements, &state.occupancy, c, 2, player)
        })
}

fn move_remaining_soldiers(engine: &mut GameEngine, player: PlayerId) {
    for (id, from) in movable_soldiers(engine, player) {
        move_one_soldier(engine, player, id, from);
    }
}

/// The per-soldier decision ladder: loot, bonus cells, safe expansion,
/// frontier pushes, and finally drifting home.
fn move_one_soldier(engine: &mut GameEngine, player: PlayerId, id: ElementId, from: Pos) {
    let (reach, attack, hp) = {
        let state = engine.state();
        let Some(el) = state.elements.get(id) else {
            return;
        };
        if !el.can_move() {
            return;
        }
        (
            soldier_reach(&state.map, &state.players, player, from),
            el.attack(),
            el.hp,
        )
    };

    // loot in reach: trees and soft enemy structures
    let loot = {
        let state = engine.state();
        reach.iter().copied().find(|&p| {
            state
                .occupancy
                .get(p)
                .and_then(|tid| state.elements.get(tid))
                .map(|other| {
                    other.is_tree()
                        || (other.owner.is_some()
                            && other.owner != Some(player)
                            && matches!(
                                other.kind,
                                ElementKind::House | ElementKind::DefenseTower
                            ))
                })
                .unwrap_or(false)
        })
    };
    if let Some(target) = loot {
        if try_move(engine, from, target) {
            return;
        }
    }

    // healthy soldiers camp on owned bonus cells
    if hp > attack {
        let bonus = {
            let state = engine.state();
            reach.iter().copied().find(|&p| {
                state.map.is_free(p)
                    && state.map.cell(p).map(|c| c.bonus).unwrap_or(false)
                    && state.players.owner_of(p) == Some(player)
            })
        };
        if let Some(target) = bonus {
            if try_move(engine, from, target) {
                return;
            }
        }
    }

    // expand onto neutral ground where nobody stronger is waiting
    let expansion = {
        let state = engine.state();
        let strength = attack + hp;
        let open: Vec<Pos> = reach
            .iter()
            .copied()
            .filter(|&p| {
                if !state.map.is_free(p) || state.players.owner_of(p).is_some() {
                    return false;
                }
                let zone = cells_around(&state.map, p, 2, true);
                crate::search::enemy_soldiers_in_zone(
                    &state.elements,
                    &state.occupancy,
                    &zone,
                    player,
                )
                .iter()
                .all(|(_, enemy)| enemy.strength() <= strength)
            })
            .collect();
        nearest_pos(from, &open)
    };
    if let Some(target) = expansion {
        if try_move(engine, from, target) {
            return;
        }
    }

    // a poor, small realm keeps pushing its border
    let (income, cells) = {
        let state = engine.state();
        let Some(p) = state.players.get(player) else {
            return;
        };
        (p.gold_per_turn, p.owned_cells.len())
    };
    if income <= FRONTIER_PUSH_MAX_INCOME && cells <= FRONTIER_PUSH_MAX_CELLS {
        let push = {
            let state = engine.state();
            let outer: Vec<Pos> = outer_frontier_cells(&state.map, &state.players, player)
                .into_iter()
                .filter(|&p| state.map.is_free(p))
                .collect();
            nearest_pos(from, &outer)
        };
        if let Some(target) = push {
            if reach.contains(&target) && try_move(engine, from, target) {
                return;
            }
            if try_move_toward(engine, from, target) {
                return;
            }
        }
    }

    // a maxed-out soldier walks to the far border on its own
    if attack >= config::SOLDIER_ATTACK_CAP * 3 / 4 && hp >= config::SOLDIER_HEALTH_CAP * 3 / 4 {
        let push = {
            let state = engine.state();
            let outer: Vec<Pos> = outer_frontier_cells(&state.map, &state.players, player)
                .into_iter()
                .filter(|&p| state.map.is_free(p))
                .collect();
            nearest_pos(from, &outer)
        };
        if let Some(target) = push {
            if try_move_toward(engine, from, target) {
                return;
            }
        }
    }

    // wander: any free cell in reach, else the farthest owned one
    let wander = {
        let state = engine.state();
        let open: Vec<Pos> = reach
            .iter()
            .copied()
            .filter(|&p| state.map.is_free(p))
            .collect();
        open
    };
    if !wander.is_empty() {
        let pick = wander[engine.state_mut().rng.pick_index(wander.len())];
        if try_move(engine, from, pick) {
            return;
        }
        let owned: Vec<Pos> = {
            let state = engine.state();
            wander
                .into_iter()
                .filter(|&p| state.players.owner_of(p) == Some(player))
                .collect()
        };
        if let Some(target) = farthest_pos(from, &owned) {
            if try_move(engine, from, target) {
                return;
            }
        }
    }

    // nothing better to do than head home
    if let Some(home) = home_of(engine, player) {
        try_move_toward(engine, from, home);
    }
}

/// A one-hit-point soldier buys itself a bodyguard and folds into it.
fn rescue_weak_soldiers(engine: &mut GameEngine, player: PlayerId) {
    for (id, pos) in movable_soldiers(engine, player) {
        if gold(engine, player) < RESCUE_GOLD_FLOOR {
            return;
        }
        let spot = {
            let state = engine.state();
            let Some(el) = state.elements.get(id) else {
                continue;
            };
            if el.hp > 1 {
                continue;
            }
            state.map.neighbors4(pos).find(|&n| {
                state.map.is_free(n) && state.players.owner_of(n) == Some(player)
            })
        };
        let Some(spot) = spot else {
            continue;
        };
        if buy(engine, PurchaseKind::Soldier, spot) {
            try_move(engine, pos, spot);
        }
    }
}

/// Houses are fragile; keep a soldier within earshot of each one.
fn garrison_exposed_houses(engine: &mut GameEngine, player: PlayerId) {
    let houses: Vec<Pos> = {
        let state = engine.state();
        state
            .elements
            .iter_ordered()
            .filter(|(_, el)| el.owner == Some(player) && matches!(el.kind, ElementKind::House))
            .map(|(_, el)| el.pos)
            .collect()
    };
    for house in houses {
        if gold(engine, player) < GARRISON_GOLD_FLOOR {
            return;
        }
        let spot = {
            let state = engine.state();
            let protected = state.elements.iter_ordered().any(|(_, el)| {
                el.owner == Some(player) && el.is_soldier() && el.pos.distance(house) <= 2
            });
            if protected {
                continue;
            }
            state.map.neighbors4(house).find(|&n| {
                state.map.is_free(n) && state.players.owner_of(n) == Some(player)
            })
        };
        if let Some(spot) = spot {
            buy(engine, PurchaseKind::Soldier, spot);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::Element;
    use crate::engine::{GameConfig, SeatConfig};
    use fiefdom_protocol::Difficulty;

    fn two_bots(seed: u64) -> GameEngine {
        GameEngine::new_game(&GameConfig {
            shape: None,
            seed,
            seats: vec![
                SeatConfig {
                    is_bot: true,
                    difficulty: Difficulty::Normal,
                },
                SeatConfig {
                    is_bot: true,
                    difficulty: Difficulty::Normal,
                },
            ],
        })
        .unwrap()
    }

    #[test]
    fn bot_spends_its_opening_gold_on_soldiers() {
        let mut engine = two_bots(3);
        let player = engine.current_player();
        run_bot_turn(&mut engine);

        let state = engine.state();
        let soldiers = state
            .elements
            .iter_ordered()
            .filter(|(_, el)| el.owner == Some(player) && el.is_soldier())
            .count();
        assert!(soldiers >= 1, "opening turn should field a soldier");
        assert!(state.players.get(player).unwrap().gold < crate::config::STARTING_GOLD);
    }

    #[test]
    fn bot_engages_an_intruder_near_its_base() {
        let mut engine = two_bots(3);
        let player = engine.current_player();
        let enemy = engine.state().players.rotation()[1];
        let home = engine.state().players.get(player).unwrap().home;

        let intruder_pos = engine
            .state()
            .map
            .neighbors4(home)
            .find(|&n| engine.state().map.is_free(n))
            .unwrap();
        let intruder = {
            let s = engine.state_mut();
            let mut el = Element::soldier(intruder_pos);
            el.owner = Some(enemy);
            let id = s
                .occupancy
                .place(&mut s.map, &mut s.elements, el)
                .unwrap();
            s.players.get_mut(enemy).unwrap().elements.push(id);
            id
        };
        // a defender standing right next to the intruder
        let guard_pos = engine
            .state()
            .map
            .neighbors4(intruder_pos)
            .find(|&n| engine.state().map.is_free(n))
            .unwrap();
        {
            let s = engine.state_mut();
            let mut el = Element::soldier(guard_pos);
            el.owner = Some(player);
            let id = s
                .occupancy
                .place(&mut s.map, &mut s.elements, el)
                .unwrap();
            s.players.get_mut(player).unwrap().elements.push(id);
        }

        run_bot_turn(&mut engine);

        let hurt = engine
            .state()
            .elements
            .get(intruder)
            .map(|el| el.hp < crate::config::SOLDIER_HEALTH)
            .unwrap_or(true);
        assert!(hurt, "the intruder should have been attacked");
    }

    #[test]
    fn bot_turn_is_a_no_op_after_the_game_ends() {
        let mut engine = two_bots(3);
        engine.state_mut().game_over = true;
        let before = engine.state().elements.len();
        run_bot_turn(&mut engine);
        assert_eq!(engine.state().elements.len(), before);
    }
}
