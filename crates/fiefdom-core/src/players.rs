use std::collections::HashMap;

use thiserror::Error;
use tracing::info;

use fiefdom_protocol::{Difficulty, ElementId, PlayerColor, PlayerId, Pos};

use crate::{
    config::MAX_PLAYERS, element::Element, map::GameMap, occupancy::OccupancyIndex, rng::GameRng,
    store::ElementArena,
};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("registry is full ({MAX_PLAYERS} players)")]
    TooManyPlayers,
    #[error("no free spawn cell left")]
    NoSpawnAvailable,
    #[error("no color left")]
    NoColorAvailable,
}

#[derive(Clone, Debug)]
pub struct Player {
    pub id: PlayerId,
    pub color: PlayerColor,
    pub is_bot: bool,
    pub difficulty: Difficulty,
    pub gold: i32,
    pub gold_per_turn: i32,
    pub home: Pos,
    /// Insertion order; scans over territory are deterministic.
    pub owned_cells: Vec<Pos>,
    pub elements: Vec<ElementId>,
    pub eliminated: bool,
    pub can_play: bool,
}

impl Player {
    pub fn owns_cell(&self, pos: Pos) -> bool {
        self.owned_cells.contains(&pos)
    }
}

/// All seated players plus turn order and a cell-ownership lookup.
#[derive(Clone, Debug, Default)]
pub struct PlayerRegistry {
    players: Vec<Player>,
    rotation: Vec<PlayerId>,
    cell_owner: HashMap<Pos, PlayerId>,
}

impl PlayerRegistry {
    /// Seat a player: claim a random free spawn, place the base, and seed the
    /// territory with the base cell plus its eight surrounding cells.
    pub fn add_player(
        &mut self,
        map: &mut GameMap,
        arena: &mut ElementArena,
        occupancy: &mut OccupancyIndex,
        rng: &mut GameRng,
        is_bot: bool,
        difficulty: Difficulty,
        starting_gold: i32,
        base_income: i32,
    ) -> Result<PlayerId, RegistryError> {
        if self.players.len() >= MAX_PLAYERS {
            return Err(RegistryError::TooManyPlayers);
        }
        let color = *PlayerColor::ALL
            .iter()
            .find(|c| self.players.iter().all(|p| p.color != **c))
            .ok_or(RegistryError::NoColorAvailable)?;

        let spawns = map.spawn_cells();
        if spawns.is_empty() {
            return Err(RegistryError::NoSpawnAvailable);
        }
        let home = spawns[rng.pick_index(spawns.len())];

        let id = PlayerId(self.players.len() as u8);

        let mut base = Element::base(home);
        base.owner = Some(id);
        let base_id = occupancy
            .place(map, arena, base)
            .ok_or(RegistryError::NoSpawnAvailable)?;
        map.cell_mut(home).expect("spawn in bounds").spawn = false;

        let mut player = Player {
            id,
            color,
            is_bot,
            difficulty,
            gold: starting_gold,
            gold_per_turn: base_income,
            home,
            owned_cells: Vec::new(),
            elements: vec![base_id],
            eliminated: false,
            can_play: true,
        };

        player.owned_cells.push(home);
        self.cell_owner.insert(home, id);
        for n in map.neighbors8(home).collect::<Vec<_>>() {
            if map.is_usable(n) && !self.cell_owner.contains_key(&n) {
                player.owned_cells.push(n);
                self.cell_owner.insert(n, id);
            }
        }

        info!(player = id.0, ?color, is_bot, "player seated at {home:?}");
        self.players.push(player);
        self.rotation.push(id);
        Ok(id)
    }

    /// Rebuild a registry from saved players. Ids must already be
    /// index-aligned; a cell claimed by two players is returned as the error.
    pub fn from_players(players: Vec<Player>, rotation: Vec<PlayerId>) -> Result<Self, Pos> {
        let mut cell_owner = HashMap::new();
        for player in &players {
            for &cell in &player.owned_cells {
                if let Some(old) = cell_owner.insert(cell, player.id) {
                    if old != player.id {
                        return Err(cell);
                    }
                }
            }
        }
        Ok(Self {
            players,
            rotation,
            cell_owner,
        })
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn get(&self, id: PlayerId) -> Option<&Player> {
        self.players.get(id.0 as usize)
    }

    pub fn get_mut(&mut self, id: PlayerId) -> Option<&mut Player> {
        self.players.get_mut(id.0 as usize)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Player> {
        self.players.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Player> {
        self.players.iter_mut()
    }

    pub fn owner_of(&self, pos: Pos) -> Option<PlayerId> {
        self.cell_owner.get(&pos).copied()
    }

    pub fn rotation(&self) -> &[PlayerId] {
        &self.rotation
    }

    /// Randomize turn order at game creation.
    pub fn shuffle_rotation(&mut self, rng: &mut GameRng) {
        let mut order = std::mem::take(&mut self.rotation);
        rng.shuffle(&mut order);
        self.rotation = order;
    }

    /// Rotate the order until a human sits at the head; no-op when all bots.
    pub fn humans_first(&mut self) {
        let human_at = self
            .rotation
            .iter()
            .position(|id| self.get(*id).map(|p| !p.is_bot).unwrap_or(false));
        if let Some(at) = human_at {
            self.rotation.rotate_left(at);
        }
    }

    /// Next non-eliminated player after `current`. The scan is bounded at two
    /// full laps; `None` means nobody can play.
    pub fn next_player(&self, current: PlayerId) -> Option<PlayerId> {
        let at = self.rotation.iter().position(|id| *id == current)?;
        for step in 1..=self.rotation.len() * 2 {
            let candidate = self.rotation[(at + step) % self.rotation.len()];
            let player = self.get(candidate)?;
            if !player.eliminated && player.can_play {
                return Some(candidate);
            }
        }
        None
    }

    pub fn alive(&self) -> Vec<PlayerId> {
        self.players
            .iter()
            .filter(|p| !p.eliminated)
            .map(|p| p.id)
            .collect()
    }

    pub fn has_human(&self) -> bool {
        self.players.iter().any(|p| !p.is_bot)
    }

    pub fn has_living_human(&self) -> bool {
        self.players.iter().any(|p| !p.is_bot && !p.eliminated)
    }

    /// Territory bookkeeping. `claim_cell` moves ownership; `release_cell`
    /// returns a cell to neutral.
    pub fn claim_cell(&mut self, pos: Pos, new_owner: PlayerId) {
        if let Some(old) = self.cell_owner.insert(pos, new_owner) {
            if old == new_owner {
                return;
            }
            if let Some(player) = self.get_mut(old) {
                player.owned_cells.retain(|p| *p != pos);
            }
        }
        if let Some(player) = self.get_mut(new_owner) {
            if !player.owned_cells.contains(&pos) {
                player.owned_cells.push(pos);
            }
        }
    }

    pub fn release_cell(&mut self, pos: Pos) {
        if let Some(old) = self.cell_owner.remove(&pos) {
            if let Some(player) = self.get_mut(old) {
                player.owned_cells.retain(|p| *p != pos);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config;

    fn setup() -> (GameMap, ElementArena, OccupancyIndex, GameRng) {
        (
            GameMap::build_default(),
            ElementArena::default(),
            OccupancyIndex::default(),
            GameRng::seed_from_u64(42),
        )
    }

    fn seat(
        reg: &mut PlayerRegistry,
        map: &mut GameMap,
        arena: &mut ElementArena,
        occ: &mut OccupancyIndex,
        rng: &mut GameRng,
    ) -> Result<PlayerId, RegistryError> {
        reg.add_player(
            map,
            arena,
            occ,
            rng,
            true,
            Difficulty::Normal,
            config::STARTING_GOLD,
            config::BASE_INCOME,
        )
    }

    #[test]
    fn seated_player_gets_base_and_nine_cells() {
        let (mut map, mut arena, mut occ, mut rng) = setup();
        let mut reg = PlayerRegistry::default();
        let id = seat(&mut reg, &mut map, &mut arena, &mut occ, &mut rng).unwrap();

        let player = reg.get(id).unwrap();
        assert_eq!(player.gold, config::STARTING_GOLD);
        assert_eq!(player.elements.len(), 1);

        let base = arena.get(player.elements[0]).unwrap();
        assert!(base.is_base());
        assert_eq!(base.owner, Some(id));
        assert_eq!(base.pos, player.home);

        // corner spawns have a removed top row above some of them, so the
        // seeded territory is between 4 and 9 cells; the home is always first
        assert!(player.owned_cells.len() >= 4 && player.owned_cells.len() <= 9);
        assert_eq!(player.owned_cells[0], player.home);
        assert_eq!(reg.owner_of(player.home), Some(id));
        assert!(!map.cell(player.home).unwrap().spawn);
    }

    #[test]
    fn spawn_exhaustion_is_typed() {
        let (mut map, mut arena, mut occ, mut rng) = setup();
        let mut reg = PlayerRegistry::default();
        for _ in 0..4 {
            seat(&mut reg, &mut map, &mut arena, &mut occ, &mut rng).unwrap();
        }
        let err = seat(&mut reg, &mut map, &mut arena, &mut occ, &mut rng).unwrap_err();
        assert_eq!(err, RegistryError::TooManyPlayers);
    }

    #[test]
    fn rotation_skips_eliminated() {
        let (mut map, mut arena, mut occ, mut rng) = setup();
        let mut reg = PlayerRegistry::default();
        let a = seat(&mut reg, &mut map, &mut arena, &mut occ, &mut rng).unwrap();
        let b = seat(&mut reg, &mut map, &mut arena, &mut occ, &mut rng).unwrap();
        let c = seat(&mut reg, &mut map, &mut arena, &mut occ, &mut rng).unwrap();

        reg.get_mut(b).unwrap().eliminated = true;
        assert_eq!(reg.next_player(a), Some(c));

        reg.get_mut(c).unwrap().eliminated = true;
        assert_eq!(reg.next_player(a), Some(a));

        reg.get_mut(a).unwrap().eliminated = true;
        assert_eq!(reg.next_player(a), None);
    }

    #[test]
    fn claim_cell_moves_ownership() {
        let (mut map, mut arena, mut occ, mut rng) = setup();
        let mut reg = PlayerRegistry::default();
        let a = seat(&mut reg, &mut map, &mut arena, &mut occ, &mut rng).unwrap();
        let b = seat(&mut reg, &mut map, &mut arena, &mut occ, &mut rng).unwrap();

        let cell = reg.get(a).unwrap().owned_cells[1];
        reg.claim_cell(cell, b);
        assert_eq!(reg.owner_of(cell), Some(b));
        assert!(!reg.get(a).unwrap().owns_cell(cell));
        assert!(reg.get(b).unwrap().owns_cell(cell));
    }
}
