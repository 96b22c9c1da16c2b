use thiserror::Error;
use tracing::{info, warn};

use fiefdom_protocol::{
    Command, Difficulty, ElementId, ElementKind, ElementSnapshot, Event, PlayerId, PlayerSnapshot,
    Pos, PurchaseKind, Snapshot,
};

use crate::{
    config,
    economy::{grant_income, recompute_all},
    element::{price_of, Element},
    map::GameMap,
    occupancy::OccupancyIndex,
    path::step_toward,
    players::{Player, PlayerRegistry},
    rng::GameRng,
    search::{cells_around, nearest_pos, soldier_reach},
    stats::GameStats,
    store::ElementArena,
};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("game is over")]
    GameOver,
    #[error("cell out of bounds or removed")]
    BadCell,
    #[error("cell is occupied")]
    CellOccupied,
    #[error("cell not owned by current player")]
    CellNotOwned,
    #[error("not enough gold")]
    NotEnoughGold,
    #[error("no soldier on that cell")]
    NoSoldierThere,
    #[error("soldier does not belong to current player")]
    NotYourSoldier,
    #[error("soldier already moved this turn")]
    SoldierSpent,
    #[error("destination out of reach")]
    OutOfReach,
    #[error("invalid destination")]
    InvalidDestination,
    #[error("merge refused, both soldiers at their caps")]
    MergeAtCap,
    #[error("no step available toward target")]
    NoStepAvailable,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SnapshotError {
    #[error("snapshot has no players")]
    EmptyRegistry,
    #[error("map cell count does not match its dimensions")]
    BadMap,
    #[error("player ids are not index-aligned")]
    BadPlayerIds,
    #[error("rotation does not match the player list")]
    BadRotation,
    #[error("unknown current player")]
    UnknownCurrentPlayer,
    #[error("element at ({x}, {y}) is off the board")]
    BadPlacement { x: i32, y: i32 },
    #[error("two elements share cell ({x}, {y})")]
    DuplicatePlacement { x: i32, y: i32 },
    #[error("element owned by unknown player {0}")]
    UnknownOwner(u8),
    #[error("cell ({x}, {y}) is owned by two players")]
    CellOwnedTwice { x: i32, y: i32 },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SetupError {
    #[error("no player could be seated")]
    NoPlayers,
}

#[derive(Clone, Copy, Debug)]
pub struct SeatConfig {
    pub is_bot: bool,
    pub difficulty: Difficulty,
}

#[derive(Clone, Debug)]
pub struct GameConfig {
    /// Optional map shape; a parse failure falls back to the default board.
    pub shape: Option<String>,
    pub seed: u64,
    pub seats: Vec<SeatConfig>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            shape: None,
            seed: 0,
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
        }
    }
}

#[derive(Clone, Debug)]
pub struct GameState {
    /// Player turns played so far, counting every rotation step.
    pub turn: u32,
    pub current_player: PlayerId,
    pub map: GameMap,
    pub elements: ElementArena,
    pub occupancy: OccupancyIndex,
    pub players: PlayerRegistry,
    pub stats: GameStats,
    pub rng: GameRng,
    pub game_over: bool,
    pub winner: Option<PlayerId>,
}

#[derive(Debug)]
pub struct GameEngine {
    state: GameState,
}

impl GameEngine {
    pub fn new_game(config: &GameConfig) -> Result<Self, SetupError> {
        let mut map = match &config.shape {
            Some(shape) => match GameMap::parse_shape(shape) {
                Ok(map) => map,
                Err(err) => {
                    warn!(%err, "map shape rejected, using the default board");
                    GameMap::build_default()
                }
            },
            None => GameMap::build_default(),
        };

        let mut rng = GameRng::seed_from_u64(config.seed);
        let mut elements = ElementArena::default();
        let mut occupancy = OccupancyIndex::default();
        let mut players = PlayerRegistry::default();

        for seat in &config.seats {
            if let Err(err) = players.add_player(
                &mut map,
                &mut elements,
                &mut occupancy,
                &mut rng,
                seat.is_bot,
                seat.difficulty,
                config::STARTING_GOLD,
                config::BASE_INCOME,
            ) {
                warn!(%err, "seat skipped");
            }
        }
        if players.is_empty() {
            return Err(SetupError::NoPlayers);
        }

        players.shuffle_rotation(&mut rng);
        players.humans_first();
        let current_player = players.rotation()[0];

        recompute_all(&mut players, &map, &elements);

        Ok(Self {
            state: GameState {
                turn: 1,
                current_player,
                map,
                elements,
                occupancy,
                players,
                stats: GameStats::default(),
                rng,
                game_over: false,
                winner: None,
            },
        })
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut GameState {
        &mut self.state
    }

    pub fn current_player(&self) -> PlayerId {
        self.state.current_player
    }

    pub fn is_game_over(&self) -> bool {
        self.state.game_over
    }

    pub fn winner(&self) -> Option<PlayerId> {
        self.state.winner
    }

    pub fn try_apply_command(&mut self, command: Command) -> Result<Vec<Event>, CommandError> {
        match command {
            Command::Buy { kind, at } => self.buy(kind, at),
            Command::MoveSoldier { from, to } => self.move_soldier(from, to),
            Command::MoveSoldierToward { from, toward } => self.move_soldier_toward(from, toward),
            Command::AutoMoveSoldiers => self.auto_move_soldiers(),
            Command::MoveAllSoldiersToward { toward } => self.move_all_soldiers_toward(toward),
            Command::EndTurn => self.end_turn(),
        }
    }

    /// Lenient entry point: a rejected command is logged and becomes a no-op.
    pub fn apply_command(&mut self, command: Command) -> Vec<Event> {
        match self.try_apply_command(command.clone()) {
            Ok(events) => events,
            Err(err) => {
                warn!(?command, %err, "command rejected");
                Vec::new()
            }
        }
    }

    fn ensure_running(&self) -> Result<(), CommandError> {
        if self.state.game_over {
            Err(CommandError::GameOver)
        } else {
            Ok(())
        }
    }

    // ===== Purchases =====

    fn buy(&mut self, kind: PurchaseKind, at: Pos) -> Result<Vec<Event>, CommandError> {
        self.ensure_running()?;
        let current = self.state.current_player;
        if !self.state.map.is_usable(at) {
            return Err(CommandError::BadCell);
        }
        if !self.state.map.is_free(at) {
            return Err(CommandError::CellOccupied);
        }
        if self.state.players.owner_of(at) != Some(current) {
            return Err(CommandError::CellNotOwned);
        }
        let price = price_of(kind);
        {
            let player = self
                .state
                .players
                .get_mut(current)
                .ok_or(CommandError::GameOver)?;
            if player.gold < price {
                return Err(CommandError::NotEnoughGold);
            }
            player.gold -= price;
        }

        let s = &mut self.state;
        let id = s
            .occupancy
            .place(&mut s.map, &mut s.elements, Element::purchased(kind, at, current))
            .ok_or(CommandError::CellOccupied)?;
        if let Some(player) = s.players.get_mut(current) {
            player.elements.push(id);
        }
        recompute_all(&mut s.players, &s.map, &s.elements);

        Ok(vec![Event::ElementBought {
            player: current,
            kind,
            at,
        }])
    }

    // ===== Soldier movement =====

    fn validate_soldier(&self, at: Pos) -> Result<ElementId, CommandError> {
        let current = self.state.current_player;
        let id = self
            .state
            .occupancy
            .get(at)
            .ok_or(CommandError::NoSoldierThere)?;
        let el = self
            .state
            .elements
            .get(id)
            .ok_or(CommandError::NoSoldierThere)?;
        if !el.is_soldier() {
            return Err(CommandError::NoSoldierThere);
        }
        if el.owner != Some(current) {
            return Err(CommandError::NotYourSoldier);
        }
        if !el.can_move() {
            return Err(CommandError::SoldierSpent);
        }
        Ok(id)
    }

    fn move_soldier(&mut self, from: Pos, to: Pos) -> Result<Vec<Event>, CommandError> {
        self.ensure_running()?;
        let current = self.state.current_player;
        let mover = self.validate_soldier(from)?;
        if to == from {
            return Err(CommandError::InvalidDestination);
        }
        let reach = soldier_reach(&self.state.map, &self.state.players, current, from);
        if !reach.contains(&to) {
            return Err(CommandError::OutOfReach);
        }

        if let Some(el) = self.state.elements.get_mut(mover) {
            el.face_toward(to);
        }

        let mut events = Vec::new();
        match self.state.occupancy.get(to) {
            None => {
                self.relocate_and_conquer(mover, to, &mut events);
                self.spend(mover);
                events.push(Event::SoldierMoved {
                    player: current,
                    from,
                    to,
                });
            }
            Some(target) => {
                let (target_owner, target_is_soldier) = {
                    let el = self
                        .state
                        .elements
                        .get(target)
                        .ok_or(CommandError::InvalidDestination)?;
                    (el.owner, el.is_soldier())
                };
                if target_owner == Some(current) {
                    if !target_is_soldier {
                        return Err(CommandError::InvalidDestination);
                    }
                    self.merge_soldiers(mover, target, &mut events)?;
                } else {
                    // targets inside the reach fringe are hit at range
                    self.resolve_attack(mover, target, &reach, &mut events);
                }
            }
        }

        let s = &mut self.state;
        recompute_all(&mut s.players, &s.map, &s.elements);
        self.check_game_over(&mut events);
        Ok(events)
    }

    fn move_soldier_toward(&mut self, from: Pos, toward: Pos) -> Result<Vec<Event>, CommandError> {
        self.ensure_running()?;
        let mover = self.validate_soldier(from)?;
        if toward == from {
            return Err(CommandError::InvalidDestination);
        }
        if !self.state.map.is_usable(toward) {
            return Err(CommandError::BadCell);
        }
        let current = self.state.current_player;
        let reach = soldier_reach(&self.state.map, &self.state.players, current, from);

        let mut events = Vec::new();
        self.approach(mover, from, toward, &reach, &mut events)?;

        let s = &mut self.state;
        recompute_all(&mut s.players, &s.map, &s.elements);
        self.check_game_over(&mut events);
        Ok(events)
    }

    /// One step along the path to a destination outside direct reach. The
    /// step may land on a friendly soldier, in which case the two merge.
    fn approach(
        &mut self,
        mover: ElementId,
        from: Pos,
        destination: Pos,
        reach: &[Pos],
        events: &mut Vec<Event>,
    ) -> Result<(), CommandError> {
        let current = self.state.current_player;
        let candidates: Vec<Pos> = reach
            .iter()
            .copied()
            .filter(|&p| p != destination)
            .filter(|&p| match self
                .state
                .occupancy
                .get(p)
                .and_then(|id| self.state.elements.get(id))
            {
                None => self.state.map.is_free(p),
                Some(el) => el.owner == Some(current) && el.is_soldier(),
            })
            .collect();

        let step = step_toward(
            &self.state.map,
            &self.state.elements,
            &self.state.occupancy,
            current,
            from,
            destination,
            &candidates,
        )
        .ok_or(CommandError::NoStepAvailable)?;

        match self.state.occupancy.get(step) {
            None => {
                self.relocate_and_conquer(mover, step, events);
                self.spend(mover);
                events.push(Event::SoldierMoved {
                    player: current,
                    from,
                    to: step,
                });
            }
            Some(ally) => self.merge_soldiers(mover, ally, events)?,
        }
        Ok(())
    }

    fn merge_soldiers(
        &mut self,
        mover: ElementId,
        into: ElementId,
        events: &mut Vec<Event>,
    ) -> Result<(), CommandError> {
        let current = self.state.current_player;
        let (new_attack, new_hp, at) = {
            let (m, t) = self
                .state
                .elements
                .get2_mut(mover, into)
                .ok_or(CommandError::InvalidDestination)?;
            let at_caps = |el: &Element| {
                el.attack() >= config::SOLDIER_ATTACK_CAP && el.hp >= config::SOLDIER_HEALTH_CAP
            };
            if at_caps(t) || at_caps(m) {
                return Err(CommandError::MergeAtCap);
            }
            let new_attack = (t.attack() + m.attack()).min(config::SOLDIER_ATTACK_CAP);
            let new_hp = (t.hp + m.hp).min(config::SOLDIER_HEALTH_CAP);
            if let ElementKind::Soldier { attack, .. } = &mut t.kind {
                *attack = new_attack;
            }
            t.hp = new_hp;
            (new_attack, new_hp, t.pos)
        };
        self.remove_element(mover);
        events.push(Event::SoldiersMerged {
            player: current,
            at,
            attack: new_attack,
            hp: new_hp,
        });
        Ok(())
    }

    /// Damage lands whether or not the two are adjacent; only the follow-up
    /// positioning depends on the distance.
    fn resolve_attack(
        &mut self,
        attacker: ElementId,
        defender: ElementId,
        reach: &[Pos],
        events: &mut Vec<Event>,
    ) {
        let current = self.state.current_player;
        let Some((def_kind, def_pos, def_owner)) = self
            .state
            .elements
            .get(defender)
            .map(|d| (d.kind.clone(), d.pos, d.owner))
        else {
            return;
        };
        let Some(att_pos) = self.state.elements.get(attacker).map(|a| a.pos) else {
            return;
        };
        let adjacent = att_pos.is_adjacent(def_pos);

        match def_kind {
            ElementKind::Soldier { .. } => {
                let (att_dead, def_dead, att_hp, def_hp) = {
                    let Some((a, d)) = self.state.elements.get2_mut(attacker, defender) else {
                        return;
                    };
                    // simultaneous blows
                    let a_dead = a.take_damage(d.attack());
                    let d_dead = d.take_damage(a.attack());
                    (a_dead, d_dead, a.hp, d.hp)
                };
                if def_dead {
                    self.remove_element(defender);
                    events.push(Event::SoldierDied {
                        player: def_owner.unwrap_or(PlayerId(0)),
                        at: def_pos,
                    });
                } else {
                    events.push(Event::SoldierDamaged {
                        player: def_owner.unwrap_or(PlayerId(0)),
                        at: def_pos,
                        hp: def_hp,
                    });
                }
                if att_dead {
                    self.remove_element(attacker);
                    events.push(Event::SoldierDied {
                        player: current,
                        at: att_pos,
                    });
                } else {
                    events.push(Event::SoldierDamaged {
                        player: current,
                        at: att_pos,
                        hp: att_hp,
                    });
                    self.spend(attacker);
                    if def_dead {
                        // the victor takes the vacated cell
                        self.relocate_and_conquer(attacker, def_pos, events);
                    } else if !adjacent {
                        // close the gap by one step, merging into an ally
                        // standing on the way
                        if let Err(err) = self.approach(attacker, att_pos, def_pos, reach, events)
                        {
                            warn!(%err, ?def_pos, "no step toward the defender");
                        }
                    }
                }
            }
            ElementKind::ForestTree { reward } => {
                self.remove_element(defender);
                if let Some(player) = self.state.players.get_mut(current) {
                    player.gold = (player.gold + reward).min(config::GOLD_CAP);
                }
                events.push(Event::TreeChopped {
                    by: current,
                    at: def_pos,
                    reward,
                });
                self.relocate_and_conquer(attacker, def_pos, events);
                self.spend(attacker);
            }
            ElementKind::Base
            | ElementKind::House
            | ElementKind::AttackTower
            | ElementKind::DefenseTower => {
                let attack = self
                    .state
                    .elements
                    .get(attacker)
                    .map(|a| a.attack())
                    .unwrap_or(0);
                let (destroyed, hp, was_base) = {
                    let Some(d) = self.state.elements.get_mut(defender) else {
                        return;
                    };
                    (d.take_damage(attack), d.hp, d.is_base())
                };
                if destroyed {
                    self.remove_element(defender);
                    events.push(Event::StructureDestroyed {
                        player: def_owner.unwrap_or(PlayerId(0)),
                        at: def_pos,
                    });
                    if was_base {
                        if let Some(victim) = def_owner {
                            self.eliminate(victim, Some(current), events);
                        }
                    }
                    // the wrecker claims the rubble cell and stands on it
                    self.relocate_and_conquer(attacker, def_pos, events);
                } else {
                    events.push(Event::StructureDamaged {
                        player: def_owner.unwrap_or(PlayerId(0)),
                        at: def_pos,
                        hp,
                    });
                    if !adjacent {
                        self.close_in_on_structure(attacker, def_pos, events);
                    }
                }
                self.spend(attacker);
            }
        }
    }

    /// A ranged attacker that failed to bring the structure down pulls up to
    /// the nearest free cell it owns next to it, when there is one.
    fn close_in_on_structure(
        &mut self,
        attacker: ElementId,
        structure: Pos,
        events: &mut Vec<Event>,
    ) {
        let current = self.state.current_player;
        let Some(att_pos) = self.state.elements.get(attacker).map(|a| a.pos) else {
            return;
        };
        let spots: Vec<Pos> = self
            .state
            .map
            .neighbors4(structure)
            .filter(|&n| {
                self.state.map.is_free(n) && self.state.players.owner_of(n) == Some(current)
            })
            .collect();
        if let Some(spot) = nearest_pos(att_pos, &spots) {
            self.relocate_and_conquer(attacker, spot, events);
        } else {
            warn!(?structure, "no cell available to close in on the structure");
        }
    }

    fn relocate_and_conquer(&mut self, id: ElementId, to: Pos, events: &mut Vec<Event>) {
        let s = &mut self.state;
        if !s.occupancy.relocate(&mut s.map, &mut s.elements, id, to) {
            return;
        }
        let Some(owner) = s.elements.get(id).and_then(|el| el.owner) else {
            return;
        };
        if s.players.owner_of(to) != Some(owner) {
            s.players.claim_cell(to, owner);
            events.push(Event::CellConquered {
                player: owner,
                at: to,
            });
        }
    }

    fn spend(&mut self, id: ElementId) {
        if let Some(el) = self.state.elements.get_mut(id) {
            el.set_can_move(false);
        }
    }

    /// Remove an element from the board and from its owner's roster.
    fn remove_element(&mut self, id: ElementId) -> Option<Element> {
        let s = &mut self.state;
        let element = s.occupancy.remove(&mut s.map, &mut s.elements, id)?;
        if let Some(owner) = element.owner {
            if let Some(player) = s.players.get_mut(owner) {
                player.elements.retain(|e| *e != id);
            }
        }
        Some(element)
    }

    fn eliminate(&mut self, victim: PlayerId, by: Option<PlayerId>, events: &mut Vec<Event>) {
        let Some((cells, element_ids, keeps_territory)) = self.state.players.get(victim).map(|p| {
            (
                p.owned_cells.clone(),
                p.elements.clone(),
                p.is_bot && p.difficulty == Difficulty::Unfair,
            )
        }) else {
            return;
        };

        if let Some(player) = self.state.players.get_mut(victim) {
            player.gold = 0;
            player.gold_per_turn = 0;
            player.eliminated = true;
            player.can_play = false;
            player.elements.clear();
        }

        let s = &mut self.state;
        for id in element_ids {
            s.occupancy.remove(&mut s.map, &mut s.elements, id);
        }
        // neutral leftovers (trees) on the lost territory go too
        for &pos in &cells {
            if let Some(id) = s.occupancy.get(pos) {
                s.occupancy.remove(&mut s.map, &mut s.elements, id);
            }
        }
        for pos in cells {
            match by {
                Some(attacker) if !keeps_territory => {
                    s.players.claim_cell(pos, attacker);
                    events.push(Event::CellConquered {
                        player: attacker,
                        at: pos,
                    });
                }
                _ => s.players.release_cell(pos),
            }
        }

        info!(victim = victim.0, "player eliminated");
        events.push(Event::PlayerEliminated { player: victim, by });
    }

    fn check_game_over(&mut self, events: &mut Vec<Event>) {
        if self.state.game_over {
            return;
        }
        let alive = self.state.players.alive();
        let over = alive.len() <= 1
            || (self.state.players.has_human() && !self.state.players.has_living_human());
        if over {
            self.state.game_over = true;
            self.state.winner = if alive.len() == 1 { Some(alive[0]) } else { None };
            info!(winner = ?self.state.winner, "game over");
            events.push(Event::GameEnded {
                winner: self.state.winner,
            });
        }
    }

    // ===== Convenience movement =====

    fn auto_move_soldiers(&mut self) -> Result<Vec<Event>, CommandError> {
        self.ensure_running()?;
        let current = self.state.current_player;
        let soldiers: Vec<Pos> = self
            .state
            .elements
            .iter_ordered()
            .filter(|(_, el)| el.owner == Some(current) && el.can_move())
            .map(|(_, el)| el.pos)
            .collect();

        let mut events = Vec::new();
        for from in soldiers {
            let zone: Vec<Pos> = self
                .state
                .map
                .neighbors4(from)
                .filter(|&n| self.state.map.is_usable(n))
                .collect();
            let tree = zone.iter().copied().find(|&n| {
                self.state
                    .occupancy
                    .get(n)
                    .and_then(|id| self.state.elements.get(id))
                    .map(|el| el.is_tree())
                    .unwrap_or(false)
            });
            let target = match tree {
                Some(t) => Some(t),
                None => {
                    let open: Vec<Pos> = zone
                        .iter()
                        .copied()
                        .filter(|&n| {
                            self.state.map.is_free(n)
                                && self.state.players.owner_of(n) != Some(current)
                        })
                        .collect();
                    if open.is_empty() {
                        None
                    } else {
                        Some(open[self.state.rng.pick_index(open.len())])
                    }
                }
            };
            if let Some(to) = target {
                match self.move_soldier(from, to) {
                    Ok(mut moved) => events.append(&mut moved),
                    Err(err) => warn!(%err, "auto-move skipped a soldier"),
                }
            }
        }
        Ok(events)
    }

    fn move_all_soldiers_toward(&mut self, toward: Pos) -> Result<Vec<Event>, CommandError> {
        self.ensure_running()?;
        if !self.state.map.is_usable(toward) {
            return Err(CommandError::BadCell);
        }
        let current = self.state.current_player;
        let soldiers: Vec<Pos> = self
            .state
            .elements
            .iter_ordered()
            .filter(|(_, el)| el.owner == Some(current) && el.can_move() && el.pos != toward)
            .map(|(_, el)| el.pos)
            .collect();

        let mut events = Vec::new();
        for from in soldiers {
            match self.move_soldier_toward(from, toward) {
                Ok(mut moved) => events.append(&mut moved),
                Err(err) => warn!(%err, "group move skipped a soldier"),
            }
        }
        Ok(events)
    }

    // ===== Turn sequencing =====

    fn end_turn(&mut self) -> Result<Vec<Event>, CommandError> {
        self.ensure_running()?;
        let outgoing = self.state.current_player;
        let territory = self
            .state
            .players
            .get(outgoing)
            .map(|p| p.owned_cells.len() as u32)
            .unwrap_or(0);
        self.state.stats.record_turn(outgoing, territory);

        let mut events = Vec::new();
        let Some(next) = self.state.players.next_player(outgoing) else {
            self.state.game_over = true;
            events.push(Event::GameEnded { winner: None });
            return Ok(events);
        };
        self.state.current_player = next;
        self.state.turn += 1;

        self.fire_towers(next, &mut events);
        self.apply_bonus_cells(next, &mut events);

        if let Some(player) = self.state.players.get_mut(next) {
            let granted = grant_income(player);
            events.push(Event::IncomeGranted {
                player: next,
                amount: granted,
            });
        }

        for (_, el) in self.state.elements.iter_ordered_mut() {
            if el.is_soldier() {
                let mine = el.owner == Some(next);
                el.set_can_move(mine);
            }
        }

        let s = &mut self.state;
        recompute_all(&mut s.players, &s.map, &s.elements);

        self.spawn_trees(&mut events);
        events.push(Event::TurnStarted {
            turn: self.state.turn,
            player: next,
        });
        self.check_game_over(&mut events);
        Ok(events)
    }

    fn fire_towers(&mut self, player: PlayerId, events: &mut Vec<Event>) {
        let towers: Vec<(ElementId, ElementKind)> = self
            .state
            .elements
            .iter_ordered()
            .filter(|(_, el)| {
                el.owner == Some(player)
                    && matches!(
                        el.kind,
                        ElementKind::AttackTower | ElementKind::DefenseTower
                    )
            })
            .map(|(id, el)| (id, el.kind.clone()))
            .collect();

        for (id, kind) in towers {
            match kind {
                ElementKind::AttackTower => self.fire_attack_tower(id, events),
                ElementKind::DefenseTower => self.fire_defense_tower(id),
                _ => {}
            }
        }
    }

    /// Strikes the first enemy soldier in range.
    fn fire_attack_tower(&mut self, tower: ElementId, events: &mut Vec<Event>) {
        let Some((owner, pos)) = self
            .state
            .elements
            .get(tower)
            .map(|el| (el.owner, el.pos))
        else {
            return;
        };
        let zone = cells_around(&self.state.map, pos, config::ATTACK_TOWER_RADIUS, true);
        let target = zone.iter().copied().find_map(|p| {
            let id = self.state.occupancy.get(p)?;
            let el = self.state.elements.get(id)?;
            if el.is_soldier() && el.owner.is_some() && el.owner != owner {
                Some(id)
            } else {
                None
            }
        });
        let Some(target) = target else {
            return;
        };
        let (dead, hp, at, victim) = {
            let Some(el) = self.state.elements.get_mut(target) else {
                return;
            };
            (
                el.take_damage(config::ATTACK_TOWER_DAMAGE),
                el.hp,
                el.pos,
                el.owner.unwrap_or(PlayerId(0)),
            )
        };
        if dead {
            self.remove_element(target);
            events.push(Event::SoldierDied { player: victim, at });
        } else {
            events.push(Event::SoldierDamaged {
                player: victim,
                at,
                hp,
            });
        }
    }

    /// Heals the first wounded allied soldier in range.
    fn fire_defense_tower(&mut self, tower: ElementId) {
        let Some((owner, pos)) = self
            .state
            .elements
            .get(tower)
            .map(|el| (el.owner, el.pos))
        else {
            return;
        };
        let zone = cells_around(&self.state.map, pos, config::DEFENSE_TOWER_RADIUS, true);
        let target = zone.iter().copied().find_map(|p| {
            let id = self.state.occupancy.get(p)?;
            let el = self.state.elements.get(id)?;
            if el.is_soldier() && el.owner == owner && el.hp < el.max_hp {
                Some(id)
            } else {
                None
            }
        });
        if let Some(target) = target {
            if let Some(el) = self.state.elements.get_mut(target) {
                el.hp = (el.hp + config::DEFENSE_TOWER_HEAL).min(el.max_hp);
            }
        }
    }

    /// Periodic effects for elements standing on bonus cells.
    fn apply_bonus_cells(&mut self, current: PlayerId, events: &mut Vec<Event>) {
        let on_bonus: Vec<ElementId> = self
            .state
            .elements
            .iter_ordered()
            .filter(|(_, el)| {
                self.state
                    .map
                    .cell(el.pos)
                    .map(|c| c.bonus)
                    .unwrap_or(false)
            })
            .map(|(id, _)| id)
            .collect();

        for id in on_bonus {
            let Some((kind, owner_of, hp)) = self
                .state
                .elements
                .get(id)
                .map(|el| (el.kind.clone(), el.owner, el.hp))
            else {
                continue;
            };
            match kind {
                ElementKind::House => {
                    if let Some(owner) = owner_of {
                        if let Some(player) = self.state.players.get_mut(owner) {
                            if !player.eliminated {
                                player.gold = (player.gold
                                    + config::HOUSE_INCOME * config::BONUS_MULTIPLIER)
                                    .min(config::GOLD_CAP);
                            }
                        }
                    }
                }
                ElementKind::AttackTower if owner_of == Some(current) => {
                    self.fire_attack_tower(id, events);
                }
                ElementKind::DefenseTower if owner_of == Some(current) => {
                    self.fire_defense_tower(id);
                }
                ElementKind::Soldier { attack, .. }
                    if owner_of == Some(current) && hp > attack =>
                {
                    if let Some(el) = self.state.elements.get_mut(id) {
                        if let ElementKind::Soldier { attack, .. } = &mut el.kind {
                            *attack = (*attack + 1).min(config::SOLDIER_ATTACK_CAP);
                        }
                    }
                }
                ElementKind::ForestTree { .. } => {
                    if let Some(el) = self.state.elements.get_mut(id) {
                        if let ElementKind::ForestTree { reward } = &mut el.kind {
                            *reward = (*reward * config::BONUS_MULTIPLIER).min(config::GOLD_CAP);
                        }
                    }
                }
                _ => {}
            }
        }
    }

    /// One probability roll per turn advance; spawns 0 to 3 trees on free
    /// neutral cells while the board is below the forest cap.
    fn spawn_trees(&mut self, events: &mut Vec<Event>) {
        let tree_count = self
            .state
            .elements
            .iter_ordered()
            .filter(|(_, el)| el.is_tree())
            .count();
        if tree_count >= config::TREE_CAP {
            return;
        }

        let roll = self.state.rng.roll_percent();
        let count = if roll <= config::TREE_ROLL_THREE {
            3
        } else if roll <= config::TREE_ROLL_TWO {
            2
        } else if roll <= config::TREE_ROLL_ONE {
            1
        } else {
            0
        };
        if count == 0 {
            return;
        }

        let mut candidates: Vec<Pos> = self
            .state
            .map
            .iter_usable()
            .filter(|&p| self.state.map.is_free(p) && self.state.players.owner_of(p).is_none())
            .collect();

        let mut placed = Vec::new();
        for _ in 0..count {
            if candidates.is_empty() {
                break;
            }
            let pos = candidates.swap_remove(self.state.rng.pick_index(candidates.len()));
            let s = &mut self.state;
            if s.occupancy
                .place(&mut s.map, &mut s.elements, Element::forest_tree(pos))
                .is_some()
            {
                placed.push(pos);
            }
        }
        if !placed.is_empty() {
            events.push(Event::TreesSpawned { at: placed });
        }
    }

    // ===== Save / restore =====

    pub fn snapshot(&self) -> Snapshot {
        let state = &self.state;
        Snapshot {
            turn: state.turn,
            current_player: state.current_player,
            map: state.map.to_snapshot(),
            players: state
                .players
                .iter()
                .map(|p| PlayerSnapshot {
                    id: p.id,
                    color: p.color,
                    is_bot: p.is_bot,
                    difficulty: p.difficulty,
                    gold: p.gold,
                    gold_per_turn: p.gold_per_turn,
                    home: p.home,
                    owned_cells: p.owned_cells.clone(),
                    eliminated: p.eliminated,
                    can_play: p.can_play,
                })
                .collect(),
            rotation: state.players.rotation().to_vec(),
            elements: state
                .elements
                .iter_ordered()
                .map(|(_, el)| ElementSnapshot {
                    owner: el.owner,
                    kind: el.kind.clone(),
                    pos: el.pos,
                    hp: el.hp,
                    max_hp: el.max_hp,
                })
                .collect(),
            stats: state.stats.to_snapshot(),
            rng_state: state.rng.state_bytes(),
            game_over: state.game_over,
        }
    }

    /// Validates and rebuilds a saved game. A failed check rejects the whole
    /// snapshot; nothing is partially restored.
    pub fn restore(snapshot: &Snapshot) -> Result<Self, SnapshotError> {
        if snapshot.players.is_empty() {
            return Err(SnapshotError::EmptyRegistry);
        }
        let expected = (snapshot.map.width.max(0) * snapshot.map.height.max(0)) as usize;
        if expected == 0 || snapshot.map.cells.len() != expected {
            return Err(SnapshotError::BadMap);
        }
        if snapshot
            .players
            .iter()
            .enumerate()
            .any(|(i, p)| p.id.0 as usize != i)
        {
            return Err(SnapshotError::BadPlayerIds);
        }
        let known = |id: PlayerId| snapshot.players.iter().any(|p| p.id == id);
        if snapshot.rotation.len() != snapshot.players.len()
            || !snapshot.rotation.iter().all(|id| known(*id))
        {
            return Err(SnapshotError::BadRotation);
        }
        if !known(snapshot.current_player) {
            return Err(SnapshotError::UnknownCurrentPlayer);
        }

        let mut map = GameMap::from_snapshot(&snapshot.map);

        let players: Vec<Player> = snapshot
            .players
            .iter()
            .map(|p| Player {
                id: p.id,
                color: p.color,
                is_bot: p.is_bot,
                difficulty: p.difficulty,
                gold: p.gold,
                gold_per_turn: p.gold_per_turn,
                home: p.home,
                owned_cells: p.owned_cells.clone(),
                elements: Vec::new(),
                eliminated: p.eliminated,
                can_play: p.can_play,
            })
            .collect();
        let mut registry = PlayerRegistry::from_players(players, snapshot.rotation.clone())
            .map_err(|pos| SnapshotError::CellOwnedTwice { x: pos.x, y: pos.y })?;

        let mut elements = ElementArena::default();
        let mut occupancy = OccupancyIndex::default();
        for el in &snapshot.elements {
            if !map.is_usable(el.pos) {
                return Err(SnapshotError::BadPlacement {
                    x: el.pos.x,
                    y: el.pos.y,
                });
            }
            if let Some(owner) = el.owner {
                if registry.get(owner).is_none() {
                    return Err(SnapshotError::UnknownOwner(owner.0));
                }
            }
            let id = occupancy
                .place(
                    &mut map,
                    &mut elements,
                    Element {
                        kind: el.kind.clone(),
                        owner: el.owner,
                        pos: el.pos,
                        hp: el.hp,
                        max_hp: el.max_hp,
                    },
                )
                .ok_or(SnapshotError::DuplicatePlacement {
                    x: el.pos.x,
                    y: el.pos.y,
                })?;
            if let Some(owner) = el.owner {
                if let Some(player) = registry.get_mut(owner) {
                    player.elements.push(id);
                }
            }
        }

        let alive = registry.alive();
        let winner = if snapshot.game_over && alive.len() == 1 {
            Some(alive[0])
        } else {
            None
        };

        Ok(Self {
            state: GameState {
                turn: snapshot.turn,
                current_player: snapshot.current_player,
                map,
                elements,
                occupancy,
                players: registry,
                stats: GameStats::from_snapshot(&snapshot.stats),
                rng: GameRng::from_state_bytes(snapshot.rng_state),
                game_over: snapshot.game_over,
                winner,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fiefdom_protocol::wire;

    fn bot_seat() -> SeatConfig {
        SeatConfig {
            is_bot: true,
            difficulty: Difficulty::Normal,
        }
    }

    fn two_bots(seed: u64) -> GameEngine {
        GameEngine::new_game(&GameConfig {
            shape: None,
            seed,
            seats: vec![bot_seat(), bot_seat()],
        })
        .unwrap()
    }

    fn plant_soldier(engine: &mut GameEngine, owner: PlayerId, pos: Pos) -> ElementId {
        let s = engine.state_mut();
        let mut el = Element::soldier(pos);
        el.owner = Some(owner);
        let id = s
            .occupancy
            .place(&mut s.map, &mut s.elements, el)
            .expect("cell free");
        s.players.get_mut(owner).unwrap().elements.push(id);
        id
    }

    fn plant_owned(engine: &mut GameEngine, owner: PlayerId, mut el: Element) -> ElementId {
        el.owner = Some(owner);
        let s = engine.state_mut();
        let id = s
            .occupancy
            .place(&mut s.map, &mut s.elements, el)
            .expect("cell free");
        s.players.get_mut(owner).unwrap().elements.push(id);
        id
    }

    fn set_soldier_stats(engine: &mut GameEngine, id: ElementId, attack: i32, hp: i32) {
        let el = engine.state_mut().elements.get_mut(id).unwrap();
        if let ElementKind::Soldier { attack: a, .. } = &mut el.kind {
            *a = attack;
        }
        el.hp = hp;
    }

    #[test]
    fn new_game_seats_and_rotates() {
        let engine = two_bots(7);
        let state = engine.state();
        assert_eq!(state.players.len(), 2);
        assert_eq!(state.current_player, state.players.rotation()[0]);
        assert!(!engine.is_game_over());
        for player in state.players.iter() {
            let base = state.elements.get(player.elements[0]).unwrap();
            assert!(base.is_base());
            assert_eq!(base.pos, player.home);
        }
    }

    #[test]
    fn buy_checks_gold_ownership_and_occupancy() {
        let mut engine = two_bots(7);
        let a = engine.current_player();
        let cell = {
            let state = engine.state();
            let player = state.players.get(a).unwrap();
            player
                .owned_cells
                .iter()
                .copied()
                .find(|&c| state.map.is_free(c))
                .unwrap()
        };

        engine.state_mut().players.get_mut(a).unwrap().gold = config::SOLDIER_PRICE;
        let events = engine
            .try_apply_command(Command::Buy {
                kind: PurchaseKind::Soldier,
                at: cell,
            })
            .unwrap();
        assert!(matches!(events[0], Event::ElementBought { .. }));
        assert!(engine.state().occupancy.is_occupied(cell));
        assert_eq!(engine.state().players.get(a).unwrap().gold, 0);

        // same cell again
        assert_eq!(
            engine.try_apply_command(Command::Buy {
                kind: PurchaseKind::Soldier,
                at: cell,
            }),
            Err(CommandError::CellOccupied)
        );

        // a free cell the buyer does not own
        let neutral = Pos::new(19, 10);
        assert_eq!(engine.state().players.owner_of(neutral), None);
        assert_eq!(
            engine.try_apply_command(Command::Buy {
                kind: PurchaseKind::Soldier,
                at: neutral,
            }),
            Err(CommandError::CellNotOwned)
        );

        // gold is spent
        let another = {
            let state = engine.state();
            let player = state.players.get(a).unwrap();
            player
                .owned_cells
                .iter()
                .copied()
                .find(|&c| state.map.is_free(c))
                .unwrap()
        };
        assert_eq!(
            engine.try_apply_command(Command::Buy {
                kind: PurchaseKind::Soldier,
                at: another,
            }),
            Err(CommandError::NotEnoughGold)
        );
    }

    #[test]
    fn moving_onto_a_free_cell_conquers_it() {
        let mut engine = two_bots(7);
        let a = engine.current_player();
        let from = Pos::new(19, 10);
        let to = Pos::new(20, 10);
        engine.state_mut().players.claim_cell(from, a);
        plant_soldier(&mut engine, a, from);

        let events = engine
            .try_apply_command(Command::MoveSoldier { from, to })
            .unwrap();
        assert!(events
            .iter()
            .any(|e| matches!(e, Event::CellConquered { player, at } if *player == a && *at == to)));
        assert_eq!(engine.state().players.owner_of(to), Some(a));
        assert!(engine.state().occupancy.is_occupied(to));

        // a soldier moves once per turn
        assert_eq!(
            engine.try_apply_command(Command::MoveSoldier {
                from: to,
                to: Pos::new(21, 10),
            }),
            Err(CommandError::SoldierSpent)
        );
    }

    #[test]
    fn adjacent_soldiers_trade_blows_simultaneously() {
        let mut engine = two_bots(7);
        let a = engine.current_player();
        let b = engine.state().players.rotation()[1];
        let from = Pos::new(19, 10);
        let to = Pos::new(20, 10);
        engine.state_mut().players.claim_cell(from, a);
        let attacker = plant_soldier(&mut engine, a, from);
        let defender = plant_soldier(&mut engine, b, to);

        engine
            .try_apply_command(Command::MoveSoldier { from, to })
            .unwrap();

        let state = engine.state();
        assert_eq!(state.elements.get(attacker).unwrap().hp, 1);
        assert_eq!(state.elements.get(defender).unwrap().hp, 1);
        // both survived, so the attacker holds its ground
        assert_eq!(state.elements.get(attacker).unwrap().pos, from);
        assert!(!state.elements.get(attacker).unwrap().can_move());
    }

    #[test]
    fn lethal_attack_takes_the_vacated_cell() {
        let mut engine = two_bots(7);
        let a = engine.current_player();
        let b = engine.state().players.rotation()[1];
        let from = Pos::new(19, 10);
        let to = Pos::new(20, 10);
        engine.state_mut().players.claim_cell(from, a);
        let attacker = plant_soldier(&mut engine, a, from);
        let defender = plant_soldier(&mut engine, b, to);
        set_soldier_stats(&mut engine, defender, 1, 1);

        let events = engine
            .try_apply_command(Command::MoveSoldier { from, to })
            .unwrap();
        assert!(events
            .iter()
            .any(|e| matches!(e, Event::SoldierDied { player, .. } if *player == b)));

        let state = engine.state();
        assert!(state.elements.get(defender).is_none());
        assert_eq!(state.elements.get(attacker).unwrap().pos, to);
        assert_eq!(state.players.owner_of(to), Some(a));
    }

    #[test]
    fn ranged_attack_hits_and_steps_toward_the_defender() {
        let mut engine = two_bots(7);
        let a = engine.current_player();
        let b = engine.state().players.rotation()[1];
        let from = Pos::new(19, 10);
        for x in 19..=21 {
            engine.state_mut().players.claim_cell(Pos::new(x, 10), a);
        }
        let attacker = plant_soldier(&mut engine, a, from);
        // fringe target: adjacent to owned territory, three cells from the attacker
        let defender = plant_soldier(&mut engine, b, Pos::new(22, 10));

        engine
            .try_apply_command(Command::MoveSoldier {
                from,
                to: Pos::new(22, 10),
            })
            .unwrap();

        let state = engine.state();
        assert_eq!(state.elements.get(defender).unwrap().hp, 1);
        let att = state.elements.get(attacker).unwrap();
        assert_eq!(att.hp, 1);
        // both survived, so the attacker closed the gap by one step
        assert_eq!(att.pos, Pos::new(21, 10));
        assert!(!att.can_move());
    }

    #[test]
    fn merge_caps_attack_and_health() {
        let mut engine = two_bots(7);
        let a = engine.current_player();
        let from = Pos::new(19, 10);
        let to = Pos::new(20, 10);
        let mover = plant_soldier(&mut engine, a, from);
        let target = plant_soldier(&mut engine, a, to);
        set_soldier_stats(&mut engine, mover, 4, 10);
        set_soldier_stats(&mut engine, target, 4, 10);

        let events = engine
            .try_apply_command(Command::MoveSoldier { from, to })
            .unwrap();
        assert!(events.iter().any(|e| matches!(
            e,
            Event::SoldiersMerged { attack, hp, .. }
                if *attack == config::SOLDIER_ATTACK_CAP && *hp == config::SOLDIER_HEALTH_CAP
        )));
        assert!(engine.state().elements.get(mover).is_none());
        assert_eq!(
            engine.state().elements.get(target).unwrap().attack(),
            config::SOLDIER_ATTACK_CAP
        );
    }

    #[test]
    fn merge_into_a_maxed_soldier_is_rejected() {
        let mut engine = two_bots(7);
        let a = engine.current_player();
        let from = Pos::new(19, 10);
        let to = Pos::new(20, 10);
        plant_soldier(&mut engine, a, from);
        let target = plant_soldier(&mut engine, a, to);
        set_soldier_stats(
            &mut engine,
            target,
            config::SOLDIER_ATTACK_CAP,
            config::SOLDIER_HEALTH_CAP,
        );

        assert_eq!(
            engine.try_apply_command(Command::MoveSoldier { from, to }),
            Err(CommandError::MergeAtCap)
        );
    }

    #[test]
    fn moving_in_place_is_rejected() {
        let mut engine = two_bots(7);
        let a = engine.current_player();
        let at = Pos::new(19, 10);
        plant_soldier(&mut engine, a, at);
        assert_eq!(
            engine.try_apply_command(Command::MoveSoldier { from: at, to: at }),
            Err(CommandError::InvalidDestination)
        );
    }

    #[test]
    fn chopping_a_tree_pays_its_reward() {
        let mut engine = two_bots(7);
        let a = engine.current_player();
        let from = Pos::new(19, 10);
        let to = Pos::new(20, 10);
        plant_soldier(&mut engine, a, from);
        {
            let s = engine.state_mut();
            s.occupancy
                .place(&mut s.map, &mut s.elements, Element::forest_tree(to))
                .unwrap();
        }
        let gold_before = engine.state().players.get(a).unwrap().gold;

        let events = engine
            .try_apply_command(Command::MoveSoldier { from, to })
            .unwrap();
        assert!(events.iter().any(|e| matches!(
            e,
            Event::TreeChopped { by, reward, .. } if *by == a && *reward == config::TREE_REWARD
        )));

        let state = engine.state();
        assert_eq!(
            state.players.get(a).unwrap().gold,
            (gold_before + config::TREE_REWARD).min(config::GOLD_CAP)
        );
        // the soldier advances onto the cleared cell and claims it
        let soldier = state.elements.get(state.occupancy.get(to).unwrap()).unwrap();
        assert!(soldier.is_soldier());
        assert_eq!(state.players.owner_of(to), Some(a));
    }

    #[test]
    fn destroying_a_base_eliminates_and_transfers_territory() {
        let mut engine = two_bots(7);
        let a = engine.current_player();
        let b = engine.state().players.rotation()[1];
        let (b_home, base_id) = {
            let player = engine.state().players.get(b).unwrap();
            (player.home, player.elements[0])
        };
        engine.state_mut().elements.get_mut(base_id).unwrap().hp = 1;

        let from = engine
            .state()
            .map
            .neighbors4(b_home)
            .find(|&n| engine.state().map.is_free(n))
            .unwrap();
        plant_soldier(&mut engine, a, from);

        let events = engine
            .try_apply_command(Command::MoveSoldier { from, to: b_home })
            .unwrap();
        assert!(events
            .iter()
            .any(|e| matches!(e, Event::PlayerEliminated { player, by } if *player == b && *by == Some(a))));
        assert!(events
            .iter()
            .any(|e| matches!(e, Event::GameEnded { winner } if *winner == Some(a))));

        let state = engine.state();
        assert!(state.players.get(b).unwrap().eliminated);
        assert_eq!(state.players.get(b).unwrap().gold, 0);
        assert_eq!(state.players.owner_of(b_home), Some(a));
        assert!(engine.is_game_over());
        assert_eq!(engine.winner(), Some(a));

        // nothing runs after the game ends
        assert_eq!(
            engine.try_apply_command(Command::EndTurn),
            Err(CommandError::GameOver)
        );
    }

    #[test]
    fn unfair_bot_territory_goes_neutral_on_elimination() {
        let mut engine = two_bots(7);
        let a = engine.current_player();
        let b = engine.state().players.rotation()[1];
        engine.state_mut().players.get_mut(b).unwrap().difficulty = Difficulty::Unfair;
        let (b_home, base_id) = {
            let player = engine.state().players.get(b).unwrap();
            (player.home, player.elements[0])
        };
        engine.state_mut().elements.get_mut(base_id).unwrap().hp = 1;

        let from = engine
            .state()
            .map
            .neighbors4(b_home)
            .find(|&n| engine.state().map.is_free(n))
            .unwrap();
        plant_soldier(&mut engine, a, from);

        engine
            .try_apply_command(Command::MoveSoldier { from, to: b_home })
            .unwrap();
        assert_eq!(engine.state().players.owner_of(b_home), None);
    }

    #[test]
    fn end_turn_rotates_grants_income_and_flips_movability() {
        let mut engine = two_bots(7);
        let a = engine.current_player();
        let b = engine.state().players.rotation()[1];
        let a_soldier = plant_soldier(&mut engine, a, Pos::new(19, 10));
        let b_soldier = plant_soldier(&mut engine, b, Pos::new(15, 10));
        engine
            .state_mut()
            .elements
            .get_mut(b_soldier)
            .unwrap()
            .set_can_move(false);

        let (gold_before, income) = {
            let player = engine.state().players.get(b).unwrap();
            (player.gold, player.gold_per_turn)
        };

        let events = engine.try_apply_command(Command::EndTurn).unwrap();
        assert_eq!(engine.current_player(), b);
        assert!(events
            .iter()
            .any(|e| matches!(e, Event::TurnStarted { player, .. } if *player == b)));
        assert_eq!(
            engine.state().players.get(b).unwrap().gold,
            (gold_before + income).clamp(0, config::GOLD_CAP)
        );
        assert!(engine.state().elements.get(b_soldier).unwrap().can_move());
        assert!(!engine.state().elements.get(a_soldier).unwrap().can_move());
        assert_eq!(engine.state().stats.turns_played(a), 1);
    }

    #[test]
    fn attack_tower_strikes_at_turn_start() {
        let mut engine = two_bots(7);
        let a = engine.current_player();
        let b = engine.state().players.rotation()[1];
        plant_owned(&mut engine, b, Element::attack_tower(Pos::new(10, 10)));
        // diagonal cells are in tower range
        let victim = plant_soldier(&mut engine, a, Pos::new(11, 11));

        engine.try_apply_command(Command::EndTurn).unwrap();
        assert_eq!(
            engine.state().elements.get(victim).unwrap().hp,
            config::SOLDIER_HEALTH - config::ATTACK_TOWER_DAMAGE
        );
    }

    #[test]
    fn defense_tower_heals_wounded_allies() {
        let mut engine = two_bots(7);
        let b = engine.state().players.rotation()[1];
        plant_owned(&mut engine, b, Element::defense_tower(Pos::new(10, 10)));
        let wounded = plant_soldier(&mut engine, b, Pos::new(12, 10));
        engine.state_mut().elements.get_mut(wounded).unwrap().hp = 1;

        engine.try_apply_command(Command::EndTurn).unwrap();
        assert_eq!(engine.state().elements.get(wounded).unwrap().hp, 2);
    }

    #[test]
    fn forest_never_grows_past_its_cap() {
        let mut engine = two_bots(7);
        for _ in 0..100 {
            engine.try_apply_command(Command::EndTurn).unwrap();
        }
        let trees = engine
            .state()
            .elements
            .iter_ordered()
            .filter(|(_, el)| el.is_tree())
            .count();
        // the cap check runs before the roll, so a single roll may overshoot
        // by at most two trees
        assert!(trees <= config::TREE_CAP + 2, "{trees} trees");
    }

    #[test]
    fn snapshot_restore_is_lossless() {
        let mut engine = two_bots(7);
        let a = engine.current_player();
        plant_soldier(&mut engine, a, Pos::new(19, 10));
        engine.try_apply_command(Command::EndTurn).unwrap();
        engine.try_apply_command(Command::EndTurn).unwrap();

        let snapshot = engine.snapshot();
        let restored = GameEngine::restore(&snapshot).unwrap();
        assert_eq!(
            wire::snapshot_hash(&snapshot).unwrap(),
            wire::snapshot_hash(&restored.snapshot()).unwrap()
        );
    }

    #[test]
    fn restored_game_replays_identically() {
        let mut engine = two_bots(99);
        engine.try_apply_command(Command::EndTurn).unwrap();

        let snapshot = engine.snapshot();
        let mut restored = GameEngine::restore(&snapshot).unwrap();

        for _ in 0..10 {
            engine.try_apply_command(Command::EndTurn).unwrap();
            restored.try_apply_command(Command::EndTurn).unwrap();
        }
        assert_eq!(
            wire::snapshot_hash(&engine.snapshot()).unwrap(),
            wire::snapshot_hash(&restored.snapshot()).unwrap()
        );
    }

    #[test]
    fn restore_rejects_an_empty_player_list() {
        let engine = two_bots(7);
        let mut snapshot = engine.snapshot();
        snapshot.players.clear();
        snapshot.rotation.clear();
        assert_eq!(
            GameEngine::restore(&snapshot).unwrap_err(),
            SnapshotError::EmptyRegistry
        );
    }

    #[test]
    fn restore_rejects_conflicting_placements() {
        let engine = two_bots(7);
        let mut snapshot = engine.snapshot();
        let first = snapshot.elements[0].clone();
        snapshot.elements.push(first.clone());
        assert_eq!(
            GameEngine::restore(&snapshot).unwrap_err(),
            SnapshotError::DuplicatePlacement {
                x: first.pos.x,
                y: first.pos.y
            }
        );
    }

    #[test]
    fn restore_rejects_off_board_elements() {
        let engine = two_bots(7);
        let mut snapshot = engine.snapshot();
        snapshot.elements[0].pos = Pos::new(-1, 5);
        assert_eq!(
            GameEngine::restore(&snapshot).unwrap_err(),
            SnapshotError::BadPlacement { x: -1, y: 5 }
        );
    }

    #[test]
    fn apply_command_swallows_rejections() {
        let mut engine = two_bots(7);
        let events = engine.apply_command(Command::MoveSoldier {
            from: Pos::new(19, 10),
            to: Pos::new(20, 10),
        });
        assert!(events.is_empty());
    }
}
