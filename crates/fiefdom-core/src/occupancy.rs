use std::collections::HashMap;

use fiefdom_protocol::{ElementId, Pos};

use crate::{element::Element, map::GameMap, store::ElementArena};

/// Cell → element lookup. Kept in lockstep with `Cell::occupied` and with
/// each element's `pos`; all placement goes through these three functions.
#[derive(Clone, Debug, Default)]
pub struct OccupancyIndex {
    by_cell: HashMap<Pos, ElementId>,
}

impl OccupancyIndex {
    pub fn get(&self, pos: Pos) -> Option<ElementId> {
        self.by_cell.get(&pos).copied()
    }

    pub fn is_occupied(&self, pos: Pos) -> bool {
        self.by_cell.contains_key(&pos)
    }

    pub fn len(&self) -> usize {
        self.by_cell.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_cell.is_empty()
    }

    /// Insert a new element onto a free usable cell.
    pub fn place(
        &mut self,
        map: &mut GameMap,
        arena: &mut ElementArena,
        element: Element,
    ) -> Option<ElementId> {
        let pos = element.pos;
        if !map.is_free(pos) {
            return None;
        }
        let id = arena.insert(element);
        self.by_cell.insert(pos, id);
        map.cell_mut(pos).expect("free implies in bounds").occupied = true;
        Some(id)
    }

    /// Remove an element from the board, freeing its cell.
    pub fn remove(
        &mut self,
        map: &mut GameMap,
        arena: &mut ElementArena,
        id: ElementId,
    ) -> Option<Element> {
        let element = arena.remove(id)?;
        let stored = self.by_cell.remove(&element.pos);
        debug_assert_eq!(stored, Some(id));
        if let Some(cell) = map.cell_mut(element.pos) {
            cell.occupied = false;
        }
        Some(element)
    }

    /// Move an element to a free cell, updating its stored position.
    pub fn relocate(
        &mut self,
        map: &mut GameMap,
        arena: &mut ElementArena,
        id: ElementId,
        to: Pos,
    ) -> bool {
        if !map.is_free(to) {
            return false;
        }
        let Some(element) = arena.get_mut(id) else {
            return false;
        };
        let from = element.pos;
        element.face_toward(to);
        element.pos = to;

        let stored = self.by_cell.remove(&from);
        debug_assert_eq!(stored, Some(id));
        self.by_cell.insert(to, id);
        if let Some(cell) = map.cell_mut(from) {
            cell.occupied = false;
        }
        map.cell_mut(to).expect("free implies in bounds").occupied = true;
        true
    }
}
