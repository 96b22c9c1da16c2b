use fiefdom_protocol::ElementId;

use crate::element::Element;

#[derive(Clone, Debug, Default)]
struct Slot {
    generation: u32,
    value: Option<Element>,
}

/// Deterministic, generational storage for board elements.
///
/// - Stable iteration order: ascending slot index.
/// - Safe handles: `ElementId { index, generation }`.
#[derive(Clone, Debug, Default)]
pub struct ElementArena {
    slots: Vec<Slot>,
    free: Vec<u32>,
}

impl ElementArena {
    pub fn insert(&mut self, value: Element) -> ElementId {
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            debug_assert!(slot.value.is_none());
            slot.value = Some(value);
            ElementId::new(index, slot.generation)
        } else {
            let index = self.slots.len() as u32;
            self.slots.push(Slot {
                generation: 0,
                value: Some(value),
            });
            ElementId::new(index, 0)
        }
    }

    pub fn get(&self, id: ElementId) -> Option<&Element> {
        let slot = self.slots.get(id.index as usize)?;
        if slot.generation == id.generation {
            slot.value.as_ref()
        } else {
            None
        }
    }

    pub fn get_mut(&mut self, id: ElementId) -> Option<&mut Element> {
        let slot = self.slots.get_mut(id.index as usize)?;
        if slot.generation == id.generation {
            slot.value.as_mut()
        } else {
            None
        }
    }

    pub fn remove(&mut self, id: ElementId) -> Option<Element> {
        let slot = self.slots.get_mut(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        let value = slot.value.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index);
        Some(value)
    }

    /// Distinct mutable borrows, for soldier-vs-soldier resolution.
    pub fn get2_mut(
        &mut self,
        a: ElementId,
        b: ElementId,
    ) -> Option<(&mut Element, &mut Element)> {
        if a.index == b.index {
            return None;
        }

        let (low, high, a_is_low) = if a.index < b.index {
            (a, b, true)
        } else {
            (b, a, false)
        };

        let high_index = high.index as usize;
        if high_index >= self.slots.len() {
            return None;
        }

        let (left, right) = self.slots.split_at_mut(high_index);
        let low_slot = left.get_mut(low.index as usize)?;
        let high_slot = right.get_mut(0)?;

        if low_slot.generation != low.generation || high_slot.generation != high.generation {
            return None;
        }

        let low_val = low_slot.value.as_mut()?;
        let high_val = high_slot.value.as_mut()?;

        if a_is_low {
            Some((low_val, high_val))
        } else {
            Some((high_val, low_val))
        }
    }

    pub fn iter_ordered(&self) -> impl Iterator<Item = (ElementId, &Element)> {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            let value = slot.value.as_ref()?;
            Some((ElementId::new(index as u32, slot.generation), value))
        })
    }

    pub fn iter_ordered_mut(&mut self) -> impl Iterator<Item = (ElementId, &mut Element)> {
        self.slots
            .iter_mut()
            .enumerate()
            .filter_map(|(index, slot)| {
                let value = slot.value.as_mut()?;
                Some((ElementId::new(index as u32, slot.generation), value))
            })
    }

    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.value.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fiefdom_protocol::Pos;

    #[test]
    fn stale_handle_rejected_after_remove() {
        let mut arena = ElementArena::default();
        let id = arena.insert(Element::soldier(Pos::new(1, 1)));
        assert!(arena.get(id).is_some());
        arena.remove(id).unwrap();
        assert!(arena.get(id).is_none());

        let reused = arena.insert(Element::house(Pos::new(2, 2)));
        assert_eq!(reused.index, id.index);
        assert_ne!(reused.generation, id.generation);
        assert!(arena.get(id).is_none());
        assert!(arena.get(reused).is_some());
    }

    #[test]
    fn iteration_is_ascending_by_slot() {
        let mut arena = ElementArena::default();
        let a = arena.insert(Element::soldier(Pos::new(0, 0)));
        let b = arena.insert(Element::soldier(Pos::new(1, 0)));
        let c = arena.insert(Element::soldier(Pos::new(2, 0)));
        arena.remove(b);
        let ids: Vec<_> = arena.iter_ordered().map(|(id, _)| id.index).collect();
        assert_eq!(ids, vec![a.index, c.index]);
    }

    #[test]
    fn get2_mut_rejects_same_slot() {
        let mut arena = ElementArena::default();
        let a = arena.insert(Element::soldier(Pos::new(0, 0)));
        assert!(arena.get2_mut(a, a).is_none());
    }
}
