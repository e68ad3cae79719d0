//! A seat's hand: a fixed number of slots, each holding at most one card.

use crate::card::{Card, CardId, Rank, SlotView};

#[derive(Debug, Clone, Default)]
pub struct Hand {
    slots: Vec<Option<Card>>,
}

impl Hand {
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: vec![None; capacity],
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Occupied slots.
    pub fn count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    pub fn get(&self, index: usize) -> Option<&Card> {
        self.slots.get(index).and_then(Option::as_ref)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Card> {
        self.slots.get_mut(index).and_then(Option::as_mut)
    }

    /// Empties a slot and returns its card.
    pub fn take(&mut self, index: usize) -> Option<Card> {
        self.slots.get_mut(index).and_then(Option::take)
    }

    /// Puts `card` into `index`, returning whatever was there. A card for
    /// an index past capacity is handed back untouched.
    pub fn put(&mut self, index: usize, card: Card) -> Result<Option<Card>, Card> {
        match self.slots.get_mut(index) {
            Some(slot) => Ok(slot.replace(card)),
            None => Err(card),
        }
    }

    /// Exchanges the contents of two slots of this hand.
    pub fn swap_slots(&mut self, a: usize, b: usize) {
        if a < self.slots.len() && b < self.slots.len() {
            self.slots.swap(a, b);
        }
    }

    pub fn position(&self, card_id: CardId) -> Option<usize> {
        self.slots
            .iter()
            .position(|s| s.as_ref().is_some_and(|c| c.id == card_id))
    }

    /// Occupied slots with their indices.
    pub fn cards(&self) -> impl Iterator<Item = (usize, &Card)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.as_ref().map(|c| (i, c)))
    }

    pub fn contains_rank(&self, rank: Rank) -> bool {
        self.cards().any(|(_, c)| c.face.rank == rank)
    }

    /// Face-value total, curse ignored.
    pub fn total_points(&self) -> u32 {
        self.cards().map(|(_, c)| c.point_value()).sum()
    }

    /// Match-end total, curse applied to open cards.
    pub fn scored_total(&self) -> u32 {
        self.cards().map(|(_, c)| c.scored_value()).sum()
    }

    pub fn open_all(&mut self) {
        for card in self.slots.iter_mut().flatten() {
            card.open = true;
        }
    }

    /// Public view of every slot.
    pub fn views(&self) -> Vec<SlotView> {
        self.slots
            .iter()
            .map(|s| s.as_ref().map_or(SlotView::Empty, Card::view))
            .collect()
    }
}
