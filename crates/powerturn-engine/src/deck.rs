//! Deck Engine: the canonical draw stock, discard pile and killed zone.
//!
//! Host-only. Viewers converge on the host's piles through
//! [`DeckSnapshot`]s, which never carry the identity of a stock card.

use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::card::{Card, CardFace, CardId, Rank, Suit};
use crate::error::DeckError;

/// The fixed, unshuffled composition: every rank in every suit.
pub fn build_deck() -> Vec<CardFace> {
    Suit::ALL
        .iter()
        .flat_map(|&suit| Rank::ALL.iter().map(move |&rank| CardFace::new(rank, suit)))
        .collect()
}

/// An open card lying on the discard pile or in the killed zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PileCard {
    pub card_id: CardId,
    pub face: CardFace,
    pub cursed: bool,
}

impl From<&Card> for PileCard {
    fn from(card: &Card) -> Self {
        Self {
            card_id: card.id,
            face: card.face,
            cursed: card.cursed,
        }
    }
}

/// What every viewer may know about the piles.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeckSnapshot {
    pub stock_count: usize,
    /// Bottom first; the last entry is the visible top.
    pub discard: Vec<PileCard>,
    pub killed: Vec<PileCard>,
}

#[derive(Debug, Clone)]
pub struct DeckEngine {
    /// Drawn from the tail.
    stock: Vec<Card>,
    /// Appended at the tail.
    discard: Vec<Card>,
    killed: Vec<Card>,
    /// Discard cards left in place when the stock is rebuilt.
    reshuffle_keep: usize,
}

impl DeckEngine {
    /// Shuffles `faces` and assigns card ids in the resulting stock order.
    pub fn new<R: Rng + ?Sized>(mut faces: Vec<CardFace>, reshuffle_keep: usize, rng: &mut R) -> Self {
        faces.shuffle(rng);
        Self::stacked(faces, reshuffle_keep)
    }

    /// A stock in exactly the given order, last face on top. Ids are still
    /// assigned in stock order.
    pub fn stacked(faces: Vec<CardFace>, reshuffle_keep: usize) -> Self {
        let stock = faces
            .into_iter()
            .enumerate()
            .map(|(i, face)| Card::new(CardId(i as u32), face))
            .collect();
        Self {
            stock,
            discard: Vec::new(),
            killed: Vec::new(),
            reshuffle_keep,
        }
    }

    /// Removes and returns the stock's tail card.
    ///
    /// An empty stock is first rebuilt from the discard pile, keeping the
    /// newest `reshuffle_keep` discards so the visible top stays put.
    pub fn draw_top<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<Card, DeckError> {
        if self.stock.is_empty() {
            self.reshuffle(rng);
        }
        self.stock.pop().ok_or(DeckError::EmptyAfterReshuffle)
    }

    fn reshuffle<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let mut take = self.discard.len().saturating_sub(self.reshuffle_keep);
        if take == 0 {
            // Nothing older than the kept tail; recycle it rather than fail.
            take = self.discard.len();
        }
        if take == 0 {
            return;
        }

        let mut recycled: Vec<Card> = self.discard.drain(..take).collect();
        for card in &mut recycled {
            card.open = false;
        }
        recycled.shuffle(rng);
        self.stock = recycled;

        tracing::info!(
            stock = self.stock.len(),
            discard = self.discard.len(),
            "stock rebuilt from discard pile"
        );
    }

    /// Appends a card to the discard pile, face up.
    pub fn discard(&mut self, mut card: Card) {
        card.open = true;
        self.discard.push(card);
    }

    /// Moves a card to the killed zone, face up, for good.
    pub fn kill(&mut self, mut card: Card) {
        card.open = true;
        self.killed.push(card);
    }

    /// Takes a card back off the discard pile and slides it under the
    /// stock, closed.
    pub fn return_to_stock(&mut self, card_id: CardId) -> Result<(), DeckError> {
        let pos = self
            .discard
            .iter()
            .position(|c| c.id == card_id)
            .ok_or(DeckError::NotInDiscard(card_id))?;
        let mut card = self.discard.remove(pos);
        card.open = false;
        self.stock.insert(0, card);
        Ok(())
    }

    pub fn top_discard(&self) -> Option<&Card> {
        self.discard.last()
    }

    pub fn stock_count(&self) -> usize {
        self.stock.len()
    }

    pub fn discard_count(&self) -> usize {
        self.discard.len()
    }

    pub fn killed_count(&self) -> usize {
        self.killed.len()
    }

    /// Cards held by the piles (stock, discard and killed zone).
    pub fn total(&self) -> usize {
        self.stock.len() + self.discard.len() + self.killed.len()
    }

    pub fn snapshot(&self) -> DeckSnapshot {
        DeckSnapshot {
            stock_count: self.stock.len(),
            discard: self.discard.iter().map(PileCard::from).collect(),
            killed: self.killed.iter().map(PileCard::from).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn engine(seed: u64) -> (DeckEngine, StdRng) {
        let mut rng = StdRng::seed_from_u64(seed);
        let deck = DeckEngine::new(build_deck(), 1, &mut rng);
        (deck, rng)
    }

    #[test]
    fn test_build_deck_has_56_distinct_faces() {
        let faces = build_deck();
        assert_eq!(faces.len(), 56);
        for (i, a) in faces.iter().enumerate() {
            assert!(!faces[i + 1..].contains(a));
        }
    }

    #[test]
    fn test_ids_follow_stock_order() {
        let (mut deck, mut rng) = engine(3);
        let top = deck.draw_top(&mut rng).unwrap();
        assert_eq!(top.id, CardId(55));
        assert!(!top.open);
    }

    #[test]
    fn test_same_seed_same_order() {
        let (mut a, mut ra) = engine(9);
        let (mut b, mut rb) = engine(9);
        for _ in 0..10 {
            assert_eq!(a.draw_top(&mut ra).unwrap(), b.draw_top(&mut rb).unwrap());
        }
    }

    #[test]
    fn test_reshuffle_keeps_visible_top() {
        let (mut deck, mut rng) = engine(1);
        while deck.stock_count() > 0 {
            let card = deck.draw_top(&mut rng).unwrap();
            deck.discard(card);
        }
        let top = deck.top_discard().unwrap().id;

        let drawn = deck.draw_top(&mut rng).unwrap();
        assert!(!drawn.open, "recycled cards come back closed");
        assert_eq!(deck.discard_count(), 1);
        assert_eq!(deck.top_discard().unwrap().id, top);
        assert_eq!(deck.stock_count(), 54);
    }

    #[test]
    fn test_curse_survives_recycling() {
        let (mut deck, mut rng) = engine(2);
        let mut cursed = deck.draw_top(&mut rng).unwrap();
        cursed.cursed = true;
        let id = cursed.id;
        deck.discard(cursed);
        while deck.stock_count() > 0 {
            let card = deck.draw_top(&mut rng).unwrap();
            deck.discard(card);
        }

        let mut found = false;
        for _ in 0..55 {
            let card = deck.draw_top(&mut rng).unwrap();
            if card.id == id {
                assert!(card.cursed);
                found = true;
            }
        }
        assert!(found);
    }

    #[test]
    fn test_empty_after_reshuffle() {
        let (mut deck, mut rng) = engine(4);
        let mut held = Vec::new();
        while let Ok(card) = deck.draw_top(&mut rng) {
            held.push(card);
        }
        assert_eq!(held.len(), 56);
        assert_eq!(deck.draw_top(&mut rng), Err(DeckError::EmptyAfterReshuffle));
    }

    #[test]
    fn test_kill_and_return_to_stock() {
        let (mut deck, mut rng) = engine(5);
        let a = deck.draw_top(&mut rng).unwrap();
        let b = deck.draw_top(&mut rng).unwrap();
        let b_id = b.id;
        deck.kill(a);
        deck.discard(b);
        assert_eq!(deck.total(), 56);

        deck.return_to_stock(b_id).unwrap();
        assert_eq!(deck.discard_count(), 0);
        assert_eq!(deck.killed_count(), 1);
        assert_eq!(deck.stock_count(), 55);
        assert_eq!(deck.return_to_stock(b_id), Err(DeckError::NotInDiscard(b_id)));
    }

    #[test]
    fn test_snapshot_hides_stock() {
        let (mut deck, mut rng) = engine(6);
        let card = deck.draw_top(&mut rng).unwrap();
        deck.discard(card.clone());

        let snap = deck.snapshot();
        assert_eq!(snap.stock_count, 55);
        assert_eq!(snap.discard, vec![PileCard::from(&card)]);
        assert!(snap.killed.is_empty());
    }
}
