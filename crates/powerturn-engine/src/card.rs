//! Cards: faces, identities, visibility and the seven powers.

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Faces
// ---------------------------------------------------------------------------

/// A card's "type" on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Suit {
    Clubs,
    Diamonds,
    Hearts,
    Spades,
}

impl Suit {
    pub const ALL: [Suit; 4] = [Suit::Clubs, Suit::Diamonds, Suit::Hearts, Suit::Spades];
}

/// A card's "value" on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Rank {
    Zero,
    Ace,
    Two,
    Three,
    Four,
    Five,
    Six,
    Seven,
    Eight,
    Nine,
    Ten,
    Jack,
    Queen,
    King,
}

impl Rank {
    pub const ALL: [Rank; 14] = [
        Rank::Zero,
        Rank::Ace,
        Rank::Two,
        Rank::Three,
        Rank::Four,
        Rank::Five,
        Rank::Six,
        Rank::Seven,
        Rank::Eight,
        Rank::Nine,
        Rank::Ten,
        Rank::Jack,
        Rank::Queen,
        Rank::King,
    ];

    /// Points this rank scores. Face cards are worth 20; lower is better.
    pub fn points(self) -> u32 {
        match self {
            Rank::Jack | Rank::Queen | Rank::King => 20,
            other => other as u32,
        }
    }

    /// The power a discard of this rank triggers, if any.
    pub fn power(self) -> Option<PowerKind> {
        match self {
            Rank::Seven => Some(PowerKind::RevealOne),
            Rank::Eight => Some(PowerKind::RevealAll),
            Rank::Nine => Some(PowerKind::Swap),
            Rank::Ten => Some(PowerKind::Curse),
            Rank::Jack => Some(PowerKind::Skip),
            Rank::Queen => Some(PowerKind::TotalsReveal),
            Rank::King => Some(PowerKind::Kill),
            _ => None,
        }
    }
}

/// What is printed on a card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CardFace {
    pub rank: Rank,
    pub suit: Suit,
}

impl CardFace {
    pub fn new(rank: Rank, suit: Suit) -> Self {
        Self { rank, suit }
    }

    pub fn points(&self) -> u32 {
        self.rank.points()
    }
}

impl fmt::Display for CardFace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} of {:?}", self.rank, self.suit)
    }
}

// ---------------------------------------------------------------------------
// Identity and state
// ---------------------------------------------------------------------------

/// Identity of one physical card for the whole match.
///
/// Ids are assigned after the opening shuffle in stock order, so an id
/// says nothing about the face behind it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CardId(pub u32);

impl fmt::Display for CardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A card as the host knows it.
///
/// `open` and `cursed` are independent: a curse stays invisible to every
/// viewer until the card is shown open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Card {
    pub id: CardId,
    pub face: CardFace,
    pub open: bool,
    pub cursed: bool,
}

impl Card {
    pub fn new(id: CardId, face: CardFace) -> Self {
        Self {
            id,
            face,
            open: false,
            cursed: false,
        }
    }

    pub fn point_value(&self) -> u32 {
        self.face.points()
    }

    /// Value counted at match end: doubled for a card that is both cursed
    /// and open.
    pub fn scored_value(&self) -> u32 {
        if self.cursed && self.open {
            self.point_value() * 2
        } else {
            self.point_value()
        }
    }

    pub fn power(&self) -> Option<PowerKind> {
        self.face.rank.power()
    }

    /// What any viewer may see of this card in a hand.
    pub fn view(&self) -> SlotView {
        if self.open {
            SlotView::Open {
                card_id: self.id,
                face: self.face,
                cursed: self.cursed,
            }
        } else {
            SlotView::Closed { card_id: self.id }
        }
    }
}

/// Public view of one hand slot. A closed card shows its id only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state")]
pub enum SlotView {
    Empty,
    Closed { card_id: CardId },
    Open {
        card_id: CardId,
        face: CardFace,
        cursed: bool,
    },
}

impl SlotView {
    pub fn card_id(&self) -> Option<CardId> {
        match self {
            SlotView::Empty => None,
            SlotView::Closed { card_id } | SlotView::Open { card_id, .. } => Some(*card_id),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, SlotView::Empty)
    }
}

// ---------------------------------------------------------------------------
// Powers
// ---------------------------------------------------------------------------

/// The seven power sub-protocols.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PowerKind {
    RevealOne,
    RevealAll,
    Swap,
    Kill,
    Curse,
    TotalsReveal,
    Skip,
}

/// What a power's selection step picks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetMode {
    /// Resolves immediately, no selection.
    None,
    /// One hand slot per step.
    Slot,
    /// A whole seat.
    Seat,
}

impl PowerKind {
    pub fn target_mode(self) -> TargetMode {
        match self {
            PowerKind::RevealOne | PowerKind::Swap | PowerKind::Kill | PowerKind::Curse => {
                TargetMode::Slot
            }
            PowerKind::RevealAll => TargetMode::Seat,
            PowerKind::TotalsReveal | PowerKind::Skip => TargetMode::None,
        }
    }

    /// Number of selection steps before the effect applies.
    pub fn steps(self) -> u8 {
        match self {
            PowerKind::Swap => 2,
            PowerKind::TotalsReveal | PowerKind::Skip => 0,
            _ => 1,
        }
    }

    /// Whether the initiator may pick its own cards.
    pub fn may_target_self(self) -> bool {
        matches!(self, PowerKind::RevealOne | PowerKind::Swap)
    }
}

impl fmt::Display for PowerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PowerKind::RevealOne => "reveal-one",
            PowerKind::RevealAll => "reveal-all",
            PowerKind::Swap => "swap",
            PowerKind::Kill => "kill",
            PowerKind::Curse => "curse",
            PowerKind::TotalsReveal => "totals-reveal",
            PowerKind::Skip => "skip",
        };
        f.write_str(name)
    }
}
