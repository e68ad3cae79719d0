//! Wire messages between viewers and the host.
//!
//! Both enums are internally tagged with `"type"`. A request never names
//! the acting seat: the host derives it from the connection the request
//! arrived on.

use powerturn_seats::{Rotation, SeatIndex};
use serde::{Deserialize, Serialize};

use crate::card::{CardFace, CardId, PowerKind, SlotView};
use crate::deck::{DeckSnapshot, PileCard};
use crate::power::{SlotRef, TargetSet};
use crate::turn::ResolutionTicket;

// ---------------------------------------------------------------------------
// Viewer → host
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientRequest {
    /// Done looking at the initial peek.
    JoinReady,
    /// Draw the stock's top card privately.
    PeekDraw,
    /// Commit the peeked card: discard it (`card_id` is the peeked card) or
    /// put it in place of the named hand card.
    DiscardPeeked { card_id: CardId },
    /// Pick a power target. `target_card_index` is `None` for seat targets.
    SelectPowerTarget {
        kind: PowerKind,
        target_seat: SeatIndex,
        target_card_index: Option<usize>,
    },
    /// The initiator's effect display finished.
    RequestResumeTurn { ack: ResolutionTicket },
}

// ---------------------------------------------------------------------------
// Host → viewer
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeatSummary {
    pub seat: SeatIndex,
    pub display_name: String,
    pub is_bot: bool,
    pub in_match: bool,
}

/// One card shown to a viewer, with where it sits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevealedCard {
    pub seat: SeatIndex,
    pub index: usize,
    pub card_id: CardId,
    pub face: CardFace,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeatTotal {
    pub seat: SeatIndex,
    pub points: u32,
}

/// Final placing of one seat. `place` 1 is the winner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Standing {
    pub place: usize,
    pub seat: SeatIndex,
    pub display_name: String,
    pub total: u32,
}

/// The current turn as a reconnecting viewer needs it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnView {
    pub active: SeatIndex,
    pub serial: u64,
    pub phase: String,
    pub deadline_ms: Option<u64>,
}

/// The role-scoped part of an applied effect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum EffectDetail {
    /// Information-free acknowledgement for everyone but the initiator.
    Hidden,
    Revealed { cards: Vec<RevealedCard> },
    /// Public: both cards are shown in their new slots.
    Swapped { cards: [RevealedCard; 2] },
    /// Public: the killed zone is face up.
    Killed { target: SlotRef, card: PileCard },
    Cursed { target: SlotRef, card_id: CardId },
    Totals { totals: Vec<SeatTotal> },
    Skipped { skipped: SeatIndex },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AbortReason {
    TimedOut,
    TargetUnavailable,
    InitiatorLeft,
    TargetLeft,
    NoEligibleTarget,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ServerEvent {
    /// Full state for one viewer, sent on every attach.
    Resync {
        your_seat: SeatIndex,
        rotation: Rotation,
        seats: Vec<SeatSummary>,
        hands: Vec<Vec<SlotView>>,
        deck: DeckSnapshot,
        turn: Option<TurnView>,
    },
    DeckSnapshot { snapshot: DeckSnapshot },
    HandAssigned { seat: SeatIndex, cards: Vec<SlotView> },
    /// Private: the slots this seat may look at during the peek phase.
    InitialPeek { seat: SeatIndex, cards: Vec<RevealedCard> },
    TurnStarted { seat: SeatIndex, serial: u64, deadline_ms: u64 },
    /// Private: the card the active seat just drew.
    PeekResult { card_id: CardId, face: CardFace },
    DiscardRevealed { seat: SeatIndex, card: PileCard },
    TurnEnded { seat: SeatIndex, serial: u64 },
    PowerStarted {
        kind: PowerKind,
        initiator: SeatIndex,
        serial: u64,
        deadline_ms: Option<u64>,
    },
    /// Private: the initiator's single-shot selection capability.
    PowerArmed { kind: PowerKind, step: u8, targets: TargetSet },
    PowerEffectApplied {
        kind: PowerKind,
        initiator: SeatIndex,
        seats: Vec<SeatIndex>,
        detail: EffectDetail,
        ticket: ResolutionTicket,
    },
    PowerAborted {
        kind: PowerKind,
        initiator: SeatIndex,
        reason: AbortReason,
    },
    BonusCue { initiator: SeatIndex, holder: SeatIndex },
    SlotRefilled { seat: SeatIndex, index: usize, card_id: CardId },
    /// Private: sent to the seat a skip passes over.
    SkipNotice { skipped: SeatIndex, by: SeatIndex },
    /// Private: sent to the totals-reveal watcher.
    TotalsUpdated { totals: Vec<SeatTotal> },
    TotalsHidden,
    SeatLeft { seat: SeatIndex },
    SeatRejoined { seat: SeatIndex },
    MatchOver {
        standings: Vec<Standing>,
        hands: Vec<Vec<SlotView>>,
    },
    MatchAborted { reason: String },
}
