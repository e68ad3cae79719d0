//! Viewer projection.
//!
//! What one viewer knows about the match, rebuilt from the host's
//! envelopes alone. Nothing here is authoritative: a viewer never mutates
//! canonical state, it only turns local input into at most one request.
//!
//! Every slot, every seat and the peeked card carry a [`Capability`] tag.
//! The host's messages set the tags; one dispatcher per input kind reads
//! the tag, locks *all* tags before returning, and produces the request.
//! A second tap that races the first finds everything locked.
//!
//! Seats are stored in the viewer's local order (own seat first), mapped
//! through [`rotation::to_local`] and [`rotation::to_global`].

use std::collections::HashMap;

use powerturn_protocol::Envelope;
use powerturn_seats::{SeatIndex, rotation};

use crate::card::{CardFace, CardId, PowerKind, SlotView};
use crate::deck::DeckSnapshot;
use crate::messages::{ClientRequest, EffectDetail, SeatTotal, ServerEvent, Standing};
use crate::turn::{Phase, ResolutionTicket};

/// What a tap on a slot, seat or the peeked card may do right now.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Capability {
    #[default]
    Locked,
    SelectableAsTarget(PowerKind),
    SelectableAsDiscard,
    /// Only ever on the stock.
    SelectableAsDraw,
}

/// Cosmetic cues. Fire-and-forget; nothing waits on them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cue {
    TurnStarted,
    Discard,
    PowerStarted(PowerKind),
    PowerEffect(PowerKind),
    PowerAborted(PowerKind),
    Bonus,
    Skip,
    Refill,
    SeatLeft,
    SeatRejoined,
    MatchOver,
}

/// Where cosmetic cues go (animations, sounds).
pub trait CosmeticSink {
    fn play_effect(&mut self, cue: Cue, local_seat: usize);
}

/// Discards every cue.
impl CosmeticSink for () {
    fn play_effect(&mut self, _cue: Cue, _local_seat: usize) {}
}

/// One seat as the viewer sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalSeat {
    pub global: SeatIndex,
    pub display_name: String,
    pub is_bot: bool,
    pub in_match: bool,
    pub slots: Vec<SlotView>,
    pub slot_caps: Vec<Capability>,
    pub seat_cap: Capability,
}

#[derive(Debug, Default)]
pub struct ViewerProjection {
    me: Option<SeatIndex>,
    last_seq: u64,
    /// Local order: index 0 is this viewer's own seat.
    seats: Vec<LocalSeat>,
    deck: DeckSnapshot,
    active: Option<SeatIndex>,
    peeked: Option<(CardId, CardFace)>,
    peeked_cap: Capability,
    stock_cap: Capability,
    ready_sent: bool,
    /// Ticket of the effect this viewer initiated and has not resumed yet.
    pending_ticket: Option<ResolutionTicket>,
    /// Faces this viewer was shown privately.
    known: HashMap<CardId, CardFace>,
    totals: Option<Vec<SeatTotal>>,
    standings: Option<Vec<Standing>>,
    aborted: Option<String>,
}

impl ViewerProjection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn me(&self) -> Option<SeatIndex> {
        self.me
    }

    pub fn last_seq(&self) -> u64 {
        self.last_seq
    }

    pub fn seat_count(&self) -> usize {
        self.seats.len()
    }

    /// Seats in local order.
    pub fn seats(&self) -> &[LocalSeat] {
        &self.seats
    }

    pub fn seat(&self, local: usize) -> Option<&LocalSeat> {
        self.seats.get(local)
    }

    /// Local index of a global seat, once the viewer knows its own seat.
    pub fn local_of(&self, global: SeatIndex) -> Option<usize> {
        let me = self.me?;
        let n = self.seats.len();
        (global < n).then(|| rotation::to_local(me, global, n))
    }

    pub fn global_of(&self, local: usize) -> Option<SeatIndex> {
        self.seats.get(local).map(|s| s.global)
    }

    pub fn deck(&self) -> &DeckSnapshot {
        &self.deck
    }

    pub fn active(&self) -> Option<SeatIndex> {
        self.active
    }

    pub fn is_my_turn(&self) -> bool {
        self.me.is_some() && self.active == self.me
    }

    pub fn peeked(&self) -> Option<(CardId, CardFace)> {
        self.peeked
    }

    pub fn peeked_capability(&self) -> Capability {
        self.peeked_cap
    }

    pub fn slot_capability(&self, local: usize, index: usize) -> Capability {
        self.seats
            .get(local)
            .and_then(|s| s.slot_caps.get(index).copied())
            .unwrap_or_default()
    }

    pub fn stock_capability(&self) -> Capability {
        self.stock_cap
    }

    pub fn seat_capability(&self, local: usize) -> Capability {
        self.seats.get(local).map(|s| s.seat_cap).unwrap_or_default()
    }

    /// True while any input would produce a request.
    pub fn has_open_capability(&self) -> bool {
        self.peeked_cap != Capability::Locked
            || self.stock_cap != Capability::Locked
            || self.seats.iter().any(|s| {
                s.seat_cap != Capability::Locked
                    || s.slot_caps.iter().any(|c| *c != Capability::Locked)
            })
    }

    pub fn known_face(&self, card_id: CardId) -> Option<CardFace> {
        self.known.get(&card_id).copied()
    }

    pub fn totals(&self) -> Option<&[SeatTotal]> {
        self.totals.as_deref()
    }

    pub fn standings(&self) -> Option<&[Standing]> {
        self.standings.as_deref()
    }

    pub fn aborted(&self) -> Option<&str> {
        self.aborted.as_deref()
    }

    // -----------------------------------------------------------------------
    // Host → projection
    // -----------------------------------------------------------------------

    /// Applies one envelope. Returns `false` (and changes nothing) when its
    /// seq is not newer than the last applied one.
    pub fn apply(&mut self, envelope: &Envelope<ServerEvent>, sink: &mut impl CosmeticSink) -> bool {
        if !envelope.is_newer_than(self.last_seq) {
            return false;
        }
        self.last_seq = envelope.seq;

        match &envelope.body {
            ServerEvent::Resync {
                your_seat,
                seats,
                hands,
                deck,
                turn,
                ..
            } => {
                let n = seats.len();
                self.me = Some(*your_seat);
                self.seats = (0..n)
                    .filter_map(|local| {
                        let global = rotation::to_global(*your_seat, local, n);
                        let summary = seats.get(global)?;
                        let slots = hands.get(global).cloned().unwrap_or_default();
                        Some(LocalSeat {
                            global,
                            display_name: summary.display_name.clone(),
                            is_bot: summary.is_bot,
                            in_match: summary.in_match,
                            slot_caps: vec![Capability::Locked; slots.len()],
                            slots,
                            seat_cap: Capability::Locked,
                        })
                    })
                    .collect();
                self.deck = deck.clone();
                self.active = turn.as_ref().map(|t| t.active);
                self.peeked = None;
                self.lock_all();
                // A draw that never got an answer can be retried. If the
                // host holds a peeked card, its PeekResult follows and
                // locks the stock again.
                if turn
                    .as_ref()
                    .is_some_and(|t| t.active == *your_seat && t.phase == Phase::Normal.name())
                {
                    self.stock_cap = Capability::SelectableAsDraw;
                }
            }
            ServerEvent::DeckSnapshot { snapshot } => self.deck = snapshot.clone(),
            ServerEvent::HandAssigned { seat, cards } => self.set_hand(*seat, cards.clone()),
            ServerEvent::InitialPeek { cards, .. } => {
                for card in cards {
                    self.known.insert(card.card_id, card.face);
                }
            }
            ServerEvent::TurnStarted { seat, .. } => {
                self.active = Some(*seat);
                self.peeked = None;
                self.lock_all();
                if self.me == Some(*seat) {
                    self.stock_cap = Capability::SelectableAsDraw;
                }
                self.cue(sink, Cue::TurnStarted, *seat);
            }
            ServerEvent::PeekResult { card_id, face } => {
                self.peeked = Some((*card_id, *face));
                self.known.insert(*card_id, *face);
                self.lock_all();
                self.peeked_cap = Capability::SelectableAsDiscard;
                if let Some(own) = self.seats.first_mut() {
                    for (cap, slot) in own.slot_caps.iter_mut().zip(&own.slots) {
                        if !slot.is_empty() {
                            *cap = Capability::SelectableAsDiscard;
                        }
                    }
                }
            }
            ServerEvent::DiscardRevealed { seat, card } => {
                if Some(*seat) == self.me {
                    self.peeked = None;
                    self.lock_all();
                }
                self.known.insert(card.card_id, card.face);
                self.cue(sink, Cue::Discard, *seat);
            }
            ServerEvent::TurnEnded { .. } => {
                self.peeked = None;
                self.lock_all();
            }
            ServerEvent::PowerStarted {
                kind, initiator, ..
            } => self.cue(sink, Cue::PowerStarted(*kind), *initiator),
            ServerEvent::PowerArmed { kind, targets, .. } => {
                self.lock_all();
                for slot in &targets.slots {
                    if let Some(cap) = self
                        .local_of(slot.seat)
                        .and_then(|local| self.seats.get_mut(local))
                        .and_then(|s| s.slot_caps.get_mut(slot.index))
                    {
                        *cap = Capability::SelectableAsTarget(*kind);
                    }
                }
                for &seat in &targets.seats {
                    if let Some(s) = self.local_of(seat).and_then(|local| self.seats.get_mut(local)) {
                        s.seat_cap = Capability::SelectableAsTarget(*kind);
                    }
                }
            }
            ServerEvent::PowerEffectApplied {
                kind,
                initiator,
                seats,
                detail,
                ticket,
            } => {
                self.lock_all();
                if Some(*initiator) == self.me {
                    self.pending_ticket = Some(*ticket);
                }
                match detail {
                    EffectDetail::Revealed { cards } => {
                        for card in cards {
                            self.known.insert(card.card_id, card.face);
                        }
                    }
                    EffectDetail::Swapped { cards } => {
                        for card in cards {
                            self.known.insert(card.card_id, card.face);
                        }
                    }
                    EffectDetail::Totals { totals } => self.totals = Some(totals.clone()),
                    _ => {}
                }
                for &seat in seats {
                    self.cue(sink, Cue::PowerEffect(*kind), seat);
                }
            }
            ServerEvent::PowerAborted {
                kind, initiator, ..
            } => {
                self.lock_all();
                self.cue(sink, Cue::PowerAborted(*kind), *initiator);
            }
            ServerEvent::BonusCue { holder, .. } => self.cue(sink, Cue::Bonus, *holder),
            ServerEvent::SlotRefilled { seat, .. } => self.cue(sink, Cue::Refill, *seat),
            ServerEvent::SkipNotice { skipped, .. } => self.cue(sink, Cue::Skip, *skipped),
            ServerEvent::TotalsUpdated { totals } => self.totals = Some(totals.clone()),
            ServerEvent::TotalsHidden => self.totals = None,
            ServerEvent::SeatLeft { seat } => {
                self.set_in_match(*seat, false);
                self.cue(sink, Cue::SeatLeft, *seat);
            }
            ServerEvent::SeatRejoined { seat } => {
                self.set_in_match(*seat, true);
                self.cue(sink, Cue::SeatRejoined, *seat);
            }
            ServerEvent::MatchOver { standings, hands } => {
                for (global, cards) in hands.iter().enumerate() {
                    self.set_hand(global, cards.clone());
                }
                self.standings = Some(standings.clone());
                self.finish();
                if let Some(winner) = standings.first() {
                    self.cue(sink, Cue::MatchOver, winner.seat);
                }
            }
            ServerEvent::MatchAborted { reason } => {
                self.aborted = Some(reason.clone());
                self.finish();
            }
        }
        true
    }

    // -----------------------------------------------------------------------
    // Input → request
    // -----------------------------------------------------------------------

    /// A tap on slot `index` of the seat at `local`.
    pub fn on_slot_input(&mut self, local: usize, index: usize) -> Option<ClientRequest> {
        let cap = self.slot_capability(local, index);
        if cap == Capability::Locked {
            return None;
        }
        self.lock_all();

        let seat = self.seats.get(local)?;
        match cap {
            Capability::SelectableAsTarget(kind) => Some(ClientRequest::SelectPowerTarget {
                kind,
                target_seat: seat.global,
                target_card_index: Some(index),
            }),
            Capability::SelectableAsDiscard => {
                let card_id = seat.slots.get(index)?.card_id()?;
                Some(ClientRequest::DiscardPeeked { card_id })
            }
            Capability::Locked | Capability::SelectableAsDraw => None,
        }
    }

    /// A tap on the seat at `local` as a whole.
    pub fn on_seat_input(&mut self, local: usize) -> Option<ClientRequest> {
        let Capability::SelectableAsTarget(kind) = self.seat_capability(local) else {
            return None;
        };
        self.lock_all();
        Some(ClientRequest::SelectPowerTarget {
            kind,
            target_seat: self.seats.get(local)?.global,
            target_card_index: None,
        })
    }

    /// A tap on the peeked card: discard it.
    pub fn on_peeked_input(&mut self) -> Option<ClientRequest> {
        if self.peeked_cap != Capability::SelectableAsDiscard {
            return None;
        }
        let (card_id, _) = self.peeked?;
        self.lock_all();
        Some(ClientRequest::DiscardPeeked { card_id })
    }

    /// A tap on the stock. Open at the start of this viewer's turn until
    /// the first tap.
    pub fn on_stock_input(&mut self) -> Option<ClientRequest> {
        if self.stock_cap != Capability::SelectableAsDraw {
            return None;
        }
        self.lock_all();
        Some(ClientRequest::PeekDraw)
    }

    /// Done looking at the initial peek. Sent once.
    pub fn on_ready_input(&mut self) -> Option<ClientRequest> {
        if self.ready_sent || self.me.is_none() {
            return None;
        }
        self.ready_sent = true;
        Some(ClientRequest::JoinReady)
    }

    /// The effect display for `ticket` finished. Only the initiator's
    /// viewer asks to resume, and only once per ticket.
    pub fn on_effect_finished(&mut self, ticket: ResolutionTicket) -> Option<ClientRequest> {
        if self.pending_ticket != Some(ticket) {
            return None;
        }
        self.pending_ticket = None;
        Some(ClientRequest::RequestResumeTurn { ack: ticket })
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    fn lock_all(&mut self) {
        self.peeked_cap = Capability::Locked;
        self.stock_cap = Capability::Locked;
        for seat in &mut self.seats {
            seat.seat_cap = Capability::Locked;
            seat.slot_caps.fill(Capability::Locked);
        }
    }

    fn finish(&mut self) {
        self.active = None;
        self.peeked = None;
        self.pending_ticket = None;
        self.totals = None;
        self.lock_all();
    }

    fn set_hand(&mut self, global: SeatIndex, cards: Vec<SlotView>) {
        let Some(seat) = self.local_of(global).and_then(|local| self.seats.get_mut(local)) else {
            return;
        };
        seat.slot_caps.resize(cards.len(), Capability::Locked);
        for (cap, slot) in seat.slot_caps.iter_mut().zip(&cards) {
            if slot.is_empty() {
                *cap = Capability::Locked;
            }
        }
        seat.slots = cards;
    }

    fn set_in_match(&mut self, global: SeatIndex, in_match: bool) {
        if let Some(seat) = self.local_of(global).and_then(|local| self.seats.get_mut(local)) {
            seat.in_match = in_match;
            if !in_match {
                seat.seat_cap = Capability::Locked;
                seat.slot_caps.fill(Capability::Locked);
            }
        }
    }

    fn cue(&self, sink: &mut impl CosmeticSink, cue: Cue, global: SeatIndex) {
        if let Some(local) = self.local_of(global) {
            sink.play_effect(cue, local);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::{Rank, Suit};
    use crate::deck::PileCard;
    use crate::messages::{RevealedCard, SeatSummary, TurnView};
    use crate::power::{SlotRef, TargetSet};
    use powerturn_seats::Rotation;

    #[derive(Default)]
    struct Recorder(Vec<(Cue, usize)>);

    impl CosmeticSink for Recorder {
        fn play_effect(&mut self, cue: Cue, local_seat: usize) {
            self.0.push((cue, local_seat));
        }
    }

    fn closed(ids: &[u32]) -> Vec<SlotView> {
        ids.iter()
            .map(|&id| SlotView::Closed { card_id: CardId(id) })
            .collect()
    }

    fn resync(me: SeatIndex) -> ServerEvent {
        ServerEvent::Resync {
            your_seat: me,
            rotation: Rotation::Clockwise,
            seats: (0..3)
                .map(|seat| SeatSummary {
                    seat,
                    display_name: format!("p{seat}"),
                    is_bot: false,
                    in_match: true,
                })
                .collect(),
            hands: vec![closed(&[0, 1, 2]), closed(&[3, 4, 5]), closed(&[6, 7, 8])],
            deck: DeckSnapshot::default(),
            turn: None,
        }
    }

    struct Feed {
        seq: u64,
    }

    impl Feed {
        fn next(&mut self, body: ServerEvent) -> Envelope<ServerEvent> {
            self.seq += 1;
            Envelope::new(self.seq, 0, body)
        }
    }

    fn projection(me: SeatIndex) -> (ViewerProjection, Feed) {
        let mut view = ViewerProjection::new();
        let mut feed = Feed { seq: 0 };
        assert!(view.apply(&feed.next(resync(me)), &mut ()));
        (view, feed)
    }

    fn ticket(serial: u64) -> ResolutionTicket {
        ResolutionTicket {
            serial,
            kind: PowerKind::RevealOne,
        }
    }

    #[test]
    fn test_seats_in_local_order() {
        let (view, _) = projection(2);
        let order: Vec<_> = view.seats().iter().map(|s| s.global).collect();
        assert_eq!(order, vec![2, 0, 1]);
        assert_eq!(view.local_of(1), Some(2));
        assert_eq!(view.global_of(1), Some(0));
    }

    #[test]
    fn test_duplicate_and_old_envelopes_are_dropped() {
        let (mut view, mut feed) = projection(0);
        let started = feed.next(ServerEvent::TurnStarted {
            seat: 1,
            serial: 1,
            deadline_ms: 6000,
        });
        assert!(view.apply(&started, &mut ()));
        assert!(!view.apply(&started, &mut ()));

        let stale = Envelope::new(1, 0, ServerEvent::TurnStarted {
            seat: 0,
            serial: 9,
            deadline_ms: 0,
        });
        assert!(!view.apply(&stale, &mut ()));
        assert_eq!(view.active(), Some(1));
    }

    #[test]
    fn test_armed_targets_accept_exactly_one_pick() {
        let (mut view, mut feed) = projection(1);
        let targets = TargetSet {
            seats: Vec::new(),
            slots: vec![SlotRef { seat: 0, index: 0 }, SlotRef { seat: 2, index: 1 }],
        };
        view.apply(
            &feed.next(ServerEvent::PowerArmed {
                kind: PowerKind::Kill,
                step: 1,
                targets,
            }),
            &mut (),
        );
        // Global seat 2 sits at local 1 for seat 1.
        assert_eq!(
            view.slot_capability(1, 1),
            Capability::SelectableAsTarget(PowerKind::Kill)
        );
        assert_eq!(view.slot_capability(0, 0), Capability::Locked);

        let first = view.on_slot_input(1, 1);
        assert_eq!(
            first,
            Some(ClientRequest::SelectPowerTarget {
                kind: PowerKind::Kill,
                target_seat: 2,
                target_card_index: Some(1),
            })
        );
        // The other target was revoked by the first pick.
        assert_eq!(view.on_slot_input(2, 0), None);
        assert!(!view.has_open_capability());
    }

    #[test]
    fn test_seat_target_for_reveal_all() {
        let (mut view, mut feed) = projection(0);
        view.apply(
            &feed.next(ServerEvent::PowerArmed {
                kind: PowerKind::RevealAll,
                step: 1,
                targets: TargetSet {
                    seats: vec![2],
                    slots: Vec::new(),
                },
            }),
            &mut (),
        );
        assert_eq!(view.on_seat_input(1), None);
        assert_eq!(
            view.on_seat_input(2),
            Some(ClientRequest::SelectPowerTarget {
                kind: PowerKind::RevealAll,
                target_seat: 2,
                target_card_index: None,
            })
        );
        assert_eq!(view.on_seat_input(2), None);
    }

    #[test]
    fn test_peek_result_offers_discard_choices() {
        let (mut view, mut feed) = projection(0);
        view.apply(
            &feed.next(ServerEvent::TurnStarted {
                seat: 0,
                serial: 1,
                deadline_ms: 6000,
            }),
            &mut (),
        );
        assert_eq!(view.on_stock_input(), Some(ClientRequest::PeekDraw));
        assert_eq!(view.on_stock_input(), None);

        let face = CardFace::new(Rank::Three, Suit::Clubs);
        view.apply(
            &feed.next(ServerEvent::PeekResult {
                card_id: CardId(40),
                face,
            }),
            &mut (),
        );
        assert_eq!(view.peeked_capability(), Capability::SelectableAsDiscard);
        assert_eq!(view.slot_capability(0, 2), Capability::SelectableAsDiscard);
        assert_eq!(view.slot_capability(1, 0), Capability::Locked);

        assert_eq!(
            view.on_slot_input(0, 2),
            Some(ClientRequest::DiscardPeeked { card_id: CardId(2) })
        );
        assert_eq!(view.on_peeked_input(), None);
    }

    #[test]
    fn test_lost_draw_is_retried_after_resync() {
        let (mut view, mut feed) = projection(0);
        view.apply(
            &feed.next(ServerEvent::TurnStarted {
                seat: 0,
                serial: 1,
                deadline_ms: 6000,
            }),
            &mut (),
        );
        assert_eq!(view.stock_capability(), Capability::SelectableAsDraw);
        assert_eq!(view.on_stock_input(), Some(ClientRequest::PeekDraw));
        assert_eq!(view.stock_capability(), Capability::Locked);

        // The PeekResult never arrives; the host still sits in Normal.
        let mut event = resync(0);
        if let ServerEvent::Resync { turn, .. } = &mut event {
            *turn = Some(TurnView {
                active: 0,
                serial: 1,
                phase: "Normal".into(),
                deadline_ms: Some(6000),
            });
        }
        view.apply(&feed.next(event), &mut ());
        assert_eq!(view.stock_capability(), Capability::SelectableAsDraw);
        assert_eq!(view.on_stock_input(), Some(ClientRequest::PeekDraw));
    }

    #[test]
    fn test_stock_stays_locked_on_other_turns() {
        let (mut view, mut feed) = projection(0);
        view.apply(
            &feed.next(ServerEvent::TurnStarted {
                seat: 1,
                serial: 1,
                deadline_ms: 6000,
            }),
            &mut (),
        );
        assert_eq!(view.stock_capability(), Capability::Locked);
        assert_eq!(view.on_stock_input(), None);
    }

    #[test]
    fn test_resume_latch_only_for_initiator() {
        let (mut mine, mut feed) = projection(0);
        let (mut theirs, _) = projection(1);
        let applied = ServerEvent::PowerEffectApplied {
            kind: PowerKind::RevealOne,
            initiator: 0,
            seats: vec![1],
            detail: EffectDetail::Hidden,
            ticket: ticket(4),
        };
        let envelope = feed.next(applied);
        mine.apply(&envelope, &mut ());
        theirs.apply(&envelope, &mut ());

        assert_eq!(theirs.on_effect_finished(ticket(4)), None);
        assert_eq!(mine.on_effect_finished(ticket(3)), None);
        assert_eq!(
            mine.on_effect_finished(ticket(4)),
            Some(ClientRequest::RequestResumeTurn { ack: ticket(4) })
        );
        assert_eq!(mine.on_effect_finished(ticket(4)), None);
    }

    #[test]
    fn test_revealed_faces_are_remembered() {
        let (mut view, mut feed) = projection(0);
        let face = CardFace::new(Rank::King, Suit::Hearts);
        view.apply(
            &feed.next(ServerEvent::PowerEffectApplied {
                kind: PowerKind::RevealOne,
                initiator: 0,
                seats: vec![2],
                detail: EffectDetail::Revealed {
                    cards: vec![RevealedCard {
                        seat: 2,
                        index: 0,
                        card_id: CardId(6),
                        face,
                    }],
                },
                ticket: ticket(2),
            }),
            &mut (),
        );
        assert_eq!(view.known_face(CardId(6)), Some(face));
    }

    #[test]
    fn test_cues_use_local_seats() {
        let (mut view, mut feed) = projection(1);
        let mut sink = Recorder::default();
        view.apply(
            &feed.next(ServerEvent::DiscardRevealed {
                seat: 0,
                card: PileCard {
                    card_id: CardId(1),
                    face: CardFace::new(Rank::Two, Suit::Clubs),
                    cursed: false,
                },
            }),
            &mut sink,
        );
        view.apply(&feed.next(ServerEvent::BonusCue { initiator: 0, holder: 1 }), &mut sink);
        assert_eq!(sink.0, vec![(Cue::Discard, 2), (Cue::Bonus, 0)]);
    }

    #[test]
    fn test_seat_left_locks_its_targets() {
        let (mut view, mut feed) = projection(0);
        view.apply(
            &feed.next(ServerEvent::PowerArmed {
                kind: PowerKind::Swap,
                step: 1,
                targets: TargetSet {
                    seats: Vec::new(),
                    slots: vec![SlotRef { seat: 1, index: 0 }, SlotRef { seat: 0, index: 0 }],
                },
            }),
            &mut (),
        );
        view.apply(&feed.next(ServerEvent::SeatLeft { seat: 1 }), &mut ());
        assert_eq!(view.slot_capability(1, 0), Capability::Locked);
        assert!(!view.seat(1).unwrap().in_match);
        assert!(view.has_open_capability());
    }
}
