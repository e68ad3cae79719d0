//! The per-match context and the Turn Coordinator.
//!
//! A [`MatchContext`] is everything one match knows. It is owned by exactly
//! one table actor, so there is no shared match state and any number of
//! matches run side by side. Humans and bots enter through the same
//! [`MatchContext::handle_request`]; host timers enter through
//! [`MatchContext::advance`].
//!
//! Every call appends its outgoing messages to an internal outbox, which
//! the host drains with [`MatchContext::take_outbox`] after each call.

use std::collections::{BTreeMap, HashMap, HashSet};

use powerturn_protocol::{ConnectionId, Recipient};
use powerturn_seats::{Roster, SeatIndex};
use powerturn_table::Outbox;
use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::card::{Card, CardFace, CardId, Rank};
use crate::config::GameConfig;
use crate::deck::{DeckEngine, PileCard, build_deck};
use crate::error::Rejection;
use crate::hand::Hand;
use crate::messages::{
    ClientRequest, RevealedCard, SeatSummary, SeatTotal, ServerEvent, Standing, TurnView,
};
use crate::power::SlotRef;
use crate::scoring;
use crate::timers::{HostTimers, TimerEvent, TimerKind};
use crate::turn::{Phase, ResolutionTicket, TurnState};

/// How a match ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Ranked(Vec<Standing>),
    /// Irrecoverable state; reported as a draw.
    Aborted(String),
}

/// A slot emptied by a kill, waiting for its replacement card.
#[derive(Debug, Clone, Copy)]
pub(crate) struct PendingRefill {
    pub ticket: ResolutionTicket,
    pub slot: SlotRef,
}

/// Passive totals-reveal state of one watcher.
#[derive(Debug, Clone)]
pub(crate) struct TotalsWatch {
    pub window_until_ms: u64,
    pub last: Vec<SeatTotal>,
}

pub struct MatchContext {
    pub(crate) config: GameConfig,
    pub(crate) roster: Roster,
    pub(crate) deck: DeckEngine,
    pub(crate) hands: Vec<Hand>,
    /// Drawn but uncommitted cards, one per seat (and so per connection).
    pub(crate) peeks: HashMap<SeatIndex, Card>,
    pub(crate) turn: TurnState,
    pub(crate) timers: HostTimers,
    /// Host clock. Only moves when the host ticks.
    pub(crate) clock_ms: u64,
    pub(crate) rng: StdRng,
    pub(crate) ready: HashSet<SeatIndex>,
    /// One watch per seat that used totals-reveal. Ordered so polling is
    /// deterministic.
    pub(crate) totals_watches: BTreeMap<SeatIndex, TotalsWatch>,
    pub(crate) refill: Option<PendingRefill>,
    outcome: Option<Outcome>,
    /// Cards in play at deal time. Never changes.
    card_total: usize,
    out: Outbox<ServerEvent>,
}

impl MatchContext {
    /// Builds and shuffles the deck, deals, and opens the peek phase.
    pub fn new(config: GameConfig, roster: Roster, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let config = config.validated();
        let deck = DeckEngine::new(build_deck(), config.reshuffle_keep, &mut rng);
        Self::start(config, roster, deck, rng)
    }

    /// Like [`new`](Self::new) but with a fixed stock order: the last face
    /// is drawn first. For replays and tests.
    pub fn with_stacked_deck(
        config: GameConfig,
        roster: Roster,
        seed: u64,
        stock: Vec<CardFace>,
    ) -> Self {
        let rng = StdRng::seed_from_u64(seed);
        let config = config.validated();
        let deck = DeckEngine::stacked(stock, config.reshuffle_keep);
        Self::start(config, roster, deck, rng)
    }

    fn start(config: GameConfig, roster: Roster, deck: DeckEngine, rng: StdRng) -> Self {
        let roster = roster.with_rotation(config.rotation);
        let hands = (0..roster.len()).map(|_| Hand::new(config.hand_size)).collect();
        let card_total = deck.total();

        let mut ctx = Self {
            config,
            roster,
            deck,
            hands,
            peeks: HashMap::new(),
            turn: TurnState::new(),
            timers: HostTimers::new(),
            clock_ms: 0,
            rng,
            ready: HashSet::new(),
            totals_watches: BTreeMap::new(),
            refill: None,
            outcome: None,
            card_total,
            out: Vec::new(),
        };
        ctx.open_peek_phase();
        ctx
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn deck(&self) -> &DeckEngine {
        &self.deck
    }

    pub fn hand(&self, seat: SeatIndex) -> Option<&Hand> {
        self.hands.get(seat)
    }

    pub fn turn(&self) -> &TurnState {
        &self.turn
    }

    pub fn timers(&self) -> &HostTimers {
        &self.timers
    }

    pub fn clock_ms(&self) -> u64 {
        self.clock_ms
    }

    pub fn pending_peek(&self, seat: SeatIndex) -> Option<&Card> {
        self.peeks.get(&seat)
    }

    pub fn outcome(&self) -> Option<&Outcome> {
        self.outcome.as_ref()
    }

    pub fn is_over(&self) -> bool {
        self.turn.is_over()
    }

    /// Seats that currently see every seat's total, lowest first.
    pub fn totals_watchers(&self) -> Vec<SeatIndex> {
        self.totals_watches.keys().copied().collect()
    }

    pub fn is_watching_totals(&self, seat: SeatIndex) -> bool {
        self.totals_watches.contains_key(&seat)
    }

    /// Cards dealt into the match.
    pub fn card_total(&self) -> usize {
        self.card_total
    }

    /// Cards currently accounted for across every zone. Equal to
    /// [`card_total`](Self::card_total) in every reachable state.
    pub fn card_count(&self) -> usize {
        self.deck.total() + self.hands.iter().map(Hand::count).sum::<usize>() + self.peeks.len()
    }

    pub fn take_outbox(&mut self) -> Outbox<ServerEvent> {
        std::mem::take(&mut self.out)
    }

    // -----------------------------------------------------------------------
    // Entry points
    // -----------------------------------------------------------------------

    /// The single request entry point, for humans and bots alike. The
    /// acting seat comes from `conn`, never from the request body.
    ///
    /// A rejected request changes nothing and sends nothing.
    pub fn handle_request(
        &mut self,
        conn: ConnectionId,
        request: ClientRequest,
    ) -> Result<(), Rejection> {
        if self.turn.is_over() {
            return Err(Rejection::MatchOver);
        }
        let seat = self.roster.seat_of(conn).ok_or(Rejection::NotSeated(conn))?;
        if !self.roster.in_match(seat) {
            return Err(Rejection::SeatNotInMatch(seat));
        }

        match request {
            ClientRequest::JoinReady => self.join_ready(seat),
            ClientRequest::PeekDraw => self.peek_draw(seat),
            ClientRequest::DiscardPeeked { card_id } => self.discard_peeked(seat, card_id),
            ClientRequest::SelectPowerTarget {
                kind,
                target_seat,
                target_card_index,
            } => self.select_target(seat, kind, target_seat, target_card_index),
            ClientRequest::RequestResumeTurn { ack } => self.request_resume(seat, ack),
        }
    }

    /// Advances the host clock and fires every timer that came due, in due
    /// order, then polls the totals watch.
    pub fn advance(&mut self, elapsed_ms: u64) {
        self.clock_ms += elapsed_ms;
        while let Some(event) = self.timers.pop_due(self.clock_ms) {
            self.fire(event);
        }
        self.poll_totals_watch();
    }

    /// Handles a timer event as if it had just come due. Events captured
    /// under an older turn serial or ticket do nothing.
    pub fn fire(&mut self, event: TimerEvent) {
        if self.turn.is_over() {
            return;
        }
        match event {
            TimerEvent::PeekPhaseEnd => {
                if *self.turn.phase() == Phase::WaitingForPeek {
                    tracing::info!("peek window elapsed");
                    self.end_peek_phase();
                }
            }
            TimerEvent::TurnDeadline { serial } => self.on_deadline(serial),
            TimerEvent::BotAct { seat, serial } => self.bot_act(seat, serial),
            TimerEvent::KillRefill { ticket } => self.run_refill(ticket),
            TimerEvent::ResolveDisplay { ticket } => {
                if !self.resume(ticket) {
                    tracing::debug!(serial = ticket.serial, "stale display timer dropped");
                }
            }
        }
    }

    /// A viewer attached for `conn`: first join or reconnect.
    pub fn seat_attached(&mut self, conn: ConnectionId) {
        let Some(seat) = self.roster.seat_of(conn) else {
            return;
        };
        let returning =
            !self.roster.is_bot(seat) && !self.roster.in_match(seat) && !self.turn.is_over();
        if returning && self.roster.reconnect(conn).is_ok() {
            self.broadcast(ServerEvent::SeatRejoined { seat });
        }

        let resync = self.resync_for(seat);
        self.send(Recipient::Connection(conn), resync);

        match self.turn.phase().clone() {
            Phase::WaitingForPeek => {
                let peek = self.initial_peek(seat);
                self.send(Recipient::Connection(conn), peek);
            }
            Phase::PowerPending {
                kind,
                initiator,
                first,
                ..
            } if initiator == seat => {
                let targets = crate::power::eligible_targets(kind, seat, &self.roster, &self.hands, first);
                let step = if first.is_some() { 2 } else { 1 };
                self.send(
                    Recipient::Connection(conn),
                    ServerEvent::PowerArmed { kind, step, targets },
                );
            }
            _ => {}
        }
        if let Some(card) = self.peeks.get(&seat) {
            let event = ServerEvent::PeekResult {
                card_id: card.id,
                face: card.face,
            };
            self.send(Recipient::Connection(conn), event);
        }
        if let Some(watch) = self.totals_watches.get(&seat) {
            let event = ServerEvent::TotalsUpdated {
                totals: watch.last.clone(),
            };
            self.send(Recipient::Connection(conn), event);
        }
    }

    /// The viewer for `conn` went away. Human seats leave the match; bot
    /// seats are played by the host and never leave.
    pub fn seat_detached(&mut self, conn: ConnectionId) {
        let Some(seat) = self.roster.seat_of(conn) else {
            return;
        };
        if self.roster.is_bot(seat) || self.turn.is_over() || !self.roster.in_match(seat) {
            return;
        }
        if self.roster.disconnect(conn).is_err() {
            return;
        }
        self.broadcast(ServerEvent::SeatLeft { seat });

        if let Some(card) = self.peeks.remove(&seat) {
            self.discard_card(seat, card);
            self.broadcast_deck();
        }

        match self.turn.phase().clone() {
            Phase::WaitingForPeek => {
                if self.roster.in_match_count() < 2 {
                    self.end_match();
                } else {
                    self.check_peek_complete();
                }
            }
            Phase::Normal => {
                if self.turn.active() == seat {
                    self.advance_from(seat);
                } else if self.should_end_match() {
                    self.end_match();
                }
            }
            Phase::PowerPending {
                kind,
                initiator,
                first,
                ..
            } => self.power_seat_left(seat, kind, initiator, first),
            // The display timer still resumes; advancing checks the end.
            Phase::Resolving { .. } | Phase::MatchOver => {}
        }
    }

    // -----------------------------------------------------------------------
    // Peek phase
    // -----------------------------------------------------------------------

    fn open_peek_phase(&mut self) {
        for _ in 0..self.config.hand_size {
            for seat in 0..self.hands.len() {
                let card = match self.deck.draw_top(&mut self.rng) {
                    Ok(card) => card,
                    Err(err) => {
                        self.abort_match(err.to_string());
                        return;
                    }
                };
                let index = self.hands[seat].count();
                self.place(seat, index, card);
            }
        }

        self.broadcast_deck();
        for seat in 0..self.hands.len() {
            self.broadcast_hand(seat);
            let peek = self.initial_peek(seat);
            self.send_to_seat(seat, peek);
        }

        self.ready = (0..self.roster.len())
            .filter(|&seat| self.roster.is_bot(seat))
            .collect();
        self.timers
            .restart(self.clock_ms + self.config.peek_window_ms, TimerEvent::PeekPhaseEnd);
        tracing::info!(
            seats = self.roster.len(),
            stock = self.deck.stock_count(),
            "cards dealt, peek phase open"
        );
        self.check_peek_complete();
    }

    fn initial_peek(&self, seat: SeatIndex) -> ServerEvent {
        let cards = self.hands[seat]
            .cards()
            .filter(|(index, _)| *index < self.config.initial_peek_count)
            .map(|(index, card)| RevealedCard {
                seat,
                index,
                card_id: card.id,
                face: card.face,
            })
            .collect();
        ServerEvent::InitialPeek { seat, cards }
    }

    fn join_ready(&mut self, seat: SeatIndex) -> Result<(), Rejection> {
        if *self.turn.phase() != Phase::WaitingForPeek {
            return Err(Rejection::WrongPhase(self.turn.phase().name()));
        }
        if !self.ready.insert(seat) {
            return Err(Rejection::AlreadyReady(seat));
        }
        tracing::debug!(seat, "seat ready");
        self.check_peek_complete();
        Ok(())
    }

    fn check_peek_complete(&mut self) {
        if *self.turn.phase() != Phase::WaitingForPeek {
            return;
        }
        let all_ready = self
            .roster
            .in_match_seats()
            .all(|seat| self.ready.contains(&seat));
        if all_ready {
            self.end_peek_phase();
        }
    }

    fn end_peek_phase(&mut self) {
        self.timers.cancel(TimerKind::PeekPhaseEnd);
        if self.roster.in_match_count() < 2 {
            self.end_match();
            return;
        }
        let first = if self.roster.in_match(0) {
            Some(0)
        } else {
            self.roster.next_seat(0)
        };
        match first {
            Some(seat) => self.start_turn(seat),
            None => self.end_match(),
        }
    }

    // -----------------------------------------------------------------------
    // Turn Coordinator
    // -----------------------------------------------------------------------

    fn start_turn(&mut self, seat: SeatIndex) {
        let deadline_ms = self.clock_ms + self.config.turn_ms;
        let serial = self.turn.start_turn(seat, deadline_ms);
        self.timers.cancel(TimerKind::BotAct);
        self.timers
            .restart(deadline_ms, TimerEvent::TurnDeadline { serial });

        tracing::debug!(seat, serial, deadline_ms, "turn started");
        self.broadcast(ServerEvent::TurnStarted {
            seat,
            serial,
            deadline_ms,
        });
        self.schedule_bot(seat);
    }

    pub(crate) fn require_active_normal(&self, seat: SeatIndex) -> Result<(), Rejection> {
        if *self.turn.phase() != Phase::Normal {
            return Err(Rejection::WrongPhase(self.turn.phase().name()));
        }
        if self.turn.active() != seat {
            return Err(Rejection::NotYourTurn {
                seat,
                active: self.turn.active(),
            });
        }
        Ok(())
    }

    fn peek_draw(&mut self, seat: SeatIndex) -> Result<(), Rejection> {
        self.require_active_normal(seat)?;
        if self.turn.drew() {
            return Err(Rejection::AlreadyDrew(seat));
        }

        let card = match self.deck.draw_top(&mut self.rng) {
            Ok(card) => card,
            Err(err) => {
                self.abort_match(err.to_string());
                return Ok(());
            }
        };
        self.turn.mark_drew();
        self.send_to_seat(
            seat,
            ServerEvent::PeekResult {
                card_id: card.id,
                face: card.face,
            },
        );
        self.peeks.insert(seat, card);
        self.broadcast_deck();
        self.schedule_bot(seat);
        Ok(())
    }

    fn discard_peeked(&mut self, seat: SeatIndex, card_id: CardId) -> Result<(), Rejection> {
        self.require_active_normal(seat)?;
        let (peeked_id, peeked_rank) = self
            .peeks
            .get(&seat)
            .map(|card| (card.id, card.face.rank))
            .ok_or(Rejection::NothingPeeked(seat))?;

        // Discard the peeked card itself.
        if card_id == peeked_id {
            let Some(card) = self.peeks.remove(&seat) else {
                return Err(Rejection::NothingPeeked(seat));
            };
            self.commit_single_discard(seat, card);
            return Ok(());
        }

        let index = self.hands[seat]
            .position(card_id)
            .ok_or(Rejection::UnknownCard(card_id))?;
        let (Some(peeked), Some(held)) = (self.peeks.remove(&seat), self.hands[seat].take(index))
        else {
            return Err(Rejection::UnknownCard(card_id));
        };

        if held.face.rank == peeked_rank {
            // Pair discard: both go, the slot stays empty, no power.
            tracing::debug!(seat, index, rank = ?peeked_rank, "pair discarded");
            self.discard_card(seat, held);
            self.discard_card(seat, peeked);
            self.broadcast_hand(seat);
            self.broadcast_deck();
            self.advance_from(seat);
        } else {
            self.place(seat, index, peeked);
            self.commit_single_discard(seat, held);
        }
        Ok(())
    }

    /// Discards one card and either triggers its power or ends the turn.
    fn commit_single_discard(&mut self, seat: SeatIndex, card: Card) {
        let power = card.power();
        let source = card.id;
        self.discard_card(seat, card);
        self.broadcast_hand(seat);
        self.broadcast_deck();

        match power {
            Some(kind) => self.begin_power(seat, kind, source),
            None => self.advance_from(seat),
        }
    }

    fn on_deadline(&mut self, serial: u64) {
        if !self.turn.is_current(serial) {
            tracing::debug!(serial, current = self.turn.serial(), "stale deadline dropped");
            return;
        }
        match self.turn.phase().clone() {
            Phase::Normal => {
                let active = self.turn.active();
                let peeked = self.peeks.get(&active).map(|card| card.id);
                match peeked {
                    Some(card_id) => {
                        tracing::info!(seat = active, serial, "turn timed out, discarding peeked card");
                        if let Err(rejection) = self.discard_peeked(active, card_id) {
                            tracing::warn!(%rejection, "forced discard failed");
                            self.advance_from(active);
                        }
                    }
                    None => {
                        tracing::info!(seat = active, serial, "turn timed out");
                        self.advance_from(active);
                    }
                }
            }
            Phase::PowerPending {
                kind, initiator, ..
            } => {
                self.abort_power(kind, initiator, crate::messages::AbortReason::TimedOut);
            }
            Phase::WaitingForPeek | Phase::Resolving { .. } | Phase::MatchOver => {}
        }
    }

    /// Ends the current turn and hands it to the seat after `from`.
    pub(crate) fn advance_from(&mut self, from: SeatIndex) {
        let ended = self.turn.active();
        let serial = self.turn.serial();
        self.broadcast(ServerEvent::TurnEnded {
            seat: ended,
            serial,
        });
        self.flush_refill();
        if self.turn.is_over() {
            return;
        }
        if self.should_end_match() {
            self.end_match();
            return;
        }
        match self.roster.next_seat(from) {
            Some(next) => self.start_turn(next),
            None => self.end_match(),
        }
    }

    fn should_end_match(&self) -> bool {
        self.roster.in_match_count() < 2
            || self
                .roster
                .in_match_seats()
                .any(|seat| self.hands[seat].is_empty())
    }

    /// Opens every hand, ranks the seats and closes the match.
    pub(crate) fn end_match(&mut self) {
        if self.turn.is_over() {
            return;
        }
        self.flush_refill();
        if self.turn.is_over() {
            return;
        }
        self.timers.clear();
        self.totals_watches.clear();
        for hand in &mut self.hands {
            hand.open_all();
        }

        let standings = scoring::rank(&self.roster, &self.hands);
        self.turn.end_match();
        tracing::info!(winner = ?standings.first().map(|s| s.seat), "match over");
        let hands = self.hands.iter().map(Hand::views).collect();
        self.broadcast(ServerEvent::MatchOver {
            standings: standings.clone(),
            hands,
        });
        self.outcome = Some(Outcome::Ranked(standings));
    }

    /// Ends the match early as a draw.
    pub(crate) fn abort_match(&mut self, reason: String) {
        if self.turn.is_over() {
            return;
        }
        tracing::warn!(%reason, "match aborted");
        self.timers.clear();
        self.totals_watches.clear();
        self.refill = None;
        self.turn.end_match();
        self.broadcast(ServerEvent::MatchAborted {
            reason: reason.clone(),
        });
        self.outcome = Some(Outcome::Aborted(reason));
    }

    // -----------------------------------------------------------------------
    // Totals watch
    // -----------------------------------------------------------------------

    fn poll_totals_watch(&mut self) {
        if self.totals_watches.is_empty() {
            return;
        }
        let totals = scoring::seat_totals(&self.roster, &self.hands);
        let mut updated = Vec::new();
        let mut hidden = Vec::new();

        for (&seat, watch) in &mut self.totals_watches {
            let present = self.roster.in_match(seat);
            let holding = self.hands[seat].contains_rank(Rank::Queen);
            let window_open = self.clock_ms < watch.window_until_ms;

            if !(present && (holding || window_open)) {
                hidden.push(seat);
            } else if watch.last != totals {
                watch.last = totals.clone();
                updated.push(seat);
            }
        }

        for seat in updated {
            let totals = totals.clone();
            self.send_to_seat(seat, ServerEvent::TotalsUpdated { totals });
        }
        for seat in hidden {
            self.totals_watches.remove(&seat);
            tracing::debug!(seat, "totals hidden");
            self.send_to_seat(seat, ServerEvent::TotalsHidden);
        }
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    /// Puts a card into a hand slot. Anything displaced goes to the
    /// discard pile so no card is ever lost.
    pub(crate) fn place(&mut self, seat: SeatIndex, index: usize, card: Card) {
        match self.hands[seat].put(index, card) {
            Ok(None) => {}
            Ok(Some(displaced)) | Err(displaced) => {
                tracing::warn!(seat, index, card = %displaced.id, "slot unavailable, card discarded");
                self.deck.discard(displaced);
            }
        }
    }

    /// Moves a card to the discard pile and tells everyone what it was.
    pub(crate) fn discard_card(&mut self, seat: SeatIndex, mut card: Card) {
        card.open = true;
        let pile = PileCard::from(&card);
        self.deck.discard(card);
        self.broadcast(ServerEvent::DiscardRevealed { seat, card: pile });
    }

    pub(crate) fn schedule_bot(&mut self, seat: SeatIndex) {
        if !self.roster.is_bot(seat) {
            return;
        }
        let delay = crate::bot::think_delay(&self.config, &mut self.rng);
        self.timers.restart(
            self.clock_ms + delay,
            TimerEvent::BotAct {
                seat,
                serial: self.turn.serial(),
            },
        );
    }

    fn resync_for(&self, seat: SeatIndex) -> ServerEvent {
        let seats = self
            .roster
            .seats()
            .iter()
            .map(|s| SeatSummary {
                seat: s.index,
                display_name: s.display_name.clone(),
                is_bot: s.is_bot,
                in_match: s.in_match(),
            })
            .collect();
        let turn = match self.turn.phase() {
            Phase::WaitingForPeek => None,
            phase => Some(TurnView {
                active: self.turn.active(),
                serial: self.turn.serial(),
                phase: phase.name().to_string(),
                deadline_ms: self.turn.deadline_ms(),
            }),
        };
        ServerEvent::Resync {
            your_seat: seat,
            rotation: self.roster.rotation(),
            seats,
            hands: self.hands.iter().map(Hand::views).collect(),
            deck: self.deck.snapshot(),
            turn,
        }
    }

    pub(crate) fn send(&mut self, recipient: Recipient, event: ServerEvent) {
        self.out.push((recipient, event));
    }

    pub(crate) fn broadcast(&mut self, event: ServerEvent) {
        self.send(Recipient::All, event);
    }

    pub(crate) fn send_to_seat(&mut self, seat: SeatIndex, event: ServerEvent) {
        if let Some(conn) = self.roster.connection(seat) {
            self.send(Recipient::Connection(conn), event);
        }
    }

    /// Everyone but `seat`'s connection.
    pub(crate) fn send_except_seat(&mut self, seat: SeatIndex, event: ServerEvent) {
        match self.roster.connection(seat) {
            Some(conn) => self.send(Recipient::AllExcept(conn), event),
            None => self.broadcast(event),
        }
    }

    pub(crate) fn broadcast_deck(&mut self) {
        let snapshot = self.deck.snapshot();
        self.broadcast(ServerEvent::DeckSnapshot { snapshot });
    }

    pub(crate) fn broadcast_hand(&mut self, seat: SeatIndex) {
        let cards = self.hands[seat].views();
        self.broadcast(ServerEvent::HandAssigned { seat, cards });
    }
}
