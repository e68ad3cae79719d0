//! Power Resolution Protocol.
//!
//! A discarded power card suspends the turn:
//!
//! ```text
//! discard ─→ PowerPending ─select─→ (validate, apply) ─→ Resolving ─latch─→ next turn
//!                 │                                                  ↑
//!                 └──── timeout / target gone / initiator gone ──────┘ (abort, no effect)
//! ```
//!
//! The initiator gets the full result; everyone else gets an
//! information-free acknowledgement unless the effect is public (swap,
//! kill, skip). The Resolving phase ends through the single latch on
//! [`TurnState`](crate::turn::TurnState): the display timer and the
//! initiator's resume request race for it and exactly one wins.

use powerturn_seats::{Roster, SeatIndex};
use rand::Rng;
use rand::seq::IndexedRandom;
use serde::{Deserialize, Serialize};

use crate::card::{CardId, PowerKind, TargetMode};
use crate::config::RevealAllReuse;
use crate::deck::PileCard;
use crate::error::Rejection;
use crate::game::{MatchContext, PendingRefill, TotalsWatch};
use crate::hand::Hand;
use crate::messages::{AbortReason, ClientRequest, EffectDetail, RevealedCard, ServerEvent};
use crate::scoring;
use crate::timers::{TimerEvent, TimerKind};
use crate::turn::{Phase, ResolutionTicket};

// ---------------------------------------------------------------------------
// Targets
// ---------------------------------------------------------------------------

/// One hand slot at the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SlotRef {
    pub seat: SeatIndex,
    pub index: usize,
}

/// Everything the initiator may pick in the current selection step.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetSet {
    pub seats: Vec<SeatIndex>,
    pub slots: Vec<SlotRef>,
}

impl TargetSet {
    pub fn is_empty(&self) -> bool {
        self.seats.is_empty() && self.slots.is_empty()
    }

    pub fn contains_seat(&self, seat: SeatIndex) -> bool {
        self.seats.contains(&seat)
    }

    pub fn contains_slot(&self, slot: SlotRef) -> bool {
        self.slots.contains(&slot)
    }

    /// A uniformly random member.
    pub fn pick<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<Target> {
        if !self.slots.is_empty() {
            self.slots.choose(rng).copied().map(Target::Slot)
        } else {
            self.seats.choose(rng).copied().map(Target::Seat)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Slot(SlotRef),
    Seat(SeatIndex),
}

impl Target {
    /// The request a viewer sends to pick this target.
    pub fn to_request(self, kind: PowerKind) -> ClientRequest {
        match self {
            Target::Slot(slot) => ClientRequest::SelectPowerTarget {
                kind,
                target_seat: slot.seat,
                target_card_index: Some(slot.index),
            },
            Target::Seat(seat) => ClientRequest::SelectPowerTarget {
                kind,
                target_seat: seat,
                target_card_index: None,
            },
        }
    }
}

/// Eligible targets of `kind` for `initiator`, excluding `exclude` (swap's
/// first pick).
///
/// - reveal-one, swap: any occupied slot of any in-match seat
/// - kill, curse: occupied slots of other in-match seats
/// - reveal-all: other in-match seats with a non-empty hand
pub fn eligible_targets(
    kind: PowerKind,
    initiator: SeatIndex,
    roster: &Roster,
    hands: &[Hand],
    exclude: Option<SlotRef>,
) -> TargetSet {
    let candidates = roster
        .in_match_seats()
        .filter(|&seat| kind.may_target_self() || seat != initiator);

    match kind.target_mode() {
        TargetMode::None => TargetSet::default(),
        TargetMode::Seat => TargetSet {
            seats: candidates
                .filter(|&seat| hands.get(seat).is_some_and(|h| !h.is_empty()))
                .collect(),
            slots: Vec::new(),
        },
        TargetMode::Slot => TargetSet {
            seats: Vec::new(),
            slots: candidates
                .flat_map(|seat| {
                    hands
                        .get(seat)
                        .into_iter()
                        .flat_map(move |h| h.cards().map(move |(index, _)| SlotRef { seat, index }))
                })
                .filter(|slot| Some(*slot) != exclude)
                .collect(),
        },
    }
}

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

impl MatchContext {
    /// Suspends the turn for `kind`. `source` is the discarded power card.
    pub(crate) fn begin_power(&mut self, initiator: SeatIndex, kind: PowerKind, source: CardId) {
        self.timers.cancel(TimerKind::BotAct);

        let deadline_ms = (kind.target_mode() != TargetMode::None)
            .then(|| self.clock_ms + self.config.power_select_ms);
        let serial = self.turn.enter_power_pending(kind, source, deadline_ms);
        match deadline_ms {
            Some(due) => self.timers.restart(due, TimerEvent::TurnDeadline { serial }),
            None => {
                self.timers.cancel(TimerKind::TurnDeadline);
            }
        }

        tracing::info!(seat = initiator, %kind, serial, "power triggered");
        self.broadcast(ServerEvent::PowerStarted {
            kind,
            initiator,
            serial,
            deadline_ms,
        });

        match kind {
            PowerKind::Skip => self.apply_skip(initiator),
            PowerKind::TotalsReveal => self.apply_totals(initiator),
            _ => self.arm(kind, initiator, None),
        }
    }

    /// Hands the initiator its selection capability for the next step.
    fn arm(&mut self, kind: PowerKind, initiator: SeatIndex, first: Option<SlotRef>) {
        let targets = eligible_targets(kind, initiator, &self.roster, &self.hands, first);
        if targets.is_empty() {
            self.abort_power(kind, initiator, AbortReason::NoEligibleTarget);
            return;
        }
        let step = if first.is_some() { 2 } else { 1 };
        self.send_to_seat(initiator, ServerEvent::PowerArmed { kind, step, targets });
        self.schedule_bot(initiator);
    }

    pub(crate) fn select_target(
        &mut self,
        seat: SeatIndex,
        kind: PowerKind,
        target_seat: SeatIndex,
        target_card_index: Option<usize>,
    ) -> Result<(), Rejection> {
        let Phase::PowerPending {
            kind: pending,
            initiator,
            source,
            first,
        } = self.turn.phase().clone()
        else {
            return Err(Rejection::WrongPhase(self.turn.phase().name()));
        };
        if seat != initiator {
            return Err(Rejection::NotYourTurn {
                seat,
                active: initiator,
            });
        }
        if kind != pending {
            return Err(Rejection::WrongPower {
                expected: pending,
                got: kind,
            });
        }
        if target_seat >= self.roster.len() || (!kind.may_target_self() && target_seat == initiator)
        {
            return Err(Rejection::IneligibleTarget(kind));
        }

        match kind.target_mode() {
            TargetMode::None => Err(Rejection::IneligibleTarget(kind)),
            TargetMode::Seat => {
                if target_card_index.is_some() {
                    return Err(Rejection::IneligibleTarget(kind));
                }
                if !self.roster.in_match(target_seat) {
                    self.abort_power(kind, initiator, AbortReason::TargetLeft);
                } else if self.hands[target_seat].is_empty() {
                    self.abort_power(kind, initiator, AbortReason::TargetUnavailable);
                } else {
                    self.apply_reveal_all(initiator, target_seat, source);
                }
                Ok(())
            }
            TargetMode::Slot => {
                let index = target_card_index.ok_or(Rejection::IneligibleTarget(kind))?;
                if index >= self.hands[target_seat].capacity() {
                    return Err(Rejection::IneligibleTarget(kind));
                }
                let target = SlotRef {
                    seat: target_seat,
                    index,
                };
                if first == Some(target) {
                    return Err(Rejection::IneligibleTarget(kind));
                }

                // The card or its seat vanished before the pick arrived.
                if !self.roster.in_match(target_seat) {
                    self.abort_power(kind, initiator, AbortReason::TargetLeft);
                    return Ok(());
                }
                if self.hands[target_seat].get(index).is_none() {
                    self.abort_power(kind, initiator, AbortReason::TargetUnavailable);
                    return Ok(());
                }

                match (kind, first) {
                    (PowerKind::RevealOne, _) => self.apply_reveal_one(initiator, target),
                    (PowerKind::Swap, None) => {
                        self.turn.record_first_pick(target);
                        self.arm(kind, initiator, Some(target));
                    }
                    (PowerKind::Swap, Some(first)) => self.apply_swap(initiator, first, target),
                    (PowerKind::Kill, _) => self.apply_kill(initiator, target),
                    (PowerKind::Curse, _) => self.apply_curse(initiator, target),
                    _ => return Err(Rejection::IneligibleTarget(kind)),
                }
                Ok(())
            }
        }
    }

    /// Enters Resolving, arms the latch and starts the display timer.
    fn resolve(
        &mut self,
        kind: PowerKind,
        resume_from: SeatIndex,
        extra_display_ms: u64,
    ) -> ResolutionTicket {
        let ticket = self.turn.enter_resolving(kind, resume_from);
        self.timers.cancel(TimerKind::TurnDeadline);
        self.timers.cancel(TimerKind::BotAct);
        self.timers.restart(
            self.clock_ms + self.config.resolve_display_ms + extra_display_ms,
            TimerEvent::ResolveDisplay { ticket },
        );
        tracing::debug!(%kind, serial = ticket.serial, "power resolving");
        ticket
    }

    /// Full detail to the initiator, an empty acknowledgement to the rest.
    fn emit_scoped(
        &mut self,
        kind: PowerKind,
        initiator: SeatIndex,
        seats: Vec<SeatIndex>,
        detail: EffectDetail,
        ticket: ResolutionTicket,
    ) {
        self.send_to_seat(
            initiator,
            ServerEvent::PowerEffectApplied {
                kind,
                initiator,
                seats: seats.clone(),
                detail,
                ticket,
            },
        );
        self.send_except_seat(
            initiator,
            ServerEvent::PowerEffectApplied {
                kind,
                initiator,
                seats,
                detail: EffectDetail::Hidden,
                ticket,
            },
        );
    }

    fn emit_public(
        &mut self,
        kind: PowerKind,
        initiator: SeatIndex,
        seats: Vec<SeatIndex>,
        detail: EffectDetail,
        ticket: ResolutionTicket,
    ) {
        self.broadcast(ServerEvent::PowerEffectApplied {
            kind,
            initiator,
            seats,
            detail,
            ticket,
        });
    }

    fn bonus_extension(&self, bonus: bool) -> u64 {
        if bonus { self.config.bonus_extension_ms } else { 0 }
    }

    fn apply_reveal_one(&mut self, initiator: SeatIndex, target: SlotRef) {
        let lowest = scoring::lowest_point(&self.roster, &self.hands);
        let Some(card) = self.hands[target.seat].get(target.index) else {
            self.abort_power(PowerKind::RevealOne, initiator, AbortReason::TargetUnavailable);
            return;
        };
        let revealed = RevealedCard {
            seat: target.seat,
            index: target.index,
            card_id: card.id,
            face: card.face,
        };
        let bonus = target.seat != initiator && Some(card.point_value()) == lowest;

        let ticket = self.resolve(PowerKind::RevealOne, initiator, self.bonus_extension(bonus));
        self.emit_scoped(
            PowerKind::RevealOne,
            initiator,
            vec![target.seat],
            EffectDetail::Revealed {
                cards: vec![revealed],
            },
            ticket,
        );
        if bonus {
            self.broadcast(ServerEvent::BonusCue {
                initiator,
                holder: target.seat,
            });
        }
    }

    fn apply_reveal_all(&mut self, initiator: SeatIndex, target_seat: SeatIndex, source: CardId) {
        let lowest = scoring::lowest_point(&self.roster, &self.hands);
        let cards: Vec<RevealedCard> = self.hands[target_seat]
            .cards()
            .map(|(index, card)| RevealedCard {
                seat: target_seat,
                index,
                card_id: card.id,
                face: card.face,
            })
            .collect();
        let bonus = target_seat != initiator
            && cards.iter().any(|c| Some(c.face.points()) == lowest);

        if self.config.reveal_all_reuse == RevealAllReuse::ReturnToStock {
            match self.deck.return_to_stock(source) {
                Ok(()) => self.broadcast_deck(),
                Err(err) => tracing::warn!(%err, "reveal-all card could not be reused"),
            }
        }

        let ticket = self.resolve(PowerKind::RevealAll, initiator, self.bonus_extension(bonus));
        self.emit_scoped(
            PowerKind::RevealAll,
            initiator,
            vec![target_seat],
            EffectDetail::Revealed { cards },
            ticket,
        );
        if bonus {
            self.broadcast(ServerEvent::BonusCue {
                initiator,
                holder: target_seat,
            });
        }
    }

    /// Exchanges the cards of two slots. Each card keeps its identity and
    /// moves with it, so both hands stay consistent.
    fn apply_swap(&mut self, initiator: SeatIndex, a: SlotRef, b: SlotRef) {
        let both_present = self.hands[a.seat].get(a.index).is_some()
            && self.hands[b.seat].get(b.index).is_some()
            && self.roster.in_match(a.seat);
        if !both_present {
            self.abort_power(PowerKind::Swap, initiator, AbortReason::TargetUnavailable);
            return;
        }

        if a.seat == b.seat {
            self.hands[a.seat].swap_slots(a.index, b.index);
        } else if let (Some(card_a), Some(card_b)) =
            (self.hands[a.seat].take(a.index), self.hands[b.seat].take(b.index))
        {
            self.place(a.seat, a.index, card_b);
            self.place(b.seat, b.index, card_a);
        }

        let shown = |hands: &[Hand], slot: SlotRef| {
            hands[slot.seat].get(slot.index).map(|card| RevealedCard {
                seat: slot.seat,
                index: slot.index,
                card_id: card.id,
                face: card.face,
            })
        };
        let (Some(now_a), Some(now_b)) = (shown(&self.hands, a), shown(&self.hands, b)) else {
            self.abort_power(PowerKind::Swap, initiator, AbortReason::TargetUnavailable);
            return;
        };

        let ticket = self.resolve(PowerKind::Swap, initiator, 0);
        let mut seats = vec![a.seat];
        if b.seat != a.seat {
            seats.push(b.seat);
        }
        self.emit_public(
            PowerKind::Swap,
            initiator,
            seats.clone(),
            EffectDetail::Swapped {
                cards: [now_a, now_b],
            },
            ticket,
        );
        for seat in seats {
            self.broadcast_hand(seat);
        }
    }

    /// Moves the target to the killed zone and schedules its refill.
    fn apply_kill(&mut self, initiator: SeatIndex, target: SlotRef) {
        let Some(mut card) = self.hands[target.seat].take(target.index) else {
            self.abort_power(PowerKind::Kill, initiator, AbortReason::TargetUnavailable);
            return;
        };
        card.open = true;
        let pile = PileCard::from(&card);
        self.deck.kill(card);

        let ticket = self.resolve(PowerKind::Kill, initiator, 0);
        self.refill = Some(PendingRefill {
            ticket,
            slot: target,
        });
        self.timers.schedule(
            self.clock_ms + self.config.kill_refill_ms,
            TimerEvent::KillRefill { ticket },
        );

        self.emit_public(
            PowerKind::Kill,
            initiator,
            vec![target.seat],
            EffectDetail::Killed { target, card: pile },
            ticket,
        );
        self.broadcast_hand(target.seat);
        self.broadcast_deck();
    }

    /// Flags the target cursed. Nobody but the initiator learns which slot.
    fn apply_curse(&mut self, initiator: SeatIndex, target: SlotRef) {
        let Some(card) = self.hands[target.seat].get_mut(target.index) else {
            self.abort_power(PowerKind::Curse, initiator, AbortReason::TargetUnavailable);
            return;
        };
        card.cursed = true;
        let card_id = card.id;

        let ticket = self.resolve(PowerKind::Curse, initiator, 0);
        self.emit_scoped(
            PowerKind::Curse,
            initiator,
            vec![target.seat],
            EffectDetail::Cursed { target, card_id },
            ticket,
        );
    }

    /// One-shot totals for the initiator, then the passive watch.
    fn apply_totals(&mut self, initiator: SeatIndex) {
        let totals = scoring::seat_totals(&self.roster, &self.hands);
        let ticket = self.resolve(PowerKind::TotalsReveal, initiator, 0);
        self.emit_scoped(
            PowerKind::TotalsReveal,
            initiator,
            vec![initiator],
            EffectDetail::Totals {
                totals: totals.clone(),
            },
            ticket,
        );
        // A repeat use restarts the seat's own window; other watches stay.
        self.totals_watches.insert(
            initiator,
            TotalsWatch {
                window_until_ms: self.clock_ms + self.config.totals_window_ms,
                last: totals,
            },
        );
    }

    /// Passes over the next seat; the turn resumes after it.
    fn apply_skip(&mut self, initiator: SeatIndex) {
        let skipped = self.roster.next_seat(initiator).unwrap_or(initiator);
        let ticket = self.resolve(PowerKind::Skip, skipped, 0);
        self.send_to_seat(
            skipped,
            ServerEvent::SkipNotice {
                skipped,
                by: initiator,
            },
        );
        self.emit_public(
            PowerKind::Skip,
            initiator,
            vec![skipped],
            EffectDetail::Skipped { skipped },
            ticket,
        );
    }

    /// Ends a pending power with no effect and moves the turn on.
    pub(crate) fn abort_power(&mut self, kind: PowerKind, initiator: SeatIndex, reason: AbortReason) {
        tracing::info!(seat = initiator, %kind, ?reason, "power aborted");
        self.broadcast(ServerEvent::PowerAborted {
            kind,
            initiator,
            reason,
        });
        self.advance_from(initiator);
    }

    /// A seat left while a power was pending.
    pub(crate) fn power_seat_left(
        &mut self,
        seat: SeatIndex,
        kind: PowerKind,
        initiator: SeatIndex,
        first: Option<SlotRef>,
    ) {
        if seat == initiator {
            self.abort_power(kind, initiator, AbortReason::InitiatorLeft);
        } else if first.is_some_and(|slot| slot.seat == seat) {
            self.abort_power(kind, initiator, AbortReason::TargetLeft);
        } else if self.roster.in_match_count() < 2 {
            self.abort_power(kind, initiator, AbortReason::TargetLeft);
        } else {
            // Re-issue the capability without the departed seat.
            let targets = eligible_targets(kind, initiator, &self.roster, &self.hands, first);
            if targets.is_empty() {
                self.abort_power(kind, initiator, AbortReason::TargetLeft);
            } else {
                let step = if first.is_some() { 2 } else { 1 };
                self.send_to_seat(initiator, ServerEvent::PowerArmed { kind, step, targets });
            }
        }
    }

    pub(crate) fn request_resume(
        &mut self,
        seat: SeatIndex,
        ack: ResolutionTicket,
    ) -> Result<(), Rejection> {
        match self.turn.phase() {
            Phase::Resolving { initiator, .. } if *initiator != seat => {
                return Err(Rejection::NotYourTurn {
                    seat,
                    active: *initiator,
                });
            }
            Phase::Resolving { .. } => {}
            _ => return Err(Rejection::StaleTicket),
        }
        if self.resume(ack) {
            Ok(())
        } else {
            Err(Rejection::StaleTicket)
        }
    }

    /// Presents `ticket` to the latch. The first presentation advances the
    /// turn; every later one (timer or request) does nothing.
    pub(crate) fn resume(&mut self, ticket: ResolutionTicket) -> bool {
        let Some(resume_from) = self.turn.consume(ticket) else {
            return false;
        };
        self.timers.cancel(TimerKind::ResolveDisplay);
        tracing::debug!(serial = ticket.serial, "resolution consumed");
        self.advance_from(resume_from);
        true
    }

    pub(crate) fn run_refill(&mut self, ticket: ResolutionTicket) {
        if self.refill.is_some_and(|r| r.ticket == ticket) {
            self.flush_refill();
        } else {
            tracing::debug!(serial = ticket.serial, "stale refill dropped");
        }
    }

    /// Draws the replacement for a killed card now, if one is owed.
    pub(crate) fn flush_refill(&mut self) {
        let Some(PendingRefill { slot, .. }) = self.refill.take() else {
            return;
        };
        self.timers.cancel(TimerKind::KillRefill);

        match self.deck.draw_top(&mut self.rng) {
            Ok(card) => {
                let card_id = card.id;
                self.place(slot.seat, slot.index, card);
                self.broadcast(ServerEvent::SlotRefilled {
                    seat: slot.seat,
                    index: slot.index,
                    card_id,
                });
                self.broadcast_hand(slot.seat);
                self.broadcast_deck();
            }
            Err(err) => self.abort_match(err.to_string()),
        }
    }
}
