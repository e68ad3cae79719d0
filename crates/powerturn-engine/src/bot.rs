//! Bot Actor Simulator.
//!
//! Bots play through [`MatchContext::handle_request`], tagged with their
//! own connection id, exactly like a human viewer. There is no second
//! validation path: a bot decision that loses a race is rejected the same
//! way a late human request is.

use powerturn_seats::SeatIndex;
use rand::Rng;
use rand::seq::IndexedRandom;

use crate::card::{Card, CardId};
use crate::config::GameConfig;
use crate::game::MatchContext;
use crate::hand::Hand;
use crate::messages::ClientRequest;
use crate::power::{self, Target, TargetSet};
use crate::turn::Phase;

/// Milliseconds a bot "thinks" before its next request.
pub fn think_delay<R: Rng + ?Sized>(config: &GameConfig, rng: &mut R) -> u64 {
    rng.random_range(config.bot_think_min_ms..=config.bot_think_max_ms)
}

/// Which card a bot commits after peeking `peeked`:
///
/// 1. a held card of the same rank (pair discard)
/// 2. the peeked card itself when it carries a power
/// 3. a random held card when the peeked card is worth at most
///    `keep_threshold` (the peeked card takes its slot)
/// 4. otherwise the peeked card
pub fn choose_discard<R: Rng + ?Sized>(
    peeked: &Card,
    hand: &Hand,
    keep_threshold: u32,
    rng: &mut R,
) -> CardId {
    if let Some((_, pair)) = hand.cards().find(|(_, c)| c.face.rank == peeked.face.rank) {
        return pair.id;
    }
    if peeked.power().is_some() {
        return peeked.id;
    }
    if peeked.point_value() <= keep_threshold {
        let held: Vec<CardId> = hand.cards().map(|(_, c)| c.id).collect();
        if let Some(&id) = held.choose(rng) {
            return id;
        }
    }
    peeked.id
}

/// A uniformly random eligible target.
pub fn choose_target<R: Rng + ?Sized>(targets: &TargetSet, rng: &mut R) -> Option<Target> {
    targets.pick(rng)
}

impl MatchContext {
    /// A bot's think timer fired.
    pub(crate) fn bot_act(&mut self, seat: SeatIndex, serial: u64) {
        if !self.turn.is_current(serial) {
            tracing::debug!(seat, serial, "stale bot timer dropped");
            return;
        }
        let Some(conn) = self.roster.connection(seat) else {
            return;
        };

        let request = match self.turn.phase().clone() {
            Phase::Normal if self.turn.active() == seat => match self.peeks.get(&seat) {
                None if !self.turn.drew() => ClientRequest::PeekDraw,
                None => return,
                Some(peeked) => {
                    let card_id = choose_discard(
                        peeked,
                        &self.hands[seat],
                        self.config.bot_keep_threshold,
                        &mut self.rng,
                    );
                    ClientRequest::DiscardPeeked { card_id }
                }
            },
            Phase::PowerPending {
                kind,
                initiator,
                first,
                ..
            } if initiator == seat => {
                let targets = power::eligible_targets(kind, seat, &self.roster, &self.hands, first);
                match choose_target(&targets, &mut self.rng) {
                    Some(target) => target.to_request(kind),
                    None => return,
                }
            }
            _ => return,
        };

        tracing::debug!(seat, ?request, "bot acting");
        if let Err(rejection) = self.handle_request(conn, request) {
            tracing::debug!(seat, %rejection, "bot request rejected");
        }
    }
}
