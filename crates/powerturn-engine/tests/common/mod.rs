//! Fixtures shared by the engine integration tests.

#![allow(dead_code)]

use powerturn_engine::{
    CardFace, CardId, ClientRequest, GameConfig, MatchContext, Rank, ServerEvent, build_deck,
};
use powerturn_protocol::{ConnectionId, Recipient};
use powerturn_seats::{Roster, SeatIndex, SeatInfo};

/// Seat `i` is owned by connection `i + 1`.
pub fn conn(seat: SeatIndex) -> ConnectionId {
    ConnectionId(seat as u64 + 1)
}

pub fn humans(n: usize) -> Roster {
    Roster::new(
        (0..n)
            .map(|seat| SeatInfo::human(conn(seat), format!("player-{seat}")))
            .collect(),
    )
    .unwrap()
}

pub fn bots(n: usize) -> Roster {
    Roster::new(
        (0..n)
            .map(|seat| SeatInfo::bot(conn(seat), format!("bot-{seat}")))
            .collect(),
    )
    .unwrap()
}

/// A full stock whose first draws have the given ranks, in order. The
/// deal takes one card per seat per round, so with two seats draws 1..=6
/// fill s0[0], s1[0], s0[1], s1[1], s0[2], s1[2] and draw 7 is seat 0's
/// first `PeekDraw`.
pub fn stock(draws: &[Rank]) -> Vec<CardFace> {
    let mut pool = build_deck();
    let mut order = Vec::with_capacity(pool.len());
    for &rank in draws {
        let pos = pool
            .iter()
            .position(|face| face.rank == rank)
            .expect("not enough cards of that rank");
        order.push(pool.remove(pos));
    }
    order.extend(pool);
    order.reverse();
    order
}

/// Id of the `n`th card drawn (1-based) from a [`stock`] deck.
pub fn drawn_id(n: u32) -> CardId {
    CardId(56 - n)
}

/// Two humans, the given draws, peek phase already over.
pub fn started(draws: &[Rank]) -> MatchContext {
    started_with(GameConfig::default(), humans(2), draws)
}

pub fn started_with(config: GameConfig, roster: Roster, draws: &[Rank]) -> MatchContext {
    let seats = roster.len();
    let mut ctx = MatchContext::with_stacked_deck(config, roster, 7, stock(draws));
    for seat in 0..seats {
        ctx.handle_request(conn(seat), ClientRequest::JoinReady).unwrap();
    }
    ctx.take_outbox();
    ctx
}

/// Draws and immediately discards the peeked card for the active seat.
pub fn draw_and_discard_peeked(ctx: &mut MatchContext) {
    let seat = ctx.turn().active();
    ctx.handle_request(conn(seat), ClientRequest::PeekDraw).unwrap();
    let peeked = ctx.pending_peek(seat).unwrap().id;
    ctx.handle_request(conn(seat), ClientRequest::DiscardPeeked { card_id: peeked })
        .unwrap();
}

/// Messages addressed to exactly `conn`.
pub fn private_to(out: &[(Recipient, ServerEvent)], conn: ConnectionId) -> Vec<ServerEvent> {
    out.iter()
        .filter(|(r, _)| *r == Recipient::Connection(conn))
        .map(|(_, e)| e.clone())
        .collect()
}

/// Messages `conn` would receive.
pub fn seen_by(out: &[(Recipient, ServerEvent)], conn: ConnectionId) -> Vec<ServerEvent> {
    out.iter()
        .filter(|(r, _)| r.includes(conn))
        .map(|(_, e)| e.clone())
        .collect()
}
