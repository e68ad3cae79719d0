//! Power Resolution Protocol: the seven powers, role-scoped results, the
//! resolution latch and every abort path.

mod common;

use common::*;
use powerturn_engine::messages::SeatTotal;
use powerturn_engine::{
    AbortReason, ClientRequest, EffectDetail, GameConfig, MatchContext, Phase, PowerKind, Rank,
    Rejection, ResolutionTicket, RevealAllReuse, ServerEvent, SlotRef, TimerEvent,
};
use powerturn_protocol::{ConnectionId, Recipient};

/// s0 = Two, Three, Four (9); s1 = Five, Six, Ace (12).
const BASE: [Rank; 6] = [Rank::Two, Rank::Five, Rank::Three, Rank::Six, Rank::Four, Rank::Ace];

/// Three seats, every hand plain.
const BASE3: [Rank; 9] = [
    Rank::Two,
    Rank::Three,
    Rank::Four,
    Rank::Five,
    Rank::Six,
    Rank::Ace,
    Rank::Two,
    Rank::Three,
    Rank::Four,
];

fn with_power(config: GameConfig, rank: Rank) -> (MatchContext, Vec<(Recipient, ServerEvent)>) {
    let mut draws = BASE.to_vec();
    draws.push(rank);
    let mut ctx = started_with(config, humans(2), &draws);
    draw_and_discard_peeked(&mut ctx);
    let out = ctx.take_outbox();
    (ctx, out)
}

fn with_power3(rank: Rank) -> MatchContext {
    let mut draws = BASE3.to_vec();
    draws.push(rank);
    let mut ctx = started_with(GameConfig::default(), humans(3), &draws);
    draw_and_discard_peeked(&mut ctx);
    ctx.take_outbox();
    ctx
}

fn select(
    ctx: &mut MatchContext,
    seat: usize,
    kind: PowerKind,
    target_seat: usize,
    index: Option<usize>,
) -> Result<(), Rejection> {
    ctx.handle_request(
        conn(seat),
        ClientRequest::SelectPowerTarget {
            kind,
            target_seat,
            target_card_index: index,
        },
    )
}

fn ticket(ctx: &MatchContext) -> ResolutionTicket {
    match ctx.turn().phase() {
        Phase::Resolving { ticket, .. } => *ticket,
        other => panic!("expected Resolving, got {other:?}"),
    }
}

fn details(out: &[(Recipient, ServerEvent)]) -> Vec<(Recipient, EffectDetail)> {
    out.iter()
        .filter_map(|(r, e)| match e {
            ServerEvent::PowerEffectApplied { detail, .. } => Some((r.clone(), detail.clone())),
            _ => None,
        })
        .collect()
}

fn aborted(out: &[(Recipient, ServerEvent)]) -> Option<AbortReason> {
    out.iter().find_map(|(_, e)| match e {
        ServerEvent::PowerAborted { reason, .. } => Some(*reason),
        _ => None,
    })
}

// =========================================================================
// Kill
// =========================================================================

#[test]
fn test_kill_then_refill_then_advance() {
    let (mut ctx, out) = with_power(GameConfig::default(), Rank::King);
    assert!(out.iter().any(|(r, e)| *r == Recipient::Connection(conn(0))
        && matches!(e, ServerEvent::PowerArmed { kind: PowerKind::Kill, step: 1, targets } if targets.slots.len() == 3)));
    assert_eq!(ctx.deck().stock_count(), 49);

    select(&mut ctx, 0, PowerKind::Kill, 1, Some(2)).unwrap();
    let out = ctx.take_outbox();
    assert_eq!(ctx.hand(1).unwrap().count(), 2);
    assert_eq!(ctx.deck().killed_count(), 1);
    assert!(details(&out).iter().any(|(r, d)| *r == Recipient::All
        && matches!(d, EffectDetail::Killed { target, card }
            if *target == SlotRef { seat: 1, index: 2 } && card.card_id == drawn_id(6))));
    assert_eq!(ctx.card_count(), ctx.card_total());

    ctx.advance(1_000);
    let out = ctx.take_outbox();
    assert!(out.contains(&(
        Recipient::All,
        ServerEvent::SlotRefilled {
            seat: 1,
            index: 2,
            card_id: drawn_id(8),
        }
    )));
    assert_eq!(ctx.hand(1).unwrap().count(), 3);
    assert_eq!(ctx.deck().stock_count(), 48);
    assert!(matches!(ctx.turn().phase(), Phase::Resolving { .. }));
    assert_eq!(ctx.card_count(), ctx.card_total());

    ctx.advance(1_000);
    assert_eq!(*ctx.turn().phase(), Phase::Normal);
    assert_eq!(ctx.turn().active(), 1);
}

#[test]
fn test_second_target_during_resolution_is_refused() {
    let (mut ctx, _) = with_power(GameConfig::default(), Rank::King);
    select(&mut ctx, 0, PowerKind::Kill, 1, Some(2)).unwrap();
    assert_eq!(
        select(&mut ctx, 0, PowerKind::Kill, 1, Some(1)),
        Err(Rejection::WrongPhase("Resolving"))
    );

    let out = ctx.take_outbox();
    assert_eq!(ctx.deck().killed_count(), 1);
    assert_eq!(ctx.hand(1).unwrap().count(), 2);
    let kills = details(&out)
        .into_iter()
        .filter(|(_, d)| matches!(d, EffectDetail::Killed { .. }))
        .count();
    assert_eq!(kills, 1);
}

#[test]
fn test_kill_rejections_leave_the_power_pending() {
    let (mut ctx, _) = with_power(GameConfig::default(), Rank::King);

    assert_eq!(
        select(&mut ctx, 0, PowerKind::Kill, 0, Some(0)),
        Err(Rejection::IneligibleTarget(PowerKind::Kill))
    );
    assert_eq!(
        select(&mut ctx, 0, PowerKind::Kill, 1, Some(3)),
        Err(Rejection::IneligibleTarget(PowerKind::Kill))
    );
    assert_eq!(
        select(&mut ctx, 0, PowerKind::Kill, 5, Some(0)),
        Err(Rejection::IneligibleTarget(PowerKind::Kill))
    );
    assert_eq!(
        select(&mut ctx, 0, PowerKind::Kill, 1, None),
        Err(Rejection::IneligibleTarget(PowerKind::Kill))
    );
    assert_eq!(
        select(&mut ctx, 0, PowerKind::Curse, 1, Some(0)),
        Err(Rejection::WrongPower {
            expected: PowerKind::Kill,
            got: PowerKind::Curse,
        })
    );
    assert_eq!(
        select(&mut ctx, 1, PowerKind::Kill, 1, Some(0)),
        Err(Rejection::NotYourTurn { seat: 1, active: 0 })
    );
    assert!(ctx.take_outbox().is_empty());
    assert!(matches!(
        ctx.turn().phase(),
        Phase::PowerPending {
            kind: PowerKind::Kill,
            ..
        }
    ));
}

// =========================================================================
// Resolution latch
// =========================================================================

#[test]
fn test_resume_request_wins_the_latch_once() {
    let (mut ctx, _) = with_power(GameConfig::default(), Rank::King);
    select(&mut ctx, 0, PowerKind::Kill, 1, Some(0)).unwrap();
    let ticket = ticket(&ctx);

    assert_eq!(
        ctx.handle_request(conn(1), ClientRequest::RequestResumeTurn { ack: ticket }),
        Err(Rejection::NotYourTurn { seat: 1, active: 0 })
    );
    let wrong = ResolutionTicket {
        serial: ticket.serial + 1,
        ..ticket
    };
    assert_eq!(
        ctx.handle_request(conn(0), ClientRequest::RequestResumeTurn { ack: wrong }),
        Err(Rejection::StaleTicket)
    );

    ctx.handle_request(conn(0), ClientRequest::RequestResumeTurn { ack: ticket })
        .unwrap();
    // The pending refill is flushed before the turn moves on.
    assert_eq!(ctx.hand(1).unwrap().count(), 3);
    assert_eq!(ctx.turn().active(), 1);
    let serial = ctx.turn().serial();
    ctx.take_outbox();

    assert_eq!(
        ctx.handle_request(conn(0), ClientRequest::RequestResumeTurn { ack: ticket }),
        Err(Rejection::StaleTicket)
    );
    ctx.fire(TimerEvent::ResolveDisplay { ticket });
    ctx.fire(TimerEvent::KillRefill { ticket });
    ctx.advance(2_000);

    assert_eq!(ctx.turn().active(), 1);
    assert_eq!(ctx.turn().serial(), serial);
    assert_eq!(ctx.deck().stock_count(), 48);
    assert_eq!(ctx.card_count(), ctx.card_total());
    assert!(
        !ctx.take_outbox()
            .iter()
            .any(|(_, e)| matches!(e, ServerEvent::TurnStarted { .. } | ServerEvent::SlotRefilled { .. }))
    );
}

// =========================================================================
// Reveal-one / reveal-all
// =========================================================================

#[test]
fn test_reveal_one_is_private_and_fires_bonus() {
    let (mut ctx, _) = with_power(GameConfig::default(), Rank::Seven);
    // The Ace at s1[2] is the lowest card on the table.
    select(&mut ctx, 0, PowerKind::RevealOne, 1, Some(2)).unwrap();
    let out = ctx.take_outbox();

    let details = details(&out);
    assert_eq!(details.len(), 2);
    assert!(details.iter().any(|(r, d)| *r == Recipient::Connection(conn(0))
        && matches!(d, EffectDetail::Revealed { cards }
            if cards.len() == 1 && cards[0].card_id == drawn_id(6) && cards[0].face.rank == Rank::Ace)));
    assert!(details.contains(&(Recipient::AllExcept(conn(0)), EffectDetail::Hidden)));
    assert!(seen_by(&out, conn(1)).iter().all(|e| !matches!(
        e,
        ServerEvent::PowerEffectApplied {
            detail: EffectDetail::Revealed { .. },
            ..
        }
    )));
    assert!(out.contains(&(Recipient::All, ServerEvent::BonusCue { initiator: 0, holder: 1 })));

    // Display time is extended by the bonus.
    ctx.advance(2_000);
    assert!(matches!(ctx.turn().phase(), Phase::Resolving { .. }));
    ctx.advance(1_000);
    assert_eq!(ctx.turn().active(), 1);
}

#[test]
fn test_reveal_own_card_has_no_bonus() {
    let (mut ctx, _) = with_power(GameConfig::default(), Rank::Seven);
    select(&mut ctx, 0, PowerKind::RevealOne, 0, Some(0)).unwrap();
    let out = ctx.take_outbox();
    assert!(!out.iter().any(|(_, e)| matches!(e, ServerEvent::BonusCue { .. })));
    ctx.advance(2_000);
    assert_eq!(ctx.turn().active(), 1);
}

#[test]
fn test_reveal_all_shows_the_whole_hand() {
    let (mut ctx, _) = with_power(GameConfig::default(), Rank::Eight);
    assert_eq!(
        select(&mut ctx, 0, PowerKind::RevealAll, 0, None),
        Err(Rejection::IneligibleTarget(PowerKind::RevealAll))
    );
    assert_eq!(
        select(&mut ctx, 0, PowerKind::RevealAll, 1, Some(0)),
        Err(Rejection::IneligibleTarget(PowerKind::RevealAll))
    );

    select(&mut ctx, 0, PowerKind::RevealAll, 1, None).unwrap();
    let out = ctx.take_outbox();
    let mine = private_to(&out, conn(0));
    assert!(mine.iter().any(|e| matches!(
        e,
        ServerEvent::PowerEffectApplied {
            detail: EffectDetail::Revealed { cards },
            ..
        } if cards.len() == 3 && cards.iter().all(|c| c.seat == 1)
    )));
    assert!(out.iter().any(|(_, e)| matches!(e, ServerEvent::BonusCue { holder: 1, .. })));
    assert_eq!(ctx.deck().top_discard().unwrap().id, drawn_id(7));
}

#[test]
fn test_reveal_all_return_to_stock_policy() {
    let config = GameConfig {
        reveal_all_reuse: RevealAllReuse::ReturnToStock,
        ..GameConfig::default()
    };
    let (mut ctx, _) = with_power(config, Rank::Eight);
    assert_eq!(ctx.deck().stock_count(), 49);

    select(&mut ctx, 0, PowerKind::RevealAll, 1, None).unwrap();
    assert_eq!(ctx.deck().discard_count(), 0);
    assert_eq!(ctx.deck().stock_count(), 50);
    assert_eq!(ctx.card_count(), ctx.card_total());
}

// =========================================================================
// Swap
// =========================================================================

#[test]
fn test_swap_across_seats_in_two_steps() {
    let (mut ctx, _) = with_power(GameConfig::default(), Rank::Nine);

    select(&mut ctx, 0, PowerKind::Swap, 0, Some(0)).unwrap();
    let out = ctx.take_outbox();
    let first = SlotRef { seat: 0, index: 0 };
    assert!(private_to(&out, conn(0)).iter().any(|e| matches!(
        e,
        ServerEvent::PowerArmed { step: 2, targets, .. }
            if targets.slots.len() == 5 && !targets.contains_slot(first)
    )));
    assert_eq!(
        select(&mut ctx, 0, PowerKind::Swap, 0, Some(0)),
        Err(Rejection::IneligibleTarget(PowerKind::Swap))
    );

    select(&mut ctx, 0, PowerKind::Swap, 1, Some(1)).unwrap();
    let out = ctx.take_outbox();
    assert_eq!(ctx.hand(0).unwrap().get(0).unwrap().id, drawn_id(4));
    assert_eq!(ctx.hand(1).unwrap().get(1).unwrap().id, drawn_id(1));
    assert!(details(&out).iter().any(|(r, d)| *r == Recipient::All
        && matches!(d, EffectDetail::Swapped { cards }
            if cards[0].card_id == drawn_id(4) && cards[1].card_id == drawn_id(1))));
    assert_eq!(ctx.card_count(), ctx.card_total());
}

#[test]
fn test_swap_within_one_hand() {
    let (mut ctx, _) = with_power(GameConfig::default(), Rank::Nine);
    select(&mut ctx, 0, PowerKind::Swap, 0, Some(0)).unwrap();
    select(&mut ctx, 0, PowerKind::Swap, 0, Some(2)).unwrap();

    let hand = ctx.hand(0).unwrap();
    assert_eq!(hand.get(0).unwrap().id, drawn_id(5));
    assert_eq!(hand.get(2).unwrap().id, drawn_id(1));
    assert_eq!(hand.count(), 3);
}

// =========================================================================
// Curse
// =========================================================================

#[test]
fn test_curse_is_invisible_until_opened() {
    let (mut ctx, _) = with_power(GameConfig::default(), Rank::Ten);
    let before = ctx.hand(1).unwrap().views();

    select(&mut ctx, 0, PowerKind::Curse, 1, Some(0)).unwrap();
    let out = ctx.take_outbox();

    assert_eq!(ctx.hand(1).unwrap().views(), before);
    assert!(!out.iter().any(|(_, e)| matches!(e, ServerEvent::HandAssigned { .. })));
    assert!(private_to(&out, conn(0)).iter().any(|e| matches!(
        e,
        ServerEvent::PowerEffectApplied {
            detail: EffectDetail::Cursed { target, card_id },
            ..
        } if *target == SlotRef { seat: 1, index: 0 } && *card_id == drawn_id(2)
    )));
    assert!(seen_by(&out, conn(1)).iter().all(|e| !matches!(
        e,
        ServerEvent::PowerEffectApplied {
            detail: EffectDetail::Cursed { .. },
            ..
        }
    )));

    let mut hand = ctx.hand(1).unwrap().clone();
    assert_eq!(hand.scored_total(), 12);
    hand.open_all();
    // Five doubled, Six, Ace.
    assert_eq!(hand.scored_total(), 17);
}

// =========================================================================
// Totals-reveal
// =========================================================================

#[test]
fn test_totals_window_then_hidden() {
    let (mut ctx, out) = with_power(GameConfig::default(), Rank::Queen);
    assert!(matches!(ctx.turn().phase(), Phase::Resolving { .. }));
    assert!(private_to(&out, conn(0)).iter().any(|e| matches!(
        e,
        ServerEvent::PowerEffectApplied {
            detail: EffectDetail::Totals { totals },
            ..
        } if *totals == vec![SeatTotal { seat: 0, points: 9 }, SeatTotal { seat: 1, points: 12 }]
    )));
    assert!(details(&out).contains(&(Recipient::AllExcept(conn(0)), EffectDetail::Hidden)));
    assert_eq!(ctx.totals_watchers(), vec![0]);

    ctx.advance(2_000);
    assert_eq!(ctx.turn().active(), 1);
    ctx.advance(999);
    assert_eq!(ctx.totals_watchers(), vec![0]);
    ctx.take_outbox();

    ctx.advance(1);
    assert!(ctx.totals_watchers().is_empty());
    let out = ctx.take_outbox();
    assert!(out.contains(&(Recipient::Connection(conn(0)), ServerEvent::TotalsHidden)));
}

#[test]
fn test_totals_stay_while_a_queen_is_held() {
    // s0[0] is a Queen; seat 0 draws Queens on both of its turns.
    let draws = [
        Rank::Queen,
        Rank::Five,
        Rank::Three,
        Rank::Six,
        Rank::Four,
        Rank::Ace,
        Rank::Queen,
        Rank::Queen,
    ];
    let mut ctx = started_with(GameConfig::default(), humans(2), &draws);
    draw_and_discard_peeked(&mut ctx);
    ctx.advance(2_000);
    ctx.advance(4_000);
    assert_eq!(ctx.totals_watchers(), vec![0]);

    // Seat 1 times out; seat 0 pairs its Queens away.
    ctx.advance(2_000);
    assert_eq!(ctx.turn().active(), 0);
    ctx.handle_request(conn(0), ClientRequest::PeekDraw).unwrap();
    ctx.handle_request(conn(0), ClientRequest::DiscardPeeked { card_id: drawn_id(1) })
        .unwrap();
    assert_eq!(ctx.turn().active(), 1);
    ctx.take_outbox();

    ctx.advance(50);
    assert!(ctx.totals_watchers().is_empty());
    assert!(ctx
        .take_outbox()
        .contains(&(Recipient::Connection(conn(0)), ServerEvent::TotalsHidden)));
}

#[test]
fn test_second_watcher_keeps_the_first_window() {
    let mut draws = BASE.to_vec();
    draws.extend([Rank::Queen, Rank::Queen]);
    let mut ctx = started_with(GameConfig::default(), humans(2), &draws);
    draw_and_discard_peeked(&mut ctx);
    ctx.advance(2_000);
    assert_eq!(ctx.turn().active(), 1);

    // Seat 1 opens its own window at 2000 while seat 0's runs until 3000.
    draw_and_discard_peeked(&mut ctx);
    assert_eq!(ctx.totals_watchers(), vec![0, 1]);
    ctx.take_outbox();

    ctx.advance(999);
    assert_eq!(ctx.totals_watchers(), vec![0, 1]);

    ctx.advance(1);
    let out = ctx.take_outbox();
    assert!(out.contains(&(Recipient::Connection(conn(0)), ServerEvent::TotalsHidden)));
    assert!(!out.contains(&(Recipient::Connection(conn(1)), ServerEvent::TotalsHidden)));
    assert_eq!(ctx.totals_watchers(), vec![1]);
    assert!(ctx.is_watching_totals(1));

    ctx.advance(2_000);
    assert!(ctx.totals_watchers().is_empty());
    assert!(ctx
        .take_outbox()
        .contains(&(Recipient::Connection(conn(1)), ServerEvent::TotalsHidden)));
}

// =========================================================================
// Skip
// =========================================================================

#[test]
fn test_skip_passes_over_the_next_seat() {
    let mut draws = BASE3.to_vec();
    draws.push(Rank::Jack);
    let mut ctx = started_with(GameConfig::default(), humans(3), &draws);
    draw_and_discard_peeked(&mut ctx);
    let out = ctx.take_outbox();

    assert_eq!(
        private_to(&out, conn(1)),
        vec![ServerEvent::SkipNotice { skipped: 1, by: 0 }]
    );
    assert!(private_to(&out, conn(2)).is_empty());
    assert!(details(&out).contains(&(Recipient::All, EffectDetail::Skipped { skipped: 1 })));

    ctx.advance(2_000);
    assert_eq!(ctx.turn().active(), 2);
}

// =========================================================================
// Aborts
// =========================================================================

#[test]
fn test_selection_timeout_aborts() {
    let (mut ctx, _) = with_power(GameConfig::default(), Rank::Seven);
    ctx.advance(5_999);
    assert!(matches!(ctx.turn().phase(), Phase::PowerPending { .. }));
    ctx.advance(1);
    let out = ctx.take_outbox();
    assert_eq!(aborted(&out), Some(AbortReason::TimedOut));
    assert_eq!(ctx.turn().active(), 1);
    assert_eq!(
        select(&mut ctx, 0, PowerKind::RevealOne, 1, Some(0)),
        Err(Rejection::WrongPhase("Normal"))
    );
}

#[test]
fn test_initiator_leaving_aborts() {
    let mut ctx = with_power3(Rank::Seven);
    ctx.seat_detached(conn(0));
    let out = ctx.take_outbox();
    assert_eq!(aborted(&out), Some(AbortReason::InitiatorLeft));
    assert_eq!(ctx.turn().active(), 1);
}

#[test]
fn test_first_swap_pick_leaving_aborts() {
    let mut ctx = with_power3(Rank::Nine);
    select(&mut ctx, 0, PowerKind::Swap, 1, Some(0)).unwrap();
    ctx.seat_detached(conn(1));
    let out = ctx.take_outbox();
    assert_eq!(aborted(&out), Some(AbortReason::TargetLeft));
    assert_eq!(ctx.turn().active(), 2);
    assert_eq!(ctx.card_count(), ctx.card_total());
}

#[test]
fn test_departed_target_is_withdrawn() {
    let mut ctx = with_power3(Rank::King);
    ctx.seat_detached(conn(2));
    let out = ctx.take_outbox();
    assert!(private_to(&out, conn(0)).iter().any(|e| matches!(
        e,
        ServerEvent::PowerArmed { targets, .. }
            if targets.slots.len() == 3 && targets.slots.iter().all(|s| s.seat == 1)
    )));

    // A late pick on the departed seat aborts instead of applying.
    select(&mut ctx, 0, PowerKind::Kill, 2, Some(0)).unwrap();
    let out = ctx.take_outbox();
    assert_eq!(aborted(&out), Some(AbortReason::TargetLeft));
    assert_eq!(ctx.deck().killed_count(), 0);
    assert_eq!(ctx.turn().active(), 1);
}

#[test]
fn test_rejections_come_from_the_connection_not_the_body() {
    let (mut ctx, _) = with_power(GameConfig::default(), Rank::King);
    assert_eq!(
        ctx.handle_request(
            ConnectionId(42),
            ClientRequest::SelectPowerTarget {
                kind: PowerKind::Kill,
                target_seat: 1,
                target_card_index: Some(0),
            },
        ),
        Err(Rejection::NotSeated(ConnectionId(42)))
    );
}
