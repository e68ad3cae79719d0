//! Totals and final standings.

use powerturn_seats::Roster;

use crate::hand::Hand;
use crate::messages::{SeatTotal, Standing};

/// Ranks the in-match seats, lowest scored total first.
///
/// Cursed open cards count double. Ties keep seat order, so the lower
/// seat index places first.
pub fn rank(roster: &Roster, hands: &[Hand]) -> Vec<Standing> {
    let mut rows: Vec<_> = roster
        .in_match_seats()
        .filter_map(|seat| {
            let total = hands.get(seat)?.scored_total();
            let name = roster.seat(seat)?.display_name.clone();
            Some((seat, name, total))
        })
        .collect();
    rows.sort_by_key(|(_, _, total)| *total);

    rows.into_iter()
        .enumerate()
        .map(|(i, (seat, display_name, total))| Standing {
            place: i + 1,
            seat,
            display_name,
            total,
        })
        .collect()
}

/// Raw point totals of every in-match seat, in seat order. No curse
/// doubling: this is what a totals reveal shows mid-match.
pub fn seat_totals(roster: &Roster, hands: &[Hand]) -> Vec<SeatTotal> {
    roster
        .in_match_seats()
        .filter_map(|seat| {
            hands.get(seat).map(|hand| SeatTotal {
                seat,
                points: hand.total_points(),
            })
        })
        .collect()
}

/// The lowest point value held by any in-match seat.
pub fn lowest_point(roster: &Roster, hands: &[Hand]) -> Option<u32> {
    roster
        .in_match_seats()
        .filter_map(|seat| hands.get(seat))
        .flat_map(|hand| hand.cards().map(|(_, card)| card.point_value()))
        .min()
}
