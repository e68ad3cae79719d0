//! Turn order and seat-index mapping.
//!
//! Every viewer draws the table from its own point of view: its own seat
//! is local index 0 and the others follow in global order. The host only
//! ever speaks in global indices. The two functions here are the single
//! place where the two orders are converted, so host code, the viewer
//! projection, and tests can never disagree about who sits where.
//!
//! ```text
//! global:   0   1   2   3
//! my seat:          ^
//! local:    2   3   0   1
//! ```

use serde::{Deserialize, Serialize};

use crate::SeatIndex;

/// Direction the turn pointer moves around the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Rotation {
    /// Increasing global index: 0 → 1 → 2 → 0.
    #[default]
    Clockwise,
    /// Decreasing global index: 0 → 2 → 1 → 0.
    CounterClockwise,
}

/// Maps a global seat index into `my_seat`'s local order.
///
/// `seat_count` must be non-zero.
pub fn to_local(my_seat: SeatIndex, global: SeatIndex, seat_count: usize) -> usize {
    let my_seat = my_seat % seat_count;
    (global % seat_count + seat_count - my_seat) % seat_count
}

/// Inverse of [`to_local`].
pub fn to_global(my_seat: SeatIndex, local: usize, seat_count: usize) -> SeatIndex {
    (my_seat % seat_count + local % seat_count) % seat_count
}

/// Seat reached by moving `hops` positions from `from` in `rotation`,
/// wrapping modulo `seat_count`. Presence is not considered here; see
/// [`Roster::next_seat`](crate::Roster::next_seat) for that.
pub fn step(from: SeatIndex, hops: usize, rotation: Rotation, seat_count: usize) -> SeatIndex {
    let hops = hops % seat_count;
    match rotation {
        Rotation::Clockwise => (from + hops) % seat_count,
        Rotation::CounterClockwise => (from + seat_count - hops) % seat_count,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_own_seat_is_local_zero() {
        for n in 2..=8 {
            for me in 0..n {
                assert_eq!(to_local(me, me, n), 0);
            }
        }
    }

    #[test]
    fn test_local_order_follows_global_order() {
        // Seat 2 of 4 sees 3, 0, 1 after itself.
        assert_eq!(to_local(2, 3, 4), 1);
        assert_eq!(to_local(2, 0, 4), 2);
        assert_eq!(to_local(2, 1, 4), 3);
    }

    #[test]
    fn test_to_global_inverts_to_local() {
        for n in 2..=8 {
            for me in 0..n {
                for g in 0..n {
                    assert_eq!(to_global(me, to_local(me, g, n), n), g);
                }
            }
        }
    }

    #[test]
    fn test_step_wraps_in_both_directions() {
        assert_eq!(step(3, 1, Rotation::Clockwise, 4), 0);
        assert_eq!(step(0, 1, Rotation::CounterClockwise, 4), 3);
        assert_eq!(step(1, 2, Rotation::Clockwise, 4), 3);
        assert_eq!(step(1, 5, Rotation::Clockwise, 4), 2);
    }
}
