//! The seat directory: the external source of seats for a match.
//!
//! Lobby creation and matchmaking live outside powerturn. Whatever did the
//! matchmaking exposes the result through [`SeatDirectory`], and the host
//! reads it exactly once when a table is created.
//!
//! # Why a trait?
//!
//! The host does not care whether seats come from a relay service, a
//! config file, or a test fixture. Swapping the source never touches the
//! match code.

use powerturn_protocol::ConnectionId;
use serde::{Deserialize, Serialize};

/// One seat as the directory reports it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeatInfo {
    /// Connection that owns the seat. Bots get a synthetic id.
    pub connection_id: ConnectionId,
    /// `true` when the host drives the seat with the bot simulator.
    pub is_bot: bool,
    /// Name shown to other viewers.
    pub display_name: String,
}

impl SeatInfo {
    /// A human-controlled seat.
    pub fn human(connection_id: ConnectionId, display_name: impl Into<String>) -> Self {
        Self {
            connection_id,
            is_bot: false,
            display_name: display_name.into(),
        }
    }

    /// A bot-controlled seat.
    pub fn bot(connection_id: ConnectionId, display_name: impl Into<String>) -> Self {
        Self {
            connection_id,
            is_bot: true,
            display_name: display_name.into(),
        }
    }
}

/// Read-only provider of the ordered seat list for one match.
///
/// The order of the returned list *is* the global seat order: index 0 is
/// seat 0, and turn rotation walks that order.
///
/// # Example
///
/// ```rust
/// use powerturn_protocol::ConnectionId;
/// use powerturn_seats::{SeatDirectory, SeatInfo};
///
/// /// Two humans and a bot, hard-wired.
/// struct Fixture;
///
/// impl SeatDirectory for Fixture {
///     fn seats(&self) -> Vec<SeatInfo> {
///         vec![
///             SeatInfo::human(ConnectionId(1), "ada"),
///             SeatInfo::human(ConnectionId(2), "lin"),
///             SeatInfo::bot(ConnectionId(900), "bot"),
///         ]
///     }
/// }
///
/// assert_eq!(Fixture.seats().len(), 3);
/// ```
pub trait SeatDirectory: Send + Sync {
    /// Returns every seat in global order.
    fn seats(&self) -> Vec<SeatInfo>;
}

/// A directory backed by a fixed list. Useful for tests and demos.
#[derive(Debug, Clone, Default)]
pub struct StaticDirectory {
    seats: Vec<SeatInfo>,
}

impl StaticDirectory {
    pub fn new(seats: Vec<SeatInfo>) -> Self {
        Self { seats }
    }

    /// Appends a seat, builder style.
    pub fn with(mut self, seat: SeatInfo) -> Self {
        self.seats.push(seat);
        self
    }
}

impl SeatDirectory for StaticDirectory {
    fn seats(&self) -> Vec<SeatInfo> {
        self.seats.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_directory_preserves_order() {
        let dir = StaticDirectory::default()
            .with(SeatInfo::human(ConnectionId(5), "a"))
            .with(SeatInfo::bot(ConnectionId(6), "b"));

        let seats = dir.seats();
        assert_eq!(seats[0].connection_id, ConnectionId(5));
        assert!(!seats[0].is_bot);
        assert!(seats[1].is_bot);
    }
}
