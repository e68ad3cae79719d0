//! Error types for the seat layer.

use powerturn_protocol::ConnectionId;

/// Errors that can occur while building or updating a roster.
#[derive(Debug, thiserror::Error)]
pub enum SeatError {
    /// The directory returned fewer seats than a match needs.
    #[error("a match needs at least {min} seats, directory has {found}")]
    NotEnoughSeats { min: usize, found: usize },

    /// The directory returned more seats than a table can hold.
    #[error("a table holds at most {max} seats, directory has {found}")]
    TooManySeats { max: usize, found: usize },

    /// Two seats claim the same connection id.
    #[error("connection {0} owns more than one seat")]
    DuplicateConnection(ConnectionId),

    /// No seat is owned by this connection.
    #[error("connection {0} does not own a seat")]
    UnknownConnection(ConnectionId),
}
