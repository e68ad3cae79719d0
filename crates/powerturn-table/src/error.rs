//! Error types for the table layer.

use powerturn_protocol::{ConnectionId, TableId};
use powerturn_seats::SeatError;

/// Errors that can occur during table operations.
///
/// Game-rule violations never show up here: the game logic drops those
/// silently. These are hosting errors only.
#[derive(Debug, thiserror::Error)]
pub enum TableError {
    /// The table does not exist.
    #[error("table {0} not found")]
    NotFound(TableId),

    /// The connection owns no seat at this table.
    #[error("connection {0} has no seat at table {1}")]
    NotSeated(ConnectionId, TableId),

    /// The connection already has a viewer attached to this table.
    #[error("connection {0} already attached to table {1}")]
    AlreadyAttached(ConnectionId, TableId),

    /// The connection has no attached viewer.
    #[error("connection {0} is not attached to any table")]
    NotAttached(ConnectionId),

    /// The table is in a state that doesn't allow this operation.
    #[error("invalid table state for this operation: {0}")]
    InvalidState(String),

    /// The table's command queue is closed (actor gone).
    #[error("table {0} is unavailable")]
    Unavailable(TableId),

    /// The seat directory produced an unusable roster.
    #[error(transparent)]
    Seats(#[from] SeatError),
}
