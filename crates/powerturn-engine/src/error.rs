//! Error types for the card engine.

use powerturn_protocol::ConnectionId;
use powerturn_seats::SeatIndex;

use crate::card::{CardId, PowerKind};

/// Deck Engine failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DeckError {
    /// Stock and discard are both empty. Unreachable with the fixed
    /// composition; the match aborts as a draw if it ever happens.
    #[error("stock is empty after reshuffling the discard pile")]
    EmptyAfterReshuffle,

    #[error("card {0} is not in the discard pile")]
    NotInDiscard(CardId),
}

/// Match configuration failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to parse game config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Why a request was dropped.
///
/// Rejections are never sent back to the client. Stale or duplicate
/// requests are a normal network race, so the host logs them at debug
/// level and moves on.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Rejection {
    #[error("connection {0} owns no seat")]
    NotSeated(ConnectionId),

    #[error("seat {0} is not in the match")]
    SeatNotInMatch(SeatIndex),

    #[error("the match is over")]
    MatchOver,

    #[error("request not allowed in phase {0}")]
    WrongPhase(&'static str),

    #[error("seat {seat} acted but seat {active} owns the turn")]
    NotYourTurn { seat: SeatIndex, active: SeatIndex },

    #[error("seat {0} is already ready")]
    AlreadyReady(SeatIndex),

    #[error("seat {0} already drew this turn")]
    AlreadyDrew(SeatIndex),

    #[error("seat {0} holds no peeked card")]
    NothingPeeked(SeatIndex),

    #[error("card {0} is neither the peeked card nor in the actor's hand")]
    UnknownCard(CardId),

    #[error("selection for {got} while {expected} is pending")]
    WrongPower { expected: PowerKind, got: PowerKind },

    #[error("target is not eligible for {0}")]
    IneligibleTarget(PowerKind),

    #[error("resolution ticket is stale or already consumed")]
    StaleTicket,
}
