//! Core protocol types shared by the host and every viewer.
//!
//! Nothing here is game-specific: the card game's requests and events
//! live in `powerturn-engine` and travel inside an [`Envelope`].

use serde::{Deserialize, Serialize};

use std::fmt;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// The transport-level identity of one participant.
///
/// The host derives the acting seat from this id alone. A request never
/// carries a seat index the host would trust, so a viewer cannot act on
/// behalf of another seat by editing its payload.
///
/// Bots get synthetic connection ids from the seat directory; they go
/// through exactly the same lookups as humans.
///
/// `#[serde(transparent)]` keeps the wire form a plain number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionId(pub u64);

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "C-{}", self.0)
    }
}

/// A unique identifier for one table (one running match).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TableId(pub u64);

impl fmt::Display for TableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "T-{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Recipient — who should receive a host message?
// ---------------------------------------------------------------------------

/// Specifies who should receive a host message.
///
/// This is the privacy boundary of the game: anything that reveals a
/// hidden card must be addressed with [`Recipient::Connection`], and the
/// table actor delivers it to that connection only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Recipient {
    /// Every viewer attached to the table.
    All,

    /// Exactly one connection.
    Connection(ConnectionId),

    /// Everyone except the given connection. Used for the
    /// information-free acknowledgement that accompanies a private reveal.
    AllExcept(ConnectionId),
}

impl Recipient {
    /// Returns `true` if a message with this recipient reaches `conn`.
    pub fn includes(&self, conn: ConnectionId) -> bool {
        match self {
            Self::All => true,
            Self::Connection(target) => *target == conn,
            Self::AllExcept(excluded) => *excluded != conn,
        }
    }
}

// ---------------------------------------------------------------------------
// Envelope — sequencing wrapper
// ---------------------------------------------------------------------------

/// The wrapper every host message travels in.
///
/// `seq` strictly increases per table, across all recipients, so a viewer
/// can drop anything it has already applied (broadcasts are
/// at-most-once-per-trigger but the transport may still duplicate).
/// `host_time_ms` is the table's logical clock, the same clock turn
/// deadlines are expressed in.
///
/// ```text
/// ┌──────────────────────────────┐
/// │ seq: 42                      │  ← per-table ordering / dedup
/// │ host_time_ms: 15000          │  ← table clock at dispatch
/// │ ┌──────────────────────────┐ │
/// │ │ body: TurnStarted { .. } │ │  ← game message
/// │ └──────────────────────────┘ │
/// └──────────────────────────────┘
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope<T> {
    /// Per-table sequence number, starting at 1.
    pub seq: u64,
    /// Table clock in milliseconds when the message was dispatched.
    pub host_time_ms: u64,
    /// The wrapped message.
    pub body: T,
}

impl<T> Envelope<T> {
    /// Wraps `body` with the given sequencing data.
    pub fn new(seq: u64, host_time_ms: u64, body: T) -> Self {
        Self {
            seq,
            host_time_ms,
            body,
        }
    }

    /// Returns `true` if this envelope is newer than `last_seen`.
    pub fn is_newer_than(&self, last_seen: u64) -> bool {
        self.seq > last_seen
    }
}

// =========================================================================
// Tests
// =========================================================================
