//! The roster: per-match record of every seat and its presence.
//!
//! Built once from a [`SeatDirectory`] when a table starts. Seats are never
//! added or removed afterwards; only their presence changes.
//!
//! ```text
//! from_directory() ──→ [InMatch] ──disconnect()──→ [Disconnected]
//!                          ↑                              │
//!                          └─────────reconnect()──────────┘
//! ```
//!
//! # Concurrency note
//!
//! `Roster` is plain data. It lives inside one match context, which is
//! owned by one table actor task, so no locking is needed.

use std::collections::HashMap;

use powerturn_protocol::ConnectionId;

use crate::rotation::{self, Rotation};
use crate::{SeatDirectory, SeatError, SeatIndex, SeatInfo};

/// Whether a seat currently takes part in turn rotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    /// The seat plays: it gets turns and can be targeted.
    InMatch,
    /// The owning connection went away. The seat keeps its hand but is
    /// skipped by rotation and cannot be targeted.
    Disconnected,
}

/// One seat at the table.
#[derive(Debug, Clone)]
pub struct Seat {
    /// Global position, fixed for the match.
    pub index: SeatIndex,
    /// Connection that owns this seat.
    pub connection_id: ConnectionId,
    /// Driven by the host's bot simulator.
    pub is_bot: bool,
    pub display_name: String,
    pub presence: Presence,
}

impl Seat {
    pub fn in_match(&self) -> bool {
        self.presence == Presence::InMatch
    }
}

/// All seats of one match, with connection lookups and turn order.
#[derive(Debug, Clone)]
pub struct Roster {
    seats: Vec<Seat>,
    /// Index from connection id to seat. Kept in sync with `seats`;
    /// never changes after construction.
    by_connection: HashMap<ConnectionId, SeatIndex>,
    rotation: Rotation,
}

impl Roster {
    /// Fewest seats a match can start with.
    pub const MIN_SEATS: usize = 2;
    /// Most seats one table holds.
    pub const MAX_SEATS: usize = 8;

    /// Builds a roster from an ordered seat list.
    ///
    /// # Errors
    /// - [`SeatError::NotEnoughSeats`] / [`SeatError::TooManySeats`] when the
    ///   count is outside `MIN_SEATS..=MAX_SEATS`
    /// - [`SeatError::DuplicateConnection`] when two seats share a connection
    pub fn new(infos: Vec<SeatInfo>) -> Result<Self, SeatError> {
        if infos.len() < Self::MIN_SEATS {
            return Err(SeatError::NotEnoughSeats {
                min: Self::MIN_SEATS,
                found: infos.len(),
            });
        }
        if infos.len() > Self::MAX_SEATS {
            return Err(SeatError::TooManySeats {
                max: Self::MAX_SEATS,
                found: infos.len(),
            });
        }

        let mut by_connection = HashMap::with_capacity(infos.len());
        let mut seats = Vec::with_capacity(infos.len());
        for (index, info) in infos.into_iter().enumerate() {
            if by_connection.insert(info.connection_id, index).is_some() {
                return Err(SeatError::DuplicateConnection(info.connection_id));
            }
            seats.push(Seat {
                index,
                connection_id: info.connection_id,
                is_bot: info.is_bot,
                display_name: info.display_name,
                presence: Presence::InMatch,
            });
        }

        Ok(Self {
            seats,
            by_connection,
            rotation: Rotation::default(),
        })
    }

    /// Reads the directory once and builds a roster from it.
    pub fn from_directory(directory: &impl SeatDirectory) -> Result<Self, SeatError> {
        Self::new(directory.seats())
    }

    /// Sets the turn rotation, builder style.
    pub fn with_rotation(mut self, rotation: Rotation) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn rotation(&self) -> Rotation {
        self.rotation
    }

    /// Total seats, present or not.
    pub fn len(&self) -> usize {
        self.seats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seats.is_empty()
    }

    pub fn seats(&self) -> &[Seat] {
        &self.seats
    }

    pub fn seat(&self, index: SeatIndex) -> Option<&Seat> {
        self.seats.get(index)
    }

    /// Seat owned by `conn`, regardless of presence.
    pub fn seat_of(&self, conn: ConnectionId) -> Option<SeatIndex> {
        self.by_connection.get(&conn).copied()
    }

    pub fn connection(&self, index: SeatIndex) -> Option<ConnectionId> {
        self.seats.get(index).map(|s| s.connection_id)
    }

    pub fn is_bot(&self, index: SeatIndex) -> bool {
        self.seats.get(index).is_some_and(|s| s.is_bot)
    }

    pub fn in_match(&self, index: SeatIndex) -> bool {
        self.seats.get(index).is_some_and(Seat::in_match)
    }

    /// Global indices of every seat still in the match, in seat order.
    pub fn in_match_seats(&self) -> impl Iterator<Item = SeatIndex> + '_ {
        self.seats.iter().filter(|s| s.in_match()).map(|s| s.index)
    }

    pub fn in_match_count(&self) -> usize {
        self.seats.iter().filter(|s| s.in_match()).count()
    }

    /// Connections of human seats. Bots never attach a viewer of their own
    /// requests, so the table only accepts requests from these.
    pub fn human_connections(&self) -> impl Iterator<Item = ConnectionId> + '_ {
        self.seats
            .iter()
            .filter(|s| !s.is_bot)
            .map(|s| s.connection_id)
    }

    /// Marks the seat owned by `conn` as disconnected.
    ///
    /// Idempotent: disconnecting an already disconnected seat succeeds
    /// and changes nothing.
    pub fn disconnect(&mut self, conn: ConnectionId) -> Result<SeatIndex, SeatError> {
        let index = self
            .seat_of(conn)
            .ok_or(SeatError::UnknownConnection(conn))?;
        let seat = &mut self.seats[index];
        if seat.in_match() {
            seat.presence = Presence::Disconnected;
            tracing::info!(%conn, seat = index, "seat left the match");
        }
        Ok(index)
    }

    /// Puts the seat owned by `conn` back in the match.
    pub fn reconnect(&mut self, conn: ConnectionId) -> Result<SeatIndex, SeatError> {
        let index = self
            .seat_of(conn)
            .ok_or(SeatError::UnknownConnection(conn))?;
        let seat = &mut self.seats[index];
        if !seat.in_match() {
            seat.presence = Presence::InMatch;
            tracing::info!(%conn, seat = index, "seat rejoined the match");
        }
        Ok(index)
    }

    /// Next in-match seat after `from` in the configured rotation, wrapping
    /// around the table and skipping disconnected seats.
    ///
    /// Returns `from` itself when it is the only seat left in the match,
    /// and `None` when no seat is in the match at all.
    pub fn next_seat(&self, from: SeatIndex) -> Option<SeatIndex> {
        let n = self.seats.len();
        (1..=n)
            .map(|hops| rotation::step(from, hops, self.rotation, n))
            .find(|&candidate| self.in_match(candidate))
    }
}
