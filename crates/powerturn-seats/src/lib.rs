//! Seats for powerturn matches.
//!
//! This crate handles everything the host needs to know about *who* sits
//! at a table:
//!
//! 1. **Directory** — the external, read-only list of seats
//!    ([`SeatDirectory`] trait)
//! 2. **Roster** — the per-match view of those seats: which connection owns
//!    which seat, which seats are still in the match ([`Roster`])
//! 3. **Rotation** — turn order and the mapping between global seat indices
//!    and each viewer's rotated local order ([`rotation`])
//!
//! # How it fits in the stack
//!
//! ```text
//! Table Layer (above)  ← builds a Roster when a match starts
//!     ↕
//! Seat Layer (this crate)  ← seat identity, presence, turn order
//!     ↕
//! Protocol Layer (below)  ← provides ConnectionId
//! ```

mod directory;
mod error;
mod roster;
pub mod rotation;

pub use directory::{SeatDirectory, SeatInfo, StaticDirectory};
pub use error::SeatError;
pub use roster::{Presence, Roster, Seat};
pub use rotation::Rotation;

/// Global seat position, fixed for the whole match.
pub type SeatIndex = usize;
