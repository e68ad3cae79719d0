//! Wire-level building blocks for powerturn.
//!
//! This crate defines what every other layer agrees on before any game
//! rule is involved:
//!
//! - **Types** ([`ConnectionId`], [`TableId`], [`Recipient`], [`Envelope`]) —
//!   who a message is from, who it goes to, and how it is sequenced.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]) — how messages become bytes.
//! - **Errors** ([`ProtocolError`]) — what can go wrong while encoding or
//!   decoding.
//!
//! # Architecture
//!
//! The protocol layer knows nothing about seats, decks, or turns. The
//! transport (external) hands the host raw frames tagged with a
//! connection id; the protocol layer turns them into typed requests, and
//! typed host events back into frames.
//!
//! ```text
//! Transport (bytes, external) → Protocol (Envelope<T>) → Table (match actor)
//! ```

mod codec;
mod error;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{ConnectionId, Envelope, Recipient, TableId};
