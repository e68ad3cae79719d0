//! The powerturn card engine.
//!
//! Everything a match decides lives here; the table layer only hosts it.
//!
//! | Module | Role |
//! |--------|------|
//! | [`deck`] | Deck Engine: stock, discard pile, killed zone, reshuffle |
//! | [`game`] | per-match context and the Turn Coordinator |
//! | [`power`] | Power Resolution Protocol for the seven powers |
//! | [`bot`] | Bot Actor Simulator |
//! | [`viewer`] | a viewer's projection, capability tags and resume latch |
//! | [`host`] | [`PowerTurnGame`], the `GameLogic` implementation |
//!
//! # Quick start
//!
//! ```rust,ignore
//! let mut manager = TableManager::<PowerTurnGame>::new();
//! let table = manager.create_table(&directory, GameConfig::default())?;
//! ```

pub mod bot;
pub mod card;
pub mod config;
pub mod deck;
mod error;
pub mod game;
pub mod hand;
pub mod host;
pub mod messages;
pub mod power;
pub mod scoring;
pub mod timers;
pub mod turn;
pub mod viewer;

pub use card::{Card, CardFace, CardId, PowerKind, Rank, SlotView, Suit, TargetMode};
pub use config::{GameConfig, RevealAllReuse};
pub use deck::{DeckEngine, DeckSnapshot, PileCard, build_deck};
pub use error::{ConfigError, DeckError, Rejection};
pub use game::{MatchContext, Outcome};
pub use hand::Hand;
pub use host::PowerTurnGame;
pub use messages::{AbortReason, ClientRequest, EffectDetail, ServerEvent};
pub use power::{SlotRef, Target, TargetSet};
pub use timers::{HostTimers, TimerEvent, TimerKind};
pub use turn::{Phase, ResolutionTicket, TurnState};
pub use viewer::{Capability, CosmeticSink, Cue, ViewerProjection};
