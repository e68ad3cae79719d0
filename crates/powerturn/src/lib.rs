//! # Powerturn
//!
//! Host-authoritative, turn-based card matches with per-card powers.
//!
//! One host owns every match. Each match runs in its own table actor,
//! the card engine decides everything, and viewers only ever see what
//! their seat is allowed to see. This crate ties the layers together and
//! adds a [`Gateway`] that turns transport frames into requests.
//!
//! ```text
//! Transport (external) → Gateway (frames) → Table (actor) → Engine (rules)
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use powerturn::prelude::*;
//!
//! # async fn run() -> Result<(), PowerturnError> {
//! let gateway = Gateway::<PowerTurnGame>::json();
//! let seats = StaticDirectory::new(vec![
//!     SeatInfo::human(ConnectionId(1), "ada"),
//!     SeatInfo::bot(ConnectionId(2), "bot"),
//! ]);
//! let table = gateway.open_table(&seats, GameConfig::default()).await?;
//! let mut frames = gateway.connect(ConnectionId(1), table).await?;
//! gateway.handle_frame(ConnectionId(1), br#"{"type":"JoinReady"}"#).await?;
//! while let Some(frame) = frames.recv().await {
//!     // hand `frame` to the transport
//! #   let _ = frame;
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
mod error;
pub mod gateway;
pub mod logging;

pub use error::PowerturnError;
pub use gateway::{FrameReceiver, Gateway};

pub use powerturn_engine as engine;
pub use powerturn_protocol as protocol;
pub use powerturn_seats as seats;
pub use powerturn_table as table;
pub use powerturn_tick as tick;

pub mod prelude {
    pub use crate::config::load_game_config;
    pub use crate::{FrameReceiver, Gateway, PowerturnError};

    pub use powerturn_engine::{
        Capability, ClientRequest, CosmeticSink, Cue, GameConfig, PowerKind, PowerTurnGame,
        ServerEvent, ViewerProjection,
    };
    pub use powerturn_protocol::{Codec, ConnectionId, Envelope, JsonCodec, Recipient, TableId};
    pub use powerturn_seats::{Rotation, SeatDirectory, SeatInfo, StaticDirectory};
    pub use powerturn_table::{GameLogic, Outbox, TableConfig, TableManager, TableState};
}
