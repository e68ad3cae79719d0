//! The `GameLogic` trait: the seam between hosting and game rules.
//!
//! The table actor owns the queue, the tick, and delivery. Everything a
//! match decides lives behind this trait, so the actor never sees a card
//! and the engine never sees a channel.

use std::time::Duration;

use powerturn_protocol::{ConnectionId, Recipient};
use powerturn_seats::Roster;
use serde::{de::DeserializeOwned, Serialize};

use crate::TableConfig;

/// Messages produced by one call into the game logic, each paired with
/// who may see it.
pub type Outbox<M> = Vec<(Recipient, M)>;

/// Game rules hosted by a table actor.
///
/// - `Config` — match settings (durations, hand size, policies)
/// - `State` — the per-match context. One value per table; the actor is
///   its only owner, so there is no global match state.
/// - `ClientMessage` — viewer → host requests
/// - `ServerMessage` — host → viewer messages
///
/// Every method returns an [`Outbox`]. The actor delivers each message to
/// exactly the connections its [`Recipient`] names.
pub trait GameLogic: Send + Sync + 'static {
    type Config: Send + Sync + Clone + Default + 'static;

    /// Not required to be serializable: the actor never sends it whole.
    /// Viewers only ever see role-scoped projections.
    type State: Send + 'static;

    type ClientMessage: Send + Clone + Serialize + DeserializeOwned + 'static;

    type ServerMessage: Send + Sync + Clone + Serialize + DeserializeOwned + 'static;

    /// Creates the match context when the table is spawned.
    ///
    /// `seed` feeds the match's random source; equal seeds and equal
    /// inputs give equal matches.
    fn init(
        config: &Self::Config,
        roster: Roster,
        seed: u64,
    ) -> (Self::State, Outbox<Self::ServerMessage>);

    /// Cheap pre-check of a request. An `Err` is logged at debug level and
    /// the request is dropped without a reply. Default: accept all.
    fn validate_message(
        _state: &Self::State,
        _sender: ConnectionId,
        _msg: &Self::ClientMessage,
    ) -> Result<(), String> {
        Ok(())
    }

    /// Processes a request from `sender`. The acting seat must be derived
    /// from `sender`, never from the message body.
    fn handle_message(
        state: &mut Self::State,
        sender: ConnectionId,
        msg: Self::ClientMessage,
    ) -> Outbox<Self::ServerMessage>;

    /// Host tick: advance the match clock by `elapsed` and fire whatever
    /// became due. Default: no-op.
    fn tick(_state: &mut Self::State, _elapsed: Duration) -> Outbox<Self::ServerMessage> {
        Vec::new()
    }

    /// Returns `true` once the match is over. Checked after every request
    /// and tick.
    fn is_finished(state: &Self::State) -> bool;

    /// A viewer attached for `conn` (first join or reconnect). Use this to
    /// resync the viewer's projection. Default: no-op.
    fn on_viewer_attached(
        _state: &mut Self::State,
        _conn: ConnectionId,
    ) -> Outbox<Self::ServerMessage> {
        Vec::new()
    }

    /// The viewer for `conn` went away. Default: no-op.
    fn on_viewer_detached(
        _state: &mut Self::State,
        _conn: ConnectionId,
    ) -> Outbox<Self::ServerMessage> {
        Vec::new()
    }

    /// Actor settings for this game. Default: 20 Hz tick, 64-deep queue.
    fn table_config() -> TableConfig {
        TableConfig::default()
    }
}
