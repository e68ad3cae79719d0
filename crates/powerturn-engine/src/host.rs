//! Hosts a [`MatchContext`] inside a table actor.

use std::time::Duration;

use powerturn_protocol::ConnectionId;
use powerturn_seats::Roster;
use powerturn_table::{GameLogic, Outbox, TableConfig};

use crate::config::GameConfig;
use crate::game::MatchContext;
use crate::messages::{ClientRequest, ServerEvent};

/// The card game as seen by the table layer.
pub struct PowerTurnGame;

impl GameLogic for PowerTurnGame {
    type Config = GameConfig;
    type State = MatchContext;
    type ClientMessage = ClientRequest;
    type ServerMessage = ServerEvent;

    fn init(config: &GameConfig, roster: Roster, seed: u64) -> (MatchContext, Outbox<ServerEvent>) {
        let mut ctx = MatchContext::new(config.clone(), roster, seed);
        let out = ctx.take_outbox();
        (ctx, out)
    }

    fn validate_message(
        state: &MatchContext,
        sender: ConnectionId,
        _msg: &ClientRequest,
    ) -> Result<(), String> {
        if state.is_over() {
            return Err("match is over".into());
        }
        if state.roster().seat_of(sender).is_none() {
            return Err(format!("connection {sender} owns no seat"));
        }
        Ok(())
    }

    fn handle_message(
        state: &mut MatchContext,
        sender: ConnectionId,
        msg: ClientRequest,
    ) -> Outbox<ServerEvent> {
        if let Err(rejection) = state.handle_request(sender, msg) {
            tracing::debug!(%sender, %rejection, "request rejected");
        }
        state.take_outbox()
    }

    fn tick(state: &mut MatchContext, elapsed: Duration) -> Outbox<ServerEvent> {
        let elapsed_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);
        state.advance(elapsed_ms);
        state.take_outbox()
    }

    fn is_finished(state: &MatchContext) -> bool {
        state.is_over()
    }

    fn on_viewer_attached(state: &mut MatchContext, conn: ConnectionId) -> Outbox<ServerEvent> {
        state.seat_attached(conn);
        state.take_outbox()
    }

    fn on_viewer_detached(state: &mut MatchContext, conn: ConnectionId) -> Outbox<ServerEvent> {
        state.seat_detached(conn);
        state.take_outbox()
    }

    fn table_config() -> TableConfig {
        TableConfig {
            tick_rate_hz: 20,
            channel_size: 128,
        }
    }
}
