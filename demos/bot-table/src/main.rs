//! Runs one all-bot match on a local gateway and narrates it.
//!
//! ```text
//! cargo run -p bot-table [-- path/to/config.json]
//! ```
//!
//! Set `RUST_LOG=debug` to see the host's own decisions next to the
//! narration.

use std::time::Duration;

use powerturn::prelude::*;

const BOTS: u64 = 4;
const OBSERVER: ConnectionId = ConnectionId(1);
/// Wall-clock cap in case a config makes the match crawl.
const MATCH_CAP: Duration = Duration::from_secs(300);

/// Prints cues the way a client would trigger animations.
struct Narrator;

impl CosmeticSink for Narrator {
    fn play_effect(&mut self, cue: Cue, local_seat: usize) {
        tracing::info!(?cue, local_seat, "cue");
    }
}

fn fast_config() -> GameConfig {
    GameConfig {
        peek_window_ms: 500,
        turn_ms: 1500,
        power_select_ms: 1500,
        resolve_display_ms: 300,
        bonus_extension_ms: 150,
        kill_refill_ms: 150,
        totals_window_ms: 400,
        bot_think_min_ms: 60,
        bot_think_max_ms: 200,
        ..GameConfig::default()
    }
    .validated()
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    powerturn::logging::init("info");

    let config = match std::env::args().nth(1) {
        Some(path) => load_game_config(path)?,
        None => fast_config(),
    };

    let seats = StaticDirectory::new(
        (1..=BOTS)
            .map(|id| SeatInfo::bot(ConnectionId(id), format!("bot-{id}")))
            .collect(),
    );

    let gateway = Gateway::<PowerTurnGame>::json();
    let table = gateway.open_table(&seats, config).await?;
    let mut frames = gateway.connect(OBSERVER, table).await?;

    let mut view = ViewerProjection::new();
    let narrated = tokio::time::timeout(MATCH_CAP, async {
        while let Some(frame) = frames.recv().await {
            let envelope: Envelope<ServerEvent> = match serde_json::from_slice(&frame) {
                Ok(envelope) => envelope,
                Err(e) => {
                    tracing::warn!(error = %e, "undecodable frame");
                    continue;
                }
            };
            view.apply(&envelope, &mut Narrator);
            match &envelope.body {
                ServerEvent::MatchOver { .. } | ServerEvent::MatchAborted { .. } => return true,
                ServerEvent::TurnStarted { seat, serial, .. } => {
                    tracing::info!(seat, serial, stock = view.deck().stock_count, "turn");
                }
                _ => {}
            }
        }
        false
    })
    .await;

    match narrated {
        Ok(true) => {}
        Ok(false) => tracing::warn!("table closed before the match ended"),
        Err(_) => tracing::warn!(cap_secs = MATCH_CAP.as_secs(), "match cap reached"),
    }

    if let Some(reason) = view.aborted() {
        println!("match aborted: {reason}");
    }
    if let Some(standings) = view.standings() {
        for standing in standings {
            println!(
                "{}. {} ({} points)",
                standing.place, standing.display_name, standing.total
            );
        }
    }

    gateway.close_table(table).await?;
    Ok(())
}
