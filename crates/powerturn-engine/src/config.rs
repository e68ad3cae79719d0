//! Match configuration.

use powerturn_seats::Rotation;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// What happens to a reveal-all card after its power resolves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RevealAllReuse {
    /// The card stays on the discard pile like any other.
    #[default]
    Consume,
    /// The card goes back under the stock and can be drawn again.
    ReturnToStock,
}

/// Settings for one match. Durations are host milliseconds.
///
/// Missing JSON fields take their default, so a config file only needs
/// the values it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Slots per hand.
    pub hand_size: usize,
    /// Slots each seat may look at during the peek phase.
    pub initial_peek_count: usize,
    pub peek_window_ms: u64,
    /// Turn deadline. Deadlines are checked once per host tick.
    pub turn_ms: u64,
    /// Deadline for picking a power target.
    pub power_select_ms: u64,
    /// How long an applied effect is shown before the turn moves on.
    pub resolve_display_ms: u64,
    pub bonus_extension_ms: u64,
    pub kill_refill_ms: u64,
    pub totals_window_ms: u64,
    pub bot_think_min_ms: u64,
    pub bot_think_max_ms: u64,
    /// Bots keep a drawn card worth at most this many points.
    pub bot_keep_threshold: u32,
    /// Discard cards left in place when the stock is rebuilt.
    pub reshuffle_keep: usize,
    pub rotation: Rotation,
    pub reveal_all_reuse: RevealAllReuse,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            hand_size: 3,
            initial_peek_count: 2,
            peek_window_ms: 5000,
            turn_ms: 6000,
            power_select_ms: 6000,
            resolve_display_ms: 2000,
            bonus_extension_ms: 1000,
            kill_refill_ms: 1000,
            totals_window_ms: 3000,
            bot_think_min_ms: 1000,
            bot_think_max_ms: 2000,
            bot_keep_threshold: 4,
            reshuffle_keep: 1,
            rotation: Rotation::Clockwise,
            reveal_all_reuse: RevealAllReuse::Consume,
        }
    }
}

impl GameConfig {
    /// Largest hand. Eight full hands still leave a stock to draw from.
    pub const MAX_HAND_SIZE: usize = 6;
    /// Shortest turn or selection deadline.
    pub const MIN_DEADLINE_MS: u64 = 500;

    /// Parses a JSON config. The result is not validated yet.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Returns a config with every out-of-range value clamped.
    pub fn validated(mut self) -> Self {
        if self.hand_size == 0 || self.hand_size > Self::MAX_HAND_SIZE {
            let clamped = self.hand_size.clamp(1, Self::MAX_HAND_SIZE);
            tracing::warn!(requested = self.hand_size, clamped, "hand_size out of range, clamping");
            self.hand_size = clamped;
        }
        if self.initial_peek_count > self.hand_size {
            tracing::warn!(
                requested = self.initial_peek_count,
                clamped = self.hand_size,
                "initial_peek_count exceeds hand_size, clamping"
            );
            self.initial_peek_count = self.hand_size;
        }
        if self.turn_ms < Self::MIN_DEADLINE_MS {
            tracing::warn!(requested = self.turn_ms, clamped = Self::MIN_DEADLINE_MS, "turn_ms too short, clamping");
            self.turn_ms = Self::MIN_DEADLINE_MS;
        }
        if self.power_select_ms < Self::MIN_DEADLINE_MS {
            tracing::warn!(
                requested = self.power_select_ms,
                clamped = Self::MIN_DEADLINE_MS,
                "power_select_ms too short, clamping"
            );
            self.power_select_ms = Self::MIN_DEADLINE_MS;
        }
        if self.bot_think_min_ms > self.bot_think_max_ms {
            tracing::warn!(
                min = self.bot_think_min_ms,
                max = self.bot_think_max_ms,
                "bot_think_min_ms above bot_think_max_ms, swapping"
            );
            std::mem::swap(&mut self.bot_think_min_ms, &mut self.bot_think_max_ms);
        }
        if self.bot_think_min_ms == 0 {
            // A zero delay would let a bot act again within the same tick.
            self.bot_think_min_ms = 1;
            self.bot_think_max_ms = self.bot_think_max_ms.max(1);
        }
        self
    }
}
