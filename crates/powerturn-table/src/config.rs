//! Table configuration and lifecycle state machine.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// TableConfig
// ---------------------------------------------------------------------------

/// Runtime settings of a table actor.
///
/// Game implementations override these through `GameLogic::table_config()`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableConfig {
    /// Host tick rate in Hz. Deadlines are only as precise as one tick.
    /// 0 means event-driven: no tick, deadlines never expire.
    pub tick_rate_hz: u32,

    /// Capacity of the request queue. A full queue applies backpressure
    /// to the caller instead of dropping requests.
    pub channel_size: usize,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            tick_rate_hz: 20,
            channel_size: 64,
        }
    }
}

// ---------------------------------------------------------------------------
// TableState
// ---------------------------------------------------------------------------

/// Lifecycle of a table.
///
/// ```text
/// Running → Finished → Destroying
/// ```
///
/// - **Running**: the match context exists (deck dealt, peek phase or
///   turns in progress). Requests and ticks are processed.
/// - **Finished**: the match is over (ranked or aborted). Viewers can
///   still attach and read the final broadcast; requests are ignored.
/// - **Destroying**: the actor is shutting down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TableState {
    Running,
    Finished,
    Destroying,
}

impl TableState {
    /// Returns `true` while requests and ticks reach the game logic.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Running)
    }

    /// The only valid successor state, if any.
    pub fn next(self) -> Option<Self> {
        match self {
            Self::Running => Some(Self::Finished),
            Self::Finished => Some(Self::Destroying),
            Self::Destroying => None,
        }
    }

    pub fn can_transition_to(self, target: Self) -> bool {
        self.next() == Some(target)
    }
}

impl std::fmt::Display for TableState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Running => write!(f, "Running"),
            Self::Finished => write!(f, "Finished"),
            Self::Destroying => write!(f, "Destroying"),
        }
    }
}
