//! Turn state: active seat, phase, turn serial and the resolution latch.
//!
//! ```text
//! WaitingForPeek → Normal(seat) → PowerPending(kind) → Resolving(ticket) → Normal(next) → … → MatchOver
//!                        └──────────────────────────────────────────────────→ Normal(next)
//! ```
//!
//! The serial grows on every transition the host makes. Timers and bot
//! actions capture it when scheduled and do nothing if it has moved on.

use powerturn_seats::SeatIndex;
use serde::{Deserialize, Serialize};

use crate::card::{CardId, PowerKind};
use crate::power::SlotRef;

/// Identifies one Resolving phase. Consumed exactly once, either by the
/// display timer or by the initiator's resume request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResolutionTicket {
    pub serial: u64,
    pub kind: PowerKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phase {
    WaitingForPeek,
    Normal,
    PowerPending {
        kind: PowerKind,
        initiator: SeatIndex,
        /// The discarded card that triggered the power.
        source: CardId,
        /// Swap's first pick, once made.
        first: Option<SlotRef>,
    },
    Resolving {
        ticket: ResolutionTicket,
        initiator: SeatIndex,
        /// The turn resumes at the seat after this one.
        resume_from: SeatIndex,
    },
    MatchOver,
}

impl Phase {
    pub fn name(&self) -> &'static str {
        match self {
            Phase::WaitingForPeek => "WaitingForPeek",
            Phase::Normal => "Normal",
            Phase::PowerPending { .. } => "PowerPending",
            Phase::Resolving { .. } => "Resolving",
            Phase::MatchOver => "MatchOver",
        }
    }
}

#[derive(Debug, Clone)]
pub struct TurnState {
    active: SeatIndex,
    phase: Phase,
    serial: u64,
    deadline_ms: Option<u64>,
    /// Per-turn flag, reset by `start_turn`.
    drew: bool,
    /// The ticket the latch will accept, if any.
    open_ticket: Option<ResolutionTicket>,
}

impl Default for TurnState {
    fn default() -> Self {
        Self::new()
    }
}

impl TurnState {
    pub fn new() -> Self {
        Self {
            active: 0,
            phase: Phase::WaitingForPeek,
            serial: 0,
            deadline_ms: None,
            drew: false,
            open_ticket: None,
        }
    }

    pub fn active(&self) -> SeatIndex {
        self.active
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn serial(&self) -> u64 {
        self.serial
    }

    pub fn deadline_ms(&self) -> Option<u64> {
        self.deadline_ms
    }

    pub fn drew(&self) -> bool {
        self.drew
    }

    pub fn is_current(&self, serial: u64) -> bool {
        self.serial == serial
    }

    pub fn is_over(&self) -> bool {
        self.phase == Phase::MatchOver
    }

    /// Hands the turn to `seat` in the Normal phase.
    pub fn start_turn(&mut self, seat: SeatIndex, deadline_ms: u64) -> u64 {
        self.serial += 1;
        self.active = seat;
        self.phase = Phase::Normal;
        self.deadline_ms = Some(deadline_ms);
        self.drew = false;
        self.open_ticket = None;
        self.serial
    }

    pub fn mark_drew(&mut self) {
        self.drew = true;
    }

    /// Suspends the turn for a power.
    pub fn enter_power_pending(
        &mut self,
        kind: PowerKind,
        source: CardId,
        deadline_ms: Option<u64>,
    ) -> u64 {
        self.serial += 1;
        self.phase = Phase::PowerPending {
            kind,
            initiator: self.active,
            source,
            first: None,
        };
        self.deadline_ms = deadline_ms;
        self.serial
    }

    /// Records swap's first pick. Does not touch the serial: both steps
    /// belong to one selection.
    pub fn record_first_pick(&mut self, pick: SlotRef) {
        if let Phase::PowerPending { first, .. } = &mut self.phase {
            *first = Some(pick);
        }
    }

    /// Enters Resolving and arms the latch with a fresh ticket.
    pub fn enter_resolving(&mut self, kind: PowerKind, resume_from: SeatIndex) -> ResolutionTicket {
        self.serial += 1;
        let ticket = ResolutionTicket {
            serial: self.serial,
            kind,
        };
        self.phase = Phase::Resolving {
            ticket,
            initiator: self.active,
            resume_from,
        };
        self.deadline_ms = None;
        self.open_ticket = Some(ticket);
        ticket
    }

    /// The one-shot latch. Returns the seat to resume from the first time
    /// the open ticket is presented, and `None` for anything else.
    pub fn consume(&mut self, ticket: ResolutionTicket) -> Option<SeatIndex> {
        if self.open_ticket != Some(ticket) {
            return None;
        }
        self.open_ticket = None;
        match self.phase {
            Phase::Resolving { resume_from, .. } => Some(resume_from),
            _ => None,
        }
    }

    pub fn end_match(&mut self) {
        self.serial += 1;
        self.phase = Phase::MatchOver;
        self.deadline_ms = None;
        self.open_ticket = None;
    }
}
