//! Cooperative host timers.
//!
//! Timers are plain entries in a per-match queue, fired from the host tick
//! in due order. Nothing runs concurrently with the match; a timer is just
//! an event the match context handles when the clock reaches it.
//!
//! Two rules keep stale callbacks harmless:
//!
//! 1. Restarting a timer cancels the pending entry of the same kind first.
//! 2. Every serial-carrying event is re-checked against the current turn
//!    serial when it fires.

use std::collections::BTreeMap;

use powerturn_seats::SeatIndex;

use crate::turn::ResolutionTicket;

/// Events a timer can deliver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerEvent {
    /// The peek window closed.
    PeekPhaseEnd,
    /// The turn or selection deadline captured at `serial` expired.
    TurnDeadline { serial: u64 },
    /// A bot finished thinking.
    BotAct { seat: SeatIndex, serial: u64 },
    /// Time to refill the slot emptied by a kill.
    KillRefill { ticket: ResolutionTicket },
    /// The effect display time is over; resume the turn.
    ResolveDisplay { ticket: ResolutionTicket },
}

/// Discriminant of [`TimerEvent`], for cancellation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerKind {
    PeekPhaseEnd,
    TurnDeadline,
    BotAct,
    KillRefill,
    ResolveDisplay,
}

impl TimerEvent {
    pub fn kind(&self) -> TimerKind {
        match self {
            TimerEvent::PeekPhaseEnd => TimerKind::PeekPhaseEnd,
            TimerEvent::TurnDeadline { .. } => TimerKind::TurnDeadline,
            TimerEvent::BotAct { .. } => TimerKind::BotAct,
            TimerEvent::KillRefill { .. } => TimerKind::KillRefill,
            TimerEvent::ResolveDisplay { .. } => TimerKind::ResolveDisplay,
        }
    }
}

/// Pending timers ordered by due time, then by scheduling order.
#[derive(Debug, Default)]
pub struct HostTimers {
    entries: BTreeMap<(u64, u64), TimerEvent>,
    next_order: u64,
}

impl HostTimers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, due_ms: u64, event: TimerEvent) {
        self.entries.insert((due_ms, self.next_order), event);
        self.next_order += 1;
    }

    /// Cancels any pending timer of `kind`, then schedules `event`.
    pub fn restart(&mut self, due_ms: u64, event: TimerEvent) {
        self.cancel(event.kind());
        self.schedule(due_ms, event);
    }

    /// Removes every pending timer of `kind`. Returns how many were removed.
    pub fn cancel(&mut self, kind: TimerKind) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, event| event.kind() != kind);
        before - self.entries.len()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Pops the earliest timer due at or before `now_ms`.
    pub fn pop_due(&mut self, now_ms: u64) -> Option<TimerEvent> {
        let (&(due, _), _) = self.entries.first_key_value()?;
        if due > now_ms {
            return None;
        }
        self.entries.pop_first().map(|(_, event)| event)
    }

    pub fn next_due(&self) -> Option<u64> {
        self.entries.first_key_value().map(|(&(due, _), _)| due)
    }

    pub fn is_pending(&self, kind: TimerKind) -> bool {
        self.entries.values().any(|event| event.kind() == kind)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
