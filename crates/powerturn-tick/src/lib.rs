//! Host clock for powerturn tables.
//!
//! A card match is turn-based, but the host still needs a heartbeat: turn
//! deadlines, bot think delays, display delays and the passive totals
//! poll are all checked on a host tick. [`HostTicker`] fires at a fixed
//! rate and keeps a *logical* host clock that only moves when a tick
//! fires, so every timer in a match is measured against one clock and
//! tests can drive it deterministically with `tokio::time::pause()`.
//!
//! # Event-driven mode
//!
//! With `tick_rate_hz == 0`, [`HostTicker::wait_for_tick`] pends forever and
//! the host clock never advances. Tables built this way only react to
//! requests; deadlines never expire.
//!
//! # Integration
//!
//! The ticker sits inside a table actor's `tokio::select!` loop:
//!
//! ```ignore
//! loop {
//!     tokio::select! {
//!         Some(cmd) = cmd_rx.recv() => { /* handle request */ }
//!         tick = ticker.wait_for_tick() => {
//!             let out = G::tick(&mut state, tick.elapsed);
//!         }
//!     }
//! }
//! ```

use std::time::Duration;

use rand::Rng;
use tokio::time::{self, Instant};
use tracing::{debug, trace, warn};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// What to do when the runtime wakes the ticker late.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TickPolicy {
    /// Fold the missed ticks into this one: the host clock jumps by every
    /// missed period, and the next tick is scheduled from now.
    #[default]
    Skip,
    /// Ignore the delay: the host clock advances by one period and the
    /// next tick keeps its original schedule.
    Drop,
}

/// Configuration for a [`HostTicker`].
#[derive(Debug, Clone)]
pub struct TickConfig {
    /// Tick rate in Hz. 0 = event-driven (never fires).
    pub tick_rate_hz: u32,
    pub policy: TickPolicy,
    /// Random delay (0–max µs) added to the first tick so tables created
    /// in the same instant do not all wake together.
    pub initial_jitter_us: u64,
}

impl Default for TickConfig {
    fn default() -> Self {
        Self {
            tick_rate_hz: 20,
            policy: TickPolicy::default(),
            initial_jitter_us: 2_000,
        }
    }
}

impl TickConfig {
    /// Highest supported rate.
    pub const MAX_TICK_RATE_HZ: u32 = 128;

    pub fn with_rate(tick_rate_hz: u32) -> Self {
        Self {
            tick_rate_hz,
            ..Default::default()
        }
    }

    /// Caps the rate at [`Self::MAX_TICK_RATE_HZ`].
    pub fn validated(mut self) -> Self {
        if self.tick_rate_hz > Self::MAX_TICK_RATE_HZ {
            warn!(
                rate = self.tick_rate_hz,
                max = Self::MAX_TICK_RATE_HZ,
                "tick_rate_hz exceeds maximum, clamping"
            );
            self.tick_rate_hz = Self::MAX_TICK_RATE_HZ;
        }
        self
    }

    /// Length of one tick, or `None` in event-driven mode.
    pub fn tick_duration(&self) -> Option<Duration> {
        if self.tick_rate_hz == 0 {
            None
        } else {
            Some(Duration::from_secs_f64(1.0 / self.tick_rate_hz as f64))
        }
    }
}

// ---------------------------------------------------------------------------
// Tick info
// ---------------------------------------------------------------------------

/// What a fired tick reports to the table.
#[derive(Debug, Clone)]
pub struct TickInfo {
    /// Tick number, starting at 1.
    pub tick: u64,
    /// Nominal tick period.
    pub dt: Duration,
    /// Logical time this tick covers: `dt`, plus any periods folded in
    /// under [`TickPolicy::Skip`]. Game logic advances its clock by this.
    pub elapsed: Duration,
    /// Host clock after this tick.
    pub host_time: Duration,
    /// `true` if the tick fired more than 10% of a period late.
    pub overrun: bool,
    /// Periods folded into this tick (0 in normal operation).
    pub ticks_skipped: u64,
}

// ---------------------------------------------------------------------------
// Ticker
// ---------------------------------------------------------------------------

/// Fixed-rate ticker with a logical host clock. One per table actor.
pub struct HostTicker {
    config: TickConfig,
    tick_duration: Option<Duration>,
    tick_count: u64,
    host_time: Duration,
    next_tick: Option<Instant>,
    paused: bool,
}

impl HostTicker {
    pub fn new(config: TickConfig) -> Self {
        let config = config.validated();
        let tick_duration = config.tick_duration();

        let next_tick = tick_duration.map(|d| {
            let jitter = if config.initial_jitter_us > 0 {
                Duration::from_micros(rand::rng().random_range(0..config.initial_jitter_us))
            } else {
                Duration::ZERO
            };
            Instant::now() + d + jitter
        });

        match tick_duration {
            None => debug!("host ticker created in event-driven mode"),
            Some(d) => debug!(
                rate_hz = config.tick_rate_hz,
                period_ms = d.as_secs_f64() * 1000.0,
                policy = ?config.policy,
                "host ticker created"
            ),
        }

        Self {
            config,
            tick_duration,
            tick_count: 0,
            host_time: Duration::ZERO,
            next_tick,
            paused: false,
        }
    }

    pub fn with_rate(tick_rate_hz: u32) -> Self {
        Self::new(TickConfig::with_rate(tick_rate_hz))
    }

    /// Waits for the next tick and advances the host clock.
    ///
    /// Pends forever in event-driven mode or while paused, so a
    /// `tokio::select!` around it keeps serving its other branches.
    pub async fn wait_for_tick(&mut self) -> TickInfo {
        let (next, period) = match (self.next_tick, self.tick_duration) {
            (Some(next), Some(period)) if !self.paused => (next, period),
            _ => std::future::pending().await,
        };

        time::sleep_until(next).await;

        let now = Instant::now();
        self.tick_count += 1;

        let late_by = now.saturating_duration_since(next);
        let overrun = late_by > period / 10;
        let mut ticks_skipped = 0u64;

        self.next_tick = Some(match self.config.policy {
            TickPolicy::Skip => {
                if overrun {
                    ticks_skipped = (late_by.as_nanos() / period.as_nanos()) as u64;
                    if ticks_skipped > 0 {
                        warn!(
                            tick = self.tick_count,
                            skipped = ticks_skipped,
                            late_ms = late_by.as_secs_f64() * 1000.0,
                            "host tick late, folding missed periods"
                        );
                    }
                }
                now + period
            }
            TickPolicy::Drop => {
                if overrun {
                    warn!(
                        tick = self.tick_count,
                        late_ms = late_by.as_secs_f64() * 1000.0,
                        "host tick late, keeping schedule"
                    );
                }
                next + period
            }
        });

        let elapsed = period * (1 + ticks_skipped as u32);
        self.host_time += elapsed;

        trace!(tick = self.tick_count, host_ms = self.host_time_ms(), "host tick");

        TickInfo {
            tick: self.tick_count,
            dt: period,
            elapsed,
            host_time: self.host_time,
            overrun,
            ticks_skipped,
        }
    }

    /// Stops ticking. Idempotent.
    pub fn pause(&mut self) {
        if !self.paused {
            self.paused = true;
            debug!(tick = self.tick_count, "host ticker paused");
        }
    }

    /// Restarts ticking one full period from now; time spent paused never
    /// reaches the host clock.
    pub fn resume(&mut self) {
        if self.paused {
            self.paused = false;
            if let Some(period) = self.tick_duration {
                self.next_tick = Some(Instant::now() + period);
            }
            debug!(tick = self.tick_count, "host ticker resumed");
        }
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn is_event_driven(&self) -> bool {
        self.tick_duration.is_none()
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// Logical host clock.
    pub fn host_time(&self) -> Duration {
        self.host_time
    }

    /// Host clock in whole milliseconds, as stamped on envelopes.
    pub fn host_time_ms(&self) -> u64 {
        u64::try_from(self.host_time.as_millis()).unwrap_or(u64::MAX)
    }

    pub fn tick_rate_hz(&self) -> u32 {
        self.config.tick_rate_hz
    }

    pub fn tick_duration(&self) -> Option<Duration> {
        self.tick_duration
    }
}
