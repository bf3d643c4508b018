//! Named timers for the control loop.
//!
//! Every periodic activity in the loop owns one of these instead of a
//! free-floating "last fired" timestamp.  Time is passed in explicitly so
//! the timers are deterministic under test.
//!
//! ```text
//!   tick(now) ──▶ sample_timer.due(now)     ──▶ read sensors
//!             ──▶ telemetry_timer.due(now)  ──▶ publish snapshot
//!             ──▶ reconnect.ready(now)      ──▶ connect attempt, arm()
//! ```

/// Monotonic milliseconds since boot.
pub type Millis = u64;

// ═══════════════════════════════════════════════════════════════
//  PeriodicTimer
// ═══════════════════════════════════════════════════════════════

/// Fires at most once per `period_ms`.
///
/// The first call to [`due`](Self::due) always fires, so the loop samples
/// and publishes immediately after boot rather than one period later.
#[derive(Debug, Clone, Copy)]
pub struct PeriodicTimer {
    period_ms: u32,
    last_fired_ms: Option<Millis>,
}

impl PeriodicTimer {
    pub const fn new(period_ms: u32) -> Self {
        Self {
            period_ms,
            last_fired_ms: None,
        }
    }

    /// Returns `true` (and restarts the period) when the timer has elapsed.
    pub fn due(&mut self, now: Millis) -> bool {
        let fire = match self.last_fired_ms {
            None => true,
            Some(last) => now.saturating_sub(last) >= u64::from(self.period_ms),
        };
        if fire {
            self.last_fired_ms = Some(now);
        }
        fire
    }

    pub fn period_ms(&self) -> u32 {
        self.period_ms
    }
}

// ═══════════════════════════════════════════════════════════════
//  Cooldown
// ═══════════════════════════════════════════════════════════════

/// Rate limiter for retried operations (broker reconnects).
///
/// Unlike [`PeriodicTimer`] it only restarts when the caller [`arm`](Self::arm)s
/// it, i.e. when an attempt is actually made.
#[derive(Debug, Clone, Copy)]
pub struct Cooldown {
    period_ms: u32,
    last_attempt_ms: Option<Millis>,
}

impl Cooldown {
    pub const fn new(period_ms: u32) -> Self {
        Self {
            period_ms,
            last_attempt_ms: None,
        }
    }

    /// Whether a new attempt may be made at `now`.
    pub fn ready(&self, now: Millis) -> bool {
        match self.last_attempt_ms {
            None => true,
            Some(last) => now.saturating_sub(last) >= u64::from(self.period_ms),
        }
    }

    /// Record an attempt at `now`.
    pub fn arm(&mut self, now: Millis) {
        self.last_attempt_ms = Some(now);
    }

    /// Forget the last attempt (called once the operation succeeds).
    pub fn reset(&mut self) {
        self.last_attempt_ms = None;
    }
}
