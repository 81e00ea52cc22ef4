//! Simulation time model.
//!
//! Time is a monotonically increasing `Tick` counter; the mapping to wall
//! seconds lives in `SimClock`.  One tick represents a fixed real-world
//! duration (`tick_duration_secs`, default 1 s) and all physics rates are
//! expressed per second, scaled by that duration at application time.

use std::fmt;

use serde::{Deserialize, Serialize};

// ── Tick ─────────────────────────────────────────────────────────────────────

/// An absolute simulation tick counter.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
#[derive(Serialize, Deserialize)]
pub struct Tick(pub u64);

impl Tick {
    pub const ZERO: Tick = Tick(0);

    /// Return the tick `n` steps after `self`.
    #[inline]
    pub fn offset(self, n: u64) -> Tick {
        Tick(self.0 + n)
    }
}

impl std::ops::Add<u64> for Tick {
    type Output = Tick;
    #[inline]
    fn add(self, rhs: u64) -> Tick {
        Tick(self.0 + rhs)
    }
}

impl std::ops::Sub for Tick {
    type Output = u64;
    #[inline]
    fn sub(self, rhs: Tick) -> u64 {
        self.0 - rhs.0
    }
}

impl fmt::Display for Tick {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "T{}", self.0)
    }
}

// ── SimClock ──────────────────────────────────────────────────────────────────

/// Converts between tick counts and elapsed wall time.
///
/// Cheap to copy; holds no heap data.
#[derive(Clone, Debug)]
pub struct SimClock {
    /// How many real seconds one tick represents.  Default: 1.0.
    pub tick_duration_secs: f64,
    /// The current tick — advanced once per `Simulation::update`.
    pub current_tick: Tick,
}

impl SimClock {
    pub const DEFAULT_TICK_SECS: f64 = 1.0;

    pub fn new(tick_duration_secs: f64) -> Self {
        Self {
            tick_duration_secs,
            current_tick: Tick::ZERO,
        }
    }

    /// Advance the clock by one tick.
    #[inline]
    pub fn advance(&mut self) {
        self.current_tick = Tick(self.current_tick.0 + 1);
    }

    /// Elapsed simulated seconds since tick 0.
    #[inline]
    pub fn elapsed_secs(&self) -> f64 {
        self.current_tick.0 as f64 * self.tick_duration_secs
    }

    /// Elapsed simulated minutes since tick 0.
    #[inline]
    pub fn elapsed_minutes(&self) -> f64 {
        self.elapsed_secs() / 60.0
    }
}

impl Default for SimClock {
    fn default() -> Self {
        Self::new(Self::DEFAULT_TICK_SECS)
    }
}
