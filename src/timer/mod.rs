//! Clock, timers and scheduling helpers for the routing engine.
//!
//! The engine never waits. Everything time-related is expressed as a
//! [`Timer`] checked against a [`Clock`] whenever the host calls into the
//! engine. Two ways of driving it are provided: an interrupt service routine
//! using `critical_section::with` (`timer-isr` feature), or a busy-loop delay
//! timer (`delay-loop` feature).
//!
//! Contains helpers for polling- and ISR-based scheduling, including:
//! - `rate_limit_ticks`: compile-time rate to tick interval conversion
//! - `rate_limit_ticks_for`: runtime rate to tick interval conversion
//! - `run_uaodv_loop`: blocking engine loop for DelayNs (feature `delay-loop`)
//! - `global_uaodv_timer_tick` and `tick_uaodv!()`: interrupt-based tick callback wrapper
//! (feature `timer-isr`)
//!
//! Common clock rates: (For use with `rate_limit_ticks`, at the default 8 RREQs/s)
//!
//! | CLOCK_HZ | RREQ interval (ticks) |
//! |----------|-----------------------|
//! |       32 |                     4 |
//! |      128 |                    16 |
//! |     1000 |                   125 |
//! |    32768 |                  4096 |

#[cfg(feature = "delay-loop")]
mod delay;
#[cfg_attr(feature = "delay-loop", allow(unused_imports))]
#[cfg(feature = "delay-loop")]
pub use delay::*;

#[cfg(feature = "timer-isr")]
mod isr;
#[cfg_attr(feature = "timer-isr", allow(unused_imports))]
#[cfg(feature = "timer-isr")]
pub use isr::*;

#[cfg(feature = "timer-isr")]
mod macros;

/// Clock ticks. Wraps around; compare only through [`Timer`].
pub type Ticks = u32;

/// A monotonic tick source.
pub trait Clock {
    /// Current tick count.
    fn now(&self) -> Ticks;
}

/// A one-shot timer in the Contiki style: a start time and an interval.
///
/// A default timer has a zero interval and is therefore already expired.
#[derive(PartialEq, Eq, Clone, Copy, Default, Debug)]
pub struct Timer {
    start: Ticks,
    interval: Ticks,
}

impl Timer {
    /// Creates an expired timer.
    pub const fn new() -> Self {
        Self {
            start: 0,
            interval: 0,
        }
    }

    /// Starts the timer at `now`, expiring `interval` ticks later.
    pub fn set(&mut self, now: Ticks, interval: Ticks) {
        self.start = now;
        self.interval = interval;
    }

    /// Whether `interval` ticks have passed since the timer was set.
    pub fn expired(&self, now: Ticks) -> bool {
        now.wrapping_sub(self.start) >= self.interval
    }

    /// Ticks left until expiry, 0 once expired.
    pub fn remaining(&self, now: Ticks) -> Ticks {
        self.interval.saturating_sub(now.wrapping_sub(self.start))
    }
}

/// Compile-time rate limit calculator
///
/// # Arguments
/// - `clock_hz`: ticks per second of the engine's [`Clock`]
/// - `max_per_second`: how many events may happen per second (e.g., 8)
///
/// # Returns
/// - Minimum number of ticks between two events, rounded up and at least 1
pub const fn rate_limit_ticks(clock_hz: u32, max_per_second: u32) -> Ticks {
    if max_per_second == 0 {
        return Ticks::MAX;
    }
    let ticks = clock_hz.div_ceil(max_per_second);
    if ticks == 0 { 1 } else { ticks }
}

/// Compute a rate limit interval at runtime
///
/// # Arguments
/// - `clock_hz`: ticks per second of the engine's [`Clock`]
/// - `min_interval_ms`: shortest allowed gap between two events, in milliseconds
///
/// # Returns
/// - Number of ticks covering at least `min_interval_ms`, and at least 1
pub fn rate_limit_ticks_for(clock_hz: u32, min_interval_ms: u32) -> Ticks {
    let ticks = (u64::from(clock_hz) * u64::from(min_interval_ms)).div_ceil(1_000);
    Ticks::try_from(ticks).unwrap_or(Ticks::MAX).max(1)
}
