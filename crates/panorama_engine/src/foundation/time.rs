//! Time management utilities
//!
//! The game loop never reads the wall clock directly. It asks a [`Clock`] for a
//! monotonic millisecond tick count, which keeps frame timing injectable in
//! tests.

use std::cell::Cell;
use std::rc::Rc;
use std::time::Instant;

/// Monotonic millisecond tick source
pub trait Clock {
    /// Milliseconds elapsed since some fixed origin
    fn ticks_ms(&self) -> u64;
}

/// Clock backed by [`Instant`]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    /// Create a clock whose origin is now
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn ticks_ms(&self) -> u64 {
        u64::try_from(self.origin.elapsed().as_millis()).unwrap_or(u64::MAX)
    }
}

/// Hand-driven clock for tests and headless runs
///
/// Clones share the same tick counter, so a test can keep one handle and give
/// the other to the game.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Rc<Cell<u64>>,
}

impl ManualClock {
    /// Create a clock starting at tick zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Move the clock forward
    pub fn advance(&self, millis: u64) {
        self.now.set(self.now.get().saturating_add(millis));
    }

    /// Jump to an absolute tick
    pub fn set(&self, millis: u64) {
        self.now.set(millis);
    }
}

impl Clock for ManualClock {
    fn ticks_ms(&self) -> u64 {
        self.now.get()
    }
}

/// Per-frame delta computation with an upper clamp
///
/// A long stall (breakpoint, window drag, pause) would otherwise hand the
/// movement integration one huge step. The clamp slows simulated time down
/// during a spike instead of sub-stepping.
#[derive(Debug, Clone)]
pub struct FrameTimer {
    last_tick: u64,
    max_delta: f32,
    delta_time: f32,
    frame_count: u64,
}

impl FrameTimer {
    /// Create a timer starting at `now` that never reports more than `max_delta` seconds
    pub fn new(now: u64, max_delta: f32) -> Self {
        Self {
            last_tick: now,
            max_delta: max_delta.max(0.0),
            delta_time: 0.0,
            frame_count: 0,
        }
    }

    /// Advance to `now` and return the clamped delta in seconds
    pub fn tick(&mut self, now: u64) -> f32 {
        let elapsed_ms = now.saturating_sub(self.last_tick);
        self.last_tick = now;
        self.frame_count += 1;

        let raw = elapsed_ms as f32 / 1000.0;
        self.delta_time = raw.clamp(0.0, self.max_delta);
        if raw > self.max_delta {
            log::trace!("Frame delta {:.3}s clamped to {:.3}s", raw, self.max_delta);
        }
        self.delta_time
    }

    /// Re-anchor without producing a delta (used while paused)
    pub fn reset(&mut self, now: u64) {
        self.last_tick = now;
        self.delta_time = 0.0;
    }

    /// Last computed delta in seconds
    pub fn delta_time(&self) -> f32 {
        self.delta_time
    }

    /// Tick count of the last update
    pub fn last_tick(&self) -> u64 {
        self.last_tick
    }

    /// Number of deltas computed so far
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_clock_shares_state() {
        let clock = ManualClock::new();
        let handle = clock.clone();
        handle.advance(16);
        assert_eq!(clock.ticks_ms(), 16);
        handle.set(5);
        assert_eq!(clock.ticks_ms(), 5);
    }

    #[test]
    fn test_delta_is_clamped() {
        let mut timer = FrameTimer::new(0, 0.05);
        assert_eq!(timer.tick(16), 0.016);
        assert_eq!(timer.tick(10_016), 0.05);
        assert_eq!(timer.frame_count(), 2);
    }

    #[test]
    fn test_delta_never_negative() {
        let mut timer = FrameTimer::new(1_000, 0.05);
        // A clock that jumps backwards yields zero, not a negative step
        assert_eq!(timer.tick(500), 0.0);
        assert_eq!(timer.tick(500), 0.0);
    }

    #[test]
    fn test_delta_within_bounds_for_any_step() {
        let mut timer = FrameTimer::new(0, 0.05);
        let mut now = 0u64;
        for step in [0u64, 1, 7, 49, 50, 51, 333, 86_400_000] {
            now += step;
            let delta = timer.tick(now);
            assert!((0.0..=0.05).contains(&delta), "step {step} gave {delta}");
        }
    }

    #[test]
    fn test_reset_swallows_elapsed_time() {
        let mut timer = FrameTimer::new(0, 0.05);
        timer.reset(5_000);
        assert_eq!(timer.tick(5_010), 0.01);
    }
}
