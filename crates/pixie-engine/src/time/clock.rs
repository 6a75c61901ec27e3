use std::time::{Duration, Instant};

/// One clock step.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Tick {
    /// Seconds since the previous tick, clamped.
    pub dt: f64,
    pub frame: u64,
}

/// Produces clamped frame deltas.
///
/// A stall (debugger, minimized window) would otherwise fast-forward every
/// playing animation by the whole pause.
#[derive(Debug, Clone)]
pub struct FrameClock {
    last: Instant,
    frame: u64,
    dt_min: Duration,
    dt_max: Duration,
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameClock {
    pub fn new() -> Self {
        Self::with_clamps(Duration::from_micros(100), Duration::from_millis(250))
    }

    pub fn with_clamps(dt_min: Duration, dt_max: Duration) -> Self {
        debug_assert!(dt_min <= dt_max);
        Self {
            last: Instant::now(),
            frame: 0,
            dt_min,
            dt_max,
        }
    }

    /// Restarts timing, e.g. after the host resumes from suspension.
    pub fn reset(&mut self) {
        self.last = Instant::now();
    }

    pub fn tick(&mut self) -> Tick {
        self.tick_at(Instant::now())
    }

    /// Steps the clock as if `now` were the current time.
    pub fn tick_at(&mut self, now: Instant) -> Tick {
        let dt = now.saturating_duration_since(self.last).clamp(self.dt_min, self.dt_max);
        self.last = now;
        let tick = Tick {
            dt: dt.as_secs_f64(),
            frame: self.frame,
        };
        self.frame = self.frame.wrapping_add(1);
        tick
    }

    #[inline]
    pub fn frame(&self) -> u64 {
        self.frame
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn long_stall_is_clamped() {
        let start = Instant::now();
        let mut clock = FrameClock::with_clamps(Duration::from_millis(1), Duration::from_millis(100));
        clock.last = start;
        let t = clock.tick_at(start + Duration::from_secs(5));
        assert_eq!(t.dt, 0.1);
        assert_eq!(t.frame, 0);
        assert_eq!(clock.frame(), 1);
    }

    #[test]
    fn zero_delta_is_raised_to_minimum() {
        let start = Instant::now();
        let mut clock = FrameClock::with_clamps(Duration::from_millis(2), Duration::from_millis(100));
        clock.last = start;
        let t = clock.tick_at(start);
        assert_eq!(t.dt, 0.002);
    }

    #[test]
    fn regular_frame_passes_through() {
        let start = Instant::now();
        let mut clock = FrameClock::new();
        clock.last = start;
        let t = clock.tick_at(start + Duration::from_millis(16));
        assert_eq!(t.dt, 0.016);
    }
}
