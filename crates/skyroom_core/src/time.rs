//! Frame timing.
//!
//! The runner owns a [`FrameClock`] and ticks it once per frame; the
//! resulting [`Time`] snapshot is handed to every app callback so camera
//! movement can be scaled by `delta`.

use std::time::{Duration, Instant};

/// Largest delta a single frame may report, in seconds.  A debugger pause or
/// a window drag would otherwise teleport the camera.
pub const MAX_DELTA: f32 = 0.1;

/// Timing snapshot for one frame.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Time {
    /// Seconds since the previous tick, clamped to [`MAX_DELTA`].
    pub delta: f32,
    /// Seconds since the clock was created.
    pub elapsed: f64,
    /// Index of this frame, starting at 0.
    pub frame_count: u64,
}

impl Time {
    /// Frames per second derived from `delta`; 0 on the first frame.
    pub fn fps(&self) -> f32 {
        if self.delta > 0.0 {
            1.0 / self.delta
        } else {
            0.0
        }
    }
}

pub struct FrameClock {
    start: Instant,
    last_tick: Instant,
    frame_count: u64,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::starting_at(Instant::now())
    }

    fn starting_at(now: Instant) -> Self {
        Self {
            start: now,
            last_tick: now,
            frame_count: 0,
        }
    }

    /// Snapshot without advancing; used by callbacks outside the frame loop
    /// (setup, resize) so they don't consume a frame.
    pub fn peek(&self) -> Time {
        self.snapshot(Instant::now())
    }

    /// Advances the clock by one frame.
    pub fn tick(&mut self) -> Time {
        self.tick_at(Instant::now())
    }

    fn tick_at(&mut self, now: Instant) -> Time {
        let time = self.snapshot(now);
        self.last_tick = now;
        self.frame_count += 1;
        time
    }

    fn snapshot(&self, now: Instant) -> Time {
        let raw = now.saturating_duration_since(self.last_tick);
        Time {
            delta: raw.min(Duration::from_secs_f32(MAX_DELTA)).as_secs_f32(),
            elapsed: now.saturating_duration_since(self.start).as_secs_f64(),
            frame_count: self.frame_count,
        }
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tick_reports_delta_and_counts_frames() {
        let t0 = Instant::now();
        let mut clock = FrameClock::starting_at(t0);

        let first = clock.tick_at(t0 + Duration::from_millis(16));
        assert_eq!(first.frame_count, 0);
        assert!((first.delta - 0.016).abs() < 1e-4);

        let second = clock.tick_at(t0 + Duration::from_millis(48));
        assert_eq!(second.frame_count, 1);
        assert!((second.delta - 0.032).abs() < 1e-4);
        assert!((second.elapsed - 0.048).abs() < 1e-6);
    }

    #[test]
    fn long_frames_are_clamped() {
        let t0 = Instant::now();
        let mut clock = FrameClock::starting_at(t0);
        let time = clock.tick_at(t0 + Duration::from_secs(3));
        assert!((time.delta - MAX_DELTA).abs() < 1e-6);
        assert!((time.elapsed - 3.0).abs() < 1e-6);
    }

    #[test]
    fn fps_is_zero_without_delta() {
        assert_eq!(Time::default().fps(), 0.0);
        let time = Time {
            delta: 0.02,
            ..Default::default()
        };
        assert!((time.fps() - 50.0).abs() < 1e-3);
    }
}
