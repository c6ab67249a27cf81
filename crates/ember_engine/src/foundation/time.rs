//! Time management utilities

use std::time::Instant;

/// Longest frame delta handed to scene updates, in seconds. Keeps physics
/// stable across debugger stalls and window drags.
pub const MAX_FRAME_TIME: f32 = 0.1;

/// High-precision clock for frame timing
pub struct FrameClock {
    last_frame: Instant,
    delta_time: f32,
    total_time: f32,
    frame_count: u64,
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameClock {
    /// Create a new clock
    pub fn new() -> Self {
        Self {
            last_frame: Instant::now(),
            delta_time: 0.0,
            total_time: 0.0,
            frame_count: 0,
        }
    }

    /// Advance the clock; call once per frame. Returns the clamped delta.
    pub fn tick(&mut self) -> f32 {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_frame).as_secs_f32();
        self.delta_time = elapsed.min(MAX_FRAME_TIME);
        self.total_time += self.delta_time;
        self.last_frame = now;
        self.frame_count += 1;
        self.delta_time
    }

    /// Time since the last frame in seconds
    pub fn delta_time(&self) -> f32 {
        self.delta_time
    }

    /// Total elapsed time since clock creation
    pub fn total_time(&self) -> f32 {
        self.total_time
    }

    /// Number of frames ticked so far
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// FPS based on the last frame time
    pub fn current_fps(&self) -> f32 {
        if self.delta_time > 0.0 {
            1.0 / self.delta_time
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_tick_advances_frame_count() {
        let mut clock = FrameClock::new();
        assert_eq!(clock.frame_count(), 0);
        clock.tick();
        clock.tick();
        assert_eq!(clock.frame_count(), 2);
    }

    #[test]
    fn test_delta_is_clamped() {
        let mut clock = FrameClock::new();
        clock.last_frame = Instant::now() - Duration::from_secs(5);
        let dt = clock.tick();
        assert!(dt <= MAX_FRAME_TIME);
    }

    #[test]
    fn test_total_time_accumulates() {
        let mut clock = FrameClock::new();
        thread::sleep(Duration::from_millis(5));
        clock.tick();
        assert!(clock.total_time() > 0.0);
        assert!(clock.delta_time() > 0.0);
    }
}
