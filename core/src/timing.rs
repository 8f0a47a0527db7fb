//! Frame timing: FPS statistics and the animation accumulator.
//!
//! The clock keeps two independent accumulators over the same per-frame
//! deltas:
//!
//! - a one-second window that feeds the smoothed frames-per-second
//!   estimate (`rate' = 0.5 * measured + 0.5 * rate`),
//! - an animation accumulator that texture-set animation consumes, reset
//!   every time the configured period elapses.
//!
//! All state advances in milliseconds through [`FrameClock::end_frame_at`],
//! so tests can drive a fake clock; [`FrameClock::end_frame`] measures the
//! real elapsed time since the matching `begin_frame`.

use std::time::Instant;

/// Smoothing factor of the leaky FPS accumulator.
const FPS_SMOOTHING: f64 = 0.5;

/// Per-frame CPU clock with FPS smoothing.
#[derive(Debug, Clone)]
pub struct FrameClock {
    frame_start: Option<Instant>,
    /// Milliseconds accumulated toward the next FPS update.
    window_ms: f64,
    /// Frames counted in the current window.
    frames: u32,
    /// Smoothed frame rate, Hz.
    frame_rate: f64,
    /// Smoothed frame time, milliseconds.
    average_frame_ms: f64,
    /// Last formatted FPS string.
    fps_string: String,
    /// Milliseconds accumulated for texture animation.
    animation_ms: f64,
    /// Duration of the most recent frame.
    last_frame_ms: f64,
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameClock {
    pub fn new() -> Self {
        Self {
            frame_start: None,
            window_ms: 0.0,
            frames: 0,
            frame_rate: 30.0,
            average_frame_ms: 33.333,
            fps_string: String::new(),
            animation_ms: 0.0,
            last_frame_ms: 0.0,
        }
    }

    /// Mark the start of a frame.
    pub fn begin_frame(&mut self) {
        self.frame_start = Some(Instant::now());
    }

    /// Mark the end of a frame, measuring real elapsed time.
    pub fn end_frame(&mut self) {
        let elapsed_ms = self
            .frame_start
            .take()
            .map(|t| t.elapsed().as_secs_f64() * 1000.0)
            .unwrap_or(0.0);
        self.end_frame_at(elapsed_ms);
    }

    /// Mark the end of a frame that took `frame_ms` milliseconds.
    ///
    /// Exposed so tests and benchmarks can drive a deterministic clock.
    pub fn end_frame_at(&mut self, frame_ms: f64) {
        self.last_frame_ms = frame_ms;
        self.frames += 1;
        self.window_ms += frame_ms;
        self.animation_ms += frame_ms;

        if self.window_ms > 1000.0 {
            let measured = self.frames as f64;
            self.frame_rate = measured * FPS_SMOOTHING + self.frame_rate * (1.0 - FPS_SMOOTHING);
            self.frames = 0;
            self.window_ms -= 1000.0;
            let rate = if self.frame_rate == 0.0 { 0.001 } else { self.frame_rate };
            self.average_frame_ms = 1000.0 / rate;
            self.fps_string = format!("FPS: {}", self.frame_rate as i64);
        }
    }

    /// Latest FPS string; empty until the first full second has elapsed.
    pub fn fps_string(&self) -> &str {
        &self.fps_string
    }

    /// Smoothed frame rate in Hz.
    pub fn frame_rate(&self) -> f64 {
        self.frame_rate
    }

    /// Smoothed frame time in milliseconds.
    pub fn average_frame_ms(&self) -> f64 {
        self.average_frame_ms
    }

    /// Duration of the most recent frame in milliseconds.
    pub fn last_frame_ms(&self) -> f64 {
        self.last_frame_ms
    }

    /// Milliseconds accumulated since the animation counter was reset.
    pub fn accumulated_time(&self) -> f64 {
        self.animation_ms
    }

    /// Reset the animation accumulator.
    pub fn reset_accumulated_time(&mut self) {
        self.animation_ms = 0.0;
    }

    /// Consume one animation tick if at least `period_ms` has accumulated.
    ///
    /// Called once per frame before any draw is recorded, so every object
    /// sharing the decision sees the same answer within a frame.
    pub fn consume_animation_tick(&mut self, period_ms: f64) -> bool {
        if self.accumulated_time() > period_ms {
            self.reset_accumulated_time();
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fps_updates_exactly_once_when_window_crosses_one_second() {
        let mut clock = FrameClock::new();
        let mut updates = 0;
        let mut last = String::new();
        for _ in 0..30 {
            clock.end_frame_at(33.4);
            if clock.fps_string() != last {
                updates += 1;
                last = clock.fps_string().to_owned();
            }
        }
        assert_eq!(updates, 1, "expected exactly one FPS string update");

        // 30 frames in ~1002 ms is ~29.9 Hz; smoothed against the initial
        // 30 Hz estimate the result must stay in that band.
        assert!((clock.frame_rate() - 30.0).abs() < 1.0);
        assert!((clock.average_frame_ms() - 33.3).abs() < 1.5);
    }

    #[test]
    fn smoothing_halves_the_step_toward_the_measured_rate() {
        let mut clock = FrameClock::new();
        // 60 frames of 17 ms -> 1020 ms window, measured 60 fps.
        for _ in 0..60 {
            clock.end_frame_at(17.0);
        }
        // rate' = 60 * 0.5 + 30 * 0.5
        assert!((clock.frame_rate() - 45.0).abs() < 1e-9);
    }

    #[test]
    fn animation_tick_fires_and_resets() {
        let mut clock = FrameClock::new();
        let period = 1000.0 / 60.0;

        clock.end_frame_at(10.0);
        assert!(!clock.consume_animation_tick(period));

        clock.end_frame_at(10.0);
        assert!(clock.consume_animation_tick(period));
        // Accumulator was reset by the tick.
        assert_eq!(clock.accumulated_time(), 0.0);
        assert!(!clock.consume_animation_tick(period));
    }

    #[test]
    fn real_clock_produces_nonnegative_frames() {
        let mut clock = FrameClock::new();
        clock.begin_frame();
        clock.end_frame();
        assert!(clock.last_frame_ms() >= 0.0);
    }
}
