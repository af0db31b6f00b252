//! Frame clock with a fixed physics step.

use std::time::{Duration, Instant};

/// Longest frame the clock will account for. A stall longer than this
/// (debugger, window drag) is treated as this long so the fixed step does
/// not try to catch up hundreds of ticks at once.
const MAX_FRAME_DELTA: Duration = Duration::from_millis(250);

/// Tracks variable frame time and hands out fixed physics steps.
#[derive(Debug)]
pub struct Time {
    start_time: Instant,
    last_frame: Instant,
    delta: Duration,
    elapsed: Duration,
    frame_count: u64,
    /// Fixed timestep for physics and held-object motion (default 60 Hz).
    fixed_timestep: Duration,
    accumulator: Duration,
}

impl Default for Time {
    fn default() -> Self {
        Self::new()
    }
}

impl Time {
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            start_time: now,
            last_frame: now,
            delta: Duration::ZERO,
            elapsed: Duration::ZERO,
            frame_count: 0,
            fixed_timestep: Duration::from_secs_f64(1.0 / 60.0),
            accumulator: Duration::ZERO,
        }
    }

    /// Sample the wall clock at the start of a new frame.
    pub fn update(&mut self) {
        let now = Instant::now();
        let delta = now - self.last_frame;
        self.last_frame = now;
        self.advance(delta);
    }

    /// Advance by an explicit frame duration.
    pub fn advance(&mut self, delta: Duration) {
        if delta > MAX_FRAME_DELTA {
            log::debug!("Frame took {:?}, clamping to {:?}", delta, MAX_FRAME_DELTA);
        }
        self.delta = delta.min(MAX_FRAME_DELTA);
        self.elapsed += self.delta;
        self.frame_count += 1;
        self.accumulator += self.delta;
    }

    pub fn delta_seconds(&self) -> f32 {
        self.delta.as_secs_f32()
    }

    pub fn elapsed_seconds(&self) -> f32 {
        self.elapsed.as_secs_f32()
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Wall-clock time since the clock was created, regardless of clamping.
    pub fn uptime(&self) -> Duration {
        self.last_frame - self.start_time
    }

    pub fn fixed_timestep_seconds(&self) -> f32 {
        self.fixed_timestep.as_secs_f32()
    }

    /// Consume one fixed step from the accumulator if enough time has built up.
    pub fn should_fixed_update(&mut self) -> bool {
        if self.accumulator >= self.fixed_timestep {
            self.accumulator -= self.fixed_timestep;
            true
        } else {
            false
        }
    }

    /// How far the clock is between the last fixed step and the next (0..1).
    /// Used to interpolate rendered poses of bodies that ask for it.
    pub fn interpolation_alpha(&self) -> f32 {
        let step = self.fixed_timestep.as_secs_f32();
        if step <= 0.0 {
            return 1.0;
        }
        (self.accumulator.as_secs_f32() / step).clamp(0.0, 1.0)
    }

    pub fn fps(&self) -> f32 {
        if self.delta.as_secs_f32() > 0.0 {
            1.0 / self.delta.as_secs_f32()
        } else {
            0.0
        }
    }

    /// Set the fixed timestep rate in Hz.
    pub fn set_fixed_rate(&mut self, hz: f64) {
        if hz > 0.0 {
            self.fixed_timestep = Duration::from_secs_f64(1.0 / hz);
        }
    }
}
