//! Fixed-timestep accumulator.
//!
//! Host callbacks arrive at whatever rate the display runs. Elapsed time is banked in
//! an accumulator and paid out in whole fixed steps; the remainder becomes the
//! interpolation fraction for drawing.

/// Longest frame credited to the simulation, in fixed steps. Anything longer
/// (tab suspended, debugger pause) is clamped so the loop never spirals.
pub const MAX_STEPS_PER_FRAME: u32 = 5;

/// Slack when comparing the accumulator with the step; three steps of 1000/60 ms
/// must pay out three updates despite rounding.
const STEP_EPSILON_MS: f64 = 1e-6;

/// Result of one host callback.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameTick {
    /// Raw time since the previous callback, ms, before clamping. Zero for anomalies.
    pub delta_ms: f64,
    /// Fixed updates to run this frame.
    pub steps: u32,
    /// Blend factor between the previous and current step, in `[0, 1)`.
    pub alpha: f64,
}

#[derive(Debug, Clone)]
pub struct FixedStepLoop {
    fixed_step_ms: f64,
    frame_time: f64,
    accumulator: f64,
    fps_accum: f64,
    fps_frames: u32,
    fps: f64,
}

impl FixedStepLoop {
    pub fn new(fixed_step_ms: f64, now: f64) -> Self {
        Self {
            fixed_step_ms,
            frame_time: now,
            accumulator: 0.0,
            fps_accum: 0.0,
            fps_frames: 0,
            fps: 0.0,
        }
    }

    /// Forget banked time so the next callback does not replay an idle period.
    pub fn reset(&mut self, now: f64) {
        self.frame_time = now;
        self.accumulator = 0.0;
    }

    pub fn set_fixed_step(&mut self, fixed_step_ms: f64) {
        self.fixed_step_ms = fixed_step_ms;
        self.accumulator = self.accumulator.min(fixed_step_ms);
    }

    pub fn fixed_step_ms(&self) -> f64 {
        self.fixed_step_ms
    }

    pub fn frame_time(&self) -> f64 {
        self.frame_time
    }

    pub fn accumulator(&self) -> f64 {
        self.accumulator
    }

    pub fn max_delta_ms(&self) -> f64 {
        self.fixed_step_ms * MAX_STEPS_PER_FRAME as f64
    }

    pub fn fps(&self) -> f64 {
        self.fps
    }

    /// Banks the time since the last callback and reports how many steps are due.
    pub fn advance(&mut self, now: f64) -> FrameTick {
        if !now.is_finite() {
            return FrameTick {
                delta_ms: 0.0,
                steps: 0,
                alpha: self.alpha(),
            };
        }
        let raw = now - self.frame_time;
        self.frame_time = now;
        let delta_ms = if raw.is_finite() && raw > 0.0 { raw } else { 0.0 };

        self.track_fps(delta_ms);
        self.accumulator += delta_ms.min(self.max_delta_ms());

        let mut steps = 0;
        while self.accumulator + STEP_EPSILON_MS >= self.fixed_step_ms {
            self.accumulator -= self.fixed_step_ms;
            steps += 1;
        }
        self.accumulator = self.accumulator.max(0.0);

        FrameTick {
            delta_ms,
            steps,
            alpha: self.alpha(),
        }
    }

    pub fn alpha(&self) -> f64 {
        (self.accumulator / self.fixed_step_ms).clamp(0.0, 1.0)
    }

    fn track_fps(&mut self, delta_ms: f64) {
        self.fps_accum += delta_ms;
        self.fps_frames += 1;
        if self.fps_accum >= 500.0 {
            self.fps = self.fps_frames as f64 * 1000.0 / self.fps_accum;
            self.fps_accum = 0.0;
            self.fps_frames = 0;
        }
    }
}
