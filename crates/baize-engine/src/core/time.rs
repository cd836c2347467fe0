/// Fixed timestep accumulator.
/// Runs physics at a constant sub-step regardless of render frame time,
/// with a hard cap on sub-steps per frame to bound worst-case work.
#[derive(Debug, Clone)]
pub struct FixedTimestep {
    /// The fixed delta time per sub-step.
    dt: f32,
    /// Simulation speed multiplier applied to incoming frame time.
    speed: f32,
    /// Maximum sub-steps returned by a single `accumulate` call.
    max_steps: u32,
    /// Accumulated simulated time not yet consumed.
    accumulator: f32,
}

impl FixedTimestep {
    pub fn new(dt: f32, max_steps: u32) -> Self {
        Self {
            dt,
            speed: 1.0,
            max_steps: max_steps.max(1),
            accumulator: 0.0,
        }
    }

    pub fn with_speed(mut self, speed: f32) -> Self {
        self.set_speed(speed);
        self
    }

    pub fn set_speed(&mut self, speed: f32) {
        self.speed = speed.max(0.0);
    }

    /// Add frame time to the accumulator. Returns the number of fixed steps to run.
    pub fn accumulate(&mut self, frame_dt: f32) -> u32 {
        self.accumulator += frame_dt.max(0.0) * self.speed;
        // Drop whatever exceeds the per-frame budget rather than spiralling
        self.accumulator = self.accumulator.min(self.dt * self.max_steps as f32);
        // Small tolerance so exact multiples of dt are not lost to rounding
        let steps = (((self.accumulator + self.dt * 1e-3) / self.dt) as u32).min(self.max_steps);
        self.accumulator = (self.accumulator - steps as f32 * self.dt).max(0.0);
        steps
    }

    /// The fixed delta time.
    pub fn dt(&self) -> f32 {
        self.dt
    }

    pub fn reset(&mut self) {
        self.accumulator = 0.0;
    }
}
