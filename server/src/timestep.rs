/// Converts variable wall-clock frame deltas into whole simulation ticks,
/// so the amount of simulation depends only on elapsed time.
#[derive(Debug, Clone)]
pub struct FixedTimestep {
    dt: f64,
    accumulator: f64,
}

/// Upper bound on ticks handed out per call, so a stalled host catches up
/// gradually instead of freezing on a huge batch
pub const MAX_TICKS_PER_FRAME: u32 = 10;

impl FixedTimestep {
    pub fn new(dt: f64) -> Self {
        Self {
            dt,
            accumulator: 0.0,
        }
    }

    /// Add frame time. Returns the number of fixed ticks to run.
    pub fn accumulate(&mut self, frame_dt: f64) -> u32 {
        self.accumulator += frame_dt.max(0.0);
        self.accumulator = self.accumulator.min(self.dt * MAX_TICKS_PER_FRAME as f64);
        let ticks = (self.accumulator / self.dt) as u32;
        self.accumulator -= ticks as f64 * self.dt;
        ticks
    }

    pub fn dt(&self) -> f64 {
        self.dt
    }
}
