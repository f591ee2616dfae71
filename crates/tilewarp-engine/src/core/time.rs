/// Fixed timestep accumulator.
/// Decouples the simulation tick rate from the display frame rate.
pub struct FixedTimestep {
    /// The fixed delta time per tick.
    dt: f32,
    /// Longest frame delta accepted in one call, so a stalled tab does not
    /// replay seconds of simulation in one burst.
    max_frame_dt: f32,
    /// Accumulated time from variable frame deltas.
    accumulator: f32,
}

impl FixedTimestep {
    pub fn new(dt: f32, max_frame_dt: f32) -> Self {
        Self {
            dt,
            max_frame_dt,
            accumulator: 0.0,
        }
    }

    /// Add frame time to the accumulator. Returns the number of fixed steps to run.
    pub fn accumulate(&mut self, frame_dt: f32) -> u32 {
        self.accumulator += frame_dt.clamp(0.0, self.max_frame_dt);
        let steps = (self.accumulator / self.dt) as u32;
        self.accumulator -= steps as f32 * self.dt;
        steps
    }

    /// Interpolation alpha for rendering between ticks (0.0 to 1.0).
    pub fn alpha(&self) -> f32 {
        self.accumulator / self.dt
    }

    /// The fixed delta time.
    pub fn dt(&self) -> f32 {
        self.dt
    }

    /// Drop any partial tick, e.g. after a stage reload.
    pub fn reset(&mut self) {
        self.accumulator = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_step_exact() {
        let mut ts = FixedTimestep::new(1.0 / 60.0, 0.1);
        let steps = ts.accumulate(1.0 / 60.0);
        assert_eq!(steps, 1);
    }

    #[test]
    fn accumulates_partial() {
        let mut ts = FixedTimestep::new(1.0 / 60.0, 0.1);
        let steps = ts.accumulate(0.008); // half a frame
        assert_eq!(steps, 0);
        let steps = ts.accumulate(0.010); // over one frame total
        assert_eq!(steps, 1);
    }

    #[test]
    fn stall_is_capped_at_max_frame_dt() {
        let mut ts = FixedTimestep::new(0.25, 1.0);
        let steps = ts.accumulate(5.0);
        assert_eq!(steps, 4);
    }

    #[test]
    fn negative_delta_is_ignored() {
        let mut ts = FixedTimestep::new(1.0 / 60.0, 0.1);
        assert_eq!(ts.accumulate(-1.0), 0);
        assert_eq!(ts.alpha(), 0.0);
    }

    #[test]
    fn alpha_is_between_zero_and_one() {
        let mut ts = FixedTimestep::new(1.0 / 60.0, 0.1);
        ts.accumulate(0.008);
        let a = ts.alpha();
        assert!(a >= 0.0 && a <= 1.0, "alpha was {}", a);
    }
}
