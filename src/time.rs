/// The timestamps a tick is evaluated at, as announced by the master clock.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TimeContext {
    /// Absolute simulation time in s.
    pub abs_time: f64,
    /// Time elapsed since the simulation started in s.
    pub pass_time: f64,
    /// Length of this tick in s.
    pub relative_time: f64,
    /// Index of this tick.
    pub frame: u64,
}

impl TimeContext {
    /// The context of the tick that follows this one after `dt` seconds.
    pub fn next(&self, dt: f64) -> Self {
        Self {
            abs_time: self.abs_time + dt,
            pass_time: self.pass_time + dt,
            relative_time: dt,
            frame: self.frame + 1,
        }
    }

    /// The context of the tick at absolute time `abs_time`.
    /// A timestamp earlier than the current one yields a zero-length tick.
    pub fn advance_to(&self, abs_time: f64) -> Self {
        self.next(f64::max(abs_time - self.abs_time, 0.0))
    }
}
