//! Signal colours, phase timing and control phases.

use crate::util::Interval;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;

/// The age reported for a colour that never changes.
pub const AGE_FOREVER: f64 = f64::MAX;

/// The colour shown by a signal light.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SignalColor {
    #[default]
    Green,
    Yellow,
    Red,
    /// The signal is disabled.
    Grey,
}

impl SignalColor {
    /// The colour that follows this one in a cycle.
    fn following(self) -> Self {
        match self {
            Self::Green => Self::Yellow,
            Self::Yellow => Self::Red,
            Self::Red | Self::Grey => Self::Green,
        }
    }

    fn slot(self) -> usize {
        match self {
            Self::Green | Self::Grey => 0,
            Self::Yellow => 1,
            Self::Red => 2,
        }
    }

    /// The colour as seen by traffic and the output encoder.
    /// A disabled signal does not hold traffic.
    pub fn effective(self) -> Self {
        match self {
            Self::Grey => Self::Green,
            color => color,
        }
    }
}

impl fmt::Display for SignalColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// A half-open time interval `[min, max)` showing a single colour.
#[derive(Clone, Copy, Debug, PartialEq)]
struct ColorInterval {
    color: SignalColor,
    span: Interval<f64>,
}

/// The fixed-time phase plan of a signal light.
///
/// Colours cycle green, yellow, red from `start_time`. The intervals are built
/// lazily as time advances and dropped once they have elapsed, so only the
/// current and next intervals are ever held.
#[derive(Clone, Debug)]
pub struct SignalPhasePeriod {
    start_time: f64,
    /// Green, yellow and red durations in s.
    durations: [f64; 3],
    intervals: VecDeque<ColorInterval>,
    phase: SignalColor,
    next_phase: SignalColor,
    age: f64,
    next_age: f64,
}

impl SignalPhasePeriod {
    /// Creates a phase plan. Negative or non-finite durations count as zero.
    pub fn new(start_time: f64, green: f64, yellow: f64, red: f64) -> Self {
        let clean = |d: f64| if d.is_finite() { d.max(0.0) } else { 0.0 };
        Self {
            start_time: if start_time.is_finite() { start_time } else { 0.0 },
            durations: [clean(green), clean(yellow), clean(red)],
            intervals: VecDeque::with_capacity(4),
            phase: SignalColor::Green,
            next_phase: SignalColor::Green,
            age: AGE_FOREVER,
            next_age: AGE_FOREVER,
        }
    }

    /// The length of one full cycle in s.
    pub fn period(&self) -> f64 {
        self.durations.iter().sum()
    }

    /// Computes the colour at `pass_time` and caches it for the accessors below.
    /// Time is expected to advance in small steps. A step backwards, or past
    /// every interval held, rebuilds the intervals from the enclosing cycle.
    pub fn compute_color(&mut self, pass_time: f64) -> SignalColor {
        let period = self.period();
        let time = pass_time + self.start_time;
        if period <= 0.0 || !time.is_finite() {
            self.intervals.clear();
            self.force_green();
            return self.phase;
        }

        let before = self.intervals.front().map_or(true, |int| time < int.span.min);
        let beyond = self.intervals.back().map_or(true, |int| time >= int.span.max);
        if before || beyond {
            self.intervals.clear();
            let cycle_start = (time / period).floor() * period;
            self.push_interval(cycle_start, SignalColor::Green);
        }

        // Keep one interval beyond the one containing `time`.
        while self.intervals.len() < 2 || self.intervals[self.intervals.len() - 2].span.max <= time {
            self.extend();
        }
        while self.intervals.front().map_or(false, |int| int.span.max <= time) {
            self.intervals.pop_front();
        }

        match (self.intervals.front(), self.intervals.get(1)) {
            (Some(cur), Some(next)) => {
                self.phase = cur.color;
                self.age = cur.span.max - time;
                self.next_phase = next.color;
                self.next_age = next.span.length();
            }
            _ => self.force_green(),
        }
        self.phase
    }

    pub fn phase(&self) -> SignalColor {
        self.phase
    }

    pub fn next_phase(&self) -> SignalColor {
        self.next_phase
    }

    /// Time remaining in the current phase in s.
    pub fn age(&self) -> f64 {
        self.age
    }

    /// Duration of the next phase in s.
    pub fn next_age(&self) -> f64 {
        self.next_age
    }

    fn force_green(&mut self) {
        self.phase = SignalColor::Green;
        self.next_phase = SignalColor::Green;
        self.age = AGE_FOREVER;
        self.next_age = AGE_FOREVER;
    }

    /// Appends the interval following the last one held.
    fn extend(&mut self) {
        match self.intervals.back() {
            Some(last) => {
                let (start, color) = (last.span.max, last.color.following());
                self.push_interval(start, color);
            }
            None => self.push_interval(0.0, SignalColor::Green),
        }
    }

    /// Pushes an interval of `color` starting at `start`, skipping colours
    /// with no duration. Requires a positive period.
    fn push_interval(&mut self, start: f64, mut color: SignalColor) {
        while self.durations[color.slot()] <= 0.0 {
            color = color.following();
        }
        let end = start + self.durations[color.slot()];
        self.intervals.push_back(ColorInterval {
            color,
            span: Interval::new(start, end),
        });
    }

    #[cfg(test)]
    fn held_intervals(&self) -> usize {
        self.intervals.len()
    }
}

/// A movement through a junction that a signal may control.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ControlPhase {
    /// Code `U`.
    UTurn,
    /// Code `L`.
    Left,
    /// Code `T`.
    Straight,
    /// Code `R`.
    Right,
    /// Code `L0`, a left turn that is not held by the main left signal.
    LeftFree,
    /// Code `R0`, a right turn that is not held by the main right signal.
    RightFree,
}

impl ControlPhase {
    pub const ALL: [Self; 6] = [
        Self::UTurn,
        Self::Left,
        Self::Straight,
        Self::Right,
        Self::LeftFree,
        Self::RightFree,
    ];

    /// Parses a single phase code.
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim() {
            "U" => Some(Self::UTurn),
            "L" => Some(Self::Left),
            "T" => Some(Self::Straight),
            "R" => Some(Self::Right),
            "L0" => Some(Self::LeftFree),
            "R0" => Some(Self::RightFree),
            _ => None,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::UTurn => "U",
            Self::Left => "L",
            Self::Straight => "T",
            Self::Right => "R",
            Self::LeftFree => "L0",
            Self::RightFree => "R0",
        }
    }

    /// Parses a `;` separated list of phase codes. `A` stands for every phase.
    /// Unrecognised codes are read as straight ahead.
    pub fn parse_list(list: &str) -> Vec<Self> {
        let mut phases = vec![];
        for code in list.split(';').map(str::trim).filter(|c| !c.is_empty()) {
            if code == "A" {
                return Self::ALL.to_vec();
            }
            let phase = Self::from_code(code).unwrap_or_else(|| {
                log::warn!("unknown control phase {code:?}, treating as straight");
                Self::Straight
            });
            if !phases.contains(&phase) {
                phases.push(phase);
            }
        }
        phases
    }
}

impl fmt::Display for ControlPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}
