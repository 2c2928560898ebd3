//! Miscellaneous utility structs and functions.

use std::fmt::Debug;

use cgmath::num_traits::Float;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// An interval on the real number line.
#[derive(Copy, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Interval<T> {
    pub min: T,
    pub max: T,
}

impl<T> Interval<T> {
    /// Creates a new interval.
    pub const fn new(min: T, max: T) -> Self {
        Self { min, max }
    }
}

impl<T: PartialOrd> Interval<T> {
    /// Returns true if this interval overlaps with the other.
    pub fn overlaps(&self, other: &Self) -> bool {
        self.max > other.min && other.max > self.min
    }

    /// Returns true if the value lies in `[min, max]`.
    pub fn contains(&self, value: T) -> bool {
        value >= self.min && value <= self.max
    }

    /// Returns true if the value lies in `[min, max)`.
    pub fn contains_half_open(&self, value: T) -> bool {
        value >= self.min && value < self.max
    }
}

impl<T: std::ops::Sub<T, Output = T> + Copy> Interval<T> {
    /// Gets the magnitude of the interval.
    pub fn length(&self) -> T {
        self.max - self.min
    }
}

impl<T: Float> Interval<T> {
    /// The smallest interval containing every value yielded.
    /// Returns `None` for an empty iterator.
    pub fn spanning(values: impl IntoIterator<Item = T>) -> Option<Self> {
        values.into_iter().fold(None, |acc, v| match acc {
            None => Some(Self::new(v, v)),
            Some(int) => Some(Self::new(int.min.min(v), int.max.max(v))),
        })
    }

    /// Returns the centre/mid-point of the interval.
    pub fn midpoint(&self) -> T {
        (self.min + self.max) / (T::one() + T::one())
    }

    /// Computes the gap between two intervals.
    /// Will be negative if the intervals overlap.
    pub fn clearance_with(&self, other: &Self) -> T {
        T::max(other.min - self.max, self.min - other.max)
    }

    /// Clamps a value into the interval.
    pub fn clamp(&self, value: T) -> T {
        value.max(self.min).min(self.max)
    }
}

impl<T: Debug> Debug for Interval<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}, {:?}]", self.min, self.max)
    }
}

#[cfg(test)]
mod test {
    use super::Interval;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn clearance() {
        let a: Interval<f64> = Interval::new(0.0, 4.0);
        let b: Interval<f64> = Interval::new(10.0, 12.0);
        assert_approx_eq!(a.clearance_with(&b), 6.0);
        assert_approx_eq!(b.clearance_with(&a), 6.0);
        assert!(a.clearance_with(&Interval::new(3.0, 5.0)) < 0.0);
    }

    #[test]
    fn half_open() {
        let int = Interval::new(0.0, 16.0);
        assert!(int.contains_half_open(0.0));
        assert!(!int.contains_half_open(16.0));
        assert!(int.contains(16.0));
    }

    #[test]
    fn spanning() {
        let int = Interval::spanning([3.0, -1.0, 2.0]).unwrap();
        assert_eq!(int, Interval::new(-1.0, 3.0));
        assert!(Interval::<f64>::spanning([]).is_none());
    }
}
