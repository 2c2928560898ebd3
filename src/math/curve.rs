use super::{Point2d, Vector2d};
use crate::util::Interval;
use cgmath::prelude::*;

/// A parametric curve in 2D space.
pub trait ParametricCurve2d {
    /// Samples the parametric curve.
    fn sample(&self, t: f64) -> Point2d;

    /// Returns the minimum and maximum t-values that define the bounds of the curve.
    fn bounds(&self) -> Interval<f64>;

    /// Samples the derivative of the parametric curve.
    ///
    /// The default implementation approximates the derivative by sampling
    /// two very nearby points along the curve.
    fn sample_dt(&self, t: f64) -> Vector2d {
        let delta = self.bounds().length() * 0.0001;
        let p1 = self.sample(t);
        let p2 = self.sample(t + delta);
        (p2 - p1) / delta
    }
}

/// Approximates a curve by subdividing it until all segments are no longer than `max_length` units in length.
pub fn subdivided_points_along_curve(
    curve: &impl ParametricCurve2d,
    max_length: f64,
) -> Vec<Point2d> {
    SubdividedSamples::new(curve, max_length)
        .map(|(_, p)| p)
        .collect()
}

struct SubdividedSamples<'a, C> {
    curve: &'a C,
    stack: Vec<(f64, Point2d)>,
    length2: f64,
}

/// Halving stops at this depth even if a segment is still too long.
const MAX_SUBDIVISION_DEPTH: u32 = 24;

impl<'a, C: ParametricCurve2d> SubdividedSamples<'a, C> {
    fn new(curve: &'a C, max_length: f64) -> Self {
        let Interval { min, max } = curve.bounds();
        let mid = 0.5 * (min + max);
        Self {
            curve,
            stack: vec![
                (max, curve.sample(max)),
                (mid, curve.sample(mid)),
                (min, curve.sample(min)),
            ],
            length2: max_length.powi(2),
        }
    }
}

impl<'a, C: ParametricCurve2d> Iterator for SubdividedSamples<'a, C> {
    type Item = (f64, Point2d);

    fn next(&mut self) -> Option<Self::Item> {
        let (t1, p1) = self.stack.pop()?;
        if let Some((mut t2, mut p2)) = self.stack.last().copied() {
            let mut depth = 0;
            while (p2 - p1).magnitude2() > self.length2 && depth < MAX_SUBDIVISION_DEPTH {
                let mid_t = 0.5 * (t1 + t2);
                (t2, p2) = (mid_t, self.curve.sample(mid_t));
                self.stack.push((t2, p2));
                depth += 1;
            }
        }
        Some((t1, p1))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    struct Arc;

    impl ParametricCurve2d for Arc {
        fn sample(&self, t: f64) -> Point2d {
            Point2d::new(10.0 * t.cos(), 10.0 * t.sin())
        }

        fn bounds(&self) -> Interval<f64> {
            Interval::new(0.0, std::f64::consts::PI)
        }
    }

    #[test]
    fn subdivision_bounds_segment_length() {
        let points = subdivided_points_along_curve(&Arc, 0.5);
        assert_approx_eq!(points[0].x, 10.0);
        assert_approx_eq!(points.last().unwrap().x, -10.0);
        for pair in points.windows(2) {
            assert!((pair[1] - pair[0]).magnitude() <= 0.5 + 1e-9);
        }
    }

    #[test]
    fn numeric_derivative() {
        let d = Arc.sample_dt(0.0);
        assert_approx_eq!(d.x, 0.0, 1e-2);
        assert_approx_eq!(d.y, 10.0, 1e-2);
    }
}
