use super::{ParametricCurve2d, Point2d, Vector2d};
use crate::error::GeometryError;
use crate::util::Interval;
use cgmath::prelude::*;

/// Consecutive control points closer than this are coincident.
const MIN_CONTROL_SPACING: f64 = 1e-6; // m

/// A centripetal Catmull-Rom spline.
///
/// The curve passes through every control point except the first and last,
/// which only shape the end tangents. It is parameterised over `[0, n - 3]`
/// for `n` control points, one unit per segment.
#[derive(Clone, Debug)]
pub struct CatmullRom {
    points: Vec<Point2d>,
    knots: Vec<f64>,
}

impl CatmullRom {
    /// Creates a spline from at least 4 distinct control points.
    pub fn new(points: Vec<Point2d>) -> Result<Self, GeometryError> {
        if points.len() < 4 {
            return Err(GeometryError::TooFewControlPoints {
                count: points.len(),
            });
        }
        let mut knots = Vec::with_capacity(points.len());
        knots.push(0.0);
        for (index, pair) in points.windows(2).enumerate() {
            let dist = pair[0].distance(pair[1]);
            if dist < MIN_CONTROL_SPACING {
                return Err(GeometryError::CoincidentControlPoints { index });
            }
            knots.push(knots[index] + dist.sqrt());
        }
        Ok(Self { points, knots })
    }

    /// Creates a spline passing through every given point, extrapolating
    /// a phantom control point beyond each end.
    pub fn through(points: &[Point2d]) -> Result<Self, GeometryError> {
        if points.len() < 2 {
            return Err(GeometryError::TooFewControlPoints {
                count: points.len(),
            });
        }
        let first = points[0] + (points[0] - points[1]);
        let n = points.len();
        let last = points[n - 1] + (points[n - 1] - points[n - 2]);
        let mut all = Vec::with_capacity(n + 2);
        all.push(first);
        all.extend_from_slice(points);
        all.push(last);
        Self::new(all)
    }

    /// The number of segments.
    pub fn segments(&self) -> usize {
        self.points.len() - 3
    }

    /// Position and derivative with respect to the curve parameter.
    pub fn evaluate(&self, u: f64) -> (Point2d, Vector2d) {
        let max = self.segments() as f64;
        let u = u.clamp(0.0, max);
        let seg = usize::min(u as usize, self.segments() - 1);
        let frac = u - seg as f64;

        let p = &self.points[seg..seg + 4];
        let t = &self.knots[seg..seg + 4];
        let time = t[1] + frac * (t[2] - t[1]);

        // Barry and Goldman's pyramidal formulation, with its derivative.
        let lerp = |a: Vector2d, b: Vector2d, t0: f64, t1: f64| {
            let w = (time - t0) / (t1 - t0);
            (a * (1.0 - w) + b * w, (b - a) / (t1 - t0))
        };
        let pv = [p[0].to_vec(), p[1].to_vec(), p[2].to_vec(), p[3].to_vec()];

        let (a1, da1) = lerp(pv[0], pv[1], t[0], t[1]);
        let (a2, da2) = lerp(pv[1], pv[2], t[1], t[2]);
        let (a3, da3) = lerp(pv[2], pv[3], t[2], t[3]);

        let blend = |a: Vector2d, da: Vector2d, b: Vector2d, db: Vector2d, t0: f64, t1: f64| {
            let w = (time - t0) / (t1 - t0);
            let value = a * (1.0 - w) + b * w;
            let deriv = (b - a) / (t1 - t0) + da * (1.0 - w) + db * w;
            (value, deriv)
        };
        let (b1, db1) = blend(a1, da1, a2, da2, t[0], t[2]);
        let (b2, db2) = blend(a2, da2, a3, da3, t[1], t[3]);
        let (c, dc) = blend(b1, db1, b2, db2, t[1], t[2]);

        (Point2d::from_vec(c), dc * (t[2] - t[1]))
    }
}

impl ParametricCurve2d for CatmullRom {
    fn sample(&self, t: f64) -> Point2d {
        self.evaluate(t).0
    }

    fn bounds(&self) -> Interval<f64> {
        Interval::new(0.0, self.segments() as f64)
    }

    fn sample_dt(&self, t: f64) -> Vector2d {
        self.evaluate(t).1
    }
}
