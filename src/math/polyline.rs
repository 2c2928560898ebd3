use super::{rot90, Point2d, Vector2d};
use crate::error::GeometryError;
use cgmath::prelude::*;
use itertools::Itertools;

/// Points closer than this to their predecessor are dropped.
const DUPLICATE_TOLERANCE: f64 = 1e-6; // m

/// An arc-length parameterised chain of line segments.
#[derive(Clone, Debug, PartialEq)]
pub struct Polyline {
    points: Vec<Point2d>,
    /// Distance from the first point to each point.
    stations: Vec<f64>,
}

/// The result of sampling a [Polyline].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PolylineSample {
    pub pos: Point2d,
    /// The unit tangent at `pos`.
    pub dir: Vector2d,
}

impl Polyline {
    /// Creates a polyline, dropping consecutive duplicate points.
    pub fn new(points: impl IntoIterator<Item = Point2d>) -> Result<Self, GeometryError> {
        let points = points
            .into_iter()
            .coalesce(|a, b| {
                if a.distance(b) < DUPLICATE_TOLERANCE {
                    Ok(a)
                } else {
                    Err((a, b))
                }
            })
            .collect::<Vec<_>>();
        if points.len() < 2 {
            return Err(GeometryError::DegeneratePolyline);
        }
        let mut stations = Vec::with_capacity(points.len());
        stations.push(0.0);
        for (a, b) in points.iter().tuple_windows() {
            let last = stations[stations.len() - 1];
            stations.push(last + a.distance(*b));
        }
        Ok(Self { points, stations })
    }

    /// The length of the polyline in m.
    pub fn length(&self) -> f64 {
        self.stations[self.stations.len() - 1]
    }

    pub fn points(&self) -> &[Point2d] {
        &self.points
    }

    /// Samples the polyline `s` metres from its start, clamped to its ends.
    pub fn sample(&self, s: f64) -> PolylineSample {
        let s = s.clamp(0.0, self.length());
        let idx = self.segment_at(s);
        let (a, b) = (self.points[idx], self.points[idx + 1]);
        let seg_len = self.stations[idx + 1] - self.stations[idx];
        let dir = (b - a) / seg_len;
        PolylineSample {
            pos: a + dir * (s - self.stations[idx]),
            dir,
        }
    }

    /// Projects a point onto the polyline, returning its distance along
    /// the polyline and its signed offset, positive to the left.
    pub fn project(&self, point: Point2d) -> (f64, f64) {
        let mut best = (f64::INFINITY, 0.0, 0.0);
        for (idx, (a, b)) in self.points.iter().tuple_windows().enumerate() {
            let seg = *b - *a;
            let seg_len = self.stations[idx + 1] - self.stations[idx];
            let dir = seg / seg_len;
            let along = (point - *a).dot(dir).clamp(0.0, seg_len);
            let foot = *a + dir * along;
            let dist = point.distance(foot);
            if dist < best.0 {
                let offset = (point - foot).dot(rot90(dir));
                best = (dist, self.stations[idx] + along, offset);
            }
        }
        (best.1, best.2)
    }

    /// Index of the segment containing station `s`.
    fn segment_at(&self, s: f64) -> usize {
        let idx = self.stations.partition_point(|station| *station <= s);
        idx.clamp(1, self.points.len() - 1) - 1
    }
}
