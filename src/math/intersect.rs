use super::Point2d;
use cgmath::prelude::*;
use itertools::Itertools;

/// Segments whose cross product falls below this fraction of the product of
/// their lengths are treated as parallel.
const PARALLEL_TOLERANCE: f64 = 1e-9;

/// Where two segments cross.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SegmentHit {
    /// The intersection point.
    pub point: Point2d,
    /// Distance from the start of the first segment to the intersection, in m.
    pub dist_a: f64,
    /// Distance from the start of the second segment to the intersection, in m.
    pub dist_b: f64,
}

/// Where a segment crosses a polyline.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PolylineHit {
    pub point: Point2d,
    /// Distance along the segment, in m.
    pub dist_segment: f64,
    /// Distance along the polyline, in m.
    pub dist_polyline: f64,
}

/// Intersects segment `a0 -> a1` with segment `b0 -> b1`.
///
/// Parallel, collinear and zero-length segments never intersect.
pub fn intersect_segments(a0: Point2d, a1: Point2d, b0: Point2d, b1: Point2d) -> Option<SegmentHit> {
    let r = a1 - a0;
    let s = b1 - b0;
    let denom = r.perp_dot(s);
    if denom.abs() <= PARALLEL_TOLERANCE * r.magnitude() * s.magnitude() {
        return None;
    }
    let qp = b0 - a0;
    let t = qp.perp_dot(s) / denom;
    let u = qp.perp_dot(r) / denom;
    if !(0.0..=1.0).contains(&t) || !(0.0..=1.0).contains(&u) {
        return None;
    }
    Some(SegmentHit {
        point: a0 + r * t,
        dist_a: t * r.magnitude(),
        dist_b: u * s.magnitude(),
    })
}

/// Intersects a segment with a polyline, returning the crossing
/// nearest the start of the polyline.
pub fn intersect_segment_polyline(a0: Point2d, a1: Point2d, polyline: &[Point2d]) -> Option<PolylineHit> {
    let mut travelled = 0.0;
    for (p0, p1) in polyline.iter().tuple_windows() {
        if let Some(hit) = intersect_segments(a0, a1, *p0, *p1) {
            return Some(PolylineHit {
                point: hit.point,
                dist_segment: hit.dist_a,
                dist_polyline: travelled + hit.dist_b,
            });
        }
        travelled += p0.distance(*p1);
    }
    None
}

#[cfg(test)]
mod test {
    use super::*;
    use assert_approx_eq::assert_approx_eq;
    use rand::{Rng, SeedableRng};

    #[test]
    fn crossing() {
        let hit = intersect_segments(
            Point2d::new(0.0, 0.0),
            Point2d::new(10.0, 0.0),
            Point2d::new(4.0, -3.0),
            Point2d::new(4.0, 1.0),
        )
        .unwrap();
        assert_approx_eq!(hit.point.x, 4.0);
        assert_approx_eq!(hit.point.y, 0.0);
        assert_approx_eq!(hit.dist_a, 4.0);
        assert_approx_eq!(hit.dist_b, 3.0);
    }

    #[test]
    fn parallel_and_degenerate() {
        let a0 = Point2d::new(0.0, 0.0);
        let a1 = Point2d::new(10.0, 0.0);
        assert!(intersect_segments(a0, a1, Point2d::new(0.0, 1.0), Point2d::new(10.0, 1.0)).is_none());
        assert!(intersect_segments(a0, a1, Point2d::new(2.0, 0.0), Point2d::new(8.0, 0.0)).is_none());
        assert!(intersect_segments(a0, a1, Point2d::new(3.0, 0.0), Point2d::new(3.0, 0.0)).is_none());
        assert!(intersect_segments(a0, a1, Point2d::new(12.0, -1.0), Point2d::new(12.0, 1.0)).is_none());
    }

    #[test]
    fn symmetry() {
        let mut rng = rand::rngs::StdRng::from_seed(*b"Vegemite sandwhich is not fun...");
        let mut hits = 0;
        for _i in 0..200 {
            let mut p = || Point2d::new(rng.gen_range(-50.0..50.0), rng.gen_range(-50.0..50.0));
            let (a0, a1, b0, b1) = (p(), p(), p(), p());
            let ab = intersect_segments(a0, a1, b0, b1);
            let ba = intersect_segments(b0, b1, a0, a1);
            assert_eq!(ab.is_some(), ba.is_some());
            if let (Some(ab), Some(ba)) = (ab, ba) {
                hits += 1;
                assert_approx_eq!(ab.point.x, ba.point.x, 1e-6);
                assert_approx_eq!(ab.point.y, ba.point.y, 1e-6);
                assert_approx_eq!(ab.dist_a, ba.dist_b, 1e-6);
                assert_approx_eq!(ab.dist_b, ba.dist_a, 1e-6);
            }
        }
        assert!(hits > 0);
    }

    #[test]
    fn polyline() {
        let line = [
            Point2d::new(0.0, 0.0),
            Point2d::new(10.0, 0.0),
            Point2d::new(10.0, 10.0),
        ];
        let hit = intersect_segment_polyline(Point2d::new(5.0, 5.0), Point2d::new(15.0, 5.0), &line).unwrap();
        assert_approx_eq!(hit.point.x, 10.0);
        assert_approx_eq!(hit.dist_segment, 5.0);
        assert_approx_eq!(hit.dist_polyline, 15.0);
        assert!(intersect_segment_polyline(Point2d::new(-5.0, 5.0), Point2d::new(5.0, 5.0), &line).is_none());
    }
}
