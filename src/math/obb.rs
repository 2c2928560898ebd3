use super::{distance_to_segment, rot90, try_normalize, Point2d, Vector2d};
use crate::error::GeometryError;
use crate::util::Interval;
use cgmath::prelude::*;
use itertools::iproduct;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// An oriented bounding box, the collision footprint of an element.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct OrientedBox {
    center: Point2d,
    front: Vector2d,
    half_length: f64,
    half_width: f64,
}

impl OrientedBox {
    /// Creates a box from its centre, a front axis and its half extents.
    /// The front axis need not be normalised but must not be zero.
    pub fn new(
        center: Point2d,
        front: Vector2d,
        half_length: f64,
        half_width: f64,
    ) -> Result<Self, GeometryError> {
        let front = try_normalize(front).ok_or(GeometryError::ZeroDirection)?;
        let valid = |x: f64| x.is_finite() && x >= 0.0;
        if !valid(half_length) || !valid(half_width) {
            return Err(GeometryError::InvalidExtents {
                length: 2.0 * half_length,
                width: 2.0 * half_width,
            });
        }
        Ok(Self {
            center,
            front,
            half_length,
            half_width,
        })
    }

    pub fn center(&self) -> Point2d {
        self.center
    }

    /// The unit front axis.
    pub fn front(&self) -> Vector2d {
        self.front
    }

    /// The unit axis pointing to the box's left.
    pub fn left(&self) -> Vector2d {
        rot90(self.front)
    }

    pub fn half_length(&self) -> f64 {
        self.half_length
    }

    pub fn half_width(&self) -> f64 {
        self.half_width
    }

    /// The corners in anticlockwise order: rear-right, front-right, front-left, rear-left.
    pub fn vertices(&self) -> [Point2d; 4] {
        let f = self.front * self.half_length;
        let l = self.left() * self.half_width;
        [
            self.center - f - l,
            self.center + f - l,
            self.center + f + l,
            self.center - f + l,
        ]
    }

    /// The extent of the box projected onto an axis.
    pub fn project(&self, axis: Vector2d) -> Interval<f64> {
        let c = self.center.to_vec().dot(axis);
        let r = self.half_length * self.front.dot(axis).abs()
            + self.half_width * self.left().dot(axis).abs();
        Interval::new(c - r, c + r)
    }

    /// The axis-aligned bounds as `(min, max)` corners.
    pub fn envelope(&self) -> (Point2d, Point2d) {
        let vertices = self.vertices();
        let fold = |f: fn(f64, f64) -> f64, init: f64, axis: fn(&Point2d) -> f64| {
            vertices.iter().map(axis).fold(init, f)
        };
        (
            Point2d::new(
                fold(f64::min, f64::INFINITY, |p| p.x),
                fold(f64::min, f64::INFINITY, |p| p.y),
            ),
            Point2d::new(
                fold(f64::max, f64::NEG_INFINITY, |p| p.x),
                fold(f64::max, f64::NEG_INFINITY, |p| p.y),
            ),
        )
    }

    /// True if the boxes share interior area. Boxes that only touch do not overlap.
    pub fn overlaps(&self, other: &Self) -> bool {
        [self.front, self.left(), other.front, other.left()]
            .iter()
            .all(|axis| self.project(*axis).overlaps(&other.project(*axis)))
    }

    /// True if the point lies inside or on the box.
    pub fn contains(&self, point: Point2d) -> bool {
        let d = point - self.center;
        d.dot(self.front).abs() <= self.half_length && d.dot(self.left()).abs() <= self.half_width
    }

    /// The smallest distance between the two boxes' outlines, or zero if they overlap.
    pub fn distance_to(&self, other: &Self) -> f64 {
        if self.overlaps(other) {
            return 0.0;
        }
        let (a, b) = (self.vertices(), other.vertices());
        let from_a = iproduct!(0..4, 0..4)
            .map(|(i, j)| distance_to_segment(a[i], b[j], b[(j + 1) % 4]));
        let from_b = iproduct!(0..4, 0..4)
            .map(|(i, j)| distance_to_segment(b[i], a[j], a[(j + 1) % 4]));
        from_a.chain(from_b).fold(f64::INFINITY, f64::min)
    }
}
