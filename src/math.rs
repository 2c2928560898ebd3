//! Mathematical structs and functions.

use cgmath::{Point2, Point3, Vector2, Vector3};
pub use catmull_rom::CatmullRom;
pub use coord::Coord;
pub use curve::{subdivided_points_along_curve, ParametricCurve2d};
pub use geo::{GeoReference, Wgs84};
pub use intersect::{intersect_segment_polyline, intersect_segments, PolylineHit, SegmentHit};
pub use obb::OrientedBox;
pub use polyline::{Polyline, PolylineSample};
pub use utm::Utm;
pub use util::*;

mod catmull_rom;
mod coord;
mod curve;
mod geo;
mod intersect;
mod obb;
mod polyline;
mod utm;
mod util;

/// A 2D point
pub type Point2d = Point2<f64>;

/// A 2D vector
pub type Vector2d = Vector2<f64>;

/// A 3D point, usually in the local east-north-up frame.
pub type Point3d = Point3<f64>;

/// A 3D vector
pub type Vector3d = Vector3<f64>;
