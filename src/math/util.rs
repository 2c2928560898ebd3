use super::{Point2d, Vector2d, Vector3d};
use cgmath::prelude::*;
use cgmath::{Basis3, Deg, Rad};

/// Projects a point onto a local coordinate system.
///
/// # Parameters
/// * `point` - The point to project
/// * `origin` - The origin of the coordinate system
/// * `x_axis` - The basis vector pointing in the positive x-axis.
/// * `y_axis` - The basis vector pointing in the positive y-axis.
pub fn project_local(
    point: Point2d,
    origin: Point2d,
    x_axis: Vector2d,
    y_axis: Vector2d,
) -> Point2d {
    let point = point - origin;
    Point2d::new(point.dot(x_axis), point.dot(y_axis))
}

/// Rotates a vector 90 degrees anticlockwise.
pub fn rot90(vec: Vector2d) -> Vector2d {
    Vector2d::new(-vec.y, vec.x)
}

/// Rotates a vector anticlockwise by a signed angle in radians.
pub fn rotate(vec: Vector2d, angle: f64) -> Vector2d {
    let (sin, cos) = angle.sin_cos();
    Vector2d::new(cos * vec.x - sin * vec.y, sin * vec.x + cos * vec.y)
}

/// Rotates a vector anticlockwise by a signed angle in degrees.
pub fn rotate_deg(vec: Vector2d, degrees: f64) -> Vector2d {
    rotate(vec, Rad::from(Deg(degrees)).0)
}

/// Rotates a 3D vector about `axis` by a signed angle in radians,
/// following the right-hand rule.
pub fn rotate_about(vec: Vector3d, axis: Vector3d, angle: f64) -> Vector3d {
    if axis.magnitude2() == 0.0 {
        return vec;
    }
    Basis3::from_axis_angle(axis.normalize(), Rad(angle)).rotate_vector(vec)
}

/// The heading of a direction vector in radians, anticlockwise from east.
pub fn heading_of(dir: Vector2d) -> f64 {
    dir.y.atan2(dir.x)
}

/// Drops the up component of an east-north-up vector.
pub fn flatten(vec: Vector3d) -> Vector2d {
    Vector2d::new(vec.x, vec.y)
}

/// Normalises a vector, returning `None` if it has (near) zero length.
pub fn try_normalize(vec: Vector2d) -> Option<Vector2d> {
    let mag = vec.magnitude();
    (mag > 1e-12).then(|| vec / mag)
}

/// The distance from a point to a line segment.
pub fn distance_to_segment(point: Point2d, a: Point2d, b: Point2d) -> f64 {
    let ab = b - a;
    let len2 = ab.magnitude2();
    if len2 == 0.0 {
        return point.distance(a);
    }
    let t = ((point - a).dot(ab) / len2).clamp(0.0, 1.0);
    point.distance(a + ab * t)
}
