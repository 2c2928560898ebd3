//! Geodetic (WGS84) and local east-north-up coordinates.

use super::{Point3d, Vector3d};
use cgmath::prelude::*;
use cgmath::Matrix3;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Semi-major axis of the WGS84 ellipsoid.
pub(super) const WGS84_A: f64 = 6378137.0; // m

/// First eccentricity squared of the WGS84 ellipsoid.
pub(super) const WGS84_E2: f64 = 0.0066943799013;

/// Latitude iteration stops once successive estimates differ by less than this.
const LATITUDE_TOLERANCE: f64 = 1e-12; // rad

/// A geodetic position.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Wgs84 {
    /// Longitude in degrees.
    pub lon: f64,
    /// Latitude in degrees.
    pub lat: f64,
    /// Altitude above the ellipsoid in m.
    pub alt: f64,
}

impl Wgs84 {
    pub const fn new(lon: f64, lat: f64, alt: f64) -> Self {
        Self { lon, lat, alt }
    }

    /// Converts to earth-centred, earth-fixed cartesian coordinates.
    pub fn to_ecef(&self) -> Vector3d {
        let (sin_lat, cos_lat) = self.lat.to_radians().sin_cos();
        let (sin_lon, cos_lon) = self.lon.to_radians().sin_cos();
        let n = prime_vertical_radius(sin_lat);
        Vector3d::new(
            (n + self.alt) * cos_lat * cos_lon,
            (n + self.alt) * cos_lat * sin_lon,
            ((1.0 - WGS84_E2) * n + self.alt) * sin_lat,
        )
    }

    /// Converts from earth-centred, earth-fixed cartesian coordinates.
    pub fn from_ecef(ecef: Vector3d) -> Self {
        let p = ecef.x.hypot(ecef.y);
        let lon = ecef.y.atan2(ecef.x);
        let mut lat = ecef.z.atan2(p * (1.0 - WGS84_E2));
        for _ in 0..16 {
            let n = prime_vertical_radius(lat.sin());
            let next = (ecef.z + WGS84_E2 * n * lat.sin()).atan2(p);
            let done = (next - lat).abs() < LATITUDE_TOLERANCE;
            lat = next;
            if done {
                break;
            }
        }
        let (sin_lat, cos_lat) = lat.sin_cos();
        let n = prime_vertical_radius(sin_lat);
        let alt = p * cos_lat + ecef.z * sin_lat - WGS84_A * WGS84_A / n;
        Self {
            lon: lon.to_degrees(),
            lat: lat.to_degrees(),
            alt,
        }
    }
}

fn prime_vertical_radius(sin_lat: f64) -> f64 {
    WGS84_A / (1.0 - WGS84_E2 * sin_lat * sin_lat).sqrt()
}

/// The tangent-plane frame of a simulation run.
///
/// Computed once from the run's reference origin and shared by every conversion.
#[derive(Clone, Debug, PartialEq)]
pub struct GeoReference {
    origin: Wgs84,
    origin_ecef: Vector3d,
    ecef_to_enu: Matrix3<f64>,
}

impl GeoReference {
    pub fn new(origin: Wgs84) -> Self {
        let (sin_lat, cos_lat) = origin.lat.to_radians().sin_cos();
        let (sin_lon, cos_lon) = origin.lon.to_radians().sin_cos();
        let east = Vector3d::new(-sin_lon, cos_lon, 0.0);
        let north = Vector3d::new(-sin_lat * cos_lon, -sin_lat * sin_lon, cos_lat);
        let up = Vector3d::new(cos_lat * cos_lon, cos_lat * sin_lon, sin_lat);
        // Rows are the local axes expressed in ECEF.
        let ecef_to_enu = Matrix3::from_cols(east, north, up).transpose();
        Self {
            origin,
            origin_ecef: origin.to_ecef(),
            ecef_to_enu,
        }
    }

    pub fn origin(&self) -> Wgs84 {
        self.origin
    }

    /// Converts a geodetic position to the local frame.
    pub fn to_enu(&self, pos: Wgs84) -> Point3d {
        Point3d::from_vec(self.ecef_to_enu * (pos.to_ecef() - self.origin_ecef))
    }

    /// Converts a local position back to geodetic coordinates.
    pub fn to_wgs84(&self, enu: Point3d) -> Wgs84 {
        let ecef = self.ecef_to_enu.transpose() * enu.to_vec() + self.origin_ecef;
        Wgs84::from_ecef(ecef)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use assert_approx_eq::assert_approx_eq;
    use rand::{Rng, SeedableRng};

    #[test]
    fn origin_maps_to_zero() {
        let geo = GeoReference::new(Wgs84::new(121.2, 31.1, 12.0));
        let enu = geo.to_enu(geo.origin());
        assert_approx_eq!(enu.x, 0.0, 1e-6);
        assert_approx_eq!(enu.y, 0.0, 1e-6);
        assert_approx_eq!(enu.z, 0.0, 1e-6);
    }

    #[test]
    fn axes_point_east_and_north() {
        let geo = GeoReference::new(Wgs84::new(121.2, 31.1, 0.0));
        let east = geo.to_enu(Wgs84::new(121.2001, 31.1, 0.0));
        assert!(east.x > 9.0);
        assert_approx_eq!(east.y, 0.0, 0.01);
        let north = geo.to_enu(Wgs84::new(121.2, 31.1001, 0.0));
        assert!(north.y > 11.0);
        assert_approx_eq!(north.x, 0.0, 0.01);
    }

    #[test]
    fn round_trip() {
        let mut rng = rand::rngs::StdRng::from_seed(*b"Vegemite sandwhich is not fun...");
        for _i in 0..100 {
            let origin = Wgs84::new(
                rng.gen_range(-179.0..179.0),
                rng.gen_range(-80.0..80.0),
                rng.gen_range(-10.0..100.0),
            );
            let geo = GeoReference::new(origin);
            let pos = Wgs84::new(
                origin.lon + rng.gen_range(-0.05..0.05),
                origin.lat + rng.gen_range(-0.05..0.05),
                origin.alt + rng.gen_range(-5.0..5.0),
            );
            let back = geo.to_wgs84(geo.to_enu(pos));
            assert_approx_eq!(back.lon, pos.lon, 1e-6);
            assert_approx_eq!(back.lat, pos.lat, 1e-6);
            assert_approx_eq!(back.alt, pos.alt, 1e-3);
        }
    }
}
