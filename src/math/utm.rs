//! Universal Transverse Mercator projection on the WGS84 ellipsoid.

use super::geo::{WGS84_A, WGS84_E2};
use super::Wgs84;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Scale factor on the central meridian.
const K0: f64 = 0.9996;

/// Easting of the central meridian.
const FALSE_EASTING: f64 = 500_000.0; // m

/// Northing added in the southern hemisphere.
const FALSE_NORTHING_SOUTH: f64 = 10_000_000.0; // m

/// A position in UTM grid coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Utm {
    pub zone: u8,
    pub north: bool,
    pub easting: f64,
    pub northing: f64,
}

/// The UTM zone containing a longitude.
pub fn zone_of(lon: f64) -> u8 {
    ((lon + 186.0) / 6.0).floor().clamp(1.0, 60.0) as u8
}

fn central_meridian(zone: u8) -> f64 {
    (f64::from(zone) - 1.0) * 6.0 - 180.0 + 3.0
}

/// Meridian arc length coefficients.
fn meridian_coefficients() -> [f64; 4] {
    let e4 = WGS84_E2 * WGS84_E2;
    let e6 = e4 * WGS84_E2;
    [
        1.0 - WGS84_E2 / 4.0 - 3.0 * e4 / 64.0 - 5.0 * e6 / 256.0,
        3.0 * WGS84_E2 / 8.0 + 3.0 * e4 / 32.0 + 45.0 * e6 / 1024.0,
        15.0 * e4 / 256.0 + 45.0 * e6 / 1024.0,
        35.0 * e6 / 3072.0,
    ]
}

impl Utm {
    /// Projects a geodetic position into its own zone.
    pub fn from_wgs84(pos: Wgs84) -> Self {
        let zone = zone_of(pos.lon);
        Self::from_wgs84_in_zone(pos, zone)
    }

    /// Projects a geodetic position into the given zone.
    pub fn from_wgs84_in_zone(pos: Wgs84, zone: u8) -> Self {
        let ep2 = WGS84_E2 / (1.0 - WGS84_E2);
        let lat = pos.lat.to_radians();
        let (sin_lat, cos_lat) = lat.sin_cos();
        let n = WGS84_A / (1.0 - WGS84_E2 * sin_lat * sin_lat).sqrt();
        let t = lat.tan().powi(2);
        let c = ep2 * cos_lat * cos_lat;
        let a = cos_lat * (pos.lon - central_meridian(zone)).to_radians();

        let [m0, m2, m4, m6] = meridian_coefficients();
        let m = WGS84_A
            * (m0 * lat - m2 * (2.0 * lat).sin() + m4 * (4.0 * lat).sin()
                - m6 * (6.0 * lat).sin());

        let easting = K0
            * n
            * (a + (1.0 - t + c) * a.powi(3) / 6.0
                + (5.0 - 18.0 * t + t * t + 72.0 * c - 58.0 * ep2) * a.powi(5) / 120.0)
            + FALSE_EASTING;
        let mut northing = K0
            * (m + n
                * lat.tan()
                * (a * a / 2.0
                    + (5.0 - t + 9.0 * c + 4.0 * c * c) * a.powi(4) / 24.0
                    + (61.0 - 58.0 * t + t * t + 600.0 * c - 330.0 * ep2) * a.powi(6) / 720.0));
        let north = pos.lat > 0.0;
        if !north {
            northing += FALSE_NORTHING_SOUTH;
        }
        Self {
            zone,
            north,
            easting,
            northing,
        }
    }

    /// Unprojects back to a geodetic position at zero altitude.
    pub fn to_wgs84(&self) -> Wgs84 {
        let ep2 = WGS84_E2 / (1.0 - WGS84_E2);
        let x = self.easting - FALSE_EASTING;
        let y = if self.north {
            self.northing
        } else {
            self.northing - FALSE_NORTHING_SOUTH
        };

        let [m0, ..] = meridian_coefficients();
        let mu = y / K0 / (WGS84_A * m0);
        let sqrt_1me2 = (1.0 - WGS84_E2).sqrt();
        let e1 = (1.0 - sqrt_1me2) / (1.0 + sqrt_1me2);
        let phi1 = mu
            + (3.0 * e1 / 2.0 - 27.0 * e1.powi(3) / 32.0) * (2.0 * mu).sin()
            + (21.0 * e1 * e1 / 16.0 - 55.0 * e1.powi(4) / 32.0) * (4.0 * mu).sin()
            + (151.0 * e1.powi(3) / 96.0) * (6.0 * mu).sin()
            + (1097.0 * e1.powi(4) / 512.0) * (8.0 * mu).sin();

        let (sin1, cos1) = phi1.sin_cos();
        let w = 1.0 - WGS84_E2 * sin1 * sin1;
        let n1 = WGS84_A / w.sqrt();
        let t1 = phi1.tan().powi(2);
        let c1 = ep2 * cos1 * cos1;
        let r1 = WGS84_A * (1.0 - WGS84_E2) / w.powf(1.5);
        let d = x / (n1 * K0);

        let lat = phi1
            - (n1 * phi1.tan() / r1)
                * (d * d / 2.0
                    - (5.0 + 3.0 * t1 + 10.0 * c1 - 4.0 * c1 * c1 - 9.0 * ep2) * d.powi(4) / 24.0
                    + (61.0 + 90.0 * t1 + 298.0 * c1 + 45.0 * t1 * t1 - 252.0 * ep2 - 3.0 * c1 * c1)
                        * d.powi(6)
                        / 720.0);
        let lon = (d - (1.0 + 2.0 * t1 + c1) * d.powi(3) / 6.0
            + (5.0 - 2.0 * c1 + 28.0 * t1 - 3.0 * c1 * c1 + 8.0 * ep2 + 24.0 * t1 * t1) * d.powi(5)
                / 120.0)
            / cos1;

        Wgs84::new(
            central_meridian(self.zone) + lon.to_degrees(),
            lat.to_degrees(),
            0.0,
        )
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn zones() {
        assert_eq!(zone_of(116.3), 50);
        assert_eq!(zone_of(-0.1), 30);
        assert_eq!(zone_of(3.0), 31);
    }

    #[test]
    fn central_meridian_has_false_easting() {
        let utm = Utm::from_wgs84(Wgs84::new(117.0, 40.0, 0.0));
        assert_eq!(utm.zone, 50);
        assert!(utm.north);
        assert_approx_eq!(utm.easting, FALSE_EASTING, 1e-6);
    }

    #[test]
    fn round_trip() {
        for &(lon, lat) in &[(116.3, 39.9), (121.47, 31.23), (-73.98, 40.75), (151.2, -33.86)] {
            let pos = Wgs84::new(lon, lat, 0.0);
            let back = Utm::from_wgs84(pos).to_wgs84();
            assert_approx_eq!(back.lon, lon, 1e-6);
            assert_approx_eq!(back.lat, lat, 1e-6);
        }
    }
}
