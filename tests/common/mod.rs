//! Road layouts and scene helpers shared by the integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use traffic_flow_core::{
    math::{GeoReference, Point2d, Point3d, Wgs84},
    road::SimpleRoadNetwork,
    LaneUid, Route, Simulation, SimulationConfig, VehicleAttributes,
};

pub const ORIGIN: Wgs84 = Wgs84::new(121.0, 31.0, 0.0);

/// An eastbound lane from x = 0 to x = 100.
pub const LANE_A: LaneUid = LaneUid::new(1, 0, -1);
/// An eastbound lane from x = 110 to x = 300.
pub const LANE_B: LaneUid = LaneUid::new(2, 0, -1);
/// The link joining [LANE_A] to [LANE_B].
pub const LINK: u64 = 7;

/// The geodetic position of a point in the local frame.
pub fn at(x: f64, y: f64) -> Wgs84 {
    GeoReference::new(ORIGIN).to_wgs84(Point3d::new(x, y, 0.0))
}

pub fn network() -> SimpleRoadNetwork {
    SimpleRoadNetwork::new(GeoReference::new(ORIGIN))
}

/// Two lanes joined by a lane-link.
pub fn two_lanes() -> SimpleRoadNetwork {
    let road = network();
    road.add_lane(LANE_A, [Point2d::new(0.0, 0.0), Point2d::new(100.0, 0.0)])
        .unwrap();
    road.add_lane(LANE_B, [Point2d::new(110.0, 0.0), Point2d::new(300.0, 0.0)])
        .unwrap();
    road.add_link(LINK, LANE_A, LANE_B, None).unwrap();
    road
}

pub fn simulation(road: SimpleRoadNetwork) -> Simulation {
    Simulation::new(SimulationConfig::default(), ORIGIN, Arc::new(road))
}

/// A sedan starting at `(x, y)` at a constant desired velocity.
pub fn vehicle(id: i64, x: f64, y: f64, velocity: f64) -> VehicleAttributes {
    VehicleAttributes {
        id,
        route: Route::at(at(x, y)),
        start_velocity: Some(velocity),
        ..Default::default()
    }
}
