//! The stable snapshot every element exposes to the others.

mod common;

use common::*;
use traffic_flow_core::{
    math::{OrientedBox, Point2d, Vector2d},
    ElementKind, ObstacleAttributes, PedestrianAttributes, Route, SimulationConsistency,
    VehicleAttributes,
};

#[test]
fn stable_state_matches_live_state_after_a_tick() {
    let mut sim = simulation(two_lanes());
    sim.add_vehicle(&vehicle(1, 10.0, 0.0, 10.0)).unwrap();
    sim.add_vehicle(&vehicle(2, 95.0, 0.0, 12.0)).unwrap();
    sim.add_pedestrian(&PedestrianAttributes {
        id: 1,
        route: Route {
            start: at(150.0, 1.0),
            mid_points: vec![at(160.0, 1.0)],
            end: Some(at(170.0, 1.0)),
        },
        ..Default::default()
    })
    .unwrap();
    sim.add_obstacle(&ObstacleAttributes {
        id: 1,
        route: Route::at(at(250.0, 0.0)),
        ..Default::default()
    })
    .unwrap();

    for _ in 0..50 {
        sim.step(0.1);
        for (_, element) in sim.iter() {
            let live = element.base().location().live();
            assert_eq!(element.stable_geom_center(), &live.geom_center);
            assert_eq!(element.stable_lane_info(), live.lane_info);
            assert_eq!(element.stable_heading(), live.heading);
            assert_eq!(
                element.stable_distance_along_curve(),
                live.distance_along_curve
            );
            assert_eq!(element.stable_velocity(), element.base().kinetics().velocity);
            assert_eq!(
                element.stable_polygon(),
                element.base().geometry().polygon()
            );
        }
    }
}

#[test]
fn obstacle_blocks_vehicle() {
    let road = network();
    road.add_lane(LANE_A, [Point2d::new(0.0, 0.0), Point2d::new(500.0, 0.0)])
        .unwrap();
    let mut sim = simulation(road);
    sim.add_obstacle(&ObstacleAttributes {
        id: 1,
        route: Route::at(at(100.0, 0.0)),
        ..Default::default()
    })
    .unwrap();
    sim.add_vehicle(&vehicle(1, 40.0, 0.0, 10.0)).unwrap();

    for _ in 0..300 {
        sim.step(0.1);
    }
    let veh = sim.output().vehicle(1).unwrap();
    // The obstacle is 1 m long.
    assert!(veh.s + 0.5 * veh.pose.length < 99.5);
    assert!(veh.velocity < 0.5);
    assert!(sim.output().obstacle(1).is_some());
}

#[test]
fn transparent_obstacle_is_ignored() {
    let road = network();
    road.add_lane(LANE_A, [Point2d::new(0.0, 0.0), Point2d::new(500.0, 0.0)])
        .unwrap();
    let mut sim = simulation(road);
    let crane = sim
        .add_obstacle(&ObstacleAttributes {
            id: 1,
            obstacle_type: "Port_Crane_001".into(),
            route: Route::at(at(100.0, 0.0)),
            ..Default::default()
        })
        .unwrap();
    sim.add_vehicle(&vehicle(1, 40.0, 0.0, 10.0)).unwrap();

    for _ in 0..100 {
        sim.step(0.1);
    }
    assert!(sim.output().vehicle(1).unwrap().s > 130.0);
    assert!(!sim.polygons().contains(crane));
    // Still reported.
    assert!(sim.output().obstacle(1).is_some());
}

#[test]
fn obstacle_heading_follows_lane() {
    let road = network();
    road.add_lane(LANE_A, [Point2d::new(0.0, 0.0), Point2d::new(0.0, 100.0)])
        .unwrap();
    let mut sim = simulation(road);
    sim.add_obstacle(&ObstacleAttributes {
        id: 1,
        route: Route::at(at(0.0, 50.0)),
        direction: 90.0,
        ..Default::default()
    })
    .unwrap();
    sim.add_obstacle(&ObstacleAttributes {
        id: 2,
        route: Route::at(at(0.0, 20.0)),
        start_angle: 0.0,
        ..Default::default()
    })
    .unwrap();
    let out = sim.step(0.1);
    // Lane heads north, turned a further quarter anticlockwise.
    assert!((out.obstacle(1).unwrap().pose.heading - std::f64::consts::PI).abs() < 1e-6);
    assert!(out.obstacle(2).unwrap().pose.heading.abs() < 1e-6);
}

#[test]
fn overlap_query_finds_footprints() {
    let mut sim = simulation(two_lanes());
    let a = sim.add_vehicle(&vehicle(1, 20.0, 0.0, 0.0)).unwrap();
    let b = sim.add_vehicle(&vehicle(2, 60.0, 0.0, 0.0)).unwrap();
    sim.step(0.1);

    let query = OrientedBox::new(Point2d::new(22.0, 0.5), Vector2d::unit_x(), 1.0, 1.0).unwrap();
    assert_eq!(sim.query_overlapping(&query), vec![a]);
    let wide = OrientedBox::new(Point2d::new(40.0, 0.0), Vector2d::unit_x(), 30.0, 2.0).unwrap();
    let mut found = sim.query_overlapping(&wide);
    found.sort();
    let mut expected = vec![a, b];
    expected.sort();
    assert_eq!(found, expected);
    assert_eq!(sim.find(ElementKind::Vehicle, 2), Some(b));
}

#[test]
fn small_query_inside_a_long_footprint() {
    let mut sim = simulation(two_lanes());
    let trailer = sim
        .add_vehicle(&VehicleAttributes {
            vehicle_type: "Trailer".into(),
            ..vehicle(1, 50.0, 0.0, 0.0)
        })
        .unwrap();
    sim.step(0.1);

    let query = OrientedBox::new(Point2d::new(53.0, 0.0), Vector2d::unit_x(), 0.5, 0.5).unwrap();
    assert_eq!(sim.query_overlapping(&query), vec![trailer]);
    let clear = OrientedBox::new(Point2d::new(57.0, 0.0), Vector2d::unit_x(), 0.5, 0.5).unwrap();
    assert!(sim.query_overlapping(&clear).is_empty());
}
