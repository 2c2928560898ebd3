//! Tests that involve vehicles driving along a few connected lanes.

mod common;

use assert_approx_eq::assert_approx_eq;
use common::*;
use traffic_flow_core::{
    math::Point2d, AccEndCondition, ElementEvent, ElementKind, LaneInfo, LifeCycleState,
    VehicleAttributes,
};

/// Test that a vehicle's position increases monotonically.
#[test]
fn vehicle_drives_forward() {
    let road = network();
    road.add_lane(LANE_A, [Point2d::new(0.0, 0.0), Point2d::new(500.0, 0.0)])
        .unwrap();
    let mut sim = simulation(road);
    sim.add_vehicle(&vehicle(1, 10.0, 0.0, 10.0)).unwrap();

    let mut s = sim.step(0.1).vehicle(1).unwrap().s;
    for _ in 0..100 {
        let out = sim.step(0.1).vehicle(1).unwrap().clone();
        assert!(out.s > s);
        assert_eq!(out.lane, LaneInfo::Lane(LANE_A));
        assert_approx_eq!(out.velocity, 10.0);
        s = out.s;
    }
    assert_approx_eq!(s, 111.0, 1e-3);
}

#[test]
fn vehicle_transfers_through_link() {
    let mut sim = simulation(two_lanes());
    sim.add_vehicle(&vehicle(1, 90.0, 0.0, 10.0)).unwrap();

    let mut lanes = vec![];
    for _ in 0..50 {
        let lane = sim.step(0.1).vehicle(1).unwrap().lane;
        if lanes.last() != Some(&lane) {
            lanes.push(lane);
        }
    }
    assert_eq!(
        lanes,
        vec![
            LaneInfo::Lane(LANE_A),
            LaneInfo::Link {
                id: LINK,
                from: LANE_A,
                to: LANE_B
            },
            LaneInfo::Lane(LANE_B),
        ]
    );
    // 10 m left on the first lane, 10 m of link.
    assert_approx_eq!(sim.output().vehicle(1).unwrap().s, 30.0, 1e-3);
}

#[test]
fn vehicle_stops_at_dead_end() {
    let mut sim = simulation(two_lanes());
    let id = sim.add_vehicle(&vehicle(1, 280.0, 0.0, 10.0)).unwrap();
    for _ in 0..30 {
        sim.step(0.1);
    }
    let out = sim.output().vehicle(1).unwrap();
    assert_approx_eq!(out.s, 190.0, 1e-6);
    assert_eq!(out.velocity, 0.0);
    let element = sim.get(id).unwrap();
    assert_eq!(element.base().life().state(), LifeCycleState::Stopped);

    // A stopped vehicle still blocks others.
    sim.step(0.1);
    assert!(sim.polygons().contains(id));
}

#[test]
fn terminating_vehicle_leaves_at_dead_end() {
    let mut sim = simulation(two_lanes());
    let id = sim
        .add_vehicle(&VehicleAttributes {
            terminate_on_stop: true,
            ..vehicle(1, 280.0, 0.0, 10.0)
        })
        .unwrap();
    for _ in 0..30 {
        sim.step(0.1);
    }
    assert!(sim.output().vehicle(1).is_none());
    assert!(sim.get(id).is_none());
    assert_eq!(sim.find(ElementKind::Vehicle, 1), None);
    assert!(!sim.polygons().contains(id));
    assert!(sim.lanes().is_empty());
}

#[test]
fn follower_keeps_its_distance() {
    let road = network();
    road.add_lane(LANE_A, [Point2d::new(0.0, 0.0), Point2d::new(1000.0, 0.0)])
        .unwrap();
    let mut sim = simulation(road);
    sim.add_vehicle(&vehicle(1, 60.0, 0.0, 5.0)).unwrap();
    sim.add_vehicle(&vehicle(2, 10.0, 0.0, 15.0)).unwrap();

    for _ in 0..300 {
        let out = sim.step(0.1);
        let leader = out.vehicle(1).unwrap();
        let follower = out.vehicle(2).unwrap();
        assert!(leader.s - follower.s > leader.pose.length);
    }
    let out = sim.output();
    assert!(out.vehicle(2).unwrap().velocity < 8.0);
    assert_approx_eq!(out.vehicle(1).unwrap().velocity, 5.0);
}

#[test]
fn start_time_delays_vehicle() {
    let mut sim = simulation(two_lanes());
    let id = sim
        .add_vehicle(&VehicleAttributes {
            start_time: 1.0,
            ..vehicle(1, 10.0, 0.0, 10.0)
        })
        .unwrap();
    assert_eq!(
        sim.get(id).unwrap().base().life().state(),
        LifeCycleState::Pending
    );
    for _ in 0..5 {
        assert!(sim.step(0.1).vehicle(1).is_none());
    }
    for _ in 0..10 {
        sim.step(0.1);
    }
    assert!(sim.output().vehicle(1).is_some());
    assert_eq!(sim.find(ElementKind::Vehicle, 1), Some(id));
}

#[test]
fn acceleration_event_overrides_plan() {
    let road = network();
    road.add_lane(LANE_A, [Point2d::new(0.0, 0.0), Point2d::new(500.0, 0.0)])
        .unwrap();
    let mut sim = simulation(road);
    let id = sim.add_vehicle(&vehicle(1, 10.0, 0.0, 10.0)).unwrap();
    assert!(sim
        .handle_event(
            id,
            ElementEvent::Acceleration {
                acceleration: -2.0,
                end: AccEndCondition::Time(2.0),
            },
        )
        .unwrap());
    for _ in 0..10 {
        sim.step(0.1);
    }
    assert_approx_eq!(sim.output().vehicle(1).unwrap().velocity, 8.0, 1e-6);
    for _ in 0..20 {
        sim.step(0.1);
    }
    // The event has ended and the vehicle recovers towards its desired velocity.
    assert!(sim.output().vehicle(1).unwrap().velocity > 6.0);
    assert!(sim.output().vehicle(1).unwrap().acceleration > 0.0);
}

#[test]
fn commanded_braking_is_limited() {
    let road = network();
    road.add_lane(LANE_A, [Point2d::new(0.0, 0.0), Point2d::new(500.0, 0.0)])
        .unwrap();
    let mut sim = simulation(road);
    let id = sim
        .add_vehicle(&VehicleAttributes {
            max_deceleration: 8.0,
            ..vehicle(1, 10.0, 0.0, 20.0)
        })
        .unwrap();
    sim.handle_event(
        id,
        ElementEvent::Acceleration {
            acceleration: -50.0,
            end: AccEndCondition::Time(5.0),
        },
    )
    .unwrap();
    sim.step(0.1);
    let out = sim.output().vehicle(1).unwrap();
    assert_approx_eq!(out.acceleration, -8.0, 1e-9);
    assert_approx_eq!(out.velocity, 19.2, 1e-9);
}
