//! Forward-collision metrics relative to a reference vehicle.

mod common;

use assert_approx_eq::assert_approx_eq;
use common::*;
use traffic_flow_core::{
    math::Point2d, AccEndCondition, ElementEvent, ElementId, FcwState, LaneUid, Simulation,
    FCW_UNDEFINED,
};

/// An eastbound lane, a westbound lane beside it and a northbound lane crossing both.
fn crossroads() -> Simulation {
    let road = network();
    road.add_lane(LANE_A, [Point2d::new(0.0, 0.0), Point2d::new(500.0, 0.0)])
        .unwrap();
    road.add_lane(
        LaneUid::new(1, 0, 1),
        [Point2d::new(500.0, 5.0), Point2d::new(0.0, 5.0)],
    )
    .unwrap();
    road.add_lane(
        LaneUid::new(3, 0, -1),
        [Point2d::new(80.0, -50.0), Point2d::new(80.0, 100.0)],
    )
    .unwrap();
    simulation(road)
}

/// A sedan held still at `x` on the eastbound lane.
fn parked(sim: &mut Simulation, id: i64, x: f64) -> ElementId {
    let id = sim.add_vehicle(&vehicle(id, x, 0.0, 0.0)).unwrap();
    sim.handle_event(
        id,
        ElementEvent::Acceleration {
            acceleration: 0.0,
            end: AccEndCondition::Time(60.0),
        },
    )
    .unwrap();
    id
}

#[test]
fn stationary_vehicles_fifty_metres_apart() {
    // Sedans are 4.5 m long, so the footprints are 50 m apart.
    for (ref_x, veh_x, state, sign) in [
        (10.0, 64.5, FcwState::EgoInBack, 1.0),
        (64.5, 10.0, FcwState::EgoInFront, -1.0),
    ] {
        let mut sim = crossroads();
        let reference = parked(&mut sim, 1, ref_x);
        parked(&mut sim, 2, veh_x);
        sim.set_fcw_reference(Some(reference)).unwrap();
        sim.step(0.1);

        let fcw = sim.output().vehicle(2).unwrap().fcw.unwrap();
        assert_eq!(fcw.state, state);
        assert_approx_eq!(fcw.longitudinal_distance, sign * 50.0, 1e-3);
        assert_approx_eq!(fcw.euclidean_distance, 50.0, 1e-3);
        assert_eq!(fcw.ttc, FCW_UNDEFINED);
        assert_eq!(fcw.thw, FCW_UNDEFINED);
        assert_eq!(fcw.ttc_euclidean, FCW_UNDEFINED);
        assert_eq!(fcw.thw_euclidean, FCW_UNDEFINED);
        assert_eq!(fcw.ego_velocity, 0.0);
        assert_eq!(fcw.vehicle_velocity, 0.0);
    }
}

#[test]
fn vehicle_ahead_on_same_lane() {
    let mut sim = crossroads();
    let reference = sim.add_vehicle(&vehicle(1, 10.0, 0.0, 10.0)).unwrap();
    let ahead = sim.add_vehicle(&vehicle(2, 60.0, 0.0, 5.0)).unwrap();
    sim.set_fcw_reference(Some(reference)).unwrap();
    sim.step(0.1);

    let fcw = sim.output().vehicle(2).unwrap().fcw.unwrap();
    assert_eq!(fcw.state, FcwState::EgoInBack);
    assert!(fcw.longitudinal_distance > 40.0 && fcw.longitudinal_distance < 50.0);
    assert_approx_eq!(fcw.euclidean_distance, fcw.longitudinal_distance, 1e-6);
    // Closing at about 5 m/s, the reference driving at about 10 m/s.
    assert!(fcw.ttc > 8.0 && fcw.ttc < 10.0);
    assert!(fcw.thw > 4.0 && fcw.thw < 5.0);
    assert_approx_eq!(fcw.ttc_euclidean, fcw.ttc, 1e-6);
    assert_approx_eq!(fcw.thw_euclidean, fcw.thw, 1e-6);
    assert!(fcw.ego_velocity > fcw.vehicle_velocity);

    // The reference has no metrics against itself.
    assert!(sim.output().vehicle(1).unwrap().fcw.is_none());
    assert!(sim.get(ahead).unwrap().as_vehicle().unwrap().fcw().is_some());
}

#[test]
fn vehicle_behind_reference() {
    let mut sim = crossroads();
    let reference = sim.add_vehicle(&vehicle(1, 60.0, 0.0, 10.0)).unwrap();
    sim.add_vehicle(&vehicle(2, 20.0, 0.0, 10.0)).unwrap();
    sim.set_fcw_reference(Some(reference)).unwrap();
    sim.step(0.1);

    let fcw = sim.output().vehicle(2).unwrap().fcw.unwrap();
    assert_eq!(fcw.state, FcwState::EgoInFront);
    assert!(fcw.longitudinal_distance < 0.0);
    // Same velocity, never closing.
    assert_eq!(fcw.ttc, FCW_UNDEFINED);
    assert!(fcw.thw > 0.0);
}

#[test]
fn opposite_lane_has_no_relationship() {
    let mut sim = crossroads();
    let reference = sim.add_vehicle(&vehicle(1, 10.0, 0.0, 10.0)).unwrap();
    sim.add_vehicle(&vehicle(2, 40.0, 5.0, 10.0)).unwrap();
    sim.set_fcw_reference(Some(reference)).unwrap();
    sim.step(0.1);

    let fcw = sim.output().vehicle(2).unwrap().fcw.unwrap();
    assert_eq!(fcw.state, FcwState::NoRelationship);
    assert_eq!(fcw.longitudinal_distance, FCW_UNDEFINED);
    assert_eq!(fcw.ttc, FCW_UNDEFINED);
    assert_eq!(fcw.ttc_euclidean, FCW_UNDEFINED);
    assert_eq!(fcw.ego_velocity, FCW_UNDEFINED);
    assert_eq!(fcw.vehicle_velocity, FCW_UNDEFINED);
}

#[test]
fn crossing_lane_counts_as_compatible() {
    let mut sim = crossroads();
    let reference = sim.add_vehicle(&vehicle(1, 10.0, 0.0, 0.0)).unwrap();
    sim.add_vehicle(&vehicle(2, 80.0, 30.0, 0.0)).unwrap();
    sim.set_fcw_reference(Some(reference)).unwrap();
    sim.step(0.1);

    let fcw = sim.output().vehicle(2).unwrap().fcw.unwrap();
    assert_eq!(fcw.state, FcwState::EgoInBack);
    // Neither moves.
    assert_eq!(fcw.ttc, FCW_UNDEFINED);
    assert_eq!(fcw.thw, FCW_UNDEFINED);
}

#[test]
fn distant_vehicle_has_no_relationship() {
    let mut sim = crossroads();
    let reference = sim.add_vehicle(&vehicle(1, 10.0, 0.0, 0.0)).unwrap();
    sim.add_vehicle(&vehicle(2, 300.0, 0.0, 0.0)).unwrap();
    sim.set_fcw_reference(Some(reference)).unwrap();
    sim.step(0.1);
    let fcw = sim.output().vehicle(2).unwrap().fcw.unwrap();
    assert_eq!(fcw.state, FcwState::NoRelationship);
}

#[test]
fn overlapping_vehicles() {
    let mut sim = crossroads();
    let reference = sim.add_vehicle(&vehicle(1, 30.0, 0.0, 0.0)).unwrap();
    sim.add_vehicle(&vehicle(2, 32.0, 0.0, 0.0)).unwrap();
    sim.set_fcw_reference(Some(reference)).unwrap();
    sim.step(0.1);
    let fcw = sim.output().vehicle(2).unwrap().fcw.unwrap();
    assert_eq!(fcw.state, FcwState::Overlap);
    assert_eq!(fcw.longitudinal_distance, 0.0);
}

#[test]
fn no_reference_no_metrics() {
    let mut sim = crossroads();
    let reference = sim.add_vehicle(&vehicle(1, 10.0, 0.0, 10.0)).unwrap();
    sim.add_vehicle(&vehicle(2, 60.0, 0.0, 10.0)).unwrap();
    sim.step(0.1);
    assert!(sim.output().vehicle(2).unwrap().fcw.is_none());

    sim.set_fcw_reference(Some(reference)).unwrap();
    sim.step(0.1);
    assert!(sim.output().vehicle(2).unwrap().fcw.is_some());

    sim.set_fcw_reference(None).unwrap();
    sim.step(0.1);
    assert!(sim.output().vehicle(2).unwrap().fcw.is_none());
}
