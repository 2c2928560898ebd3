//! Signal lights: local phasing, replicated colours and vehicles obeying them.

mod common;

use assert_approx_eq::assert_approx_eq;
use common::*;
use traffic_flow_core::{ControlPhase, Error, LaneInfo, Route, SignalAttributes, SignalColor};

fn signal(id: i64) -> SignalAttributes {
    SignalAttributes {
        id,
        route: Route::at(at(95.0, 0.0)),
        ..Default::default()
    }
}

#[test]
fn local_signal_follows_its_plan() {
    let mut sim = simulation(two_lanes());
    sim.add_signal(&signal(1)).unwrap();

    let out = sim.step(1.0).signal(1).unwrap().clone();
    assert_eq!(out.color, SignalColor::Green);
    assert_approx_eq!(out.age, 29.0);
    assert_eq!(out.next_color, SignalColor::Yellow);
    assert_eq!(out.control_lanes, vec![LANE_A]);
    assert_eq!(out.control_links, vec![LINK]);
    assert_eq!(out.control_phases, ControlPhase::ALL.to_vec());

    for _ in 1..31 {
        sim.step(1.0);
    }
    let out = sim.output().signal(1).unwrap();
    assert_eq!(out.color, SignalColor::Yellow);
    assert_approx_eq!(out.age, 2.0);

    for _ in 31..61 {
        sim.step(1.0);
    }
    let out = sim.output().signal(1).unwrap();
    assert_eq!(out.color, SignalColor::Green);
    assert_approx_eq!(out.age, 29.0);
}

#[test]
fn phase_filter_selects_links() {
    let road = two_lanes();
    road.add_link(8, LANE_A, LANE_B, Some(ControlPhase::Left))
        .unwrap();
    let mut sim = simulation(road);
    sim.add_signal(&SignalAttributes {
        control_phases: "T".into(),
        ..signal(1)
    })
    .unwrap();
    sim.add_signal(&SignalAttributes {
        control_phases: "L;R".into(),
        ..signal(2)
    })
    .unwrap();
    let out = sim.step(0.1);
    // A link without a movement is treated as going straight.
    assert_eq!(out.signal(1).unwrap().control_links, vec![LINK]);
    assert_eq!(out.signal(2).unwrap().control_links, vec![8]);
}

#[test]
fn replicated_signal_takes_pushed_colours() {
    let mut sim = simulation(two_lanes());
    sim.add_signal(&SignalAttributes {
        replicated: true,
        ..signal(1)
    })
    .unwrap();

    // Grey until the first colour arrives, reported as green.
    assert_eq!(sim.step(0.1).signal(1).unwrap().color, SignalColor::Green);

    sim.initialize_parallel_simulation(1).unwrap();
    sim.update_parallel_simulation(1, SignalColor::Red).unwrap();
    // Not shown before the next tick.
    assert_eq!(sim.output().signal(1).unwrap().color, SignalColor::Green);
    assert_eq!(sim.step(0.1).signal(1).unwrap().color, SignalColor::Red);
    assert_eq!(sim.step(0.1).signal(1).unwrap().color, SignalColor::Red);
}

#[test]
fn parallel_updates_need_a_replicated_signal() {
    let mut sim = simulation(two_lanes());
    sim.add_signal(&signal(1)).unwrap();
    assert_eq!(
        sim.update_parallel_simulation(1, SignalColor::Red),
        Err(Error::NotReplicated(1))
    );
    assert_eq!(
        sim.initialize_parallel_simulation(2),
        Err(Error::UnknownSignal(2))
    );
}

#[test]
fn vehicle_waits_at_red() {
    let mut sim = simulation(two_lanes());
    // Red from the start for 27 s.
    sim.add_signal(&SignalAttributes {
        phase_offset: 33.0,
        ..signal(1)
    })
    .unwrap();
    sim.add_vehicle(&vehicle(1, 50.0, 0.0, 10.0)).unwrap();

    for _ in 0..200 {
        sim.step(0.1);
    }
    let out = sim.output();
    assert_eq!(out.signal(1).unwrap().color, SignalColor::Red);
    let veh = out.vehicle(1).unwrap();
    assert_eq!(veh.lane, LaneInfo::Lane(LANE_A));
    assert!(veh.s + 0.5 * veh.pose.length <= 100.0);
    assert!(veh.velocity < 0.5);

    for _ in 200..400 {
        sim.step(0.1);
    }
    let out = sim.output();
    assert_eq!(out.signal(1).unwrap().color, SignalColor::Green);
    assert_eq!(out.vehicle(1).unwrap().lane, LaneInfo::Lane(LANE_B));
}

#[test]
fn most_restrictive_signal_wins() {
    let mut sim = simulation(two_lanes());
    sim.add_signal(&signal(1)).unwrap();
    sim.add_signal(&SignalAttributes {
        replicated: true,
        ..signal(2)
    })
    .unwrap();
    sim.update_parallel_simulation(2, SignalColor::Red).unwrap();
    sim.add_vehicle(&vehicle(1, 50.0, 0.0, 10.0)).unwrap();

    for _ in 0..200 {
        sim.step(0.1);
    }
    assert_eq!(sim.output().signal(1).unwrap().color, SignalColor::Green);
    let veh = sim.output().vehicle(1).unwrap();
    assert_eq!(veh.lane, LaneInfo::Lane(LANE_A));
    assert!(veh.velocity < 0.5);
}
