//! The records written for each tick.

use crate::element::FcwMetrics;
use crate::math::Wgs84;
use crate::road::{LaneInfo, LaneUid};
use crate::signal::{ControlPhase, SignalColor};
#[cfg(feature = "serde")]
use serde::Serialize;

/// Fields every moving or static element reports.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct Pose {
    pub position: Wgs84,
    /// Heading in radians, anticlockwise from east.
    pub heading: f64,
    pub length: f64,
    pub width: f64,
    pub height: f64,
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct VehicleOutput {
    pub id: i64,
    pub vehicle_type: String,
    pub pose: Pose,
    pub velocity: f64,
    pub acceleration: f64,
    pub lane: LaneInfo,
    /// Distance along the lane in m.
    pub s: f64,
    /// Lateral offset from the lane centre in m.
    pub offset: f64,
    /// Forward-collision metrics relative to the reference element, if one is set.
    pub fcw: Option<FcwMetrics>,
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct PedestrianOutput {
    pub id: i64,
    pub pedestrian_type: String,
    pub pose: Pose,
    pub velocity: f64,
    pub acceleration: f64,
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct ObstacleOutput {
    pub id: i64,
    pub obstacle_type: String,
    pub pose: Pose,
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct SignalOutput {
    pub id: i64,
    pub color: SignalColor,
    /// Time left in the current colour in s.
    pub age: f64,
    pub next_color: SignalColor,
    pub next_age: f64,
    pub position: Wgs84,
    pub heading: f64,
    pub plan: i64,
    pub junction: i64,
    pub phase_number: i64,
    pub signal_head: i64,
    pub event_id: i64,
    pub control_lanes: Vec<LaneUid>,
    pub control_phases: Vec<ControlPhase>,
    /// Lane-links whose traffic obeys this signal.
    pub control_links: Vec<u64>,
}

/// The output of a single element.
#[derive(Clone, Debug, PartialEq)]
pub enum ElementOutput {
    Vehicle(VehicleOutput),
    Pedestrian(PedestrianOutput),
    Obstacle(ObstacleOutput),
    Signal(SignalOutput),
}

/// Everything written for one tick, each list ordered by id.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct OutputBatch {
    pub frame: u64,
    /// Absolute time of the tick in s.
    pub time: f64,
    pub vehicles: Vec<VehicleOutput>,
    pub pedestrians: Vec<PedestrianOutput>,
    pub obstacles: Vec<ObstacleOutput>,
    pub signals: Vec<SignalOutput>,
}

impl OutputBatch {
    pub fn new(frame: u64, time: f64) -> Self {
        Self {
            frame,
            time,
            ..Default::default()
        }
    }

    pub fn push(&mut self, output: ElementOutput) {
        match output {
            ElementOutput::Vehicle(out) => self.vehicles.push(out),
            ElementOutput::Pedestrian(out) => self.pedestrians.push(out),
            ElementOutput::Obstacle(out) => self.obstacles.push(out),
            ElementOutput::Signal(out) => self.signals.push(out),
        }
    }

    /// Orders every list by element id.
    pub fn sort(&mut self) {
        self.vehicles.sort_by_key(|out| out.id);
        self.pedestrians.sort_by_key(|out| out.id);
        self.obstacles.sort_by_key(|out| out.id);
        self.signals.sort_by_key(|out| out.id);
    }

    pub fn len(&self) -> usize {
        self.vehicles.len() + self.pedestrians.len() + self.obstacles.len() + self.signals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn vehicle(&self, id: i64) -> Option<&VehicleOutput> {
        self.vehicles.iter().find(|out| out.id == id)
    }

    pub fn pedestrian(&self, id: i64) -> Option<&PedestrianOutput> {
        self.pedestrians.iter().find(|out| out.id == id)
    }

    pub fn obstacle(&self, id: i64) -> Option<&ObstacleOutput> {
        self.obstacles.iter().find(|out| out.id == id)
    }

    pub fn signal(&self, id: i64) -> Option<&SignalOutput> {
        self.signals.iter().find(|out| out.id == id)
    }
}
