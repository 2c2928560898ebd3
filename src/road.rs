//! The boundary to the external road-network service.
//!
//! The simulation never owns map geometry. It refers to lanes and lane-links by
//! id and asks a [RoadNetwork] for whatever positions and directions it needs.

use crate::math::{Vector3d, Wgs84};
use crate::signal::ControlPhase;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::fmt;

pub use network::SimpleRoadNetwork;

mod network;

/// Identity of a lane: its road, its section of that road and its index in the section.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LaneUid {
    pub road: u64,
    pub section: u64,
    pub lane: i64,
}

impl LaneUid {
    pub const fn new(road: u64, section: u64, lane: i64) -> Self {
        Self {
            road,
            section,
            lane,
        }
    }
}

impl fmt::Display for LaneUid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.road, self.section, self.lane)
    }
}

/// What an element is bound to: a lane, or a lane-link joining two lanes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum LaneInfo {
    Lane(LaneUid),
    Link { id: u64, from: LaneUid, to: LaneUid },
}

impl Default for LaneInfo {
    fn default() -> Self {
        Self::Lane(LaneUid::default())
    }
}

impl LaneInfo {
    pub fn is_on_lane_link(&self) -> bool {
        matches!(self, Self::Link { .. })
    }

    /// The lane, if bound to one.
    pub fn lane(&self) -> Option<LaneUid> {
        match *self {
            Self::Lane(uid) => Some(uid),
            Self::Link { .. } => None,
        }
    }
}

impl fmt::Display for LaneInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lane(uid) => write!(f, "lane {uid}"),
            Self::Link { id, from, to } => write!(f, "lane-link {id} ({from} -> {to})"),
        }
    }
}

/// A connector from the end of one lane to the start of another.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LaneLink {
    pub id: u64,
    pub from: LaneUid,
    pub to: LaneUid,
    /// The movement this link makes through a junction, if signal controlled.
    pub phase: Option<ControlPhase>,
}

impl LaneLink {
    pub fn info(&self) -> LaneInfo {
        LaneInfo::Link {
            id: self.id,
            from: self.from,
            to: self.to,
        }
    }
}

/// A geodetic position resolved onto a lane or lane-link.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LaneProjection {
    pub info: LaneInfo,
    /// Distance along the lane's reference line in m.
    pub s: f64,
    /// Lateral offset from the reference line in m, positive to the left.
    pub offset: f64,
}

/// An opaque handle the road network hands out for a lane binding.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TrackerHandle(pub u64);

/// The road-network service.
///
/// Every query is synchronous and may be called concurrently. A miss is
/// reported as `None` or an empty list, never as a panic.
pub trait RoadNetwork: Send + Sync {
    /// Resolves a position to the nearest lane.
    fn resolve_lane_at(&self, pos: Wgs84) -> Option<LaneProjection>;

    /// Resolves a position to the nearest lane-link.
    fn resolve_lane_link_at(&self, pos: Wgs84) -> Option<LaneProjection>;

    /// The length of a lane or lane-link in m.
    fn lane_length(&self, info: &LaneInfo) -> Option<f64>;

    /// The point `s` metres along a lane or lane-link.
    fn lane_point(&self, info: &LaneInfo, s: f64) -> Option<Wgs84>;

    /// The unit direction of a lane or lane-link at `s`, in the local frame.
    fn lane_direction(&self, info: &LaneInfo, s: f64) -> Option<Vector3d>;

    /// Projects a position onto a lane or lane-link, returning the distance
    /// along it and the signed lateral offset, positive to the left.
    fn project(&self, info: &LaneInfo, pos: Wgs84) -> Option<(f64, f64)>;

    /// Lane-links leaving the end of a lane.
    fn next_links(&self, lane: LaneUid) -> Vec<LaneLink>;

    /// Lane-links arriving at the start of a lane.
    fn prev_links(&self, lane: LaneUid) -> Vec<LaneLink>;

    /// Lanes continuing directly from the end of a lane, without a link.
    fn next_lanes(&self, lane: LaneUid) -> Vec<LaneUid>;

    /// Lanes leading directly into the start of a lane, without a link.
    fn prev_lanes(&self, lane: LaneUid) -> Vec<LaneUid>;

    /// Binds a tracker to a lane or lane-link.
    fn bind_tracker(&self, info: &LaneInfo) -> Option<TrackerHandle>;
}
