use crate::road::{LaneInfo, RoadNetwork};
use crate::util::Interval;
use std::collections::{HashSet, VecDeque};
use std::hash::{Hash, Hasher};

/// Positions this far before the end of a lane are taken as its last bucket.
const LANE_END_MARGIN: f64 = 0.5; // m

/// A lane or lane-link together with a fixed-length longitudinal bucket on it.
///
/// Two values are equal when they name the same lane and the same bucket index;
/// the cached scope takes no part in equality or hashing.
#[derive(Clone, Copy, Debug)]
pub struct HashedLaneInfo {
    info: LaneInfo,
    idx: i64,
    /// The stretch of the lane covered by this bucket, half-open.
    scope: Interval<f64>,
    lane_len: f64,
}

impl PartialEq for HashedLaneInfo {
    fn eq(&self, other: &Self) -> bool {
        self.info == other.info && self.idx == other.idx
    }
}

impl Eq for HashedLaneInfo {}

impl Hash for HashedLaneInfo {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.info.hash(state);
        self.idx.hash(state);
    }
}

impl HashedLaneInfo {
    /// The bucket of `info` containing the distance `s` along it.
    pub fn new(info: LaneInfo, s: f64, lane_len: f64, scope_len: f64) -> Self {
        let idx = Self::index_of(s, lane_len, scope_len);
        Self::at_index(info, idx, lane_len, scope_len)
    }

    /// The bucket of `info` with the given index.
    pub fn at_index(info: LaneInfo, idx: i64, lane_len: f64, scope_len: f64) -> Self {
        let start = idx as f64 * scope_len;
        Self {
            info,
            idx,
            scope: Interval::new(start, f64::min(start + scope_len, lane_len)),
            lane_len,
        }
    }

    fn index_of(s: f64, lane_len: f64, scope_len: f64) -> i64 {
        let last = f64::max(lane_len - f64::EPSILON * lane_len.max(1.0), 0.0);
        (s.clamp(0.0, last) / scope_len).floor() as i64
    }

    pub fn info(&self) -> LaneInfo {
        self.info
    }

    pub fn sub_section_index(&self) -> i64 {
        self.idx
    }

    pub fn scope(&self) -> Interval<f64> {
        self.scope
    }

    pub fn lane_length(&self) -> f64 {
        self.lane_len
    }

    fn is_last(&self, scope_len: f64) -> bool {
        self.idx >= Self::index_of(self.lane_len, self.lane_len, scope_len)
    }

    /// The first bucket of a lane or lane-link.
    fn first_of(info: LaneInfo, road: &dyn RoadNetwork, scope_len: f64) -> Option<Self> {
        let len = road.lane_length(&info)?;
        Some(Self::at_index(info, 0, len, scope_len))
    }

    /// The last bucket of a lane or lane-link.
    fn last_of(info: LaneInfo, road: &dyn RoadNetwork, scope_len: f64) -> Option<Self> {
        let len = road.lane_length(&info)?;
        Some(Self::new(info, len - LANE_END_MARGIN, len, scope_len))
    }

    /// The bucket immediately downstream.
    ///
    /// Crossing the end of a lane requires a single successor lane, or failing
    /// that a single successor lane-link. `None` if there is no successor or the
    /// choice is ambiguous.
    pub fn front_neighbour(&self, road: &dyn RoadNetwork, scope_len: f64) -> Option<Self> {
        if !self.is_last(scope_len) {
            return Some(Self::at_index(
                self.info,
                self.idx + 1,
                self.lane_len,
                scope_len,
            ));
        }
        match self.info {
            LaneInfo::Link { to, .. } => Self::first_of(LaneInfo::Lane(to), road, scope_len),
            LaneInfo::Lane(uid) => {
                let lanes = road.next_lanes(uid);
                if lanes.len() == 1 {
                    return Self::first_of(LaneInfo::Lane(lanes[0]), road, scope_len);
                }
                if !lanes.is_empty() {
                    return None;
                }
                match road.next_links(uid).as_slice() {
                    [link] => Self::first_of(link.info(), road, scope_len),
                    _ => None,
                }
            }
        }
    }

    /// The bucket immediately upstream.
    ///
    /// Where several lanes merge into this one the highest lane id is taken.
    pub fn rear_neighbour(&self, road: &dyn RoadNetwork, scope_len: f64) -> Option<Self> {
        if self.idx > 0 {
            return Some(Self::at_index(
                self.info,
                self.idx - 1,
                self.lane_len,
                scope_len,
            ));
        }
        match self.info {
            LaneInfo::Link { from, .. } => Self::last_of(LaneInfo::Lane(from), road, scope_len),
            LaneInfo::Lane(uid) => {
                if let Some(prev) = road.prev_lanes(uid).into_iter().max() {
                    return Self::last_of(LaneInfo::Lane(prev), road, scope_len);
                }
                match road.prev_links(uid).as_slice() {
                    [link] => Self::last_of(link.info(), road, scope_len),
                    _ => None,
                }
            }
        }
    }

    /// Every bucket reachable downstream within `depth` steps, nearest first.
    /// Unlike [Self::front_neighbour], all branches are followed.
    pub fn front_chain(&self, road: &dyn RoadNetwork, scope_len: f64, depth: usize) -> Vec<Self> {
        let mut chain = vec![];
        let mut seen = HashSet::from([*self]);
        let mut queue = VecDeque::from([(*self, 0)]);
        while let Some((bucket, dist)) = queue.pop_front() {
            if dist == depth {
                continue;
            }
            for next in bucket.successors(road, scope_len) {
                if seen.insert(next) {
                    chain.push(next);
                    queue.push_back((next, dist + 1));
                }
            }
        }
        chain
    }

    fn successors(&self, road: &dyn RoadNetwork, scope_len: f64) -> Vec<Self> {
        if !self.is_last(scope_len) {
            return vec![Self::at_index(
                self.info,
                self.idx + 1,
                self.lane_len,
                scope_len,
            )];
        }
        match self.info {
            LaneInfo::Link { to, .. } => Self::first_of(LaneInfo::Lane(to), road, scope_len)
                .into_iter()
                .collect(),
            LaneInfo::Lane(uid) => road
                .next_lanes(uid)
                .into_iter()
                .map(LaneInfo::Lane)
                .chain(road.next_links(uid).iter().map(|l| l.info()))
                .filter_map(|info| Self::first_of(info, road, scope_len))
                .collect(),
        }
    }
}
