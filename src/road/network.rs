use super::{LaneInfo, LaneLink, LaneProjection, LaneUid, RoadNetwork, TrackerHandle};
use crate::error::GeometryError;
use crate::math::{GeoReference, Point2d, Point3d, Polyline, Vector3d, Wgs84};
use crate::signal::ControlPhase;
use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::{PoisonError, RwLock};

/// Positions further than this from every reference line resolve to nothing.
const LANE_HALF_WIDTH: f64 = 1.75; // m

/// A road network held in memory, with every lane and lane-link
/// described by a polyline in the local frame.
///
/// Lanes may be added and removed while a simulation is running.
pub struct SimpleRoadNetwork {
    geo: GeoReference,
    inner: RwLock<Network>,
}

#[derive(Default)]
struct Network {
    lanes: HashMap<LaneUid, Lane>,
    links: HashMap<u64, Link>,
}

struct Lane {
    line: Polyline,
    /// Lanes continuing from the end of this one.
    lanes_out: Vec<LaneUid>,
    /// Lanes leading into the start of this one.
    lanes_in: Vec<LaneUid>,
}

struct Link {
    link: LaneLink,
    line: Polyline,
}

impl SimpleRoadNetwork {
    /// Creates an empty network whose local frame is `geo`.
    pub fn new(geo: GeoReference) -> Self {
        Self {
            geo,
            inner: Default::default(),
        }
    }

    /// Adds a lane along the given reference line.
    pub fn add_lane(
        &self,
        uid: LaneUid,
        points: impl IntoIterator<Item = Point2d>,
    ) -> Result<(), GeometryError> {
        let line = Polyline::new(points)?;
        self.write().lanes.insert(
            uid,
            Lane {
                line,
                lanes_out: vec![],
                lanes_in: vec![],
            },
        );
        Ok(())
    }

    /// Specifies that the end of `from` continues directly into the start of `to`.
    pub fn connect_lanes(&self, from: LaneUid, to: LaneUid) {
        let mut net = self.write();
        if let Some(lane) = net.lanes.get_mut(&from) {
            lane.lanes_out.push(to);
        }
        if let Some(lane) = net.lanes.get_mut(&to) {
            lane.lanes_in.push(from);
        }
    }

    /// Adds a straight lane-link from the end of `from` to the start of `to`.
    pub fn add_link(
        &self,
        id: u64,
        from: LaneUid,
        to: LaneUid,
        phase: Option<ControlPhase>,
    ) -> Result<(), GeometryError> {
        let mut net = self.write();
        let start = net.lanes.get(&from).map(|l| l.line.sample(l.line.length()).pos);
        let end = net.lanes.get(&to).map(|l| l.line.sample(0.0).pos);
        let (Some(start), Some(end)) = (start, end) else {
            return Err(GeometryError::DegeneratePolyline);
        };
        let line = Polyline::new([start, end])?;
        let link = LaneLink {
            id,
            from,
            to,
            phase,
        };
        net.links.insert(id, Link { link, line });
        Ok(())
    }

    /// Removes a lane and every link touching it.
    pub fn remove_lane(&self, uid: LaneUid) {
        let mut net = self.write();
        net.lanes.remove(&uid);
        net.links.retain(|_, l| l.link.from != uid && l.link.to != uid);
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Network> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Network> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn with_line<T>(&self, info: &LaneInfo, f: impl FnOnce(&Polyline) -> T) -> Option<T> {
        let net = self.read();
        match info {
            LaneInfo::Lane(uid) => net.lanes.get(uid).map(|l| f(&l.line)),
            LaneInfo::Link { id, .. } => net.links.get(id).map(|l| f(&l.line)),
        }
    }

    fn nearest<'a>(
        &self,
        pos: Wgs84,
        lines: impl Iterator<Item = (LaneInfo, &'a Polyline)>,
    ) -> Option<LaneProjection> {
        let enu = self.geo.to_enu(pos);
        let point = Point2d::new(enu.x, enu.y);
        lines
            .map(|(info, line)| {
                let (s, offset) = line.project(point);
                LaneProjection { info, s, offset }
            })
            .filter(|proj| proj.offset.abs() <= LANE_HALF_WIDTH)
            .min_by(|a, b| a.offset.abs().total_cmp(&b.offset.abs()).then(a.info.cmp(&b.info)))
    }
}

impl RoadNetwork for SimpleRoadNetwork {
    fn resolve_lane_at(&self, pos: Wgs84) -> Option<LaneProjection> {
        let net = self.read();
        self.nearest(
            pos,
            net.lanes.iter().map(|(uid, l)| (LaneInfo::Lane(*uid), &l.line)),
        )
    }

    fn resolve_lane_link_at(&self, pos: Wgs84) -> Option<LaneProjection> {
        let net = self.read();
        self.nearest(pos, net.links.values().map(|l| (l.link.info(), &l.line)))
    }

    fn lane_length(&self, info: &LaneInfo) -> Option<f64> {
        self.with_line(info, Polyline::length)
    }

    fn lane_point(&self, info: &LaneInfo, s: f64) -> Option<Wgs84> {
        let pos = self.with_line(info, |line| line.sample(s).pos)?;
        Some(self.geo.to_wgs84(Point3d::new(pos.x, pos.y, 0.0)))
    }

    fn lane_direction(&self, info: &LaneInfo, s: f64) -> Option<Vector3d> {
        let dir = self.with_line(info, |line| line.sample(s).dir)?;
        Some(Vector3d::new(dir.x, dir.y, 0.0))
    }

    fn project(&self, info: &LaneInfo, pos: Wgs84) -> Option<(f64, f64)> {
        let enu = self.geo.to_enu(pos);
        self.with_line(info, |line| line.project(Point2d::new(enu.x, enu.y)))
    }

    fn next_links(&self, lane: LaneUid) -> Vec<LaneLink> {
        let net = self.read();
        let mut links = net
            .links
            .values()
            .filter(|l| l.link.from == lane)
            .map(|l| l.link.clone())
            .collect::<Vec<_>>();
        links.sort_by_key(|l| l.id);
        links
    }

    fn prev_links(&self, lane: LaneUid) -> Vec<LaneLink> {
        let net = self.read();
        let mut links = net
            .links
            .values()
            .filter(|l| l.link.to == lane)
            .map(|l| l.link.clone())
            .collect::<Vec<_>>();
        links.sort_by_key(|l| l.id);
        links
    }

    fn next_lanes(&self, lane: LaneUid) -> Vec<LaneUid> {
        self.read()
            .lanes
            .get(&lane)
            .map(|l| l.lanes_out.clone())
            .unwrap_or_default()
    }

    fn prev_lanes(&self, lane: LaneUid) -> Vec<LaneUid> {
        self.read()
            .lanes
            .get(&lane)
            .map(|l| l.lanes_in.clone())
            .unwrap_or_default()
    }

    fn bind_tracker(&self, info: &LaneInfo) -> Option<TrackerHandle> {
        self.with_line(info, |_| ())?;
        let mut hasher = DefaultHasher::new();
        info.hash(&mut hasher);
        Some(TrackerHandle(hasher.finish()))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    fn network() -> SimpleRoadNetwork {
        let geo = GeoReference::new(Wgs84::new(121.0, 31.0, 0.0));
        let net = SimpleRoadNetwork::new(geo);
        let a = LaneUid::new(1, 0, -1);
        let b = LaneUid::new(2, 0, -1);
        net.add_lane(a, [Point2d::new(0.0, 0.0), Point2d::new(100.0, 0.0)])
            .unwrap();
        net.add_lane(b, [Point2d::new(120.0, 0.0), Point2d::new(200.0, 0.0)])
            .unwrap();
        net.add_link(7, a, b, Some(ControlPhase::Straight)).unwrap();
        net
    }

    #[test]
    fn resolves_positions() {
        let net = network();
        let pos = net.geo.to_wgs84(Point3d::new(40.0, 1.0, 0.0));
        let proj = net.resolve_lane_at(pos).unwrap();
        assert_eq!(proj.info, LaneInfo::Lane(LaneUid::new(1, 0, -1)));
        assert_approx_eq!(proj.s, 40.0, 1e-3);
        assert_approx_eq!(proj.offset, 1.0, 1e-3);

        let far = net.geo.to_wgs84(Point3d::new(40.0, 30.0, 0.0));
        assert!(net.resolve_lane_at(far).is_none());

        let on_link = net.geo.to_wgs84(Point3d::new(110.0, 0.0, 0.0));
        let proj = net.resolve_lane_link_at(on_link).unwrap();
        assert!(proj.info.is_on_lane_link());
        assert_approx_eq!(proj.s, 10.0, 1e-3);
    }

    #[test]
    fn topology() {
        let net = network();
        let a = LaneUid::new(1, 0, -1);
        let links = net.next_links(a);
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].to, LaneUid::new(2, 0, -1));
        assert_approx_eq!(net.lane_length(&links[0].info()).unwrap(), 20.0);
        assert_eq!(net.prev_links(LaneUid::new(2, 0, -1)).len(), 1);
        assert!(net.bind_tracker(&LaneInfo::Lane(a)).is_some());

        net.remove_lane(a);
        assert!(net.next_links(a).is_empty());
        assert!(net.lane_length(&LaneInfo::Lane(a)).is_none());
        assert!(net.bind_tracker(&LaneInfo::Lane(a)).is_none());
    }
}
