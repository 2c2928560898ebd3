use crate::context::RunContext;
use crate::error::InitError;
use crate::math::{flatten, try_normalize, Coord, Vector2d, Vector3d};
use crate::road::{LaneInfo, TrackerHandle};
use crate::spatial::HashedLaneInfo;
use crate::ElementId;

/// Where an element is, at one point in time.
#[derive(Clone, Debug, PartialEq)]
pub struct LocationState {
    /// The centre of the element's footprint.
    pub geom_center: Coord,
    /// Coincides with the geometric centre for elements without axles.
    pub rear_axle_center: Coord,
    pub lane_info: LaneInfo,
    pub lane_length: f64,
    /// Distance along the lane's reference line in m.
    pub distance_along_curve: f64,
    /// Lateral offset from the reference line in m, positive to the left.
    pub lane_offset: f64,
    /// Unit direction of the lane at the element, in the local frame.
    pub lane_dir: Vector3d,
    /// Unit direction the element faces, in the local frame.
    pub heading: Vector2d,
}

impl Default for LocationState {
    fn default() -> Self {
        Self {
            geom_center: Coord::default(),
            rear_axle_center: Coord::default(),
            lane_info: LaneInfo::default(),
            lane_length: 0.0,
            distance_along_curve: 0.0,
            lane_offset: 0.0,
            lane_dir: Vector3d::new(1.0, 0.0, 0.0),
            heading: Vector2d::new(1.0, 0.0),
        }
    }
}

impl LocationState {
    /// Distance remaining to the end of the lane.
    pub fn invert_distance_along_curve(&self) -> f64 {
        f64::max(self.lane_length - self.distance_along_curve, 0.0)
    }

    /// The lane direction with its up component dropped.
    pub fn lane_dir_2d(&self) -> Vector2d {
        try_normalize(flatten(self.lane_dir)).unwrap_or(self.heading)
    }
}

/// The live location of an element together with the snapshot taken at the end of the last tick.
///
/// Other elements only ever read the snapshot.
#[derive(Clone, Debug, Default)]
pub struct Location {
    live: LocationState,
    stable: LocationState,
    tracker: Option<TrackerHandle>,
    stable_tracker: Option<TrackerHandle>,
    hashed: Option<HashedLaneInfo>,
}

impl Location {
    pub fn live(&self) -> &LocationState {
        &self.live
    }

    pub fn live_mut(&mut self) -> &mut LocationState {
        &mut self.live
    }

    pub fn stable(&self) -> &LocationState {
        &self.stable
    }

    pub fn tracker(&self) -> Option<TrackerHandle> {
        self.tracker
    }

    /// The bucket the element was last filed under.
    pub fn hashed(&self) -> Option<HashedLaneInfo> {
        self.hashed
    }

    /// Binds the element to a lane `s` metres along it, `offset` metres to its left.
    pub fn init_on_lane(
        &mut self,
        ctx: &RunContext,
        info: LaneInfo,
        s: f64,
        offset: f64,
    ) -> Result<(), InitError> {
        self.bind(ctx, info)?;
        self.relocate(ctx, s, offset)
            .ok_or(InitError::UnresolvedLane(info))?;
        self.live.heading = self.live.lane_dir_2d();
        self.save_stable_state();
        Ok(())
    }

    /// Binds the element to a lane-link. See [Self::init_on_lane].
    pub fn init_on_lane_link(
        &mut self,
        ctx: &RunContext,
        info: LaneInfo,
        s: f64,
        offset: f64,
    ) -> Result<(), InitError> {
        if !info.is_on_lane_link() {
            return Err(InitError::UnresolvedLane(info));
        }
        self.init_on_lane(ctx, info, s, offset)
    }

    /// Binds a new tracker, keeping the current position until the next relocation.
    pub fn bind(&mut self, ctx: &RunContext, info: LaneInfo) -> Result<(), InitError> {
        let road = ctx.road();
        let tracker = road
            .bind_tracker(&info)
            .ok_or(InitError::UnresolvedLane(info))?;
        let len = road
            .lane_length(&info)
            .ok_or(InitError::UnresolvedLane(info))?;
        self.tracker = Some(tracker);
        self.live.lane_info = info;
        self.live.lane_length = len;
        Ok(())
    }

    /// Places the element `s` metres along its bound lane and `offset` metres to the left.
    /// Returns `None`, leaving the location untouched, if the lane can no longer be resolved.
    pub fn relocate(&mut self, ctx: &RunContext, s: f64, offset: f64) -> Option<()> {
        let road = ctx.road();
        let info = self.live.lane_info;
        let point = road.lane_point(&info, s)?;
        let dir = road.lane_direction(&info, s)?;
        let center = Coord::from_wgs84(point).lane_offset(flatten(dir), offset, &ctx.geo);
        self.live.rear_axle_center = center.clone();
        self.live.geom_center = center;
        self.live.distance_along_curve = s;
        self.live.lane_offset = offset;
        self.live.lane_dir = dir;
        Some(())
    }

    /// Places the element at the geometric centre `center`, resolving its lane binding
    /// from the tracked lane or lane-link.
    pub fn place_at(&mut self, ctx: &RunContext, center: Coord) -> Option<()> {
        let info = self.live.lane_info;
        let (s, offset) = ctx.road().project(&info, center.wgs84(&ctx.geo))?;
        let dir = ctx.road().lane_direction(&info, s)?;
        self.live.rear_axle_center = center.clone();
        self.live.geom_center = center;
        self.live.distance_along_curve = s;
        self.live.lane_offset = offset;
        self.live.lane_dir = dir;
        Some(())
    }

    /// Moves both centres by a horizontal step in the local frame.
    pub fn translate_by_step(&mut self, ctx: &RunContext, step: Vector2d) {
        self.live.geom_center.translate(step, &ctx.geo);
        self.live.rear_axle_center.translate(step, &ctx.geo);
    }

    /// Puts the rear axle `offset` metres behind the geometric centre along the heading.
    pub fn set_rear_axle_offset(&mut self, ctx: &RunContext, offset: f64) {
        let mut rear = self.live.geom_center.clone();
        rear.translate(-self.live.heading * offset, &ctx.geo);
        self.live.rear_axle_center = rear;
    }

    /// Files the element under the bucket it now occupies.
    pub fn refresh_bucket(&mut self, id: ElementId, ctx: &RunContext) {
        let bucket = HashedLaneInfo::new(
            self.live.lane_info,
            self.live.distance_along_curve,
            self.live.lane_length,
            ctx.scope_len(),
        );
        if ctx.lanes.register(id, bucket) {
            log::debug!(
                "{:?} moved to bucket {} of {}",
                id,
                bucket.sub_section_index(),
                bucket.info()
            );
        }
        self.hashed = Some(bucket);
    }

    /// Removes the element from the hashed index.
    pub fn clear_bucket(&mut self, id: ElementId, ctx: &RunContext) {
        ctx.lanes.unregister(id);
        self.hashed = None;
    }

    pub fn save_stable_state(&mut self) {
        self.stable.clone_from(&self.live);
        self.stable_tracker = self.tracker;
    }

    /// Discards this tick's changes, returning to the last snapshot and
    /// the tracker bound when it was taken.
    pub fn hold_stable(&mut self) {
        self.live.clone_from(&self.stable);
        self.tracker = self.stable_tracker;
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::config::SimulationConfig;
    use crate::math::{Point2d, Wgs84};
    use crate::road::{LaneUid, SimpleRoadNetwork};
    use assert_approx_eq::assert_approx_eq;
    use slotmap::KeyData;
    use std::sync::Arc;

    fn context() -> RunContext {
        let origin = Wgs84::new(121.0, 31.0, 0.0);
        let road = SimpleRoadNetwork::new(crate::math::GeoReference::new(origin));
        road.add_lane(
            LaneUid::new(1, 0, -1),
            [Point2d::new(0.0, 0.0), Point2d::new(0.0, 100.0)],
        )
        .unwrap();
        RunContext::new(SimulationConfig::default(), origin, Arc::new(road))
    }

    #[test]
    fn init_on_lane() {
        let ctx = context();
        let mut loc = Location::default();
        let info = LaneInfo::Lane(LaneUid::new(1, 0, -1));
        loc.init_on_lane(&ctx, info, 30.0, 1.0).unwrap();
        let center = loc.live().geom_center.enu(&ctx.geo);
        assert_approx_eq!(center.x, -1.0, 1e-4);
        assert_approx_eq!(center.y, 30.0, 1e-4);
        assert_approx_eq!(loc.live().heading.y, 1.0, 1e-6);
        assert_approx_eq!(loc.stable().invert_distance_along_curve(), 70.0);
        assert!(loc.tracker().is_some());

        let missing = LaneInfo::Lane(LaneUid::new(9, 0, -1));
        assert_eq!(
            loc.init_on_lane(&ctx, missing, 0.0, 0.0),
            Err(InitError::UnresolvedLane(missing))
        );
        assert!(loc.init_on_lane_link(&ctx, info, 0.0, 0.0).is_err());
    }

    #[test]
    fn stable_state_lags_live() {
        let ctx = context();
        let mut loc = Location::default();
        let info = LaneInfo::Lane(LaneUid::new(1, 0, -1));
        loc.init_on_lane(&ctx, info, 10.0, 0.0).unwrap();
        loc.translate_by_step(&ctx, Vector2d::new(0.0, 5.0));
        assert_approx_eq!(loc.live().geom_center.enu(&ctx.geo).y, 15.0, 1e-6);
        assert_approx_eq!(loc.stable().geom_center.enu(&ctx.geo).y, 10.0, 1e-4);
        loc.hold_stable();
        assert_approx_eq!(loc.live().geom_center.enu(&ctx.geo).y, 10.0, 1e-4);
        loc.relocate(&ctx, 20.0, 0.0).unwrap();
        loc.save_stable_state();
        assert_eq!(loc.stable(), loc.live());
    }

    #[test]
    fn holding_restores_the_binding() {
        let ctx = context();
        let mut loc = Location::default();
        let info = LaneInfo::Lane(LaneUid::new(1, 0, -1));
        loc.init_on_lane(&ctx, info, 10.0, 0.0).unwrap();
        let tracker = loc.tracker();

        loc.tracker = Some(TrackerHandle(0));
        loc.live.lane_info = LaneInfo::Lane(LaneUid::new(2, 0, -1));
        loc.hold_stable();
        assert_eq!(loc.tracker(), tracker);
        assert_eq!(loc.live().lane_info, info);
    }

    #[test]
    fn bucket_follows_distance() {
        let ctx = context();
        let id: ElementId = KeyData::from_ffi((1 << 32) | 1).into();
        let mut loc = Location::default();
        let info = LaneInfo::Lane(LaneUid::new(1, 0, -1));
        loc.init_on_lane(&ctx, info, 10.0, 0.0).unwrap();
        loc.refresh_bucket(id, &ctx);
        assert_eq!(loc.hashed().unwrap().sub_section_index(), 0);
        loc.relocate(&ctx, 40.0, 0.0).unwrap();
        loc.refresh_bucket(id, &ctx);
        assert_eq!(ctx.lanes.bucket_of(id), loc.hashed());
        assert_eq!(loc.hashed().unwrap().sub_section_index(), 2);
        loc.clear_bucket(id, &ctx);
        assert!(ctx.lanes.is_empty());
    }
}
