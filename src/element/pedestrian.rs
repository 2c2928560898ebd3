use super::{AccEvent, Base, ElementEvent, ElementKind, Kinetics, LifeCycle};
use crate::context::RunContext;
use crate::error::InitError;
use crate::math::{rotate_deg, subdivided_points_along_curve, try_normalize};
use crate::math::{CatmullRom, Coord, Point2d, Point3d, Polyline, Vector2d};
use crate::output::PedestrianOutput;
use crate::road::RoadNetwork;
use crate::scene::{Catalog, PedestrianAttributes, PedestrianBehavior};
use crate::time::TimeContext;
use crate::ElementId;
use cgmath::prelude::*;
use itertools::Itertools;

/// Waypoints closer than this to the previous one are dropped.
const WAYPOINT_TOLERANCE: f64 = 0.1; // m

/// A pedestrian walking a waypoint path or in a fixed direction.
#[derive(Clone, Debug)]
pub struct Pedestrian {
    pub(crate) base: Base,
    behavior: PedestrianBehavior,
    /// The path in waypoint mode, `None` if the route has a single point.
    path: Option<Polyline>,
    /// Distance walked along the path in m.
    travelled: f64,
    /// Walking direction in direction mode.
    target_dir: Vector2d,
    acc_event: Option<AccEvent>,
    since_lane_update: f64,
}

/// Builds the walking path through a sequence of waypoints.
///
/// Four or more points are joined by a Catmull-Rom spline sampled every
/// `spacing` metres, two or three by straight segments.
fn build_path(points: &[Point2d], spacing: f64) -> Result<Option<Polyline>, InitError> {
    let points = points
        .iter()
        .copied()
        .coalesce(|a, b| {
            if a.distance(b) < WAYPOINT_TOLERANCE {
                Ok(a)
            } else {
                Err((a, b))
            }
        })
        .collect::<Vec<_>>();
    match points.len() {
        0 | 1 => Ok(None),
        2 | 3 => Ok(Some(Polyline::new(points)?)),
        _ => {
            let spline = CatmullRom::through(&points)?;
            let samples = subdivided_points_along_curve(&spline, spacing);
            Ok(Some(Polyline::new(samples)?))
        }
    }
}

impl Pedestrian {
    pub(crate) fn new(
        id: ElementId,
        attrs: &PedestrianAttributes,
        ctx: &RunContext,
        catalog: &Catalog,
    ) -> Result<Self, InitError> {
        let config = &ctx.config;
        let entry = catalog.resolve(&attrs.pedestrian_type, attrs.dimensions);
        let life = LifeCycle::new(
            attrs.start_time,
            attrs.end_time.unwrap_or(config.max_lifetime),
        );
        let mut base = Base::new(
            id,
            ElementKind::Pedestrian,
            attrs.id,
            &attrs.pedestrian_type,
            life,
            &entry,
        )?
        .with_stop_policy(attrs.source, attrs.terminate_on_stop);

        let waypoints = attrs
            .route
            .points()
            .map(|pos| {
                let enu = ctx.geo.to_enu(pos);
                Point2d::new(enu.x, enu.y)
            })
            .collect::<Vec<_>>();
        let path = build_path(&waypoints, config.waypoint_spacing)?;

        let start = attrs.route.start;
        let proj = ctx
            .road()
            .resolve_lane_at(start)
            .or_else(|| ctx.road().resolve_lane_link_at(start))
            .ok_or(InitError::UnresolvedLocation {
                lon: start.lon,
                lat: start.lat,
            })?;
        super::bind_location(&mut base.location, ctx, proj.info, proj.s, proj.offset)?;

        let heading = match (attrs.behavior, &path) {
            (PedestrianBehavior::WayPoints, Some(path)) => path.sample(0.0).dir,
            _ => rotate_deg(Vector2d::unit_x(), attrs.start_angle),
        };
        let center = Coord::from_enu(ctx.geo.to_enu(start));
        base.location
            .place_at(ctx, center)
            .ok_or(InitError::UnresolvedLane(proj.info))?;
        base.location.live_mut().heading = heading;

        base.kinetics = Kinetics::new(attrs.start_velocity, attrs.max_velocity);
        base.kinetics.desired_velocity = attrs.start_velocity;
        base.track_lateral(0.0);
        base.update_polygon(ctx);
        base.save_stable_state();

        log::info!(
            "{} placed on {} with {} path",
            base.identity().sys_id(),
            proj.info,
            if path.is_some() { "a" } else { "no" }
        );
        Ok(Self {
            base,
            behavior: attrs.behavior,
            path,
            travelled: 0.0,
            target_dir: heading,
            acc_event: None,
            since_lane_update: 0.0,
        })
    }

    pub fn behavior(&self) -> PedestrianBehavior {
        self.behavior
    }

    /// The waypoint path, if the pedestrian has one.
    pub fn path(&self) -> Option<&Polyline> {
        self.path.as_ref()
    }

    pub(crate) fn update(&mut self, ctx: &RunContext, time: &TimeContext) {
        if !self.base.life.is_running() {
            return;
        }
        let dt = time.relative_time;
        let kin = &mut self.base.kinetics;
        kin.acceleration = self.acc_event.map_or(0.0, |event| event.acceleration);
        let dist = kin.integrate(dt);
        if let Some(event) = &mut self.acc_event {
            if event.check(kin, dt) {
                self.acc_event = None;
            }
        }

        let loc = self.base.location.live();
        let prev = loc.geom_center.enu(&ctx.geo);
        match (self.behavior, &self.path) {
            (PedestrianBehavior::WayPoints, Some(path)) => {
                self.travelled = f64::min(self.travelled + dist, path.length());
                let sample = path.sample(self.travelled);
                let center = Coord::from_enu(Point3d::new(sample.pos.x, sample.pos.y, prev.z));
                let live = self.base.location.live_mut();
                live.geom_center = center.clone();
                live.rear_axle_center = center;
                live.heading = sample.dir;
                // Waits at the last waypoint, still taking events.
                if self.travelled >= path.length() {
                    self.base.kinetics.halt();
                }
            }
            (PedestrianBehavior::WayPoints, None) => self.base.kinetics.halt(),
            (PedestrianBehavior::Direction, _) => {
                let step = self.target_dir * dist;
                self.base.location.translate_by_step(ctx, step);
                self.base.location.live_mut().heading = self.target_dir;
            }
        }

        self.since_lane_update += dt;
        if self.since_lane_update >= ctx.config.pedestrian_lane_update_interval {
            let elapsed = std::mem::take(&mut self.since_lane_update);
            if !self.update_lane(ctx) {
                log::warn!(
                    "{} lost its tracker on {}",
                    self.base.identity().sys_id(),
                    self.base.location.live().lane_info
                );
                self.base.location.hold_stable();
                return;
            }
            // The lane offset is only refreshed here.
            self.base.track_lateral(elapsed);
        }
        self.base.update_polygon(ctx);
        if !self.base.life.is_ended() {
            self.base.location.refresh_bucket(self.base.id(), ctx);
        }
    }

    /// Re-resolves the lane under the pedestrian, keeping the current lane if
    /// nothing nearer is found. Returns false if no lane can be resolved.
    fn update_lane(&mut self, ctx: &RunContext) -> bool {
        let road: &dyn RoadNetwork = ctx.road();
        let center = self.base.location.live().geom_center.clone();
        let pos = center.wgs84(&ctx.geo);
        let current = self.base.location.live().lane_info;
        if let Some(proj) = road
            .resolve_lane_at(pos)
            .or_else(|| road.resolve_lane_link_at(pos))
        {
            if proj.info != current && self.base.location.bind(ctx, proj.info).is_err() {
                return false;
            }
        }
        let heading = self.base.location.live().heading;
        let placed = self.base.location.place_at(ctx, center).is_some();
        self.base.location.live_mut().heading = heading;
        placed
    }

    pub(crate) fn handle_event(&mut self, event: ElementEvent) -> bool {
        let kin = &mut self.base.kinetics;
        match event {
            ElementEvent::Velocity {
                direction,
                velocity,
            } => {
                self.behavior = PedestrianBehavior::Direction;
                kin.velocity = velocity.max(0.0);
                kin.desired_velocity = kin.velocity;
                kin.max_velocity = kin.max_velocity.max(kin.velocity);
                kin.direction = direction;
                let heading = self.base.location.live().heading;
                self.target_dir =
                    try_normalize(rotate_deg(heading, direction)).unwrap_or(self.target_dir);
            }
            ElementEvent::Acceleration { acceleration, end } => {
                self.acc_event = Some(AccEvent::new(acceleration, end, kin.velocity));
            }
        }
        true
    }

    pub(crate) fn output(&self, ctx: &RunContext) -> PedestrianOutput {
        PedestrianOutput {
            id: self.base.identity().id(),
            pedestrian_type: self.base.type_name().to_owned(),
            pose: self.base.pose(ctx),
            velocity: self.base.kinetics.velocity,
            acceleration: self.base.kinetics.acceleration,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn short_routes_are_straight() {
        let path = build_path(&[Point2d::new(0.0, 0.0), Point2d::new(10.0, 0.0)], 1.0)
            .unwrap()
            .unwrap();
        assert_eq!(path.points().len(), 2);
        assert_approx_eq!(path.length(), 10.0);
        assert!(build_path(&[Point2d::new(0.0, 0.0)], 1.0).unwrap().is_none());
    }

    #[test]
    fn near_duplicates_are_dropped() {
        let points = [
            Point2d::new(0.0, 0.0),
            Point2d::new(0.05, 0.0),
            Point2d::new(10.0, 0.0),
        ];
        let path = build_path(&points, 1.0).unwrap().unwrap();
        assert_eq!(path.points().len(), 2);
    }

    #[test]
    fn long_routes_are_splines() {
        let points = [
            Point2d::new(0.0, 0.0),
            Point2d::new(10.0, 0.0),
            Point2d::new(20.0, 5.0),
            Point2d::new(30.0, 5.0),
        ];
        let path = build_path(&points, 1.0).unwrap().unwrap();
        assert!(path.points().len() > 30);
        let end = path.sample(path.length()).pos;
        assert_approx_eq!(end.x, 30.0, 1e-6);
        assert_approx_eq!(end.y, 5.0, 1e-6);
        for pair in path.points().windows(2) {
            assert!(pair[0].distance(pair[1]) <= 1.0 + 1e-9);
        }
    }
}
