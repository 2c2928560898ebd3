use super::acceleration::AccelerationModel;
use super::random::Pseudorandom;
use super::{bind_location, resolve_route_start, AccEvent, Base, ElementEvent, ElementKind};
use super::{FcwMetrics, Kinetics, LifeCycle};
use crate::consistency::SimulationConsistency;
use crate::context::RunContext;
use crate::error::InitError;
use crate::math::{rot90, try_normalize, Point2d, Vector2d};
use crate::output::VehicleOutput;
use crate::road::{LaneInfo, RoadNetwork};
use crate::scene::{Catalog, VehicleAttributes};
use crate::signal::SignalColor;
use crate::time::TimeContext;
use crate::util::Interval;
use crate::{ElementId, ElementSet};
use cgmath::prelude::*;
use std::collections::HashMap;
use std::iter::once;

/// Centres moving less than this in a tick keep their heading.
const MIN_HEADING_STEP: f64 = 1e-6; // m

/// A vehicle driving along lanes and lane-links.
#[derive(Clone, Debug)]
pub struct Vehicle {
    pub(crate) base: Base,
    model: AccelerationModel,
    rand: Pseudorandom,
    /// Distance from the geometric centre back to the rear axle in m.
    rear_axle_offset: f64,
    /// Where the vehicle goes once its current lane or lane-link ends.
    next: Option<LaneInfo>,
    acc_event: Option<AccEvent>,
    /// The acceleration chosen by the last plan.
    planned_acc: f64,
    fcw: Option<FcwMetrics>,
}

impl Vehicle {
    pub(crate) fn new(
        id: ElementId,
        attrs: &VehicleAttributes,
        ctx: &RunContext,
        catalog: &Catalog,
    ) -> Result<Self, InitError> {
        let config = &ctx.config;
        let entry = catalog.resolve(&attrs.vehicle_type, attrs.dimensions);
        let life = LifeCycle::new(
            attrs.start_time,
            attrs.end_time.unwrap_or(config.max_lifetime),
        );
        let mut base = Base::new(
            id,
            ElementKind::Vehicle,
            attrs.id,
            &attrs.vehicle_type,
            life,
            &entry,
        )?
        .with_stop_policy(attrs.source, attrs.terminate_on_stop);

        let proj = resolve_route_start(ctx, &attrs.route, attrs.lane_id)?;
        bind_location(
            &mut base.location,
            ctx,
            proj.info,
            proj.s + attrs.start_s,
            attrs.l_offset,
        )?;

        let velocity = attrs.start_velocity.unwrap_or(config.default_velocity);
        let max_velocity = attrs.max_velocity.max(velocity);
        base.kinetics = Kinetics::new(velocity, max_velocity);
        base.kinetics.desired_velocity = velocity;
        base.kinetics.max_acceleration = attrs.max_acceleration.abs();
        base.kinetics.max_deceleration = -attrs.max_deceleration.abs();
        base.track_lateral(0.0);
        base.location
            .set_rear_axle_offset(ctx, entry.rear_axle_offset);
        base.update_polygon(ctx);
        base.save_stable_state();

        let mut vehicle = Self {
            base,
            model: AccelerationModel::new(config),
            rand: Pseudorandom::new(attrs.id, config.random_seed),
            rear_axle_offset: entry.rear_axle_offset,
            next: None,
            acc_event: None,
            planned_acc: 0.0,
            fcw: None,
        };
        vehicle.next = vehicle.choose_next(ctx.road());
        log::info!(
            "{} placed on {} at s={:.2}",
            vehicle.base.identity().sys_id(),
            proj.info,
            vehicle.base.location.live().distance_along_curve
        );
        Ok(vehicle)
    }

    /// The lane or lane-link the vehicle will move onto next.
    pub fn next_lane(&self) -> Option<LaneInfo> {
        self.next
    }

    /// The forward-collision metrics computed at the end of the last tick.
    pub fn fcw(&self) -> Option<FcwMetrics> {
        self.fcw
    }

    pub(crate) fn set_fcw(&mut self, fcw: Option<FcwMetrics>) {
        self.fcw = fcw;
    }

    /// Set the desired velocity adjustment factor.
    pub(crate) fn set_velocity_adjust(&mut self, factor: f64) {
        self.model.set_velocity_adjust(factor);
    }

    pub fn velocity_adjust(&self) -> f64 {
        self.model.velocity_adjust()
    }

    /// Picks the successor of the current lane or lane-link. A lane continuing
    /// directly is preferred to a lane-link; ties are broken pseudorandomly.
    fn choose_next(&mut self, road: &dyn RoadNetwork) -> Option<LaneInfo> {
        match self.base.location.live().lane_info {
            LaneInfo::Link { to, .. } => Some(LaneInfo::Lane(to)),
            LaneInfo::Lane(uid) => {
                let lanes = road.next_lanes(uid);
                if let Some(idx) = self.rand.pick(lanes.len()) {
                    return Some(LaneInfo::Lane(lanes[idx]));
                }
                let links = road.next_links(uid);
                self.rand.pick(links.len()).map(|idx| links[idx].info())
            }
        }
    }

    /// Computes the acceleration for the coming tick from the stable state of
    /// the elements ahead and the colours of the signals at the end of the lane.
    pub(crate) fn plan(
        &self,
        ctx: &RunContext,
        elements: &ElementSet,
        signals: &HashMap<u64, SignalColor>,
    ) -> f64 {
        let kin = &self.base.kinetics;
        if let Some(event) = &self.acc_event {
            return event.acceleration;
        }
        let mut model = self.model.clone();
        model.free_road(kin.velocity, kin.desired_velocity);

        if let Some((gap, their_vel)) = self.find_leader(ctx, elements) {
            model.follow_vehicle(gap, kin.velocity, their_vel);
        }
        if let Some(poly) = self.base.geometry.polygon() {
            let front = poly.center() + poly.front() * poly.half_length();
            let stop = front + poly.front() * model.stopping_distance(kin.velocity);
            ctx.debug.line("stopping distance", front, stop);
        }

        let loc = self.base.location.live();
        if let (LaneInfo::Lane(_), Some(LaneInfo::Link { id, .. })) = (loc.lane_info, self.next) {
            let dist = loc.invert_distance_along_curve() - 0.5 * self.base.geometry.length;
            match signals.get(&id).map(|c| c.effective()) {
                Some(SignalColor::Red) => model.stop_at_line(dist, kin.velocity),
                Some(SignalColor::Yellow) if dist >= model.stopping_distance(kin.velocity) => {
                    model.stop_at_line(dist, kin.velocity)
                }
                _ => {}
            }
        }
        model.acc()
    }

    /// The net gap to, and velocity of, the nearest element ahead whose
    /// footprint overlaps this vehicle's path laterally.
    fn find_leader(&self, ctx: &RunContext, elements: &ElementSet) -> Option<(f64, f64)> {
        let hashed = self.base.location.hashed()?;
        let loc = self.base.location.stable();
        let heading = loc.heading;
        let left = rot90(heading);
        let center = loc.geom_center.enu_2d(&ctx.geo);
        let front = center.to_vec().dot(heading) + 0.5 * self.base.geometry.length;
        let half_width = 0.5 * self.base.geometry.width;
        let lateral = Interval::new(
            center.to_vec().dot(left) - half_width,
            center.to_vec().dot(left) + half_width,
        );

        let buckets = once(hashed).chain(hashed.front_chain(
            ctx.road(),
            ctx.scope_len(),
            ctx.config.leader_search_buckets,
        ));
        buckets
            .flat_map(|bucket| ctx.lanes.elements_in(&bucket))
            .filter(|id| *id != self.base.id())
            .filter_map(|id| elements.get(id))
            .filter_map(|other| {
                let poly = other.visible_polygon()?;
                let along = (poly.center() - center).dot(heading);
                if along <= 0.0 || !poly.project(left).overlaps(&lateral) {
                    return None;
                }
                let gap = poly.project(heading).min - front;
                Some((gap, other.stable_velocity()))
            })
            .min_by(|a, b| a.0.total_cmp(&b.0))
    }

    pub(crate) fn set_planned_acc(&mut self, acc: f64) {
        self.planned_acc = acc;
    }

    pub(crate) fn update(&mut self, ctx: &RunContext, time: &TimeContext) {
        if !self.base.life.is_running() {
            return;
        }
        let dt = time.relative_time;
        let kin = &mut self.base.kinetics;
        kin.acceleration = match &self.acc_event {
            Some(event) => event.acceleration,
            None => self.planned_acc,
        };
        let dist = kin.integrate(dt);
        if let Some(event) = &mut self.acc_event {
            if event.check(kin, dt) {
                self.acc_event = None;
            }
        }
        self.advance(ctx, dist);
        self.base.track_lateral(dt);
    }

    /// Moves the vehicle `dist` metres forward, transferring onto the next
    /// lane or lane-link as each one ends.
    fn advance(&mut self, ctx: &RunContext, dist: f64) {
        let sys_id = self.base.identity().sys_id();
        let committed = (self.next, self.rand.clone());
        let live = self.base.location.live();
        let prev_center = live.geom_center.enu_2d(&ctx.geo);
        let prev_heading = live.heading;
        let offset = live.lane_offset;
        let mut s = live.distance_along_curve + dist;

        while s > self.base.location.live().lane_length {
            let len = self.base.location.live().lane_length;
            let Some(next) = self.next else {
                s = len;
                log::info!("{sys_id} reached the end of {}", self.base.location.live().lane_info);
                self.base.stop();
                break;
            };
            if let Err(err) = self.base.location.bind(ctx, next) {
                log::warn!("{sys_id} lost its tracker: {err}");
                self.roll_back(committed);
                return;
            }
            s -= len;
            self.next = self.choose_next(ctx.road());
        }

        if self.base.location.relocate(ctx, s, offset).is_none() {
            log::warn!(
                "{sys_id} lost its tracker on {}",
                self.base.location.live().lane_info
            );
            self.roll_back(committed);
            return;
        }

        let live = self.base.location.live();
        let new_center = live.geom_center.enu_2d(&ctx.geo);
        let lane_dir = live.lane_dir_2d();
        let heading = if new_center.distance(prev_center) < MIN_HEADING_STEP {
            prev_heading
        } else {
            calc_direction(prev_center, prev_heading, new_center, self.rear_axle_offset)
                .unwrap_or(lane_dir)
        };
        self.base.location.live_mut().heading = heading;
        self.base
            .location
            .set_rear_axle_offset(ctx, self.rear_axle_offset);
        self.base.update_polygon(ctx);
        if !self.base.life.is_ended() {
            self.base.location.refresh_bucket(self.base.id(), ctx);
        }
    }

    /// Returns to the pose, binding and successor the tick started with.
    fn roll_back(&mut self, (next, rand): (Option<LaneInfo>, Pseudorandom)) {
        self.next = next;
        self.rand = rand;
        self.base.location.hold_stable();
    }

    pub(crate) fn handle_event(&mut self, event: ElementEvent) -> bool {
        let kin = &mut self.base.kinetics;
        match event {
            ElementEvent::Velocity { velocity, .. } => {
                kin.velocity = velocity.max(0.0);
                kin.desired_velocity = kin.velocity;
                kin.max_velocity = kin.max_velocity.max(kin.velocity);
                self.acc_event = None;
            }
            ElementEvent::Acceleration { acceleration, end } => {
                self.acc_event = Some(AccEvent::new(acceleration, end, kin.velocity));
            }
        }
        true
    }

    pub(crate) fn output(&self, ctx: &RunContext) -> VehicleOutput {
        let live = self.base.location.live();
        VehicleOutput {
            id: self.base.identity().id(),
            vehicle_type: self.base.type_name().to_owned(),
            pose: self.base.pose(ctx),
            velocity: self.base.kinetics.velocity,
            acceleration: self.base.kinetics.acceleration,
            lane: live.lane_info,
            s: live.distance_along_curve,
            offset: live.lane_offset,
            fcw: self.fcw,
        }
    }
}

/// The heading after the point `radius` metres ahead of a trailing axle moves
/// from `pos` to `new_pos`, the axle having faced `dir`.
fn calc_direction(pos: Point2d, dir: Vector2d, new_pos: Point2d, radius: f64) -> Option<Vector2d> {
    if radius <= 0.0 {
        return try_normalize(new_pos - pos);
    }
    let b = pos - radius * dir;
    let v = pos - b;
    let h = (v.magnitude2() - radius.powi(2)) / (2.0 * (radius + v.dot(dir)));
    let bp = b + h * dir;
    try_normalize(new_pos - bp)
}
