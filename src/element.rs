//! Traffic participants and their per-tick update pipelines.

use crate::consistency::SimulationConsistency;
use crate::context::RunContext;
use crate::error::InitError;
use crate::math::{heading_of, Coord, OrientedBox, Vector2d, Vector3d};
use crate::output::{ElementOutput, Pose};
use crate::road::{LaneInfo, LaneProjection, LaneUid};
use crate::scene::{CatalogEntry, Dimensions, ElementSource, Route};
use crate::time::TimeContext;
use crate::ElementId;

pub use component::{
    AccEndCondition, AccEvent, ElementKind, GeometryData, Identity, Kinetics, LifeCycle,
    LifeCycleState, SysId,
};
pub use fcw::{compute_fcw, FcwMetrics, FcwState, FCW_UNDEFINED};
pub use location::{Location, LocationState};
pub use obstacle::Obstacle;
pub use pedestrian::Pedestrian;
pub use random::Pseudorandom;
pub use signal_light::{SignalLight, SignalMode};
pub use vehicle::Vehicle;

mod acceleration;
mod component;
mod fcw;
mod location;
mod obstacle;
mod pedestrian;
mod random;
mod signal_light;
mod vehicle;

/// An external command addressed to a single element.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ElementEvent {
    /// Move at `velocity` m/s. Pedestrians also turn `direction` degrees
    /// anticlockwise and switch to walking in a fixed direction.
    Velocity { direction: f64, velocity: f64 },
    /// Accelerate until the end condition is met.
    Acceleration {
        acceleration: f64,
        end: AccEndCondition,
    },
}

/// The records shared by every kind of element.
#[derive(Clone, Debug)]
pub struct Base {
    id: ElementId,
    identity: Identity,
    type_name: String,
    pub(crate) life: LifeCycle,
    pub(crate) kinetics: Kinetics,
    pub(crate) geometry: GeometryData,
    pub(crate) location: Location,
    source: ElementSource,
    terminate_on_stop: bool,
    stable_kinetics: Kinetics,
    stable_polygon: Option<OrientedBox>,
}

impl Base {
    pub(crate) fn new(
        id: ElementId,
        kind: ElementKind,
        user_id: i64,
        type_name: &str,
        life: LifeCycle,
        entry: &CatalogEntry,
    ) -> Result<Self, InitError> {
        let Dimensions {
            length,
            width,
            height,
        } = entry.dimensions;
        if !entry.dimensions.is_valid() {
            return Err(InitError::InvalidDimensions {
                length,
                width,
                height,
            });
        }
        let mut geometry = GeometryData::new(kind, length, width, height);
        geometry.transparent = entry.transparent;
        Ok(Self {
            id,
            identity: Identity::new(kind, user_id),
            type_name: type_name.to_owned(),
            life,
            kinetics: Kinetics::default(),
            geometry,
            location: Location::default(),
            source: ElementSource::Scene,
            terminate_on_stop: false,
            stable_kinetics: Kinetics::default(),
            stable_polygon: None,
        })
    }

    pub(crate) fn with_stop_policy(mut self, source: ElementSource, terminate_on_stop: bool) -> Self {
        self.source = source;
        self.terminate_on_stop = terminate_on_stop;
        self
    }

    pub fn id(&self) -> ElementId {
        self.id
    }

    pub fn identity(&self) -> Identity {
        self.identity
    }

    pub fn kind(&self) -> ElementKind {
        self.geometry.kind
    }

    /// The catalog type name.
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn life(&self) -> &LifeCycle {
        &self.life
    }

    pub fn kinetics(&self) -> &Kinetics {
        &self.kinetics
    }

    pub fn geometry(&self) -> &GeometryData {
        &self.geometry
    }

    pub fn location(&self) -> &Location {
        &self.location
    }

    pub fn source(&self) -> ElementSource {
        self.source
    }

    /// Freezes the element where it is. Elements set to terminate on stop,
    /// and injected elements, end instead.
    pub(crate) fn stop(&mut self) {
        if self.life.advance(LifeCycleState::Stopped) {
            log::info!("{} stopped", self.identity.sys_id());
        }
        self.kinetics.lateral_displacement = self.location.live().lane_offset;
        self.kinetics.halt();
        if self.terminate_on_stop || self.source == ElementSource::Injected {
            self.life.advance(LifeCycleState::Ended);
        }
    }

    /// Follows the live lane offset over a tick of `dt` seconds. A change of
    /// lane resets the lateral velocity.
    pub(crate) fn track_lateral(&mut self, dt: f64) {
        let loc = &self.location;
        let offset = loc.live().lane_offset;
        let same_lane = loc.live().lane_info == loc.stable().lane_info;
        self.kinetics.lateral_velocity = if same_lane && dt > 0.0 {
            (offset - self.kinetics.lateral_displacement) / dt
        } else {
            0.0
        };
        self.kinetics.lateral_displacement = offset;
    }

    /// Removes an ended element from the indices.
    fn retire(&mut self, ctx: &RunContext) {
        if self.location.hashed().is_some() {
            log::info!("{} ended", self.identity.sys_id());
        }
        self.location.clear_bucket(self.id, ctx);
        self.geometry.reset();
    }

    /// Recomputes the footprint from the live centre and heading.
    pub(crate) fn update_polygon(&mut self, ctx: &RunContext) {
        let live = self.location.live();
        let center = live.geom_center.enu_2d(&ctx.geo);
        let heading = live.heading;
        if let Err(err) = self.geometry.compute_polygon(center, heading) {
            log::warn!("{} has no footprint: {err}", self.identity.sys_id());
            self.geometry.reset();
        }
    }

    fn save_stable_state(&mut self) {
        self.location.save_stable_state();
        self.stable_kinetics = self.kinetics;
        self.stable_polygon = self.geometry.polygon().copied();
    }

    pub(crate) fn pose(&self, ctx: &RunContext) -> Pose {
        let live = self.location.live();
        Pose {
            position: live.geom_center.wgs84(&ctx.geo),
            heading: heading_of(live.heading),
            length: self.geometry.length,
            width: self.geometry.width,
            height: self.geometry.height,
        }
    }
}

/// Resolves where a route starts, optionally moving to another lane of the same section.
fn resolve_route_start(
    ctx: &RunContext,
    route: &Route,
    lane_id: Option<i64>,
) -> Result<LaneProjection, InitError> {
    let road = ctx.road();
    let start = route.start;
    let mut proj = road
        .resolve_lane_at(start)
        .or_else(|| road.resolve_lane_link_at(start))
        .ok_or(InitError::UnresolvedLocation {
            lon: start.lon,
            lat: start.lat,
        })?;
    if let (Some(lane), LaneInfo::Lane(uid)) = (lane_id, proj.info) {
        let info = LaneInfo::Lane(LaneUid { lane, ..uid });
        let (s, _) = road
            .project(&info, start)
            .ok_or(InitError::UnresolvedLane(info))?;
        proj = LaneProjection {
            info,
            s,
            offset: 0.0,
        };
    }
    Ok(proj)
}

/// Binds a location to whichever of a lane or lane-link `info` names.
fn bind_location(
    location: &mut Location,
    ctx: &RunContext,
    info: LaneInfo,
    s: f64,
    offset: f64,
) -> Result<(), InitError> {
    let len = ctx
        .road()
        .lane_length(&info)
        .ok_or(InitError::UnresolvedLane(info))?;
    let s = s.clamp(0.0, len);
    if info.is_on_lane_link() {
        location.init_on_lane_link(ctx, info, s, offset)
    } else {
        location.init_on_lane(ctx, info, s, offset)
    }
}

/// A traffic participant.
#[derive(Clone, Debug)]
pub enum Element {
    Vehicle(Vehicle),
    Pedestrian(Pedestrian),
    Obstacle(Obstacle),
    SignalLight(SignalLight),
}

impl Element {
    pub fn base(&self) -> &Base {
        match self {
            Self::Vehicle(el) => &el.base,
            Self::Pedestrian(el) => &el.base,
            Self::Obstacle(el) => &el.base,
            Self::SignalLight(el) => &el.base,
        }
    }

    pub(crate) fn base_mut(&mut self) -> &mut Base {
        match self {
            Self::Vehicle(el) => &mut el.base,
            Self::Pedestrian(el) => &mut el.base,
            Self::Obstacle(el) => &mut el.base,
            Self::SignalLight(el) => &mut el.base,
        }
    }

    pub fn kind(&self) -> ElementKind {
        self.base().kind()
    }

    pub fn id(&self) -> ElementId {
        self.base().id()
    }

    pub fn sys_id(&self) -> SysId {
        self.base().identity().sys_id()
    }

    pub fn as_vehicle(&self) -> Option<&Vehicle> {
        match self {
            Self::Vehicle(veh) => Some(veh),
            _ => None,
        }
    }

    pub fn as_pedestrian(&self) -> Option<&Pedestrian> {
        match self {
            Self::Pedestrian(ped) => Some(ped),
            _ => None,
        }
    }

    pub fn as_signal_light(&self) -> Option<&SignalLight> {
        match self {
            Self::SignalLight(sig) => Some(sig),
            _ => None,
        }
    }

    pub(crate) fn as_signal_light_mut(&mut self) -> Option<&mut SignalLight> {
        match self {
            Self::SignalLight(sig) => Some(sig),
            _ => None,
        }
    }

    /// Starts or ends the element according to the time, filing it in or
    /// removing it from the hashed lane index.
    pub(crate) fn check_lifecycle(&mut self, ctx: &RunContext, abs_time: f64) {
        let files_in_lanes = !matches!(self, Self::SignalLight(_));
        let base = self.base_mut();
        let before = base.life.state();
        if !base.life.check(abs_time) {
            return;
        }
        match base.life.state() {
            LifeCycleState::Ended => base.retire(ctx),
            LifeCycleState::Running if before == LifeCycleState::Pending => {
                log::info!("{} started at {abs_time}", base.identity.sys_id());
                if files_in_lanes {
                    base.update_polygon(ctx);
                    base.location.refresh_bucket(base.id, ctx);
                }
            }
            _ => {}
        }
    }

    /// Moves the element to the end of its life.
    pub(crate) fn kill(&mut self, ctx: &RunContext) {
        let base = self.base_mut();
        base.life.advance(LifeCycleState::Ended);
        base.retire(ctx);
    }

    /// Stops the element in place. See [Base::stop].
    pub(crate) fn stop(&mut self, ctx: &RunContext) {
        let base = self.base_mut();
        base.stop();
        if base.life.is_ended() {
            base.retire(ctx);
        }
    }

    /// Advances the element by one tick. Only the element's own live state and
    /// the shared indices are written.
    pub(crate) fn update(&mut self, ctx: &RunContext, time: &TimeContext) {
        match self {
            Self::Vehicle(veh) => veh.update(ctx, time),
            Self::Pedestrian(ped) => ped.update(ctx, time),
            Self::Obstacle(obs) => obs.update(ctx, time),
            Self::SignalLight(sig) => sig.update(time),
        }
        let base = self.base_mut();
        if base.life.is_ended() {
            base.retire(ctx);
        }
    }

    /// Applies an external command. Returns false if the element ignores it.
    pub(crate) fn handle_event(&mut self, event: ElementEvent) -> bool {
        match self {
            Self::Vehicle(veh) => veh.handle_event(event),
            Self::Pedestrian(ped) => ped.handle_event(event),
            Self::Obstacle(_) | Self::SignalLight(_) => false,
        }
    }

    /// The element's output for this tick, if it is alive.
    pub(crate) fn output(&self, ctx: &RunContext) -> Option<ElementOutput> {
        if !self.base().life.is_alive() {
            return None;
        }
        Some(match self {
            Self::Vehicle(veh) => ElementOutput::Vehicle(veh.output(ctx)),
            Self::Pedestrian(ped) => ElementOutput::Pedestrian(ped.output(ctx)),
            Self::Obstacle(obs) => ElementOutput::Obstacle(obs.output(ctx)),
            Self::SignalLight(sig) => ElementOutput::Signal(sig.output(ctx)),
        })
    }

    /// The footprint other elements see, for alive elements that are not transparent.
    pub(crate) fn visible_polygon(&self) -> Option<&OrientedBox> {
        let base = self.base();
        if !base.life.is_alive() || base.geometry.transparent {
            return None;
        }
        self.stable_polygon()
    }
}

impl SimulationConsistency for Element {
    fn consistency_id(&self) -> SysId {
        self.sys_id()
    }

    fn stable_geom_center(&self) -> &Coord {
        &self.base().location.stable().geom_center
    }

    fn stable_rear_axle_center(&self) -> &Coord {
        &self.base().location.stable().rear_axle_center
    }

    fn stable_lane_info(&self) -> LaneInfo {
        self.base().location.stable().lane_info
    }

    fn stable_lane_dir(&self) -> Vector3d {
        self.base().location.stable().lane_dir
    }

    fn stable_heading(&self) -> Vector2d {
        self.base().location.stable().heading
    }

    fn stable_velocity(&self) -> f64 {
        self.base().stable_kinetics.velocity
    }

    fn stable_acc(&self) -> f64 {
        self.base().stable_kinetics.acceleration
    }

    fn stable_distance_along_curve(&self) -> f64 {
        self.base().location.stable().distance_along_curve
    }

    fn stable_invert_distance_along_curve(&self) -> f64 {
        self.base().location.stable().invert_distance_along_curve()
    }

    fn stable_polygon(&self) -> Option<&OrientedBox> {
        self.base().stable_polygon.as_ref()
    }

    fn save_stable_state(&mut self) {
        self.base_mut().save_stable_state();
    }
}
