use super::{resolve_route_start, Base, ElementKind, LifeCycle};
use crate::consistency::ParallelSimulation;
use crate::context::RunContext;
use crate::error::InitError;
use crate::math::{flatten, heading_of, Wgs84};
use crate::output::SignalOutput;
use crate::road::{LaneInfo, LaneLink, LaneUid, RoadNetwork};
use crate::scene::{CatalogEntry, Dimensions, SignalAttributes};
use crate::signal::{ControlPhase, SignalColor, SignalPhasePeriod, AGE_FOREVER};
use crate::time::TimeContext;
use crate::ElementId;

/// The nominal extents of a signal head.
const SIGNAL_DIMENSIONS: Dimensions = Dimensions::new(0.5, 0.5, 1.2);

/// The signal is shown this far before the end of the first controlled lane.
const SHOW_MARGIN: f64 = 0.5; // m

/// Where a signal light's colour comes from.
#[derive(Clone, Debug)]
pub enum SignalMode {
    /// Computed locally from a fixed-time plan.
    Local(SignalPhasePeriod),
    /// Pushed by an external authority. `pending` is applied at the next update.
    Replicated {
        color: SignalColor,
        pending: Option<SignalColor>,
    },
}

/// A signal light controlling the lane-links leaving a set of lanes.
#[derive(Clone, Debug)]
pub struct SignalLight {
    pub(crate) base: Base,
    mode: SignalMode,
    attrs: SignalAttributes,
    phases: Vec<ControlPhase>,
    control_lanes: Vec<LaneUid>,
    control_links: Vec<LaneLink>,
    show_position: Wgs84,
    show_heading: f64,
}

impl SignalLight {
    pub(crate) fn new(
        id: ElementId,
        attrs: &SignalAttributes,
        ctx: &RunContext,
    ) -> Result<Self, InitError> {
        let life = LifeCycle::new(
            attrs.start_time,
            attrs.end_time.unwrap_or(ctx.config.max_lifetime),
        );
        let entry = CatalogEntry::new(SIGNAL_DIMENSIONS, 0.0);
        let mut base = Base::new(id, ElementKind::SignalLight, attrs.id, "Signal", life, &entry)?;
        let proj = resolve_route_start(ctx, &attrs.route, None)?;
        base.location.init_on_lane(ctx, proj.info, proj.s, 0.0)?;
        base.save_stable_state();

        let mode = if attrs.replicated {
            SignalMode::Replicated {
                color: SignalColor::Grey,
                pending: None,
            }
        } else {
            let mut period =
                SignalPhasePeriod::new(attrs.phase_offset, attrs.green, attrs.yellow, attrs.red);
            period.compute_color(0.0);
            SignalMode::Local(period)
        };
        let mut light = Self {
            base,
            mode,
            attrs: attrs.clone(),
            phases: ControlPhase::parse_list(&attrs.control_phases),
            control_lanes: vec![],
            control_links: vec![],
            show_position: Wgs84::default(),
            show_heading: 0.0,
        };
        light.derive_control(ctx.road())?;
        log::info!(
            "{} controls {} lane-links from {} lanes",
            light.base.identity().sys_id(),
            light.control_links.len(),
            light.control_lanes.len()
        );
        Ok(light)
    }

    /// Finds the controlled lanes and lane-links, and where the signal is shown.
    fn derive_control(&mut self, road: &dyn RoadNetwork) -> Result<(), InitError> {
        let own = match self.base.location.live().lane_info {
            LaneInfo::Lane(uid) => uid,
            LaneInfo::Link { from, .. } => from,
        };
        self.control_lanes = if self.attrs.control_lanes.is_empty() {
            vec![own]
        } else {
            self.attrs
                .control_lanes
                .iter()
                .map(|lane| LaneUid { lane: *lane, ..own })
                .collect()
        };
        // Links without a movement are treated as going straight.
        self.control_links = self
            .control_lanes
            .iter()
            .flat_map(|lane| road.next_links(*lane))
            .filter(|link| {
                self.phases
                    .contains(&link.phase.unwrap_or(ControlPhase::Straight))
            })
            .collect();

        let first = LaneInfo::Lane(self.control_lanes[0]);
        let len = road
            .lane_length(&first)
            .ok_or(InitError::UnresolvedLane(first))?;
        let s = f64::max(len - SHOW_MARGIN, 0.0);
        let pos = road
            .lane_point(&first, s)
            .ok_or(InitError::UnresolvedLane(first))?;
        let dir = road
            .lane_direction(&first, s)
            .ok_or(InitError::UnresolvedLane(first))?;
        self.show_position = pos;
        self.show_heading = heading_of(flatten(dir));
        Ok(())
    }

    pub fn mode(&self) -> &SignalMode {
        &self.mode
    }

    pub fn is_replicated(&self) -> bool {
        matches!(self.mode, SignalMode::Replicated { .. })
    }

    /// The colour currently shown. A replicated signal is grey until its first colour arrives.
    pub fn color(&self) -> SignalColor {
        match &self.mode {
            SignalMode::Local(period) => period.phase(),
            SignalMode::Replicated { color, .. } => *color,
        }
    }

    /// Time left in the current colour.
    pub fn age(&self) -> f64 {
        match &self.mode {
            SignalMode::Local(period) => period.age(),
            SignalMode::Replicated { .. } => AGE_FOREVER,
        }
    }

    pub fn next_color(&self) -> SignalColor {
        match &self.mode {
            SignalMode::Local(period) => period.next_phase(),
            SignalMode::Replicated { color, .. } => *color,
        }
    }

    pub fn next_age(&self) -> f64 {
        match &self.mode {
            SignalMode::Local(period) => period.next_age(),
            SignalMode::Replicated { .. } => AGE_FOREVER,
        }
    }

    pub fn control_lanes(&self) -> &[LaneUid] {
        &self.control_lanes
    }

    pub fn control_phases(&self) -> &[ControlPhase] {
        &self.phases
    }

    pub fn control_links(&self) -> &[LaneLink] {
        &self.control_links
    }

    /// True if traffic on the lane-link obeys this signal.
    pub fn controls(&self, link_id: u64) -> bool {
        self.control_links.iter().any(|link| link.id == link_id)
    }

    pub(crate) fn update(&mut self, time: &TimeContext) {
        if !self.base.life.is_running() {
            return;
        }
        let before = self.color();
        match &mut self.mode {
            SignalMode::Local(period) => {
                period.compute_color(time.pass_time);
            }
            SignalMode::Replicated { color, pending } => {
                if let Some(next) = pending.take() {
                    *color = next;
                }
            }
        }
        if self.color() != before {
            log::debug!(
                "{} turned {} at {:.2}",
                self.base.identity().sys_id(),
                self.color(),
                time.pass_time
            );
        }
    }

    pub(crate) fn output(&self, _ctx: &RunContext) -> SignalOutput {
        SignalOutput {
            id: self.base.identity().id(),
            color: self.color().effective(),
            age: self.age(),
            next_color: self.next_color().effective(),
            next_age: self.next_age(),
            position: self.show_position,
            heading: self.show_heading,
            plan: self.attrs.plan,
            junction: self.attrs.junction,
            phase_number: self.attrs.phase_number,
            signal_head: self.attrs.signal_head,
            event_id: self.attrs.event_id,
            control_lanes: self.control_lanes.clone(),
            control_phases: self.phases.clone(),
            control_links: self.control_links.iter().map(|link| link.id).collect(),
        }
    }
}

impl ParallelSimulation for SignalLight {
    fn initialize_parallel_simulation(&mut self, road: &dyn RoadNetwork) -> Result<(), InitError> {
        self.derive_control(road)
    }

    fn update_parallel_simulation(&mut self, color: SignalColor) {
        match &mut self.mode {
            SignalMode::Replicated { pending, .. } => *pending = Some(color),
            SignalMode::Local(_) => log::warn!(
                "{} computes its own colour, ignoring {color}",
                self.base.identity().sys_id()
            ),
        }
    }
}
