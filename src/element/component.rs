//! Records shared by every element kind.

use crate::error::GeometryError;
use crate::math::{OrientedBox, Point2d, Vector2d};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::fmt;

/// The kind of an element.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ElementKind {
    Vehicle,
    Pedestrian,
    Obstacle,
    SignalLight,
}

impl ElementKind {
    fn tag(self) -> u64 {
        match self {
            Self::Vehicle => 1,
            Self::Pedestrian => 2,
            Self::Obstacle => 3,
            Self::SignalLight => 4,
        }
    }

    fn from_tag(tag: u64) -> Option<Self> {
        match tag {
            1 => Some(Self::Vehicle),
            2 => Some(Self::Pedestrian),
            3 => Some(Self::Obstacle),
            4 => Some(Self::SignalLight),
            _ => None,
        }
    }
}

const ID_BITS: u32 = 56;
const ID_MASK: u64 = (1 << ID_BITS) - 1;

/// An identifier unique across all element kinds, derived from the kind and the user id.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SysId(u64);

impl SysId {
    /// User ids are truncated to their low 56 bits.
    pub fn new(kind: ElementKind, id: i64) -> Self {
        Self(kind.tag() << ID_BITS | (id as u64 & ID_MASK))
    }

    pub fn kind(&self) -> Option<ElementKind> {
        ElementKind::from_tag(self.0 >> ID_BITS)
    }

    /// The user id, sign-extended back from 56 bits.
    pub fn id(&self) -> i64 {
        let raw = (self.0 & ID_MASK) << (64 - ID_BITS);
        (raw as i64) >> (64 - ID_BITS)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for SysId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind() {
            Some(kind) => write!(f, "{:?}#{}", kind, self.id()),
            None => write!(f, "#{}", self.0),
        }
    }
}

/// The user-facing id of an element and its derived system id.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Identity {
    id: i64,
    sys_id: SysId,
}

impl Identity {
    pub fn new(kind: ElementKind, id: i64) -> Self {
        Self {
            id,
            sys_id: SysId::new(kind, id),
        }
    }

    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn sys_id(&self) -> SysId {
        self.sys_id
    }
}

/// The state of an element's life cycle. States are only ever entered in this order.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum LifeCycleState {
    #[default]
    Pending,
    Running,
    Stopped,
    Ended,
}

/// When an element is active.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LifeCycle {
    start_time: f64,
    end_time: f64,
    state: LifeCycleState,
}

impl LifeCycle {
    pub fn new(start_time: f64, end_time: f64) -> Self {
        Self {
            start_time,
            end_time,
            state: LifeCycleState::Pending,
        }
    }

    pub fn state(&self) -> LifeCycleState {
        self.state
    }

    pub fn start_time(&self) -> f64 {
        self.start_time
    }

    pub fn end_time(&self) -> f64 {
        self.end_time
    }

    /// Moves to `to` if it lies ahead of the current state.
    /// Returns true if the state changed.
    pub fn advance(&mut self, to: LifeCycleState) -> bool {
        if to > self.state {
            self.state = to;
            true
        } else {
            false
        }
    }

    /// Starts or ends the element according to the time. Returns true if the state changed.
    pub fn check(&mut self, abs_time: f64) -> bool {
        let mut changed = false;
        if self.state == LifeCycleState::Pending && abs_time >= self.start_time {
            changed |= self.advance(LifeCycleState::Running);
        }
        if self.state != LifeCycleState::Pending && abs_time >= self.end_time {
            changed |= self.advance(LifeCycleState::Ended);
        }
        changed
    }

    /// True while the element moves.
    pub fn is_running(&self) -> bool {
        self.state == LifeCycleState::Running
    }

    /// True once started and until ended.
    pub fn is_alive(&self) -> bool {
        matches!(self.state, LifeCycleState::Running | LifeCycleState::Stopped)
    }

    pub fn is_ended(&self) -> bool {
        self.state == LifeCycleState::Ended
    }
}

/// Velocities are treated as stopped below this.
const STOPPED_VELOCITY: f64 = 0.01; // m/s

/// The motion state of an element.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Kinetics {
    /// Velocity in m/s.
    pub velocity: f64,
    /// Acceleration in m/s<sup>2</sup>.
    pub acceleration: f64,
    /// The velocity the element tries to keep in m/s.
    pub desired_velocity: f64,
    /// The velocity never exceeded in m/s.
    pub max_velocity: f64,
    /// Lateral velocity in m/s, positive to the left.
    pub lateral_velocity: f64,
    /// Lateral displacement from the lane centre in m, positive to the left.
    pub lateral_displacement: f64,
    /// Maximum acceleration in m/s<sup>2</sup>.
    pub max_acceleration: f64,
    /// Maximum deceleration in m/s<sup>2</sup>, a negative number.
    pub max_deceleration: f64,
    /// Heading change requested by the last velocity event, in degrees.
    pub direction: f64,
    pub last_velocity: f64,
    pub last_acceleration: f64,
}

impl Kinetics {
    pub fn new(velocity: f64, max_velocity: f64) -> Self {
        Self {
            velocity,
            desired_velocity: max_velocity,
            max_velocity,
            max_acceleration: f64::INFINITY,
            max_deceleration: f64::NEG_INFINITY,
            last_velocity: velocity,
            ..Default::default()
        }
    }

    /// Clamps the acceleration to the element's limits.
    pub fn limit_acceleration(&mut self) {
        self.acceleration = self
            .acceleration
            .clamp(self.max_deceleration, self.max_acceleration);
    }

    /// Clamps the velocity to `[0, max_velocity]`.
    pub fn limit_velocity(&mut self) {
        self.velocity = self.velocity.clamp(0.0, self.max_velocity.max(0.0));
    }

    /// Integrates the acceleration over `dt` seconds, returning the distance travelled.
    pub fn integrate(&mut self, dt: f64) -> f64 {
        self.last_velocity = self.velocity;
        self.last_acceleration = self.acceleration;
        self.limit_acceleration();
        let v0 = self.velocity;
        self.velocity += self.acceleration * dt;
        self.limit_velocity();
        0.5 * (v0 + self.velocity) * dt
    }

    /// Zeroes every rate, keeping the lateral displacement.
    pub fn halt(&mut self) {
        self.velocity = 0.0;
        self.acceleration = 0.0;
        self.lateral_velocity = 0.0;
    }

    pub fn is_stopped(&self) -> bool {
        self.velocity < STOPPED_VELOCITY
    }
}

/// How an active acceleration event ends.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum AccEndCondition {
    /// After this many seconds.
    Time(f64),
    /// Once this velocity in m/s is reached.
    Velocity(f64),
}

/// An acceleration applied until its end condition is met.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AccEvent {
    pub acceleration: f64,
    end: AccEndCondition,
    remaining_time: f64,
    /// The velocity when the event began.
    happen_velocity: f64,
}

impl AccEvent {
    pub fn new(acceleration: f64, end: AccEndCondition, velocity: f64) -> Self {
        let remaining_time = match end {
            AccEndCondition::Time(t) => t,
            AccEndCondition::Velocity(_) => 0.0,
        };
        Self {
            acceleration,
            end,
            remaining_time,
            happen_velocity: velocity,
        }
    }

    /// Checks the end condition after `dt` seconds of integration.
    /// When met, the acceleration is cleared and true is returned.
    pub fn check(&mut self, kinetics: &mut Kinetics, dt: f64) -> bool {
        match self.end {
            AccEndCondition::Time(_) => {
                self.remaining_time -= dt;
                if self.remaining_time > 0.0 {
                    return false;
                }
            }
            AccEndCondition::Velocity(target) => {
                let rising = self.happen_velocity <= target && kinetics.velocity >= target;
                let falling = self.happen_velocity >= target && kinetics.velocity <= target;
                if !(rising || falling) {
                    return false;
                }
                kinetics.velocity = target;
            }
        }
        kinetics.acceleration = 0.0;
        true
    }
}

/// The footprint and extents of an element.
#[derive(Clone, Debug, PartialEq)]
pub struct GeometryData {
    pub length: f64,
    pub width: f64,
    pub height: f64,
    pub kind: ElementKind,
    /// Transparent elements are not reported by overlap queries.
    pub transparent: bool,
    polygon: Option<OrientedBox>,
}

impl GeometryData {
    pub fn new(kind: ElementKind, length: f64, width: f64, height: f64) -> Self {
        Self {
            length,
            width,
            height,
            kind,
            transparent: false,
            polygon: None,
        }
    }

    /// Recomputes the footprint around `center`, facing `front`.
    pub fn compute_polygon(
        &mut self,
        center: Point2d,
        front: Vector2d,
    ) -> Result<&OrientedBox, GeometryError> {
        let obb = OrientedBox::new(center, front, 0.5 * self.length, 0.5 * self.width)?;
        Ok(self.polygon.insert(obb))
    }

    /// The footprint, if it has been computed since the last reset.
    pub fn polygon(&self) -> Option<&OrientedBox> {
        self.polygon.as_ref()
    }

    pub fn reset(&mut self) {
        self.polygon = None;
    }
}
