//! The per-tick update engine of a microscopic traffic simulator.
//!
//! A [Simulation] owns a set of traffic participants (vehicles, pedestrians,
//! static obstacles and signal lights) placed on a road network supplied through
//! the [RoadNetwork] trait. Each call to [Simulation::step] advances every element
//! by one tick and produces an [OutputBatch].

pub use cgmath;
pub use config::SimulationConfig;
pub use consistency::{ParallelSimulation, SimulationConsistency};
pub use context::RunContext;
pub use element::{
    AccEndCondition, Element, ElementEvent, ElementKind, FcwMetrics, FcwState, LifeCycleState, FCW_UNDEFINED,
    SysId,
};
pub use error::{Error, GeometryError, InitError};
pub use output::{ElementOutput, OutputBatch};
pub use road::{LaneInfo, LaneLink, LaneProjection, LaneUid, RoadNetwork, TrackerHandle};
pub use scene::{
    Catalog, CatalogEntry, Dimensions, ElementSource, ObstacleAttributes, PedestrianAttributes,
    PedestrianBehavior, Route, SignalAttributes, VehicleAttributes,
};
pub use signal::{ControlPhase, SignalColor, SignalPhasePeriod};
pub use simulation::Simulation;
use slotmap::{new_key_type, SlotMap};
pub use slotmap::{Key, KeyData};
pub use time::TimeContext;
pub use util::Interval;

mod config;
mod consistency;
mod context;
mod debug;
pub mod element;
mod error;
pub mod math;
pub mod output;
pub mod road;
mod scene;
pub mod signal;
mod simulation;
pub mod spatial;
mod time;
mod util;

new_key_type! {
    /// Unique ID of an [Element] within a [Simulation].
    pub struct ElementId;
}

type ElementSet = SlotMap<ElementId, Element>;
