use crate::config::SimulationConfig;
use crate::debug::DebugFrame;
use crate::math::{GeoReference, Wgs84};
use crate::road::RoadNetwork;
use crate::spatial::HashedLaneRegistry;
use std::sync::Arc;

/// State shared by every element of one simulation run.
pub struct RunContext {
    pub config: SimulationConfig,
    /// The local frame every ENU position is expressed in.
    pub geo: GeoReference,
    pub road: Arc<dyn RoadNetwork>,
    /// Elements filed by the lane bucket they occupy.
    pub lanes: HashedLaneRegistry,
    /// Drawing primitives of the tick in progress.
    pub debug: DebugFrame,
}

impl RunContext {
    pub fn new(config: SimulationConfig, origin: Wgs84, road: Arc<dyn RoadNetwork>) -> Self {
        Self {
            config,
            geo: GeoReference::new(origin),
            road,
            lanes: HashedLaneRegistry::new(),
            debug: DebugFrame::default(),
        }
    }

    /// The road network as a trait object.
    pub fn road(&self) -> &dyn RoadNetwork {
        self.road.as_ref()
    }

    /// The length of a hashed lane bucket in m.
    pub fn scope_len(&self) -> f64 {
        self.config.scope_len()
    }
}
