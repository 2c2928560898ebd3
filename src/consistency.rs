//! The read/write discipline that lets every element update in parallel.
//!
//! During a tick an element writes only its own live state and reads only the
//! stable state of others, a snapshot taken once at the end of the previous tick.

use crate::element::SysId;
use crate::error::InitError;
use crate::math::{Coord, OrientedBox, Vector2d, Vector3d};
use crate::road::{LaneInfo, RoadNetwork};
use crate::signal::SignalColor;

/// Read access to the state an element exposed at the end of the last tick.
pub trait SimulationConsistency {
    /// An id unique across element kinds.
    fn consistency_id(&self) -> SysId;

    fn stable_geom_center(&self) -> &Coord;

    fn stable_rear_axle_center(&self) -> &Coord;

    fn stable_lane_info(&self) -> LaneInfo;

    fn stable_lane_dir(&self) -> Vector3d;

    fn stable_heading(&self) -> Vector2d;

    fn stable_velocity(&self) -> f64;

    fn stable_acc(&self) -> f64;

    fn stable_distance_along_curve(&self) -> f64;

    /// Distance from the element to the end of its lane.
    fn stable_invert_distance_along_curve(&self) -> f64;

    /// The footprint, if the element had one at the end of the last tick.
    fn stable_polygon(&self) -> Option<&OrientedBox>;

    /// Copies the live state into the stable snapshot.
    fn save_stable_state(&mut self);
}

/// An element whose state is driven by an authority outside this process.
pub trait ParallelSimulation {
    /// Derives the lanes and lane-links under the element's control from the road topology.
    fn initialize_parallel_simulation(&mut self, road: &dyn RoadNetwork) -> Result<(), InitError>;

    /// Accepts the authoritative colour, applied at the next update.
    fn update_parallel_simulation(&mut self, color: SignalColor);
}
