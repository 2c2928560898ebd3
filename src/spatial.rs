//! Indices answering "who is near here" without scanning every element.
//!
//! [HashedLaneRegistry] files each element under a coarse bucket of the lane it
//! occupies. [PolygonIndex] is an R-tree over element footprints for overlap
//! and nearest-neighbour queries.

pub use hashed::HashedLaneInfo;
pub use polygon::PolygonIndex;
pub use registry::HashedLaneRegistry;

mod hashed;
mod polygon;
mod registry;
