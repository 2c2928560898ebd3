use crate::road::LaneInfo;
use crate::{ElementId, SysId};
use thiserror::Error;

/// A malformed geometric input.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum GeometryError {
    #[error("a spline needs at least 4 control points, got {count}")]
    TooFewControlPoints { count: usize },
    #[error("control points {index} and {} coincide", index + 1)]
    CoincidentControlPoints { index: usize },
    #[error("a polyline needs at least 2 distinct points")]
    DegeneratePolyline,
    #[error("direction vector has zero length")]
    ZeroDirection,
    #[error("extents must be positive and finite, got {length} x {width}")]
    InvalidExtents { length: f64, width: f64 },
}

/// Why an element could not be created.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum InitError {
    #[error("no lane or lane-link found at lon {lon}, lat {lat}")]
    UnresolvedLocation { lon: f64, lat: f64 },
    #[error("{0} could not be resolved by the road network")]
    UnresolvedLane(LaneInfo),
    #[error("invalid dimensions {length} x {width} x {height}")]
    InvalidDimensions { length: f64, width: f64, height: f64 },
    #[error(transparent)]
    Geometry(#[from] GeometryError),
}

/// Errors returned by [Simulation](crate::Simulation) operations.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
    #[error("failed to initialise element {id}: {source}")]
    Init {
        id: i64,
        #[source]
        source: InitError,
    },
    #[error("an element with system id {0} already exists")]
    DuplicateId(SysId),
    #[error("unknown element {0:?}")]
    UnknownElement(ElementId),
    #[error("no signal light with id {0}")]
    UnknownSignal(i64),
    #[error("signal light {0} is not replicated")]
    NotReplicated(i64),
    #[error("invalid standard deviation {0}")]
    InvalidDeviation(f64),
}
