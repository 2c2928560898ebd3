//! Element attributes as supplied by the scenario loader.

use crate::math::Wgs84;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The path an element is placed on.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Route {
    pub start: Wgs84,
    /// Intermediate waypoints, followed by pedestrians.
    #[cfg_attr(feature = "serde", serde(default))]
    pub mid_points: Vec<Wgs84>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub end: Option<Wgs84>,
}

impl Route {
    /// A route consisting of a start point only.
    pub fn at(start: Wgs84) -> Self {
        Self {
            start,
            ..Default::default()
        }
    }

    /// Every point of the route in order. An end point at the origin of the
    /// geodetic frame counts as unset.
    pub fn points(&self) -> impl Iterator<Item = Wgs84> + '_ {
        let end = self
            .end
            .filter(|end| end.lon != 0.0 || end.lat != 0.0);
        std::iter::once(self.start)
            .chain(self.mid_points.iter().copied())
            .chain(end)
    }
}

/// Extents of an element in m.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Dimensions {
    pub length: f64,
    pub width: f64,
    pub height: f64,
}

impl Dimensions {
    pub const fn new(length: f64, width: f64, height: f64) -> Self {
        Self {
            length,
            width,
            height,
        }
    }

    pub fn is_valid(&self) -> bool {
        let valid = |x: f64| x.is_finite() && x > 0.0;
        valid(self.length) && valid(self.width) && valid(self.height)
    }
}

/// The catalog's description of an object type.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CatalogEntry {
    pub dimensions: Dimensions,
    /// Distance from the geometric centre back to the rear axle in m.
    #[cfg_attr(feature = "serde", serde(default))]
    pub rear_axle_offset: f64,
    /// Transparent objects are not reported by overlap queries.
    #[cfg_attr(feature = "serde", serde(default))]
    pub transparent: bool,
}

impl CatalogEntry {
    pub const fn new(dimensions: Dimensions, rear_axle_offset: f64) -> Self {
        Self {
            dimensions,
            rear_axle_offset,
            transparent: false,
        }
    }

    pub const fn transparent(dimensions: Dimensions) -> Self {
        Self {
            dimensions,
            rear_axle_offset: 0.0,
            transparent: true,
        }
    }
}

/// Object type name to catalog entry.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Catalog {
    entries: HashMap<String, CatalogEntry>,
}

impl Default for Catalog {
    fn default() -> Self {
        let entries = [
            ("Sedan", CatalogEntry::new(Dimensions::new(4.5, 1.8, 1.5), 1.4)),
            ("Truck", CatalogEntry::new(Dimensions::new(5.17, 2.18, 2.76), 1.6)),
            ("Trailer", CatalogEntry::new(Dimensions::new(12.31, 2.18, 3.5), 4.2)),
            ("Pedestrian", CatalogEntry::new(Dimensions::new(1.0, 1.0, 1.5), 0.0)),
            (
                "Port_Crane_001",
                CatalogEntry::transparent(Dimensions::new(20.0, 30.0, 40.0)),
            ),
            (
                "Port_Crane_002",
                CatalogEntry::transparent(Dimensions::new(20.0, 30.0, 40.0)),
            ),
        ];
        Self {
            entries: entries
                .into_iter()
                .map(|(name, entry)| (name.to_owned(), entry))
                .collect(),
        }
    }
}

impl Catalog {
    /// An empty catalog.
    pub fn empty() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    pub fn insert(&mut self, name: impl Into<String>, entry: CatalogEntry) {
        self.entries.insert(name.into(), entry);
    }

    pub fn get(&self, name: &str) -> Option<&CatalogEntry> {
        self.entries.get(name)
    }

    /// The entry for `name`, or one built from `fallback` on a miss.
    pub fn resolve(&self, name: &str, fallback: Dimensions) -> CatalogEntry {
        match self.get(name) {
            Some(entry) => *entry,
            None => {
                log::warn!("object type {name:?} is not in the catalog, using configured dimensions");
                CatalogEntry::new(fallback, 0.0)
            }
        }
    }
}

/// How an element entered the simulation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ElementSource {
    /// Loaded with the scenario.
    #[default]
    Scene,
    /// Added while the simulation is running. Ends as soon as it stops.
    Injected,
}

/// Settings for a vehicle.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct VehicleAttributes {
    pub id: i64,
    /// The catalog type name.
    pub vehicle_type: String,
    pub route: Route,
    /// Overrides the lane index within the section the route starts on.
    pub lane_id: Option<i64>,
    /// Added to the distance along the resolved lane in m.
    pub start_s: f64,
    /// Lateral offset from the lane centre in m, positive to the left.
    pub l_offset: f64,
    pub start_time: f64,
    /// Defaults to the configured maximum lifetime.
    pub end_time: Option<f64>,
    /// Defaults to the configured default velocity.
    pub start_velocity: Option<f64>,
    pub max_velocity: f64,
    /// Limit on any acceleration, planned or commanded, in m/s<sup>2</sup>.
    pub max_acceleration: f64,
    /// Limit on any deceleration in m/s<sup>2</sup>, as a magnitude.
    pub max_deceleration: f64,
    /// Used when the type is not in the catalog.
    pub dimensions: Dimensions,
    pub source: ElementSource,
    pub terminate_on_stop: bool,
}

impl Default for VehicleAttributes {
    fn default() -> Self {
        Self {
            id: 0,
            vehicle_type: "Sedan".into(),
            route: Route::default(),
            lane_id: None,
            start_s: 0.0,
            l_offset: 0.0,
            start_time: 0.0,
            end_time: None,
            start_velocity: None,
            max_velocity: 33.3,
            max_acceleration: 12.0,
            max_deceleration: 10.0,
            dimensions: Dimensions::new(4.5, 1.8, 1.5),
            source: ElementSource::Scene,
            terminate_on_stop: false,
        }
    }
}

/// How a pedestrian moves.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum PedestrianBehavior {
    /// Follow the route's waypoints.
    #[default]
    WayPoints,
    /// Keep walking in a fixed direction.
    Direction,
}

/// Settings for a pedestrian.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PedestrianAttributes {
    pub id: i64,
    pub pedestrian_type: String,
    pub route: Route,
    pub start_time: f64,
    pub end_time: Option<f64>,
    pub start_velocity: f64,
    pub max_velocity: f64,
    pub behavior: PedestrianBehavior,
    /// Walking direction in degrees anticlockwise from east, used in direction mode.
    pub start_angle: f64,
    pub dimensions: Dimensions,
    pub source: ElementSource,
    pub terminate_on_stop: bool,
}

impl Default for PedestrianAttributes {
    fn default() -> Self {
        Self {
            id: 0,
            pedestrian_type: "Pedestrian".into(),
            route: Route::default(),
            start_time: 0.0,
            end_time: None,
            start_velocity: 1.4,
            max_velocity: 3.0,
            behavior: PedestrianBehavior::WayPoints,
            start_angle: 0.0,
            dimensions: Dimensions::new(1.0, 1.0, 1.5),
            source: ElementSource::Scene,
            terminate_on_stop: false,
        }
    }
}

/// Settings for a static obstacle.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ObstacleAttributes {
    pub id: i64,
    pub obstacle_type: String,
    pub route: Route,
    pub lane_id: Option<i64>,
    pub start_s: f64,
    pub l_offset: f64,
    pub start_time: f64,
    pub end_time: Option<f64>,
    /// Fixed heading in degrees anticlockwise from east. When negative, the
    /// lane heading plus `direction` is used instead.
    pub start_angle: f64,
    /// Rotation relative to the lane in degrees.
    pub direction: f64,
    pub dimensions: Dimensions,
}

impl Default for ObstacleAttributes {
    fn default() -> Self {
        Self {
            id: 0,
            obstacle_type: "Obstacle".into(),
            route: Route::default(),
            lane_id: None,
            start_s: 0.0,
            l_offset: 0.0,
            start_time: 0.0,
            end_time: None,
            start_angle: -1.0,
            direction: 0.0,
            dimensions: Dimensions::new(1.0, 1.0, 1.0),
        }
    }
}

/// Settings for a signal light.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SignalAttributes {
    pub id: i64,
    /// Where the signal stands. Resolved to the lane it controls by default.
    pub route: Route,
    pub start_time: f64,
    pub end_time: Option<f64>,
    pub green: f64,
    pub yellow: f64,
    pub red: f64,
    /// Offset of the first green phase into the cycle, in s.
    pub phase_offset: f64,
    pub plan: i64,
    pub junction: i64,
    pub phase_number: i64,
    pub signal_head: i64,
    pub event_id: i64,
    /// Indices of the lanes it controls within the section it stands on.
    /// Empty means the lane it stands on.
    pub control_lanes: Vec<i64>,
    /// `;`-separated movement codes, `A` for all.
    pub control_phases: String,
    /// Colours are pushed from outside instead of computed locally.
    pub replicated: bool,
}

impl Default for SignalAttributes {
    fn default() -> Self {
        Self {
            id: 0,
            route: Route::default(),
            start_time: 0.0,
            end_time: None,
            green: 30.0,
            yellow: 3.0,
            red: 27.0,
            phase_offset: 0.0,
            plan: 0,
            junction: 0,
            phase_number: 0,
            signal_head: 0,
            event_id: 0,
            control_lanes: vec![],
            control_phases: "A".into(),
            replicated: false,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn zero_end_point_is_skipped() {
        let mut route = Route::at(Wgs84::new(121.0, 31.0, 0.0));
        route.mid_points.push(Wgs84::new(121.001, 31.0, 0.0));
        route.end = Some(Wgs84::default());
        assert_eq!(route.points().count(), 2);
        route.end = Some(Wgs84::new(121.002, 31.0, 0.0));
        assert_eq!(route.points().count(), 3);
    }

    #[test]
    fn catalog_falls_back() {
        let catalog = Catalog::default();
        let fallback = Dimensions::new(2.0, 1.0, 1.0);
        assert_eq!(catalog.resolve("Truck", fallback).dimensions.width, 2.18);
        assert!(catalog.resolve("Port_Crane_001", fallback).transparent);
        assert_eq!(catalog.resolve("Unicycle", fallback).dimensions, fallback);
        assert!(!Dimensions::new(0.0, 1.0, 1.0).is_valid());
    }
}
