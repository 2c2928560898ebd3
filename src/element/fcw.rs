use crate::consistency::SimulationConsistency;
use crate::math::{flatten, try_normalize, GeoReference};
use cgmath::prelude::*;
#[cfg(feature = "serde")]
use serde::Serialize;

/// Metrics that have no meaningful value are reported as this.
pub const FCW_UNDEFINED: f64 = -1.0;

/// Relative speeds below this never lead to a collision.
const MIN_CLOSING_SPEED: f64 = 0.1; // m/s

/// Velocities below this have no headway.
const MIN_HEADWAY_SPEED: f64 = 0.01; // m/s

/// How a vehicle relates to the reference element.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub enum FcwState {
    #[default]
    NoRelationship,
    /// The reference element is behind the vehicle.
    EgoInBack,
    /// The reference element is in front of the vehicle.
    EgoInFront,
    Overlap,
}

/// Forward-collision metrics of a vehicle relative to the reference element.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct FcwMetrics {
    pub state: FcwState,
    /// Longitudinal distance along the reference's lane, positive when the vehicle is ahead.
    pub longitudinal_distance: f64,
    /// Shortest distance between the footprints.
    pub euclidean_distance: f64,
    /// Time to collision over the longitudinal distance, or [FCW_UNDEFINED].
    pub ttc: f64,
    /// Time headway of whichever is behind over the longitudinal distance, or [FCW_UNDEFINED].
    pub thw: f64,
    /// Time to collision over the Euclidean distance, or [FCW_UNDEFINED].
    pub ttc_euclidean: f64,
    /// Time headway over the Euclidean distance, or [FCW_UNDEFINED].
    pub thw_euclidean: f64,
    /// Velocity of the reference element in m/s, or [FCW_UNDEFINED].
    pub ego_velocity: f64,
    /// Velocity of the vehicle in m/s, or [FCW_UNDEFINED].
    pub vehicle_velocity: f64,
}

impl Default for FcwMetrics {
    fn default() -> Self {
        Self {
            state: FcwState::NoRelationship,
            longitudinal_distance: FCW_UNDEFINED,
            euclidean_distance: FCW_UNDEFINED,
            ttc: FCW_UNDEFINED,
            thw: FCW_UNDEFINED,
            ttc_euclidean: FCW_UNDEFINED,
            thw_euclidean: FCW_UNDEFINED,
            ego_velocity: FCW_UNDEFINED,
            vehicle_velocity: FCW_UNDEFINED,
        }
    }
}

/// Computes the metrics of `vehicle` relative to `reference` from their stable states.
///
/// There is no relationship unless the vehicle is within `radius` of the reference,
/// their lanes do not point in opposite directions and their footprints are known.
pub fn compute_fcw(
    reference: &dyn SimulationConsistency,
    vehicle: &dyn SimulationConsistency,
    radius: f64,
    geo: &GeoReference,
) -> FcwMetrics {
    let none = FcwMetrics::default();
    let (Some(ref_poly), Some(veh_poly)) = (reference.stable_polygon(), vehicle.stable_polygon())
    else {
        return none;
    };
    if ref_poly.center().distance(veh_poly.center()) > radius {
        return none;
    }
    if ref_poly.overlaps(veh_poly) {
        return FcwMetrics {
            state: FcwState::Overlap,
            longitudinal_distance: 0.0,
            euclidean_distance: 0.0,
            ..none
        };
    }

    let ref_dir = try_normalize(flatten(reference.stable_lane_dir()));
    let veh_dir = try_normalize(flatten(vehicle.stable_lane_dir()));
    let (Some(ref_dir), Some(veh_dir)) = (ref_dir, veh_dir) else {
        return none;
    };
    // Orthogonal lanes still count as travelling together.
    if ref_dir.dot(veh_dir) < 0.0 {
        return none;
    }

    let rel = vehicle.stable_geom_center().enu_2d(geo) - reference.stable_geom_center().enu_2d(geo);
    let along = rel.dot(ref_dir);
    let gap = ref_poly.project(ref_dir).clearance_with(&veh_poly.project(ref_dir));
    let longitudinal_distance = if along >= 0.0 { gap } else { -gap };
    let euclidean_distance = ref_poly.distance_to(veh_poly);

    let (state, rear_vel, front_vel) = if along >= 0.0 {
        (
            FcwState::EgoInBack,
            reference.stable_velocity(),
            vehicle.stable_velocity(),
        )
    } else {
        (
            FcwState::EgoInFront,
            vehicle.stable_velocity(),
            reference.stable_velocity(),
        )
    };
    let closing = rear_vel - front_vel;
    let ttc = |dist: f64| {
        if closing > MIN_CLOSING_SPEED {
            dist / closing
        } else {
            FCW_UNDEFINED
        }
    };
    let thw = |dist: f64| {
        if rear_vel > MIN_HEADWAY_SPEED {
            dist / rear_vel
        } else {
            FCW_UNDEFINED
        }
    };
    let dist = longitudinal_distance.abs();
    log::debug!(
        "fcw {} -> {}: {:?} d={:.2} ttc={:.2}",
        reference.consistency_id(),
        vehicle.consistency_id(),
        state,
        longitudinal_distance,
        ttc(dist)
    );

    FcwMetrics {
        state,
        longitudinal_distance,
        euclidean_distance,
        ttc: ttc(dist),
        thw: thw(dist),
        ttc_euclidean: ttc(euclidean_distance),
        thw_euclidean: thw(euclidean_distance),
        ego_velocity: reference.stable_velocity(),
        vehicle_velocity: vehicle.stable_velocity(),
    }
}
