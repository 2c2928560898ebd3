#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Run-wide settings shared by every element of a [Simulation](crate::Simulation).
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
pub struct SimulationConfig {
    /// Hashed lane buckets are `2^sub_section_power` metres long.
    pub sub_section_power: i32,
    /// Added to each element's id to seed its pseudorandom component.
    pub random_seed: u64,
    /// Vehicles further than this from the FCW reference are skipped, in m.
    pub fcw_radius: f64,
    /// End time of elements configured without one, in s.
    pub max_lifetime: f64,
    /// Velocity of vehicles configured without one, in m/s.
    pub default_velocity: f64,
    /// Car following: desired gap to the leader in s.
    pub time_headway: f64,
    /// Car following: maximum acceleration in m/s<sup>2</sup>.
    pub max_acceleration: f64,
    /// Car following: comfortable deceleration in m/s<sup>2</sup>.
    pub comfort_deceleration: f64,
    /// Number of hashed buckets ahead searched for a leader.
    pub leader_search_buckets: usize,
    /// Spacing of the points sampled along pedestrian spline paths, in m.
    pub waypoint_spacing: f64,
    /// Pedestrians re-resolve their lane at most this often, in s.
    pub pedestrian_lane_update_interval: f64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            sub_section_power: 4,
            random_seed: 55,
            fcw_radius: 100.0,
            max_lifetime: 1.0e9,
            default_velocity: 20.0,
            time_headway: 1.5,
            max_acceleration: 2.0,
            comfort_deceleration: 2.0,
            leader_search_buckets: 3,
            waypoint_spacing: 1.0,
            pedestrian_lane_update_interval: 0.2,
        }
    }
}

impl SimulationConfig {
    /// The length of a hashed lane bucket in m.
    pub fn scope_len(&self) -> f64 {
        2f64.powi(self.sub_section_power)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn default_bucket_is_sixteen_metres() {
        assert_eq!(SimulationConfig::default().scope_len(), 16.0);
    }
}
