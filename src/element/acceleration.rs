use crate::config::SimulationConfig;

/// The minimum gap to maintain between vehicles in m.
const MIN_GAP: f64 = 2.0; // m

/// The maximum deceleration of all vehicles in ms<sup>-2</sup>.
const MAX_DECEL: f64 = -6.0; // m/s^2

/// The car-following model of a vehicle.
///
/// Each plan starts from the free-road acceleration and every constraint
/// applied afterwards can only lower it.
#[derive(Clone, Debug)]
pub struct AccelerationModel {
    headway: f64,
    max_acc: f64,
    comf_dec: f64,
    vel_adj: f64,
    acc: f64,
}

impl AccelerationModel {
    /// Creates a new acceleration model.
    pub fn new(config: &SimulationConfig) -> Self {
        AccelerationModel {
            headway: config.time_headway,
            max_acc: config.max_acceleration,
            comf_dec: config.comfort_deceleration,
            vel_adj: 1.0,
            acc: config.max_acceleration,
        }
    }

    /// Set the desired velocity adjustment factor.
    pub fn set_velocity_adjust(&mut self, factor: f64) {
        self.vel_adj = factor;
    }

    pub fn velocity_adjust(&self) -> f64 {
        self.vel_adj
    }

    /// Gets the planned acceleration of the vehicle.
    pub fn acc(&self) -> f64 {
        f64::max(self.acc, MAX_DECEL)
    }

    /// Starts a new plan with the acceleration needed to reach the desired velocity.
    /// # Arguments
    /// * `vel` - The velocity of the simulated vehicle (m/s).
    /// * `desired_vel` - The velocity the vehicle would keep on a free road (m/s).
    pub fn free_road(&mut self, vel: f64, desired_vel: f64) {
        let desired_vel = self.vel_adj * desired_vel;
        self.acc = if desired_vel <= 0.0 {
            MAX_DECEL
        } else {
            self.max_acc * (1. - (vel / desired_vel).powi(4))
        };
    }

    /// Applies the maximum deceleration to the vehicle.
    pub fn emergency_stop(&mut self) {
        self.acc = MAX_DECEL;
    }

    /// Calculates the acceleration needed to stop before a stop line.
    ///
    /// # Arguments
    /// * `net_dist` - The distance between this vehicle and the stop line.
    /// * `my_vel` - The velocity of the simulated vehicle (m/s).
    pub fn stop_at_line(&mut self, net_dist: f64, my_vel: f64) {
        let acc = self.idm(net_dist, my_vel, 0.0);
        self.acc = f64::min(self.acc, acc);
    }

    /// Calculates the acceleration needed to follow the vehicle ahead.
    ///
    /// # Arguments
    /// * `net_dist` - The distance between this vehicle and the vehicle ahead in metres.
    /// * `my_vel` - The velocity of the simulated vehicle (m/s).
    /// * `their_vel` - The vehicle ahead's velocity (m/s).
    pub fn follow_vehicle(&mut self, net_dist: f64, my_vel: f64, their_vel: f64) {
        let acc = self.idm(net_dist, my_vel, their_vel);
        self.acc = f64::min(self.acc, acc);
    }

    /// Calculates the comfortable break distance of the vehicle.
    pub fn stopping_distance(&self, my_vel: f64) -> f64 {
        let min_dist = 2.5; // m
        let t = my_vel / self.comf_dec;
        0.5 * my_vel * t + min_dist
    }

    /// Computes an acceleration using the intelligent driver model.
    fn idm(&self, net_dist: f64, my_vel: f64, their_vel: f64) -> f64 {
        let comf_dec = self.comf_dec; // m.s^-2
        let max_acc = self.max_acc; // m.s^-2

        if net_dist <= MIN_GAP {
            -10. * max_acc
        } else {
            let appr = my_vel - their_vel;
            let factor = 1. / (2. * (max_acc * comf_dec).sqrt());
            let ss = MIN_GAP + (my_vel * self.headway) + (my_vel * appr * factor);
            let term = ss / net_dist;
            max_acc * (1. - (term * term))
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    fn model() -> AccelerationModel {
        AccelerationModel::new(&SimulationConfig::default())
    }

    #[test]
    fn free_road() {
        let mut acc = model();
        acc.free_road(0.0, 20.0);
        assert_approx_eq!(acc.acc(), 2.0);
        acc.free_road(20.0, 20.0);
        assert_approx_eq!(acc.acc(), 0.0);
        acc.set_velocity_adjust(0.5);
        acc.free_road(20.0, 20.0);
        assert_eq!(acc.acc(), MAX_DECEL);
    }

    #[test]
    fn following_only_lowers() {
        let mut acc = model();
        acc.free_road(10.0, 20.0);
        let free = acc.acc();
        acc.follow_vehicle(500.0, 10.0, 10.0);
        assert!(acc.acc() <= free);
        acc.follow_vehicle(10.0, 10.0, 0.0);
        assert!(acc.acc() < 0.0);
        acc.follow_vehicle(1.0, 10.0, 0.0);
        assert_eq!(acc.acc(), MAX_DECEL);
    }

    #[test]
    fn stop_line() {
        let mut acc = model();
        acc.free_road(10.0, 20.0);
        acc.stop_at_line(200.0, 10.0);
        assert!(acc.acc() > 0.0);
        acc.stop_at_line(20.0, 10.0);
        assert!(acc.acc() < 0.0);
        assert_approx_eq!(acc.stopping_distance(10.0), 27.5);
    }
}
