//! Passive joint torques.
//!
//! Limit torques model ligaments and soft tissue near the ends of the range
//! of motion (double exponential plus damping); arm and MTP joints use a
//! plain linear spring-damper.
//!
//! ```text
//! limit:   τ = k1 exp(k2 (q − θ_max)) + k3 exp(k4 (q − θ_min)) − d q̇
//! linear:  τ = −k q − d q̇
//! ```

use gait_diff::Scalar;
use gait_types::{LimitTorqueParameters, LinearPassiveParameters};

/// Double-exponential limit torque with damping.
pub fn limit_torque<S: Scalar>(p: &LimitTorqueParameters, q: &S, qd: &S) -> S {
    let [k1, k2, k3, k4] = p.stiffness;
    let [theta_min, theta_max] = p.range;
    ((q.clone() - theta_max) * k2).exp() * k1 + ((q.clone() - theta_min) * k4).exp() * k3
        - qd.clone() * p.damping
}

/// Linear spring-damper torque.
pub fn linear_passive_torque<S: Scalar>(p: &LinearPassiveParameters, q: &S, qd: &S) -> S {
    -(q.clone() * p.stiffness) - qd.clone() * p.damping
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use gait_types::data::limit_torque as limit_parameters;

    #[test]
    fn test_limit_torque_pushes_back_at_limits() {
        let knee = limit_parameters("knee_angle_r").unwrap();
        let mid: f64 = limit_torque(&knee, &-1.0, &0.0);
        assert!(mid.abs() < 1.0, "{mid}");
        // beyond full extension the torque flexes the knee
        let extended: f64 = limit_torque(&knee, &0.3, &0.0);
        assert!(extended < -5.0, "{extended}");
        // beyond full flexion it extends it
        let flexed: f64 = limit_torque(&knee, &-2.5, &0.0);
        assert!(flexed > 5.0, "{flexed}");
    }

    #[test]
    fn test_damping_opposes_velocity() {
        let p = LimitTorqueParameters::new([0.0; 4], [-1.0, 1.0]);
        assert_relative_eq!(limit_torque(&p, &0.0, &2.0), -0.2);
    }

    #[test]
    fn test_linear_passive() {
        let mtp = LinearPassiveParameters::new(25.0, 0.4);
        assert_relative_eq!(linear_passive_torque(&mtp, &0.1, &-1.0), -2.5 + 0.4);
        let arm = LinearPassiveParameters::new(0.0, 0.1);
        assert_relative_eq!(linear_passive_torque(&arm, &0.7, &1.0), -0.1);
    }
}
