//! First-order activation dynamics.
//!
//! Muscle activation is driven implicitly: its time derivative `ȧ` is a
//! control, bounded so that it stays reachable from an excitation in
//! `[0, 1]`:
//!
//! ```text
//! ȧ + a / τ_deact ≥ 0          (deactivation bound)
//! ȧ + a / τ_act   ≤ 1 / τ_act  (activation bound)
//! ```
//!
//! Arm actuators keep an explicit excitation with a single time constant.

use gait_diff::Scalar;
use gait_types::TimeConstants;

/// Activation bound residuals of one muscle.
#[derive(Debug, Clone, PartialEq)]
pub struct ActivationBounds<S> {
    /// `ȧ + a/τ_deact`, must be non-negative.
    pub deactivation: S,
    /// `ȧ + a/τ_act`, must not exceed [`ActivationDynamics::activation_ceiling`].
    pub activation: S,
}

/// Time constants of the activation model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActivationDynamics {
    constants: TimeConstants,
}

impl ActivationDynamics {
    /// Dynamics with the given time constants.
    #[must_use]
    pub fn new(constants: TimeConstants) -> Self {
        Self { constants }
    }

    /// Upper bound of the activation residual, `1/τ_act`.
    #[must_use]
    pub fn activation_ceiling(&self) -> f64 {
        1.0 / self.constants.activation
    }

    /// Bound residuals for activation `a` and its rate `ȧ`.
    pub fn bounds<S: Scalar>(&self, activation: &S, rate: &S) -> ActivationBounds<S> {
        ActivationBounds {
            deactivation: rate.clone() + activation.clone() / self.constants.deactivation,
            activation: rate.clone() + activation.clone() / self.constants.activation,
        }
    }

    /// Arm activation rate `(e − a)/τ_arm`.
    pub fn arm_rate<S: Scalar>(&self, excitation: &S, activation: &S) -> S {
        (excitation.clone() - activation.clone()) / self.constants.arm
    }

    /// The arm time constant.
    #[must_use]
    pub fn arm_time_constant(&self) -> f64 {
        self.constants.arm
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn dynamics() -> ActivationDynamics {
        ActivationDynamics::new(TimeConstants {
            activation: 0.015,
            deactivation: 0.06,
            arm: 0.035,
        })
    }

    #[test]
    fn test_full_excitation_is_the_ceiling() {
        let d = dynamics();
        // with e = 1, ȧ = (1 − a)/τ_act saturates the activation bound
        let a = 0.3;
        let rate = (1.0 - a) / 0.015;
        let b = d.bounds(&a, &rate);
        assert_relative_eq!(b.activation, d.activation_ceiling(), epsilon = 1e-9);
        assert!(b.deactivation > 0.0);
    }

    #[test]
    fn test_zero_excitation_is_the_floor() {
        let d = dynamics();
        let a = 0.4;
        let rate = -a / 0.06;
        let b = d.bounds(&a, &rate);
        assert_relative_eq!(b.deactivation, 0.0, epsilon = 1e-12);
        assert!(b.activation < d.activation_ceiling());
    }

    #[test]
    fn test_arm_rate() {
        let d = dynamics();
        assert_relative_eq!(d.arm_rate(&0.5, &0.15), 10.0, epsilon = 1e-12);
        assert_relative_eq!(d.arm_time_constant(), 0.035);
    }
}
