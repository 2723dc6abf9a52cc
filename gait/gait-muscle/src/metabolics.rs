//! Smoothed metabolic energy rate after Bhargava et al. (2004).
//!
//! Per muscle, the total rate is the sum of four heat and work components:
//!
//! ```text
//! Ė = Ȧ (activation) + Ṁ (maintenance) + Ṡ (shortening) + Ẇ (work)
//! ```
//!
//! Sign switches (shortening vs. lengthening, positive work only, minimum
//! heat) are smoothed with `½ + ½ tanh(b · x)` so the rate stays
//! differentiable. The total heat rate is floored at 1 W per kg of muscle.
//!
//! # References
//!
//! - Bhargava, L.J. et al. (2004). A phenomenological model for estimating
//!   metabolic energy consumption in muscle contraction.

use std::f64::consts::FRAC_PI_2;

use gait_diff::Scalar;

/// Inputs of one muscle at one instant.
#[derive(Debug, Clone, PartialEq)]
pub struct MetabolicInputs<S> {
    /// Excitation, or its surrogate (the activation).
    pub excitation: S,
    /// Activation.
    pub activation: S,
    /// Fiber velocity (m/s), positive when lengthening.
    pub fiber_velocity: S,
    /// Active fiber force (N).
    pub active_fiber_force: S,
    /// Active force-length multiplier.
    pub active_force_length: S,
}

/// Metabolic rate components (W).
#[derive(Debug, Clone, PartialEq)]
pub struct MetabolicRate<S> {
    /// Activation heat rate.
    pub activation_heat: S,
    /// Maintenance heat rate.
    pub maintenance_heat: S,
    /// Shortening heat rate.
    pub shortening_heat: S,
    /// Positive mechanical work rate.
    pub mechanical_work: S,
    /// Total heat rate after the minimum-heat floor.
    pub total_heat: S,
    /// Total metabolic rate, heat plus work.
    pub total: S,
}

/// Bhargava metabolic model of one muscle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BhargavaMetabolics {
    /// Fraction of slow-twitch fibers.
    pub slow_twitch_ratio: f64,
    /// Maximal isometric force (N).
    pub max_isometric_force: f64,
    /// Muscle mass (kg).
    pub muscle_mass: f64,
    /// Smoothing constant `b`.
    pub smoothing: f64,
}

impl BhargavaMetabolics {
    /// Smoothing constant used during transcription.
    pub const SMOOTHING: f64 = 10.0;

    const ACTIVATION_SLOW: f64 = 40.0;
    const ACTIVATION_FAST: f64 = 133.0;
    const MAINTENANCE_SLOW: f64 = 74.0;
    const MAINTENANCE_FAST: f64 = 111.0;
    const MIN_HEAT_PER_KG: f64 = 1.0;

    /// Model for a muscle.
    #[must_use]
    pub fn new(slow_twitch_ratio: f64, max_isometric_force: f64, muscle_mass: f64) -> Self {
        Self {
            slow_twitch_ratio,
            max_isometric_force,
            muscle_mass,
            smoothing: Self::SMOOTHING,
        }
    }

    /// Evaluate all components.
    pub fn evaluate<S: Scalar>(&self, x: &MetabolicInputs<S>) -> MetabolicRate<S> {
        let b = self.smoothing;
        let mass = self.muscle_mass;
        let r = self.slow_twitch_ratio;
        let step = |s: S| (s * b).tanh() * 0.5 + 0.5;

        // fiber recruitment split
        let slow = (x.excitation.clone() * FRAC_PI_2).sin() * r;
        let fast = (-(x.excitation.clone() * FRAC_PI_2).cos() + 1.0) * (1.0 - r);

        let activation_heat =
            (slow.clone() * Self::ACTIVATION_SLOW + fast.clone() * Self::ACTIVATION_FAST) * mass;
        let maintenance_heat = x.active_force_length.clone()
            * (slow * Self::MAINTENANCE_SLOW + fast * Self::MAINTENANCE_FAST)
            * mass;

        let v = &x.fiber_velocity;
        let f_ce = &x.active_fiber_force;
        let f_iso = x.activation.clone() * x.active_force_length.clone() * self.max_isometric_force;
        let alpha_shortening = f_iso * 0.16 + f_ce.clone() * 0.18;
        let alpha_lengthening = f_ce.clone() * 0.157;
        let alpha = alpha_shortening.clone()
            + (alpha_lengthening - alpha_shortening) * step(v.clone());
        let shortening_heat = -(alpha * v.clone());

        let work = -(f_ce.clone() * v.clone());
        let mechanical_work = work * step(-v.clone());

        let raw_heat = activation_heat.clone() + maintenance_heat.clone() + shortening_heat.clone();
        let floor = mass * Self::MIN_HEAT_PER_KG;
        let deficit = -raw_heat.clone() + floor;
        let total_heat = raw_heat + deficit.clone() * step(deficit);
        let total = total_heat.clone() + mechanical_work.clone();

        MetabolicRate {
            activation_heat,
            maintenance_heat,
            shortening_heat,
            mechanical_work,
            total_heat,
            total,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn model() -> BhargavaMetabolics {
        BhargavaMetabolics::new(0.5, 1000.0, 0.2)
    }

    fn inputs(a: f64, v: f64, f_ce: f64) -> MetabolicInputs<f64> {
        MetabolicInputs {
            excitation: a,
            activation: a,
            fiber_velocity: v,
            active_fiber_force: f_ce,
            active_force_length: 1.0,
        }
    }

    #[test]
    fn test_full_activation_heat() {
        let rate = model().evaluate(&inputs(1.0, 0.0, 1000.0));
        // sin(π/2) = 1, 1 − cos(π/2) = 1
        assert_relative_eq!(rate.activation_heat, 0.2 * (0.5 * 40.0 + 0.5 * 133.0), epsilon = 1e-9);
        assert_relative_eq!(rate.maintenance_heat, 0.2 * (0.5 * 74.0 + 0.5 * 111.0), epsilon = 1e-9);
        assert_relative_eq!(rate.shortening_heat, 0.0);
        assert_relative_eq!(rate.mechanical_work, 0.0);
    }

    #[test]
    fn test_shortening_produces_work_and_heat() {
        let rate = model().evaluate(&inputs(0.5, -0.5, 400.0));
        // fast shortening: smooth switches are saturated
        assert_relative_eq!(rate.mechanical_work, 200.0, max_relative = 1e-3);
        let alpha = 0.16 * 0.5 * 1000.0 + 0.18 * 400.0;
        assert_relative_eq!(rate.shortening_heat, alpha * 0.5, max_relative = 1e-3);
        assert_relative_eq!(
            rate.total,
            rate.total_heat + rate.mechanical_work,
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_lengthening_has_no_positive_work() {
        let rate = model().evaluate(&inputs(0.5, 0.5, 400.0));
        assert!(rate.mechanical_work.abs() < 0.05);
        assert!(rate.shortening_heat < 0.0);
    }

    #[test]
    fn test_minimum_heat_floor() {
        let m = model();
        let rate = m.evaluate(&inputs(0.0, 0.0, 0.0));
        assert_relative_eq!(rate.activation_heat, 0.0);
        // well below the floor, the (smoothed) floor wins
        assert!(rate.total_heat > 0.95 * m.muscle_mass);
        assert!(rate.total_heat <= m.muscle_mass);
    }
}
