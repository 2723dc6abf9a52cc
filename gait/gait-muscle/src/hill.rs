//! Hill-type contraction dynamics in implicit form.
//!
//! The tendon force is a state (normalized, `f_T`) and its rate a control
//! (`ḟ_T`). Given activation and musculotendon kinematics, the fiber state
//! follows in closed form and the residual
//!
//! ```text
//! r = f_T / cos α − (a · f_L(l̃_M) · f_V(ṽ_M) + β ṽ_M + f_P(l̃_M))
//! ```
//!
//! must vanish at a feasible point. Fiber geometry uses a constant-thickness
//! parallelogram:
//!
//! ```text
//!   l_M sin α = l_opt sin α_opt        l_M cos α = l_MT − l_T
//! ```

use gait_diff::Scalar;
use gait_types::{Muscle, MuscleTendonParameters};

use crate::curves::{MuscleCurves, TendonForceLengthCurve};

/// Inputs of one muscle at one instant.
#[derive(Debug, Clone, PartialEq)]
pub struct HillInputs<S> {
    /// Activation `a`.
    pub activation: S,
    /// Musculotendon length (m).
    pub mt_length: S,
    /// Musculotendon lengthening velocity (m/s).
    pub mt_velocity: S,
    /// Normalized tendon force `f_T`.
    pub normalized_tendon_force: S,
    /// Normalized tendon force rate `ḟ_T` (1/s).
    pub normalized_tendon_force_rate: S,
}

/// Residual and derived fiber quantities.
#[derive(Debug, Clone, PartialEq)]
pub struct HillState<S> {
    /// Contraction dynamics residual (normalized force).
    pub residual: S,
    /// Tendon force (N).
    pub tendon_force: S,
    /// Active fiber force including fiber damping (N).
    pub active_fiber_force: S,
    /// Passive fiber force (N).
    pub passive_fiber_force: S,
    /// Active force-length multiplier `f_L`.
    pub active_force_length: S,
    /// Normalized fiber length `l̃_M`.
    pub normalized_fiber_length: S,
    /// Fiber velocity (m/s), positive when lengthening.
    pub fiber_velocity: S,
}

/// Implicit Hill equilibrium of one muscle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HillEquilibrium {
    /// Musculotendon parameters.
    pub tendon: MuscleTendonParameters,
    /// Tendon force-length curve.
    pub tendon_curve: TendonForceLengthCurve,
    /// Fiber curves.
    pub curves: MuscleCurves,
    /// Normalized fiber damping `β`.
    pub fiber_damping: f64,
}

impl HillEquilibrium {
    /// Default fiber damping.
    pub const FIBER_DAMPING: f64 = 0.01;

    /// Equilibrium for `muscle` with the default curves.
    #[must_use]
    pub fn new(muscle: &Muscle) -> Self {
        Self {
            tendon: muscle.tendon,
            tendon_curve: TendonForceLengthCurve::new(muscle.tendon_stiffness, muscle.tendon_shift),
            curves: MuscleCurves::default(),
            fiber_damping: Self::FIBER_DAMPING,
        }
    }

    /// Evaluate the residual and the fiber state.
    pub fn evaluate<S: Scalar>(&self, inputs: &HillInputs<S>) -> HillState<S> {
        let p = &self.tendon;
        let f_max = p.max_isometric_force;
        let l_opt = p.optimal_fiber_length;
        let f_t = &inputs.normalized_tendon_force;

        // tendon length and velocity
        let tendon_length = self.tendon_curve.length(f_t) * p.tendon_slack_length;
        let tendon_velocity = inputs.normalized_tendon_force_rate.clone()
            / self.tendon_curve.stiffness_at(f_t)
            * p.tendon_slack_length;

        // fiber geometry
        let width = l_opt * p.optimal_pennation_angle.sin();
        let along = inputs.mt_length.clone() - tendon_length;
        let fiber_length = (along.square() + width * width).sqrt();
        let cos_pennation = along / fiber_length.clone();
        let normalized_fiber_length = fiber_length / l_opt;
        let fiber_velocity = (inputs.mt_velocity.clone() - tendon_velocity) * cos_pennation.clone();
        let normalized_fiber_velocity = fiber_velocity.clone() / p.max_contraction_velocity;

        // fiber forces
        let f_l = self
            .curves
            .active_force_length
            .evaluate(&normalized_fiber_length);
        let f_v = self.curves.force_velocity.evaluate(&normalized_fiber_velocity);
        let f_p = self
            .curves
            .passive_force_length
            .evaluate(&normalized_fiber_length);
        let active = inputs.activation.clone() * f_l.clone() * f_v
            + normalized_fiber_velocity * self.fiber_damping;

        let residual = f_t.clone() / cos_pennation - (active.clone() + f_p.clone());

        HillState {
            residual,
            tendon_force: f_t.clone() * f_max,
            active_fiber_force: active * f_max,
            passive_fiber_force: f_p * f_max,
            active_force_length: f_l,
            normalized_fiber_length,
            fiber_velocity,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use gait_diff::Dual;

    fn muscle() -> Muscle {
        let tendon = MuscleTendonParameters::new(1000.0, 0.1, 0.2, 0.1);
        Muscle::new("test_r", tendon, 0.6, 0.5).unwrap()
    }

    fn inputs(a: f64, l_mt: f64, f_t: f64) -> HillInputs<f64> {
        HillInputs {
            activation: a,
            mt_length: l_mt,
            mt_velocity: 0.0,
            normalized_tendon_force: f_t,
            normalized_tendon_force_rate: 0.0,
        }
    }

    /// Static equilibrium tendon force by bisection (residual grows with f_T).
    fn static_equilibrium(hill: &HillEquilibrium, a: f64, l_mt: f64) -> f64 {
        let (mut lo, mut hi) = (0.0, 5.0);
        for _ in 0..200 {
            let mid = 0.5 * (lo + hi);
            if hill.evaluate(&inputs(a, l_mt, mid)).residual > 0.0 {
                hi = mid;
            } else {
                lo = mid;
            }
        }
        0.5 * (lo + hi)
    }

    #[test]
    fn test_static_equilibrium_exists() {
        let hill = HillEquilibrium::new(&muscle());
        let f_t = static_equilibrium(&hill, 0.5, 0.3);
        let state = hill.evaluate(&inputs(0.5, 0.3, f_t));
        assert_relative_eq!(state.residual, 0.0, epsilon = 1e-9);
        assert!(f_t > 0.2 && f_t < 0.7, "{f_t}");
        assert!(state.normalized_fiber_length > 0.8 && state.normalized_fiber_length < 1.2);
        assert_relative_eq!(state.tendon_force, 1000.0 * f_t, epsilon = 1e-9);
        assert_relative_eq!(state.fiber_velocity, 0.0);
    }

    #[test]
    fn test_more_activation_needs_more_force() {
        let hill = HillEquilibrium::new(&muscle());
        let low = static_equilibrium(&hill, 0.2, 0.3);
        let high = static_equilibrium(&hill, 0.8, 0.3);
        assert!(high > low);
    }

    #[test]
    fn test_fiber_velocity_from_kinematics() {
        let hill = HillEquilibrium::new(&muscle());
        let mut x = inputs(0.3, 0.3, 0.3);
        x.mt_velocity = -0.2;
        let state = hill.evaluate(&x);
        // rigid-tendon limit: fiber follows the musculotendon unit
        assert!(state.fiber_velocity < -0.19 && state.fiber_velocity > -0.2);
        x.normalized_tendon_force_rate = 1.0;
        let stretched = hill.evaluate(&x);
        assert!(stretched.fiber_velocity < state.fiber_velocity);
    }

    #[test]
    fn test_dual_matches_finite_difference() {
        let hill = HillEquilibrium::new(&muscle());
        let base = [0.4, 0.31, 0.35, -0.1, 0.5];
        let eval = |v: &[f64; 5]| {
            hill.evaluate(&HillInputs {
                activation: v[0],
                mt_length: v[1],
                normalized_tendon_force: v[2],
                mt_velocity: v[3],
                normalized_tendon_force_rate: v[4],
            })
            .residual
        };
        let d = Dual::seed(&base, 0);
        let dual = hill
            .evaluate(&HillInputs {
                activation: d[0].clone(),
                mt_length: d[1].clone(),
                normalized_tendon_force: d[2].clone(),
                mt_velocity: d[3].clone(),
                normalized_tendon_force_rate: d[4].clone(),
            })
            .residual;
        assert_relative_eq!(dual.value(), eval(&base), epsilon = 1e-12);
        let h = 1e-6;
        for i in 0..5 {
            let mut up = base;
            let mut down = base;
            up[i] += h;
            down[i] -= h;
            let fd = (eval(&up) - eval(&down)) / (2.0 * h);
            assert_relative_eq!(dual.partial(i), fd, epsilon = 1e-5, max_relative = 1e-5);
        }
    }
}
