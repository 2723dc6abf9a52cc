//! Boundary to the external skeletal dynamics evaluator.
//!
//! The evaluator is a black box from positions, velocities and
//! accelerations to generalized forces plus auxiliary outputs:
//!
//! ```text
//! input:  [ q_0 q̇_0 q_1 q̇_1 … q_{n−1} q̇_{n−1} | q̈_0 … q̈_{n−1} ]
//! output: see gait_types::DynamicsLayout
//! ```
//!
//! Inside the transcription the outputs are lifted into the active scalar
//! type through the evaluator's Jacobian, so black-box outputs carry
//! derivatives like every other expression.

use gait_diff::Scalar;
use gait_types::{
    Body, DynamicsLayout, DynamicsVariant, GaitError, GaitModel, Result, Side,
};
use nalgebra::DMatrix;
use tracing::debug;

/// Relative step of the central-difference Jacobian.
const FD_STEP: f64 = 1e-6;

/// An inverse-dynamics evaluator with a fixed-offset output layout.
pub trait DynamicsEvaluator: Send + Sync {
    /// Output layout.
    fn layout(&self) -> DynamicsLayout;

    /// Which output schema this evaluator produces.
    fn variant(&self) -> DynamicsVariant;

    /// Outputs at `input`.
    fn evaluate(&self, input: &[f64]) -> Result<Vec<f64>>;

    /// `∂output/∂input` at `input`, central differences unless overridden.
    fn jacobian(&self, input: &[f64]) -> Result<DMatrix<f64>> {
        let n_out = self.layout().output_len(self.variant());
        let mut jac = DMatrix::zeros(n_out, input.len());
        let mut x = input.to_vec();
        for i in 0..input.len() {
            let h = FD_STEP * input[i].abs().max(1.0);
            x[i] = input[i] + h;
            let up = self.evaluate(&x)?;
            x[i] = input[i] - h;
            let down = self.evaluate(&x)?;
            x[i] = input[i];
            for (r, (u, d)) in up.iter().zip(&down).enumerate() {
                jac[(r, i)] = (u - d) / (2.0 * h);
            }
        }
        Ok(jac)
    }
}

/// Interleave positions and velocities, then append accelerations.
pub fn dynamics_input<S: Scalar>(q: &[S], qd: &[S], qdd: &[S]) -> Vec<S> {
    let mut input = Vec::with_capacity(3 * q.len());
    for (p, v) in q.iter().zip(qd) {
        input.push(p.clone());
        input.push(v.clone());
    }
    input.extend(qdd.iter().cloned());
    input
}

/// Evaluate `evaluator` on scalars, lifting outputs through its Jacobian
/// when `S` tracks derivatives.
pub fn evaluate_dynamics<S: Scalar>(
    evaluator: &dyn DynamicsEvaluator,
    input: &[S],
) -> Result<Vec<S>> {
    let values: Vec<f64> = input.iter().map(Scalar::value).collect();
    let out = evaluator.evaluate(&values)?;
    if !S::TRACKS_DERIVATIVES {
        return Ok(out.into_iter().map(S::constant).collect());
    }
    let jac = evaluator.jacobian(&values)?;
    let mut row = vec![0.0; input.len()];
    Ok(out
        .iter()
        .enumerate()
        .map(|(r, &v)| {
            for (c, slot) in row.iter_mut().enumerate() {
                *slot = jac[(r, c)];
            }
            S::lift(v, &row, input)
        })
        .collect())
}

/// Check that `evaluator` matches the layout of `model` in `variant`.
pub fn check_evaluator(
    evaluator: &dyn DynamicsEvaluator,
    model: &GaitModel,
    variant: DynamicsVariant,
) -> Result<()> {
    let layout = evaluator.layout();
    if layout != model.dynamics || evaluator.variant() != variant {
        return Err(GaitError::consistency(format!(
            "dynamics evaluator is {:?} for {} joints, model needs {variant:?} for {}",
            evaluator.variant(),
            layout.n_joints,
            model.n_joints()
        )));
    }
    let out = evaluator.evaluate(&vec![0.0; layout.input_len()])?;
    let expected = layout.output_len(variant);
    if out.len() != expected {
        return Err(GaitError::consistency(format!(
            "dynamics evaluator returned {} outputs, layout expects {expected}",
            out.len()
        )));
    }
    if out.iter().any(|v| !v.is_finite()) {
        return Err(GaitError::consistency(
            "dynamics evaluator returned non-finite outputs at rest",
        ));
    }
    debug!(outputs = expected, ?variant, "dynamics evaluator layout checked");
    Ok(())
}

/// A decoupled linear stand-in for the skeletal dynamics.
///
/// Every coordinate is an independent second-order system,
/// `τ_j = I_j q̈_j + b_j q̇_j + k_j q_j`. Body origins are fixed points in
/// the transverse plane clear of each other; in the post-processing schema
/// the calcanei travel with the forward coordinate and vertical ground
/// reaction forces switch between the feet with the sign of a contact
/// coordinate.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearDynamics {
    layout: DynamicsLayout,
    variant: DynamicsVariant,
    inertia: Vec<f64>,
    damping: Vec<f64>,
    stiffness: Vec<f64>,
    forward: usize,
    contact: Option<usize>,
    body_weight: f64,
}

impl LinearDynamics {
    /// Sharpness of the contact switch (1/rad).
    const CONTACT_SHARPNESS: f64 = 20.0;
    /// Lateral offset of the right body origins (m); left ones are mirrored.
    const LATERAL: f64 = 0.1;
    /// Lateral offset of the hands (m).
    const HAND_LATERAL: f64 = 0.4;

    /// Unit inertia, no damping or stiffness, for `model`.
    #[must_use]
    pub fn new(model: &GaitModel, variant: DynamicsVariant) -> Self {
        let n = model.n_joints();
        Self {
            layout: model.dynamics,
            variant,
            inertia: vec![1.0; n],
            damping: vec![0.0; n],
            stiffness: vec![0.0; n],
            forward: model.pelvis.forward,
            contact: None,
            body_weight: 0.0,
        }
    }

    /// Set the coefficients of coordinate `joint`.
    #[must_use]
    pub fn with_joint(mut self, joint: usize, inertia: f64, damping: f64, stiffness: f64) -> Self {
        self.inertia[joint] = inertia;
        self.damping[joint] = damping;
        self.stiffness[joint] = stiffness;
        self
    }

    /// Drive the vertical ground reaction forces from `joint`: the right
    /// foot loads when it is positive.
    #[must_use]
    pub fn with_contact(mut self, joint: usize, body_weight: f64) -> Self {
        self.contact = Some(joint);
        self.body_weight = body_weight;
        self
    }

    /// The same coefficients in another output schema.
    #[must_use]
    pub fn with_variant(mut self, variant: DynamicsVariant) -> Self {
        self.variant = variant;
        self
    }

    fn lateral(side: Side, offset: f64) -> f64 {
        match side {
            Side::Right => offset,
            Side::Left => -offset,
        }
    }

    fn origin(body: Body, side: Side) -> [f64; 2] {
        match body {
            Body::Hand => [0.0, Self::lateral(side, Self::HAND_LATERAL)],
            Body::Toes => [0.15, Self::lateral(side, Self::LATERAL)],
            Body::Calcaneus | Body::Femur | Body::Tibia => {
                [0.0, Self::lateral(side, Self::LATERAL)]
            }
        }
    }

    fn right_load(&self, input: &[f64]) -> f64 {
        self.contact.map_or(0.5, |c| {
            0.5 + 0.5 * (Self::CONTACT_SHARPNESS * input[2 * c]).tanh()
        })
    }
}

impl DynamicsEvaluator for LinearDynamics {
    fn layout(&self) -> DynamicsLayout {
        self.layout
    }

    fn variant(&self) -> DynamicsVariant {
        self.variant
    }

    fn evaluate(&self, input: &[f64]) -> Result<Vec<f64>> {
        let n = self.layout.n_joints;
        if input.len() != self.layout.input_len() {
            return Err(GaitError::consistency(format!(
                "dynamics input has {} entries, expected {}",
                input.len(),
                self.layout.input_len()
            )));
        }
        let mut out = vec![0.0; self.layout.output_len(self.variant)];
        for j in 0..n {
            out[j] = self.inertia[j] * input[2 * n + j]
                + self.damping[j] * input[2 * j + 1]
                + self.stiffness[j] * input[2 * j];
        }
        match self.variant {
            DynamicsVariant::Transcription => {
                for body in [Body::Calcaneus, Body::Femur, Body::Hand, Body::Tibia, Body::Toes] {
                    for side in [Side::Right, Side::Left] {
                        let range = self.layout.origin(body, side);
                        out[range].copy_from_slice(&Self::origin(body, side));
                    }
                }
            }
            DynamicsVariant::PostProcessing => {
                let right = self.right_load(input);
                let x = input[2 * self.forward];
                for (side, share) in [(Side::Right, right), (Side::Left, 1.0 - right)] {
                    let grf = self.layout.grf(side);
                    out[grf.start + 1] = self.body_weight * share;
                    let calcn = self.layout.calcaneus_3d(side);
                    out[calcn.start] = x;
                    out[calcn.start + 2] = Self::lateral(side, Self::LATERAL);
                }
            }
        }
        Ok(out)
    }

    fn jacobian(&self, input: &[f64]) -> Result<DMatrix<f64>> {
        let n = self.layout.n_joints;
        let mut jac = DMatrix::zeros(self.layout.output_len(self.variant), input.len());
        for j in 0..n {
            jac[(j, 2 * n + j)] = self.inertia[j];
            jac[(j, 2 * j + 1)] = self.damping[j];
            jac[(j, 2 * j)] = self.stiffness[j];
        }
        if self.variant == DynamicsVariant::PostProcessing {
            if let Some(c) = self.contact {
                let t = (Self::CONTACT_SHARPNESS * input[2 * c]).tanh();
                let d = 0.5 * Self::CONTACT_SHARPNESS * (1.0 - t * t) * self.body_weight;
                jac[(self.layout.grf(Side::Right).start + 1, 2 * c)] = d;
                jac[(self.layout.grf(Side::Left).start + 1, 2 * c)] = -d;
            }
            for side in [Side::Right, Side::Left] {
                jac[(self.layout.calcaneus_3d(side).start, 2 * self.forward)] = 1.0;
            }
        }
        Ok(jac)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use gait_diff::Dual;
    use gait_types::CollisionPair;

    fn toy() -> (GaitModel, LinearDynamics) {
        let model = GaitModel::toy_leg().unwrap();
        let dynamics = LinearDynamics::new(&model, DynamicsVariant::Transcription)
            .with_joint(1, 0.5, 0.2, 3.0)
            .with_contact(1, 600.0);
        (model, dynamics)
    }

    #[test]
    fn test_interleaved_input() {
        let input = dynamics_input(&[1.0, 2.0], &[3.0, 4.0], &[5.0, 6.0]);
        assert_eq!(input, vec![1.0, 3.0, 2.0, 4.0, 5.0, 6.0]);
    }

    #[test]
    fn test_torques_and_origins() {
        let (model, dynamics) = toy();
        let out = dynamics.evaluate(&[0.0, 1.0, 0.2, -1.0, 0.0, 2.0]).unwrap();
        assert_relative_eq!(out[0], 0.0);
        assert_relative_eq!(out[1], 0.5 * 2.0 - 0.2 + 3.0 * 0.2, epsilon = 1e-12);
        // the fixed origins satisfy every collision pair
        for pair in CollisionPair::walking_set() {
            let a = &out[model.dynamics.origin(pair.first.0, pair.first.1)];
            let b = &out[model.dynamics.origin(pair.second.0, pair.second.1)];
            let d2 = (a[0] - b[0]).powi(2) + (a[1] - b[1]).powi(2);
            assert!(d2 >= pair.min_squared_distance && d2 <= pair.max_squared_distance);
        }
    }

    #[test]
    fn test_analytic_jacobian_matches_differences() {
        let (_, dynamics) = toy();
        let pp = dynamics.with_variant(DynamicsVariant::PostProcessing);
        let x = [0.3, 1.1, 0.02, -0.4, 0.1, 0.7];
        let analytic = pp.jacobian(&x).unwrap();
        // the trait default is the finite-difference Jacobian
        struct Fd<'a>(&'a LinearDynamics);
        impl DynamicsEvaluator for Fd<'_> {
            fn layout(&self) -> DynamicsLayout {
                self.0.layout()
            }
            fn variant(&self) -> DynamicsVariant {
                self.0.variant()
            }
            fn evaluate(&self, input: &[f64]) -> Result<Vec<f64>> {
                self.0.evaluate(input)
            }
        }
        let numeric = Fd(&pp).jacobian(&x).unwrap();
        for (a, n) in analytic.iter().zip(numeric.iter()) {
            assert_relative_eq!(*a, *n, epsilon = 1e-4, max_relative = 1e-6);
        }
    }

    #[test]
    fn test_lift_carries_derivatives() {
        let (_, dynamics) = toy();
        let x = [0.0, 1.0, 0.2, -1.0, 0.0, 2.0];
        let dual = Dual::seed(&x, 0);
        let out = evaluate_dynamics(&dynamics, &dual).unwrap();
        assert_relative_eq!(out[1].value(), 1.4, epsilon = 1e-12);
        assert_relative_eq!(out[1].partial(2), 3.0);
        assert_relative_eq!(out[1].partial(5), 0.5);
        let plain = evaluate_dynamics(&dynamics, &x).unwrap();
        assert_relative_eq!(plain[1], 1.4, epsilon = 1e-12);
    }

    #[test]
    fn test_check_evaluator() {
        let (model, dynamics) = toy();
        check_evaluator(&dynamics, &model, DynamicsVariant::Transcription).unwrap();
        let err = check_evaluator(&dynamics, &model, DynamicsVariant::PostProcessing).unwrap_err();
        assert!(err.is_consistency_error());
    }

    #[test]
    fn test_post_processing_contact() {
        let (_, dynamics) = toy();
        let pp = dynamics.with_variant(DynamicsVariant::PostProcessing);
        let layout = pp.layout();
        let stance_right = pp.evaluate(&[0.4, 1.0, 0.3, 0.0, 0.0, 0.0]).unwrap();
        assert!(stance_right[layout.grf(Side::Right).start + 1] > 590.0);
        assert!(stance_right[layout.grf(Side::Left).start + 1] < 10.0);
        assert_relative_eq!(stance_right[layout.calcaneus_3d(Side::Left).start], 0.4);
    }
}
