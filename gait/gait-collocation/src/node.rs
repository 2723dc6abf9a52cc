//! Per-interval collocation function.
//!
//! One mesh interval `k` owns the states at its left mesh point and at its
//! `d` collocation points, the piecewise-constant controls `aDt` and `eArm`,
//! and the slack controls `FDt` and `Qdds` at its collocation points. At every
//! collocation point `j` (local state index `j + 1`) it emits
//!
//! ```text
//! equalities    h·ẋ_j − Σ_r x_r C[j+1][r]        a, F, Qs, Qds, aArm
//!               T_pelvis                           unactuated base
//!               T − Σ dM·F − τ_passive             muscle-driven joints
//!               (T − τ_linear)/150 − aArm          arm joints
//!               (T − τ_passive − τ_linear)/100     MTP joints
//!               Hill residual
//! inequalities  aDt + a/τ_deact ≥ 0
//!               aDt + a/τ_act   ≤ 1/τ_act
//!               |o_1 − o_2|² ∈ [d_min², 4]         collision pairs
//! ```
//!
//! plus its share of the integrated cost, `h·B[j+1]·Σ w_i·term_i`. Intervals
//! share no intermediate quantities, so they can be evaluated in parallel.

use gait_diff::Scalar;
use gait_muscle::{norm_sum_pow, ActivationDynamics};
use gait_nlp::{Bounds, INFINITE_BOUND};
use gait_types::{CostWeights, DynamicsVariant, GaitModel, Result};

use crate::biophysics::Biophysics;
use crate::bounds::Scaling;
use crate::dynamics::{dynamics_input, evaluate_dynamics, DynamicsEvaluator};
use crate::radau::CollocationScheme;
use crate::variables::{Family, VariableLayout};

/// Scaled decision variables of one interval.
///
/// State families hold `d + 1` nodes: the left mesh point, then the
/// collocation points. Slack families hold the `d` collocation points.
#[derive(Debug, Clone, PartialEq)]
pub struct IntervalVariables<S> {
    /// Final time.
    pub final_time: S,
    /// Muscle activation.
    pub activation: Vec<Vec<S>>,
    /// Normalized tendon force.
    pub force: Vec<Vec<S>>,
    /// Joint positions.
    pub position: Vec<Vec<S>>,
    /// Joint velocities.
    pub velocity: Vec<Vec<S>>,
    /// Arm activation.
    pub arm_activation: Vec<Vec<S>>,
    /// Activation rate.
    pub activation_rate: Vec<S>,
    /// Arm excitation.
    pub arm_excitation: Vec<S>,
    /// Normalized tendon force rate.
    pub force_rate: Vec<Vec<S>>,
    /// Joint accelerations.
    pub acceleration: Vec<Vec<S>>,
}

impl<S: Scalar> IntervalVariables<S> {
    /// Gather interval `k` from a decision vector; `variable(i)` turns flat
    /// index `i` into a scalar.
    pub fn gather(layout: &VariableLayout, k: usize, variable: impl Fn(usize) -> S) -> Self {
        let dims = *layout.dimensions();
        let d = dims.degree;
        let items = |family: Family, node: usize| -> Vec<S> {
            (0..dims.items(family))
                .map(|i| variable(layout.index(family, node, i)))
                .collect()
        };
        let state = |mesh: Family, col: Family| -> Vec<Vec<S>> {
            std::iter::once(items(mesh, k))
                .chain((0..d).map(|j| items(col, k * d + j)))
                .collect()
        };
        let slack = |col: Family| -> Vec<Vec<S>> { (0..d).map(|j| items(col, k * d + j)).collect() };
        Self {
            final_time: variable(layout.index(Family::FinalTime, 0, 0)),
            activation: state(Family::Activation, Family::ActivationCol),
            force: state(Family::Force, Family::ForceCol),
            position: state(Family::Position, Family::PositionCol),
            velocity: state(Family::Velocity, Family::VelocityCol),
            arm_activation: state(Family::ArmActivation, Family::ArmActivationCol),
            activation_rate: items(Family::ActivationRate, k),
            arm_excitation: items(Family::ArmExcitation, k),
            force_rate: slack(Family::ForceRateCol),
            acceleration: slack(Family::AccelerationCol),
        }
    }
}

/// Unweighted cost terms at one collocation point.
#[derive(Debug, Clone, PartialEq)]
pub struct CostTerms<S> {
    /// `Σ Ė²/n_M` divided by the model mass.
    pub metabolic_energy_rate: S,
    /// `Σ a²/n_M`.
    pub activation: S,
    /// `Σ e_arm²/n_arm`.
    pub arm_excitation: S,
    /// Scaled non-arm accelerations, `Σ q̈²/n`.
    pub joint_acceleration: S,
    /// `Σ τ_passive²/n_passive`.
    pub passive_torque: S,
    /// Scaled activation rates.
    pub activation_rate: S,
    /// Scaled tendon force rates.
    pub force_rate: S,
    /// Scaled arm accelerations.
    pub arm_acceleration: S,
}

impl<S: Scalar> CostTerms<S> {
    /// `Σ w_i · term_i`; the three control terms share one weight.
    #[must_use]
    pub fn weighted(&self, w: &CostWeights) -> S {
        self.metabolic_energy_rate.clone() * w.metabolic_energy_rate
            + self.activation.clone() * w.activation
            + self.arm_excitation.clone() * w.arm_excitation
            + self.joint_acceleration.clone() * w.joint_acceleration
            + self.passive_torque.clone() * w.passive_torque
            + (self.force_rate.clone() + self.activation_rate.clone() + self.arm_acceleration.clone())
                * w.controls
    }
}

/// Constraint rows and cost of one interval.
#[derive(Debug, Clone, PartialEq)]
pub struct IntervalOutput<S> {
    /// Rows of every collocation point, point after point.
    pub constraints: Vec<S>,
    /// Integrated weighted cost over the interval.
    pub cost: S,
    /// Unweighted terms at each collocation point.
    pub terms: Vec<CostTerms<S>>,
}

/// Evaluates the collocation function of any interval.
pub struct IntervalEvaluator<'a> {
    model: &'a GaitModel,
    dynamics: &'a dyn DynamicsEvaluator,
    biophysics: Biophysics,
    activation: ActivationDynamics,
    scheme: CollocationScheme,
    scaling: Scaling,
    weights: CostWeights,
    model_mass: f64,
    n_intervals: usize,
    non_arm: Vec<usize>,
}

impl<'a> IntervalEvaluator<'a> {
    /// Evaluator for `model` on `n_intervals` intervals.
    #[allow(clippy::too_many_arguments)]
    #[must_use]
    pub fn new(
        model: &'a GaitModel,
        dynamics: &'a dyn DynamicsEvaluator,
        scheme: CollocationScheme,
        scaling: Scaling,
        weights: CostWeights,
        model_mass: f64,
        n_intervals: usize,
    ) -> Self {
        Self {
            model,
            dynamics,
            biophysics: Biophysics::new(model),
            activation: ActivationDynamics::new(model.time_constants),
            scheme,
            scaling,
            weights,
            model_mass,
            n_intervals,
            non_arm: model.non_arm_joints(),
        }
    }

    /// The collocation scheme.
    #[must_use]
    pub fn scheme(&self) -> &CollocationScheme {
        &self.scheme
    }

    /// Number of equality rows per collocation point.
    #[must_use]
    pub fn equalities_per_node(&self) -> usize {
        let m = self.model;
        3 * m.n_muscles()
            + 2 * m.n_joints()
            + 2 * m.n_arms()
            + m.ground_pelvis_joints.len()
            + m.muscle_driven.len()
            + m.mtp_joints.len()
    }

    /// Number of constraint rows per collocation point.
    #[must_use]
    pub fn rows_per_node(&self) -> usize {
        self.equalities_per_node() + 2 * self.model.n_muscles() + self.model.collision_pairs.len()
    }

    /// Bounds of the rows of one collocation point.
    #[must_use]
    pub fn node_bounds(&self) -> Bounds {
        let nm = self.model.n_muscles();
        let mut bounds = Bounds::equal(0.0, self.equalities_per_node());
        bounds.push_repeated(0.0, INFINITE_BOUND, nm);
        bounds.push_repeated(-INFINITE_BOUND, self.activation.activation_ceiling(), nm);
        for pair in &self.model.collision_pairs {
            bounds.push_repeated(pair.min_squared_distance, pair.max_squared_distance, 1);
        }
        bounds
    }

    /// Constraint rows and cost of one interval.
    pub fn evaluate<S: Scalar>(&self, v: &IntervalVariables<S>) -> Result<IntervalOutput<S>> {
        let m = self.model;
        let s = &self.scaling;
        let d = self.scheme.degree();
        let h = v.final_time.clone() / self.n_intervals as f64;

        let unscale = |values: &[S], factors: &[f64]| -> Vec<S> {
            values.iter().zip(factors).map(|(x, &f)| x.clone() * f).collect()
        };
        let unscale_all = |nodes: &[Vec<S>], factors: &[f64]| -> Vec<Vec<S>> {
            nodes.iter().map(|n| unscale(n, factors)).collect()
        };
        let a = unscale_all(&v.activation, &s.activation);
        let f = unscale_all(&v.force, &s.force);
        let qs = unscale_all(&v.position, &s.position);
        let qds = unscale_all(&v.velocity, &s.velocity);
        let arm = unscale_all(&v.arm_activation, &s.arm);
        let a_dt = unscale(&v.activation_rate, &s.activation_rate);
        let e_arm = unscale(&v.arm_excitation, &s.arm);
        let f_dt = unscale_all(&v.force_rate, &s.force_rate);
        let qdds = unscale_all(&v.acceleration, &s.acceleration);

        let mut constraints = Vec::with_capacity(d * self.rows_per_node());
        let mut terms = Vec::with_capacity(d);
        let mut cost = S::zero();
        let quadrature = self.scheme.quadrature();

        for j in 0..d {
            let c = j + 1;
            let coeffs = self.scheme.derivative_row(c);
            let muscles = self
                .biophysics
                .muscles(&qs[c], &qds[c], &a[c], &f[c], &f_dt[j]);
            let passive = self.biophysics.passive_torques(&qs[c], &qds[c]);
            let arm_linear = self.biophysics.arm_passive_torques(&qs[c], &qds[c]);
            let mtp_linear = self.biophysics.mtp_passive_torques(&qs[c], &qds[c]);

            let scaled_acc = &v.acceleration[j];
            let pick = |idx: &[usize]| -> Vec<S> { idx.iter().map(|&i| scaled_acc[i].clone()).collect() };
            let node_terms = CostTerms {
                metabolic_energy_rate: norm_sum_pow(&muscles.metabolic_rates(), 2) / self.model_mass,
                activation: norm_sum_pow(&a[c], 2),
                arm_excitation: norm_sum_pow(&v.arm_excitation, 2),
                joint_acceleration: norm_sum_pow(&pick(&self.non_arm), 2),
                passive_torque: norm_sum_pow(&passive, 2),
                activation_rate: norm_sum_pow(&v.activation_rate, 2),
                force_rate: norm_sum_pow(&v.force_rate[j], 2),
                arm_acceleration: norm_sum_pow(&pick(&m.arm_joints), 2),
            };
            cost += node_terms.weighted(&self.weights) * h.clone() * quadrature[c];
            terms.push(node_terms);

            // collocation residuals
            let slope = |states: &[Vec<S>], item: usize| -> S {
                S::sum_of(states.iter().zip(coeffs).map(|(x, &cr)| x[item].clone() * cr))
            };
            for i in 0..m.n_muscles() {
                constraints.push((h.clone() * a_dt[i].clone() - slope(&a, i)) / s.activation[i]);
            }
            for i in 0..m.n_muscles() {
                constraints.push((h.clone() * f_dt[j][i].clone() - slope(&f, i)) / s.force[i]);
            }
            for i in 0..m.n_joints() {
                constraints.push((h.clone() * qds[c][i].clone() - slope(&qs, i)) / s.position[i]);
            }
            for i in 0..m.n_joints() {
                constraints.push((h.clone() * qdds[j][i].clone() - slope(&qds, i)) / s.velocity[i]);
            }
            for i in 0..m.n_arms() {
                let rate = self.activation.arm_rate(&e_arm[i], &arm[c][i]);
                constraints.push((h.clone() * rate - slope(&arm, i)) / s.arm[i]);
            }

            // skeleton dynamics
            let input = dynamics_input(&qs[c], &qds[c], &qdds[j]);
            let out = evaluate_dynamics(self.dynamics, &input)?;
            for &p in &m.ground_pelvis_joints {
                constraints.push(out[p].clone());
            }
            for driven in &m.muscle_driven {
                constraints.push(
                    out[driven.joint].clone()
                        - muscles.muscle_torque(driven)
                        - passive[driven.passive].clone(),
                );
            }
            for (i, &joint) in m.arm_joints.iter().enumerate() {
                constraints.push(
                    (out[joint].clone() - arm_linear[i].clone()) / m.arm_torque_scale
                        - arm[c][i].clone(),
                );
            }
            let mtp_passive = self.biophysics.mtp_total_passive(&passive, &mtp_linear);
            for (i, &joint) in m.mtp_joints.iter().enumerate() {
                constraints.push((out[joint].clone() - mtp_passive[i].clone()) / m.mtp_torque_scale);
            }
            constraints.extend(muscles.residuals());

            // activation dynamics
            let bounds: Vec<_> = (0..m.n_muscles())
                .map(|i| self.activation.bounds(&a[c][i], &a_dt[i]))
                .collect();
            constraints.extend(bounds.iter().map(|b| b.deactivation.clone()));
            constraints.extend(bounds.into_iter().map(|b| b.activation));

            // self-collision
            for pair in &m.collision_pairs {
                let first = m.dynamics.origin(pair.first.0, pair.first.1);
                let second = m.dynamics.origin(pair.second.0, pair.second.1);
                constraints.push(S::sum_of(
                    first
                        .zip(second)
                        .map(|(p, q)| (out[p].clone() - out[q].clone()).square()),
                ));
            }
        }

        Ok(IntervalOutput {
            constraints,
            cost,
            terms,
        })
    }

    /// Variant the dynamics evaluator must produce.
    #[must_use]
    pub const fn dynamics_variant() -> DynamicsVariant {
        DynamicsVariant::Transcription
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::bounds::ProblemBounds;
    use crate::dynamics::LinearDynamics;
    use crate::guess::{HeuristicGuess, InitialGuess};
    use crate::reference::{tests::toy_table, ReferenceMotion};
    use crate::variables::Dimensions;
    use approx::assert_relative_eq;
    use gait_diff::Dual;

    struct Fixture {
        model: GaitModel,
        dynamics: LinearDynamics,
        bounds: ProblemBounds,
        layout: VariableLayout,
        x: Vec<f64>,
    }

    fn fixture() -> Fixture {
        let model = GaitModel::toy_leg().unwrap();
        let reference = ReferenceMotion::from_table(&toy_table(), &model).unwrap();
        let bounds = ProblemBounds::new(&model, &reference).unwrap();
        let dims = Dimensions::new(&model, 4, 3);
        let layout = VariableLayout::new(dims);
        let guess = HeuristicGuess::new(&model, 4, 1.0)
            .trajectory(&dims, &bounds.scaling)
            .unwrap();
        let x = layout.flatten(&guess).unwrap();
        let dynamics = LinearDynamics::new(&model, DynamicsVariant::Transcription).with_joint(1, 0.5, 0.1, 2.0);
        Fixture {
            model,
            dynamics,
            bounds,
            layout,
            x,
        }
    }

    fn evaluator(fx: &Fixture) -> IntervalEvaluator<'_> {
        IntervalEvaluator::new(
            &fx.model,
            &fx.dynamics,
            CollocationScheme::radau(3).unwrap(),
            fx.bounds.scaling.clone(),
            CostWeights::default(),
            60.0,
            4,
        )
    }

    #[test]
    fn test_row_counts() {
        let fx = fixture();
        let ev = evaluator(&fx);
        // 3·1 + 2·2 + 0 + 1 pelvis + 1 driven + 0 mtp
        assert_eq!(ev.equalities_per_node(), 9);
        assert_eq!(ev.rows_per_node(), 9 + 2 + 5);
        let b = ev.node_bounds();
        assert_eq!(b.len(), ev.rows_per_node());
        assert_relative_eq!(b.upper[10], 1.0 / 0.015, epsilon = 1e-9);
        assert_relative_eq!(b.lower[11], 0.0081);
        let v = IntervalVariables::gather(&fx.layout, 1, |i| fx.x[i]);
        let out = ev.evaluate(&v).unwrap();
        assert_eq!(out.constraints.len(), 3 * ev.rows_per_node());
        assert_eq!(out.terms.len(), 3);
    }

    #[test]
    fn test_gather_picks_interval_nodes() {
        let fx = fixture();
        let v = IntervalVariables::gather(&fx.layout, 2, |i| i as f64);
        assert_eq!(v.position.len(), 4);
        assert_eq!(v.force_rate.len(), 3);
        assert_relative_eq!(v.position[0][1], fx.layout.index(Family::Position, 2, 1) as f64);
        assert_relative_eq!(v.position[3][0], fx.layout.index(Family::PositionCol, 8, 0) as f64);
        assert_relative_eq!(v.acceleration[0][0], fx.layout.index(Family::AccelerationCol, 6, 0) as f64);
        assert_relative_eq!(v.activation_rate[0], fx.layout.index(Family::ActivationRate, 2, 0) as f64);
    }

    #[test]
    fn test_heuristic_guess_residuals() {
        let fx = fixture();
        let ev = evaluator(&fx);
        let v = IntervalVariables::gather(&fx.layout, 0, |i| fx.x[i]);
        let out = ev.evaluate(&v).unwrap();
        let nm = fx.model.n_muscles();
        // constant activation against the default rate: h · ȧ
        let h = fx.x[0] / 4.0;
        assert_relative_eq!(out.constraints[0], h * 0.01, epsilon = 1e-12);
        // hip position residual: zero angle, zero velocity
        assert_relative_eq!(out.constraints[2 * nm + 1], 0.0, epsilon = 1e-12);
        // collision rows come from the fixed origins
        let rows = ev.rows_per_node();
        assert_relative_eq!(out.constraints[rows - 5], 0.04, epsilon = 1e-12);
        assert!(out.cost > 0.0);
    }

    #[test]
    fn test_dual_matches_finite_differences() {
        let fx = fixture();
        let ev = evaluator(&fx);
        let mut x = fx.x.clone();
        // move off the guess so every term is active
        for (i, xi) in x.iter_mut().enumerate() {
            *xi += 0.01 * ((i % 7) as f64 - 3.0) / 3.0;
        }
        let k = 1;
        let dual = ev
            .evaluate(&IntervalVariables::gather(&fx.layout, k, |i| Dual::variable(x[i], i)))
            .unwrap();
        let plain = ev
            .evaluate(&IntervalVariables::gather(&fx.layout, k, |i| x[i]))
            .unwrap();
        assert_relative_eq!(dual.cost.value(), plain.cost, max_relative = 1e-12);
        for column in [
            fx.layout.index(Family::FinalTime, 0, 0),
            fx.layout.index(Family::PositionCol, 4, 1),
            fx.layout.index(Family::ForceCol, 3, 0),
            fx.layout.index(Family::ActivationRate, 1, 0),
        ] {
            let step = 1e-6;
            let mut up = x.clone();
            up[column] += step;
            let mut down = x.clone();
            down[column] -= step;
            let fu = ev
                .evaluate(&IntervalVariables::gather(&fx.layout, k, |i| up[i]))
                .unwrap();
            let fd = ev
                .evaluate(&IntervalVariables::gather(&fx.layout, k, |i| down[i]))
                .unwrap();
            let numeric = (fu.cost - fd.cost) / (2.0 * step);
            assert_relative_eq!(dual.cost.partial(column), numeric, epsilon = 1e-5, max_relative = 1e-4);
            for (r, row) in dual.constraints.iter().enumerate() {
                let numeric = (fu.constraints[r] - fd.constraints[r]) / (2.0 * step);
                assert_relative_eq!(row.partial(column), numeric, epsilon = 1e-5, max_relative = 1e-4);
            }
        }
    }
}
