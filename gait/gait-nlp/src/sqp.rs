//! Sequential quadratic programming over Clarabel QP subproblems.
//!
//! Each iteration linearizes the constraints and solves an elastic QP
//!
//! ```text
//! minimize    ½ pᵀ B p + ∇fᵀ p + ρ Σ (vᵢ + wᵢ)
//! subject to  g_L ≤ g + J p + v − w ≤ g_U,   v, w ≥ 0
//!             x_L − x ≤ p ≤ x_U − x
//! ```
//!
//! so the subproblem is always feasible. `B` is a block-diagonal damped
//! BFGS approximation of the Lagrangian Hessian on the partition given by
//! [`NlpProblem::hessian_blocks`], and steps are accepted by backtracking on
//! the ℓ1 merit `f + ρ ‖violation‖₁`. Variable bounds are rows of the QP,
//! never penalized, so every iterate stays inside them.
//!
//! A solve succeeds when the iterate is feasible and the Lagrangian
//! gradient `∇f + Jᵀλ + ν`, with `λ` and the bound multipliers `ν` taken
//! from the QP duals, vanishes to the tolerance.

use clarabel::algebra::CscMatrix;
use clarabel::solver::{
    DefaultSettingsBuilder, DefaultSolver, IPSolver, SolverStatus, SupportedConeT,
    SupportedConeT::{NonnegativeConeT, ZeroConeT},
};
use tracing::{debug, info, warn};

use gait_types::{GaitError, Result};

use crate::hessian::BlockHessian;
use crate::problem::{Bounds, FirstOrderEvaluation, NlpProblem, INFINITE_BOUND};
use crate::solver::{NlpSolution, NlpSolver};
use crate::sparse::TripletMatrix;
use crate::stats::{ReturnStatus, SolverStats};

/// SQP configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SqpSettings {
    /// Outer iteration limit.
    pub max_iterations: usize,
    /// Initial elastic penalty `ρ`.
    pub initial_penalty: f64,
    /// Upper limit of `ρ`.
    pub max_penalty: f64,
    /// Armijo sufficient-decrease fraction.
    pub armijo: f64,
    /// Smallest line-search step before giving up.
    pub min_step: f64,
    /// Interior-point iteration limit of each QP.
    pub qp_max_iterations: u32,
    /// Interior-point tolerance of each QP.
    pub qp_tolerance: f64,
}

impl Default for SqpSettings {
    fn default() -> Self {
        Self {
            max_iterations: 1000,
            initial_penalty: 10.0,
            max_penalty: 1e8,
            armijo: 1e-4,
            min_step: 1e-10,
            qp_max_iterations: 200,
            qp_tolerance: 1e-9,
        }
    }
}

/// SQP solver with a block-diagonal BFGS Hessian.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SqpSolver {
    settings: SqpSettings,
}

/// Outcome of one QP subproblem.
#[derive(Debug, Clone)]
struct QpStep {
    direction: Vec<f64>,
    /// Constraint multipliers, `∇L = ∇f + Jᵀλ + ν`.
    multipliers: Vec<f64>,
    /// Variable-bound multipliers `ν`, upper minus lower.
    bound_multipliers: Vec<f64>,
    /// `(variable, bound)` the full step lands on.
    landings: Vec<(usize, f64)>,
    /// `Σ (v + w)`: violation left in the linearization.
    elastic: f64,
}

impl SqpSolver {
    /// Solver with the given settings.
    #[must_use]
    pub fn new(settings: SqpSettings) -> Self {
        Self { settings }
    }

    /// The settings.
    pub fn settings(&self) -> &SqpSettings {
        &self.settings
    }

    #[allow(clippy::too_many_lines)]
    fn solve_subproblem(
        &self,
        x: &[f64],
        point: &FirstOrderEvaluation,
        hessian: &BlockHessian,
        variable_bounds: &Bounds,
        constraint_bounds: &Bounds,
        penalty: f64,
    ) -> Result<QpStep> {
        let n = x.len();
        let m = constraint_bounds.len();
        let n_qp = n + 2 * m;
        let v_col = |i: usize| n + i;
        let w_col = |i: usize| n + m + i;
        let c = &point.values.constraints;
        let jacobian_rows = point.jacobian.row_lists();

        // (row, sign) per constraint side, for recovering multipliers
        let mut row_owner: Vec<(usize, f64)> = Vec::new();
        let mut equalities = TripletMatrix::new(m, n_qp);
        let mut b_eq = Vec::new();
        let mut inequalities = TripletMatrix::new(2 * m + 2 * (m + n), n_qp);
        let mut b_in = Vec::new();
        let mut inequality_owner: Vec<Option<(usize, f64)>> = Vec::new();
        // (variable, sign, inequality row) per finite variable bound
        let mut bound_rows: Vec<(usize, f64, usize)> = Vec::new();

        for i in 0..m {
            let (lower, upper) = (constraint_bounds.lower[i], constraint_bounds.upper[i]);
            if constraint_bounds.is_equality(i) {
                let row = b_eq.len();
                for &(col, value) in &jacobian_rows[i] {
                    equalities.push(row, col, value);
                }
                equalities.push(row, v_col(i), 1.0);
                equalities.push(row, w_col(i), -1.0);
                b_eq.push(lower - c[i]);
                row_owner.push((i, 1.0));
                continue;
            }
            if lower > -INFINITE_BOUND {
                let row = b_in.len();
                for &(col, value) in &jacobian_rows[i] {
                    inequalities.push(row, col, -value);
                }
                inequalities.push(row, v_col(i), -1.0);
                inequalities.push(row, w_col(i), 1.0);
                b_in.push(c[i] - lower);
                inequality_owner.push(Some((i, -1.0)));
            }
            if upper < INFINITE_BOUND {
                let row = b_in.len();
                for &(col, value) in &jacobian_rows[i] {
                    inequalities.push(row, col, value);
                }
                inequalities.push(row, v_col(i), 1.0);
                inequalities.push(row, w_col(i), -1.0);
                b_in.push(upper - c[i]);
                inequality_owner.push(Some((i, 1.0)));
            }
        }
        for i in 0..m {
            for col in [v_col(i), w_col(i)] {
                let row = b_in.len();
                inequalities.push(row, col, -1.0);
                b_in.push(0.0);
                inequality_owner.push(None);
            }
        }
        for j in 0..n {
            if variable_bounds.upper[j] < INFINITE_BOUND {
                let row = b_in.len();
                inequalities.push(row, j, 1.0);
                b_in.push(variable_bounds.upper[j] - x[j]);
                inequality_owner.push(None);
                bound_rows.push((j, 1.0, row));
            }
            if variable_bounds.lower[j] > -INFINITE_BOUND {
                let row = b_in.len();
                inequalities.push(row, j, -1.0);
                b_in.push(x[j] - variable_bounds.lower[j]);
                inequality_owner.push(None);
                bound_rows.push((j, -1.0, row));
            }
        }

        let n_eq = b_eq.len();
        let n_in = b_in.len();
        let mut a = TripletMatrix::with_capacity(
            n_eq + n_in,
            n_qp,
            equalities.nnz() + inequalities.nnz(),
        );
        a.append_rows(&equalities, 0);
        a.append_rows(&inequalities, n_eq);
        let a = a.to_csc();
        let mut b = b_eq;
        b.extend_from_slice(&b_in);

        let p: CscMatrix<f64> = hessian.upper_triangle_csc(n_qp);
        let mut q = point.gradient.clone();
        q.extend(std::iter::repeat(penalty).take(2 * m));

        let mut cones: Vec<SupportedConeT<f64>> = Vec::with_capacity(2);
        if n_eq > 0 {
            cones.push(ZeroConeT(n_eq));
        }
        if n_in > 0 {
            cones.push(NonnegativeConeT(n_in));
        }

        let settings = DefaultSettingsBuilder::default()
            .max_iter(self.settings.qp_max_iterations)
            .verbose(false)
            .tol_gap_abs(self.settings.qp_tolerance)
            .tol_gap_rel(self.settings.qp_tolerance)
            .tol_feas(self.settings.qp_tolerance)
            .build()
            .map_err(|e| GaitError::solver(format!("invalid QP settings: {e}")))?;

        let mut solver = DefaultSolver::new(&p, &q, &a, &b, &cones, settings)
            .map_err(|e| GaitError::solver(format!("QP setup failed: {e:?}")))?;
        solver.solve();
        let solution = &solver.solution;
        if !matches!(
            solution.status,
            SolverStatus::Solved | SolverStatus::AlmostSolved
        ) {
            return Err(GaitError::solver(format!(
                "QP subproblem status {:?}",
                solution.status
            )));
        }

        let mut multipliers = vec![0.0; m];
        for (row, &(i, sign)) in row_owner.iter().enumerate() {
            multipliers[i] += sign * solution.z[row];
        }
        for (row, owner) in inequality_owner.iter().enumerate() {
            if let Some((i, sign)) = owner {
                multipliers[*i] += sign * solution.z[n_eq + row];
            }
        }
        let elastic = solution.x[n..].iter().map(|v| v.max(0.0)).sum();

        let mut direction = solution.x[..n].to_vec();
        let mut bound_multipliers = vec![0.0; n];
        let mut landings = Vec::new();
        for &(j, sign, row) in &bound_rows {
            let (z, slack) = (solution.z[n_eq + row], solution.s[n_eq + row]);
            bound_multipliers[j] += sign * z;
            // active by its dual: land on the bound instead of the interior
            // point's approach to it
            if z > slack {
                let bound = if sign > 0.0 {
                    variable_bounds.upper[j]
                } else {
                    variable_bounds.lower[j]
                };
                direction[j] = bound - x[j];
                landings.push((j, bound));
            }
        }

        Ok(QpStep {
            direction,
            multipliers,
            bound_multipliers,
            landings,
            elastic,
        })
    }
}

/// `∇f + Jᵀλ`.
fn lagrangian_gradient(point: &FirstOrderEvaluation, multipliers: &[f64]) -> Vec<f64> {
    let jt_lambda = point.jacobian.transpose_mul_vec(multipliers);
    point
        .gradient
        .iter()
        .zip(jt_lambda)
        .map(|(g, j)| g + j)
        .collect()
}

/// `‖∇f + Jᵀλ + ν‖∞` at `x`, divided by `max(1, mean |multiplier| / 100)`
/// so large multipliers do not make the test unreachable.
///
/// `λ` are the QP duals of `step`. A variable within `tolerance` of a bound
/// takes the bound multiplier of the right sign that best cancels its
/// gradient entry; a free variable takes none.
fn stationarity(
    x: &[f64],
    point: &FirstOrderEvaluation,
    step: &QpStep,
    bounds: &Bounds,
    tolerance: f64,
) -> f64 {
    let gradient = lagrangian_gradient(point, &step.multipliers);
    let residual = gradient.iter().enumerate().fold(0.0, |acc: f64, (j, &g)| {
        let at_lower = x[j] - bounds.lower[j] <= tolerance;
        let at_upper = bounds.upper[j] - x[j] <= tolerance;
        let r = match (at_lower, at_upper) {
            (true, true) => 0.0,
            (true, false) => (-g).max(0.0),
            (false, true) => g.max(0.0),
            (false, false) => g.abs(),
        };
        acc.max(r)
    });
    let count = step.multipliers.len() + step.bound_multipliers.len();
    let total: f64 = step
        .multipliers
        .iter()
        .chain(&step.bound_multipliers)
        .map(|v| v.abs())
        .sum();
    let scale = if count == 0 {
        1.0
    } else {
        (total / count as f64 / 100.0).max(1.0)
    };
    residual / scale
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

fn max_abs(values: &[f64]) -> f64 {
    values.iter().fold(0.0, |acc, v| acc.max(v.abs()))
}

impl NlpSolver for SqpSolver {
    #[allow(clippy::too_many_lines)]
    fn solve(&self, problem: &dyn NlpProblem, tolerance: f64) -> Result<NlpSolution> {
        let n = problem.n_variables();
        let variable_bounds = problem.variable_bounds();
        let constraint_bounds = problem.constraint_bounds();
        let mut x = problem.initial_point();
        if x.len() != n {
            return Err(GaitError::SolutionSizeMismatch {
                expected: n,
                actual: x.len(),
            });
        }
        variable_bounds.clamp(&mut x);

        info!(
            n_variables = n,
            n_constraints = problem.n_constraints(),
            tolerance,
            "starting SQP"
        );

        let mut point = problem.evaluate_first_order(&x)?;
        let mut hessian = BlockHessian::new(n, problem.hessian_blocks())?;
        debug!(
            blocks = hessian.n_blocks(),
            entries = hessian.upper_nnz(),
            "Hessian partition"
        );
        let mut fresh_hessian = true;
        let mut penalty = self.settings.initial_penalty;
        let mut stats = SolverStats::new();
        let mut status = ReturnStatus::MaximumIterationsExceeded;

        for iteration in 0..self.settings.max_iterations {
            let constraints = &point.values.constraints;
            let objective = point.values.objective;
            let infeasibility = constraint_bounds.max_violation(constraints);
            stats.record(objective, infeasibility);

            let step = match self.solve_subproblem(
                &x,
                &point,
                &hessian,
                &variable_bounds,
                &constraint_bounds,
                penalty,
            ) {
                Ok(step) => step,
                Err(e) if !fresh_hessian => {
                    debug!(iteration, error = %e, "QP failed, resetting Hessian");
                    hessian.reset();
                    fresh_hessian = true;
                    continue;
                }
                Err(e) => {
                    warn!(iteration, error = %e, "QP subproblem failed");
                    status = ReturnStatus::SubproblemFailed;
                    break;
                }
            };

            // saturated multipliers: the elastic penalty is too weak
            if max_abs(&step.multipliers) >= 0.99 * penalty && penalty < self.settings.max_penalty
            {
                penalty = (penalty * 10.0).min(self.settings.max_penalty);
                debug!(iteration, penalty, "raising elastic penalty");
                continue;
            }

            let step_norm = max_abs(&step.direction);
            let dual_infeasibility =
                stationarity(&x, &point, &step, &variable_bounds, tolerance);
            debug!(
                iteration,
                objective,
                infeasibility,
                dual_infeasibility,
                step = step_norm,
                penalty,
                "SQP iteration"
            );
            if infeasibility <= tolerance && dual_infeasibility <= tolerance {
                status = ReturnStatus::SolveSucceeded;
                break;
            }

            let p = &step.direction;
            let violation = constraint_bounds.total_violation(constraints);
            let predicted = -(dot(&point.gradient, p) + 0.5 * hessian.quadratic_form(p))
                + penalty * (violation - step.elastic);
            let merit = objective + penalty * violation;

            if predicted <= f64::EPSILON * (1.0 + merit.abs()) {
                if fresh_hessian {
                    status = ReturnStatus::SearchDirectionTooSmall;
                    break;
                }
                hessian.reset();
                fresh_hessian = true;
                continue;
            }

            let mut alpha = 1.0;
            let mut accepted = None;
            while alpha >= self.settings.min_step {
                let mut trial: Vec<f64> = x
                    .iter()
                    .zip(&step.direction)
                    .map(|(xi, pi)| xi + alpha * pi)
                    .collect();
                if alpha == 1.0 {
                    for &(j, bound) in &step.landings {
                        trial[j] = bound;
                    }
                }
                variable_bounds.clamp(&mut trial);
                let values = problem.evaluate(&trial)?;
                let trial_merit = values.objective
                    + penalty * constraint_bounds.total_violation(&values.constraints);
                if trial_merit.is_finite()
                    && trial_merit <= merit - self.settings.armijo * alpha * predicted
                {
                    accepted = Some(trial);
                    break;
                }
                alpha *= 0.5;
            }

            let Some(trial) = accepted else {
                if fresh_hessian {
                    status = ReturnStatus::SearchDirectionTooSmall;
                    break;
                }
                debug!(iteration, "line search failed, resetting Hessian");
                hessian.reset();
                fresh_hessian = true;
                continue;
            };

            let next = problem.evaluate_first_order(&trial)?;
            let s: Vec<f64> = trial.iter().zip(&x).map(|(a, b)| a - b).collect();
            let y: Vec<f64> = lagrangian_gradient(&next, &step.multipliers)
                .iter()
                .zip(lagrangian_gradient(&point, &step.multipliers))
                .map(|(a, b)| a - b)
                .collect();
            if hessian.update(&s, &y, fresh_hessian) {
                fresh_hessian = false;
            }
            x = trial;
            point = next;
        }

        stats.finish(status);
        let final_infeasibility = constraint_bounds.max_violation(&point.values.constraints);
        if stats.success {
            info!(
                iterations = stats.iter_count,
                objective = point.values.objective,
                infeasibility = final_infeasibility,
                "SQP converged"
            );
        } else {
            warn!(
                status = %status,
                iterations = stats.iter_count,
                infeasibility = final_infeasibility,
                "SQP did not converge"
            );
        }

        Ok(NlpSolution {
            x,
            objective: point.values.objective,
            constraints: point.values.constraints,
            stats,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::problem::Evaluation;
    use approx::assert_relative_eq;

    /// minimize (x0 − 1)² + (x1 − 2)²  s.t.  x0 + x1 = 1, 0.25 ≤ x0
    struct Quadratic;

    impl NlpProblem for Quadratic {
        fn n_variables(&self) -> usize {
            2
        }
        fn n_constraints(&self) -> usize {
            1
        }
        fn variable_bounds(&self) -> Bounds {
            Bounds::new(vec![0.25, -10.0], vec![10.0, 10.0])
        }
        fn constraint_bounds(&self) -> Bounds {
            Bounds::equal(1.0, 1)
        }
        fn initial_point(&self) -> Vec<f64> {
            vec![3.0, 3.0]
        }
        fn evaluate(&self, x: &[f64]) -> Result<Evaluation> {
            Ok(Evaluation {
                objective: (x[0] - 1.0).powi(2) + (x[1] - 2.0).powi(2),
                constraints: vec![x[0] + x[1]],
            })
        }
        fn evaluate_first_order(&self, x: &[f64]) -> Result<FirstOrderEvaluation> {
            let mut jacobian = TripletMatrix::new(1, 2);
            jacobian.push(0, 0, 1.0);
            jacobian.push(0, 1, 1.0);
            Ok(FirstOrderEvaluation {
                values: self.evaluate(x)?,
                gradient: vec![2.0 * (x[0] - 1.0), 2.0 * (x[1] - 2.0)],
                jacobian,
            })
        }
    }

    /// Rosenbrock on the unit circle: minimize (1−x)² + 100 (y − x²)²
    /// s.t. x² + y² ≤ 1.
    struct Rosenbrock;

    impl NlpProblem for Rosenbrock {
        fn n_variables(&self) -> usize {
            2
        }
        fn n_constraints(&self) -> usize {
            1
        }
        fn variable_bounds(&self) -> Bounds {
            Bounds::new(vec![-2.0; 2], vec![2.0; 2])
        }
        fn constraint_bounds(&self) -> Bounds {
            Bounds::new(vec![-INFINITE_BOUND * 10.0], vec![1.0])
        }
        fn initial_point(&self) -> Vec<f64> {
            vec![0.0, 0.0]
        }
        fn evaluate(&self, x: &[f64]) -> Result<Evaluation> {
            Ok(Evaluation {
                objective: (1.0 - x[0]).powi(2) + 100.0 * (x[1] - x[0] * x[0]).powi(2),
                constraints: vec![x[0] * x[0] + x[1] * x[1]],
            })
        }
        fn evaluate_first_order(&self, x: &[f64]) -> Result<FirstOrderEvaluation> {
            let mut jacobian = TripletMatrix::new(1, 2);
            jacobian.push(0, 0, 2.0 * x[0]);
            jacobian.push(0, 1, 2.0 * x[1]);
            let r = x[1] - x[0] * x[0];
            Ok(FirstOrderEvaluation {
                values: self.evaluate(x)?,
                gradient: vec![-2.0 * (1.0 - x[0]) - 400.0 * x[0] * r, 200.0 * r],
                jacobian,
            })
        }
    }

    /// Delegates to `inner` with one Hessian block per variable.
    struct Diagonal<P>(P);

    impl<P: NlpProblem> NlpProblem for Diagonal<P> {
        fn n_variables(&self) -> usize {
            self.0.n_variables()
        }
        fn n_constraints(&self) -> usize {
            self.0.n_constraints()
        }
        fn variable_bounds(&self) -> Bounds {
            self.0.variable_bounds()
        }
        fn constraint_bounds(&self) -> Bounds {
            self.0.constraint_bounds()
        }
        fn initial_point(&self) -> Vec<f64> {
            self.0.initial_point()
        }
        fn hessian_blocks(&self) -> Vec<Vec<usize>> {
            (0..self.n_variables()).map(|i| vec![i]).collect()
        }
        fn evaluate(&self, x: &[f64]) -> Result<Evaluation> {
            self.0.evaluate(x)
        }
        fn evaluate_first_order(&self, x: &[f64]) -> Result<FirstOrderEvaluation> {
            self.0.evaluate_first_order(x)
        }
    }

    fn quadratic_step(x: &[f64]) -> (FirstOrderEvaluation, QpStep) {
        let point = Quadratic.evaluate_first_order(x).unwrap();
        let step = SqpSolver::default()
            .solve_subproblem(
                x,
                &point,
                &BlockHessian::dense(2),
                &Quadratic.variable_bounds(),
                &Quadratic.constraint_bounds(),
                10.0,
            )
            .unwrap();
        (point, step)
    }

    #[test]
    fn test_equality_constrained_quadratic() {
        let solution = SqpSolver::default().solve(&Quadratic, 1e-6).unwrap();
        assert!(solution.stats.success, "{:?}", solution.stats);
        // projection of (1, 2) onto x0 + x1 = 1 is (0, 1); the bound moves it
        assert_relative_eq!(solution.x[0], 0.25, epsilon = 1e-6);
        assert_relative_eq!(solution.x[1], 0.75, epsilon = 1e-6);
        assert!(solution.stats.iter_count >= 1);
    }

    #[test]
    fn test_rosenbrock_on_disk() {
        let solution = SqpSolver::default().solve(&Rosenbrock, 1e-6).unwrap();
        assert!(solution.stats.success, "{:?}", solution.stats.return_status);
        // known optimum (0.7864, 0.6177)
        assert_relative_eq!(solution.x[0], 0.7864, epsilon = 1e-3);
        assert_relative_eq!(solution.x[1], 0.6177, epsilon = 1e-3);
        assert!(solution.constraints[0] <= 1.0 + 1e-6);
    }

    #[test]
    fn test_qp_duals_at_optimum() {
        let x = [0.25, 0.75];
        let (point, step) = quadratic_step(&x);
        // ∇f = (−1.5, −2.5): λ = 2.5 on x0 + x1 = 1, ν = −1 on x0 ≥ 0.25
        assert_eq!(step.direction[0], 0.0);
        assert_relative_eq!(step.direction[1], 0.0, epsilon = 1e-6);
        assert_relative_eq!(step.multipliers[0], 2.5, epsilon = 1e-6);
        assert_relative_eq!(step.bound_multipliers[0], -1.0, epsilon = 1e-6);
        assert_relative_eq!(step.bound_multipliers[1], 0.0, epsilon = 1e-6);
        let bounds = Quadratic.variable_bounds();
        assert!(stationarity(&x, &point, &step, &bounds, 1e-6) <= 1e-6);
    }

    #[test]
    fn test_feasible_point_is_not_stationary() {
        // on the constraint but away from the optimum
        let x = [0.5, 0.5];
        let (point, step) = quadratic_step(&x);
        assert_relative_eq!(step.direction[0], -0.25, epsilon = 1e-9);
        assert_relative_eq!(step.multipliers[0], 2.75, epsilon = 1e-6);
        let bounds = Quadratic.variable_bounds();
        assert!(stationarity(&x, &point, &step, &bounds, 1e-6) > 1.0);
    }

    #[test]
    fn test_diagonal_blocks_solve_separable_problem() {
        let solution = SqpSolver::default()
            .solve(&Diagonal(Quadratic), 1e-6)
            .unwrap();
        assert!(solution.stats.success, "{:?}", solution.stats);
        assert_relative_eq!(solution.x[0], 0.25, epsilon = 1e-6);
        assert_relative_eq!(solution.x[1], 0.75, epsilon = 1e-6);
    }

    #[test]
    fn test_invalid_partition_is_rejected() {
        struct Overlapping;
        impl NlpProblem for Overlapping {
            fn n_variables(&self) -> usize {
                2
            }
            fn n_constraints(&self) -> usize {
                0
            }
            fn variable_bounds(&self) -> Bounds {
                Bounds::new(vec![-1.0; 2], vec![1.0; 2])
            }
            fn constraint_bounds(&self) -> Bounds {
                Bounds::default()
            }
            fn initial_point(&self) -> Vec<f64> {
                vec![0.0; 2]
            }
            fn hessian_blocks(&self) -> Vec<Vec<usize>> {
                vec![vec![0, 1], vec![1]]
            }
            fn evaluate(&self, x: &[f64]) -> Result<Evaluation> {
                Ok(Evaluation {
                    objective: x[0] * x[0] + x[1] * x[1],
                    constraints: Vec::new(),
                })
            }
            fn evaluate_first_order(&self, x: &[f64]) -> Result<FirstOrderEvaluation> {
                Ok(FirstOrderEvaluation {
                    values: self.evaluate(x)?,
                    gradient: vec![2.0 * x[0], 2.0 * x[1]],
                    jacobian: TripletMatrix::new(0, 2),
                })
            }
        }
        let err = SqpSolver::default().solve(&Overlapping, 1e-6).unwrap_err();
        assert!(err.is_consistency_error());
    }
}
