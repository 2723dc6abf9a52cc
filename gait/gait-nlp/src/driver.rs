//! Solve driver: guess checks, solver call, result checks.

use tracing::{info, warn};

use gait_types::{GaitError, Result};

use crate::problem::NlpProblem;
use crate::solver::{NlpSolution, NlpSolver};
use crate::sqp::SqpSolver;

/// Convergence tolerance for a tolerance exponent (`4 → 1e-4`).
#[must_use]
pub fn tolerance_from_exponent(exponent: i32) -> f64 {
    10f64.powi(-exponent)
}

/// Fail when any entry of the initial point lies outside its bounds,
/// naming the family it belongs to.
pub fn check_guess_within_bounds(problem: &dyn NlpProblem) -> Result<()> {
    let x0 = problem.initial_point();
    let bounds = problem.variable_bounds();
    if x0.len() != problem.n_variables() || bounds.len() != problem.n_variables() {
        return Err(GaitError::SolutionSizeMismatch {
            expected: problem.n_variables(),
            actual: x0.len(),
        });
    }
    for family in problem.variable_families() {
        for (index, k) in family.range.clone().enumerate() {
            let (lower, upper) = (bounds.lower[k], bounds.upper[k]);
            let value = x0[k];
            if !(lower <= value && value <= upper) {
                return Err(GaitError::GuessOutOfBounds {
                    family: family.name,
                    index,
                    value,
                    lower,
                    upper,
                });
            }
        }
    }
    Ok(())
}

/// Runs a solver on a problem after validating its starting point.
#[derive(Debug, Clone, Default)]
pub struct NlpDriver<S = SqpSolver> {
    solver: S,
}

impl NlpDriver<SqpSolver> {
    /// Driver around the default SQP solver.
    #[must_use]
    pub fn sqp() -> Self {
        Self::new(SqpSolver::default())
    }
}

impl<S: NlpSolver> NlpDriver<S> {
    /// Driver around `solver`.
    pub fn new(solver: S) -> Self {
        Self { solver }
    }

    /// Solve to `10^-tolerance_exponent`.
    ///
    /// Non-convergence is logged and returned in the statistics.
    pub fn solve(&self, problem: &dyn NlpProblem, tolerance_exponent: i32) -> Result<NlpSolution> {
        check_guess_within_bounds(problem)?;
        let tolerance = tolerance_from_exponent(tolerance_exponent);
        let solution = self.solver.solve(problem, tolerance)?;
        if solution.x.len() != problem.n_variables() {
            return Err(GaitError::SolutionSizeMismatch {
                expected: problem.n_variables(),
                actual: solution.x.len(),
            });
        }
        if solution.stats.success {
            info!(
                objective = solution.objective,
                iterations = solution.stats.iter_count,
                "NLP solved"
            );
        } else {
            warn!(
                status = %solution.stats.return_status,
                "NLP solver did not converge; continuing with the last iterate"
            );
        }
        Ok(solution)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::problem::{Bounds, Evaluation, FirstOrderEvaluation, VariableFamily};
    use crate::sparse::TripletMatrix;
    use approx::assert_relative_eq;

    /// minimize Σ (xᵢ − i)² with activation-like bounds.
    struct Separable {
        start: Vec<f64>,
    }

    impl NlpProblem for Separable {
        fn n_variables(&self) -> usize {
            3
        }
        fn n_constraints(&self) -> usize {
            0
        }
        fn variable_bounds(&self) -> Bounds {
            Bounds::new(vec![0.05, 0.05, 0.0], vec![1.0, 1.0, 5.0])
        }
        fn constraint_bounds(&self) -> Bounds {
            Bounds::default()
        }
        fn initial_point(&self) -> Vec<f64> {
            self.start.clone()
        }
        fn variable_families(&self) -> Vec<VariableFamily> {
            vec![
                VariableFamily {
                    name: "a".into(),
                    range: 0..2,
                },
                VariableFamily {
                    name: "F".into(),
                    range: 2..3,
                },
            ]
        }
        fn evaluate(&self, x: &[f64]) -> Result<Evaluation> {
            Ok(Evaluation {
                objective: x.iter().enumerate().map(|(i, v)| (v - i as f64).powi(2)).sum(),
                constraints: Vec::new(),
            })
        }
        fn evaluate_first_order(&self, x: &[f64]) -> Result<FirstOrderEvaluation> {
            Ok(FirstOrderEvaluation {
                values: self.evaluate(x)?,
                gradient: x.iter().enumerate().map(|(i, v)| 2.0 * (v - i as f64)).collect(),
                jacobian: TripletMatrix::new(0, 3),
            })
        }
    }

    #[test]
    fn test_tolerance_exponent() {
        assert_relative_eq!(tolerance_from_exponent(4), 1e-4);
        assert_relative_eq!(tolerance_from_exponent(6), 1e-6);
    }

    #[test]
    fn test_guess_outside_bounds_names_family() {
        let problem = Separable {
            start: vec![0.1, 0.1, 7.0],
        };
        match check_guess_within_bounds(&problem).unwrap_err() {
            GaitError::GuessOutOfBounds {
                family,
                index,
                value,
                ..
            } => {
                assert_eq!(family, "F");
                assert_eq!(index, 0);
                assert_relative_eq!(value, 7.0);
            }
            other => panic!("unexpected error {other}"),
        }
        let err = NlpDriver::<SqpSolver>::default()
            .solve(&problem, 4)
            .unwrap_err();
        assert!(err.is_consistency_error());
    }

    #[test]
    fn test_bounded_solve() {
        let problem = Separable {
            start: vec![0.5, 0.5, 1.0],
        };
        let solution = NlpDriver::sqp().solve(&problem, 6).unwrap();
        assert!(solution.stats.success, "{:?}", solution.stats);
        assert_relative_eq!(solution.x[0], 0.05, epsilon = 1e-6);
        assert_relative_eq!(solution.x[1], 1.0, epsilon = 1e-6);
        assert_relative_eq!(solution.x[2], 2.0, epsilon = 1e-6);
    }

    #[test]
    fn test_bound_landing_is_exact() {
        // x1 has its unconstrained optimum exactly on its upper bound
        let problem = Separable {
            start: vec![1.0, 0.05, 4.0],
        };
        let solution = NlpDriver::sqp().solve(&problem, 6).unwrap();
        assert!(solution.stats.success, "{:?}", solution.stats);
        assert_eq!(solution.x[0], 0.05);
        assert_eq!(solution.x[1], 1.0);
        assert_relative_eq!(solution.x[2], 2.0, epsilon = 1e-6);
    }
}
