//! The solver seam.

use gait_types::Result;

use crate::problem::NlpProblem;
use crate::stats::SolverStats;

/// Result of a solve, converged or not.
#[derive(Debug, Clone, PartialEq)]
pub struct NlpSolution {
    /// Final iterate.
    pub x: Vec<f64>,
    /// Objective at `x`.
    pub objective: f64,
    /// Constraint values at `x`.
    pub constraints: Vec<f64>,
    /// Statistics.
    pub stats: SolverStats,
}

/// A nonlinear programming solver.
///
/// Non-convergence is reported through [`SolverStats::success`]; errors are
/// reserved for failures to evaluate or set up the problem.
pub trait NlpSolver {
    /// Solve `problem` to a constraint and optimality tolerance.
    fn solve(&self, problem: &dyn NlpProblem, tolerance: f64) -> Result<NlpSolution>;
}
