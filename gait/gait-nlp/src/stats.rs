//! Solver statistics.

use std::fmt;

use serde::{Deserialize, Serialize};

/// How a solve terminated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReturnStatus {
    /// Converged to the requested tolerance.
    SolveSucceeded,
    /// Iteration limit reached.
    MaximumIterationsExceeded,
    /// The line search could not make progress.
    SearchDirectionTooSmall,
    /// A QP subproblem could not be solved.
    SubproblemFailed,
}

impl ReturnStatus {
    /// Status label.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::SolveSucceeded => "Solve_Succeeded",
            Self::MaximumIterationsExceeded => "Maximum_Iterations_Exceeded",
            Self::SearchDirectionTooSmall => "Search_Direction_Becomes_Too_Small",
            Self::SubproblemFailed => "Subproblem_Failed",
        }
    }

    /// Whether this counts as success.
    pub fn is_success(self) -> bool {
        matches!(self, Self::SolveSucceeded)
    }
}

impl fmt::Display for ReturnStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-iteration history.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IterationHistory {
    /// Objective value.
    pub obj: Vec<f64>,
    /// Largest constraint violation.
    pub inf_pr: Vec<f64>,
}

/// Summary of a solve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolverStats {
    /// Whether the solver converged.
    pub success: bool,
    /// Termination label.
    pub return_status: String,
    /// Number of iterations taken.
    pub iter_count: usize,
    /// Objective and infeasibility per iteration.
    pub iterations: IterationHistory,
}

impl SolverStats {
    /// Stats for a run that has not terminated yet.
    #[must_use]
    pub fn new() -> Self {
        Self {
            success: false,
            return_status: String::new(),
            iter_count: 0,
            iterations: IterationHistory::default(),
        }
    }

    /// Record one iteration.
    pub fn record(&mut self, objective: f64, infeasibility: f64) {
        self.iterations.obj.push(objective);
        self.iterations.inf_pr.push(infeasibility);
        self.iter_count = self.iterations.obj.len();
    }

    /// Set the termination status.
    pub fn finish(&mut self, status: ReturnStatus) {
        self.success = status.is_success();
        self.return_status = status.as_str().to_string();
    }
}

impl Default for SolverStats {
    fn default() -> Self {
        Self::new()
    }
}
