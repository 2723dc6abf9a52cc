//! The nonlinear program interface.
//!
//! ```text
//! minimize    f(x)
//! subject to  g_L ≤ g(x) ≤ g_U
//!             x_L ≤ x    ≤ x_U
//! ```
//!
//! Simple bounds are kept apart from the general constraints so that a
//! solver can impose them directly on its variables.

use std::ops::Range;

use gait_types::Result;

use crate::sparse::TripletMatrix;

/// Magnitude beyond which a bound is treated as absent.
pub const INFINITE_BOUND: f64 = 1e19;

/// Lower and upper bounds of a vector.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Bounds {
    /// Lower bounds.
    pub lower: Vec<f64>,
    /// Upper bounds.
    pub upper: Vec<f64>,
}

impl Bounds {
    /// Bounds from lower and upper vectors of equal length.
    #[must_use]
    pub fn new(lower: Vec<f64>, upper: Vec<f64>) -> Self {
        debug_assert_eq!(lower.len(), upper.len());
        Self { lower, upper }
    }

    /// `lower = upper = value` for `n` entries.
    #[must_use]
    pub fn equal(value: f64, n: usize) -> Self {
        Self::new(vec![value; n], vec![value; n])
    }

    /// Number of bounded entries.
    pub fn len(&self) -> usize {
        self.lower.len()
    }

    /// Whether there are no entries.
    pub fn is_empty(&self) -> bool {
        self.lower.is_empty()
    }

    /// Append `n` copies of `[lower, upper]`.
    pub fn push_repeated(&mut self, lower: f64, upper: f64, n: usize) {
        self.lower.extend(std::iter::repeat(lower).take(n));
        self.upper.extend(std::iter::repeat(upper).take(n));
    }

    /// Append another bound vector.
    pub fn extend(&mut self, other: &Self) {
        self.lower.extend_from_slice(&other.lower);
        self.upper.extend_from_slice(&other.upper);
    }

    /// Whether entry `i` is an equality.
    pub fn is_equality(&self, i: usize) -> bool {
        self.lower[i] == self.upper[i]
    }

    /// Amount by which `value` violates the bounds of entry `i`.
    pub fn violation(&self, i: usize, value: f64) -> f64 {
        (self.lower[i] - value).max(0.0) + (value - self.upper[i]).max(0.0)
    }

    /// Largest violation over a whole vector.
    pub fn max_violation(&self, values: &[f64]) -> f64 {
        values
            .iter()
            .enumerate()
            .map(|(i, &v)| self.violation(i, v))
            .fold(0.0, f64::max)
    }

    /// Sum of violations over a whole vector.
    pub fn total_violation(&self, values: &[f64]) -> f64 {
        values
            .iter()
            .enumerate()
            .map(|(i, &v)| self.violation(i, v))
            .sum()
    }

    /// Project `values` into the bounds.
    pub fn clamp(&self, values: &mut [f64]) {
        for (i, v) in values.iter_mut().enumerate() {
            *v = v.max(self.lower[i]).min(self.upper[i]);
        }
    }
}

/// A named contiguous slice of the decision vector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableFamily {
    /// Family name.
    pub name: String,
    /// Position in the decision vector.
    pub range: Range<usize>,
}

/// Objective and constraint values.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    /// `f(x)`.
    pub objective: f64,
    /// `g(x)`.
    pub constraints: Vec<f64>,
}

/// Values plus first derivatives.
#[derive(Debug, Clone, PartialEq)]
pub struct FirstOrderEvaluation {
    /// `f(x)` and `g(x)`.
    pub values: Evaluation,
    /// `∇f(x)`.
    pub gradient: Vec<f64>,
    /// `∂g/∂x`.
    pub jacobian: TripletMatrix,
}

/// A nonlinear program with first derivatives.
pub trait NlpProblem: Sync {
    /// Number of decision variables.
    fn n_variables(&self) -> usize;

    /// Number of general constraints.
    fn n_constraints(&self) -> usize;

    /// Simple bounds on the decision variables.
    fn variable_bounds(&self) -> Bounds;

    /// Bounds on the general constraints.
    fn constraint_bounds(&self) -> Bounds;

    /// Starting point.
    fn initial_point(&self) -> Vec<f64>;

    /// Named slices of the decision vector, for diagnostics.
    fn variable_families(&self) -> Vec<VariableFamily> {
        vec![VariableFamily {
            name: "x".to_string(),
            range: 0..self.n_variables(),
        }]
    }

    /// Disjoint index sets covering the decision vector on which the
    /// Lagrangian Hessian is approximated; curvature between sets is
    /// ignored. One set by default.
    fn hessian_blocks(&self) -> Vec<Vec<usize>> {
        vec![(0..self.n_variables()).collect()]
    }

    /// Objective and constraints at `x`.
    fn evaluate(&self, x: &[f64]) -> Result<Evaluation>;

    /// Objective, constraints and their first derivatives at `x`.
    fn evaluate_first_order(&self, x: &[f64]) -> Result<FirstOrderEvaluation>;
}
