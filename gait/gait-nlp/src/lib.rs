//! Nonlinear programming for gait trajectory optimization.
//!
//! The transcription exposes itself as an [`NlpProblem`]; a [`NlpSolver`]
//! returns the last iterate and [`SolverStats`] whether or not it converged.
//!
//! ```text
//! NlpProblem ──► NlpDriver ──► check_guess_within_bounds
//!                    │
//!                    └──► NlpSolver (SqpSolver) ──► NlpSolution { x, stats }
//!                              │
//!                              └── per iteration: elastic QP (Clarabel),
//!                                  ℓ1-merit line search, block BFGS
//! ```
//!
//! Simple bounds stay simple bounds all the way down: the driver checks the
//! starting point against them and the SQP imposes them as rows of every QP
//! subproblem instead of penalizing them.
//!
//! The Hessian approximation is block diagonal on the partition a problem
//! reports through [`NlpProblem::hessian_blocks`], so the QP stays sparse
//! when the blocks are small. Another backend can be plugged in behind
//! [`NlpSolver`].

#![doc(html_root_url = "https://docs.rs/gait-nlp/0.1.0")]
#![deny(clippy::unwrap_used, clippy::expect_used)]
#![warn(missing_docs)]
#![allow(
    clippy::module_name_repetitions, // NlpProblem in problem.rs is clearer
    clippy::doc_markdown,         // Math in docs
    clippy::must_use_candidate,   // Accessors are obviously pure
    clippy::missing_errors_doc,   // Every fallible fn returns GaitError
    clippy::many_single_char_names, // QP notation (p, q, a, b, s, y)
    clippy::cast_precision_loss,  // Test fixtures
)]
#![cfg_attr(test, allow(clippy::float_cmp))]

pub mod driver;
pub mod hessian;
pub mod problem;
pub mod solver;
pub mod sparse;
pub mod sqp;
pub mod stats;

pub use driver::{check_guess_within_bounds, tolerance_from_exponent, NlpDriver};
pub use hessian::BlockHessian;
pub use problem::{
    Bounds, Evaluation, FirstOrderEvaluation, NlpProblem, VariableFamily, INFINITE_BOUND,
};
pub use solver::{NlpSolution, NlpSolver};
pub use sparse::TripletMatrix;
pub use sqp::{SqpSettings, SqpSolver};
pub use stats::{IterationHistory, ReturnStatus, SolverStats};
