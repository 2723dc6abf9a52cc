//! Direct collocation of muscle-driven gait.
//!
//! Turns a [`GaitModel`](gait_types::GaitModel), a reference motion and an
//! external skeletal dynamics evaluator into a sparse nonlinear program over
//! half a gait cycle:
//!
//! ```text
//!  ReferenceMotion ──► ProblemBounds (ranges, scale factors)
//!        │                    │
//!        └──► InitialGuess ───┤
//!                             ▼
//!  DynamicsEvaluator ──► GaitTranscription ──► NlpProblem
//!                             │
//!                 IntervalEvaluator × N  (rayon pool)
//!                   └─ Biophysics: geometry, Hill, metabolics, passive torques
//! ```
//!
//! - [`radau`]: Radau collocation points with the `C`, `D`, `B` matrices
//! - [`variables`]: decision-vector layout, extraction and flattening
//! - [`bounds`]: scaling and bounds provider
//! - [`reference`], [`spline`]: reference kinematics as cubic splines
//! - [`guess`]: heuristic and reference-derived initial guesses
//! - [`dynamics`]: the black-box dynamics contract and a linear stand-in
//! - [`biophysics`], [`node`]: the per-interval collocation function
//! - [`transcription`]: the assembled problem
//!
//! # Example
//!
//! ```
//! use gait_collocation::radau::CollocationScheme;
//!
//! let scheme = CollocationScheme::radau(3).unwrap();
//! let total: f64 = scheme.quadrature().iter().sum();
//! assert!((total - 1.0).abs() < 1e-12);
//! ```

#![doc(html_root_url = "https://docs.rs/gait-collocation/0.1.0")]
#![deny(clippy::unwrap_used, clippy::expect_used)]
#![warn(missing_docs)]
#![allow(
    clippy::module_name_repetitions, // ProblemBounds in bounds.rs is clearer
    clippy::doc_markdown,         // Math in docs
    clippy::must_use_candidate,   // Accessors are obviously pure
    clippy::missing_errors_doc,   // Every fallible fn returns GaitError
    clippy::many_single_char_names, // Collocation notation (a, d, h, k)
    clippy::cast_precision_loss,  // Mesh sizes are small
)]
#![cfg_attr(test, allow(clippy::float_cmp))]

pub mod biophysics;
pub mod bounds;
pub mod dynamics;
pub mod guess;
pub mod node;
pub mod radau;
pub mod reference;
pub mod spline;
pub mod transcription;
pub mod variables;

pub use biophysics::{Biophysics, MuscleSample};
pub use bounds::{BoundsSettings, FamilyBounds, ProblemBounds, Scaling, MIN_WIDENING};
pub use dynamics::{
    check_evaluator, dynamics_input, evaluate_dynamics, DynamicsEvaluator, LinearDynamics,
};
pub use guess::{
    guess_final_time, initial_guess, HeuristicGuess, InitialGuess, MeshKinematics,
    ReferenceGuess, PELVIS_HEIGHT,
};
pub use node::{CostTerms, IntervalEvaluator, IntervalOutput, IntervalVariables};
pub use radau::CollocationScheme;
pub use reference::{KinematicSamples, ReferenceMotion};
pub use spline::CubicSpline;
pub use transcription::GaitTranscription;
pub use variables::{Dimensions, Family, Trajectory, VariableLayout};
