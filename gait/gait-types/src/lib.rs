//! Core types for predictive gait simulation.
//!
//! This crate provides the data model shared by every layer of a gait
//! trajectory optimization:
//!
//! - [`GaitModel`]: joints, muscles and all index maps, built once
//! - [`RunConfiguration`]: an immutable per-case record resolved from
//!   [`CaseSettings`]
//! - [`DynamicsLayout`]: fixed-offset output schema of the external dynamics
//!   evaluator
//! - [`MotionTable`]: labeled time series (reference motion in, motion files
//!   out)
//! - [`GaitError`]: the error taxonomy
//!
//! # Layer 0 Crate
//!
//! This crate has no solver, no differentiation and no I/O beyond reading
//! and writing small text/JSON documents.
//!
//! ```text
//! CaseSettings ──► RunConfiguration ──┐
//! MuscleTendonTable ──────────────────┼──► GaitModel::walking ──► GaitModel
//! PolynomialTable ────────────────────┘
//! ```
//!
//! # Example
//!
//! ```
//! use gait_types::GaitModel;
//!
//! let model = GaitModel::toy_leg().unwrap();
//! assert_eq!(model.n_joints(), 2);
//! assert_eq!(model.n_muscles(), 1);
//! ```

#![doc(html_root_url = "https://docs.rs/gait-types/0.1.0")]
#![deny(clippy::unwrap_used, clippy::expect_used)]
#![warn(missing_docs)]
#![allow(
    clippy::missing_const_for_fn, // Many builders can't be const
    clippy::module_name_repetitions, // GaitModel in model.rs is clearer
    clippy::doc_markdown,         // Not all technical terms need backticks
    clippy::must_use_candidate,   // Accessors are obviously pure
    clippy::missing_errors_doc,   // Every fallible fn returns GaitError
)]
#![cfg_attr(test, allow(clippy::float_cmp))]

pub mod config;
pub mod data;
pub mod error;
pub mod joint;
pub mod layout;
pub mod model;
pub mod model_factories;
pub mod muscle;
pub mod polynomial;
pub mod registry;
pub mod storage;

pub use config::{
    CaseRecord, CaseSettings, CostWeights, GuessType, RunConfiguration, MAX_COLLOCATION_DEGREE,
};
pub use error::{ErrorCategory, GaitError};
pub use joint::{Joint, JointKind, LimitTorqueParameters, LinearPassiveParameters, PassiveJoint};
pub use layout::{Body, CollisionPair, DynamicsLayout, DynamicsVariant, Side};
pub use model::{
    GaitModel, GaitModelParts, MuscleDrivenJoint, MuscleGeometry, PelvisTranslations, Periodicity,
    PolynomialSide, TimeConstants,
};
pub use muscle::{Muscle, MuscleTendonParameters, MuscleTendonTable};
pub use polynomial::{monomial_count, MusclePolynomial, PolynomialCoefficients, PolynomialTable};
pub use registry::{mirror_name, NameRegistry};
pub use storage::MotionTable;

/// Result type for gait operations.
pub type Result<T> = std::result::Result<T, GaitError>;
