//! Biophysical evaluators for predictive gait simulation.
//!
//! Every evaluator is generic over [`gait_diff::Scalar`], so the same code
//! produces plain values for post-processing and forward-mode derivatives
//! inside the transcription:
//!
//! - [`geometry`]: polynomial musculotendon lengths, velocities and moment
//!   arms
//! - [`hill`]: implicit Hill equilibrium with a compliant tendon
//! - [`metabolics`]: smoothed Bhargava energy rates
//! - [`passive`]: limit and linear passive joint torques
//! - [`activation`]: activation dynamics bounds and arm excitation
//!
//! ```text
//!  q, q̇ ──► geometry ──► l_MT, v_MT ──┐
//!  a, f_T, ḟ_T ───────────────────────┼──► hill ──► residual, F_T, F_CE
//!                                      │                 │
//!                                      └─────────────────┴──► metabolics
//! ```
//!
//! # Example
//!
//! ```
//! use gait_muscle::hill::{HillEquilibrium, HillInputs};
//! use gait_types::GaitModel;
//!
//! let model = GaitModel::toy_leg().unwrap();
//! let hill = HillEquilibrium::new(&model.muscles[0]);
//! let state = hill.evaluate(&HillInputs {
//!     activation: 0.5,
//!     mt_length: 0.3,
//!     mt_velocity: 0.0,
//!     normalized_tendon_force: 0.4,
//!     normalized_tendon_force_rate: 0.0,
//! });
//! assert!(state.residual.is_finite());
//! ```

#![doc(html_root_url = "https://docs.rs/gait-muscle/0.1.0")]
#![deny(clippy::unwrap_used, clippy::expect_used)]
#![warn(missing_docs)]
#![allow(
    clippy::module_name_repetitions, // HillEquilibrium in hill.rs is clearer
    clippy::doc_markdown,         // Greek symbols and units in docs
    clippy::must_use_candidate,   // Evaluators are obviously pure
    clippy::many_single_char_names, // Physics notation (a, b, r, v)
    clippy::cast_precision_loss,  // Counts are small
)]
#![cfg_attr(test, allow(clippy::float_cmp))]

pub mod activation;
pub mod curves;
pub mod geometry;
pub mod hill;
pub mod metabolics;
pub mod passive;
pub mod sums;

pub use activation::{ActivationBounds, ActivationDynamics};
pub use curves::{
    ActiveForceLengthCurve, ForceVelocityCurve, MuscleCurves, PassiveForceLengthCurve,
    TendonForceLengthCurve,
};
pub use geometry::{BilateralGeometry, GeometryEvaluator, SideGeometry};
pub use hill::{HillEquilibrium, HillInputs, HillState};
pub use metabolics::{BhargavaMetabolics, MetabolicInputs, MetabolicRate};
pub use passive::{limit_torque, linear_passive_torque};
pub use sums::{norm_sum_pow, scaled_norm_sum_pow};
