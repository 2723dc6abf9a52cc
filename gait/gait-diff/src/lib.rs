//! Scalar abstraction for evaluating gait models with or without derivatives.
//!
//! The biophysical evaluators and the per-interval transcription are written
//! once, generic over [`Scalar`]:
//!
//! ```text
//!            ┌── f64  ──► values (post-processing, verification)
//! generic fn ┤
//!            └── Dual ──► values + sparse gradients (NLP Jacobians)
//! ```
//!
//! Black-box functions (the external dynamics evaluator) join the algebra
//! through [`Scalar::lift`], which applies the chain rule given their
//! Jacobian row.
//!
//! # Example
//!
//! ```
//! use gait_diff::{Dual, Scalar};
//!
//! fn f<S: Scalar>(x: S, y: S) -> S {
//!     x.clone() * y + x.exp()
//! }
//!
//! let out = f(Dual::variable(0.0, 0), Dual::variable(2.0, 1));
//! assert!((out.value() - 1.0).abs() < 1e-12);
//! assert!((out.partial(0) - 3.0).abs() < 1e-12);
//! assert!((out.partial(1) - 0.0).abs() < 1e-12);
//! assert!((f(0.0_f64, 2.0) - 1.0).abs() < 1e-12);
//! ```

#![doc(html_root_url = "https://docs.rs/gait-diff/0.1.0")]
#![deny(clippy::unwrap_used, clippy::expect_used)]
#![warn(missing_docs)]
#![allow(
    clippy::suboptimal_flops, // mul_add style changes aren't always clearer
    clippy::float_cmp,        // exact zero partials are skipped on purpose
)]

pub mod dual;
pub mod scalar;

pub use dual::Dual;
pub use scalar::Scalar;
