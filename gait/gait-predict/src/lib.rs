//! Predictive gait case runner.
//!
//! Solves one case of the collocation problem and turns the half-cycle
//! solution into a full stride with its energetics:
//!
//! ```text
//!  solve_case ─► GaitTranscription + NlpDriver
//!       │
//!       ▼
//!  MeshSolution ─► ResidualGate ─► detect_heel_strike ─► GaitCycle
//!                                                           │
//!                      CostDecomposer ◄── x ──┐             ▼
//!                                             └──── CycleMetrics (COT, GRF, COP)
//!                                                           │
//!                                                           ▼
//!                              CaseDirectory + TrajectoryStore + motion files
//! ```
//!
//! - [`mesh`]: the solution at mesh points in physical units
//! - [`heel_strike`]: first foot contact from vertical ground reactions
//! - [`cycle`]: mirroring the half cycle into a full stride
//! - [`checks`]: post-solve residual checks
//! - [`metrics`]: cost of transport, ground reactions, stride length
//! - [`decomposition`]: the objective re-derived term by term
//! - [`artifacts`]: persisted solutions, trajectories and `.mot` files
//! - [`case`]: the orchestration
//!
//! # Example
//!
//! ```
//! use gait_predict::{detect_heel_strike, CONTACT_THRESHOLD};
//! use gait_types::Side;
//!
//! let right = [400.0, 300.0, 5.0, 5.0];
//! let left = [5.0, 5.0, 200.0, 450.0];
//! let strike = detect_heel_strike(&right, &left, CONTACT_THRESHOLD).unwrap();
//! assert_eq!(strike.leg, Side::Left);
//! assert_eq!(strike.index, 2);
//! ```

#![doc(html_root_url = "https://docs.rs/gait-predict/0.1.0")]
#![deny(clippy::unwrap_used, clippy::expect_used)]
#![warn(missing_docs)]
#![allow(
    clippy::module_name_repetitions, // CycleMetrics in metrics.rs is clearer
    clippy::doc_markdown,         // Math in docs
    clippy::must_use_candidate,   // Accessors are obviously pure
    clippy::missing_errors_doc,   // Every fallible fn returns GaitError
    clippy::many_single_char_names, // Collocation notation (h, k, n)
    clippy::cast_precision_loss,  // Sample counts are small
)]
#![cfg_attr(test, allow(clippy::float_cmp))]

pub mod artifacts;
pub mod case;
pub mod checks;
pub mod cycle;
pub mod decomposition;
pub mod heel_strike;
pub mod mesh;
pub mod metrics;

pub use artifacts::{
    grf_table, motion_table, ArtifactOptions, CaseDirectory, TrajectoryRecord, TrajectoryStore,
    GRF_FILE, MOTION_FILE, SOLUTION_FILE, STATS_FILE, TRAJECTORIES_FILE,
};
pub use case::{analyze_solution, reanalyze_case, solve_case, CaseAnalysis, CaseInputs, CaseResult};
pub use checks::{ResidualGate, ResidualReport};
pub use cycle::{rotations_in_degrees, stitch, GaitCycle, Mirror};
pub use decomposition::{CostDecomposer, CostDecomposition, DECOMPOSITION_TOLERANCE};
pub use heel_strike::{detect_heel_strike, HeelStrike, CONTACT_THRESHOLD};
pub use mesh::MeshSolution;
pub use metrics::{CostOfTransport, CycleMetrics, CycleMuscles, FootContact, GroundReactions};
