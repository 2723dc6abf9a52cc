//! Error types for gait optimization runs.
//!
//! Errors fall into the classes reported by [`GaitError::category`]:
//!
//! - **Configuration**: a required setting is missing or a knob is out of range.
//! - **Consistency**: a programmer/model-consistency check failed (guess
//!   outside bounds, solution size mismatch, cost decomposition mismatch,
//!   undefined heel strike).
//! - **Physical residual**: a physical balance (Hill equilibrium, pelvis
//!   residual, actuator torque balance) exceeds tolerance after a solve.
//! - **Infrastructure**: solver backend, I/O and serialization failures.
//!
//! Non-convergence of the solver is not an error: it is reported through
//! the solver statistics and logged as a warning.

use thiserror::Error;

/// Coarse classification of a [`GaitError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Missing or invalid settings.
    Configuration,
    /// Model or formulation consistency check failed.
    Consistency,
    /// A physical residual exceeded its tolerance.
    PhysicalResidual,
    /// Solver backend, I/O or serialization failure.
    Infrastructure,
}

/// Errors that can occur while setting up, solving or analyzing a gait case.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum GaitError {
    /// Invalid configuration.
    #[error("invalid configuration: {reason}")]
    Configuration {
        /// Description of the configuration error.
        reason: String,
    },

    /// A required case setting is absent.
    #[error("missing required setting `{name}` for case {case}")]
    MissingSetting {
        /// Case identifier.
        case: String,
        /// Name of the missing setting.
        name: String,
    },

    /// A joint required by the model is not available.
    #[error("joint not found: {name}")]
    MissingJoint {
        /// Name of the missing joint.
        name: String,
    },

    /// A muscle required by the model is not available.
    #[error("muscle not found: {name}")]
    MissingMuscle {
        /// Name of the missing muscle.
        name: String,
    },

    /// No Radau table exists for the requested polynomial degree.
    #[error("unsupported collocation degree {degree} (supported: 1..={max})")]
    UnsupportedCollocationDegree {
        /// Requested degree.
        degree: usize,
        /// Largest supported degree.
        max: usize,
    },

    /// An initial guess value lies outside its declared bounds.
    #[error("guess for {family}[{index}] = {value} outside bounds [{lower}, {upper}]")]
    GuessOutOfBounds {
        /// Decision-variable family name.
        family: String,
        /// Flat index inside the family.
        index: usize,
        /// Offending guess value.
        value: f64,
        /// Lower bound.
        lower: f64,
        /// Upper bound.
        upper: f64,
    },

    /// The solution vector does not match the decision-variable layout.
    #[error("solution vector has {actual} entries, layout expects {expected}")]
    SolutionSizeMismatch {
        /// Number of entries expected by the layout.
        expected: usize,
        /// Number of entries received.
        actual: usize,
    },

    /// Re-derived cost terms do not sum to the solver objective.
    #[error("cost decomposition {recomputed} differs from solver objective {reported}")]
    CostDecompositionMismatch {
        /// Sum of re-derived terms.
        recomputed: f64,
        /// Objective reported by the solver.
        reported: f64,
    },

    /// No ground-contact transition could be found.
    #[error("heel strike undefined: {reason}")]
    UndefinedHeelStrike {
        /// Why detection failed.
        reason: String,
    },

    /// Generic model/formulation consistency failure.
    #[error("consistency check failed: {reason}")]
    Consistency {
        /// Description of the failed check.
        reason: String,
    },

    /// A physical residual exceeds its tolerance.
    #[error("{quantity} residual {residual:e} exceeds tolerance {tolerance:e}")]
    PhysicalResidual {
        /// Which balance failed (e.g. "Hill equilibrium").
        quantity: String,
        /// Largest absolute residual observed.
        residual: f64,
        /// Allowed tolerance.
        tolerance: f64,
    },

    /// The NLP or QP backend failed to produce an iterate.
    #[error("solver failure: {reason}")]
    Solver {
        /// Description of the failure.
        reason: String,
    },

    /// Malformed input data (storage files, coefficient tables).
    #[error("parse error: {reason}")]
    Parse {
        /// Description of what could not be parsed.
        reason: String,
    },

    /// I/O error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl GaitError {
    /// Create a configuration error.
    #[must_use]
    pub fn configuration(reason: impl Into<String>) -> Self {
        Self::Configuration {
            reason: reason.into(),
        }
    }

    /// Create a missing-joint error.
    #[must_use]
    pub fn missing_joint(name: impl Into<String>) -> Self {
        Self::MissingJoint { name: name.into() }
    }

    /// Create a missing-muscle error.
    #[must_use]
    pub fn missing_muscle(name: impl Into<String>) -> Self {
        Self::MissingMuscle { name: name.into() }
    }

    /// Create a generic consistency error.
    #[must_use]
    pub fn consistency(reason: impl Into<String>) -> Self {
        Self::Consistency {
            reason: reason.into(),
        }
    }

    /// Create a physical residual error.
    #[must_use]
    pub fn residual(quantity: impl Into<String>, residual: f64, tolerance: f64) -> Self {
        Self::PhysicalResidual {
            quantity: quantity.into(),
            residual,
            tolerance,
        }
    }

    /// Create a solver failure.
    #[must_use]
    pub fn solver(reason: impl Into<String>) -> Self {
        Self::Solver {
            reason: reason.into(),
        }
    }

    /// Create a parse error.
    #[must_use]
    pub fn parse(reason: impl Into<String>) -> Self {
        Self::Parse {
            reason: reason.into(),
        }
    }

    /// Classify this error.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Configuration { .. }
            | Self::MissingSetting { .. }
            | Self::MissingJoint { .. }
            | Self::MissingMuscle { .. }
            | Self::UnsupportedCollocationDegree { .. } => ErrorCategory::Configuration,
            Self::GuessOutOfBounds { .. }
            | Self::SolutionSizeMismatch { .. }
            | Self::CostDecompositionMismatch { .. }
            | Self::UndefinedHeelStrike { .. }
            | Self::Consistency { .. } => ErrorCategory::Consistency,
            Self::PhysicalResidual { .. } => ErrorCategory::PhysicalResidual,
            Self::Solver { .. } | Self::Parse { .. } | Self::Io(_) | Self::Serialization(_) => {
                ErrorCategory::Infrastructure
            }
        }
    }

    /// Check if this is a configuration error.
    #[must_use]
    pub fn is_configuration_error(&self) -> bool {
        self.category() == ErrorCategory::Configuration
    }

    /// Check if this is a consistency error.
    #[must_use]
    pub fn is_consistency_error(&self) -> bool {
        self.category() == ErrorCategory::Consistency
    }

    /// Check if this is a physical residual error.
    #[must_use]
    pub fn is_residual_error(&self) -> bool {
        self.category() == ErrorCategory::PhysicalResidual
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = GaitError::missing_joint("pelvis_tx");
        assert!(err.to_string().contains("pelvis_tx"));

        let err = GaitError::GuessOutOfBounds {
            family: "activation".into(),
            index: 3,
            value: -1.0,
            lower: 0.05,
            upper: 1.0,
        };
        let msg = err.to_string();
        assert!(msg.contains("activation[3]"));
        assert!(msg.contains("-1"));

        let err = GaitError::residual("Hill equilibrium", 2e-3, 1e-4);
        assert!(err.to_string().contains("Hill equilibrium"));
    }

    #[test]
    fn test_error_categories() {
        assert!(GaitError::configuration("bad N").is_configuration_error());
        assert!(GaitError::UnsupportedCollocationDegree { degree: 9, max: 5 }
            .is_configuration_error());
        assert!(GaitError::SolutionSizeMismatch {
            expected: 10,
            actual: 9
        }
        .is_consistency_error());
        assert!(GaitError::residual("arm torque balance", 1.0, 1e-4).is_residual_error());
        assert_eq!(
            GaitError::solver("qp failed").category(),
            ErrorCategory::Infrastructure
        );
        assert!(!GaitError::consistency("x").is_residual_error());
    }
}
