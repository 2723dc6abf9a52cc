//! Muscle metadata.
//!
//! Static musculotendon parameters come from an external parameter table
//! (extracted once from the musculoskeletal model). Bilateral muscle sets
//! are built as mirrored copies of a canonical right-side list.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::GaitError;
use crate::Result;

/// Muscle tissue density (kg/m³).
pub const MUSCLE_DENSITY: f64 = 1059.7;

/// Default normalized tendon stiffness.
pub const DEFAULT_TENDON_STIFFNESS: f64 = 35.0;

/// Static musculotendon parameters of one muscle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MuscleTendonParameters {
    /// Maximum isometric force (N).
    pub max_isometric_force: f64,
    /// Optimal fiber length (m).
    pub optimal_fiber_length: f64,
    /// Tendon slack length (m).
    pub tendon_slack_length: f64,
    /// Pennation angle at optimal fiber length (rad).
    pub optimal_pennation_angle: f64,
    /// Maximum contraction velocity (m/s).
    pub max_contraction_velocity: f64,
}

impl MuscleTendonParameters {
    /// Create parameters with the conventional maximum contraction velocity
    /// of ten optimal fiber lengths per second.
    #[must_use]
    pub fn new(
        max_isometric_force: f64,
        optimal_fiber_length: f64,
        tendon_slack_length: f64,
        optimal_pennation_angle: f64,
    ) -> Self {
        Self {
            max_isometric_force,
            optimal_fiber_length,
            tendon_slack_length,
            optimal_pennation_angle,
            max_contraction_velocity: 10.0 * optimal_fiber_length,
        }
    }

    fn validate(&self, name: &str) -> Result<()> {
        let positive = [
            ("max_isometric_force", self.max_isometric_force),
            ("optimal_fiber_length", self.optimal_fiber_length),
            ("tendon_slack_length", self.tendon_slack_length),
            ("max_contraction_velocity", self.max_contraction_velocity),
        ];
        for (field, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(GaitError::configuration(format!(
                    "muscle {name}: {field} must be positive, got {value}"
                )));
            }
        }
        Ok(())
    }
}

/// Parameter table keyed by (right-side) muscle name.
pub type MuscleTendonTable = BTreeMap<String, MuscleTendonParameters>;

/// A muscle with everything the evaluators need.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Muscle {
    /// Muscle name.
    pub name: String,
    /// Musculotendon parameters.
    pub tendon: MuscleTendonParameters,
    /// Specific tension (MPa).
    pub specific_tension: f64,
    /// Fraction of slow-twitch fibers in [0, 1].
    pub slow_twitch_ratio: f64,
    /// Normalized tendon stiffness.
    pub tendon_stiffness: f64,
    /// Tendon force-length shift.
    pub tendon_shift: f64,
}

impl Muscle {
    /// Create a muscle with default tendon stiffness and no shift.
    pub fn new(
        name: impl Into<String>,
        tendon: MuscleTendonParameters,
        specific_tension: f64,
        slow_twitch_ratio: f64,
    ) -> Result<Self> {
        let name = name.into();
        tendon.validate(&name)?;
        if !(specific_tension.is_finite() && specific_tension > 0.0) {
            return Err(GaitError::configuration(format!(
                "muscle {name}: specific tension must be positive"
            )));
        }
        if !(0.0..=1.0).contains(&slow_twitch_ratio) {
            return Err(GaitError::configuration(format!(
                "muscle {name}: slow-twitch ratio {slow_twitch_ratio} outside [0, 1]"
            )));
        }
        Ok(Self {
            name,
            tendon,
            specific_tension,
            slow_twitch_ratio,
            tendon_stiffness: DEFAULT_TENDON_STIFFNESS,
            tendon_shift: 0.0,
        })
    }

    /// Set the tendon stiffness.
    #[must_use]
    pub fn with_tendon_stiffness(mut self, stiffness: f64) -> Self {
        self.tendon_stiffness = stiffness;
        self
    }

    /// Muscle mass (kg) from volume, density and specific tension.
    #[must_use]
    pub fn mass(&self) -> f64 {
        let volume = self.tendon.max_isometric_force * self.tendon.optimal_fiber_length;
        volume * MUSCLE_DENSITY / (self.specific_tension * 1e6)
    }

    /// Copy of this muscle under another name.
    #[must_use]
    pub fn renamed(&self, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..self.clone()
        }
    }
}
