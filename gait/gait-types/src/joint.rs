//! Joint metadata: generalized coordinates and their passive properties.
//!
//! A joint here is a single scalar generalized coordinate. The ordered joint
//! list defines the model's degrees of freedom and the positional contract
//! with the external dynamics evaluator.

use serde::{Deserialize, Serialize};

/// Whether a coordinate is an angle or a displacement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JointKind {
    /// Angular coordinate (radians internally, degrees in exported files).
    Rotational,
    /// Linear coordinate (meters).
    Translational,
}

impl JointKind {
    /// Check if the coordinate is angular.
    #[must_use]
    pub const fn is_rotational(self) -> bool {
        matches!(self, Self::Rotational)
    }
}

/// A named scalar generalized coordinate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Joint {
    /// Coordinate name.
    pub name: String,
    /// Rotational or translational.
    pub kind: JointKind,
}

impl Joint {
    /// Create a rotational coordinate.
    #[must_use]
    pub fn rotational(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: JointKind::Rotational,
        }
    }

    /// Create a translational coordinate.
    #[must_use]
    pub fn translational(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: JointKind::Translational,
        }
    }
}

/// Double-exponential limit torque parameters.
///
/// ```text
/// τ = k1·exp(k2·(q − θ_max)) + k3·exp(k4·(q − θ_min)) − damping·q̇
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LimitTorqueParameters {
    /// Stiffness/offset pairs `[k1, k2, k3, k4]`.
    pub stiffness: [f64; 4],
    /// Range of motion `[θ_min, θ_max]` (radians).
    pub range: [f64; 2],
    /// Viscous damping (N·m·s/rad).
    pub damping: f64,
}

impl LimitTorqueParameters {
    /// Damping applied to every limit torque.
    pub const DEFAULT_DAMPING: f64 = 0.1;

    /// Create limit torque parameters with the default damping.
    #[must_use]
    pub const fn new(stiffness: [f64; 4], range: [f64; 2]) -> Self {
        Self {
            stiffness,
            range,
            damping: Self::DEFAULT_DAMPING,
        }
    }
}

/// Linear spring-damper torque `τ = −k·q − d·q̇`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinearPassiveParameters {
    /// Stiffness (N·m/rad).
    pub stiffness: f64,
    /// Damping (N·m·s/rad).
    pub damping: f64,
}

impl LinearPassiveParameters {
    /// Create linear passive torque parameters.
    #[must_use]
    pub const fn new(stiffness: f64, damping: f64) -> Self {
        Self { stiffness, damping }
    }
}

/// A joint with a limit (passive) torque.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PassiveJoint {
    /// Joint index in the model's joint list.
    pub joint: usize,
    /// Limit torque parameters.
    pub limits: LimitTorqueParameters,
}
