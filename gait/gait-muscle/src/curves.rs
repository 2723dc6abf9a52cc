//! Smooth musculotendon curves after De Groote et al. (2016).
//!
//! Every curve is a closed-form, infinitely differentiable function so that
//! it can be evaluated on dual numbers inside the transcription:
//!
//! ```text
//! tendon:        f_T  = c1 · exp(k_T (l̃_T − c2)) − c3 + shift
//! active f-l:    f_L  = Σ_{i=1..3} b1i · exp(−½ (l̃_M − b2i)² / (b3i + b4i l̃_M)²)
//! f-v:           f_V  = d1 · asinh(d2 ṽ_M + d3) + d4
//! passive f-l:   f_P  = (exp(k_PE (l̃_M − 1) / e0) − 1) / (exp(k_PE) − 1)
//! ```
//!
//! # References
//!
//! - De Groote, F. et al. (2016). Evaluation of direct collocation optimal
//!   control problem formulations for solving the muscle redundancy problem.

use gait_diff::Scalar;

/// Tendon force-length curve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TendonForceLengthCurve {
    /// Tendon stiffness `k_T`.
    pub stiffness: f64,
    /// Additive shift of the normalized force.
    pub shift: f64,
}

impl TendonForceLengthCurve {
    const C1: f64 = 0.2;
    const C2: f64 = 0.995;
    const C3: f64 = 0.25;

    /// Curve with the given stiffness and shift.
    #[must_use]
    pub fn new(stiffness: f64, shift: f64) -> Self {
        Self { stiffness, shift }
    }

    /// Normalized tendon force at normalized tendon length `l̃_T`.
    pub fn force<S: Scalar>(&self, normalized_length: &S) -> S {
        ((normalized_length.clone() - Self::C2) * self.stiffness).exp() * Self::C1 - Self::C3
            + self.shift
    }

    /// Normalized tendon length producing normalized force `f_T`.
    pub fn length<S: Scalar>(&self, normalized_force: &S) -> S {
        ((normalized_force.clone() + Self::C3 - self.shift) / Self::C1).ln() / self.stiffness
            + Self::C2
    }

    /// `d f_T / d l̃_T` expressed through the force itself.
    pub fn stiffness_at<S: Scalar>(&self, normalized_force: &S) -> S {
        (normalized_force.clone() + Self::C3 - self.shift) * self.stiffness
    }
}

/// Active fiber force-length curve: three Gaussians.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActiveForceLengthCurve {
    /// `[b1, b2, b3, b4]` per Gaussian.
    pub gaussians: [[f64; 4]; 3],
}

impl Default for ActiveForceLengthCurve {
    fn default() -> Self {
        Self {
            gaussians: [
                [0.815, 1.055, 0.162, 0.063],
                [0.433, 0.717, -0.030, 0.200],
                [0.100, 1.000, 0.354, 0.000],
            ],
        }
    }
}

impl ActiveForceLengthCurve {
    /// Force multiplier at normalized fiber length `l̃_M`.
    pub fn evaluate<S: Scalar>(&self, normalized_length: &S) -> S {
        S::sum_of(self.gaussians.iter().map(|&[b1, b2, b3, b4]| {
            let num = normalized_length.clone() - b2;
            let den = normalized_length.clone() * b4 + b3;
            (-(num.square() / den.square()) * 0.5).exp() * b1
        }))
    }
}

/// Force-velocity curve in inverse hyperbolic sine form.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForceVelocityCurve {
    /// `[d1, d2, d3, d4]`.
    pub coefficients: [f64; 4],
}

impl Default for ForceVelocityCurve {
    fn default() -> Self {
        Self {
            coefficients: [-0.318, -8.149, -0.374, 0.886],
        }
    }
}

impl ForceVelocityCurve {
    /// Force multiplier at normalized fiber velocity `ṽ_M` (positive when
    /// lengthening).
    pub fn evaluate<S: Scalar>(&self, normalized_velocity: &S) -> S {
        let [d1, d2, d3, d4] = self.coefficients;
        (normalized_velocity.clone() * d2 + d3).asinh() * d1 + d4
    }
}

/// Passive fiber force-length curve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PassiveForceLengthCurve {
    /// Exponential shape factor `k_PE`.
    pub shape_factor: f64,
    /// Passive strain at one maximal isometric force `e0`.
    pub strain_at_one: f64,
}

impl Default for PassiveForceLengthCurve {
    fn default() -> Self {
        Self {
            shape_factor: 4.0,
            strain_at_one: 0.6,
        }
    }
}

impl PassiveForceLengthCurve {
    /// Normalized passive force at normalized fiber length `l̃_M`.
    pub fn evaluate<S: Scalar>(&self, normalized_length: &S) -> S {
        let k = self.shape_factor;
        let rise = ((normalized_length.clone() - 1.0) * (k / self.strain_at_one)).exp() - 1.0;
        rise / (k.exp() - 1.0)
    }
}

/// The curve set of one muscle model.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MuscleCurves {
    /// Active force-length.
    pub active_force_length: ActiveForceLengthCurve,
    /// Force-velocity.
    pub force_velocity: ForceVelocityCurve,
    /// Passive force-length.
    pub passive_force_length: PassiveForceLengthCurve,
}
