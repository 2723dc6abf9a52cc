//! Objective decomposition.
//!
//! Re-derives every weighted cost term from the raw solution, outside the
//! transcription, and checks that their sum reproduces the objective the
//! solver reported. A mismatch means the transcription and its analysis
//! disagree about the problem that was solved.

use gait_collocation::{Biophysics, CollocationScheme, Family, Trajectory};
use gait_muscle::norm_sum_pow;
use gait_types::{CostWeights, GaitError, GaitModel, Result};
use serde::{Deserialize, Serialize};

/// Largest admissible difference between the recomputed and reported
/// objective.
pub const DECOMPOSITION_TOLERANCE: f64 = 1e-6;

/// Weighted contribution of each cost term to the objective.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CostDecomposition {
    /// Metabolic energy rate.
    #[serde(rename = "metabolicEnergyRateTerm")]
    pub metabolic_energy_rate: f64,
    /// Muscle activations.
    #[serde(rename = "activationTerm")]
    pub activation: f64,
    /// Arm excitations.
    #[serde(rename = "armExcitationTerm")]
    pub arm_excitation: f64,
    /// Non-arm joint accelerations.
    #[serde(rename = "jointAccelerationTerm")]
    pub joint_acceleration: f64,
    /// Limit torques.
    #[serde(rename = "passiveTorqueTerm")]
    pub passive_torque: f64,
    /// Activation rates.
    #[serde(rename = "activationDtTerm")]
    pub activation_rate: f64,
    /// Tendon force rates.
    #[serde(rename = "forceDtTerm")]
    pub force_rate: f64,
    /// Arm accelerations.
    #[serde(rename = "armAccelerationTerm")]
    pub arm_acceleration: f64,
}

impl CostDecomposition {
    /// Sum of all terms.
    #[must_use]
    pub fn total(&self) -> f64 {
        self.metabolic_energy_rate
            + self.activation
            + self.arm_excitation
            + self.joint_acceleration
            + self.passive_torque
            + self.activation_rate
            + self.force_rate
            + self.arm_acceleration
    }

    /// Fail unless the terms sum to `reported` within
    /// [`DECOMPOSITION_TOLERANCE`].
    pub fn verify(&self, reported: f64) -> Result<()> {
        let recomputed = self.total();
        if (recomputed - reported).abs() <= DECOMPOSITION_TOLERANCE {
            Ok(())
        } else {
            Err(GaitError::CostDecompositionMismatch {
                recomputed,
                reported,
            })
        }
    }
}

/// Recomputes the cost terms of solutions of one transcription.
#[derive(Debug, Clone)]
pub struct CostDecomposer<'a> {
    model: &'a GaitModel,
    biophysics: &'a Biophysics,
    scheme: CollocationScheme,
    weights: CostWeights,
    model_mass: f64,
    non_arm: Vec<usize>,
}

impl<'a> CostDecomposer<'a> {
    /// Decomposer for `model` collocated with `scheme`.
    #[must_use]
    pub fn new(
        model: &'a GaitModel,
        biophysics: &'a Biophysics,
        scheme: CollocationScheme,
        weights: CostWeights,
        model_mass: f64,
    ) -> Self {
        Self {
            model,
            biophysics,
            scheme,
            weights,
            model_mass,
            non_arm: model.non_arm_joints(),
        }
    }

    /// Decompose the objective of a solution given both in solver
    /// (`scaled`) and physical units.
    ///
    /// Rates and accelerations enter the cost scaled; activations, the
    /// metabolic rate and passive torques in physical units.
    pub fn decompose(&self, scaled: &Trajectory, physical: &Trajectory) -> Result<CostDecomposition> {
        let d = self.scheme.degree();
        let positions = &physical[Family::Position];
        let n = positions.ncols().saturating_sub(1);
        if n == 0 || physical[Family::PositionCol].ncols() != n * d {
            return Err(GaitError::consistency(format!(
                "trajectory of {n} intervals does not match degree {d}"
            )));
        }
        let tx = self.model.pelvis.forward;
        let distance = positions[(tx, n)] - positions[(tx, 0)];
        let h = physical.final_time() / n as f64;
        let quadrature = self.scheme.quadrature();
        let column = |family: Family, t: &Trajectory, c: usize| -> Vec<f64> {
            t[family].column(c).iter().copied().collect()
        };
        let pick = |values: &[f64], idx: &[usize]| -> Vec<f64> { idx.iter().map(|&i| values[i]).collect() };

        let w = &self.weights;
        let mut terms = CostDecomposition::default();
        for k in 0..n {
            let activation_rate = column(Family::ActivationRate, scaled, k);
            let arm_excitation = column(Family::ArmExcitation, scaled, k);
            for j in 0..d {
                let c = k * d + j;
                let q = column(Family::PositionCol, physical, c);
                let qd = column(Family::VelocityCol, physical, c);
                let a = column(Family::ActivationCol, physical, c);
                let sample = self.biophysics.muscles(
                    &q,
                    &qd,
                    &a,
                    &column(Family::ForceCol, physical, c),
                    &column(Family::ForceRateCol, physical, c),
                );
                let passive = self.biophysics.passive_torques(&q, &qd);
                let acceleration = column(Family::AccelerationCol, scaled, c);
                let force_rate = column(Family::ForceRateCol, scaled, c);

                let factor = h * quadrature[j + 1] / distance;
                terms.metabolic_energy_rate += w.metabolic_energy_rate
                    * norm_sum_pow(&sample.metabolic_rates(), 2)
                    / self.model_mass
                    * factor;
                terms.activation += w.activation * norm_sum_pow(&a, 2) * factor;
                terms.arm_excitation += w.arm_excitation * norm_sum_pow(&arm_excitation, 2) * factor;
                terms.joint_acceleration +=
                    w.joint_acceleration * norm_sum_pow(&pick(&acceleration, &self.non_arm), 2) * factor;
                terms.passive_torque += w.passive_torque * norm_sum_pow(&passive, 2) * factor;
                terms.activation_rate += w.controls * norm_sum_pow(&activation_rate, 2) * factor;
                terms.force_rate += w.controls * norm_sum_pow(&force_rate, 2) * factor;
                terms.arm_acceleration +=
                    w.controls * norm_sum_pow(&pick(&acceleration, &self.model.arm_joints), 2) * factor;
            }
        }
        Ok(terms)
    }
}
