//! The biophysical evaluators of a model, compiled once.
//!
//! Used by the transcription at every collocation node and by the
//! post-processing at every sample of the reconstructed cycle, so both see
//! exactly the same muscle and passive-torque math.

use gait_diff::Scalar;
use gait_muscle::{
    limit_torque, linear_passive_torque, BhargavaMetabolics, BilateralGeometry,
    GeometryEvaluator, HillEquilibrium, HillInputs, HillState, MetabolicInputs, MetabolicRate,
};
use gait_types::{GaitModel, LinearPassiveParameters, MuscleDrivenJoint, PassiveJoint};

/// Muscle quantities at one instant.
#[derive(Debug, Clone, PartialEq)]
pub struct MuscleSample<S> {
    /// Lengths, velocities and moment arms.
    pub geometry: BilateralGeometry<S>,
    /// Hill equilibrium per muscle.
    pub hill: Vec<HillState<S>>,
    /// Metabolic rate per muscle.
    pub metabolics: Vec<MetabolicRate<S>>,
}

impl<S: Scalar> MuscleSample<S> {
    /// Tendon forces (N), in muscle order.
    #[must_use]
    pub fn tendon_forces(&self) -> Vec<S> {
        self.hill.iter().map(|h| h.tendon_force.clone()).collect()
    }

    /// Total metabolic rates (W), in muscle order.
    #[must_use]
    pub fn metabolic_rates(&self) -> Vec<S> {
        self.metabolics.iter().map(|m| m.total.clone()).collect()
    }

    /// Hill residuals, in muscle order.
    #[must_use]
    pub fn residuals(&self) -> Vec<S> {
        self.hill.iter().map(|h| h.residual.clone()).collect()
    }

    /// Net muscle torque about `driven`: `Σ dM · F_T`.
    #[must_use]
    pub fn muscle_torque(&self, driven: &MuscleDrivenJoint) -> S {
        S::sum_of(driven.moment_arm_rows.iter().zip(&driven.muscles).map(|(&row, &m)| {
            self.geometry.moment_arm(driven.side, row, driven.input).clone()
                * self.hill[m].tendon_force.clone()
        }))
    }
}

/// Evaluators of every muscle and passive element of a model.
#[derive(Debug, Clone, PartialEq)]
pub struct Biophysics {
    geometry: GeometryEvaluator,
    hill: Vec<HillEquilibrium>,
    metabolics: Vec<BhargavaMetabolics>,
    passive: Vec<PassiveJoint>,
    arm_joints: Vec<usize>,
    arm_passive: LinearPassiveParameters,
    mtp_joints: Vec<usize>,
    mtp_passive: LinearPassiveParameters,
}

impl Biophysics {
    /// Compile the evaluators of `model`.
    #[must_use]
    pub fn new(model: &GaitModel) -> Self {
        Self {
            geometry: GeometryEvaluator::new(&model.geometry),
            hill: model.muscles.iter().map(HillEquilibrium::new).collect(),
            metabolics: model
                .muscles
                .iter()
                .map(|m| {
                    BhargavaMetabolics::new(
                        m.slow_twitch_ratio,
                        m.tendon.max_isometric_force,
                        m.mass(),
                    )
                })
                .collect(),
            passive: model.passive_joints.clone(),
            arm_joints: model.arm_joints.clone(),
            arm_passive: model.arm_passive,
            mtp_joints: model.mtp_joints.clone(),
            mtp_passive: model.mtp_passive,
        }
    }

    /// Geometry, contraction and metabolics of every muscle.
    ///
    /// `force` is the normalized tendon force and `force_rate` its rate; the
    /// activation doubles as the excitation surrogate of the metabolic model.
    pub fn muscles<S: Scalar>(
        &self,
        q: &[S],
        qd: &[S],
        activation: &[S],
        force: &[S],
        force_rate: &[S],
    ) -> MuscleSample<S> {
        let geometry = self.geometry.evaluate(q, qd);
        let hill: Vec<HillState<S>> = self
            .hill
            .iter()
            .enumerate()
            .map(|(m, h)| {
                h.evaluate(&HillInputs {
                    activation: activation[m].clone(),
                    mt_length: geometry.mt_lengths[m].clone(),
                    mt_velocity: geometry.mt_velocities[m].clone(),
                    normalized_tendon_force: force[m].clone(),
                    normalized_tendon_force_rate: force_rate[m].clone(),
                })
            })
            .collect();
        let metabolics = self
            .metabolics
            .iter()
            .zip(&hill)
            .enumerate()
            .map(|(m, (model, state))| {
                model.evaluate(&MetabolicInputs {
                    excitation: activation[m].clone(),
                    activation: activation[m].clone(),
                    fiber_velocity: state.fiber_velocity.clone(),
                    active_fiber_force: state.active_fiber_force.clone(),
                    active_force_length: state.active_force_length.clone(),
                })
            })
            .collect();
        MuscleSample {
            geometry,
            hill,
            metabolics,
        }
    }

    /// Limit torques, one per passive joint.
    pub fn passive_torques<S: Scalar>(&self, q: &[S], qd: &[S]) -> Vec<S> {
        self.passive
            .iter()
            .map(|p| limit_torque(&p.limits, &q[p.joint], &qd[p.joint]))
            .collect()
    }

    /// Linear passive torques of the arm joints.
    pub fn arm_passive_torques<S: Scalar>(&self, q: &[S], qd: &[S]) -> Vec<S> {
        self.arm_joints
            .iter()
            .map(|&j| linear_passive_torque(&self.arm_passive, &q[j], &qd[j]))
            .collect()
    }

    /// Linear passive torques of the MTP joints.
    pub fn mtp_passive_torques<S: Scalar>(&self, q: &[S], qd: &[S]) -> Vec<S> {
        self.mtp_joints
            .iter()
            .map(|&j| linear_passive_torque(&self.mtp_passive, &q[j], &qd[j]))
            .collect()
    }

    /// Position of `joint` in the passive joint list.
    fn passive_slot(&self, joint: usize) -> Option<usize> {
        self.passive.iter().position(|p| p.joint == joint)
    }

    /// Total passive torque of each MTP joint: limit plus linear.
    pub fn mtp_total_passive<S: Scalar>(&self, passive: &[S], linear: &[S]) -> Vec<S> {
        self.mtp_joints
            .iter()
            .zip(linear)
            .map(|(&j, lin)| match self.passive_slot(j) {
                Some(slot) => passive[slot].clone() + lin.clone(),
                None => lin.clone(),
            })
            .collect()
    }
}
