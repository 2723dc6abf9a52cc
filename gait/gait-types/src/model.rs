//! The gait model: every index map the transcription needs, built once.
//!
//! [`GaitModel`] is static after construction. Name lookups happen only in
//! the factories; everything downstream works on dense indices into
//! [`GaitModel::joints`] and [`GaitModel::muscles`].
//!
//! # Muscle geometry
//!
//! Muscle-tendon lengths come from per-side polynomial evaluations. Each
//! [`PolynomialSide`] evaluates the same polynomial rows on its own joint
//! subset; `length_rows` picks the rows that belong to that side's muscles.
//! The bilateral length vector is `left[length_rows] ++ right[length_rows]`,
//! matching the muscle order (left side first).

use serde::{Deserialize, Serialize};

use crate::error::GaitError;
use crate::joint::{Joint, LinearPassiveParameters, PassiveJoint};
use crate::layout::{CollisionPair, DynamicsLayout, Side};
use crate::muscle::Muscle;
use crate::polynomial::MusclePolynomial;
use crate::registry::NameRegistry;
use crate::Result;

/// One side's polynomial geometry evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolynomialSide {
    /// Model joint index of each polynomial input.
    pub joints: Vec<usize>,
    /// Polynomial rows evaluated on this side's inputs.
    pub polynomials: Vec<MusclePolynomial>,
    /// Rows whose lengths belong to this side's muscles, in muscle order.
    pub length_rows: Vec<usize>,
}

/// Left and right polynomial evaluations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MuscleGeometry {
    /// Left-side evaluation.
    pub left: PolynomialSide,
    /// Right-side evaluation.
    pub right: PolynomialSide,
}

impl MuscleGeometry {
    /// Evaluation for `side`.
    #[must_use]
    pub fn side(&self, side: Side) -> &PolynomialSide {
        match side {
            Side::Left => &self.left,
            Side::Right => &self.right,
        }
    }

    /// Number of muscles produced by both sides together.
    #[must_use]
    pub fn n_muscles(&self) -> usize {
        self.left.length_rows.len() + self.right.length_rows.len()
    }
}

/// Torque balance of a joint actuated by muscles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MuscleDrivenJoint {
    /// Model joint index.
    pub joint: usize,
    /// Polynomial evaluation supplying the moment arms.
    pub side: Side,
    /// Input column of the joint in that evaluation.
    pub input: usize,
    /// Polynomial rows whose moment arms apply, paired with `muscles`.
    pub moment_arm_rows: Vec<usize>,
    /// Muscle indices whose forces apply.
    pub muscles: Vec<usize>,
    /// Index into [`GaitModel::passive_joints`].
    pub passive: usize,
}

/// Half-cycle periodicity maps.
///
/// After half a cycle, position `qs_a[i]` equals the initial position
/// `qs_b[i]`; `opposite` coordinates flip sign instead; muscle and arm
/// states follow the `muscles` and `arms` permutations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Periodicity {
    /// Joints matched at the end of the half cycle (positions).
    pub qs_a: Vec<usize>,
    /// Joints matched at the start (positions).
    pub qs_b: Vec<usize>,
    /// Joints matched at the end of the half cycle (velocities).
    pub qds_a: Vec<usize>,
    /// Joints matched at the start (velocities).
    pub qds_b: Vec<usize>,
    /// Sign-flipped joints.
    pub opposite: Vec<usize>,
    /// Muscle permutation.
    pub muscles: Vec<usize>,
    /// Arm actuator permutation (indices into the arm joint list).
    pub arms: Vec<usize>,
}

/// Pelvis translation coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PelvisTranslations {
    /// Forward translation (`pelvis_tx`).
    pub forward: usize,
    /// Vertical translation (`pelvis_ty`).
    pub vertical: Option<usize>,
    /// Lateral translation (`pelvis_tz`).
    pub lateral: Option<usize>,
}

/// Time constants of the activation dynamics (s).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeConstants {
    /// Muscle activation.
    pub activation: f64,
    /// Muscle deactivation.
    pub deactivation: f64,
    /// Arm torque actuators.
    pub arm: f64,
}

impl Default for TimeConstants {
    fn default() -> Self {
        Self {
            activation: 0.015,
            deactivation: 0.06,
            arm: 0.035,
        }
    }
}

/// A musculoskeletal model reduced to index maps and parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct GaitModel {
    /// Coordinates in evaluator order.
    pub joints: Vec<Joint>,
    /// Muscles in bilateral order.
    pub muscles: Vec<Muscle>,
    /// Unactuated pelvis coordinates (zero residual torque).
    pub ground_pelvis_joints: Vec<usize>,
    /// Pelvis translations.
    pub pelvis: PelvisTranslations,
    /// Torque-actuated arm joints.
    pub arm_joints: Vec<usize>,
    /// Passive-only MTP joints.
    pub mtp_joints: Vec<usize>,
    /// Joints with limit torques, in cost-term order.
    pub passive_joints: Vec<PassiveJoint>,
    /// Muscle-driven joints, in constraint order.
    pub muscle_driven: Vec<MuscleDrivenJoint>,
    /// Polynomial muscle geometry.
    pub geometry: MuscleGeometry,
    /// Periodicity maps.
    pub periodicity: Periodicity,
    /// Linear passive torque of arm joints.
    pub arm_passive: LinearPassiveParameters,
    /// Linear passive torque of MTP joints.
    pub mtp_passive: LinearPassiveParameters,
    /// Arm actuator torque scale (N·m).
    pub arm_torque_scale: f64,
    /// MTP torque scale (N·m).
    pub mtp_torque_scale: f64,
    /// Activation dynamics time constants.
    pub time_constants: TimeConstants,
    /// Dynamics evaluator output layout.
    pub dynamics: DynamicsLayout,
    /// Self-collision constraints.
    pub collision_pairs: Vec<CollisionPair>,
    joint_registry: NameRegistry,
    muscle_registry: NameRegistry,
}

/// Fields of a [`GaitModel`] before validation.
#[derive(Debug, Clone)]
pub struct GaitModelParts {
    /// See [`GaitModel::joints`].
    pub joints: Vec<Joint>,
    /// See [`GaitModel::muscles`].
    pub muscles: Vec<Muscle>,
    /// See [`GaitModel::ground_pelvis_joints`].
    pub ground_pelvis_joints: Vec<usize>,
    /// See [`GaitModel::pelvis`].
    pub pelvis: PelvisTranslations,
    /// See [`GaitModel::arm_joints`].
    pub arm_joints: Vec<usize>,
    /// See [`GaitModel::mtp_joints`].
    pub mtp_joints: Vec<usize>,
    /// See [`GaitModel::passive_joints`].
    pub passive_joints: Vec<PassiveJoint>,
    /// See [`GaitModel::muscle_driven`].
    pub muscle_driven: Vec<MuscleDrivenJoint>,
    /// See [`GaitModel::geometry`].
    pub geometry: MuscleGeometry,
    /// See [`GaitModel::periodicity`].
    pub periodicity: Periodicity,
    /// See [`GaitModel::arm_passive`].
    pub arm_passive: LinearPassiveParameters,
    /// See [`GaitModel::mtp_passive`].
    pub mtp_passive: LinearPassiveParameters,
    /// See [`GaitModel::collision_pairs`].
    pub collision_pairs: Vec<CollisionPair>,
}

impl GaitModel {
    /// Arm actuator torque scale used by the walking model.
    pub const ARM_TORQUE_SCALE: f64 = 150.0;
    /// MTP torque scale used by the walking model.
    pub const MTP_TORQUE_SCALE: f64 = 100.0;

    /// Assemble and validate a model.
    pub fn from_parts(parts: GaitModelParts) -> Result<Self> {
        let joint_registry = NameRegistry::from_names(parts.joints.iter().map(|j| j.name.clone()))?;
        let muscle_registry =
            NameRegistry::from_names(parts.muscles.iter().map(|m| m.name.clone()))?;
        let model = Self {
            dynamics: DynamicsLayout::new(parts.joints.len()),
            joints: parts.joints,
            muscles: parts.muscles,
            ground_pelvis_joints: parts.ground_pelvis_joints,
            pelvis: parts.pelvis,
            arm_joints: parts.arm_joints,
            mtp_joints: parts.mtp_joints,
            passive_joints: parts.passive_joints,
            muscle_driven: parts.muscle_driven,
            geometry: parts.geometry,
            periodicity: parts.periodicity,
            arm_passive: parts.arm_passive,
            mtp_passive: parts.mtp_passive,
            arm_torque_scale: Self::ARM_TORQUE_SCALE,
            mtp_torque_scale: Self::MTP_TORQUE_SCALE,
            time_constants: TimeConstants::default(),
            collision_pairs: parts.collision_pairs,
            joint_registry,
            muscle_registry,
        };
        model.validate()?;
        Ok(model)
    }

    /// Number of coordinates.
    #[must_use]
    pub fn n_joints(&self) -> usize {
        self.joints.len()
    }

    /// Number of muscles.
    #[must_use]
    pub fn n_muscles(&self) -> usize {
        self.muscles.len()
    }

    /// Number of arm actuators.
    #[must_use]
    pub fn n_arms(&self) -> usize {
        self.arm_joints.len()
    }

    /// Joint name registry.
    #[must_use]
    pub fn joint_registry(&self) -> &NameRegistry {
        &self.joint_registry
    }

    /// Muscle name registry.
    #[must_use]
    pub fn muscle_registry(&self) -> &NameRegistry {
        &self.muscle_registry
    }

    /// Index of a joint by name.
    pub fn joint_index(&self, name: &str) -> Result<usize> {
        self.joint_registry
            .get(name)
            .ok_or_else(|| GaitError::missing_joint(name))
    }

    /// Joint names in order.
    #[must_use]
    pub fn joint_names(&self) -> &[String] {
        self.joint_registry.names()
    }

    /// Muscle names in order.
    #[must_use]
    pub fn muscle_names(&self) -> &[String] {
        self.muscle_registry.names()
    }

    /// Joints that are not arm joints, in model order.
    #[must_use]
    pub fn non_arm_joints(&self) -> Vec<usize> {
        (0..self.n_joints())
            .filter(|j| !self.arm_joints.contains(j))
            .collect()
    }

    /// Rotational joints, in model order.
    #[must_use]
    pub fn rotational_joints(&self) -> Vec<usize> {
        self.joints
            .iter()
            .enumerate()
            .filter_map(|(i, j)| j.kind.is_rotational().then_some(i))
            .collect()
    }

    /// Position of `joint` in the passive joint list.
    #[must_use]
    pub fn passive_slot(&self, joint: usize) -> Option<usize> {
        self.passive_joints.iter().position(|p| p.joint == joint)
    }

    /// Muscle masses (kg), in muscle order.
    #[must_use]
    pub fn muscle_masses(&self) -> Vec<f64> {
        self.muscles.iter().map(Muscle::mass).collect()
    }

    /// Check internal consistency of every index map.
    pub fn validate(&self) -> Result<()> {
        let nj = self.n_joints();
        let nm = self.n_muscles();
        let check_joint = |j: usize, what: &str| -> Result<()> {
            if j < nj {
                Ok(())
            } else {
                Err(GaitError::consistency(format!(
                    "{what} references joint {j}, model has {nj}"
                )))
            }
        };
        for &j in self
            .ground_pelvis_joints
            .iter()
            .chain(&self.arm_joints)
            .chain(&self.mtp_joints)
        {
            check_joint(j, "joint group")?;
        }
        check_joint(self.pelvis.forward, "pelvis translation")?;
        for p in &self.passive_joints {
            check_joint(p.joint, "passive joint")?;
        }
        for &j in self.mtp_joints.iter() {
            if self.passive_slot(j).is_none() {
                return Err(GaitError::consistency(format!(
                    "mtp joint {j} has no limit torque"
                )));
            }
        }

        if self.geometry.n_muscles() != nm {
            return Err(GaitError::consistency(format!(
                "geometry produces {} muscle lengths, model has {nm} muscles",
                self.geometry.n_muscles()
            )));
        }
        for side in [&self.geometry.left, &self.geometry.right] {
            for &j in &side.joints {
                check_joint(j, "polynomial side")?;
            }
            let rows = side.polynomials.len();
            if side.length_rows.iter().any(|&r| r >= rows) {
                return Err(GaitError::consistency("polynomial length row out of range"));
            }
            if side
                .polynomials
                .iter()
                .any(|p| p.inputs.iter().any(|&i| i >= side.joints.len()))
            {
                return Err(GaitError::consistency("polynomial input out of range"));
            }
        }

        for md in &self.muscle_driven {
            check_joint(md.joint, "muscle-driven joint")?;
            let side = self.geometry.side(md.side);
            if md.input >= side.joints.len() || side.joints[md.input] != md.joint {
                return Err(GaitError::consistency(format!(
                    "muscle-driven joint {} does not match its polynomial input",
                    self.joints[md.joint].name
                )));
            }
            if md.moment_arm_rows.len() != md.muscles.len() {
                return Err(GaitError::consistency(format!(
                    "joint {}: {} moment-arm rows for {} muscles",
                    self.joints[md.joint].name,
                    md.moment_arm_rows.len(),
                    md.muscles.len()
                )));
            }
            if md.moment_arm_rows.iter().any(|&r| r >= side.polynomials.len())
                || md.muscles.iter().any(|&m| m >= nm)
            {
                return Err(GaitError::consistency("moment-arm index out of range"));
            }
            if self.passive_joints.get(md.passive).map(|p| p.joint) != Some(md.joint) {
                return Err(GaitError::consistency(format!(
                    "joint {} has no matching limit torque",
                    self.joints[md.joint].name
                )));
            }
        }

        let p = &self.periodicity;
        if p.qs_a.len() != p.qs_b.len() || p.qds_a.len() != p.qds_b.len() {
            return Err(GaitError::consistency("periodicity A/B lists differ in length"));
        }
        for &j in p.qs_a.iter().chain(&p.qs_b).chain(&p.qds_a).chain(&p.qds_b).chain(&p.opposite) {
            check_joint(j, "periodicity")?;
        }
        if !is_permutation(&p.muscles, nm) {
            return Err(GaitError::consistency("muscle periodicity is not a permutation"));
        }
        if !is_permutation(&p.arms, self.n_arms()) {
            return Err(GaitError::consistency("arm periodicity is not a permutation"));
        }
        Ok(())
    }
}

fn is_permutation(indices: &[usize], n: usize) -> bool {
    if indices.len() != n {
        return false;
    }
    let mut seen = vec![false; n];
    for &i in indices {
        if i >= n || seen[i] {
            return false;
        }
        seen[i] = true;
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_permutation() {
        assert!(is_permutation(&[2, 0, 1], 3));
        assert!(!is_permutation(&[0, 0, 1], 3));
        assert!(!is_permutation(&[0, 1], 3));
        assert!(is_permutation(&[], 0));
    }
}
