//! Scaling and bounds of every decision-variable family.
//!
//! Kinematic bounds come from the reference motion: the range of a joint's
//! spline (and its derivatives) over the reference, shared by left and right
//! joints, widened by that range on both sides. Pelvis translations use fixed
//! ranges. Each family item is then scaled by `s = max(|lb|, |ub|)`, so the
//! optimizer works on values in `[−1, 1]`.
//!
//! Muscle and arm families use fixed physiological ranges. The forward
//! pelvis translation is pinned to zero at the first mesh node so every
//! solution starts at the origin.

use gait_nlp::Bounds;
use gait_types::{mirror_name, GaitModel, Result};
use nalgebra::DMatrix;
use tracing::debug;

use crate::reference::ReferenceMotion;
use crate::variables::{Family, VariableLayout};

/// Smallest widening of a kinematic range, for joints the reference holds
/// constant.
pub const MIN_WIDENING: f64 = 0.1;

/// Bounds of one family item-wise, in scaled units.
#[derive(Debug, Clone, PartialEq)]
pub struct FamilyBounds {
    /// Lower bounds.
    pub lower: Vec<f64>,
    /// Upper bounds.
    pub upper: Vec<f64>,
}

impl FamilyBounds {
    fn uniform(lower: f64, upper: f64, n: usize) -> Self {
        Self {
            lower: vec![lower; n],
            upper: vec![upper; n],
        }
    }

    /// Scale physical bounds by `max(|lb|, |ub|)` and return the factors.
    fn scaled(lower: Vec<f64>, upper: Vec<f64>) -> (Self, Vec<f64>) {
        let scale: Vec<f64> = lower
            .iter()
            .zip(&upper)
            .map(|(l, u)| {
                let s = l.abs().max(u.abs());
                if s > 0.0 {
                    s
                } else {
                    1.0
                }
            })
            .collect();
        let bounds = Self {
            lower: lower.iter().zip(&scale).map(|(v, s)| v / s).collect(),
            upper: upper.iter().zip(&scale).map(|(v, s)| v / s).collect(),
        };
        (bounds, scale)
    }

    /// Number of items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lower.len()
    }

    /// True when the family has no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lower.is_empty()
    }

    /// Whether `value` lies within the bounds of `item`.
    #[must_use]
    pub fn contains(&self, item: usize, value: f64) -> bool {
        value >= self.lower[item] && value <= self.upper[item]
    }

    /// Clamp `value` into the bounds of `item`.
    #[must_use]
    pub fn clamp(&self, item: usize, value: f64) -> f64 {
        value.max(self.lower[item]).min(self.upper[item])
    }
}

/// Per-item scale factors: physical value = scaled value × factor.
#[derive(Debug, Clone, PartialEq)]
pub struct Scaling {
    /// Muscle activation.
    pub activation: Vec<f64>,
    /// Normalized tendon force.
    pub force: Vec<f64>,
    /// Joint positions.
    pub position: Vec<f64>,
    /// Joint velocities.
    pub velocity: Vec<f64>,
    /// Joint accelerations.
    pub acceleration: Vec<f64>,
    /// Arm activation and excitation.
    pub arm: Vec<f64>,
    /// Activation rate.
    pub activation_rate: Vec<f64>,
    /// Normalized tendon force rate.
    pub force_rate: Vec<f64>,
}

impl Scaling {
    const UNIT: &'static [f64] = &[1.0];

    /// Factors of `family`.
    #[must_use]
    pub fn factors(&self, family: Family) -> &[f64] {
        match family {
            Family::FinalTime => Self::UNIT,
            Family::Activation | Family::ActivationCol => &self.activation,
            Family::Force | Family::ForceCol => &self.force,
            Family::Position | Family::PositionCol => &self.position,
            Family::Velocity | Family::VelocityCol => &self.velocity,
            Family::AccelerationCol => &self.acceleration,
            Family::ArmActivation | Family::ArmActivationCol | Family::ArmExcitation => &self.arm,
            Family::ActivationRate => &self.activation_rate,
            Family::ForceRateCol => &self.force_rate,
        }
    }
}

/// Fixed ranges of the provider.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundsSettings {
    /// Forward pelvis translation (m).
    pub pelvis_forward: (f64, f64),
    /// Vertical pelvis translation (m).
    pub pelvis_vertical: (f64, f64),
    /// Lateral pelvis translation (m).
    pub pelvis_lateral: (f64, f64),
    /// Forward pelvis velocity (m/s).
    pub pelvis_forward_velocity: (f64, f64),
    /// Elbow flexion (rad).
    pub elbow_flexion: (f64, f64),
    /// Muscle activation.
    pub activation: (f64, f64),
    /// Normalized tendon force.
    pub force: (f64, f64),
    /// Normalized tendon force rate (1/s).
    pub force_rate: (f64, f64),
    /// Arm activation and excitation.
    pub arm: (f64, f64),
    /// Final time (s).
    pub final_time: (f64, f64),
}

impl Default for BoundsSettings {
    fn default() -> Self {
        Self {
            pelvis_forward: (0.0, 2.0),
            pelvis_vertical: (0.75, 1.1),
            pelvis_lateral: (-0.1, 0.1),
            pelvis_forward_velocity: (0.0, 4.0),
            elbow_flexion: (0.0, 150f64.to_radians()),
            activation: (0.05, 1.0),
            force: (0.0, 5.0),
            force_rate: (-100.0, 100.0),
            arm: (-1.0, 1.0),
            final_time: (0.1, 1.0),
        }
    }
}

/// Scaled bounds of every family plus the scale factors.
#[derive(Debug, Clone, PartialEq)]
pub struct ProblemBounds {
    /// Final time.
    pub final_time: FamilyBounds,
    /// Muscle activation.
    pub activation: FamilyBounds,
    /// Normalized tendon force.
    pub force: FamilyBounds,
    /// Joint positions.
    pub position: FamilyBounds,
    /// Joint positions at the first mesh node.
    pub initial_position: FamilyBounds,
    /// Joint velocities.
    pub velocity: FamilyBounds,
    /// Joint accelerations.
    pub acceleration: FamilyBounds,
    /// Arm activation.
    pub arm_activation: FamilyBounds,
    /// Arm excitation.
    pub arm_excitation: FamilyBounds,
    /// Activation rate.
    pub activation_rate: FamilyBounds,
    /// Normalized tendon force rate.
    pub force_rate: FamilyBounds,
    /// Scale factors.
    pub scaling: Scaling,
}

impl ProblemBounds {
    /// Bounds for `model` from `reference` with the default settings.
    pub fn new(model: &GaitModel, reference: &ReferenceMotion) -> Result<Self> {
        Self::with_settings(model, reference, &BoundsSettings::default())
    }

    /// Bounds for `model` from `reference`.
    pub fn with_settings(
        model: &GaitModel,
        reference: &ReferenceMotion,
        settings: &BoundsSettings,
    ) -> Result<Self> {
        let nm = model.n_muscles();
        let n_arms = model.n_arms();
        let samples = reference.at_knots();

        let (mut q_lo, mut q_hi) = kinematic_range(model, &samples.positions);
        let (mut qd_lo, mut qd_hi) = kinematic_range(model, &samples.velocities);
        let (qdd_lo, qdd_hi) = kinematic_range(model, &samples.accelerations);

        let p = model.pelvis;
        fix(&mut q_lo, &mut q_hi, p.forward, settings.pelvis_forward);
        if let Some(j) = p.vertical {
            fix(&mut q_lo, &mut q_hi, j, settings.pelvis_vertical);
        }
        if let Some(j) = p.lateral {
            fix(&mut q_lo, &mut q_hi, j, settings.pelvis_lateral);
        }
        for name in ["elbow_flex_l", "elbow_flex_r"] {
            if let Some(j) = model.joint_registry().get(name) {
                fix(&mut q_lo, &mut q_hi, j, settings.elbow_flexion);
            }
        }
        fix(&mut qd_lo, &mut qd_hi, p.forward, settings.pelvis_forward_velocity);

        let (position, position_scale) = FamilyBounds::scaled(q_lo, q_hi);
        let (velocity, velocity_scale) = FamilyBounds::scaled(qd_lo, qd_hi);
        let (acceleration, acceleration_scale) = FamilyBounds::scaled(qdd_lo, qdd_hi);

        let mut initial_position = position.clone();
        initial_position.lower[p.forward] = 0.0;
        initial_position.upper[p.forward] = 0.0;

        let tc = model.time_constants;
        let (activation_rate, rate_scale) =
            FamilyBounds::scaled(vec![-1.0 / tc.deactivation; nm], vec![1.0 / tc.activation; nm]);
        let (force, force_scale) =
            FamilyBounds::scaled(vec![settings.force.0; nm], vec![settings.force.1; nm]);
        let (force_rate, force_rate_scale) = FamilyBounds::scaled(
            vec![settings.force_rate.0; nm],
            vec![settings.force_rate.1; nm],
        );

        debug!(
            joints = model.n_joints(),
            muscles = nm,
            "derived bounds from {} reference samples",
            samples.time.len()
        );

        Ok(Self {
            final_time: FamilyBounds::uniform(settings.final_time.0, settings.final_time.1, 1),
            activation: FamilyBounds::uniform(settings.activation.0, settings.activation.1, nm),
            force,
            position,
            initial_position,
            velocity,
            acceleration,
            arm_activation: FamilyBounds::uniform(settings.arm.0, settings.arm.1, n_arms),
            arm_excitation: FamilyBounds::uniform(settings.arm.0, settings.arm.1, n_arms),
            activation_rate,
            force_rate,
            scaling: Scaling {
                activation: vec![1.0; nm],
                force: force_scale,
                position: position_scale,
                velocity: velocity_scale,
                acceleration: acceleration_scale,
                arm: vec![1.0; n_arms],
                activation_rate: rate_scale,
                force_rate: force_rate_scale,
            },
        })
    }

    /// Bounds of `family` at `node`.
    #[must_use]
    pub fn family(&self, family: Family, node: usize) -> &FamilyBounds {
        match family {
            Family::FinalTime => &self.final_time,
            Family::Activation | Family::ActivationCol => &self.activation,
            Family::Force | Family::ForceCol => &self.force,
            Family::Position if node == 0 => &self.initial_position,
            Family::Position | Family::PositionCol => &self.position,
            Family::Velocity | Family::VelocityCol => &self.velocity,
            Family::AccelerationCol => &self.acceleration,
            Family::ArmActivation | Family::ArmActivationCol => &self.arm_activation,
            Family::ArmExcitation => &self.arm_excitation,
            Family::ActivationRate => &self.activation_rate,
            Family::ForceRateCol => &self.force_rate,
        }
    }

    /// Simple bounds of the whole decision vector.
    #[must_use]
    pub fn variable_bounds(&self, layout: &VariableLayout) -> Bounds {
        let dims = layout.dimensions();
        let mut lower = Vec::with_capacity(layout.len());
        let mut upper = Vec::with_capacity(layout.len());
        for f in Family::ALL {
            for node in 0..dims.nodes(f) {
                let b = self.family(f, node);
                lower.extend_from_slice(&b.lower);
                upper.extend_from_slice(&b.upper);
            }
        }
        Bounds::new(lower, upper)
    }
}

fn fix(lower: &mut [f64], upper: &mut [f64], joint: usize, range: (f64, f64)) {
    lower[joint] = range.0;
    upper[joint] = range.1;
}

/// Widened `[min, max]` of every joint row of `values`, shared by a joint and
/// its mirror.
fn kinematic_range(model: &GaitModel, values: &DMatrix<f64>) -> (Vec<f64>, Vec<f64>) {
    let extent = |j: usize| -> (f64, f64) {
        values
            .row(j)
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
                (lo.min(v), hi.max(v))
            })
    };
    let mut lower = Vec::with_capacity(model.n_joints());
    let mut upper = Vec::with_capacity(model.n_joints());
    for (j, joint) in model.joints.iter().enumerate() {
        let (mut lo, mut hi) = extent(j);
        let mirror = mirror_name(&joint.name);
        if mirror != joint.name {
            if let Some(m) = model.joint_registry().get(&mirror) {
                let (mlo, mhi) = extent(m);
                lo = lo.min(mlo);
                hi = hi.max(mhi);
            }
        }
        let r = (hi - lo).abs().max(MIN_WIDENING);
        lower.push(lo - r);
        upper.push(hi + r);
    }
    (lower, upper)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::reference::tests::toy_table;
    use crate::variables::Dimensions;
    use approx::assert_relative_eq;

    fn toy() -> (GaitModel, ProblemBounds) {
        let model = GaitModel::toy_leg().unwrap();
        let reference = ReferenceMotion::from_table(&toy_table(), &model).unwrap();
        let bounds = ProblemBounds::new(&model, &reference).unwrap();
        (model, bounds)
    }

    #[test]
    fn test_widened_hip_range() {
        let (_, b) = toy();
        // hip spans [−0.3, 0.3]: widened to [−0.9, 0.9], scale 0.9
        assert_relative_eq!(b.scaling.position[1], 0.9, epsilon = 1e-6);
        assert_relative_eq!(b.position.lower[1], -1.0, epsilon = 1e-6);
        assert_relative_eq!(b.position.upper[1], 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_pelvis_fixed_ranges() {
        let (_, b) = toy();
        assert_relative_eq!(b.scaling.position[0], 2.0);
        assert_relative_eq!(b.position.lower[0], 0.0);
        assert_relative_eq!(b.position.upper[0], 1.0);
        assert_relative_eq!(b.initial_position.upper[0], 0.0);
        assert_relative_eq!(b.scaling.velocity[0], 4.0);
    }

    #[test]
    fn test_muscle_ranges() {
        let (_, b) = toy();
        assert_relative_eq!(b.scaling.force[0], 5.0);
        assert_relative_eq!(b.force.upper[0], 1.0);
        assert_relative_eq!(b.scaling.activation_rate[0], 1.0 / 0.015, epsilon = 1e-9);
        assert_relative_eq!(b.activation_rate.lower[0], -0.25, epsilon = 1e-9);
        assert_relative_eq!(b.activation.lower[0], 0.05);
        assert_relative_eq!(b.force_rate.lower[0], -1.0);
        assert!(b.scaling.acceleration.iter().all(|&s| s > 0.0));
    }

    #[test]
    fn test_variable_bounds_pin_first_node() {
        let (model, b) = toy();
        let layout = VariableLayout::new(Dimensions::new(&model, 4, 3));
        let vb = b.variable_bounds(&layout);
        assert_eq!(vb.len(), layout.len());
        let first = layout.index(Family::Position, 0, 0);
        assert!(vb.is_equality(first));
        let later = layout.index(Family::Position, 1, 0);
        assert!(!vb.is_equality(later));
        assert_relative_eq!(vb.lower[0], 0.1);
    }

    #[test]
    fn test_mirrored_joints_share_range() {
        let values = DMatrix::from_row_slice(2, 3, &[0.0, 0.1, 0.2, -0.5, 0.0, 0.0]);
        let toy = GaitModel::toy_leg().unwrap();
        let mut joints = toy.joints.clone();
        joints[0].name = "knee_r".into();
        joints[1].name = "knee_l".into();
        let model = rebuild_with_joints(&toy, joints);
        let (lo, hi) = kinematic_range(&model, &values);
        // union [−0.5, 0.2], widened by 0.7
        assert_relative_eq!(lo[0], -1.2, epsilon = 1e-12);
        assert_relative_eq!(hi[1], 0.9, epsilon = 1e-12);
    }

    fn rebuild_with_joints(model: &GaitModel, joints: Vec<gait_types::Joint>) -> GaitModel {
        GaitModel::from_parts(gait_types::GaitModelParts {
            joints,
            muscles: model.muscles.clone(),
            ground_pelvis_joints: model.ground_pelvis_joints.clone(),
            pelvis: model.pelvis,
            arm_joints: model.arm_joints.clone(),
            mtp_joints: model.mtp_joints.clone(),
            passive_joints: model.passive_joints.clone(),
            muscle_driven: model.muscle_driven.clone(),
            geometry: model.geometry.clone(),
            periodicity: model.periodicity.clone(),
            arm_passive: model.arm_passive,
            mtp_passive: model.mtp_passive,
            collision_pairs: model.collision_pairs.clone(),
        })
        .unwrap()
    }
}
