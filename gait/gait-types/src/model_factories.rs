//! Model factories.
//!
//! - [`GaitModel::walking`]: the 3-D, 31-coordinate (29 without MTP),
//!   92-muscle walking model.
//! - [`GaitModel::toy_leg`]: a forward translation plus one muscle-driven
//!   hinge, small enough to solve in a unit test.
//!
//! The walking model is hard-wired to its coordinate set; lists are kept in
//! the order the evaluator and the constraint ordering expect.

use std::collections::BTreeMap;

use crate::config::RunConfiguration;
use crate::data;
use crate::error::GaitError;
use crate::joint::{Joint, LinearPassiveParameters, PassiveJoint};
use crate::layout::{CollisionPair, Side};
use crate::model::{
    GaitModel, GaitModelParts, MuscleDrivenJoint, MuscleGeometry, Periodicity, PelvisTranslations,
    PolynomialSide,
};
use crate::muscle::{Muscle, MuscleTendonParameters, MuscleTendonTable};
use crate::polynomial::{MusclePolynomial, PolynomialCoefficients, PolynomialTable};
use crate::registry::mirror_name;
use crate::Result;

/// Right-side muscles followed by both sides' trunk muscles.
pub const WALKING_MUSCLES: &[&str] = &[
    "glut_med1_r", "glut_med2_r", "glut_med3_r", "glut_min1_r", "glut_min2_r", "glut_min3_r",
    "semimem_r", "semiten_r", "bifemlh_r", "bifemsh_r", "sar_r", "add_long_r", "add_brev_r",
    "add_mag1_r", "add_mag2_r", "add_mag3_r", "tfl_r", "pect_r", "grac_r", "glut_max1_r",
    "glut_max2_r", "glut_max3_r", "iliacus_r", "psoas_r", "quad_fem_r", "gem_r", "peri_r",
    "rect_fem_r", "vas_med_r", "vas_int_r", "vas_lat_r", "med_gas_r", "lat_gas_r", "soleus_r",
    "tib_post_r", "flex_dig_r", "flex_hal_r", "tib_ant_r", "per_brev_r", "per_long_r",
    "per_tert_r", "ext_dig_r", "ext_hal_r", "ercspn_r", "intobl_r", "extobl_r", "ercspn_l",
    "intobl_l", "extobl_l",
];

/// Coordinates of the walking model in evaluator order.
pub const WALKING_JOINTS: &[&str] = &[
    "pelvis_tilt", "pelvis_list", "pelvis_rotation", "pelvis_tx", "pelvis_ty", "pelvis_tz",
    "hip_flexion_l", "hip_adduction_l", "hip_rotation_l", "hip_flexion_r", "hip_adduction_r",
    "hip_rotation_r", "knee_angle_l", "knee_angle_r", "ankle_angle_l", "ankle_angle_r",
    "subtalar_angle_l", "subtalar_angle_r", "mtp_angle_l", "mtp_angle_r", "lumbar_extension",
    "lumbar_bending", "lumbar_rotation", "arm_flex_l", "arm_add_l", "arm_rot_l", "arm_flex_r",
    "arm_add_r", "arm_rot_r", "elbow_flex_l", "elbow_flex_r",
];

const TRANSLATIONS: &[&str] = &["pelvis_tx", "pelvis_ty", "pelvis_tz"];

const MTP_JOINTS: &[&str] = &["mtp_angle_l", "mtp_angle_r"];

const TRUNK_JOINTS: &[&str] = &["lumbar_extension", "lumbar_bending", "lumbar_rotation"];

const RIGHT_TRUNK_MUSCLES: &[&str] = &["ercspn_r", "intobl_r", "extobl_r"];
const LEFT_TRUNK_MUSCLES: &[&str] = &["ercspn_l", "intobl_l", "extobl_l"];

const ACHILLES_MUSCLES: &[&str] = &["med_gas_r", "lat_gas_r", "soleus_r"];

const GROUND_PELVIS_JOINTS: &[&str] = &[
    "pelvis_tilt", "pelvis_list", "pelvis_rotation", "pelvis_tx", "pelvis_ty", "pelvis_tz",
];

const ARM_JOINTS: &[&str] = &[
    "arm_flex_l", "arm_add_l", "arm_rot_l", "arm_flex_r", "arm_add_r", "arm_rot_r",
    "elbow_flex_l", "elbow_flex_r",
];

const PERIODIC_ARM_JOINTS: &[&str] = &[
    "arm_flex_r", "arm_add_r", "arm_rot_r", "arm_flex_l", "arm_add_l", "arm_rot_l",
    "elbow_flex_r", "elbow_flex_l",
];

const PERIODIC_QS_A: &[&str] = &[
    "pelvis_tilt", "pelvis_ty", "hip_flexion_l", "hip_adduction_l", "hip_rotation_l",
    "hip_flexion_r", "hip_adduction_r", "hip_rotation_r", "knee_angle_l", "knee_angle_r",
    "ankle_angle_l", "ankle_angle_r", "subtalar_angle_l", "subtalar_angle_r", "mtp_angle_l",
    "mtp_angle_r", "lumbar_extension", "arm_flex_l", "arm_add_l", "arm_rot_l", "arm_flex_r",
    "arm_add_r", "arm_rot_r", "elbow_flex_l", "elbow_flex_r",
];

const PERIODIC_QS_B: &[&str] = &[
    "pelvis_tilt", "pelvis_ty", "hip_flexion_r", "hip_adduction_r", "hip_rotation_r",
    "hip_flexion_l", "hip_adduction_l", "hip_rotation_l", "knee_angle_r", "knee_angle_l",
    "ankle_angle_r", "ankle_angle_l", "subtalar_angle_r", "subtalar_angle_l", "mtp_angle_r",
    "mtp_angle_l", "lumbar_extension", "arm_flex_r", "arm_add_r", "arm_rot_r", "arm_flex_l",
    "arm_add_l", "arm_rot_l", "elbow_flex_r", "elbow_flex_l",
];

const PERIODIC_OPPOSITE: &[&str] = &[
    "pelvis_list", "pelvis_rotation", "pelvis_tz", "lumbar_bending", "lumbar_rotation",
];

/// Limit-torque joints, in cost-term order.
const PASSIVE_TORQUE_JOINTS: &[&str] = &[
    "hip_flexion_r", "hip_flexion_l", "hip_adduction_r", "hip_adduction_l", "hip_rotation_r",
    "hip_rotation_l", "knee_angle_r", "knee_angle_l", "ankle_angle_r", "ankle_angle_l",
    "subtalar_angle_r", "subtalar_angle_l", "lumbar_extension", "lumbar_bending",
    "lumbar_rotation", "mtp_angle_l", "mtp_angle_r",
];

/// Muscle-driven joints, in constraint order.
const MUSCLE_DRIVEN_JOINTS: &[&str] = &[
    "hip_flexion_l", "hip_flexion_r", "hip_adduction_l", "hip_adduction_r", "hip_rotation_l",
    "hip_rotation_r", "knee_angle_l", "knee_angle_r", "ankle_angle_l", "ankle_angle_r",
    "subtalar_angle_l", "subtalar_angle_r", "lumbar_extension", "lumbar_bending",
    "lumbar_rotation",
];

const LEFT_POLYNOMIAL_JOINTS: &[&str] = &[
    "hip_flexion_l", "hip_adduction_l", "hip_rotation_l", "knee_angle_l", "ankle_angle_l",
    "subtalar_angle_l", "mtp_angle_l", "lumbar_extension", "lumbar_bending", "lumbar_rotation",
];

const RIGHT_POLYNOMIAL_JOINTS: &[&str] = &[
    "hip_flexion_r", "hip_adduction_r", "hip_rotation_r", "knee_angle_r", "ankle_angle_r",
    "subtalar_angle_r", "mtp_angle_r", "lumbar_extension", "lumbar_bending", "lumbar_rotation",
];

fn without_mtp(names: &[&str], with_mtp: bool) -> Vec<String> {
    names
        .iter()
        .filter(|n| with_mtp || !MTP_JOINTS.contains(n))
        .map(|n| (*n).to_string())
        .collect()
}

fn owned(names: &[&str]) -> Vec<String> {
    without_mtp(names, true)
}

fn position_of(list: &[String], name: &str) -> Result<usize> {
    list.iter()
        .position(|n| n == name)
        .ok_or_else(|| GaitError::missing_joint(name))
}

fn indices(list: &[String], names: &[String]) -> Result<Vec<usize>> {
    names.iter().map(|n| position_of(list, n)).collect()
}

/// Muscle → joints it spans, per side, as bilateral muscle indices.
///
/// Left-side joint names collect the right-side muscle index `i`; right-side
/// names collect `i + n_side`. Trunk joints appear in both polynomial joint
/// lists and therefore collect both, left entries first.
fn moment_arm_indices(
    side_muscles: &[String],
    left_joints: &[String],
    right_joints: &[String],
    polynomials: &PolynomialTable,
) -> Result<BTreeMap<String, Vec<usize>>> {
    let n_side = side_muscles.len();
    let mut spanning = Vec::with_capacity(n_side);
    for muscle in side_muscles {
        let entry = polynomials
            .get(muscle)
            .ok_or_else(|| GaitError::missing_muscle(muscle.clone()))?;
        let columns = entry
            .dofs
            .iter()
            .map(|dof| position_of(right_joints, dof))
            .collect::<Result<Vec<_>>>()?;
        spanning.push(columns);
    }
    let mut map: BTreeMap<String, Vec<usize>> = BTreeMap::new();
    for (count, columns) in spanning.iter().enumerate() {
        for &c in columns {
            map.entry(left_joints[c].clone()).or_default().push(count);
        }
    }
    for (count, columns) in spanning.iter().enumerate() {
        for &c in columns {
            map.entry(right_joints[c].clone())
                .or_default()
                .push(count + n_side);
        }
    }
    Ok(map)
}

fn polynomial_row(name: &str) -> Result<usize> {
    WALKING_MUSCLES
        .iter()
        .position(|m| *m == name)
        .ok_or_else(|| GaitError::missing_muscle(name))
}

fn resolve_polynomials(
    names: &[&str],
    table: &PolynomialTable,
    side_joints: &[String],
) -> Result<Vec<MusclePolynomial>> {
    names
        .iter()
        .map(|&name| {
            let entry = table
                .get(name)
                .ok_or_else(|| GaitError::missing_muscle(name))?;
            MusclePolynomial::resolve(name, entry, side_joints)
        })
        .collect()
}

impl GaitModel {
    /// Build the 3-D walking model.
    ///
    /// `tendons` is keyed by right-side (and right trunk) muscle name;
    /// `polynomials` by every name in [`WALKING_MUSCLES`], with spanned
    /// degrees of freedom named after the right-side polynomial joints.
    pub fn walking(
        config: &RunConfiguration,
        tendons: &MuscleTendonTable,
        polynomials: &PolynomialTable,
    ) -> Result<Self> {
        let with_mtp = config.with_mtp;
        let joint_names = without_mtp(WALKING_JOINTS, with_mtp);
        let joints = joint_names
            .iter()
            .map(|n| {
                if TRANSLATIONS.contains(&n.as_str()) {
                    Joint::translational(n.clone())
                } else {
                    Joint::rotational(n.clone())
                }
            })
            .collect::<Vec<_>>();

        // Muscles: left side mirrored from the right side, then right side.
        let n_all = WALKING_MUSCLES.len();
        let right_side: Vec<String> = WALKING_MUSCLES[..n_all - LEFT_TRUNK_MUSCLES.len()]
            .iter()
            .map(|n| (*n).to_string())
            .collect();
        let n_side = right_side.len();
        let mut side_muscles = Vec::with_capacity(n_side);
        for name in &right_side {
            let tendon = tendons
                .get(name)
                .copied()
                .ok_or_else(|| GaitError::missing_muscle(name.clone()))?;
            let sigma =
                data::specific_tension(name).ok_or_else(|| GaitError::missing_muscle(name.clone()))?;
            let ratio =
                data::slow_twitch_ratio(name).ok_or_else(|| GaitError::missing_muscle(name.clone()))?;
            let mut muscle = Muscle::new(name.clone(), tendon, sigma, ratio)?;
            if let Some(stiffness) = config.achilles_tendon_stiffness {
                if ACHILLES_MUSCLES.contains(&name.as_str()) {
                    muscle = muscle.with_tendon_stiffness(stiffness);
                }
            }
            side_muscles.push(muscle);
        }
        let muscles: Vec<Muscle> = side_muscles
            .iter()
            .map(|m| m.renamed(mirror_name(&m.name)))
            .chain(side_muscles.iter().cloned())
            .collect();

        // Polynomial geometry.
        let left_poly = without_mtp(LEFT_POLYNOMIAL_JOINTS, with_mtp);
        let right_poly = without_mtp(RIGHT_POLYNOMIAL_JOINTS, with_mtp);
        let rows = resolve_polynomials(WALKING_MUSCLES, polynomials, &right_poly)?;
        let right_rows = right_side
            .iter()
            .map(|m| polynomial_row(m))
            .collect::<Result<Vec<_>>>()?;
        let left_rows = right_side
            .iter()
            .filter(|m| !RIGHT_TRUNK_MUSCLES.contains(&m.as_str()))
            .map(|m| polynomial_row(m))
            .chain(LEFT_TRUNK_MUSCLES.iter().map(|m| polynomial_row(m)))
            .collect::<Result<Vec<_>>>()?;
        let trunk_rows = LEFT_TRUNK_MUSCLES
            .iter()
            .chain(RIGHT_TRUNK_MUSCLES)
            .map(|m| polynomial_row(m))
            .collect::<Result<Vec<_>>>()?;
        let geometry = MuscleGeometry {
            left: PolynomialSide {
                joints: indices(&joint_names, &left_poly)?,
                polynomials: rows.clone(),
                length_rows: left_rows,
            },
            right: PolynomialSide {
                joints: indices(&joint_names, &right_poly)?,
                polynomials: rows,
                length_rows: right_rows,
            },
        };

        // Limit torques.
        let passive_names = without_mtp(PASSIVE_TORQUE_JOINTS, with_mtp);
        let passive_joints = passive_names
            .iter()
            .map(|n| {
                let limits = data::limit_torque(n).ok_or_else(|| GaitError::missing_joint(n.clone()))?;
                Ok(PassiveJoint {
                    joint: position_of(&joint_names, n)?,
                    limits,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        // Muscle-driven joints and their moment arms.
        let arm_map = moment_arm_indices(&right_side, &left_poly, &right_poly, polynomials)?;
        let mut muscle_driven = Vec::with_capacity(MUSCLE_DRIVEN_JOINTS.len());
        for &name in MUSCLE_DRIVEN_JOINTS {
            let muscles_at = arm_map.get(name).cloned().unwrap_or_default();
            let (side, input, moment_arm_rows) = if TRUNK_JOINTS.contains(&name) {
                (Side::Left, position_of(&left_poly, name)?, trunk_rows.clone())
            } else if name.ends_with("_l") {
                (Side::Left, position_of(&left_poly, name)?, muscles_at.clone())
            } else {
                let rows = muscles_at.iter().map(|&i| i - n_side).collect();
                (Side::Right, position_of(&right_poly, name)?, rows)
            };
            let joint = position_of(&joint_names, name)?;
            let passive = passive_joints
                .iter()
                .position(|p| p.joint == joint)
                .ok_or_else(|| GaitError::missing_joint(name))?;
            muscle_driven.push(MuscleDrivenJoint {
                joint,
                side,
                input,
                moment_arm_rows,
                muscles: muscles_at,
                passive,
            });
        }

        let arm_names = owned(ARM_JOINTS);
        let periodic_arms = owned(PERIODIC_ARM_JOINTS);
        let qs_a = without_mtp(PERIODIC_QS_A, with_mtp);
        let qs_b = without_mtp(PERIODIC_QS_B, with_mtp);
        let mut qds_a = qs_a.clone();
        qds_a.insert(1, "pelvis_tx".into());
        let mut qds_b = qs_b.clone();
        qds_b.insert(1, "pelvis_tx".into());
        let periodicity = Periodicity {
            qs_a: indices(&joint_names, &qs_a)?,
            qs_b: indices(&joint_names, &qs_b)?,
            qds_a: indices(&joint_names, &qds_a)?,
            qds_b: indices(&joint_names, &qds_b)?,
            opposite: indices(&joint_names, &owned(PERIODIC_OPPOSITE))?,
            muscles: (n_side..2 * n_side).chain(0..n_side).collect(),
            arms: indices(&arm_names, &periodic_arms)?,
        };

        Self::from_parts(GaitModelParts {
            ground_pelvis_joints: indices(&joint_names, &owned(GROUND_PELVIS_JOINTS))?,
            pelvis: PelvisTranslations {
                forward: position_of(&joint_names, "pelvis_tx")?,
                vertical: Some(position_of(&joint_names, "pelvis_ty")?),
                lateral: Some(position_of(&joint_names, "pelvis_tz")?),
            },
            arm_joints: indices(&joint_names, &arm_names)?,
            mtp_joints: if with_mtp {
                indices(&joint_names, &owned(MTP_JOINTS))?
            } else {
                Vec::new()
            },
            joints,
            muscles,
            passive_joints,
            muscle_driven,
            geometry,
            periodicity,
            arm_passive: LinearPassiveParameters::new(0.0, 0.1),
            mtp_passive: LinearPassiveParameters::new(25.0, config.damping_mtp),
            collision_pairs: CollisionPair::walking_set(),
        })
    }

    /// A forward translation and one hinge driven by a single muscle.
    ///
    /// The hinge carries the hip-flexion limit torque; the muscle length is
    /// `0.3 + 0.02·q`, so its moment arm is `−0.02 m`. Both coordinates are
    /// periodic; the translation is an unactuated pelvis coordinate.
    pub fn toy_leg() -> Result<Self> {
        let tendon = MuscleTendonParameters {
            max_isometric_force: 1000.0,
            optimal_fiber_length: 0.1,
            tendon_slack_length: 0.2,
            optimal_pennation_angle: 0.0,
            max_contraction_velocity: 1.0,
        };
        let muscle = Muscle::new("hip_flexor", tendon, 0.6, 0.5)?;
        let limits = data::limit_torque("hip_flexion")
            .ok_or_else(|| GaitError::missing_joint("hip_flexion"))?;
        let entry = PolynomialCoefficients {
            dofs: vec!["hip_flexion".into()],
            order: 1,
            coefficients: vec![0.3, 0.02],
        };
        let polynomial = MusclePolynomial::resolve("hip_flexor", &entry, &["hip_flexion".to_string()])?;
        Self::from_parts(GaitModelParts {
            joints: vec![Joint::translational("pelvis_tx"), Joint::rotational("hip_flexion")],
            muscles: vec![muscle],
            ground_pelvis_joints: vec![0],
            pelvis: PelvisTranslations {
                forward: 0,
                vertical: None,
                lateral: None,
            },
            arm_joints: Vec::new(),
            mtp_joints: Vec::new(),
            passive_joints: vec![PassiveJoint { joint: 1, limits }],
            muscle_driven: vec![MuscleDrivenJoint {
                joint: 1,
                side: Side::Left,
                input: 0,
                moment_arm_rows: vec![0],
                muscles: vec![0],
                passive: 0,
            }],
            geometry: MuscleGeometry {
                left: PolynomialSide {
                    joints: vec![1],
                    polynomials: vec![polynomial],
                    length_rows: vec![0],
                },
                right: PolynomialSide {
                    joints: Vec::new(),
                    polynomials: Vec::new(),
                    length_rows: Vec::new(),
                },
            },
            periodicity: Periodicity {
                qs_a: vec![1],
                qs_b: vec![1],
                qds_a: vec![0, 1],
                qds_b: vec![0, 1],
                opposite: Vec::new(),
                muscles: vec![0],
                arms: Vec::new(),
            },
            arm_passive: LinearPassiveParameters::new(0.0, 0.1),
            mtp_passive: LinearPassiveParameters::new(25.0, 0.4),
            collision_pairs: CollisionPair::walking_set(),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::config::{CaseRecord, RunConfiguration};
    use crate::polynomial::monomial_count;

    /// Plausible spanning sets: trunk muscles span the lumbar joints, the
    /// rest span hip and knee, triceps surae span the ankle.
    fn synthetic_tables() -> (MuscleTendonTable, PolynomialTable) {
        let mut tendons = MuscleTendonTable::new();
        let mut polys = PolynomialTable::new();
        for &name in WALKING_MUSCLES {
            if !name.ends_with("_l") {
                tendons.insert(
                    name.to_string(),
                    MuscleTendonParameters::new(500.0, 0.1, 0.2, 0.1),
                );
            }
            let dofs: Vec<String> = if name.starts_with("ercspn")
                || name.starts_with("intobl")
                || name.starts_with("extobl")
            {
                TRUNK_JOINTS.iter().map(|s| (*s).to_string()).collect()
            } else if ACHILLES_MUSCLES.contains(&name) {
                vec!["ankle_angle_r".into()]
            } else {
                vec!["hip_flexion_r".into(), "knee_angle_r".into()]
            };
            let order = 2;
            let coefficients = vec![0.01; monomial_count(dofs.len(), order)];
            polys.insert(
                name.to_string(),
                PolynomialCoefficients {
                    dofs,
                    order,
                    coefficients,
                },
            );
        }
        (tendons, polys)
    }

    fn config(with_mtp: bool, achilles: Option<f64>) -> RunConfiguration {
        RunConfiguration::from_record(
            "test",
            &CaseRecord {
                model_mass: Some(62.0),
                with_mtp: Some(with_mtp),
                adjust_achilles_tendon_stiffness: achilles.map(|_| true),
                achilles_tendon_stiffness: achilles,
                ..CaseRecord::default()
            },
        )
        .unwrap()
    }

    #[test]
    fn test_walking_model_dimensions() {
        let (tendons, polys) = synthetic_tables();
        let model = GaitModel::walking(&config(true, None), &tendons, &polys).unwrap();
        assert_eq!(model.n_joints(), 31);
        assert_eq!(model.n_muscles(), 92);
        assert_eq!(model.n_arms(), 8);
        assert_eq!(model.passive_joints.len(), 17);
        assert_eq!(model.muscle_driven.len(), 15);
        assert_eq!(model.muscle_names()[0], "glut_med1_l");
        assert_eq!(model.muscle_names()[43], "ercspn_l");
        assert_eq!(model.muscle_names()[46], "glut_med1_r");
        assert_eq!(model.periodicity.qs_a.len(), 25);
        assert_eq!(model.periodicity.qds_a.len(), 26);
        assert_eq!(model.periodicity.arms, vec![3, 4, 5, 0, 1, 2, 7, 6]);
        assert_eq!(model.periodicity.muscles[0], 46);
        assert_eq!(model.periodicity.muscles[46], 0);
    }

    #[test]
    fn test_walking_model_without_mtp() {
        let (tendons, polys) = synthetic_tables();
        let model = GaitModel::walking(&config(false, None), &tendons, &polys).unwrap();
        assert_eq!(model.n_joints(), 29);
        assert!(model.mtp_joints.is_empty());
        assert_eq!(model.passive_joints.len(), 15);
        assert_eq!(model.geometry.left.joints.len(), 9);
        assert!(model.joint_registry().get("mtp_angle_l").is_none());
    }

    #[test]
    fn test_polynomial_rows_pick_side_muscles() {
        let (tendons, polys) = synthetic_tables();
        let model = GaitModel::walking(&config(true, None), &tendons, &polys).unwrap();
        let left = &model.geometry.left.length_rows;
        assert_eq!(left.len(), 46);
        assert_eq!(&left[43..], &[46, 47, 48]);
        let right = &model.geometry.right.length_rows;
        assert_eq!(*right, (0..46).collect::<Vec<_>>());
    }

    #[test]
    fn test_moment_arm_indices() {
        let (tendons, polys) = synthetic_tables();
        let model = GaitModel::walking(&config(true, None), &tendons, &polys).unwrap();
        let knee_r = model.joint_index("knee_angle_r").unwrap();
        let knee = model
            .muscle_driven
            .iter()
            .find(|m| m.joint == knee_r)
            .unwrap();
        assert_eq!(knee.side, Side::Right);
        // right-side muscle indices shifted back into polynomial rows
        assert!(knee.muscles.iter().all(|&m| m >= 46));
        assert_eq!(
            knee.moment_arm_rows,
            knee.muscles.iter().map(|m| m - 46).collect::<Vec<_>>()
        );

        let lumbar = model.joint_index("lumbar_bending").unwrap();
        let trunk = model
            .muscle_driven
            .iter()
            .find(|m| m.joint == lumbar)
            .unwrap();
        assert_eq!(trunk.side, Side::Left);
        assert_eq!(trunk.muscles, vec![43, 44, 45, 89, 90, 91]);
        assert_eq!(trunk.moment_arm_rows, vec![46, 47, 48, 43, 44, 45]);
    }

    #[test]
    fn test_achilles_adjustment_applies_to_both_sides() {
        let (tendons, polys) = synthetic_tables();
        let model = GaitModel::walking(&config(true, Some(20.0)), &tendons, &polys).unwrap();
        let registry = model.muscle_registry();
        for name in ["soleus_r", "soleus_l", "med_gas_l", "lat_gas_r"] {
            let m = &model.muscles[registry.get(name).unwrap()];
            assert!((m.tendon_stiffness - 20.0).abs() < 1e-12, "{name}");
        }
        let tib = &model.muscles[registry.get("tib_ant_r").unwrap()];
        assert!((tib.tendon_stiffness - 35.0).abs() < 1e-12);
    }

    #[test]
    fn test_missing_parameters_reported() {
        let (mut tendons, polys) = synthetic_tables();
        tendons.remove("soleus_r");
        let err = GaitModel::walking(&config(true, None), &tendons, &polys).unwrap_err();
        assert!(matches!(err, GaitError::MissingMuscle { ref name } if name == "soleus_r"));
    }

    #[test]
    fn test_toy_leg_is_consistent() {
        let model = GaitModel::toy_leg().unwrap();
        assert_eq!(model.n_joints(), 2);
        assert_eq!(model.n_muscles(), 1);
        assert_eq!(model.non_arm_joints(), vec![0, 1]);
        assert_eq!(model.rotational_joints(), vec![1]);
        assert_eq!(model.passive_slot(1), Some(0));
    }
}
