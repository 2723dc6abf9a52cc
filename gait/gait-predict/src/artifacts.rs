//! Persisted results.
//!
//! ```text
//! <root>/
//! ├── optimaltrajectories.json     one record per case id
//! └── Case_<id>/
//!     ├── w_opt.json               raw decision vector
//!     ├── stats.json               solver statistics
//!     ├── motion.mot               joint angles and activations
//!     └── GRF.mot                  ground reactions, COP, free torques
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use gait_nlp::SolverStats;
use gait_types::{GaitModel, MotionTable, Result, RunConfiguration, Side};
use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::cycle::{rotations_in_degrees, GaitCycle};
use crate::decomposition::CostDecomposition;
use crate::heel_strike::CONTACT_THRESHOLD;
use crate::metrics::{CycleMetrics, FootContact};

/// Raw decision vector.
pub const SOLUTION_FILE: &str = "w_opt.json";
/// Solver statistics.
pub const STATS_FILE: &str = "stats.json";
/// Aggregate of every analyzed case.
pub const TRAJECTORIES_FILE: &str = "optimaltrajectories.json";
/// Motion for playback.
pub const MOTION_FILE: &str = "motion.mot";
/// Ground reactions for playback.
pub const GRF_FILE: &str = "GRF.mot";

/// Ground reaction labels of the aggregate record.
pub const GRF_LABELS: [&str; 6] = ["GRF_x_r", "GRF_y_r", "GRF_z_r", "GRF_x_l", "GRF_y_l", "GRF_z_l"];

/// Where and what to write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactOptions {
    /// Directory holding the case directories and the aggregate.
    pub root: PathBuf,
    /// Write `motion.mot` and `GRF.mot`.
    pub write_motion_files: bool,
    /// Add the case to `optimaltrajectories.json`.
    pub save_trajectories: bool,
}

impl ArtifactOptions {
    /// Write everything under `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            write_motion_files: true,
            save_trajectories: true,
        }
    }

    /// Path of the aggregate store.
    #[must_use]
    pub fn trajectories_path(&self) -> PathBuf {
        self.root.join(TRAJECTORIES_FILE)
    }
}

/// The directory of one case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaseDirectory {
    path: PathBuf,
}

impl CaseDirectory {
    /// The directory of `config` under `root`, created if missing.
    pub fn create(root: &Path, config: &RunConfiguration) -> Result<Self> {
        let path = root.join(config.case_directory());
        fs::create_dir_all(&path)?;
        Ok(Self { path })
    }

    /// The directory of `config` under `root`, which must exist.
    #[must_use]
    pub fn open(root: &Path, config: &RunConfiguration) -> Self {
        Self {
            path: root.join(config.case_directory()),
        }
    }

    /// Directory path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Persist the raw solution and its statistics.
    pub fn save_solution(&self, x: &[f64], stats: &SolverStats) -> Result<()> {
        fs::write(self.path.join(SOLUTION_FILE), serde_json::to_string(x)?)?;
        fs::write(self.path.join(STATS_FILE), serde_json::to_string_pretty(stats)?)?;
        debug!(dir = %self.path.display(), "saved raw solution");
        Ok(())
    }

    /// Load a solution written by [`save_solution`](Self::save_solution).
    pub fn load_solution(&self) -> Result<(Vec<f64>, SolverStats)> {
        let x = serde_json::from_str(&fs::read_to_string(self.path.join(SOLUTION_FILE))?)?;
        let stats = serde_json::from_str(&fs::read_to_string(self.path.join(STATS_FILE))?)?;
        Ok((x, stats))
    }

    /// Write the motion and ground-reaction files of a cycle.
    pub fn write_motion_files(&self, model: &GaitModel, cycle: &GaitCycle, metrics: &CycleMetrics) -> Result<()> {
        motion_table(model, cycle)?.write(self.path.join(MOTION_FILE))?;
        grf_table(cycle, metrics)?.write(self.path.join(GRF_FILE))?;
        debug!(dir = %self.path.display(), "wrote motion files");
        Ok(())
    }
}

fn rows_of(matrix: &DMatrix<f64>) -> Vec<Vec<f64>> {
    matrix
        .row_iter()
        .map(|r| r.iter().copied().collect())
        .collect()
}

fn names(model: &GaitModel, joints: &[usize]) -> Vec<String> {
    joints
        .iter()
        .map(|&j| model.joint_names()[j].clone())
        .collect()
}

/// One case of the aggregate store. Matrices are stored row by row with
/// one column per sample; rotations in degrees.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrajectoryRecord {
    /// Joint positions.
    pub coordinate_values: Vec<Vec<f64>>,
    /// Joint velocities.
    pub coordinate_speeds: Vec<Vec<f64>>,
    /// Joint accelerations.
    pub coordinate_accelerations: Vec<Vec<f64>>,
    /// Muscle activations.
    pub muscle_activations: Vec<Vec<f64>>,
    /// Arm activations scaled to torques (N·m).
    pub arm_activations: Vec<Vec<f64>>,
    /// Generalized forces.
    pub joint_torques: Vec<Vec<f64>>,
    /// Ground reaction forces.
    #[serde(rename = "GRF")]
    pub grf: Vec<Vec<f64>>,
    /// Sample times.
    pub time: Vec<f64>,
    /// Normalized fiber lengths.
    pub norm_fiber_lengths: Vec<Vec<f64>>,
    /// Fiber velocities.
    pub fiber_velocity: Vec<Vec<f64>>,
    /// Joint names.
    pub joints: Vec<String>,
    /// Muscle names.
    pub muscles: Vec<String>,
    /// MTP joint names.
    pub mtp_joints: Vec<String>,
    /// Row labels of `GRF`.
    #[serde(rename = "GRF_labels")]
    pub grf_labels: Vec<String>,
    /// Cost of transport.
    #[serde(rename = "COT")]
    pub cot: f64,
    /// Cost of transport per muscle.
    #[serde(rename = "COT_perMuscle")]
    pub cot_per_muscle: Vec<f64>,
    /// Percent of the gait cycle at each sample.
    #[serde(rename = "GC_percent")]
    pub gc_percent: Vec<f64>,
    /// Final objective reported by the solver.
    pub objective: f64,
    /// Objective decomposition.
    pub objective_terms: CostDecomposition,
    /// Solver iterations.
    pub iter_count: usize,
    /// Stride length (m).
    pub stride_length: f64,
}

impl TrajectoryRecord {
    /// Record of an analyzed cycle.
    #[must_use]
    pub fn new(
        model: &GaitModel,
        cycle: &GaitCycle,
        metrics: &CycleMetrics,
        decomposition: &CostDecomposition,
        stats: &SolverStats,
    ) -> Self {
        let samples = cycle.n_samples();
        let gc_percent = (0..samples)
            .map(|k| {
                if samples > 1 {
                    1.0 + 99.0 * k as f64 / (samples - 1) as f64
                } else {
                    1.0
                }
            })
            .collect();
        Self {
            coordinate_values: rows_of(&rotations_in_degrees(model, &cycle.position)),
            coordinate_speeds: rows_of(&rotations_in_degrees(model, &cycle.velocity)),
            coordinate_accelerations: rows_of(&rotations_in_degrees(model, &cycle.acceleration)),
            muscle_activations: rows_of(&cycle.activation),
            arm_activations: rows_of(&(&cycle.arm_activation * model.arm_torque_scale)),
            joint_torques: rows_of(&metrics.reactions.torques),
            grf: rows_of(&metrics.reactions.grf),
            time: cycle.time.clone(),
            norm_fiber_lengths: rows_of(&metrics.muscles.normalized_fiber_length),
            fiber_velocity: rows_of(&metrics.muscles.fiber_velocity),
            joints: model.joint_names().to_vec(),
            muscles: model.muscle_names().to_vec(),
            mtp_joints: names(model, &model.mtp_joints),
            grf_labels: GRF_LABELS.iter().map(|s| (*s).to_string()).collect(),
            cot: metrics.cost_of_transport.total,
            cot_per_muscle: metrics.cost_of_transport.per_muscle.clone(),
            gc_percent,
            objective: stats.iterations.obj.last().copied().unwrap_or(f64::NAN),
            objective_terms: *decomposition,
            iter_count: stats.iter_count,
            stride_length: metrics.stride_length,
        }
    }
}

/// The aggregate store, keyed by case id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrajectoryStore {
    /// Records by case id.
    pub cases: BTreeMap<String, TrajectoryRecord>,
}

impl TrajectoryStore {
    /// Load the store at `path`; a missing file is an empty store.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        Ok(serde_json::from_str(&fs::read_to_string(path)?)?)
    }

    /// Write the store to `path`.
    pub fn save(&self, path: &Path) -> Result<()> {
        fs::write(path, serde_json::to_string(self)?)?;
        Ok(())
    }

    /// Insert or replace the record of `case_id` in the store at `path`.
    pub fn update(path: &Path, case_id: &str, record: TrajectoryRecord) -> Result<()> {
        let mut store = Self::load(path)?;
        store.cases.insert(case_id.to_string(), record);
        store.save(path)?;
        info!(case = case_id, cases = store.cases.len(), "updated trajectory store");
        Ok(())
    }
}

/// Time, joint positions (rotations in degrees) and muscle activations.
pub fn motion_table(model: &GaitModel, cycle: &GaitCycle) -> Result<MotionTable> {
    let mut labels = vec!["time".to_string()];
    labels.extend(model.joint_names().iter().cloned());
    labels.extend(model.muscle_names().iter().map(|m| format!("{m}/activation")));
    let mut table = MotionTable::new(MOTION_FILE, labels).with_degrees(true);
    let positions = rotations_in_degrees(model, &cycle.position);
    for (k, &t) in cycle.time.iter().enumerate() {
        let mut row = vec![t];
        row.extend(positions.column(k).iter());
        row.extend(cycle.activation.column(k).iter());
        table.push_row(row)?;
    }
    Ok(table)
}

/// Forces and centers of pressure of both feet, then free torques; swing
/// samples are zero.
pub fn grf_table(cycle: &GaitCycle, metrics: &CycleMetrics) -> Result<MotionTable> {
    let mut labels = vec!["time".to_string()];
    for side in [Side::Right, Side::Left] {
        let s = side.suffix();
        for axis in ["x", "y", "z"] {
            labels.push(format!("{s}_ground_force_v{axis}"));
        }
        for axis in ["x", "y", "z"] {
            labels.push(format!("{s}_ground_force_p{axis}"));
        }
    }
    for side in [Side::Right, Side::Left] {
        for axis in ["x", "y", "z"] {
            labels.push(format!("{}_ground_torque_{axis}", side.suffix()));
        }
    }
    let feet: Vec<FootContact> = [Side::Right, Side::Left]
        .into_iter()
        .map(|side| metrics.reactions.contact(side, CONTACT_THRESHOLD))
        .collect();
    let mut table = MotionTable::new(GRF_FILE, labels);
    for (k, &t) in cycle.time.iter().enumerate() {
        let mut row = vec![t];
        for foot in &feet {
            row.extend(foot.force.column(k).iter());
            row.extend(foot.center_of_pressure.column(k).iter());
        }
        for foot in &feet {
            row.extend(foot.free_torque.column(k).iter());
        }
        table.push_row(row)?;
    }
    Ok(table)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use gait_types::CaseRecord;

    fn stats() -> SolverStats {
        serde_json::from_str(
            r#"{"success":true,"return_status":"Solve_Succeeded","iter_count":2,
                "iterations":{"obj":[3.0,2.5],"inf_pr":[1.0,1e-9]}}"#,
        )
        .unwrap()
    }

    fn config(id: &str) -> RunConfiguration {
        let record = CaseRecord {
            model_mass: Some(62.0),
            ..CaseRecord::default()
        };
        RunConfiguration::from_record(id, &record).unwrap()
    }

    #[test]
    fn test_solution_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let case = CaseDirectory::create(dir.path(), &config("7")).unwrap();
        assert!(case.path().ends_with("Case_7"));
        case.save_solution(&[0.5, -1.0, 2.0], &stats()).unwrap();
        let (x, loaded) = CaseDirectory::open(dir.path(), &config("7")).load_solution().unwrap();
        assert_eq!(x, vec![0.5, -1.0, 2.0]);
        assert_eq!(loaded, stats());
    }

    #[test]
    fn test_missing_store_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = TrajectoryStore::load(&dir.path().join(TRAJECTORIES_FILE)).unwrap();
        assert!(store.cases.is_empty());
    }

    #[test]
    fn test_rows_of() {
        let m = DMatrix::from_row_slice(2, 3, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        assert_eq!(rows_of(&m), vec![vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]]);
    }
}
