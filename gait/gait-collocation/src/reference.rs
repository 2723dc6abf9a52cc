//! Reference motion: one spline per model joint.

use gait_types::{GaitError, GaitModel, MotionTable, Result};
use nalgebra::DMatrix;

use crate::spline::CubicSpline;

/// Reference kinematics in model joint order.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceMotion {
    time: Vec<f64>,
    splines: Vec<CubicSpline>,
}

/// Kinematics sampled on a time grid, `n_joints × n_samples` each.
#[derive(Debug, Clone, PartialEq)]
pub struct KinematicSamples {
    /// Sample times (s).
    pub time: Vec<f64>,
    /// Positions.
    pub positions: DMatrix<f64>,
    /// Velocities.
    pub velocities: DMatrix<f64>,
    /// Accelerations.
    pub accelerations: DMatrix<f64>,
}

impl ReferenceMotion {
    /// Fit every model joint from `table`.
    ///
    /// Angular columns of a table stored in degrees are converted first.
    pub fn from_table(table: &MotionTable, model: &GaitModel) -> Result<Self> {
        let mut table = table.clone();
        table.convert_to_radians(|label| {
            model
                .joint_index(label)
                .is_ok_and(|j| model.joints[j].kind.is_rotational())
        });
        let time = table.time();
        let splines = model
            .joints
            .iter()
            .map(|joint| {
                let values = table
                    .column(&joint.name)
                    .ok_or_else(|| GaitError::missing_joint(joint.name.clone()))?;
                CubicSpline::new(&time, &values)
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { time, splines })
    }

    /// Time stamps of the source table.
    #[must_use]
    pub fn time(&self) -> &[f64] {
        &self.time
    }

    /// Spline of `joint`.
    #[must_use]
    pub fn spline(&self, joint: usize) -> &CubicSpline {
        &self.splines[joint]
    }

    /// Number of joints.
    #[must_use]
    pub fn n_joints(&self) -> usize {
        self.splines.len()
    }

    /// Kinematics at `time`.
    #[must_use]
    pub fn sample(&self, time: &[f64]) -> KinematicSamples {
        let n = self.splines.len();
        let m = time.len();
        let eval = |f: fn(&CubicSpline, f64) -> f64| {
            DMatrix::from_fn(n, m, |j, k| f(&self.splines[j], time[k]))
        };
        KinematicSamples {
            time: time.to_vec(),
            positions: eval(CubicSpline::value),
            velocities: eval(CubicSpline::derivative),
            accelerations: eval(CubicSpline::second_derivative),
        }
    }

    /// Kinematics at the source time stamps.
    #[must_use]
    pub fn at_knots(&self) -> KinematicSamples {
        self.sample(&self.time)
    }

    /// Kinematics at `n` evenly spaced times spanning the source table.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn resample(&self, n: usize) -> KinematicSamples {
        let t0 = self.time.first().copied().unwrap_or(0.0);
        let t1 = self.time.last().copied().unwrap_or(0.0);
        let step = if n > 1 { (t1 - t0) / (n - 1) as f64 } else { 0.0 };
        let grid: Vec<f64> = (0..n).map(|k| t0 + step * k as f64).collect();
        self.sample(&grid)
    }
}
