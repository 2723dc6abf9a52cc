//! Initial guesses.
//!
//! Both generators produce scaled kinematics at the mesh points; the shared
//! [`InitialGuess::trajectory`] adds constant muscle and arm guesses and
//! copies each interval's start value to all of its collocation points.

use gait_types::{mirror_name, GaitError, GaitModel, GuessType, PelvisTranslations, Result};
use nalgebra::DMatrix;
use tracing::debug;

use crate::bounds::Scaling;
use crate::reference::ReferenceMotion;
use crate::variables::{Dimensions, Family, Trajectory};

/// Speeds of the final-time lookup table (m/s).
const TABLE_SPEEDS: (f64, f64) = (0.73, 2.73);
/// Final times of the lookup table (s).
const TABLE_TIMES: (f64, f64) = (0.70, 0.35);
/// Table entries.
const TABLE_LEN: usize = 21;

/// Nominal pelvis height of the heuristic guess (m).
pub const PELVIS_HEIGHT: f64 = 0.9385;

/// Default muscle activation and normalized force.
const MUSCLE_STATE: f64 = 0.1;
/// Default activation and force rates.
const MUSCLE_RATE: f64 = 0.01;
/// Default arm activation and excitation.
const ARM_STATE: f64 = 0.1;

/// Half-cycle duration for `target_speed`, interpolated linearly in the
/// lookup table and held constant beyond its ends.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn guess_final_time(target_speed: f64) -> f64 {
    let (v0, v1) = TABLE_SPEEDS;
    let (t0, t1) = TABLE_TIMES;
    let step = (v1 - v0) / (TABLE_LEN - 1) as f64;
    let position = ((target_speed - v0) / step).clamp(0.0, (TABLE_LEN - 1) as f64);
    t0 + (t1 - t0) * position / (TABLE_LEN - 1) as f64
}

/// Scaled kinematics at the mesh points.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshKinematics {
    /// Positions, `n_joints × (N + 1)`.
    pub positions: DMatrix<f64>,
    /// Velocities, `n_joints × (N + 1)`.
    pub velocities: DMatrix<f64>,
    /// Accelerations, `n_joints × N`.
    pub accelerations: DMatrix<f64>,
}

/// An initial guess generator.
pub trait InitialGuess {
    /// Guessed final time (s).
    fn final_time(&self) -> f64;

    /// Scaled kinematics at the mesh points.
    fn kinematics(&self, scaling: &Scaling) -> Result<MeshKinematics>;

    /// Full scaled trajectory for every decision-variable family.
    fn trajectory(&self, dims: &Dimensions, scaling: &Scaling) -> Result<Trajectory> {
        let kin = self.kinematics(scaling)?;
        let mut t = Trajectory::zeros(dims);
        t[Family::FinalTime][(0, 0)] = self.final_time();

        for f in [Family::Activation, Family::ActivationCol] {
            fill(&mut t[f], MUSCLE_STATE, &scaling.activation);
        }
        for f in [Family::Force, Family::ForceCol] {
            fill(&mut t[f], MUSCLE_STATE, &scaling.force);
        }
        fill(&mut t[Family::ActivationRate], MUSCLE_RATE, &scaling.activation_rate);
        fill(&mut t[Family::ForceRateCol], MUSCLE_RATE, &scaling.force_rate);
        for f in [
            Family::ArmActivation,
            Family::ArmActivationCol,
            Family::ArmExcitation,
        ] {
            t[f].fill(ARM_STATE);
        }

        t[Family::Position].copy_from(&kin.positions);
        t[Family::Velocity].copy_from(&kin.velocities);
        t[Family::PositionCol] = replicate(&kin.positions, dims);
        t[Family::VelocityCol] = replicate(&kin.velocities, dims);
        t[Family::AccelerationCol] = replicate(&kin.accelerations, dims);
        debug!(
            final_time = self.final_time(),
            "initial guess for {} intervals",
            dims.n_intervals
        );
        Ok(t)
    }
}

/// Set row `i` of `m` to `value / scale[i]`.
fn fill(m: &mut DMatrix<f64>, value: f64, scale: &[f64]) {
    for (i, mut row) in m.row_iter_mut().enumerate() {
        row.fill(value / scale[i]);
    }
}

/// Divide row `i` of `m` by `scale[i]`, keeping the first `cols` columns and
/// padding with zeros.
fn scale_rows(m: &DMatrix<f64>, scale: &[f64], cols: usize) -> DMatrix<f64> {
    DMatrix::from_fn(m.nrows(), cols, |i, k| {
        if k < m.ncols() {
            m[(i, k)] / scale[i]
        } else {
            0.0
        }
    })
}

/// Copy column `k` of a mesh matrix to collocation nodes `k·d .. k·d + d`.
fn replicate(mesh: &DMatrix<f64>, dims: &Dimensions) -> DMatrix<f64> {
    let d = dims.degree;
    DMatrix::from_fn(mesh.nrows(), dims.n_collocation(), |i, c| mesh[(i, c / d)])
}

/// Guess independent of reference data: standing still except for a
/// forward ramp at the target speed.
#[derive(Debug, Clone, PartialEq)]
pub struct HeuristicGuess {
    n_joints: usize,
    pelvis: PelvisTranslations,
    n_intervals: usize,
    target_speed: f64,
}

impl HeuristicGuess {
    /// Guess for `model` on `n_intervals` mesh intervals.
    #[must_use]
    pub fn new(model: &GaitModel, n_intervals: usize, target_speed: f64) -> Self {
        Self {
            n_joints: model.n_joints(),
            pelvis: model.pelvis,
            n_intervals,
            target_speed,
        }
    }
}

impl InitialGuess for HeuristicGuess {
    fn final_time(&self) -> f64 {
        guess_final_time(self.target_speed)
    }

    #[allow(clippy::cast_precision_loss)]
    fn kinematics(&self, scaling: &Scaling) -> Result<MeshKinematics> {
        let n = self.n_intervals;
        let nj = self.n_joints;
        let mut positions = DMatrix::zeros(nj, n + 1);
        let mut velocities = DMatrix::zeros(nj, n + 1);

        // N evenly spaced points over the half cycle, then one more step
        let distance = self.final_time() * self.target_speed;
        let step = if n > 1 { distance / (n - 1) as f64 } else { distance };
        let tx = self.pelvis.forward;
        for k in 0..=n {
            positions[(tx, k)] = step * k as f64 / scaling.position[tx];
            velocities[(tx, k)] = self.target_speed / scaling.velocity[tx];
        }
        if let Some(ty) = self.pelvis.vertical {
            positions.row_mut(ty).fill(PELVIS_HEIGHT / scaling.position[ty]);
        }
        Ok(MeshKinematics {
            positions,
            velocities,
            accelerations: DMatrix::zeros(nj, n),
        })
    }
}

/// Guess from a reference motion resampled on the mesh.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceGuess<'a> {
    model: &'a GaitModel,
    reference: &'a ReferenceMotion,
    n_intervals: usize,
    target_speed: f64,
}

impl<'a> ReferenceGuess<'a> {
    /// Guess for `model` from `reference`.
    #[must_use]
    pub fn new(
        model: &'a GaitModel,
        reference: &'a ReferenceMotion,
        n_intervals: usize,
        target_speed: f64,
    ) -> Self {
        Self {
            model,
            reference,
            n_intervals,
            target_speed,
        }
    }

    /// Value of joint `j` at the last mesh node from the first one: joints of
    /// the periodic set take their mirror's value, opposite joints flip sign.
    fn wrap_around(&self, values: &DMatrix<f64>, periodic: &[usize], j: usize) -> Option<f64> {
        let model = self.model;
        if periodic.contains(&j) {
            let mirror = mirror_name(&model.joints[j].name);
            let source = model.joint_registry().get(&mirror).unwrap_or(j);
            Some(values[(source, 0)])
        } else if model.periodicity.opposite.contains(&j) {
            Some(-values[(j, 0)])
        } else {
            None
        }
    }
}

impl InitialGuess for ReferenceGuess<'_> {
    fn final_time(&self) -> f64 {
        guess_final_time(self.target_speed)
    }

    fn kinematics(&self, scaling: &Scaling) -> Result<MeshKinematics> {
        let n = self.n_intervals;
        if n == 0 {
            return Err(GaitError::configuration("the mesh needs at least one interval"));
        }
        let samples = self.reference.resample(n);
        let nj = self.model.n_joints();
        let mut positions = scale_rows(&samples.positions, &scaling.position, n + 1);
        let mut velocities = scale_rows(&samples.velocities, &scaling.velocity, n + 1);
        let accelerations = scale_rows(&samples.accelerations, &scaling.acceleration, n);

        let periodicity = &self.model.periodicity;
        for j in 0..nj {
            positions[(j, n)] = self
                .wrap_around(&positions, &periodicity.qs_a, j)
                .unwrap_or(positions[(j, n - 1)]);
            velocities[(j, n)] = self
                .wrap_around(&velocities, &periodicity.qds_a, j)
                .unwrap_or(velocities[(j, n - 1)]);
        }

        // forward translation: extrapolate one step, then start at zero
        let tx = self.model.pelvis.forward;
        let dx = if n >= 2 {
            positions[(tx, n - 1)] - positions[(tx, n - 2)]
        } else {
            0.0
        };
        positions[(tx, n)] = positions[(tx, n - 1)] + dx;
        let start = positions[(tx, 0)];
        positions.row_mut(tx).add_scalar_mut(-start);

        Ok(MeshKinematics {
            positions,
            velocities,
            accelerations,
        })
    }
}

/// The generator selected by `guess_type`.
#[must_use]
pub fn initial_guess<'a>(
    guess_type: GuessType,
    model: &'a GaitModel,
    reference: &'a ReferenceMotion,
    n_intervals: usize,
    target_speed: f64,
) -> Box<dyn InitialGuess + 'a> {
    match guess_type {
        GuessType::ColdStart => Box::new(HeuristicGuess::new(model, n_intervals, target_speed)),
        GuessType::HotStart => Box::new(ReferenceGuess::new(
            model,
            reference,
            n_intervals,
            target_speed,
        )),
    }
}
