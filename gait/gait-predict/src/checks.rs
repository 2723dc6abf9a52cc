//! Post-solve physical sanity checks.
//!
//! Every check is a largest-absolute-residual test against `10^-tol`. When
//! the solver converged a violation is fatal; otherwise it is logged and
//! the analysis continues.

use gait_collocation::{dynamics_input, Biophysics, DynamicsEvaluator};
use gait_types::{GaitError, GaitModel, Result, Side};
use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::mesh::MeshSolution;

/// Tolerance test that fails only for converged solutions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResidualGate {
    /// Largest admissible absolute residual.
    pub tolerance: f64,
    /// Whether a violation is an error.
    pub strict: bool,
}

impl ResidualGate {
    /// Gate for a solve that did or did not converge.
    #[must_use]
    pub const fn new(tolerance: f64, converged: bool) -> Self {
        Self {
            tolerance,
            strict: converged,
        }
    }

    /// Largest absolute value of `residuals`, checked against the tolerance.
    ///
    /// NaN counts as an infinite residual.
    pub fn check(&self, quantity: &str, residuals: impl IntoIterator<Item = f64>) -> Result<f64> {
        let worst = residuals.into_iter().fold(0.0_f64, |worst, r| {
            if r.is_nan() {
                f64::INFINITY
            } else {
                worst.max(r.abs())
            }
        });
        if worst <= self.tolerance {
            debug!(quantity, residual = worst, "residual within tolerance");
            return Ok(worst);
        }
        if self.strict {
            return Err(GaitError::residual(quantity, worst, self.tolerance));
        }
        warn!(
            quantity,
            residual = worst,
            tolerance = self.tolerance,
            "residual exceeds tolerance on an unconverged solution"
        );
        Ok(worst)
    }
}

/// Largest residual of each check.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ResidualReport {
    /// Average speed minus target speed.
    pub speed: f64,
    /// Arm torque balance at the mesh points.
    pub arm_balance: f64,
    /// MTP torque balance at the mesh points.
    pub mtp_balance: f64,
    /// Hill equilibrium over the full cycle.
    pub hill_equilibrium: f64,
}

/// Post-processing dynamics outputs at mesh points `1..=N`, one column each.
pub fn mesh_dynamics(dynamics: &dyn DynamicsEvaluator, mesh: &MeshSolution) -> Result<DMatrix<f64>> {
    let n = mesh.n_intervals();
    let rows = dynamics.layout().output_len(dynamics.variant());
    let mut outputs = DMatrix::zeros(rows, n);
    for k in 0..n {
        let (q, qd, qdd) = mesh.kinematics_at(k + 1);
        let out = dynamics.evaluate(&dynamics_input(&q, &qd, &qdd))?;
        if out.len() != rows {
            return Err(GaitError::consistency(format!(
                "dynamics evaluator returned {} outputs, expected {rows}",
                out.len()
            )));
        }
        outputs.set_column(k, &DVector::from_vec(out));
    }
    Ok(outputs)
}

/// Vertical ground reaction force under one foot, per column of `outputs`.
#[must_use]
pub fn vertical_grf(model: &GaitModel, outputs: &DMatrix<f64>, side: Side) -> Vec<f64> {
    let row = model.dynamics.grf(side).start + 1;
    outputs.row(row).iter().copied().collect()
}

/// Arm and MTP torque-balance residuals at mesh points `1..=N`.
///
/// Arms: `(τ − τ_lin)/s_arm − a_arm`; MTPs: `(τ − τ_lin − τ_lim)/s_mtp`.
#[must_use]
pub fn actuator_balance(
    model: &GaitModel,
    biophysics: &Biophysics,
    mesh: &MeshSolution,
    outputs: &DMatrix<f64>,
) -> (Vec<f64>, Vec<f64>) {
    let mut arm = Vec::with_capacity(model.n_arms() * outputs.ncols());
    let mut mtp = Vec::with_capacity(model.mtp_joints.len() * outputs.ncols());
    for k in 0..outputs.ncols() {
        let (q, qd, _) = mesh.kinematics_at(k + 1);
        let linear = biophysics.arm_passive_torques(&q, &qd);
        for (i, &joint) in model.arm_joints.iter().enumerate() {
            arm.push(
                (outputs[(joint, k)] - linear[i]) / model.arm_torque_scale
                    - mesh.arm_activation[(i, k + 1)],
            );
        }
        let passive = biophysics.passive_torques(&q, &qd);
        let total = biophysics.mtp_total_passive(&passive, &biophysics.mtp_passive_torques(&q, &qd));
        for (i, &joint) in model.mtp_joints.iter().enumerate() {
            mtp.push((outputs[(joint, k)] - total[i]) / model.mtp_torque_scale);
        }
    }
    (arm, mtp)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use gait_collocation::{Dimensions, Family, LinearDynamics, Trajectory};
    use gait_types::DynamicsVariant;

    #[test]
    fn test_strict_gate_fails() {
        let gate = ResidualGate::new(1e-4, true);
        assert_eq!(gate.check("speed", [1e-5, -2e-5]).unwrap(), 2e-5);
        let err = gate.check("speed", [1e-5, -2e-3]).unwrap_err();
        assert!(err.is_residual_error());
        assert!(gate.check("speed", [f64::NAN]).is_err());
    }

    #[test]
    fn test_lenient_gate_reports() {
        let gate = ResidualGate::new(1e-4, false);
        assert_eq!(gate.check("hill", [0.5, -0.75]).unwrap(), 0.75);
        assert_eq!(gate.check("hill", std::iter::empty()).unwrap(), 0.0);
    }

    fn toy_mesh() -> (GaitModel, MeshSolution) {
        let model = GaitModel::toy_leg().unwrap();
        let dims = Dimensions::new(&model, 3, 2);
        let mut t = Trajectory::zeros(&dims);
        t[Family::FinalTime][(0, 0)] = 0.6;
        for k in 0..=3 {
            t[Family::Position][(0, k)] = 0.2 * k as f64;
            t[Family::Position][(1, k)] = if k < 2 { 0.3 } else { -0.3 };
        }
        (model, MeshSolution::from_trajectory(&t, 2).unwrap())
    }

    #[test]
    fn test_mesh_dynamics_columns() {
        let (model, mesh) = toy_mesh();
        let dynamics = LinearDynamics::new(&model, DynamicsVariant::PostProcessing)
            .with_joint(1, 1.0, 0.0, 2.0)
            .with_contact(1, 600.0);
        let outputs = mesh_dynamics(&dynamics, &mesh).unwrap();
        assert_eq!(outputs.shape(), (model.n_joints() + 18, 3));
        // column k holds mesh point k + 1
        assert_eq!(outputs[(1, 0)], 2.0 * 0.3);
        assert_eq!(outputs[(1, 1)], 2.0 * -0.3);
        let right = vertical_grf(&model, &outputs, Side::Right);
        let left = vertical_grf(&model, &outputs, Side::Left);
        assert!(right[0] > 500.0 && left[0] < 100.0);
        assert!(right[2] < 100.0 && left[2] > 500.0);
    }

    #[test]
    fn test_balance_empty_without_actuators() {
        let (model, mesh) = toy_mesh();
        let dynamics = LinearDynamics::new(&model, DynamicsVariant::PostProcessing);
        let outputs = mesh_dynamics(&dynamics, &mesh).unwrap();
        let (arm, mtp) = actuator_balance(&model, &Biophysics::new(&model), &mesh, &outputs);
        assert!(arm.is_empty() && mtp.is_empty());
    }
}
