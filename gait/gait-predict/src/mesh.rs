//! Mesh-point view of a solved half cycle.

use gait_collocation::{Family, Trajectory};
use gait_types::{GaitError, Result};
use nalgebra::DMatrix;

/// Physical-unit values of a solution at the mesh points.
///
/// States have `N + 1` columns. Accelerations and tendon force rates are
/// taken at the last collocation point of each interval, which is the
/// interval's end, so they have `N` columns and column `k` belongs to mesh
/// point `k + 1`.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshSolution {
    /// Duration of the half cycle (s).
    pub final_time: f64,
    /// Muscle activations.
    pub activation: DMatrix<f64>,
    /// Normalized tendon forces.
    pub force: DMatrix<f64>,
    /// Joint positions (rad, m).
    pub position: DMatrix<f64>,
    /// Joint velocities.
    pub velocity: DMatrix<f64>,
    /// Arm activations.
    pub arm_activation: DMatrix<f64>,
    /// Joint accelerations at interval ends.
    pub acceleration: DMatrix<f64>,
    /// Normalized tendon force rates at interval ends.
    pub force_rate: DMatrix<f64>,
}

impl MeshSolution {
    /// Mesh view of an unscaled trajectory collocated with `degree` points.
    pub fn from_trajectory(physical: &Trajectory, degree: usize) -> Result<Self> {
        let n = physical[Family::Position].ncols().saturating_sub(1);
        if degree == 0 || n == 0 {
            return Err(GaitError::consistency(format!(
                "cannot take mesh points of a trajectory with {n} intervals of degree {degree}"
            )));
        }
        for family in [Family::AccelerationCol, Family::ForceRateCol] {
            let cols = physical[family].ncols();
            if cols != n * degree {
                return Err(GaitError::consistency(format!(
                    "{} has {cols} columns, expected {}",
                    family.name(),
                    n * degree
                )));
            }
        }
        Ok(Self {
            final_time: physical.final_time(),
            activation: physical[Family::Activation].clone(),
            force: physical[Family::Force].clone(),
            position: physical[Family::Position].clone(),
            velocity: physical[Family::Velocity].clone(),
            arm_activation: physical[Family::ArmActivation].clone(),
            acceleration: interval_ends(&physical[Family::AccelerationCol], degree),
            force_rate: interval_ends(&physical[Family::ForceRateCol], degree),
        })
    }

    /// Number of mesh intervals `N`.
    #[must_use]
    pub fn n_intervals(&self) -> usize {
        self.position.ncols() - 1
    }

    /// Distance covered by coordinate `forward` over the half cycle.
    #[must_use]
    pub fn distance(&self, forward: usize) -> f64 {
        self.position[(forward, self.n_intervals())] - self.position[(forward, 0)]
    }

    /// Average speed along `forward`.
    #[must_use]
    pub fn average_speed(&self, forward: usize) -> f64 {
        self.distance(forward) / self.final_time
    }

    /// Position and velocity of mesh point `k`, and the acceleration
    /// reached at it (`k ≥ 1`).
    #[must_use]
    pub fn kinematics_at(&self, k: usize) -> (Vec<f64>, Vec<f64>, Vec<f64>) {
        (
            self.position.column(k).iter().copied().collect(),
            self.velocity.column(k).iter().copied().collect(),
            self.acceleration.column(k - 1).iter().copied().collect(),
        )
    }
}

fn interval_ends(collocated: &DMatrix<f64>, degree: usize) -> DMatrix<f64> {
    let n = collocated.ncols() / degree;
    DMatrix::from_fn(collocated.nrows(), n, |i, k| {
        collocated[(i, k * degree + degree - 1)]
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use gait_collocation::Dimensions;
    use gait_types::GaitModel;

    fn toy_trajectory() -> Trajectory {
        let model = GaitModel::toy_leg().unwrap();
        let dims = Dimensions::new(&model, 4, 3);
        let mut t = Trajectory::zeros(&dims);
        t[Family::FinalTime][(0, 0)] = 0.5;
        for k in 0..=4 {
            t[Family::Position][(0, k)] = 0.125 * k as f64;
        }
        for c in 0..12 {
            t[Family::AccelerationCol][(1, c)] = c as f64;
            t[Family::ForceRateCol][(0, c)] = -(c as f64);
        }
        t
    }

    #[test]
    fn test_interval_ends_are_last_collocation_points() {
        let mesh = MeshSolution::from_trajectory(&toy_trajectory(), 3).unwrap();
        assert_eq!(mesh.n_intervals(), 4);
        assert_eq!(mesh.acceleration.ncols(), 4);
        assert_eq!(mesh.acceleration[(1, 0)], 2.0);
        assert_eq!(mesh.acceleration[(1, 3)], 11.0);
        assert_eq!(mesh.force_rate[(0, 1)], -5.0);
    }

    #[test]
    fn test_average_speed() {
        let mesh = MeshSolution::from_trajectory(&toy_trajectory(), 3).unwrap();
        assert_eq!(mesh.distance(0), 0.5);
        assert_eq!(mesh.average_speed(0), 1.0);
        let (q, _, qdd) = mesh.kinematics_at(2);
        assert_eq!(q[0], 0.25);
        assert_eq!(qdd[1], 5.0);
    }

    #[test]
    fn test_degree_mismatch_rejected() {
        assert!(MeshSolution::from_trajectory(&toy_trajectory(), 2).is_err());
        assert!(MeshSolution::from_trajectory(&toy_trajectory(), 0).is_err());
    }
}
