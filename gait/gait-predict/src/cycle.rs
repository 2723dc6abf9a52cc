//! Full gait-cycle reconstruction from a half-cycle solution.
//!
//! The half cycle covers one step. The full `2N`-sample stride starting at
//! heel strike `s` is
//!
//! ```text
//! [ half[s..N] | mirror(half[0..N]) | half[0..s] ]
//! ```
//!
//! where the mirror swaps left and right rows and negates the coordinates
//! that flip sign across the sagittal plane. The forward translation is
//! shifted by one step length in the mirrored block and by two in the tail
//! so the stride is continuous, then offset to start at zero. A stride that
//! starts with the left leg is mirrored as a whole.

use gait_types::{GaitError, GaitModel, Result, Side};
use nalgebra::DMatrix;

use crate::heel_strike::HeelStrike;
use crate::mesh::MeshSolution;

/// Row mapping between the two halves of a stride.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mirror<'a> {
    /// Rows written by the mirror.
    pub targets: &'a [usize],
    /// Source row of each target.
    pub sources: &'a [usize],
    /// Rows whose values change sign.
    pub negated: &'a [usize],
}

impl Mirror<'_> {
    /// Mirrored rows of `block`; rows the mapping does not reach are zero.
    #[must_use]
    pub fn apply(&self, block: &DMatrix<f64>) -> DMatrix<f64> {
        let mut out = DMatrix::zeros(block.nrows(), block.ncols());
        self.write(block, &mut out);
        out
    }

    /// `matrix` with its mapped rows replaced by their mirrored sources.
    #[must_use]
    pub fn remap(&self, matrix: &DMatrix<f64>) -> DMatrix<f64> {
        let mut out = matrix.clone();
        self.write(matrix, &mut out);
        out
    }

    fn write(&self, source: &DMatrix<f64>, out: &mut DMatrix<f64>) {
        for (&t, &s) in self.targets.iter().zip(self.sources) {
            out.set_row(t, &source.row(s));
        }
        for &o in self.negated {
            out.set_row(o, &(-source.row(o)));
        }
    }
}

/// Assemble `2N` columns from the `N` columns of `half`, starting at
/// column `start`.
#[must_use]
pub fn stitch(half: &DMatrix<f64>, start: usize, mirror: &Mirror<'_>) -> DMatrix<f64> {
    let n = half.ncols();
    let head = n - start;
    let mut cycle = DMatrix::zeros(half.nrows(), 2 * n);
    cycle.columns_mut(0, head).copy_from(&half.columns(start, head));
    cycle.columns_mut(head, n).copy_from(&mirror.apply(half));
    cycle.columns_mut(head + n, start).copy_from(&half.columns(0, start));
    cycle
}

/// The stride as seen from the leg that strikes first.
fn oriented(matrix: DMatrix<f64>, mirror: &Mirror<'_>, leg: Side) -> DMatrix<f64> {
    match leg {
        Side::Right => matrix,
        Side::Left => mirror.remap(&matrix),
    }
}

/// One full stride in physical units (rad for rotations).
#[derive(Debug, Clone, PartialEq)]
pub struct GaitCycle {
    /// Where the stride starts in the half cycle.
    pub heel_strike: HeelStrike,
    /// Sample times, `[t_0..t_{N−1}, t_0 + t_f..t_{N−1} + t_f]`.
    pub time: Vec<f64>,
    /// Joint positions.
    pub position: DMatrix<f64>,
    /// Joint velocities.
    pub velocity: DMatrix<f64>,
    /// Joint accelerations.
    pub acceleration: DMatrix<f64>,
    /// Muscle activations.
    pub activation: DMatrix<f64>,
    /// Normalized tendon forces.
    pub force: DMatrix<f64>,
    /// Normalized tendon force rates.
    pub force_rate: DMatrix<f64>,
    /// Arm activations.
    pub arm_activation: DMatrix<f64>,
}

impl GaitCycle {
    /// Reconstruct the stride of `mesh` starting at `heel_strike`.
    ///
    /// The heel strike indexes interval ends, so states start one mesh
    /// point later than the controls.
    pub fn reconstruct(model: &GaitModel, mesh: &MeshSolution, heel_strike: HeelStrike) -> Result<Self> {
        let n = mesh.n_intervals();
        if heel_strike.index >= n {
            return Err(GaitError::consistency(format!(
                "heel strike at sample {} of a {n}-interval half cycle",
                heel_strike.index
            )));
        }
        let p = &model.periodicity;
        let muscles: Vec<usize> = (0..model.n_muscles()).collect();
        let arms: Vec<usize> = (0..model.n_arms()).collect();
        let positions = Mirror {
            targets: &p.qs_a,
            sources: &p.qs_b,
            negated: &p.opposite,
        };
        let velocities = Mirror {
            targets: &p.qds_a,
            sources: &p.qds_b,
            negated: &p.opposite,
        };
        let muscle_mirror = Mirror {
            targets: &muscles,
            sources: &p.muscles,
            negated: &[],
        };
        let arm_mirror = Mirror {
            targets: &arms,
            sources: &p.arms,
            negated: &[],
        };

        let state_start = heel_strike.index + 1;
        let control_start = heel_strike.index;
        let leg = heel_strike.leg;
        let states = |m: &DMatrix<f64>, mirror: &Mirror<'_>| {
            oriented(stitch(&m.columns(0, n).into_owned(), state_start, mirror), mirror, leg)
        };
        let controls = |m: &DMatrix<f64>, mirror: &Mirror<'_>| {
            oriented(stitch(m, control_start, mirror), mirror, leg)
        };

        let tx = model.pelvis.forward;
        let step = mesh.position[(tx, n)];
        let mut position = stitch(&mesh.position.columns(0, n).into_owned(), state_start, &positions);
        let head = n - state_start;
        for c in head..head + n {
            position[(tx, c)] = mesh.position[(tx, c - head)] + step;
        }
        for c in head + n..2 * n {
            position[(tx, c)] += 2.0 * step;
        }
        let mut position = oriented(position, &positions, leg);
        let origin = position[(tx, 0)];
        position.row_mut(tx).add_scalar_mut(-origin);

        let final_time = mesh.final_time;
        let h = final_time / n as f64;
        let time = (0..2 * n)
            .map(|k| if k < n { k as f64 * h } else { (k - n) as f64 * h + final_time })
            .collect();

        Ok(Self {
            heel_strike,
            time,
            position,
            velocity: states(&mesh.velocity, &velocities),
            acceleration: controls(&mesh.acceleration, &velocities),
            activation: states(&mesh.activation, &muscle_mirror),
            force: states(&mesh.force, &muscle_mirror),
            force_rate: controls(&mesh.force_rate, &muscle_mirror),
            arm_activation: states(&mesh.arm_activation, &arm_mirror),
        })
    }

    /// Number of samples `2N`.
    #[must_use]
    pub fn n_samples(&self) -> usize {
        self.time.len()
    }

    /// Distance covered along `forward` between the first and last sample.
    #[must_use]
    pub fn distance(&self, forward: usize) -> f64 {
        self.position[(forward, self.n_samples() - 1)] - self.position[(forward, 0)]
    }

    /// Column `k` of `matrix` as a vector.
    #[must_use]
    pub fn sample(matrix: &DMatrix<f64>, k: usize) -> Vec<f64> {
        matrix.column(k).iter().copied().collect()
    }
}

/// `matrix` with the rotational rows of `model` converted to degrees.
#[must_use]
pub fn rotations_in_degrees(model: &GaitModel, matrix: &DMatrix<f64>) -> DMatrix<f64> {
    let mut out = matrix.clone();
    for j in model.rotational_joints() {
        out.row_mut(j).apply(|v| *v = v.to_degrees());
    }
    out
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use gait_collocation::{Dimensions, Family, Trajectory};

    /// Rows: 0 forward, 1 right hip, 2 left hip, 3 lumbar bending.
    fn half(n: usize) -> DMatrix<f64> {
        DMatrix::from_fn(4, n, |i, k| match i {
            0 => 0.1 * k as f64,
            1 => 1.0 + k as f64,
            2 => -(1.0 + k as f64),
            _ => 0.5 * k as f64,
        })
    }

    const SWAP: Mirror<'static> = Mirror {
        targets: &[1, 2],
        sources: &[2, 1],
        negated: &[3],
    };

    #[test]
    fn test_stitch_blocks() {
        let h = half(5);
        let cycle = stitch(&h, 2, &SWAP);
        assert_eq!(cycle.ncols(), 10);
        // head: half[2..5]
        assert_eq!(cycle[(1, 0)], h[(1, 2)]);
        assert_eq!(cycle[(1, 2)], h[(1, 4)]);
        // mirrored block starts at N − s = 3
        assert_eq!(cycle[(1, 3)], h[(2, 0)]);
        assert_eq!(cycle[(2, 7)], h[(1, 4)]);
        assert_eq!(cycle[(3, 4)], -h[(3, 1)]);
        // forward row is not mapped
        assert_eq!(cycle[(0, 5)], 0.0);
        // tail: half[0..2]
        assert_eq!(cycle[(1, 8)], h[(1, 0)]);
        assert_eq!(cycle[(1, 9)], h[(1, 1)]);
    }

    #[test]
    fn test_stitch_start_extremes() {
        let h = half(4);
        let at_zero = stitch(&h, 0, &SWAP);
        assert_eq!(at_zero.columns(0, 4), h.columns(0, 4));
        let at_end = stitch(&h, 4, &SWAP);
        assert_eq!(at_end.columns(4, 4), h.columns(0, 4));
    }

    #[test]
    fn test_remap_keeps_unmapped_rows() {
        let h = half(3);
        let m = SWAP.remap(&h);
        assert_eq!(m.row(0), h.row(0));
        assert_eq!(m.row(1), h.row(2));
        assert_eq!(m.row(3), -h.row(3));
    }

    #[test]
    fn test_left_strike_orientation() {
        let h = half(5);
        let right = oriented(stitch(&h, 2, &SWAP), &SWAP, Side::Right);
        let left = oriented(stitch(&h, 2, &SWAP), &SWAP, Side::Left);
        assert_eq!(right, stitch(&h, 2, &SWAP));
        assert_eq!(left.row(0), right.row(0));
        assert_eq!(left.row(1), right.row(2));
        assert_eq!(left.row(2), right.row(1));
        assert_eq!(left.row(3), -right.row(3));
        // half a stride later the legs have swapped in either orientation
        for m in [&right, &left] {
            assert_eq!(m[(1, 5)], m[(2, 0)]);
            assert_eq!(m[(3, 5)], -m[(3, 0)]);
        }
    }

    fn toy_mesh(n: usize) -> (GaitModel, MeshSolution) {
        let model = GaitModel::toy_leg().unwrap();
        let dims = Dimensions::new(&model, n, 1);
        let mut t = Trajectory::zeros(&dims);
        t[Family::FinalTime][(0, 0)] = 0.5;
        for k in 0..=n {
            let s = k as f64 / n as f64;
            t[Family::Position][(0, k)] = 0.5 * s;
            t[Family::Position][(1, k)] = 0.3 * (std::f64::consts::PI * s).cos();
            t[Family::Activation][(0, k)] = 0.1 + s;
        }
        for k in 0..n {
            t[Family::AccelerationCol][(1, k)] = k as f64;
        }
        (model, MeshSolution::from_trajectory(&t, 1).unwrap())
    }

    #[test]
    fn test_forward_translation_is_continuous() {
        let (model, mesh) = toy_mesh(6);
        let strike = HeelStrike { index: 2, leg: Side::Right };
        let cycle = GaitCycle::reconstruct(&model, &mesh, strike).unwrap();
        assert_eq!(cycle.n_samples(), 12);
        assert_eq!(cycle.position[(0, 0)], 0.0);
        let dx = 0.5 / 6.0;
        for c in 1..12 {
            assert_relative_eq!(cycle.position[(0, c)] - cycle.position[(0, c - 1)], dx, epsilon = 1e-12);
        }
        assert_relative_eq!(cycle.distance(0), 11.0 * dx, epsilon = 1e-12);
        assert_relative_eq!(cycle.time[6], 0.5);
        assert_relative_eq!(cycle.time[11], 0.5 + 5.0 * 0.5 / 6.0, epsilon = 1e-12);
    }

    #[test]
    fn test_states_and_controls_alignment() {
        let (model, mesh) = toy_mesh(6);
        let strike = HeelStrike { index: 2, leg: Side::Right };
        let cycle = GaitCycle::reconstruct(&model, &mesh, strike).unwrap();
        // states start at mesh point 3, controls at interval end 2 (mesh point 3)
        assert_eq!(cycle.activation[(0, 0)], mesh.activation[(0, 3)]);
        assert_eq!(cycle.acceleration[(1, 0)], mesh.acceleration[(1, 2)]);
        // the second half repeats the first through the periodicity map
        assert_eq!(cycle.position[(1, 6)], cycle.position[(1, 0)]);
        assert_eq!(cycle.activation[(0, 6)], cycle.activation[(0, 0)]);
    }

    #[test]
    fn test_late_heel_strike_rejected() {
        let (model, mesh) = toy_mesh(4);
        let strike = HeelStrike { index: 4, leg: Side::Right };
        assert!(GaitCycle::reconstruct(&model, &mesh, strike).is_err());
    }

    #[test]
    fn test_degrees_only_for_rotations() {
        let (model, mesh) = toy_mesh(4);
        let deg = rotations_in_degrees(&model, &mesh.position);
        assert_eq!(deg[(0, 4)], mesh.position[(0, 4)]);
        assert_relative_eq!(deg[(1, 0)], 0.3_f64.to_degrees(), epsilon = 1e-12);
    }
}
