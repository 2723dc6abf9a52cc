//! Decision-variable layout.
//!
//! The decision vector is the final time followed by fifteen families, each
//! stored node-major (all items of one node are contiguous):
//!
//! ```text
//! [ tf | a  a_col | F  F_col | Qs  Qs_col | Qds  Qds_col | aArm  aArm_col
//!      | aDt | eArm | FDt_col | Qdds_col ]
//! ```
//!
//! Mesh families have `N + 1` nodes, collocation families `d·N` (node
//! `k·d + j` is collocation point `j + 1` of interval `k`) and the piecewise
//! constant controls `aDt` and `eArm` have `N`.

use std::ops::{Index, IndexMut, Range};

use gait_nlp::VariableFamily;
use gait_types::{GaitError, GaitModel, Result};
use nalgebra::DMatrix;

/// Decision-variable families in vector order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Family {
    /// Final time (s).
    FinalTime,
    /// Muscle activation at mesh points.
    Activation,
    /// Muscle activation at collocation points.
    ActivationCol,
    /// Normalized tendon force at mesh points.
    Force,
    /// Normalized tendon force at collocation points.
    ForceCol,
    /// Joint positions at mesh points.
    Position,
    /// Joint positions at collocation points.
    PositionCol,
    /// Joint velocities at mesh points.
    Velocity,
    /// Joint velocities at collocation points.
    VelocityCol,
    /// Arm activation at mesh points.
    ArmActivation,
    /// Arm activation at collocation points.
    ArmActivationCol,
    /// Activation rate, constant per interval.
    ActivationRate,
    /// Arm excitation, constant per interval.
    ArmExcitation,
    /// Normalized tendon force rate at collocation points.
    ForceRateCol,
    /// Joint accelerations at collocation points.
    AccelerationCol,
}

impl Family {
    /// All families in decision-vector order.
    pub const ALL: [Self; 15] = [
        Self::FinalTime,
        Self::Activation,
        Self::ActivationCol,
        Self::Force,
        Self::ForceCol,
        Self::Position,
        Self::PositionCol,
        Self::Velocity,
        Self::VelocityCol,
        Self::ArmActivation,
        Self::ArmActivationCol,
        Self::ActivationRate,
        Self::ArmExcitation,
        Self::ForceRateCol,
        Self::AccelerationCol,
    ];

    /// Short name used in diagnostics and artifacts.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::FinalTime => "finalTime",
            Self::Activation => "a",
            Self::ActivationCol => "a_col",
            Self::Force => "F",
            Self::ForceCol => "F_col",
            Self::Position => "Qs",
            Self::PositionCol => "Qs_col",
            Self::Velocity => "Qds",
            Self::VelocityCol => "Qds_col",
            Self::ArmActivation => "aArm",
            Self::ArmActivationCol => "aArm_col",
            Self::ActivationRate => "aDt",
            Self::ArmExcitation => "eArm",
            Self::ForceRateCol => "FDt_col",
            Self::AccelerationCol => "Qdds_col",
        }
    }

    const fn slot(self) -> usize {
        self as usize
    }
}

/// Problem dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    /// Muscles.
    pub n_muscles: usize,
    /// Joints.
    pub n_joints: usize,
    /// Arm joints.
    pub n_arms: usize,
    /// Mesh intervals `N`.
    pub n_intervals: usize,
    /// Collocation degree `d`.
    pub degree: usize,
}

impl Dimensions {
    /// Dimensions of `model` on an `N × d` mesh.
    #[must_use]
    pub fn new(model: &GaitModel, n_intervals: usize, degree: usize) -> Self {
        Self {
            n_muscles: model.n_muscles(),
            n_joints: model.n_joints(),
            n_arms: model.n_arms(),
            n_intervals,
            degree,
        }
    }

    /// Items per node of `family`.
    #[must_use]
    pub const fn items(&self, family: Family) -> usize {
        match family {
            Family::FinalTime => 1,
            Family::Activation
            | Family::ActivationCol
            | Family::Force
            | Family::ForceCol
            | Family::ActivationRate
            | Family::ForceRateCol => self.n_muscles,
            Family::Position
            | Family::PositionCol
            | Family::Velocity
            | Family::VelocityCol
            | Family::AccelerationCol => self.n_joints,
            Family::ArmActivation | Family::ArmActivationCol | Family::ArmExcitation => {
                self.n_arms
            }
        }
    }

    /// Nodes of `family`.
    #[must_use]
    pub const fn nodes(&self, family: Family) -> usize {
        match family {
            Family::FinalTime => 1,
            Family::Activation
            | Family::Force
            | Family::Position
            | Family::Velocity
            | Family::ArmActivation => self.n_intervals + 1,
            Family::ActivationRate | Family::ArmExcitation => self.n_intervals,
            Family::ActivationCol
            | Family::ForceCol
            | Family::PositionCol
            | Family::VelocityCol
            | Family::ArmActivationCol
            | Family::ForceRateCol
            | Family::AccelerationCol => self.degree * self.n_intervals,
        }
    }

    /// Number of collocation nodes `d·N`.
    #[must_use]
    pub const fn n_collocation(&self) -> usize {
        self.degree * self.n_intervals
    }
}

/// Offsets of every family in the decision vector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableLayout {
    dims: Dimensions,
    offsets: [usize; 15],
    len: usize,
}

impl VariableLayout {
    /// Layout for `dims`.
    #[must_use]
    pub fn new(dims: Dimensions) -> Self {
        let mut offsets = [0; 15];
        let mut next = 0;
        for family in Family::ALL {
            offsets[family.slot()] = next;
            next += dims.items(family) * dims.nodes(family);
        }
        Self {
            dims,
            offsets,
            len: next,
        }
    }

    /// Problem dimensions.
    #[must_use]
    pub fn dimensions(&self) -> &Dimensions {
        &self.dims
    }

    /// Length of the decision vector.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Always false for a valid model.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Slice of `family`.
    #[must_use]
    pub fn range(&self, family: Family) -> Range<usize> {
        let start = self.offsets[family.slot()];
        start..start + self.dims.items(family) * self.dims.nodes(family)
    }

    /// Flat index of `item` at `node` of `family`.
    #[must_use]
    pub fn index(&self, family: Family, node: usize, item: usize) -> usize {
        self.offsets[family.slot()] + node * self.dims.items(family) + item
    }

    /// Named slices for diagnostics.
    #[must_use]
    pub fn families(&self) -> Vec<VariableFamily> {
        Family::ALL
            .iter()
            .map(|&f| VariableFamily {
                name: f.name().to_string(),
                range: self.range(f),
            })
            .collect()
    }

    /// Disjoint index sets of variables that meet in the same node
    /// function: every mesh point, every collocation point, the controls
    /// of every interval and the final time.
    #[must_use]
    pub fn node_blocks(&self) -> Vec<Vec<usize>> {
        use Family::*;
        const MESH: [Family; 5] = [Activation, Force, Position, Velocity, ArmActivation];
        const COLLOCATION: [Family; 7] = [
            ActivationCol,
            ForceCol,
            PositionCol,
            VelocityCol,
            ArmActivationCol,
            ForceRateCol,
            AccelerationCol,
        ];
        const CONTROLS: [Family; 2] = [ActivationRate, ArmExcitation];

        let dims = &self.dims;
        let block = |families: &[Family], node: usize| -> Vec<usize> {
            families
                .iter()
                .flat_map(|&f| (0..dims.items(f)).map(move |i| self.index(f, node, i)))
                .collect()
        };
        let mut blocks = vec![vec![self.index(FinalTime, 0, 0)]];
        blocks.extend((0..=dims.n_intervals).map(|k| block(&MESH, k)));
        blocks.extend((0..dims.n_collocation()).map(|c| block(&COLLOCATION, c)));
        blocks.extend((0..dims.n_intervals).map(|k| block(&CONTROLS, k)));
        blocks.retain(|b| !b.is_empty());
        blocks
    }

    /// Split a decision vector into per-family `items × nodes` matrices.
    pub fn extract(&self, w: &[f64]) -> Result<Trajectory> {
        if w.len() != self.len {
            return Err(GaitError::SolutionSizeMismatch {
                expected: self.len,
                actual: w.len(),
            });
        }
        let families = Family::ALL.map(|f| {
            DMatrix::from_column_slice(self.dims.items(f), self.dims.nodes(f), &w[self.range(f)])
        });
        Ok(Trajectory { families })
    }

    /// Flatten a trajectory back into a decision vector.
    pub fn flatten(&self, trajectory: &Trajectory) -> Result<Vec<f64>> {
        let mut w = Vec::with_capacity(self.len);
        for f in Family::ALL {
            let m = &trajectory[f];
            if m.nrows() != self.dims.items(f) || m.ncols() != self.dims.nodes(f) {
                return Err(GaitError::consistency(format!(
                    "family {} is {}x{}, layout expects {}x{}",
                    f.name(),
                    m.nrows(),
                    m.ncols(),
                    self.dims.items(f),
                    self.dims.nodes(f)
                )));
            }
            w.extend_from_slice(m.as_slice());
        }
        Ok(w)
    }
}

/// Per-family `items × nodes` matrices of one decision vector.
#[derive(Debug, Clone, PartialEq)]
pub struct Trajectory {
    families: [DMatrix<f64>; 15],
}

impl Trajectory {
    /// All-zero trajectory shaped by `dims`.
    #[must_use]
    pub fn zeros(dims: &Dimensions) -> Self {
        Self {
            families: Family::ALL.map(|f| DMatrix::zeros(dims.items(f), dims.nodes(f))),
        }
    }

    /// Final time (s).
    #[must_use]
    pub fn final_time(&self) -> f64 {
        self[Family::FinalTime][(0, 0)]
    }

    /// Multiply every row of every family by its factor.
    ///
    /// `factors(family)` returns one factor per item; scaled to physical
    /// units this is an unscaling, and with reciprocals the inverse.
    #[must_use]
    pub fn rescaled<'a>(&self, factors: impl Fn(Family) -> &'a [f64]) -> Self {
        let mut out = self.clone();
        for f in Family::ALL {
            let scale = factors(f);
            let m = &mut out[f];
            for (i, &s) in scale.iter().enumerate().take(m.nrows()) {
                m.row_mut(i).scale_mut(s);
            }
        }
        out
    }

    /// Divide every row of every family by its factor, undoing
    /// [`rescaled`](Self::rescaled) with the same factors.
    #[must_use]
    pub fn scaled<'a>(&self, factors: impl Fn(Family) -> &'a [f64]) -> Self {
        let mut out = self.clone();
        for f in Family::ALL {
            let scale = factors(f);
            let m = &mut out[f];
            for (i, &s) in scale.iter().enumerate().take(m.nrows()) {
                m.row_mut(i).unscale_mut(s);
            }
        }
        out
    }
}

impl Index<Family> for Trajectory {
    type Output = DMatrix<f64>;

    fn index(&self, family: Family) -> &Self::Output {
        &self.families[family.slot()]
    }
}

impl IndexMut<Family> for Trajectory {
    fn index_mut(&mut self, family: Family) -> &mut Self::Output {
        &mut self.families[family.slot()]
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn dims() -> Dimensions {
        Dimensions {
            n_muscles: 2,
            n_joints: 3,
            n_arms: 1,
            n_intervals: 4,
            degree: 3,
        }
    }

    #[test]
    fn test_layout_size_and_order() {
        let layout = VariableLayout::new(dims());
        // tf + (a, F): 2·5 + 2·12 each, Qs/Qds: 3·5 + 3·12 each,
        // aArm: 5 + 12, aDt: 2·4, eArm: 4, FDt: 24, Qdds: 36
        let expected = 1 + 2 * (10 + 24) + 2 * (15 + 36) + 17 + 8 + 4 + 24 + 36;
        assert_eq!(layout.len(), expected);
        assert_eq!(layout.range(Family::FinalTime), 0..1);
        assert_eq!(layout.range(Family::Activation), 1..11);
        assert_eq!(layout.index(Family::Activation, 2, 1), 1 + 2 * 2 + 1);
        assert_eq!(layout.range(Family::AccelerationCol).end, expected);
        let families = layout.families();
        assert_eq!(families.len(), 15);
        assert!(families.windows(2).all(|w| w[0].range.end == w[1].range.start));
    }

    #[test]
    fn test_extract_is_node_major() {
        let layout = VariableLayout::new(dims());
        let w: Vec<f64> = (0..layout.len()).map(|i| i as f64).collect();
        let t = layout.extract(&w).unwrap();
        assert_eq!(t.final_time(), 0.0);
        let qs = &t[Family::Position];
        assert_eq!(qs.shape(), (3, 5));
        assert_eq!(
            qs[(2, 1)],
            layout.index(Family::Position, 1, 2) as f64
        );
        assert_eq!(layout.flatten(&t).unwrap(), w);
    }

    #[test]
    fn test_extract_rejects_wrong_length() {
        let layout = VariableLayout::new(dims());
        let err = layout.extract(&[0.0; 3]).unwrap_err();
        assert!(matches!(err, GaitError::SolutionSizeMismatch { actual: 3, .. }));
    }

    #[test]
    fn test_node_blocks_partition_the_vector() {
        let layout = VariableLayout::new(dims());
        let blocks = layout.node_blocks();
        // tf, 5 mesh points, 12 collocation points, 4 control intervals
        assert_eq!(blocks.len(), 1 + 5 + 12 + 4);
        let mut seen = vec![0usize; layout.len()];
        for &i in blocks.iter().flatten() {
            seen[i] += 1;
        }
        assert!(seen.iter().all(|&count| count == 1));

        // a mesh point holds a, F, Qs, Qds and aArm of that node
        assert_eq!(blocks[1 + 2].len(), 2 + 2 + 3 + 3 + 1);
        assert!(blocks[1 + 2].contains(&layout.index(Family::Velocity, 2, 1)));
        // a collocation point adds FDt and Qdds
        let col = &blocks[1 + 5 + 7];
        assert_eq!(col.len(), 2 + 2 + 3 + 3 + 1 + 2 + 3);
        assert!(col.contains(&layout.index(Family::AccelerationCol, 7, 2)));
        assert_eq!(blocks[0], vec![0]);
        assert!(blocks.iter().map(Vec::len).max().unwrap() < layout.len() / 10);
    }

    #[test]
    fn test_rescaled_rows() {
        let d = dims();
        let mut t = Trajectory::zeros(&d);
        t[Family::Force].fill(1.0);
        let five = [5.0, 2.0];
        let none: [f64; 0] = [];
        let out = t.rescaled(|f| if f == Family::Force { &five[..] } else { &none[..] });
        assert_eq!(out[Family::Force][(0, 3)], 5.0);
        assert_eq!(out[Family::Force][(1, 0)], 2.0);
    }

    #[test]
    fn test_scaled_undoes_rescaled() {
        let d = dims();
        let layout = VariableLayout::new(d);
        let w: Vec<f64> = (0..layout.len()).map(|i| 0.5 + i as f64).collect();
        let t = layout.extract(&w).unwrap();
        let position = [2.0, 0.25, 8.0];
        let activation = [4.0, 0.5];
        let factors = |f: Family| match f {
            Family::Position | Family::PositionCol => &position[..],
            Family::Activation => &activation[..],
            _ => &[][..],
        };

        let physical = t.rescaled(factors);
        assert_eq!(physical[Family::Position][(1, 2)], 0.25 * t[Family::Position][(1, 2)]);
        assert_eq!(physical[Family::Velocity], t[Family::Velocity]);
        let back = physical.scaled(factors);
        for f in Family::ALL {
            for (a, b) in back[f].iter().zip(t[f].iter()) {
                approx::assert_relative_eq!(*a, *b, max_relative = 1e-15);
            }
        }
    }
}
