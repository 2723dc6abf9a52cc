//! Block-diagonal quasi-Newton approximation of the Lagrangian Hessian.
//!
//! The variables are split into disjoint blocks and every block keeps its
//! own dense damped-BFGS matrix, updated from its slice of the step and of
//! the gradient change. Curvature between blocks is dropped, so the QP
//! Hessian stores `Σ nᵦ(nᵦ + 1)/2` upper-triangle entries instead of
//! `n(n + 1)/2`.
//!
//! ```text
//!   x = [ b₀ | b₁ | b₂ | … ]        B = diag(B₀, B₁, B₂, …)
//! ```

use clarabel::algebra::CscMatrix;
use nalgebra::{DMatrix, DVector};

use gait_types::{GaitError, Result};

use crate::sparse::TripletMatrix;

#[derive(Debug, Clone, PartialEq)]
struct Block {
    indices: Vec<usize>,
    matrix: DMatrix<f64>,
}

impl Block {
    fn gather(&self, v: &[f64]) -> DVector<f64> {
        DVector::from_iterator(self.indices.len(), self.indices.iter().map(|&i| v[i]))
    }
}

/// Damped BFGS matrices on a partition of the variables.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockHessian {
    n: usize,
    blocks: Vec<Block>,
}

impl BlockHessian {
    /// Identity blocks on `partition`, which must cover `0..n` exactly once.
    pub fn new(n: usize, partition: Vec<Vec<usize>>) -> Result<Self> {
        let mut seen = vec![false; n];
        for &i in partition.iter().flatten() {
            match seen.get_mut(i) {
                Some(taken) if !*taken => *taken = true,
                Some(_) => {
                    return Err(GaitError::consistency(format!(
                        "variable {i} appears in two Hessian blocks"
                    )))
                }
                None => {
                    return Err(GaitError::consistency(format!(
                        "Hessian block index {i} exceeds {n} variables"
                    )))
                }
            }
        }
        if let Some(i) = seen.iter().position(|taken| !taken) {
            return Err(GaitError::consistency(format!(
                "variable {i} is in no Hessian block"
            )));
        }
        let blocks = partition
            .into_iter()
            .filter(|indices| !indices.is_empty())
            .map(|indices| Block {
                matrix: DMatrix::identity(indices.len(), indices.len()),
                indices,
            })
            .collect();
        Ok(Self { n, blocks })
    }

    /// A single dense block.
    #[must_use]
    pub fn dense(n: usize) -> Self {
        Self {
            n,
            blocks: vec![Block {
                indices: (0..n).collect(),
                matrix: DMatrix::identity(n, n),
            }],
        }
    }

    /// Number of variables.
    pub fn dim(&self) -> usize {
        self.n
    }

    /// Number of non-empty blocks.
    pub fn n_blocks(&self) -> usize {
        self.blocks.len()
    }

    /// Structural upper-triangle entries.
    pub fn upper_nnz(&self) -> usize {
        self.blocks
            .iter()
            .map(|b| b.indices.len() * (b.indices.len() + 1) / 2)
            .sum()
    }

    /// Back to the identity.
    pub fn reset(&mut self) {
        for block in &mut self.blocks {
            block.matrix.fill_with_identity();
        }
    }

    /// `B p`.
    #[must_use]
    pub fn mul_vec(&self, p: &[f64]) -> Vec<f64> {
        let mut out = vec![0.0; self.n];
        for block in &self.blocks {
            let bp = &block.matrix * block.gather(p);
            for (k, &i) in block.indices.iter().enumerate() {
                out[i] = bp[k];
            }
        }
        out
    }

    /// `pᵀ B p`.
    #[must_use]
    pub fn quadratic_form(&self, p: &[f64]) -> f64 {
        self.blocks
            .iter()
            .map(|block| {
                let pb = block.gather(p);
                pb.dot(&(&block.matrix * &pb))
            })
            .sum()
    }

    /// Upper triangle padded with zero rows and columns to `total_dim`.
    #[must_use]
    pub fn upper_triangle_csc(&self, total_dim: usize) -> CscMatrix<f64> {
        let mut upper = TripletMatrix::with_capacity(total_dim, total_dim, self.upper_nnz());
        for block in &self.blocks {
            for (a, &i) in block.indices.iter().enumerate() {
                for (c, &j) in block.indices.iter().enumerate() {
                    if i <= j {
                        upper.push(i, j, block.matrix[(a, c)]);
                    }
                }
            }
        }
        upper.to_csc()
    }

    /// Partitioned damped BFGS update from the step `s` and the Lagrangian
    /// gradient change `y`.
    ///
    /// With `fresh`, each block is first sized to `yᵦᵀyᵦ / sᵦᵀyᵦ`. Returns
    /// whether any block changed.
    pub fn update(&mut self, s: &[f64], y: &[f64], fresh: bool) -> bool {
        let mut updated = false;
        for block in &mut self.blocks {
            let sb = block.gather(s);
            let yb = block.gather(y);
            if fresh {
                let sy = sb.dot(&yb);
                if sy > 0.0 {
                    let size = yb.norm_squared() / sy;
                    block.matrix.fill_with_identity();
                    block.matrix *= size;
                }
            }
            updated |= damped_bfgs_update(&mut block.matrix, &sb, &yb);
        }
        updated
    }
}

/// Powell-damped BFGS update. Returns `false` when the pair is unusable.
fn damped_bfgs_update(hessian: &mut DMatrix<f64>, s: &DVector<f64>, y: &DVector<f64>) -> bool {
    let bs = &*hessian * s;
    let sbs = s.dot(&bs);
    if sbs <= f64::EPSILON * s.norm_squared().max(1e-300) {
        return false;
    }
    let sy = s.dot(y);
    let theta = if sy >= 0.2 * sbs {
        1.0
    } else {
        0.8 * sbs / (sbs - sy)
    };
    let r = y * theta + &bs * (1.0 - theta);
    let sr = s.dot(&r);
    if sr <= 0.0 {
        return false;
    }
    *hessian -= &bs * bs.transpose() / sbs;
    *hessian += &r * r.transpose() / sr;
    true
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn two_blocks() -> BlockHessian {
        BlockHessian::new(5, vec![vec![0, 3], vec![1, 2, 4]]).unwrap()
    }

    #[test]
    fn test_bfgs_update_is_secant() {
        let mut b = DMatrix::<f64>::identity(2, 2);
        let s = DVector::from_column_slice(&[1.0, 0.0]);
        let y = DVector::from_column_slice(&[2.0, 0.5]);
        assert!(damped_bfgs_update(&mut b, &s, &y));
        let bs = &b * &s;
        assert_relative_eq!(bs[0], 2.0, epsilon = 1e-12);
        assert_relative_eq!(bs[1], 0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_partition_must_cover_once() {
        assert!(BlockHessian::new(3, vec![vec![0, 1], vec![1, 2]]).is_err());
        assert!(BlockHessian::new(3, vec![vec![0, 1]]).is_err());
        assert!(BlockHessian::new(3, vec![vec![0, 1, 2, 3]]).is_err());
        let h = BlockHessian::new(3, vec![vec![2], vec![], vec![0, 1]]).unwrap();
        assert_eq!(h.n_blocks(), 2);
    }

    #[test]
    fn test_storage_grows_with_blocks_not_variables() {
        // 50 blocks of 4: 50·10 upper entries, against 20 100 for one block
        let partition: Vec<Vec<usize>> = (0..50).map(|b| (4 * b..4 * b + 4).collect()).collect();
        let blocked = BlockHessian::new(200, partition).unwrap();
        assert_eq!(blocked.upper_nnz(), 500);
        assert_eq!(BlockHessian::dense(200).upper_nnz(), 200 * 201 / 2);
    }

    #[test]
    fn test_updates_stay_inside_blocks() {
        let mut h = two_blocks();
        let s = [1.0, 0.5, -0.25, 2.0, 1.0];
        let y = [3.0, 1.0, 0.5, 1.0, 2.0];
        assert!(h.update(&s, &y, true));

        // each block satisfies its own secant equation
        let bs = h.mul_vec(&s);
        for i in 0..5 {
            assert_relative_eq!(bs[i], y[i], epsilon = 1e-10);
        }
        assert_relative_eq!(
            h.quadratic_form(&s),
            s.iter().zip(&y).map(|(a, b)| a * b).sum::<f64>(),
            epsilon = 1e-10
        );

        let csc = h.upper_triangle_csc(7);
        assert_eq!(csc.colptr.len(), 8);
        assert!(csc.nzval.len() <= h.upper_nnz());
        let same_block = |i: usize, j: usize| {
            let block = |k: usize| usize::from(k == 1 || k == 2 || k == 4);
            block(i) == block(j)
        };
        for j in 0..7 {
            for k in csc.colptr[j]..csc.colptr[j + 1] {
                let i = csc.rowval[k];
                assert!(i <= j);
                assert!(j < 5 && same_block(i, j), "entry ({i}, {j}) couples blocks");
            }
        }
    }

    #[test]
    fn test_reset_restores_identity() {
        let mut h = two_blocks();
        h.update(&[1.0; 5], &[2.0; 5], true);
        h.reset();
        assert_eq!(h.mul_vec(&[1.0, 2.0, 3.0, 4.0, 5.0]), vec![1.0, 2.0, 3.0, 4.0, 5.0]);
    }
}
