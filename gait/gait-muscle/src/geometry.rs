//! Polynomial approximation of musculotendon geometry.
//!
//! Each muscle length is a multivariate polynomial of the joint angles it
//! spans. Monomials are enumerated in nested-loop order, the first variable
//! outermost, up to a total order:
//!
//! ```text
//! 2 variables, order 2:  1, y, y², x, xy, x²
//! ```
//!
//! Moment arms are `dM = −∂l_MT/∂q`; the lengthening velocity follows by the
//! chain rule, `v_MT = −Σ dM · q̇`.

use gait_diff::Scalar;
use gait_types::{MuscleGeometry, MusclePolynomial, PolynomialSide, Side};

/// Exponent tuples of all monomials in nested-loop order.
#[must_use]
pub fn monomial_exponents(dimension: usize, order: u32) -> Vec<Vec<u32>> {
    fn recurse(prefix: &mut Vec<u32>, dimension: usize, budget: u32, out: &mut Vec<Vec<u32>>) {
        if prefix.len() == dimension {
            out.push(prefix.clone());
            return;
        }
        for e in 0..=budget {
            prefix.push(e);
            recurse(prefix, dimension, budget - e, out);
            prefix.pop();
        }
    }
    let mut out = Vec::new();
    recurse(&mut Vec::with_capacity(dimension), dimension, order, &mut out);
    out
}

/// A polynomial with its monomials expanded once.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledPolynomial {
    /// Side input index of each variable.
    pub inputs: Vec<usize>,
    /// Maximum total degree.
    pub order: u32,
    /// `(coefficient, exponents)` of the non-zero terms.
    pub terms: Vec<(f64, Vec<u32>)>,
}

impl CompiledPolynomial {
    /// Expand `polynomial`.
    #[must_use]
    pub fn new(polynomial: &MusclePolynomial) -> Self {
        let exponents = monomial_exponents(polynomial.inputs.len(), polynomial.order);
        let terms = polynomial
            .coefficients
            .iter()
            .zip(exponents)
            .filter(|(c, _)| **c != 0.0)
            .map(|(&c, e)| (c, e))
            .collect();
        Self {
            inputs: polynomial.inputs.clone(),
            order: polynomial.order,
            terms,
        }
    }

    /// Value and gradient with respect to each variable.
    pub fn value_and_gradient<S: Scalar>(&self, x: &[S]) -> (S, Vec<S>) {
        let n = self.inputs.len();
        // powers[i][e] = x_i^e
        let powers: Vec<Vec<S>> = self
            .inputs
            .iter()
            .map(|&input| {
                let mut row = Vec::with_capacity(self.order as usize + 1);
                row.push(S::one());
                for e in 1..=self.order as usize {
                    let next = row[e - 1].clone() * x[input].clone();
                    row.push(next);
                }
                row
            })
            .collect();

        let mut value = S::zero();
        let mut gradient = vec![S::zero(); n];
        for (c, exponents) in &self.terms {
            let mut term = S::constant(*c);
            for (i, &e) in exponents.iter().enumerate() {
                if e > 0 {
                    term = term * powers[i][e as usize].clone();
                }
            }
            value += term;
            for k in 0..n {
                let ek = exponents[k];
                if ek == 0 {
                    continue;
                }
                let mut d = S::constant(*c * f64::from(ek));
                for (i, &e) in exponents.iter().enumerate() {
                    let p = if i == k { e - 1 } else { e };
                    if p > 0 {
                        d = d * powers[i][p as usize].clone();
                    }
                }
                gradient[k] += d;
            }
        }
        (value, gradient)
    }
}

/// Lengths, velocities and moment arms of one side.
#[derive(Debug, Clone, PartialEq)]
pub struct SideGeometry<S> {
    /// Musculotendon length per polynomial row (m).
    pub lengths: Vec<S>,
    /// Lengthening velocity per polynomial row (m/s).
    pub velocities: Vec<S>,
    /// `moment_arms[row][input]` (m); zero where the row does not span it.
    pub moment_arms: Vec<Vec<S>>,
}

/// Compiled evaluation of one side.
#[derive(Debug, Clone, PartialEq)]
pub struct SideEvaluator {
    joints: Vec<usize>,
    polynomials: Vec<CompiledPolynomial>,
    length_rows: Vec<usize>,
}

impl SideEvaluator {
    /// Compile a side.
    #[must_use]
    pub fn new(side: &PolynomialSide) -> Self {
        Self {
            joints: side.joints.clone(),
            polynomials: side.polynomials.iter().map(CompiledPolynomial::new).collect(),
            length_rows: side.length_rows.clone(),
        }
    }

    /// Evaluate on full joint position/velocity vectors.
    pub fn evaluate<S: Scalar>(&self, q: &[S], qd: &[S]) -> SideGeometry<S> {
        let qs: Vec<S> = self.joints.iter().map(|&j| q[j].clone()).collect();
        let qds: Vec<S> = self.joints.iter().map(|&j| qd[j].clone()).collect();
        let n_inputs = self.joints.len();
        let mut lengths = Vec::with_capacity(self.polynomials.len());
        let mut velocities = Vec::with_capacity(self.polynomials.len());
        let mut moment_arms = Vec::with_capacity(self.polynomials.len());
        for poly in &self.polynomials {
            let (length, gradient) = poly.value_and_gradient(&qs);
            let mut arms = vec![S::zero(); n_inputs];
            let mut velocity = S::zero();
            for (k, g) in gradient.into_iter().enumerate() {
                let input = poly.inputs[k];
                velocity += g.clone() * qds[input].clone();
                arms[input] = -g;
            }
            lengths.push(length);
            velocities.push(velocity);
            moment_arms.push(arms);
        }
        SideGeometry {
            lengths,
            velocities,
            moment_arms,
        }
    }
}

/// Both sides' geometry plus the bilateral length and velocity vectors.
#[derive(Debug, Clone, PartialEq)]
pub struct BilateralGeometry<S> {
    /// Left evaluation.
    pub left: SideGeometry<S>,
    /// Right evaluation.
    pub right: SideGeometry<S>,
    /// Musculotendon lengths in muscle order.
    pub mt_lengths: Vec<S>,
    /// Musculotendon velocities in muscle order.
    pub mt_velocities: Vec<S>,
}

impl<S: Scalar> BilateralGeometry<S> {
    /// Moment arm of polynomial row `row` about side input `input`.
    #[must_use]
    pub fn moment_arm(&self, side: Side, row: usize, input: usize) -> &S {
        let geometry = match side {
            Side::Left => &self.left,
            Side::Right => &self.right,
        };
        &geometry.moment_arms[row][input]
    }
}

/// Compiled left and right geometry of a model.
#[derive(Debug, Clone, PartialEq)]
pub struct GeometryEvaluator {
    left: SideEvaluator,
    right: SideEvaluator,
}

impl GeometryEvaluator {
    /// Compile the model geometry.
    #[must_use]
    pub fn new(geometry: &MuscleGeometry) -> Self {
        Self {
            left: SideEvaluator::new(&geometry.left),
            right: SideEvaluator::new(&geometry.right),
        }
    }

    /// Evaluate both sides and assemble the bilateral vectors (left side
    /// first).
    pub fn evaluate<S: Scalar>(&self, q: &[S], qd: &[S]) -> BilateralGeometry<S> {
        let left = self.left.evaluate(q, qd);
        let right = self.right.evaluate(q, qd);
        let pick = |values: &[S], rows: &[usize]| -> Vec<S> {
            rows.iter().map(|&r| values[r].clone()).collect()
        };
        let mut mt_lengths = pick(&left.lengths, &self.left.length_rows);
        mt_lengths.extend(pick(&right.lengths, &self.right.length_rows));
        let mut mt_velocities = pick(&left.velocities, &self.left.length_rows);
        mt_velocities.extend(pick(&right.velocities, &self.right.length_rows));
        BilateralGeometry {
            left,
            right,
            mt_lengths,
            mt_velocities,
        }
    }
}
