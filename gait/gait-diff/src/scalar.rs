//! The scalar interface shared by numeric and differentiated evaluation.

use std::fmt::Debug;
use std::ops::{Add, AddAssign, Div, Mul, MulAssign, Neg, Sub, SubAssign};

/// A real number that the biophysical evaluators can compute with.
///
/// Implemented by `f64` (plain evaluation) and [`crate::Dual`] (value plus
/// sparse gradient). Code generic over `Scalar` runs unchanged for both.
///
/// Mixed arithmetic with `f64` is only available with the constant on the
/// right (`x * 2.0`, not `2.0 * x`).
pub trait Scalar:
    Clone
    + Debug
    + Send
    + Sync
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Div<Output = Self>
    + Neg<Output = Self>
    + Add<f64, Output = Self>
    + Sub<f64, Output = Self>
    + Mul<f64, Output = Self>
    + Div<f64, Output = Self>
    + AddAssign
    + SubAssign
    + MulAssign<f64>
    + 'static
{
    /// Whether values of this type carry derivatives.
    const TRACKS_DERIVATIVES: bool;

    /// A constant with zero derivative.
    fn constant(value: f64) -> Self;

    /// The primal value.
    fn value(&self) -> f64;

    /// `e^x`.
    fn exp(&self) -> Self;

    /// Natural logarithm.
    fn ln(&self) -> Self;

    /// Square root.
    fn sqrt(&self) -> Self;

    /// Sine.
    fn sin(&self) -> Self;

    /// Cosine.
    fn cos(&self) -> Self;

    /// Hyperbolic tangent.
    fn tanh(&self) -> Self;

    /// Integer power.
    fn powi(&self, n: i32) -> Self;

    /// Value `value` with derivative `Σ partials[i] · d(inputs[i])`.
    ///
    /// This is the chain rule for a function evaluated outside the scalar
    /// algebra (a black box whose Jacobian row is known).
    fn lift(value: f64, partials: &[f64], inputs: &[Self]) -> Self;

    /// Zero.
    fn zero() -> Self {
        Self::constant(0.0)
    }

    /// One.
    fn one() -> Self {
        Self::constant(1.0)
    }

    /// `x²`.
    fn square(&self) -> Self {
        self.clone() * self.clone()
    }

    /// Inverse hyperbolic sine, `ln(x + sqrt(x² + 1))`.
    fn asinh(&self) -> Self {
        (self.clone() + (self.square() + 1.0).sqrt()).ln()
    }

    /// Sum of an iterator (zero when empty).
    fn sum_of<I: IntoIterator<Item = Self>>(iter: I) -> Self {
        iter.into_iter().fold(Self::zero(), |acc, x| acc + x)
    }
}

impl Scalar for f64 {
    const TRACKS_DERIVATIVES: bool = false;

    #[inline]
    fn constant(value: f64) -> Self {
        value
    }

    #[inline]
    fn value(&self) -> f64 {
        *self
    }

    #[inline]
    fn exp(&self) -> Self {
        f64::exp(*self)
    }

    #[inline]
    fn ln(&self) -> Self {
        f64::ln(*self)
    }

    #[inline]
    fn sqrt(&self) -> Self {
        f64::sqrt(*self)
    }

    #[inline]
    fn sin(&self) -> Self {
        f64::sin(*self)
    }

    #[inline]
    fn cos(&self) -> Self {
        f64::cos(*self)
    }

    #[inline]
    fn tanh(&self) -> Self {
        f64::tanh(*self)
    }

    #[inline]
    fn powi(&self, n: i32) -> Self {
        f64::powi(*self, n)
    }

    #[inline]
    fn lift(value: f64, _partials: &[f64], _inputs: &[Self]) -> Self {
        value
    }

    #[inline]
    fn asinh(&self) -> Self {
        f64::asinh(*self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn quadratic<S: Scalar>(x: S) -> S {
        x.square() * 3.0 - x + 2.0
    }

    #[test]
    fn test_f64_generic_evaluation() {
        assert_relative_eq!(quadratic(2.0_f64), 12.0);
        assert_relative_eq!(<f64 as Scalar>::asinh(&0.5), 0.5_f64.asinh());
        assert_relative_eq!(f64::sum_of([1.0, 2.0, 3.5]), 6.5);
        assert_relative_eq!(f64::sum_of(std::iter::empty()), 0.0);
    }

    #[test]
    fn test_f64_lift_ignores_partials() {
        assert_relative_eq!(f64::lift(4.0, &[1.0, 2.0], &[3.0, 5.0]), 4.0);
    }
}
