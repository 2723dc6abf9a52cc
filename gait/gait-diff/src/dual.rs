//! Sparse forward-mode dual numbers.
//!
//! A [`Dual`] carries a value and its gradient with respect to a set of
//! independent variables, stored as `(index, ∂)` pairs sorted by index.
//! Every operation applies the usual forward-mode rule:
//!
//! ```text
//! d(u + v) = du + dv
//! d(u · v) = u dv + v du
//! d(u / v) = (v du − u dv) / v²
//! d f(u)   = f'(u) du
//! ```
//!
//! Gradients stay short because each per-interval function only touches the
//! variables of its own interval plus the final time.

use std::ops::{Add, AddAssign, Div, Mul, MulAssign, Neg, Sub, SubAssign};

use crate::scalar::Scalar;

/// A value with a sparse gradient.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Dual {
    value: f64,
    grad: Vec<(usize, f64)>,
}

impl Dual {
    /// Independent variable number `index`.
    #[must_use]
    pub fn variable(value: f64, index: usize) -> Self {
        Self {
            value,
            grad: vec![(index, 1.0)],
        }
    }

    /// Independent variables `offset..offset + values.len()`.
    #[must_use]
    pub fn seed(values: &[f64], offset: usize) -> Vec<Self> {
        values
            .iter()
            .enumerate()
            .map(|(i, &v)| Self::variable(v, offset + i))
            .collect()
    }

    /// Sparse gradient, sorted by variable index.
    #[must_use]
    pub fn gradient(&self) -> &[(usize, f64)] {
        &self.grad
    }

    /// Partial derivative with respect to variable `index`.
    #[must_use]
    pub fn partial(&self, index: usize) -> f64 {
        self.grad
            .binary_search_by_key(&index, |&(i, _)| i)
            .map_or(0.0, |k| self.grad[k].1)
    }

    /// `Σ coeff · grad` over several duals, merged in index order.
    fn combine(terms: &[(f64, &[(usize, f64)])]) -> Vec<(usize, f64)> {
        match terms {
            [] => Vec::new(),
            [(c, g)] => scale(g, *c),
            [(ca, a), (cb, b)] => merge(a, *ca, b, *cb),
            _ => {
                let mut acc: Vec<(usize, f64)> = Vec::new();
                for (c, g) in terms {
                    acc = merge(&acc, 1.0, g, *c);
                }
                acc
            }
        }
    }

    /// Apply `f(u)` with derivative `f'(u)`.
    fn chain(&self, value: f64, derivative: f64) -> Self {
        Self {
            value,
            grad: scale(&self.grad, derivative),
        }
    }
}

fn scale(g: &[(usize, f64)], c: f64) -> Vec<(usize, f64)> {
    g.iter().map(|&(i, d)| (i, c * d)).collect()
}

fn merge(a: &[(usize, f64)], ca: f64, b: &[(usize, f64)], cb: f64) -> Vec<(usize, f64)> {
    let mut out = Vec::with_capacity(a.len() + b.len());
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        let (ia, da) = a[i];
        let (ib, db) = b[j];
        if ia == ib {
            out.push((ia, ca * da + cb * db));
            i += 1;
            j += 1;
        } else if ia < ib {
            out.push((ia, ca * da));
            i += 1;
        } else {
            out.push((ib, cb * db));
            j += 1;
        }
    }
    out.extend(a[i..].iter().map(|&(k, d)| (k, ca * d)));
    out.extend(b[j..].iter().map(|&(k, d)| (k, cb * d)));
    out
}

impl Add for Dual {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            value: self.value + rhs.value,
            grad: merge(&self.grad, 1.0, &rhs.grad, 1.0),
        }
    }
}

impl Sub for Dual {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self {
            value: self.value - rhs.value,
            grad: merge(&self.grad, 1.0, &rhs.grad, -1.0),
        }
    }
}

impl Mul for Dual {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self {
        Self {
            value: self.value * rhs.value,
            grad: merge(&self.grad, rhs.value, &rhs.grad, self.value),
        }
    }
}

impl Div for Dual {
    type Output = Self;

    fn div(self, rhs: Self) -> Self {
        let inv = 1.0 / rhs.value;
        let value = self.value * inv;
        Self {
            value,
            grad: merge(&self.grad, inv, &rhs.grad, -value * inv),
        }
    }
}

impl Neg for Dual {
    type Output = Self;

    fn neg(self) -> Self {
        self.chain(-self.value, -1.0)
    }
}

impl Add<f64> for Dual {
    type Output = Self;

    fn add(mut self, rhs: f64) -> Self {
        self.value += rhs;
        self
    }
}

impl Sub<f64> for Dual {
    type Output = Self;

    fn sub(mut self, rhs: f64) -> Self {
        self.value -= rhs;
        self
    }
}

impl Mul<f64> for Dual {
    type Output = Self;

    fn mul(mut self, rhs: f64) -> Self {
        self *= rhs;
        self
    }
}

impl Div<f64> for Dual {
    type Output = Self;

    fn div(mut self, rhs: f64) -> Self {
        self *= 1.0 / rhs;
        self
    }
}

impl AddAssign for Dual {
    fn add_assign(&mut self, rhs: Self) {
        self.value += rhs.value;
        self.grad = merge(&self.grad, 1.0, &rhs.grad, 1.0);
    }
}

impl SubAssign for Dual {
    fn sub_assign(&mut self, rhs: Self) {
        self.value -= rhs.value;
        self.grad = merge(&self.grad, 1.0, &rhs.grad, -1.0);
    }
}

impl MulAssign<f64> for Dual {
    fn mul_assign(&mut self, rhs: f64) {
        self.value *= rhs;
        for (_, d) in &mut self.grad {
            *d *= rhs;
        }
    }
}

impl Scalar for Dual {
    const TRACKS_DERIVATIVES: bool = true;

    fn constant(value: f64) -> Self {
        Self {
            value,
            grad: Vec::new(),
        }
    }

    fn value(&self) -> f64 {
        self.value
    }

    fn exp(&self) -> Self {
        let e = self.value.exp();
        self.chain(e, e)
    }

    fn ln(&self) -> Self {
        self.chain(self.value.ln(), 1.0 / self.value)
    }

    fn sqrt(&self) -> Self {
        let s = self.value.sqrt();
        self.chain(s, 0.5 / s)
    }

    fn sin(&self) -> Self {
        self.chain(self.value.sin(), self.value.cos())
    }

    fn cos(&self) -> Self {
        self.chain(self.value.cos(), -self.value.sin())
    }

    fn tanh(&self) -> Self {
        let t = self.value.tanh();
        self.chain(t, 1.0 - t * t)
    }

    fn powi(&self, n: i32) -> Self {
        match n {
            0 => Self::constant(1.0),
            _ => self.chain(self.value.powi(n), f64::from(n) * self.value.powi(n - 1)),
        }
    }

    fn lift(value: f64, partials: &[f64], inputs: &[Self]) -> Self {
        let terms: Vec<(f64, &[(usize, f64)])> = partials
            .iter()
            .zip(inputs)
            .filter(|(p, _)| **p != 0.0)
            .map(|(&p, x)| (p, x.grad.as_slice()))
            .collect();
        Self {
            value,
            grad: Self::combine(&terms),
        }
    }

    fn square(&self) -> Self {
        self.chain(self.value * self.value, 2.0 * self.value)
    }

    fn asinh(&self) -> Self {
        self.chain(self.value.asinh(), 1.0 / (self.value * self.value + 1.0).sqrt())
    }
}
