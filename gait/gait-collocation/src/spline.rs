//! Interpolating cubic spline with not-a-knot end conditions.
//!
//! Second derivatives `M_i` at the knots solve
//!
//! ```text
//! h_{i−1} M_{i−1} + 2 (h_{i−1} + h_i) M_i + h_i M_{i+1}
//!     = 6 ((y_{i+1} − y_i)/h_i − (y_i − y_{i−1})/h_{i−1})
//! ```
//!
//! closed by a continuous third derivative at the second and the
//! second-to-last knot. Outside the data range the end cubics extrapolate.

use gait_types::{GaitError, Result};
use nalgebra::{DMatrix, DVector};

/// A cubic spline through `(x_i, y_i)`.
#[derive(Debug, Clone, PartialEq)]
pub struct CubicSpline {
    x: Vec<f64>,
    y: Vec<f64>,
    second: Vec<f64>,
}

impl CubicSpline {
    /// Fewest knots that determine a not-a-knot cubic.
    pub const MIN_POINTS: usize = 4;

    /// Interpolate strictly increasing `x`.
    pub fn new(x: &[f64], y: &[f64]) -> Result<Self> {
        let n = x.len();
        if n != y.len() {
            return Err(GaitError::parse(format!(
                "spline has {n} abscissae and {} ordinates",
                y.len()
            )));
        }
        if n < Self::MIN_POINTS {
            return Err(GaitError::parse(format!(
                "spline needs at least {} points, got {n}",
                Self::MIN_POINTS
            )));
        }
        if x.windows(2).any(|w| w[1] <= w[0]) {
            return Err(GaitError::parse("spline abscissae are not increasing"));
        }

        let h: Vec<f64> = x.windows(2).map(|w| w[1] - w[0]).collect();
        let mut a = DMatrix::zeros(n, n);
        let mut rhs = DVector::zeros(n);

        a[(0, 0)] = h[1];
        a[(0, 1)] = -(h[0] + h[1]);
        a[(0, 2)] = h[0];
        for i in 1..n - 1 {
            a[(i, i - 1)] = h[i - 1];
            a[(i, i)] = 2.0 * (h[i - 1] + h[i]);
            a[(i, i + 1)] = h[i];
            rhs[i] = 6.0 * ((y[i + 1] - y[i]) / h[i] - (y[i] - y[i - 1]) / h[i - 1]);
        }
        a[(n - 1, n - 3)] = h[n - 2];
        a[(n - 1, n - 2)] = -(h[n - 3] + h[n - 2]);
        a[(n - 1, n - 1)] = h[n - 3];

        let second = a
            .lu()
            .solve(&rhs)
            .ok_or_else(|| GaitError::parse("spline system is singular"))?;
        Ok(Self {
            x: x.to_vec(),
            y: y.to_vec(),
            second: second.iter().copied().collect(),
        })
    }

    /// Knot abscissae.
    #[must_use]
    pub fn knots(&self) -> &[f64] {
        &self.x
    }

    fn segment(&self, t: f64) -> usize {
        let last = self.x.len() - 2;
        match self.x.partition_point(|&xi| xi <= t) {
            0 => 0,
            k => (k - 1).min(last),
        }
    }

    /// Value at `t`.
    #[must_use]
    pub fn value(&self, t: f64) -> f64 {
        let i = self.segment(t);
        let (h, a, b) = self.weights(i, t);
        a * self.y[i]
            + b * self.y[i + 1]
            + ((a * a * a - a) * self.second[i] + (b * b * b - b) * self.second[i + 1]) * h * h
                / 6.0
    }

    /// First derivative at `t`.
    #[must_use]
    pub fn derivative(&self, t: f64) -> f64 {
        let i = self.segment(t);
        let (h, a, b) = self.weights(i, t);
        (self.y[i + 1] - self.y[i]) / h - (3.0 * a * a - 1.0) / 6.0 * h * self.second[i]
            + (3.0 * b * b - 1.0) / 6.0 * h * self.second[i + 1]
    }

    /// Second derivative at `t`.
    #[must_use]
    pub fn second_derivative(&self, t: f64) -> f64 {
        let i = self.segment(t);
        let (_, a, b) = self.weights(i, t);
        a * self.second[i] + b * self.second[i + 1]
    }

    fn weights(&self, i: usize, t: f64) -> (f64, f64, f64) {
        let h = self.x[i + 1] - self.x[i];
        let a = (self.x[i + 1] - t) / h;
        (h, a, 1.0 - a)
    }
}
