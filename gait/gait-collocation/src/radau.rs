//! Radau collocation scheme.
//!
//! Each mesh interval is mapped to `τ ∈ [0, 1]` and carries a Lagrange
//! polynomial through the interval start `τ_0 = 0` and the `d` Radau points
//! `τ_1 … τ_d` (the last one is `τ_d = 1`). Three coefficient tables follow
//! from the basis `L_r`:
//!
//! ```text
//! C[j][r] = L_r'(τ_j)        derivative at collocation point j
//! D[r]    = L_r(1)           end-of-interval interpolation
//! B[r]    = ∫₀¹ L_r(τ) dτ    quadrature weight
//! ```
//!
//! With interval length `h`, the collocation residual at point `j` is
//! `h · ẋ(τ_j) − Σ_r C[j][r] x_r`.

use gait_types::{GaitError, Result, MAX_COLLOCATION_DEGREE};

/// Radau points per degree, interval start excluded.
const RADAU_POINTS: [&[f64]; MAX_COLLOCATION_DEGREE] = [
    &[1.0],
    &[0.333_333_333_333_333, 1.0],
    &[0.155_051_025_721_682, 0.644_948_974_278_318, 1.0],
    &[
        0.088_587_959_512_704,
        0.409_466_864_440_735,
        0.787_659_461_760_847,
        1.0,
    ],
    &[
        0.057_104_196_114_518,
        0.276_843_013_638_124,
        0.583_590_432_368_917,
        0.860_240_135_656_219,
        1.0,
    ],
];

/// Collocation points and interpolation/quadrature tables of one degree.
#[derive(Debug, Clone, PartialEq)]
pub struct CollocationScheme {
    degree: usize,
    points: Vec<f64>,
    derivative: Vec<Vec<f64>>,
    continuity: Vec<f64>,
    quadrature: Vec<f64>,
}

impl CollocationScheme {
    /// Scheme of polynomial degree `degree` (1..=5).
    pub fn radau(degree: usize) -> Result<Self> {
        if degree == 0 || degree > MAX_COLLOCATION_DEGREE {
            return Err(GaitError::UnsupportedCollocationDegree {
                degree,
                max: MAX_COLLOCATION_DEGREE,
            });
        }
        let mut points = Vec::with_capacity(degree + 1);
        points.push(0.0);
        points.extend_from_slice(RADAU_POINTS[degree - 1]);

        let basis: Vec<Vec<f64>> = (0..=degree).map(|r| lagrange_basis(&points, r)).collect();
        let derivative = points
            .iter()
            .map(|&tau| basis.iter().map(|l| evaluate(&differentiate(l), tau)).collect())
            .collect();
        let continuity = basis.iter().map(|l| evaluate(l, 1.0)).collect();
        let quadrature = basis
            .iter()
            .map(|l| {
                let integral = integrate(l);
                evaluate(&integral, 1.0) - evaluate(&integral, 0.0)
            })
            .collect();

        Ok(Self {
            degree,
            points,
            derivative,
            continuity,
            quadrature,
        })
    }

    /// Polynomial degree `d`.
    #[must_use]
    pub fn degree(&self) -> usize {
        self.degree
    }

    /// `τ_0 … τ_d`.
    #[must_use]
    pub fn points(&self) -> &[f64] {
        &self.points
    }

    /// Row `j` of `C`: derivative coefficients at point `j`.
    #[must_use]
    pub fn derivative_row(&self, j: usize) -> &[f64] {
        &self.derivative[j]
    }

    /// `D`.
    #[must_use]
    pub fn continuity(&self) -> &[f64] {
        &self.continuity
    }

    /// `B`.
    #[must_use]
    pub fn quadrature(&self) -> &[f64] {
        &self.quadrature
    }
}

// Polynomials below are coefficient vectors, lowest power first.

fn lagrange_basis(points: &[f64], r: usize) -> Vec<f64> {
    let mut poly = vec![1.0];
    for (m, &tau_m) in points.iter().enumerate() {
        if m == r {
            continue;
        }
        let denom = points[r] - tau_m;
        let mut next = vec![0.0; poly.len() + 1];
        for (k, &c) in poly.iter().enumerate() {
            next[k + 1] += c / denom;
            next[k] -= c * tau_m / denom;
        }
        poly = next;
    }
    poly
}

fn evaluate(poly: &[f64], x: f64) -> f64 {
    poly.iter().rev().fold(0.0, |acc, &c| acc * x + c)
}

#[allow(clippy::cast_precision_loss)]
fn differentiate(poly: &[f64]) -> Vec<f64> {
    poly.iter()
        .enumerate()
        .skip(1)
        .map(|(k, &c)| c * k as f64)
        .collect()
}

#[allow(clippy::cast_precision_loss)]
fn integrate(poly: &[f64]) -> Vec<f64> {
    std::iter::once(0.0)
        .chain(poly.iter().enumerate().map(|(k, &c)| c / (k + 1) as f64))
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_degree_three_quadrature() {
        let s = CollocationScheme::radau(3).unwrap();
        let b = s.quadrature();
        assert_relative_eq!(b[0], 0.0, epsilon = 1e-12);
        assert_relative_eq!(b[1], 0.376_403_062_700_467, epsilon = 1e-9);
        assert_relative_eq!(b[2], 0.512_485_826_188_421, epsilon = 1e-9);
        assert_relative_eq!(b[3], 0.111_111_111_111_111, epsilon = 1e-9);
    }

    #[test]
    fn test_last_point_is_interval_end() {
        for d in 1..=MAX_COLLOCATION_DEGREE {
            let s = CollocationScheme::radau(d).unwrap();
            let dvec = s.continuity();
            for (r, &v) in dvec.iter().enumerate() {
                let expected = if r == d { 1.0 } else { 0.0 };
                assert_relative_eq!(v, expected, epsilon = 1e-9);
            }
            assert_relative_eq!(s.quadrature().iter().sum::<f64>(), 1.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_derivative_is_exact_for_polynomials() {
        // x(τ) = τ³ − 2τ has ẋ(τ) = 3τ² − 2; degree 3 reproduces it exactly
        let s = CollocationScheme::radau(3).unwrap();
        let x: Vec<f64> = s.points().iter().map(|t| t * t * t - 2.0 * t).collect();
        for j in 1..=3 {
            let tau = s.points()[j];
            let d: f64 = s
                .derivative_row(j)
                .iter()
                .zip(&x)
                .map(|(c, xi)| c * xi)
                .sum();
            assert_relative_eq!(d, 3.0 * tau * tau - 2.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_unsupported_degree() {
        assert!(matches!(
            CollocationScheme::radau(0),
            Err(GaitError::UnsupportedCollocationDegree { degree: 0, .. })
        ));
        assert!(CollocationScheme::radau(6).unwrap_err().is_configuration_error());
    }
}
