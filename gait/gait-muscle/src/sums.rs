//! Normalized power sums used by the cost terms.

use gait_diff::Scalar;

/// `Σ xᵢ^p / n`; zero for an empty slice.
pub fn norm_sum_pow<S: Scalar>(values: &[S], power: i32) -> S {
    if values.is_empty() {
        return S::zero();
    }
    let n = values.len() as f64;
    S::sum_of(values.iter().map(|v| v.powi(power))) / n
}

/// [`norm_sum_pow`] of `values` divided element-wise by `scale` first.
pub fn scaled_norm_sum_pow<S: Scalar>(values: &[S], scale: &[f64], power: i32) -> S {
    let scaled: Vec<S> = values
        .iter()
        .zip(scale)
        .map(|(v, &s)| v.clone() / s)
        .collect();
    norm_sum_pow(&scaled, power)
}
