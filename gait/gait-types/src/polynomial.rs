//! Polynomial muscle-geometry coefficient data.
//!
//! Muscle-tendon lengths are approximated by multivariate polynomials of the
//! joint angles a muscle spans. Coefficients are fitted offline and consumed
//! here as a table keyed by muscle name; each entry lists the spanned
//! degrees of freedom by (right-side) joint name.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::GaitError;
use crate::Result;

/// Fitted polynomial for one muscle, with spanned joints given by name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolynomialCoefficients {
    /// Names of the spanned degrees of freedom, in polynomial variable order.
    pub dofs: Vec<String>,
    /// Maximum total degree.
    pub order: u32,
    /// Coefficients in nested-loop monomial order.
    pub coefficients: Vec<f64>,
}

/// Coefficient table keyed by muscle name.
pub type PolynomialTable = BTreeMap<String, PolynomialCoefficients>;

/// Number of monomials of total degree `<= order` in `dimension` variables.
#[must_use]
pub fn monomial_count(dimension: usize, order: u32) -> usize {
    // C(order + dimension, dimension)
    let order = order as usize;
    let mut count = 1usize;
    for i in 1..=dimension {
        count = count * (order + i) / i;
    }
    count
}

/// A polynomial bound to positions in a side's polynomial input vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MusclePolynomial {
    /// Muscle name (polynomial row label).
    pub name: String,
    /// Indices into the side input vector, in polynomial variable order.
    pub inputs: Vec<usize>,
    /// Maximum total degree.
    pub order: u32,
    /// Coefficients in nested-loop monomial order.
    pub coefficients: Vec<f64>,
}

impl MusclePolynomial {
    /// Resolve a coefficient entry against the side's joint names.
    pub fn resolve(
        name: &str,
        entry: &PolynomialCoefficients,
        side_joints: &[String],
    ) -> Result<Self> {
        let inputs = entry
            .dofs
            .iter()
            .map(|dof| {
                side_joints
                    .iter()
                    .position(|j| j == dof)
                    .ok_or_else(|| GaitError::missing_joint(dof.clone()))
            })
            .collect::<Result<Vec<_>>>()?;
        let expected = monomial_count(inputs.len(), entry.order);
        if entry.coefficients.len() != expected {
            return Err(GaitError::configuration(format!(
                "polynomial for {name}: {} coefficients, expected {expected} for {} dofs of order {}",
                entry.coefficients.len(),
                inputs.len(),
                entry.order
            )));
        }
        Ok(Self {
            name: name.to_string(),
            inputs,
            order: entry.order,
            coefficients: entry.coefficients.clone(),
        })
    }

    /// Whether the polynomial depends on side input `input`.
    #[must_use]
    pub fn spans(&self, input: usize) -> bool {
        self.inputs.contains(&input)
    }
}
