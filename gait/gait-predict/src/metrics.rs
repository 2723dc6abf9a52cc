//! Metrics over a reconstructed gait cycle.
//!
//! Every sample of the stride is pushed through the same biophysical
//! evaluators as the transcription and through the post-processing
//! dynamics variant:
//!
//! ```text
//! GaitCycle ──► Biophysics::muscles ──► fiber states, Hill residuals, Ė
//!     │                                        └─► ∫ Ė dt / (m · distance) = COT
//!     └──► post-processing dynamics ──► GRF, GRM, torques, calcaneus origin
//!                                              └─► stride length, COP, free torque
//! ```

use gait_collocation::{dynamics_input, Biophysics, DynamicsEvaluator};
use gait_types::{GaitError, GaitModel, Result, Side};
use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

use crate::cycle::GaitCycle;

/// Basal metabolic rate coefficient (W/kg).
pub const BASAL_COEFFICIENT: f64 = 1.2;

/// Exponent applied to the body mass in the basal rate.
pub const BASAL_EXPONENT: f64 = 1.0;

/// Trapezoidal integral of `values` sampled at `time`.
#[must_use]
pub fn trapezoid(values: &[f64], time: &[f64]) -> f64 {
    values
        .windows(2)
        .zip(time.windows(2))
        .map(|(v, t)| 0.5 * (v[0] + v[1]) * (t[1] - t[0]))
        .sum()
}

/// Muscle states and energetics at every sample, `n_muscles × 2N`.
#[derive(Debug, Clone, PartialEq)]
pub struct CycleMuscles {
    /// Normalized fiber lengths.
    pub normalized_fiber_length: DMatrix<f64>,
    /// Fiber velocities (m/s).
    pub fiber_velocity: DMatrix<f64>,
    /// Hill equilibrium residuals.
    pub hill_residual: DMatrix<f64>,
    /// Total metabolic rate (W).
    pub metabolic_rate: DMatrix<f64>,
    /// Activation heat rate (W).
    pub activation_heat: DMatrix<f64>,
    /// Maintenance heat rate (W).
    pub maintenance_heat: DMatrix<f64>,
    /// Shortening heat rate (W).
    pub shortening_heat: DMatrix<f64>,
    /// Mechanical work rate (W).
    pub mechanical_work: DMatrix<f64>,
}

impl CycleMuscles {
    /// Evaluate every muscle at every sample of `cycle`.
    #[must_use]
    pub fn evaluate(biophysics: &Biophysics, cycle: &GaitCycle) -> Self {
        let (rows, cols) = (cycle.activation.nrows(), cycle.n_samples());
        let mut out = Self {
            normalized_fiber_length: DMatrix::zeros(rows, cols),
            fiber_velocity: DMatrix::zeros(rows, cols),
            hill_residual: DMatrix::zeros(rows, cols),
            metabolic_rate: DMatrix::zeros(rows, cols),
            activation_heat: DMatrix::zeros(rows, cols),
            maintenance_heat: DMatrix::zeros(rows, cols),
            shortening_heat: DMatrix::zeros(rows, cols),
            mechanical_work: DMatrix::zeros(rows, cols),
        };
        for k in 0..cols {
            let sample = biophysics.muscles(
                &GaitCycle::sample(&cycle.position, k),
                &GaitCycle::sample(&cycle.velocity, k),
                &GaitCycle::sample(&cycle.activation, k),
                &GaitCycle::sample(&cycle.force, k),
                &GaitCycle::sample(&cycle.force_rate, k),
            );
            for (m, (hill, rate)) in sample.hill.iter().zip(&sample.metabolics).enumerate() {
                out.normalized_fiber_length[(m, k)] = hill.normalized_fiber_length;
                out.fiber_velocity[(m, k)] = hill.fiber_velocity;
                out.hill_residual[(m, k)] = hill.residual;
                out.metabolic_rate[(m, k)] = rate.total;
                out.activation_heat[(m, k)] = rate.activation_heat;
                out.maintenance_heat[(m, k)] = rate.maintenance_heat;
                out.shortening_heat[(m, k)] = rate.shortening_heat;
                out.mechanical_work[(m, k)] = rate.mechanical_work;
            }
        }
        out
    }
}

/// Metabolic cost of transport (J/(kg·m)).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CostOfTransport {
    /// All muscles plus the basal rate.
    pub total: f64,
    /// Activation heat.
    pub activation: f64,
    /// Maintenance heat.
    pub maintenance: f64,
    /// Shortening heat.
    pub shortening: f64,
    /// Mechanical work.
    pub mechanical: f64,
    /// One entry per muscle, without the basal rate.
    pub per_muscle: Vec<f64>,
}

impl CostOfTransport {
    /// Integrate the rates of `muscles` over `time` and normalize by
    /// `model_mass · distance`.
    pub fn integrate(muscles: &CycleMuscles, time: &[f64], model_mass: f64, distance: f64) -> Result<Self> {
        let degenerate = distance.is_nan() || distance.abs() <= f64::EPSILON;
        if degenerate || model_mass.is_nan() || model_mass <= 0.0 {
            return Err(GaitError::consistency(format!(
                "cost of transport undefined for mass {model_mass} over distance {distance}"
            )));
        }
        let norm = model_mass * distance;
        let summed = |rates: &DMatrix<f64>| -> Vec<f64> { rates.row_sum().iter().copied().collect() };
        let per_muscle: Vec<f64> = muscles
            .metabolic_rate
            .row_iter()
            .map(|row| trapezoid(&row.iter().copied().collect::<Vec<_>>(), time) / norm)
            .collect();
        let basal = BASAL_COEFFICIENT * model_mass.powf(BASAL_EXPONENT);
        let total: Vec<f64> = summed(&muscles.metabolic_rate).iter().map(|r| r + basal).collect();
        Ok(Self {
            total: trapezoid(&total, time) / norm,
            activation: trapezoid(&summed(&muscles.activation_heat), time) / norm,
            maintenance: trapezoid(&summed(&muscles.maintenance_heat), time) / norm,
            shortening: trapezoid(&summed(&muscles.shortening_heat), time) / norm,
            mechanical: trapezoid(&summed(&muscles.mechanical_work), time) / norm,
            per_muscle,
        })
    }
}

/// Ground reactions and joint torques at every sample.
#[derive(Debug, Clone, PartialEq)]
pub struct GroundReactions {
    /// Forces, rows `[x_r y_r z_r x_l y_l z_l]` (N).
    pub grf: DMatrix<f64>,
    /// Moments about the ground origin, same row order (N·m).
    pub grm: DMatrix<f64>,
    /// Generalized forces in joint order.
    pub torques: DMatrix<f64>,
    /// Right calcaneus origin, rows `[x y z]` (m).
    pub calcaneus: DMatrix<f64>,
}

impl GroundReactions {
    /// Evaluate the post-processing dynamics at every sample of `cycle`.
    pub fn evaluate(model: &GaitModel, dynamics: &dyn DynamicsEvaluator, cycle: &GaitCycle) -> Result<Self> {
        let layout = model.dynamics;
        let cols = cycle.n_samples();
        let mut reactions = Self {
            grf: DMatrix::zeros(6, cols),
            grm: DMatrix::zeros(6, cols),
            torques: DMatrix::zeros(model.n_joints(), cols),
            calcaneus: DMatrix::zeros(3, cols),
        };
        for k in 0..cols {
            let input = dynamics_input(
                &GaitCycle::sample(&cycle.position, k),
                &GaitCycle::sample(&cycle.velocity, k),
                &GaitCycle::sample(&cycle.acceleration, k),
            );
            let out = dynamics.evaluate(&input)?;
            let expected = layout.output_len(dynamics.variant());
            if out.len() != expected {
                return Err(GaitError::consistency(format!(
                    "dynamics evaluator returned {} outputs, expected {expected}",
                    out.len()
                )));
            }
            for side in [Side::Right, Side::Left] {
                let rows = 3 * side.offset();
                for (i, v) in out[layout.grf(side)].iter().enumerate() {
                    reactions.grf[(rows + i, k)] = *v;
                }
                for (i, v) in out[layout.grm(side)].iter().enumerate() {
                    reactions.grm[(rows + i, k)] = *v;
                }
            }
            reactions
                .torques
                .set_column(k, &DVector::from_column_slice(&out[layout.torques()]));
            reactions
                .calcaneus
                .set_column(k, &DVector::from_column_slice(&out[layout.calcaneus_3d(Side::Right)]));
        }
        Ok(reactions)
    }

    /// Distance between the right calcaneus at the first and last sample.
    #[must_use]
    pub fn stride_length(&self) -> f64 {
        let last = self.calcaneus.ncols() - 1;
        (self.calcaneus.column(0) - self.calcaneus.column(last)).norm()
    }

    /// Center of pressure and free torque under one foot, `3 × 2N` each.
    ///
    /// Samples whose vertical force is below `threshold` are zeroed, as are
    /// the matching force columns of the returned copy of the GRF.
    #[must_use]
    pub fn contact(&self, side: Side, threshold: f64) -> FootContact {
        let rows = 3 * side.offset();
        let cols = self.grf.ncols();
        let mut contact = FootContact {
            force: self.grf.rows(rows, 3).into_owned(),
            center_of_pressure: DMatrix::zeros(3, cols),
            free_torque: DMatrix::zeros(3, cols),
        };
        for k in 0..cols {
            let f = |i: usize| self.grf[(rows + i, k)];
            let m = |i: usize| self.grm[(rows + i, k)];
            if f(1) < threshold {
                contact.force.column_mut(k).fill(0.0);
                continue;
            }
            let x = m(2) / f(1);
            let z = -m(0) / f(1);
            contact.center_of_pressure[(0, k)] = x;
            contact.center_of_pressure[(2, k)] = z;
            contact.free_torque[(1, k)] = m(1) - z * f(0) + x * f(2);
        }
        contact
    }
}

/// Ground contact of one foot as written to the GRF file.
#[derive(Debug, Clone, PartialEq)]
pub struct FootContact {
    /// Force, zero in swing.
    pub force: DMatrix<f64>,
    /// Center of pressure on the ground plane, zero in swing.
    pub center_of_pressure: DMatrix<f64>,
    /// Vertical free torque, zero in swing.
    pub free_torque: DMatrix<f64>,
}

/// Everything derived from one reconstructed cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct CycleMetrics {
    /// Muscle states and energetics.
    pub muscles: CycleMuscles,
    /// Ground reactions and torques.
    pub reactions: GroundReactions,
    /// Cost of transport.
    pub cost_of_transport: CostOfTransport,
    /// Forward distance between the first and last sample (m).
    pub distance: f64,
    /// Stride length from the right calcaneus (m).
    pub stride_length: f64,
}

impl CycleMetrics {
    /// Evaluate the metrics of `cycle`.
    pub fn evaluate(
        model: &GaitModel,
        biophysics: &Biophysics,
        dynamics: &dyn DynamicsEvaluator,
        cycle: &GaitCycle,
        model_mass: f64,
    ) -> Result<Self> {
        let muscles = CycleMuscles::evaluate(biophysics, cycle);
        let distance = cycle.distance(model.pelvis.forward);
        let cost_of_transport = CostOfTransport::integrate(&muscles, &cycle.time, model_mass, distance)?;
        let reactions = GroundReactions::evaluate(model, dynamics, cycle)?;
        let stride_length = reactions.stride_length();
        Ok(Self {
            muscles,
            reactions,
            cost_of_transport,
            distance,
            stride_length,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_trapezoid() {
        let t = [0.0, 0.5, 1.0, 2.0];
        assert_relative_eq!(trapezoid(&[2.0; 4], &t), 4.0);
        // linear integrand is exact
        let v: Vec<f64> = t.iter().map(|x| 3.0 * x).collect();
        assert_relative_eq!(trapezoid(&v, &t), 6.0, epsilon = 1e-12);
        assert_eq!(trapezoid(&[1.0], &[0.0]), 0.0);
    }

    fn constant_muscles(rate: f64, cols: usize) -> CycleMuscles {
        let filled = |v: f64| DMatrix::from_element(2, cols, v);
        CycleMuscles {
            normalized_fiber_length: filled(1.0),
            fiber_velocity: filled(0.0),
            hill_residual: filled(0.0),
            metabolic_rate: filled(rate),
            activation_heat: filled(0.25 * rate),
            maintenance_heat: filled(0.25 * rate),
            shortening_heat: filled(0.25 * rate),
            mechanical_work: filled(0.25 * rate),
        }
    }

    #[test]
    fn test_cost_of_transport_includes_basal_rate() {
        let time = [0.0, 0.5, 1.0];
        let cot = CostOfTransport::integrate(&constant_muscles(30.0, 3), &time, 60.0, 1.2).unwrap();
        // (2·30 + 1.2·60) W over 1 s, per 60 kg and 1.2 m
        assert_relative_eq!(cot.total, (60.0 + 72.0) / 72.0, epsilon = 1e-12);
        assert_relative_eq!(cot.activation, 15.0 / 72.0, epsilon = 1e-12);
        assert_eq!(cot.per_muscle.len(), 2);
        assert_relative_eq!(cot.per_muscle[0], 30.0 / 72.0, epsilon = 1e-12);
        let parts = cot.activation + cot.maintenance + cot.shortening + cot.mechanical;
        assert_relative_eq!(parts, cot.per_muscle.iter().sum::<f64>(), epsilon = 1e-12);
    }

    #[test]
    fn test_cost_of_transport_needs_distance() {
        let time = [0.0, 1.0];
        assert!(CostOfTransport::integrate(&constant_muscles(1.0, 2), &time, 60.0, 0.0).is_err());
        assert!(CostOfTransport::integrate(&constant_muscles(1.0, 2), &time, 0.0, 1.0).is_err());
    }

    fn reactions() -> GroundReactions {
        let mut grf = DMatrix::zeros(6, 3);
        let mut grm = DMatrix::zeros(6, 3);
        // right foot loaded at samples 0 and 1, left at 2
        for k in 0..2 {
            grf[(0, k)] = 50.0;
            grf[(1, k)] = 500.0;
            grm[(0, k)] = -50.0;
            grm[(1, k)] = 2.0;
            grm[(2, k)] = 100.0;
        }
        grf[(1, 2)] = 10.0;
        grf[(4, 2)] = 600.0;
        let mut calcaneus = DMatrix::zeros(3, 3);
        calcaneus[(0, 2)] = 1.2;
        calcaneus[(2, 2)] = 0.05;
        GroundReactions {
            grf,
            grm,
            torques: DMatrix::zeros(2, 3),
            calcaneus,
        }
    }

    #[test]
    fn test_center_of_pressure() {
        let r = reactions().contact(Side::Right, 30.0);
        assert_relative_eq!(r.center_of_pressure[(0, 0)], 0.2);
        assert_relative_eq!(r.center_of_pressure[(2, 0)], 0.1);
        // τ_y − z·F_x + x·F_z
        assert_relative_eq!(r.free_torque[(1, 0)], 2.0 - 0.1 * 50.0, epsilon = 1e-12);
        // swing sample is cleared
        assert_eq!(r.force[(1, 2)], 0.0);
        assert_eq!(r.center_of_pressure[(0, 2)], 0.0);
        let l = reactions().contact(Side::Left, 30.0);
        assert_eq!(l.force[(1, 2)], 600.0);
        assert_eq!(l.force[(1, 0)], 0.0);
    }

    #[test]
    fn test_stride_length() {
        assert_relative_eq!(
            reactions().stride_length(),
            (1.2_f64.powi(2) + 0.05_f64.powi(2)).sqrt(),
            epsilon = 1e-12
        );
    }
}
