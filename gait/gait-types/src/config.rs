//! Case settings and the immutable per-case run configuration.
//!
//! Settings are a JSON document mapping case identifiers to records whose
//! keys keep the established option names:
//!
//! ```json
//! {
//!   "42": { "modelMass": 62.0, "targetSpeed": 1.33, "guessType": "hotStart",
//!           "N": 50, "tol": 4 }
//! }
//! ```
//!
//! [`RunConfiguration::from_settings`] resolves one record against the
//! defaults. The result is never mutated; every stage of a run borrows it.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::GaitError;
use crate::layout::DynamicsVariant;
use crate::Result;

/// Largest supported collocation polynomial degree.
pub const MAX_COLLOCATION_DEGREE: usize = 5;

/// Initial guess strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GuessType {
    /// Heuristic guess independent of reference data.
    #[default]
    #[serde(rename = "coldStart", alias = "quasiRandom")]
    ColdStart,
    /// Guess derived from the reference motion.
    #[serde(rename = "hotStart", alias = "dataDriven")]
    HotStart,
}

/// One case record as stored in the settings document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CaseRecord {
    /// Model family name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Knee flexion axis variant.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub knee_axis: Option<String>,
    /// Whether to override the triceps surae tendon stiffness.
    #[serde(
        rename = "adjustAchillesTendonStiffness",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub adjust_achilles_tendon_stiffness: Option<bool>,
    /// Achilles tendon stiffness used when adjusting.
    #[serde(
        rename = "AchillesTendonStiffness",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub achilles_tendon_stiffness: Option<f64>,
    /// Whether the model has metatarsophalangeal joints.
    #[serde(rename = "withMTP", default, skip_serializing_if = "Option::is_none")]
    pub with_mtp: Option<bool>,
    /// Foot-ground contact configuration.
    #[serde(
        rename = "contactConfiguration",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub contact_configuration: Option<String>,
    /// Body mass (kg). Required.
    #[serde(rename = "modelMass", default, skip_serializing_if = "Option::is_none")]
    pub model_mass: Option<f64>,
    /// MTP damping (N·m·s/rad).
    #[serde(rename = "dampingMtp", default, skip_serializing_if = "Option::is_none")]
    pub damping_mtp: Option<f64>,
    /// Target average walking speed (m/s).
    #[serde(rename = "targetSpeed", default, skip_serializing_if = "Option::is_none")]
    pub target_speed: Option<f64>,
    /// Initial guess strategy.
    #[serde(rename = "guessType", default, skip_serializing_if = "Option::is_none")]
    pub guess_type: Option<GuessType>,
    /// Metabolic energy rate weight.
    #[serde(
        rename = "metabolicEnergyRateTerm",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub metabolic_energy_rate_term: Option<f64>,
    /// Muscle activation weight.
    #[serde(rename = "activationTerm", default, skip_serializing_if = "Option::is_none")]
    pub activation_term: Option<f64>,
    /// Joint acceleration weight.
    #[serde(
        rename = "jointAccelerationTerm",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub joint_acceleration_term: Option<f64>,
    /// Arm excitation weight.
    #[serde(rename = "armExcitationTerm", default, skip_serializing_if = "Option::is_none")]
    pub arm_excitation_term: Option<f64>,
    /// Passive torque weight.
    #[serde(rename = "passiveTorqueTerm", default, skip_serializing_if = "Option::is_none")]
    pub passive_torque_term: Option<f64>,
    /// Control regularization weight.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub controls: Option<f64>,
    /// Convergence tolerance exponent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tol: Option<i32>,
    /// Number of mesh intervals.
    #[serde(rename = "N", default, skip_serializing_if = "Option::is_none")]
    pub n: Option<usize>,
    /// Collocation polynomial degree.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub d: Option<usize>,
    /// Worker threads for per-node evaluation.
    #[serde(rename = "nThreads", default, skip_serializing_if = "Option::is_none")]
    pub n_threads: Option<usize>,
}

/// Settings document: case identifier to record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CaseSettings {
    /// Records by case identifier.
    pub cases: BTreeMap<String, CaseRecord>,
}

impl CaseSettings {
    /// Parse a settings document.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a settings document from disk.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// Insert or replace a case.
    #[must_use]
    pub fn with_case(mut self, id: impl Into<String>, record: CaseRecord) -> Self {
        self.cases.insert(id.into(), record);
        self
    }
}

/// Cost term weights.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CostWeights {
    /// Metabolic energy rate.
    pub metabolic_energy_rate: f64,
    /// Muscle activation.
    pub activation: f64,
    /// Non-arm joint acceleration.
    pub joint_acceleration: f64,
    /// Arm excitation.
    pub arm_excitation: f64,
    /// Limit torque.
    pub passive_torque: f64,
    /// Activation rate, force rate and arm acceleration regularization.
    pub controls: f64,
}

impl Default for CostWeights {
    fn default() -> Self {
        Self {
            metabolic_energy_rate: 500.0,
            activation: 2000.0,
            joint_acceleration: 50000.0,
            arm_excitation: 1_000_000.0,
            passive_torque: 1000.0,
            controls: 0.001,
        }
    }
}

/// Fully resolved, immutable configuration of one case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfiguration {
    /// Case identifier.
    pub case_id: String,
    /// Model family name.
    pub model: String,
    /// Knee axis suffix (empty, or `_<axis>`).
    pub knee_axis: String,
    /// Whether the model has MTP joints.
    pub with_mtp: bool,
    /// Foot-ground contact configuration.
    pub contact_configuration: String,
    /// Body mass (kg).
    pub model_mass: f64,
    /// MTP damping (N·m·s/rad).
    pub damping_mtp: f64,
    /// Target average speed (m/s).
    pub target_speed: f64,
    /// Initial guess strategy.
    pub guess_type: GuessType,
    /// Triceps surae tendon stiffness override.
    pub achilles_tendon_stiffness: Option<f64>,
    /// Cost term weights.
    pub weights: CostWeights,
    /// Tolerance exponent: the solver tolerance is `10^-tol`.
    pub tol: i32,
    /// Number of mesh intervals.
    pub n_intervals: usize,
    /// Collocation polynomial degree.
    pub degree: usize,
    /// Worker threads.
    pub n_threads: usize,
}

impl RunConfiguration {
    /// Resolve `case_id` against `settings`, applying defaults.
    pub fn from_settings(case_id: &str, settings: &CaseSettings) -> Result<Self> {
        let record = settings.cases.get(case_id).ok_or_else(|| {
            GaitError::configuration(format!("case {case_id} not found in settings"))
        })?;
        Self::from_record(case_id, record)
    }

    /// Resolve a single record.
    pub fn from_record(case_id: &str, record: &CaseRecord) -> Result<Self> {
        let missing = |name: &str| GaitError::MissingSetting {
            case: case_id.to_string(),
            name: name.to_string(),
        };
        let model_mass = record.model_mass.ok_or_else(|| missing("modelMass"))?;
        let achilles_tendon_stiffness = if record.adjust_achilles_tendon_stiffness == Some(true) {
            Some(
                record
                    .achilles_tendon_stiffness
                    .ok_or_else(|| missing("AchillesTendonStiffness"))?,
            )
        } else {
            None
        };
        let defaults = CostWeights::default();
        let config = Self {
            case_id: case_id.to_string(),
            model: record.model.clone().unwrap_or_else(|| "new_model".into()),
            knee_axis: record
                .knee_axis
                .as_ref()
                .map(|axis| format!("_{axis}"))
                .unwrap_or_default(),
            with_mtp: record.with_mtp.unwrap_or(true),
            contact_configuration: record
                .contact_configuration
                .clone()
                .unwrap_or_else(|| "generic".into()),
            model_mass,
            damping_mtp: record.damping_mtp.unwrap_or(0.4),
            target_speed: record.target_speed.unwrap_or(1.33),
            guess_type: record.guess_type.unwrap_or_default(),
            achilles_tendon_stiffness,
            weights: CostWeights {
                metabolic_energy_rate: record
                    .metabolic_energy_rate_term
                    .unwrap_or(defaults.metabolic_energy_rate),
                activation: record.activation_term.unwrap_or(defaults.activation),
                joint_acceleration: record
                    .joint_acceleration_term
                    .unwrap_or(defaults.joint_acceleration),
                arm_excitation: record.arm_excitation_term.unwrap_or(defaults.arm_excitation),
                passive_torque: record.passive_torque_term.unwrap_or(defaults.passive_torque),
                controls: record.controls.unwrap_or(defaults.controls),
            },
            tol: record.tol.unwrap_or(4),
            n_intervals: record.n.unwrap_or(50),
            degree: record.d.unwrap_or(3),
            n_threads: record.n_threads.unwrap_or(10),
        };
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges.
    pub fn validate(&self) -> Result<()> {
        if !(self.model_mass.is_finite() && self.model_mass > 0.0) {
            return Err(GaitError::configuration(format!(
                "modelMass must be positive, got {}",
                self.model_mass
            )));
        }
        if !(self.target_speed.is_finite() && self.target_speed > 0.0) {
            return Err(GaitError::configuration(format!(
                "targetSpeed must be positive, got {}",
                self.target_speed
            )));
        }
        if self.n_intervals < 2 {
            return Err(GaitError::configuration(format!(
                "N must be at least 2, got {}",
                self.n_intervals
            )));
        }
        if self.degree == 0 || self.degree > MAX_COLLOCATION_DEGREE {
            return Err(GaitError::UnsupportedCollocationDegree {
                degree: self.degree,
                max: MAX_COLLOCATION_DEGREE,
            });
        }
        if self.n_threads == 0 {
            return Err(GaitError::configuration("nThreads must be at least 1"));
        }
        Ok(())
    }

    /// Solver tolerance `10^-tol`.
    #[must_use]
    pub fn tolerance(&self) -> f64 {
        10f64.powi(-self.tol)
    }

    /// Name of the scaled musculoskeletal model.
    #[must_use]
    pub fn model_name(&self) -> String {
        if self.with_mtp {
            format!("{}_scaled{}", self.model, self.knee_axis)
        } else {
            format!("{}_noMTP_scaled{}", self.model, self.knee_axis)
        }
    }

    /// Name of the compiled dynamics library for `variant`.
    #[must_use]
    pub fn dynamics_library(&self, variant: DynamicsVariant) -> String {
        let mut name = self.model_name();
        if self.contact_configuration == "generic_low" {
            name.push('_');
            name.push_str(&self.contact_configuration);
        }
        if variant == DynamicsVariant::PostProcessing {
            name.push_str("_pp");
        }
        name
    }

    /// Directory name of this case's artifacts.
    #[must_use]
    pub fn case_directory(&self) -> String {
        format!("Case_{}", self.case_id)
    }
}
