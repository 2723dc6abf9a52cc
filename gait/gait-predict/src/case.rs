//! One predictive-simulation case from configuration to artifacts.
//!
//! ```text
//! RunConfiguration ─► GaitTranscription ─► NlpDriver ─► w_opt.json, stats.json
//!                                                   │
//!        ┌──────────────────────────────────────────┘
//!        ▼
//!  MeshSolution ─► speed / actuator checks ─► heel strike ─► GaitCycle
//!        │                                                     │
//!        └─► CostDecomposer ◄── verified against the solver    ▼
//!                                                         CycleMetrics ─► Hill check
//!                                                              │
//!                              optimaltrajectories.json, *.mot ◄┘
//! ```

use gait_collocation::{check_evaluator, Biophysics, DynamicsEvaluator, GaitTranscription, ReferenceMotion};
use gait_nlp::{NlpDriver, NlpProblem, NlpSolution, SolverStats};
use gait_types::{DynamicsVariant, GaitError, GaitModel, Result, RunConfiguration, Side};
use tracing::{info, warn};

use crate::artifacts::{ArtifactOptions, CaseDirectory, TrajectoryRecord, TrajectoryStore};
use crate::checks::{actuator_balance, mesh_dynamics, vertical_grf, ResidualGate, ResidualReport};
use crate::cycle::GaitCycle;
use crate::decomposition::{CostDecomposer, CostDecomposition};
use crate::heel_strike::{detect_heel_strike, HeelStrike, CONTACT_THRESHOLD};
use crate::mesh::MeshSolution;
use crate::metrics::CycleMetrics;

/// Model, evaluators and reference motion of a case.
#[derive(Clone, Copy)]
pub struct CaseInputs<'a> {
    /// Musculoskeletal model.
    pub model: &'a GaitModel,
    /// Dynamics in the transcription schema.
    pub dynamics: &'a dyn DynamicsEvaluator,
    /// Dynamics in the post-processing schema.
    pub post_processing: &'a dyn DynamicsEvaluator,
    /// Reference kinematics for bounds and the hot-start guess.
    pub reference: &'a ReferenceMotion,
}

/// Everything derived from a solution.
#[derive(Debug, Clone, PartialEq)]
pub struct CaseAnalysis {
    /// Average forward speed over the half cycle (m/s).
    pub average_speed: f64,
    /// Start of the reconstructed stride.
    pub heel_strike: HeelStrike,
    /// The full stride.
    pub cycle: GaitCycle,
    /// Metrics over the stride.
    pub metrics: CycleMetrics,
    /// Objective split by cost term.
    pub decomposition: CostDecomposition,
    /// Largest residual of each sanity check.
    pub residuals: ResidualReport,
}

/// A solved and analyzed case.
#[derive(Debug, Clone, PartialEq)]
pub struct CaseResult {
    /// Case identifier.
    pub case_id: String,
    /// Raw solver output.
    pub solution: NlpSolution,
    /// Post-processing.
    pub analysis: CaseAnalysis,
}

impl CaseResult {
    /// Whether the solver converged.
    #[must_use]
    pub fn converged(&self) -> bool {
        self.solution.stats.success
    }
}

/// Transcribe, solve and analyze one case; write artifacts when `options`
/// is given.
///
/// The raw solution is persisted before the analysis so a failed check
/// still leaves it on disk for [`reanalyze_case`].
pub fn solve_case(
    config: &RunConfiguration,
    inputs: CaseInputs<'_>,
    options: Option<&ArtifactOptions>,
) -> Result<CaseResult> {
    info!(case = %config.case_id, speed = config.target_speed, guess = ?config.guess_type, "solving case");
    let nlp = GaitTranscription::new(inputs.model, inputs.dynamics, inputs.reference, config)?;
    let solution = NlpDriver::sqp().solve(&nlp, config.tol)?;

    let directory = options
        .map(|o| CaseDirectory::create(&o.root, config))
        .transpose()?;
    if let Some(directory) = &directory {
        directory.save_solution(&solution.x, &solution.stats)?;
    }

    let analysis = analyze_solution(config, inputs, &nlp, &solution.x, &solution.stats)?;
    if let (Some(options), Some(directory)) = (options, &directory) {
        persist(config, inputs.model, options, directory, &analysis, &solution.stats)?;
    }
    Ok(CaseResult {
        case_id: config.case_id.clone(),
        solution,
        analysis,
    })
}

/// Analyze the solution saved by an earlier [`solve_case`] without solving
/// again.
pub fn reanalyze_case(
    config: &RunConfiguration,
    inputs: CaseInputs<'_>,
    options: &ArtifactOptions,
) -> Result<CaseResult> {
    let nlp = GaitTranscription::new(inputs.model, inputs.dynamics, inputs.reference, config)?;
    let directory = CaseDirectory::open(&options.root, config);
    let (x, stats) = directory.load_solution()?;
    if x.len() != nlp.n_variables() {
        return Err(GaitError::SolutionSizeMismatch {
            expected: nlp.n_variables(),
            actual: x.len(),
        });
    }
    info!(case = %config.case_id, dir = %directory.path().display(), "reanalyzing saved solution");
    let values = nlp.evaluate(&x)?;
    let analysis = analyze_solution(config, inputs, &nlp, &x, &stats)?;
    persist(config, inputs.model, options, &directory, &analysis, &stats)?;
    Ok(CaseResult {
        case_id: config.case_id.clone(),
        solution: NlpSolution {
            x,
            objective: values.objective,
            constraints: values.constraints,
            stats,
        },
        analysis,
    })
}

/// Check, reconstruct and measure the solution `x` of `nlp`.
///
/// Residual checks fail only when `stats` reports convergence; the
/// decomposition is verified against the last reported objective under
/// the same condition.
pub fn analyze_solution(
    config: &RunConfiguration,
    inputs: CaseInputs<'_>,
    nlp: &GaitTranscription<'_>,
    x: &[f64],
    stats: &SolverStats,
) -> Result<CaseAnalysis> {
    let model = inputs.model;
    check_evaluator(inputs.post_processing, model, DynamicsVariant::PostProcessing)?;
    let scaled = nlp.layout().extract(x)?;
    let physical = scaled.rescaled(|f| nlp.bounds().scaling.factors(f));
    let mesh = MeshSolution::from_trajectory(&physical, config.degree)?;
    let biophysics = Biophysics::new(model);
    let gate = ResidualGate::new(config.tolerance(), stats.success);
    let mut residuals = ResidualReport::default();

    let average_speed = mesh.average_speed(model.pelvis.forward);
    residuals.speed = gate.check("average speed", [average_speed - config.target_speed])?;

    let outputs = mesh_dynamics(inputs.post_processing, &mesh)?;
    let (arm, mtp) = actuator_balance(model, &biophysics, &mesh, &outputs);
    residuals.arm_balance = gate.check("arm torque balance", arm)?;
    residuals.mtp_balance = gate.check("mtp torque balance", mtp)?;

    let heel_strike = detect_heel_strike(
        &vertical_grf(model, &outputs, Side::Right),
        &vertical_grf(model, &outputs, Side::Left),
        CONTACT_THRESHOLD,
    )?;
    let cycle = GaitCycle::reconstruct(model, &mesh, heel_strike)?;
    let metrics = CycleMetrics::evaluate(model, &biophysics, inputs.post_processing, &cycle, config.model_mass)?;
    residuals.hill_equilibrium = gate.check("Hill equilibrium", metrics.muscles.hill_residual.iter().copied())?;

    let decomposer = CostDecomposer::new(
        model,
        &biophysics,
        nlp.evaluator().scheme().clone(),
        config.weights,
        config.model_mass,
    );
    let decomposition = decomposer.decompose(&scaled, &physical)?;
    match stats.iterations.obj.last() {
        Some(&reported) if stats.success => decomposition.verify(reported)?,
        _ => warn!(
            case = %config.case_id,
            objective = decomposition.total(),
            "objective decomposition not verified on an unconverged solution"
        ),
    }

    info!(
        case = %config.case_id,
        leg = heel_strike.leg.suffix(),
        heel_strike = heel_strike.index,
        cot = metrics.cost_of_transport.total,
        stride_length = metrics.stride_length,
        "analyzed case"
    );
    Ok(CaseAnalysis {
        average_speed,
        heel_strike,
        cycle,
        metrics,
        decomposition,
        residuals,
    })
}

fn persist(
    config: &RunConfiguration,
    model: &GaitModel,
    options: &ArtifactOptions,
    directory: &CaseDirectory,
    analysis: &CaseAnalysis,
    stats: &SolverStats,
) -> Result<()> {
    if options.write_motion_files {
        directory.write_motion_files(model, &analysis.cycle, &analysis.metrics)?;
    }
    if options.save_trajectories {
        let record = TrajectoryRecord::new(
            model,
            &analysis.cycle,
            &analysis.metrics,
            &analysis.decomposition,
            stats,
        );
        TrajectoryStore::update(&options.trajectories_path(), &config.case_id, record)?;
    }
    Ok(())
}
