//! The assembled nonlinear program.
//!
//! ```text
//! x = [tf | a a_col | F F_col | Qs Qs_col | Qds Qds_col | aArm aArm_col
//!         | aDt | eArm | FDt_col | Qdds_col ]          (scaled)
//!
//! g = [ interval 0 | … | interval N−1 ]                 per-interval rows
//!   ++ [ x_{k+1} − Σ_r D_r x_{k,r} ]_k                  continuity
//!   ++ periodicity ++ average speed
//!
//! f = Σ_k J_k / (Qs_tx[N] − Qs_tx[0])                   cost per distance
//! ```
//!
//! The intervals are mapped over a dedicated thread pool of `nThreads`
//! workers and concatenated in interval order, so results do not depend on
//! scheduling. Derivatives come from evaluating the same code on
//! [`Dual`] numbers seeded with the global variable indices.

use gait_diff::{Dual, Scalar};
use gait_nlp::{
    Bounds, Evaluation, FirstOrderEvaluation, NlpProblem, TripletMatrix, VariableFamily,
};
use gait_types::{GaitError, GaitModel, Result, RunConfiguration};
use rayon::prelude::*;
use rayon::ThreadPool;
use tracing::info;

use crate::bounds::ProblemBounds;
use crate::dynamics::{check_evaluator, DynamicsEvaluator};
use crate::guess::{initial_guess, InitialGuess};
use crate::node::{IntervalEvaluator, IntervalOutput, IntervalVariables};
use crate::radau::CollocationScheme;
use crate::reference::ReferenceMotion;
use crate::variables::{Dimensions, Family, VariableLayout};

/// State families and their collocation counterparts.
const STATE_FAMILIES: [(Family, Family); 5] = [
    (Family::Activation, Family::ActivationCol),
    (Family::Force, Family::ForceCol),
    (Family::Position, Family::PositionCol),
    (Family::Velocity, Family::VelocityCol),
    (Family::ArmActivation, Family::ArmActivationCol),
];

/// Direct collocation transcription of one case.
pub struct GaitTranscription<'a> {
    model: &'a GaitModel,
    layout: VariableLayout,
    bounds: ProblemBounds,
    evaluator: IntervalEvaluator<'a>,
    initial: Vec<f64>,
    target_speed: f64,
    node_bounds: Bounds,
    n_constraints: usize,
    pool: ThreadPool,
}

impl<'a> GaitTranscription<'a> {
    /// Transcribe the case described by `config`, with bounds from
    /// `reference` and the configured guess.
    pub fn new(
        model: &'a GaitModel,
        dynamics: &'a dyn DynamicsEvaluator,
        reference: &ReferenceMotion,
        config: &RunConfiguration,
    ) -> Result<Self> {
        let bounds = ProblemBounds::new(model, reference)?;
        let guess = initial_guess(
            config.guess_type,
            model,
            reference,
            config.n_intervals,
            config.target_speed,
        );
        Self::with_bounds(model, dynamics, bounds, guess.as_ref(), config)
    }

    /// Transcribe with explicit bounds and guess.
    pub fn with_bounds(
        model: &'a GaitModel,
        dynamics: &'a dyn DynamicsEvaluator,
        bounds: ProblemBounds,
        guess: &dyn InitialGuess,
        config: &RunConfiguration,
    ) -> Result<Self> {
        if config.n_intervals == 0 {
            return Err(GaitError::configuration("mesh needs at least one interval"));
        }
        check_evaluator(dynamics, model, IntervalEvaluator::dynamics_variant())?;
        let scheme = CollocationScheme::radau(config.degree)?;
        let dims = Dimensions::new(model, config.n_intervals, config.degree);
        let layout = VariableLayout::new(dims);
        let initial = layout.flatten(&guess.trajectory(&dims, &bounds.scaling)?)?;

        let evaluator = IntervalEvaluator::new(
            model,
            dynamics,
            scheme,
            bounds.scaling.clone(),
            config.weights,
            config.model_mass,
            config.n_intervals,
        );
        let node_bounds = evaluator.node_bounds();
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.n_threads)
            .build()
            .map_err(|e| GaitError::configuration(format!("thread pool: {e}")))?;

        let mut this = Self {
            model,
            layout,
            bounds,
            evaluator,
            initial,
            target_speed: config.target_speed,
            node_bounds,
            n_constraints: 0,
            pool,
        };
        this.n_constraints = this.constraint_bounds().len();
        info!(
            case = %config.case_id,
            variables = this.layout.len(),
            constraints = this.n_constraints,
            intervals = config.n_intervals,
            degree = config.degree,
            threads = config.n_threads,
            "transcribed gait problem"
        );
        Ok(this)
    }

    /// Decision-variable layout.
    #[must_use]
    pub fn layout(&self) -> &VariableLayout {
        &self.layout
    }

    /// Bounds and scale factors.
    #[must_use]
    pub fn bounds(&self) -> &ProblemBounds {
        &self.bounds
    }

    /// The per-interval evaluator.
    #[must_use]
    pub fn evaluator(&self) -> &IntervalEvaluator<'a> {
        &self.evaluator
    }

    /// Number of constraint rows emitted by the intervals.
    #[must_use]
    pub fn n_interval_rows(&self) -> usize {
        self.layout.dimensions().n_intervals * self.layout.dimensions().degree * self.node_bounds.len()
    }

    /// Every interval, evaluated on the worker pool, in interval order.
    pub fn intervals<S: Scalar>(
        &self,
        variable: impl Fn(usize) -> S + Sync,
    ) -> Result<Vec<IntervalOutput<S>>> {
        let n = self.layout.dimensions().n_intervals;
        self.pool.install(|| {
            (0..n)
                .into_par_iter()
                .map(|k| {
                    self.evaluator
                        .evaluate(&IntervalVariables::gather(&self.layout, k, &variable))
                })
                .collect()
        })
    }

    /// Objective and constraint rows on scalars built by `variable`.
    fn assemble<S: Scalar>(&self, variable: impl Fn(usize) -> S + Sync) -> Result<(S, Vec<S>)> {
        let dims = *self.layout.dimensions();
        let (n, d) = (dims.n_intervals, dims.degree);
        let outputs = self.intervals(&variable)?;

        let mut g = Vec::with_capacity(self.n_constraints);
        let mut cost = S::zero();
        for out in outputs {
            g.extend(out.constraints);
            cost += out.cost;
        }

        // continuity
        let weights = self.evaluator.scheme().continuity();
        for k in 0..n {
            for (mesh, col) in STATE_FAMILIES {
                for i in 0..dims.items(mesh) {
                    let end = S::sum_of(weights.iter().enumerate().map(|(r, &w)| {
                        let node = if r == 0 {
                            self.layout.index(mesh, k, i)
                        } else {
                            self.layout.index(col, k * d + r - 1, i)
                        };
                        variable(node) * w
                    }));
                    g.push(variable(self.layout.index(mesh, k + 1, i)) - end);
                }
            }
        }

        // periodicity
        let p = &self.model.periodicity;
        let at = |family: Family, node: usize, item: usize| variable(self.layout.index(family, node, item));
        for (family, a, b) in [
            (Family::Position, &p.qs_a, &p.qs_b),
            (Family::Velocity, &p.qds_a, &p.qds_b),
        ] {
            for (&ia, &ib) in a.iter().zip(b) {
                g.push(at(family, n, ia) - at(family, 0, ib));
            }
            for &o in &p.opposite {
                g.push(at(family, n, o) + at(family, 0, o));
            }
        }
        for family in [Family::Activation, Family::Force] {
            for (i, &m) in p.muscles.iter().enumerate() {
                g.push(at(family, n, i) - at(family, 0, m));
            }
        }
        for (i, &m) in p.arms.iter().enumerate() {
            g.push(at(Family::ArmActivation, n, i) - at(Family::ArmActivation, 0, m));
        }

        // average speed
        let tx = self.model.pelvis.forward;
        let scale = self.bounds.scaling.position[tx];
        let distance = (at(Family::Position, n, tx) - at(Family::Position, 0, tx)) * scale;
        let final_time = at(Family::FinalTime, 0, 0);
        g.push(distance.clone() / final_time - self.target_speed);

        Ok((cost / distance, g))
    }

    /// Number of periodicity rows.
    fn n_periodicity(&self) -> usize {
        let p = &self.model.periodicity;
        p.qs_a.len() + p.qds_a.len() + 2 * p.opposite.len() + 2 * p.muscles.len() + p.arms.len()
    }
}

impl NlpProblem for GaitTranscription<'_> {
    fn n_variables(&self) -> usize {
        self.layout.len()
    }

    fn n_constraints(&self) -> usize {
        self.n_constraints
    }

    fn variable_bounds(&self) -> Bounds {
        self.bounds.variable_bounds(&self.layout)
    }

    fn constraint_bounds(&self) -> Bounds {
        let dims = self.layout.dimensions();
        let mut b = Bounds::default();
        for _ in 0..dims.n_intervals * dims.degree {
            b.extend(&self.node_bounds);
        }
        let continuity: usize = STATE_FAMILIES.iter().map(|&(f, _)| dims.items(f)).sum();
        b.push_repeated(0.0, 0.0, dims.n_intervals * continuity);
        b.push_repeated(0.0, 0.0, self.n_periodicity());
        b.push_repeated(0.0, 0.0, 1);
        b
    }

    fn initial_point(&self) -> Vec<f64> {
        self.initial.clone()
    }

    fn variable_families(&self) -> Vec<VariableFamily> {
        self.layout.families()
    }

    fn hessian_blocks(&self) -> Vec<Vec<usize>> {
        self.layout.node_blocks()
    }

    fn evaluate(&self, x: &[f64]) -> Result<Evaluation> {
        let (objective, constraints) = self.assemble(|i| x[i])?;
        Ok(Evaluation {
            objective,
            constraints,
        })
    }

    fn evaluate_first_order(&self, x: &[f64]) -> Result<FirstOrderEvaluation> {
        let (objective, rows) = self.assemble(|i| Dual::variable(x[i], i))?;
        let mut gradient = vec![0.0; x.len()];
        for &(i, v) in objective.gradient() {
            gradient[i] += v;
        }
        let nnz = rows.iter().map(|r| r.gradient().len()).sum();
        let mut jacobian = TripletMatrix::with_capacity(rows.len(), x.len(), nnz);
        for (r, row) in rows.iter().enumerate() {
            for &(c, v) in row.gradient() {
                jacobian.push(r, c, v);
            }
        }
        Ok(FirstOrderEvaluation {
            values: Evaluation {
                objective: objective.value(),
                constraints: rows.iter().map(Scalar::value).collect(),
            },
            gradient,
            jacobian,
        })
    }
}
