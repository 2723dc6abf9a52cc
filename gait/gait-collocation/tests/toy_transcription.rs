//! End-to-end transcription of the toy leg.
//!
//! One translation and one muscle-driven hinge on a linear dynamics
//! stand-in, N = 10 intervals of degree 3 at 1 m/s: the problem must be well
//! posed, start inside its bounds and, once solved, walk at the target
//! speed.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use approx::assert_relative_eq;
use gait_collocation::{
    Dimensions, DynamicsEvaluator, Family, GaitTranscription, HeuristicGuess, InitialGuess,
    LinearDynamics, MeshKinematics, ProblemBounds, ReferenceMotion, Scaling, Trajectory,
};
use gait_nlp::{check_guess_within_bounds, NlpDriver, NlpProblem};
use gait_types::{
    CaseRecord, DynamicsVariant, GaitError, GaitModel, GuessType, MotionTable, Result,
    RunConfiguration,
};

const N: usize = 10;
const D: usize = 3;

fn reference_table() -> MotionTable {
    let mut table = MotionTable::new(
        "toy",
        vec!["time".into(), "pelvis_tx".into(), "hip_flexion".into()],
    )
    .with_degrees(true);
    for k in 0..=20 {
        let t = 0.03 * f64::from(k);
        let hip = -0.3 * (std::f64::consts::PI * t / 0.6).cos();
        table.push_row(vec![t, t, hip.to_degrees()]).unwrap();
    }
    table
}

fn configuration(guess: GuessType) -> RunConfiguration {
    let record = CaseRecord {
        model_mass: Some(60.0),
        target_speed: Some(1.0),
        guess_type: Some(guess),
        n: Some(N),
        d: Some(D),
        n_threads: Some(2),
        ..CaseRecord::default()
    };
    RunConfiguration::from_record("toy", &record).unwrap()
}

fn setup() -> (GaitModel, LinearDynamics, ReferenceMotion) {
    let model = GaitModel::toy_leg().unwrap();
    let dynamics =
        LinearDynamics::new(&model, DynamicsVariant::Transcription).with_joint(1, 0.5, 0.1, 2.0);
    let reference = ReferenceMotion::from_table(&reference_table(), &model).unwrap();
    (model, dynamics, reference)
}

#[test]
fn problem_is_well_posed() {
    let (model, dynamics, reference) = setup();
    let config = configuration(GuessType::ColdStart);
    let nlp = GaitTranscription::new(&model, &dynamics, &reference, &config).unwrap();

    let dims = Dimensions::new(&model, N, D);
    let expected: usize = Family::ALL
        .iter()
        .map(|&f| dims.items(f) * dims.nodes(f))
        .sum();
    assert_eq!(nlp.n_variables(), expected);
    // nMuscles·(N+1) + nMuscles·d·N for the activation family pair
    assert_eq!(
        nlp.layout().range(Family::Activation).len() + nlp.layout().range(Family::ActivationCol).len(),
        (N + 1) + D * N
    );
    assert_eq!(nlp.constraint_bounds().len(), nlp.n_constraints());
    check_guess_within_bounds(&nlp).unwrap();

    let first = nlp.evaluate_first_order(&nlp.initial_point()).unwrap();
    assert_eq!(first.gradient.len(), nlp.n_variables());
    assert!(first.jacobian.nnz() > 0);
    assert_eq!(first.jacobian.n_cols(), nlp.n_variables());
}

#[test]
fn both_guesses_start_inside_bounds() {
    let (model, dynamics, reference) = setup();
    for guess in [GuessType::ColdStart, GuessType::HotStart] {
        let config = configuration(guess);
        let nlp = GaitTranscription::new(&model, &dynamics, &reference, &config).unwrap();
        check_guess_within_bounds(&nlp).unwrap();
    }
}

/// Heuristic guess with one activation pushed below its bound.
struct BrokenGuess(HeuristicGuess);

impl InitialGuess for BrokenGuess {
    fn final_time(&self) -> f64 {
        self.0.final_time()
    }

    fn kinematics(&self, scaling: &Scaling) -> Result<MeshKinematics> {
        self.0.kinematics(scaling)
    }

    fn trajectory(&self, dims: &Dimensions, scaling: &Scaling) -> Result<Trajectory> {
        let mut t = self.0.trajectory(dims, scaling)?;
        t[Family::Activation][(0, 3)] = -1.0;
        Ok(t)
    }
}

#[test]
fn guess_outside_bounds_is_fatal() {
    let (model, dynamics, reference) = setup();
    let config = configuration(GuessType::ColdStart);
    let bounds = ProblemBounds::new(&model, &reference).unwrap();
    let guess = BrokenGuess(HeuristicGuess::new(&model, N, 1.0));
    let nlp = GaitTranscription::with_bounds(&model, &dynamics, bounds, &guess, &config).unwrap();
    let err = NlpDriver::sqp().solve(&nlp, config.tol).unwrap_err();
    assert!(err.is_consistency_error());
    match err {
        GaitError::GuessOutOfBounds { family, index, .. } => {
            assert_eq!(family, "a");
            assert_eq!(index, 3);
        }
        other => panic!("unexpected error {other}"),
    }
}

#[test]
fn solved_gait_walks_at_target_speed() {
    let (model, dynamics, reference) = setup();
    let config = configuration(GuessType::ColdStart);
    let nlp = GaitTranscription::new(&model, &dynamics, &reference, &config).unwrap();
    let solution = NlpDriver::sqp().solve(&nlp, config.tol).unwrap();
    assert!(solution.stats.success, "{}", solution.stats.return_status);
    assert_eq!(solution.x.len(), nlp.n_variables());
    assert_eq!(solution.stats.iterations.obj.len(), solution.stats.iter_count);
    assert_relative_eq!(
        *solution.stats.iterations.obj.last().unwrap(),
        solution.objective,
        max_relative = 1e-12
    );

    let trajectory = nlp
        .layout()
        .extract(&solution.x)
        .unwrap()
        .rescaled(|f| nlp.bounds().scaling.factors(f));
    let tx = model.pelvis.forward;
    let q = &trajectory[Family::Position];
    let speed = (q[(tx, N)] - q[(tx, 0)]) / trajectory.final_time();
    assert_relative_eq!(speed, 1.0, epsilon = 1e-4);
    assert_relative_eq!(q[(tx, 0)], 0.0, epsilon = 1e-6);
}

#[test]
fn evaluator_layout_is_checked_at_startup() {
    let (model, dynamics, reference) = setup();
    assert_eq!(dynamics.layout().output_len(DynamicsVariant::Transcription), 22);
    let config = configuration(GuessType::ColdStart);
    let wrong = dynamics.with_variant(DynamicsVariant::PostProcessing);
    assert!(GaitTranscription::new(&model, &wrong, &reference, &config).is_err());
}
